//! The `Job` record and the wire-facing result/threat types assembled
//! by the worker, spec.md §3/§4.10.

use chrono::{DateTime, Utc};
use conjunction_screener::Telemetry;
use risk_profiles::PriorityTier;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum JobStatus {
    Queued,
    Running,
    Success,
    AllClear,
    Failed,
}

impl JobStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Success | JobStatus::AllClear | JobStatus::Failed)
    }
}

/// The wire-facing priority label (`MANNED`/`HIGH-RISK`/`CATALOG`).
fn priority_label(tier: PriorityTier) -> &'static str {
    match tier {
        PriorityTier::Manned => "MANNED",
        PriorityTier::HighRisk => "HIGH-RISK",
        PriorityTier::Catalog => "CATALOG",
    }
}

/// One row in a job's threat list: a screened pair's telemetry plus
/// the priority tier it was tagged with.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Threat {
    #[serde(flatten)]
    pub telemetry: Telemetry,
    pub priority: &'static str,
    pub priority_reason: Option<&'static str>,
    pub pdf_url: Option<String>,
}

impl Threat {
    pub fn new(telemetry: Telemetry, tier: PriorityTier, reason: Option<&'static str>) -> Self {
        Self {
            telemetry,
            priority: priority_label(tier),
            priority_reason: reason,
            pdf_url: None,
        }
    }

    fn tier_rank(&self) -> u8 {
        match self.priority {
            "MANNED" => PriorityTier::Manned.rank(),
            "HIGH-RISK" => PriorityTier::HighRisk.rank(),
            _ => PriorityTier::Catalog.rank(),
        }
    }
}

/// Counts of pairs actually screened per tier, plus total job wall time.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ScreeningStats {
    pub manned_checked: usize,
    pub high_risk_checked: usize,
    pub catalog_checked: usize,
    pub total_time_sec: f64,
}

/// The assembled result of one screening job.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreeningResult {
    pub status: &'static str,
    pub risk_level: Option<risk_profiles::RiskLevel>,
    pub threats: Vec<Threat>,
    pub decision: Option<String>,
    pub profile: Option<&'static str>,
    pub profile_type: Option<risk_profiles::ProfileType>,
    pub geometry: Option<conjunction_screener::Geometry>,
    pub has_ric_plot: bool,
    pub screening_stats: ScreeningStats,
    pub maneuver: Option<maneuver_planner::Maneuver>,
}

/// Sort threats by `(priority_rank, min_dist_km ascending)`,
/// `MANNED=0 < HIGH-RISK=1 < CATALOG=2` (spec.md §4.10 step 4).
pub fn sort_threats(threats: &mut [Threat]) {
    threats.sort_by(|a, b| {
        a.tier_rank()
            .cmp(&b.tier_rank())
            .then(a.telemetry.min_dist_km.total_cmp(&b.telemetry.min_dist_km))
    });
}

/// One screening job's lifecycle record. `queued -> running ->
/// {success, all_clear, failed}`, monotone; fields are frozen once
/// terminal (spec.md §3, §8).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    pub id: Uuid,
    pub status: JobStatus,
    pub result: Option<ScreeningResult>,
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Job {
    pub fn queued(id: Uuid) -> Self {
        Self {
            id,
            status: JobStatus::Queued,
            result: None,
            error: None,
            created_at: Utc::now(),
        }
    }
}
