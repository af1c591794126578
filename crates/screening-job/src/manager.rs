//! The asynchronous job manager: accepts a screening request, runs the
//! tiered pipeline on a background worker, and serves progress/result
//! polling. Job-map mutations hold a single short-lived mutex; workers
//! never hold it across a propagation or HTTP call (spec.md §4.10, §5).

use crate::job::{sort_threats, Job, JobStatus, ScreeningResult, ScreeningStats, Threat};
use crate::traits::{render_failure_placeholder, NarrativeGenerator, PdfRenderer};
use candidate_pipeline::candidates_for;
use conjunction_screener::ScreenRequest;
use orbital_propagator::Tle;
use risk_profiles::{classify_priority, PriorityTier};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tle_catalog::{Catalog, CatalogClient};
use tracing::warn;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum JobError {
    #[error("input error: {0}")]
    InputError(String),
    #[error("job not found")]
    NotFound,
}

pub type Result<T> = std::result::Result<T, JobError>;

const DEFAULT_CATALOG_LIMIT: usize = 5_000;

/// Parameters accepted at submission time (spec.md §4.10).
pub struct SubmitRequest {
    pub tle_file_bytes: Vec<u8>,
    pub suppress_green: bool,
    pub catalog_limit: Option<usize>,
}

pub struct JobManager {
    jobs: tokio::sync::Mutex<HashMap<Uuid, Job>>,
    catalog: Arc<Catalog>,
    live_client: Option<Arc<dyn CatalogClient>>,
    narrative: Arc<dyn NarrativeGenerator>,
    pdf: Arc<dyn PdfRenderer>,
}

impl JobManager {
    pub fn new(
        catalog: Arc<Catalog>,
        live_client: Option<Arc<dyn CatalogClient>>,
        narrative: Arc<dyn NarrativeGenerator>,
        pdf: Arc<dyn PdfRenderer>,
    ) -> Arc<Self> {
        Arc::new(Self {
            jobs: tokio::sync::Mutex::new(HashMap::new()),
            catalog,
            live_client,
            narrative,
            pdf,
        })
    }

    /// Validate and parse the upload into 1..K primaries, create a
    /// `queued` job, and schedule its worker. Returns the job id
    /// synchronously; parse failures surface to the caller immediately
    /// (spec.md §7: submission-phase errors are synchronous).
    pub async fn submit(self: &Arc<Self>, req: SubmitRequest) -> Result<Uuid> {
        let text = String::from_utf8_lossy(&req.tle_file_bytes).into_owned();
        let primaries = tle_catalog::parse_tle_stream(&text);
        if primaries.is_empty() {
            return Err(JobError::InputError(
                "uploaded file yielded zero valid TLEs".into(),
            ));
        }

        let id = Uuid::new_v4();
        {
            let mut jobs = self.jobs.lock().await;
            jobs.insert(id, Job::queued(id));
        }

        let manager = Arc::clone(self);
        let catalog_limit = req.catalog_limit.unwrap_or(DEFAULT_CATALOG_LIMIT);
        let suppress_green = req.suppress_green;
        tokio::spawn(async move {
            manager.run_worker(id, primaries, suppress_green, catalog_limit).await;
        });

        Ok(id)
    }

    /// `{status, result?, error?}` for one job.
    pub async fn status(&self, id: Uuid) -> Result<Job> {
        self.jobs.lock().await.get(&id).cloned().ok_or(JobError::NotFound)
    }

    async fn set_running(&self, id: Uuid) {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.status = JobStatus::Running;
        }
    }

    async fn set_result(&self, id: Uuid, result: ScreeningResult) {
        let status = if result.threats.is_empty() {
            JobStatus::AllClear
        } else {
            JobStatus::Success
        };
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.status = status;
            job.result = Some(result);
        }
    }

    async fn set_failed(&self, id: Uuid, error: String) {
        let mut jobs = self.jobs.lock().await;
        if let Some(job) = jobs.get_mut(&id) {
            job.status = JobStatus::Failed;
            job.error = Some(error);
        }
    }

    async fn run_worker(
        self: Arc<Self>,
        id: Uuid,
        primaries: Vec<Tle>,
        suppress_green: bool,
        catalog_limit: usize,
    ) {
        let start = Instant::now();
        self.set_running(id).await;

        let outcome = if primaries.len() == 1 {
            self.run_single_sat(&primaries[0], suppress_green, catalog_limit).await
        } else {
            self.run_fleet(&primaries, suppress_green).await
        };

        let (mut threats, stats) = match outcome {
            Ok(pair) => pair,
            Err(msg) => {
                self.set_failed(id, msg).await;
                return;
            }
        };

        // Fatal only when a single-sat job has no upstream catalog at
        // all (nothing to sweep) and the manned tier produced nothing
        // either — otherwise an empty threat list is a legitimate
        // all-clear (spec.md §7 JobFatal vs. `all_clear`).
        if primaries.len() == 1
            && threats.is_empty()
            && stats.manned_checked == 0
            && self.catalog.len().await == 0
        {
            self.set_failed(
                id,
                "catalog unavailable and no live manned TLEs reachable".into(),
            )
            .await;
            return;
        }

        sort_threats(&mut threats);

        let mut stats = stats;
        stats.total_time_sec = start.elapsed().as_secs_f64();

        let result = self.assemble_result(threats, stats).await;
        self.set_result(id, result).await;
    }

    /// Tier 1 (manned) then Tier 2/3 (catalog sweep), spec.md §4.10 step 2.
    async fn run_single_sat(
        &self,
        primary: &Tle,
        suppress_green: bool,
        catalog_limit: usize,
    ) -> std::result::Result<(Vec<Threat>, ScreeningStats), String> {
        let mut threats = Vec::new();
        let mut stats = ScreeningStats::default();

        let primary_norad = primary.norad_id().ok();

        // Tier 1: manned assets, fetched live.
        for &manned_id in &risk_profiles::MANNED_NORAD_IDS {
            if primary_norad == Some(manned_id) {
                continue;
            }
            let Some(client) = self.live_client.as_ref() else {
                continue;
            };
            let tle_text = match client.gp(manned_id, 1, "EPOCH desc").await {
                Ok(text) => text,
                Err(e) => {
                    warn!("live TLE fetch failed for manned id {}: {}", manned_id, e);
                    continue;
                }
            };
            let Some(secondary) = tle_catalog::parse_tle_stream(&tle_text).into_iter().next() else {
                continue;
            };

            stats.manned_checked += 1;
            let req = ScreenRequest::new(primary, &secondary).suppress_green(suppress_green);
            match conjunction_screener::screen(&req) {
                Ok(Some(telemetry)) => {
                    threats.push(Threat::new(telemetry, PriorityTier::Manned, None));
                }
                Ok(None) => {}
                Err(e) => warn!("manned-tier screen failed for {}: {}", manned_id, e),
            }
        }

        // Tier 2/3: catalog sweep.
        let primary_norads: Vec<u32> = primary_norad.into_iter().collect();
        let candidates = match candidates_for(self.catalog.as_ref(), primary, &primary_norads).await {
            Ok(c) => c,
            Err(e) => {
                warn!("candidate pipeline failed, catalog tier skipped: {}", e);
                Vec::new()
            }
        };

        for entry in candidates.into_iter().take(catalog_limit) {
            let req = ScreenRequest::new(primary, &entry.tle).suppress_green(suppress_green);
            match conjunction_screener::screen(&req) {
                Ok(Some(telemetry)) => {
                    let (tier, reason) = classify_priority(entry.norad_id, &entry.orbit_params);
                    match tier {
                        PriorityTier::HighRisk => stats.high_risk_checked += 1,
                        _ => stats.catalog_checked += 1,
                    }
                    threats.push(Threat::new(telemetry, tier, reason));
                }
                Ok(None) => match classify_priority(entry.norad_id, &entry.orbit_params).0 {
                    PriorityTier::HighRisk => stats.high_risk_checked += 1,
                    _ => stats.catalog_checked += 1,
                },
                Err(e) => {
                    // PropagatorError: skip this pair, continue the sweep.
                    warn!("candidate {} failed to screen: {}", entry.norad_id, e);
                }
            }
        }

        Ok((threats, stats))
    }

    /// Fleet mode: `primaries[0]` vs. every other uploaded entry,
    /// spec.md §4.10 step 3.
    async fn run_fleet(
        &self,
        primaries: &[Tle],
        suppress_green: bool,
    ) -> std::result::Result<(Vec<Threat>, ScreeningStats), String> {
        let primary = &primaries[0];
        let mut threats = Vec::new();
        let mut stats = ScreeningStats::default();

        for secondary in &primaries[1..] {
            let req = ScreenRequest::new(primary, secondary).suppress_green(suppress_green);
            let telemetry = match conjunction_screener::screen(&req) {
                Ok(Some(t)) => t,
                Ok(None) => continue,
                Err(e) => {
                    warn!("fleet-mode screen failed: {}", e);
                    continue;
                }
            };

            let (tier, reason) = match secondary
                .norad_id()
                .ok()
                .and_then(|id| tle_catalog::parse_orbit_params(secondary).ok().map(|o| (id, o)))
            {
                Some((id, orbit)) => classify_priority(id, &orbit),
                None => (PriorityTier::Catalog, None),
            };

            match tier {
                PriorityTier::Manned => stats.manned_checked += 1,
                PriorityTier::HighRisk => stats.high_risk_checked += 1,
                PriorityTier::Catalog => stats.catalog_checked += 1,
            }

            threats.push(Threat::new(telemetry, tier, reason));
        }

        Ok((threats, stats))
    }

    /// Choose the top threat (first RED/YELLOW by sorted order,
    /// fallback: globally closest), generate its narrative and PDF,
    /// and assemble the final payload (spec.md §4.10 steps 4-6).
    async fn assemble_result(&self, threats: Vec<Threat>, stats: ScreeningStats) -> ScreeningResult {
        if threats.is_empty() {
            return ScreeningResult {
                status: "all_clear",
                risk_level: None,
                threats,
                decision: None,
                profile: None,
                profile_type: None,
                geometry: None,
                has_ric_plot: false,
                screening_stats: stats,
                maneuver: None,
            };
        }

        let top_idx = threats
            .iter()
            .position(|t| {
                t.telemetry.risk_level == risk_profiles::RiskLevel::Red
                    || t.telemetry.risk_level == risk_profiles::RiskLevel::Yellow
            })
            .unwrap_or_else(|| {
                threats
                    .iter()
                    .enumerate()
                    .min_by(|a, b| a.1.telemetry.min_dist_km.total_cmp(&b.1.telemetry.min_dist_km))
                    .map(|(i, _)| i)
                    .unwrap_or(0)
            });

        let mut threats = threats;
        let narrative = self.generate_narrative(&threats[top_idx]).await;
        let pdf_url = self.render_pdf(&threats[top_idx], &narrative).await;
        threats[top_idx].pdf_url = Some(pdf_url);

        let top = &threats[top_idx];
        ScreeningResult {
            status: "success",
            risk_level: Some(top.telemetry.risk_level),
            decision: Some(narrative),
            profile: Some(top.telemetry.profile_name),
            profile_type: Some(top.telemetry.profile_type),
            geometry: Some(top.telemetry.geometry),
            has_ric_plot: top.telemetry.ric_plot_png_b64.is_some(),
            maneuver: top.telemetry.maneuver,
            screening_stats: stats,
            threats,
        }
    }

    async fn generate_narrative(&self, threat: &Threat) -> String {
        let prompt = format!(
            "Summarize this conjunction for an operator: {} vs {}, miss distance {:.3} km at {}, risk {:?}.",
            threat.telemetry.primary_name,
            threat.telemetry.secondary_name,
            threat.telemetry.min_dist_km,
            threat.telemetry.tca_utc,
            threat.telemetry.risk_level,
        );
        match self.narrative.generate(&prompt).await {
            Ok(text) => text,
            Err(e) => {
                warn!("narrative generation failed, using canned fallback: {}", e);
                crate::traits::CANNED_NARRATIVE_FALLBACK.to_string()
            }
        }
    }

    async fn render_pdf(&self, threat: &Threat, narrative: &str) -> String {
        match self.pdf.render(&threat.telemetry, narrative).await {
            Ok(filename) => filename,
            Err(e) => {
                warn!("PDF render failed, using placeholder: {}", e);
                render_failure_placeholder()
            }
        }
    }
}
