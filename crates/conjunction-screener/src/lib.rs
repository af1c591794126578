//! Screens one primary+secondary pair: dense-grid SGP4 sampling over a
//! forward horizon, argmin distance, RIC/Pc/risk, optional maneuver
//! and RIC plot, assembled into a `Telemetry` record.

mod plot;

use chrono::{DateTime, Duration as ChronoDuration, Utc};
use conjunction_geometry::{ric_geometry, probability_of_collision};
use maneuver_planner::{plan_maneuver, Maneuver};
use orbital_propagator::Tle;
use risk_profiles::{classify_profile, classify_risk, profile_for, OperationalProfile, ProfileType, RiskLevel};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScreenerError {
    #[error("primary propagator error: {0}")]
    PrimaryPropagator(String),
    #[error("secondary propagator error: {0}")]
    SecondaryPropagator(String),
    #[error("geometry error: {0}")]
    Geometry(String),
    #[error("plot render failed: {0}")]
    PlotFailed(String),
}

pub type Result<T> = std::result::Result<T, ScreenerError>;

const GRID_SAMPLES: usize = 2000;
const DEFAULT_HORIZON_DAYS: i64 = 7;
const RIC_PLOT_THRESHOLD_KM: f64 = 10.0;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Geometry {
    pub radial_km: f64,
    pub in_track_km: f64,
    pub cross_track_km: f64,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Thresholds {
    pub yellow_km: f64,
    pub red_km: f64,
    pub yellow_pc: f64,
    pub red_pc: f64,
    pub maneuver_km: f64,
}

impl From<OperationalProfile> for Thresholds {
    fn from(p: OperationalProfile) -> Self {
        Self {
            yellow_km: p.yellow_km,
            red_km: p.red_km,
            yellow_pc: p.yellow_pc,
            red_pc: p.red_pc,
            maneuver_km: p.maneuver_km,
        }
    }
}

/// The result of screening one primary+secondary pair, immutable after
/// construction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Telemetry {
    pub primary_name: String,
    pub secondary_name: String,
    pub tca_utc: DateTime<Utc>,
    pub min_dist_km: f64,
    pub relative_velocity_kms: f64,
    pub pc: f64,
    pub risk_level: RiskLevel,
    pub geometry: Geometry,
    pub combined_covariance_km: f64,
    pub maneuver: Option<Maneuver>,
    pub profile_name: &'static str,
    pub profile_type: ProfileType,
    pub thresholds: Thresholds,
    pub ric_plot_png_b64: Option<String>,
}

/// Parameters for one pair screening. `primary_norad`/`secondary_norad`
/// drive profile and priority classification when known; a synthetic
/// or uploaded TLE without a resolvable NORAD ID falls back to
/// `COMMERCIAL`.
pub struct ScreenRequest<'a> {
    pub primary_tle: &'a Tle,
    pub secondary_tle: &'a Tle,
    pub primary_norad: Option<u32>,
    pub secondary_norad: Option<u32>,
    pub days: i64,
    pub suppress_green: bool,
}

impl<'a> ScreenRequest<'a> {
    pub fn new(primary_tle: &'a Tle, secondary_tle: &'a Tle) -> Self {
        Self {
            primary_tle,
            secondary_tle,
            primary_norad: primary_tle.norad_id().ok(),
            secondary_norad: secondary_tle.norad_id().ok(),
            days: DEFAULT_HORIZON_DAYS,
            suppress_green: false,
        }
    }

    pub fn suppress_green(mut self, suppress: bool) -> Self {
        self.suppress_green = suppress;
        self
    }
}

fn select_profile(primary_norad: Option<u32>, secondary_norad: Option<u32>) -> ProfileType {
    primary_norad
        .or(secondary_norad)
        .map(classify_profile)
        .unwrap_or(ProfileType::Commercial)
}

/// Screen one primary+secondary pair. Returns `None` when the event is
/// GREEN and `suppress_green` is set.
pub fn screen(req: &ScreenRequest) -> Result<Option<Telemetry>> {
    let primary_prop = orbital_propagator::build(req.primary_tle)
        .map_err(|e| ScreenerError::PrimaryPropagator(e.to_string()))?;
    let secondary_prop = orbital_propagator::build(req.secondary_tle)
        .map_err(|e| ScreenerError::SecondaryPropagator(e.to_string()))?;

    let now = Utc::now();
    let times: Vec<DateTime<Utc>> = (0..GRID_SAMPLES)
        .map(|i| {
            let frac = i as f64 / (GRID_SAMPLES - 1) as f64;
            now + ChronoDuration::milliseconds((frac * req.days as f64 * 86_400_000.0) as i64)
        })
        .collect();

    let primary_states = orbital_propagator::propagate(&primary_prop, &times)
        .map_err(|e| ScreenerError::PrimaryPropagator(e.to_string()))?;
    let secondary_states = orbital_propagator::propagate(&secondary_prop, &times)
        .map_err(|e| ScreenerError::SecondaryPropagator(e.to_string()))?;

    // argmin with smallest-index tie-break: iterate in order, only
    // replace on a strictly smaller distance.
    let mut min_idx = 0usize;
    let mut min_dist = f64::INFINITY;
    for (i, (p, s)) in primary_states.iter().zip(secondary_states.iter()).enumerate() {
        let d = [
            s.position_km[0] - p.position_km[0],
            s.position_km[1] - p.position_km[1],
            s.position_km[2] - p.position_km[2],
        ];
        let dist = (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt();
        if dist < min_dist {
            min_dist = dist;
            min_idx = i;
        }
    }

    let tca = times[min_idx];
    let p = &primary_states[min_idx];
    let s = &secondary_states[min_idx];

    let geo = ric_geometry(p.position_km, p.velocity_km_s, s.position_km, s.velocity_km_s)
        .map_err(|e| ScreenerError::Geometry(e.to_string()))?;

    let profile_type = select_profile(req.primary_norad, req.secondary_norad);
    let profile = profile_for(profile_type);

    let pc = probability_of_collision(min_dist, profile.default_covariance_km);
    let risk_level = classify_risk(min_dist, pc, &profile);

    let maneuver = (min_dist < profile.maneuver_km)
        .then(|| plan_maneuver(geo.radial_km, min_dist, tca));

    let ric_plot_png_b64 = if min_dist < RIC_PLOT_THRESHOLD_KM {
        Some(plot::render_ric_plot(geo.radial_km, geo.in_track_km, min_dist)?)
    } else {
        None
    };

    if req.suppress_green && risk_level == RiskLevel::Green {
        return Ok(None);
    }

    Ok(Some(Telemetry {
        primary_name: req.primary_tle.name.clone(),
        secondary_name: req.secondary_tle.name.clone(),
        tca_utc: tca,
        min_dist_km: min_dist,
        relative_velocity_kms: geo.relative_velocity_kms,
        pc,
        risk_level,
        geometry: Geometry {
            radial_km: geo.radial_km,
            in_track_km: geo.in_track_km,
            cross_track_km: geo.cross_track_km,
        },
        combined_covariance_km: profile.default_covariance_km,
        maneuver,
        profile_name: profile_type.label(),
        profile_type,
        thresholds: profile.into(),
        ric_plot_png_b64,
    }))
}
