//! First-order avoidance maneuver heuristic.
//!
//! This is an operator-visible **heuristic**, not a trajectory
//! optimizer — the contract is that every field is populated and
//! self-consistent, not that it reflects validated flight dynamics.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum BurnType {
    RadialPlus,
    RadialMinus,
    InTrack,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Maneuver {
    pub delta_v_ms: f64,
    pub burn_type: BurnType,
    pub execution_time: DateTime<Utc>,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub post_maneuver_miss_km: f64,
    pub fuel_cost_kg: f64,
}

const RADIAL_NEAR_ZERO_KM: f64 = 1.0;
const TARGET_SEPARATION_KM: f64 = 10.0;
const RADIAL_DELTA_V_PER_KM_MS: f64 = 100.0;
const IN_TRACK_DELTA_V_MS: f64 = 50.0;
const RADIAL_LEAD_TIME_HOURS: f64 = 1.5;
const IN_TRACK_LEAD_TIME_HOURS: f64 = 0.5;
const FUEL_KG_PER_MS: f64 = 0.001;
const WINDOW_HALF_WIDTH_MINUTES: i64 = 30;

/// Plan a first-order avoidance maneuver from the conjunction's radial
/// offset, miss distance, and time of closest approach.
pub fn plan_maneuver(radial_km: f64, miss_km: f64, tca: DateTime<Utc>) -> Maneuver {
    let (delta_v_ms, burn_type, lead_time_h, post_maneuver_miss_km) =
        if radial_km.abs() < RADIAL_NEAR_ZERO_KM {
            let delta_r_needed = TARGET_SEPARATION_KM - radial_km.abs();
            let delta_v_ms = delta_r_needed.abs() * RADIAL_DELTA_V_PER_KM_MS;
            let burn_type = if radial_km < 0.0 {
                BurnType::RadialPlus
            } else {
                BurnType::RadialMinus
            };
            let post_miss = radial_km.abs() + delta_r_needed;
            (delta_v_ms, burn_type, RADIAL_LEAD_TIME_HOURS, post_miss)
        } else {
            (
                IN_TRACK_DELTA_V_MS,
                BurnType::InTrack,
                IN_TRACK_LEAD_TIME_HOURS,
                miss_km * 1.5,
            )
        };

    let execution_time = tca - Duration::milliseconds((lead_time_h * 3_600_000.0) as i64);
    let half_width = Duration::minutes(WINDOW_HALF_WIDTH_MINUTES);

    Maneuver {
        delta_v_ms,
        burn_type,
        execution_time,
        window_start: execution_time - half_width,
        window_end: execution_time + half_width,
        post_maneuver_miss_km,
        fuel_cost_kg: delta_v_ms * FUEL_KG_PER_MS,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn tca() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn near_zero_radial_with_negative_offset_burns_radial_plus() {
        let m = plan_maneuver(-0.4, 0.4, tca());
        assert_eq!(m.burn_type, BurnType::RadialPlus);
    }

    #[test]
    fn near_zero_radial_with_positive_offset_burns_radial_minus() {
        let m = plan_maneuver(0.4, 0.4, tca());
        assert_eq!(m.burn_type, BurnType::RadialMinus);
    }

    #[test]
    fn large_radial_offset_uses_in_track_burn() {
        let m = plan_maneuver(5.0, 5.0, tca());
        assert_eq!(m.burn_type, BurnType::InTrack);
        assert!((m.delta_v_ms - 50.0).abs() < 1e-9);
        assert!((m.post_maneuver_miss_km - 7.5).abs() < 1e-9);
    }

    #[test]
    fn synthetic_close_approach_matches_documented_delta_v() {
        // spec boundary scenario: 0.4 km radial miss under COMMERCIAL,
        // expect Δv ≈ 960 m/s (±5%), window_start 2h before TCA ±1min.
        let m = plan_maneuver(0.4, 0.4, tca());
        assert!((m.delta_v_ms - 960.0).abs() / 960.0 < 0.05, "{}", m.delta_v_ms);

        let expected_execution = tca() - Duration::minutes(90);
        let drift = (m.execution_time - expected_execution).num_seconds().abs();
        assert!(drift < 60, "execution_time drift {drift}s");
    }

    #[test]
    fn fuel_cost_is_linear_in_delta_v() {
        let m = plan_maneuver(5.0, 5.0, tca());
        assert!((m.fuel_cost_kg - m.delta_v_ms * 0.001).abs() < 1e-12);
    }

    #[test]
    fn window_is_symmetric_around_execution_time() {
        let m = plan_maneuver(5.0, 5.0, tca());
        let before = m.execution_time - m.window_start;
        let after = m.window_end - m.execution_time;
        assert_eq!(before, after);
        assert_eq!(before, Duration::minutes(30));
    }
}
