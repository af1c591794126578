//! Operational profile table, risk classifier, and the NORAD-ID/orbit
//! based object classifier.

use serde::{Deserialize, Serialize};
use tle_catalog::OrbitParams;

/// Which fixed threshold table applies to a conjunction pair.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProfileType {
    IssClass,
    Commercial,
    Constellation,
}

/// Fixed per-profile thresholds (spec table, build-time constants —
/// never derived at runtime).
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OperationalProfile {
    pub profile_type: ProfileType,
    pub yellow_km: f64,
    pub red_km: f64,
    pub yellow_pc: f64,
    pub red_pc: f64,
    pub maneuver_km: f64,
    pub default_covariance_km: f64,
}

const ISS_CLASS: OperationalProfile = OperationalProfile {
    profile_type: ProfileType::IssClass,
    yellow_km: 25.0,
    red_km: 10.0,
    yellow_pc: 1e-6,
    red_pc: 1e-5,
    maneuver_km: 10.0,
    default_covariance_km: 0.5,
};

const COMMERCIAL: OperationalProfile = OperationalProfile {
    profile_type: ProfileType::Commercial,
    yellow_km: 5.0,
    red_km: 1.0,
    yellow_pc: 1e-6,
    red_pc: 1e-5,
    maneuver_km: 1.0,
    default_covariance_km: 1.0,
};

const CONSTELLATION: OperationalProfile = OperationalProfile {
    profile_type: ProfileType::Constellation,
    yellow_km: 20.0,
    red_km: 5.0,
    yellow_pc: 1e-5,
    red_pc: 1e-4,
    maneuver_km: 2.0,
    default_covariance_km: 2.0,
};

/// Look up the fixed threshold table for a profile type.
pub fn profile_for(profile_type: ProfileType) -> OperationalProfile {
    match profile_type {
        ProfileType::IssClass => ISS_CLASS,
        ProfileType::Commercial => COMMERCIAL,
        ProfileType::Constellation => CONSTELLATION,
    }
}

impl ProfileType {
    /// The wire-facing label used in result payloads (`profile` field).
    pub fn label(self) -> &'static str {
        match self {
            ProfileType::IssClass => "ISS_CLASS",
            ProfileType::Commercial => "COMMERCIAL",
            ProfileType::Constellation => "CONSTELLATION",
        }
    }
}

/// NORAD IDs of the two manned demo assets (ISS, Tiangong).
pub const MANNED_NORAD_IDS: [u32; 2] = [25544, 48274];

/// Select a profile by NORAD ID table lookup.
///
/// The Starlink range `[46500, 59999]` overlaps the OneWeb and Kuiper
/// ranges below it; priority is frozen as **Manned > Starlink > OneWeb
/// > Kuiper > Commercial** and the table below checks in that literal
/// order, returning on first match.
pub fn classify_profile(norad_id: u32) -> ProfileType {
    if MANNED_NORAD_IDS.contains(&norad_id) {
        return ProfileType::IssClass;
    }
    let in_starlink = (44000..=46000).contains(&norad_id) || (46500..=59999).contains(&norad_id);
    if in_starlink {
        return ProfileType::Constellation;
    }
    let in_oneweb = (47000..=47999).contains(&norad_id) || (48000..=48500).contains(&norad_id);
    if in_oneweb {
        return ProfileType::Constellation;
    }
    if (58000..=59000).contains(&norad_id) {
        return ProfileType::Constellation;
    }
    ProfileType::Commercial
}

/// `{GREEN, YELLOW, RED}` classification from miss distance and Pc
/// against a profile's thresholds.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RiskLevel {
    Green,
    Yellow,
    Red,
}

pub fn classify_risk(miss_km: f64, pc: f64, profile: &OperationalProfile) -> RiskLevel {
    if miss_km < profile.red_km || pc > profile.red_pc {
        RiskLevel::Red
    } else if miss_km < profile.yellow_km || pc > profile.yellow_pc {
        RiskLevel::Yellow
    } else {
        RiskLevel::Green
    }
}

/// Job-result ordering tier: lower rank sorts first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum PriorityTier {
    Manned,
    HighRisk,
    Catalog,
}

impl PriorityTier {
    pub fn rank(self) -> u8 {
        match self {
            PriorityTier::Manned => 0,
            PriorityTier::HighRisk => 1,
            PriorityTier::Catalog => 2,
        }
    }
}

/// Classify the priority tier of an object from its NORAD ID and
/// derived orbit. Returns the tier and, for `HighRisk`, the reason
/// string surfaced to operators.
pub fn classify_priority(norad_id: u32, orbit: &OrbitParams) -> (PriorityTier, Option<&'static str>) {
    if MANNED_NORAD_IDS.contains(&norad_id) {
        return (PriorityTier::Manned, None);
    }
    if orbit.perigee_km < 300.0 {
        return (PriorityTier::HighRisk, Some("decaying orbit"));
    }
    if orbit.eccentricity > 0.1 {
        return (PriorityTier::HighRisk, Some("highly elliptical"));
    }
    if orbit.mean_motion_derivative.abs() > 1e-5 {
        return (PriorityTier::HighRisk, Some("active decay/maneuver"));
    }
    (PriorityTier::Catalog, None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn orbit(perigee_km: f64, eccentricity: f64, mean_motion_derivative: f64) -> OrbitParams {
        OrbitParams {
            perigee_km,
            apogee_km: perigee_km + 10.0,
            inclination_deg: 51.6,
            raan_deg: 0.0,
            mean_motion_revs_per_day: 15.5,
            eccentricity,
            mean_motion_derivative,
        }
    }

    #[test]
    fn manned_ids_select_iss_class() {
        assert_eq!(classify_profile(25544), ProfileType::IssClass);
        assert_eq!(classify_profile(48274), ProfileType::IssClass);
    }

    #[test]
    fn starlink_range_wins_over_oneweb_overlap() {
        // 47500 falls in both the Starlink [46500,59999] and OneWeb
        // [47000,47999] ranges; Starlink's priority wins.
        assert_eq!(classify_profile(47500), ProfileType::Constellation);
    }

    #[test]
    fn kuiper_range_selects_constellation() {
        assert_eq!(classify_profile(58500), ProfileType::Constellation);
    }

    #[test]
    fn unmatched_id_defaults_to_commercial() {
        assert_eq!(classify_profile(12345), ProfileType::Commercial);
    }

    #[test]
    fn low_starlink_range_selects_constellation() {
        assert_eq!(classify_profile(45000), ProfileType::Constellation);
    }

    #[test]
    fn risk_red_on_miss_distance_alone() {
        let p = profile_for(ProfileType::Commercial);
        assert_eq!(classify_risk(0.5, 0.0, &p), RiskLevel::Red);
    }

    #[test]
    fn risk_red_on_pc_alone() {
        let p = profile_for(ProfileType::Commercial);
        assert_eq!(classify_risk(100.0, 1e-4, &p), RiskLevel::Red);
    }

    #[test]
    fn risk_yellow_between_thresholds() {
        let p = profile_for(ProfileType::Commercial);
        assert_eq!(classify_risk(3.0, 0.0, &p), RiskLevel::Yellow);
    }

    #[test]
    fn risk_green_when_clear() {
        let p = profile_for(ProfileType::Commercial);
        assert_eq!(classify_risk(50.0, 0.0, &p), RiskLevel::Green);
    }

    #[test]
    fn priority_manned_overrides_orbit_shape() {
        let (tier, reason) = classify_priority(25544, &orbit(400.0, 0.0005, 0.0));
        assert_eq!(tier, PriorityTier::Manned);
        assert!(reason.is_none());
    }

    #[test]
    fn priority_decaying_orbit_is_high_risk() {
        let (tier, reason) = classify_priority(99999, &orbit(250.0, 0.001, 0.0));
        assert_eq!(tier, PriorityTier::HighRisk);
        assert_eq!(reason, Some("decaying orbit"));
    }

    #[test]
    fn priority_highly_elliptical_is_high_risk() {
        let (tier, reason) = classify_priority(99999, &orbit(500.0, 0.2, 0.0));
        assert_eq!(tier, PriorityTier::HighRisk);
        assert_eq!(reason, Some("highly elliptical"));
    }

    #[test]
    fn priority_active_maneuver_is_high_risk() {
        let (tier, reason) = classify_priority(99999, &orbit(500.0, 0.001, 2e-5));
        assert_eq!(tier, PriorityTier::HighRisk);
        assert_eq!(reason, Some("active decay/maneuver"));
    }

    #[test]
    fn priority_nominal_orbit_is_catalog() {
        let (tier, reason) = classify_priority(99999, &orbit(500.0, 0.001, 0.0));
        assert_eq!(tier, PriorityTier::Catalog);
        assert!(reason.is_none());
    }

    #[test]
    fn priority_rank_orders_manned_before_high_risk_before_catalog() {
        assert!(PriorityTier::Manned.rank() < PriorityTier::HighRisk.rank());
        assert!(PriorityTier::HighRisk.rank() < PriorityTier::Catalog.rank());
    }

    proptest! {
        #[test]
        fn red_implies_the_red_disjunction(
            miss in 0.0f64..200.0,
            pc in 0.0f64..1.0,
        ) {
            let p = profile_for(ProfileType::Commercial);
            let level = classify_risk(miss, pc, &p);
            if level == RiskLevel::Red {
                prop_assert!(miss < p.red_km || pc > p.red_pc);
            }
        }

        #[test]
        fn green_implies_not_yellow_and_not_red(
            miss in 0.0f64..200.0,
            pc in 0.0f64..1.0,
        ) {
            let p = profile_for(ProfileType::Commercial);
            let level = classify_risk(miss, pc, &p);
            if level == RiskLevel::Green {
                prop_assert!(miss >= p.yellow_km);
                prop_assert!(pc <= p.yellow_pc);
                prop_assert!(miss >= p.red_km);
                prop_assert!(pc <= p.red_pc);
            }
        }
    }
}
