//! RIC frame decomposition and probability-of-collision for one
//! conjunction pair, evaluated at a single shared epoch.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GeometryError {
    #[error("degenerate primary state vector: {0}")]
    DegenerateState(String),
}

pub type Result<T> = std::result::Result<T, GeometryError>;

/// Combined hard-body radius used by the Pc model. Fixed by design, not
/// derived per-object.
pub const HARD_BODY_RADIUS_KM: f64 = 0.020;

/// Radial/in-track/cross-track decomposition of the secondary's offset
/// from the primary, plus relative velocity magnitude.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct RicGeometry {
    pub radial_km: f64,
    pub in_track_km: f64,
    pub cross_track_km: f64,
    pub relative_velocity_kms: f64,
}

/// Decompose the secondary's position `s` into the primary's RIC frame,
/// built from the primary's own position `p` and velocity `v` (all ECI
/// km, km/s, same epoch).
///
/// Undefined if `p` or `p × v` is the zero vector; callers must
/// guarantee a non-degenerate primary state (true for any real LEO
/// TLE at any propagated epoch).
pub fn ric_geometry(
    p: [f64; 3],
    v: [f64; 3],
    s: [f64; 3],
    v_s: [f64; 3],
) -> Result<RicGeometry> {
    let p = Vector3::from(p);
    let v = Vector3::from(v);
    let s = Vector3::from(s);
    let v_s = Vector3::from(v_s);

    let p_norm = p.norm();
    if p_norm == 0.0 {
        return Err(GeometryError::DegenerateState(
            "primary position vector is zero".into(),
        ));
    }
    let u_r = p / p_norm;

    let h = p.cross(&v);
    let h_norm = h.norm();
    if h_norm == 0.0 {
        return Err(GeometryError::DegenerateState(
            "primary position and velocity are parallel".into(),
        ));
    }
    let u_c = h / h_norm;
    let u_i = u_c.cross(&u_r);

    let r = s - p;

    Ok(RicGeometry {
        radial_km: r.dot(&u_r),
        in_track_km: r.dot(&u_i),
        cross_track_km: r.dot(&u_c),
        relative_velocity_kms: (v_s - v).norm(),
    })
}

/// First-order 2-D Gaussian circular-cross-section collision
/// probability from miss distance and combined 1-sigma position
/// uncertainty. The formula is fixed; refinements are out of scope.
pub fn probability_of_collision(miss_km: f64, combined_sigma_km: f64) -> f64 {
    if combined_sigma_km <= 0.0 {
        return 0.0;
    }
    if miss_km < HARD_BODY_RADIUS_KM {
        return 1.0;
    }
    let z = miss_km / combined_sigma_km;
    let pc = (-0.5 * z * z).exp() * (HARD_BODY_RADIUS_KM / combined_sigma_km).powi(2);
    pc.min(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn radial_axis_matches_primary_position_direction() {
        // Secondary directly above primary's position (purely radial offset).
        let p = [7000.0, 0.0, 0.0];
        let v = [0.0, 7.5, 0.0];
        let s = [7010.0, 0.0, 0.0];
        let v_s = [0.0, 7.5, 0.0];

        let geo = ric_geometry(p, v, s, v_s).unwrap();
        assert!((geo.radial_km - 10.0).abs() < 1e-9);
        assert!(geo.in_track_km.abs() < 1e-9);
        assert!(geo.cross_track_km.abs() < 1e-9);
    }

    #[test]
    fn cross_track_axis_matches_orbit_normal() {
        let p = [7000.0, 0.0, 0.0];
        let v = [0.0, 7.5, 0.0];
        let s = [7000.0, 0.0, 5.0];
        let v_s = [0.0, 7.5, 0.0];

        let geo = ric_geometry(p, v, s, v_s).unwrap();
        assert!(geo.radial_km.abs() < 1e-9);
        assert!(geo.in_track_km.abs() < 1e-9);
        assert!((geo.cross_track_km.abs() - 5.0).abs() < 1e-9);
    }

    #[test]
    fn relative_velocity_is_euclidean_norm_of_difference() {
        let p = [7000.0, 0.0, 0.0];
        let v = [0.0, 7.5, 0.0];
        let s = [7010.0, 0.0, 0.0];
        let v_s = [0.0, 7.5 + 3.0, 4.0];

        let geo = ric_geometry(p, v, s, v_s).unwrap();
        assert!((geo.relative_velocity_kms - 5.0).abs() < 1e-9);
    }

    #[test]
    fn degenerate_zero_position_is_rejected() {
        let p = [0.0, 0.0, 0.0];
        let v = [0.0, 7.5, 0.0];
        let s = [7010.0, 0.0, 0.0];
        let v_s = [0.0, 7.5, 0.0];

        assert!(ric_geometry(p, v, s, v_s).is_err());
    }

    #[test]
    fn degenerate_parallel_position_and_velocity_is_rejected() {
        let p = [7000.0, 0.0, 0.0];
        let v = [1.0, 0.0, 0.0];
        let s = [7010.0, 0.0, 0.0];
        let v_s = [0.0, 7.5, 0.0];

        assert!(ric_geometry(p, v, s, v_s).is_err());
    }

    #[test]
    fn pc_at_zero_sigma_is_zero() {
        assert_eq!(probability_of_collision(1.0, 0.0), 0.0);
    }

    #[test]
    fn pc_inside_hard_body_radius_is_one() {
        assert_eq!(probability_of_collision(0.01, 1.0), 1.0);
    }

    #[test]
    fn pc_far_miss_is_near_zero() {
        let pc = probability_of_collision(100.0, 1.0);
        assert!(pc < 1e-6);
    }

    proptest! {
        #[test]
        fn pc_is_always_in_unit_interval(miss in 0.0f64..500.0, sigma in 0.0f64..50.0) {
            let pc = probability_of_collision(miss, sigma);
            prop_assert!((0.0..=1.0).contains(&pc));
        }

        #[test]
        fn pc_is_monotone_non_increasing_in_miss_distance(
            sigma in 0.1f64..50.0,
            a in 0.0f64..250.0,
            delta in 0.0f64..250.0,
        ) {
            let b = a + delta;
            let pc_a = probability_of_collision(a, sigma);
            let pc_b = probability_of_collision(b, sigma);
            prop_assert!(pc_b <= pc_a + 1e-12);
        }
    }
}
