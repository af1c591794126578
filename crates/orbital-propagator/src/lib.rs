//! Orbit propagator adapter.
//!
//! Wraps SGP4/SDP4 (WGS-72/84 constants) behind a small, vectorized
//! interface: build a reusable propagator once from a TLE, then sample
//! it over a batch of timestamps. No I/O, deterministic.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PropagatorError {
    #[error("invalid TLE: {0}")]
    InvalidTle(String),
    #[error("propagation failed: {0}")]
    PropagationFailed(String),
}

pub type Result<T> = std::result::Result<T, PropagatorError>;

/// An immutable two-line element set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tle {
    pub name: String,
    pub line1: String,
    pub line2: String,
}

impl Tle {
    pub fn new(name: impl Into<String>, line1: impl Into<String>, line2: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            line1: line1.into(),
            line2: line2.into(),
        }
    }

    /// NORAD catalog ID, read from line 2 columns 2-6 (0-indexed).
    pub fn norad_id(&self) -> Result<u32> {
        let field = self
            .line2
            .get(2..7)
            .ok_or_else(|| PropagatorError::InvalidTle("line2 too short for NORAD id".into()))?;
        field
            .trim()
            .parse()
            .map_err(|_| PropagatorError::InvalidTle(format!("bad NORAD id field {:?}", field)))
    }
}

/// Position and velocity in the Earth-centered inertial frame, km and km/s.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct StateVector {
    pub position_km: [f64; 3],
    pub velocity_km_s: [f64; 3],
    pub epoch: DateTime<Utc>,
}

/// A reusable propagator built from one TLE. Immutable once constructed.
pub struct Propagator {
    constants: sgp4::Constants,
    epoch_utc: DateTime<Utc>,
}

/// Construct a reusable propagator from a TLE.
pub fn build(tle: &Tle) -> Result<Propagator> {
    let elements = sgp4::Elements::from_tle(
        Some(tle.name.clone()),
        tle.line1.as_bytes(),
        tle.line2.as_bytes(),
    )
    .map_err(|e| PropagatorError::InvalidTle(format!("{:?}", e)))?;

    let epoch_utc = DateTime::<Utc>::from_naive_utc_and_offset(elements.datetime, Utc);

    let constants = sgp4::Constants::from_elements(&elements)
        .map_err(|e| PropagatorError::PropagationFailed(format!("{:?}", e)))?;

    Ok(Propagator {
        constants,
        epoch_utc,
    })
}

/// Propagate to every timestamp in `times`. The hot path for dense-grid
/// screening (conjunction-screener samples up to 2000 points per pair),
/// so callers pass the whole grid in one call rather than looping
/// externally.
pub fn propagate(prop: &Propagator, times: &[DateTime<Utc>]) -> Result<Vec<StateVector>> {
    times
        .iter()
        .map(|&time| {
            let minutes_since_epoch =
                time.signed_duration_since(prop.epoch_utc).num_milliseconds() as f64 / 60_000.0;

            let prediction = prop
                .constants
                .propagate(minutes_since_epoch)
                .map_err(|e| PropagatorError::PropagationFailed(format!("{:?}", e)))?;

            Ok(StateVector {
                position_km: prediction.position,
                velocity_km_s: prediction.velocity,
                epoch: time,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn iss_tle() -> Tle {
        Tle::new(
            "ISS (ZARYA)",
            "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994",
            "2 25544  51.6400 208.9163 0005932 315.0702 130.3143 15.49560442    10",
        )
    }

    #[test]
    fn norad_id_parses_from_line2() {
        assert_eq!(iss_tle().norad_id().unwrap(), 25544);
    }

    #[test]
    fn build_accepts_a_valid_tle() {
        assert!(build(&iss_tle()).is_ok());
    }

    #[test]
    fn build_rejects_malformed_tle() {
        let bad = Tle::new("BAD", "not a tle line", "2 00000");
        assert!(build(&bad).is_err());
    }

    #[test]
    fn propagate_is_deterministic() {
        let prop = build(&iss_tle()).unwrap();
        let t = prop.epoch_utc + Duration::hours(3);

        let a = propagate(&prop, &[t]).unwrap();
        let b = propagate(&prop, &[t]).unwrap();

        assert_eq!(a[0].position_km, b[0].position_km);
        assert_eq!(a[0].velocity_km_s, b[0].velocity_km_s);
    }

    #[test]
    fn propagate_matches_length_of_input_grid() {
        let prop = build(&iss_tle()).unwrap();
        let times: Vec<_> = (0..10)
            .map(|i| prop.epoch_utc + Duration::minutes(i * 10))
            .collect();

        let states = propagate(&prop, &times).unwrap();
        assert_eq!(states.len(), times.len());
    }

    #[test]
    fn leo_state_has_plausible_radius() {
        let prop = build(&iss_tle()).unwrap();
        let states = propagate(&prop, &[prop.epoch_utc]).unwrap();
        let p = states[0].position_km;
        let r = (p[0] * p[0] + p[1] * p[1] + p[2] * p[2]).sqrt();
        assert!(r > 6600.0 && r < 7200.0, "unexpected radius {r}");
    }
}
