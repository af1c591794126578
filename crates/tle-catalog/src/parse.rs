//! TLE text parsing: the upstream catalog stream format and the
//! uploaded-file format share the same line-pairing algorithm, and the
//! orbit-parameter derivation is fixed column semantics regardless of
//! source.

use crate::{CatalogError, Result};
use orbital_propagator::Tle;
use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6378.0;
const MU_EARTH_KM3_S2: f64 = 398_600.4418;

/// Orbit parameters derived from a TLE, cached alongside it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct OrbitParams {
    pub perigee_km: f64,
    pub apogee_km: f64,
    pub inclination_deg: f64,
    pub raan_deg: f64,
    pub mean_motion_revs_per_day: f64,
    pub eccentricity: f64,
    pub mean_motion_derivative: f64,
}

/// Derive `OrbitParams` from a TLE's fixed-column fields.
///
/// Column ranges below are 0-indexed half-open slices of the 69-char
/// line; the mapping is taken verbatim from the NORAD TLE format.
pub fn parse_orbit_params(tle: &Tle) -> Result<OrbitParams> {
    let field = |line: &str, range: std::ops::Range<usize>, what: &str| -> Result<f64> {
        line.get(range)
            .ok_or_else(|| CatalogError::ParseError(format!("line too short for {what}")))?
            .trim()
            .parse::<f64>()
            .map_err(|e| CatalogError::ParseError(format!("bad {what}: {e}")))
    };

    let mean_motion_revs_per_day = field(&tle.line2, 52..63, "mean motion")?;
    let ecc_digits = tle
        .line2
        .get(26..33)
        .ok_or_else(|| CatalogError::ParseError("line2 too short for eccentricity".into()))?;
    let eccentricity: f64 = format!("0.{}", ecc_digits.trim())
        .parse()
        .map_err(|e| CatalogError::ParseError(format!("bad eccentricity: {e}")))?;
    let inclination_deg = field(&tle.line2, 8..16, "inclination")?;
    let raan_deg = field(&tle.line2, 17..25, "raan")?;
    let mean_motion_derivative = field(&tle.line1, 33..43, "mean motion derivative")?;

    let n_rad_per_s = mean_motion_revs_per_day * 2.0 * std::f64::consts::PI / 86_400.0;
    let semi_major_km = (MU_EARTH_KM3_S2 / (n_rad_per_s * n_rad_per_s)).cbrt();

    let perigee_km = semi_major_km * (1.0 - eccentricity) - EARTH_RADIUS_KM;
    let apogee_km = semi_major_km * (1.0 + eccentricity) - EARTH_RADIUS_KM;

    Ok(OrbitParams {
        perigee_km,
        apogee_km,
        inclination_deg,
        raan_deg,
        mean_motion_revs_per_day,
        eccentricity,
        mean_motion_derivative,
    })
}

/// Parse a newline-separated stream of TLEs.
///
/// Shared by the upstream catalog feed and the uploaded-file surface:
/// blank lines are trimmed, a line starting `"1 "` is line-1, the
/// preceding non-`"1 "`/`"2 "` line (if any) is the object name
/// (default `"SATELLITE"`), and a valid entry is the pair `(line1,
/// line2)` where `line2` starts `"2 "`. Entries that fail to pair or
/// parse are skipped rather than aborting the whole stream.
pub fn parse_tle_stream(text: &str) -> Vec<Tle> {
    let lines: Vec<&str> = text.lines().map(str::trim).filter(|l| !l.is_empty()).collect();

    let mut out = Vec::new();
    let mut pending_name: Option<&str> = None;
    let mut i = 0;

    while i < lines.len() {
        let line = lines[i];

        if line.starts_with("1 ") {
            let name = pending_name.unwrap_or("SATELLITE").to_string();
            if let Some(&next) = lines.get(i + 1) {
                if next.starts_with("2 ") {
                    out.push(Tle::new(name, line.to_string(), next.to_string()));
                    i += 2;
                    pending_name = None;
                    continue;
                }
            }
            // no matching line-2: skip this orphaned line-1
            i += 1;
            pending_name = None;
            continue;
        }

        if !line.starts_with("2 ") {
            pending_name = Some(line);
        }
        i += 1;
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn iss_lines() -> (String, String) {
        (
            "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994".to_string(),
            "2 25544  51.6400 208.9163 0005932 315.0702 130.3143 15.49560442    10".to_string(),
        )
    }

    #[test]
    fn parse_orbit_params_respects_perigee_le_apogee() {
        let (l1, l2) = iss_lines();
        let tle = Tle::new("ISS (ZARYA)", l1, l2);
        let params = parse_orbit_params(&tle).unwrap();
        assert!(params.perigee_km <= params.apogee_km);
        assert!(params.perigee_km > 300.0 && params.perigee_km < 500.0);
    }

    #[test]
    fn parse_tle_stream_recovers_name_line1_line2_triples() {
        let (l1, l2) = iss_lines();
        let text = format!("ISS (ZARYA)\n{l1}\n{l2}\n");
        let tles = parse_tle_stream(&text);
        assert_eq!(tles.len(), 1);
        assert_eq!(tles[0].name, "ISS (ZARYA)");
    }

    #[test]
    fn parse_tle_stream_tolerates_missing_name() {
        let (l1, l2) = iss_lines();
        let text = format!("{l1}\n{l2}\n");
        let tles = parse_tle_stream(&text);
        assert_eq!(tles.len(), 1);
        assert_eq!(tles[0].name, "SATELLITE");
    }

    #[test]
    fn parse_tle_stream_skips_blank_lines() {
        let (l1, l2) = iss_lines();
        let text = format!("\n\nISS (ZARYA)\n\n{l1}\n{l2}\n\n");
        let tles = parse_tle_stream(&text);
        assert_eq!(tles.len(), 1);
    }

    #[test]
    fn parse_tle_stream_skips_orphaned_line1() {
        let (l1, _l2) = iss_lines();
        let text = format!("ISS (ZARYA)\n{l1}\n");
        let tles = parse_tle_stream(&text);
        assert!(tles.is_empty());
    }

    #[test]
    fn parse_tle_stream_handles_multiple_entries() {
        let (l1, l2) = iss_lines();
        let text = format!("A\n{l1}\n{l2}\nB\n{l1}\n{l2}\n");
        let tles = parse_tle_stream(&text);
        assert_eq!(tles.len(), 2);
        assert_eq!(tles[0].name, "A");
        assert_eq!(tles[1].name, "B");
    }
}
