//! Catalog snapshot: the cached `{norad_id -> CatalogEntry}` mapping,
//! its TTL-gated refresh, and the two geometric prefilter stages.

use crate::client::CatalogClient;
use crate::parse::{parse_orbit_params, parse_tle_stream, OrbitParams};
use crate::{CatalogError, Result};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use orbital_propagator::{Propagator, Tle};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

/// One cached catalog object: its TLE, derived orbit parameters, and a
/// reusable propagator. Exclusively built by [`Catalog::refresh_if_needed`];
/// callers receive read-only clones (cheap — `Propagator` is
/// `Arc`-wrapped).
#[derive(Clone)]
pub struct CatalogEntry {
    pub norad_id: u32,
    pub name: String,
    pub tle: Tle,
    pub orbit_params: OrbitParams,
    propagator: Arc<Propagator>,
}

impl CatalogEntry {
    pub fn propagator(&self) -> &Propagator {
        &self.propagator
    }
}

struct Snapshot {
    entries: HashMap<u32, CatalogEntry>,
    last_refresh_epoch: Option<DateTime<Utc>>,
}

impl Snapshot {
    fn empty() -> Self {
        Self {
            entries: HashMap::new(),
            last_refresh_epoch: None,
        }
    }

    fn is_stale(&self, ttl: Duration) -> bool {
        match self.last_refresh_epoch {
            None => true,
            Some(t) => {
                let elapsed = Utc::now().signed_duration_since(t);
                elapsed > ChronoDuration::from_std(ttl).unwrap_or(ChronoDuration::zero())
            }
        }
    }
}

/// Default refresh TTL: 3 hours.
pub const DEFAULT_TTL: Duration = Duration::from_secs(3 * 3600);

/// The catalog service. Many-reader/single-writer: reads take a shared
/// lock; `refresh_if_needed` takes an exclusive lock and is the only
/// mutator.
pub struct Catalog {
    client: Option<Arc<dyn CatalogClient>>,
    ttl: Duration,
    snapshot: RwLock<Snapshot>,
}

impl Catalog {
    pub fn new(client: Option<Arc<dyn CatalogClient>>, ttl: Duration) -> Self {
        Self {
            client,
            ttl,
            snapshot: RwLock::new(Snapshot::empty()),
        }
    }

    pub fn with_default_ttl(client: Option<Arc<dyn CatalogClient>>) -> Self {
        Self::new(client, DEFAULT_TTL)
    }

    pub async fn last_refresh_epoch(&self) -> Option<DateTime<Utc>> {
        self.snapshot.read().await.last_refresh_epoch
    }

    pub async fn len(&self) -> usize {
        self.snapshot.read().await.entries.len()
    }

    pub async fn get(&self, norad_id: u32) -> Option<CatalogEntry> {
        self.snapshot.read().await.entries.get(&norad_id).cloned()
    }

    /// Refresh the snapshot from the upstream client if it is
    /// available and (`force`, or the snapshot is empty, or stale).
    ///
    /// A failed fetch retains the previous snapshot and logs a
    /// warning — stale data is preferable to no data. A missing client
    /// (no catalog credentials configured) is a silent no-op: the rest
    /// of the system still services fleet-mode requests from an
    /// uploaded file alone.
    pub async fn refresh_if_needed(&self, force: bool) -> Result<()> {
        let needs_refresh = {
            let snap = self.snapshot.read().await;
            force || snap.is_stale(self.ttl)
        };
        if !needs_refresh {
            return Ok(());
        }

        let Some(client) = self.client.as_ref() else {
            return Ok(());
        };

        let text = match client.tle_latest(50_000, "EPOCH desc").await {
            Ok(text) => text,
            Err(e) => {
                warn!("catalog refresh failed, retaining stale snapshot: {}", e);
                return Ok(());
            }
        };

        let tles = parse_tle_stream(&text);
        let mut entries = HashMap::with_capacity(tles.len());
        let mut skipped = 0;

        for tle in tles {
            match build_entry(tle) {
                Ok(entry) => {
                    entries.insert(entry.norad_id, entry);
                }
                Err(_) => skipped += 1,
            }
        }

        info!(
            "catalog refreshed: {} entries ({} skipped for parse/propagation failure)",
            entries.len(),
            skipped
        );

        let mut snap = self.snapshot.write().await;
        snap.entries = entries;
        snap.last_refresh_epoch = Some(Utc::now());
        Ok(())
    }

    /// Stage 1: altitude-shell ∩ inclination-window prefilter. RAAN is
    /// intentionally not filtered — precession over a 7-day horizon
    /// defeats a tight RAAN gate.
    pub async fn stage1_candidates(
        &self,
        primary: &OrbitParams,
        alt_margin_km: f64,
        inc_margin_deg: f64,
    ) -> Vec<u32> {
        let lo = primary.perigee_km - alt_margin_km;
        let hi = primary.apogee_km + alt_margin_km;

        let snap = self.snapshot.read().await;
        snap.entries
            .values()
            .filter(|e| {
                let shell_overlaps = e.orbit_params.perigee_km <= hi && e.orbit_params.apogee_km >= lo;
                let inc_close =
                    (e.orbit_params.inclination_deg - primary.inclination_deg).abs() <= inc_margin_deg;
                shell_overlaps && inc_close
            })
            .map(|e| e.norad_id)
            .collect()
    }

    /// Stage 2: coarse temporal screen. Propagates the primary and
    /// each candidate on a uniform grid and retains candidates whose
    /// grid-minimum distance is under `threshold_km`. CPU-bound, so
    /// each candidate's sweep runs on a blocking-pool task.
    pub async fn coarse_screen(
        &self,
        primary_tle: &Tle,
        candidate_ids: &[u32],
        days: i64,
        grid: usize,
        threshold_km: f64,
    ) -> Result<Vec<u32>> {
        let primary_prop = Arc::new(
            orbital_propagator::build(primary_tle)
                .map_err(|e| CatalogError::PropagatorError(e.to_string()))?,
        );

        let now = Utc::now();
        let times: Vec<DateTime<Utc>> = (0..grid)
            .map(|i| {
                let frac = i as f64 / (grid.max(1) - 1).max(1) as f64;
                now + ChronoDuration::milliseconds((frac * days as f64 * 86_400_000.0) as i64)
            })
            .collect();

        let primary_states = orbital_propagator::propagate(&primary_prop, &times)
            .map_err(|e| CatalogError::PropagatorError(e.to_string()))?;

        let candidates: Vec<CatalogEntry> = {
            let snap = self.snapshot.read().await;
            candidate_ids
                .iter()
                .filter_map(|id| snap.entries.get(id).cloned())
                .collect()
        };

        let tasks = candidates.into_iter().map(|entry| {
            let times = times.clone();
            let primary_states = primary_states.clone();
            tokio::task::spawn_blocking(move || {
                let secondary_states = match orbital_propagator::propagate(entry.propagator(), &times) {
                    Ok(s) => s,
                    Err(_) => return None,
                };

                let min_dist = primary_states
                    .iter()
                    .zip(secondary_states.iter())
                    .map(|(p, s)| {
                        let d = [
                            p.position_km[0] - s.position_km[0],
                            p.position_km[1] - s.position_km[1],
                            p.position_km[2] - s.position_km[2],
                        ];
                        (d[0] * d[0] + d[1] * d[1] + d[2] * d[2]).sqrt()
                    })
                    .fold(f64::INFINITY, f64::min);

                (min_dist < threshold_km).then_some(entry.norad_id)
            })
        });

        let results = futures::future::join_all(tasks).await;
        Ok(results.into_iter().flatten().flatten().collect())
    }
}

fn build_entry(tle: Tle) -> Result<CatalogEntry> {
    let norad_id = tle
        .norad_id()
        .map_err(|e| CatalogError::ParseError(e.to_string()))?;
    let orbit_params = parse_orbit_params(&tle)?;
    let propagator =
        orbital_propagator::build(&tle).map_err(|e| CatalogError::PropagatorError(e.to_string()))?;

    Ok(CatalogEntry {
        norad_id,
        name: tle.name.clone(),
        tle,
        orbit_params,
        propagator: Arc::new(propagator),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    fn iss_tle() -> Tle {
        Tle::new(
            "ISS (ZARYA)",
            "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994",
            "2 25544  51.6400 208.9163 0005932 315.0702 130.3143 15.49560442    10",
        )
    }

    #[tokio::test]
    async fn empty_catalog_has_no_entries() {
        let catalog = Catalog::with_default_ttl(None);
        assert_eq!(catalog.len().await, 0);
    }

    #[tokio::test]
    async fn refresh_without_client_is_a_no_op() {
        let catalog = Catalog::with_default_ttl(None);
        catalog.refresh_if_needed(true).await.unwrap();
        assert_eq!(catalog.len().await, 0);
        assert!(catalog.last_refresh_epoch().await.is_none());
    }

    /// A ~560km/55deg LEO body, within the ISS's stage-1 margin.
    fn nearby_tle() -> Tle {
        Tle::new(
            "NEARBY-LEO",
            "1 99001U 24001A   24001.50000000  .00005000  00000-0  50000-4 0  9993",
            "2 99001  55.0000 100.0000 0004000  90.0000 270.0000 15.60000000    16",
        )
    }

    /// A highly eccentric ~7000x33000km body at 80deg inclination,
    /// well outside the ISS's stage-1 altitude-shell margin (and past
    /// the inclination margin too).
    fn distant_tle() -> Tle {
        Tle::new(
            "DISTANT-MEO",
            "1 99002U 24002A   24001.50000000  .00000100  00000-0  10000-5 0  9994",
            "2 99002  80.0000 200.0000 6500000  90.0000 270.0000  3.00000000    17",
        )
    }

    #[tokio::test]
    async fn stage1_candidates_checks_altitude_and_inclination() {
        let catalog = Catalog::with_default_ttl(None);
        let primary = parse_orbit_params(&iss_tle()).unwrap();

        // Manually seed the snapshot with the primary plus a nearby
        // body that should survive the margin and a distant one that
        // should not (spec.md §8 boundary scenario #4).
        for tle in [iss_tle(), nearby_tle(), distant_tle()] {
            let entry = build_entry(tle).unwrap();
            let mut snap = catalog.snapshot.write().await;
            snap.entries.insert(entry.norad_id, entry);
        }

        let ids = catalog.stage1_candidates(&primary, 150.0, 30.0).await;
        assert!(ids.contains(&25544), "primary's own entry should self-match");
        assert!(
            ids.contains(&99001),
            "nearby LEO body within altitude/inclination margin should survive stage 1"
        );
        assert!(
            !ids.contains(&99002),
            "distant high-inclination body outside the margin should be rejected"
        );
    }

    /// Errors on every call; used to exercise the "stale snapshot
    /// survives a failed refresh" invariant without a live network.
    struct FailingClient;

    #[async_trait]
    impl CatalogClient for FailingClient {
        async fn tle_latest(&self, _limit: u32, _order: &str) -> Result<String> {
            Err(CatalogError::UpstreamUnavailable("simulated outage".into()))
        }

        async fn gp(&self, _norad_id: u32, _limit: u32, _order: &str) -> Result<String> {
            Err(CatalogError::UpstreamUnavailable("simulated outage".into()))
        }
    }

    #[tokio::test]
    async fn failed_refresh_retains_the_previously_cached_snapshot() {
        let catalog = Catalog::with_default_ttl(None);

        let entry = build_entry(iss_tle()).unwrap();
        let seeded_at = Utc::now();
        {
            let mut snap = catalog.snapshot.write().await;
            snap.entries.insert(entry.norad_id, entry);
            snap.last_refresh_epoch = Some(seeded_at);
        }

        // Swap in a client that always errors, then force a refresh.
        let catalog = Catalog {
            client: Some(Arc::new(FailingClient)),
            ttl: catalog.ttl,
            snapshot: catalog.snapshot,
        };

        catalog.refresh_if_needed(true).await.unwrap();

        assert_eq!(catalog.len().await, 1, "stale snapshot must not be emptied by a failed refresh");
        assert!(
            catalog.get(25544).await.is_some(),
            "previously cached entry must survive an upstream outage"
        );
        assert_eq!(
            catalog.last_refresh_epoch().await,
            Some(seeded_at),
            "last_refresh_epoch must not advance on a failed refresh"
        );
    }
}
