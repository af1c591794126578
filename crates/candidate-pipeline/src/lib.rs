//! Stage-1 geometric prefilter, Stage-2 coarse temporal screen, and the
//! resolved candidate list handed to the conjunction screener.

use thiserror::Error;
use tle_catalog::{Catalog, CatalogEntry, Tle};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error(transparent)]
    Catalog(#[from] tle_catalog::CatalogError),
}

pub type Result<T> = std::result::Result<T, PipelineError>;

const STAGE1_ALT_MARGIN_KM: f64 = 150.0;
const STAGE1_INC_MARGIN_DEG: f64 = 30.0;
const STAGE2_DAYS: i64 = 7;
const STAGE2_GRID: usize = 300;
const STAGE2_THRESHOLD_KM: f64 = 80.0;

/// Resolve the screening candidate list for a primary.
///
/// 1. `refresh_if_needed()` the catalog.
/// 2. Stage 1: altitude-shell ∩ inclination-window prefilter.
/// 3. Stage 2: coarse temporal screen over a 7-day, 300-sample grid.
/// 4. Exclude any NORAD ID already in `primary_norads`.
/// 5. Resolve and return the surviving `CatalogEntry` records, in
///    Stage-2 order.
///
/// The 80 km coarse threshold is loose enough that no sub-10 km event
/// can escape: a 7-day/300-sample grid spaces samples ~34 minutes
/// apart, and LEO-regime relative speeds (≤ ~15 km/s) bound intra-sample
/// motion well under 80 km.
pub async fn candidates_for(
    catalog: &Catalog,
    primary_tle: &Tle,
    primary_norads: &[u32],
) -> Result<Vec<CatalogEntry>> {
    catalog.refresh_if_needed(false).await?;

    let primary_orbit = tle_catalog::parse_orbit_params(primary_tle)?;

    let stage1_ids = catalog
        .stage1_candidates(&primary_orbit, STAGE1_ALT_MARGIN_KM, STAGE1_INC_MARGIN_DEG)
        .await;

    let stage2_ids = catalog
        .coarse_screen(
            primary_tle,
            &stage1_ids,
            STAGE2_DAYS,
            STAGE2_GRID,
            STAGE2_THRESHOLD_KM,
        )
        .await?;

    let mut resolved = Vec::with_capacity(stage2_ids.len());
    for id in stage2_ids {
        if primary_norads.contains(&id) {
            continue;
        }
        if let Some(entry) = catalog.get(id).await {
            resolved.push(entry);
        }
    }

    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn empty_catalog_yields_no_candidates() {
        let catalog = Catalog::with_default_ttl(None);
        let primary = Tle::new(
            "ISS (ZARYA)",
            "1 25544U 98067A   24001.50000000  .00016717  00000-0  10270-3 0  9994",
            "2 25544  51.6400 208.9163 0005932 315.0702 130.3143 15.49560442    10",
        );

        let candidates = candidates_for(&catalog, &primary, &[25544]).await.unwrap();
        assert!(candidates.is_empty());
    }
}
