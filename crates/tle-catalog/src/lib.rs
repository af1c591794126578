//! Catalog snapshot cache, TLE parsing, and the staged geometric/temporal
//! prefilters that shrink a tens-of-thousands-object catalog down to a
//! few hundred screening candidates.

mod catalog;
mod client;
mod parse;

pub use catalog::{Catalog, CatalogEntry, DEFAULT_TTL};
pub use client::{CatalogClient, SpaceTrackClient};
pub use parse::{parse_orbit_params, parse_tle_stream, OrbitParams};
pub use orbital_propagator::Tle;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("upstream catalog unavailable: {0}")]
    UpstreamUnavailable(String),
    #[error("TLE parse error: {0}")]
    ParseError(String),
    #[error("propagator error: {0}")]
    PropagatorError(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
