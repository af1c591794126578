//! Upstream TLE catalog provider client.

use crate::{CatalogError, Result};
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{info, warn};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Abstract capability set for an upstream TLE provider. Implemented
/// against Space-Track's query API; a test double can substitute any
/// other source with the same shape.
#[async_trait]
pub trait CatalogClient: Send + Sync {
    /// Returns `limit` newest TLEs as a newline-separated stream of
    /// `[name?, line1, line2]` triples.
    async fn tle_latest(&self, limit: u32, order: &str) -> Result<String>;

    /// Returns the freshest TLE for one object.
    async fn gp(&self, norad_id: u32, limit: u32, order: &str) -> Result<String>;
}

/// Space-Track-shaped client, username/password authenticated.
pub struct SpaceTrackClient {
    http: reqwest::Client,
    identity: String,
    password: String,
    cookie: Arc<RwLock<Option<String>>>,
}

impl SpaceTrackClient {
    pub fn new(identity: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            identity: identity.into(),
            password: password.into(),
            cookie: Arc::new(RwLock::new(None)),
        }
    }

    /// Build a client from `SPACETRACK_USER`/`SPACETRACK_PASS`. Returns
    /// `None` if either is unset — missing credentials disable live
    /// fetching without failing the rest of the system.
    pub fn from_env() -> Option<Self> {
        let user = std::env::var("SPACETRACK_USER").ok()?;
        let pass = std::env::var("SPACETRACK_PASS").ok()?;
        Some(Self::new(user, pass))
    }

    async fn ensure_authenticated(&self) -> Result<()> {
        if self.cookie.read().await.is_some() {
            return Ok(());
        }

        let response = self
            .http
            .post("https://www.space-track.org/ajaxauth/login")
            .form(&[("identity", &self.identity), ("password", &self.password)])
            .send()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(CatalogError::UpstreamUnavailable(format!(
                "space-track auth failed: {}",
                response.status()
            )));
        }

        *self.cookie.write().await = Some("authenticated".to_string());
        info!("authenticated with space-track");
        Ok(())
    }
}

#[async_trait]
impl CatalogClient for SpaceTrackClient {
    async fn tle_latest(&self, limit: u32, order: &str) -> Result<String> {
        self.ensure_authenticated().await?;

        let url = format!(
            "https://www.space-track.org/basicspacedata/query/class/tle_latest/\
             ORDINAL/1/orderby/{order}/limit/{limit}/format/tle"
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            warn!("tle_latest fetch failed: {}", response.status());
            return Err(CatalogError::UpstreamUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(e.to_string()))
    }

    async fn gp(&self, norad_id: u32, limit: u32, order: &str) -> Result<String> {
        self.ensure_authenticated().await?;

        let url = format!(
            "https://www.space-track.org/basicspacedata/query/class/gp/\
             NORAD_CAT_ID/{norad_id}/orderby/{order}/limit/{limit}/format/tle"
        );

        let response = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(e.to_string()))?;

        if !response.status().is_success() {
            warn!("gp fetch failed for {}: {}", norad_id, response.status());
            return Err(CatalogError::UpstreamUnavailable(format!(
                "status {}",
                response.status()
            )));
        }

        response
            .text()
            .await
            .map_err(|e| CatalogError::UpstreamUnavailable(e.to_string()))
    }
}
