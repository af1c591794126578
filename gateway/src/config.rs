//! Environment-sourced configuration, mirroring the teacher's
//! `PORT`/`ORBITAL_GATEWAY_PORT` dance in `main.rs` (spec.md §6
//! Environment configuration).

use std::time::Duration;

pub struct Config {
    /// `XAI_API_KEY` — enables the xAI narrative generator; absent,
    /// a canned fallback string is used instead.
    pub xai_api_key: Option<String>,
    /// `SPACETRACK_USER` / `SPACETRACK_PASS` — missing either disables
    /// live catalog fetching without failing startup.
    pub spacetrack_user: Option<String>,
    pub spacetrack_pass: Option<String>,
    /// `PORT`, falling back to `ORBITAL_GATEWAY_PORT`, then 8080.
    pub port: u16,
    /// `CATALOG_TTL_SECS`, falling back to the 3-hour spec default.
    pub catalog_ttl: Duration,
    /// Bearer token compared against `Authorization` headers.
    pub auth_token: String,
    /// Directory PDF reports and RIC plots are written to / served from.
    pub report_dir: std::path::PathBuf,
}

const DEFAULT_AUTH_TOKEN: &str = "stx-authorized-user";
const DEFAULT_CATALOG_TTL_SECS: u64 = 3 * 3600;

impl Config {
    pub fn from_env() -> Self {
        let port = std::env::var("PORT")
            .or_else(|_| std::env::var("ORBITAL_GATEWAY_PORT"))
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(8080);

        let catalog_ttl = std::env::var("CATALOG_TTL_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(DEFAULT_CATALOG_TTL_SECS));

        Self {
            xai_api_key: std::env::var("XAI_API_KEY").ok(),
            spacetrack_user: std::env::var("SPACETRACK_USER").ok(),
            spacetrack_pass: std::env::var("SPACETRACK_PASS").ok(),
            port,
            catalog_ttl,
            auth_token: std::env::var("AUTH_TOKEN").unwrap_or_else(|_| DEFAULT_AUTH_TOKEN.to_string()),
            report_dir: std::env::var("REPORT_DIR")
                .map(std::path::PathBuf::from)
                .unwrap_or_else(|_| std::path::PathBuf::from(".")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_auth_token_matches_the_original_demo_constant() {
        std::env::remove_var("AUTH_TOKEN");
        let cfg = Config::from_env();
        assert_eq!(cfg.auth_token, "stx-authorized-user");
    }
}
