//! External collaborators reached through a narrow trait boundary: the
//! natural-language maneuver narrative generator and the PDF report
//! renderer. The core never depends on either's output shape beyond
//! "a string" / "a filename".

use async_trait::async_trait;
use conjunction_screener::Telemetry;
use std::path::PathBuf;
use std::time::Duration;
use tracing::warn;

const EXTERNAL_CALL_TIMEOUT: Duration = Duration::from_secs(30);

#[async_trait]
pub trait NarrativeGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, String>;
}

#[async_trait]
pub trait PdfRenderer: Send + Sync {
    async fn render(&self, telemetry: &Telemetry, narrative: &str) -> Result<String, String>;
}

pub const CANNED_NARRATIVE_FALLBACK: &str = "Automated narrative generation unavailable; a human reviewer \
    should assess this conjunction before relying on the recommended maneuver.";

/// Call the fallback canned text. Used whenever a real generator fails
/// or times out, and as the default when no `XAI_API_KEY` is configured.
pub struct CannedNarrativeGenerator;

#[async_trait]
impl NarrativeGenerator for CannedNarrativeGenerator {
    async fn generate(&self, _prompt: &str) -> Result<String, String> {
        Ok(CANNED_NARRATIVE_FALLBACK.to_string())
    }
}

/// xAI chat-completions backed narrative generator.
pub struct XaiNarrativeGenerator {
    client: reqwest::Client,
    api_key: String,
}

impl XaiNarrativeGenerator {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::builder()
                .timeout(EXTERNAL_CALL_TIMEOUT)
                .build()
                .expect("reqwest client builds with static config"),
            api_key: api_key.into(),
        }
    }

    /// Build from `XAI_API_KEY`. Returns `None` if unset.
    pub fn from_env() -> Option<Self> {
        std::env::var("XAI_API_KEY").ok().map(Self::new)
    }
}

#[async_trait]
impl NarrativeGenerator for XaiNarrativeGenerator {
    async fn generate(&self, prompt: &str) -> Result<String, String> {
        let response = self
            .client
            .post("https://api.x.ai/v1/chat/completions")
            .bearer_auth(&self.api_key)
            .json(&serde_json::json!({
                "model": "grok-beta",
                "messages": [{"role": "user", "content": prompt}],
            }))
            .send()
            .await
            .map_err(|e| e.to_string())?;

        if !response.status().is_success() {
            return Err(format!("xai returned status {}", response.status()));
        }

        let body: serde_json::Value = response.json().await.map_err(|e| e.to_string())?;
        body["choices"][0]["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| "unexpected xai response shape".to_string())
    }
}

const RENDER_FAILURE_PLACEHOLDER: &str = "render-failed.pdf";

/// Writes a minimal placeholder report file next to `output_dir`. Real
/// PDF layout is an external collaborator's concern; this satisfies
/// the `render(telemetry, narrative) -> filename` contract without
/// owning report design.
pub struct FileSystemPdfRenderer {
    output_dir: PathBuf,
}

impl FileSystemPdfRenderer {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

#[async_trait]
impl PdfRenderer for FileSystemPdfRenderer {
    async fn render(&self, telemetry: &Telemetry, narrative: &str) -> Result<String, String> {
        let filename = format!(
            "conjunction-{}-{}.pdf",
            telemetry.primary_name.replace(' ', "_"),
            telemetry.tca_utc.format("%Y%m%dT%H%M%S")
        );
        let path = self.output_dir.join(&filename);

        let body = format!(
            "%PDF-1.4\n% conjunction screening summary\n% primary: {}\n% secondary: {}\n\
             % tca: {}\n% min_dist_km: {:.3}\n% risk: {:?}\n\n{}\n",
            telemetry.primary_name,
            telemetry.secondary_name,
            telemetry.tca_utc,
            telemetry.min_dist_km,
            telemetry.risk_level,
            narrative,
        );

        tokio::fs::write(&path, body).await.map_err(|e| {
            warn!("pdf render failed for {}: {}", filename, e);
            e.to_string()
        })?;

        Ok(filename)
    }
}

pub fn render_failure_placeholder() -> String {
    RENDER_FAILURE_PLACEHOLDER.to_string()
}
