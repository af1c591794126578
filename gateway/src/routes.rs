//! HTTP surface: multipart TLE upload → job submission, status
//! polling, and the summary-PDF lookup (spec.md §6).

use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use screening_job::{JobError, JobStatus, SubmitRequest};
use serde::Serialize;
use uuid::Uuid;

use crate::AppState;

#[derive(Serialize)]
pub struct SubmitResponse {
    pub status: &'static str,
    pub job_id: Uuid,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

fn error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ErrorResponse>) {
    (status, Json(ErrorResponse { error: message.into() }))
}

/// `POST /screen`: multipart TLE upload, optional `suppress_green` /
/// `catalog_limit` fields. Returns the queued job id synchronously;
/// parse failures are a client error (spec.md §7 InputError).
pub async fn submit_screen(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<SubmitResponse>, (StatusCode, Json<ErrorResponse>)> {
    let mut tle_file_bytes: Option<Vec<u8>> = None;
    let mut suppress_green = false;
    let mut catalog_limit: Option<usize> = None;

    loop {
        let field = match multipart.next_field().await {
            Ok(Some(f)) => f,
            Ok(None) => break,
            Err(e) => return Err(error(StatusCode::BAD_REQUEST, format!("malformed multipart body: {e}"))),
        };

        match field.name().unwrap_or("") {
            "file" => {
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| error(StatusCode::BAD_REQUEST, format!("failed to read file field: {e}")))?;
                tle_file_bytes = Some(bytes.to_vec());
            }
            "suppress_green" => {
                let text = field.text().await.unwrap_or_default();
                suppress_green = text.trim().eq_ignore_ascii_case("true") || text.trim() == "1";
            }
            "catalog_limit" => {
                let text = field.text().await.unwrap_or_default();
                catalog_limit = text.trim().parse().ok();
            }
            _ => {}
        }
    }

    let Some(tle_file_bytes) = tle_file_bytes else {
        return Err(error(StatusCode::BAD_REQUEST, "missing required multipart field `file`"));
    };

    match state
        .job_manager
        .submit(SubmitRequest {
            tle_file_bytes,
            suppress_green,
            catalog_limit,
        })
        .await
    {
        Ok(job_id) => Ok(Json(SubmitResponse { status: "queued", job_id })),
        Err(JobError::InputError(msg)) => Err(error(StatusCode::BAD_REQUEST, msg)),
        Err(JobError::NotFound) => unreachable!("submit never returns NotFound"),
    }
}

/// `GET /screen_status/{job_id}`.
pub async fn screen_status(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<serde_json::Value>, (StatusCode, Json<ErrorResponse>)> {
    let job = state
        .job_manager
        .status(job_id)
        .await
        .map_err(|_| error(StatusCode::NOT_FOUND, "job not found"))?;

    match job.status {
        JobStatus::Queued => Ok(Json(serde_json::json!({"status": "queued"}))),
        JobStatus::Running => Ok(Json(serde_json::json!({"status": "running"}))),
        JobStatus::Failed => Err((
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse {
                error: job.error.unwrap_or_else(|| "job failed".to_string()),
            }),
        )),
        JobStatus::Success | JobStatus::AllClear => {
            let result = job.result.expect("terminal success/all_clear job always has a result");
            Ok(Json(serde_json::to_value(result).expect("ScreeningResult always serializes")))
        }
    }
}

#[derive(Serialize)]
pub struct PdfUrlResponse {
    pub pdf_url: String,
}

/// `GET /summary_pdf/{job_id}`: available once the job is terminal and
/// produced at least one threat.
pub async fn summary_pdf(
    State(state): State<AppState>,
    Path(job_id): Path<Uuid>,
) -> Result<Json<PdfUrlResponse>, (StatusCode, Json<ErrorResponse>)> {
    let job = state
        .job_manager
        .status(job_id)
        .await
        .map_err(|_| error(StatusCode::NOT_FOUND, "job not found"))?;

    if !job.status.is_terminal() {
        return Err(error(StatusCode::CONFLICT, "job is not yet terminal"));
    }

    let result = job
        .result
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "job produced no report"))?;

    let pdf_url = result
        .threats
        .iter()
        .find_map(|t| t.pdf_url.clone())
        .ok_or_else(|| error(StatusCode::NOT_FOUND, "no PDF was generated for this job"))?;

    Ok(Json(PdfUrlResponse { pdf_url }))
}
