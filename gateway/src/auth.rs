//! Bearer-token authorization, the idiomatic axum seam for the flat
//! `Authorization: Bearer <token>` check `app.py` does inline (spec.md
//! §6: "a single shared bearer token is assumed").

use axum::extract::State;
use axum::http::{Request, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use axum::Json;

use crate::AppState;

pub async fn require_bearer_token(
    State(state): State<AppState>,
    req: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let expected = format!("Bearer {}", state.config.auth_token);
    let authorized = req
        .headers()
        .get(axum::http::header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(|v| v == expected)
        .unwrap_or(false);

    if !authorized {
        return (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({"error": "Unauthorized: Payment Required"})),
        )
            .into_response();
    }

    next.run(req).await
}
