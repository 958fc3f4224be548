//! HTTP surface.
//!
//! # Routes
//!
//! - `POST /api/resize` - resize uploaded images and publish them as a zip
//! - `GET /api/presets` - named store-listing sizes
//! - `GET /health` - liveness probe

use crate::engine::ResizeEngine;
use crate::error::ErrorKind;
use crate::intake::ResizeForm;
use crate::models::{
    FailureResponse, JobOutcome, ParseFailureResponse, Preset, ResizeResponse, PRESETS,
};
use crate::{Error, Result};
use axum::extract::multipart::MultipartRejection;
use axum::extract::{DefaultBodyLimit, Multipart, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use std::path::PathBuf;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{error, info, info_span, Instrument};
use uuid::Uuid;

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<ResizeEngine>,
    /// Where uploads are spooled; the system temp dir when `None`.
    pub spool_dir: Option<PathBuf>,
}

pub fn router(state: AppState, max_upload_bytes: usize) -> Router {
    Router::new()
        .route("/api/resize", post(resize_images))
        .route("/api/presets", get(presets))
        .route("/health", get(health))
        .layer(DefaultBodyLimit::max(max_upload_bytes))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

async fn presets() -> Json<&'static [Preset]> {
    Json(&PRESETS)
}

async fn resize_images(
    State(state): State<AppState>,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Response {
    let job_id = Uuid::new_v4();
    let span = info_span!("resize_job", %job_id);

    match run_job(&state, multipart).instrument(span.clone()).await {
        Ok(outcome) => {
            span.in_scope(|| info!("Job finished: {}", outcome.summary()));
            (StatusCode::OK, Json(ResizeResponse::from(outcome))).into_response()
        }
        Err(e) => {
            span.in_scope(|| error!("Job failed: {}", e));
            e.into_response()
        }
    }
}

async fn run_job(
    state: &AppState,
    multipart: std::result::Result<Multipart, MultipartRejection>,
) -> Result<JobOutcome> {
    let mut multipart = multipart.map_err(|e| Error::MalformedRequest(e.body_text()))?;
    let form = ResizeForm::parse(&mut multipart, state.spool_dir.as_deref()).await?;
    let job = form.into_job().await?;
    state.engine.run(job).await
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let message = self.to_string();
        let body = match self.kind() {
            ErrorKind::MalformedRequest => Json(ParseFailureResponse {
                error: "Form parse failed".to_string(),
                details: message,
            })
            .into_response(),
            ErrorKind::NoFilesProvided => Json(FailureResponse {
                success: false,
                error: message,
                message: None,
            })
            .into_response(),
            ErrorKind::ProcessingFailed => Json(FailureResponse {
                success: false,
                error: if message.is_empty() {
                    "Unknown error".to_string()
                } else {
                    message
                },
                message: Some("Error processing images".to_string()),
            })
            .into_response(),
        };

        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}
