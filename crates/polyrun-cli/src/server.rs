//! HTTP front end
//!
//! A single `POST /` endpoint taking a JSON submission and answering with
//! the outputs or an error message.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::routing::post;
use axum::{Json, Router};
use polyrun::{Runner, SubmissionError, SubmissionRequest, SubmissionResponse};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::{debug, error, info, warn};

/// Build the application router
pub fn router(runner: Arc<Runner>) -> Router {
    Router::new()
        .route("/", post(submit))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(runner)
}

/// Create the job base directory and serve until the listener fails
pub async fn serve(runner: Runner, addr: SocketAddr) -> Result<()> {
    let config = runner.config();

    tokio::fs::create_dir_all(&config.base_dir)
        .await
        .with_context(|| {
            format!(
                "failed to create job directory '{}'",
                config.base_dir.display()
            )
        })?;

    if config.secret_key.is_none() {
        warn!("no secret key configured, only submissions with an empty key are accepted");
    }

    let app = router(Arc::new(runner));

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!(%addr, "listening");

    axum::serve(listener, app).await.context("server error")
}

async fn submit(
    State(runner): State<Arc<Runner>>,
    payload: Result<Json<SubmissionRequest>, JsonRejection>,
) -> (StatusCode, Json<SubmissionResponse>) {
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!(error = %rejection, "invalid request body");
            return (
                StatusCode::BAD_REQUEST,
                Json(SubmissionResponse::error("Invalid JSON")),
            );
        }
    };

    match runner.submit(&request).await {
        Ok(outputs) => (StatusCode::OK, Json(SubmissionResponse::success(outputs))),
        Err(e) => {
            if e.is_internal() {
                error!(error = %e, "submission failed");
            }
            (status_for(&e), Json(SubmissionResponse::from(&e)))
        }
    }
}

fn status_for(error: &SubmissionError) -> StatusCode {
    match error {
        SubmissionError::Unauthorized => StatusCode::FORBIDDEN,
        SubmissionError::Execute(_) => StatusCode::INTERNAL_SERVER_ERROR,
        SubmissionError::CodeTooLarge { .. }
        | SubmissionError::TooManyInputs { .. }
        | SubmissionError::UnsupportedLanguage(_)
        | SubmissionError::Rejected(_) => StatusCode::BAD_REQUEST,
    }
}
