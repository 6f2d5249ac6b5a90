//! HTTP handlers for the verification server.

use super::page::APP_PAGE_HTML;
use super::AppState;
use crate::convert::convert_bytes;
use crate::state::{CompletedDocument, ConversionAttempt, ConversionStatus};
use axum::body::Bytes;
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use tracing::{error, warn};

/// The single-page verification app.
pub async fn app_page() -> Html<&'static str> {
    Html(APP_PAGE_HTML)
}

#[derive(Debug, Deserialize)]
pub struct ConvertParams {
    /// Original filename; decides archive classification and the output name.
    pub name: String,
}

/// Start a conversion attempt for the uploaded bytes.
///
/// Selecting a new file is an implicit reset, so any terminal result is
/// replaced by a fresh attempt — but an attempt already in flight is never
/// silently aborted from here: the UI must not offer the action, and a
/// racing client gets `409 Conflict`.
pub async fn start_conversion(
    State(state): State<AppState>,
    Query(params): Query<ConvertParams>,
    body: Bytes,
) -> Response {
    if params.name.trim().is_empty() {
        return error_response(StatusCode::BAD_REQUEST, "missing file name");
    }
    if state.tracker.snapshot().status == ConversionStatus::Loading {
        return error_response(StatusCode::CONFLICT, "a conversion is already in progress");
    }

    // new file selected: fresh Idle instance, then start
    state.tracker.reset();
    let Some(attempt_id) = state.tracker.start(&params.name) else {
        return error_response(StatusCode::CONFLICT, "a conversion is already in progress");
    };

    let tracker = state.tracker.clone();
    let surface = state.surface.clone();
    let config = state.config.clone();
    let name = params.name.clone();

    tokio::spawn(async move {
        // the inner spawn isolates panics: a crashed pipeline still resolves
        // the attempt to Error instead of leaving it stuck in Loading
        let outcome = match tokio::spawn(async move { convert_bytes(&name, &body, &config).await })
            .await
        {
            Ok(Ok(output)) => Ok((output.geojson, output.output_name)),
            Ok(Err(e)) => Err(e.to_string()),
            Err(join_err) => {
                error!("Conversion task crashed: {join_err}");
                Err("Internal error: the conversion task crashed. Try again.".to_string())
            }
        };

        match outcome {
            Ok((geojson, output_name)) => {
                let applied = tracker.complete(
                    attempt_id,
                    Ok(CompletedDocument {
                        geojson: geojson.clone(),
                        output_name,
                    }),
                );
                // only a still-current success may touch the shared surface
                if applied {
                    if let Err(e) = surface.lock().unwrap().update(&geojson) {
                        warn!("Map render failed for validated document: {e}");
                    }
                }
            }
            Err(message) => {
                tracker.complete(attempt_id, Err(message));
            }
        }
    });

    (StatusCode::ACCEPTED, Json(json!({ "attemptId": attempt_id }))).into_response()
}

/// Snapshot of the current attempt.
pub async fn current_result(State(state): State<AppState>) -> Json<ConversionAttempt> {
    Json(state.tracker.snapshot())
}

/// Explicit clear: back to a fresh Idle instance.
///
/// The map keeps its last good layer — only a newer successful render may
/// replace the user's last good view.
pub async fn reset_attempt(State(state): State<AppState>) -> Json<ConversionAttempt> {
    state.tracker.reset();
    Json(state.tracker.snapshot())
}

/// The current render plan, or JSON `null` before the first success.
pub async fn map_plan(State(state): State<AppState>) -> Response {
    let plan = state.surface.lock().unwrap().render_plan();
    Json(plan).into_response()
}

/// The validated document verbatim, as a file download.
pub async fn download_document(State(state): State<AppState>) -> Response {
    let snapshot = state.tracker.snapshot();
    let (Some(document), Some(output_name)) = (snapshot.result_document, snapshot.output_name)
    else {
        return error_response(StatusCode::NOT_FOUND, "no converted document available");
    };

    (
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{output_name}\""),
            ),
        ],
        document,
    )
        .into_response()
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "error": message }))).into_response()
}
