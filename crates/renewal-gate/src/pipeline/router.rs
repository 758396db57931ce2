//! HTTP surface of the pipeline: one route per stage operation plus read
//! endpoints for run state. Stage failures are data, not transport faults,
//! so every route answers 200 with a [`StageReport`] body.

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use serde::Deserialize;

use super::controller::PipelineController;
use super::staging::StagingStore;
use crate::pipeline::StageReport;

#[derive(Debug, Deserialize)]
pub(crate) struct FeedRequest {
    pub(crate) path: PathBuf,
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct ExportRequest {
    #[serde(default)]
    pub(crate) destination: Option<PathBuf>,
}

/// Router builder exposing the pipeline operations over HTTP.
pub fn pipeline_router<S>(controller: Arc<PipelineController<S>>) -> Router
where
    S: StagingStore + 'static,
{
    Router::new()
        .route("/api/v1/renewals/validate", post(validate_handler::<S>))
        .route("/api/v1/woq/normalize", post(normalize_handler::<S>))
        .route("/api/v1/correlate", post(correlate_handler::<S>))
        .route("/api/v1/export", post(export_handler::<S>))
        .route("/api/v1/export/preview", get(preview_handler::<S>))
        .route("/api/v1/validation/current", get(current_handler::<S>))
        .route("/api/v1/validation/history", get(history_handler::<S>))
        .route("/api/v1/state/clear", post(clear_handler::<S>))
        .with_state(controller)
}

pub(crate) async fn validate_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
    axum::Json(request): axum::Json<FeedRequest>,
) -> Response
where
    S: StagingStore + 'static,
{
    let report = controller.validate_renewals(&request.path);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn normalize_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
    axum::Json(request): axum::Json<FeedRequest>,
) -> Response
where
    S: StagingStore + 'static,
{
    let report = controller.normalize_woq(&request.path);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn correlate_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
) -> Response
where
    S: StagingStore + 'static,
{
    let report = controller.correlate();
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn export_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
    request: Option<axum::Json<ExportRequest>>,
) -> Response
where
    S: StagingStore + 'static,
{
    let request = request.map(|axum::Json(body)| body).unwrap_or_default();
    let report = controller.export_rpa(request.destination.as_deref());
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn preview_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
) -> Response
where
    S: StagingStore + 'static,
{
    let report = controller.preview_export();
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn current_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
) -> Response
where
    S: StagingStore + 'static,
{
    let report = match controller.last_validation() {
        Some(snapshot) => StageReport::ok(
            format!("last validation of {}", snapshot.source),
            snapshot,
        ),
        None => StageReport {
            success: false,
            message: "no validation run recorded".to_string(),
            payload: None,
            error_kind: None,
        },
    };
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn history_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
) -> Response
where
    S: StagingStore + 'static,
{
    let history = controller.validation_history();
    let report = StageReport::ok(format!("{} runs kept", history.len()), history);
    (StatusCode::OK, axum::Json(report)).into_response()
}

pub(crate) async fn clear_handler<S>(
    State(controller): State<Arc<PipelineController<S>>>,
) -> Response
where
    S: StagingStore + 'static,
{
    let report = controller.clear_state();
    (StatusCode::OK, axum::Json(report)).into_response()
}
