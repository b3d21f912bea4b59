use std::convert::Infallible;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::Json;
use events::ProgressEvent;
use futures::stream::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::json;
use tischiron_core::{is_plain_file_name, GenerationRequest};
use utoipa::ToSchema;

use crate::error::AppError;
use crate::state::AppState;

pub const SSE_KEEP_ALIVE_INTERVAL: Duration = Duration::from_secs(15);

/// Body of `POST /api/generate`. Omitted fields take the configured defaults.
#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct GenerateRequest {
    pub project: String,
    pub file: String,
    pub function: String,
    pub model: Option<String>,
    pub max_iterations: Option<u32>,
    /// File name inside the configured output directory.
    /// Defaults to `Driver_for_<function>.c`.
    pub output: Option<String>,
}

impl AppState {
    fn generation_request(&self, body: GenerateRequest) -> Result<GenerationRequest, AppError> {
        let generation = &self.config.generation;
        let output_artifact_path = match body.output.filter(|o| !o.trim().is_empty()) {
            Some(output) if is_plain_file_name(&output) => {
                self.config.paths.output_dir.join(output)
            }
            Some(output) => {
                return Err(AppError::BadRequest(format!(
                    "output must be a file name inside the output directory, got '{}'",
                    output
                )))
            }
            None => self.config.default_output_path(&body.function),
        };

        let request = GenerationRequest {
            project_id: body.project,
            source_file: body.file,
            target_function: body.function,
            model_name: body
                .model
                .unwrap_or_else(|| generation.default_model.clone()),
            max_iterations: body
                .max_iterations
                .unwrap_or(generation.default_max_iterations),
            output_artifact_path,
        };

        request.validate()?;
        Ok(request)
    }
}

fn progress_to_sse_event(event: &ProgressEvent, seq: u64) -> Result<Event, Infallible> {
    let sse = match Event::default().json_data(event) {
        Ok(sse) => sse.event(event.event_type()),
        Err(e) => {
            tracing::warn!("Failed to serialize progress event: {}", e);
            let message = format!("Failed to serialize progress event: {}", e);
            Event::default()
                .event("error")
                .data(json!({ "type": "error", "message": message }).to_string())
        }
    };

    Ok(sse.id(seq.to_string()))
}

#[utoipa::path(
    post,
    path = "/api/generate",
    request_body = GenerateRequest,
    responses(
        (status = 200, description = "SSE stream of progress events ending in `complete` or `error`"),
        (status = 400, description = "Invalid request"),
        (status = 404, description = "Project not found")
    ),
    tag = "generate"
)]
pub async fn generate(
    State(state): State<AppState>,
    Json(body): Json<GenerateRequest>,
) -> Result<Sse<impl Stream<Item = Result<Event, Infallible>>>, AppError> {
    let request = state.generation_request(body)?;

    if !state.store.project_exists(&request.project_id).await {
        return Err(AppError::NotFound(format!(
            "Project not found: {}",
            request.project_id
        )));
    }

    // The CLI opens the output file without creating directories
    let artifact = state.orchestrator.cli().locate(request.artifact_path());
    if let Some(dir) = artifact.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir).await.map_err(|e| {
            AppError::Internal(format!("Failed to create {}: {}", dir.display(), e))
        })?;
    }

    let stream = state.orchestrator.start(request);
    tracing::info!(generation_id = %stream.id(), artifact = %artifact.display(), "Streaming generation");

    // Dropping the response body drops the stream, which kills the CLI.
    let events = stream
        .enumerate()
        .map(|(seq, event)| progress_to_sse_event(&event, seq as u64));

    Ok(Sse::new(events).keep_alive(
        KeepAlive::new()
            .interval(SSE_KEEP_ALIVE_INTERVAL)
            .text("keep-alive"),
    ))
}
