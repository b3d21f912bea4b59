use axum::extract::{Query, State};
use axum::Json;
use orchestrator::{CliCommand, CliOutput};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::error::AppError;
use crate::state::AppState;

/// Captured output of a one-shot CLI command.
///
/// A nonzero exit is reported here, not as an HTTP error.
#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct CliOutputResponse {
    pub success: bool,
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl From<CliOutput> for CliOutputResponse {
    fn from(output: CliOutput) -> Self {
        Self {
            success: output.success,
            exit_code: output.exit_code,
            stdout: output.stdout,
            stderr: output.stderr,
        }
    }
}

#[derive(Debug, Deserialize, IntoParams)]
#[into_params(parameter_in = Query)]
pub struct ListQuery {
    pub project: Option<String>,
    #[serde(default)]
    pub verbose: bool,
}

#[utoipa::path(
    get,
    path = "/api/cli/list",
    params(ListQuery),
    responses(
        (status = 200, description = "Output of `tischiron list`", body = CliOutputResponse),
        (status = 502, description = "CLI could not be started")
    ),
    tag = "cli"
)]
pub async fn cli_list(
    State(state): State<AppState>,
    Query(query): Query<ListQuery>,
) -> Result<Json<CliOutputResponse>, AppError> {
    let command = CliCommand::List {
        project: query.project.filter(|p| !p.trim().is_empty()),
        verbose: query.verbose,
    };

    let output = state.orchestrator.run_once(&command).await?;
    Ok(Json(output.into()))
}
