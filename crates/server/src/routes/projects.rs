use std::path::PathBuf;

use axum::extract::{Path, State};
use axum::Json;
use orchestrator::CliCommand;
use serde::{Deserialize, Serialize};
use tischiron_core::FileRecord;
use utoipa::ToSchema;

use crate::error::AppError;
use crate::routes::cli::CliOutputResponse;
use crate::state::AppState;

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectSummary {
    pub name: String,
    pub remote_work_dir: String,
    pub compilation_db_path: String,
    pub file_count: usize,
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectsResponse {
    pub projects_dir: String,
    pub projects: Vec<ProjectSummary>,
}

#[derive(Debug, Deserialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct InitProjectRequest {
    /// Path to `compile_commands.json`
    pub compilation_db: String,
    /// Project name, defaults to the CLI's choice
    pub name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/projects",
    responses(
        (status = 200, description = "Initialized projects", body = ProjectsResponse)
    ),
    tag = "projects"
)]
pub async fn list_projects(
    State(state): State<AppState>,
) -> Result<Json<ProjectsResponse>, AppError> {
    let mut projects = Vec::new();

    for name in state.store.list_projects().await? {
        let summary = match state.store.get_project(&name).await {
            Ok(meta) => {
                let file_count = state.store.list_files(&name).await?.len();
                ProjectSummary {
                    name,
                    remote_work_dir: meta.remote_work_dir,
                    compilation_db_path: meta.compilation_db_path,
                    file_count,
                }
            }
            Err(e) => {
                tracing::warn!(project = %name, error = %e, "Skipping unreadable project");
                continue;
            }
        };
        projects.push(summary);
    }

    Ok(Json(ProjectsResponse {
        projects_dir: state.store.projects_dir().display().to_string(),
        projects,
    }))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project}/files",
    params(
        ("project" = String, Path, description = "Project name")
    ),
    responses(
        (status = 200, description = "Indexed source files", body = Vec<FileRecord>),
        (status = 404, description = "Project not found")
    ),
    tag = "projects"
)]
pub async fn list_project_files(
    State(state): State<AppState>,
    Path(project): Path<String>,
) -> Result<Json<Vec<FileRecord>>, AppError> {
    let files = state.store.list_files(&project).await?;
    Ok(Json(files))
}

#[utoipa::path(
    post,
    path = "/api/projects/init",
    request_body = InitProjectRequest,
    responses(
        (status = 200, description = "Output of `tischiron init`", body = CliOutputResponse),
        (status = 400, description = "Invalid request"),
        (status = 502, description = "CLI could not be started")
    ),
    tag = "projects"
)]
pub async fn init_project(
    State(state): State<AppState>,
    Json(payload): Json<InitProjectRequest>,
) -> Result<Json<CliOutputResponse>, AppError> {
    if payload.compilation_db.trim().is_empty() {
        return Err(AppError::BadRequest(
            "compilation_db must not be empty".to_string(),
        ));
    }

    let command = CliCommand::Init {
        compilation_db: PathBuf::from(payload.compilation_db),
        name: payload.name.filter(|n| !n.trim().is_empty()),
    };

    let output = state.orchestrator.run_once(&command).await?;
    tracing::info!(success = output.success, "Project init finished");

    Ok(Json(output.into()))
}
