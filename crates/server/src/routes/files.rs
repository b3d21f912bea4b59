use axum::extract::{Path, State};
use axum::Json;
use resolver::FunctionInfo;
use serde::Serialize;
use tischiron_core::{Resolution, ResolutionStrategy};
use utoipa::ToSchema;

use crate::config::LOCAL_ROOT_ENV;
use crate::error::AppError;
use crate::state::AppState;

fn unresolved_hint() -> String {
    format!(
        "The file is not available locally. Set {} (or paths.local_root_override) to the local \
         checkout of the remote work directory, or copy the sources under the project root.",
        LOCAL_ROOT_ENV
    )
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ResolveResponse {
    pub resolved: bool,
    pub local_path: Option<String>,
    pub strategy: Option<ResolutionStrategy>,
    /// Build-time path recorded in project metadata
    pub remote_path: String,
    /// What to configure when the file could not be found
    pub hint: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FunctionsResponse {
    pub file: String,
    pub local_path: String,
    pub functions: Vec<FunctionInfo>,
}

#[utoipa::path(
    get,
    path = "/api/projects/{project}/files/{filename}/resolve",
    params(
        ("project" = String, Path, description = "Project name"),
        ("filename" = String, Path, description = "File name or path suffix")
    ),
    responses(
        (status = 200, description = "Resolution outcome, found or not", body = ResolveResponse),
        (status = 404, description = "Project or file not in metadata")
    ),
    tag = "files"
)]
pub async fn resolve_file(
    State(state): State<AppState>,
    Path((project, filename)): Path<(String, String)>,
) -> Result<Json<ResolveResponse>, AppError> {
    let (record, resolution) = state.resolve_file(&project, &filename).await?;

    let response = match resolution {
        Resolution::Found { path, strategy } => ResolveResponse {
            resolved: true,
            local_path: Some(path.display().to_string()),
            strategy: Some(strategy),
            remote_path: record.path,
            hint: None,
        },
        Resolution::Unresolved => ResolveResponse {
            resolved: false,
            local_path: None,
            strategy: None,
            remote_path: record.path,
            hint: Some(unresolved_hint()),
        },
    };

    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/api/projects/{project}/files/{filename}/functions",
    params(
        ("project" = String, Path, description = "Project name"),
        ("filename" = String, Path, description = "File name or path suffix")
    ),
    responses(
        (status = 200, description = "Functions defined in the file", body = FunctionsResponse),
        (status = 404, description = "Unknown file, or file not available locally")
    ),
    tag = "files"
)]
pub async fn list_file_functions(
    State(state): State<AppState>,
    Path((project, filename)): Path<(String, String)>,
) -> Result<Json<FunctionsResponse>, AppError> {
    let (record, resolution) = state.resolve_file(&project, &filename).await?;

    let Some(path) = resolution.path() else {
        return Err(AppError::NotFound(format!(
            "{} ({}) could not be found locally. {}",
            record.name,
            record.path,
            unresolved_hint()
        )));
    };

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| AppError::Internal(format!("Failed to read {}: {}", path.display(), e)))?;
    let source = String::from_utf8_lossy(&bytes);

    Ok(Json(FunctionsResponse {
        file: record.name,
        local_path: path.display().to_string(),
        functions: resolver::list_functions(&source),
    }))
}
