use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Contents of `<projects_dir>/<name>/project.json`, written by `tischiron init`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct ProjectMetadata {
    pub name: String,
    /// Build directory on the machine that produced compile_commands.json
    pub remote_work_dir: String,
    pub compilation_db_path: String,
    #[serde(default)]
    pub include_paths: Vec<String>,
    #[serde(default)]
    pub ssh_host: String,
    #[serde(default)]
    pub ssh_user: String,
    #[serde(default)]
    pub tis_env_script: String,
}

/// One `files/<name>.json` record of a project.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
pub struct FileRecord {
    /// Base filename, e.g. `json_object.c`
    pub name: String,
    /// Remote build-time path recorded at indexing time
    pub path: String,
    pub directory: String,
    #[serde(default)]
    pub includes: Vec<String>,
    #[serde(default)]
    pub defines: Vec<String>,
}
