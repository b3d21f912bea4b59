use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("Project not found: {0}")]
    ProjectNotFound(String),

    #[error("File '{file}' not found in project '{project}'")]
    FileNotFound { project: String, file: String },

    #[error("Invalid project name: {0}")]
    InvalidProjectName(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed metadata in {path}: {source}")]
    Json {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, MetadataError>;
