//! Event types pushed to the operator during a generation run

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One unit of the ordered progress stream.
///
/// Serialized as a flat JSON object with a `type` discriminator, e.g.
/// `{"type":"status","message":"Validating with TIS Analyzer..."}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ProgressEvent {
    /// A recognised milestone, reworded for the operator
    Status { message: String },

    /// A raw output line from the CLI
    Log { message: String, is_error: bool },

    /// The CLI exited. Always the last event of a run that started.
    Complete {
        success: bool,
        /// `None` when the process was terminated by a signal
        exit_code: Option<i32>,
        /// Full text of the output artifact, empty when it was not written
        artifact_text: String,
    },

    /// The CLI could not be started
    Error { message: String },
}

impl ProgressEvent {
    pub fn status(message: impl Into<String>) -> Self {
        Self::Status {
            message: message.into(),
        }
    }

    pub fn log(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
            is_error: false,
        }
    }

    pub fn stderr(message: impl Into<String>) -> Self {
        Self::Log {
            message: message.into(),
            is_error: true,
        }
    }

    /// `success` is derived from the exit code: only `Some(0)` counts.
    pub fn complete(exit_code: Option<i32>, artifact_text: impl Into<String>) -> Self {
        Self::Complete {
            success: exit_code == Some(0),
            exit_code,
            artifact_text: artifact_text.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self::Error {
            message: message.into(),
        }
    }

    pub fn event_type(&self) -> &'static str {
        match self {
            Self::Status { .. } => "status",
            Self::Log { .. } => "log",
            Self::Complete { .. } => "complete",
            Self::Error { .. } => "error",
        }
    }

    /// Whether this event ends the stream
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete { .. } | Self::Error { .. })
    }
}
