use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use utoipa::ToSchema;

use crate::error::CoreError;

/// A single lookup of a recorded build path on the local filesystem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionRequest {
    remote_path: String,
    filename: String,
    local_root_override: Option<PathBuf>,
}

impl ResolutionRequest {
    /// Create a request. An empty `filename` is a caller error.
    pub fn new(
        remote_path: impl Into<String>,
        filename: impl Into<String>,
    ) -> Result<Self, CoreError> {
        let filename = filename.into();
        if filename.trim().is_empty() {
            return Err(CoreError::invalid("filename", "must not be empty"));
        }

        Ok(Self {
            remote_path: remote_path.into(),
            filename,
            local_root_override: None,
        })
    }

    /// Substitute `root` for the remote anchor segment during root remapping.
    pub fn with_local_root_override(mut self, root: impl Into<PathBuf>) -> Self {
        self.local_root_override = Some(root.into());
        self
    }

    pub fn remote_path(&self) -> &str {
        &self.remote_path
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn local_root_override(&self) -> Option<&Path> {
        self.local_root_override.as_deref()
    }
}

/// Which step of the fallback chain located the file.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, ToSchema)]
#[cfg_attr(feature = "typescript", derive(ts_rs::TS))]
#[cfg_attr(feature = "typescript", ts(export))]
#[serde(rename_all = "snake_case")]
pub enum ResolutionStrategy {
    Direct,
    RootRemap,
    Sibling,
    RecursiveSearch,
}

impl ResolutionStrategy {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Direct => "direct",
            Self::RootRemap => "root_remap",
            Self::Sibling => "sibling",
            Self::RecursiveSearch => "recursive_search",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// The path existed at resolution time.
    Found {
        path: PathBuf,
        strategy: ResolutionStrategy,
    },
    Unresolved,
}

impl Resolution {
    pub fn found(path: impl Into<PathBuf>, strategy: ResolutionStrategy) -> Self {
        Self::Found {
            path: path.into(),
            strategy,
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Self::Found { path, .. } => Some(path),
            Self::Unresolved => None,
        }
    }

    pub fn strategy(&self) -> Option<ResolutionStrategy> {
        match self {
            Self::Found { strategy, .. } => Some(*strategy),
            Self::Unresolved => None,
        }
    }

    pub fn is_found(&self) -> bool {
        matches!(self, Self::Found { .. })
    }
}
