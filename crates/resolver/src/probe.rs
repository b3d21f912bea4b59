//! Read-only filesystem probes used by the resolver

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use tracing::debug;

/// Filesystem access needed by [`PathResolver`](crate::PathResolver).
///
/// Implementations must swallow I/O errors: an unreadable candidate is
/// simply not a match.
pub trait FileProbe: Send + Sync {
    /// Whether `path` currently names a regular file
    fn is_file(&self, path: &Path) -> bool;

    /// First file named exactly `filename` under `root`, at most `max_depth`
    /// levels deep. Match order is traversal order.
    fn find_by_name(&self, root: &Path, filename: &str, max_depth: usize) -> Option<PathBuf>;
}

/// The real local filesystem
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalFs;

impl FileProbe for LocalFs {
    fn is_file(&self, path: &Path) -> bool {
        std::fs::metadata(path)
            .map(|meta| meta.is_file())
            .unwrap_or(false)
    }

    fn find_by_name(&self, root: &Path, filename: &str, max_depth: usize) -> Option<PathBuf> {
        // Source trees are often gitignored build inputs, so no filtering.
        let walker = WalkBuilder::new(root)
            .standard_filters(false)
            .follow_links(true)
            .max_depth(Some(max_depth))
            .build();

        for entry in walker {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    debug!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let is_file = entry.file_type().map(|t| t.is_file()).unwrap_or(false);
            if is_file && entry.file_name() == filename {
                return Some(entry.into_path());
            }
        }

        None
    }
}
