//! Local lookup of source files recorded in project metadata
//!
//! Project metadata stores build-time paths from the machine that produced
//! `compile_commands.json`. This crate maps those paths back onto the local
//! filesystem and reads what the operator needs before a generation starts.

pub mod error;
pub mod functions;
pub mod metadata;
pub mod probe;
pub mod resolver;

pub use error::{MetadataError, Result};
pub use functions::{list_functions, FunctionInfo};
pub use metadata::ProjectStore;
pub use probe::{FileProbe, LocalFs};
pub use resolver::{remap_path, PathResolver, ResolverConfig};
