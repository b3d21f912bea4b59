pub mod domain;
pub mod error;

pub use domain::generation::*;
pub use domain::project::*;
pub use domain::resolution::*;
pub use error::CoreError;
