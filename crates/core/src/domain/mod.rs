pub mod generation;
pub mod project;
pub mod resolution;
