pub mod cli;
pub mod files;
pub mod generate;
mod health;
pub mod projects;

pub use health::*;
