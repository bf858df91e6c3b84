#![doc = include_str!("../README.md")]

pub mod cli;
pub mod config;
pub mod diagnostics;
pub mod engine;
pub mod error;
pub mod runtime;
pub mod selectors;
pub mod tools;
pub mod types;

pub use config::ExtractConfig;
pub use engine::*;
pub use error::{AdsnapError, ArchiveError, Result};
pub use tools::assemble::Pipeline;
pub use types::*;

mod tests;
