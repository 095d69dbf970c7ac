//! Common utilities shared between the engine and the CLI host

pub mod config;
pub mod error;
pub mod logging;

pub use config::{Config, RunSpec};
pub use error::{Error, Result};
