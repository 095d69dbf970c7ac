//! testhook - a test-runner protocol engine
//!
//! Discovers and executes tests exposed by an external native test binary
//! that reports over concatenated JSON, and projects the results onto the
//! suite/case model a test-management front end consumes.

pub mod adapter;
pub mod cli;
pub mod commands;
pub mod common;
pub mod process;
pub mod protocol;
pub mod stream;

// Re-export commonly used types for hosts and tests
pub use adapter::{HostSink, RunState, TestAdapter, ROOT_SUITE_ID};
pub use common::{Error, Result};
pub use protocol::RunResult;
