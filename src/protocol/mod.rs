//! Test runner wire protocol
//!
//! Discovery (list mode) and execution (run mode) against the external
//! test binary, both decoding concatenated JSON from its standard output.

pub mod discovery;
pub mod events;
pub mod execution;

pub use discovery::{discover, TestNode};
pub use events::LifecycleEvent;
pub use execution::{
    execute, schedule, CaseTracker, RunEventSink, RunResult, TestFailure, TestOutcome,
};
