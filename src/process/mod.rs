//! Subprocess launching and argument handling

mod args;
mod launcher;

pub use args::split_args;
pub use launcher::TestProcess;
