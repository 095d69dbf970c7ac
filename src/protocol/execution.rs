//! Test execution protocol
//!
//! Runs the test binary in run mode, decodes its standard output as a
//! sequence of lifecycle events, and drives the suite/case run tracker,
//! invoking the caller's sink synchronously for each event in arrival
//! order. Completion is keyed off process exit, not stream end: a stream
//! truncated by a cancel-kill is not itself a failure. Malformed JSON
//! mid-stream still propagates as a parse error.

use tokio::io::AsyncReadExt;
use tokio::sync::watch;

use crate::common::{Error, Result, RunSpec};
use crate::process::{split_args, TestProcess};
use crate::protocol::events::LifecycleEvent;
use crate::stream::JsonStreamDecoder;

/// Outcome of one execution, produced after the stream has ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunResult {
    /// Runner exit code; `None` when the process was killed
    pub exit_code: Option<i32>,
}

/// One buffered FAILURE record, raw wire values (1-based line)
#[derive(Debug, Clone, PartialEq)]
pub struct TestFailure {
    pub file: String,
    pub line: u32,
    pub kind: String,
    pub test: String,
    pub msg: Option<String>,
}

impl TestFailure {
    /// Human-readable one-line rendering, raw source line preserved
    pub fn render(&self) -> String {
        match &self.msg {
            Some(msg) => format!("{}:{} - [{}] {} | {}", self.file, self.line, self.kind, self.test, msg),
            None => format!("{}:{} - [{}] {}", self.file, self.line, self.kind, self.test),
        }
    }
}

/// Pass/fail verdict reported by the runner for one case
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TestOutcome {
    Passed,
    Failed,
}

/// Receiver for run transitions, invoked synchronously in event order.
///
/// `test_finished` carries every failure buffered since the case started;
/// mapping those onto host decorations happens a layer up, in the
/// projection.
pub trait RunEventSink {
    fn suite_running(&mut self, suite: &str);
    fn suite_completed(&mut self, suite: &str);
    fn test_running(&mut self, test: &str);
    fn test_finished(&mut self, test: &str, outcome: TestOutcome, failures: &[TestFailure]);
}

/// Failure accumulator driven by the event stream.
///
/// No nesting validation is performed: a CASE_LEAVE without a prior
/// CASE_ENTER simply reports whatever accumulated since the last reset.
#[derive(Debug, Default)]
pub struct CaseTracker {
    failures: Vec<TestFailure>,
}

impl CaseTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interpret one event, forwarding the resulting transition to the sink
    pub fn dispatch<S: RunEventSink + ?Sized>(&mut self, event: LifecycleEvent, sink: &mut S) {
        match event {
            LifecycleEvent::SuiteEnter { suite_name, .. } => sink.suite_running(&suite_name),
            LifecycleEvent::SuiteLeave { suite_name, .. } => sink.suite_completed(&suite_name),
            LifecycleEvent::CaseEnter { test_name } => {
                self.failures.clear();
                sink.test_running(&test_name);
            }
            LifecycleEvent::Failure {
                file,
                line,
                kind,
                test,
                msg,
            } => self.failures.push(TestFailure {
                file,
                line,
                kind,
                test,
                msg,
            }),
            LifecycleEvent::CaseLeave { test_name, fail } => {
                let outcome = if fail {
                    TestOutcome::Failed
                } else {
                    TestOutcome::Passed
                };
                sink.test_finished(&test_name, outcome, &self.failures);
                self.failures.clear();
            }
        }
    }
}

/// Spawn the runner in run mode.
///
/// An empty `test_ids` sequence means "run everything"; otherwise the ids
/// are appended after the configured run arguments.
pub fn schedule(spec: &RunSpec, test_ids: &[String]) -> Result<TestProcess> {
    let mut args = split_args(&spec.run_args)?;
    args.extend(test_ids.iter().cloned());
    TestProcess::spawn(&spec.executable, &args, &spec.cwd)
}

/// Drive a scheduled run to completion.
///
/// Events are delivered to `sink` strictly in decode order. Flipping the
/// `cancel` channel to `true` terminates the process immediately; the call
/// still resolves naturally once the process exits.
pub async fn execute<S: RunEventSink + ?Sized>(
    mut process: TestProcess,
    sink: &mut S,
    mut cancel: watch::Receiver<bool>,
) -> Result<RunResult> {
    let mut stdout = process
        .take_stdout()
        .ok_or_else(|| Error::launch("test runner", "no stdout pipe"))?;

    let mut decoder = JsonStreamDecoder::new();
    let mut tracker = CaseTracker::new();
    let mut buf = [0u8; 8192];
    let mut cancel_seen = false;

    // A cancel can land before this call subscribes to the channel; the
    // watch only reports changes, so check the current value first.
    if *cancel.borrow() {
        cancel_seen = true;
        process.terminate();
    }

    let stream_result: Result<()> = loop {
        tokio::select! {
            read = stdout.read(&mut buf) => {
                match read {
                    Ok(0) => break Ok(()),
                    Ok(n) => {
                        let decoded = match decoder.push(&buf[..n]) {
                            Ok(values) => values,
                            Err(e) => break Err(e),
                        };
                        let mut dispatch_result = Ok(());
                        for value in decoded {
                            match serde_json::from_value::<LifecycleEvent>(value) {
                                Ok(event) => tracker.dispatch(event, sink),
                                Err(e) => {
                                    dispatch_result = Err(Error::Parse(e.to_string()));
                                    break;
                                }
                            }
                        }
                        if dispatch_result.is_err() {
                            break dispatch_result;
                        }
                    }
                    Err(e) => break Err(e.into()),
                }
            }
            changed = cancel.changed(), if !cancel_seen => {
                cancel_seen = true;
                match changed {
                    Ok(()) if *cancel.borrow() => process.terminate(),
                    // Sender gone or a reset; nothing to act on
                    _ => {}
                }
            }
        }
    };

    // Exit resolution happens even when the stream failed, so the process
    // never outlives the call.
    if stream_result.is_err() {
        process.terminate();
    }
    let exit_code = process.wait().await?;
    stream_result?;

    // No decoder.finish() here: a cancel-kill may truncate the trailing
    // value, and run health is keyed to the exit code instead.
    if decoder.has_partial() {
        tracing::debug!("Event stream ended mid-value; runner was cut off");
    }

    Ok(RunResult { exit_code })
}
