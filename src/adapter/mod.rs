//! Test adapter: the host-facing state machine
//!
//! One adapter instance owns at most one discovery or execution at a time.
//! A `load`/`run` request arriving while one is in flight is silently
//! ignored (not queued, not errored) so subprocess ownership never
//! overlaps. The live [`TestProcess`] is owned by the in-flight call
//! itself; cancellation reaches it through a watch channel rather than
//! through a shared handle slot.

pub mod projection;

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use tokio::sync::watch;

use crate::common::{Config, Result, RunSpec};
use crate::protocol::{
    self, discover, RunEventSink, RunResult, TestFailure, TestOutcome,
};

pub use projection::{
    decorate, failure_message, project_tree, Decoration, SuiteInfo, TestInfo, TestItem,
    ROOT_SUITE_ID,
};

/// Adapter-level run state guarding re-entrancy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum RunState {
    Idle = 0,
    Loading = 1,
    Running = 2,
    Cancelled = 3,
}

/// Lock-free state cell; the adapter is driven cooperatively, so a single
/// compare-and-swap is all the arbitration load/run need
#[derive(Debug)]
struct StateCell(AtomicU8);

impl StateCell {
    fn new() -> Self {
        Self(AtomicU8::new(RunState::Idle as u8))
    }

    fn get(&self) -> RunState {
        match self.0.load(Ordering::SeqCst) {
            1 => RunState::Loading,
            2 => RunState::Running,
            3 => RunState::Cancelled,
            _ => RunState::Idle,
        }
    }

    /// Enter `target` from Idle; false when something is already in flight
    fn begin(&self, target: RunState) -> bool {
        self.0
            .compare_exchange(
                RunState::Idle as u8,
                target as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    /// Flip Running to Cancelled; false when no run is in flight
    fn request_cancel(&self) -> bool {
        self.0
            .compare_exchange(
                RunState::Running as u8,
                RunState::Cancelled as u8,
                Ordering::SeqCst,
                Ordering::SeqCst,
            )
            .is_ok()
    }

    fn reset(&self) {
        self.0.store(RunState::Idle as u8, Ordering::SeqCst);
    }
}

/// Notifications consumed by the host's test UI.
///
/// Invoked synchronously, strictly in the order the runner wrote the
/// corresponding events.
pub trait HostSink {
    fn run_started(&mut self, tests: &[String]);
    fn suite_running(&mut self, id: &str);
    fn suite_completed(&mut self, id: &str);
    fn test_running(&mut self, id: &str);
    fn test_passed(&mut self, id: &str);
    fn test_failed(&mut self, id: &str, message: &str, decorations: &[Decoration]);
    /// Results of these tests are stale and must be re-run before trusted
    fn tests_retired(&mut self, tests: &[String]);
    fn run_finished(&mut self);
}

/// Bridges raw protocol transitions onto host notifications, attaching
/// failure decorations at the projection boundary
struct ProjectionSink<'a, H: HostSink + ?Sized> {
    host: &'a mut H,
}

impl<H: HostSink + ?Sized> RunEventSink for ProjectionSink<'_, H> {
    fn suite_running(&mut self, suite: &str) {
        self.host.suite_running(suite);
    }

    fn suite_completed(&mut self, suite: &str) {
        self.host.suite_completed(suite);
    }

    fn test_running(&mut self, test: &str) {
        self.host.test_running(test);
    }

    fn test_finished(&mut self, test: &str, outcome: TestOutcome, failures: &[TestFailure]) {
        match outcome {
            TestOutcome::Passed => self.host.test_passed(test),
            TestOutcome::Failed => {
                let decorations: Vec<Decoration> = failures.iter().map(decorate).collect();
                self.host
                    .test_failed(test, &failure_message(failures), &decorations);
            }
        }
    }
}

/// Adapter instance bound to one workspace
pub struct TestAdapter {
    workspace: PathBuf,
    config_path: Option<PathBuf>,
    state: StateCell,
    cancel_tx: watch::Sender<bool>,
}

impl TestAdapter {
    pub fn new(workspace: PathBuf, config_path: Option<PathBuf>) -> Self {
        let (cancel_tx, _) = watch::channel(false);
        Self {
            workspace,
            config_path,
            state: StateCell::new(),
            cancel_tx,
        }
    }

    pub fn state(&self) -> RunState {
        self.state.get()
    }

    /// Re-resolve the runner invocation from configuration.
    ///
    /// Happens before every load and run so configuration edits apply to
    /// the next request without restarting the adapter.
    fn resolve_spec(&self) -> Result<RunSpec> {
        Config::load(&self.workspace, self.config_path.as_deref())?.resolve(&self.workspace)
    }

    /// Clear any cancel left over from a previous run, then enter Running.
    ///
    /// The flag reset precedes the state transition: once the state reads
    /// Running, a `cancel` is observable and must not be erased.
    fn begin_run(&self) -> bool {
        self.cancel_tx.send_replace(false);
        self.state.begin(RunState::Running)
    }

    fn root_label(&self) -> String {
        self.workspace
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "Tests".to_string())
    }

    /// Discover the test tree, rebuilding it wholesale.
    ///
    /// Returns `Ok(None)` when a load or run is already in flight.
    /// Configuration and parse failures propagate so the host can show a
    /// load-failure message.
    pub async fn load(&self) -> Result<Option<SuiteInfo>> {
        if !self.state.begin(RunState::Loading) {
            tracing::debug!(state = ?self.state.get(), "Load request ignored; adapter busy");
            return Ok(None);
        }

        let result = self.load_inner().await;
        self.state.reset();
        result.map(Some)
    }

    async fn load_inner(&self) -> Result<SuiteInfo> {
        let spec = self.resolve_spec()?;
        tracing::info!(executable = %spec.executable.display(), "Loading test list");
        let nodes = discover(&spec).await?;
        Ok(project_tree(&self.root_label(), nodes))
    }

    /// Execute tests, streaming transitions to `host`.
    ///
    /// `tests` may name suites or cases; the sentinel [`ROOT_SUITE_ID`] (or
    /// an empty list) runs everything. Returns `Ok(None)` when the adapter
    /// is busy (no notifications are emitted) or when the run aborted on a
    /// configuration/spawn failure (the host still sees `run_finished`).
    pub async fn run<H: HostSink + ?Sized>(
        &self,
        tests: &[String],
        host: &mut H,
    ) -> Result<Option<RunResult>> {
        if !self.begin_run() {
            tracing::debug!(state = ?self.state.get(), "Run request ignored; adapter busy");
            return Ok(None);
        }

        host.run_started(tests);
        let result = self.run_inner(tests, host).await;
        let cancelled = self.state.get() == RunState::Cancelled;

        if cancelled {
            host.tests_retired(tests);
        }
        host.run_finished();
        self.state.reset();

        match result {
            Ok(run) => Ok(Some(run)),
            Err(e) if e.aborts_run_silently() => {
                tracing::warn!(error = %e, "Test run aborted");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn run_inner<H: HostSink + ?Sized>(
        &self,
        tests: &[String],
        host: &mut H,
    ) -> Result<RunResult> {
        let spec = self.resolve_spec()?;

        let ids: Vec<String> = if tests.iter().any(|t| t == ROOT_SUITE_ID) {
            Vec::new()
        } else {
            tests.to_vec()
        };

        tracing::info!(executable = %spec.executable.display(), ?ids, "Starting test run");
        let process = protocol::schedule(&spec, &ids)?;
        let mut sink = ProjectionSink { host };
        protocol::execute(process, &mut sink, self.cancel_tx.subscribe()).await
    }

    /// Request cancellation of the in-flight run.
    ///
    /// Terminates the runner process immediately; the run still resolves
    /// through its natural exit path, after which its tests are reported
    /// retired instead of passed/failed. A no-op unless a run is in flight.
    pub fn cancel(&self) {
        if self.state.request_cancel() {
            tracing::info!("Cancelling test run");
            self.cancel_tx.send_replace(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_cell_arbitration() {
        let state = StateCell::new();
        assert!(state.begin(RunState::Running));
        assert!(!state.begin(RunState::Loading));
        assert!(state.request_cancel());
        assert!(!state.request_cancel());
        assert_eq!(state.get(), RunState::Cancelled);
        state.reset();
        assert!(state.begin(RunState::Loading));
        // Cancel only applies to runs
        assert!(!state.request_cancel());
    }

    #[test]
    fn test_cancel_after_run_begins_is_not_erased() {
        let adapter = TestAdapter::new(PathBuf::from("/tmp"), None);
        assert!(adapter.begin_run());
        adapter.cancel();
        assert_eq!(adapter.state(), RunState::Cancelled);
        assert!(*adapter.cancel_tx.subscribe().borrow());
    }

    #[test]
    fn test_cancel_without_run_is_noop() {
        let adapter = TestAdapter::new(PathBuf::from("/tmp"), None);
        adapter.cancel();
        assert_eq!(adapter.state(), RunState::Idle);
        assert!(!*adapter.cancel_tx.subscribe().borrow());
    }
}
