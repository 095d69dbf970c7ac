//! Test runner subprocess handling
//!
//! A [`TestProcess`] is created per discovery or execution call and owned
//! exclusively by that call; spawn failures surface immediately as errors
//! rather than as stream events.

use std::path::Path;
use std::process::Stdio;

use tokio::process::{Child, ChildStdout, Command};

use crate::common::{Error, Result};

/// A live test runner subprocess: its output stream plus a kill switch
#[derive(Debug)]
pub struct TestProcess {
    child: Child,
    stdout: Option<ChildStdout>,
}

impl TestProcess {
    /// Spawn the test runner with the given argument list.
    ///
    /// The working directory is validated before spawning so a bad
    /// configuration fails fast with a descriptive error instead of an
    /// opaque OS error from the spawn itself.
    pub fn spawn(executable: &Path, args: &[String], cwd: &Path) -> Result<Self> {
        if !cwd.is_dir() {
            return Err(Error::WorkingDirMissing(cwd.to_path_buf()));
        }

        tracing::debug!(
            executable = %executable.display(),
            ?args,
            cwd = %cwd.display(),
            "Spawning test runner"
        );

        let mut child = Command::new(executable)
            .args(args)
            .current_dir(cwd)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::launch(executable.display(), e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| Error::launch(executable.display(), "no stdout pipe"))?;

        Ok(Self {
            child,
            stdout: Some(stdout),
        })
    }

    /// Take the runner's standard output stream (once per process)
    pub fn take_stdout(&mut self) -> Option<ChildStdout> {
        self.stdout.take()
    }

    /// Request immediate termination.
    ///
    /// Safe to call more than once and after exit; a kill that races the
    /// process's own exit is ignored.
    pub fn terminate(&mut self) {
        tracing::debug!("Terminating test runner");
        let _ = self.child.start_kill();
    }

    /// Wait for the process to exit and return its exit code.
    ///
    /// The single point from which success and failure of an invocation are
    /// resolved. `None` means the process was killed by a signal.
    pub async fn wait(&mut self) -> Result<Option<i32>> {
        let status = self.child.wait().await?;
        tracing::debug!(code = ?status.code(), "Test runner exited");
        Ok(status.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[tokio::test]
    async fn test_missing_cwd_fails_before_spawn() {
        // The executable does not exist either; the cwd check must win
        let err = TestProcess::spawn(
            Path::new("/no/such/binary"),
            &[],
            Path::new("/no/such/directory"),
        )
        .unwrap_err();
        assert!(matches!(err, Error::WorkingDirMissing(_)));
    }

    #[tokio::test]
    async fn test_unlaunchable_executable() {
        let cwd = std::env::temp_dir();
        let err = TestProcess::spawn(Path::new("/no/such/binary"), &[], &cwd).unwrap_err();
        match err {
            Error::Launch { command, .. } => assert!(command.contains("/no/such/binary")),
            other => panic!("expected Launch error, got {other:?}"),
        }
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_exit_code_resolution() {
        let sh = PathBuf::from("/bin/sh");
        let args = vec!["-c".to_string(), "exit 3".to_string()];
        let mut process = TestProcess::spawn(&sh, &args, &std::env::temp_dir()).unwrap();
        assert_eq!(process.wait().await.unwrap(), Some(3));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_terminate_is_idempotent() {
        let sh = PathBuf::from("/bin/sh");
        let args = vec!["-c".to_string(), "sleep 30".to_string()];
        let mut process = TestProcess::spawn(&sh, &args, &std::env::temp_dir()).unwrap();
        process.terminate();
        process.terminate();
        // Killed by SIGKILL, so no exit code
        assert_eq!(process.wait().await.unwrap(), None);
        process.terminate();
    }
}
