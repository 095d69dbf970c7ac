//! Configuration file handling
//!
//! The runner configuration lives in a `testhook.toml` at the workspace
//! root. Command, argument, and working-directory strings may contain the
//! `${workspace}` token, which is substituted textually before any
//! shell-word splitting takes place.

use serde::Deserialize;
use std::path::{Path, PathBuf};

use super::{Error, Result};

/// Name of the per-workspace configuration file
pub const CONFIG_FILE: &str = "testhook.toml";

/// Variable token resolving to the workspace path
pub const WORKSPACE_VAR: &str = "${workspace}";

/// Main configuration structure
#[derive(Debug, Deserialize)]
pub struct Config {
    /// Test runner invocation settings
    pub runner: RunnerConfig,
}

/// Configuration for the native test runner binary
#[derive(Debug, Deserialize, Clone)]
pub struct RunnerConfig {
    /// Path to the test executable (bare names are searched on PATH)
    pub executable: String,

    /// Working directory for the runner process
    #[serde(default = "default_cwd")]
    pub cwd: String,

    /// Argument string for discovery ("list" mode), shell-word split
    #[serde(default)]
    pub load_args: String,

    /// Argument string for execution ("run" mode), shell-word split
    #[serde(default)]
    pub run_args: String,
}

fn default_cwd() -> String {
    WORKSPACE_VAR.to_string()
}

/// A fully resolved runner invocation, immutable per load/run.
///
/// Re-resolved from [`Config`] before every discovery or execution so that
/// configuration edits take effect on the next request.
#[derive(Debug, Clone)]
pub struct RunSpec {
    pub executable: PathBuf,
    pub cwd: PathBuf,
    pub load_args: String,
    pub run_args: String,
}

/// Substitute the `${workspace}` token in a configured string
pub fn substitute_workspace(input: &str, workspace: &Path) -> String {
    input.replace(WORKSPACE_VAR, &workspace.to_string_lossy())
}

impl Config {
    /// Load configuration from `testhook.toml` in the workspace, or from an
    /// explicitly given file
    pub fn load(workspace: &Path, explicit: Option<&Path>) -> Result<Self> {
        let path = match explicit {
            Some(p) => p.to_path_buf(),
            None => workspace.join(CONFIG_FILE),
        };

        if !path.exists() {
            return Err(Error::Config(format!(
                "no runner configuration found at '{}'",
                path.display()
            )));
        }

        let content = std::fs::read_to_string(&path).map_err(|e| {
            Error::Config(format!("failed to read '{}': {}", path.display(), e))
        })?;

        toml::from_str(&content).map_err(|e| Error::ConfigParse(e.to_string()))
    }

    /// Resolve the configuration against a workspace path
    pub fn resolve(&self, workspace: &Path) -> Result<RunSpec> {
        let executable = substitute_workspace(&self.runner.executable, workspace);

        // Bare command names fall back to a PATH search
        let executable = if executable.contains(std::path::MAIN_SEPARATOR) {
            PathBuf::from(executable)
        } else {
            which::which(&executable).map_err(|_| {
                Error::Config(format!("test executable '{}' not found on PATH", executable))
            })?
        };

        Ok(RunSpec {
            executable,
            cwd: PathBuf::from(substitute_workspace(&self.runner.cwd, workspace)),
            load_args: substitute_workspace(&self.runner.load_args, workspace),
            run_args: substitute_workspace(&self.runner.run_args, workspace),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_substitute_workspace() {
        let ws = Path::new("/home/user/project");
        assert_eq!(
            substitute_workspace("${workspace}/build/tests", ws),
            "/home/user/project/build/tests"
        );
        assert_eq!(substitute_workspace("--list", ws), "--list");
    }

    #[test]
    fn test_parse_minimal() {
        let config: Config = toml::from_str(
            r#"
            [runner]
            executable = "${workspace}/build/suite"
            "#,
        )
        .unwrap();

        assert_eq!(config.runner.cwd, "${workspace}");
        assert_eq!(config.runner.load_args, "");
    }

    #[test]
    fn test_resolve_paths() {
        let config: Config = toml::from_str(
            r#"
            [runner]
            executable = "${workspace}/build/suite"
            cwd = "${workspace}/build"
            load_args = "--list ${workspace}/tests.json"
            "#,
        )
        .unwrap();

        let spec = config.resolve(Path::new("/ws")).unwrap();
        assert_eq!(spec.executable, PathBuf::from("/ws/build/suite"));
        assert_eq!(spec.cwd, PathBuf::from("/ws/build"));
        assert_eq!(spec.load_args, "--list /ws/tests.json");
    }

    #[test]
    fn test_missing_file_is_config_error() {
        let err = Config::load(Path::new("/nonexistent"), None).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }
}
