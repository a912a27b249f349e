#![allow(clippy::module_name_repetitions)]
//! Docker invocation plumbing: tool discovery, argv previews, Stdio discipline.

use std::collections::BTreeMap;
use std::env;
use std::io;
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus, Output, Stdio};

use which::which;

use crate::errors::SessionError;
use crate::util::shell_join;

/// Locate the docker executable.
///
/// Tests or callers may disable detection explicitly to avoid hard failures
/// on hosts without Docker.
pub fn docker_path() -> Result<PathBuf, SessionError> {
    if env::var("SIMDOCK_TEST_DISABLE_DOCKER").ok().as_deref() == Some("1")
        || env::var("SIMDOCK_SKIP_DOCKER").ok().as_deref() == Some("1")
    {
        return Err(SessionError::ToolMissing {
            tool: "docker".to_string(),
            remediation: "Docker disabled by environment override.".to_string(),
        });
    }
    which("docker").map_err(|_| SessionError::ToolMissing {
        tool: "docker".to_string(),
        remediation: "Install Docker Engine with the compose plugin and re-run.".to_string(),
    })
}

/// Locate the xauth executable (needed only for X11 forwarding).
pub fn xauth_path() -> Result<PathBuf, SessionError> {
    which("xauth").map_err(|_| SessionError::ToolMissing {
        tool: "xauth".to_string(),
        remediation: "Install it with: sudo apt install xauth".to_string(),
    })
}

/// Handle on a resolved docker binary. All engine calls go through here so
/// that verbose previews and quiet-by-default output stay uniform.
pub struct Docker {
    path: PathBuf,
    verbose: bool,
}

impl Docker {
    pub fn locate(verbose: bool) -> Result<Self, SessionError> {
        Ok(Docker {
            path: docker_path()?,
            verbose,
        })
    }

    fn preview(&self, args: &[String]) {
        if self.verbose {
            eprintln!("simdock: docker: {}", shell_join(args));
        }
    }

    fn command(&self, args: &[String]) -> Command {
        let mut cmd = Command::new(&self.path);
        cmd.args(args);
        cmd
    }

    /// Run with stdout/stderr suppressed unless verbose. Returns the exit status.
    pub fn run_quiet(&self, args: &[String]) -> io::Result<ExitStatus> {
        self.preview(args);
        let mut cmd = self.command(args);
        if !self.verbose {
            cmd.stdout(Stdio::null()).stderr(Stdio::null());
        }
        cmd.status()
    }

    /// Run inheriting the terminal (interactive exec, streamed compose output).
    pub fn run_inherit(&self, args: &[String]) -> io::Result<ExitStatus> {
        self.preview(args);
        self.command(args).status()
    }

    /// Run from a working directory with extra environment set on the child
    /// only (never on our own process), inheriting the terminal. Compose
    /// calls go through here: relative paths inside the compose files resolve
    /// against the context directory.
    pub fn run_inherit_with_env_in(
        &self,
        cwd: &Path,
        args: &[String],
        vars: &BTreeMap<String, String>,
    ) -> io::Result<ExitStatus> {
        self.preview(args);
        let mut cmd = self.command(args);
        cmd.current_dir(cwd);
        cmd.envs(vars);
        cmd.status()
    }

    /// Run capturing both streams.
    pub fn capture(&self, args: &[String]) -> io::Result<Output> {
        self.preview(args);
        self.command(args).output()
    }

    /// Run and return trimmed stdout on success, None otherwise.
    pub fn capture_stdout(&self, args: &[String]) -> Option<String> {
        let out = self.capture(args).ok()?;
        if out.status.success() {
            Some(String::from_utf8_lossy(&out.stdout).trim().to_string())
        } else {
            None
        }
    }

    /// Container state via `docker container inspect` (e.g. "running",
    /// "exited"). None when the container does not exist.
    pub fn container_status(&self, name: &str) -> Option<String> {
        let args = vec![
            "container".to_string(),
            "inspect".to_string(),
            "-f".to_string(),
            "{{.State.Status}}".to_string(),
            name.to_string(),
        ];
        self.capture_stdout(&args).filter(|s| !s.is_empty())
    }

    pub fn is_container_running(&self, name: &str) -> bool {
        self.container_status(name).as_deref() == Some("running")
    }

    /// Image existence via `docker image inspect`.
    pub fn image_exists(&self, image: &str) -> bool {
        let args = vec!["image".to_string(), "inspect".to_string(), image.to_string()];
        self.capture(&args).map(|o| o.status.success()).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_docker_path_env_override_reports_missing() {
        // Serialize: other tests may probe the same variable.
        std::env::set_var("SIMDOCK_TEST_DISABLE_DOCKER", "1");
        let err = docker_path().unwrap_err();
        match err {
            SessionError::ToolMissing { tool, .. } => assert_eq!(tool, "docker"),
            other => panic!("unexpected error: {other:?}"),
        }
        std::env::remove_var("SIMDOCK_TEST_DISABLE_DOCKER");
    }
}
