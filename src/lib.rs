//! Session manager for containerized simulation workbenches.
//!
//! The crate drives the Docker CLI rather than the engine API: every
//! operation shells out to `docker` / `docker compose` with an explicit
//! argument list, so a `--verbose` run prints commands a user could paste
//! back into a terminal. Layers, bottom up:
//!
//! - [`docker`] locates the engine binary and spawns it with a consistent
//!   stdio discipline,
//! - [`compose`] assembles `docker compose` invocations from an explicit
//!   [`compose::ComposeContext`] (no ambient environment mutation),
//! - [`profile`] maps GUI/ROS/access choices to a profile and its overlay
//!   and env-layer plan,
//! - [`registry`] reads running sessions back out of engine labels,
//! - [`lifecycle`] implements the start/enter/stop/copy/config flows,
//! - [`commands`] adapts those flows to the CLI surface.

pub mod cli;
pub mod color;
pub mod commands;
pub mod compose;
pub mod docker;
pub mod doctor;
pub mod envfile;
pub mod errors;
pub mod ids;
pub mod lifecycle;
pub mod menu;
pub mod profile;
pub mod registry;
pub mod remote;
pub mod statefile;
pub mod util;
pub mod webrtc;
pub mod x11;

use std::env;
use std::path::{Path, PathBuf};

use crate::errors::SessionError;
use crate::profile::OverlayPlan;

/// Name prefix shared by every container this tool manages. Session
/// discovery filters on it, so foreign containers never show up in lists.
pub const CONTAINER_PREFIX: &str = "simdock-";

/// Environment variable that pins the context directory, overriding the
/// upward walk (but not an explicit `--context-dir`).
pub const CONTEXT_ENV_VAR: &str = "SIMDOCK_CONTEXT";

/// Resolve the context directory that holds `compose/compose.yaml` and the
/// env layers under `compose/env/`.
///
/// Precedence: `--context-dir`, then `SIMDOCK_CONTEXT`, then an upward walk
/// from the current directory. An explicitly named directory that lacks the
/// compose file is an error rather than a fallback; a typo there should not
/// silently pick up some parent checkout.
pub fn find_context_dir(override_dir: Option<&Path>) -> Result<PathBuf, SessionError> {
    if let Some(dir) = override_dir {
        return check_context_dir(dir, "--context-dir");
    }
    if let Ok(raw) = env::var(CONTEXT_ENV_VAR) {
        let raw = raw.trim();
        if !raw.is_empty() {
            return check_context_dir(Path::new(raw), CONTEXT_ENV_VAR);
        }
    }
    let cwd = env::current_dir().map_err(SessionError::Io)?;
    context_dir_from(&cwd).ok_or_else(|| {
        SessionError::InvalidArgument(format!(
            "no compose/compose.yaml found in {} or any parent directory; \
             pass --context-dir or set {}",
            cwd.display(),
            CONTEXT_ENV_VAR
        ))
    })
}

fn check_context_dir(dir: &Path, origin: &str) -> Result<PathBuf, SessionError> {
    if OverlayPlan::base_compose_file(dir).is_file() {
        Ok(dir.to_path_buf())
    } else {
        Err(SessionError::InvalidArgument(format!(
            "{} points at {}, but there is no compose/compose.yaml there",
            origin,
            dir.display()
        )))
    }
}

/// Walk from `start` toward the filesystem root until a directory carrying
/// `compose/compose.yaml` is found.
pub fn context_dir_from(start: &Path) -> Option<PathBuf> {
    let mut dir = start;
    loop {
        if OverlayPlan::base_compose_file(dir).is_file() {
            return Some(dir.to_path_buf());
        }
        dir = dir.parent()?;
    }
}
