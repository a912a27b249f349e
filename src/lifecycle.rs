//! Session lifecycle transitions: start, enter, stop, artifact copy and
//! config dump.
//!
//! Every transition is one-shot: state is reconstructed from engine
//! introspection on each call, nothing is cached across invocations.
//! Best-effort steps (pre-build, sidecar removal, credential refresh)
//! never abort a transition; their failures are collected in the returned
//! report so callers and tests can see them.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;

use anyhow::{Context, Result};

#[cfg(feature = "trace")]
use tracing::instrument;

use crate::color::{color_enabled_stderr, log_warn_stderr};
use crate::compose::{self, ComposeContext};
use crate::docker::Docker;
use crate::envfile;
use crate::errors::SessionError;
use crate::ids;
use crate::profile::{AccessMode, GuiMode, OverlayPlan, Profile};
use crate::registry::{self, SessionRecord};
use crate::statefile::{StateFile, STATE_DIR};
use crate::x11;

/// Directory under the state dir holding per-session shell history files.
pub const HISTORY_DIR: &str = "history";

/// Env layer variable naming the workbench checkout inside the container.
pub const WORKBENCH_PATH_VAR: &str = "DOCKER_WORKBENCH_PATH";

pub struct StartOptions {
    pub gui: GuiMode,
    pub ros: bool,
    pub remote: bool,
    pub rebuild: bool,
    pub suffix: Option<String>,
}

/// What `start` actually did. `warnings` holds every best-effort step that
/// failed without aborting the bring-up.
pub struct StartReport {
    pub session_id: String,
    pub nickname: String,
    pub profile: Profile,
    pub container_name: String,
    pub gui: GuiMode,
    pub access: AccessMode,
    pub warnings: Vec<String>,
}

pub struct StopReport {
    pub container_name: String,
    pub compose_down_ok: bool,
    pub forced_removal: bool,
    pub sidecar_removed: bool,
    pub credential_removed: bool,
    pub warnings: Vec<String>,
}

pub struct CopyReport {
    /// Container path and its host destination, in copy order.
    pub entries: Vec<(String, PathBuf)>,
    pub warnings: Vec<String>,
}

/// Bring a new session up.
#[cfg_attr(
    feature = "trace",
    instrument(
        level = "info",
        skip(docker, context_dir, opts),
        fields(gui = %opts.gui.as_label(), ros = opts.ros, remote = opts.remote)
    )
)]
pub fn start(docker: &Docker, context_dir: &Path, opts: &StartOptions) -> Result<StartReport> {
    let mut warnings: Vec<String> = Vec::new();

    // One local GUI at a time. Checked against a fresh snapshot before any
    // side effect; two racing starts can still slip through (documented
    // limitation, no cross-process lock).
    if !opts.remote && opts.gui != GuiMode::None {
        let running = registry::list_sessions(docker);
        if let Some(existing) = registry::local_gui_blocker(&running) {
            let label = if existing.nickname.is_empty() {
                "(no name)"
            } else {
                existing.nickname.as_str()
            };
            return Err(SessionError::Conflict(format!(
                "a local GUI session is already running: {label} ({}); stop it before starting another",
                existing.name
            ))
            .into());
        }
    }

    let session_id = ids::new_session_id();
    let nickname = ids::new_nickname();
    let access = AccessMode::from_remote_flag(opts.remote);

    // Resolve the display credential before planning: the x11 overlay is
    // attached only when a cookie actually exists for the container to mount.
    let display = env::var("DISPLAY").ok().filter(|d| !d.is_empty());
    let x11_vars = if opts.gui == GuiMode::X11 {
        match display.as_deref() {
            None => {
                warnings.push(
                    "DISPLAY is not set; starting without X11 forwarding".to_string(),
                );
                None
            }
            Some(d) => match acquire_credential(context_dir, &session_id, d) {
                Ok(vars) => Some(vars),
                Err(err) => {
                    warnings.push(format!("X11 forwarding setup failed: {err:#}"));
                    None
                }
            },
        }
    } else {
        None
    };

    let plan = OverlayPlan::for_start(
        context_dir,
        opts.gui,
        opts.ros,
        opts.remote,
        x11_vars.is_some(),
    );
    let profile = plan.profile;
    let container_name = profile.container_name(opts.suffix.as_deref());

    ensure_history_file(context_dir, &session_id)?;

    let layered = envfile::load_layers(&plan.env_files)?;
    let mut ctx = ComposeContext::new(context_dir, plan).with_project(&session_id);
    ctx.extend_vars(layered);
    ctx.insert_var("SESSION_ID", &session_id);
    ctx.insert_var("SESSION_NICKNAME", &nickname);
    ctx.insert_var("SESSION_PROFILE", profile.as_str());
    ctx.insert_var("SESSION_GUI", opts.gui.as_label());
    ctx.insert_var("SESSION_ACCESS", access.as_label());
    ctx.insert_var("CONTAINER_NAME", &container_name);
    if let Some(vars) = x11_vars {
        ctx.extend_vars(vars);
    }

    // Pre-build is an optimization only; `up` builds missing images anyway.
    if opts.rebuild {
        match compose::build_base(docker, context_dir, &ctx.vars) {
            Ok(status) if status.success() => {}
            Ok(_) => warnings.push(
                "base image pre-build failed; bring-up will build on demand".to_string(),
            ),
            Err(err) => warnings.push(format!("base image pre-build did not run: {err}")),
        }
    }

    // "Invoked" is success here, not "healthy": a non-zero exit becomes a
    // warning the caller prints, never an abort.
    match ctx.up(docker) {
        Ok(status) if status.success() => {}
        Ok(status) => warnings.push(format!(
            "engine bring-up reported {status}; the session may not be healthy"
        )),
        Err(err) => return Err(err).context("failed to invoke compose up"),
    }

    Ok(StartReport {
        session_id,
        nickname,
        profile,
        container_name,
        gui: opts.gui,
        access,
        warnings,
    })
}

/// Attach an interactive shell to a running session. Returns the shell's
/// exit status so the caller can propagate it.
#[cfg_attr(
    feature = "trace",
    instrument(level = "info", skip(docker, context_dir, record), fields(container = %record.name))
)]
pub fn enter(docker: &Docker, context_dir: &Path, record: &SessionRecord) -> Result<ExitStatus> {
    if !docker.is_container_running(&record.name) {
        return Err(SessionError::NotRunning(format!(
            "session '{}' is not running",
            record.name
        ))
        .into());
    }

    // The cookie goes stale when the host session restarts; refresh failures
    // are warned about but never block the shell.
    if record.gui.eq_ignore_ascii_case("x11") {
        match env::var("DISPLAY").ok().filter(|d| !d.is_empty()) {
            None => log_warn_stderr(
                color_enabled_stderr(),
                "DISPLAY is not set; skipped X11 cookie refresh",
            ),
            Some(display) => {
                if let Err(err) = refresh_credential(context_dir, &record.session_id, &display) {
                    log_warn_stderr(
                        color_enabled_stderr(),
                        &format!("X11 cookie refresh failed: {err:#}"),
                    );
                }
            }
        }
    }

    let mut args = vec![
        "exec".to_string(),
        "--interactive".to_string(),
        "--tty".to_string(),
    ];
    if let Ok(display) = env::var("DISPLAY") {
        if !display.is_empty() {
            args.push("-e".to_string());
            args.push(format!("DISPLAY={display}"));
        }
    }
    args.push(record.name.clone());
    args.push("bash".to_string());

    docker
        .run_inherit(&args)
        .with_context(|| format!("failed to attach to {}", record.name))
}

/// Tear a session down: compose down, force-remove fallback, sidecar and
/// credential garbage collection.
#[cfg_attr(
    feature = "trace",
    instrument(level = "info", skip(docker, context_dir, record), fields(container = %record.name))
)]
pub fn stop(docker: &Docker, context_dir: &Path, record: &SessionRecord) -> Result<StopReport> {
    if !docker.is_container_running(&record.name) {
        return Err(SessionError::NotRunning(format!(
            "session '{}' is not running",
            record.name
        ))
        .into());
    }
    let mut warnings: Vec<String> = Vec::new();

    // The stored profile is authoritative for teardown; current CLI flags
    // play no part in overlay selection.
    let plan = OverlayPlan::for_stored_profile(context_dir, &record.profile);
    let layered = envfile::load_layers(&plan.env_files)?;
    let mut ctx = ComposeContext::new(context_dir, plan);
    if !record.session_id.is_empty() {
        ctx = ctx.with_project(&record.session_id);
    }
    ctx.extend_vars(layered);
    ctx.insert_var("SESSION_ID", &record.session_id);
    ctx.insert_var("SESSION_NICKNAME", &record.nickname);
    ctx.insert_var("SESSION_PROFILE", &record.profile);
    ctx.insert_var("SESSION_GUI", &record.gui);
    ctx.insert_var("SESSION_ACCESS", &record.access);
    ctx.insert_var("CONTAINER_NAME", &record.name);

    let compose_down_ok = match ctx.down(docker) {
        Ok(status) if status.success() => true,
        Ok(status) => {
            warnings.push(format!("compose down reported {status}"));
            false
        }
        Err(err) => {
            warnings.push(format!("compose down did not run: {err}"));
            false
        }
    };

    // Compose down is best-effort; make sure the container is actually gone.
    let mut forced_removal = false;
    if docker.is_container_running(&record.name) {
        forced_removal = true;
        let args = vec![
            "rm".to_string(),
            "-f".to_string(),
            record.name.clone(),
        ];
        match docker.run_quiet(&args) {
            Ok(status) if status.success() => {}
            _ => warnings.push(format!("failed to force-remove {}", record.name)),
        }
    }

    // Existence is checked first so a double-stop stays quiet.
    let mut sidecar_removed = false;
    if !record.session_id.is_empty() {
        let sidecar = format!("tunnel-{}", record.session_id);
        if container_exists(docker, &sidecar) {
            let args = vec!["rm".to_string(), "-f".to_string(), sidecar.clone()];
            match docker.run_quiet(&args) {
                Ok(status) if status.success() => sidecar_removed = true,
                _ => warnings.push(format!("failed to remove sidecar {sidecar}")),
            }
        }
    }

    let mut credential_removed = false;
    if record.gui.eq_ignore_ascii_case("x11") {
        match cleanup_credential(context_dir, &record.session_id) {
            Ok(removed) => credential_removed = removed,
            Err(err) => warnings.push(format!("X11 cleanup failed: {err:#}")),
        }
    }

    Ok(StopReport {
        container_name: record.name.clone(),
        compose_down_ok,
        forced_removal,
        sidecar_removed,
        credential_removed,
        warnings,
    })
}

/// Copy workbench artifacts out of a running session into
/// `<output>/artifacts/`. Stale destinations are removed first so the copy
/// never merges runs.
#[cfg_attr(
    feature = "trace",
    instrument(
        level = "info",
        skip(docker, context_dir, record, output_dir),
        fields(container = %record.name)
    )
)]
pub fn copy_artifacts(
    docker: &Docker,
    context_dir: &Path,
    record: &SessionRecord,
    output_dir: Option<&Path>,
) -> Result<CopyReport> {
    if !docker.is_container_running(&record.name) {
        return Err(SessionError::NotRunning(format!(
            "session '{}' is not running",
            record.name
        ))
        .into());
    }
    let mut warnings: Vec<String> = Vec::new();

    let plan = OverlayPlan::for_stored_profile(context_dir, &record.profile);
    let layered = envfile::load_layers(&plan.env_files)?;
    let workbench = layered.get(WORKBENCH_PATH_VAR).cloned().ok_or_else(|| {
        SessionError::InvalidArgument(format!(
            "{WORKBENCH_PATH_VAR} is not set in the env layers for profile {}",
            record.profile
        ))
    })?;

    let out_root = output_dir.unwrap_or(context_dir).join("artifacts");
    fs::create_dir_all(&out_root)
        .with_context(|| format!("failed to create {}", out_root.display()))?;

    let mapping = [
        ("logs", "logs"),
        ("docs/_build", "docs"),
        ("data_storage", "data_storage"),
    ];
    let mut entries = Vec::new();
    for (container_sub, host_sub) in mapping {
        let container_path = format!("{}/{container_sub}", workbench.trim_end_matches('/'));
        let host_path = out_root.join(host_sub);
        let _ = fs::remove_dir_all(&host_path);
        let args = vec![
            "cp".to_string(),
            format!("{}:{container_path}/", record.name),
            host_path.display().to_string(),
        ];
        match docker.run_quiet(&args) {
            Ok(status) if status.success() => {}
            _ => warnings.push(format!("copy of {container_path} failed")),
        }
        entries.push((container_path, host_path));
    }

    Ok(CopyReport { entries, warnings })
}

/// Dump the merged compose configuration for a flag selection, the same
/// argv shape `start` would use. No credentials are created and no project
/// is named; unresolvable variables interpolate empty in the output.
pub fn config_dump(
    docker: &Docker,
    context_dir: &Path,
    gui: GuiMode,
    ros: bool,
    remote: bool,
    output: Option<&Path>,
) -> Result<()> {
    let display_available = env::var("DISPLAY").map(|d| !d.is_empty()).unwrap_or(false);
    let plan = OverlayPlan::for_start(context_dir, gui, ros, remote, display_available);
    let ctx = ComposeContext::new(context_dir, plan);
    let status = ctx
        .config(docker, output)
        .context("failed to invoke compose config")?;
    if !status.success() {
        warn_status("compose config", status);
    }
    Ok(())
}

/// Per-session bash history file on the host, mounted into the container.
/// Created once with the setgid bit so group writes keep the group.
pub fn ensure_history_file(context_dir: &Path, session_id: &str) -> Result<PathBuf> {
    let dir = context_dir.join(STATE_DIR).join(HISTORY_DIR);
    fs::create_dir_all(&dir).with_context(|| format!("failed to create {}", dir.display()))?;
    let path = dir.join(format!("bash_history-{session_id}"));
    if !path.exists() {
        fs::File::create(&path)
            .with_context(|| format!("failed to create {}", path.display()))?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(&path, fs::Permissions::from_mode(0o2644))
                .with_context(|| format!("failed to chmod {}", path.display()))?;
        }
    }
    Ok(path)
}

fn acquire_credential(
    context_dir: &Path,
    session_id: &str,
    display: &str,
) -> Result<BTreeMap<String, String>> {
    let mut store = StateFile::open_in(context_dir)?;
    let namespace = x11::namespace_for(session_id);
    let credential = x11::ensure(&mut store, &namespace, display)?;
    Ok(credential.compose_vars(display))
}

fn refresh_credential(context_dir: &Path, session_id: &str, display: &str) -> Result<()> {
    let mut store = StateFile::open_in(context_dir)?;
    let namespace = x11::namespace_for(session_id);
    x11::refresh(&mut store, &namespace, display)?;
    Ok(())
}

fn cleanup_credential(context_dir: &Path, session_id: &str) -> Result<bool> {
    let mut store = StateFile::open_in(context_dir)?;
    let namespace = x11::namespace_for(session_id);
    x11::cleanup(&mut store, &namespace)
}

/// Any container (running or exited) with exactly this name.
fn container_exists(docker: &Docker, name: &str) -> bool {
    let args = vec![
        "ps".to_string(),
        "-a".to_string(),
        "--filter".to_string(),
        format!("name=^{name}$"),
        "--format".to_string(),
        "{{.Names}}".to_string(),
    ];
    match docker.capture_stdout(&args) {
        Some(out) => out.lines().any(|l| l.trim() == name),
        None => false,
    }
}

fn warn_status(what: &str, status: ExitStatus) {
    log_warn_stderr(
        color_enabled_stderr(),
        &format!("{what} reported {status}"),
    );
}
