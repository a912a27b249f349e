//! Subcommand handlers: resolve missing decisions (interactively on a TTY),
//! drive the lifecycle controller and map failures to exit codes.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;

use crate::cli::{AccessFilter, Cli, GuiFilter, SessionCmd};
use crate::color::{
    color_enabled_stderr, color_enabled_stdout, log_error_stderr, log_info_stderr,
    log_warn_stderr, paint, STYLE_ACCENT, STYLE_DIM,
};
use crate::docker::Docker;
use crate::errors::{exit_code_for_io_error, exit_code_for_session_error, SessionError};
use crate::lifecycle::{self, StartOptions};
use crate::menu::{self, MenuItem};
use crate::profile::GuiMode;
use crate::registry::{self, SessionRecord};
use crate::remote;
use crate::webrtc;
use crate::{doctor, find_context_dir};

/// Map an orchestration error onto the process exit code. Typed session
/// errors keep their contract (127 for missing tools); everything else is 1.
pub fn exit_code_for_error(err: &anyhow::Error) -> u8 {
    if let Some(session) = err.downcast_ref::<SessionError>() {
        return exit_code_for_session_error(session);
    }
    if let Some(io) = err.downcast_ref::<std::io::Error>() {
        return exit_code_for_io_error(io);
    }
    1
}

fn fail(err: &anyhow::Error) -> ExitCode {
    let use_err = color_enabled_stderr();
    log_error_stderr(use_err, &format!("simdock: {err:#}"));
    ExitCode::from(exit_code_for_error(err))
}

fn stdin_is_tty() -> bool {
    atty::is(atty::Stream::Stdin)
}

/// Entry point for the parsed CLI. A missing subcommand opens the action
/// menu on a TTY.
pub fn run(cli: &Cli) -> ExitCode {
    let command = match &cli.command {
        Some(command) => command.clone(),
        None => match choose_action() {
            Ok(command) => command,
            Err(err) => return fail(&err),
        },
    };

    match command {
        SessionCmd::Start {
            gui,
            ros,
            no_ros,
            remote,
            rebuild,
            suffix,
        } => run_start(cli, gui, ros, no_ros, remote, rebuild, suffix),
        SessionCmd::Enter { name, id } => run_enter(cli, name, id),
        SessionCmd::Stop { name, id, yes } => run_stop(cli, name, id, yes),
        SessionCmd::List {
            gui,
            access,
            nickname,
            json,
        } => run_list(cli, gui, access, &nickname, json),
        SessionCmd::Copy { name, id, output } => run_copy(cli, name, id, output),
        SessionCmd::Config {
            gui,
            ros,
            no_ros,
            remote,
            output,
        } => run_config(cli, gui, ros, no_ros, remote, output),
        SessionCmd::Doctor => run_doctor_command(cli),
    }
}

fn choose_action() -> Result<SessionCmd> {
    let items = vec![
        MenuItem::new(
            "Start new session",
            SessionCmd::Start {
                gui: None,
                ros: false,
                no_ros: false,
                remote: false,
                rebuild: false,
                suffix: None,
            },
        ),
        MenuItem::new(
            "Enter a session",
            SessionCmd::Enter {
                name: None,
                id: None,
            },
        ),
        MenuItem::new(
            "Stop a session",
            SessionCmd::Stop {
                name: None,
                id: None,
                yes: false,
            },
        ),
        MenuItem::new(
            "List sessions",
            SessionCmd::List {
                gui: GuiFilter::All,
                access: AccessFilter::All,
                nickname: String::new(),
                json: false,
            },
        ),
    ];
    menu::select("What do you want to do?", items, 0)
}

pub fn run_start(
    cli: &Cli,
    gui: Option<GuiMode>,
    ros: bool,
    no_ros: bool,
    remote: bool,
    rebuild: bool,
    suffix: Option<String>,
) -> ExitCode {
    match start_flow(cli, gui, ros, no_ros, remote, rebuild, suffix) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn start_flow(
    cli: &Cli,
    gui: Option<GuiMode>,
    ros: bool,
    no_ros: bool,
    remote: bool,
    rebuild: bool,
    suffix: Option<String>,
) -> Result<ExitCode> {
    let context_dir = find_context_dir(cli.context_dir.as_deref())?;
    let docker = Docker::locate(cli.verbose)?;
    let use_err = color_enabled_stderr();

    // SSH sessions are remote even without the flag.
    let remote = remote || remote::is_remote_session();

    let gui = match gui {
        Some(gui) => gui,
        None if stdin_is_tty() => ask_gui_mode(remote)?,
        None => {
            return Err(SessionError::InvalidArgument(
                "no interactive terminal; pass --gui webrtc|x11|none".to_string(),
            )
            .into())
        }
    };
    let ros = if ros {
        true
    } else if no_ros {
        false
    } else if stdin_is_tty() {
        ask_ros_support()?
    } else {
        false
    };
    let rebuild = if rebuild {
        true
    } else if stdin_is_tty() {
        ask_rebuild()?
    } else {
        false
    };

    let opts = StartOptions {
        gui,
        ros,
        remote,
        rebuild,
        suffix,
    };
    let report = lifecycle::start(&docker, &context_dir, &opts)?;

    for warning in &report.warnings {
        log_warn_stderr(use_err, &format!("simdock: {warning}"));
    }
    log_info_stderr(
        use_err,
        &format!(
            "simdock: started session {} as '{}' with profile '{}'",
            report.session_id,
            report.nickname,
            report.profile.as_str()
        ),
    );

    if report.gui == GuiMode::Webrtc {
        let record = SessionRecord {
            id: String::new(),
            name: report.container_name.clone(),
            session_id: report.session_id.clone(),
            nickname: report.nickname.clone(),
            profile: report.profile.as_str().to_string(),
            gui: "webrtc".to_string(),
            access: report.access.as_label().to_string(),
        };
        print_webrtc_details(&docker, &context_dir, &record);
    }
    Ok(ExitCode::from(0))
}

pub fn run_enter(cli: &Cli, name: Option<String>, id: Option<String>) -> ExitCode {
    match enter_flow(cli, name, id) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn enter_flow(cli: &Cli, name: Option<String>, id: Option<String>) -> Result<ExitCode> {
    let context_dir = find_context_dir(cli.context_dir.as_deref())?;
    let docker = Docker::locate(cli.verbose)?;

    let record = match select_session(&docker, name.as_deref(), id.as_deref())? {
        Some(record) => record,
        None => return Ok(ExitCode::from(0)),
    };

    if is_webrtc_session(&record) {
        print_webrtc_details(&docker, &context_dir, &record);
    }

    let status = lifecycle::enter(&docker, &context_dir, &record)?;
    Ok(ExitCode::from(status.code().unwrap_or(1) as u8))
}

pub fn run_stop(cli: &Cli, name: Option<String>, id: Option<String>, yes: bool) -> ExitCode {
    match stop_flow(cli, name, id, yes) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn stop_flow(cli: &Cli, name: Option<String>, id: Option<String>, yes: bool) -> Result<ExitCode> {
    let context_dir = find_context_dir(cli.context_dir.as_deref())?;
    let docker = Docker::locate(cli.verbose)?;
    let use_err = color_enabled_stderr();

    let record = match select_session(&docker, name.as_deref(), id.as_deref())? {
        Some(record) => record,
        None => return Ok(ExitCode::from(0)),
    };

    // Without --yes, confirm on a TTY; scripted callers proceed unprompted.
    if !yes && stdin_is_tty() {
        let label = if record.nickname.is_empty() {
            "(no name)"
        } else {
            record.nickname.as_str()
        };
        let question = format!("Stop session '{label}' ({})?", record.name);
        if !menu::confirm(&question, false)? {
            println!("Cancelled.");
            return Ok(ExitCode::from(0));
        }
    }

    let report = lifecycle::stop(&docker, &context_dir, &record)?;
    for warning in &report.warnings {
        log_warn_stderr(use_err, &format!("simdock: {warning}"));
    }
    if cli.verbose {
        if report.forced_removal {
            log_info_stderr(use_err, "simdock: compose down left the container running; force-removed it");
        }
        if report.sidecar_removed {
            log_info_stderr(use_err, "simdock: removed tunnel sidecar");
        }
        if report.credential_removed {
            log_info_stderr(use_err, "simdock: removed X11 credential");
        }
    }
    log_info_stderr(
        use_err,
        &format!("simdock: stopped session {}", report.container_name),
    );
    Ok(ExitCode::from(0))
}

pub fn run_list(
    cli: &Cli,
    gui: GuiFilter,
    access: AccessFilter,
    nickname: &str,
    json: bool,
) -> ExitCode {
    match list_flow(cli, gui, access, nickname, json) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn list_flow(
    cli: &Cli,
    gui: GuiFilter,
    access: AccessFilter,
    nickname: &str,
    json: bool,
) -> Result<ExitCode> {
    let docker = Docker::locate(cli.verbose)?;
    let all = registry::list_sessions(&docker);
    let records = registry::filter_records(&all, gui.as_str(), access.as_str(), nickname);

    if json {
        println!("{}", serde_json::to_string_pretty(&records)?);
        return Ok(ExitCode::from(0));
    }

    if all.is_empty() {
        println!("No running sessions found.");
        return Ok(ExitCode::from(0));
    }
    if records.is_empty() {
        println!("No sessions match your filters.");
        return Ok(ExitCode::from(0));
    }

    let use_out = color_enabled_stdout();
    for record in &records {
        let label = if record.nickname.is_empty() {
            "(no name)"
        } else {
            record.nickname.as_str()
        };
        println!(
            "• {label}  {}  {}",
            paint(use_out, STYLE_DIM, &record.name),
            paint(use_out, STYLE_ACCENT, &session_badge(record)),
        );
    }
    Ok(ExitCode::from(0))
}

pub fn run_copy(
    cli: &Cli,
    name: Option<String>,
    id: Option<String>,
    output: Option<PathBuf>,
) -> ExitCode {
    match copy_flow(cli, name, id, output) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn copy_flow(
    cli: &Cli,
    name: Option<String>,
    id: Option<String>,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let context_dir = find_context_dir(cli.context_dir.as_deref())?;
    let docker = Docker::locate(cli.verbose)?;
    let use_err = color_enabled_stderr();

    let record = match select_session(&docker, name.as_deref(), id.as_deref())? {
        Some(record) => record,
        None => return Ok(ExitCode::from(0)),
    };

    log_info_stderr(
        use_err,
        &format!("simdock: copying artifacts from '{}'", record.name),
    );
    let report = lifecycle::copy_artifacts(&docker, &context_dir, &record, output.as_deref())?;
    for (container_path, host_path) in &report.entries {
        println!("  {container_path} -> {}", host_path.display());
    }
    for warning in &report.warnings {
        log_warn_stderr(use_err, &format!("simdock: {warning}"));
    }
    log_info_stderr(use_err, "simdock: finished copying artifacts");
    Ok(ExitCode::from(0))
}

pub fn run_config(
    cli: &Cli,
    gui: Option<GuiMode>,
    ros: bool,
    no_ros: bool,
    remote: bool,
    output: Option<PathBuf>,
) -> ExitCode {
    match config_flow(cli, gui, ros, no_ros, remote, output) {
        Ok(code) => code,
        Err(err) => fail(&err),
    }
}

fn config_flow(
    cli: &Cli,
    gui: Option<GuiMode>,
    ros: bool,
    no_ros: bool,
    remote: bool,
    output: Option<PathBuf>,
) -> Result<ExitCode> {
    let context_dir = find_context_dir(cli.context_dir.as_deref())?;
    let docker = Docker::locate(cli.verbose)?;
    // A debugging dump: unset decisions take their defaults, no menus.
    let gui = gui.unwrap_or(GuiMode::None);
    let ros = ros && !no_ros;
    lifecycle::config_dump(&docker, &context_dir, gui, ros, remote, output.as_deref())?;
    Ok(ExitCode::from(0))
}

pub fn run_doctor_command(cli: &Cli) -> ExitCode {
    let context_dir = find_context_dir(cli.context_dir.as_deref()).ok();
    doctor::run_doctor(context_dir.as_deref(), cli.verbose);
    ExitCode::from(0)
}

/// Resolve the target session: explicit name/id first, then the interactive
/// chooser. `None` means "nothing to act on" and has already been reported.
fn select_session(
    docker: &Docker,
    name: Option<&str>,
    id: Option<&str>,
) -> Result<Option<SessionRecord>> {
    let records = registry::list_sessions(docker);
    if name.is_some() || id.is_some() {
        if let Some(found) = registry::find(&records, name, id) {
            return Ok(Some(found.clone()));
        }
    }
    choose_session(&records)
}

fn choose_session(records: &[SessionRecord]) -> Result<Option<SessionRecord>> {
    if records.is_empty() {
        println!("No running sessions found.");
        return Ok(None);
    }
    let items = records
        .iter()
        .map(|record| {
            let label = if record.nickname.is_empty() {
                "(no name)".to_string()
            } else {
                record.nickname.clone()
            };
            MenuItem::new(&label, record.clone())
                .describe(&format!("{}    {}", record.name, session_badge(record)))
        })
        .collect();
    Ok(Some(menu::select("Select a session", items, 0)?))
}

fn session_badge(record: &SessionRecord) -> String {
    if record.gui.is_empty() {
        record.profile.clone()
    } else {
        format!("{}|{}", record.gui, record.access)
    }
}

fn is_webrtc_session(record: &SessionRecord) -> bool {
    GuiMode::parse_label(&record.gui) == Some(GuiMode::Webrtc) || record.profile.contains("webrtc")
}

fn print_webrtc_details(docker: &Docker, context_dir: &std::path::Path, record: &SessionRecord) {
    let ports = webrtc::ports_for_profile(context_dir, &record.profile);
    webrtc::print_instructions(docker, record, &ports);
    if !record.access.eq_ignore_ascii_case("remote") {
        webrtc::diagnose_local(docker, record, &ports);
    }
}

fn ask_gui_mode(remote: bool) -> Result<GuiMode> {
    let display = std::env::var("DISPLAY").ok().filter(|d| !d.is_empty());
    let mut x11 = MenuItem::new("X11 Forwarding", GuiMode::X11)
        .describe("Use X11 display forwarding")
        .recommended(!remote);
    x11 = match &display {
        None => x11.warning("DISPLAY is not set; X11 may not work in this session."),
        Some(d) => x11.info(&format!("Using DISPLAY={d}")),
    };
    let items = vec![
        MenuItem::new("WebRTC", GuiMode::Webrtc)
            .describe("Use WebRTC streaming")
            .recommended(remote)
            .info("Local: uses the host LAN address; remote: uses the tunnel 100.x address"),
        x11,
        MenuItem::new("None", GuiMode::None).describe("Headless"),
    ];
    menu::select("Select GUI mode", items, 2)
}

fn ask_ros_support() -> Result<bool> {
    let items = vec![
        MenuItem::new("Yes", true).describe("Enable ROS 2 Humble"),
        MenuItem::new("No", false).describe("Disable ROS"),
    ];
    menu::select("Do you want ROS support?", items, 1)
}

fn ask_rebuild() -> Result<bool> {
    let items = vec![
        MenuItem::new("No", false)
            .describe("Use cache, build only if missing")
            .recommended(true),
        MenuItem::new("Yes", true).describe("Rebuild base image before starting"),
    ];
    menu::select("Force rebuild images?", items, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(gui: &str, profile: &str) -> SessionRecord {
        SessionRecord {
            id: "abc".to_string(),
            name: "simdock-base".to_string(),
            session_id: "1-00001".to_string(),
            nickname: "brave otter".to_string(),
            profile: profile.to_string(),
            gui: gui.to_string(),
            access: "local".to_string(),
        }
    }

    #[test]
    fn test_session_badge_prefers_labels() {
        assert_eq!(session_badge(&rec("webrtc", "webrtc-local")), "webrtc|local");
        assert_eq!(session_badge(&rec("", "ros2")), "ros2");
    }

    #[test]
    fn test_webrtc_detection_by_label_or_profile() {
        assert!(is_webrtc_session(&rec("webrtc", "base")));
        assert!(is_webrtc_session(&rec("", "ros2-webrtc-local")));
        assert!(!is_webrtc_session(&rec("x11", "ros2")));
    }

    #[test]
    fn test_exit_code_mapping_for_session_errors() {
        let err: anyhow::Error = SessionError::ToolMissing {
            tool: "docker".to_string(),
            remediation: "install it".to_string(),
        }
        .into();
        assert_eq!(exit_code_for_error(&err), 127);

        let err: anyhow::Error = SessionError::Conflict("busy".to_string()).into();
        assert_eq!(exit_code_for_error(&err), 1);

        let err = anyhow::anyhow!("opaque");
        assert_eq!(exit_code_for_error(&err), 1);
    }
}
