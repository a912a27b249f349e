//! Environment diagnostics: tool discovery, display, remote detection and
//! context layout, printed as a flat report. Always exits successfully;
//! doctor informs, it never enforces.

use std::env;
use std::path::Path;
use std::process::Command;

use crate::docker::{docker_path, xauth_path, Docker};
use crate::profile::{OverlayPlan, Profile};
use crate::remote;
use crate::statefile::{STATE_DIR, STATE_FILE};

pub fn run_doctor(context_dir: Option<&Path>, verbose: bool) {
    let use_color = atty::is(atty::Stream::Stderr);
    let value = |s: &str| -> String {
        if use_color {
            format!("\x1b[34;1m{s}\x1b[0m")
        } else {
            s.to_string()
        }
    };
    let presence = |exists: bool| -> String {
        let plain = if exists { "✅ found" } else { "❌ missing" };
        if use_color {
            if exists {
                format!("\x1b[32m{plain}\x1b[0m")
            } else {
                format!("\x1b[31m{plain}\x1b[0m")
            }
        } else {
            plain.to_string()
        }
    };

    eprintln!("simdock doctor");
    eprintln!();
    eprintln!("  version: v{}", env!("CARGO_PKG_VERSION"));
    eprintln!(
        "  built:   {} ({}, {})",
        env!("SIMDOCK_BUILD_DATE"),
        env!("SIMDOCK_BUILD_PROFILE"),
        env!("SIMDOCK_BUILD_TARGET")
    );
    eprintln!("  rustc:   {}", env!("SIMDOCK_BUILD_RUSTC"));
    eprintln!(
        "  host:    {} / {}",
        std::env::consts::OS,
        std::env::consts::ARCH
    );
    eprintln!();

    // Docker and its compose plugin
    match docker_path() {
        Ok(path) => {
            eprintln!("  docker command:  {}", value(&path.display().to_string()));
            if let Some(v) = tool_version(&path, &["--version"]) {
                // Typical: "Docker version 28.3.3, build 980b856816"
                let pretty = v.trim_start_matches("Docker version ").to_string();
                eprintln!("  docker version:  {}", value(&pretty));
            }
            match tool_version(&path, &["compose", "version"]) {
                Some(v) => {
                    let pretty = v.trim_start_matches("Docker Compose version ").to_string();
                    eprintln!("  compose plugin:  {}", value(&pretty));
                }
                None => {
                    eprintln!("  compose plugin:  (not available)");
                    if verbose {
                        eprintln!("    tip: install the docker compose plugin; every session operation goes through it.");
                    }
                }
            }
            let image = Profile::Base.image_name(None);
            let built = Docker::locate(false)
                .map(|d| d.image_exists(&image))
                .unwrap_or(false);
            if built {
                eprintln!("  base image:      {}", value(&image));
            } else {
                eprintln!("  base image:      (not built yet)");
                if verbose {
                    eprintln!("    tip: the first 'simdock start' builds it; --rebuild forces a fresh build.");
                }
            }
        }
        Err(_) => {
            eprintln!("  docker command:  (not found)");
            if verbose {
                eprintln!("    tip: install Docker Engine with the compose plugin and ensure 'docker' is on PATH.");
            }
        }
    }

    // X11 forwarding prerequisites
    match xauth_path() {
        Ok(path) => eprintln!("  xauth command:   {}", value(&path.display().to_string())),
        Err(_) => {
            eprintln!("  xauth command:   (not found)");
            if verbose {
                eprintln!("    tip: only needed for --gui x11; install it with: sudo apt install xauth");
            }
        }
    }
    match env::var("DISPLAY") {
        Ok(d) if !d.is_empty() => eprintln!("  display:         {}", value(&d)),
        _ => eprintln!("  display:         (not set)"),
    }
    eprintln!(
        "  remote session:  {}",
        value(if remote::is_remote_session() { "yes" } else { "no" })
    );
    eprintln!();

    // Context layout
    match context_dir {
        Some(dir) => {
            let compose_file = OverlayPlan::base_compose_file(dir);
            let state_file = dir.join(STATE_DIR).join(STATE_FILE);
            eprintln!(
                "  context dir:     {} {}",
                value(&dir.display().to_string()),
                presence(dir.is_dir())
            );
            eprintln!(
                "  compose file:    {} {}",
                value(&compose_file.display().to_string()),
                presence(compose_file.is_file())
            );
            eprintln!(
                "  state file:      {} {}",
                value(&state_file.display().to_string()),
                presence(state_file.is_file())
            );
        }
        None => {
            eprintln!("  context dir:     (not found)");
            if verbose {
                eprintln!("    tip: run inside a checkout containing compose/compose.yaml, or set SIMDOCK_CONTEXT or --context-dir.");
            }
        }
    }

    eprintln!();
    eprintln!("doctor: completed diagnostics.");
    eprintln!();
}

fn tool_version(path: &Path, args: &[&str]) -> Option<String> {
    let out = Command::new(path).args(args).output().ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&out.stdout).trim().to_string();
    if text.is_empty() {
        None
    } else {
        Some(text)
    }
}
