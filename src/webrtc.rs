//! Connection instructions and quick port diagnostics for WebRTC sessions.

use std::collections::BTreeMap;
use std::path::Path;
use std::process::Command;

use crate::color::{
    color_enabled_stdout, paint, STYLE_BAD, STYLE_HEADING, STYLE_OK, STYLE_WARN,
};
use crate::docker::Docker;
use crate::envfile;
use crate::profile::OverlayPlan;
use crate::registry::SessionRecord;

pub const DEFAULT_HTTP_PORT: &str = "8211";
pub const DEFAULT_TCP_PORT: &str = "49100";
pub const DEFAULT_UDP_PORT: &str = "47998";

/// Streaming ports, read from the resolved env layers with defaults.
pub struct WebrtcPorts {
    pub http: String,
    pub tcp: String,
    pub udp: String,
}

impl WebrtcPorts {
    pub fn from_vars(vars: &BTreeMap<String, String>) -> WebrtcPorts {
        let pick = |key: &str, default: &str| {
            vars.get(key)
                .filter(|v| !v.is_empty())
                .cloned()
                .unwrap_or_else(|| default.to_string())
        };
        WebrtcPorts {
            http: pick("WEBRTC_HTTP_PORT", DEFAULT_HTTP_PORT),
            tcp: pick("WEBRTC_TCP_PORT", DEFAULT_TCP_PORT),
            udp: pick("WEBRTC_UDP_PORT", DEFAULT_UDP_PORT),
        }
    }
}

/// Ports for an existing session, resolved from its stored profile's env
/// layers. Unreadable layers fall back to the defaults.
pub fn ports_for_profile(context_dir: &Path, profile: &str) -> WebrtcPorts {
    let plan = OverlayPlan::for_stored_profile(context_dir, profile);
    match envfile::load_layers(&plan.env_files) {
        Ok(vars) => WebrtcPorts::from_vars(&vars),
        Err(_) => WebrtcPorts::from_vars(&BTreeMap::new()),
    }
}

/// Print how to reach a WebRTC session from the streaming client.
///
/// Remote sessions ask the tunnel sidecar for its 100.x address; if the
/// sidecar is not up yet a placeholder is shown with the command to run
/// later. Local sessions show a placeholder only, the host address is up
/// to the user.
pub fn print_instructions(docker: &Docker, record: &SessionRecord, ports: &WebrtcPorts) {
    let use_out = color_enabled_stdout();
    let access = if record.access.eq_ignore_ascii_case("remote")
        || record.profile.ends_with("-remote")
    {
        "remote"
    } else {
        "local"
    };
    let (address, address_hint) = if access == "remote" {
        match sidecar_tunnel_addr(docker, &record.session_id) {
            Some(addr) => (addr, "tunnel 100.x address"),
            None => ("100.x.x.x".to_string(), "tunnel 100.x address"),
        }
    } else {
        ("<host LAN address>".to_string(), "host LAN address")
    };
    let nick = if record.nickname.is_empty() {
        "(no name)"
    } else {
        record.nickname.as_str()
    };

    println!();
    println!(
        "{}",
        paint(use_out, STYLE_HEADING, "How to connect to this WebRTC session")
    );
    println!("  Session: {nick}  ({})", record.name);
    println!("  Mode: webrtc-{access}");
    println!("  Address: {address}  ({address_hint})");
    println!("  Ports: http {}, tcp {}, udp {}", ports.http, ports.tcp, ports.udp);
    println!("  Point the streaming client at the address above, then connect.");
    if access == "remote" {
        println!(
            "  Note: if the address still shows 100.x.x.x, the sidecar is not healthy yet;"
        );
        println!(
            "        run 'docker exec tunnel-{} tunnel-ip -4' to reveal the exact address.",
            record.session_id
        );
    }
    println!();
}

/// Best-effort port checks for a local WebRTC session: each port is probed
/// on the host and inside the container, with a hint when something is not
/// listening.
pub fn diagnose_local(docker: &Docker, record: &SessionRecord, ports: &WebrtcPorts) {
    let use_out = color_enabled_stdout();
    let verdict = |ok: bool| {
        if ok {
            paint(use_out, STYLE_OK, "OK")
        } else {
            paint(use_out, STYLE_BAD, "NO")
        }
    };

    println!("Quick WebRTC checks (local):");
    let host_http = host_port_listening(&ports.http, Proto::Tcp);
    let host_tcp = host_port_listening(&ports.tcp, Proto::Tcp);
    let host_udp = host_port_listening(&ports.udp, Proto::Udp);
    println!("  Host listening http {}: {}", ports.http, verdict(host_http));
    println!("  Host listening tcp  {}: {}", ports.tcp, verdict(host_tcp));
    println!("  Host listening udp  {}: {}", ports.udp, verdict(host_udp));

    let ct_http = container_port_listening(docker, &record.name, &ports.http, Proto::Tcp);
    let ct_tcp = container_port_listening(docker, &record.name, &ports.tcp, Proto::Tcp);
    let ct_udp = container_port_listening(docker, &record.name, &ports.udp, Proto::Udp);
    println!("  Container listening http {}: {}", ports.http, verdict(ct_http));
    println!("  Container listening tcp  {}: {}", ports.tcp, verdict(ct_tcp));
    println!("  Container listening udp  {}: {}", ports.udp, verdict(ct_udp));

    let hint = |text: &str| {
        println!("  {} {text}", paint(use_out, STYLE_WARN, "Hint:"));
    };
    if !(host_http && ct_http) {
        hint("if http is not listening, check that streaming is enabled in the session env and the port is free.");
    }
    if !(host_tcp && ct_tcp) {
        hint("if tcp is not listening, check for port conflicts and that the in-container streamer came up.");
    }
    if !(host_udp && ct_udp) {
        hint("if udp is not listening, verify firewall rules allow udp on the chosen port.");
    }
}

#[derive(Clone, Copy)]
enum Proto {
    Tcp,
    Udp,
}

impl Proto {
    fn ss_flag(self) -> &'static str {
        match self {
            Proto::Tcp => "-lnt",
            Proto::Udp => "-lun",
        }
    }
}

fn host_port_listening(port: &str, proto: Proto) -> bool {
    let out = match Command::new("ss").arg(proto.ss_flag()).output() {
        Ok(out) if out.status.success() => out,
        _ => return false,
    };
    output_lists_port(&String::from_utf8_lossy(&out.stdout), port)
}

fn container_port_listening(docker: &Docker, container: &str, port: &str, proto: Proto) -> bool {
    let args = vec![
        "exec".to_string(),
        container.to_string(),
        "bash".to_string(),
        "-lc".to_string(),
        format!("ss {} | cat", proto.ss_flag()),
    ];
    match docker.capture_stdout(&args) {
        Some(out) => output_lists_port(&out, port),
        None => false,
    }
}

/// True when an `ss` listing shows a socket bound on `port`.
fn output_lists_port(out: &str, port: &str) -> bool {
    let mid = format!(":{port} ");
    let end = format!(":{port}");
    out.contains(&mid) || out.lines().any(|l| l.trim_end().ends_with(&end))
}

/// 100.x IPv4 of the session's tunnel sidecar, if the sidecar is up.
fn sidecar_tunnel_addr(docker: &Docker, session_id: &str) -> Option<String> {
    let args = vec![
        "exec".to_string(),
        format!("tunnel-{session_id}"),
        "tunnel-ip".to_string(),
        "-4".to_string(),
    ];
    let out = docker.capture_stdout(&args)?;
    first_tunnel_addr(&out)
}

fn first_tunnel_addr(out: &str) -> Option<String> {
    out.lines()
        .map(str::trim)
        .find(|l| l.starts_with("100."))
        .map(str::to_string)
}
