//! Best-effort detection of remote (SSH) invocations.
//!
//! Purely advisory: the result only picks better defaults for the GUI and
//! access prompts. Every probe failure means "not obviously remote".

use std::collections::HashSet;
use std::process::{Command, Stdio};

pub fn is_remote_session() -> bool {
    ssh_env_present() || parent_is_sshd() || who_shows_remote_host()
}

fn ssh_env_present() -> bool {
    ["SSH_CONNECTION", "SSH_CLIENT", "SSH_TTY"]
        .iter()
        .any(|k| std::env::var(k).map(|v| !v.is_empty()).unwrap_or(false))
}

/// Walk parent pids looking for an sshd ancestor. One `ps` call per step;
/// cycles and parse failures just end the walk.
fn parent_is_sshd() -> bool {
    let mut pid = std::process::id();
    let mut seen = HashSet::new();
    while pid != 0 && seen.insert(pid) {
        let Some((comm, ppid)) = query_parent(pid) else {
            break;
        };
        if comm.to_lowercase().starts_with("sshd") {
            return true;
        }
        pid = ppid;
    }
    false
}

fn query_parent(pid: u32) -> Option<(String, u32)> {
    let out = Command::new("ps")
        .args(["-o", "comm=,ppid=", "-p", &pid.to_string()])
        .output()
        .ok()?;
    if !out.status.success() {
        return None;
    }
    let text = String::from_utf8_lossy(&out.stdout);
    parse_ps_line(text.trim())
}

/// `ps -o comm=,ppid=` line, e.g. `"sshd  1234"`: command name first, parent
/// pid last; a non-numeric tail counts as pid 0 and ends the walk.
fn parse_ps_line(line: &str) -> Option<(String, u32)> {
    if line.is_empty() {
        return None;
    }
    let mut tokens = line.split_whitespace();
    let comm = tokens.next()?.to_string();
    let ppid = line
        .split_whitespace()
        .last()
        .and_then(|t| t.parse().ok())
        .unwrap_or(0);
    Some((comm, ppid))
}

/// `who -m` prints the originating host in parentheses for remote logins.
fn who_shows_remote_host() -> bool {
    for cmd in [&["who", "-m"][..], &["who", "am", "i"][..]] {
        let out = Command::new(cmd[0])
            .args(&cmd[1..])
            .stderr(Stdio::null())
            .output();
        if let Ok(out) = out {
            if out.status.success() {
                let text = String::from_utf8_lossy(&out.stdout);
                if text.contains('(') && text.contains(')') {
                    return true;
                }
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_ps_line_variants() {
        assert_eq!(parse_ps_line("sshd  1234"), Some(("sshd".to_string(), 1234)));
        assert_eq!(parse_ps_line("bash 1"), Some(("bash".to_string(), 1)));
        // a command name with spaces still yields the last token as ppid
        assert_eq!(
            parse_ps_line("sshd: user@pts/0  567"),
            Some(("sshd:".to_string(), 567))
        );
        // non-numeric tail ends the walk via ppid 0
        assert_eq!(parse_ps_line("weird"), Some(("weird".to_string(), 0)));
        assert_eq!(parse_ps_line(""), None);
    }
}
