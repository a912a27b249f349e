//! Per-session X11 forwarding credentials.
//!
//! Each x11 session gets its own authority cookie file in a kept temp
//! directory, tracked in the state store under an `X11-{session_id}`
//! namespace. The file is bind-mounted into the container by the x11
//! overlay, so refresh must rewrite it in place: the path is part of the
//! running container's configuration.

use std::collections::BTreeMap;
use std::env;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use anyhow::{bail, Context, Result};

use crate::errors::SessionError;
use crate::statefile::StateFile;

pub const KEY_COOKIE_FILE: &str = "X11_COOKIE_FILE";
pub const KEY_FORWARDING_ENABLED: &str = "X11_FORWARDING_ENABLED";
/// Single shared section used before credentials became per-session.
const LEGACY_SECTION: &str = "X11";

pub fn namespace_for(session_id: &str) -> String {
    format!("X11-{session_id}")
}

pub struct X11Credential {
    pub cookie_file: PathBuf,
}

impl X11Credential {
    /// Interpolation variables consumed by the x11 overlay file.
    pub fn compose_vars(&self, display: &str) -> BTreeMap<String, String> {
        let mut vars = BTreeMap::new();
        vars.insert(
            "X11_COOKIE_FILE".to_string(),
            self.cookie_file.display().to_string(),
        );
        if let Some(dir) = self.cookie_file.parent() {
            vars.insert("X11_COOKIE_DIR".to_string(), dir.display().to_string());
        }
        vars.insert("DISPLAY".to_string(), display.to_string());
        vars
    }
}

/// Get-or-create the credential for a namespace. Idempotent: a recorded,
/// still-existing file is returned unchanged.
pub fn ensure(store: &mut StateFile, namespace: &str, display: &str) -> Result<X11Credential> {
    // Drop the pre-namespace global section so stale paths never leak into
    // new sessions.
    if namespace != LEGACY_SECTION {
        store.remove_section(LEGACY_SECTION)?;
    }

    if let Some(path) = store.get(namespace, KEY_COOKIE_FILE).map(PathBuf::from) {
        if path.exists() {
            return Ok(X11Credential { cookie_file: path });
        }
    }

    let dir = tempfile::Builder::new()
        .prefix("simdock-x11-")
        .tempdir()
        .context("failed to create credential directory")?
        .into_path();
    let cookie_file = tempfile::Builder::new()
        .suffix(".xauth")
        .tempfile_in(&dir)
        .context("failed to create cookie file")?
        .keep()
        .context("failed to keep cookie file")?
        .1;
    write_cookie(&cookie_file, display)?;

    store.set(namespace, KEY_COOKIE_FILE, &cookie_file.display().to_string())?;
    store.set(namespace, KEY_FORWARDING_ENABLED, "1")?;
    Ok(X11Credential { cookie_file })
}

#[derive(Debug)]
pub enum RefreshOutcome {
    /// Cookie rewritten in place; the path is unchanged.
    Recreated(PathBuf),
    /// Forwarding was never enabled for this namespace; nothing to do.
    Inactive,
}

/// Regenerate the cookie at its recorded path. An enabled flag without the
/// on-disk file is a fatal inconsistency: silently recreating it would mask
/// a real environment mismatch, so the user is told to rebuild instead.
pub fn refresh(store: &mut StateFile, namespace: &str, display: &str) -> Result<RefreshOutcome> {
    let enabled = store.get(namespace, KEY_FORWARDING_ENABLED) == Some("1");
    let recorded = store.get(namespace, KEY_COOKIE_FILE).map(PathBuf::from);

    match recorded {
        Some(path) if path.exists() => {
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            write_cookie(&path, display)?;
            store.set(namespace, KEY_COOKIE_FILE, &path.display().to_string())?;
            Ok(RefreshOutcome::Recreated(path))
        }
        _ if enabled => Err(SessionError::StateInconsistency(
            "X11 forwarding is enabled for this session but its cookie file is missing. \
             Stop the session and start it again with --gui x11 to rebuild."
                .to_string(),
        )
        .into()),
        _ => Ok(RefreshOutcome::Inactive),
    }
}

/// Remove the cookie file and the whole namespace section. Safe no-op when
/// nothing exists. Returns whether a file was actually deleted.
pub fn cleanup(store: &mut StateFile, namespace: &str) -> Result<bool> {
    let recorded = store.get(namespace, KEY_COOKIE_FILE).map(PathBuf::from);
    let mut removed = false;
    if let Some(path) = recorded {
        if path.exists() {
            eprintln!("simdock: removing X11 cookie file {}", path.display());
            fs::remove_file(&path)
                .with_context(|| format!("failed to remove {}", path.display()))?;
            removed = true;
            if let Some(dir) = path.parent() {
                let _ = fs::remove_dir(dir);
            }
        }
    }
    store.remove(namespace, KEY_COOKIE_FILE)?;
    store.remove_section(namespace)?;
    Ok(removed)
}

/// Fill `cookie_file` with the host's current authority cookie for
/// `display`, rewritten to match any hostname.
fn write_cookie(cookie_file: &Path, display: &str) -> Result<()> {
    fs::File::create(cookie_file)
        .with_context(|| format!("failed to create {}", cookie_file.display()))?;

    // Deterministic cookie bytes for tests that must not depend on a real
    // display server.
    if let Ok(fake) = env::var("SIMDOCK_TEST_FAKE_COOKIE") {
        fs::write(cookie_file, fake.as_bytes())
            .with_context(|| format!("failed to write {}", cookie_file.display()))?;
        return Ok(());
    }

    let xauth = crate::docker::xauth_path()?;
    let out = Command::new(&xauth)
        .args(["nlist", display])
        .output()
        .context("failed to run xauth nlist")?;
    if !out.status.success() {
        bail!("xauth nlist {display} failed");
    }
    let cookie = portable_cookie(&String::from_utf8_lossy(&out.stdout));

    let mut child = Command::new(&xauth)
        .arg("-f")
        .arg(cookie_file)
        .args(["nmerge", "-"])
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .context("failed to run xauth nmerge")?;
    if let Some(mut stdin) = child.stdin.take() {
        stdin
            .write_all(cookie.as_bytes())
            .context("failed to pipe cookie into xauth")?;
    }
    let status = child.wait().context("xauth nmerge did not finish")?;
    if !status.success() {
        bail!("xauth nmerge into {} failed", cookie_file.display());
    }
    Ok(())
}

/// Strip the leading `ffff` family marker from each nlist entry so the
/// cookie stays valid regardless of the hostname seen inside the container.
fn portable_cookie(nlist: &str) -> String {
    let mut out = String::with_capacity(nlist.len());
    for line in nlist.lines() {
        out.push_str(line.strip_prefix("ffff").unwrap_or(line));
        out.push('\n');
    }
    out
}
