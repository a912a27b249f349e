//! Terminal color policy and the stderr log helpers built on it.
//!
//! Precedence for whether a stream gets ANSI codes: `NO_COLOR` kills color
//! outright, then the `--color` flag, then `SIMDOCK_COLOR`, then TTY
//! detection. Helpers never change message text; with color disabled the
//! output is byte-for-byte the plain message.

use clap::ValueEnum;
use once_cell::sync::OnceCell;

pub const RESET: &str = "\x1b[0m";
/// Section headings and info lines.
pub const STYLE_HEADING: &str = "\x1b[36;1m";
pub const STYLE_WARN: &str = "\x1b[33m";
pub const STYLE_ERROR: &str = "\x1b[31;1m";
/// De-emphasis for container names next to nicknames.
pub const STYLE_DIM: &str = "\x1b[2m";
pub const STYLE_ACCENT: &str = "\x1b[36m";
pub const STYLE_OK: &str = "\x1b[32m";
pub const STYLE_BAD: &str = "\x1b[31m";

#[derive(Copy, Clone, PartialEq, Eq, Debug, ValueEnum)]
pub enum ColorMode {
    Auto,
    Always,
    Never,
}

impl ColorMode {
    /// Accepts the mode names plus common on/off aliases, case-insensitive.
    fn from_label(s: &str) -> Option<ColorMode> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("auto") {
            Some(ColorMode::Auto)
        } else if ["always", "on", "true", "yes"]
            .iter()
            .any(|a| s.eq_ignore_ascii_case(a))
        {
            Some(ColorMode::Always)
        } else if ["never", "off", "false", "no"]
            .iter()
            .any(|a| s.eq_ignore_ascii_case(a))
        {
            Some(ColorMode::Never)
        } else {
            None
        }
    }

    fn enabled_on(self, tty: bool) -> bool {
        match self {
            ColorMode::Always => true,
            ColorMode::Never => false,
            ColorMode::Auto => tty,
        }
    }
}

static CLI_OVERRIDE: OnceCell<ColorMode> = OnceCell::new();

/// Record the `--color` flag; first caller wins, later calls are ignored.
pub fn set_color_mode(mode: ColorMode) {
    let _ = CLI_OVERRIDE.set(mode);
}

fn env_preference() -> Option<ColorMode> {
    let raw = std::env::var("SIMDOCK_COLOR").ok()?;
    ColorMode::from_label(&raw)
}

fn enabled_for(tty: bool) -> bool {
    // https://no-color.org/: presence alone disables, value ignored
    if std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    CLI_OVERRIDE
        .get()
        .copied()
        .or_else(env_preference)
        .map(|mode| mode.enabled_on(tty))
        .unwrap_or(tty)
}

pub fn color_enabled_stdout() -> bool {
    enabled_for(atty::is(atty::Stream::Stdout))
}

pub fn color_enabled_stderr() -> bool {
    enabled_for(atty::is(atty::Stream::Stderr))
}

/// Wrap `text` in a style when enabled, pass it through untouched otherwise.
pub fn paint(enabled: bool, style: &str, text: &str) -> String {
    if enabled {
        format!("{style}{text}{RESET}")
    } else {
        text.to_string()
    }
}

pub fn log_info_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, STYLE_HEADING, msg));
}

pub fn log_warn_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, STYLE_WARN, msg));
}

pub fn log_error_stderr(use_color: bool, msg: &str) {
    eprintln!("{}", paint(use_color, STYLE_ERROR, msg));
}
