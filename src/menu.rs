//! Thin interactive chooser: numbered list on stderr, line-based input.
//!
//! Prompting is refused outright on non-interactive stdin so scripted
//! callers get a clear instruction to pass explicit flags instead of a
//! hang.

use std::io::{self, BufRead, Write};

use anyhow::Result;

use crate::color::{color_enabled_stderr, paint, STYLE_HEADING, STYLE_WARN};
use crate::errors::SessionError;

pub struct MenuItem<T> {
    pub label: String,
    pub description: String,
    pub value: T,
    pub recommended: bool,
    pub warning: Option<String>,
    pub info: Option<String>,
}

impl<T> MenuItem<T> {
    pub fn new(label: &str, value: T) -> MenuItem<T> {
        MenuItem {
            label: label.to_string(),
            description: String::new(),
            value,
            recommended: false,
            warning: None,
            info: None,
        }
    }

    pub fn describe(mut self, description: &str) -> MenuItem<T> {
        self.description = description.to_string();
        self
    }

    pub fn recommended(mut self, yes: bool) -> MenuItem<T> {
        self.recommended = yes;
        self
    }

    pub fn warning(mut self, text: &str) -> MenuItem<T> {
        self.warning = Some(text.to_string());
        self
    }

    pub fn info(mut self, text: &str) -> MenuItem<T> {
        self.info = Some(text.to_string());
        self
    }
}

/// Present a numbered choice and return the picked value. Empty input picks
/// `default_index` (zero-based); out-of-range input re-prompts.
pub fn select<T>(title: &str, items: Vec<MenuItem<T>>, default_index: usize) -> Result<T> {
    if items.is_empty() {
        return Err(SessionError::InvalidArgument(format!(
            "no choices available for: {title}"
        ))
        .into());
    }
    if !atty::is(atty::Stream::Stdin) {
        return Err(SessionError::InvalidArgument(format!(
            "refusing to prompt for {title} on non-interactive stdin; pass explicit flags instead"
        ))
        .into());
    }

    let default_index = default_index.min(items.len() - 1);
    let use_err = color_enabled_stderr();
    eprintln!("{}", paint(use_err, STYLE_HEADING, &format!("simdock: {title}")));
    for (i, item) in items.iter().enumerate() {
        let mut line = format!("  {}) {}", i + 1, item.label);
        if !item.description.is_empty() {
            line.push_str(&format!("  - {}", item.description));
        }
        if item.recommended {
            line.push_str(" (recommended)");
        }
        eprintln!("{line}");
        if let Some(w) = &item.warning {
            eprintln!("{}", paint(use_err, STYLE_WARN, &format!("     warning: {w}")));
        }
        if let Some(n) = &item.info {
            eprintln!("     {n}");
        }
    }

    let stdin = io::stdin();
    loop {
        eprint!("Choice [{}]: ", default_index + 1);
        let _ = io::stderr().flush();
        let mut line = String::new();
        let n = stdin.lock().read_line(&mut line)?;
        if n == 0 {
            return Err(SessionError::InvalidArgument(format!(
                "stdin closed while choosing {title}"
            ))
            .into());
        }
        if let Some(idx) = parse_choice(&line, items.len(), default_index) {
            return match items.into_iter().nth(idx) {
                Some(item) => Ok(item.value),
                None => unreachable!("index validated against item count"),
            };
        }
        eprintln!("simdock: enter a number between 1 and {}", items.len());
    }
}

/// `[y/N]`-style confirmation. Empty input picks the default.
pub fn confirm(question: &str, default_yes: bool) -> Result<bool> {
    if !atty::is(atty::Stream::Stdin) {
        return Err(SessionError::InvalidArgument(format!(
            "refusing to ask '{question}' on non-interactive stdin; pass --yes instead"
        ))
        .into());
    }
    let marker = if default_yes { "[Y/n]" } else { "[y/N]" };
    eprint!("simdock: {question} {marker} ");
    let _ = io::stderr().flush();
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let ans = line.trim().to_ascii_lowercase();
    if ans.is_empty() {
        return Ok(default_yes);
    }
    Ok(ans == "y" || ans == "yes")
}

fn parse_choice(input: &str, count: usize, default_index: usize) -> Option<usize> {
    let t = input.trim();
    if t.is_empty() {
        return Some(default_index);
    }
    match t.parse::<usize>() {
        Ok(n) if (1..=count).contains(&n) => Some(n - 1),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_choice_accepts_in_range_numbers() {
        assert_eq!(parse_choice("1\n", 3, 0), Some(0));
        assert_eq!(parse_choice("3", 3, 0), Some(2));
        assert_eq!(parse_choice(" 2 ", 3, 0), Some(1));
    }

    #[test]
    fn test_parse_choice_empty_picks_default() {
        assert_eq!(parse_choice("\n", 3, 1), Some(1));
        assert_eq!(parse_choice("", 3, 2), Some(2));
    }

    #[test]
    fn test_parse_choice_rejects_out_of_range() {
        assert_eq!(parse_choice("0", 3, 0), None);
        assert_eq!(parse_choice("4", 3, 0), None);
        assert_eq!(parse_choice("x", 3, 0), None);
    }

    #[test]
    fn test_menu_item_builder() {
        let item = MenuItem::new("WebRTC", "webrtc")
            .describe("browser streaming")
            .recommended(true)
            .warning("needs open ports");
        assert_eq!(item.label, "WebRTC");
        assert_eq!(item.description, "browser streaming");
        assert!(item.recommended);
        assert!(item.warning.is_some());
        assert!(item.info.is_none());
    }
}
