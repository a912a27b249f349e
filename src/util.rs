//! Shell-preview helpers for `--verbose` output and `.env` value cleanup.

/// Render argv as one line a user could paste back into a shell.
pub fn shell_join(args: &[String]) -> String {
    let mut out = String::new();
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            out.push(' ');
        }
        out.push_str(&shell_escape(arg));
    }
    out
}

pub fn shell_escape(s: &str) -> String {
    fn plain(c: char) -> bool {
        c.is_ascii_alphanumeric()
            || matches!(
                c,
                '-' | '_' | '=' | '.' | '/' | ':' | '@' | '^' | '$' | '{' | '}'
            )
    }
    if !s.is_empty() && s.chars().all(plain) {
        return s.to_string();
    }
    // Single-quote wrapping; embedded quotes become the '"'"' dance.
    format!("'{}'", s.replace('\'', "'\"'\"'"))
}

/// Drop one matching pair of outer quotes. Lone or mismatched quotes stay.
pub fn strip_outer_quotes(s: &str) -> &str {
    if s.len() < 2 {
        return s;
    }
    for quote in ['\'', '"'] {
        if let Some(inner) = s
            .strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
        {
            return inner;
        }
    }
    s
}
