//! Ordered env-file layering with compose-compatible parsing.
//!
//! Files are read in the given order; later assignments overwrite earlier
//! ones, mimicking `docker compose --env-file` override behavior. Lines
//! without `=` are skipped silently (the engine tolerates them, so we do
//! too).

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

use crate::errors::SessionError;
use crate::util::strip_outer_quotes;

/// Read and merge env files in order. A missing file is an error: layer
/// lists are computed from the profile, so absence means a broken context
/// checkout rather than an optional feature.
pub fn load_layers<P: AsRef<Path>>(paths: &[P]) -> Result<BTreeMap<String, String>, SessionError> {
    let mut vars = BTreeMap::new();
    for p in paths {
        let p = p.as_ref();
        let contents = fs::read_to_string(p).map_err(|e| {
            SessionError::Io(io::Error::new(
                e.kind(),
                format!("failed to read env file {}: {e}", p.display()),
            ))
        })?;
        parse_into(&mut vars, &contents);
    }
    Ok(vars)
}

/// Parse one file's worth of lines into the accumulator.
pub fn parse_into(vars: &mut BTreeMap<String, String>, contents: &str) {
    for raw in contents.lines() {
        let mut line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if let Some(prefix) = line.get(..7) {
            if prefix.eq_ignore_ascii_case("export ") {
                line = line[7..].trim_start();
            }
        }
        let Some((key, val)) = line.split_once('=') else {
            continue;
        };
        let key = key.trim();
        let val = strip_outer_quotes(val.trim());
        vars.insert(key.to_string(), val.to_string());
    }
}
