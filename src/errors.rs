//! Error taxonomy and exit-code mapping.
//!
//! Mapping rules:
//! - 127 when a required external tool is absent (command-not-found convention)
//! - 1 for every other failure
use std::fmt;
use std::io;

#[derive(Debug)]
pub enum SessionError {
    /// Starting would violate the single-local-GUI rule. Nothing was changed.
    Conflict(String),
    /// The targeted session is not running (or does not exist).
    NotRunning(String),
    /// Caller-supplied value outside the accepted domain.
    InvalidArgument(String),
    /// Required external executable not found on PATH.
    ToolMissing { tool: String, remediation: String },
    /// Persistent records disagree with reality; the session must be rebuilt.
    StateInconsistency(String),
    Io(io::Error),
}

impl fmt::Display for SessionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionError::Conflict(msg)
            | SessionError::NotRunning(msg)
            | SessionError::InvalidArgument(msg)
            | SessionError::StateInconsistency(msg) => f.write_str(msg),
            SessionError::ToolMissing { tool, remediation } => {
                write!(f, "{tool} not found on PATH. {remediation}")
            }
            SessionError::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for SessionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SessionError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for SessionError {
    fn from(e: io::Error) -> Self {
        SessionError::Io(e)
    }
}

/// Map an io::Error to a process exit code:
/// - 127 for NotFound (command not found)
/// - 1 for all other errors
pub fn exit_code_for_io_error(e: &io::Error) -> u8 {
    if e.kind() == io::ErrorKind::NotFound {
        127
    } else {
        1
    }
}

/// Convert SessionError to exit code (parity with io::Error mapping).
pub fn exit_code_for_session_error(e: &SessionError) -> u8 {
    match e {
        SessionError::ToolMissing { .. } => 127,
        SessionError::Io(ioe) => exit_code_for_io_error(ioe),
        _ => 1,
    }
}
