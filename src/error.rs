use std::io;
use std::time::Duration;

use thiserror::Error;

pub type Result<T, E = ShellError> = std::result::Result<T, E>;

/// Configuration and value errors. These are raised at the call site and
/// never retried.
#[derive(Debug, Error)]
pub enum ShellError {
    #[error("[{spec}] is improperly formatted for a shell option: {reason}")]
    Parse { spec: String, reason: String },

    #[error("Invalid value: {0}")]
    InvalidValue(String),

    #[error("Unsupported: {0}")]
    Unsupported(String),

    #[error("Unknown flag: {0}")]
    UnknownFlag(String),

    #[error("Invalid command: {0}")]
    InvalidCommand(String),

    #[error("Cannot redefine command [{current}] as [{requested}] once set")]
    CommandRedefined { current: String, requested: String },

    #[error("No command has been specified, cannot execute")]
    NoCommand,

    #[error("Invalid setting: {0}")]
    InvalidSetting(String),
}

impl ShellError {
    pub(crate) fn parse(spec: &str, reason: impl Into<String>) -> Self {
        ShellError::Parse { spec: spec.to_string(), reason: reason.into() }
    }
}

/// Failure of one execution attempt. Captured into `Command::last_error`,
/// never returned from `run_once`/`run_multi`.
#[derive(Debug, Error)]
pub enum RunError {
    #[error("The process exceeded the timeout of {0:?}")]
    Timeout(Duration),

    #[error("The process exceeded the idle timeout of {0:?}")]
    IdleTimeout(Duration),

    #[error("The command [{command}] failed with {}", describe_code(.code))]
    Failed { code: Option<i32>, command: String },

    #[error("Failed to launch [{program}]: {source}")]
    Spawn {
        program: String,
        #[source]
        source: io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl RunError {
    pub fn is_timeout(&self) -> bool { matches!(self, RunError::Timeout(_)) }

    pub fn is_idle_timeout(&self) -> bool { matches!(self, RunError::IdleTimeout(_)) }

    /// Exit code of a failed process, when it exited normally.
    pub fn exit_code(&self) -> Option<i32> {
        match self {
            RunError::Failed { code, .. } => *code,
            _ => None,
        }
    }

    /// Spawn and io failures are not outcomes of the command itself.
    pub(crate) fn is_unexpected(&self) -> bool {
        matches!(self, RunError::Spawn { .. } | RunError::Io(_))
    }
}

fn describe_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => format!("exit code {}", c),
        None => "no exit code (terminated by signal)".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_error_classification() {
        assert!(RunError::Timeout(Duration::from_secs(1)).is_timeout());
        assert!(!RunError::Timeout(Duration::from_secs(1)).is_idle_timeout());
        assert!(RunError::IdleTimeout(Duration::from_secs(1)).is_idle_timeout());
        let failed = RunError::Failed { code: Some(2), command: "false".into() };
        assert_eq!(failed.exit_code(), Some(2));
        assert!(!failed.is_unexpected());
        assert_eq!(failed.to_string(), "The command [false] failed with exit code 2");
    }

    #[test]
    fn parse_error_carries_input() {
        let err = ShellError::parse("-vabc", "unexpected trailing input");
        assert!(err.to_string().contains("[-vabc]"));
    }
}
