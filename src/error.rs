use std::fmt;

use thiserror::Error;

/// A required option that was absent from both the arguments and the environment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MissingArgument {
    pub keys: Vec<String>,
}

impl fmt::Display for MissingArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]", self.keys.join(", "))
    }
}

/// Broad failure category, used to pick the exit status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Argument,
    ExternalTool,
    Domain,
    Config,
}

/// Unified error type for xchelper operations
#[derive(Error, Debug)]
pub enum XcHelperError {
    #[error("No command provided. Available commands: {}", .0.join(", "))]
    MissingCommand(Vec<String>),

    #[error("Unknown command '{command}'. Available commands: {}", available.join(", "))]
    UnknownCommand {
        command: String,
        available: Vec<String>,
    },

    #[error("Missing required arguments: {}", join_missing(.0))]
    MissingArguments(Vec<MissingArgument>),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("{0}")]
    Usage(String),

    #[error("{program} failed with exit code {code}: {stderr}")]
    Tool {
        program: String,
        code: i32,
        stderr: String,
    },

    #[error("Failed to decode build log: {0}")]
    LogDecode(String),

    #[error("No tag found in repository at {0}")]
    NoTag(String),

    #[error("Version parsing error: {0}")]
    Version(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

fn join_missing(missing: &[MissingArgument]) -> String {
    missing
        .iter()
        .map(|m| m.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Convenience type alias for Results in xchelper
pub type Result<T> = std::result::Result<T, XcHelperError>;

impl XcHelperError {
    /// Create an invalid argument error with context
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        XcHelperError::InvalidArgument(msg.into())
    }

    /// Create a version error with context
    pub fn version(msg: impl Into<String>) -> Self {
        XcHelperError::Version(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        XcHelperError::Remote(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        XcHelperError::Config(msg.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            XcHelperError::MissingCommand(_)
            | XcHelperError::UnknownCommand { .. }
            | XcHelperError::MissingArguments(_)
            | XcHelperError::InvalidArgument(_)
            | XcHelperError::Usage(_) => ErrorKind::Argument,
            XcHelperError::NoTag(_) | XcHelperError::Version(_) => ErrorKind::Domain,
            XcHelperError::Config(_) => ErrorKind::Config,
            XcHelperError::Tool { .. }
            | XcHelperError::LogDecode(_)
            | XcHelperError::Git(_)
            | XcHelperError::Remote(_)
            | XcHelperError::Io(_)
            | XcHelperError::Other(_) => ErrorKind::ExternalTool,
        }
    }

    /// Process exit status for this error.
    ///
    /// External tools keep their own non-zero status so callers in build
    /// phases see the same code the tool produced.
    pub fn exit_code(&self) -> i32 {
        match self {
            XcHelperError::Tool { code, .. } if *code != 0 => *code,
            _ if self.kind() == ErrorKind::Argument => 2,
            _ => 1,
        }
    }
}
