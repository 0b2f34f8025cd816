//! Error types for the tidesh application.
//!
//! This module defines a streamlined error hierarchy covering parsing,
//! subshell execution, and configuration, plus the usual I/O and catch-all
//! variants.

use std::{fmt, io};

/// Crate-wide `Result` type using [`ShellError`] as the error.
pub type Result<T> = std::result::Result<T, ShellError>;

/// Top-level error type for tidesh operations.
///
/// This type provides a unified error interface for the entire application.
#[derive(Debug)]
pub enum ShellError {
    /// Command-line parsing errors.
    Parse(ParseError),

    /// Subshell / command execution errors.
    Exec(ExecError),

    /// Configuration errors.
    Config(ConfigError),

    /// I/O errors.
    Io(io::Error),

    /// Generic error with a message.
    Generic(String),
}

/// Parsing-specific errors.
#[derive(Debug)]
pub enum ParseError {
    /// Syntax error in input.
    SyntaxError(String),

    /// Unterminated quote or escape at end of input.
    UnterminatedQuote(char),

    /// Invalid invocation of a builtin.
    InvalidBuiltin(String),
}

/// Execution-specific errors.
#[derive(Debug)]
pub enum ExecError {
    /// The subshell could not be spawned.
    SpawnFailed(String),

    /// The subshell produced undecodable output.
    BadOutput(String),

    /// A completion definition file could not be loaded.
    LoadFailed(String),
}

/// Configuration-specific errors.
#[derive(Debug)]
pub enum ConfigError {
    /// Config file could not be read.
    Unreadable(String),

    /// Invalid config format.
    InvalidFormat(String),

    /// Generic configuration error.
    Generic(String),
}

// ============================================================================
// Display implementations
// ============================================================================

impl fmt::Display for ShellError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ShellError::Parse(e) => write!(f, "ParseError: {}", e),
            ShellError::Exec(e) => write!(f, "ExecError: {}", e),
            ShellError::Config(e) => write!(f, "ConfigError: {}", e),
            ShellError::Io(e) => write!(f, "IoError: {}", e),
            ShellError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseError::SyntaxError(msg) => write!(f, "{}", msg),
            ParseError::UnterminatedQuote(c) => write!(f, "Unterminated quote: {}", c),
            ParseError::InvalidBuiltin(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ExecError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExecError::SpawnFailed(msg) => write!(f, "{}", msg),
            ExecError::BadOutput(msg) => write!(f, "{}", msg),
            ExecError::LoadFailed(msg) => write!(f, "{}", msg),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Unreadable(msg) => write!(f, "{}", msg),
            ConfigError::InvalidFormat(msg) => write!(f, "{}", msg),
            ConfigError::Generic(msg) => write!(f, "{}", msg),
        }
    }
}

// ============================================================================
// Error trait implementations
// ============================================================================

impl std::error::Error for ShellError {}
impl std::error::Error for ParseError {}
impl std::error::Error for ExecError {}
impl std::error::Error for ConfigError {}

// ============================================================================
// Conversions to ShellError
// ============================================================================

impl From<ParseError> for ShellError {
    fn from(err: ParseError) -> Self {
        ShellError::Parse(err)
    }
}

impl From<ExecError> for ShellError {
    fn from(err: ExecError) -> Self {
        ShellError::Exec(err)
    }
}

impl From<ConfigError> for ShellError {
    fn from(err: ConfigError) -> Self {
        ShellError::Config(err)
    }
}

impl From<io::Error> for ShellError {
    fn from(err: io::Error) -> Self {
        ShellError::Io(err)
    }
}

impl From<String> for ShellError {
    fn from(msg: String) -> Self {
        ShellError::Generic(msg)
    }
}

impl From<&str> for ShellError {
    fn from(msg: &str) -> Self {
        ShellError::Generic(msg.to_string())
    }
}

impl From<rustyline::error::ReadlineError> for ShellError {
    fn from(err: rustyline::error::ReadlineError) -> Self {
        ShellError::Generic(format!("Readline error: {}", err))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_parse() {
        let err = ShellError::Parse(ParseError::UnterminatedQuote('"'));
        assert_eq!(err.to_string(), "ParseError: Unterminated quote: \"");
    }

    #[test]
    fn test_from_io() {
        let err: ShellError = io::Error::new(io::ErrorKind::NotFound, "gone").into();
        assert!(matches!(err, ShellError::Io(_)));
    }

    #[test]
    fn test_from_str() {
        let err: ShellError = "boom".into();
        assert_eq!(err.to_string(), "boom");
    }
}
