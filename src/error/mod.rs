pub mod kinds;

// Re-export commonly used error types and the crate-wide Result alias
pub use kinds::{ConfigError, ExecError, ParseError, Result, ShellError};
