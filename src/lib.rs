//! tidesh shell library
//!
//! Core functionality of the tidesh interactive shell. The centerpiece is
//! the completion engine; the other modules are the collaborators it
//! consumes and the thin interactive front end.
//!
//! # Modules
//!
//! - `cli`: Command-line interface and argument parsing
//! - `complete`: The tab-completion engine (registry, matcher, orchestrator)
//! - `config`: Configuration management
//! - `env`: Shell-state seam (variables, functions, builtins, subshells)
//! - `error`: Error types and handling
//! - `expand`: Wildcard matching and filesystem completion
//! - `parser`: Tokenization and statement extraction
//! - `repl`: Interactive shell front end
//!
//! # Example
//!
//! ```no_run
//! use tidesh::complete::{CompletionEngine, RequestFlags};
//! use tidesh::env::SystemHost;
//!
//! let engine = CompletionEngine::new(vec![]);
//! let host = SystemHost::new();
//!
//! let argv: Vec<String> = ["-c", "git", "-s", "b", "-l", "branch"]
//!     .iter()
//!     .map(|s| s.to_string())
//!     .collect();
//! engine.run_builtin(&argv).unwrap();
//!
//! let candidates = engine.complete(&host, "git --bra", 9, RequestFlags::default());
//! assert_eq!(candidates[0].text, "nch");
//! ```

pub mod cli;
pub mod complete;
pub mod config;
pub mod env;
pub mod error;
pub mod expand;
pub mod parser;
pub mod repl;

// Re-export commonly used types
pub use complete::{Candidate, CandidateFlags, CompletionEngine, MatchKind, RequestFlags};
pub use config::Config;
pub use env::{ShellHost, SystemHost};
pub use error::{Result, ShellError};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Get library version string
pub fn version() -> &'static str {
    VERSION
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version() {
        assert!(!version().is_empty());
    }
}
