//! Command-line interface for tidesh
//!
//! This module handles:
//! - Command-line argument parsing using clap
//! - Configuration loading
//! - Mode selection (interactive vs one-shot subcommands)

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::Config;
use crate::error::Result;

/// tidesh - a small interactive shell with programmable completions
#[derive(Parser, Debug)]
#[command(
    name = "tidesh",
    version,
    about = "A small interactive shell with a programmable tab-completion engine",
    long_about = "An interactive command shell whose tab completion is driven by \
per-command rules, defined with the complete builtin or autoloaded from \
definition files."
)]
pub struct CliArgs {
    /// Configuration file path
    #[arg(short = 'c', long = "config", value_name = "FILE")]
    pub config_file: Option<PathBuf>,

    /// Disable colored output
    #[arg(long = "no-color")]
    pub no_color: bool,

    /// Quiet mode (minimal output)
    #[arg(short = 'q', long)]
    pub quiet: bool,

    /// Verbose mode (detailed logging)
    #[arg(short = 'v', long)]
    pub verbose: bool,

    /// Very verbose mode (debug logging)
    #[arg(long = "vv")]
    pub very_verbose: bool,

    /// Subcommands
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Subcommands for tidesh
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print completions for a command line, one candidate per line
    Complete {
        /// The command line to complete
        #[arg(value_name = "LINE")]
        line: String,

        /// Cursor position in bytes (defaults to the end of the line)
        #[arg(long, value_name = "POS")]
        cursor: Option<usize>,

        /// Fill candidate descriptions
        #[arg(long)]
        descriptions: bool,

        /// Enable fuzzy matching
        #[arg(long)]
        fuzzy: bool,
    },

    /// Print the completion registry as a script
    Print,

    /// Show or validate configuration
    Config {
        /// Show effective configuration
        #[arg(long)]
        show: bool,

        /// Validate configuration file
        #[arg(long)]
        validate: bool,
    },
}

/// CLI interface handler
pub struct CliInterface {
    /// Parsed command-line arguments
    args: CliArgs,

    /// Loaded configuration
    config: Config,
}

impl CliInterface {
    /// Create a new CLI interface
    ///
    /// # Returns
    /// * `Result<Self>` - New CLI interface or error
    pub fn new() -> Result<Self> {
        let args = CliArgs::parse();
        let config = Config::load_from_file(args.config_file.as_deref())?;
        Ok(Self { args, config })
    }

    /// Build directly from parts, for tests.
    pub fn from_parts(args: CliArgs, config: Config) -> Self {
        Self { args, config }
    }

    /// Parsed arguments.
    pub fn args(&self) -> &CliArgs {
        &self.args
    }

    /// Effective configuration.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Whether the shell should enter the interactive loop.
    pub fn is_interactive(&self) -> bool {
        self.args.command.is_none()
    }

    /// Print the startup banner unless quieted.
    pub fn print_banner(&self) {
        if !self.args.quiet {
            println!("tidesh {}", env!("CARGO_PKG_VERSION"));
            println!("Type 'exit' to leave.");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_no_subcommand_is_interactive() {
        let args = CliArgs::parse_from(["tidesh"]);
        let cli = CliInterface::from_parts(args, Config::default());
        assert!(cli.is_interactive());
    }

    #[test]
    fn test_complete_subcommand_parses() {
        let args = CliArgs::parse_from(["tidesh", "complete", "git ch", "--cursor", "6", "--fuzzy"]);
        match args.command {
            Some(Commands::Complete {
                line,
                cursor,
                fuzzy,
                descriptions,
            }) => {
                assert_eq!(line, "git ch");
                assert_eq!(cursor, Some(6));
                assert!(fuzzy);
                assert!(!descriptions);
            }
            _ => panic!("expected complete subcommand"),
        }
    }

    #[test]
    fn test_verbosity_flags() {
        let args = CliArgs::parse_from(["tidesh", "--vv"]);
        assert!(args.very_verbose);
        assert!(!args.verbose);
    }
}
