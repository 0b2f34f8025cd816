//! tidesh - a small interactive shell
//!
//! An interactive command shell whose tab completion is driven by
//! per-command rules: option switches, option arguments, file paths,
//! variable names, and `~user` expansions, defined with the `complete`
//! builtin or autoloaded from definition files.
//!
//! # Usage
//!
//! ```bash
//! # Interactive mode
//! tidesh
//!
//! # One-shot completion (for scripting and testing)
//! tidesh complete 'git ch'
//!
//! # Dump the completion registry
//! tidesh print
//! ```

use std::sync::Arc;

use tracing::{info, Level};

mod cli;
mod complete;
mod config;
mod env;
mod error;
mod expand;
mod parser;
mod repl;

use cli::{CliInterface, Commands};
use complete::{CompletionEngine, RequestFlags};
use env::SystemHost;
use error::Result;

/// Application entry point
fn main() {
    if let Err(e) = run() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

/// Main application logic
///
/// 1. Parse command-line arguments
/// 2. Load configuration
/// 3. Initialize logging
/// 4. Handle subcommands or start the interactive shell
///
/// # Returns
/// * `Result<()>` - Success or error
fn run() -> Result<()> {
    let cli = CliInterface::new()?;
    initialize_logging(&cli);

    let engine = Arc::new(CompletionEngine::new(cli.config().completion.path.clone()));
    let host = Arc::new(SystemHost::new());

    match cli.args().command.as_ref() {
        Some(Commands::Complete {
            line,
            cursor,
            descriptions,
            fuzzy,
        }) => {
            let flags = RequestFlags {
                autosuggestion: false,
                descriptions: *descriptions || cli.config().completion.descriptions,
                fuzzy_match: *fuzzy || cli.config().completion.fuzzy,
            };
            let cursor = cursor.unwrap_or(line.len());
            let mut candidates = engine.complete(host.as_ref(), line, cursor, flags);
            candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
            for c in &candidates {
                if c.description.is_empty() {
                    println!("{}", c.text);
                } else {
                    println!("{}\t{}", c.text, c.description);
                }
            }
            Ok(())
        }
        Some(Commands::Print) => {
            print!("{}", engine.print());
            Ok(())
        }
        Some(Commands::Config { show, validate }) => {
            if *validate {
                println!("Configuration OK");
            }
            if *show || !*validate {
                let rendered = toml::to_string_pretty(cli.config())
                    .map_err(|e| error::ShellError::Generic(e.to_string()))?;
                print!("{}", rendered);
            }
            Ok(())
        }
        None => {
            cli.print_banner();
            info!("Starting interactive shell");
            let mut shell = repl::ReplEngine::new(engine, host, cli.config())?;
            shell.run()
        }
    }
}

/// Initialize logging system based on verbosity level
///
/// # Arguments
/// * `cli` - CLI interface with verbosity settings
fn initialize_logging(cli: &CliInterface) {
    let level = if cli.args().very_verbose {
        Level::TRACE
    } else if cli.args().verbose {
        Level::DEBUG
    } else {
        cli.config().logging.level.to_tracing_level()
    };

    let subscriber = tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false);

    if cli.config().logging.timestamps {
        subscriber.init();
    } else {
        subscriber.without_time().init();
    }

    info!("Logging initialized at level: {:?}", level);
}
