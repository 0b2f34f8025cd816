//! The interactive loop: read a line, run it, repeat.

use std::sync::Arc;

use rustyline::history::DefaultHistory;
use rustyline::{Config as EditorConfig, Editor};
use tracing::debug;

use crate::complete::{CompletionEngine, RequestFlags};
use crate::config::Config;
use crate::env::{ShellHost, SystemHost};
use crate::error::{Result, ShellError};
use crate::parser::tokenizer;

use super::helper::ReplHelper;

/// REPL engine for interactive command execution
pub struct ReplEngine {
    /// Line editor for command input
    editor: Editor<ReplHelper, DefaultHistory>,

    /// Completion engine shared with the editor helper
    engine: Arc<CompletionEngine>,

    /// Shell host used for execution and completion queries
    host: Arc<SystemHost>,

    /// History file location
    history_path: std::path::PathBuf,

    /// Whether to continue running
    running: bool,
}

impl ReplEngine {
    /// Create a new REPL engine
    ///
    /// # Arguments
    /// * `engine` - Completion engine
    /// * `host` - Shell host
    /// * `config` - Effective configuration
    ///
    /// # Returns
    /// * `Result<Self>` - New REPL engine or error
    pub fn new(
        engine: Arc<CompletionEngine>,
        host: Arc<SystemHost>,
        config: &Config,
    ) -> Result<Self> {
        let editor_config = EditorConfig::builder()
            .max_history_size(config.history.max_entries)
            .map_err(|e| ShellError::Generic(format!("History config error: {}", e)))?
            .history_ignore_space(true)
            .auto_add_history(true)
            .build();

        let flags = RequestFlags {
            autosuggestion: false,
            descriptions: config.completion.descriptions,
            fuzzy_match: config.completion.fuzzy,
        };
        let helper = ReplHelper::new(Arc::clone(&engine), Arc::clone(&host), flags);

        let mut editor = Editor::<ReplHelper, DefaultHistory>::with_config(editor_config)?;
        editor.set_helper(Some(helper));
        let _ = editor.load_history(&config.history.file_path);

        Ok(Self {
            editor,
            engine,
            host,
            history_path: config.history.file_path.clone(),
            running: true,
        })
    }

    /// Run the interactive loop until exit or EOF.
    pub fn run(&mut self) -> Result<()> {
        while self.running {
            // Loads requested by background completion land here
            self.engine.service_pending_loads();

            let line = match self.read_line()? {
                Some(line) => line,
                None => break,
            };
            let input = line.trim();
            if input.is_empty() {
                continue;
            }

            if let Err(e) = self.dispatch(input) {
                eprintln!("tidesh: {}", e);
            }
        }

        let _ = self.editor.save_history(&self.history_path);
        println!("Goodbye!");
        Ok(())
    }

    /// Read a single line of input
    ///
    /// # Returns
    /// * `Result<Option<String>>` - Input line or None on EOF / interrupt
    pub fn read_line(&mut self) -> Result<Option<String>> {
        match self.editor.readline("tidesh> ") {
            Ok(line) => Ok(Some(line)),
            Err(rustyline::error::ReadlineError::Interrupted) => Ok(Some(String::new())),
            Err(rustyline::error::ReadlineError::Eof) => Ok(None),
            Err(err) => Err(ShellError::Generic(format!("Read error: {}", err))),
        }
    }

    /// Execute one input line: builtins first, the host shell otherwise.
    fn dispatch(&mut self, input: &str) -> Result<()> {
        let tokens = tokenizer::tokenize(input);
        let first = tokens.first().map(|t| t.text.as_str()).unwrap_or("");

        match first {
            "exit" | "quit" => {
                self.running = false;
                Ok(())
            }
            "complete" => {
                let argv: Vec<String> = tokens
                    .iter()
                    .skip(1)
                    .filter_map(|t| tokenizer::unescape(&t.text, false))
                    .collect();
                if let Some(output) = self.engine.run_builtin(&argv)? {
                    print!("{}", output);
                }
                Ok(())
            }
            _ => {
                debug!("running through host shell: {}", input);
                let (status, lines) = self.host.exec_subshell(input)?;
                for line in lines {
                    println!("{}", line);
                }
                if status != 0 {
                    debug!("command exited with status {}", status);
                }
                Ok(())
            }
        }
    }

    /// Whether the loop should keep running.
    pub fn is_running(&self) -> bool {
        self.running
    }
}
