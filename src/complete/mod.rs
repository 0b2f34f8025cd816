//! Tab-completion engine for tidesh
//!
//! Given a partially typed command line and a cursor position, the engine
//! produces candidate completions: command names, option switches, option
//! arguments, file paths, variable names, and `~user` expansions.
//!
//! # Architecture
//!
//! - **Registry**: process-wide store of per-command completion rules,
//!   edited by the `complete` builtin and the autoloader
//! - **Matcher**: pure classification of typed tokens against a rule's
//!   short / GNU-long / old-style spellings
//! - **Completer**: the request-scoped orchestrator deciding which
//!   candidate sources run and merging their output
//! - **Sources**: the generators themselves (commands, rule arguments,
//!   variables, users)
//! - **Validator**: option lint backed by the same registry
//! - **Autoloader**: lazy loading of `<cmd>.tish` definition files
//! - **Serializer**: the registry printed back as a `complete` script
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
//! // Complete "git ch" with the cursor at the end
//! let candidates = engine.complete(&host, "git ch", 6, RequestFlags::default());
//! for c in &candidates {
//!     println!("{}", c.text);
//! }
//! ```

pub mod autoload;
pub mod builtin;
pub mod candidate;
mod completer;
pub mod fuzzy;
pub mod matcher;
pub mod registry;
pub mod rule;
pub mod serializer;
mod sources;
pub mod validator;


use std::path::PathBuf;

use autoload::Autoloader;
use registry::Registry;
use rule::Rule;

use crate::env::ShellHost;
use crate::error::Result;

/// Per-request behavior switches. All off by default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RequestFlags {
    /// Off-thread, side-effect-free request for an inline hint: conditions
    /// are not executed, descriptions are not fetched, autoloading is
    /// deferred to the main thread
    pub autosuggestion: bool,
    /// Fill candidate descriptions
    pub descriptions: bool,
    /// Accept every match quality instead of prefixes only
    pub fuzzy_match: bool,
}

/// The completion engine: rule registry plus definition-file autoloader.
///
/// One engine lives for the shell process lifetime and is shared across
/// threads; completion requests themselves are single-shot.
#[derive(Debug, Default)]
pub struct CompletionEngine {
    registry: Registry,
    autoloader: Autoloader,
}

impl CompletionEngine {
    /// Create an engine autoloading definitions from `completion_path`.
    pub fn new(completion_path: Vec<PathBuf>) -> Self {
        Self {
            registry: Registry::new(),
            autoloader: Autoloader::new(completion_path),
        }
    }

    /// Produce completions for `line` with the cursor at byte `cursor`.
    ///
    /// Best-effort by contract: failures inside individual generators cost
    /// candidates, never an error.
    pub fn complete(
        &self,
        host: &dyn ShellHost,
        line: &str,
        cursor: usize,
        flags: RequestFlags,
    ) -> Vec<Candidate> {
        completer::run(&self.registry, &self.autoloader, host, line, cursor, flags)
    }

    /// Add a completion rule for a command.
    pub fn add(&self, cmd: &str, cmd_is_path: bool, rule: Rule) {
        self.registry.add(cmd, cmd_is_path, rule);
    }

    /// Remove rules for a command; both options absent clears them all.
    pub fn remove(&self, cmd: &str, cmd_is_path: bool, short: Option<char>, long: Option<&str>) {
        self.registry.remove(cmd, cmd_is_path, short, long);
    }

    /// Set whether unknown options are errors for a command.
    pub fn set_authoritative(&self, cmd: &str, cmd_is_path: bool, authoritative: bool) {
        self.registry.set_authoritative(cmd, cmd_is_path, authoritative);
    }

    /// Serialize the registry as a script of `complete` lines.
    pub fn print(&self) -> String {
        serializer::print_registry(&self.registry)
    }

    /// Load the completion definition file for `cmd`. Main thread only.
    pub fn load(&self, cmd: &str, reload: bool) {
        self.autoloader.load(&self.registry, cmd, reload);
    }

    /// Perform loads queued by autosuggestion requests. Main thread only;
    /// call between inputs.
    pub fn service_pending_loads(&self) {
        self.autoloader.service_pending(&self.registry);
    }

    /// Run the `complete` builtin; returns the registry printout when
    /// invoked bare.
    pub fn run_builtin(&self, argv: &[String]) -> Result<Option<String>> {
        builtin::run_complete_builtin(&self.registry, argv)
    }

    /// Whether `opt` is a syntactically valid option for the command in
    /// `cmd_line`, reporting problems to `errors`.
    pub fn is_valid_option(
        &self,
        host: &dyn ShellHost,
        cmd_line: &str,
        opt: &str,
        errors: Option<&mut Vec<String>>,
        allow_autoload: bool,
    ) -> bool {
        validator::is_valid_option(
            &self.registry,
            &self.autoloader,
            host,
            cmd_line,
            opt,
            errors,
            allow_autoload,
        )
    }

    /// Whether `arg` is valid as the argument of `opt`. Extension point;
    /// currently accepts everything.
    pub fn is_valid_argument(&self, cmd_line: &str, opt: &str, arg: &str) -> bool {
        validator::is_valid_argument(cmd_line, opt, arg)
    }

    /// The underlying registry, for direct inspection.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }
}

pub use candidate::{Candidate, CandidateFlags};
pub use fuzzy::MatchKind;
pub use registry::{EntrySnapshot, Registry as CompletionRegistry};
pub use rule::{LongOpt, ResultMode, Rule as CompletionRule};
