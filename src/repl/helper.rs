//! Helper for rustyline providing completion from the engine.

use std::borrow::Cow;
use std::sync::Arc;

use rustyline::completion::{Completer, Pair};
use rustyline::highlight::Highlighter;
use rustyline::hint::Hinter;
use rustyline::validate::Validator;
use rustyline::Helper as RustyHelper;

use crate::complete::{CompletionEngine, RequestFlags};
use crate::env::SystemHost;
use crate::parser::tokenizer;

/// Helper for rustyline delegating completion to the engine.
pub struct ReplHelper {
    /// Completion engine shared with the rest of the shell
    engine: Arc<CompletionEngine>,

    /// Shell host the engine queries
    host: Arc<SystemHost>,

    /// Request flags derived from configuration
    flags: RequestFlags,
}

impl ReplHelper {
    /// Create a new REPL helper
    ///
    /// # Arguments
    /// * `engine` - Completion engine
    /// * `host` - Shell host
    /// * `flags` - Request flags applied to every interactive completion
    pub fn new(engine: Arc<CompletionEngine>, host: Arc<SystemHost>, flags: RequestFlags) -> Self {
        Self {
            engine,
            host,
            flags,
        }
    }
}

impl RustyHelper for ReplHelper {}

impl Completer for ReplHelper {
    type Candidate = Pair;

    /// Complete input at given position
    ///
    /// # Arguments
    /// * `line` - Current line
    /// * `pos` - Cursor position
    /// * `_ctx` - Readline context
    ///
    /// # Returns
    /// * `Result<(usize, Vec<Pair>)>` - Completion position and candidates
    fn complete(
        &self,
        line: &str,
        pos: usize,
        _ctx: &rustyline::Context<'_>,
    ) -> rustyline::Result<(usize, Vec<Pair>)> {
        let mut candidates = self
            .engine
            .complete(self.host.as_ref(), line, pos, self.flags);

        // The engine preserves match tags; the UI is what sorts
        if candidates.iter().all(|c| !c.flags.dont_sort) {
            candidates.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        }

        // rustyline replaces from a start position; token-suffix candidates
        // re-attach the token, whole-token candidates stand alone
        let (current, _) = tokenizer::token_extent(&line[..pos]);
        let start = current.start;

        let pairs = candidates
            .into_iter()
            .map(|c| {
                let mut replacement = if c.flags.replaces_token {
                    c.text.clone()
                } else {
                    format!("{}{}", current.text, c.text)
                };
                if !c.flags.no_space {
                    replacement.push(' ');
                }

                let display = if c.description.is_empty() {
                    c.text.clone()
                } else {
                    format!("{}  ({})", c.text, c.description)
                };

                Pair {
                    display,
                    replacement,
                }
            })
            .collect();

        Ok((start, pairs))
    }
}

impl Hinter for ReplHelper {
    type Hint = String;

    fn hint(&self, _line: &str, _pos: usize, _ctx: &rustyline::Context<'_>) -> Option<String> {
        None
    }
}

impl Highlighter for ReplHelper {
    fn highlight<'l>(&self, line: &'l str, _pos: usize) -> Cow<'l, str> {
        Cow::Borrowed(line)
    }
}

impl Validator for ReplHelper {}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_helper() -> ReplHelper {
        let engine = Arc::new(CompletionEngine::new(vec![]));
        let argv: Vec<String> = "-c foo -s v -l verbose"
            .split_whitespace()
            .map(str::to_string)
            .collect();
        engine.run_builtin(&argv).unwrap();
        ReplHelper::new(engine, Arc::new(SystemHost::new()), RequestFlags::default())
    }

    #[test]
    fn test_suffix_candidates_reattach_token() {
        let helper = create_test_helper();
        let history = rustyline::history::DefaultHistory::new();
        let ctx = rustyline::Context::new(&history);

        let (start, pairs) = helper.complete("foo --ver", 9, &ctx).unwrap();
        assert_eq!(start, 4);
        assert!(pairs.iter().any(|p| p.replacement == "--verbose "));
    }
}
