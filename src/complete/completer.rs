//! The per-request completion orchestrator.
//!
//! One [`Completer`] lives for exactly one request: it decides which
//! generators run, in what order, and merges their output. The registry is
//! only ever consulted through snapshots, so user-supplied condition
//! scripts run without any engine lock held.

use std::collections::HashMap;

use tracing::debug;

use super::autoload::Autoloader;
use super::candidate::{append_candidate, Candidate};
use super::fuzzy::MatchKind;
use super::matcher;
use super::registry::Registry;
use super::RequestFlags;
use crate::env::ShellHost;
use crate::expand::{self, ExpandFlags};
use crate::parser::statement::{self, Decoration};
use crate::parser::tokenizer;

/// State of one completion request.
pub(crate) struct Completer<'a> {
    pub(crate) registry: &'a Registry,
    pub(crate) autoloader: &'a Autoloader,
    pub(crate) host: &'a dyn ShellHost,
    pub(crate) flags: RequestFlags,
    pub(crate) candidates: Vec<Candidate>,
    /// Conditions already evaluated during this request
    condition_cache: HashMap<String, bool>,
}

/// Run one completion request. This is the engine's single entry point for
/// producing candidates; it never fails, it just produces fewer of them.
pub(crate) fn run(
    registry: &Registry,
    autoloader: &Autoloader,
    host: &dyn ShellHost,
    line: &str,
    cursor: usize,
    flags: RequestFlags,
) -> Vec<Candidate> {
    let mut cursor = cursor.min(line.len());
    while !line.is_char_boundary(cursor) {
        cursor -= 1;
    }
    let truncated = &line[..cursor];

    // Narrow to the innermost command substitution holding the cursor
    let (sub_start, sub_end) = statement::cmdsubst_extent(truncated, truncated.len());
    let src = &truncated[sub_start..sub_end];
    let pos = src.len();

    let mut completer = Completer {
        registry,
        autoloader,
        host,
        flags,
        candidates: Vec::new(),
        condition_cache: HashMap::new(),
    };

    let (current, _prev) = tokenizer::token_extent(src);

    // Variable and ~user completion win outright when they produce anything
    let done = completer.try_complete_variable(&current.text)
        || completer.try_complete_user(&current.text);

    if !done {
        // Backtrack past trailing spaces when locating the statement
        let mut adjusted_pos = pos;
        while adjusted_pos > 0 && src.as_bytes()[adjusted_pos - 1] == b' ' {
            adjusted_pos -= 1;
        }

        match statement::plain_statement_at(src, adjusted_pos) {
            None => {
                // Loop header or similar: plain path completion only. An
                // autosuggestion that had to backtrack is on fresh
                // whitespace and gets nothing.
                let no_file = flags.autosuggestion && adjusted_pos < pos;
                completer.complete_param_expand(&current.text, !no_file);
            }
            Some(st) => {
                let (use_command, use_function, use_builtin) = match st.decoration {
                    Decoration::None => (true, true, true),
                    Decoration::Command => (true, false, false),
                    Decoration::Builtin => (false, false, true),
                };

                let in_command_word = match st.command() {
                    Some(cmd_tok) => cmd_tok.contains_or_ends_at(pos),
                    None => true,
                };

                if in_command_word {
                    completer.complete_cmd(&current.text, use_function, use_builtin, use_command);
                } else {
                    let cmd_tok = st.command().cloned();
                    let args = st.arguments();

                    let prev_raw = args
                        .iter()
                        .rev()
                        .find(|t| t.end <= current.start)
                        .map(|t| t.text.clone())
                        .unwrap_or_default();

                    // A lone `--` before the cursor ends option processing
                    let had_ddash = args
                        .iter()
                        .any(|t| t.end <= current.start && t.text == "--");

                    let cmd_value = cmd_tok
                        .as_ref()
                        .and_then(|t| tokenizer::unescape(&t.text, false));
                    let prev_value = tokenizer::unescape(&prev_raw, false);
                    let current_value = tokenizer::unescape(&current.text, true);

                    let mut do_file = false;
                    if let (Some(cmd_value), Some(prev_value), Some(current_value)) =
                        (cmd_value, prev_value, current_value.as_ref())
                    {
                        do_file = completer.complete_param(
                            &cmd_value,
                            &prev_value,
                            current_value,
                            !had_ddash,
                        );
                    }

                    // With no command-specific candidates at all, files are
                    // the last resort
                    if completer.candidates.is_empty() {
                        do_file = true;
                    }

                    if flags.autosuggestion
                        && current_value.as_deref().unwrap_or_default().is_empty()
                    {
                        do_file = false;
                    }

                    completer.complete_param_expand(&current.text, do_file);
                }
            }
        }
    }

    completer.candidates
}

impl<'a> Completer<'a> {
    pub(crate) fn wants_descriptions(&self) -> bool {
        self.flags.descriptions
    }

    /// The worst match quality this request accepts.
    pub(crate) fn max_match_kind(&self) -> MatchKind {
        if self.flags.fuzzy_match {
            MatchKind::Subsequence
        } else {
            MatchKind::PrefixIcase
        }
    }

    /// Evaluate a rule condition, memoized per request. Autosuggestion must
    /// not execute user code, so every condition is false there.
    pub(crate) fn condition_test(&mut self, condition: &str) -> bool {
        if condition.is_empty() {
            return true;
        }
        if self.flags.autosuggestion {
            return false;
        }
        if let Some(&cached) = self.condition_cache.get(condition) {
            return cached;
        }
        let result = matches!(self.host.exec_subshell(condition), Ok((0, _)));
        self.condition_cache.insert(condition.to_string(), result);
        result
    }

    /// Rule-driven completion of the argument `tok` of command `cmd_orig`,
    /// with `popt` the preceding argument. Returns whether file expansion
    /// should still run.
    pub(crate) fn complete_param(
        &mut self,
        cmd_orig: &str,
        popt: &str,
        tok: &str,
        use_switches: bool,
    ) -> bool {
        let basename = cmd_orig.rsplit('/').next().unwrap_or(cmd_orig).to_string();
        let path = expand::resolve_command_path(
            cmd_orig,
            self.host.variable("PATH").as_deref(),
            &self.host.cwd(),
        )
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

        if self.flags.autosuggestion {
            // Off the main thread: ask for a load once, use what exists now
            if !self.autoloader.has_tried(&basename) {
                self.autoloader.request_load(&basename);
            }
        } else {
            self.autoloader.load(self.registry, &basename, true);
        }

        let snapshot = self.registry.snapshot_matching(&basename, &path);

        let mut use_files = true;
        for entry in &snapshot {
            let mut use_common = true;

            if use_switches {
                if tok.starts_with('-') {
                    // Combined option and argument, -I/usr/include or
                    // --color=auto
                    for rule in &entry.rules {
                        let Some(arg) = matcher::attached_argument(rule, tok) else {
                            continue;
                        };
                        if self.condition_test(&rule.condition) {
                            if rule.mode.requires_argument() {
                                use_common = false;
                            }
                            if rule.mode.suppresses_files() {
                                use_files = false;
                            }
                            self.complete_from_args(arg, &rule.args, &rule.description, rule.flags);
                        }
                    }
                } else if popt.starts_with('-') {
                    // Old-style options are checked first; one match
                    // consumes the previous token entirely
                    let mut old_style_match = false;
                    for rule in &entry.rules {
                        if matcher::match_old(rule, popt) && self.condition_test(&rule.condition) {
                            old_style_match = true;
                            if rule.mode.requires_argument() {
                                use_common = false;
                            }
                            if rule.mode.suppresses_files() {
                                use_files = false;
                            }
                            self.complete_from_args(tok, &rule.args, &rule.description, rule.flags);
                        }
                    }

                    if !old_style_match {
                        for rule in &entry.rules {
                            // A GNU option with an optional argument takes
                            // it attached in the same token, never in the
                            // next one
                            if rule.long.as_ref().is_some_and(|l| !l.old_style)
                                && !rule.mode.requires_argument()
                            {
                                continue;
                            }
                            if matcher::match_short_or_gnu(rule, popt)
                                && self.condition_test(&rule.condition)
                            {
                                if rule.mode.requires_argument() {
                                    use_common = false;
                                }
                                if rule.mode.suppresses_files() {
                                    use_files = false;
                                }
                                self.complete_from_args(
                                    tok,
                                    &rule.args,
                                    &rule.description,
                                    rule.flags,
                                );
                            }
                        }
                    }
                }
            }

            if use_common {
                for rule in &entry.rules {
                    if !self.condition_test(&rule.condition) {
                        continue;
                    }

                    if rule.is_argument_rule() {
                        use_files = use_files && !rule.mode.suppresses_files();
                        self.complete_from_args(tok, &rule.args, &rule.description, rule.flags);
                    }

                    if !tok.is_empty() && use_switches {
                        if let Some(short) = rule.short {
                            if matcher::bundle_ends_with(tok, short, &entry.short_opt_str) {
                                // The token already spells the option; offer
                                // its description with nothing to append
                                append_candidate(
                                    &mut self.candidates,
                                    "",
                                    &rule.description,
                                    MatchKind::Exact,
                                    rule.flags,
                                );
                            } else if matcher::short_bundle_ok(tok, short, &entry.short_opt_str) {
                                append_candidate(
                                    &mut self.candidates,
                                    short.to_string(),
                                    &rule.description,
                                    MatchKind::Exact,
                                    rule.flags,
                                );
                            }
                        }

                        if let Some(whole) = rule.spelled_long() {
                            self.complete_long_option(rule, &whole, tok);
                        }
                    }
                }
            }
        }

        use_files
    }

    /// Offer the remainder of a long option the token prefixes.
    fn complete_long_option(&mut self, rule: &super::rule::Rule, whole: &str, tok: &str) {
        let match_cs = whole.starts_with(tok);
        let match_icase =
            !match_cs && whole.to_lowercase().starts_with(&tok.to_lowercase());
        if !match_cs && !match_icase {
            return;
        }

        let (offset, kind, flags) = if match_cs {
            let kind = if whole == tok {
                MatchKind::Exact
            } else {
                MatchKind::Prefix
            };
            (tok.len(), kind, rule.flags)
        } else {
            let mut flags = rule.flags;
            flags.replaces_token = true;
            (0, MatchKind::PrefixIcase, flags)
        };

        let has_arg = !rule.args.is_empty();
        let req_arg = rule.mode.requires_argument();
        let old_style = rule.long.as_ref().map(|l| l.old_style).unwrap_or(false);

        // An optional argument can only be supplied inline, so also offer
        // the `=` form
        if !old_style && has_arg && !req_arg {
            append_candidate(
                &mut self.candidates,
                format!("{}=", &whole[offset..]),
                &rule.description,
                kind,
                flags,
            );
        }

        append_candidate(
            &mut self.candidates,
            whole[offset..].to_string(),
            &rule.description,
            kind,
            flags,
        );
    }

    /// File and path completion of the current token, honoring the request
    /// mode.
    pub(crate) fn complete_param_expand(&mut self, raw_token: &str, do_file: bool) {
        // In --opt=value, the value is what gets completed
        let comp = if raw_token.starts_with("--") {
            match raw_token.find('=') {
                Some(eq) => &raw_token[eq + 1..],
                None => raw_token,
            }
        } else {
            raw_token
        };

        // A leading dash is an option, not a sloppy file name
        let flags = ExpandFlags {
            executables_only: false,
            fuzzy: self.flags.fuzzy_match && !raw_token.starts_with('-'),
            skip_wildcards: !do_file,
        };

        if !expand::expand_token(&self.host.cwd(), comp, flags, &mut self.candidates) {
            debug!("error while expanding {:?}", comp);
        }
    }
}
