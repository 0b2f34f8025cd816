//! Candidate source generators.
//!
//! Methods on [`Completer`] that turn one kind of shell object into
//! candidates: command names, rule arguments, variables, and `~user`
//! expansions. The orchestrator in `completer.rs` decides which of these
//! run; each generator only appends.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use super::candidate::{append_candidate, CandidateFlags};
use super::completer::Completer;
use super::fuzzy::{fuzzy_match, MatchKind};
use crate::expand::{self, ExpandFlags};
use crate::parser::tokenizer;

/// Wall-clock budget for enumerating system users. NIS and LDAP-backed
/// passwd databases can be arbitrarily slow.
const USER_ENUMERATION_BUDGET: Duration = Duration::from_millis(200);

/// Subshell helper queried for command descriptions, one call per request.
const DESCRIBE_COMMAND_HELPER: &str = "__tidesh_describe_command";

impl<'a> Completer<'a> {
    /// Complete a command name: executables on disk and in `PATH`, shell
    /// functions, and builtins, as the statement's decoration allows.
    pub(crate) fn complete_cmd(
        &mut self,
        raw_token: &str,
        use_function: bool,
        use_builtin: bool,
        use_command: bool,
    ) {
        if raw_token.is_empty() {
            return;
        }

        let host = self.host;
        let expand_flags = ExpandFlags {
            executables_only: true,
            fuzzy: self.flags.fuzzy_match,
            skip_wildcards: false,
        };

        if use_command {
            if expand::expand_token(&host.cwd(), raw_token, expand_flags, &mut self.candidates)
                && self.wants_descriptions()
            {
                self.complete_cmd_desc(raw_token);
            }
        }

        // Unqualified names also resolve through PATH and the name tables
        if !raw_token.contains('/') && !raw_token.starts_with('~') {
            if use_command {
                if let Some(path_var) = host.variable("PATH") {
                    for base in path_var.split(':').filter(|d| !d.is_empty()) {
                        let mut base_path = base.to_string();
                        if !base_path.ends_with('/') {
                            base_path.push('/');
                        }

                        let prefixed = format!("{}{}", base_path, raw_token);
                        let prev_count = self.candidates.len();
                        if expand::expand_token(
                            &host.cwd(),
                            &prefixed,
                            expand_flags,
                            &mut self.candidates,
                        ) {
                            // Replacing candidates carry the search
                            // directory; the user never typed it
                            for candidate in &mut self.candidates[prev_count..] {
                                if candidate.flags.replaces_token {
                                    if let Some(stripped) =
                                        candidate.text.strip_prefix(&base_path)
                                    {
                                        candidate.text = stripped.to_string();
                                    }
                                }
                            }
                        }
                    }
                    if self.wants_descriptions() {
                        self.complete_cmd_desc(raw_token);
                    }
                }
            }

            if use_function {
                let names = host.function_names(raw_token.starts_with('_'));
                self.complete_strings_raw(raw_token, &names, &|name| {
                    host.function_description(name).unwrap_or_default()
                });
            }

            if use_builtin {
                let names = host.builtin_names();
                self.complete_strings_raw(raw_token, &names, &|name| {
                    host.builtin_description(name).unwrap_or_default()
                });
            }
        }
    }

    /// Evaluate a rule's argument fragment and offer the results that match
    /// the current token.
    pub(crate) fn complete_from_args(
        &mut self,
        token_value: &str,
        args: &str,
        description: &str,
        flags: CandidateFlags,
    ) {
        if args.is_empty() {
            return;
        }
        let values = self.eval_args(args);
        let description = description.to_string();
        self.complete_strings(
            token_value,
            token_value.contains(['*', '?']),
            &values,
            &|_| description.clone(),
            flags,
        );
    }

    /// Evaluate a `complete -a` fragment into candidate strings.
    ///
    /// Plain words pass through unescaping; `$NAME` reads a variable;
    /// `$(...)` runs a subshell, silently skipped for autosuggestion where
    /// command substitution is forbidden.
    fn eval_args(&mut self, args: &str) -> Vec<String> {
        let mut out = Vec::new();
        for tok in tokenizer::tokenize(args) {
            let raw = &tok.text;

            if let Some(body) = raw.strip_prefix("$(").and_then(|r| r.strip_suffix(')')) {
                if self.flags.autosuggestion {
                    continue;
                }
                if let Ok((_, lines)) = self.host.exec_subshell(body) {
                    out.extend(lines);
                }
                continue;
            }

            if let Some(name) = raw.strip_prefix('$') {
                if !name.is_empty() && name.chars().all(tokenizer::is_variable_char) {
                    if let Some(value) = self.host.variable(name) {
                        out.push(value);
                    }
                    continue;
                }
            }

            if let Some(value) = tokenizer::unescape(raw, false) {
                out.push(value);
            }
        }
        out
    }

    /// Match a raw (still escaped) token against a set of names.
    fn complete_strings_raw(
        &mut self,
        raw_token: &str,
        names: &[String],
        desc_fn: &dyn Fn(&str) -> String,
    ) {
        let Some(pattern) = tokenizer::unescape(raw_token, true) else {
            return;
        };
        let is_glob = tokenizer::has_wildcard(raw_token);
        self.complete_strings(&pattern, is_glob, names, desc_fn, CandidateFlags::none());
    }

    /// Match an unescaped pattern against a set of names, appending suffix
    /// or whole-token candidates as the match quality dictates.
    fn complete_strings(
        &mut self,
        pattern: &str,
        pattern_is_glob: bool,
        names: &[String],
        desc_fn: &dyn Fn(&str) -> String,
        flags: CandidateFlags,
    ) {
        if pattern_is_glob {
            for name in names {
                if name.is_empty() {
                    continue;
                }
                if expand::wildcard_match_incomplete(name, pattern) {
                    append_candidate(
                        &mut self.candidates,
                        name.clone(),
                        desc_fn(name),
                        MatchKind::Exact,
                        CandidateFlags {
                            replaces_token: true,
                            ..flags
                        },
                    );
                }
            }
            return;
        }

        let limit = self.max_match_kind();
        for name in names {
            if name.is_empty() {
                continue;
            }
            let Some(kind) = fuzzy_match(pattern, name, limit) else {
                continue;
            };
            if kind.requires_full_replacement() {
                append_candidate(
                    &mut self.candidates,
                    name.clone(),
                    desc_fn(name),
                    kind,
                    CandidateFlags {
                        replaces_token: true,
                        ..flags
                    },
                );
            } else {
                append_candidate(
                    &mut self.candidates,
                    name[pattern.len()..].to_string(),
                    desc_fn(name),
                    kind,
                    flags,
                );
            }
        }
    }

    /// Patch command candidates with descriptions from one subshell call to
    /// the describe helper. Main thread only; autosuggestion suppresses it.
    pub(crate) fn complete_cmd_desc(&mut self, raw_token: &str) {
        if self.flags.autosuggestion {
            return;
        }

        let cmd_start = raw_token.rsplit('/').next().unwrap_or(raw_token);

        // A one-character lookup floods apropos-style backends
        if cmd_start.chars().count() < 2 || tokenizer::has_wildcard(cmd_start) {
            return;
        }

        // Nothing but directories means there is nothing to describe
        if self
            .candidates
            .iter()
            .all(|c| !c.text.is_empty() && c.text.ends_with('/'))
        {
            return;
        }

        let lookup_cmd = format!(
            "{} {}",
            DESCRIBE_COMMAND_HELPER,
            tokenizer::escape_string(cmd_start)
        );
        let Ok((_, lines)) = self.host.exec_subshell(&lookup_cmd) else {
            return;
        };

        let mut lookup: HashMap<String, String> = HashMap::new();
        for line in lines {
            // Lines come back as `name<TAB>description`; keys are stored
            // with the typed prefix stripped to match suffix candidates
            let Some(rest) = line.strip_prefix(cmd_start) else {
                continue;
            };
            let Some((key, value)) = rest.split_once('\t') else {
                continue;
            };
            let mut chars = value.chars();
            let value = match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => continue,
            };
            lookup.insert(key.to_string(), value);
        }

        for candidate in &mut self.candidates {
            if candidate.text.is_empty() {
                continue;
            }
            if let Some(description) = lookup.get(&candidate.text) {
                candidate.description = description.clone();
            }
        }
    }

    /// Complete a `$NAME` variable reference inside the current token.
    /// Returns whether anything matched.
    pub(crate) fn try_complete_variable(&mut self, raw_token: &str) -> bool {
        #[derive(PartialEq, Clone, Copy)]
        enum Mode {
            Unquoted,
            SingleQuoted,
            DoubleQuoted,
        }

        let chars: Vec<char> = raw_token.chars().collect();
        let mut mode = Mode::Unquoted;
        let mut variable_start: Option<usize> = None;

        let mut i = 0;
        while i < chars.len() {
            let c = chars[i];
            if !tokenizer::is_variable_char(c) {
                variable_start = None;
            }
            match c {
                '\\' => i += 1,
                '$' => {
                    // A dollar is live unless single-quoted
                    if mode != Mode::SingleQuoted {
                        variable_start = Some(i);
                    }
                }
                '\'' => match mode {
                    Mode::SingleQuoted => mode = Mode::Unquoted,
                    Mode::Unquoted => mode = Mode::SingleQuoted,
                    Mode::DoubleQuoted => {}
                },
                '"' => match mode {
                    Mode::DoubleQuoted => mode = Mode::Unquoted,
                    Mode::Unquoted => mode = Mode::DoubleQuoted,
                    Mode::SingleQuoted => {}
                },
                _ => {}
            }
            i += 1;
        }

        match variable_start {
            Some(start) if start + 1 < chars.len() => {
                let byte_start: usize = chars[..start + 1].iter().map(|c| c.len_utf8()).sum();
                self.complete_variable(raw_token, byte_start)
            }
            _ => false,
        }
    }

    /// Complete the variable name beginning at `start_offset` in the token.
    fn complete_variable(&mut self, whole_token: &str, start_offset: usize) -> bool {
        let var = &whole_token[start_offset..];
        let limit = self.max_match_kind();
        let host = self.host;

        let mut matched = false;
        for name in host.variable_names() {
            let Some(kind) = fuzzy_match(var, &name, limit) else {
                continue;
            };

            let (text, flags) = if kind.requires_full_replacement() {
                // The token up to the dollar is kept; everything after is
                // rewritten with the real name
                (
                    format!("{}{}", &whole_token[..start_offset], name),
                    CandidateFlags {
                        replaces_token: true,
                        dont_escape: true,
                        ..CandidateFlags::none()
                    },
                )
            } else {
                (name[var.len()..].to_string(), CandidateFlags::none())
            };

            let mut description = String::new();
            if self.wants_descriptions() {
                let Some(value) = host.variable(&name) else {
                    continue;
                };
                if !self.flags.autosuggestion {
                    description = format!("Variable: {}", tokenizer::escape_string(&value));
                }
            }

            append_candidate(&mut self.candidates, text, description, kind, flags);
            matched = true;
        }
        matched
    }

    /// Complete `~name` against the system user database. Enumeration is
    /// bounded by a wall-clock budget; hitting it counts as handled so the
    /// request finishes with whatever was found.
    pub(crate) fn try_complete_user(&mut self, raw_token: &str) -> bool {
        let Some(user_prefix) = raw_token.strip_prefix('~') else {
            return false;
        };
        if user_prefix.contains('/') || user_prefix.contains('~') {
            return false;
        }

        let host = self.host;
        let started = Instant::now();
        let mut matched = false;

        for name in host.users() {
            if started.elapsed() > USER_ENUMERATION_BUDGET {
                return true;
            }

            if name.starts_with(user_prefix) {
                append_candidate(
                    &mut self.candidates,
                    name[user_prefix.len()..].to_string(),
                    format!("Home for {}", name),
                    MatchKind::Exact,
                    CandidateFlags {
                        no_space: true,
                        ..CandidateFlags::none()
                    },
                );
                matched = true;
            } else if name.to_lowercase().starts_with(&user_prefix.to_lowercase()) {
                append_candidate(
                    &mut self.candidates,
                    format!("~{}", name),
                    format!("Home for {}", name),
                    MatchKind::Exact,
                    CandidateFlags {
                        replaces_token: true,
                        dont_escape: true,
                        no_space: true,
                        ..CandidateFlags::none()
                    },
                );
                matched = true;
            }
        }
        matched
    }
}
