//! Wildcard matching and filesystem completion.
//!
//! The completion engine treats this module as a collaborator: given a
//! half-typed token it produces candidate file and directory names, honoring
//! the request's fuzzy settings, and it provides the glob matcher used for
//! command patterns and `complete -a` argument filtering.

use std::fs;
use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::complete::candidate::{append_candidate, Candidate, CandidateFlags};
use crate::complete::fuzzy::{fuzzy_match, MatchKind};
use crate::parser::tokenizer;

/// Settings for one expansion.
#[derive(Debug, Clone, Copy, Default)]
pub struct ExpandFlags {
    /// Only report directories and executable files
    pub executables_only: bool,
    /// Allow all match kinds instead of capping at case-insensitive prefix
    pub fuzzy: bool,
    /// Disable wildcard and completion output entirely
    pub skip_wildcards: bool,
}

/// Match `s` against a glob `pattern` (`*` and `?`).
pub fn wildcard_match(s: &str, pattern: &str) -> bool {
    fn inner(s: &[char], p: &[char]) -> bool {
        match p.split_first() {
            None => s.is_empty(),
            Some(('*', rest)) => {
                (0..=s.len()).any(|skip| inner(&s[skip..], rest))
            }
            Some(('?', rest)) => match s.split_first() {
                Some((_, s_rest)) => inner(s_rest, rest),
                None => false,
            },
            Some((c, rest)) => match s.split_first() {
                Some((sc, s_rest)) => sc == c && inner(s_rest, rest),
                None => false,
            },
        }
    }
    let s: Vec<char> = s.chars().collect();
    let p: Vec<char> = pattern.chars().collect();
    inner(&s, &p)
}

/// Match with an implicit trailing `*`, for half-typed glob tokens.
pub fn wildcard_match_incomplete(s: &str, pattern: &str) -> bool {
    let mut extended = pattern.to_string();
    if !extended.ends_with('*') {
        extended.push('*');
    }
    wildcard_match(s, &extended)
}

/// Expand the raw token `token` into filesystem candidates, appended to
/// `out`. Relative paths resolve against `cwd`. Returns `false` when the
/// directory could not be read (the caller logs and moves on).
pub fn expand_token(cwd: &Path, token: &str, flags: ExpandFlags, out: &mut Vec<Candidate>) -> bool {
    if flags.skip_wildcards {
        return true;
    }

    let Some(value) = tokenizer::unescape(token, true) else {
        return false;
    };

    let (dir_prefix, name_part) = match value.rfind('/') {
        Some(idx) => (&value[..idx + 1], &value[idx + 1..]),
        None => ("", value.as_str()),
    };

    let dir = match resolve_dir(cwd, dir_prefix) {
        Some(dir) => dir,
        None => return false,
    };

    let entries = match fs::read_dir(&dir) {
        Ok(entries) => entries,
        Err(err) => {
            debug!("cannot read {:?}: {}", dir, err);
            return false;
        }
    };

    let pattern_is_glob = tokenizer::has_wildcard(name_part);
    let limit = if flags.fuzzy {
        MatchKind::Subsequence
    } else {
        MatchKind::PrefixIcase
    };

    for entry in entries.flatten() {
        let name = entry.file_name().to_string_lossy().into_owned();

        // Hidden entries only when explicitly asked for
        if name.starts_with('.') && !name_part.starts_with('.') {
            continue;
        }

        let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
        if flags.executables_only && !is_dir && !is_executable(&entry.path()) {
            continue;
        }

        let display = if is_dir {
            format!("{}/", name)
        } else {
            name.clone()
        };

        if pattern_is_glob {
            if wildcard_match_incomplete(&name, name_part) {
                append_candidate(
                    out,
                    format!("{}{}", dir_prefix, display),
                    "",
                    MatchKind::Exact,
                    CandidateFlags {
                        replaces_token: true,
                        auto_space: true,
                        ..CandidateFlags::none()
                    },
                );
            }
            continue;
        }

        let Some(kind) = fuzzy_match(name_part, &name, limit) else {
            continue;
        };
        if kind.requires_full_replacement() {
            append_candidate(
                out,
                format!("{}{}", dir_prefix, display),
                "",
                kind,
                CandidateFlags {
                    replaces_token: true,
                    auto_space: true,
                    ..CandidateFlags::none()
                },
            );
        } else {
            append_candidate(
                out,
                display[name_part.len()..].to_string(),
                "",
                kind,
                CandidateFlags::auto_space(),
            );
        }
    }

    true
}

/// Resolve the directory a token's leading path refers to.
fn resolve_dir(cwd: &Path, dir_prefix: &str) -> Option<PathBuf> {
    if dir_prefix.is_empty() {
        return Some(cwd.to_path_buf());
    }
    if let Some(rest) = dir_prefix.strip_prefix("~/") {
        return dirs::home_dir().map(|home| home.join(rest));
    }
    if dir_prefix.starts_with('~') {
        // ~user/ paths are handled by user completion, not here
        return None;
    }
    if dir_prefix.starts_with('/') {
        return Some(PathBuf::from(dir_prefix));
    }
    Some(cwd.join(dir_prefix))
}

/// Search `path_var` (a `:`-separated `PATH` value) for an executable named
/// `cmd`; commands containing a slash resolve directly against `cwd`.
pub fn resolve_command_path(cmd: &str, path_var: Option<&str>, cwd: &Path) -> Option<PathBuf> {
    if cmd.is_empty() {
        return None;
    }
    if cmd.contains('/') {
        let direct = if cmd.starts_with('/') {
            PathBuf::from(cmd)
        } else {
            cwd.join(cmd)
        };
        return if is_executable(&direct) {
            Some(direct)
        } else {
            None
        };
    }

    for dir in path_var?.split(':').filter(|d| !d.is_empty()) {
        let candidate = Path::new(dir).join(cmd);
        if is_executable(&candidate) {
            return Some(candidate);
        }
    }
    None
}

fn is_executable(path: &Path) -> bool {
    fs::metadata(path)
        .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}
