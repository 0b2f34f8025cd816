//! Process-wide store of per-command completion rules.
//!
//! Two locks guard the store: the entry-map mutex protecting the set of
//! command entries, and each entry's inner lock protecting its rule list and
//! short-option string. The map lock is always acquired before any entry
//! lock, never the reverse. Completion requests never iterate live entries;
//! they copy snapshots out so that user-supplied condition scripts (which
//! may call back into the registry) run outside all locks.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, RwLock};

use super::rule::Rule;
use crate::expand::wildcard_match;

/// Key of a command entry.
///
/// The derived ordering puts non-path entries before path entries, then
/// sorts by command string; it exists for duplicate detection, not for
/// iteration output (the serializer orders by insertion instead).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct EntryKey {
    /// Match against the resolved absolute path instead of the basename
    pub is_path: bool,
    /// Command pattern; may contain wildcards
    pub cmd: String,
}

/// Mutable guts of a command entry, guarded by the entry lock.
#[derive(Debug, Default)]
struct EntryState {
    /// Rules, most recently added first
    rules: Vec<Rule>,
    /// Projection of the rules' short options; `:` marks "takes argument"
    short_opt_str: String,
    /// Unknown options are errors when set
    authoritative: bool,
}

/// A command entry: creation order plus locked state.
#[derive(Debug)]
struct CommandEntry {
    /// Creation order, used only for deterministic serialization
    order: u32,
    state: RwLock<EntryState>,
}

/// Copy of one entry's matching state, safe to use without locks.
#[derive(Debug, Clone)]
pub struct EntrySnapshot {
    pub cmd: String,
    pub is_path: bool,
    pub authoritative: bool,
    pub short_opt_str: String,
    pub rules: Vec<Rule>,
}

/// The rule registry.
#[derive(Debug, Default)]
pub struct Registry {
    /// Entry map; lock order is this mutex first, then an entry's state lock
    entries: Mutex<BTreeMap<EntryKey, Arc<CommandEntry>>>,
    /// Next entry creation order
    next_order: AtomicU32,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule for `cmd`, creating the entry if needed. The rule lands at
    /// the front of the list so the most recently added rule matches first;
    /// completion files loaded later must shadow rules installed at startup.
    pub fn add(&self, cmd: &str, cmd_is_path: bool, rule: Rule) {
        debug_assert!(!cmd.is_empty(), "completion added for empty command");
        if cmd.is_empty() {
            return;
        }

        // Both locks stay held across the mutation so a racing remove
        // cannot drop the entry out from under the new rule
        let mut entries = self.entries.lock().unwrap();
        let key = EntryKey {
            is_path: cmd_is_path,
            cmd: cmd.to_string(),
        };
        let entry = Arc::clone(entries.entry(key).or_insert_with(|| {
            Arc::new(CommandEntry {
                order: self.next_order.fetch_add(1, Ordering::Relaxed),
                state: RwLock::new(EntryState::default()),
            })
        }));

        let mut state = entry.state.write().unwrap();
        if let Some(short) = rule.short {
            state.short_opt_str.push(short);
            if rule.mode.requires_argument() {
                state.short_opt_str.push(':');
            }
        }
        state.rules.insert(0, rule);
    }

    /// Remove rules for `cmd`. With both options absent, every rule goes;
    /// otherwise every rule whose short option equals `short` or whose long
    /// option equals `long` is deleted. An entry left without rules is
    /// dropped entirely.
    pub fn remove(&self, cmd: &str, cmd_is_path: bool, short: Option<char>, long: Option<&str>) {
        let mut entries = self.entries.lock().unwrap();
        let key = EntryKey {
            is_path: cmd_is_path,
            cmd: cmd.to_string(),
        };
        let Some(entry) = entries.get(&key) else {
            return;
        };

        let now_empty = {
            let mut state = entry.state.write().unwrap();
            if short.is_none() && long.is_none() {
                state.rules.clear();
            } else {
                let doomed: Vec<Rule> = state
                    .rules
                    .iter()
                    .filter(|r| {
                        (short.is_some() && r.short == short)
                            || (long.is_some()
                                && r.long.as_ref().map(|l| l.name.as_str()) == long)
                    })
                    .cloned()
                    .collect();
                for rule in &doomed {
                    if let Some(c) = rule.short {
                        remove_short_opt(&mut state.short_opt_str, c);
                    }
                }
                state.rules.retain(|r| {
                    !((short.is_some() && r.short == short)
                        || (long.is_some() && r.long.as_ref().map(|l| l.name.as_str()) == long))
                });
            }
            state.rules.is_empty()
        };

        if now_empty {
            entries.remove(&key);
        }
    }

    /// Set whether unknown options are errors for `cmd`. Creates the entry
    /// when absent, like `add`.
    pub fn set_authoritative(&self, cmd: &str, cmd_is_path: bool, authoritative: bool) {
        debug_assert!(!cmd.is_empty(), "authoritative set for empty command");
        if cmd.is_empty() {
            return;
        }

        let mut entries = self.entries.lock().unwrap();
        let key = EntryKey {
            is_path: cmd_is_path,
            cmd: cmd.to_string(),
        };
        let entry = Arc::clone(entries.entry(key).or_insert_with(|| {
            Arc::new(CommandEntry {
                order: self.next_order.fetch_add(1, Ordering::Relaxed),
                state: RwLock::new(EntryState::default()),
            })
        }));
        entry.state.write().unwrap().authoritative = authoritative;
    }

    /// Copy out every entry whose command pattern glob-matches the basename
    /// (non-path entries) or the resolved path (path entries) of the typed
    /// command.
    pub fn snapshot_matching(&self, cmd_basename: &str, cmd_path: &str) -> Vec<EntrySnapshot> {
        let entries = self.entries.lock().unwrap();
        let mut out = Vec::new();
        for (key, entry) in entries.iter() {
            let subject = if key.is_path { cmd_path } else { cmd_basename };
            if !wildcard_match(subject, &key.cmd) {
                continue;
            }
            let state = entry.state.read().unwrap();
            out.push(EntrySnapshot {
                cmd: key.cmd.clone(),
                is_path: key.is_path,
                authoritative: state.authoritative,
                short_opt_str: state.short_opt_str.clone(),
                rules: state.rules.clone(),
            });
        }
        out
    }

    /// Copy out every entry in creation order, for serialization.
    pub fn snapshot_all(&self) -> Vec<EntrySnapshot> {
        let entries = self.entries.lock().unwrap();
        let mut keyed: Vec<(u32, EntrySnapshot)> = entries
            .iter()
            .map(|(key, entry)| {
                let state = entry.state.read().unwrap();
                (
                    entry.order,
                    EntrySnapshot {
                        cmd: key.cmd.clone(),
                        is_path: key.is_path,
                        authoritative: state.authoritative,
                        short_opt_str: state.short_opt_str.clone(),
                        rules: state.rules.clone(),
                    },
                )
            })
            .collect();
        keyed.sort_by_key(|(order, _)| *order);
        keyed.into_iter().map(|(_, snap)| snap).collect()
    }

    /// Number of command entries. Test and diagnostics helper.
    pub fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Erase one occurrence of `c` from the short-option string, together with
/// every colon following it. When two rules share the character, the run of
/// colons between their occurrences is dropped wholesale; removal deletes
/// all rules carrying the character anyway, so every occurrence goes.
fn remove_short_opt(short_opt_str: &mut String, c: char) {
    if let Some(idx) = short_opt_str.find(c) {
        let mut end = idx + c.len_utf8();
        while short_opt_str[end..].starts_with(':') {
            end += 1;
        }
        short_opt_str.replace_range(idx..end, "");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complete::candidate::CandidateFlags;
    use crate::complete::rule::{LongOpt, ResultMode};

    fn rule(short: Option<char>, long: Option<&str>, mode: ResultMode) -> Rule {
        Rule {
            short,
            long: long.map(|name| LongOpt {
                name: name.to_string(),
                old_style: false,
            }),
            mode,
            condition: String::new(),
            args: String::new(),
            description: String::new(),
            flags: CandidateFlags::none(),
        }
    }

    #[test]
    fn test_add_builds_short_opt_str() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("foo", false, rule(Some('b'), None, ResultMode::NoCommon));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert_eq!(snap.short_opt_str, "ab:");
    }

    #[test]
    fn test_rules_are_lifo() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("foo", false, rule(Some('b'), None, ResultMode::Shared));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert_eq!(snap.rules[0].short, Some('b'));
        assert_eq!(snap.rules[1].short, Some('a'));
    }

    #[test]
    fn test_remove_all_drops_entry() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("foo", false, rule(Some('b'), None, ResultMode::Shared));
        reg.remove("foo", false, None, None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_remove_by_short_updates_projection() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::NoCommon));
        reg.add("foo", false, rule(Some('b'), None, ResultMode::Shared));
        reg.remove("foo", false, Some('a'), None);
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert_eq!(snap.short_opt_str, "b");
        assert_eq!(snap.rules.len(), 1);
    }

    #[test]
    fn test_remove_by_long_matches_either_spelling() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('v'), Some("verbose"), ResultMode::Shared));
        reg.add("foo", false, rule(Some('q'), Some("quiet"), ResultMode::Shared));
        reg.remove("foo", false, None, Some("verbose"));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert_eq!(snap.rules.len(), 1);
        assert_eq!(snap.rules[0].short, Some('q'));
        assert_eq!(snap.short_opt_str, "q");
    }

    #[test]
    fn test_remove_deletes_every_match() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("foo", false, rule(Some('a'), Some("all"), ResultMode::Shared));
        reg.remove("foo", false, Some('a'), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_last_rule_removal_drops_entry() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::Shared));
        reg.remove("foo", false, Some('a'), None);
        assert!(reg.is_empty());
    }

    #[test]
    fn test_authoritative_round_trip() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::Shared));
        reg.set_authoritative("foo", false, true);
        assert!(reg.snapshot_matching("foo", "")[0].authoritative);
        reg.set_authoritative("foo", false, false);
        assert!(!reg.snapshot_matching("foo", "")[0].authoritative);
    }

    #[test]
    fn test_path_and_basename_matching() {
        let reg = Registry::new();
        reg.add("git", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("/usr/bin/git", true, rule(Some('b'), None, ResultMode::Shared));

        let snaps = reg.snapshot_matching("git", "/usr/bin/git");
        assert_eq!(snaps.len(), 2);

        let snaps = reg.snapshot_matching("git", "/opt/git");
        assert_eq!(snaps.len(), 1);
        assert!(!snaps[0].is_path);
    }

    #[test]
    fn test_wildcard_command_pattern() {
        let reg = Registry::new();
        reg.add("git*", false, rule(Some('a'), None, ResultMode::Shared));
        assert_eq!(reg.snapshot_matching("gitk", "").len(), 1);
        assert_eq!(reg.snapshot_matching("hg", "").len(), 0);
    }

    #[test]
    fn test_snapshot_all_in_creation_order() {
        let reg = Registry::new();
        reg.add("zzz", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("aaa", false, rule(Some('b'), None, ResultMode::Shared));
        let all = reg.snapshot_all();
        assert_eq!(all[0].cmd, "zzz");
        assert_eq!(all[1].cmd, "aaa");
    }

    #[test]
    fn test_projection_matches_rules_after_churn() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('a'), None, ResultMode::NoCommon));
        reg.add("foo", false, rule(Some('b'), None, ResultMode::Shared));
        reg.add("foo", false, rule(Some('c'), None, ResultMode::Exclusive));
        reg.remove("foo", false, Some('b'), None);

        let snap = &reg.snapshot_matching("foo", "")[0];
        let mut expected = String::new();
        for r in snap.rules.iter().rev() {
            if let Some(c) = r.short {
                expected.push(c);
                if r.mode.requires_argument() {
                    expected.push(':');
                }
            }
        }
        assert_eq!(snap.short_opt_str, expected);
    }
}
