//! Re-emit the registry as `complete` commands.
//!
//! The output is a valid script: feeding every line back through the
//! `complete` builtin reconstructs the registry.

use super::registry::Registry;
use super::rule::ResultMode;
use crate::parser::tokenizer::escape_string;

/// Mode suffixes indexed by [`ResultMode::index`].
const MODE_SWITCHES: [&str; 4] = ["", " --no-files", " --require-parameter", " --exclusive"];

/// Append ` --{switch} {escaped argument}`, skipping empty arguments.
fn append_switch(out: &mut String, switch: &str, argument: &str) {
    if argument.is_empty() {
        return;
    }
    out.push_str(" --");
    out.push_str(switch);
    out.push(' ');
    out.push_str(&escape_string(argument));
}

/// Serialize the whole registry, entries in creation order, one `complete`
/// line per rule.
///
/// Rules print oldest first. Re-adding them in that order prepends each in
/// turn, so the reconstructed registry carries the same most-recent-first
/// rule order as the original.
pub fn print_registry(registry: &Registry) -> String {
    let mut out = String::new();
    for entry in registry.snapshot_all() {
        for rule in entry.rules.iter().rev() {
            out.push_str("complete");
            out.push_str(MODE_SWITCHES[rule.mode.index()]);

            append_switch(
                &mut out,
                if entry.is_path { "path" } else { "command" },
                &entry.cmd,
            );

            if let Some(short) = rule.short {
                out.push_str(&format!(" --short-option '{}'", short));
            }
            if let Some(long) = &rule.long {
                append_switch(
                    &mut out,
                    if long.old_style { "old-option" } else { "long-option" },
                    &long.name,
                );
            }

            append_switch(&mut out, "description", &rule.description);
            append_switch(&mut out, "arguments", &rule.args);
            append_switch(&mut out, "condition", &rule.condition);

            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complete::candidate::CandidateFlags;
    use crate::complete::rule::{LongOpt, Rule};

    fn rule(short: Option<char>, long: Option<(&str, bool)>, mode: ResultMode) -> Rule {
        Rule {
            short,
            long: long.map(|(name, old_style)| LongOpt {
                name: name.to_string(),
                old_style,
            }),
            mode,
            condition: String::new(),
            args: String::new(),
            description: String::new(),
            flags: CandidateFlags::none(),
        }
    }

    #[test]
    fn test_minimal_line() {
        let reg = Registry::new();
        reg.add("foo", false, rule(Some('v'), None, ResultMode::Shared));
        assert_eq!(
            print_registry(&reg),
            "complete --command foo --short-option 'v'\n"
        );
    }

    #[test]
    fn test_full_line() {
        let reg = Registry::new();
        let mut r = rule(Some('x'), Some(("extra", false)), ResultMode::Exclusive);
        r.description = "be loud".to_string();
        r.args = "one two".to_string();
        r.condition = "test -f x".to_string();
        reg.add("foo", false, r);

        assert_eq!(
            print_registry(&reg),
            "complete --exclusive --command foo --short-option 'x' \
             --long-option extra --description 'be loud' --arguments 'one two' \
             --condition 'test -f x'\n"
        );
    }

    #[test]
    fn test_path_entry_and_old_option() {
        let reg = Registry::new();
        reg.add(
            "/usr/bin/foo",
            true,
            rule(None, Some(("follow", true)), ResultMode::NoCommon),
        );
        assert_eq!(
            print_registry(&reg),
            "complete --require-parameter --path /usr/bin/foo --old-option follow\n"
        );
    }

    #[test]
    fn test_entries_in_creation_order() {
        let reg = Registry::new();
        reg.add("zzz", false, rule(Some('a'), None, ResultMode::Shared));
        reg.add("aaa", false, rule(Some('b'), None, ResultMode::Shared));
        let out = print_registry(&reg);
        let zzz = out.find("zzz").unwrap();
        let aaa = out.find("aaa").unwrap();
        assert!(zzz < aaa);
    }
}
