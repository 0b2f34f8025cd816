//! The `complete` builtin: the shell surface of the rule registry.
//!
//! Every switch maps 1:1 to a registry operation. Invoked with no arguments
//! at all, the builtin prints the registry as a script instead.

use tracing::debug;

use super::candidate::CandidateFlags;
use super::registry::Registry;
use super::rule::{LongOpt, ResultMode, Rule};
use super::serializer::print_registry;
use crate::error::{ParseError, Result};

/// Parsed form of one `complete` invocation.
#[derive(Debug, Default)]
struct CompleteCmd {
    /// Target commands with their `is_path` flag
    commands: Vec<(String, bool)>,
    shorts: Vec<char>,
    /// Long options with their old-style flag, GNU first
    longs: Vec<(String, bool)>,
    condition: Option<String>,
    args: Option<String>,
    description: Option<String>,
    no_files: bool,
    requires_argument: bool,
    authoritative: Option<bool>,
    erase: bool,
}

/// Run the `complete` builtin against `registry`.
///
/// `argv` holds the already-unescaped arguments after the builtin name.
/// Returns the registry printout when invoked bare.
pub fn run_complete_builtin(registry: &Registry, argv: &[String]) -> Result<Option<String>> {
    if argv.is_empty() {
        return Ok(Some(print_registry(registry)));
    }

    let cmd = parse_args(argv)?;

    if cmd.commands.is_empty() {
        return Err(ParseError::InvalidBuiltin(
            "complete: no command specified (use --command or --path)".to_string(),
        )
        .into());
    }

    // Pair the i-th short option with the i-th long option so
    // `-s v -l verbose` becomes one rule with both spellings.
    let pair_count = cmd.shorts.len().max(cmd.longs.len());

    for (target, is_path) in &cmd.commands {
        if cmd.erase {
            if pair_count == 0 {
                registry.remove(target, *is_path, None, None);
            } else {
                for i in 0..pair_count {
                    registry.remove(
                        target,
                        *is_path,
                        cmd.shorts.get(i).copied(),
                        cmd.longs.get(i).map(|(name, _)| name.as_str()),
                    );
                }
            }
            continue;
        }

        if let Some(authoritative) = cmd.authoritative {
            registry.set_authoritative(target, *is_path, authoritative);
        }

        let mode = ResultMode::from_bits(cmd.no_files, cmd.requires_argument);
        let has_payload = cmd.args.is_some()
            || cmd.description.is_some()
            || cmd.condition.is_some()
            || mode != ResultMode::Shared;

        if pair_count == 0 {
            // Argument rule, unless the invocation only toggled the
            // authoritative bit
            if cmd.authoritative.is_none() || has_payload {
                registry.add(target, *is_path, make_rule(&cmd, None, None));
            }
        } else {
            for i in 0..pair_count {
                registry.add(
                    target,
                    *is_path,
                    make_rule(&cmd, cmd.shorts.get(i).copied(), cmd.longs.get(i)),
                );
            }
        }
        debug!("complete: updated rules for {}", target);
    }

    Ok(None)
}

fn make_rule(cmd: &CompleteCmd, short: Option<char>, long: Option<&(String, bool)>) -> Rule {
    Rule {
        short,
        long: long.map(|(name, old_style)| LongOpt {
            name: name.clone(),
            old_style: *old_style,
        }),
        mode: ResultMode::from_bits(cmd.no_files, cmd.requires_argument),
        condition: cmd.condition.clone().unwrap_or_default(),
        args: cmd.args.clone().unwrap_or_default(),
        description: cmd.description.clone().unwrap_or_default(),
        flags: CandidateFlags::none(),
    }
}

fn parse_args(argv: &[String]) -> Result<CompleteCmd> {
    let mut cmd = CompleteCmd::default();
    let mut iter = argv.iter().peekable();

    while let Some(arg) = iter.next() {
        let (switch, attached) = match arg.split_once('=') {
            Some((s, v)) if s.starts_with("--") => (s, Some(v.to_string())),
            _ => (arg.as_str(), None),
        };

        let value = |iter: &mut std::iter::Peekable<std::slice::Iter<String>>| -> Result<String> {
            if let Some(v) = attached.clone() {
                return Ok(v);
            }
            iter.next().cloned().ok_or_else(|| {
                ParseError::InvalidBuiltin(format!("complete: {} requires an argument", switch))
                    .into()
            })
        };

        match switch {
            "-c" | "--command" => cmd.commands.push((value(&mut iter)?, false)),
            "-p" | "--path" => cmd.commands.push((value(&mut iter)?, true)),
            "-s" | "--short-option" => {
                let v = value(&mut iter)?;
                let mut chars = v.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => cmd.shorts.push(c),
                    _ => {
                        return Err(ParseError::InvalidBuiltin(format!(
                            "complete: short option must be one character, got '{}'",
                            v
                        ))
                        .into());
                    }
                }
            }
            "-l" | "--long-option" => cmd.longs.push((value(&mut iter)?, false)),
            "-o" | "--old-option" => cmd.longs.push((value(&mut iter)?, true)),
            "-n" | "--condition" => cmd.condition = Some(value(&mut iter)?),
            "-a" | "--arguments" => cmd.args = Some(value(&mut iter)?),
            "-d" | "--description" => cmd.description = Some(value(&mut iter)?),
            "-f" | "--no-files" => cmd.no_files = true,
            "-r" | "--require-parameter" => cmd.requires_argument = true,
            "-x" | "--exclusive" => {
                cmd.no_files = true;
                cmd.requires_argument = true;
            }
            "-A" | "--authoritative" => cmd.authoritative = Some(true),
            "-u" | "--unauthoritative" => cmd.authoritative = Some(false),
            "-e" | "--erase" => cmd.erase = true,
            other => {
                return Err(ParseError::InvalidBuiltin(format!(
                    "complete: unknown option '{}'",
                    other
                ))
                .into());
            }
        }
    }

    Ok(cmd)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn argv(line: &str) -> Vec<String> {
        line.split_whitespace().map(str::to_string).collect()
    }

    fn run(registry: &Registry, args: &[String]) {
        run_complete_builtin(registry, args).unwrap();
    }

    #[test]
    fn test_add_short_and_long_as_one_rule() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -s v -l verbose"));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert_eq!(snap.rules.len(), 1);
        assert_eq!(snap.rules[0].short, Some('v'));
        assert_eq!(snap.rules[0].long.as_ref().unwrap().name, "verbose");
        assert!(!snap.rules[0].long.as_ref().unwrap().old_style);
    }

    #[test]
    fn test_add_old_option() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -o follow"));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert!(snap.rules[0].long.as_ref().unwrap().old_style);
    }

    #[test]
    fn test_argument_rule() {
        let reg = Registry::new();
        let mut args = argv("-c foo -a");
        args.push("one two three".to_string());
        run(&reg, &args);
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert!(snap.rules[0].is_argument_rule());
        assert_eq!(snap.rules[0].args, "one two three");
    }

    #[test]
    fn test_exclusive_sets_both_bits() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -s x -x"));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert!(snap.rules[0].mode.requires_argument());
        assert!(snap.rules[0].mode.suppresses_files());
        assert_eq!(snap.short_opt_str, "x:");
    }

    #[test]
    fn test_erase_all() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -s a"));
        run(&reg, &argv("-c foo -s b"));
        run(&reg, &argv("-c foo -e"));
        assert!(reg.is_empty());
    }

    #[test]
    fn test_erase_single_option() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -s a"));
        run(&reg, &argv("-c foo -s b"));
        run(&reg, &argv("-c foo -e -s a"));
        let snap = &reg.snapshot_matching("foo", "")[0];
        assert_eq!(snap.rules.len(), 1);
        assert_eq!(snap.rules[0].short, Some('b'));
    }

    #[test]
    fn test_authoritative_toggle() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -s a"));
        run(&reg, &argv("-c foo -A"));
        assert!(reg.snapshot_matching("foo", "")[0].authoritative);
        run(&reg, &argv("-c foo -u"));
        assert!(!reg.snapshot_matching("foo", "")[0].authoritative);
        // The bare toggle must not have added rules
        assert_eq!(reg.snapshot_matching("foo", "")[0].rules.len(), 1);
    }

    #[test]
    fn test_bare_invocation_prints() {
        let reg = Registry::new();
        run(&reg, &argv("-c foo -s v"));
        let out = run_complete_builtin(&reg, &[]).unwrap().unwrap();
        assert!(out.contains("--command foo"));
        assert!(out.contains("--short-option 'v'"));
    }

    #[test]
    fn test_unknown_switch_rejected() {
        let reg = Registry::new();
        assert!(run_complete_builtin(&reg, &argv("-c foo --bogus")).is_err());
    }

    #[test]
    fn test_missing_command_rejected() {
        let reg = Registry::new();
        assert!(run_complete_builtin(&reg, &argv("-s v")).is_err());
    }

    #[test]
    fn test_long_switch_with_equals() {
        let reg = Registry::new();
        run(&reg, &argv("--command=foo -s v"));
        assert_eq!(reg.snapshot_matching("foo", "").len(), 1);
    }

    #[test]
    fn test_serializer_round_trip() {
        let reg = Registry::new();
        let mut args = argv("-c git -s b -l branch -x -d");
        args.push("Branch to use".to_string());
        run(&reg, &args);
        run(&reg, &argv("-c git -a pull"));
        run(&reg, &argv("-p /usr/bin/gitk -o follow -f"));

        let script = print_registry(&reg);
        let reparsed = Registry::new();
        for line in script.lines() {
            let words = crate::parser::tokenize(line);
            let argv: Vec<String> = words
                .iter()
                .skip(1) // the literal "complete"
                .map(|t| crate::parser::unescape(&t.text, false).unwrap())
                .collect();
            run_complete_builtin(&reparsed, &argv).unwrap();
        }

        assert_eq!(print_registry(&reparsed), script);
    }
}
