//! Syntactic validation of options against the registry.
//!
//! Backs the lint builtin: given a command line and one of its option
//! tokens, decide whether any authoritative completion entry accepts the
//! option, producing human-readable errors when none does. Commands without
//! an authoritative entry accept everything.

use std::collections::BTreeSet;

use super::autoload::Autoloader;
use super::registry::Registry;
use crate::env::ShellHost;
use crate::expand::resolve_command_path;

/// Whether `opt` is a syntactically acceptable option for the command
/// spelled by `cmd_line`.
///
/// Errors, when a sink is supplied, are appended as displayable strings.
/// `allow_autoload` loads the command's completion file first so freshly
/// defined commands validate correctly.
pub fn is_valid_option(
    registry: &Registry,
    autoloader: &Autoloader,
    host: &dyn ShellHost,
    cmd_line: &str,
    opt: &str,
    mut errors: Option<&mut Vec<String>>,
    allow_autoload: bool,
) -> bool {
    // Bare dashes are separators, not options
    if opt.is_empty() || opt == "-" || opt == "--" {
        return true;
    }

    if !opt.starts_with('-') {
        if let Some(sink) = errors.as_mut() {
            sink.push("Option does not begin with a '-'".to_string());
        }
        return false;
    }

    let is_gnu = opt.starts_with("--");
    let gnu_name = if is_gnu {
        match opt.find('=') {
            Some(eq) => &opt[2..eq],
            None => &opt[2..],
        }
    } else {
        ""
    };

    let basename = cmd_line.rsplit('/').next().unwrap_or(cmd_line);
    let path = resolve_command_path(cmd_line, host.variable("PATH").as_deref(), &host.cwd())
        .map(|p| p.to_string_lossy().into_owned())
        .unwrap_or_default();

    if allow_autoload {
        autoloader.load(registry, basename, false);
    }

    let snapshot = registry.snapshot_matching(basename, &path);

    let mut found_match = false;
    let mut authoritative = true;
    let mut gnu_matches: BTreeSet<String> = BTreeSet::new();
    let mut gnu_exact = false;
    let mut old_found = false;

    // Per-character verdicts for short bundles; index 0 is the dash
    let opt_chars: Vec<char> = opt.chars().collect();
    let mut short_validated = vec![false; opt_chars.len()];

    'entries: for entry in &snapshot {
        found_match = true;
        if !entry.authoritative {
            authoritative = false;
            break;
        }

        if is_gnu {
            for rule in &entry.rules {
                let Some(long) = &rule.long else { continue };
                if long.old_style {
                    continue;
                }
                if long.name.starts_with(gnu_name) {
                    gnu_matches.insert(long.name.clone());
                    if long.name == gnu_name {
                        gnu_exact = true;
                    }
                }
            }
        } else {
            for rule in &entry.rules {
                if let Some(long) = &rule.long {
                    if long.old_style && long.name == opt[1..] {
                        old_found = true;
                        break 'entries;
                    }
                }
            }

            for idx in 1..opt_chars.len() {
                let c = opt_chars[idx];
                let Some(pos) = entry.short_opt_str.find(c) else {
                    continue;
                };
                if entry.short_opt_str[pos + c.len_utf8()..].starts_with(':') {
                    // Attached argument: the rest of the bundle is the
                    // option's argument, not more options
                    let arg: String = opt_chars[idx + 1..].iter().collect();
                    let ok = is_valid_argument(cmd_line, &format!("-{}", c), &arg);
                    for validated in short_validated.iter_mut().skip(idx) {
                        *validated = ok;
                    }
                    break;
                }
                short_validated[idx] = true;
            }
        }
    }

    if !(authoritative && found_match) {
        return true;
    }
    if old_found {
        return true;
    }

    if is_gnu {
        let valid = gnu_exact || gnu_matches.len() == 1;
        if !valid {
            if let Some(sink) = errors.as_mut() {
                let prefix = if gnu_matches.is_empty() {
                    "Unknown option: "
                } else {
                    "Multiple matches for option: "
                };
                sink.push(format!("{}'{}'", prefix, opt));
            }
        }
        valid
    } else {
        for idx in 1..opt_chars.len() {
            if !short_validated[idx] {
                if let Some(sink) = errors.as_mut() {
                    sink.push(format!("Unknown option: '{}'", opt_chars[idx]));
                }
                return false;
            }
        }
        true
    }
}

/// Whether `arg` is acceptable as the argument of `opt` for the command.
/// Currently accepts everything; kept as the extension point richer
/// argument validation would hang off.
pub fn is_valid_argument(_cmd_line: &str, _opt: &str, _arg: &str) -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complete::builtin::run_complete_builtin;
    use crate::env::SystemHost;

    fn setup(lines: &[&str]) -> (Registry, Autoloader, SystemHost) {
        let reg = Registry::new();
        for line in lines {
            let argv: Vec<String> = line.split_whitespace().map(str::to_string).collect();
            run_complete_builtin(&reg, &argv).unwrap();
        }
        (reg, Autoloader::new(vec![]), SystemHost::new())
    }

    fn check(parts: &(Registry, Autoloader, SystemHost), cmd: &str, opt: &str) -> (bool, Vec<String>) {
        let mut errors = Vec::new();
        let ok = is_valid_option(
            &parts.0,
            &parts.1,
            &parts.2,
            cmd,
            opt,
            Some(&mut errors),
            false,
        );
        (ok, errors)
    }

    #[test]
    fn test_trivial_tokens_accepted() {
        let parts = setup(&["-c foo -s v -A"]);
        assert!(check(&parts, "foo", "").0);
        assert!(check(&parts, "foo", "-").0);
        assert!(check(&parts, "foo", "--").0);
    }

    #[test]
    fn test_non_dash_rejected() {
        let parts = setup(&["-c foo -s v -A"]);
        let (ok, errors) = check(&parts, "foo", "verbose");
        assert!(!ok);
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn test_unregistered_command_accepts_anything() {
        let parts = setup(&[]);
        assert!(check(&parts, "stranger", "--whatever").0);
    }

    #[test]
    fn test_non_authoritative_accepts_unknown() {
        let parts = setup(&["-c foo -s v"]);
        assert!(check(&parts, "foo", "--whatever").0);
    }

    #[test]
    fn test_gnu_exact_and_unknown() {
        let parts = setup(&["-c foo -l verbose -A"]);
        assert!(check(&parts, "foo", "--verbose").0);
        let (ok, errors) = check(&parts, "foo", "--nope");
        assert!(!ok);
        assert_eq!(errors[0], "Unknown option: '--nope'");
    }

    #[test]
    fn test_gnu_unambiguous_prefix_accepted() {
        let parts = setup(&["-c foo -l verbose -A"]);
        assert!(check(&parts, "foo", "--verb").0);
    }

    #[test]
    fn test_gnu_ambiguous_prefix_rejected() {
        let parts = setup(&["-c foo -l verbose -A", "-c foo -l version -A"]);
        let (ok, errors) = check(&parts, "foo", "--vers");
        assert!(!ok);
        assert_eq!(errors[0], "Multiple matches for option: '--vers'");
    }

    #[test]
    fn test_gnu_exact_wins_over_ambiguity() {
        let parts = setup(&["-c foo -l in -A", "-c foo -l input -A"]);
        assert!(check(&parts, "foo", "--in").0);
    }

    #[test]
    fn test_gnu_with_attached_value() {
        let parts = setup(&["-c foo -l color -A"]);
        assert!(check(&parts, "foo", "--color=auto").0);
    }

    #[test]
    fn test_old_style_literal() {
        let parts = setup(&["-c foo -o follow -A"]);
        assert!(check(&parts, "foo", "-follow").0);
        let (ok, _) = check(&parts, "foo", "-follo");
        assert!(!ok);
    }

    #[test]
    fn test_short_bundle() {
        let parts = setup(&["-c foo -s a -A", "-c foo -s b -A"]);
        assert!(check(&parts, "foo", "-ab").0);
        let (ok, errors) = check(&parts, "foo", "-az");
        assert!(!ok);
        assert_eq!(errors[0], "Unknown option: 'z'");
    }

    #[test]
    fn test_short_with_attached_argument_consumes_rest() {
        let parts = setup(&["-c foo -s I -r -A"]);
        // everything after -I is the argument, however option-like it looks
        assert!(check(&parts, "foo", "-Iinclude/dir").0);
    }

    #[test]
    fn test_is_valid_argument_stub() {
        assert!(is_valid_argument("foo", "-I", "anything"));
    }
}
