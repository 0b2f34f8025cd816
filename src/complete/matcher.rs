//! Pure predicates classifying a typed token against a rule's option
//! spellings.
//!
//! Three spellings exist: short (`-x`, bundleable), GNU long (`--name`,
//! argument attachable with `=`), and old-style long (`-name`, single dash).
//! All predicates route through one classification so the trichotomy lives
//! in exactly one place.

use super::rule::Rule;

/// How a token hit one of a rule's spellings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OptionHit<'t> {
    /// The token spells the option exactly
    Spelled,
    /// The token carries the option plus an attached argument
    Attached(&'t str),
}

/// Classify `token` (which must start with `-`) against `rule`'s short and
/// GNU spellings. Old-style spellings are matched only by [`match_old`].
fn classify<'t>(rule: &Rule, token: &'t str) -> Option<OptionHit<'t>> {
    let mut chars = token.chars();
    if chars.next() != Some('-') {
        return None;
    }

    if let Some(short) = rule.short {
        if chars.clone().next() == Some(short) {
            let rest = &token[1 + short.len_utf8()..];
            if rest.is_empty() {
                return Some(OptionHit::Spelled);
            }
            // An attached value only makes sense when the option takes one
            if rule.mode.requires_argument() {
                return Some(OptionHit::Attached(rest));
            }
        }
    }

    if let Some(long) = &rule.long {
        if !long.old_style {
            if let Some(rest) = token.strip_prefix("--") {
                if rest == long.name {
                    return Some(OptionHit::Spelled);
                }
                if let Some(value) = rest
                    .strip_prefix(long.name.as_str())
                    .and_then(|r| r.strip_prefix('='))
                {
                    return Some(OptionHit::Attached(value));
                }
            }
        }
    }

    None
}

/// True iff the rule is old-style and the token spells it: `-name`.
pub fn match_old(rule: &Rule, token: &str) -> bool {
    match &rule.long {
        Some(long) if long.old_style => {
            token.strip_prefix('-').is_some_and(|rest| rest == long.name)
        }
        _ => false,
    }
}

/// True iff the token's first option character equals the rule's short
/// option, or the token spells the rule's GNU long option exactly.
pub fn match_short_or_gnu(rule: &Rule, token: &str) -> bool {
    if let Some(short) = rule.short {
        let mut chars = token.chars();
        if chars.next() == Some('-') && chars.next() == Some(short) {
            return true;
        }
    }
    if let Some(long) = &rule.long {
        if !long.old_style {
            if let Some(rest) = token.strip_prefix("--") {
                return rest == long.name;
            }
        }
    }
    false
}

/// The attached argument of `-Xvalue` (short option taking an argument) or
/// `--name=value`. `None` when the token carries no attached argument for
/// this rule.
pub fn attached_argument<'t>(rule: &Rule, token: &'t str) -> Option<&'t str> {
    match classify(rule, token)? {
        OptionHit::Attached(value) => Some(value),
        OptionHit::Spelled => None,
    }
}

/// Whether `token` spells a short-option bundle that already ends in the
/// rule's short option (`-v` for a `-v` rule, `-av` for an `a` + `v`
/// bundle). Such a token is complete as typed.
pub fn bundle_ends_with(token: &str, short: char, short_opt_str: &str) -> bool {
    let Some(stripped) = token.strip_suffix(short) else {
        return false;
    };
    short_bundle_ok(stripped, short, short_opt_str)
}

/// Whether appending `next` to the short-option bundle `token` is allowed.
///
/// Every character already in the bundle must be a known short option
/// without an attached-argument colon (such characters terminate bundling),
/// and `next` must not already be present.
pub fn short_bundle_ok(token: &str, next: char, short_opt_str: &str) -> bool {
    let mut chars = token.chars();
    match chars.next() {
        None => return true,
        Some('-') => {}
        Some(_) => return false,
    }
    if chars.clone().next() == Some('-') {
        return false;
    }
    if token.contains(next) {
        return false;
    }

    for c in chars {
        match short_opt_str.find(c) {
            None => return false,
            Some(idx) => {
                if short_opt_str[idx + c.len_utf8()..].starts_with(':') {
                    return false;
                }
            }
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::complete::candidate::CandidateFlags;
    use crate::complete::rule::{LongOpt, ResultMode};

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
    fn test_match_old() {
        let r = rule(None, Some(("follow", true)), ResultMode::Shared);
        assert!(match_old(&r, "-follow"));
        assert!(!match_old(&r, "--follow"));
        assert!(!match_old(&r, "-follo"));

        let gnu = rule(None, Some(("follow", false)), ResultMode::Shared);
        assert!(!match_old(&gnu, "-follow"));
    }

    #[test]
    fn test_match_short() {
        let r = rule(Some('x'), None, ResultMode::Shared);
        assert!(match_short_or_gnu(&r, "-x"));
        assert!(match_short_or_gnu(&r, "-xyz"));
        assert!(!match_short_or_gnu(&r, "-y"));
    }

    #[test]
    fn test_match_gnu() {
        let r = rule(None, Some(("color", false)), ResultMode::Shared);
        assert!(match_short_or_gnu(&r, "--color"));
        assert!(!match_short_or_gnu(&r, "--col"));
        assert!(!match_short_or_gnu(&r, "-color"));
    }

    #[test]
    fn test_old_style_never_matches_gnu_path() {
        let r = rule(None, Some(("color", true)), ResultMode::Shared);
        assert!(!match_short_or_gnu(&r, "--color"));
    }

    #[test]
    fn test_attached_short_requires_argument() {
        let takes = rule(Some('X'), None, ResultMode::NoCommon);
        assert_eq!(attached_argument(&takes, "-Xv"), Some("v"));
        assert_eq!(attached_argument(&takes, "-X"), None);

        let plain = rule(Some('X'), None, ResultMode::Shared);
        assert_eq!(attached_argument(&plain, "-Xv"), None);
    }

    #[test]
    fn test_attached_gnu() {
        let r = rule(None, Some(("k", false)), ResultMode::Shared);
        assert_eq!(attached_argument(&r, "--k=v"), Some("v"));
        assert_eq!(attached_argument(&r, "--k="), Some(""));
        assert_eq!(attached_argument(&r, "--k"), None);

        let old = rule(None, Some(("k", true)), ResultMode::Shared);
        assert_eq!(attached_argument(&old, "--k=v"), None);
    }

    #[test]
    fn test_short_bundle_ok() {
        assert!(short_bundle_ok("-abc", 'd', "abcde"));
        assert!(!short_bundle_ok("-abc", 'a', "abcde"));
        assert!(short_bundle_ok("-", 'a', "abcde"));
        assert!(short_bundle_ok("", 'a', "abcde"));
    }

    #[test]
    fn test_short_bundle_rejects_unknown_char() {
        assert!(!short_bundle_ok("-az", 'b', "abc"));
    }

    #[test]
    fn test_short_bundle_colon_terminates() {
        // 'b' takes an argument, so nothing may bundle after it
        assert!(!short_bundle_ok("-ab", 'c', "ab:c"));
        assert!(short_bundle_ok("-a", 'c', "ab:c"));
    }

    #[test]
    fn test_short_bundle_rejects_double_dash() {
        assert!(!short_bundle_ok("--long", 'a', "abc"));
    }

    #[test]
    fn test_bundle_ends_with() {
        assert!(bundle_ends_with("-v", 'v', "v"));
        assert!(bundle_ends_with("-av", 'v', "av"));
        assert!(!bundle_ends_with("-a", 'v', "av"));
        // 'a' takes an argument: no bundle may continue past it
        assert!(!bundle_ends_with("-av", 'v', "a:v"));
    }
}
