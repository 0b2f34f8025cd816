//! Fuzzy string matching with quality tags.
//!
//! Every generated candidate records how well it matched the token it
//! completes. The tag ordering is load-bearing: UI consumers sort candidates
//! by `(tag, text)`, and tags past [`MatchKind::Prefix`] force the candidate
//! to replace the whole token rather than append a suffix.

/// How a candidate matched the token, best first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum MatchKind {
    /// The token equals the candidate
    Exact,
    /// The token is a case-sensitive prefix of the candidate
    Prefix,
    /// The token is a prefix of the candidate ignoring case
    PrefixIcase,
    /// The token occurs somewhere inside the candidate
    Substring,
    /// The token occurs inside the candidate ignoring case
    SubstringIcase,
    /// The token's characters appear in order inside the candidate
    Subsequence,
}

impl MatchKind {
    /// Ordinal for sorting; lower is better.
    pub fn rank(self) -> u8 {
        match self {
            MatchKind::Exact => 0,
            MatchKind::Prefix => 1,
            MatchKind::PrefixIcase => 2,
            MatchKind::Substring => 3,
            MatchKind::SubstringIcase => 4,
            MatchKind::Subsequence => 5,
        }
    }

    /// Whether accepting a candidate with this tag must rewrite the whole
    /// token. Case-folded and non-prefix matches cannot be expressed as a
    /// suffix of what the user already typed.
    pub fn requires_full_replacement(self) -> bool {
        !matches!(self, MatchKind::Exact | MatchKind::Prefix)
    }
}

/// Match `token` against `candidate`, returning the best tag no worse than
/// `limit`, or `None` if nothing within the limit matches.
pub fn fuzzy_match(token: &str, candidate: &str, limit: MatchKind) -> Option<MatchKind> {
    let kind = classify(token, candidate)?;
    if kind.rank() <= limit.rank() {
        Some(kind)
    } else {
        None
    }
}

fn classify(token: &str, candidate: &str) -> Option<MatchKind> {
    if token == candidate {
        return Some(MatchKind::Exact);
    }
    if candidate.starts_with(token) {
        return Some(MatchKind::Prefix);
    }

    let token_folded = token.to_lowercase();
    let candidate_folded = candidate.to_lowercase();
    if candidate_folded.starts_with(&token_folded) {
        return Some(MatchKind::PrefixIcase);
    }
    if candidate.contains(token) {
        return Some(MatchKind::Substring);
    }
    if candidate_folded.contains(&token_folded) {
        return Some(MatchKind::SubstringIcase);
    }
    if is_subsequence(token, candidate) {
        return Some(MatchKind::Subsequence);
    }
    None
}

fn is_subsequence(needle: &str, haystack: &str) -> bool {
    let mut chars = haystack.chars();
    needle.chars().all(|n| chars.any(|h| h == n))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact() {
        assert_eq!(
            fuzzy_match("PATH", "PATH", MatchKind::Subsequence),
            Some(MatchKind::Exact)
        );
    }

    #[test]
    fn test_prefix() {
        assert_eq!(
            fuzzy_match("PA", "PATH", MatchKind::Subsequence),
            Some(MatchKind::Prefix)
        );
    }

    #[test]
    fn test_prefix_icase() {
        assert_eq!(
            fuzzy_match("pa", "PATH", MatchKind::Subsequence),
            Some(MatchKind::PrefixIcase)
        );
    }

    #[test]
    fn test_substring() {
        assert_eq!(
            fuzzy_match("AT", "PATH", MatchKind::Subsequence),
            Some(MatchKind::Substring)
        );
        assert_eq!(
            fuzzy_match("at", "PATH", MatchKind::Subsequence),
            Some(MatchKind::SubstringIcase)
        );
    }

    #[test]
    fn test_subsequence() {
        assert_eq!(
            fuzzy_match("PH", "PATH", MatchKind::Subsequence),
            Some(MatchKind::Subsequence)
        );
    }

    #[test]
    fn test_limit_caps_quality() {
        assert_eq!(fuzzy_match("AT", "PATH", MatchKind::PrefixIcase), None);
        assert_eq!(
            fuzzy_match("pa", "PATH", MatchKind::PrefixIcase),
            Some(MatchKind::PrefixIcase)
        );
    }

    #[test]
    fn test_no_match() {
        assert_eq!(fuzzy_match("xyz", "PATH", MatchKind::Subsequence), None);
    }

    #[test]
    fn test_empty_token_is_prefix() {
        assert_eq!(
            fuzzy_match("", "anything", MatchKind::PrefixIcase),
            Some(MatchKind::Prefix)
        );
    }

    #[test]
    fn test_replacement_boundary() {
        assert!(!MatchKind::Exact.requires_full_replacement());
        assert!(!MatchKind::Prefix.requires_full_replacement());
        assert!(MatchKind::PrefixIcase.requires_full_replacement());
        assert!(MatchKind::Substring.requires_full_replacement());
        assert!(MatchKind::Subsequence.requires_full_replacement());
    }

    #[test]
    fn test_rank_ordering() {
        assert!(MatchKind::Exact.rank() < MatchKind::Prefix.rank());
        assert!(MatchKind::Prefix.rank() < MatchKind::PrefixIcase.rank());
        assert!(MatchKind::PrefixIcase.rank() < MatchKind::Substring.rank());
        assert!(MatchKind::Substring.rank() < MatchKind::SubstringIcase.rank());
        assert!(MatchKind::SubstringIcase.rank() < MatchKind::Subsequence.rank());
    }
}
