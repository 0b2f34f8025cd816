//! The candidate value returned to completion consumers.

use super::fuzzy::MatchKind;

/// Behavioral flags attached to a candidate.
///
/// `auto_space` is an input-only hint: [`append_candidate`] resolves it
/// before the candidate is constructed, clearing it and setting `no_space`
/// when the text ends in a character that usually continues (`/`, `=`, `@`,
/// `:`). Candidates in flight never carry `auto_space`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CandidateFlags {
    /// The text replaces the whole current token instead of appending
    pub replaces_token: bool,
    /// Do not insert a trailing space on acceptance
    pub no_space: bool,
    /// Resolve to `no_space` based on the text's last character
    pub auto_space: bool,
    /// Case-insensitive display hint
    pub no_case: bool,
    /// Do not escape the text when inserting
    pub dont_escape: bool,
    /// Preserve generator order in the display
    pub dont_sort: bool,
}

impl CandidateFlags {
    /// No flags set.
    pub const fn none() -> Self {
        Self {
            replaces_token: false,
            no_space: false,
            auto_space: false,
            no_case: false,
            dont_escape: false,
            dont_sort: false,
        }
    }

    /// Flags with only `auto_space` set.
    pub const fn auto_space() -> Self {
        Self {
            auto_space: true,
            ..Self::none()
        }
    }

    /// Flags with only `replaces_token` set.
    pub const fn replaces_token() -> Self {
        Self {
            replaces_token: true,
            ..Self::none()
        }
    }

    /// Resolve the `auto_space` hint against the candidate text.
    fn resolved(mut self, text: &str) -> Self {
        if self.auto_space {
            self.auto_space = false;
            if text.ends_with(['/', '=', '@', ':']) {
                self.no_space = true;
            }
        }
        self
    }
}

/// A single completion candidate. Immutable once handed to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// The token replacement or suffix
    pub text: String,
    /// Display-only description, possibly empty
    pub description: String,
    /// How the candidate matched the token
    pub match_kind: MatchKind,
    /// Behavioral flags, already resolved
    pub flags: CandidateFlags,
}

impl Candidate {
    /// Sort key used by UI consumers: match quality first, then text.
    pub fn sort_key(&self) -> (u8, &str) {
        (self.match_kind.rank(), &self.text)
    }
}

/// Construct a candidate and push it onto `list`, resolving the
/// `auto_space` hint first. All emit sites go through here so the
/// resolution cannot be skipped.
pub fn append_candidate(
    list: &mut Vec<Candidate>,
    text: impl Into<String>,
    description: impl Into<String>,
    match_kind: MatchKind,
    flags: CandidateFlags,
) {
    let text = text.into();
    let flags = flags.resolved(&text);
    list.push(Candidate {
        text,
        description: description.into(),
        match_kind,
        flags,
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auto_space_resolution() {
        let mut list = Vec::new();
        append_candidate(&mut list, "src/", "", MatchKind::Prefix, CandidateFlags::auto_space());
        append_candidate(&mut list, "src", "", MatchKind::Prefix, CandidateFlags::auto_space());
        assert!(list[0].flags.no_space);
        assert!(!list[0].flags.auto_space);
        assert!(!list[1].flags.no_space);
        assert!(!list[1].flags.auto_space);
    }

    #[test]
    fn test_auto_space_suffix_set() {
        for (text, expect) in [("a=", true), ("a@", true), ("a:", true), ("a.", false)] {
            let mut list = Vec::new();
            append_candidate(&mut list, text, "", MatchKind::Exact, CandidateFlags::auto_space());
            assert_eq!(list[0].flags.no_space, expect, "{:?}", text);
        }
    }

    #[test]
    fn test_plain_flags_untouched() {
        let mut list = Vec::new();
        append_candidate(&mut list, "x/", "", MatchKind::Exact, CandidateFlags::none());
        assert!(!list[0].flags.no_space);
    }

    #[test]
    fn test_sort_key_orders_by_quality() {
        let mut list = Vec::new();
        append_candidate(&mut list, "zzz", "", MatchKind::Prefix, CandidateFlags::none());
        append_candidate(&mut list, "aaa", "", MatchKind::Substring, CandidateFlags::none());
        list.sort_by(|a, b| a.sort_key().cmp(&b.sort_key()));
        assert_eq!(list[0].text, "zzz");
    }
}
