//! Completion rule data model.

use super::candidate::CandidateFlags;

/// How completions behave for the argument position governed by a rule.
///
/// The four values form a two-bit space: one bit for "the option requires an
/// argument" (suppressing the command's common completions after it) and one
/// for "suppress file completion".
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ResultMode {
    /// Arguments mix with common completions and files
    #[default]
    Shared,
    /// Suppress file completion for the request
    NoFiles,
    /// The option requires an argument; suppress common completions
    NoCommon,
    /// Both: `NoFiles | NoCommon`
    Exclusive,
}

impl ResultMode {
    /// Build from the two underlying bits.
    pub fn from_bits(no_files: bool, requires_argument: bool) -> Self {
        match (no_files, requires_argument) {
            (false, false) => ResultMode::Shared,
            (true, false) => ResultMode::NoFiles,
            (false, true) => ResultMode::NoCommon,
            (true, true) => ResultMode::Exclusive,
        }
    }

    /// The NO_COMMON bit: the option takes a mandatory argument.
    pub fn requires_argument(self) -> bool {
        matches!(self, ResultMode::NoCommon | ResultMode::Exclusive)
    }

    /// The NO_FILES bit: file completion is suppressed.
    pub fn suppresses_files(self) -> bool {
        matches!(self, ResultMode::NoFiles | ResultMode::Exclusive)
    }

    /// Stable index used by the serializer.
    pub fn index(self) -> usize {
        match self {
            ResultMode::Shared => 0,
            ResultMode::NoFiles => 1,
            ResultMode::NoCommon => 2,
            ResultMode::Exclusive => 3,
        }
    }
}

/// The long spelling of an option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LongOpt {
    /// Option name without leading dashes
    pub name: String,
    /// Spelled `-name` instead of `--name`
    pub old_style: bool,
}

/// One completion rule for a command.
///
/// A rule with neither a short nor a long option is an argument rule: it
/// contributes positional candidates rather than switches. When both
/// spellings are present they describe the same switch (`-v` / `--verbose`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rule {
    /// Short option character, if any
    pub short: Option<char>,
    /// Long option spelling, if any
    pub long: Option<LongOpt>,
    /// Completion behavior for the governed argument position
    pub mode: ResultMode,
    /// Shell script gating the rule; empty means always
    pub condition: String,
    /// Shell fragment evaluated to produce argument candidates
    pub args: String,
    /// Description attached to emitted candidates
    pub description: String,
    /// Flags attached to emitted candidates
    pub flags: CandidateFlags,
}

impl Rule {
    /// Whether this is an argument rule (no switch spellings at all).
    pub fn is_argument_rule(&self) -> bool {
        self.short.is_none() && self.long.is_none()
    }

    /// The option fully spelled out (`-v`, `--verbose`, `-verbose`), when a
    /// spelling exists. Long spellings win for display purposes.
    pub fn spelled_long(&self) -> Option<String> {
        self.long.as_ref().map(|l| {
            if l.old_style {
                format!("-{}", l.name)
            } else {
                format!("--{}", l.name)
            }
        })
    }
}
