pub mod smart;
pub mod terms;
pub mod window;

pub use smart::{SmartTermDeriver, SmartTerms, TagCount, TagFrequencyTable, NOISE_TAGS};
pub use terms::{matches_keywords, matches_tags, TagMatch, TermSet, WILDCARD};
pub use window::{is_within_window, DateWindow};

/// Which entry fields the term set is matched against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchMode {
    Tags,
    Keywords,
    /// Tags first, then keywords when the entry has tags that do not match.
    Either,
}
