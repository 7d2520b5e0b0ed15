use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

use crate::error::{Error, Result};

/// Sentinel that turns a term list into "match everything".
pub const WILDCARD: &str = "*";

/// Active match criteria for one run.
///
/// Terms are stored lower-cased. When `match_all` is set the terms are
/// ignored and every entry passes the term stage.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TermSet {
    terms: BTreeSet<String>,
    match_all: bool,
}

/// Outcome of matching an entry's tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagMatch {
    Matched,
    NoMatch,
    /// The entry carried no tag data at all.
    NoTags,
}

impl TagMatch {
    pub fn is_match(self) -> bool {
        self == TagMatch::Matched
    }
}

impl TermSet {
    pub fn match_all() -> Self {
        Self {
            terms: BTreeSet::new(),
            match_all: true,
        }
    }

    /// Build a set from raw terms.
    ///
    /// Blank items are skipped. If the first non-blank item is `*` the
    /// result is the wildcard set.
    pub fn from_terms<I, S>(terms: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut items = terms
            .into_iter()
            .map(|term| term.as_ref().trim().to_lowercase())
            .filter(|term| !term.is_empty())
            .peekable();

        if items.peek().map(String::as_str) == Some(WILDCARD) {
            return Self::match_all();
        }

        Self {
            terms: items.collect(),
            match_all: false,
        }
    }

    /// Literal terms with no wildcard detection; used for derived tags.
    pub(crate) fn from_literal_terms<I>(terms: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        Self {
            terms: terms.into_iter().collect(),
            match_all: false,
        }
    }

    /// Read a newline-delimited term file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::NotFound(format!("Cannot read term file {}: {}", path.display(), e))
        })?;

        Ok(Self::from_terms(content.lines()))
    }

    /// Parse a comma-delimited list such as `rust,wasm` or `*`.
    pub fn parse_list(list: &str) -> Self {
        Self::from_terms(list.split(','))
    }

    pub fn is_match_all(&self) -> bool {
        self.match_all
    }

    pub fn contains(&self, term: &str) -> bool {
        self.terms.contains(term)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.terms.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.terms.len()
    }

    pub fn is_empty(&self) -> bool {
        !self.match_all && self.terms.is_empty()
    }
}

impl fmt::Display for TermSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.match_all {
            return f.write_str(WILDCARD);
        }
        let joined = self.terms.iter().map(String::as_str).collect::<Vec<_>>().join(", ");
        f.write_str(&joined)
    }
}

/// Match an entry's tags against `terms`, case-insensitively.
pub fn matches_tags(tags: Option<&[String]>, terms: &TermSet) -> TagMatch {
    if terms.match_all {
        return TagMatch::Matched;
    }

    let Some(tags) = tags else {
        return TagMatch::NoTags;
    };

    if tags.iter().any(|tag| terms.contains(&tag.to_lowercase())) {
        TagMatch::Matched
    } else {
        TagMatch::NoMatch
    }
}

/// True when any term occurs anywhere in the title or description.
pub fn matches_keywords(title: &str, description: &str, terms: &TermSet) -> bool {
    if terms.match_all {
        return true;
    }

    let title = title.to_lowercase();
    let description = description.to_lowercase();

    terms
        .iter()
        .any(|term| title.contains(term) || description.contains(term))
}
