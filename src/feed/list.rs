use std::path::Path;

use crate::error::{Error, Result};

/// Ordered feed URLs read from a newline-delimited list.
///
/// Lines starting with `#` are comments. Blank lines are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedList {
    urls: Vec<String>,
}

impl FeedList {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::NotFound(format!("Cannot read feed list {}: {}", path.display(), e))
        })?;

        Ok(Self::parse(&content))
    }

    pub fn parse(content: &str) -> Self {
        let urls = content
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty() && !line.starts_with('#'))
            .map(str::to_string)
            .collect();

        Self { urls }
    }

    pub fn urls(&self) -> &[String] {
        &self.urls
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for FeedList {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            urls: iter.into_iter().map(Into::into).collect(),
        }
    }
}
