use std::collections::BTreeMap;
use std::fmt;

use tracing::{debug, info, warn};

use crate::error::Result;
use crate::feed::{FeedEntry, FeedList, FeedSource};
use crate::filter::{matches_keywords, matches_tags, DateWindow, MatchMode, TagMatch, TermSet};
use crate::sink::{Delivery, EntrySink};

/// Everything the main pass needs to know, fixed for the whole run.
#[derive(Debug, Clone)]
pub struct ScanOptions {
    pub window: DateWindow,
    pub mode: MatchMode,
    pub terms: TermSet,
}

/// Recoverable problems, counted per run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum SoftFailure {
    FeedFetch,
    MissingDate,
    MissingTags,
    PageFetch,
    SinkWrite,
}

impl SoftFailure {
    pub fn code(self) -> &'static str {
        match self {
            SoftFailure::FeedFetch => "FEED_FETCH",
            SoftFailure::MissingDate => "MISSING_DATE",
            SoftFailure::MissingTags => "TAG_ERROR",
            SoftFailure::PageFetch => "PAGE_FETCH",
            SoftFailure::SinkWrite => "SINK_WRITE",
        }
    }
}

impl fmt::Display for SoftFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanStats {
    pub feeds_scanned: usize,
    pub entries_seen: usize,
    pub entries_in_window: usize,
    pub entries_matched: usize,
    pub duplicates: usize,
    failures: BTreeMap<SoftFailure, usize>,
}

impl ScanStats {
    pub fn record(&mut self, failure: SoftFailure) {
        *self.failures.entry(failure).or_insert(0) += 1;
    }

    pub fn failures(&self, failure: SoftFailure) -> usize {
        self.failures.get(&failure).copied().unwrap_or(0)
    }

    pub fn total_failures(&self) -> usize {
        self.failures.values().sum()
    }

    pub fn feeds_skipped(&self) -> usize {
        self.failures(SoftFailure::FeedFetch)
    }

    pub fn log_summary(&self) {
        info!(
            feeds_scanned = self.feeds_scanned,
            feeds_skipped = self.feeds_skipped(),
            entries_seen = self.entries_seen,
            entries_in_window = self.entries_in_window,
            entries_matched = self.entries_matched,
            duplicates = self.duplicates,
            "Scan complete"
        );

        for (failure, count) in &self.failures {
            info!(code = failure.code(), count, "Soft failures");
        }
    }
}

/// Single sequential pass over a feed list.
pub struct Scanner<'a, S: FeedSource + ?Sized> {
    source: &'a S,
    options: &'a ScanOptions,
}

impl<'a, S: FeedSource + ?Sized> Scanner<'a, S> {
    pub fn new(source: &'a S, options: &'a ScanOptions) -> Self {
        Self { source, options }
    }

    /// Fetch each feed in order and hand every entry that passes the date
    /// window and the term set to `sink`.
    ///
    /// Only a failure of `sink.begin` aborts the pass. Every other problem
    /// is logged with its feed and entry, counted, and skipped.
    pub async fn run<K: EntrySink + ?Sized>(&self, feeds: &FeedList, sink: &mut K) -> Result<ScanStats> {
        let mut stats = ScanStats::default();

        sink.begin(&self.options.window).await?;

        for url in feeds.urls() {
            let feed = match self.source.fetch_feed(url).await {
                Ok(feed) => feed,
                Err(e) => {
                    warn!(feed = %url, code = e.error_code(), "Skipping feed: {}", e);
                    stats.record(SoftFailure::FeedFetch);
                    continue;
                }
            };

            stats.feeds_scanned += 1;
            debug!(feed = %url, title = %feed.title, entries = feed.entries.len(), "Scanning feed");

            for entry in &feed.entries {
                stats.entries_seen += 1;

                if !self.admit(url, entry, &mut stats) {
                    continue;
                }

                match sink.accept(url, entry).await {
                    Ok(Delivery::Emitted) => stats.entries_matched += 1,
                    Ok(Delivery::EmittedWithoutText) => {
                        stats.entries_matched += 1;
                        stats.record(SoftFailure::PageFetch);
                    }
                    Ok(Delivery::Duplicate) => stats.duplicates += 1,
                    Err(e) => {
                        warn!(
                            feed = %url,
                            entry = %entry.title,
                            code = e.error_code(),
                            "Failed to emit entry: {}",
                            e
                        );
                        stats.record(SoftFailure::SinkWrite);
                    }
                }
            }
        }

        stats.log_summary();
        Ok(stats)
    }

    /// Date window first, then the term set.
    fn admit(&self, url: &str, entry: &FeedEntry, stats: &mut ScanStats) -> bool {
        let Some(published) = entry.published_on() else {
            warn!(feed = %url, entry = %entry.title, "Skipping entry without publish date");
            stats.record(SoftFailure::MissingDate);
            return false;
        };

        if !self.options.window.contains(published) {
            return false;
        }
        stats.entries_in_window += 1;

        let terms = &self.options.terms;
        match self.options.mode {
            MatchMode::Tags => self.check_tags(url, entry, stats).is_match(),
            MatchMode::Keywords => {
                matches_keywords(&entry.title, entry.description_or_empty(), terms)
            }
            // An untagged entry is dropped before the keyword test runs
            MatchMode::Either => match self.check_tags(url, entry, stats) {
                TagMatch::Matched => true,
                TagMatch::NoTags => false,
                TagMatch::NoMatch => {
                    matches_keywords(&entry.title, entry.description_or_empty(), terms)
                }
            },
        }
    }

    /// Tag outcome for an entry; a missing tag list is recorded as a soft failure.
    fn check_tags(&self, url: &str, entry: &FeedEntry, stats: &mut ScanStats) -> TagMatch {
        let outcome = matches_tags(entry.tags(), &self.options.terms);
        if outcome == TagMatch::NoTags {
            warn!(feed = %url, entry = %entry.title, code = SoftFailure::MissingTags.code(), "Tag Error: entry has no tags");
            stats.record(SoftFailure::MissingTags);
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{Error, Result};
    use crate::feed::ParsedFeed;
    use async_trait::async_trait;
    use chrono::{NaiveDate, TimeZone, Utc};
    use std::collections::HashMap;

    struct StaticSource {
        feeds: HashMap<String, Vec<FeedEntry>>,
    }

    #[async_trait]
    impl FeedSource for StaticSource {
        async fn fetch_feed(&self, url: &str) -> Result<ParsedFeed> {
            self.feeds
                .get(url)
                .map(|entries| ParsedFeed {
                    title: url.to_string(),
                    entries: entries.clone(),
                })
                .ok_or_else(|| Error::Timeout(format!("Request to {} timed out", url)))
        }
    }

    #[derive(Default)]
    struct RecordingSink {
        began: bool,
        accepted: Vec<String>,
        fail_on: Option<String>,
    }

    #[async_trait]
    impl EntrySink for RecordingSink {
        async fn begin(&mut self, _window: &DateWindow) -> Result<()> {
            self.began = true;
            Ok(())
        }

        async fn accept(&mut self, _feed_url: &str, entry: &FeedEntry) -> Result<Delivery> {
            if self.fail_on.as_deref() == Some(entry.title.as_str()) {
                return Err(Error::Storage("write failed".to_string()));
            }
            self.accepted.push(entry.title.clone());
            Ok(Delivery::Emitted)
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    fn entry(title: &str, day: Option<u32>, tags: &[&str]) -> FeedEntry {
        FeedEntry {
            title: title.to_string(),
            link: format!("https://example.com/{}", title),
            description: Some(format!("About {}", title)),
            published: day.map(|d| Utc.with_ymd_and_hms(2024, 3, d, 12, 0, 0).unwrap()),
            tags: tags.iter().map(|t| t.to_string()).collect(),
        }
    }

    fn options(mode: MatchMode, terms: TermSet) -> ScanOptions {
        ScanOptions {
            window: DateWindow::new(1, today()),
            mode,
            terms,
        }
    }

    fn source(feeds: Vec<(&str, Vec<FeedEntry>)>) -> StaticSource {
        StaticSource {
            feeds: feeds.into_iter().map(|(u, e)| (u.to_string(), e)).collect(),
        }
    }

    #[tokio::test]
    async fn test_tag_mode_filters_by_date_and_tag() {
        let source = source(vec![(
            "https://a.example/rss",
            vec![
                entry("new-rust", Some(15), &["Rust"]),
                entry("old-rust", Some(10), &["Rust"]),
                entry("new-go", Some(14), &["Go"]),
                entry("yesterday-rust", Some(14), &["rust"]),
            ],
        )]);
        let options = options(MatchMode::Tags, TermSet::parse_list("rust"));
        let feeds: FeedList = ["https://a.example/rss"].into_iter().collect();
        let mut sink = RecordingSink::default();

        let stats = Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();

        assert!(sink.began);
        assert_eq!(sink.accepted, vec!["new-rust", "yesterday-rust"]);
        assert_eq!(stats.entries_seen, 4);
        assert_eq!(stats.entries_in_window, 3);
        assert_eq!(stats.entries_matched, 2);
    }

    #[tokio::test]
    async fn test_failed_feed_is_skipped() {
        let source = source(vec![(
            "https://up.example/rss",
            vec![entry("kept", Some(15), &["rust"])],
        )]);
        let options = options(MatchMode::Tags, TermSet::parse_list("rust"));
        let feeds: FeedList = ["https://down.example/rss", "https://up.example/rss"]
            .into_iter()
            .collect();
        let mut sink = RecordingSink::default();

        let stats = Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();

        assert_eq!(sink.accepted, vec!["kept"]);
        assert_eq!(stats.feeds_skipped(), 1);
        assert_eq!(stats.feeds_scanned, 1);
    }

    #[tokio::test]
    async fn test_missing_date_and_tags_are_soft_failures() {
        let source = source(vec![(
            "https://a.example/rss",
            vec![
                entry("undated", None, &["rust"]),
                entry("untagged", Some(15), &[]),
                entry("tagged", Some(15), &["rust"]),
            ],
        )]);
        let options = options(MatchMode::Tags, TermSet::parse_list("rust"));
        let feeds: FeedList = ["https://a.example/rss"].into_iter().collect();
        let mut sink = RecordingSink::default();

        let stats = Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();

        assert_eq!(sink.accepted, vec!["tagged"]);
        assert_eq!(stats.failures(SoftFailure::MissingDate), 1);
        assert_eq!(stats.failures(SoftFailure::MissingTags), 1);
        assert_eq!(stats.total_failures(), 2);
    }

    #[tokio::test]
    async fn test_wildcard_matches_everything_in_window() {
        let source = source(vec![(
            "https://a.example/rss",
            vec![
                entry("untagged", Some(15), &[]),
                entry("other", Some(14), &["cooking"]),
                entry("too-old", Some(1), &["cooking"]),
            ],
        )]);
        let feeds: FeedList = ["https://a.example/rss"].into_iter().collect();

        for mode in [MatchMode::Tags, MatchMode::Keywords, MatchMode::Either] {
            let options = options(mode, TermSet::match_all());
            let mut sink = RecordingSink::default();
            Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();
            assert_eq!(sink.accepted, vec!["untagged", "other"], "mode {:?}", mode);
        }
    }

    #[tokio::test]
    async fn test_either_mode_falls_back_to_keywords() {
        let source = source(vec![(
            "https://a.example/rss",
            vec![
                entry("kernel-news", Some(15), &["linux"]),
                entry("unrelated", Some(15), &["cooking"]),
                entry("tagged-kernel", Some(14), &["Kernel"]),
            ],
        )]);
        let options = options(MatchMode::Either, TermSet::parse_list("kernel"));
        let feeds: FeedList = ["https://a.example/rss"].into_iter().collect();
        let mut sink = RecordingSink::default();

        let stats = Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();

        assert_eq!(sink.accepted, vec!["kernel-news", "tagged-kernel"]);
        assert_eq!(stats.total_failures(), 0);
    }

    #[tokio::test]
    async fn test_either_mode_skips_untagged_entry_before_keywords() {
        let source = source(vec![(
            "https://a.example/rss",
            vec![
                entry("rust news", Some(15), &[]),
                entry("rust weekly", Some(15), &["rust"]),
            ],
        )]);
        let options = options(MatchMode::Either, TermSet::parse_list("rust"));
        let feeds: FeedList = ["https://a.example/rss"].into_iter().collect();
        let mut sink = RecordingSink::default();

        let stats = Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();

        assert_eq!(sink.accepted, vec!["rust weekly"]);
        assert_eq!(stats.entries_matched, 1);
        assert_eq!(stats.failures(SoftFailure::MissingTags), 1);
    }

    #[tokio::test]
    async fn test_sink_failure_does_not_abort() {
        let source = source(vec![(
            "https://a.example/rss",
            vec![
                entry("first", Some(15), &["rust"]),
                entry("second", Some(15), &["rust"]),
            ],
        )]);
        let options = options(MatchMode::Tags, TermSet::parse_list("rust"));
        let feeds: FeedList = ["https://a.example/rss"].into_iter().collect();
        let mut sink = RecordingSink {
            fail_on: Some("first".to_string()),
            ..Default::default()
        };

        let stats = Scanner::new(&source, &options).run(&feeds, &mut sink).await.unwrap();

        assert_eq!(sink.accepted, vec!["second"]);
        assert_eq!(stats.failures(SoftFailure::SinkWrite), 1);
        assert_eq!(stats.entries_matched, 1);
    }

    #[test]
    fn test_soft_failure_codes() {
        assert_eq!(SoftFailure::MissingTags.to_string(), "TAG_ERROR");
        assert_eq!(SoftFailure::FeedFetch.code(), "FEED_FETCH");
    }
}
