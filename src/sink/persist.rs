use std::io::Write;

use async_trait::async_trait;
use tracing::{info, warn};

use crate::content::TextExtractor;
use crate::error::{Error, Result};
use crate::feed::{FeedEntry, PageSource};
use crate::sink::{Delivery, EntrySink};
use crate::storage::{DocumentStore, FeedDocument};

/// Stores each matching entry, enriched with the text of its linked page.
///
/// The title of every stored entry is echoed to `out`.
pub struct PersistSink<'a, P: PageSource + ?Sized, D: DocumentStore + ?Sized, W: Write + Send> {
    pages: &'a P,
    store: &'a D,
    extractor: TextExtractor,
    out: W,
}

impl<'a, P, D, W> PersistSink<'a, P, D, W>
where
    P: PageSource + ?Sized,
    D: DocumentStore + ?Sized,
    W: Write + Send,
{
    pub fn new(pages: &'a P, store: &'a D, out: W) -> Self {
        Self {
            pages,
            store,
            extractor: TextExtractor::new(),
            out,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

async fn page_text<P: PageSource + ?Sized>(
    pages: &P,
    extractor: &TextExtractor,
    feed_url: &str,
    entry: &FeedEntry,
) -> Option<String> {
    match pages.fetch_page(&entry.link).await {
        Ok(html) => Some(extractor.extract_text(&html)),
        Err(e) => {
            warn!(
                feed = %feed_url,
                entry = %entry.title,
                code = e.error_code(),
                "Storing entry without page text: {}",
                e
            );
            None
        }
    }
}

#[async_trait]
impl<'a, P, D, W> EntrySink for PersistSink<'a, P, D, W>
where
    P: PageSource + ?Sized,
    D: DocumentStore + ?Sized,
    W: Write + Send,
{
    async fn accept(&mut self, feed_url: &str, entry: &FeedEntry) -> Result<Delivery> {
        let text = page_text(self.pages, &self.extractor, feed_url, entry).await;
        let fetched = text.is_some();
        let document = FeedDocument::new(entry, text);

        match self.store.save(&document).await {
            Ok(()) => {
                writeln!(self.out, "{}", entry.title)?;
                if fetched {
                    Ok(Delivery::Emitted)
                } else {
                    Ok(Delivery::EmittedWithoutText)
                }
            }
            Err(Error::AlreadyExists(_)) => {
                info!(feed = %feed_url, entry = %entry.title, "Entry already stored");
                Ok(Delivery::Duplicate)
            }
            Err(e) => Err(e),
        }
    }
}
