pub mod persist;
pub mod report;

use async_trait::async_trait;

use crate::error::Result;
use crate::feed::FeedEntry;
use crate::filter::DateWindow;

pub use persist::PersistSink;
pub use report::HtmlReport;

/// What a sink did with an accepted entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Emitted,
    /// Emitted, but the linked page could not be fetched.
    EmittedWithoutText,
    /// The destination already held this entry.
    Duplicate,
}

/// Terminal action for entries that pass both filters.
#[async_trait]
pub trait EntrySink: Send {
    /// Called once before the first feed is scanned.
    async fn begin(&mut self, _window: &DateWindow) -> Result<()> {
        Ok(())
    }

    async fn accept(&mut self, feed_url: &str, entry: &FeedEntry) -> Result<Delivery>;
}
