use std::io::Write;

use async_trait::async_trait;
use chrono::NaiveDate;

use crate::error::Result;
use crate::feed::FeedEntry;
use crate::filter::DateWindow;
use crate::sink::{Delivery, EntrySink};

const DATE_FORMAT: &str = "%A %d %B %Y";

/// Writes matching entries as an HTML news roundup.
pub struct HtmlReport<W: Write + Send> {
    out: W,
    include_description: bool,
}

impl<W: Write + Send> HtmlReport<W> {
    pub fn new(out: W, include_description: bool) -> Self {
        Self {
            out,
            include_description,
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

pub fn render_header(cutoff: NaiveDate, today: NaiveDate) -> String {
    format!(
        "<h1>News Roundup</h1>\n<h3>feed-scan v{}</h3>\n<h4>For the period {} to {}</h4>\n",
        env!("CARGO_PKG_VERSION"),
        cutoff.format(DATE_FORMAT),
        today.format(DATE_FORMAT)
    )
}

/// Heading link for one entry, plus its raw description when requested.
pub fn render_entry(entry: &FeedEntry, include_description: bool) -> String {
    let mut html = format!(
        "<h3><a target=\"_blank\" href=\"{}\">{}</a></h3>\n",
        html_escape::encode_double_quoted_attribute(&entry.link),
        html_escape::encode_text(&entry.title)
    );

    if include_description {
        if let Some(description) = &entry.description {
            html.push_str(description);
            html.push('\n');
        }
    }

    html
}

#[async_trait]
impl<W: Write + Send> EntrySink for HtmlReport<W> {
    async fn begin(&mut self, window: &DateWindow) -> Result<()> {
        self.out
            .write_all(render_header(window.cutoff(), window.today()).as_bytes())?;
        Ok(())
    }

    async fn accept(&mut self, _feed_url: &str, entry: &FeedEntry) -> Result<Delivery> {
        self.out
            .write_all(render_entry(entry, self.include_description).as_bytes())?;
        self.out.flush()?;
        Ok(Delivery::Emitted)
    }
}
