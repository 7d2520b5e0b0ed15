pub mod cli;
pub mod config;
pub mod content;
pub mod error;
pub mod feed;
pub mod filter;
pub mod scan;
pub mod sink;
pub mod storage;

pub use config::Config;
pub use error::{Error, Result};
pub use feed::{FeedEntry, FeedList};
pub use filter::{DateWindow, MatchMode, TermSet};
pub use scan::{ScanOptions, ScanStats, Scanner};
