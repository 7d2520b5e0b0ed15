use std::io;

use clap::CommandFactory;
use clap_complete::{generate, Shell};
use tracing::{debug, info};
use tracing_subscriber::{fmt, EnvFilter};

use crate::cli::{Cli, PersistArgs, ReportArgs};
use crate::config::{Config, LoggingConfig};
use crate::error::{Error, Result};
use crate::feed::{FeedFetcher, FeedList};
use crate::filter::{DateWindow, MatchMode, SmartTermDeriver, TermSet};
use crate::scan::{ScanOptions, ScanStats, Scanner};
use crate::sink::{HtmlReport, PersistSink};
use crate::storage::CouchStore;

/// Print the HTML roundup for the feeds in `args.input`.
pub async fn report(args: ReportArgs, config: &Config) -> Result<ScanStats> {
    let feeds = FeedList::load(&args.input)?;
    info!("Loaded {} feeds from {}", feeds.len(), args.input.display());

    let fetcher = FeedFetcher::from_settings(&config.settings)?;

    let terms = match (&args.terms, args.smart_terms) {
        (Some(path), _) => TermSet::load(path)?,
        (None, true) => {
            let smart = SmartTermDeriver::new(&fetcher).derive(&feeds).await;
            smart.term_set()
        }
        (None, false) => {
            return Err(Error::Invalid("Either --terms or --smart-terms is required".to_string()));
        }
    };
    info!(terms = %terms, "Matching terms");

    let options = ScanOptions {
        window: DateWindow::ending_today(args.days),
        mode: MatchMode::Either,
        terms,
    };

    let mut sink = HtmlReport::new(io::stdout(), args.include_desc);
    Scanner::new(&fetcher, &options).run(&feeds, &mut sink).await
}

/// Store entries from the feeds in `args.input` that match `args.terms`.
pub async fn persist(args: PersistArgs, config: &Config) -> Result<ScanStats> {
    let feeds = FeedList::load(&args.input)?;
    info!("Loaded {} feeds from {}", feeds.len(), args.input.display());

    let fetcher = FeedFetcher::from_settings(&config.settings)?;
    let store = CouchStore::new(&config.store, config.timeout())?;
    info!("Storing documents in {}", store.database_url());

    let mode = if args.tags { MatchMode::Tags } else { MatchMode::Keywords };
    if args.include_desc {
        debug!("--include-desc has no effect when persisting");
    }

    let options = ScanOptions {
        window: DateWindow::ending_today(args.days),
        mode,
        terms: TermSet::parse_list(&args.terms),
    };
    info!(terms = %options.terms, mode = ?options.mode, "Matching terms");

    let mut sink = PersistSink::new(&fetcher, &store, io::stdout());
    Scanner::new(&fetcher, &options).run(&feeds, &mut sink).await
}

/// Flags win over `RUST_LOG`, which wins over the configured level.
fn log_filter(debug: bool, verbose: bool, rust_log: Option<&str>, level: &str) -> EnvFilter {
    if debug {
        EnvFilter::new("debug")
    } else if verbose {
        EnvFilter::new("info")
    } else {
        rust_log
            .and_then(|directives| EnvFilter::try_new(directives).ok())
            .unwrap_or_else(|| EnvFilter::new(level))
    }
}

/// Initialize logging on stderr so stdout stays reserved for output.
pub fn init_logging(debug: bool, verbose: bool, logging: &LoggingConfig) -> Result<()> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(debug, verbose, rust_log.as_deref(), &logging.level);

    let builder = fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_file(debug)
        .with_line_number(debug);

    let result = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
    result.map_err(|e| Error::Config(format!("Failed to initialize logging: {}", e)))?;

    debug!("Logging initialized");
    Ok(())
}

pub fn generate_completions(shell: Shell) {
    let mut cmd = Cli::command();
    generate(shell, &mut cmd, "feed-scan", &mut io::stdout());
}
