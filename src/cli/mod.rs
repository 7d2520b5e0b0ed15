pub mod commands;

use clap::{ArgGroup, Args, Parser, Subcommand};
use crate::config::Config;
use crate::error::Result;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "feed-scan")]
#[command(about = "Scan RSS/Atom feeds for recent entries matching tags or keywords")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(author = env!("CARGO_PKG_AUTHORS"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long, global = true)]
    pub debug: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print matching entries as an HTML news roundup
    Report(ReportArgs),

    /// Store matching entries, with their page text, in the document store
    Persist(PersistArgs),

    /// Generate shell completions
    Completions {
        /// Shell type
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("term_source").required(true).args(["terms", "smart_terms"])))]
pub struct ReportArgs {
    /// File with the feed list
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of days to include
    #[arg(short, long, default_value_t = 1)]
    pub days: u32,

    /// File with search terms
    #[arg(short, long)]
    pub terms: Option<PathBuf>,

    /// Use the most frequent tags found in the feeds
    #[arg(short, long)]
    pub smart_terms: bool,

    /// Include entry descriptions
    #[arg(long)]
    pub include_desc: bool,
}

#[derive(Args, Debug)]
#[command(group(ArgGroup::new("mode").required(true).args(["keywords", "tags"])))]
pub struct PersistArgs {
    /// File with the feed list
    #[arg(short, long)]
    pub input: PathBuf,

    /// Number of days to include
    #[arg(short, long, default_value_t = 1)]
    pub days: u32,

    /// Search titles and descriptions
    #[arg(short, long)]
    pub keywords: bool,

    /// Search entry tags
    #[arg(short, long)]
    pub tags: bool,

    /// Include entry descriptions
    #[arg(long)]
    pub include_desc: bool,

    /// Comma delimited list of terms, use "*" for all
    pub terms: String,
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        if let Commands::Completions { shell } = self.command {
            commands::generate_completions(shell);
            return Ok(());
        }

        let config = Config::resolve(self.config.as_deref())?;
        commands::init_logging(self.debug, self.verbose, &config.logging)?;

        match self.command {
            Commands::Report(args) => commands::report(args, &config).await.map(|_| ()),
            Commands::Persist(args) => commands::persist(args, &config).await.map(|_| ()),
            Commands::Completions { .. } => Ok(()),
        }
    }
}
