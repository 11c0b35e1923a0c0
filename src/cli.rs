//! Command-line interface definitions.
//!
//! Every flag is optional: running the binary with no arguments publishes the
//! built-in merged feed to `feed.xml`. Flags override values from the
//! `--config` file.

use crate::aggregator::SourceFailurePolicy;
use crate::config::Mode;
use crate::validate::ValidationPolicy;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments.
///
/// # Examples
///
/// ```sh
/// # Built-in sources, default output
/// news_feed
///
/// # Custom sources, published into a static site directory
/// news_feed -c feeds.yaml -o public/feed.xml
///
/// # Fail the run if any source is down
/// news_feed --on-source-failure abort
/// ```
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Path to a YAML settings file
    #[arg(short, long, env = "NEWS_FEED_CONFIG")]
    pub config: Option<PathBuf>,

    /// Where to write the feed (default: feed.xml)
    #[arg(short, long, env = "NEWS_FEED_OUTPUT")]
    pub output: Option<PathBuf>,

    /// HTTP request timeout in seconds
    #[arg(long)]
    pub timeout_secs: Option<u64>,

    /// Publish a single source's feed or the merged feed
    #[arg(long, value_enum)]
    pub mode: Option<Mode>,

    /// What to do with items that fail validation
    #[arg(long, value_enum)]
    pub on_invalid_item: Option<ValidationPolicy>,

    /// What to do when a source cannot be fetched or parsed
    #[arg(long, value_enum)]
    pub on_source_failure: Option<SourceFailurePolicy>,
}
