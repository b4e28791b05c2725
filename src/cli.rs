use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use url::Url;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProgressMode {
    /// Enable the spinner when stderr is a TTY.
    Auto,
    /// Always show the spinner (even when piped).
    Always,
    /// Never show the spinner.
    Never,
}

#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Args {
    /// Base URL of the posts API; requests go to `<api-url>/posts`.
    #[arg(long, env = "POSTS_API_URL")]
    pub api_url: Url,

    /// HTTP User-Agent sent with every request.
    #[arg(long, default_value = "posts-feed/0.1")]
    pub user_agent: String,

    /// Per-request timeout in seconds (0 disables the timeout).
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Refetch the cached post list once it is older than this many seconds.
    ///
    /// Without this flag the cached list only refreshes after a write or an explicit refresh.
    #[arg(long)]
    pub cache_max_age_secs: Option<u64>,

    /// Progress display: `auto`, `always`, or `never`.
    #[arg(long, value_enum, default_value = "auto")]
    pub progress: ProgressMode,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Print every post as JSON.
    List,
    /// Print one post as JSON.
    Get { id: u64 },
    /// Create a post and print the stored record.
    Create(PostFields),
    /// Replace a post and print the stored record.
    Update {
        id: u64,
        #[command(flatten)]
        fields: PostFields,
    },
    /// Delete a post.
    Delete { id: u64 },
    /// Load the post list and write it as an HTML page.
    Render {
        /// Output HTML file.
        #[arg(long, default_value = "posts.html")]
        out: PathBuf,

        /// Page title.
        #[arg(long, default_value = "Posts")]
        title: String,
    },
}

#[derive(Debug, Clone, clap::Args)]
pub struct PostFields {
    #[arg(long)]
    pub name: String,

    /// Image reference, usually a URL.
    #[arg(long, default_value = "")]
    pub img: String,

    #[arg(long)]
    pub text: String,

    /// Free-form time label, e.g. `5 min ago`.
    #[arg(long, default_value = "")]
    pub time: String,
}
