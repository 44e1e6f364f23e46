use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Parser)]
#[command(
    name = "vidsum",
    about = "Video transcript summaries with timestamped highlights",
    version = env!("CARGO_PKG_VERSION"),
)]
pub struct Cli {
    /// Video URL or video ID (reads one per line from stdin if omitted)
    pub url: Option<String>,

    /// Preferred caption language, in order of preference (repeatable)
    #[arg(short, long = "lang")]
    pub languages: Vec<String>,

    /// Number of highlights to produce
    #[arg(short = 'k', long = "highlights")]
    pub highlights: Option<usize>,

    /// Language to write the summary in
    #[arg(short, long)]
    pub target_lang: Option<String>,

    /// Link highlights to seek positions in this local file instead of the hosted player
    #[arg(long)]
    pub local_file: Option<PathBuf>,

    /// Output format: text (default), json
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    pub format: OutputFormat,

    /// Write output to file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// LLM model for summarization
    #[arg(long)]
    pub model: Option<String>,

    /// Skip the summarization service and use an extractive summary
    #[arg(long)]
    pub no_summary: bool,

    /// Show caption source and metadata
    #[arg(short, long)]
    pub verbose: bool,
}
