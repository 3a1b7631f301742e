use std::path::PathBuf;

use clap::{ArgGroup, Parser, Subcommand};

#[derive(Parser, Debug, Clone)]
#[command(name = "figcap", about = "Figure/caption dataset builder and plot regeneration validator", version)]
pub struct Cli {
    /// Log at debug level (RUST_LOG takes precedence when set).
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Download arXiv source bundles into one directory per paper id.
    #[command(group(ArgGroup::new("source").args(["url", "ids"]).required(true).multiple(true)))]
    Fetch {
        /// Search-results page to scrape for abstract links.
        #[arg(long)]
        url: Option<String>,

        /// Explicit paper ids, in addition to any found at --url.
        #[arg(long = "id", value_name = "ID", action = clap::ArgAction::Append)]
        ids: Vec<String>,

        /// Directory receiving `<id>/` source trees.
        #[arg(long, default_value = "neurips")]
        out: PathBuf,
    },

    /// Mine figure/caption pairs from a directory of source collections.
    Extract {
        /// Directory whose subdirectories are source collections.
        #[arg(long, default_value = "neurips")]
        sources: PathBuf,

        /// Where accepted images are copied, one subdirectory per collection.
        #[arg(long, default_value = "neurips_figures")]
        figures: PathBuf,

        /// JSON array of figure records (appended to if present).
        #[arg(long, default_value = "neurips_figures_and_captions.json")]
        output: PathBuf,
    },

    /// Ask a vision model to redraw each figure as matplotlib code.
    Regenerate {
        /// JSON array of figure records.
        #[arg(long, default_value = "neurips_figures_and_captions.json")]
        input: PathBuf,

        /// JSON array of records with generated code (appended to if present).
        #[arg(long, default_value = "merged_llava_direct.json")]
        output: PathBuf,

        /// Model to use; defaults to DEFAULT_MODEL.
        #[arg(long)]
        model: Option<String>,

        /// Completion token limit; defaults to MAX_TOKENS.
        #[arg(long = "max-tokens")]
        max_tokens: Option<u32>,

        /// Stop after this many new figures.
        #[arg(long)]
        limit: Option<usize>,
    },

    /// Execute generated code and record whether it runs.
    Run {
        /// JSON array of records carrying `llava_code`.
        #[arg(long, default_value = "merged_llava_direct.json")]
        input: PathBuf,

        /// JSON array of execution records (appended to if present).
        #[arg(long, default_value = "llava_output_direct.json")]
        output: PathBuf,

        /// Root of the regenerated figure tree.
        #[arg(long, default_value = "llava")]
        root: PathBuf,

        /// Suffix appended to each regenerated file name.
        #[arg(long, default_value = "direct")]
        suffix: String,

        /// Per-snippet wall-clock limit in seconds; defaults to EXEC_TIMEOUT.
        #[arg(long)]
        timeout: Option<u64>,

        /// Interpreter executable; defaults to PYTHON_PATH.
        #[arg(long)]
        python: Option<String>,
    },
}

impl Cli {
    pub fn parse() -> Self {
        <Self as Parser>::parse()
    }
}
