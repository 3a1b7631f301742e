mod cli;

use std::time::Duration;

use anyhow::Result;
use figcap::{config::Config, execution::BatchOptions, handlers};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // .env is optional; real environment variables still win
    let _ = dotenvy::dotenv();

    let args = cli::Cli::parse();

    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();

    // Load config
    let cfg = Config::load();

    match args.command {
        cli::Command::Fetch { url, ids, out } => handlers::fetch::run(&cfg, url.as_deref(), &ids, &out).await,
        cli::Command::Extract { sources, figures, output } => handlers::extract::run(&sources, &figures, &output),
        cli::Command::Regenerate {
            input,
            output,
            model,
            max_tokens,
            limit,
        } => {
            // CLI overrides config
            let model = model.unwrap_or_else(|| cfg.default_model());
            let max_tokens = max_tokens.unwrap_or_else(|| cfg.max_tokens());
            handlers::regenerate::run(&cfg, &input, &output, &model, max_tokens, limit).await
        }
        cli::Command::Run {
            input,
            output,
            root,
            suffix,
            timeout,
            python,
        } => {
            let timeout = timeout.map(Duration::from_secs).unwrap_or_else(|| cfg.exec_timeout());
            let python = python.unwrap_or_else(|| cfg.python_path());
            let opts = BatchOptions { root, suffix };
            handlers::run::run(&input, &output, &opts, &python, timeout).await
        }
    }
}
