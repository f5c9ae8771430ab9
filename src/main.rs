// src/main.rs

mod cli;
mod model;
mod reddit;
mod replay;

use anyhow::Context;
use clap::Parser;
use cli::{Args, Command};
use std::time::Instant;
use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .init();

    let args = Args::parse();
    let start_time = Instant::now();

    match &args.command {
        Command::Replay(replay_args) => {
            let report = replay::run(replay_args).context("replay failed")?;
            let mode = if report.live { "live" } else { "test" };
            println!(
                "Replay finished in {:.2?} ({mode} mode). {} files, {} commits. Preview written to {}.",
                start_time.elapsed(),
                report.files,
                report.commits,
                replay_args.preview.display()
            );
        }
        Command::Post(post_args) => {
            let summary = reddit::run_post(post_args).context("posting run failed")?;
            println!("{summary}");
        }
        Command::Index(index_args) => {
            let count = reddit::run_index(index_args).context("indexing export failed")?;
            println!("Found {count} saved posts.");
        }
        Command::Sort(sort_args) => {
            let count = reddit::run_sort(sort_args).context("sorting saved posts failed")?;
            println!("Sorted {count} posts from oldest to newest.");
        }
    }

    println!("Total time: {:.2?}", start_time.elapsed());
    Ok(())
}
