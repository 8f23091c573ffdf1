//! CLI command definitions and handlers

mod build;
mod score;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::config::EngineConfig;

/// Parse and validate workers count (1-64)
fn parse_workers(s: &str) -> Result<usize, String> {
    let n: usize = s
        .parse()
        .map_err(|_| format!("'{}' is not a valid number", s))?;
    if n == 0 {
        Err("workers must be at least 1".to_string())
    } else if n > 64 {
        Err("workers cannot exceed 64".to_string())
    } else {
        Ok(n)
    }
}

/// Taglex - PMI tag dictionaries and multi-resolution text scoring
#[derive(Parser, Debug)]
#[command(name = "taglex")]
#[command(
    version,
    about = "Build PMI-weighted tag dictionaries from occurrence counts and score text against them",
    after_help = "\
Examples:
  taglex build --counts counts.json --service articles --out dicts.json
  taglex build --counts counts.json --config taglex.toml --service articles --out dicts.json
  taglex score --dictionaries dicts.json --text \"premier league transfer rumours\"
  taglex score --dictionaries dicts.json --file article.txt --top 3"
)]
pub struct Cli {
    /// Log level (error, warn, info, debug, trace)
    #[arg(long, global = true, default_value = "info", value_parser = ["error", "warn", "info", "debug", "trace"])]
    pub log_level: String,

    /// Number of parallel workers (1-64)
    #[arg(long, global = true, default_value = "8", value_parser = parse_workers)]
    pub workers: usize,

    /// Path to a taglex.toml config file
    #[arg(long, global = true, env = "TAGLEX_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Build tag dictionaries from an occurrence counts file
    #[command(after_help = "\
The counts file maps tags to per-size occurrence subsets:
  { \"tags\": { \"sports\": { \"1\": { \"words\": { \"goal\": { \"tag_count\": 10, \"corpus_count\": 100 } },
                               \"corpus_total\": 1000, \"tag_total\": 50 } } } }")]
    Build {
        /// Occurrence counts JSON file
        #[arg(long)]
        counts: PathBuf,

        /// Service id the dictionaries belong to
        #[arg(long)]
        service: String,

        /// Output path for the dictionary artifact
        #[arg(long, short = 'o')]
        out: PathBuf,
    },

    /// Score text against built dictionaries and rank the tags
    Score {
        /// Dictionary artifact produced by `taglex build`
        #[arg(long)]
        dictionaries: PathBuf,

        /// Text to score
        #[arg(long)]
        text: Option<String>,

        /// Read the text to score from a file
        #[arg(long, conflicts_with = "text")]
        file: Option<PathBuf>,

        /// Show only the top N tags
        #[arg(long)]
        top: Option<usize>,
    },
}

pub fn run(cli: Cli) -> Result<()> {
    let config = match &cli.config {
        Some(path) => EngineConfig::load(path)?,
        None => EngineConfig::default(),
    };

    match cli.command {
        Commands::Build {
            counts,
            service,
            out,
        } => build::run(&counts, &service, &out, &config, cli.workers),
        Commands::Score {
            dictionaries,
            text,
            file,
            top,
        } => score::run(&dictionaries, text.as_deref(), file.as_deref(), top, &config),
    }
}
