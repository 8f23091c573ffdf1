//! Score text against a dictionary artifact and rank the tags

use anyhow::{Context, Result};
use console::style;
use std::cmp::Ordering;
use std::path::Path;

use crate::artifact::DictionaryArtifact;
use crate::config::EngineConfig;
use crate::registry::ScorerRegistry;

pub(crate) fn run(
    dictionaries: &Path,
    text: Option<&str>,
    file: Option<&Path>,
    top: Option<usize>,
    config: &EngineConfig,
) -> Result<()> {
    let text = match (text, file) {
        (Some(text), _) => text.to_string(),
        (None, Some(path)) => std::fs::read_to_string(path)
            .with_context(|| format!("reading text file {}", path.display()))?,
        (None, None) => anyhow::bail!("provide --text or --file"),
    };

    let artifact = DictionaryArtifact::load(dictionaries)?;
    let service = artifact.service_id.clone();
    let scorers = artifact.into_scorers()?;

    let registry = ScorerRegistry::new();
    let guard = registry.begin_build(&service)?;
    guard.commit(scorers);
    let set = registry
        .get(&service)
        .context("service missing after commit")?;

    let multiplier = config.scoring.multiplier;
    let normalized = config.scoring.normalized;

    let mut ranked: Vec<(&String, f64)> = Vec::new();
    let mut no_data: Vec<&String> = Vec::new();
    for (tag, scorer) in set.iter() {
        let score = scorer.score(&text, multiplier, normalized);
        // -1.0 means the tag has no dictionary data; keep it out of the ranking
        if score == -1.0 {
            no_data.push(tag);
        } else {
            ranked.push((tag, score));
        }
    }
    ranked.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(Ordering::Equal));
    no_data.sort();

    println!("\nScores for service '{}'\n", style(&service).cyan());
    if ranked.is_empty() {
        println!("  {}", style("no scorable tags").dim());
    }
    let limit = top.unwrap_or(ranked.len());
    for (rank, (tag, score)) in ranked.iter().take(limit).enumerate() {
        println!(
            "  {:>2}. {} {:>10.4}",
            rank + 1,
            style(format!("{:<24}", tag)).cyan(),
            score
        );
    }
    if !no_data.is_empty() {
        let names: Vec<&str> = no_data.iter().map(|tag| tag.as_str()).collect();
        println!(
            "\n  {} {}",
            style("no data:").dim(),
            style(names.join(", ")).dim()
        );
    }
    Ok(())
}
