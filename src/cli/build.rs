//! Build dictionaries from an occurrence counts file

use anyhow::{Context, Result};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;

use crate::artifact::DictionaryArtifact;
use crate::config::EngineConfig;
use crate::models::Subset;
use crate::pipeline::{BuildPipeline, StaticSource};
use crate::registry::ScorerRegistry;

/// On-disk shape of the occurrence counts input.
#[derive(Debug, Deserialize)]
struct CountsFile {
    /// tag id -> n-gram size -> subset
    tags: HashMap<String, HashMap<u32, Subset>>,
}

pub(crate) fn run(
    counts: &Path,
    service: &str,
    out: &Path,
    config: &EngineConfig,
    workers: usize,
) -> Result<()> {
    let data = std::fs::read_to_string(counts)
        .with_context(|| format!("reading counts file {}", counts.display()))?;
    let counts_file: CountsFile = serde_json::from_str(&data)
        .with_context(|| format!("parsing counts file {}", counts.display()))?;

    let mut tags: Vec<String> = counts_file.tags.keys().cloned().collect();
    tags.sort();
    if tags.is_empty() {
        anyhow::bail!("counts file {} contains no tags", counts.display());
    }

    let mut source = StaticSource::new();
    for (tag, sizes) in counts_file.tags {
        for (size, subset) in sizes {
            source.insert(tag.clone(), size, subset);
        }
    }

    println!(
        "\nBuilding dictionaries for service '{}' ({} tags, sizes {:?})\n",
        style(service).cyan(),
        tags.len(),
        config.sizes()
    );

    let total_units = tags.len() * config.sizes().len();
    let bar = ProgressBar::new(total_units as u64);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
            .expect("valid template")
            .progress_chars("█▓▒░  "),
    );
    bar.set_message("building");
    let progress_bar = bar.clone();

    let registry = ScorerRegistry::new();
    let pipeline = BuildPipeline::new(registry.clone())
        .with_workers(workers)
        .with_options(config.build_options())
        .with_progress_callback(Box::new(move |done, _total| {
            progress_bar.set_position(done as u64);
        }));

    let report = pipeline.run(&source, service, &tags, config.sizes())?;
    bar.finish_with_message("done");

    let set = registry
        .get(service)
        .context("registry lost the committed scorer set")?;
    DictionaryArtifact::from_scorers(service, &set).save(out)?;

    println!();
    for tag in &tags {
        if let Some(scorer) = set.get(tag) {
            let entries: usize = scorer.dictionaries().values().map(|dict| dict.len()).sum();
            println!(
                "  {} {} {} entries across {} sizes",
                style("→").dim(),
                style(format!("{:<24}", tag)).cyan(),
                entries,
                scorer.sizes().len()
            );
        }
    }
    println!("\n{}{}", style("✓ ").green(), report.summary());
    println!(
        "{}Wrote {}",
        style("✓ ").green(),
        style(out.display()).cyan()
    );
    Ok(())
}
