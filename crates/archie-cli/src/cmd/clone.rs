use crate::output::print_json;
use anyhow::Context;
use archie_core::clone::{self, CloneItem, CloneStrategy};
use std::path::Path;

pub fn run(
    source: &Path,
    target: &Path,
    strategy: Option<&str>,
    items: &[String],
    json: bool,
) -> anyhow::Result<()> {
    let (strategy, items) = resolve_items(strategy, items)?;

    let report = clone::clone_project(source, target, strategy, items)
        .with_context(|| format!("failed to clone {}", source.display()))?;

    if json {
        return print_json(&report);
    }

    println!(
        "Cloned {} into {} ({})",
        report.source.display(),
        report.target.display(),
        report.strategy.description()
    );
    for file in &report.copied_files {
        println!("  copied:  {file}");
    }
    for dir in &report.copied_dirs {
        println!("  copied:  {dir}/");
    }
    for path in &report.skipped {
        println!("  skipped: {path} (already exists)");
    }
    for file in &report.init.created_files {
        println!("  created: {file}");
    }
    if !report.errors.is_empty() {
        println!("\nErrors:");
        for err in &report.errors {
            println!("  - {err}");
        }
        anyhow::bail!("{} item(s) could not be copied", report.errors.len());
    }
    Ok(())
}

/// `--item` implies the custom strategy; the custom strategy needs items.
fn resolve_items(
    strategy: Option<&str>,
    names: &[String],
) -> anyhow::Result<(CloneStrategy, Vec<CloneItem>)> {
    let strategy = match strategy {
        Some(s) => s.parse::<CloneStrategy>()?,
        None if names.is_empty() => CloneStrategy::Context,
        None => CloneStrategy::Custom,
    };

    match strategy {
        CloneStrategy::Custom if names.is_empty() => {
            anyhow::bail!("the custom strategy needs at least one --item")
        }
        CloneStrategy::Custom => Ok((strategy, clone::custom_items(names)?)),
        _ if !names.is_empty() => {
            anyhow::bail!("--item only applies to the custom strategy, not '{strategy}'")
        }
        _ => Ok((strategy, strategy.items())),
    }
}
