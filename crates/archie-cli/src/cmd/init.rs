use crate::output::print_json;
use anyhow::Context;
use archie_core::project;
use std::path::Path;

pub fn run(target: &Path, json: bool) -> anyhow::Result<()> {
    let report = project::init_project(target)
        .with_context(|| format!("failed to initialize {}", target.display()))?;

    if json {
        return print_json(&report);
    }

    println!("Initializing archie in: {}", target.display());
    for dir in &report.created_dirs {
        println!("  created: {dir}/");
    }
    for file in &report.created_files {
        println!("  created: {file}");
    }
    for file in &report.refreshed_files {
        println!("  updated: {file}");
    }

    if report.is_fresh() {
        println!("\nNext: copy .archie/docs/feature-template.md to features/<feature-key>.md");
    } else {
        println!("\nProject already initialized; existing documents left untouched.");
    }
    Ok(())
}
