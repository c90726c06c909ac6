use crate::output::print_json;
use anyhow::Context;
use archie_core::{
    config::Config,
    export::{self, ExportConfig},
    normalize_feature_key,
};
use std::path::{Path, PathBuf};

/// Flags of `archie export`.
#[derive(Debug, Default)]
pub struct ExportArgs {
    pub output: Option<PathBuf>,
    pub no_toc: bool,
    pub no_stats: bool,
    pub no_dep_graph: bool,
    pub features: Vec<String>,
    pub root_docs: Vec<String>,
    pub workflows: bool,
    pub specs: bool,
}

pub fn run(root: &Path, args: ExportArgs, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    let export_config = build_config(root, &config, args)?;

    let result = export::run(&export_config).context("export failed")?;

    if json {
        return print_json(&result);
    }

    println!(
        "Exported {} documents ({} features) to {}",
        result.document_count,
        result.feature_count,
        result.output_path.display()
    );
    println!("  size:      {} bytes", result.bytes);
    println!("  generated: {}", result.generated_at);
    if !result.warnings.is_empty() {
        println!("\nSkipped:");
        for warning in &result.warnings {
            println!("  - {warning}");
        }
    }
    Ok(())
}

/// Everything by default; `--feature` / `--root-doc` narrow the selection
/// and must name something that exists.
fn build_config(root: &Path, config: &Config, args: ExportArgs) -> anyhow::Result<ExportConfig> {
    let mut export_config =
        ExportConfig::for_project(root).context("failed to read features")?;

    if let Some(output) = args.output {
        export_config.output_path = output;
    }

    if !args.features.is_empty() {
        let mut selected = Vec::with_capacity(args.features.len());
        for input in &args.features {
            let key = normalize_feature_key(input);
            if !export_config.include_features.contains(&key) {
                anyhow::bail!(
                    "feature '{key}' not found (available: {})",
                    export_config.include_features.join(", ")
                );
            }
            if !selected.contains(&key) {
                selected.push(key);
            }
        }
        export_config.include_features = selected;
    }

    if !args.root_docs.is_empty() {
        let mut selected = Vec::with_capacity(args.root_docs.len());
        for name in &args.root_docs {
            let name = name.trim_end_matches('/').to_string();
            if !export_config.include_root.contains(&name) {
                anyhow::bail!(
                    "root document '{name}' not found (available: {})",
                    export_config.include_root.join(", ")
                );
            }
            if !selected.contains(&name) {
                selected.push(name);
            }
        }
        export_config.include_root = selected;
    }

    export_config.include_workflows = args.workflows;
    export_config.include_specs = args.specs;
    export_config.generate_toc = config.export.toc && !args.no_toc;
    export_config.generate_stats = config.export.stats && !args.no_stats;
    export_config.generate_dep_graph = config.export.dep_graph && !args.no_dep_graph;
    export_config.stale_days = config.status.stale_days;

    Ok(export_config)
}
