use crate::output::{print_json, print_table};
use anyhow::Context;
use archie_core::{
    config::Config,
    fuzzy::{find_similar_features, FeatureMatch},
    graph::TreeRow,
    markdown::progress_bar,
    normalize_feature_key, parse_features_dir, ArchieError, DependencyGraph, Feature,
    FeatureDetail, FeatureStatus, Summary,
};
use chrono::Local;
use serde::Serialize;
use std::path::Path;

const WIDE_BAR: usize = 50;
const COMPACT_BAR: usize = 40;
const DISTRIBUTION_BAR: usize = 30;

/// Statuses in the order feature lists show them: active work first.
const LIST_ORDER: &[FeatureStatus] = &[
    FeatureStatus::Implementing,
    FeatureStatus::SpecReady,
    FeatureStatus::Designed,
    FeatureStatus::UnderDesign,
    FeatureStatus::ReadyForDesign,
    FeatureStatus::UnderReview,
    FeatureStatus::NotReviewed,
    FeatureStatus::Blocked,
    FeatureStatus::Finished,
];

/// Which report `archie status` prints.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum View {
    Overview { compact: bool },
    List,
    Detail(String),
    Deps { compact: bool },
}

impl View {
    pub fn from_flags(compact: bool, feature: Option<Option<String>>, deps: bool) -> Self {
        match feature {
            Some(Some(key)) if !key.trim().is_empty() => View::Detail(key),
            Some(_) => View::List,
            None if deps => View::Deps { compact },
            None => View::Overview { compact },
        }
    }
}

pub fn run(root: &Path, view: View, json: bool) -> anyhow::Result<()> {
    let config = Config::load(root).context("failed to load config")?;
    match view {
        View::Overview { compact } => overview(root, &config, compact, json),
        View::List => list(root, json),
        View::Detail(key) => detail(root, &config, &key, json),
        View::Deps { compact } => deps(root, compact, json),
    }
}

fn load_features(root: &Path) -> anyhow::Result<Vec<Feature>> {
    parse_features_dir(root).context("failed to read features")
}

fn print_no_features() {
    println!("No features found in the features/ directory");
    println!("\nTip: copy .archie/docs/feature-template.md to features/<feature-key>.md");
}

fn percent(count: usize, total: usize) -> usize {
    if total == 0 {
        0
    } else {
        count * 100 / total
    }
}

/// Features grouped for listing: `LIST_ORDER` first, then `UNKNOWN` and
/// unrecognized values so nothing is hidden.
fn grouped(features: &[Feature]) -> Vec<(FeatureStatus, Vec<&Feature>)> {
    let mut groups: Vec<(FeatureStatus, Vec<&Feature>)> = LIST_ORDER
        .iter()
        .map(|status| (status.clone(), Vec::new()))
        .collect();

    for feature in features {
        match groups.iter_mut().find(|(s, _)| *s == feature.status) {
            Some((_, members)) => members.push(feature),
            None => groups.push((feature.status.clone(), vec![feature])),
        }
    }

    groups.retain(|(_, members)| !members.is_empty());
    groups
}

// ---------------------------------------------------------------------------
// overview
// ---------------------------------------------------------------------------

fn overview(root: &Path, config: &Config, compact: bool, json: bool) -> anyhow::Result<()> {
    let features = load_features(root)?;
    let summary = Summary::aggregate_at(
        &features,
        Local::now().date_naive(),
        config.status.stale_days,
    );

    if json {
        #[derive(Serialize)]
        struct OverviewOutput<'a> {
            project: String,
            summary: &'a Summary,
            completion_rate: usize,
            most_common_status: Option<FeatureStatus>,
            insights: Vec<String>,
        }

        return print_json(&OverviewOutput {
            project: config.project_name(root),
            summary: &summary,
            completion_rate: summary.completion_rate(),
            most_common_status: summary.most_common_status(),
            insights: summary.top_insights(),
        });
    }

    if features.is_empty() {
        print_no_features();
        return Ok(());
    }

    if compact {
        println!(
            "Project Status: {} features | {}% complete | {} blocked",
            summary.total_features,
            summary.overall_progress,
            summary.blocked_features.len()
        );
        println!(
            "{} {}%",
            progress_bar(summary.overall_progress, COMPACT_BAR),
            summary.overall_progress
        );
        return Ok(());
    }

    println!("Project Status Report: {}", config.project_name(root));

    println!("\nOverall Progress\n");
    println!(
        "  {} {}%",
        progress_bar(summary.overall_progress, WIDE_BAR),
        summary.overall_progress
    );
    let phases: Vec<String> = summary
        .phase_distribution()
        .into_iter()
        .map(|(bucket, count)| format!("{} ({count})", bucket.label()))
        .collect();
    println!("  {}", phases.join(" → "));

    let total = summary.total_features;
    println!("\nKey Metrics\n");
    println!("  {:<15} {}", "Total Features:", total);
    for (bucket, count) in summary.phase_distribution() {
        println!(
            "  {:<15} {} ({}%)",
            format!("{}:", bucket.label()),
            count,
            percent(count, total)
        );
    }

    println!("\nStatus Distribution\n");
    let max_count = summary.status_counts.values().copied().max().unwrap_or(0);
    for (status, &count) in &summary.status_counts {
        if count == 0 {
            continue;
        }
        let filled = count * DISTRIBUTION_BAR / max_count;
        println!(
            "  {:<18} {}{} {:>3} ({}%)",
            status.label(),
            "█".repeat(filled),
            "░".repeat(DISTRIBUTION_BAR - filled),
            count,
            percent(count, total)
        );
    }

    let insights = summary.top_insights();
    if !insights.is_empty() {
        println!("\nInsights\n");
        for insight in &insights {
            println!("  - {insight}");
        }
    }

    if !summary.blocked_features.is_empty() {
        println!("\nBlocked Features (Need Attention)\n");
        for feature in &summary.blocked_features {
            let owner = if feature.has_owner() {
                feature.owner.as_str()
            } else {
                "Unassigned"
            };
            let reason = if feature.reason.is_empty() {
                "No reason provided"
            } else {
                feature.reason.as_str()
            };
            println!("  {:<30} [{owner}] {reason}", feature.name);
        }
    }

    if !summary.stale_features.is_empty() {
        println!(
            "\nStale Features (Not Updated in {}+ Days)\n",
            summary.stale_days
        );
        for feature in &summary.stale_features {
            println!(
                "  {:<30} {:<18} Last: {}",
                feature.name,
                feature.status.label(),
                feature.last_updated
            );
        }
    }

    println!("\nFeatures by Status\n");
    for (status, members) in &summary.features_by_status {
        if members.is_empty() {
            continue;
        }
        println!("  {} ({})", status.label(), members.len());
        for feature in members {
            let owner = if feature.has_owner() {
                feature.owner.as_str()
            } else {
                "unassigned"
            };
            let updated = match feature.last_updated_date() {
                Some(_) => feature.last_updated.as_str(),
                None => "not set",
            };
            println!("    - {:<30} [{owner}]  Updated: {updated}", feature.name);
        }
    }

    Ok(())
}

// ---------------------------------------------------------------------------
// list
// ---------------------------------------------------------------------------

#[derive(Serialize)]
struct ListEntry<'a> {
    name: &'a str,
    status: &'a FeatureStatus,
    owner: &'a str,
    last_updated: &'a str,
    progress: u32,
}

fn list(root: &Path, json: bool) -> anyhow::Result<()> {
    let features = load_features(root)?;
    let groups = grouped(&features);

    if json {
        let entries: Vec<ListEntry> = groups
            .iter()
            .flat_map(|(_, members)| members.iter())
            .map(|f| ListEntry {
                name: &f.name,
                status: &f.status,
                owner: &f.owner,
                last_updated: &f.last_updated,
                progress: f.status.progress(),
            })
            .collect();
        return print_json(&entries);
    }

    if features.is_empty() {
        print_no_features();
        return Ok(());
    }

    let rows: Vec<Vec<String>> = groups
        .iter()
        .flat_map(|(_, members)| members.iter())
        .map(|f| {
            vec![
                f.name.clone(),
                f.status.label(),
                f.owner.clone(),
                f.last_updated_date()
                    .map(|_| f.last_updated.clone())
                    .unwrap_or_default(),
            ]
        })
        .collect();
    print_table(&["FEATURE", "STATUS", "OWNER", "UPDATED"], rows);

    println!("\nUse: archie status --feature <feature-key> to view details");
    Ok(())
}

// ---------------------------------------------------------------------------
// detail
// ---------------------------------------------------------------------------

fn detail(root: &Path, config: &Config, input: &str, json: bool) -> anyhow::Result<()> {
    let detail = match FeatureDetail::load(root, input) {
        Ok(detail) => detail,
        Err(ArchieError::FeatureNotFound(key)) => return not_found(root, config, &key, json),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to load feature '{input}'"));
        }
    };

    if json {
        #[derive(Serialize)]
        struct DetailOutput<'a> {
            #[serde(flatten)]
            detail: &'a FeatureDetail,
            progress: u32,
        }
        return print_json(&DetailOutput {
            detail: &detail,
            progress: detail.status.progress(),
        });
    }

    print_detail(&detail);
    Ok(())
}

fn print_detail(d: &FeatureDetail) {
    println!("Feature: {}", d.key);

    println!("\nStatus\n");
    println!("  {:<15} {}", "Current:", d.status.label());
    if let Some(owner) = d.owner_display() {
        println!("  {:<15} {owner}", "Owner:");
    }
    if let Some(date) = d.last_updated_display() {
        println!("  {:<15} {date}", "Last Updated:");
    }
    if !d.reason.is_empty() {
        println!("  {:<15} {}", "Reason:", d.reason);
    }
    let progress = d.status.progress();
    if progress > 0 {
        println!("  {:<15} {} {progress}%", "Progress:", progress_bar(progress, WIDE_BAR));
    }

    let summary = d.summary_fields();
    if !summary.is_empty() {
        println!("\nSummary\n");
        for (label, value) in summary {
            println!("  {:<15} {value}", format!("{label}:"));
        }
    }

    if d.has_scope() {
        println!("\nScope\n");
        print_items("In Scope:", d.scope_in());
        print_items("Out of Scope:", d.scope_out());
    }

    print_section("Requirements", d.requirement_items());
    print_section("Non-Requirements", d.non_requirement_items());

    if !d.feature_dependencies.is_empty() {
        println!("\nFeature Dependencies");
        println!("  (Recommended features to be designed before this one)\n");
        for (key, reason) in &d.feature_dependencies {
            println!("  - {key}: {reason}");
        }
    }

    print_section("Acceptance Criteria", d.acceptance_items());
    print_section("Design Constraints", d.constraint_items());

    let artifacts = d.design_artifacts();
    if !artifacts.is_empty() {
        println!("\nDesign Artifacts\n");
        for (label, value) in artifacts {
            println!("  {:<12} {value}", format!("{label}:"));
        }
    }

    let spec = d.spec_fields();
    if !spec.is_empty() {
        println!("\nSpecification\n");
        for (label, value) in spec {
            println!("  {:<15} {value}", format!("{label}:"));
        }
    }

    if let Some(blockers) = d.blockers_display() {
        println!("\nRelated Records\n");
        println!("  {:<15} {blockers}", "Blockers:");
    }

    print_section("Changelog", d.changelog_items());
}

fn print_section<'a>(title: &str, items: impl Iterator<Item = &'a str>) {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return;
    }
    println!("\n{title}\n");
    for item in items {
        println!("  - {item}");
    }
}

fn print_items<'a>(heading: &str, items: impl Iterator<Item = &'a str>) {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return;
    }
    println!("  {heading}");
    for item in items {
        println!("    - {item}");
    }
}

/// Print suggestions and the available features, then fail.
fn not_found(root: &Path, config: &Config, key: &str, json: bool) -> anyhow::Result<()> {
    let features = load_features(root)?;
    let key = normalize_feature_key(key);
    let suggestions: Vec<FeatureMatch> =
        find_similar_features(&key, &features, config.status.suggestion_distance)
            .into_iter()
            .take(config.status.max_suggestions)
            .collect();

    if json {
        #[derive(Serialize)]
        struct NotFoundOutput<'a> {
            error: &'static str,
            key: &'a str,
            suggestions: &'a [FeatureMatch],
            available: Vec<&'a str>,
        }
        print_json(&NotFoundOutput {
            error: "feature_not_found",
            key: &key,
            suggestions: &suggestions,
            available: features.iter().map(|f| f.name.as_str()).collect(),
        })?;
        anyhow::bail!("feature '{key}' not found");
    }

    if features.is_empty() {
        print_no_features();
        anyhow::bail!("feature '{key}' not found");
    }

    if !suggestions.is_empty() {
        println!("Did you mean:\n");
        for m in &suggestions {
            println!("  - {}", m.name);
        }
        println!();
    }

    println!("Available features:\n");
    for (status, members) in grouped(&features) {
        println!("  {}", status.label());
        for feature in members {
            println!("    - {}", feature.name);
        }
    }
    println!("\nUse: archie status --feature <feature-key> to view details");

    anyhow::bail!("feature '{key}' not found")
}

// ---------------------------------------------------------------------------
// deps
// ---------------------------------------------------------------------------

fn deps(root: &Path, compact: bool, json: bool) -> anyhow::Result<()> {
    let graph = DependencyGraph::build(load_features(root)?);
    let order = graph.topological_order();
    let missing = graph.missing_dependencies();
    let rows = graph.tree_rows();

    if json {
        #[derive(Serialize)]
        struct Missing<'a> {
            feature: &'a str,
            dependency: &'a str,
        }

        #[derive(Serialize)]
        struct DepsOutput<'a> {
            depends_on: &'a std::collections::BTreeMap<String, Vec<String>>,
            depended_by: &'a std::collections::BTreeMap<String, Vec<String>>,
            no_dependencies: &'a [String],
            has_dependencies: &'a [String],
            circular_deps: &'a [Vec<String>],
            design_order: &'a [String],
            missing: Vec<Missing<'a>>,
            tree: &'a [TreeRow],
        }

        return print_json(&DepsOutput {
            depends_on: &graph.depends_on,
            depended_by: &graph.depended_by,
            no_dependencies: &graph.no_dependencies,
            has_dependencies: &graph.has_dependencies,
            circular_deps: &graph.circular_deps,
            design_order: &order,
            missing: missing
                .iter()
                .map(|(feature, dependency)| Missing {
                    feature,
                    dependency,
                })
                .collect(),
            tree: &rows,
        });
    }

    if compact {
        let mut line = format!(
            "Dependencies: {} with deps | {} independent",
            graph.has_dependencies.len(),
            graph.no_dependencies.len()
        );
        if graph.has_cycles() {
            line.push_str(&format!(" | {} circular", graph.circular_deps.len()));
        }
        println!("{line}");
        return Ok(());
    }

    println!("Feature Dependencies Graph\n");
    if graph.features.is_empty() {
        println!("  No features found");
        return Ok(());
    }

    if graph.has_cycles() {
        println!("Circular Dependencies Detected!\n");
        for (i, cycle) in graph.circular_deps.iter().enumerate() {
            let first = cycle.first().map(String::as_str).unwrap_or_default();
            println!("  Cycle {}: {} → {first}", i + 1, cycle.join(" → "));
        }
        println!();
    }

    if graph.has_dependencies.is_empty() {
        println!("  All features are independent (no dependencies)");
    } else {
        println!("Dependency tree (prerequisite → features that build on it):\n");
        for row in &rows {
            let mut line = format!("  {}{} [{}]", row.lead, row.key, row.status.label());
            if !row.also_depends_on.is_empty() {
                line.push_str(&format!(" (also depends on: {})", row.also_depends_on.join(", ")));
            }
            if row.repeated {
                line.push_str(" (see above)");
            }
            println!("{line}");
        }
    }

    if !missing.is_empty() {
        println!("\nMissing Dependencies\n");
        for (feature, dependency) in &missing {
            println!("  {feature} → {dependency} [NOT FOUND]");
        }
    }

    if !order.is_empty() {
        println!("\nRecommended Design Order");
        println!("  (prerequisites first)\n");
        for (i, key) in order.iter().enumerate() {
            let status = graph
                .feature(key)
                .map(|f| f.status.label())
                .unwrap_or_default();
            println!("  {:>2}. {:<30} [{status}]", i + 1, key);
        }
    }

    Ok(())
}
