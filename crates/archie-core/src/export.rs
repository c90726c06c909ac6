use crate::aggregate::{Summary, DEFAULT_STALE_DAYS};
use crate::detail::{normalize_feature_key, FeatureDetail};
use crate::error::{ArchieError, Result};
use crate::graph::DependencyGraph;
use crate::markdown::{self, SEPARATOR};
use crate::parser::parse_features_dir;
use crate::paths;
use crate::{io, Feature};
use chrono::{Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

/// Any of these under the root marks a directory as exportable.
const PROJECT_MARKERS: &[&str] = &[
    "background.md",
    "dependency.md",
    "storage.md",
    paths::API_DIR,
    paths::ARCHIE_DIR,
    paths::FEATURES_DIR,
];

const PROGRESS_BAR_WIDTH: usize = 50;

// ---------------------------------------------------------------------------
// Configuration and results
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct ExportConfig {
    pub project_root: PathBuf,
    pub output_path: PathBuf,
    /// Root documents (`background.md`, …, or `api`) in output order.
    pub include_root: Vec<String>,
    pub include_features: Vec<String>,
    pub include_workflows: bool,
    pub include_specs: bool,
    pub generate_toc: bool,
    pub generate_stats: bool,
    pub generate_dep_graph: bool,
    pub stale_days: u32,
}

impl ExportConfig {
    /// Every existing root document and every feature, all sections on.
    pub fn for_project(root: &Path) -> Result<Self> {
        let features = parse_features_dir(root)?
            .into_iter()
            .map(|f| f.name)
            .collect();
        Ok(Self {
            project_root: root.to_path_buf(),
            output_path: default_output_path(Local::now().date_naive()),
            include_root: available_root_docs(root),
            include_features: features,
            include_workflows: false,
            include_specs: false,
            generate_toc: true,
            generate_stats: true,
            generate_dep_graph: true,
            stale_days: DEFAULT_STALE_DAYS,
        })
    }
}

/// `./archie-export-YYYY-MM-DD.md`
pub fn default_output_path(today: NaiveDate) -> PathBuf {
    PathBuf::from(format!("archie-export-{}.md", today.format("%Y-%m-%d")))
}

/// Root documents present under `root`, in scaffold order, then `api`.
pub fn available_root_docs(root: &Path) -> Vec<String> {
    let mut docs: Vec<String> = paths::ROOT_DOCS
        .iter()
        .filter(|doc| root.join(doc).is_file())
        .map(|doc| doc.to_string())
        .collect();
    if root.join(paths::API_DIR).is_dir() {
        docs.push(paths::API_DIR.to_string());
    }
    docs
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CollectionWarning {
    pub path: String,
    pub reason: String,
}

impl fmt::Display for CollectionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.path, self.reason)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExportResult {
    pub output_path: PathBuf,
    pub document_count: usize,
    pub feature_count: usize,
    pub bytes: usize,
    pub generated_at: String,
    pub warnings: Vec<String>,
}

// ---------------------------------------------------------------------------
// Collection
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct RootDocument {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct FeatureExport {
    pub detail: FeatureDetail,
    pub content: String,
    pub workflow: Option<String>,
    pub spec: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct Collection {
    pub root_docs: Vec<RootDocument>,
    pub features: Vec<FeatureExport>,
    pub warnings: Vec<CollectionWarning>,
}

impl Collection {
    pub fn document_count(&self) -> usize {
        self.root_docs.len()
            + self.features.len()
            + self.features.iter().filter(|f| f.workflow.is_some()).count()
            + self.features.iter().filter(|f| f.spec.is_some()).count()
    }
}

/// Error unless `root` holds at least one recognizable project entry.
pub fn validate_project(root: &Path) -> Result<()> {
    if PROJECT_MARKERS.iter().any(|m| root.join(m).exists()) {
        Ok(())
    } else {
        Err(ArchieError::NotAProject(root.to_path_buf()))
    }
}

/// Read everything `config` selects. Unreadable items become warnings.
pub fn collect(config: &ExportConfig) -> Collection {
    let root = &config.project_root;
    let mut collection = Collection::default();

    for name in &config.include_root {
        match read_root_doc(root, name) {
            Ok(content) => collection.root_docs.push(RootDocument {
                name: name.clone(),
                content,
            }),
            Err(e) => collection.warnings.push(CollectionWarning {
                path: name.clone(),
                reason: e.to_string(),
            }),
        }
    }

    for requested in &config.include_features {
        let key = normalize_feature_key(requested);
        let detail = match FeatureDetail::load(root, &key) {
            Ok(d) => d,
            Err(e) => {
                collection.warnings.push(CollectionWarning {
                    path: format!("{}/{key}.{}", paths::FEATURES_DIR, paths::MARKDOWN_EXT),
                    reason: e.to_string(),
                });
                continue;
            }
        };

        let workflow = if config.include_workflows {
            collect_workflow(root, &key, &mut collection.warnings)
        } else {
            None
        };
        let spec = if config.include_specs {
            collect_spec(root, &key, &mut collection.warnings)
        } else {
            None
        };

        collection.features.push(FeatureExport {
            content: render_feature(&detail),
            detail,
            workflow,
            spec,
        });
    }

    tracing::debug!(
        root_docs = collection.root_docs.len(),
        features = collection.features.len(),
        warnings = collection.warnings.len(),
        "collected export documents"
    );
    collection
}

/// A root file, or for a directory such as `api/` its `api/api.md`.
fn read_root_doc(root: &Path, name: &str) -> Result<String> {
    let stem = name.trim_end_matches('/');
    let path = root.join(stem);
    if path.is_dir() {
        return io::read_to_string(&path.join(format!("{stem}.{}", paths::MARKDOWN_EXT)));
    }
    io::read_to_string(&path)
}

/// `workflow/<key>/workflow.md` followed by every `*.mmd` diagram.
fn collect_workflow(
    root: &Path,
    key: &str,
    warnings: &mut Vec<CollectionWarning>,
) -> Option<String> {
    let dir = paths::workflow_dir(root, key);
    if !dir.is_dir() {
        tracing::debug!(feature = key, "no workflow directory");
        return None;
    }

    let mut content = String::new();
    if let Ok(text) = std::fs::read_to_string(dir.join(paths::WORKFLOW_MD)) {
        content.push_str(&text);
        content.push_str("\n\n");
    }

    let mut diagrams: Vec<PathBuf> = match std::fs::read_dir(&dir) {
        Ok(entries) => entries
            .filter_map(|e| e.ok().map(|e| e.path()))
            .filter(|p| p.extension().map(|x| x == paths::MERMAID_EXT).unwrap_or(false))
            .collect(),
        Err(e) => {
            warnings.push(CollectionWarning {
                path: format!("{}/{key}", paths::WORKFLOW_DIR),
                reason: e.to_string(),
            });
            Vec::new()
        }
    };
    diagrams.sort();

    for path in diagrams {
        let Ok(diagram) = std::fs::read_to_string(&path) else {
            continue;
        };
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        content.push_str(&format!(
            "#### Diagram: {file_name}\n\n```mermaid\n{}\n```\n\n",
            diagram.trim_end()
        ));
    }

    if content.is_empty() {
        warnings.push(CollectionWarning {
            path: format!("{}/{key}", paths::WORKFLOW_DIR),
            reason: "no workflow content found".to_string(),
        });
        return None;
    }
    Some(content)
}

fn collect_spec(root: &Path, key: &str, warnings: &mut Vec<CollectionWarning>) -> Option<String> {
    let path = paths::spec_file(root, key);
    if !path.is_file() {
        tracing::debug!(feature = key, "no spec file");
        return None;
    }
    match io::read_to_string(&path) {
        Ok(s) => Some(s),
        Err(e) => {
            warnings.push(CollectionWarning {
                path: format!("{}/{key}{}", paths::SPEC_DIR, paths::SPEC_SUFFIX),
                reason: e.to_string(),
            });
            None
        }
    }
}

/// Markdown body for one feature, built from its parsed sections.
pub fn render_feature(detail: &FeatureDetail) -> String {
    let mut out = String::from("### Status\n\n");
    out.push_str(&format!("- **Current Status**: {}\n", detail.status.label()));
    if let Some(owner) = detail.owner_display() {
        out.push_str(&format!("- **Owner**: {owner}\n"));
    }
    if let Some(date) = detail.last_updated_display() {
        out.push_str(&format!("- **Last Updated**: {date}\n"));
    }
    if !detail.reason.is_empty() {
        out.push_str(&format!("- **Reason**: {}\n", detail.reason));
    }
    out.push('\n');

    if detail.has_summary() {
        out.push_str("### Summary\n\n");
        for (label, value) in detail.summary_fields() {
            out.push_str(&format!("**{label}**: {value}\n\n"));
        }
    }

    if detail.has_scope() {
        out.push_str("### Scope\n\n");
        push_list(&mut out, Some("**In Scope:**"), detail.scope_in());
        push_list(&mut out, Some("**Out of Scope:**"), detail.scope_out());
    }

    let sections: [(&str, Vec<&str>); 3] = [
        ("Requirements", detail.requirement_items().collect()),
        ("Non-Requirements", detail.non_requirement_items().collect()),
        ("Acceptance Criteria", detail.acceptance_items().collect()),
    ];
    for (title, items) in sections {
        if !items.is_empty() {
            out.push_str(&format!("### {title}\n\n"));
            push_list(&mut out, None, items.into_iter());
        }
    }

    if !detail.feature_dependencies.is_empty() {
        out.push_str("### Feature Dependencies\n\n");
        for (key, reason) in &detail.feature_dependencies {
            out.push_str(&format!("- **{key}**: {reason}\n"));
        }
        out.push('\n');
    }

    out
}

fn push_list<'a>(out: &mut String, heading: Option<&str>, items: impl Iterator<Item = &'a str>) {
    let mut items = items.peekable();
    if items.peek().is_none() {
        return;
    }
    if let Some(heading) = heading {
        out.push_str(&format!("{heading}\n\n"));
    }
    for item in items {
        out.push_str(&format!("- {item}\n"));
    }
    out.push('\n');
}

// ---------------------------------------------------------------------------
// Merge
// ---------------------------------------------------------------------------

/// `## Status Statistics` for the exported features.
pub fn statistics_section(summary: &Summary) -> String {
    if summary.total_features == 0 {
        return String::new();
    }

    let mut out = String::from("## Status Statistics\n\n### Overall Progress\n\n");
    out.push_str(&format!(
        "{} **{}% Complete**\n\n\n",
        markdown::progress_bar(summary.overall_progress, PROGRESS_BAR_WIDTH),
        summary.overall_progress
    ));

    out.push_str("### Status Distribution\n\n");
    out.push_str("| Status            | Count | Percentage |\n");
    out.push_str("|-------------------|-------|------------|\n");
    for (status, &count) in &summary.status_counts {
        if count == 0 {
            continue;
        }
        let pct = format!("{}%", count * 100 / summary.total_features);
        out.push_str(&format!("| {:<17} | {:<5} | {:<10} |\n", status.label(), count, pct));
    }
    out.push_str(&format!(
        "| **{:<15}** | **{:<3}** | **{:<8}** |\n",
        "Total", summary.total_features, "100%"
    ));
    out.push('\n');

    let insights = summary.top_insights();
    if !insights.is_empty() {
        out.push_str("### Key Insights\n\n");
        for insight in insights {
            out.push_str(&format!("- {insight}\n"));
        }
        out.push('\n');
    }
    out
}

/// Assemble the export document from collected content.
pub fn merge(config: &ExportConfig, collection: &Collection, generated_at: NaiveDateTime) -> String {
    let mut header = String::from("# Archie Project Export\n\n");
    header.push_str(&format!(
        "**Generated:** {}\n\n**Project:** {}\n\n**Documents:** {} | **Features:** {}\n\n---\n\n",
        generated_at.format("%Y-%m-%d %H:%M:%S"),
        config.project_root.display(),
        collection.document_count(),
        collection.features.len()
    ));

    let features: Vec<Feature> = collection
        .features
        .iter()
        .map(|f| f.detail.to_feature())
        .collect();

    let mut body = String::new();

    if config.generate_stats && !features.is_empty() {
        let summary =
            Summary::aggregate_at(&features, generated_at.date(), config.stale_days);
        let stats = statistics_section(&summary);
        if !stats.is_empty() {
            body.push_str(&stats);
            body.push_str(SEPARATOR);
        }
    }

    if config.generate_dep_graph && !features.is_empty() {
        let graph = DependencyGraph::build(features);
        let section = markdown::dependency_graph_section(&graph);
        if !section.is_empty() {
            body.push_str(&section);
            body.push_str(SEPARATOR);
        }
    }

    if !collection.root_docs.is_empty() {
        body.push_str("# Documentation\n\n");
        for doc in &collection.root_docs {
            body.push_str(&format!(
                "## {}\n\n{}\n\n",
                markdown::section_title(&doc.name),
                doc.content
            ));
        }
        body.push_str(SEPARATOR);
    }

    if !collection.features.is_empty() {
        body.push_str("# Features\n\n");
        for feature in &collection.features {
            body.push_str(&format!("## {}\n\n{}\n", feature.detail.key, feature.content));
            if let Some(workflow) = &feature.workflow {
                body.push_str(&format!("### Workflow\n\n{workflow}\n"));
            }
            if let Some(spec) = &feature.spec {
                body.push_str(&format!(
                    "### Specification\n\n{}\n",
                    markdown::adjust_heading_levels(spec, 1)
                ));
            }
            body.push('\n');
        }
    }

    let mut out = header.clone();
    if config.generate_toc {
        let toc = markdown::table_of_contents(&format!("{header}{body}"));
        if !toc.is_empty() {
            out.push_str(&toc);
            out.push_str(SEPARATOR);
        }
    }
    out.push_str(&body);
    markdown::sanitize(&out)
}

// ---------------------------------------------------------------------------
// Run
// ---------------------------------------------------------------------------

/// Validate, collect, merge and atomically write the export.
pub fn run(config: &ExportConfig) -> Result<ExportResult> {
    validate_project(&config.project_root)?;

    let collection = collect(config);
    for warning in &collection.warnings {
        tracing::warn!(path = %warning.path, reason = %warning.reason, "skipped during export");
    }

    let generated_at = Local::now().naive_local();
    let content = merge(config, &collection, generated_at);
    io::atomic_write(&config.output_path, content.as_bytes())?;

    Ok(ExportResult {
        output_path: config.output_path.clone(),
        document_count: collection.document_count(),
        feature_count: collection.features.len(),
        bytes: content.len(),
        generated_at: generated_at.format("%Y-%m-%d %H:%M:%S").to_string(),
        warnings: collection.warnings.iter().map(|w| w.to_string()).collect(),
    })
}
