use crate::graph::DependencyGraph;
use regex::Regex;
use std::sync::OnceLock;

/// Horizontal rule placed between top-level export sections.
pub const SEPARATOR: &str = "\n---\n\n";

const MAX_HEADING_LEVEL: usize = 6;

static HEADING_RE: OnceLock<Regex> = OnceLock::new();
static ANCHOR_STRIP_RE: OnceLock<Regex> = OnceLock::new();
static HYPHEN_RUN_RE: OnceLock<Regex> = OnceLock::new();

fn heading_re() -> &'static Regex {
    HEADING_RE.get_or_init(|| Regex::new(r"^(#{1,6})\s+(.+)$").unwrap())
}

/// `(level, title)` for an ATX heading line.
fn heading(line: &str) -> Option<(usize, &str)> {
    let caps = heading_re().captures(line.trim())?;
    let level = caps.get(1)?.as_str().len();
    let title = caps.get(2)?.as_str().trim();
    Some((level, title))
}

fn is_fence(line: &str) -> bool {
    let t = line.trim_start();
    t.starts_with("```") || t.starts_with("~~~")
}

/// Lines paired with whether they sit inside a fenced code block.
fn fenced_lines(content: &str) -> impl Iterator<Item = (&str, bool)> {
    let mut in_fence = false;
    content.split('\n').map(move |line| {
        if is_fence(line) {
            in_fence = !in_fence;
            return (line, true);
        }
        (line, in_fence)
    })
}

// ---------------------------------------------------------------------------
// Anchors and table of contents
// ---------------------------------------------------------------------------

/// GitHub-style anchor slug for a heading title.
pub fn anchor(title: &str) -> String {
    let strip = ANCHOR_STRIP_RE.get_or_init(|| Regex::new(r"[^a-z0-9-]").unwrap());
    let hyphens = HYPHEN_RUN_RE.get_or_init(|| Regex::new(r"-+").unwrap());

    let plain = title.replace("**", "").replace(['*', '`'], "");
    let lowered = plain.to_lowercase().replace(' ', "-");
    let kept = strip.replace_all(&lowered, "");
    let collapsed = hyphens.replace_all(&kept, "-");
    collapsed.trim_matches('-').to_string()
}

/// Bullet list of every level 2–6 heading, indented two spaces per level
/// below 2. Empty when there are no such headings.
pub fn table_of_contents(content: &str) -> String {
    let mut entries = String::new();
    for (line, in_fence) in fenced_lines(content) {
        if in_fence {
            continue;
        }
        let Some((level, title)) = heading(line) else {
            continue;
        };
        if level < 2 {
            continue;
        }
        let indent = " ".repeat((level - 2) * 2);
        entries.push_str(&format!("{indent}- [{title}](#{})\n", anchor(title)));
    }

    if entries.is_empty() {
        return String::new();
    }
    format!("## Table of Contents\n\n{entries}")
}

// ---------------------------------------------------------------------------
// Rewriting
// ---------------------------------------------------------------------------

/// Push every heading `shift` levels deeper, capped at level 6. Headings
/// inside fenced code blocks are left alone.
pub fn adjust_heading_levels(content: &str, shift: usize) -> String {
    if shift == 0 {
        return content.to_string();
    }
    fenced_lines(content)
        .map(|(line, in_fence)| match heading(line) {
            Some((level, title)) if !in_fence => {
                let level = (level + shift).min(MAX_HEADING_LEVEL);
                format!("{} {title}", "#".repeat(level))
            }
            _ => line.to_string(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Collapse runs of blank lines to at most two.
pub fn sanitize(content: &str) -> String {
    let mut out = Vec::new();
    let mut blanks = 0;
    for line in content.split('\n') {
        if line.trim().is_empty() {
            blanks += 1;
            if blanks > 2 {
                continue;
            }
        } else {
            blanks = 0;
        }
        out.push(line);
    }
    out.join("\n")
}

/// Human title for a root document or directory name.
pub fn section_title(name: &str) -> String {
    let stem = name
        .trim_end_matches('/')
        .trim_end_matches(".md")
        .to_lowercase();
    let mapped = match stem.as_str() {
        "background" => "Background",
        "dependency" => "Dependencies",
        "deployment" => "Deployment",
        "metrics" => "Metrics",
        "storage" => "Storage Design",
        "tasks" => "Tasks",
        "api" => "API Documentation",
        "faq" => "FAQ",
        "blocker" => "Blockers",
        "architecture" => "Architecture",
        "workflow" => "Workflow",
        "spec" => "Specification",
        _ => "",
    };
    if !mapped.is_empty() {
        return mapped.to_string();
    }
    stem.split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// `█`/`░` bar `width` cells wide for a 0–100 value.
pub fn progress_bar(progress: u32, width: usize) -> String {
    let filled = (progress.min(100) as usize * width) / 100;
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

// ---------------------------------------------------------------------------
// Mermaid
// ---------------------------------------------------------------------------

/// Node id safe for mermaid: hyphens become underscores.
pub fn mermaid_id(key: &str) -> String {
    key.replace('-', "_")
}

/// `## Dependency Graph` section drawing `prerequisite --> dependent`.
/// Empty when no feature has dependencies.
pub fn dependency_graph_section(graph: &DependencyGraph) -> String {
    if graph.depends_on.is_empty() {
        return String::new();
    }

    let mut out = String::from("## Dependency Graph\n\n```mermaid\ngraph LR\n");
    for (feature, deps) in &graph.depends_on {
        for dep in deps {
            out.push_str(&format!(
                "    {}[\"{dep}\"] --> {}[\"{feature}\"]\n",
                mermaid_id(dep),
                mermaid_id(feature)
            ));
        }
    }
    out.push_str("```\n\n**Legend:**\n\n");
    out.push_str("- `-->` points from a prerequisite to the feature that depends on it\n");
    let names: Vec<&str> = graph.depends_on.keys().map(String::as_str).collect();
    out.push_str(&format!("- **Features**: {}\n", names.join(", ")));
    out.push('\n');
    out
}
