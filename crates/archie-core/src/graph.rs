use crate::status::FeatureStatus;
use crate::Feature;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};

/// Deepest level the dependency tree is drawn to.
pub const MAX_TREE_DEPTH: usize = 32;

/// Dependency relation between features.
///
/// An edge `A → B` means A lists B under `## Feature Dependencies`: B is a
/// prerequisite and should be designed before A.
#[derive(Debug, Clone, Default, Serialize)]
pub struct DependencyGraph {
    pub features: Vec<Feature>,
    #[serde(skip)]
    index: HashMap<String, usize>,
    /// Feature → sorted dependency keys. Only features with dependencies.
    pub depends_on: BTreeMap<String, Vec<String>>,
    /// Dependency key → sorted dependents. Keys may name missing features.
    pub depended_by: BTreeMap<String, Vec<String>>,
    pub no_dependencies: Vec<String>,
    pub has_dependencies: Vec<String>,
    pub circular_deps: Vec<Vec<String>>,
}

/// One line of the rendered dependency tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TreeRow {
    /// Guide characters and connector drawn before the key; empty for roots.
    pub lead: String,
    pub key: String,
    pub status: FeatureStatus,
    /// All dependencies of `key`, set only when it has more than one.
    pub also_depends_on: Vec<String>,
    /// Already drawn earlier in the tree; children are not repeated.
    pub repeated: bool,
}

impl DependencyGraph {
    pub fn build(features: Vec<Feature>) -> Self {
        let mut graph = Self {
            index: features
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect(),
            ..Self::default()
        };

        for feature in &features {
            if feature.dependencies.is_empty() {
                graph.no_dependencies.push(feature.name.clone());
                continue;
            }
            let deps: Vec<String> = feature.dependencies.keys().cloned().collect();
            for dep in &deps {
                graph
                    .depended_by
                    .entry(dep.clone())
                    .or_default()
                    .push(feature.name.clone());
            }
            graph.depends_on.insert(feature.name.clone(), deps);
            graph.has_dependencies.push(feature.name.clone());
        }

        graph.no_dependencies.sort();
        graph.has_dependencies.sort();
        for dependents in graph.depended_by.values_mut() {
            dependents.sort();
        }

        graph.features = features;
        graph.circular_deps = graph.detect_cycles();
        tracing::debug!(
            features = graph.features.len(),
            edges = graph.depends_on.values().map(Vec::len).sum::<usize>(),
            cycles = graph.circular_deps.len(),
            "built dependency graph"
        );
        graph
    }

    pub fn feature(&self, key: &str) -> Option<&Feature> {
        self.index.get(key).map(|&i| &self.features[i])
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub fn dependencies_of(&self, key: &str) -> &[String] {
        self.depends_on.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn dependents_of(&self, key: &str) -> &[String] {
        self.depended_by.get(key).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn has_cycles(&self) -> bool {
        !self.circular_deps.is_empty()
    }

    /// DFS from every unvisited feature in input order.
    ///
    /// Reaching a node that is on the current path records the path slice
    /// from that node onward and ends the search of that DFS tree.
    fn detect_cycles(&self) -> Vec<Vec<String>> {
        struct Search<'a> {
            graph: &'a DependencyGraph,
            visited: HashSet<&'a str>,
            on_stack: HashSet<&'a str>,
            path: Vec<&'a str>,
            cycles: Vec<Vec<String>>,
        }

        impl<'a> Search<'a> {
            fn visit(&mut self, node: &'a str) -> bool {
                self.visited.insert(node);
                self.on_stack.insert(node);
                self.path.push(node);

                let graph = self.graph;
                let mut found = false;
                for dep in graph.dependencies_of(node) {
                    let dep = dep.as_str();
                    if !self.visited.contains(dep) {
                        if self.visit(dep) {
                            found = true;
                            break;
                        }
                    } else if self.on_stack.contains(dep) {
                        let start = self.path.iter().position(|n| *n == dep).unwrap_or(0);
                        self.cycles
                            .push(self.path[start..].iter().map(|s| s.to_string()).collect());
                        found = true;
                        break;
                    }
                }

                self.path.pop();
                self.on_stack.remove(node);
                found
            }
        }

        let mut search = Search {
            graph: self,
            visited: HashSet::new(),
            on_stack: HashSet::new(),
            path: Vec::new(),
            cycles: Vec::new(),
        };
        for feature in &self.features {
            if !search.visited.contains(feature.name.as_str()) {
                search.visit(&feature.name);
            }
        }
        search.cycles
    }

    /// Recommended design order: prerequisites before dependents.
    ///
    /// Kahn's algorithm, always taking the lexicographically smallest ready
    /// feature. In-degree is the full dependency count, so a feature that
    /// depends on a missing feature never becomes ready. Members of a cycle,
    /// and everything depending on one, are left out too.
    pub fn topological_order(&self) -> Vec<String> {
        let mut in_degree: HashMap<&str, usize> = self
            .features
            .iter()
            .map(|f| (f.name.as_str(), self.dependencies_of(&f.name).len()))
            .collect();

        let mut ready: BTreeSet<&str> = in_degree
            .iter()
            .filter(|(_, &deg)| deg == 0)
            .map(|(name, _)| *name)
            .collect();

        let mut order = Vec::with_capacity(self.features.len());
        while let Some(current) = ready.pop_first() {
            order.push(current.to_string());
            for dependent in self.dependents_of(current) {
                if let Some(deg) = in_degree.get_mut(dependent.as_str()) {
                    *deg -= 1;
                    if *deg == 0 {
                        ready.insert(dependent.as_str());
                    }
                }
            }
        }
        order
    }

    /// `(feature, dependency)` pairs whose dependency names no known feature.
    pub fn missing_dependencies(&self) -> Vec<(String, String)> {
        let mut missing = Vec::new();
        for (feature, deps) in &self.depends_on {
            for dep in deps {
                if !self.contains(dep) {
                    missing.push((feature.clone(), dep.clone()));
                }
            }
        }
        missing
    }

    /// Features with no dependencies of their own that others depend on.
    pub fn tree_roots(&self) -> Vec<&str> {
        self.no_dependencies
            .iter()
            .filter(|key| !self.dependents_of(key).is_empty())
            .map(String::as_str)
            .collect()
    }

    /// Flatten the tree drawn from prerequisites towards their dependents.
    ///
    /// When no feature qualifies as a root (every dependency points at a
    /// missing feature, or everything sits in a cycle) each feature with
    /// dependencies is listed on its own.
    pub fn tree_rows(&self) -> Vec<TreeRow> {
        let mut rows = Vec::new();
        let roots = self.tree_roots();

        if roots.is_empty() {
            for key in &self.has_dependencies {
                if let Some(feature) = self.feature(key) {
                    rows.push(TreeRow {
                        lead: String::new(),
                        key: key.clone(),
                        status: feature.status.clone(),
                        also_depends_on: self.dependencies_of(key).to_vec(),
                        repeated: false,
                    });
                }
            }
            return rows;
        }

        let mut visited = HashSet::new();
        for (i, &root) in roots.iter().enumerate() {
            self.walk(root, "", i + 1 == roots.len(), 0, &mut visited, &mut rows);
        }
        rows
    }

    fn walk<'a>(
        &'a self,
        key: &'a str,
        prefix: &str,
        is_last: bool,
        depth: usize,
        visited: &mut HashSet<&'a str>,
        rows: &mut Vec<TreeRow>,
    ) {
        let Some(feature) = self.feature(key) else {
            return;
        };

        let is_root = depth == 0;
        let lead = if is_root {
            String::new()
        } else {
            format!("{prefix}{} ", if is_last { "└─" } else { "├─" })
        };
        let deps = self.dependencies_of(key);
        let repeated = !visited.insert(key);

        rows.push(TreeRow {
            lead,
            key: key.to_string(),
            status: feature.status.clone(),
            also_depends_on: if deps.len() > 1 { deps.to_vec() } else { Vec::new() },
            repeated,
        });

        if repeated || depth >= MAX_TREE_DEPTH {
            return;
        }

        let child_prefix = if is_root {
            "  ".to_string()
        } else if is_last {
            format!("{prefix}   ")
        } else {
            format!("{prefix}│  ")
        };
        let dependents = self.dependents_of(key);
        for (i, dependent) in dependents.iter().enumerate() {
            self.walk(
                dependent,
                &child_prefix,
                i + 1 == dependents.len(),
                depth + 1,
                visited,
                rows,
            );
        }
    }
}
