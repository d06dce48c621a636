mod algorithms;
mod builder;

pub use algorithms::ChainLimits;

use petgraph::Direction;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::path::{Component, Path};

/// One module: an internal project file or an external/unresolved target.
#[derive(Debug, Clone, Serialize)]
pub struct GraphNode {
    pub id: String,
    pub is_external: bool,
    pub metadata: BTreeMap<String, serde_json::Value>,
}

/// Edge payload. Points from the importing module to the imported one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DependencyEdge {
    /// Line of the first import that produced this edge.
    pub line: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct FanMetrics {
    pub fan_in: usize,
    pub fan_out: usize,
    pub instability: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct GraphSummary {
    pub nodes: usize,
    pub internal: usize,
    pub external: usize,
    pub edges: usize,
}

/// Directed module dependency graph.
///
/// Internal node ids are project-relative file paths with `/` separators
/// (`pkg/models.py`). External ids are the import target as written.
/// Duplicate edges are collapsed, so fan-in and fan-out count distinct
/// modules.
#[derive(Debug, Clone, Default)]
pub struct DependencyGraph {
    graph: DiGraph<GraphNode, DependencyEdge>,
    node_indices: HashMap<String, NodeIndex>,
    external: BTreeSet<String>,
}

impl DependencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    fn ensure_node(&mut self, id: &str, is_external: bool) -> NodeIndex {
        if let Some(&idx) = self.node_indices.get(id) {
            // A file that was first seen as an import target is internal after all.
            if !is_external && self.graph[idx].is_external {
                self.graph[idx].is_external = false;
                self.external.remove(id);
            }
            return idx;
        }

        let idx = self.graph.add_node(GraphNode {
            id: id.to_string(),
            is_external,
            metadata: BTreeMap::new(),
        });
        self.node_indices.insert(id.to_string(), idx);
        if is_external {
            self.external.insert(id.to_string());
        }
        idx
    }

    /// Register an internal module that may have no edges at all.
    pub fn add_module(&mut self, id: &str) {
        self.ensure_node(id, false);
    }

    /// Record that `from` depends on `to`, creating either node on first
    /// reference. Repeated edges keep the line of the first one.
    pub fn add_dependency(&mut self, from: &str, to: &str, is_external: bool, line: Option<usize>) {
        let from_idx = self.ensure_node(from, false);
        let to_idx = self.ensure_node(to, is_external);
        if self.graph.find_edge(from_idx, to_idx).is_none() {
            self.graph.add_edge(from_idx, to_idx, DependencyEdge { line });
        }
    }

    pub(crate) fn set_metadata(&mut self, id: &str, key: &str, value: serde_json::Value) {
        if let Some(&idx) = self.node_indices.get(id) {
            self.graph[idx].metadata.insert(key.to_string(), value);
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.node_indices.contains_key(id)
    }

    pub fn node(&self, id: &str) -> Option<&GraphNode> {
        self.node_indices.get(id).map(|&idx| &self.graph[idx])
    }

    pub fn is_external(&self, id: &str) -> bool {
        self.external.contains(id)
    }

    pub fn nodes(&self) -> impl Iterator<Item = &GraphNode> {
        self.graph.node_weights()
    }

    /// Internal module ids in sorted order.
    pub fn internal_nodes(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self
            .graph
            .node_weights()
            .filter(|n| !n.is_external)
            .map(|n| n.id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn external_nodes(&self) -> &BTreeSet<String> {
        &self.external
    }

    /// Every edge as `(from, to, edge)`.
    pub fn edges(&self) -> impl Iterator<Item = (&str, &str, &DependencyEdge)> {
        self.graph.edge_references().map(|e| {
            (
                self.graph[e.source()].id.as_str(),
                self.graph[e.target()].id.as_str(),
                e.weight(),
            )
        })
    }

    pub fn edge(&self, from: &str, to: &str) -> Option<&DependencyEdge> {
        let from = *self.node_indices.get(from)?;
        let to = *self.node_indices.get(to)?;
        self.graph.find_edge(from, to).map(|e| &self.graph[e])
    }

    /// Modules `id` depends on, sorted.
    pub fn dependencies(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Outgoing)
    }

    /// Modules depending on `id`, sorted.
    pub fn dependents(&self, id: &str) -> Vec<&str> {
        self.neighbors(id, Direction::Incoming)
    }

    fn neighbors(&self, id: &str, direction: Direction) -> Vec<&str> {
        let Some(&idx) = self.node_indices.get(id) else {
            return Vec::new();
        };
        let mut ids: Vec<&str> = self
            .graph
            .neighbors_directed(idx, direction)
            .map(|n| self.graph[n].id.as_str())
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn fan_in(&self, id: &str) -> usize {
        self.degree(id, Direction::Incoming)
    }

    pub fn fan_out(&self, id: &str) -> usize {
        self.degree(id, Direction::Outgoing)
    }

    fn degree(&self, id: &str, direction: Direction) -> usize {
        self.node_indices
            .get(id)
            .map_or(0, |&idx| self.graph.neighbors_directed(idx, direction).count())
    }

    /// `fan_out / (fan_in + fan_out)`, or 0.0 for an isolated module.
    pub fn instability(&self, id: &str) -> f64 {
        instability(self.fan_in(id), self.fan_out(id))
    }

    pub fn metrics(&self, id: &str) -> Option<FanMetrics> {
        self.contains(id).then(|| {
            let fan_in = self.fan_in(id);
            let fan_out = self.fan_out(id);
            FanMetrics {
                fan_in,
                fan_out,
                instability: instability(fan_in, fan_out),
            }
        })
    }

    pub fn summary(&self) -> GraphSummary {
        GraphSummary {
            nodes: self.graph.node_count(),
            internal: self.graph.node_count() - self.external.len(),
            external: self.external.len(),
            edges: self.graph.edge_count(),
        }
    }
}

fn instability(fan_in: usize, fan_out: usize) -> f64 {
    let total = fan_in + fan_out;
    if total == 0 {
        0.0
    } else {
        fan_out as f64 / total as f64
    }
}

/// Graph id of a file: its path relative to `root`, `/`-separated.
pub fn module_id(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(segment) => Some(segment.to_string_lossy()),
            _ => None,
        })
        .collect::<Vec<_>>()
        .join("/")
}
