use super::{DependencyGraph, FanMetrics};
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use std::collections::{BTreeMap, BTreeSet, HashSet, VecDeque};

/// Bounds for deep-chain enumeration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChainLimits {
    /// Shortest chain (in modules) worth reporting.
    pub min_depth: usize,
    /// Longest chain the search will follow.
    pub max_depth: usize,
    /// Node expansions allowed before the search gives up.
    pub budget: usize,
    pub max_chains: usize,
}

impl Default for ChainLimits {
    fn default() -> Self {
        Self {
            min_depth: 5,
            max_depth: 12,
            budget: 50_000,
            max_chains: 10,
        }
    }
}

struct Frame {
    node: NodeIndex,
    successors: Vec<NodeIndex>,
    next: usize,
}

impl DependencyGraph {
    /// Internal node indices, ordered by id so traversals are deterministic.
    fn internal_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&idx| !self.graph[idx].is_external)
            .collect();
        indices.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        indices
    }

    fn internal_successors(&self, idx: NodeIndex) -> Vec<NodeIndex> {
        let mut successors: Vec<NodeIndex> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .filter(|&n| !self.graph[n].is_external)
            .collect();
        successors.sort_by(|a, b| self.graph[*a].id.cmp(&self.graph[*b].id));
        successors.dedup();
        successors
    }

    fn ids(&self, path: &[NodeIndex]) -> Vec<String> {
        path.iter().map(|&idx| self.graph[idx].id.clone()).collect()
    }

    /// Cycles among internal modules, found by depth-first search.
    ///
    /// Each cycle is the path slice from the first occurrence of the
    /// repeated module, so `a -> b -> c -> a` comes back as `[a, b, c]`.
    /// The same cycle may be reported more than once in rotated form when
    /// it is reachable from several entry points.
    pub fn find_cycles(&self) -> Vec<Vec<String>> {
        let mut cycles = Vec::new();
        let mut visited: HashSet<NodeIndex> = HashSet::new();

        for start in self.internal_indices() {
            if visited.contains(&start) {
                continue;
            }

            let mut path: Vec<NodeIndex> = Vec::new();
            let mut on_stack: HashSet<NodeIndex> = HashSet::new();
            let mut stack: Vec<Frame> = Vec::new();

            visited.insert(start);
            on_stack.insert(start);
            path.push(start);
            stack.push(Frame {
                node: start,
                successors: self.internal_successors(start),
                next: 0,
            });

            while let Some(frame) = stack.last_mut() {
                if frame.next < frame.successors.len() {
                    let next = frame.successors[frame.next];
                    frame.next += 1;

                    if on_stack.contains(&next) {
                        if let Some(pos) = path.iter().position(|&n| n == next) {
                            cycles.push(self.ids(&path[pos..]));
                        }
                    } else if visited.insert(next) {
                        on_stack.insert(next);
                        path.push(next);
                        stack.push(Frame {
                            node: next,
                            successors: self.internal_successors(next),
                            next: 0,
                        });
                    }
                } else {
                    on_stack.remove(&frame.node);
                    path.pop();
                    stack.pop();
                }
            }
        }

        cycles
    }

    /// Fan metrics for every node, internal and external.
    pub fn fan_metrics(&self) -> BTreeMap<String, FanMetrics> {
        self.graph
            .node_weights()
            .filter_map(|n| self.metrics(&n.id).map(|m| (n.id.clone(), m)))
            .collect()
    }

    /// Internal modules with `fan_in >= threshold`, highest first.
    pub fn god_modules(&self, threshold: usize) -> Vec<(String, usize)> {
        self.select_internal(|m| m.fan_in, threshold)
    }

    /// Internal modules with `fan_out >= threshold`, highest first.
    pub fn high_fan_out(&self, threshold: usize) -> Vec<(String, usize)> {
        self.select_internal(|m| m.fan_out, threshold)
    }

    fn select_internal(
        &self,
        measure: impl Fn(&FanMetrics) -> usize,
        threshold: usize,
    ) -> Vec<(String, usize)> {
        let mut selected: Vec<(String, usize)> = self
            .fan_metrics()
            .into_iter()
            .filter(|(id, _)| !self.is_external(id))
            .map(|(id, m)| {
                let value = measure(&m);
                (id, value)
            })
            .filter(|(_, value)| *value >= threshold)
            .collect();
        selected.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        selected
    }

    /// Modules reachable from `start`, bucketed by hop distance (1-based)
    /// up to `max_depth`. External modules are reported but never expanded.
    pub fn transitive_dependencies(
        &self,
        start: &str,
        max_depth: usize,
    ) -> BTreeMap<usize, BTreeSet<String>> {
        self.expand(start, max_depth, Direction::Outgoing)
    }

    /// Modules that reach `start`, bucketed like
    /// [`transitive_dependencies`](Self::transitive_dependencies).
    pub fn transitive_dependents(
        &self,
        start: &str,
        max_depth: usize,
    ) -> BTreeMap<usize, BTreeSet<String>> {
        self.expand(start, max_depth, Direction::Incoming)
    }

    fn expand(
        &self,
        start: &str,
        max_depth: usize,
        direction: Direction,
    ) -> BTreeMap<usize, BTreeSet<String>> {
        let mut buckets: BTreeMap<usize, BTreeSet<String>> = BTreeMap::new();
        let Some(&start_idx) = self.node_indices.get(start) else {
            return buckets;
        };

        let mut seen: HashSet<NodeIndex> = HashSet::from([start_idx]);
        let mut queue: VecDeque<(NodeIndex, usize)> = VecDeque::from([(start_idx, 0)]);

        while let Some((idx, depth)) = queue.pop_front() {
            if depth >= max_depth {
                continue;
            }
            if depth > 0 && self.graph[idx].is_external {
                continue;
            }
            for next in self.graph.neighbors_directed(idx, direction) {
                if seen.insert(next) {
                    buckets
                        .entry(depth + 1)
                        .or_default()
                        .insert(self.graph[next].id.clone());
                    queue.push_back((next, depth + 1));
                }
            }
        }

        buckets
    }

    /// Longest simple dependency chains among internal modules.
    ///
    /// Only maximal chains are kept: a chain is recorded when it cannot be
    /// extended (or hits `max_depth`), and a chain lying wholly inside a
    /// longer reported one is dropped. Results are sorted longest first and
    /// truncated to `max_chains`. The search stops early once `budget` node
    /// expansions are spent.
    pub fn deep_chains(&self, limits: &ChainLimits) -> Vec<Vec<String>> {
        if limits.max_chains == 0 || limits.max_depth < limits.min_depth.max(1) {
            return Vec::new();
        }

        let mut found: Vec<Vec<NodeIndex>> = Vec::new();
        let mut budget = limits.budget;

        for start in self.internal_indices() {
            if budget == 0 {
                tracing::debug!(
                    budget = limits.budget,
                    "deep chain search budget exhausted"
                );
                break;
            }
            let mut path = vec![start];
            let mut on_path = HashSet::from([start]);
            self.extend_chain(&mut path, &mut on_path, &mut budget, limits, &mut found);
        }

        let mut chains: Vec<Vec<String>> = found
            .iter()
            .map(|path| self.ids(path))
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect();
        chains.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));

        let mut kept: Vec<Vec<String>> = Vec::new();
        for chain in chains {
            if kept.len() >= limits.max_chains {
                break;
            }
            let covered = kept
                .iter()
                .any(|longer| longer.windows(chain.len()).any(|w| w == chain.as_slice()));
            if !covered {
                kept.push(chain);
            }
        }
        kept
    }

    fn extend_chain(
        &self,
        path: &mut Vec<NodeIndex>,
        on_path: &mut HashSet<NodeIndex>,
        budget: &mut usize,
        limits: &ChainLimits,
        found: &mut Vec<Vec<NodeIndex>>,
    ) {
        if *budget == 0 {
            return;
        }
        *budget -= 1;

        let Some(&current) = path.last() else {
            return;
        };
        let next: Vec<NodeIndex> = if path.len() < limits.max_depth {
            self.internal_successors(current)
                .into_iter()
                .filter(|n| !on_path.contains(n))
                .collect()
        } else {
            Vec::new()
        };

        if next.is_empty() {
            if path.len() >= limits.min_depth {
                found.push(path.clone());
            }
            return;
        }

        for n in next {
            path.push(n);
            on_path.insert(n);
            self.extend_chain(path, on_path, budget, limits, found);
            on_path.remove(&n);
            path.pop();
        }
    }
}
