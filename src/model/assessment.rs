use crate::graph::DependencyGraph;
use crate::model::{ParseResult, Severity, Violation};
use serde::Serialize;
use std::collections::BTreeMap;
use std::path::PathBuf;

/// A file that contributed no facts to the run.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

/// Everything one assessment run produced.
#[derive(Debug)]
pub struct Assessment {
    pub project_name: String,
    pub root: PathBuf,
    pub parse_results: BTreeMap<PathBuf, ParseResult>,
    pub skipped: Vec<SkippedFile>,
    pub graph: DependencyGraph,
    /// Analyzer names in the order they ran.
    pub analyzers_run: Vec<String>,
    pub violations_by_analyzer: BTreeMap<String, Vec<Violation>>,
}

impl Assessment {
    /// All violations, grouped by analyzer in run order.
    pub fn violations(&self) -> Vec<&Violation> {
        self.analyzers_run
            .iter()
            .filter_map(|name| self.violations_by_analyzer.get(name))
            .flatten()
            .collect()
    }

    pub fn violation_count(&self) -> usize {
        self.violations_by_analyzer.values().map(Vec::len).sum()
    }

    /// Number of violations per severity. Every severity has an entry.
    pub fn severity_counts(&self) -> BTreeMap<Severity, usize> {
        let mut counts: BTreeMap<Severity, usize> = [
            Severity::Critical,
            Severity::High,
            Severity::Medium,
            Severity::Low,
        ]
        .into_iter()
        .map(|s| (s, 0))
        .collect();

        for violation in self.violations_by_analyzer.values().flatten() {
            *counts.entry(violation.severity).or_insert(0) += 1;
        }
        counts
    }

    pub fn critical_count(&self) -> usize {
        self.violations_by_analyzer
            .values()
            .flatten()
            .filter(|v| v.severity == Severity::Critical)
            .count()
    }

    pub fn has_critical(&self) -> bool {
        self.critical_count() > 0
    }
}
