use super::{AnalysisContext, Analyzer, AnalyzerError};
use crate::graph::{ChainLimits, DependencyGraph};
use crate::model::{Findings, Severity};
use std::collections::BTreeSet;
use std::path::Path;

const PREFIX: &str = "CPL";

/// Graph-metric thresholds, circular dependencies and deep chains.
pub struct CouplingAnalyzer;

impl Analyzer for CouplingAnalyzer {
    fn name(&self) -> &'static str {
        "coupling"
    }

    fn description(&self) -> &'static str {
        "Fan-in and fan-out thresholds, circular dependencies and deep dependency chains"
    }

    fn analyze(&self, ctx: &AnalysisContext, findings: &mut Findings) -> Result<(), AnalyzerError> {
        let graph = ctx.require_graph()?;

        check_fan_out(ctx, graph, findings);
        check_god_modules(ctx, graph, findings);
        check_cycles(graph, findings);
        check_deep_chains(ctx, graph, findings);

        Ok(())
    }
}

fn check_fan_out(ctx: &AnalysisContext, graph: &DependencyGraph, findings: &mut Findings) {
    let thresholds = &ctx.config.thresholds.coupling;

    for (id, fan_out) in graph.high_fan_out(thresholds.fan_out_medium) {
        if !ctx.should_analyze_file(Path::new(&id)) {
            continue;
        }

        let (severity, limit) = if fan_out >= thresholds.fan_out_high {
            (Severity::High, thresholds.fan_out_high)
        } else {
            (Severity::Medium, thresholds.fan_out_medium)
        };

        findings
            .create(PREFIX, "HighFanOut", severity, &id)
            .message(format!("{} depends on {} modules", id, fan_out))
            .explanation(
                "A module with many dependencies is fragile: a change in any of them can break it.",
            )
            .recommendation(
                "Split the module along its responsibilities or depend on a narrower facade.",
            )
            .meta("fan_out", fan_out)
            .meta("threshold", limit)
            .meta("instability", graph.instability(&id))
            .emit();
    }
}

fn check_god_modules(ctx: &AnalysisContext, graph: &DependencyGraph, findings: &mut Findings) {
    let threshold = ctx.config.thresholds.coupling.god_module_fan_in;

    for (id, fan_in) in graph.god_modules(threshold) {
        if !ctx.should_analyze_file(Path::new(&id)) {
            continue;
        }

        findings
            .create(PREFIX, "GodModule", Severity::High, &id)
            .message(format!("{} is imported by {} modules", id, fan_in))
            .explanation(
                "Everything depends on this module, so every change to it ripples through the codebase.",
            )
            .recommendation("Break it into smaller modules with focused interfaces.")
            .meta("fan_in", fan_in)
            .meta("threshold", threshold)
            .emit();
    }
}

fn check_cycles(graph: &DependencyGraph, findings: &mut Findings) {
    let mut seen: BTreeSet<Vec<String>> = BTreeSet::new();

    for cycle in graph.find_cycles() {
        let mut key = cycle.clone();
        key.sort();
        if !seen.insert(key) {
            continue;
        }

        let Some(first) = cycle.first() else {
            continue;
        };

        let mut path = cycle.clone();
        path.push(first.clone());
        let second = cycle.get(1).unwrap_or(first);

        let mut builder = findings
            .create(PREFIX, "CircularDependency", Severity::Critical, first)
            .message(format!("Circular dependency: {}", path.join(" -> ")))
            .explanation(
                "Modules in a cycle cannot be understood, tested or released independently.",
            )
            .recommendation(
                "Extract the shared pieces into a new module or invert one dependency behind an interface.",
            )
            .meta("cycle", cycle.clone())
            .meta("length", cycle.len());
        if let Some(line) = graph.edge(first, second).and_then(|e| e.line) {
            builder = builder.line(line);
        }
        builder.emit();
    }
}

fn check_deep_chains(ctx: &AnalysisContext, graph: &DependencyGraph, findings: &mut Findings) {
    let thresholds = &ctx.config.thresholds.coupling;
    let limits = ChainLimits {
        min_depth: thresholds.deep_chain_min_depth,
        max_depth: thresholds.chain_search_depth,
        budget: thresholds.chain_search_budget,
        max_chains: thresholds.max_reported_chains,
    };

    for chain in graph.deep_chains(&limits) {
        let Some(first) = chain.first() else {
            continue;
        };

        findings
            .create(PREFIX, "DeepDependencyChain", Severity::Medium, first)
            .message(format!(
                "Dependency chain of {} modules: {}",
                chain.len(),
                chain.join(" -> ")
            ))
            .explanation("Long chains make changes at the bottom ripple a long way up.")
            .recommendation("Flatten the hierarchy or introduce an abstraction part way down.")
            .meta("chain", chain.clone())
            .meta("depth", chain.len())
            .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_safely;
    use crate::config::AssessmentConfig;
    use crate::fs::mock::MockFs;
    use std::collections::BTreeMap;
    use std::path::PathBuf;

    fn run(graph: &DependencyGraph, config: &AssessmentConfig) -> Vec<crate::model::Violation> {
        let results = BTreeMap::new();
        let fs = MockFs::new();
        let ctx = AnalysisContext::new(Path::new("/p"), config, &results, &fs).with_graph(graph);
        analyze_safely(&CouplingAnalyzer, &ctx)
    }

    fn graph(edges: &[(&str, &str)]) -> DependencyGraph {
        let mut graph = DependencyGraph::new();
        for (from, to) in edges {
            graph.add_dependency(from, to, false, Some(1));
        }
        graph
    }

    #[test]
    fn test_missing_graph_yields_nothing() {
        let config = AssessmentConfig::default();
        let results = BTreeMap::new();
        let fs = MockFs::new();
        let ctx = AnalysisContext::new(Path::new("/p"), &config, &results, &fs);

        let mut findings = Findings::new("coupling");
        assert!(matches!(
            CouplingAnalyzer.analyze(&ctx, &mut findings),
            Err(AnalyzerError::MissingGraph)
        ));
        assert!(analyze_safely(&CouplingAnalyzer, &ctx).is_empty());
    }

    #[test]
    fn test_single_cycle_reported_once() {
        let g = graph(&[("a.py", "b.py"), ("b.py", "c.py"), ("c.py", "a.py")]);

        let violations = run(&g, &AssessmentConfig::default());

        assert_eq!(violations.len(), 1);
        let v = &violations[0];
        assert_eq!(v.kind, "CircularDependency");
        assert_eq!(v.severity, Severity::Critical);
        assert_eq!(v.file, PathBuf::from("a.py"));
        assert_eq!(v.id, "CPL-001");
        assert_eq!(v.line, Some(1));
        assert_eq!(v.message, "Circular dependency: a.py -> b.py -> c.py -> a.py");
    }

    #[test]
    fn test_fan_out_severity_tiers() {
        let mut config = AssessmentConfig::default();
        config.thresholds.coupling.fan_out_medium = 2;
        config.thresholds.coupling.fan_out_high = 3;
        let g = graph(&[
            ("hub.py", "a.py"),
            ("hub.py", "b.py"),
            ("hub.py", "c.py"),
            ("mid.py", "a.py"),
            ("mid.py", "b.py"),
            ("leaf.py", "a.py"),
        ]);

        let violations = run(&g, &config);
        let fan_out: Vec<(&Path, Severity)> = violations
            .iter()
            .filter(|v| v.kind == "HighFanOut")
            .map(|v| (v.file.as_path(), v.severity))
            .collect();

        assert_eq!(
            fan_out,
            vec![
                (Path::new("hub.py"), Severity::High),
                (Path::new("mid.py"), Severity::Medium)
            ]
        );
    }

    #[test]
    fn test_god_module() {
        let mut config = AssessmentConfig::default();
        config.thresholds.coupling.god_module_fan_in = 3;
        let g = graph(&[
            ("a.py", "core.py"),
            ("b.py", "core.py"),
            ("c.py", "core.py"),
            ("d.py", "util.py"),
        ]);

        let violations = run(&g, &config);
        let gods: Vec<_> = violations.iter().filter(|v| v.kind == "GodModule").collect();

        assert_eq!(gods.len(), 1);
        assert_eq!(gods[0].file, PathBuf::from("core.py"));
        assert_eq!(gods[0].severity, Severity::High);
        assert_eq!(gods[0].metadata["fan_in"], 3);
    }

    #[test]
    fn test_deep_chain() {
        let g = graph(&[
            ("a.py", "b.py"),
            ("b.py", "c.py"),
            ("c.py", "d.py"),
            ("d.py", "e.py"),
            ("e.py", "f.py"),
        ]);

        let violations = run(&g, &AssessmentConfig::default());
        let chains: Vec<_> = violations
            .iter()
            .filter(|v| v.kind == "DeepDependencyChain")
            .collect();

        assert_eq!(chains.len(), 1);
        assert_eq!(chains[0].file, PathBuf::from("a.py"));
        assert_eq!(chains[0].severity, Severity::Medium);
        assert_eq!(chains[0].metadata["depth"], 6);
    }

    #[test]
    fn test_external_targets_are_not_modules() {
        let mut config = AssessmentConfig::default();
        config.thresholds.coupling.god_module_fan_in = 2;
        let mut g = DependencyGraph::new();
        g.add_dependency("a.py", "requests", true, None);
        g.add_dependency("b.py", "requests", true, None);

        assert!(run(&g, &config).is_empty());
    }
}
