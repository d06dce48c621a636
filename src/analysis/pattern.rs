use super::{AnalysisContext, Analyzer, AnalyzerError};
use crate::config::PatternThresholds;
use crate::model::{Fidelity, Findings, FunctionDefinition, Import, ParseResult, Severity};
use std::collections::BTreeMap;
use std::path::Path;

const PREFIX: &str = "PAT";

/// Literals too common to be worth naming.
const TRIVIAL_NUMBERS: &[f64] = &[-1.0, 0.0, 1.0, 2.0, 10.0, 100.0];

/// Anti-patterns and missing-pattern opportunities.
pub struct PatternAnalyzer;

impl Analyzer for PatternAnalyzer {
    fn name(&self) -> &'static str {
        "pattern"
    }

    fn description(&self) -> &'static str {
        "Magic numbers, long or complex functions, unused imports and missing design patterns"
    }

    fn analyze(&self, ctx: &AnalysisContext, findings: &mut Findings) -> Result<(), AnalyzerError> {
        let thresholds = &ctx.config.thresholds.pattern;
        let mut construction_sites: BTreeMap<String, Vec<Site>> = BTreeMap::new();

        for (path, result) in ctx.files() {
            let file = ctx.relative(path);

            check_magic_numbers(&file, result, thresholds, findings);
            for (qualified_name, function) in qualified_functions(result) {
                check_function(&file, &qualified_name, function, thresholds, findings);
                collect_sites(&file, function, thresholds, &mut construction_sites);
            }
            check_unused_imports(&file, result, thresholds, findings);
            check_mutable_singletons(&file, result, findings);
        }

        check_factory_opportunities(&construction_sites, thresholds, findings);

        Ok(())
    }
}

struct Site {
    file: String,
    line: usize,
}

/// Top-level functions and methods, methods qualified by their class.
fn qualified_functions(result: &ParseResult) -> Vec<(String, &FunctionDefinition)> {
    let mut functions: Vec<(String, &FunctionDefinition)> = result
        .functions
        .iter()
        .map(|f| (f.name.clone(), f))
        .collect();
    for class in &result.classes {
        for method in &class.methods {
            functions.push((format!("{}.{}", class.name, method.name), method));
        }
    }
    functions.sort_by_key(|(_, f)| f.start_line);
    functions
}

fn is_trivial_number(value: f64) -> bool {
    TRIVIAL_NUMBERS.iter().any(|n| (n - value).abs() < f64::EPSILON)
}

fn check_magic_numbers(
    file: &str,
    result: &ParseResult,
    thresholds: &PatternThresholds,
    findings: &mut Findings,
) {
    let magic: Vec<_> = result
        .numeric_literals
        .iter()
        .filter(|literal| !is_trivial_number(literal.value))
        .collect();
    if magic.len() < thresholds.magic_number_min {
        return;
    }
    let Some(first) = magic.first() else {
        return;
    };

    let examples: Vec<&str> = magic.iter().take(5).map(|l| l.text.as_str()).collect();
    findings
        .create(PREFIX, "MagicNumbers", Severity::Low, file)
        .line(first.line)
        .message(format!(
            "{} unexplained numeric literals, e.g. {}",
            magic.len(),
            examples.join(", ")
        ))
        .explanation("Bare numbers hide their meaning and drift apart when the same value is repeated.")
        .recommendation("Give each value a named constant or move it into configuration.")
        .meta("count", magic.len())
        .meta("examples", examples)
        .emit();
}

fn check_function(
    file: &str,
    name: &str,
    function: &FunctionDefinition,
    thresholds: &PatternThresholds,
    findings: &mut Findings,
) {
    if let Some(lines) = function.line_count() {
        if lines > thresholds.max_function_lines {
            findings
                .create(PREFIX, "LongFunction", Severity::Medium, file)
                .line(function.start_line)
                .message(format!(
                    "{} is {} lines long (max {})",
                    name, lines, thresholds.max_function_lines
                ))
                .explanation("Long functions mix several steps and are hard to test in isolation.")
                .recommendation("Extract the steps into well-named helper functions.")
                .meta("function", name)
                .meta("line_count", lines)
                .emit();
        }
    }

    let Some(body) = &function.body else {
        return;
    };

    if body.complexity > thresholds.max_complexity {
        let severity = if body.complexity > thresholds.max_complexity * 2 {
            Severity::High
        } else {
            Severity::Medium
        };
        findings
            .create(PREFIX, "HighComplexity", severity, file)
            .line(function.start_line)
            .message(format!(
                "{} has cyclomatic complexity {} (max {})",
                name, body.complexity, thresholds.max_complexity
            ))
            .explanation("Every independent path needs its own test and its own reasoning.")
            .recommendation("Use early returns, split the function, or replace branching with lookup tables.")
            .meta("function", name)
            .meta("complexity", body.complexity)
            .emit();
    }

    for chain in &body.type_dispatch_chains {
        if chain.branches < thresholds.strategy_min_branches {
            continue;
        }
        findings
            .create(PREFIX, "StrategyPatternOpportunity", Severity::Medium, file)
            .line(chain.line)
            .message(format!(
                "{} selects behaviour with a {}-way type check",
                name, chain.branches
            ))
            .explanation("Each new variant means another branch in the same function.")
            .recommendation("Move each branch into its own strategy and look the strategy up instead.")
            .meta("function", name)
            .meta("branches", chain.branches)
            .emit();
    }
}

fn collect_sites(
    file: &str,
    function: &FunctionDefinition,
    thresholds: &PatternThresholds,
    sites: &mut BTreeMap<String, Vec<Site>>,
) {
    let Some(body) = &function.body else {
        return;
    };
    for instantiation in &body.instantiations {
        if instantiation.arg_count < thresholds.factory_min_args {
            continue;
        }
        let name = instantiation
            .type_name
            .rsplit('.')
            .next()
            .unwrap_or(&instantiation.type_name);
        sites.entry(name.to_string()).or_default().push(Site {
            file: file.to_string(),
            line: instantiation.line,
        });
    }
}

fn check_factory_opportunities(
    sites: &BTreeMap<String, Vec<Site>>,
    thresholds: &PatternThresholds,
    findings: &mut Findings,
) {
    for (type_name, places) in sites {
        if places.len() < thresholds.factory_min_sites {
            continue;
        }
        let Some(first) = places.first() else {
            continue;
        };

        let mut files: Vec<&str> = places.iter().map(|s| s.file.as_str()).collect();
        files.dedup();
        findings
            .create(PREFIX, "FactoryPatternOpportunity", Severity::Low, &first.file)
            .line(first.line)
            .message(format!(
                "{} is constructed with {}+ arguments in {} places",
                type_name,
                thresholds.factory_min_args,
                places.len()
            ))
            .explanation("Repeating complex construction spreads knowledge of the constructor across the codebase.")
            .recommendation(format!(
                "Add a factory function or builder that owns how a {} is assembled.",
                type_name
            ))
            .meta("type_name", type_name.as_str())
            .meta("sites", places.len())
            .meta("files", files)
            .emit();
    }
}

fn check_unused_imports(
    file: &str,
    result: &ParseResult,
    thresholds: &PatternThresholds,
    findings: &mut Findings,
) {
    // Package initialisers import to re-export.
    if Path::new(file).file_name().is_some_and(|n| n == "__init__.py") {
        return;
    }

    let unused: Vec<(&str, &Import)> = result
        .imports
        .iter()
        .filter(|import| is_checkable(import, result.fidelity))
        .filter_map(|import| import.bound_name().map(|name| (name, import)))
        .filter(|(name, _)| !result.referenced_names.contains(*name))
        .collect();
    if unused.len() < thresholds.unused_import_min {
        return;
    }
    let Some((_, first)) = unused.first() else {
        return;
    };

    let names: Vec<&str> = unused.iter().map(|(name, _)| *name).collect();
    findings
        .create(PREFIX, "UnusedImports", Severity::Low, file)
        .line(first.line)
        .message(format!("{} unused imports: {}", names.len(), names.join(", ")))
        .explanation("Unused imports add false dependencies and slow down readers and tools.")
        .recommendation("Remove them.")
        .meta("count", names.len())
        .meta("names", names)
        .emit();
}

fn is_checkable(import: &Import, fidelity: Fidelity) -> bool {
    if import.module == "__future__" {
        return false;
    }
    // A bare `import 'polyfill'` runs for its side effects.
    !(fidelity == Fidelity::BestEffort && import.symbol.is_none() && import.alias.is_none())
}

fn check_mutable_singletons(file: &str, result: &ParseResult, findings: &mut Findings) {
    for class in &result.classes {
        if !class.is_singleton_shaped || class.mutable_fields.is_empty() {
            continue;
        }
        findings
            .create(PREFIX, "MutableSingleton", Severity::Medium, file)
            .line(class.start_line)
            .message(format!(
                "Singleton {} holds mutable state: {}",
                class.name,
                class.mutable_fields.join(", ")
            ))
            .explanation("A shared mutable instance is global state: any caller can change what every other caller sees.")
            .recommendation("Pass the instance explicitly, or make its state immutable.")
            .meta("class", class.name.clone())
            .meta("mutable_fields", class.mutable_fields.clone())
            .emit();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::analyze_safely;
    use crate::config::AssessmentConfig;
    use crate::fs::mock::MockFs;
    use crate::model::Violation;
    use crate::parser::ParserRegistry;
    use indoc::indoc;
    use std::path::PathBuf;

    fn run_with(files: &[(&str, &str)], config: &AssessmentConfig) -> Vec<Violation> {
        let parsers = ParserRegistry::new();
        let results: BTreeMap<PathBuf, ParseResult> = files
            .iter()
            .map(|(path, source)| {
                let path = PathBuf::from(path);
                let result = parsers.parse(&path, source).unwrap();
                (path, result)
            })
            .collect();
        let fs = MockFs::new();
        let ctx = AnalysisContext::new(Path::new("/p"), config, &results, &fs);
        analyze_safely(&PatternAnalyzer, &ctx)
    }

    fn run(file: &str, source: &str) -> Vec<Violation> {
        run_with(&[(file, source)], &AssessmentConfig::default())
    }

    fn kinds(violations: &[Violation]) -> Vec<&str> {
        violations.iter().map(|v| v.kind.as_str()).collect()
    }

    #[test]
    fn test_magic_numbers() {
        let source = indoc! {"
            TIMEOUT = 30

            def price(x):
                if x > 0:
                    return x * 1.2 + 7 - 13 / 42 % 99
                return 0
        "};

        let violations = run("/p/a.py", source);
        assert_eq!(kinds(&violations), vec!["MagicNumbers"]);
        assert_eq!(violations[0].metadata["count"], 5);
        assert_eq!(violations[0].line, Some(5));
    }

    #[test]
    fn test_trivial_numbers_ignored() {
        let source = "def f(x):\n    return [0, 1, 2, 10, 100, -1, 1.0][x]\n";
        assert!(run("/p/a.py", source).is_empty());
    }

    #[test]
    fn test_long_and_complex_functions() {
        let mut config = AssessmentConfig::default();
        config.thresholds.pattern.max_function_lines = 4;
        config.thresholds.pattern.max_complexity = 2;
        let source = indoc! {"
            def tangled(a, b, c):
                if a:
                    pass
                if b:
                    pass
                if c and a:
                    pass
                return a
        "};

        let violations = run_with(&[("/p/a.py", source)], &config);
        assert_eq!(kinds(&violations), vec!["LongFunction", "HighComplexity"]);
        assert_eq!(violations[0].metadata["line_count"], 8);
        // 1 + three ifs + one boolean operator
        assert_eq!(violations[1].metadata["complexity"], 5);
        assert_eq!(violations[1].severity, Severity::High);
    }

    #[test]
    fn test_unused_imports() {
        let source = indoc! {"
            import os
            import sys
            import json
            from typing import List
            from collections import OrderedDict as OD

            def f() -> List[int]:
                return sys.argv
        "};

        let violations = run("/p/a.py", source);
        assert_eq!(kinds(&violations), vec!["UnusedImports"]);
        assert_eq!(
            violations[0].metadata["names"],
            serde_json::json!(["os", "json", "OD"])
        );
        assert_eq!(violations[0].line, Some(1));
    }

    #[test]
    fn test_unused_imports_skip_package_init_and_side_effects() {
        let init = "import os\nimport sys\nimport json\n";
        assert!(run("/p/pkg/__init__.py", init).is_empty());

        let script = indoc! {"
            import 'reflect-metadata';
            import './styles.css';
            import 'zone.js';
            import { used } from './used';
            used();
        "};
        assert!(run("/p/web/main.ts", script).is_empty());
    }

    #[test]
    fn test_factory_opportunity_across_files() {
        let a = indoc! {"
            def one():
                return Connection(host, port, user)

            def two():
                return Connection(host, port, user, timeout)
        "};
        let b = indoc! {"
            def three():
                return Connection(host, port, user)

            def simple():
                return Connection(host)
        "};

        let violations = run_with(
            &[("/p/a.py", a), ("/p/b.py", b)],
            &AssessmentConfig::default(),
        );
        assert_eq!(kinds(&violations), vec!["FactoryPatternOpportunity"]);
        let v = &violations[0];
        assert_eq!(v.file, PathBuf::from("a.py"));
        assert_eq!(v.line, Some(2));
        assert_eq!(v.metadata["sites"], 3);
        assert_eq!(v.metadata["files"], serde_json::json!(["a.py", "b.py"]));
    }

    #[test]
    fn test_strategy_opportunity() {
        let source = indoc! {"
            def area(shape):
                if isinstance(shape, Circle):
                    return shape.r
                elif isinstance(shape, Square):
                    return shape.s
                elif isinstance(shape, Rect):
                    return shape.w
                elif isinstance(shape, Tri):
                    return shape.b
        "};

        let violations = run("/p/a.py", source);
        assert_eq!(kinds(&violations), vec!["StrategyPatternOpportunity"]);
        assert_eq!(violations[0].metadata["branches"], 4);
        assert_eq!(violations[0].metadata["function"], "area");
    }

    #[test]
    fn test_mutable_singleton() {
        let source = indoc! {"
            class Registry:
                _instance = None

                def __init__(self):
                    self.items = []

            class Settings:
                _instance = None
                name = 'x'
        "};

        let violations = run("/p/a.py", source);
        assert_eq!(kinds(&violations), vec!["MutableSingleton"]);
        assert_eq!(violations[0].metadata["class"], "Registry");
        assert_eq!(violations[0].metadata["mutable_fields"], serde_json::json!(["items"]));
    }
}
