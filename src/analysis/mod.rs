mod coupling;
mod layer;
mod pattern;
mod registry;
mod solid;

pub use coupling::CouplingAnalyzer;
pub use layer::LayerAnalyzer;
pub use pattern::PatternAnalyzer;
pub use registry::AnalyzerRegistry;
pub use solid::SolidAnalyzer;

use crate::config::AssessmentConfig;
use crate::fs::{FileSystem, read_source};
use crate::graph::{DependencyGraph, module_id};
use crate::model::{Assessment, Findings, ParseResult, SkippedFile, Violation};
use crate::parser::{ParseError, ParserRegistry};
use ignore::WalkBuilder;
use rayon::prelude::*;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Directories skipped during discovery even outside a git checkout.
const VENDORED_DIRS: &[&str] = &[
    "node_modules",
    "__pycache__",
    "site-packages",
    "venv",
    "bower_components",
];

/// A declared precondition an analyzer could not meet.
#[derive(Debug, Error)]
pub enum AnalyzerError {
    #[error("dependency graph is required but was not provided")]
    MissingGraph,
    #[error("{0}")]
    Precondition(String),
}

/// Read-only inputs shared by every analyzer in a run.
#[derive(Clone, Copy)]
pub struct AnalysisContext<'a> {
    pub project_root: &'a Path,
    pub config: &'a AssessmentConfig,
    pub parse_results: &'a BTreeMap<PathBuf, ParseResult>,
    pub graph: Option<&'a DependencyGraph>,
    pub fs: &'a dyn FileSystem,
}

impl<'a> AnalysisContext<'a> {
    pub fn new(
        project_root: &'a Path,
        config: &'a AssessmentConfig,
        parse_results: &'a BTreeMap<PathBuf, ParseResult>,
        fs: &'a dyn FileSystem,
    ) -> Self {
        Self {
            project_root,
            config,
            parse_results,
            graph: None,
            fs,
        }
    }

    pub fn with_graph(mut self, graph: &'a DependencyGraph) -> Self {
        self.graph = Some(graph);
        self
    }

    pub fn require_graph(&self) -> Result<&'a DependencyGraph, AnalyzerError> {
        self.graph.ok_or(AnalyzerError::MissingGraph)
    }

    /// Project-relative, `/`-separated form of `path`. Also the graph id of
    /// an internal module.
    pub fn relative(&self, path: &Path) -> String {
        module_id(self.project_root, path)
    }

    /// Re-check a file against the exclusion filter. Callers normally drop
    /// excluded files before parsing.
    pub fn should_analyze_file(&self, path: &Path) -> bool {
        !self
            .config
            .exclude
            .is_excluded(Path::new(&self.relative(path)))
    }

    /// Parse results of files that pass [`Self::should_analyze_file`], in
    /// path order.
    pub fn files(&self) -> impl Iterator<Item = (&'a PathBuf, &'a ParseResult)> + '_ {
        self.parse_results
            .iter()
            .filter(|(path, _)| self.should_analyze_file(path))
    }
}

/// One architecture dimension.
///
/// Implementations hold no per-run state. Violation ids come from the
/// [`Findings`] collector handed to each call, so one instance can serve
/// any number of runs.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    fn analyze(&self, ctx: &AnalysisContext, findings: &mut Findings)
    -> Result<(), AnalyzerError>;

    fn is_enabled(&self, config: &AssessmentConfig) -> bool {
        config.is_analyzer_enabled(self.name())
    }
}

/// Run one analyzer and return its violations.
///
/// Never fails: a precondition error or a panic inside the analyzer is
/// logged and yields an empty list. Partial findings of a failed run are
/// discarded.
pub fn analyze_safely(analyzer: &dyn Analyzer, ctx: &AnalysisContext) -> Vec<Violation> {
    let name = analyzer.name();
    let mut findings = Findings::new(name);

    let outcome = panic::catch_unwind(AssertUnwindSafe(|| analyzer.analyze(ctx, &mut findings)));

    match outcome {
        Ok(Ok(())) => {
            tracing::debug!(analyzer = name, violations = findings.len(), "analyzer finished");
            findings.into_violations()
        }
        Ok(Err(e)) => {
            tracing::warn!(analyzer = name, error = %e, "analyzer failed, skipping");
            Vec::new()
        }
        Err(payload) => {
            tracing::error!(
                analyzer = name,
                panic = %panic_message(payload.as_ref()),
                "analyzer panicked, skipping"
            );
            Vec::new()
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Every file under `root` that a registered parser claims and the
/// exclusion filter keeps, sorted.
pub fn discover_files(
    root: &Path,
    config: &AssessmentConfig,
    parsers: &ParserRegistry,
) -> Vec<PathBuf> {
    let walker = WalkBuilder::new(root)
        .hidden(true)
        .git_ignore(true)
        .filter_entry(|entry| {
            !(entry.file_type().is_some_and(|t| t.is_dir())
                && entry
                    .file_name()
                    .to_str()
                    .is_some_and(|name| VENDORED_DIRS.contains(&name)))
        })
        .build();

    let mut files: Vec<PathBuf> = walker
        .flatten()
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .map(|entry| entry.into_path())
        .filter(|path| parsers.find_parser(path).is_some())
        .filter(|path| {
            !config
                .exclude
                .is_excluded(Path::new(&module_id(root, path)))
        })
        .collect();

    files.sort();
    tracing::debug!(root = %root.display(), files = files.len(), "discovered source files");
    files
}

/// Parse, build the graph and run the built-in analyzers.
pub fn assess(
    root: &Path,
    files: &[PathBuf],
    config: &AssessmentConfig,
    fs: &dyn FileSystem,
) -> Assessment {
    assess_with(
        root,
        files,
        config,
        fs,
        &ParserRegistry::new(),
        &AnalyzerRegistry::builtin(),
    )
}

/// [`assess`] with caller-supplied parser and analyzer registries.
pub fn assess_with(
    root: &Path,
    files: &[PathBuf],
    config: &AssessmentConfig,
    fs: &dyn FileSystem,
    parsers: &ParserRegistry,
    analyzers: &AnalyzerRegistry,
) -> Assessment {
    let project_name = root
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("project")
        .to_string();

    let (parse_results, skipped) = parse_files(files, fs, parsers);

    let graph = DependencyGraph::build(root, &parse_results);

    let ctx = AnalysisContext::new(root, config, &parse_results, fs).with_graph(&graph);
    let analyzers_run: Vec<String> = analyzers
        .enabled(config)
        .map(|a| a.name().to_string())
        .collect();
    let violations_by_analyzer = analyzers.run_all(&ctx);

    let assessment = Assessment {
        project_name,
        root: root.to_path_buf(),
        parse_results,
        skipped,
        graph,
        analyzers_run,
        violations_by_analyzer,
    };

    tracing::info!(
        project = %assessment.project_name,
        files = assessment.parse_results.len(),
        skipped = assessment.skipped.len(),
        violations = assessment.violation_count(),
        critical = assessment.critical_count(),
        "assessment complete"
    );

    assessment
}

/// Parse every file in parallel. A file that cannot be read or parsed is
/// recorded as skipped and contributes nothing else.
fn parse_files(
    files: &[PathBuf],
    fs: &dyn FileSystem,
    parsers: &ParserRegistry,
) -> (BTreeMap<PathBuf, ParseResult>, Vec<SkippedFile>) {
    let outcomes: Vec<(PathBuf, Result<ParseResult, ParseError>)> = files
        .par_iter()
        .map(|path| (path.clone(), parse_file(path, fs, parsers)))
        .collect();

    let mut parse_results = BTreeMap::new();
    let mut skipped = Vec::new();

    for (path, outcome) in outcomes {
        match outcome {
            Ok(result) => {
                parse_results.insert(path, result);
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping file");
                skipped.push(SkippedFile {
                    path,
                    reason: e.to_string(),
                });
            }
        }
    }

    skipped.sort_by(|a, b| a.path.cmp(&b.path));
    tracing::debug!(
        parsed = parse_results.len(),
        skipped = skipped.len(),
        "parsing finished"
    );
    (parse_results, skipped)
}

fn parse_file(
    path: &Path,
    fs: &dyn FileSystem,
    parsers: &ParserRegistry,
) -> Result<ParseResult, ParseError> {
    let source = read_source(fs, path)?;
    panic::catch_unwind(AssertUnwindSafe(|| parsers.parse(path, &source))).unwrap_or_else(
        |payload| {
            Err(ParseError::Parse(format!(
                "parser panicked: {}",
                panic_message(payload.as_ref())
            )))
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;

    struct Failing;

    impl Analyzer for Failing {
        fn name(&self) -> &'static str {
            "failing"
        }

        fn description(&self) -> &'static str {
            "Always fails its precondition"
        }

        fn analyze(&self, _: &AnalysisContext, findings: &mut Findings) -> Result<(), AnalyzerError> {
            findings
                .create("FAIL", "Partial", crate::model::Severity::Low, "a.py")
                .emit();
            Err(AnalyzerError::Precondition("not today".to_string()))
        }
    }

    struct Panicking;

    impl Analyzer for Panicking {
        fn name(&self) -> &'static str {
            "panicking"
        }

        fn description(&self) -> &'static str {
            "Panics mid-analysis"
        }

        fn analyze(&self, _: &AnalysisContext, _: &mut Findings) -> Result<(), AnalyzerError> {
            panic!("index out of bounds");
        }
    }

    #[test]
    fn test_analyze_safely_swallows_errors_and_panics() {
        let config = AssessmentConfig::default();
        let results = BTreeMap::new();
        let fs = MockFs::new();
        let ctx = AnalysisContext::new(Path::new("/p"), &config, &results, &fs);

        assert!(analyze_safely(&Failing, &ctx).is_empty());
        assert!(analyze_safely(&Panicking, &ctx).is_empty());
    }

    #[test]
    fn test_should_analyze_file_uses_exclusions() {
        let config = AssessmentConfig::default()
            .with_exclude_patterns(&["**/migrations/**".to_string()])
            .unwrap();
        let results = BTreeMap::new();
        let fs = MockFs::new();
        let ctx = AnalysisContext::new(Path::new("/p"), &config, &results, &fs);

        assert!(ctx.should_analyze_file(Path::new("/p/app/models.py")));
        assert!(!ctx.should_analyze_file(Path::new("/p/app/migrations/0001.py")));
        assert_eq!(ctx.relative(Path::new("/p/app/models.py")), "app/models.py");
    }

    #[test]
    fn test_assess_records_unreadable_files_as_skipped() {
        let fs = MockFs::with_files([
            ("/p/a.py", "import b\n"),
            ("/p/b.py", "X = 1\n"),
        ]);
        let files = vec![
            PathBuf::from("/p/a.py"),
            PathBuf::from("/p/b.py"),
            PathBuf::from("/p/missing.py"),
        ];

        let result = assess(Path::new("/p"), &files, &AssessmentConfig::default(), &fs);

        assert_eq!(result.project_name, "p");
        assert_eq!(result.parse_results.len(), 2);
        assert_eq!(result.skipped.len(), 1);
        assert_eq!(result.skipped[0].path, PathBuf::from("/p/missing.py"));
        assert_eq!(result.graph.dependencies("a.py"), vec!["b.py"]);
        assert_eq!(
            result.analyzers_run,
            vec!["coupling", "layer", "solid", "pattern"]
        );
    }

    #[test]
    fn test_assess_without_graph_dependent_findings() {
        let fs = MockFs::with_files([("/p/a.py", "def f():\n    return 1\n")]);
        let config = AssessmentConfig::default();

        let result = assess(Path::new("/p"), &[PathBuf::from("/p/a.py")], &config, &fs);

        assert!(result.violations().is_empty());
        assert!(!result.has_critical());
    }
}
