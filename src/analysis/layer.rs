use super::{AnalysisContext, Analyzer, AnalyzerError};
use crate::fs::read_source;
use crate::model::{BUSINESS, Findings, LayerSet, PRESENTATION, ParseResult, Severity};
use regex::Regex;
use std::path::Path;
use std::sync::LazyLock;

const PREFIX: &str = "LAY";

/// Upper-case SQL statements anywhere, or any-case SQL handed straight to an
/// `execute`/`raw`/`text` style call. Prose such as "select the user from
/// the session" matches neither.
static SQL_QUERY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\b(?:SELECT\s+.+?\s+FROM|INSERT\s+INTO|UPDATE\s+\w+\s+SET|DELETE\s+FROM|CREATE\s+TABLE|DROP\s+TABLE|ALTER\s+TABLE)\b",
        r#"|(?i:\b(?:execute|executemany|executescript|raw|text|query)\s*\(\s*[rbfu]?["'`]\s*(?:select|insert|update|delete|create|drop|alter)\b)"#,
    ))
    .expect("Invalid regex")
});

static ORM_CALL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"\.objects\.(?:filter|get|all|create|exclude|update|delete|raw|select_related|prefetch_related)\s*\(",
        r"|\bsession\.(?:query|add|commit|execute|delete|merge|flush)\s*\(",
        r"|\.query\.(?:filter|filter_by|get|all|first)\s*\(",
        r"|\b(?:prisma|knex|sequelize|mongoose)\.\w+",
        r"|\.(?:findOne|findMany|findAll|findById|findUnique)\s*\(",
        r"|\bgetRepository\s*\(",
    ))
    .expect("Invalid regex")
});

/// Modules whose import marks direct database access.
const DB_MODULES: &[&str] = &[
    "sqlite3",
    "psycopg2",
    "psycopg",
    "pymysql",
    "MySQLdb",
    "asyncpg",
    "sqlalchemy",
    "django.db",
    "peewee",
    "pymongo",
    "motor",
    "mysql",
    "mysql2",
    "pg",
    "mongodb",
    "mongoose",
    "sequelize",
    "typeorm",
    "knex",
    "@prisma/client",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DbPattern {
    SqlQuery,
    OrmUsage,
    DbImport,
}

impl DbPattern {
    fn as_str(self) -> &'static str {
        match self {
            DbPattern::SqlQuery => "sql_query",
            DbPattern::OrmUsage => "orm_usage",
            DbPattern::DbImport => "db_import",
        }
    }

    fn describe(self) -> &'static str {
        match self {
            DbPattern::SqlQuery => "raw SQL",
            DbPattern::OrmUsage => "ORM queries",
            DbPattern::DbImport => "a database driver import",
        }
    }

    fn severity(self, layer: &str) -> Severity {
        match (layer, self) {
            (PRESENTATION, DbPattern::SqlQuery) => Severity::Critical,
            (PRESENTATION, _) | (_, DbPattern::SqlQuery) => Severity::High,
            _ => Severity::Medium,
        }
    }
}

struct DbAccess {
    pattern: DbPattern,
    line: usize,
    evidence: String,
}

/// Layer classification, allowed-dependency rules and database access
/// from the upper layers.
pub struct LayerAnalyzer;

impl Analyzer for LayerAnalyzer {
    fn name(&self) -> &'static str {
        "layer"
    }

    fn description(&self) -> &'static str {
        "Layer dependency rules and direct database access from presentation or business code"
    }

    fn analyze(&self, ctx: &AnalysisContext, findings: &mut Findings) -> Result<(), AnalyzerError> {
        let layers = ctx.config.layer_set();

        check_database_access(ctx, &layers, findings);
        if let Some(graph) = ctx.graph {
            check_layer_dependencies(ctx, &layers, graph, findings);
        }

        Ok(())
    }
}

fn check_database_access(ctx: &AnalysisContext, layers: &LayerSet, findings: &mut Findings) {
    for (path, result) in ctx.files() {
        let relative = ctx.relative(path);
        let Some(layer) = layers.classify(Path::new(&relative)) else {
            continue;
        };
        if layer.name != PRESENTATION && layer.name != BUSINESS {
            continue;
        }

        let source = match read_source(ctx.fs, path) {
            Ok(source) => source,
            Err(e) => {
                tracing::debug!(path = %path.display(), error = %e, "cannot read file for layer scan");
                continue;
            }
        };

        let Some(access) = find_db_access(&source, result) else {
            continue;
        };

        findings
            .create(
                PREFIX,
                "DirectDatabaseAccess",
                access.pattern.severity(&layer.name),
                &relative,
            )
            .line(access.line)
            .message(format!(
                "{} layer file uses {}: {}",
                layer.name,
                access.pattern.describe(),
                access.evidence
            ))
            .explanation(format!(
                "The {} layer should reach data through the data layer, not talk to the database itself.",
                layer.name
            ))
            .recommendation("Move the query into a repository or data-access module and call that.")
            .meta("layer", layer.name.clone())
            .meta("pattern_type", access.pattern.as_str())
            .emit();
    }
}

/// First database access in the file, trying SQL, then ORM calls, then
/// driver imports. At most one is returned so one file yields one finding.
fn find_db_access(source: &str, result: &ParseResult) -> Option<DbAccess> {
    let code_lines = || {
        source
            .lines()
            .enumerate()
            .filter(|(_, line)| !is_comment(line))
    };

    let by_regex = |regex: &Regex, pattern: DbPattern| {
        code_lines().find_map(|(index, line)| {
            regex.find(line).map(|m| DbAccess {
                pattern,
                line: index + 1,
                evidence: m.as_str().to_string(),
            })
        })
    };

    by_regex(&SQL_QUERY, DbPattern::SqlQuery)
        .or_else(|| by_regex(&ORM_CALL, DbPattern::OrmUsage))
        .or_else(|| {
            result
                .imports
                .iter()
                .find(|import| is_db_module(&import.module))
                .map(|import| DbAccess {
                    pattern: DbPattern::DbImport,
                    line: import.line,
                    evidence: import.module.clone(),
                })
        })
}

fn is_comment(line: &str) -> bool {
    let line = line.trim_start();
    line.starts_with('#') || line.starts_with("//") || line.starts_with('*')
}

fn is_db_module(module: &str) -> bool {
    DB_MODULES.iter().any(|db| {
        module == *db
            || module
                .strip_prefix(db)
                .is_some_and(|rest| rest.starts_with('.') || rest.starts_with('/'))
    })
}

fn check_layer_dependencies(
    ctx: &AnalysisContext,
    layers: &LayerSet,
    graph: &crate::graph::DependencyGraph,
    findings: &mut Findings,
) {
    let mut edges: Vec<(&str, &str, Option<usize>)> = graph
        .edges()
        .filter(|(from, to, _)| !graph.is_external(from) && !graph.is_external(to))
        .map(|(from, to, edge)| (from, to, edge.line))
        .collect();
    edges.sort_unstable();

    for (from, to, line) in edges {
        if !ctx.should_analyze_file(Path::new(from)) {
            continue;
        }
        let (Some(source_layer), Some(target_layer)) =
            (layers.classify(Path::new(from)), layers.classify(Path::new(to)))
        else {
            continue;
        };
        if source_layer.allows(&target_layer.name) {
            continue;
        }

        let mut builder = findings
            .create(PREFIX, "LayerViolation", Severity::High, from)
            .message(format!(
                "{} ({}) depends on {} ({})",
                from, source_layer.name, to, target_layer.name
            ))
            .explanation(format!(
                "The {} layer may only depend on: {}.",
                source_layer.name,
                if source_layer.allowed_dependencies.is_empty() {
                    "nothing outside itself".to_string()
                } else {
                    source_layer.allowed_dependencies.join(", ")
                }
            ))
            .recommendation(
                "Route the call through an allowed layer or move the code to the layer it belongs in.",
            )
            .meta("source_layer", source_layer.name.clone())
            .meta("target_layer", target_layer.name.clone())
            .meta("target", to);
        if let Some(line) = line {
            builder = builder.line(line);
        }
        builder.emit();
    }
}
