//! Integration tests for the archcheck library API.

use archcheck::model::Violation;
use archcheck::output::{JsonOutput, OutputFormatter};
use archcheck::{ArchcheckError, AssessOptions, Severity, assess_path};
use indoc::indoc;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn project(files: &[(&str, &str)]) -> TempDir {
    let dir = tempfile::Builder::new()
        .prefix("archcheck-test")
        .tempdir()
        .unwrap();
    for (path, content) in files {
        let full = dir.path().join(path);
        if let Some(parent) = full.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(full, content).unwrap();
    }
    dir
}

fn of_kind<'a>(violations: &[&'a Violation], kind: &str) -> Vec<&'a Violation> {
    violations
        .iter()
        .copied()
        .filter(|v| v.kind == kind)
        .collect()
}

#[test]
fn test_circular_import_is_critical() {
    let dir = project(&[
        ("a.py", "import b\n"),
        ("b.py", "import c\n"),
        ("c.py", "import a\n"),
    ]);

    let assessment = assess_path(dir.path(), &AssessOptions::default()).unwrap();

    assert_eq!(assessment.parse_results.len(), 3);
    let coupling = &assessment.violations_by_analyzer["coupling"];
    assert_eq!(coupling.len(), 1);
    let cycle = &coupling[0];
    assert_eq!(cycle.kind, "CircularDependency");
    assert_eq!(cycle.severity, Severity::Critical);
    assert_eq!(cycle.file, PathBuf::from("a.py"));
    assert_eq!(cycle.line, Some(1));
    assert!(assessment.has_critical());
}

#[test]
fn test_sql_in_presentation_layer() {
    let dir = project(&[
        (
            "views/users.py",
            indoc! {r#"
                import sqlite3

                def list_users(request):
                    cursor = sqlite3.connect("app.db").cursor()
                    cursor.execute("SELECT * FROM users")
                    return cursor.fetchall()
            "#},
        ),
        ("services/users.py", "def active(users):\n    return users\n"),
    ]);

    let assessment = assess_path(dir.path(), &AssessOptions::default()).unwrap();
    let violations = assessment.violations();
    let db = of_kind(&violations, "DirectDatabaseAccess");

    assert_eq!(db.len(), 1);
    assert_eq!(db[0].severity, Severity::Critical);
    assert_eq!(db[0].file, PathBuf::from("views/users.py"));
    assert_eq!(db[0].line, Some(5));
    assert_eq!(db[0].metadata["pattern_type"], "sql_query");
}

#[test]
fn test_large_class_breaks_single_responsibility() {
    let methods: String = (1..=12)
        .map(|i| format!("    def step_{}(self):\n        return self.state\n\n", i))
        .collect();
    let source = format!("class Pipeline:\n    def __init__(self):\n        self.state = None\n\n{}", methods);
    let dir = project(&[("pipeline.py", source.as_str())]);

    let assessment = assess_path(dir.path(), &AssessOptions::default()).unwrap();
    let violations = assessment.violations();
    let srp = of_kind(&violations, "SRPViolation");

    assert_eq!(srp.len(), 1);
    assert_eq!(srp[0].severity, Severity::Medium);
    assert_eq!(srp[0].metadata["method_count"], 13);
    assert_eq!(srp[0].dimension, "solid");
}

#[test]
fn test_script_cycle_and_layer_violation() {
    let dir = project(&[
        (
            "src/components/UserList.tsx",
            indoc! {"
                import { fetchUsers } from '../api/users';
                import { useUsers } from '../hooks/useUsers';

                export function UserList() {
                    return fetchUsers().then(useUsers);
                }
            "},
        ),
        (
            "src/hooks/useUsers.ts",
            "import { helper } from './helper';\nexport const useUsers = (u) => helper(u);\n",
        ),
        (
            "src/hooks/helper.ts",
            "import { useUsers } from './useUsers';\nexport function helper(u) { return useUsers(u); }\n",
        ),
        ("src/api/users.ts", "export function fetchUsers() { return []; }\n"),
    ]);
    let options = AssessOptions {
        project_type: Some(archcheck::model::ProjectType::React),
        ..Default::default()
    };

    let assessment = assess_path(dir.path(), &options).unwrap();
    let violations = assessment.violations();

    let cycles = of_kind(&violations, "CircularDependency");
    assert_eq!(cycles.len(), 1);
    assert_eq!(
        cycles[0].metadata["cycle"],
        serde_json::json!(["src/hooks/useUsers.ts", "src/hooks/helper.ts"])
    );

    let layering = of_kind(&violations, "LayerViolation");
    assert_eq!(layering.len(), 1);
    assert_eq!(layering[0].file, PathBuf::from("src/components/UserList.tsx"));
    assert_eq!(layering[0].metadata["target"], "src/api/users.ts");
    assert_eq!(layering[0].line, Some(1));
}

#[test]
fn test_exclusions_and_analyzer_selection() {
    let dir = project(&[
        ("a.py", "import b\n"),
        ("b.py", "import a\n"),
        ("migrations/0001.py", "import a\n"),
    ]);
    let options = AssessOptions {
        analyzers: Some(vec!["solid".to_string()]),
        exclude: vec!["migrations/**".to_string()],
        ..Default::default()
    };

    let assessment = assess_path(dir.path(), &options).unwrap();

    assert_eq!(assessment.parse_results.len(), 2);
    assert_eq!(assessment.analyzers_run, vec!["solid"]);
    assert!(assessment.violations().is_empty());
    // The graph is still built even when no analyzer uses it.
    assert_eq!(assessment.graph.find_cycles().len(), 1);
}

#[test]
fn test_config_file_thresholds() {
    let dir = project(&[
        (
            ".archcheck.toml",
            indoc! {r#"
                enabled_analyzers = ["solid"]

                [thresholds.solid]
                max_methods = 2
            "#},
        ),
        (
            "service.py",
            "class Service:\n    def a(self):\n        pass\n    def b(self):\n        pass\n    def c(self):\n        pass\n",
        ),
    ]);

    let assessment = assess_path(dir.path(), &AssessOptions::default()).unwrap();
    let violations = assessment.violations();

    assert_eq!(violations.len(), 1);
    assert_eq!(violations[0].kind, "SRPViolation");
    assert_eq!(violations[0].metadata["method_count"], 3);
}

#[test]
fn test_non_utf8_source_is_still_parsed() {
    let dir = project(&[("plain.py", "x = 1\n")]);
    fs::write(dir.path().join("legacy.py"), b"# caf\xe9\nimport plain\n").unwrap();

    let assessment = assess_path(dir.path(), &AssessOptions::default()).unwrap();

    assert!(assessment.skipped.is_empty());
    assert_eq!(assessment.graph.dependencies("legacy.py"), vec!["plain.py"]);
}

#[test]
fn test_json_report() {
    let dir = project(&[("a.py", "import b\n"), ("b.py", "import a\n")]);
    let assessment = assess_path(dir.path(), &AssessOptions::default()).unwrap();

    let mut buffer = Vec::new();
    JsonOutput::new(Severity::Critical)
        .format(&assessment, &mut buffer)
        .unwrap();
    let report: serde_json::Value = serde_json::from_slice(&buffer).unwrap();

    let entries = report.as_array().unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0]["type"], "CircularDependency");
    assert_eq!(entries[0]["id"], "CPL-001");
}

#[test]
fn test_single_file_path() {
    let dir = project(&[("a.py", "import b\n"), ("b.py", "import a\n")]);

    let assessment = assess_path(&dir.path().join("a.py"), &AssessOptions::default()).unwrap();

    assert_eq!(assessment.parse_results.len(), 1);
    assert!(!assessment.has_critical());
}

#[test]
fn test_invalid_path() {
    let result = assess_path(Path::new("/nonexistent/path"), &AssessOptions::default());

    match result {
        Err(ArchcheckError::PathNotFound(_)) => {}
        Err(e) => panic!("Expected PathNotFound error, got: {:?}", e),
        Ok(_) => panic!("Expected error for invalid path"),
    }
}
