use super::{DependencyGraph, module_id};
use crate::model::{Import, ParseResult};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Path, PathBuf};

const SCRIPT_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx", "mjs", "cjs"];
const PYTHON_EXTENSIONS: &[&str] = &["py", "pyi"];

enum Resolution {
    Internal(String),
    External(String),
}

impl DependencyGraph {
    /// Build the module graph for one run.
    ///
    /// Every parsed file becomes an internal node, whether or not anything
    /// imports it. Imports that resolve to a parsed file become internal
    /// edges; everything else is recorded against an external node named
    /// after the import target. Self-imports are ignored.
    pub fn build(root: &Path, parse_results: &BTreeMap<PathBuf, ParseResult>) -> Self {
        let modules: Vec<(String, &ParseResult)> = parse_results
            .iter()
            .map(|(path, result)| (module_id(root, path), result))
            .collect();
        let resolver = ModuleResolver::new(modules.iter().map(|(id, _)| id.as_str()));

        let mut graph = Self::new();
        for (id, result) in &modules {
            graph.add_module(id);
            graph.set_metadata(id, "lines", result.lines.into());
            graph.set_metadata(id, "classes", result.classes.len().into());
        }

        for (from, result) in &modules {
            for import in &result.imports {
                match resolver.resolve(from, import) {
                    Resolution::Internal(to) if to == *from => {}
                    Resolution::Internal(to) => {
                        graph.add_dependency(from, &to, false, Some(import.line))
                    }
                    Resolution::External(to) => {
                        graph.add_dependency(from, &to, true, Some(import.line))
                    }
                }
            }
        }

        let summary = graph.summary();
        tracing::debug!(
            nodes = summary.nodes,
            edges = summary.edges,
            external = summary.external,
            "dependency graph built"
        );
        graph
    }
}

struct ModuleResolver {
    /// Dotted Python module name to node id.
    python: HashMap<String, String>,
    files: HashSet<String>,
}

impl ModuleResolver {
    fn new<'a>(ids: impl Iterator<Item = &'a str>) -> Self {
        let mut python: HashMap<String, String> = HashMap::new();
        let mut files = HashSet::new();

        for id in ids {
            files.insert(id.to_string());
            let Some(dotted) = python_module_name(id) else {
                continue;
            };

            let mut names = vec![dotted.clone()];
            // src-layout projects import without the `src.` prefix
            if let Some(stripped) = dotted.strip_prefix("src.") {
                names.push(stripped.to_string());
            }
            for name in names {
                let replace = python
                    .get(&name)
                    .is_none_or(|existing| existing.ends_with(".pyi") && id.ends_with(".py"));
                if replace {
                    python.insert(name, id.to_string());
                }
            }
        }

        Self { python, files }
    }

    fn resolve(&self, from: &str, import: &Import) -> Resolution {
        if has_extension(from, PYTHON_EXTENSIONS) {
            self.resolve_python(from, import)
        } else {
            self.resolve_script(from, import)
        }
    }

    fn resolve_python(&self, from: &str, import: &Import) -> Resolution {
        let symbol = import.symbol.as_deref().filter(|s| *s != "*");

        if import.is_relative {
            let dots = import.module.chars().take_while(|c| *c == '.').count();
            let rest = &import.module[dots..];
            let Some(base) = relative_base(from, dots, rest) else {
                return Resolution::External(import.module.clone());
            };

            let mut candidates = Vec::new();
            if let Some(symbol) = symbol {
                candidates.push(join_dotted(&base, symbol));
            }
            candidates.push(base.clone());
            return self
                .lookup_python(&candidates)
                .map_or(Resolution::External(base), Resolution::Internal);
        }

        let mut candidates = Vec::new();
        if let Some(symbol) = symbol {
            candidates.push(join_dotted(&import.module, symbol));
        }
        candidates.push(import.module.clone());

        // Scripts run from their own directory can import siblings directly.
        if let Some(package) = package_of(from).filter(|p| !p.is_empty()) {
            let sibling: Vec<String> = candidates
                .iter()
                .map(|c| join_dotted(&package, c))
                .collect();
            candidates.extend(sibling);
        }

        self.lookup_python(&candidates)
            .map_or_else(|| Resolution::External(import.module.clone()), Resolution::Internal)
    }

    fn lookup_python(&self, candidates: &[String]) -> Option<String> {
        candidates.iter().find_map(|c| self.python.get(c).cloned())
    }

    fn resolve_script(&self, from: &str, import: &Import) -> Resolution {
        if !import.module.starts_with('.') {
            return Resolution::External(import.module.clone());
        }

        let dir = from.rsplit_once('/').map_or("", |(dir, _)| dir);
        let Some(target) = normalize_path(dir, &import.module) else {
            return Resolution::External(import.module.clone());
        };

        let mut candidates = vec![target.clone()];
        // TypeScript ESM imports name the compiled `.js` file.
        if let Some(stem) = target
            .strip_suffix(".js")
            .or_else(|| target.strip_suffix(".jsx"))
        {
            candidates.push(format!("{stem}.ts"));
            candidates.push(format!("{stem}.tsx"));
        }
        for ext in SCRIPT_EXTENSIONS {
            candidates.push(format!("{target}.{ext}"));
        }
        for ext in SCRIPT_EXTENSIONS {
            candidates.push(format!("{target}/index.{ext}"));
        }

        candidates
            .into_iter()
            .find(|c| self.files.contains(c))
            .map_or(Resolution::External(target), Resolution::Internal)
    }
}

fn has_extension(id: &str, extensions: &[&str]) -> bool {
    id.rsplit_once('.')
        .is_some_and(|(_, ext)| extensions.contains(&ext))
}

/// `pkg/sub/mod.py` -> `pkg.sub.mod`; `pkg/__init__.py` -> `pkg`.
fn python_module_name(id: &str) -> Option<String> {
    let stem = id
        .strip_suffix(".py")
        .or_else(|| id.strip_suffix(".pyi"))?;
    let stem = stem
        .strip_suffix("/__init__")
        .or_else(|| (stem == "__init__").then_some(""))
        .unwrap_or(stem);
    Some(stem.replace('/', "."))
}

/// Dotted package containing a Python file. A package's `__init__` is its
/// own package.
fn package_of(id: &str) -> Option<String> {
    let is_init = id.ends_with("/__init__.py") || id == "__init__.py";
    let dotted = python_module_name(id)?;
    if is_init {
        return Some(dotted);
    }
    Some(dotted.rsplit_once('.').map_or(String::new(), |(pkg, _)| pkg.to_string()))
}

/// Resolve `from ..x import y` style prefixes against the importing file.
fn relative_base(from: &str, dots: usize, rest: &str) -> Option<String> {
    let package = package_of(from)?;
    let mut segments: Vec<&str> = package.split('.').filter(|s| !s.is_empty()).collect();
    for _ in 1..dots {
        segments.pop()?;
    }
    segments.extend(rest.split('.').filter(|s| !s.is_empty()));
    Some(segments.join("."))
}

fn join_dotted(base: &str, name: &str) -> String {
    if base.is_empty() {
        name.to_string()
    } else {
        format!("{base}.{name}")
    }
}

/// Join a relative import path onto a directory, folding `.` and `..`.
fn normalize_path(dir: &str, relative: &str) -> Option<String> {
    let mut segments: Vec<&str> = dir.split('/').filter(|s| !s.is_empty()).collect();
    for segment in relative.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop()?;
            }
            other => segments.push(other),
        }
    }
    Some(segments.join("/"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Fidelity;

    fn import(module: &str, symbol: Option<&str>, line: usize) -> Import {
        Import {
            module: module.to_string(),
            symbol: symbol.map(str::to_string),
            alias: None,
            is_relative: module.starts_with('.'),
            line,
        }
    }

    fn project(files: &[(&str, Vec<Import>)]) -> DependencyGraph {
        let root = Path::new("/project");
        let results: BTreeMap<PathBuf, ParseResult> = files
            .iter()
            .map(|(path, imports)| {
                let path = root.join(path);
                let fidelity = if path.extension().is_some_and(|e| e == "py") {
                    Fidelity::Structural
                } else {
                    Fidelity::BestEffort
                };
                let mut result = ParseResult::new(path.clone(), fidelity);
                result.imports = imports.clone();
                (path, result)
            })
            .collect();
        DependencyGraph::build(root, &results)
    }

    #[test]
    fn test_python_absolute_and_external() {
        let g = project(&[
            ("a.py", vec![import("b", None, 1), import("os.path", None, 2)]),
            ("b.py", vec![import("c", None, 1)]),
            ("c.py", vec![import("a", None, 3)]),
        ]);

        assert_eq!(g.dependencies("a.py"), vec!["b.py", "os.path"]);
        assert_eq!(g.dependencies("c.py"), vec!["a.py"]);
        assert!(g.is_external("os.path"));
        assert_eq!(g.edge("c.py", "a.py").unwrap().line, Some(3));
        assert_eq!(g.find_cycles(), vec![vec!["a.py", "b.py", "c.py"]]);
    }

    #[test]
    fn test_python_packages_and_relative_imports() {
        let g = project(&[
            ("app/__init__.py", vec![import(".", Some("views"), 1)]),
            ("app/views.py", vec![import(".models", Some("User"), 1)]),
            ("app/models.py", vec![import("app.db", None, 1)]),
            ("app/db/__init__.py", vec![]),
            ("app/api/handlers.py", vec![import("..", Some("models"), 1)]),
            ("app/api/routes.py", vec![import("handlers", None, 1)]),
        ]);

        assert_eq!(g.dependencies("app/__init__.py"), vec!["app/views.py"]);
        assert_eq!(g.dependencies("app/views.py"), vec!["app/models.py"]);
        assert_eq!(g.dependencies("app/models.py"), vec!["app/db/__init__.py"]);
        assert_eq!(g.dependencies("app/api/handlers.py"), vec!["app/models.py"]);
        assert_eq!(g.dependencies("app/api/routes.py"), vec!["app/api/handlers.py"]);
        assert!(g.external_nodes().is_empty());
    }

    #[test]
    fn test_from_import_of_symbol_targets_module() {
        let g = project(&[
            ("svc.py", vec![import("pkg.repo", Some("Repository"), 1)]),
            ("pkg/__init__.py", vec![]),
            ("pkg/repo.py", vec![]),
        ]);
        assert_eq!(g.dependencies("svc.py"), vec!["pkg/repo.py"]);
    }

    #[test]
    fn test_self_import_is_ignored() {
        let g = project(&[("pkg/__init__.py", vec![import(".", Some("helper"), 1)])]);
        assert!(g.dependencies("pkg/__init__.py").is_empty());
    }

    #[test]
    fn test_script_relative_resolution() {
        let g = project(&[
            (
                "src/app.ts",
                vec![
                    import("./services/user", None, 1),
                    import("./components", None, 2),
                    import("../shared/util.js", None, 3),
                    import("react", None, 4),
                    import("./styles.css", None, 5),
                ],
            ),
            ("src/services/user.ts", vec![]),
            ("src/components/index.tsx", vec![]),
            ("shared/util.ts", vec![]),
        ]);

        assert_eq!(
            g.dependencies("src/app.ts"),
            vec![
                "react",
                "shared/util.ts",
                "src/components/index.tsx",
                "src/services/user.ts",
                "src/styles.css",
            ]
        );
        assert!(g.is_external("react"));
        assert!(g.is_external("src/styles.css"));
    }

    #[test]
    fn test_isolated_modules_are_nodes() {
        let g = project(&[("lonely.py", vec![])]);
        assert!(g.contains("lonely.py"));
        assert_eq!(g.summary().internal, 1);
        assert_eq!(g.node("lonely.py").unwrap().metadata["lines"], 0);
    }

    #[test]
    fn test_module_names() {
        assert_eq!(python_module_name("pkg/sub/mod.py").as_deref(), Some("pkg.sub.mod"));
        assert_eq!(python_module_name("pkg/__init__.py").as_deref(), Some("pkg"));
        assert_eq!(python_module_name("app.ts"), None);
        assert_eq!(package_of("pkg/sub/mod.py").as_deref(), Some("pkg.sub"));
        assert_eq!(package_of("pkg/__init__.py").as_deref(), Some("pkg"));
        assert_eq!(package_of("top.py").as_deref(), Some(""));
        assert_eq!(relative_base("pkg/sub/mod.py", 2, "models").as_deref(), Some("pkg.models"));
        assert_eq!(relative_base("top.py", 2, "x"), None);
        assert_eq!(normalize_path("src/a", "../b/c"), Some("src/b/c".to_string()));
        assert_eq!(normalize_path("", "../x"), None);
    }
}
