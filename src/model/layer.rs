use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// Framework hint used to pick a built-in layer set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProjectType {
    #[default]
    Generic,
    Django,
    Flask,
    FastApi,
    React,
    Express,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LayerDefinition {
    pub name: String,
    /// Path fragments that place a file in this layer.
    pub patterns: Vec<String>,
    /// Layers this layer may depend on, besides itself.
    #[serde(default)]
    pub allowed_dependencies: Vec<String>,
}

/// Ordered set of layers with path classification.
#[derive(Debug, Clone, PartialEq)]
pub struct LayerSet {
    layers: Vec<LayerDefinition>,
}

pub const PRESENTATION: &str = "presentation";
pub const BUSINESS: &str = "business";
pub const DATA: &str = "data";
pub const INFRASTRUCTURE: &str = "infrastructure";

impl LayerDefinition {
    pub fn new(name: &str, patterns: &[&str], allowed: &[&str]) -> Self {
        Self {
            name: name.to_string(),
            patterns: patterns.iter().map(|s| s.to_string()).collect(),
            allowed_dependencies: allowed.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn allows(&self, target_layer: &str) -> bool {
        self.name == target_layer || self.allowed_dependencies.iter().any(|l| l == target_layer)
    }

    /// Length of the longest pattern matching `path`, if any does.
    fn match_len(&self, path: &str) -> Option<usize> {
        self.patterns
            .iter()
            .filter(|p| pattern_matches(p, path))
            .map(|p| p.len())
            .max()
    }
}

impl LayerSet {
    pub fn new(layers: Vec<LayerDefinition>) -> Self {
        Self { layers }
    }

    pub fn for_project(project_type: ProjectType) -> Self {
        let layers = match project_type {
            ProjectType::Generic => vec![
                LayerDefinition::new(
                    PRESENTATION,
                    &["views", "controllers", "handlers", "routes", "ui", "templates", "cli"],
                    &[BUSINESS],
                ),
                LayerDefinition::new(
                    BUSINESS,
                    &["services", "domain", "usecases", "use_cases", "business", "logic"],
                    &[DATA, INFRASTRUCTURE],
                ),
                LayerDefinition::new(
                    DATA,
                    &["repositories", "repository", "models", "dal", "dao", "db", "persistence"],
                    &[INFRASTRUCTURE],
                ),
                LayerDefinition::new(
                    INFRASTRUCTURE,
                    &["infrastructure", "adapters", "clients", "gateways"],
                    &[],
                ),
            ],
            ProjectType::Django => vec![
                LayerDefinition::new(
                    PRESENTATION,
                    &["views", "templates", "forms", "serializers", "urls", "admin"],
                    &[BUSINESS, DATA],
                ),
                LayerDefinition::new(
                    BUSINESS,
                    &["services", "managers", "tasks", "domain"],
                    &[DATA],
                ),
                LayerDefinition::new(
                    DATA,
                    &["models", "migrations", "repositories", "querysets"],
                    &[],
                ),
            ],
            ProjectType::Flask | ProjectType::FastApi => vec![
                LayerDefinition::new(
                    PRESENTATION,
                    &["routes", "views", "endpoints", "routers", "blueprints", "templates", "api"],
                    &[BUSINESS],
                ),
                LayerDefinition::new(
                    BUSINESS,
                    &["services", "domain", "core", "usecases"],
                    &[DATA],
                ),
                LayerDefinition::new(
                    DATA,
                    &["models", "repositories", "crud", "db", "database"],
                    &[],
                ),
            ],
            ProjectType::React => vec![
                LayerDefinition::new(
                    PRESENTATION,
                    &["components", "pages", "views", "screens", "layouts"],
                    &[BUSINESS],
                ),
                LayerDefinition::new(
                    BUSINESS,
                    &["hooks", "services", "store", "state", "reducers", "context"],
                    &[DATA],
                ),
                LayerDefinition::new(DATA, &["api", "clients", "repositories"], &[]),
            ],
            ProjectType::Express => vec![
                LayerDefinition::new(
                    PRESENTATION,
                    &["routes", "controllers", "middleware", "views"],
                    &[BUSINESS],
                ),
                LayerDefinition::new(BUSINESS, &["services", "domain"], &[DATA]),
                LayerDefinition::new(DATA, &["models", "repositories", "db", "dao"], &[]),
            ],
        };
        Self { layers }
    }

    pub fn layers(&self) -> &[LayerDefinition] {
        &self.layers
    }

    pub fn get(&self, name: &str) -> Option<&LayerDefinition> {
        self.layers.iter().find(|l| l.name == name)
    }

    /// Classify a project-relative path. The longest matching pattern wins;
    /// ties go to the layer defined first.
    pub fn classify(&self, path: &Path) -> Option<&LayerDefinition> {
        let normalized = path.to_string_lossy().replace('\\', "/").to_lowercase();
        let mut best: Option<(&LayerDefinition, usize)> = None;

        for layer in &self.layers {
            if let Some(len) = layer.match_len(&normalized) {
                if best.is_none_or(|(_, best_len)| len > best_len) {
                    best = Some((layer, len));
                }
            }
        }

        best.map(|(layer, _)| layer)
    }
}

/// Shorter patterns (`api`, `ui`, `db`) occur inside too many unrelated
/// names, so they must match a whole segment or a `_`-joined affix.
const MIN_SUBSTRING_PATTERN: usize = 4;

/// Patterns containing `/` match as substrings of the whole path. Other
/// patterns are checked against each directory name and the file stem: as a
/// substring (`userviews`, `adminviews`) when at least
/// `MIN_SUBSTRING_PATTERN` long, otherwise as the whole name or a `user_api`
/// style affix.
fn pattern_matches(pattern: &str, path: &str) -> bool {
    let pattern = pattern.to_lowercase();
    if pattern.contains('/') {
        return path.contains(&pattern);
    }

    let segments: Vec<&str> = path.split('/').collect();
    let last = segments.len().saturating_sub(1);

    segments.iter().enumerate().any(|(i, segment)| {
        let name = if i == last {
            segment.split('.').next().unwrap_or(segment)
        } else {
            segment
        };
        if pattern.len() >= MIN_SUBSTRING_PATTERN {
            return name.contains(pattern.as_str());
        }
        name == pattern
            || name.starts_with(&format!("{}_", pattern))
            || name.ends_with(&format!("_{}", pattern))
    })
}

impl fmt::Display for ProjectType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ProjectType::Generic => "generic",
            ProjectType::Django => "django",
            ProjectType::Flask => "flask",
            ProjectType::FastApi => "fastapi",
            ProjectType::React => "react",
            ProjectType::Express => "express",
        };
        write!(f, "{}", name)
    }
}

impl FromStr for ProjectType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "generic" | "" => Ok(ProjectType::Generic),
            "django" => Ok(ProjectType::Django),
            "flask" => Ok(ProjectType::Flask),
            "fastapi" => Ok(ProjectType::FastApi),
            "react" | "nextjs" => Ok(ProjectType::React),
            "express" | "node" => Ok(ProjectType::Express),
            _ => Err(format!("Unknown project type: {}", s)),
        }
    }
}
