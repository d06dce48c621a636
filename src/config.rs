use crate::fs::{FileSystem, read_source};
use crate::model::{LayerDefinition, LayerSet, ProjectType};
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::path::Path;
use thiserror::Error;

pub const CONFIG_FILE: &str = ".archcheck.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid exclude pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        source: globset::Error,
    },
    #[error("{0}")]
    UnknownProjectType(String),
}

/// Settings for one assessment run. Immutable once the run starts.
#[derive(Debug, Clone)]
pub struct AssessmentConfig {
    pub project_type: ProjectType,
    /// Analyzer names to run. Empty means every analyzer is enabled.
    pub enabled_analyzers: BTreeSet<String>,
    pub exclude: PathFilter,
    pub custom_layers: Option<Vec<LayerDefinition>>,
    pub thresholds: Thresholds,
    /// Declared for callers that enforce a process-level deadline. The
    /// pipeline itself never reads it.
    pub timeout_seconds: Option<u64>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Thresholds {
    pub coupling: CouplingThresholds,
    pub solid: SolidThresholds,
    pub pattern: PatternThresholds,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CouplingThresholds {
    pub fan_out_medium: usize,
    pub fan_out_high: usize,
    pub god_module_fan_in: usize,
    /// Minimum number of modules in a chain before it is reported.
    pub deep_chain_min_depth: usize,
    pub max_reported_chains: usize,
    /// Longest chain the enumeration will follow.
    pub chain_search_depth: usize,
    /// Node expansions allowed per enumeration before it stops early.
    pub chain_search_budget: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SolidThresholds {
    pub max_methods: usize,
    pub max_class_lines: usize,
    pub max_lcom: f64,
    pub max_interface_methods: usize,
    pub max_stub_methods: usize,
    pub type_dispatch_branches: usize,
    pub max_concrete_dependencies: usize,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PatternThresholds {
    pub magic_number_min: usize,
    pub max_function_lines: usize,
    pub max_complexity: u32,
    pub unused_import_min: usize,
    pub factory_min_sites: usize,
    pub factory_min_args: usize,
    pub strategy_min_branches: usize,
}

/// Compiled exclusion globs, matched against project-relative paths.
#[derive(Debug, Clone)]
pub struct PathFilter {
    patterns: Vec<String>,
    set: GlobSet,
}

#[derive(Debug, Deserialize)]
struct RawConfig {
    project_type: Option<String>,
    enabled_analyzers: Option<Vec<String>>,
    exclude: Option<Vec<String>>,
    timeout_seconds: Option<u64>,
    thresholds: Option<Thresholds>,
    layers: Option<Vec<LayerDefinition>>,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            project_type: ProjectType::Generic,
            enabled_analyzers: BTreeSet::new(),
            exclude: PathFilter::empty(),
            custom_layers: None,
            thresholds: Thresholds::default(),
            timeout_seconds: None,
        }
    }
}

impl Default for CouplingThresholds {
    fn default() -> Self {
        Self {
            fan_out_medium: 10,
            fan_out_high: 20,
            god_module_fan_in: 15,
            deep_chain_min_depth: 5,
            max_reported_chains: 10,
            chain_search_depth: 12,
            chain_search_budget: 50_000,
        }
    }
}

impl Default for SolidThresholds {
    fn default() -> Self {
        Self {
            max_methods: 10,
            max_class_lines: 300,
            max_lcom: 0.8,
            max_interface_methods: 7,
            max_stub_methods: 3,
            type_dispatch_branches: 3,
            max_concrete_dependencies: 3,
        }
    }
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            magic_number_min: 5,
            max_function_lines: 50,
            max_complexity: 10,
            unused_import_min: 3,
            factory_min_sites: 3,
            factory_min_args: 3,
            strategy_min_branches: 4,
        }
    }
}

impl AssessmentConfig {
    /// Load `.archcheck.toml` from the project root, or defaults if absent.
    pub fn load(project_path: &Path, fs: &dyn FileSystem) -> Result<Self, ConfigError> {
        let config_path = project_path.join(CONFIG_FILE);

        if !fs.exists(&config_path) {
            return Ok(Self::default());
        }

        Self::from_toml(&read_source(fs, &config_path)?)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let raw: RawConfig = toml::from_str(content)?;

        let project_type = match raw.project_type {
            Some(name) => name.parse().map_err(ConfigError::UnknownProjectType)?,
            None => ProjectType::Generic,
        };

        let exclude = match raw.exclude {
            Some(patterns) => PathFilter::new(&patterns)?,
            None => PathFilter::empty(),
        };

        Ok(Self {
            project_type,
            enabled_analyzers: raw
                .enabled_analyzers
                .unwrap_or_default()
                .into_iter()
                .map(|name| name.to_lowercase())
                .collect(),
            exclude,
            custom_layers: raw.layers.filter(|layers| !layers.is_empty()),
            thresholds: raw.thresholds.unwrap_or_default(),
            timeout_seconds: raw.timeout_seconds,
        })
    }

    pub fn with_exclude_patterns(mut self, patterns: &[String]) -> Result<Self, ConfigError> {
        let mut all = self.exclude.patterns.clone();
        all.extend(patterns.iter().cloned());
        self.exclude = PathFilter::new(&all)?;
        Ok(self)
    }

    pub fn is_analyzer_enabled(&self, name: &str) -> bool {
        self.enabled_analyzers.is_empty() || self.enabled_analyzers.contains(name)
    }

    /// Custom layers when configured, otherwise the built-in set for the
    /// project type.
    pub fn layer_set(&self) -> LayerSet {
        match &self.custom_layers {
            Some(layers) => LayerSet::new(layers.clone()),
            None => LayerSet::for_project(self.project_type),
        }
    }
}

impl PathFilter {
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
        }
    }

    pub fn new(patterns: &[String]) -> Result<Self, ConfigError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in patterns {
            let glob = Glob::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let set = builder
            .build()
            .map_err(|source| ConfigError::InvalidPattern {
                pattern: patterns.join(", "),
                source,
            })?;

        Ok(Self {
            patterns: patterns.to_vec(),
            set,
        })
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn is_excluded(&self, relative_path: &Path) -> bool {
        !self.patterns.is_empty() && self.set.is_match(relative_path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fs::mock::MockFs;

    #[test]
    fn test_missing_file_uses_defaults() {
        let fs = MockFs::new();
        let config = AssessmentConfig::load(Path::new("/project"), &fs).unwrap();
        assert_eq!(config.project_type, ProjectType::Generic);
        assert!(config.enabled_analyzers.is_empty());
        assert_eq!(config.thresholds.solid.max_methods, 10);
    }

    #[test]
    fn test_load_from_file() {
        let fs = MockFs::with_files([(
            "/project/.archcheck.toml",
            r#"
project_type = "django"
enabled_analyzers = ["Coupling", "solid"]
exclude = ["**/migrations/**"]
timeout_seconds = 120

[thresholds.coupling]
fan_out_high = 30

[thresholds.solid]
max_methods = 12

[[layers]]
name = "presentation"
patterns = ["views"]
allowed_dependencies = ["business"]
"#,
        )]);

        let config = AssessmentConfig::load(Path::new("/project"), &fs).unwrap();
        assert_eq!(config.project_type, ProjectType::Django);
        assert!(config.is_analyzer_enabled("coupling"));
        assert!(!config.is_analyzer_enabled("pattern"));
        assert_eq!(config.thresholds.coupling.fan_out_high, 30);
        assert_eq!(config.thresholds.coupling.fan_out_medium, 10);
        assert_eq!(config.thresholds.solid.max_methods, 12);
        assert_eq!(config.timeout_seconds, Some(120));
        assert!(config.exclude.is_excluded(Path::new("app/migrations/0001_initial.py")));
        assert_eq!(config.layer_set().layers().len(), 1);
    }

    #[test]
    fn test_empty_enabled_set_enables_everything() {
        let config = AssessmentConfig::default();
        assert!(config.is_analyzer_enabled("coupling"));
        assert!(config.is_analyzer_enabled("anything"));
    }

    #[test]
    fn test_invalid_glob_is_rejected() {
        let result = AssessmentConfig::default().with_exclude_patterns(&["src/[".to_string()]);
        assert!(matches!(result, Err(ConfigError::InvalidPattern { .. })));
    }

    #[test]
    fn test_unknown_project_type() {
        let result = AssessmentConfig::from_toml("project_type = \"cobol\"");
        assert!(matches!(result, Err(ConfigError::UnknownProjectType(_))));
    }
}
