//! Library API for archcheck.
//!
//! The CLI is a thin wrapper over these functions. They return proper
//! `Result` types instead of printing and picking exit codes.
//!
//! # Example
//!
//! ```no_run
//! use archcheck::{AssessOptions, assess_path};
//! use std::path::Path;
//!
//! let assessment = assess_path(Path::new("."), &AssessOptions::default())?;
//! for violation in assessment.violations() {
//!     println!("{}", violation);
//! }
//! # Ok::<(), archcheck::ArchcheckError>(())
//! ```

use crate::analysis::{AnalyzerRegistry, assess_with, discover_files};
use crate::config::{AssessmentConfig, ConfigError};
use crate::fs::{FileSystem, default_fs, read_source};
use crate::model::{Assessment, ProjectType};
use crate::parser::ParserRegistry;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that stop an assessment before it starts.
#[derive(Debug, Error)]
pub enum ArchcheckError {
    /// The specified path could not be found or resolved.
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    /// Configuration file error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// IO error while setting up the run.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Overrides applied on top of the project's configuration file.
#[derive(Debug, Clone, Default)]
pub struct AssessOptions {
    /// Explicit config file instead of `<root>/.archcheck.toml`.
    pub config_file: Option<PathBuf>,

    /// Analyzers to run. `None` keeps the configured set.
    pub analyzers: Option<Vec<String>>,

    /// Extra exclusion globs, added to the configured ones.
    pub exclude: Vec<String>,

    pub project_type: Option<ProjectType>,
}

/// Resolve configuration for `root`: the config file, then `options`.
pub fn load_config(
    root: &Path,
    options: &AssessOptions,
    fs: &dyn FileSystem,
) -> Result<AssessmentConfig, ArchcheckError> {
    let mut config = match &options.config_file {
        Some(path) => {
            if !fs.exists(path) {
                return Err(ArchcheckError::PathNotFound(path.clone()));
            }
            AssessmentConfig::from_toml(&read_source(fs, path)?)?
        }
        None => AssessmentConfig::load(root, fs)?,
    };

    if let Some(analyzers) = &options.analyzers {
        config.enabled_analyzers = analyzers
            .iter()
            .map(|name| name.trim().to_lowercase())
            .filter(|name| !name.is_empty())
            .collect();
    }
    if let Some(project_type) = options.project_type {
        config.project_type = project_type;
    }
    if !options.exclude.is_empty() {
        config = config.with_exclude_patterns(&options.exclude)?;
    }

    // Unknown names are dropped so a typo falls back to the full set instead
    // of silently running nothing.
    let known = AnalyzerRegistry::builtin();
    config.enabled_analyzers.retain(|name| {
        let found = known.get(name).is_some();
        if !found {
            tracing::warn!(analyzer = %name, "unknown analyzer in configuration, ignoring");
        }
        found
    });

    Ok(config)
}

/// Assess the project at `path` with the built-in parsers and analyzers.
pub fn assess_path(path: &Path, options: &AssessOptions) -> Result<Assessment, ArchcheckError> {
    assess_path_with_fs(path, options, default_fs())
}

/// [`assess_path`] with file reads going through `fs`. Discovery still
/// walks the real directory tree.
pub fn assess_path_with_fs(
    path: &Path,
    options: &AssessOptions,
    fs: &dyn FileSystem,
) -> Result<Assessment, ArchcheckError> {
    let resolved = path
        .canonicalize()
        .map_err(|_| ArchcheckError::PathNotFound(path.to_path_buf()))?;

    // A single file is assessed in the context of its directory.
    let (root, single_file) = if resolved.is_file() {
        let parent = resolved
            .parent()
            .map(Path::to_path_buf)
            .ok_or_else(|| ArchcheckError::PathNotFound(path.to_path_buf()))?;
        (parent, Some(resolved))
    } else {
        (resolved, None)
    };

    let config = load_config(&root, options, fs)?;
    let parsers = ParserRegistry::new();
    let files = match single_file {
        Some(file) => vec![file],
        None => discover_files(&root, &config, &parsers),
    };

    tracing::debug!(root = %root.display(), files = files.len(), "starting assessment");
    Ok(assess_with(
        &root,
        &files,
        &config,
        fs,
        &parsers,
        &AnalyzerRegistry::builtin(),
    ))
}
