use crate::model::{ProjectType, Severity};
use clap::{Parser, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "archcheck")]
#[command(about = "Assess the architecture quality of a Python or JavaScript/TypeScript codebase")]
#[command(version)]
pub struct Cli {
    /// Project to assess (defaults to current directory)
    #[arg(default_value = ".")]
    pub path: PathBuf,

    /// Config file (defaults to .archcheck.toml in the project root)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum, default_value = "text")]
    pub format: OutputFormat,

    /// Analyzers to run (comma-separated: coupling,layer,solid,pattern)
    #[arg(long, value_delimiter = ',')]
    pub analyzers: Option<Vec<String>>,

    /// Extra glob patterns to exclude (repeatable)
    #[arg(long)]
    pub exclude: Vec<String>,

    /// Framework hint for the built-in layer set
    #[arg(long)]
    pub project_type: Option<ProjectType>,

    /// Minimum severity to report
    #[arg(long, default_value = "low")]
    pub min_severity: Severity,

    /// List the available analyzers and exit
    #[arg(long)]
    pub list_analyzers: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}
