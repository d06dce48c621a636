pub mod analysis;
pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod fs;
pub mod graph;
pub mod model;
pub mod output;
pub mod parser;
pub mod style;

pub use analysis::{AnalysisContext, Analyzer, AnalyzerError, AnalyzerRegistry, assess};
pub use api::{ArchcheckError, AssessOptions, assess_path};
pub use cli::Cli;
pub use commands::{cmd_analyze, cmd_list_analyzers};
pub use config::AssessmentConfig;
pub use graph::DependencyGraph;
pub use model::{Assessment, ParseResult, Severity, Violation};
