mod analyze;

pub use analyze::{cmd_analyze, cmd_list_analyzers};

use crate::api::AssessOptions;
use crate::cli::Cli;

/// Exit code for a run that could not start (bad path, bad config, I/O).
pub const EXIT_SETUP_FAILURE: i32 = 2;

impl From<&Cli> for AssessOptions {
    fn from(cli: &Cli) -> Self {
        Self {
            config_file: cli.config.clone(),
            analyzers: cli.analyzers.clone(),
            exclude: cli.exclude.clone(),
            project_type: cli.project_type,
        }
    }
}
