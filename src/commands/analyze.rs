use crate::analysis::AnalyzerRegistry;
use crate::api::{AssessOptions, assess_path};
use crate::cli::{Cli, OutputFormat};
use crate::model::Assessment;
use crate::output::{JsonOutput, OutputFormatter, TextOutput};
use crate::style;
use colored::Colorize;
use std::io::{self, Write};

use super::EXIT_SETUP_FAILURE;

pub fn cmd_analyze(cli: &Cli) -> i32 {
    let options = AssessOptions::from(cli);
    let assessment = match assess_path(&cli.path, &options) {
        Ok(assessment) => assessment,
        Err(e) => {
            style::error(&e.to_string());
            return EXIT_SETUP_FAILURE;
        }
    };

    for skipped in &assessment.skipped {
        style::warning(&format!(
            "skipped {}: {}",
            style::path(&skipped.path),
            skipped.reason
        ));
    }
    if assessment.parse_results.is_empty() {
        style::hint("no Python or JavaScript/TypeScript files were found");
    }

    let mut stdout = io::stdout().lock();
    if let Err(e) = write_report(&assessment, cli, &mut stdout) {
        style::error(&format!("Failed to write output: {}", e));
        return EXIT_SETUP_FAILURE;
    }

    // 0 = clean or only non-blocking findings, 1 = critical violations for CI to stop on
    if assessment.has_critical() { 1 } else { 0 }
}

fn write_report<W: Write>(assessment: &Assessment, cli: &Cli, writer: &mut W) -> io::Result<()> {
    match cli.format {
        OutputFormat::Text => TextOutput::new(cli.min_severity).format(assessment, writer),
        OutputFormat::Json => JsonOutput::new(cli.min_severity).format(assessment, writer),
    }
}

pub fn cmd_list_analyzers() -> i32 {
    let registry = AnalyzerRegistry::builtin();
    for analyzer in registry.analyzers() {
        println!(
            "{} {}",
            format!("{:<10}", analyzer.name()).bold(),
            analyzer.description()
        );
    }
    0
}
