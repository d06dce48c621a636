use archcheck::cli::Cli;
use archcheck::{cmd_analyze, cmd_list_analyzers, style};
use clap::Parser;
use tracing_subscriber::EnvFilter;

fn main() {
    let cli = Cli::parse();
    init_logging();

    if !style::is_terminal() {
        colored::control::set_override(false);
    }

    let exit_code = if cli.list_analyzers {
        cmd_list_analyzers()
    } else {
        cmd_analyze(&cli)
    };

    std::process::exit(exit_code);
}

/// Logs go to stderr so reports on stdout stay machine-readable.
fn init_logging() {
    let filter = EnvFilter::try_from_env("ARCHCHECK_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}
