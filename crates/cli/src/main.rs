use anyhow::Result;
use clap::Parser;

use gomockgen::Cli;
use gomockgen::commands::generate_command;

fn main() -> Result<()> {
    // Initialize tracing based on RUST_LOG env var; stdout carries the mocks
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    generate_command(&cli)
}
