mod cli;

use anyhow::Result;
use clap::Parser;
use cli::test_suite::cmd_test_suite;
use cli::{Cli, Command};

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let exit_code = match cli.command {
        Command::TestSuite(args) => cmd_test_suite(args)?,
    };
    std::process::exit(exit_code);
}
