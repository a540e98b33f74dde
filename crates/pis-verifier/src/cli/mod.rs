pub mod test_suite;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "pis-verifier", version, about = "Path integral sampler verification harness")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Run a scenario suite against the Controller and report the outcome
    TestSuite(test_suite::TestSuiteArgs),
}
