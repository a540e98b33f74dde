use anyhow::Result;
use clap::{Args, ValueEnum};
use pis_core::{Config, ControllerOptions, ExportFormat, RewardMode, SamplingMode};
use std::path::PathBuf;

use pis_verifier::scenarios::ScenarioBackend;
use pis_verifier::verifier::{ComprehensiveVerificationReport, Verifier};

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SuiteKind {
    Standard,
    Performance,
    EdgeCase,
    Comprehensive,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum OutputFormatArg {
    Text,
    Json,
    Csv,
}

impl From<OutputFormatArg> for ExportFormat {
    fn from(value: OutputFormatArg) -> Self {
        match value {
            OutputFormatArg::Text => ExportFormat::Text,
            OutputFormatArg::Json => ExportFormat::Json,
            OutputFormatArg::Csv => ExportFormat::Csv,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum RewardModeArg {
    Policy,
    CpScore,
    Hybrid,
}

impl From<RewardModeArg> for RewardMode {
    fn from(value: RewardModeArg) -> Self {
        match value {
            RewardModeArg::Policy => RewardMode::Policy,
            RewardModeArg::CpScore => RewardMode::CpScore,
            RewardModeArg::Hybrid => RewardMode::Hybrid,
        }
    }
}

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum SamplingModeArg {
    Competitive,
    QuantumLimit,
}

impl From<SamplingModeArg> for SamplingMode {
    fn from(value: SamplingModeArg) -> Self {
        match value {
            SamplingModeArg::Competitive => SamplingMode::Competitive,
            SamplingModeArg::QuantumLimit => SamplingMode::QuantumLimit,
        }
    }
}

#[derive(Args)]
pub struct TestSuiteArgs {
    /// Which scenario suite to run
    pub kind: SuiteKind,

    /// Comma-separated FENs, consulted only by the comprehensive suite
    #[arg(long)]
    pub positions: Option<String>,

    /// Report format
    #[arg(long = "output-format", default_value = "text")]
    pub output_format: OutputFormatArg,

    /// Report file stem (without extension); defaults to the suite kind
    #[arg(long = "output-file")]
    pub output_file: Option<String>,

    /// Directory the report is written into, created if absent
    #[arg(long = "output-dir", default_value = "./reports")]
    pub output_dir: PathBuf,

    #[arg(long = "lambda")]
    pub lambda: Option<f64>,
    #[arg(long = "samples")]
    pub samples: Option<u32>,
    #[arg(long = "reward-mode")]
    pub reward_mode: Option<RewardModeArg>,
    #[arg(long = "mode")]
    pub mode: Option<SamplingModeArg>,
    #[arg(long = "debug")]
    pub debug: bool,
    #[arg(long = "metrics-file")]
    pub metrics_file: Option<String>,

    /// Path to neural network weights; backend wiring is unimplemented
    /// upstream of this crate (§9 open question), so this is accepted but
    /// only toggles between `NullBackend` and `MockNeuralBackend` via
    /// `--backend`.
    #[arg(long = "weights")]
    pub weights: Option<PathBuf>,
    /// "none" (default) or "mock"
    #[arg(long = "backend", default_value = "none")]
    pub backend: String,

    #[arg(long, short)]
    pub verbose: bool,
}

fn build_config(args: &TestSuiteArgs) -> Config {
    let opts = ControllerOptions {
        path_integral_lambda: args.lambda,
        path_integral_samples: args.samples,
        path_integral_reward_mode: args.reward_mode.map(Into::into),
        path_integral_mode: args.mode.map(Into::into),
        path_integral_debug_mode: Some(args.debug),
        path_integral_metrics_file: args.metrics_file.clone(),
        export_format: Some(args.output_format.into()),
    };
    Config::from_options(&opts)
}

fn positions(args: &TestSuiteArgs) -> Option<Vec<String>> {
    args.positions
        .as_ref()
        .map(|raw| raw.split(',').map(|s| s.trim().to_string()).collect())
}

/// Resolves `--backend` to the scenario backend it selects. Real weight
/// loading is unimplemented upstream of this crate (§9 open question), so
/// `--weights` is accepted but only `--backend mock` has any effect; any
/// other value (including the default `"none"`) runs the custom-position
/// scenarios with no backend wired.
fn resolve_backend(args: &TestSuiteArgs) -> ScenarioBackend {
    match args.backend.as_str() {
        "mock" => ScenarioBackend::Mock,
        "none" => ScenarioBackend::None,
        other => {
            tracing::warn!("unrecognized --backend value {other:?}, falling back to no backend");
            ScenarioBackend::None
        }
    }
}

/// Runs the requested suite and returns the process exit code (§6: 0 on
/// overall success, non-zero otherwise). Propagates genuine setup failures
/// (runtime construction, report export) via `anyhow`, in the style of the
/// teacher's `sisctl::main`. Only the suite's own pass/fail state is
/// reported through the exit code, not through an `Err`.
pub fn cmd_test_suite(args: TestSuiteArgs) -> Result<i32> {
    // The base config from CLI options drives the comprehensive suite's
    // custom-position scenarios; standard/performance/edge-case scenarios
    // carry their own fixed configs (§8's literal scenario values), matching
    // the spec's concrete test definitions, and are unaffected by it.
    let base_config = build_config(&args);
    let backend = resolve_backend(&args);
    let _weights = &args.weights;
    if args.verbose {
        eprintln!("pis-verifier: running {:?} suite (backend={})", suite_label(args.kind), args.backend);
    }

    let verifier = Verifier::new();
    let report = match args.kind {
        SuiteKind::Standard => verifier.run_standard_test_suite(),
        SuiteKind::Performance => verifier.run_performance_test_suite(),
        SuiteKind::EdgeCase => verifier.run_edge_case_test_suite(),
        SuiteKind::Comprehensive => {
            let fens = positions(&args);
            verifier.run_comprehensive_test_with_config(fens.as_deref(), base_config, backend)
        }
    };

    let rt = tokio::runtime::Runtime::new()?;
    rt.block_on(async { write_and_summarize(&args, &report).await })
}

async fn write_and_summarize(args: &TestSuiteArgs, report: &ComprehensiveVerificationReport) -> Result<i32> {
    let stem = args
        .output_file
        .clone()
        .unwrap_or_else(|| suite_label(args.kind).to_string());
    let path =
        pis_verifier::report::export_report(report, &stem, args.output_format.into(), &args.output_dir)
            .await?;
    println!("{}", report.summary_text());
    println!("report written to {}", path.display());
    Ok(if report.overall_success { 0 } else { 1 })
}

fn suite_label(kind: SuiteKind) -> &'static str {
    match kind {
        SuiteKind::Standard => "standard",
        SuiteKind::Performance => "performance",
        SuiteKind::EdgeCase => "edge-case",
        SuiteKind::Comprehensive => "comprehensive",
    }
}
