//! The concrete end-to-end scenarios from §8, plus the edge-case and
//! performance scenario lists the test suites run.

use pis_core::{Config, ExportFormat, RewardMode, SamplingMode};

pub const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";
const ITALIAN_FEN: &str = "r1bqkb1r/pppp1ppp/2n2n2/4p3/2B1P3/3P1N2/PPP2PPP/RNBQK2R w KQkq - 0 1";
const STALEMATE_FEN: &str = "7k/5Q2/6K1/8/8/8/8/8 b - - 0 1";
// Black king cornered at a8 with exactly one legal move (Ka7): the white
// rook on b5 covers b7 and b8 along the b-file but not a7, and the king is
// not currently in check from either white piece.
const FORCED_SINGLE_MOVE_FEN: &str = "k7/8/8/1R2K3/8/8/8/8 b - - 0 1";

/// Whether a scenario should be run with no backend wired (the heuristic
/// path) or against the mock neural backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioBackend {
    None,
    Mock,
}

/// One Controller exercise: a position, a configuration, and the backend to
/// run it against.
#[derive(Debug, Clone)]
pub struct Scenario {
    pub name: String,
    pub fen: String,
    pub config: Config,
    pub backend: ScenarioBackend,
    /// Scenario 7 (§8): a hard integrity-gate failure is the *expected*
    /// outcome, not a bug in the scenario.
    pub expect_null: bool,
}

pub(crate) fn base_config() -> Config {
    Config {
        debug_logging: true,
        metrics_file: None,
        export_format: ExportFormat::None,
        ..Config::default()
    }
}

/// Scenario 1: standard opening, competitive.
pub fn standard_opening_competitive() -> Scenario {
    Scenario {
        name: "standard_opening_competitive".to_string(),
        fen: START_FEN.to_string(),
        config: Config {
            lambda: 0.1,
            samples: 5,
            sampling_mode: SamplingMode::Competitive,
            ..base_config()
        },
        backend: ScenarioBackend::None,
        expect_null: false,
    }
}

/// Scenario 2: quantum-limit hybrid on the Italian game.
pub fn quantum_limit_hybrid_italian() -> Scenario {
    Scenario {
        name: "quantum_limit_hybrid_italian".to_string(),
        fen: ITALIAN_FEN.to_string(),
        config: Config {
            lambda: 0.1,
            samples: 3,
            sampling_mode: SamplingMode::QuantumLimit,
            reward_mode: RewardMode::Hybrid,
            ..base_config()
        },
        backend: ScenarioBackend::None,
        expect_null: false,
    }
}

/// Scenario 3: extreme lambda sanity check.
pub fn extreme_lambda_sanity() -> Scenario {
    Scenario {
        name: "extreme_lambda_sanity".to_string(),
        fen: START_FEN.to_string(),
        config: Config {
            lambda: 10.0,
            samples: 1,
            sampling_mode: SamplingMode::Competitive,
            ..base_config()
        },
        backend: ScenarioBackend::None,
        expect_null: false,
    }
}

/// Scenario 7: integrity violation, samples = 0.
pub fn integrity_violation_zero_samples() -> Scenario {
    Scenario {
        name: "integrity_violation_zero_samples".to_string(),
        fen: START_FEN.to_string(),
        config: Config {
            samples: 0,
            ..base_config()
        },
        backend: ScenarioBackend::None,
        expect_null: true,
    }
}

/// Boundary behavior: a position with exactly one legal move still selects
/// it with certainty.
pub fn single_legal_move() -> Scenario {
    Scenario {
        name: "single_legal_move".to_string(),
        fen: FORCED_SINGLE_MOVE_FEN.to_string(),
        config: Config {
            samples: 3,
            ..base_config()
        },
        backend: ScenarioBackend::None,
        expect_null: false,
    }
}

/// Boundary behavior: an empty legal-move list (stalemate) returns null
/// without crashing.
pub fn no_legal_moves_stalemate() -> Scenario {
    Scenario {
        name: "no_legal_moves_stalemate".to_string(),
        fen: STALEMATE_FEN.to_string(),
        config: base_config(),
        backend: ScenarioBackend::None,
        expect_null: true,
    }
}

/// Boundary behavior: samples = 1 is accepted.
pub fn minimal_samples() -> Scenario {
    Scenario {
        name: "minimal_samples".to_string(),
        fen: START_FEN.to_string(),
        config: Config {
            samples: 1,
            lambda: 0.001,
            ..base_config()
        },
        backend: ScenarioBackend::None,
        expect_null: false,
    }
}

/// Quantum-limit policy reward mode against the mock backend, so
/// `neural_net_used` has something real to observe.
pub fn quantum_limit_policy_with_backend() -> Scenario {
    Scenario {
        name: "quantum_limit_policy_with_backend".to_string(),
        fen: ITALIAN_FEN.to_string(),
        config: Config {
            lambda: 0.3,
            samples: 4,
            sampling_mode: SamplingMode::QuantumLimit,
            reward_mode: RewardMode::Policy,
            ..base_config()
        },
        backend: ScenarioBackend::Mock,
        expect_null: false,
    }
}

pub fn standard_scenarios() -> Vec<Scenario> {
    vec![
        standard_opening_competitive(),
        quantum_limit_hybrid_italian(),
        extreme_lambda_sanity(),
    ]
}

pub fn edge_case_scenarios() -> Vec<Scenario> {
    vec![
        integrity_violation_zero_samples(),
        single_legal_move(),
        no_legal_moves_stalemate(),
        minimal_samples(),
    ]
}

/// Larger per-move sample counts, to exercise `timing_reasonable` and
/// throughput aggregation under more realistic load than the standard
/// suite's small counts.
pub fn performance_scenarios() -> Vec<Scenario> {
    vec![
        Scenario {
            name: "performance_competitive_heavy".to_string(),
            fen: START_FEN.to_string(),
            config: Config {
                lambda: 0.2,
                samples: 200,
                sampling_mode: SamplingMode::Competitive,
                ..base_config()
            },
            backend: ScenarioBackend::None,
            expect_null: false,
        },
        Scenario {
            name: "performance_quantum_limit_with_backend".to_string(),
            fen: ITALIAN_FEN.to_string(),
            config: Config {
                lambda: 0.2,
                samples: 150,
                sampling_mode: SamplingMode::QuantumLimit,
                reward_mode: RewardMode::CpScore,
                ..base_config()
            },
            backend: ScenarioBackend::Mock,
            expect_null: false,
        },
        quantum_limit_policy_with_backend(),
    ]
}

/// `RunComprehensiveTest(fens?)`: the standard and edge-case lists, plus one
/// scenario per caller-supplied FEN (competitive mode, default config).
/// Standard/edge-case/performance scenarios carry their own fixed configs
/// per §8's literal scenario definitions; `custom_config` and `custom_backend`
/// are applied only to the custom-position scenarios built from `fens`, so a
/// caller's CLI flags reach the one suite where there's no scenario-specific
/// config to override.
pub fn comprehensive_scenarios(
    fens: Option<&[String]>,
    custom_config: Config,
    custom_backend: ScenarioBackend,
) -> Vec<Scenario> {
    let mut all = standard_scenarios();
    all.extend(edge_case_scenarios());
    all.extend(performance_scenarios());
    if let Some(fens) = fens {
        for (i, fen) in fens.iter().enumerate() {
            all.push(Scenario {
                name: format!("custom_position_{i}"),
                fen: fen.clone(),
                config: custom_config.clone(),
                backend: custom_backend,
                expect_null: false,
            });
        }
    }
    all
}
