//! Orchestrates config, evaluation, softmax and selection (§4.4).
//!
//! The Controller is the only thing downstream code talks to. Every public
//! entry point is infallible from the caller's perspective. Invalid config
//! disables selection, integrity failures return a null move, and per-draw
//! exceptions are dropped; each path logs a warning or error and leaves the
//! metrics snapshot empty but valid. `PisError` is used internally for
//! `?`-propagation up to that boundary.

use crate::backend::{EvalBackend, NullBackend};
use crate::chess::{self, Chess, Move};
use crate::config::{Config, ControllerOptions, RewardMode, SamplingMode, LAMBDA_MAX, LAMBDA_MIN, SAMPLES_MAX, SAMPLES_MIN};
use crate::error::{PisError, PisResult};
use crate::evaluation::{self, raw_policy_draw, raw_value_draw};
use crate::logger::DebugLogger;
use crate::metrics::{EvalMethod, PerformanceMonitor, SamplingMetrics};
use serde_json::json;
use std::sync::{Arc, RwLock};
use std::time::Instant;

const PER_MOVE_SAMPLE_WARN: u64 = 10_000;
const TOTAL_SAMPLE_WARN: u64 = 100_000;

/// Forward-compatible search bounds. Per the design notes, `SearchLimits` is
/// plumbed through every entry point but never consulted here; the
/// tree-search algorithm that would enforce it is out of scope for this
/// crate.
#[derive(Debug, Clone, Copy, Default)]
pub struct SearchLimits {
    pub max_depth: Option<u32>,
    pub max_time_ms: Option<u64>,
    pub max_nodes: Option<u64>,
}

/// One selected move's averaged score and final probability.
#[derive(Debug, Clone)]
pub struct SampleResult {
    pub mv: Move,
    pub score: f64,
    pub probability: f64,
}

/// Orchestrates Config, Softmax, PerformanceMonitor, DebugLogger and a
/// backend collaborator into the two `SelectMove` entry points.
pub struct Controller {
    config: RwLock<Config>,
    monitor: PerformanceMonitor,
    backend: Arc<dyn EvalBackend>,
    last_results: RwLock<Vec<SampleResult>>,
}

impl Controller {
    pub fn new(config: Config, backend: Arc<dyn EvalBackend>) -> Self {
        let controller = Self {
            config: RwLock::new(config),
            monitor: PerformanceMonitor::new(),
            backend,
            last_results: RwLock::new(Vec::new()),
        };
        controller.rewire_logger(&controller.get_config());
        controller
    }

    /// A Controller with no backend wired, using the default configuration.
    pub fn with_defaults() -> Self {
        Self::new(Config::default(), Arc::new(NullBackend))
    }

    fn logger(&self) -> &'static DebugLogger {
        DebugLogger::global()
    }

    /// `GetConfig()`.
    pub fn get_config(&self) -> Config {
        self.config.read().expect("config lock poisoned").clone()
    }

    /// `SetConfig(cfg)`: replaces configuration wholesale and rewires the
    /// logger's enable/output state to match.
    pub fn set_config(&self, cfg: Config) {
        self.rewire_logger(&cfg);
        *self.config.write().expect("config lock poisoned") = cfg;
    }

    /// `UpdateOptions(opts)`: builds a `Config` from an options bag and
    /// applies it the same way `SetConfig` does.
    pub fn update_options(&self, opts: &ControllerOptions) {
        self.set_config(Config::from_options(opts));
    }

    fn rewire_logger(&self, cfg: &Config) {
        DebugLogger::init(crate::logger::LoggerOptions {
            enabled: cfg.debug_logging,
            file_path: cfg.metrics_file.clone(),
            diagnostic_channel: true,
        });
    }

    /// `GetLastSamplingMetrics()`.
    pub fn get_last_sampling_metrics(&self) -> SamplingMetrics {
        self.monitor.get_metrics()
    }

    /// The per-move `(move, averaged score, probability)` triples assembled
    /// by the most recent `select_move` call, in legal-move order.
    pub fn last_sample_results(&self) -> Vec<SampleResult> {
        self.last_results
            .read()
            .expect("last_results lock poisoned")
            .clone()
    }

    /// `ExportPerformanceMetrics(path)`: writes the last snapshot as JSON.
    pub fn export_performance_metrics(&self, path: &std::path::Path) -> PisResult<()> {
        let metrics = self.get_last_sampling_metrics();
        let rendered = serde_json::to_vec_pretty(&metrics)?;
        std::fs::write(path, rendered)?;
        Ok(())
    }

    /// `SelectMove(position, limits) -> move_or_null`. `limits` is accepted
    /// and ignored (§9 open question: not consulted by this Controller).
    pub fn select_move(&self, position: &Chess, _limits: SearchLimits) -> Option<Move> {
        let cfg = self.get_config();
        if !cfg.is_enabled() {
            self.logger()
                .error("configuration disabled: lambda and samples must both be positive");
            return None;
        }
        if !cfg.is_valid() {
            self.logger().error(&format!(
                "configuration invalid: lambda={} samples={} outside valid ranges [{LAMBDA_MIN}, {LAMBDA_MAX}] / [{SAMPLES_MIN}, {SAMPLES_MAX}]",
                cfg.lambda, cfg.samples
            ));
            return None;
        }
        match self.select_move_inner(position, &cfg) {
            Ok(mv) => Some(mv),
            Err(e) => {
                self.logger().error(&e.to_string());
                None
            }
        }
    }

    /// `SelectMove(legal_moves, scores, position) -> move_or_null`. The
    /// score-in overload: softmax is applied to the caller-supplied scores
    /// and the mode's selection rule runs, but always as a weighted-random
    /// draw (§4.4) since this is the hook a search tree uses to delegate
    /// exploration to PIS.
    pub fn select_move_with_scores(
        &self,
        legal_moves: &[Move],
        scores: &[f64],
        position: &Chess,
    ) -> Option<Move> {
        let cfg = self.get_config();
        if !cfg.is_enabled() {
            self.logger()
                .error("configuration disabled: lambda and samples must both be positive");
            return None;
        }
        if !cfg.is_valid() {
            self.logger().error(&format!(
                "configuration invalid: lambda={} samples={} outside valid ranges [{LAMBDA_MIN}, {LAMBDA_MAX}] / [{SAMPLES_MIN}, {SAMPLES_MAX}]",
                cfg.lambda, cfg.samples
            ));
            return None;
        }
        if legal_moves.is_empty() || legal_moves.len() != scores.len() {
            return None;
        }
        let probabilities = crate::softmax::softmax(scores, cfg.lambda);
        self.logger().emit(
            "softmax_calculation",
            json!({"lambda": cfg.lambda, "input_scores": scores, "output_probabilities": probabilities}),
        );
        let idx = evaluation::weighted_choice(&probabilities)?;
        let mv = legal_moves[idx].clone();
        self.emit_move_selection(&mv, probabilities[idx], scores[idx], legal_moves, &probabilities);
        let _ = position;
        Some(mv)
    }

    fn select_move_inner(&self, position: &Chess, cfg: &Config) -> PisResult<Move> {
        let legal = chess::legal_moves(position);
        self.integrity_gate(cfg, legal.len())?;

        let total_requested = cfg.samples as u64 * legal.len() as u64;
        self.monitor.start_sampling(total_requested);
        let session_fen = chess::to_fen(position);
        let logger = self.logger();
        logger.start_session(&session_fen);
        logger.emit(
            "sampling_start",
            json!({
                "requested_samples": cfg.samples,
                "legal_moves": legal.len(),
                "lambda": cfg.lambda,
                "sampling_mode": sampling_mode_label(cfg.sampling_mode),
                "reward_mode": reward_mode_label(cfg.reward_mode),
                "position_fen": session_fen,
            }),
        );

        let mut results = Vec::with_capacity(legal.len());
        let mut total_valid: u64 = 0;

        for mv in &legal {
            let (score, valid, _attempted) = self.average_move_score(position, mv, cfg);
            total_valid += valid;
            if valid < cfg.samples as u64 {
                logger.emit(
                    "warning",
                    json!({
                        "message": "per-move sample count below requested",
                        "move": chess::to_long_algebraic(mv),
                        "requested": cfg.samples,
                        "valid": valid,
                    }),
                );
            }
            if valid > 0 {
                results.push((mv.clone(), score));
            }
        }

        if results.is_empty() {
            logger.error("no move produced a valid evaluation");
            logger.end_session();
            return Err(PisError::EmptyResultSet);
        }

        let expected_total = cfg.samples as u64 * legal.len() as u64;
        if total_valid != expected_total {
            logger.emit(
                "warning",
                json!({
                    "message": "total sample count mismatch",
                    "requested": expected_total,
                    "actual": total_valid,
                }),
            );
        }

        let scores: Vec<f64> = results.iter().map(|(_, s)| *s).collect();
        let probabilities = crate::softmax::softmax(&scores, cfg.lambda);
        logger.emit(
            "softmax_calculation",
            json!({"lambda": cfg.lambda, "input_scores": scores, "output_probabilities": probabilities}),
        );

        let best = probabilities
            .iter()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal))
            .map(|(i, _)| i)
            .expect("results is non-empty");

        let selected = results[best].0.clone();
        let all_results: Vec<Move> = results.iter().map(|(m, _)| m.clone()).collect();
        self.emit_move_selection(&selected, probabilities[best], scores[best], &all_results, &probabilities);

        let sample_results: Vec<SampleResult> = results
            .iter()
            .zip(probabilities.iter())
            .map(|((mv, score), probability)| SampleResult {
                mv: mv.clone(),
                score: *score,
                probability: *probability,
            })
            .collect();
        *self.last_results.write().expect("last_results lock poisoned") = sample_results;

        self.monitor.end_sampling();
        let metrics = self.monitor.get_metrics();
        logger.emit(
            "sampling_complete",
            json!({
                "total_samples": metrics.actual_samples,
                "total_time_ms": metrics.total_time_ms,
                "neural_net_evaluations": metrics.neural_net_evaluations,
                "cached_evaluations": metrics.cached_evaluations,
                "heuristic_evaluations": metrics.heuristic_evaluations,
                "avg_time_per_sample_ms": metrics.avg_time_per_sample_ms,
            }),
        );
        logger.end_session();
        Ok(selected)
    }

    fn integrity_gate(&self, cfg: &Config, legal_move_count: usize) -> PisResult<()> {
        if cfg.samples == 0 {
            return Err(PisError::IntegrityGate {
                reason: "samples must be greater than zero".to_string(),
            });
        }
        if legal_move_count == 0 {
            return Err(PisError::NoLegalMoves);
        }
        let logger = self.logger();
        if u64::from(cfg.samples) > PER_MOVE_SAMPLE_WARN {
            logger.warn_once(&format!(
                "per-move sample count {} exceeds the recommended ceiling of {PER_MOVE_SAMPLE_WARN}",
                cfg.samples
            ));
        }
        let total = cfg.samples as u64 * legal_move_count as u64;
        if total > TOTAL_SAMPLE_WARN {
            logger.warn_once(&format!(
                "total sample count {total} exceeds the recommended ceiling of {TOTAL_SAMPLE_WARN}"
            ));
        }
        Ok(())
    }

    /// Draws `cfg.samples` scores for `mv` per the active reward mode,
    /// discarding non-finite draws, and returns `(averaged_score, valid,
    /// attempted)`.
    fn average_move_score(&self, position: &Chess, mv: &Move, cfg: &Config) -> (f64, u64, u64) {
        let mut valid = 0u64;
        let mut attempted = 0u64;
        let mut total = 0.0;
        for sample_number in 0..cfg.samples {
            attempted += 1;
            let draw = self.draw_one(position, mv, cfg);
            let logger = self.logger();
            self.monitor.record_sample(draw.method, draw.elapsed_ms);
            logger.emit(
                "sample_evaluation",
                json!({
                    "move": chess::to_long_algebraic(mv),
                    "sample_number": sample_number,
                    "score": draw.score,
                    "evaluation_method": method_label(draw.method),
                    "evaluation_time_ms": draw.elapsed_ms,
                }),
            );
            if matches!(draw.method, EvalMethod::NeuralNetwork | EvalMethod::Cache) {
                logger.emit(
                    "neural_network_call",
                    json!({
                        "cache_hit": matches!(draw.method, EvalMethod::Cache),
                        "evaluation_time_ms": draw.elapsed_ms,
                    }),
                );
            }
            if draw.score.is_finite() {
                valid += 1;
                total += draw.score;
            }
        }
        let averaged = if valid > 0 { total / valid as f64 } else { 0.0 };
        (averaged, valid, attempted)
    }

    /// One draw's raw score and bucket, per the active sampling/reward mode
    /// (§4.4). Timed as a single unit so one draw always costs exactly one
    /// `PerformanceMonitor` sample, regardless of how many backend calls the
    /// reward mode needs internally.
    fn draw_one(&self, position: &Chess, mv: &Move, cfg: &Config) -> evaluation::EvalOutcome {
        let started = Instant::now();
        let (score, method) = match cfg.sampling_mode {
            SamplingMode::Competitive => raw_value_draw(position, mv, self.backend.as_ref()),
            SamplingMode::QuantumLimit => match cfg.reward_mode {
                RewardMode::Policy => raw_policy_draw(position, mv, self.backend.as_ref()),
                RewardMode::CpScore => raw_value_draw(position, mv, self.backend.as_ref()),
                RewardMode::Hybrid => {
                    let (p, p_method) = raw_policy_draw(position, mv, self.backend.as_ref());
                    let (v, v_method) = raw_value_draw(position, mv, self.backend.as_ref());
                    let method = if v_method != EvalMethod::Heuristic {
                        v_method
                    } else {
                        p_method
                    };
                    (p * v, method)
                }
            },
        };
        evaluation::EvalOutcome {
            score,
            method,
            elapsed_ms: started.elapsed().as_secs_f64() * 1000.0,
        }
    }

    fn emit_move_selection(
        &self,
        selected: &Move,
        probability: f64,
        score: f64,
        all_moves: &[Move],
        all_probabilities: &[f64],
    ) {
        let all: Vec<_> = all_moves
            .iter()
            .zip(all_probabilities.iter())
            .map(|(m, p)| json!({"move": chess::to_long_algebraic(m), "probability": p}))
            .collect();
        self.logger().emit(
            "move_selection",
            json!({
                "selected_move": chess::to_long_algebraic(selected),
                "probability": probability,
                "score": score,
                "all_probabilities": all,
            }),
        );
    }
}

fn sampling_mode_label(mode: SamplingMode) -> &'static str {
    match mode {
        SamplingMode::Competitive => "competitive",
        SamplingMode::QuantumLimit => "quantum_limit",
    }
}

fn reward_mode_label(mode: RewardMode) -> &'static str {
    match mode {
        RewardMode::Policy => "policy",
        RewardMode::CpScore => "cp_score",
        RewardMode::Hybrid => "hybrid",
    }
}

fn method_label(method: EvalMethod) -> &'static str {
    match method {
        EvalMethod::NeuralNetwork => "neural_network",
        EvalMethod::Cache => "cached",
        EvalMethod::Heuristic => "heuristic",
    }
}
