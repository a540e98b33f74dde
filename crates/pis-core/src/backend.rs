//! The neural evaluation backend collaborator.
//!
//! Out of scope for this crate (§1): batched inference and evaluation
//! caching belong to the backend implementation. PIS only ever talks to it
//! through this trait, and treats the handle as read-only (§5).

use crate::chess::{Chess, Move};
use std::time::{Duration, Instant};

/// Everything PIS needs from the neural evaluator.
///
/// `cached_eval` and `evaluate` both return Q from `pos`'s side-to-move
/// perspective, approximately in `[-1, 1]`; callers convert to the
/// white-to-move perspective themselves (§4.5).
pub trait EvalBackend: Send + Sync {
    /// Availability check run before every evaluation path (§4.5): a
    /// `false` here routes the caller straight to the heuristic.
    fn is_available(&self) -> bool;

    /// A cache lookup for `pos`'s value. `None` is a cache miss, not a
    /// failure.
    fn cached_eval(&self, pos: &Chess) -> Option<f64>;

    /// A fresh, single-position batched evaluation. `None` signals failure
    /// or an empty result, which the caller falls through to the heuristic
    /// for.
    fn evaluate(&self, pos: &Chess) -> Option<f64>;

    /// The policy head's distribution over `pos`'s legal moves, as
    /// `(move, probability)` pairs. `None` on cache miss or backend
    /// failure.
    fn policy(&self, pos: &Chess) -> Option<Vec<(Move, f64)>>;
}

/// Always-unavailable backend: every evaluation falls through to the
/// heuristic. This is the "no backend wired" configuration the spec's
/// concrete scenarios assume by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullBackend;

impl EvalBackend for NullBackend {
    fn is_available(&self) -> bool {
        false
    }
    fn cached_eval(&self, _pos: &Chess) -> Option<f64> {
        None
    }
    fn evaluate(&self, _pos: &Chess) -> Option<f64> {
        None
    }
    fn policy(&self, _pos: &Chess) -> Option<Vec<(Move, f64)>> {
        None
    }
}

/// Deterministic fake neural backend for tests and for the verifier's
/// backend-present scenarios. Grounded on the teacher's `MockNpuBackend`:
/// a simulated device with a configurable failure mode and a small, cheap
/// model of "realistic enough" outputs rather than a real network.
pub struct MockNeuralBackend {
    available: bool,
    simulate_miss: bool,
    started_at: Instant,
}

impl MockNeuralBackend {
    pub fn new() -> Self {
        Self {
            available: true,
            simulate_miss: false,
            started_at: Instant::now(),
        }
    }

    /// When enabled, `cached_eval` always misses (forcing the fresh-eval
    /// path) while `evaluate` still succeeds.
    pub fn set_simulate_cache_miss(&mut self, enabled: bool) {
        self.simulate_miss = enabled;
    }

    pub fn set_available(&mut self, available: bool) {
        self.available = available;
    }

    /// A deterministic, bounded pseudo-score derived from material balance,
    /// standing in for a real value head's Q.
    fn mock_value(&self, pos: &Chess) -> f64 {
        use crate::chess::{Color, Role};
        let board = pos.board();
        let value_of = |role: Role| -> i32 {
            match role {
                Role::Pawn => 1,
                Role::Knight | Role::Bishop => 3,
                Role::Rook => 5,
                Role::Queen => 9,
                Role::King => 0,
            }
        };
        let mut material = 0i32;
        for role in [
            Role::Pawn,
            Role::Knight,
            Role::Bishop,
            Role::Rook,
            Role::Queen,
        ] {
            let white = (board.by_color(Color::White) & board.by_role(role)).count() as i32;
            let black = (board.by_color(Color::Black) & board.by_role(role)).count() as i32;
            material += (white - black) * value_of(role);
        }
        let perspective = if pos.turn() == Color::White {
            material
        } else {
            -material
        };
        (perspective as f64 / 20.0).clamp(-1.0, 1.0)
    }

    fn elapsed_jitter_ms(&self) -> f64 {
        // Deterministic, tiny "processing time" so timing metrics are
        // never exactly zero without sleeping the test thread.
        let micros = self.started_at.elapsed().subsec_micros() % 500;
        Duration::from_micros(micros as u64 + 50).as_secs_f64() * 1000.0
    }
}

impl Default for MockNeuralBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl EvalBackend for MockNeuralBackend {
    fn is_available(&self) -> bool {
        self.available
    }

    fn cached_eval(&self, pos: &Chess) -> Option<f64> {
        if !self.available || self.simulate_miss {
            return None;
        }
        Some(self.mock_value(pos))
    }

    fn evaluate(&self, pos: &Chess) -> Option<f64> {
        if !self.available {
            return None;
        }
        let _ = self.elapsed_jitter_ms();
        Some(self.mock_value(pos))
    }

    fn policy(&self, pos: &Chess) -> Option<Vec<(Move, f64)>> {
        if !self.available {
            return None;
        }
        let moves = crate::chess::legal_moves(pos);
        if moves.is_empty() {
            return Some(Vec::new());
        }
        // Favor captures and central moves, same signal the heuristic uses,
        // then normalize into a distribution.
        let weights: Vec<f64> = moves
            .iter()
            .map(|m| {
                let mut w = 1.0;
                if crate::chess::is_capture(m) {
                    w += 2.0;
                }
                if crate::chess::is_central_destination(m) {
                    w += 1.0;
                }
                w
            })
            .collect();
        let total: f64 = weights.iter().sum();
        Some(
            moves
                .into_iter()
                .zip(weights.into_iter())
                .map(|(m, w)| (m, w / total))
                .collect(),
        )
    }
}
