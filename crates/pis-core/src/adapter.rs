//! Glue between an engine shell's move-request path and the Controller
//! (§4.7). Owns a single `Controller`; publishes a thinking-info line and a
//! best-move line on success, or defers to the caller's default search on a
//! null result.

use crate::chess::{Chess, Color, Position};
use crate::controller::{Controller, SearchLimits};

/// A single move request arriving at the adapter.
#[derive(Debug, Clone)]
pub struct MoveRequest {
    pub position: Chess,
    pub limits: SearchLimits,
}

/// A `pv`/`nps`-style progress line, published before the best move.
#[derive(Debug, Clone, serde::Serialize)]
pub struct ThinkingInfo {
    pub depth: u32,
    pub seldepth: u32,
    pub time_ms: f64,
    pub nodes: u64,
    pub nps: f64,
    pub pv: Vec<String>,
    pub multipv: u32,
}

/// The adapter's best-move publication. `player` follows the side to move
/// in the request's position: `+1` for White, `-1` for Black.
#[derive(Debug, Clone, serde::Serialize)]
pub struct BestMove {
    pub mv: String,
    pub player: i8,
}

/// What the adapter did with a request: published a selection, or deferred
/// to the caller's own search because PIS was disabled or produced nothing.
#[derive(Debug, Clone)]
pub enum AdapterOutcome {
    Selected {
        thinking: ThinkingInfo,
        best_move: BestMove,
    },
    Defer,
}

/// Wires a `Controller` into an engine shell's move-request path.
pub struct EngineAdapter {
    controller: Controller,
}

impl EngineAdapter {
    pub fn new(controller: Controller) -> Self {
        Self { controller }
    }

    pub fn with_defaults() -> Self {
        Self::new(Controller::with_defaults())
    }

    pub fn controller(&self) -> &Controller {
        &self.controller
    }

    /// Handles one request, publishing in the documented two-message order
    /// on success (§4.7) or deferring when PIS is disabled or selects
    /// nothing.
    pub fn handle_request(&self, request: &MoveRequest) -> AdapterOutcome {
        let Some(selected) = self
            .controller
            .select_move(&request.position, request.limits)
        else {
            return AdapterOutcome::Defer;
        };

        let metrics = self.controller.get_last_sampling_metrics();
        let player: i8 = if request.position.turn() == Color::White {
            1
        } else {
            -1
        };
        let thinking = ThinkingInfo {
            depth: 1,
            seldepth: 1,
            time_ms: metrics.total_time_ms,
            nodes: metrics.actual_samples,
            nps: metrics.samples_per_second,
            pv: vec![crate::chess::to_long_algebraic(&selected)],
            multipv: 1,
        };
        let best_move = BestMove {
            mv: crate::chess::to_long_algebraic(&selected),
            player,
        };
        AdapterOutcome::Selected {
            thinking,
            best_move,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::NullBackend;
    use crate::chess::parse_fen;
    use crate::config::Config;
    use std::sync::Arc as StdArc;

    const START_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

    #[test]
    fn disabled_controller_defers() {
        let cfg = Config {
            samples: 0,
            ..Config::default()
        };
        let adapter = EngineAdapter::new(Controller::new(cfg, StdArc::new(NullBackend)));
        let request = MoveRequest {
            position: parse_fen(START_FEN).unwrap(),
            limits: SearchLimits::default(),
        };
        assert!(matches!(
            adapter.handle_request(&request),
            AdapterOutcome::Defer
        ));
    }

    #[test]
    fn enabled_controller_publishes_in_order() {
        let cfg = Config {
            samples: 3,
            lambda: 0.1,
            ..Config::default()
        };
        let adapter = EngineAdapter::new(Controller::new(cfg, StdArc::new(NullBackend)));
        let request = MoveRequest {
            position: parse_fen(START_FEN).unwrap(),
            limits: SearchLimits::default(),
        };
        match adapter.handle_request(&request) {
            AdapterOutcome::Selected {
                thinking,
                best_move,
            } => {
                assert_eq!(thinking.depth, 1);
                assert_eq!(thinking.pv, vec![best_move.mv.clone()]);
                assert_eq!(best_move.player, 1);
            }
            AdapterOutcome::Defer => panic!("expected a selection"),
        }
    }

    #[test]
    fn black_to_move_publishes_player_minus_one() {
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let cfg = Config {
            samples: 2,
            lambda: 0.1,
            ..Config::default()
        };
        let adapter = EngineAdapter::new(Controller::new(cfg, StdArc::new(NullBackend)));
        let request = MoveRequest {
            position: parse_fen(fen).unwrap(),
            limits: SearchLimits::default(),
        };
        match adapter.handle_request(&request) {
            AdapterOutcome::Selected { best_move, .. } => assert_eq!(best_move.player, -1),
            AdapterOutcome::Defer => panic!("expected a selection"),
        }
    }
}
