//! Path integral sampler: a probabilistic root-move selector that augments
//! a neural-network chess engine's tree search.
//!
//! Chess rules and the neural evaluation backend are external collaborators
//! (see [`chess`] and [`backend`]); everything else, including configuration,
//! softmax, performance monitoring, structured logging, and the controller
//! that ties them together, lives here.

pub mod adapter;
pub mod backend;
pub mod chess;
pub mod config;
pub mod controller;
pub mod error;
pub mod evaluation;
pub mod logger;
pub mod metrics;
pub mod softmax;

pub use adapter::{AdapterOutcome, BestMove, EngineAdapter, MoveRequest, ThinkingInfo};
pub use config::{Config, ControllerOptions, ExportFormat, RewardMode, SamplingMode};
pub use controller::{Controller, SampleResult, SearchLimits};
pub use error::{PisError, PisResult};
pub use logger::{DebugLogger, LoggerOptions};
pub use metrics::{PerformanceMonitor, SamplingMetrics};
