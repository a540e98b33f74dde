//! Per-session sampling metrics and the monitor that owns them.
//!
//! Single mutex guards all mutable state; the active flag is a separate
//! atomic so `get_metrics` can return a live snapshot without blocking
//! behind a session that is still running. See §9: this is deliberately not
//! lock-free, since the monitor is single-producer, so a mutex is
//! uncontended on the hot path.

use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Instant;

/// Which bucket an evaluation's timing is recorded under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EvalMethod {
    NeuralNetwork,
    Cache,
    Heuristic,
}

impl EvalMethod {
    /// Parses a free-form method token. Unknown tokens bucket as
    /// `NeuralNetwork` per spec, with a warning left to the caller to log.
    pub fn from_token(token: &str) -> (Self, bool) {
        match token {
            "neural_network" => (EvalMethod::NeuralNetwork, false),
            "cache" => (EvalMethod::Cache, false),
            "heuristic" => (EvalMethod::Heuristic, false),
            _ => (EvalMethod::NeuralNetwork, true),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct SamplingMetrics {
    pub requested_samples: u64,
    pub actual_samples: u64,
    pub neural_net_evaluations: u64,
    pub cached_evaluations: u64,
    pub heuristic_evaluations: u64,
    pub total_time_ms: f64,
    pub avg_time_per_sample_ms: f64,
    pub neural_net_time_ms: f64,
    pub samples_per_second: f64,
}

impl SamplingMetrics {
    fn recompute_derived(&mut self) {
        let divisor = self.actual_samples.max(1) as f64;
        self.avg_time_per_sample_ms = self.total_time_ms / divisor;
        let time_divisor = self.total_time_ms.max(f64::EPSILON);
        self.samples_per_second = 1000.0 * self.actual_samples as f64 / time_divisor;
    }
}

struct Inner {
    metrics: SamplingMetrics,
    start: Option<Instant>,
}

/// Thread-safe counters/timers for a single sampling session.
/// State machine: idle -> active -> idle.
pub struct PerformanceMonitor {
    active: AtomicBool,
    inner: Mutex<Inner>,
}

impl Default for PerformanceMonitor {
    fn default() -> Self {
        Self::new()
    }
}

impl PerformanceMonitor {
    pub fn new() -> Self {
        Self {
            active: AtomicBool::new(false),
            inner: Mutex::new(Inner {
                metrics: SamplingMetrics::default(),
                start: None,
            }),
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.load(Ordering::Acquire)
    }

    /// Resets counters, records `requested_samples`, transitions to active.
    pub fn start_sampling(&self, requested_samples: u64) {
        let mut guard = self.inner.lock().expect("performance monitor mutex poisoned");
        guard.metrics = SamplingMetrics {
            requested_samples,
            ..SamplingMetrics::default()
        };
        guard.start = Some(Instant::now());
        self.active.store(true, Ordering::Release);
    }

    /// Records one evaluation's outcome. Ignored while not active.
    pub fn record_sample(&self, method: EvalMethod, elapsed_ms: f64) {
        if !self.is_active() {
            return;
        }
        let mut guard = self.inner.lock().expect("performance monitor mutex poisoned");
        match method {
            EvalMethod::NeuralNetwork => {
                guard.metrics.neural_net_evaluations += 1;
                guard.metrics.neural_net_time_ms += elapsed_ms;
            }
            EvalMethod::Cache => guard.metrics.cached_evaluations += 1,
            EvalMethod::Heuristic => guard.metrics.heuristic_evaluations += 1,
        }
        guard.metrics.actual_samples += 1;
    }

    pub fn record_neural_net_evaluation(&self, elapsed_ms: f64) {
        self.record_sample(EvalMethod::NeuralNetwork, elapsed_ms);
    }

    pub fn record_cached_evaluation(&self) {
        self.record_sample(EvalMethod::Cache, 0.0);
    }

    pub fn record_heuristic_evaluation(&self) {
        self.record_sample(EvalMethod::Heuristic, 0.0);
    }

    /// Finalizes `total_time_ms` and the derived rates, transitions to idle.
    pub fn end_sampling(&self) {
        if !self.is_active() {
            return;
        }
        let mut guard = self.inner.lock().expect("performance monitor mutex poisoned");
        if let Some(start) = guard.start.take() {
            guard.metrics.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
        }
        guard.metrics.recompute_derived();
        self.active.store(false, Ordering::Release);
    }

    /// Returns a snapshot. While active, the snapshot reflects elapsed time
    /// so far without mutating any stored state.
    pub fn get_metrics(&self) -> SamplingMetrics {
        let guard = self.inner.lock().expect("performance monitor mutex poisoned");
        let mut snapshot = guard.metrics;
        if self.is_active() {
            if let Some(start) = guard.start {
                snapshot.total_time_ms = start.elapsed().as_secs_f64() * 1000.0;
            }
            snapshot.recompute_derived();
        }
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn idle_to_active_to_idle() {
        let monitor = PerformanceMonitor::new();
        assert!(!monitor.is_active());
        monitor.start_sampling(10);
        assert!(monitor.is_active());
        monitor.end_sampling();
        assert!(!monitor.is_active());
    }

    #[test]
    fn actual_equals_sum_of_buckets() {
        let monitor = PerformanceMonitor::new();
        monitor.start_sampling(3);
        monitor.record_neural_net_evaluation(1.0);
        monitor.record_cached_evaluation();
        monitor.record_heuristic_evaluation();
        monitor.end_sampling();
        let m = monitor.get_metrics();
        assert_eq!(m.actual_samples, 3);
        assert_eq!(
            m.actual_samples,
            m.neural_net_evaluations + m.cached_evaluations + m.heuristic_evaluations
        );
    }

    #[test]
    fn unknown_token_buckets_as_neural_network() {
        let (method, warned) = EvalMethod::from_token("quantum_teleport");
        assert_eq!(method, EvalMethod::NeuralNetwork);
        assert!(warned);
    }

    #[test]
    fn recording_while_idle_is_ignored() {
        let monitor = PerformanceMonitor::new();
        monitor.record_neural_net_evaluation(5.0);
        let m = monitor.get_metrics();
        assert_eq!(m.actual_samples, 0);
    }

    #[test]
    fn derived_rates_use_max_one_and_epsilon_floors() {
        let monitor = PerformanceMonitor::new();
        monitor.start_sampling(0);
        monitor.end_sampling();
        let m = monitor.get_metrics();
        assert_eq!(m.avg_time_per_sample_ms, 0.0);
        assert!(m.samples_per_second.is_finite());
    }
}
