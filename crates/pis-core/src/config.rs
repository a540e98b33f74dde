//! Typed sampler configuration.
//!
//! Mirrors the options bag an engine shell would hand in (see the
//! `PathIntegral*` option names), but validated and typed. Invalid
//! combinations are not rejected at construction time; the Controller is
//! expected to survive them by disabling itself (`is_enabled() == false`)
//! rather than failing to build.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const LAMBDA_MIN: f64 = 0.001;
pub const LAMBDA_MAX: f64 = 10.0;
pub const SAMPLES_MIN: u32 = 1;
pub const SAMPLES_MAX: u32 = 100_000;

const DEFAULT_LAMBDA: f64 = 0.1;
const DEFAULT_SAMPLES: u32 = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RewardMode {
    Policy,
    CpScore,
    Hybrid,
}

impl Default for RewardMode {
    fn default() -> Self {
        RewardMode::Hybrid
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SamplingMode {
    Competitive,
    QuantumLimit,
}

impl Default for SamplingMode {
    fn default() -> Self {
        SamplingMode::Competitive
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExportFormat {
    None,
    Json,
    Csv,
    Text,
}

impl Default for ExportFormat {
    fn default() -> Self {
        ExportFormat::None
    }
}

/// Raw options bag as an engine shell would hand them in, using the option
/// names from the external interface table. Every field is optional; unset
/// fields fall back to `Config`'s defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerOptions {
    pub path_integral_lambda: Option<f64>,
    pub path_integral_samples: Option<u32>,
    pub path_integral_reward_mode: Option<RewardMode>,
    pub path_integral_mode: Option<SamplingMode>,
    pub path_integral_debug_mode: Option<bool>,
    pub path_integral_metrics_file: Option<String>,
    pub export_format: Option<ExportFormat>,
}

/// Validated sampler configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    pub lambda: f64,
    pub samples: u32,
    pub reward_mode: RewardMode,
    pub sampling_mode: SamplingMode,
    pub debug_logging: bool,
    pub metrics_file: Option<PathBuf>,
    pub export_format: ExportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            lambda: DEFAULT_LAMBDA,
            samples: DEFAULT_SAMPLES,
            reward_mode: RewardMode::default(),
            sampling_mode: SamplingMode::default(),
            debug_logging: false,
            metrics_file: None,
            export_format: ExportFormat::default(),
        }
    }
}

impl Config {
    /// Build a `Config` from an options bag, filling in defaults for any
    /// field the caller left unset.
    pub fn from_options(opts: &ControllerOptions) -> Self {
        let defaults = Config::default();
        Self {
            lambda: opts.path_integral_lambda.unwrap_or(defaults.lambda),
            samples: opts.path_integral_samples.unwrap_or(defaults.samples),
            reward_mode: opts.path_integral_reward_mode.unwrap_or(defaults.reward_mode),
            sampling_mode: opts.path_integral_mode.unwrap_or(defaults.sampling_mode),
            debug_logging: opts.path_integral_debug_mode.unwrap_or(defaults.debug_logging),
            metrics_file: opts
                .path_integral_metrics_file
                .as_ref()
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
            export_format: opts.export_format.unwrap_or(defaults.export_format),
        }
    }

    /// `IsValid()` per the data model invariant: lambda and samples within
    /// their documented ranges.
    pub fn is_valid(&self) -> bool {
        (LAMBDA_MIN..=LAMBDA_MAX).contains(&self.lambda)
            && (SAMPLES_MIN..=SAMPLES_MAX).contains(&self.samples)
    }

    /// `enabled` is derived: true iff lambda and samples are both positive.
    /// Note this is a weaker check than `is_valid`: an out-of-range but
    /// positive combination is still "enabled" by this predicate alone.
    /// `Controller::select_move` checks `is_valid()` separately and treats
    /// an enabled-but-invalid config the same as a disabled one: it logs an
    /// error and returns a null move, per the "configuration invalid"
    /// routing in the error handling design.
    pub fn is_enabled(&self) -> bool {
        self.lambda > 0.0 && self.samples > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid_and_enabled() {
        let cfg = Config::default();
        assert!(cfg.is_valid());
        assert!(cfg.is_enabled());
        assert_eq!(cfg.reward_mode, RewardMode::Hybrid);
        assert_eq!(cfg.sampling_mode, SamplingMode::Competitive);
    }

    #[test]
    fn boundary_lambda_and_samples_are_valid() {
        let mut cfg = Config::default();
        cfg.lambda = LAMBDA_MIN;
        cfg.samples = SAMPLES_MIN;
        assert!(cfg.is_valid());

        cfg.lambda = LAMBDA_MAX;
        cfg.samples = SAMPLES_MAX;
        assert!(cfg.is_valid());
    }

    #[test]
    fn out_of_range_lambda_is_invalid_but_may_still_be_enabled() {
        let mut cfg = Config::default();
        cfg.lambda = LAMBDA_MAX + 0.001;
        assert!(!cfg.is_valid());
        assert!(cfg.is_enabled());
    }

    #[test]
    fn zero_samples_disables() {
        let mut cfg = Config::default();
        cfg.samples = 0;
        assert!(!cfg.is_enabled());
    }

    #[test]
    fn from_options_fills_defaults_for_unset_fields() {
        let opts = ControllerOptions {
            path_integral_lambda: Some(0.5),
            ..Default::default()
        };
        let cfg = Config::from_options(&opts);
        assert_eq!(cfg.lambda, 0.5);
        assert_eq!(cfg.samples, DEFAULT_SAMPLES);
    }

    #[test]
    fn round_trip_set_config_get_config() {
        let cfg = Config {
            lambda: 2.5,
            samples: 123,
            reward_mode: RewardMode::Policy,
            sampling_mode: SamplingMode::QuantumLimit,
            debug_logging: true,
            metrics_file: Some(PathBuf::from("/tmp/pis.log")),
            export_format: ExportFormat::Json,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let round_tripped: Config = serde_json::from_str(&json).unwrap();
        assert_eq!(cfg, round_tripped);
    }
}
