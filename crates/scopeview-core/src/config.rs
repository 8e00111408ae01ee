//! Viewer configuration.
//!
//! Values come from built-in defaults, optionally a JSON document, then
//! `SCOPEVIEW_*` environment overrides.

use serde::{Deserialize, Serialize};

use crate::ramp::EyeColorRamp;

/// Default global trace alpha.
const DEFAULT_TRACE_ALPHA: f32 = 0.5;
/// Captures at least this long get their vertices mapped in parallel.
const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 14;
/// Default interval between render stats log lines.
const DEFAULT_STATS_INTERVAL_MS: u64 = 1000;
/// Default spectrum plot padding in pixels.
const DEFAULT_PADDING: f32 = 2.0;

pub const ENV_TRACE_ALPHA: &str = "SCOPEVIEW_TRACE_ALPHA";
pub const ENV_EYE_RAMP: &str = "SCOPEVIEW_EYE_RAMP";
pub const ENV_STATS_INTERVAL_MS: &str = "SCOPEVIEW_STATS_INTERVAL_MS";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("invalid viewer config: {0}")]
    Json(#[from] serde_json::Error),
}

/// Runtime configuration for waveform rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Global trace alpha, 0..=1.
    pub trace_alpha: f32,
    /// Ramp used for eye and waterfall plots.
    pub eye_color_ramp: EyeColorRamp,
    pub parallel_geometry_threshold: usize,
    /// Minimum interval between render stats log lines. `0` disables them.
    pub stats_log_interval_ms: u64,
    /// Top/bottom padding of spectrum plots, in pixels.
    pub padding: f32,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        Self {
            trace_alpha: DEFAULT_TRACE_ALPHA,
            eye_color_ramp: EyeColorRamp::default(),
            parallel_geometry_threshold: DEFAULT_PARALLEL_THRESHOLD,
            stats_log_interval_ms: DEFAULT_STATS_INTERVAL_MS,
            padding: DEFAULT_PADDING,
        }
    }
}

impl ViewerConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config.sanitized())
    }

    /// Apply `SCOPEVIEW_*` overrides read through `lookup`.
    ///
    /// Unparseable values are logged and skipped.
    pub fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup(ENV_TRACE_ALPHA) {
            match raw.trim().parse::<f32>() {
                Ok(alpha) => self.trace_alpha = alpha,
                Err(_) => tracing::debug!("ignoring {ENV_TRACE_ALPHA}={raw}"),
            }
        }
        if let Some(raw) = lookup(ENV_EYE_RAMP) {
            match EyeColorRamp::from_name(&raw) {
                Some(ramp) => self.eye_color_ramp = ramp,
                None => tracing::debug!("ignoring {ENV_EYE_RAMP}={raw}"),
            }
        }
        if let Some(raw) = lookup(ENV_STATS_INTERVAL_MS) {
            match raw.trim().parse::<u64>() {
                Ok(ms) => self.stats_log_interval_ms = ms,
                Err(_) => tracing::debug!("ignoring {ENV_STATS_INTERVAL_MS}={raw}"),
            }
        }
        self.sanitized()
    }

    fn sanitized(mut self) -> Self {
        if !self.trace_alpha.is_finite() {
            self.trace_alpha = DEFAULT_TRACE_ALPHA;
        }
        self.trace_alpha = self.trace_alpha.clamp(0.0, 1.0);
        if !(self.padding.is_finite() && self.padding >= 0.0) {
            self.padding = DEFAULT_PADDING;
        }
        self.parallel_geometry_threshold = self.parallel_geometry_threshold.max(1);
        self
    }

    /// Trace alpha on the 0..=256 scale the rasterizer multiplies by.
    pub fn alpha_scaled(&self) -> f32 {
        self.trace_alpha * 256.0
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_json_missing_fields_take_defaults() {
        let config = ViewerConfig::from_json(r#"{ "trace_alpha": 0.25 }"#).unwrap();
        assert_eq!(config.trace_alpha, 0.25);
        assert_eq!(config.eye_color_ramp, EyeColorRamp::Crt);
        assert_eq!(config.stats_log_interval_ms, 1000);
    }

    #[test]
    fn test_json_ramp_by_name() {
        let config = ViewerConfig::from_json(r#"{ "eye_color_ramp": "viridis" }"#).unwrap();
        assert_eq!(config.eye_color_ramp, EyeColorRamp::Viridis);
    }

    #[test]
    fn test_invalid_json_is_an_error() {
        assert!(ViewerConfig::from_json("{ trace_alpha").is_err());
        assert!(ViewerConfig::from_json(r#"{ "eye_color_ramp": "plasma" }"#).is_err());
    }

    #[test]
    fn test_alpha_is_clamped() {
        let config = ViewerConfig::from_json(r#"{ "trace_alpha": 4.0 }"#).unwrap();
        assert_eq!(config.trace_alpha, 1.0);
        assert_eq!(config.alpha_scaled(), 256.0);
    }

    #[test]
    fn test_env_overrides() {
        let config = ViewerConfig::default().with_overrides(lookup(&[
            (ENV_TRACE_ALPHA, "0.75"),
            (ENV_EYE_RAMP, "IRONBOW"),
            (ENV_STATS_INTERVAL_MS, "0"),
        ]));
        assert_eq!(config.trace_alpha, 0.75);
        assert_eq!(config.eye_color_ramp, EyeColorRamp::Ironbow);
        assert_eq!(config.stats_log_interval_ms, 0);
    }

    #[test]
    fn test_bad_env_values_keep_defaults() {
        let config = ViewerConfig::default().with_overrides(lookup(&[
            (ENV_TRACE_ALPHA, "bright"),
            (ENV_EYE_RAMP, "plasma"),
            (ENV_STATS_INTERVAL_MS, "-5"),
        ]));
        assert_eq!(config, ViewerConfig::default());
    }
}
