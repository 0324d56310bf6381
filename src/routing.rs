//! Local-versus-remote routing for the three heavy operations
//!
//! Routing runs in two layers. The first layer compares image metrics
//! against thresholds to decide whether remote processing would actually
//! help (`remote_desired`). The second layer applies operational gates:
//! global and per-operation remote toggles, provider availability, and
//! the daily budget. Both layers are recorded on the decision so an
//! audit trail can distinguish "remote was never worth it" from "remote
//! was wanted but gated off".

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::config::RoutingConfig;
use crate::metrics::QualityMetrics;

/// Operations that can be served by a remote provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    /// Background segmentation and removal
    BackgroundRemoval,
    /// Resolution increase
    Upscaling,
    /// Exposure and lighting correction
    Lighting,
}

impl Operation {
    /// Stable label used in step records and ledger entries
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::BackgroundRemoval => "background_removal",
            Self::Upscaling => "upscaling",
            Self::Lighting => "lighting",
        }
    }

    /// All routable operations in pipeline order
    #[must_use]
    pub fn all() -> [Self; 3] {
        [Self::BackgroundRemoval, Self::Upscaling, Self::Lighting]
    }
}

impl std::fmt::Display for Operation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Outcome of routing one operation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoutingDecision {
    /// The operation this decision covers
    pub operation: Operation,
    /// Whether the metrics alone favor remote processing
    pub remote_desired: bool,
    /// Whether remote will actually be used after all gates
    pub use_remote: bool,
    /// Human-readable explanation, including any gate that overrode
    /// the metric-level preference
    pub reason: String,
    /// Metric values the decision was based on
    pub metrics_used: HashMap<String, f64>,
}

/// Route a single operation.
///
/// `remote_available` reflects whether a provider is configured at all;
/// `budget_ok` is the cost guard's answer at decision time.
#[must_use]
pub fn route(
    operation: Operation,
    metrics: &QualityMetrics,
    config: &RoutingConfig,
    remote_available: bool,
    budget_ok: bool,
) -> RoutingDecision {
    let mut metrics_used = HashMap::new();

    let (remote_desired, mut reason) = match operation {
        Operation::BackgroundRemoval => {
            metrics_used.insert(
                "background_complexity".to_string(),
                metrics.background_complexity,
            );
            metrics_used.insert("edge_density".to_string(), metrics.edge_density);
            if metrics.background_complexity > config.bg_complexity_threshold {
                (
                    true,
                    format!(
                        "complex background ({:.2}) benefits from remote segmentation",
                        metrics.background_complexity
                    ),
                )
            } else {
                (
                    false,
                    "standard background complexity, local segmentation is sufficient".to_string(),
                )
            }
        },
        Operation::Upscaling => {
            let min_dim = metrics.min_dimension();
            metrics_used.insert("min_dimension".to_string(), f64::from(min_dim));
            metrics_used.insert("blur_score".to_string(), metrics.blur_score);
            if min_dim < config.low_res_threshold {
                (
                    true,
                    format!("low resolution ({min_dim}px) needs model-based upscaling"),
                )
            } else if metrics.blur_score < config.blur_threshold {
                (
                    true,
                    format!(
                        "blurry image (variance {:.0}) benefits from model-based upscaling",
                        metrics.blur_score
                    ),
                )
            } else {
                (
                    false,
                    "resolution and sharpness are adequate for local filters".to_string(),
                )
            }
        },
        Operation::Lighting => {
            metrics_used.insert("brightness".to_string(), metrics.brightness);
            metrics_used.insert(
                "lighting_deviation".to_string(),
                metrics.lighting_deviation,
            );
            if metrics.lighting_deviation > config.lighting_deviation_threshold {
                (
                    true,
                    format!(
                        "uneven lighting (deviation {:.1}) benefits from remote relighting",
                        metrics.lighting_deviation
                    ),
                )
            } else {
                (false, "lighting is within acceptable range".to_string())
            }
        },
    };

    let operation_enabled = match operation {
        Operation::BackgroundRemoval => config.use_remote_background_removal,
        Operation::Upscaling => config.use_remote_upscaling,
        Operation::Lighting => config.use_remote_lighting,
    };

    let use_remote = if !remote_desired {
        false
    } else if !config.remote_enabled {
        reason.push_str(" (remote disabled, using local)");
        false
    } else if !operation_enabled {
        reason.push_str(" (remote disabled for this operation, using local)");
        false
    } else if !remote_available {
        reason.push_str(" (no remote provider, using local)");
        false
    } else if !budget_ok {
        reason.push_str(" (daily budget exhausted, using local)");
        false
    } else {
        true
    };

    log::debug!(
        "Routing {}: remote_desired={}, use_remote={}, {}",
        operation,
        remote_desired,
        use_remote,
        reason
    );

    RoutingDecision {
        operation,
        remote_desired,
        use_remote,
        reason,
        metrics_used,
    }
}

/// Route all three operations against the same metrics snapshot
#[must_use]
pub fn route_all(
    metrics: &QualityMetrics,
    config: &RoutingConfig,
    remote_available: bool,
    budget_ok: bool,
) -> Vec<RoutingDecision> {
    Operation::all()
        .into_iter()
        .map(|op| route(op, metrics, config, remote_available, budget_ok))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics_with(complexity: f64, min_dim: u32, blur: f64, deviation: f64) -> QualityMetrics {
        QualityMetrics {
            width: min_dim,
            height: min_dim + 100,
            blur_score: blur,
            brightness: 128.0 + deviation,
            contrast: 50.0,
            noise: 5.0,
            background_complexity: complexity,
            edge_density: complexity / 2.0,
            lighting_deviation: deviation,
            perceptual: None,
        }
    }

    #[test]
    fn test_complex_background_routes_remote() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.62, 1200, 300.0, 10.0);
        let d = route(Operation::BackgroundRemoval, &m, &config, true, true);
        assert!(d.remote_desired);
        assert!(d.use_remote);
        assert!(d.reason.contains("complex background"));
        assert!(d.metrics_used.contains_key("background_complexity"));
    }

    #[test]
    fn test_simple_background_stays_local() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.15, 1200, 300.0, 10.0);
        let d = route(Operation::BackgroundRemoval, &m, &config, true, true);
        assert!(!d.remote_desired);
        assert!(!d.use_remote);
    }

    #[test]
    fn test_complexity_threshold_is_strict() {
        let config = RoutingConfig::default();
        // Exactly at the threshold keeps the work local
        let m = metrics_with(config.bg_complexity_threshold, 1200, 300.0, 10.0);
        let d = route(Operation::BackgroundRemoval, &m, &config, true, true);
        assert!(!d.remote_desired);
    }

    #[test]
    fn test_low_resolution_routes_upscaling_remote() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.1, 400, 300.0, 10.0);
        let d = route(Operation::Upscaling, &m, &config, true, true);
        assert!(d.use_remote);
        assert!(d.reason.contains("low resolution (400px)"));
    }

    #[test]
    fn test_blur_routes_upscaling_remote_at_high_resolution() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.1, 1600, 40.0, 10.0);
        let d = route(Operation::Upscaling, &m, &config, true, true);
        assert!(d.use_remote);
        assert!(d.reason.contains("blurry image"));
    }

    #[test]
    fn test_sharp_large_image_keeps_upscaling_local() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.1, 1600, 350.0, 10.0);
        let d = route(Operation::Upscaling, &m, &config, true, true);
        assert!(!d.remote_desired);
    }

    #[test]
    fn test_lighting_deviation_routes_remote() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.1, 1600, 350.0, 45.3);
        let d = route(Operation::Lighting, &m, &config, true, true);
        assert!(d.use_remote);
        assert!(d.reason.contains("deviation 45.3"));

        let m = metrics_with(0.1, 1600, 350.0, 40.0);
        let d = route(Operation::Lighting, &m, &config, true, true);
        assert!(!d.remote_desired);
    }

    #[test]
    fn test_global_toggle_gates_remote() {
        let config = RoutingConfig {
            remote_enabled: false,
            ..RoutingConfig::default()
        };
        let m = metrics_with(0.8, 400, 40.0, 60.0);
        for d in route_all(&m, &config, true, true) {
            assert!(d.remote_desired);
            assert!(!d.use_remote);
            assert!(d.reason.contains("remote disabled"));
        }
    }

    #[test]
    fn test_per_operation_toggle_gates_only_that_operation() {
        let config = RoutingConfig {
            use_remote_upscaling: false,
            ..RoutingConfig::default()
        };
        let m = metrics_with(0.8, 400, 40.0, 60.0);
        let decisions = route_all(&m, &config, true, true);
        let upscale = decisions
            .iter()
            .find(|d| d.operation == Operation::Upscaling)
            .expect("upscaling decision present");
        assert!(!upscale.use_remote);
        assert!(upscale.reason.contains("disabled for this operation"));
        let bg = decisions
            .iter()
            .find(|d| d.operation == Operation::BackgroundRemoval)
            .expect("background decision present");
        assert!(bg.use_remote);
    }

    #[test]
    fn test_missing_provider_gates_remote() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.8, 400, 40.0, 60.0);
        let d = route(Operation::BackgroundRemoval, &m, &config, false, true);
        assert!(d.remote_desired);
        assert!(!d.use_remote);
        assert!(d.reason.contains("no remote provider"));
    }

    #[test]
    fn test_exhausted_budget_gates_remote() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.8, 400, 40.0, 60.0);
        let d = route(Operation::Upscaling, &m, &config, true, false);
        assert!(d.remote_desired);
        assert!(!d.use_remote);
        assert!(d.reason.contains("budget exhausted"));
    }

    #[test]
    fn test_route_all_covers_every_operation_once() {
        let config = RoutingConfig::default();
        let m = metrics_with(0.1, 1600, 350.0, 10.0);
        let decisions = route_all(&m, &config, true, true);
        assert_eq!(decisions.len(), 3);
        assert_eq!(decisions[0].operation, Operation::BackgroundRemoval);
        assert_eq!(decisions[1].operation, Operation::Upscaling);
        assert_eq!(decisions[2].operation, Operation::Lighting);
    }
}
