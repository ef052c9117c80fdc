//! @ai:module:intent Normalization of verification-service responses
//! @ai:module:layer domain
//! @ai:module:public_api VerificationOutcome, VerificationStatus, RemoteMetrics, MetricKey, ExtractedMetrics, MetricComparison
//! @ai:module:stateless true

use crate::model::Solution;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Local and remote values closer than this are considered equal.
pub const COMPARISON_TOLERANCE: f64 = 0.01;

const DISTANCE_KEYS: &[&str] = &["total_distance", "distance", "totalDistance"];
const TRANSITION_COST_KEYS: &[&str] = &[
    "total_changeover_cost",
    "total_transition_cost",
    "changeover_cost",
    "transition_cost",
    "totalChangeoverCost",
];
const VEHICLES_USED_KEYS: &[&str] = &["nb_vehicles_used", "vehicles_used", "nbVehiclesUsed"];
const PRODUCT_CHANGES_KEYS: &[&str] = &[
    "nb_product_changes",
    "product_changes",
    "nbProductChanges",
    "transitions",
];

/// @ai:intent Semantic metric reported by the verification service
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKey {
    Distance,
    TransitionCost,
    VehiclesUsed,
    ProductChanges,
}

impl MetricKey {
    pub const ALL: [MetricKey; 4] = [
        MetricKey::Distance,
        MetricKey::TransitionCost,
        MetricKey::VehiclesUsed,
        MetricKey::ProductChanges,
    ];

    /// @ai:intent Accepted payload keys, in priority order
    /// @ai:effects pure
    pub fn aliases(&self) -> &'static [&'static str] {
        match self {
            MetricKey::Distance => DISTANCE_KEYS,
            MetricKey::TransitionCost => TRANSITION_COST_KEYS,
            MetricKey::VehiclesUsed => VEHICLES_USED_KEYS,
            MetricKey::ProductChanges => PRODUCT_CHANGES_KEYS,
        }
    }

    /// @ai:intent Human-readable label
    /// @ai:effects pure
    pub fn label(&self) -> &'static str {
        match self {
            MetricKey::Distance => "Total distance",
            MetricKey::TransitionCost => "Changeover cost",
            MetricKey::VehiclesUsed => "Vehicles used",
            MetricKey::ProductChanges => "Product changes",
        }
    }
}

/// @ai:intent Metrics object as returned by the service, keyed by payload name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RemoteMetrics {
    values: BTreeMap<String, Value>,
}

impl RemoteMetrics {
    /// @ai:intent Keep every entry of a JSON metrics object
    /// @ai:effects pure
    pub fn from_json(object: &Map<String, Value>) -> Self {
        Self {
            values: object.iter().map(|(k, v)| (k.clone(), v.clone())).collect(),
        }
    }

    /// @ai:intent Value of the first alias present; None when absent or not numeric
    /// @ai:effects pure
    pub fn get(&self, key: MetricKey) -> Option<f64> {
        lookup(&self.values, key.aliases())
    }

    /// @ai:effects pure
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// @ai:intent Raw payload keys, sorted
    /// @ai:effects pure
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    /// @ai:intent Resolve every semantic metric
    /// @ai:effects pure
    pub fn extract(&self) -> ExtractedMetrics {
        ExtractedMetrics {
            distance: self.get(MetricKey::Distance),
            transition_cost: self.get(MetricKey::TransitionCost),
            vehicles_used: self.get(MetricKey::VehiclesUsed),
            product_changes: self.get(MetricKey::ProductChanges),
        }
    }
}

impl<K: Into<String>> FromIterator<(K, f64)> for RemoteMetrics {
    fn from_iter<I: IntoIterator<Item = (K, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), Value::from(v))).collect(),
        }
    }
}

/// @ai:intent Numeric value of the first alias present in `values`; later aliases are ignored
/// @ai:effects pure
fn lookup(values: &BTreeMap<String, Value>, aliases: &[&str]) -> Option<f64> {
    let (alias, value) = aliases
        .iter()
        .find_map(|alias| values.get(*alias).map(|value| (*alias, value)))?;

    let number = value.as_f64();
    if number.is_none() {
        tracing::debug!("Metric {} is not numeric: {}", alias, value);
    }
    number
}

/// @ai:intent Semantic metrics resolved from a payload; None means unavailable
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ExtractedMetrics {
    pub distance: Option<f64>,
    pub transition_cost: Option<f64>,
    pub vehicles_used: Option<f64>,
    pub product_changes: Option<f64>,
}

impl ExtractedMetrics {
    /// @ai:intent Value of one semantic metric
    /// @ai:effects pure
    pub fn get(&self, key: MetricKey) -> Option<f64> {
        match key {
            MetricKey::Distance => self.distance,
            MetricKey::TransitionCost => self.transition_cost,
            MetricKey::VehiclesUsed => self.vehicles_used,
            MetricKey::ProductChanges => self.product_changes,
        }
    }

    /// @ai:intent Total cost, only when both of its components were reported
    /// @ai:effects pure
    pub fn total_cost(&self) -> Option<f64> {
        Some(self.distance? + self.transition_cost?)
    }

    /// @ai:intent Compare reported metrics against a local solution
    /// @ai:effects pure
    pub fn compare_with(&self, solution: &Solution) -> Vec<MetricComparison> {
        let local = |key: MetricKey| match key {
            MetricKey::Distance => solution.total_distance(),
            MetricKey::TransitionCost => solution.total_transition_cost(),
            MetricKey::VehiclesUsed => solution.nb_vehicles_used() as f64,
            MetricKey::ProductChanges => solution.total_transitions() as f64,
        };

        [MetricKey::Distance, MetricKey::TransitionCost, MetricKey::VehiclesUsed]
            .into_iter()
            .filter_map(|key| {
                self.get(key).map(|remote| MetricComparison {
                    metric: key,
                    local: local(key),
                    remote,
                })
            })
            .collect()
    }
}

/// @ai:intent One local-vs-remote metric pair
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MetricComparison {
    pub metric: MetricKey,
    pub local: f64,
    pub remote: f64,
}

impl MetricComparison {
    /// @ai:effects pure
    pub fn difference(&self) -> f64 {
        (self.local - self.remote).abs()
    }

    /// @ai:effects pure
    pub fn matches(&self) -> bool {
        self.difference() < COMPARISON_TOLERANCE
    }
}

/// @ai:intent Classification of a verification outcome for reporting
#[derive(Debug, Clone, PartialEq)]
pub enum VerificationStatus {
    Feasible(ExtractedMetrics),
    FeasibleWithoutMetrics,
    Infeasible,
}

/// @ai:intent Normalized verdict of the verification service
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VerificationOutcome {
    pub feasible: bool,
    pub errors: Vec<String>,
    /// None when the payload carried no metrics object.
    pub metrics: Option<RemoteMetrics>,
}

impl VerificationOutcome {
    /// @ai:intent Infeasible outcome carrying a single diagnostic
    /// @ai:effects pure
    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            feasible: false,
            errors: vec![message.into()],
            metrics: None,
        }
    }

    /// @ai:intent Normalize a raw response body; malformed bodies become infeasible outcomes
    /// @ai:effects pure
    pub fn from_payload(body: &str) -> Self {
        let payload: Value = match serde_json::from_str(body) {
            Ok(value) => value,
            Err(e) => return Self::failure(format!("Malformed response body: {e}")),
        };

        let Some(object) = payload.as_object() else {
            return Self::failure("Malformed response body: expected a JSON object");
        };

        let feasible = object
            .get("feasible")
            .and_then(Value::as_bool)
            .unwrap_or(false);

        let errors: Vec<String> = object
            .get("errors")
            .and_then(Value::as_array)
            .map(|items| {
                items
                    .iter()
                    .map(|item| match item {
                        Value::String(text) => text.clone(),
                        other => other.to_string(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        let metrics = object
            .get("metrics")
            .and_then(Value::as_object)
            .map(RemoteMetrics::from_json);

        tracing::debug!(
            feasible,
            errors = errors.len(),
            metric_keys = ?metrics.as_ref().map(|m| m.keys().collect::<Vec<_>>()),
            "Raw verification response"
        );

        Self {
            feasible,
            errors,
            metrics,
        }
    }

    /// @ai:intent Classify as feasible with metrics, feasible without metrics, or infeasible
    /// @ai:effects pure
    pub fn status(&self) -> VerificationStatus {
        if !self.feasible {
            return VerificationStatus::Infeasible;
        }

        match &self.metrics {
            Some(metrics) if !metrics.is_empty() => VerificationStatus::Feasible(metrics.extract()),
            _ => VerificationStatus::FeasibleWithoutMetrics,
        }
    }
}
