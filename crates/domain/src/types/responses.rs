//! Typed service responses
//!
//! Every response struct keeps unrecognized keys in `extra` so additive
//! server fields survive a decode/encode cycle.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::mode::OperationMode;

/// Per-region significance statistic
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct StatEntry {
    pub idx: i64,
    pub stat: f64,
    #[serde(default)]
    pub is_signif: bool,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Result of `POST /api/spatial-bias/audit`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct AuditResponse {
    pub sbi_score: f64,
    pub signif_thresh: f64,
    pub total_signif_regions: i64,
    /// Pre-rendered map markup, opaque to this client
    pub fair_map_html: String,
    pub fair_map_image: String,
    pub stats: Vec<StatEntry>,
    pub distribution_map_html: String,
    pub distribution_map_image: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

impl AuditResponse {
    /// Regions flagged as significant
    pub fn significant_regions(&self) -> impl Iterator<Item = &StatEntry> {
        self.stats.iter().filter(|entry| entry.is_signif)
    }
}

/// Named fairness metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct Metric {
    pub name: String,
    pub value: f64,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Prediction after mitigation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct MitigatedPrediction {
    pub idx: i64,
    pub y_pred: i64,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Result of `POST /api/spatial-bias/mitigate/relabel`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct RelabelingResponse {
    pub metrics_before: Vec<Metric>,
    pub metrics_after: Vec<Metric>,
    pub audit_before_mitigation: AuditResponse,
    pub audit_after_mitigation: AuditResponse,
    pub mitigated_preds: Vec<MitigatedPrediction>,
    pub flips_map_html: String,
    pub flips_map_image: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Adjusted decision threshold for one region
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ThresholdEntry {
    pub idx: i64,
    pub threshold: f64,
    /// Tie-breaking probability for scores equal to the threshold
    pub eq_to_thresh_flip_prob: f64,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Result of `POST /api/spatial-bias/mitigate/threshold`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ThresholdAdjustmentResponse {
    pub metrics_before: Vec<Metric>,
    pub metrics_after: Vec<Metric>,
    pub audit_before_mitigation: AuditResponse,
    pub audit_after_mitigation: AuditResponse,
    pub mitigated_preds: Vec<MitigatedPrediction>,
    pub threshold_chart_before: String,
    pub threshold_chart_after: String,
    pub new_thresholds: Vec<ThresholdEntry>,
    pub flips_map_html: String,
    pub flips_map_image: String,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Pairwise correlation matrix keyed by feature name
pub type CorrelationMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// Result of `POST /api/correlations/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct CorrelationResponse {
    pub dataset_shape: Vec<i64>,
    pub feature_count: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pearson: Option<CorrelationMatrix>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spearman: Option<CorrelationMatrix>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// SHAP importance of one feature
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct FeatureImportanceItem {
    #[serde(rename = "Feature")]
    pub feature: String,
    #[serde(rename = "Importance")]
    pub importance: f64,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Result of `POST /api/feature-importance/analyze`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct FeatureImportanceResponse {
    pub feature_importance: Vec<FeatureImportanceItem>,
    pub model_names: Vec<String>,
    pub accuracy_scores: Vec<f64>,
    pub best_model: String,
    pub dataset_shape: Vec<i64>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

/// Successful result of any operation mode
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Audit(AuditResponse),
    Relabel(RelabelingResponse),
    ThresholdAdjust(ThresholdAdjustmentResponse),
    Correlation(CorrelationResponse),
    FeatureImportance(FeatureImportanceResponse),
}

impl AnalysisOutcome {
    /// Decode a response body for the given mode
    ///
    /// # Errors
    /// Returns the serde error when the body does not match the typed shape.
    pub fn decode(mode: OperationMode, body: Value) -> Result<Self, serde_json::Error> {
        Ok(match mode {
            OperationMode::Audit => Self::Audit(serde_json::from_value(body)?),
            OperationMode::Relabel => Self::Relabel(serde_json::from_value(body)?),
            OperationMode::ThresholdAdjust => Self::ThresholdAdjust(serde_json::from_value(body)?),
            OperationMode::Correlation => Self::Correlation(serde_json::from_value(body)?),
            OperationMode::FeatureImportance => {
                Self::FeatureImportance(serde_json::from_value(body)?)
            }
        })
    }

    /// Mode that produced this outcome
    #[must_use]
    pub const fn mode(&self) -> OperationMode {
        match self {
            Self::Audit(_) => OperationMode::Audit,
            Self::Relabel(_) => OperationMode::Relabel,
            Self::ThresholdAdjust(_) => OperationMode::ThresholdAdjust,
            Self::Correlation(_) => OperationMode::Correlation,
            Self::FeatureImportance(_) => OperationMode::FeatureImportance,
        }
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn audit_body() -> Value {
        json!({
            "sbi_score": 0.42,
            "signif_thresh": 0.01,
            "total_signif_regions": 1,
            "fair_map_html": "<div/>",
            "fair_map_image": "iVBORw0",
            "stats": [
                { "idx": 0, "stat": 0.003, "is_signif": true },
                { "idx": 1, "stat": 0.4 }
            ],
            "distribution_map_html": "<div/>",
            "distribution_map_image": "iVBORw0",
            "runtime_ms": 1834
        })
    }

    #[test]
    fn unknown_fields_survive_round_trip() {
        let outcome = AnalysisOutcome::decode(OperationMode::Audit, audit_body()).unwrap();
        let AnalysisOutcome::Audit(audit) = &outcome else {
            panic!("expected audit outcome");
        };
        assert_eq!(audit.extra.get("runtime_ms"), Some(&json!(1834)));
        assert_eq!(serde_json::to_value(&outcome).unwrap()["runtime_ms"], json!(1834));
    }

    #[test]
    fn stat_significance_defaults_to_false() {
        let outcome = AnalysisOutcome::decode(OperationMode::Audit, audit_body()).unwrap();
        let AnalysisOutcome::Audit(audit) = outcome else {
            panic!("expected audit outcome");
        };
        let flagged: Vec<i64> = audit.significant_regions().map(|s| s.idx).collect();
        assert_eq!(flagged, vec![0]);
    }

    #[test]
    fn feature_importance_uses_capitalized_keys() {
        let body = json!({
            "feature_importance": [{ "Feature": "income", "Importance": 0.31 }],
            "model_names": ["rf"],
            "accuracy_scores": [0.9],
            "best_model": "rf",
            "dataset_shape": [100, 5]
        });
        let outcome = AnalysisOutcome::decode(OperationMode::FeatureImportance, body).unwrap();
        assert_eq!(outcome.mode(), OperationMode::FeatureImportance);
        let AnalysisOutcome::FeatureImportance(fi) = outcome else {
            panic!("expected feature importance outcome");
        };
        assert_eq!(fi.feature_importance[0].feature, "income");
    }
}
