//! Upload records
//!
//! Individuals and regions as parsed from user uploads. Numbers are kept as
//! uploaded and unrecognized columns are carried along in `extra`, so the
//! request contracts see exactly what the user supplied.

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

/// One individual prediction
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct IndivRecord {
    /// Predicted label (expected 0 or 1)
    #[cfg_attr(feature = "ts-gen", ts(type = "number"))]
    pub y_pred: Number,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
    /// Ground-truth label, required by the service when `equal_opp` is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y_true: Option<f64>,
    /// Indices into the accompanying region list
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(type = "Array<number> | null"))]
    pub region_ids: Option<Vec<Number>>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

impl IndivRecord {
    /// Record located by coordinates
    #[must_use]
    pub fn at(y_pred: i64, lat: f64, lon: f64) -> Self {
        Self { lat: Some(lat), lon: Some(lon), ..Self::prediction(y_pred) }
    }

    /// Record with only a prediction
    #[must_use]
    pub fn prediction(y_pred: i64) -> Self {
        Self {
            y_pred: Number::from(y_pred),
            lat: None,
            lon: None,
            y_true: None,
            region_ids: None,
            extra: Map::new(),
        }
    }

    /// Attach a ground-truth label
    #[must_use]
    pub fn with_truth(mut self, y_true: f64) -> Self {
        self.y_true = Some(y_true);
        self
    }
}

/// Individual carrying the model's predicted probability (threshold mode)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct ProbabilisticRecord {
    #[serde(flatten)]
    pub record: IndivRecord,
    /// `None`: column missing. `Some(None)`: explicit `null`.
    #[serde(default, deserialize_with = "present", skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "ts-gen", ts(optional))]
    pub y_pred_prob: Option<Option<f64>>,
}

impl ProbabilisticRecord {
    /// Record with a known probability
    #[must_use]
    pub fn new(record: IndivRecord, y_pred_prob: f64) -> Self {
        Self { record, y_pred_prob: Some(Some(y_pred_prob)) }
    }
}

/// Region polygon as a list of `[lon, lat]` points
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct RegionRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygon: Option<Vec<Vec<f64>>>,
    #[serde(flatten)]
    #[cfg_attr(feature = "ts-gen", ts(skip))]
    pub extra: Map<String, Value>,
}

// Only called when the key exists, so `null` becomes `Some(None)`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn absent_optionals_are_not_serialized() {
        let value = serde_json::to_value(IndivRecord::prediction(1)).unwrap();
        assert_eq!(value, json!({ "y_pred": 1 }));
    }

    #[test]
    fn numbers_keep_their_uploaded_form() {
        let record: IndivRecord =
            serde_json::from_value(json!({ "y_pred": 1.0, "y_true": 0.7, "region_ids": [2] })).unwrap();

        let value = serde_json::to_value(record).unwrap();
        assert_eq!(value, json!({ "y_pred": 1.0, "y_true": 0.7, "region_ids": [2] }));
    }

    #[test]
    fn unknown_columns_round_trip() {
        let record: IndivRecord =
            serde_json::from_value(json!({ "y_pred": 0, "score": 3 })).unwrap();

        assert_eq!(record.extra.get("score"), Some(&json!(3)));
        assert_eq!(serde_json::to_value(record).unwrap(), json!({ "y_pred": 0, "score": 3 }));
    }

    #[test]
    fn missing_and_null_probability_differ() {
        let missing: ProbabilisticRecord = serde_json::from_value(json!({ "y_pred": 1 })).unwrap();
        let null: ProbabilisticRecord =
            serde_json::from_value(json!({ "y_pred": 1, "y_pred_prob": null })).unwrap();

        assert_eq!(missing.y_pred_prob, None);
        assert_eq!(null.y_pred_prob, Some(None));
        assert_eq!(serde_json::to_value(missing).unwrap(), json!({ "y_pred": 1 }));
        assert_eq!(serde_json::to_value(null).unwrap(), json!({ "y_pred": 1, "y_pred_prob": null }));
    }

    #[test]
    fn parses_flattened_probabilistic_record() {
        let parsed: ProbabilisticRecord =
            serde_json::from_value(json!({ "y_pred": 1, "y_true": 0, "y_pred_prob": 0.83 })).unwrap();
        assert_eq!(parsed.record.y_true, Some(0.0));
        assert_eq!(parsed.y_pred_prob, Some(Some(0.83)));
        assert!(parsed.record.extra.is_empty());
    }
}
