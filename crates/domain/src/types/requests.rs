//! Typed analysis requests and their wire drafts
//!
//! [`AnalysisRequest`] is what the UI boundary hands to the orchestrator.
//! The `*Draft` structs are the mode-specific wire objects assembled from it
//! before contract validation: absent optionals are omitted from the JSON so
//! the contract can inject defaults.

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use super::mode::OperationMode;
use super::records::{IndivRecord, ProbabilisticRecord, RegionRecord};

/// Advanced parameters shown in the options panel, all optional
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct AdvancedParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub equal_opp: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signif_level: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub n_worlds: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget_constr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pr_constr: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub approx: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub work_limit: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_boundary: Option<f64>,
}

/// Individuals plus optional regions (audit and relabel modes)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialDataset {
    pub indiv_info: Vec<IndivRecord>,
    pub region_info: Vec<RegionRecord>,
    pub advanced: AdvancedParams,
}

/// Fit and predict sets (threshold mode)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdDataset {
    pub fit_indiv_info: Vec<ProbabilisticRecord>,
    pub predict_indiv_info: Vec<ProbabilisticRecord>,
    pub predict_region_info: Vec<RegionRecord>,
    pub advanced: AdvancedParams,
}

/// Correlation method toggles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CorrelationOptions {
    pub include_pearson: Option<bool>,
    pub include_spearman: Option<bool>,
}

/// A request as selected in the UI, one variant per operation mode
#[derive(Debug, Clone, PartialEq)]
pub enum AnalysisRequest {
    Audit(SpatialDataset),
    Relabel(SpatialDataset),
    ThresholdAdjust(ThresholdDataset),
    Correlation(CorrelationOptions),
    FeatureImportance,
}

impl AnalysisRequest {
    /// Mode selecting the contract pair and endpoint
    #[must_use]
    pub const fn mode(&self) -> OperationMode {
        match self {
            Self::Audit(_) => OperationMode::Audit,
            Self::Relabel(_) => OperationMode::Relabel,
            Self::ThresholdAdjust(_) => OperationMode::ThresholdAdjust,
            Self::Correlation(_) => OperationMode::Correlation,
            Self::FeatureImportance => OperationMode::FeatureImportance,
        }
    }
}

/// Wire object for `POST /api/spatial-bias/audit`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AuditDraft {
    pub indiv_info: Vec<IndivRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_info: Option<Vec<RegionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equal_opp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signif_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_worlds: Option<i64>,
}

/// Wire object for `POST /api/spatial-bias/mitigate/relabel`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RelabelDraft {
    pub indiv_info: Vec<IndivRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub region_info: Option<Vec<RegionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equal_opp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signif_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_worlds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_constr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_constr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_limit: Option<i64>,
}

/// Wire object for `POST /api/spatial-bias/mitigate/threshold`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ThresholdDraft {
    pub fit_indiv_info: Vec<ProbabilisticRecord>,
    pub predict_indiv_info: Vec<ProbabilisticRecord>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub predict_region_info: Option<Vec<RegionRecord>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub approx: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub equal_opp: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signif_level: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub n_worlds: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub budget_constr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pr_constr: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub work_limit: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default_boundary: Option<f64>,
}

/// Wire object for `POST /api/correlations/analyze`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CorrelationDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_pearson: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub include_spearman: Option<bool>,
}

/// Wire object for `POST /api/feature-importance/analyze` (always `{}`)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FeatureImportanceDraft {}
