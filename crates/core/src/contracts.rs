//! Contract registry
//!
//! One request contract and one response contract per operation mode,
//! declared once per process. Request contracts are closed, response
//! contracts are open.

use std::sync::Arc;

use once_cell::sync::Lazy;
use serde_json::Value;
use spatialbias_common::validation::{Contract, FieldSpec, FieldType, RangeValidator};
use spatialbias_domain::constants::{
    DEFAULT_APPROX, DEFAULT_BOUNDARY, DEFAULT_BUDGET_CONSTR, DEFAULT_EQUAL_OPP, DEFAULT_N_WORLDS,
    DEFAULT_PR_CONSTR, DEFAULT_SIGNIF_LEVEL, DEFAULT_WORK_LIMIT, MAX_N_WORLDS, MIN_N_WORLDS,
};
use spatialbias_domain::{AdvancedParams, OperationMode};
use tracing::warn;

// Shared request fields
// -----------------------------------------------------------------

fn n_worlds() -> FieldSpec {
    FieldSpec::defaulted(
        "n_worlds",
        FieldType::Int(RangeValidator::new(MIN_N_WORLDS, MAX_N_WORLDS)),
        DEFAULT_N_WORLDS,
    )
}

fn signif_level() -> FieldSpec {
    FieldSpec::defaulted(
        "signif_level",
        FieldType::Number(RangeValidator::exclusive(0.0, 1.0)),
        DEFAULT_SIGNIF_LEVEL,
    )
}

fn equal_opp() -> FieldSpec {
    FieldSpec::defaulted("equal_opp", FieldType::Bool, DEFAULT_EQUAL_OPP)
}

fn approx() -> FieldSpec {
    FieldSpec::defaulted("approx", FieldType::Bool, DEFAULT_APPROX)
}

fn unit_interval(name: &str, default: f64) -> FieldSpec {
    FieldSpec::defaulted(name, FieldType::Number(RangeValidator::new(0.0, 1.0)), default)
}

fn work_limit() -> FieldSpec {
    FieldSpec::defaulted("work_limit", FieldType::number().nullable(), DEFAULT_WORK_LIMIT)
}

fn default_boundary() -> FieldSpec {
    FieldSpec::defaulted("default_boundary", FieldType::number().nullable(), DEFAULT_BOUNDARY)
}

fn regions(name: &str) -> FieldSpec {
    FieldSpec::optional(name, FieldType::array(FieldType::object(&REGION_INFO)).nullable())
}

fn records(name: &str, record: &Arc<Contract>) -> FieldSpec {
    FieldSpec::required(name, FieldType::non_empty_array(FieldType::object(record), 1))
}

// Request contracts
// -----------------------------------------------------------------

static INDIV_INFO: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("IndivInfo")
        .field(FieldSpec::required("y_pred", FieldType::Int(RangeValidator::new(0, 1))))
        .field(FieldSpec::optional("lat", FieldType::number().nullable()))
        .field(FieldSpec::optional("lon", FieldType::number().nullable()))
        .field(FieldSpec::optional("y_true", FieldType::number().nullable()))
        .field(FieldSpec::optional("region_ids", FieldType::array(FieldType::int()).nullable()))
        .shared()
});

static INDIV_INFO_WITH_PROBABILITIES: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("IndivInfoWithProbabilities")
        .extend(&INDIV_INFO)
        .field(FieldSpec::required("y_pred_prob", FieldType::number().nullable()))
        .shared()
});

static REGION_INFO: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("RegionInfo")
        .field(FieldSpec::optional(
            "polygon",
            FieldType::array(FieldType::array(FieldType::number())).nullable(),
        ))
        .shared()
});

static AUDIT_REQUEST: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("AuditRequest")
        .field(n_worlds())
        .field(signif_level())
        .field(equal_opp())
        .field(records("indiv_info", &INDIV_INFO))
        .field(regions("region_info"))
        .shared()
});

static RELABELING_REQUEST: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("RelabelingRequest")
        .field(approx())
        .field(unit_interval("budget_constr", DEFAULT_BUDGET_CONSTR))
        .field(unit_interval("pr_constr", DEFAULT_PR_CONSTR))
        .field(equal_opp())
        .field(n_worlds())
        .field(signif_level())
        .field(work_limit())
        .field(records("indiv_info", &INDIV_INFO))
        .field(regions("region_info"))
        .shared()
});

static THRESHOLD_ADJUSTMENT_REQUEST: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("ThresholdAdjustmentRequest")
        .field(approx())
        .field(unit_interval("budget_constr", DEFAULT_BUDGET_CONSTR))
        .field(unit_interval("pr_constr", DEFAULT_PR_CONSTR))
        .field(equal_opp())
        .field(n_worlds())
        .field(signif_level())
        .field(work_limit())
        .field(default_boundary())
        .field(records("fit_indiv_info", &INDIV_INFO_WITH_PROBABILITIES))
        .field(records("predict_indiv_info", &INDIV_INFO_WITH_PROBABILITIES))
        .field(regions("predict_region_info"))
        .shared()
});

static CORRELATION_REQUEST: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::request("CorrelationRequest")
        .field(FieldSpec::defaulted("include_pearson", FieldType::Bool, true))
        .field(FieldSpec::defaulted("include_spearman", FieldType::Bool, true))
        .shared()
});

static FEATURE_IMPORTANCE_REQUEST: Lazy<Arc<Contract>> =
    Lazy::new(|| Contract::request("FeatureImportanceRequest").shared());

// Response contracts
// -----------------------------------------------------------------

static STAT_ENTRY: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("StatEntry")
        .field(FieldSpec::required("idx", FieldType::int()))
        .field(FieldSpec::required("stat", FieldType::number()))
        .field(FieldSpec::defaulted("is_signif", FieldType::Bool, false))
        .shared()
});

static AUDIT_RESPONSE: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("AuditResponse")
        .field(FieldSpec::required("sbi_score", FieldType::number()))
        .field(FieldSpec::required("signif_thresh", FieldType::number()))
        .field(FieldSpec::required("total_signif_regions", FieldType::int()))
        .field(FieldSpec::required("fair_map_html", FieldType::String))
        .field(FieldSpec::required("fair_map_image", FieldType::String))
        .field(FieldSpec::required("stats", FieldType::array(FieldType::object(&STAT_ENTRY))))
        .field(FieldSpec::required("distribution_map_html", FieldType::String))
        .field(FieldSpec::required("distribution_map_image", FieldType::String))
        .shared()
});

static METRIC: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("Metric")
        .field(FieldSpec::required("name", FieldType::String))
        .field(FieldSpec::required("value", FieldType::number()))
        .shared()
});

static MITIGATED_PRED_ENTRY: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("MitigatedPredEntry")
        .field(FieldSpec::required("idx", FieldType::int()))
        .field(FieldSpec::required("y_pred", FieldType::int()))
        .shared()
});

/// Fields shared by both mitigation responses, in declaration order
static MITIGATION_RESPONSE: Lazy<Contract> = Lazy::new(|| {
    let metrics = || FieldType::array(FieldType::object(&METRIC));
    Contract::response("MitigationResponse")
        .field(FieldSpec::required("metrics_before", metrics()))
        .field(FieldSpec::required("metrics_after", metrics()))
        .field(FieldSpec::required("audit_before_mitigation", FieldType::object(&AUDIT_RESPONSE)))
        .field(FieldSpec::required("audit_after_mitigation", FieldType::object(&AUDIT_RESPONSE)))
        .field(FieldSpec::required(
            "mitigated_preds",
            FieldType::array(FieldType::object(&MITIGATED_PRED_ENTRY)),
        ))
});

static RELABELING_RESPONSE: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("RelabelingResponse")
        .extend(&MITIGATION_RESPONSE)
        .field(FieldSpec::required("flips_map_html", FieldType::String))
        .field(FieldSpec::required("flips_map_image", FieldType::String))
        .shared()
});

static THRESHOLD_ENTRY: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("ThresholdEntry")
        .field(FieldSpec::required("idx", FieldType::int()))
        .field(FieldSpec::required("threshold", FieldType::number()))
        .field(FieldSpec::required("eq_to_thresh_flip_prob", FieldType::number()))
        .shared()
});

static THRESHOLD_ADJUSTMENT_RESPONSE: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("ThresholdAdjustmentResponse")
        .extend(&MITIGATION_RESPONSE)
        .field(FieldSpec::required("threshold_chart_before", FieldType::String))
        .field(FieldSpec::required("threshold_chart_after", FieldType::String))
        .field(FieldSpec::required(
            "new_thresholds",
            FieldType::array(FieldType::object(&THRESHOLD_ENTRY)),
        ))
        .field(FieldSpec::required("flips_map_html", FieldType::String))
        .field(FieldSpec::required("flips_map_image", FieldType::String))
        .shared()
});

static CORRELATION_RESPONSE: Lazy<Arc<Contract>> = Lazy::new(|| {
    let matrix = || FieldType::record(FieldType::record(FieldType::number())).nullable();
    Contract::response("CorrelationResponse")
        .field(FieldSpec::required("dataset_shape", FieldType::array(FieldType::int())))
        .field(FieldSpec::required("feature_count", FieldType::int()))
        .field(FieldSpec::optional("pearson", matrix()))
        .field(FieldSpec::optional("spearman", matrix()))
        .shared()
});

static FEATURE_IMPORTANCE_ITEM: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("FeatureImportanceItem")
        .field(FieldSpec::required("Feature", FieldType::String))
        .field(FieldSpec::required("Importance", FieldType::number()))
        .shared()
});

static FEATURE_IMPORTANCE_RESPONSE: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("FeatureImportanceResponse")
        .field(FieldSpec::required(
            "feature_importance",
            FieldType::array(FieldType::object(&FEATURE_IMPORTANCE_ITEM)),
        ))
        .field(FieldSpec::required("model_names", FieldType::array(FieldType::String)))
        .field(FieldSpec::required("accuracy_scores", FieldType::array(FieldType::number())))
        .field(FieldSpec::required("best_model", FieldType::String))
        .field(FieldSpec::required("dataset_shape", FieldType::array(FieldType::int())))
        .shared()
});

static VALIDATION_ISSUE: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("ValidationError")
        .field(FieldSpec::required(
            "loc",
            FieldType::array(FieldType::union(vec![FieldType::String, FieldType::int()])),
        ))
        .field(FieldSpec::required("msg", FieldType::String))
        .field(FieldSpec::required("type", FieldType::String))
        .shared()
});

static HTTP_VALIDATION_ERROR: Lazy<Arc<Contract>> = Lazy::new(|| {
    Contract::response("HTTPValidationError")
        .field(FieldSpec::optional("detail", FieldType::array(FieldType::object(&VALIDATION_ISSUE))))
        .shared()
});

// Lookup
// -----------------------------------------------------------------

/// Closed contract for the request body of `mode`
#[must_use]
pub fn request_contract(mode: OperationMode) -> &'static Contract {
    match mode {
        OperationMode::Audit => AUDIT_REQUEST.as_ref(),
        OperationMode::Relabel => RELABELING_REQUEST.as_ref(),
        OperationMode::ThresholdAdjust => THRESHOLD_ADJUSTMENT_REQUEST.as_ref(),
        OperationMode::Correlation => CORRELATION_REQUEST.as_ref(),
        OperationMode::FeatureImportance => FEATURE_IMPORTANCE_REQUEST.as_ref(),
    }
}

/// Open contract for the success body of `mode`
#[must_use]
pub fn response_contract(mode: OperationMode) -> &'static Contract {
    match mode {
        OperationMode::Audit => AUDIT_RESPONSE.as_ref(),
        OperationMode::Relabel => RELABELING_RESPONSE.as_ref(),
        OperationMode::ThresholdAdjust => THRESHOLD_ADJUSTMENT_RESPONSE.as_ref(),
        OperationMode::Correlation => CORRELATION_RESPONSE.as_ref(),
        OperationMode::FeatureImportance => FEATURE_IMPORTANCE_RESPONSE.as_ref(),
    }
}

/// Open contract for HTTP 422 bodies
#[must_use]
pub fn http_validation_error_contract() -> &'static Contract {
    HTTP_VALIDATION_ERROR.as_ref()
}

/// Open contract for one item of a 422 `detail` list
pub fn validation_issue_contract() -> &'static Contract {
    VALIDATION_ISSUE.as_ref()
}

/// Advanced parameters prefilled for `mode`
///
/// Derived from the request contract's declared defaults; `work_limit` and
/// `default_boundary` fall back to 30 and 0.5 where the mode uses them.
#[must_use]
pub fn advanced_defaults(mode: OperationMode) -> AdvancedParams {
    let defaults = Value::Object(request_contract(mode).defaults());
    let mut params: AdvancedParams = match serde_json::from_value(defaults) {
        Ok(params) => params,
        Err(e) => {
            warn!(mode = %mode, error = %e, "Contract defaults do not fit advanced parameters");
            AdvancedParams::default()
        }
    };

    if matches!(mode, OperationMode::Relabel | OperationMode::ThresholdAdjust) {
        params.work_limit = params.work_limit.or(Some(DEFAULT_WORK_LIMIT));
    }
    if mode == OperationMode::ThresholdAdjust {
        params.default_boundary = params.default_boundary.or(Some(DEFAULT_BOUNDARY));
    }
    params
}
