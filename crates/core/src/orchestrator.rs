//! Request orchestrator
//!
//! Runs one operation through `Building -> Validating -> Sending`. Stages run
//! strictly in sequence; the first failure ends the run and is handed to the
//! normalizer. Sending is never retried here: the transport already spent its
//! 401 retry.

use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde_json::Value;
use spatialbias_domain::{
    AdvancedParams, AnalysisOutcome, AnalysisRequest, AuditDraft, CorrelationDraft,
    CorrelationOptions, FeatureImportanceDraft, OperationMode, RegionRecord, RelabelDraft,
    SpatialDataset, ThresholdDataset, ThresholdDraft,
};
use tracing::{debug, info, instrument, warn};

use crate::contracts::{request_contract, response_contract};
use crate::errors::{AnalysisError, PipelineFailure};
use crate::normalizer::normalize;
use crate::ports::{AnalysisTransport, TransportError};

/// Message for a threshold request missing one of its two record sets
pub const MISSING_THRESHOLD_INPUTS: &str =
    "Missing required threshold mitigation inputs: fit_indiv_info and predict_indiv_info";

/// Pipeline stage, logged on every transition
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Building,
    Validating,
    Sending,
    Succeeded,
    Failed,
}

impl Stage {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Building => "building",
            Self::Validating => "validating",
            Self::Sending => "sending",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Drives analysis requests through validation and the transport
pub struct RequestOrchestrator {
    transport: Arc<dyn AnalysisTransport>,
}

impl RequestOrchestrator {
    /// Create an orchestrator sending through `transport`
    pub fn new(transport: Arc<dyn AnalysisTransport>) -> Self {
        Self { transport }
    }

    /// Build, validate and send `request`
    ///
    /// # Errors
    /// Returns exactly one [`AnalysisError`]: building failures keep their
    /// message, client-side and remote validation failures are formatted,
    /// anything else from the transport passes through.
    #[instrument(skip(self, request), fields(mode = %request.mode()))]
    pub async fn run(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, AnalysisError> {
        let mode = request.mode();
        match self.execute(request).await {
            Ok(outcome) => {
                info!(stage = %Stage::Succeeded, mode = %mode, "Analysis request completed");
                Ok(outcome)
            }
            Err(failure) => {
                warn!(stage = %Stage::Failed, mode = %mode, error = %failure, "Analysis request failed");
                Err(normalize(failure))
            }
        }
    }

    /// Run only `Building` and `Validating`, returning the exact body that
    /// would be sent (defaults included)
    ///
    /// # Errors
    /// Same as [`run`](Self::run) for the first two stages.
    pub fn prepare(&self, request: AnalysisRequest) -> Result<Value, AnalysisError> {
        let mode = request.mode();
        build_and_validate(request).map_err(|failure| {
            warn!(stage = %Stage::Failed, mode = %mode, error = %failure, "Request rejected locally");
            normalize(failure)
        })
    }

    async fn execute(&self, request: AnalysisRequest) -> Result<AnalysisOutcome, PipelineFailure> {
        let mode = request.mode();
        let body = build_and_validate(request)?;

        let path = mode.endpoint();
        debug!(stage = %Stage::Sending, mode = %mode, path, "Sending request");
        let response = self.transport.post(path, &body).await?;

        Ok(accept_response(mode, &response)?)
    }
}

fn build_and_validate(request: AnalysisRequest) -> Result<Value, PipelineFailure> {
    let mode = request.mode();

    debug!(stage = %Stage::Building, mode = %mode, "Building request");
    let draft = build(request)?;

    debug!(stage = %Stage::Validating, mode = %mode, "Validating request");
    let body = request_contract(mode).validate(&draft)?;
    Ok(Value::Object(body))
}

/// Assemble the mode-specific wire object
fn build(request: AnalysisRequest) -> Result<Value, PipelineFailure> {
    match request {
        AnalysisRequest::Audit(dataset) => to_draft(&audit_draft(dataset)),
        AnalysisRequest::Relabel(dataset) => to_draft(&relabel_draft(dataset)),
        AnalysisRequest::ThresholdAdjust(dataset) => to_draft(&threshold_draft(dataset)?),
        AnalysisRequest::Correlation(options) => to_draft(&correlation_draft(options)),
        AnalysisRequest::FeatureImportance => to_draft(&FeatureImportanceDraft {}),
    }
}

fn to_draft<T: Serialize>(draft: &T) -> Result<Value, PipelineFailure> {
    serde_json::to_value(draft)
        .map_err(|e| PipelineFailure::Input(format!("Could not assemble request: {e}")))
}

/// Empty region uploads are sent as absent, not as `[]`
fn present(regions: Vec<RegionRecord>) -> Option<Vec<RegionRecord>> {
    (!regions.is_empty()).then_some(regions)
}

fn audit_draft(dataset: SpatialDataset) -> AuditDraft {
    let SpatialDataset { indiv_info, region_info, advanced } = dataset;
    AuditDraft {
        indiv_info,
        region_info: present(region_info),
        equal_opp: advanced.equal_opp,
        signif_level: advanced.signif_level,
        n_worlds: advanced.n_worlds,
    }
}

fn relabel_draft(dataset: SpatialDataset) -> RelabelDraft {
    let SpatialDataset { indiv_info, region_info, advanced } = dataset;
    let AdvancedParams {
        equal_opp,
        signif_level,
        n_worlds,
        budget_constr,
        pr_constr,
        approx,
        work_limit,
        default_boundary: _,
    } = advanced;
    RelabelDraft {
        indiv_info,
        region_info: present(region_info),
        equal_opp,
        signif_level,
        n_worlds,
        budget_constr,
        pr_constr,
        approx,
        work_limit,
    }
}

fn threshold_draft(dataset: ThresholdDataset) -> Result<ThresholdDraft, PipelineFailure> {
    let ThresholdDataset { fit_indiv_info, predict_indiv_info, predict_region_info, advanced } =
        dataset;
    if fit_indiv_info.is_empty() || predict_indiv_info.is_empty() {
        return Err(PipelineFailure::Input(MISSING_THRESHOLD_INPUTS.to_string()));
    }

    let AdvancedParams {
        equal_opp,
        signif_level,
        n_worlds,
        budget_constr,
        pr_constr,
        approx,
        work_limit,
        default_boundary,
    } = advanced;
    Ok(ThresholdDraft {
        fit_indiv_info,
        predict_indiv_info,
        predict_region_info: present(predict_region_info),
        approx,
        equal_opp,
        signif_level,
        n_worlds,
        budget_constr,
        pr_constr,
        work_limit,
        default_boundary,
    })
}

const fn correlation_draft(options: CorrelationOptions) -> CorrelationDraft {
    CorrelationDraft {
        include_pearson: options.include_pearson,
        include_spearman: options.include_spearman,
    }
}

/// Check a success body against the open response contract, then decode it
fn accept_response(mode: OperationMode, body: &Value) -> Result<AnalysisOutcome, TransportError> {
    let checked = response_contract(mode)
        .validate(body)
        .map_err(|e| TransportError::ResponseContract(e.to_string()))?;
    AnalysisOutcome::decode(mode, Value::Object(checked))
        .map_err(|e| TransportError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use spatialbias_domain::{IndivRecord, LocSegment, ProbabilisticRecord, RemoteIssue};

    use super::*;

    /// Transport answering from a queue and recording every call
    #[derive(Default)]
    struct ScriptedTransport {
        replies: Mutex<VecDeque<Result<Value, TransportError>>>,
        calls: Mutex<Vec<(String, Value)>>,
    }

    impl ScriptedTransport {
        fn replying(reply: Result<Value, TransportError>) -> Arc<Self> {
            let transport = Self::default();
            transport.replies.lock().unwrap().push_back(reply);
            Arc::new(transport)
        }

        fn calls(&self) -> Vec<(String, Value)> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl AnalysisTransport for ScriptedTransport {
        async fn post(&self, path: &str, body: &Value) -> Result<Value, TransportError> {
            self.calls.lock().unwrap().push((path.to_string(), body.clone()));
            self.replies
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("no scripted reply".into())))
        }
    }

    fn audit_body() -> Value {
        json!({
            "sbi_score": 0.42,
            "signif_thresh": 0.005,
            "total_signif_regions": 0,
            "fair_map_html": "<div/>",
            "fair_map_image": "",
            "stats": [{ "idx": 0, "stat": 0.2 }],
            "distribution_map_html": "<div/>",
            "distribution_map_image": "",
            "server_version": "2.1"
        })
    }

    fn audit_request() -> AnalysisRequest {
        AnalysisRequest::Audit(SpatialDataset {
            indiv_info: vec![IndivRecord::prediction(1)],
            ..SpatialDataset::default()
        })
    }

    fn probabilistic(y_pred: i64, prob: f64) -> ProbabilisticRecord {
        ProbabilisticRecord::new(IndivRecord::prediction(y_pred), prob)
    }

    #[tokio::test]
    async fn audit_sends_defaults_to_fixed_endpoint() {
        let transport = ScriptedTransport::replying(Ok(audit_body()));
        let orchestrator = RequestOrchestrator::new(transport.clone());

        let outcome = orchestrator.run(audit_request()).await.unwrap();

        let calls = transport.calls();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "/api/spatial-bias/audit");
        assert_eq!(
            calls[0].1,
            json!({
                "indiv_info": [{ "y_pred": 1 }],
                "equal_opp": true,
                "signif_level": 0.005,
                "n_worlds": 400
            })
        );

        match outcome {
            AnalysisOutcome::Audit(audit) => {
                assert!(!audit.stats[0].is_signif);
                assert_eq!(audit.extra.get("server_version"), Some(&json!("2.1")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[tokio::test]
    async fn invalid_payload_never_reaches_the_transport() {
        let transport = Arc::new(ScriptedTransport::default());
        let orchestrator = RequestOrchestrator::new(transport.clone());
        let request = AnalysisRequest::Audit(SpatialDataset {
            indiv_info: vec![IndivRecord::prediction(2)],
            advanced: AdvancedParams { signif_level: Some(1.5), ..AdvancedParams::default() },
            ..SpatialDataset::default()
        });

        let err = orchestrator.run(request).await.unwrap_err();

        assert!(transport.calls().is_empty());
        assert_eq!(
            err.to_string(),
            "Client-side validation failed:\n\
             - signif_level: Number must be less than 1\n\
             - indiv_info[0].y_pred: Number must be less than or equal to 1"
        );
    }

    #[tokio::test]
    async fn empty_individuals_are_rejected_locally() {
        let transport = Arc::new(ScriptedTransport::default());
        let orchestrator = RequestOrchestrator::new(transport.clone());

        let err = orchestrator
            .run(AnalysisRequest::Relabel(SpatialDataset::default()))
            .await
            .unwrap_err();

        assert!(matches!(err, AnalysisError::Invalid(_)));
        assert!(err.to_string().starts_with("Client-side validation failed:\n- indiv_info: "));
        assert!(transport.calls().is_empty());
    }

    #[tokio::test]
    async fn threshold_without_both_sets_fails_fast() {
        let transport = Arc::new(ScriptedTransport::default());
        let orchestrator = RequestOrchestrator::new(transport.clone());
        let request = AnalysisRequest::ThresholdAdjust(ThresholdDataset {
            fit_indiv_info: vec![probabilistic(1, 0.8)],
            ..ThresholdDataset::default()
        });

        let err = orchestrator.run(request).await.unwrap_err();

        assert_eq!(err, AnalysisError::Input(MISSING_THRESHOLD_INPUTS.to_string()));
        assert!(transport.calls().is_empty());
    }

    #[test]
    fn threshold_body_carries_probabilities_and_defaults() {
        let orchestrator = RequestOrchestrator::new(Arc::new(ScriptedTransport::default()));
        let request = AnalysisRequest::ThresholdAdjust(ThresholdDataset {
            fit_indiv_info: vec![probabilistic(1, 0.8)],
            predict_indiv_info: vec![probabilistic(0, 0.3)],
            predict_region_info: Vec::new(),
            advanced: AdvancedParams { n_worlds: Some(50), ..AdvancedParams::default() },
        });

        let body = orchestrator.prepare(request).unwrap();

        assert_eq!(body["fit_indiv_info"][0], json!({ "y_pred": 1, "y_pred_prob": 0.8 }));
        assert_eq!(body["n_worlds"], json!(50));
        assert_eq!(body["default_boundary"], json!(0.5));
        assert_eq!(body["work_limit"], json!(30));
        assert!(body.get("predict_region_info").is_none());
    }

    #[tokio::test]
    async fn remote_validation_is_formatted() {
        let issue = RemoteIssue {
            loc: vec![
                LocSegment::Key("body".into()),
                LocSegment::Key("indiv_info".into()),
                LocSegment::Index(0),
                LocSegment::Key("y_pred".into()),
            ],
            msg: "ensure this value is >= 0".into(),
            kind: "value_error".into(),
        };
        let transport =
            ScriptedTransport::replying(Err(TransportError::RemoteValidation(vec![issue])));
        let orchestrator = RequestOrchestrator::new(transport);

        let err = orchestrator.run(audit_request()).await.unwrap_err();

        assert_eq!(
            err.to_string(),
            "Request validation failed:\n- indiv_info[0].y_pred: ensure this value is >= 0"
        );
    }

    #[tokio::test]
    async fn transport_failures_pass_through_once() {
        let transport = ScriptedTransport::replying(Err(TransportError::Http {
            status: 503,
            body: "maintenance".into(),
        }));
        let orchestrator = RequestOrchestrator::new(transport.clone());

        let err = orchestrator.run(audit_request()).await.unwrap_err();

        assert_eq!(err.transport().and_then(TransportError::status), Some(503));
        assert_eq!(transport.calls().len(), 1);
    }

    #[tokio::test]
    async fn malformed_success_body_is_a_transport_error() {
        let transport = ScriptedTransport::replying(Ok(json!({ "sbi_score": "high" })));
        let orchestrator = RequestOrchestrator::new(transport);

        let err = orchestrator.run(audit_request()).await.unwrap_err();

        match err {
            AnalysisError::Transport(TransportError::ResponseContract(message)) => {
                assert!(message.contains("sbi_score"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn feature_importance_posts_empty_object() {
        let transport = ScriptedTransport::replying(Ok(json!({
            "feature_importance": [{ "Feature": "age", "Importance": 0.7 }],
            "model_names": ["rf"],
            "accuracy_scores": [0.91],
            "best_model": "rf",
            "dataset_shape": [100, 4]
        })));
        let orchestrator = RequestOrchestrator::new(transport.clone());

        let outcome = orchestrator.run(AnalysisRequest::FeatureImportance).await.unwrap();

        assert_eq!(outcome.mode(), OperationMode::FeatureImportance);
        assert_eq!(
            transport.calls(),
            vec![("/api/feature-importance/analyze".to_string(), json!({}))]
        );
    }

    #[test]
    fn correlation_defaults_enable_both_methods() {
        let orchestrator = RequestOrchestrator::new(Arc::new(ScriptedTransport::default()));
        let body = orchestrator
            .prepare(AnalysisRequest::Correlation(CorrelationOptions {
                include_pearson: Some(false),
                include_spearman: None,
            }))
            .unwrap();

        assert_eq!(body, json!({ "include_pearson": false, "include_spearman": true }));
    }
}
