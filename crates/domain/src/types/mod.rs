//! Domain types and models
//!
//! Upload records and request drafts are well-typed but not bounds-checked:
//! range and length checks belong to the contract registry.

pub mod mode;
pub mod records;
pub mod remote;
pub mod requests;
pub mod responses;

pub use mode::OperationMode;
pub use records::{IndivRecord, ProbabilisticRecord, RegionRecord};
pub use remote::{HttpValidationError, LocSegment, RemoteIssue};
pub use requests::{
    AdvancedParams, AnalysisRequest, AuditDraft, CorrelationDraft, CorrelationOptions,
    FeatureImportanceDraft, RelabelDraft, SpatialDataset, ThresholdDataset, ThresholdDraft,
};
pub use responses::{
    AnalysisOutcome, AuditResponse, CorrelationResponse, FeatureImportanceItem,
    FeatureImportanceResponse, Metric, MitigatedPrediction, RelabelingResponse, StatEntry,
    ThresholdAdjustmentResponse, ThresholdEntry,
};
