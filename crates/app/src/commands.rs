//! Command implementations behind the CLI

use std::path::Path;

use anyhow::Context;
use serde::Serialize;
use spatialbias_core::advanced_defaults;
use spatialbias_domain::{
    AnalysisOutcome, AnalysisRequest, CorrelationOptions, OperationMode, SpatialDataset,
    ThresholdDataset,
};
use tracing::{info, instrument};

use crate::cli::RunArgs;
use crate::context::AppContext;
use crate::upload::{load_spatial, load_threshold, UploadError};

/// Assemble the typed request for `args.mode` from the uploaded files
pub fn build_request(args: &RunArgs) -> Result<AnalysisRequest, UploadError> {
    let advanced = (&args.advanced).into();

    Ok(match args.mode {
        OperationMode::Audit | OperationMode::Relabel => {
            let upload =
                load_spatial(args.input.as_deref(), args.indiv.as_deref(), args.region.as_deref())?;
            let dataset =
                SpatialDataset { indiv_info: upload.indiv, region_info: upload.region, advanced };
            if args.mode == OperationMode::Audit {
                AnalysisRequest::Audit(dataset)
            } else {
                AnalysisRequest::Relabel(dataset)
            }
        }
        OperationMode::ThresholdAdjust => {
            let upload = load_threshold(
                args.input.as_deref(),
                args.fit.as_deref(),
                args.predict.as_deref(),
                args.predict_region.as_deref(),
            )?;
            AnalysisRequest::ThresholdAdjust(ThresholdDataset {
                fit_indiv_info: upload.fit_indiv,
                predict_indiv_info: upload.predict_indiv,
                predict_region_info: upload.predict_region,
                advanced,
            })
        }
        OperationMode::Correlation => AnalysisRequest::Correlation(CorrelationOptions {
            include_pearson: args.pearson,
            include_spearman: args.spearman,
        }),
        OperationMode::FeatureImportance => AnalysisRequest::FeatureImportance,
    })
}

/// Run one analysis end to end
///
/// # Errors
/// Returns the upload error or the single normalized analysis message
#[instrument(skip(ctx, args), fields(mode = %args.mode))]
pub async fn run_analysis(ctx: &AppContext, args: &RunArgs) -> anyhow::Result<AnalysisOutcome> {
    let request = build_request(args)?;
    let outcome = ctx.orchestrator.run(request).await?;
    info!("Analysis completed");
    Ok(outcome)
}

/// Default advanced parameters of `mode` as pretty JSON
///
/// # Errors
/// Returns error if serialization fails
pub fn defaults_json(mode: OperationMode) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&advanced_defaults(mode))?)
}

/// Session snapshot as pretty JSON
///
/// # Errors
/// Returns error if serialization fails
pub async fn status_json(ctx: &AppContext) -> anyhow::Result<String> {
    Ok(serde_json::to_string_pretty(&ctx.credentials.status().await)?)
}

/// Write `value` as pretty JSON to `output`, or to stdout
///
/// # Errors
/// Returns error if serialization or the file write fails
pub fn write_output<T: Serialize>(value: &T, output: Option<&Path>) -> anyhow::Result<()> {
    let rendered = serde_json::to_string_pretty(value)?;
    match output {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("Could not write {}", path.display()))?;
            info!(path = %path.display(), "Result written");
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
