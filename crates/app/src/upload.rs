//! Dataset uploads
//!
//! Reads JSON files into typed records. Only JSON types are checked here:
//! integer labels, bounds, required keys and unknown columns are left to the
//! request contracts so every violation is reported at once.

use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use spatialbias_domain::{IndivRecord, ProbabilisticRecord, RegionRecord};
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Error)]
pub enum UploadError {
    #[error("Could not read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid dataset {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },
}

/// Individuals and regions for audit and relabel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpatialUpload {
    pub indiv: Vec<IndivRecord>,
    pub region: Vec<RegionRecord>,
}

/// Fit and predict sets for threshold adjustment
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ThresholdUpload {
    pub fit_indiv: Vec<ProbabilisticRecord>,
    pub predict_indiv: Vec<ProbabilisticRecord>,
    pub predict_region: Vec<RegionRecord>,
}

/// Read and parse one JSON file
pub fn read_document(path: &Path) -> Result<Value, UploadError> {
    let contents = std::fs::read_to_string(path)
        .map_err(|source| UploadError::Read { path: path.to_path_buf(), source })?;
    serde_json::from_str(&contents)
        .map_err(|e| UploadError::Parse { path: path.to_path_buf(), message: e.to_string() })
}

/// Records of a bare-array file
pub fn read_records<T: DeserializeOwned>(path: &Path) -> Result<Vec<T>, UploadError> {
    let document = read_document(path)?;
    if !document.is_array() {
        return Err(UploadError::Parse {
            path: path.to_path_buf(),
            message: "expected an array of records".to_string(),
        });
    }
    decode_section(document, path, "records")
}

fn decode_section<T: DeserializeOwned>(
    value: Value,
    path: &Path,
    section: &str,
) -> Result<Vec<T>, UploadError> {
    serde_json::from_value(value).map_err(|e| UploadError::Parse {
        path: path.to_path_buf(),
        message: format!("{section}: {e}"),
    })
}

fn take_section<T: DeserializeOwned>(
    document: &mut Map<String, Value>,
    key: &str,
    path: &Path,
) -> Result<Vec<T>, UploadError> {
    match document.remove(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(value) => decode_section(value, path, key),
    }
}

fn combined_object(document: Value, path: &Path, keys: &str) -> Result<Map<String, Value>, UploadError> {
    match document {
        Value::Object(map) => Ok(map),
        _ => Err(UploadError::Parse {
            path: path.to_path_buf(),
            message: format!("expected an object with {keys}"),
        }),
    }
}

/// Audit/relabel dataset from a combined document and/or separate files
///
/// `input` may be a bare array of individuals or `{indiv, region}`; the
/// separate files replace the corresponding section.
pub fn load_spatial(
    input: Option<&Path>,
    indiv: Option<&Path>,
    region: Option<&Path>,
) -> Result<SpatialUpload, UploadError> {
    let mut upload = SpatialUpload::default();

    if let Some(path) = input {
        match read_document(path)? {
            array @ Value::Array(_) => upload.indiv = decode_section(array, path, "indiv")?,
            document => {
                let mut map = combined_object(document, path, "indiv and region")?;
                upload.indiv = take_section(&mut map, "indiv", path)?;
                upload.region = take_section(&mut map, "region", path)?;
            }
        }
    }
    if let Some(path) = indiv {
        upload.indiv = read_records(path)?;
    }
    if let Some(path) = region {
        upload.region = read_records(path)?;
    }

    debug!(indiv = upload.indiv.len(), region = upload.region.len(), "Spatial dataset loaded");
    Ok(upload)
}

/// Threshold dataset from a combined document and/or separate files
pub fn load_threshold(
    input: Option<&Path>,
    fit: Option<&Path>,
    predict: Option<&Path>,
    predict_region: Option<&Path>,
) -> Result<ThresholdUpload, UploadError> {
    let mut upload = ThresholdUpload::default();

    if let Some(path) = input {
        let mut map = combined_object(
            read_document(path)?,
            path,
            "fit_indiv, predict_indiv and predict_region",
        )?;
        upload.fit_indiv = take_section(&mut map, "fit_indiv", path)?;
        upload.predict_indiv = take_section(&mut map, "predict_indiv", path)?;
        upload.predict_region = take_section(&mut map, "predict_region", path)?;
    }
    if let Some(path) = fit {
        upload.fit_indiv = read_records(path)?;
    }
    if let Some(path) = predict {
        upload.predict_indiv = read_records(path)?;
    }
    if let Some(path) = predict_region {
        upload.predict_region = read_records(path)?;
    }

    debug!(
        fit = upload.fit_indiv.len(),
        predict = upload.predict_indiv.len(),
        regions = upload.predict_region.len(),
        "Threshold dataset loaded"
    );
    Ok(upload)
}
