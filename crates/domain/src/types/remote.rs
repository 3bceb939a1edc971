//! Remote validation issues
//!
//! Shape of the service's HTTP 422 body:
//! `{"detail": [{"loc": ["body", "indiv_info", 0, "y_pred"], "msg": "...", "type": "..."}]}`.

use std::fmt;

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

/// One segment of an issue location
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[serde(untagged)]
pub enum LocSegment {
    Index(i64),
    Key(String),
}

impl fmt::Display for LocSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(k) => f.write_str(k),
        }
    }
}

/// One field-level complaint from the service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct RemoteIssue {
    pub loc: Vec<LocSegment>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

/// Body of an HTTP 422 response
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
pub struct HttpValidationError {
    #[serde(default)]
    pub detail: Vec<RemoteIssue>,
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_mixed_location_segments() {
        let body: HttpValidationError = serde_json::from_value(json!({
            "detail": [{
                "loc": ["body", "indiv_info", 0, "y_pred"],
                "msg": "ensure this value is >= 0",
                "type": "value_error"
            }]
        }))
        .unwrap();

        let issue = &body.detail[0];
        assert_eq!(issue.loc[2], LocSegment::Index(0));
        assert_eq!(issue.loc[3], LocSegment::Key("y_pred".into()));
        assert_eq!(issue.kind, "value_error");
    }

    #[test]
    fn missing_detail_is_empty() {
        let body: HttpValidationError = serde_json::from_value(json!({})).unwrap();
        assert!(body.detail.is_empty());
    }
}
