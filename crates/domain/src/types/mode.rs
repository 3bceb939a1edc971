//! Operation modes
//!
//! A closed set: every mode owns exactly one request/response contract pair
//! and one endpoint path.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
#[cfg(feature = "ts-gen")]
use ts_rs::TS;

use crate::constants::{
    AUDIT_PATH, CORRELATION_PATH, FEATURE_IMPORTANCE_PATH, RELABEL_PATH, THRESHOLD_PATH,
};
use crate::errors::SpatialBiasError;

/// Analysis or mitigation operation selected by the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "ts-gen", derive(TS))]
#[cfg_attr(feature = "ts-gen", ts(export))]
#[serde(rename_all = "kebab-case")]
pub enum OperationMode {
    Audit,
    Relabel,
    ThresholdAdjust,
    Correlation,
    FeatureImportance,
}

impl OperationMode {
    /// Every mode, in display order
    pub const ALL: [Self; 5] =
        [Self::Audit, Self::Relabel, Self::ThresholdAdjust, Self::Correlation, Self::FeatureImportance];

    /// Fixed endpoint path for this mode
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Audit => AUDIT_PATH,
            Self::Relabel => RELABEL_PATH,
            Self::ThresholdAdjust => THRESHOLD_PATH,
            Self::Correlation => CORRELATION_PATH,
            Self::FeatureImportance => FEATURE_IMPORTANCE_PATH,
        }
    }

    /// Stable identifier used in logs and on the command line
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Audit => "audit",
            Self::Relabel => "relabel",
            Self::ThresholdAdjust => "threshold-adjust",
            Self::Correlation => "correlation",
            Self::FeatureImportance => "feature-importance",
        }
    }

    /// Whether the mode is one of the spatial bias operations (as opposed to
    /// the ancillary dataset analyses)
    #[must_use]
    pub const fn is_spatial(self) -> bool {
        matches!(self, Self::Audit | Self::Relabel | Self::ThresholdAdjust)
    }
}

impl fmt::Display for OperationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OperationMode {
    type Err = SpatialBiasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "audit" => Ok(Self::Audit),
            "relabel" => Ok(Self::Relabel),
            "threshold" | "threshold-adjust" => Ok(Self::ThresholdAdjust),
            "correlation" => Ok(Self::Correlation),
            "feature-importance" => Ok(Self::FeatureImportance),
            other => Err(SpatialBiasError::InvalidInput(format!("unknown operation mode '{other}'"))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        assert_eq!(OperationMode::Audit.endpoint(), "/api/spatial-bias/audit");
        assert_eq!(OperationMode::Relabel.endpoint(), "/api/spatial-bias/mitigate/relabel");
        assert_eq!(OperationMode::ThresholdAdjust.endpoint(), "/api/spatial-bias/mitigate/threshold");
        assert_eq!(OperationMode::Correlation.endpoint(), "/api/correlations/analyze");
        assert_eq!(OperationMode::FeatureImportance.endpoint(), "/api/feature-importance/analyze");
    }

    #[test]
    fn parses_names_and_threshold_alias() {
        for mode in OperationMode::ALL {
            assert_eq!(mode.as_str().parse::<OperationMode>().unwrap(), mode);
        }
        assert_eq!("threshold".parse::<OperationMode>().unwrap(), OperationMode::ThresholdAdjust);
        assert!("mitigate".parse::<OperationMode>().is_err());
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&OperationMode::FeatureImportance).unwrap();
        assert_eq!(json, "\"feature-importance\"");
    }
}
