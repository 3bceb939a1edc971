//! Application constants
//!
//! Endpoint paths, default advanced parameters and authentication timings.

// Endpoint paths (fixed per operation mode)
pub const AUDIT_PATH: &str = "/api/spatial-bias/audit";
pub const RELABEL_PATH: &str = "/api/spatial-bias/mitigate/relabel";
pub const THRESHOLD_PATH: &str = "/api/spatial-bias/mitigate/threshold";
pub const CORRELATION_PATH: &str = "/api/correlations/analyze";
pub const FEATURE_IMPORTANCE_PATH: &str = "/api/feature-importance/analyze";

// Advanced parameter defaults
pub const DEFAULT_EQUAL_OPP: bool = true;
pub const DEFAULT_SIGNIF_LEVEL: f64 = 0.005;
pub const DEFAULT_N_WORLDS: i64 = 400;
pub const MIN_N_WORLDS: i64 = 1;
pub const MAX_N_WORLDS: i64 = 100_000;
pub const DEFAULT_APPROX: bool = true;
pub const DEFAULT_BUDGET_CONSTR: f64 = 0.2;
pub const DEFAULT_PR_CONSTR: f64 = 0.1;
pub const DEFAULT_WORK_LIMIT: i64 = 30;
pub const DEFAULT_BOUNDARY: f64 = 0.5;

// Authentication timings
pub const DEFAULT_MIN_TOKEN_VALIDITY_SECS: i64 = 30;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 2;
pub const DEFAULT_API_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8000";
