//! # CLI
//!
//! Command-line interface of `spatialbias`, defined with `clap`.
//!
//! Dataset files are JSON: either a bare array of records or a combined
//! document (`{indiv, region}` for audit and relabel,
//! `{fit_indiv, predict_indiv, predict_region}` for threshold adjustment).
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use spatialbias_domain::{AdvancedParams, OperationMode};

#[derive(Debug, Parser)]
#[command(name = "spatialbias", version, about = "Spatial fairness audit client")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Validate a dataset and send it to the audit service
    ///
    /// ## Examples:
    ///
    /// ```bash
    /// spatialbias run audit --indiv people.json --region regions.json --n-worlds 200
    /// spatialbias run threshold --input threshold.json --output result.json
    /// ```
    Run(RunArgs),

    /// Print the default advanced parameters of a mode
    Defaults {
        /// audit, relabel, threshold, correlation or feature-importance
        mode: OperationMode,
    },

    /// Show the current session
    Status,

    /// End the session and remove the stored tokens
    Logout,
}

#[derive(Debug, Clone, Args)]
pub struct RunArgs {
    /// audit, relabel, threshold, correlation or feature-importance
    pub mode: OperationMode,

    /// Combined dataset document
    #[arg(long)]
    pub input: Option<PathBuf>,

    /// Individuals (audit, relabel)
    #[arg(long)]
    pub indiv: Option<PathBuf>,

    /// Regions (audit, relabel)
    #[arg(long)]
    pub region: Option<PathBuf>,

    /// Individuals with probabilities used to fit thresholds
    #[arg(long)]
    pub fit: Option<PathBuf>,

    /// Individuals with probabilities to adjust
    #[arg(long)]
    pub predict: Option<PathBuf>,

    /// Regions of the individuals to adjust
    #[arg(long)]
    pub predict_region: Option<PathBuf>,

    #[command(flatten)]
    pub advanced: AdvancedArgs,

    /// Include Pearson correlations (correlation mode)
    #[arg(long)]
    pub pearson: Option<bool>,

    /// Include Spearman correlations (correlation mode)
    #[arg(long)]
    pub spearman: Option<bool>,

    /// Write the result here instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Advanced options; unset ones take the service defaults
#[derive(Debug, Clone, Default, Args)]
pub struct AdvancedArgs {
    #[arg(long)]
    pub equal_opp: Option<bool>,
    #[arg(long)]
    pub signif_level: Option<f64>,
    #[arg(long)]
    pub n_worlds: Option<i64>,
    #[arg(long)]
    pub budget_constr: Option<f64>,
    #[arg(long)]
    pub pr_constr: Option<f64>,
    #[arg(long)]
    pub approx: Option<bool>,
    #[arg(long)]
    pub work_limit: Option<i64>,
    #[arg(long)]
    pub default_boundary: Option<f64>,
}

impl From<&AdvancedArgs> for AdvancedParams {
    fn from(args: &AdvancedArgs) -> Self {
        Self {
            equal_opp: args.equal_opp,
            signif_level: args.signif_level,
            n_worlds: args.n_worlds,
            budget_constr: args.budget_constr,
            pr_constr: args.pr_constr,
            approx: args.approx,
            work_limit: args.work_limit,
            default_boundary: args.default_boundary,
        }
    }
}
