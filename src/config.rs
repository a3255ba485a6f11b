//! Analysis configuration passed explicitly into every computation.

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Size above which an expensive operation must be confirmed by the caller.
pub const DEFAULT_EXPENSIVE_SIZE: usize = 200;

/// The damping factor commonly used for PageRank.
pub const DEFAULT_DAMPING_FACTOR: f64 = 0.85;

/// Size thresholds guarding long-running operations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Actor count above which matrix inversion, total walks, information centrality and
    /// hierarchical clustering require confirmation.
    pub expensive_size: usize,
    /// The caller has acknowledged the cost and wants expensive operations to run regardless.
    pub confirmed: bool,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            expensive_size: DEFAULT_EXPENSIVE_SIZE,
            confirmed: false,
        }
    }
}

impl Limits {
    /// Returns `ConfirmationRequired` when `size` is above the threshold and the caller hasn't
    /// confirmed.
    pub fn check(&self, operation: &'static str, size: usize) -> Result<()> {
        if size > self.expensive_size && !self.confirmed {
            warn!(operation, size, limit = self.expensive_size, "confirmation required");
            return Err(Error::ConfirmationRequired {
                operation,
                size,
                limit: self.expensive_size,
            });
        }

        Ok(())
    }
}

/// The configuration tuple read by the analysis algorithms.
///
/// # Examples
///
/// ```
/// use sociogram::config::AnalysisConfig;
///
/// let config = AnalysisConfig::new()
///     .with_consider_weights(true)
///     .with_inverse_weights(true);
///
/// assert!(config.consider_weights);
/// assert!(!config.drop_isolates);
/// ```
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Use tie weights instead of treating every tie as 1.
    pub consider_weights: bool,
    /// Treat a weight `w` as the cost `1 / w` when computing distances.
    pub inverse_weights: bool,
    /// Exclude isolated actors from scores and from group-level aggregates.
    pub drop_isolates: bool,
    /// Worker threads used for all-pairs shortest paths. `1` runs on the calling thread.
    pub threads: usize,
    /// PageRank damping factor.
    pub damping_factor: f64,
    /// Iteration cap for the iterative solvers (PageRank, eigenvector).
    pub max_iterations: usize,
    /// Convergence tolerance for the iterative solvers.
    pub tolerance: f64,
    /// Thresholds for expensive operations.
    pub limits: Limits,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            consider_weights: false,
            inverse_weights: false,
            drop_isolates: false,
            threads: 1,
            damping_factor: DEFAULT_DAMPING_FACTOR,
            max_iterations: 500,
            tolerance: 1e-10,
            limits: Limits::default(),
        }
    }
}

impl AnalysisConfig {
    /// Creates a configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    pub const fn with_consider_weights(mut self, consider_weights: bool) -> Self {
        self.consider_weights = consider_weights;
        self
    }

    pub const fn with_inverse_weights(mut self, inverse_weights: bool) -> Self {
        self.inverse_weights = inverse_weights;
        self
    }

    pub const fn with_drop_isolates(mut self, drop_isolates: bool) -> Self {
        self.drop_isolates = drop_isolates;
        self
    }

    /// Sets the number of worker threads, clamped to at least one.
    pub fn with_threads(mut self, threads: usize) -> Self {
        self.threads = threads.max(1);
        self
    }

    pub const fn with_damping_factor(mut self, damping_factor: f64) -> Self {
        self.damping_factor = damping_factor;
        self
    }

    pub const fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    pub const fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    pub const fn with_expensive_size(mut self, expensive_size: usize) -> Self {
        self.limits.expensive_size = expensive_size;
        self
    }

    /// Acknowledges the cost of expensive operations so that they run on large graphs.
    pub const fn confirmed(mut self) -> Self {
        self.limits.confirmed = true;
        self
    }

    /// Validates the solver settings. Every fallible analysis entry point calls this first.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..1.0).contains(&self.damping_factor) {
            return Err(Error::invalid(format!(
                "damping factor {} outside [0, 1)",
                self.damping_factor
            )));
        }

        if self.tolerance <= 0.0 || self.tolerance.is_nan() {
            return Err(Error::invalid("tolerance must be positive"));
        }

        if self.max_iterations == 0 {
            return Err(Error::invalid("max_iterations must be positive"));
        }

        Ok(())
    }
}
