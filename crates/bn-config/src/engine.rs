//! Engine configuration.
//!
//! An [`EngineConfig`] bounds the dense tables a network may build and sets
//! the tolerance used when checking that installed CPDs are normalized.
//! Every field has a default, so a partial JSON document is valid input.

use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default absolute tolerance for normalization checks.
pub const DEFAULT_TOLERANCE: f64 = 1e-9;

/// Default cap on the cells of a full joint table (16M `f64`s, 128 MiB).
pub const DEFAULT_MAX_FACTOR_CELLS: usize = 1 << 24;

/// Configuration for a network and its factor operations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct EngineConfig {
    /// Largest allowed distance from 1.0 for a conditioned slice sum.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,

    /// Largest joint table, in cells, that `Net::joint` will materialize.
    #[serde(default = "default_max_factor_cells")]
    pub max_factor_cells: usize,

    /// Reject factors whose CPD is not normalized when they join a network.
    #[serde(default = "default_strict_cpd")]
    pub strict_cpd: bool,
}

fn default_tolerance() -> f64 {
    DEFAULT_TOLERANCE
}

fn default_max_factor_cells() -> usize {
    DEFAULT_MAX_FACTOR_CELLS
}

fn default_strict_cpd() -> bool {
    true
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tolerance: DEFAULT_TOLERANCE,
            max_factor_cells: DEFAULT_MAX_FACTOR_CELLS,
            strict_cpd: true,
        }
    }
}

/// Errors from loading or validating a configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("tolerance must be finite and in [0.0, 1.0), got {0}")]
    InvalidTolerance(f64),

    #[error("max_factor_cells must be positive")]
    ZeroCellLimit,
}

impl EngineConfig {
    /// Set a custom tolerance.
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = tolerance;
        self
    }

    /// Set a custom joint-table cell limit.
    pub fn with_max_factor_cells(mut self, cells: usize) -> Self {
        self.max_factor_cells = cells;
        self
    }

    /// Accept unnormalized CPDs when nodes are added.
    pub fn lenient(mut self) -> Self {
        self.strict_cpd = false;
        self
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: EngineConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON configuration file.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_json_str(&content)
    }

    /// Serialize to pretty JSON.
    pub fn to_json(&self) -> Result<String, ConfigError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check semantic constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.tolerance.is_finite() || !(0.0..1.0).contains(&self.tolerance) {
            return Err(ConfigError::InvalidTolerance(self.tolerance));
        }
        if self.max_factor_cells == 0 {
            return Err(ConfigError::ZeroCellLimit);
        }
        Ok(())
    }
}
