//! Error types for the bayes-net workspace.
//!
//! Every failure here is a modeling or usage error: deterministic, reported
//! synchronously, and never the result of I/O. Operations that fail leave
//! their inputs untouched.

use thiserror::Error;

/// Result type alias for network operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for variables, factors and networks.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    // Scope construction errors (10-19)
    #[error("factor '{factor}' has no conditioned variables")]
    EmptyScope { factor: String },

    #[error("variable '{variable}' appears more than once in factor '{factor}'")]
    DuplicateVariable { factor: String, variable: String },

    #[error("scope of '{factor}' needs {cells} cells, limit is {limit}")]
    ScopeTooLarge {
        factor: String,
        cells: u128,
        limit: usize,
    },

    // Scope errors (20-29)
    #[error("variable '{variable}' is not in the scope of '{scope}'")]
    Scope { variable: String, scope: String },

    #[error("variable '{variable}' is both queried and observed")]
    OverlappingQuery { variable: String },

    #[error("query must name at least one variable")]
    EmptyQuery,

    // Ordering errors (30-39)
    #[error("factor '{factor}' is conditioned on variables with no producer: {}", missing.join(", "))]
    Ordering {
        factor: String,
        missing: Vec<String>,
    },

    #[error("variable '{variable}' is already produced by node '{producer}'")]
    AlreadyProduced { variable: String, producer: String },

    #[error("network '{0}' has no nodes")]
    EmptyNetwork(String),

    // Divisor errors (40-49)
    #[error("cannot divide '{dividend}' by '{divisor}': {reason}")]
    DivisorShape {
        dividend: String,
        divisor: String,
        reason: String,
    },

    #[error("division of '{dividend}' by zero at assignment {assignment:?}")]
    DivisionByZero {
        dividend: String,
        assignment: Vec<usize>,
    },

    // Operand errors (50-59)
    #[error("variable '{variable}' has cardinality {left} in one operand and {right} in the other")]
    OperandMismatch {
        variable: String,
        left: usize,
        right: usize,
    },

    #[error("invalid CPD for '{factor}': {reason}")]
    InvalidCpd { factor: String, reason: String },

    #[error("factor '{factor}' is not normalized (max deviation {deviation:e})")]
    Unnormalized { factor: String, deviation: f64 },

    // Variable errors (60-69)
    #[error("invalid domain for variable '{variable}': {reason}")]
    InvalidDomain { variable: String, reason: String },

    #[error("variable '{variable}' has no current value")]
    NoValue { variable: String },

    // Configuration errors (70-79)
    #[error("configuration error: {0}")]
    Config(String),
}

impl Error {
    /// Returns the error code for this error type.
    ///
    /// The tens digit identifies the error family.
    pub fn code(&self) -> u32 {
        match self {
            Error::EmptyScope { .. } => 10,
            Error::DuplicateVariable { .. } => 11,
            Error::ScopeTooLarge { .. } => 12,
            Error::Scope { .. } => 20,
            Error::OverlappingQuery { .. } => 21,
            Error::EmptyQuery => 22,
            Error::Ordering { .. } => 30,
            Error::AlreadyProduced { .. } => 31,
            Error::EmptyNetwork(_) => 32,
            Error::DivisorShape { .. } => 40,
            Error::DivisionByZero { .. } => 41,
            Error::OperandMismatch { .. } => 50,
            Error::InvalidCpd { .. } => 51,
            Error::Unnormalized { .. } => 52,
            Error::InvalidDomain { .. } => 60,
            Error::NoValue { .. } => 61,
            Error::Config(_) => 70,
        }
    }

    /// Returns the error family this error belongs to.
    pub fn family(&self) -> ErrorFamily {
        match self.code() / 10 {
            1 => ErrorFamily::EmptyScope,
            2 => ErrorFamily::Scope,
            3 => ErrorFamily::Ordering,
            4 => ErrorFamily::DivisorShape,
            5 => ErrorFamily::OperandType,
            6 => ErrorFamily::Variable,
            _ => ErrorFamily::Config,
        }
    }
}

/// Coarse error classes callers can match on without caring about detail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorFamily {
    EmptyScope,
    Scope,
    Ordering,
    DivisorShape,
    OperandType,
    Variable,
    Config,
}
