//! Error types for the VQLS core.

use thiserror::Error;

/// Failures reported by an [`ExpectationOracle`](crate::oracle::ExpectationOracle).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum OracleError {
    /// The execution backend failed.
    #[error("Backend error: {0}")]
    Backend(String),

    /// The backend returned NaN or an infinity.
    #[error("Oracle returned a non-finite value: {0}")]
    NonFinite(f64),

    /// The ansatz needs more qubits than the backend supports.
    #[error("Ansatz needs {requested} qubits but the backend supports at most {max}")]
    TooManyQubits {
        /// Qubits requested by the ansatz.
        requested: usize,
        /// Backend limit.
        max: usize,
    },

    /// The parameter vector does not fit the ansatz.
    #[error("Ansatz expects {expected} parameters, got {found}")]
    ParameterCount {
        /// Parameters the ansatz consumes.
        expected: usize,
        /// Parameters supplied.
        found: usize,
    },

    /// The backend cannot evaluate the request.
    #[error("Unsupported by backend: {0}")]
    Unsupported(String),
}

/// Errors produced by the VQLS core.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum VqlsError {
    /// The operator input could not be parsed.
    #[error("Malformed operator (term {term}): {reason}")]
    MalformedOperator {
        /// Index of the offending term in the input list.
        term: usize,
        /// What was wrong with it.
        reason: String,
    },

    /// Operator and ansatz (or two operators) act on different qubit counts.
    #[error("Operator shape mismatch: expected {expected} qubits, found {found}")]
    OperatorShape {
        /// Qubit count required by the other side.
        expected: usize,
        /// Qubit count of the operator.
        found: usize,
    },

    /// An oracle call failed.
    #[error("Oracle evaluation failed: {0}")]
    OracleEvaluation(#[from] OracleError),

    /// A configuration value is out of range.
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// A parameter vector has the wrong length.
    #[error("Expected {expected} ansatz parameters, got {found}")]
    ParameterCount {
        /// Parameters the ansatz consumes.
        expected: usize,
        /// Parameters supplied.
        found: usize,
    },

    /// The run was cancelled before the current iteration committed.
    #[error("Optimization cancelled")]
    Cancelled,
}

impl VqlsError {
    /// Coarse classification used in run reports.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedOperator { .. } => ErrorKind::MalformedOperator,
            Self::OperatorShape { .. } => ErrorKind::OperatorShape,
            Self::OracleEvaluation(_) => ErrorKind::OracleEvaluation,
            Self::InvalidConfig(_) | Self::ParameterCount { .. } => ErrorKind::Configuration,
            Self::Cancelled => ErrorKind::Cancelled,
        }
    }

    pub(crate) fn malformed(term: usize, reason: impl Into<String>) -> Self {
        Self::MalformedOperator {
            term,
            reason: reason.into(),
        }
    }
}

/// Failure categories surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Bad operator input.
    MalformedOperator,
    /// Dimension mismatch.
    OperatorShape,
    /// Execution failure.
    OracleEvaluation,
    /// Bad configuration.
    Configuration,
    /// Cancelled by the caller.
    Cancelled,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::MalformedOperator => "malformed-operator",
            Self::OperatorShape => "operator-shape",
            Self::OracleEvaluation => "oracle-evaluation",
            Self::Configuration => "configuration",
            Self::Cancelled => "cancelled",
        };
        f.write_str(name)
    }
}

/// Result type for VQLS operations.
pub type VqlsResult<T> = Result<T, VqlsError>;
