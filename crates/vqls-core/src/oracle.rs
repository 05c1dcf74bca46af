//! Expectation-value oracle interface.
//!
//! The oracle is the only boundary between the optimization core and state
//! preparation. Simulators and hardware clients implement
//! [`ExpectationOracle`]; the core never looks behind it.
//!
//! # Contract
//!
//! - `expectation()` MUST return `Re⟨ψ(θ)|O|ψ(θ)⟩` for the state prepared by
//!   `ansatz` with parameters `θ`.
//! - `reference_expectation()` MUST return `Re⟨b|O|b⟩` for the fixed
//!   reference preparation that encodes `|b⟩`.
//! - Identical inputs SHOULD give identical outputs. Noisy backends are
//!   allowed; non-finite values are rejected by the core.
//! - Implementations MUST be safe to call from several threads at once with
//!   shared, read-only operators.

use crate::ansatz::AnsatzSpec;
use crate::error::OracleError;
use crate::operator::WeightedOperator;

/// Black-box evaluator of operator expectation values.
pub trait ExpectationOracle: Send + Sync {
    /// Name of this oracle, for logs and reports.
    fn name(&self) -> &str;

    /// `Re⟨ψ(θ)|operator|ψ(θ)⟩` for the state prepared by `ansatz(params)`.
    fn expectation(
        &self,
        ansatz: &AnsatzSpec,
        params: &[f64],
        operator: &WeightedOperator,
    ) -> Result<f64, OracleError>;

    /// `Re⟨b|operator|b⟩` for the reference state.
    fn reference_expectation(&self, operator: &WeightedOperator) -> Result<f64, OracleError>;
}

impl<T: ExpectationOracle + ?Sized> ExpectationOracle for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn expectation(
        &self,
        ansatz: &AnsatzSpec,
        params: &[f64],
        operator: &WeightedOperator,
    ) -> Result<f64, OracleError> {
        (**self).expectation(ansatz, params, operator)
    }

    fn reference_expectation(&self, operator: &WeightedOperator) -> Result<f64, OracleError> {
        (**self).reference_expectation(operator)
    }
}

impl<T: ExpectationOracle + ?Sized> ExpectationOracle for std::sync::Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn expectation(
        &self,
        ansatz: &AnsatzSpec,
        params: &[f64],
        operator: &WeightedOperator,
    ) -> Result<f64, OracleError> {
        (**self).expectation(ansatz, params, operator)
    }

    fn reference_expectation(&self, operator: &WeightedOperator) -> Result<f64, OracleError> {
        (**self).reference_expectation(operator)
    }
}

/// Reject NaN and infinities coming back from an oracle.
pub(crate) fn ensure_finite(value: f64) -> Result<f64, OracleError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(OracleError::NonFinite(value))
    }
}
