//! VQLS cost functional.
//!
//!   C(θ) = ⟨ψ(θ)|A†A|ψ(θ)⟩ − 2·Re⟨b|A|b⟩ + 1
//!
//! The first term is evaluated by the oracle on the trial state; the cross
//! term uses the reference state's own expectation of `A`, and the constant
//! is the reference state's self-overlap. Both states are assumed
//! normalized.
//!
//! The cross term is an approximation of `Re⟨b|A|ψ(θ)⟩`: it is exact only
//! when `A` is Hermitian and the reference preparation commutes with the
//! interference the true overlap would need. Minimizing `C` is therefore not
//! guaranteed to find the least-squares solution of `A|x⟩ = |b⟩` for
//! arbitrary `A`.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::ansatz::AnsatzSpec;
use crate::error::{VqlsError, VqlsResult};
use crate::operator::WeightedOperator;
use crate::oracle::{ExpectationOracle, ensure_finite};

/// Coefficients below this magnitude are dropped when `A†A` is simplified.
const SIMPLIFY_TOLERANCE: f64 = 1e-12;

/// The individual contributions to one cost value.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CostBreakdown {
    /// `⟨ψ(θ)|A†A|ψ(θ)⟩`.
    pub a_dag_a: f64,
    /// `Re⟨b|A|b⟩`.
    pub reference_overlap: f64,
    /// The combined cost.
    pub cost: f64,
}

/// Cost functional bound to one operator, ansatz and oracle.
pub struct CostFunctional<O> {
    oracle: O,
    ansatz: AnsatzSpec,
    operator: WeightedOperator,
    /// `A†A` in canonical form.
    gram: WeightedOperator,
    /// `Re⟨b|A|b⟩`, independent of θ.
    reference_overlap: f64,
}

impl<O: ExpectationOracle> CostFunctional<O> {
    /// Bind `operator` to `ansatz` and `oracle`.
    ///
    /// Builds `A†A` once and queries the reference expectation once.
    /// On a noisy oracle that single estimate is reused by every
    /// evaluation, so its noise stays fixed for the lifetime of the functional.
    pub fn new(oracle: O, ansatz: AnsatzSpec, operator: WeightedOperator) -> VqlsResult<Self> {
        if operator.num_qubits() != ansatz.num_qubits() {
            return Err(VqlsError::OperatorShape {
                expected: ansatz.num_qubits(),
                found: operator.num_qubits(),
            });
        }

        let gram = operator
            .adjoint()
            .multiply(&operator)?
            .simplify(SIMPLIFY_TOLERANCE);
        let reference_overlap = oracle
            .reference_expectation(&operator)
            .and_then(ensure_finite)?;

        debug!(
            oracle = oracle.name(),
            operator_terms = operator.num_terms(),
            gram_terms = gram.num_terms(),
            reference_overlap,
            "built cost functional"
        );

        Ok(Self {
            oracle,
            ansatz,
            operator,
            gram,
            reference_overlap,
        })
    }

    /// Evaluate `C(θ)`.
    pub fn evaluate(&self, params: &[f64]) -> VqlsResult<f64> {
        self.breakdown(params).map(|b| b.cost)
    }

    /// Evaluate `C(θ)` and report its parts.
    pub fn breakdown(&self, params: &[f64]) -> VqlsResult<CostBreakdown> {
        self.ansatz.check_parameters(params)?;

        let a_dag_a = self
            .oracle
            .expectation(&self.ansatz, params, &self.gram)
            .and_then(ensure_finite)?;
        let cost = a_dag_a - 2.0 * self.reference_overlap + 1.0;

        trace!(a_dag_a, cost, "evaluated cost");

        Ok(CostBreakdown {
            a_dag_a,
            reference_overlap: self.reference_overlap,
            cost,
        })
    }

    /// The ansatz the cost is evaluated on.
    pub fn ansatz(&self) -> &AnsatzSpec {
        &self.ansatz
    }

    /// The operator `A`.
    pub fn operator(&self) -> &WeightedOperator {
        &self.operator
    }

    /// The simplified `A†A`.
    pub fn gram_operator(&self) -> &WeightedOperator {
        &self.gram
    }

    /// `Re⟨b|A|b⟩`.
    pub fn reference_overlap(&self) -> f64 {
        self.reference_overlap
    }

    /// The oracle backing this functional.
    pub fn oracle(&self) -> &O {
        &self.oracle
    }

    /// Number of parameters `evaluate` expects.
    pub fn parameter_count(&self) -> usize {
        self.ansatz.parameter_count()
    }
}
