//! `vqls-core`: variational quantum linear solver core.
//!
//! Finds ansatz parameters θ such that `A|x(θ)⟩ ≈ |b⟩`, where `A` is a
//! complex-weighted sum of Pauli strings, by gradient descent on
//!
//! ```text
//!   C(θ) = ⟨x(θ)|A†A|x(θ)⟩ − 2·Re⟨b|A|b⟩ + 1
//! ```
//!
//! - [`operator`]: Pauli-string algebra with exact phase tracking
//! - [`ansatz`]: layered hardware-efficient ansatz description
//! - [`oracle`]: the expectation-value boundary to simulators and hardware
//! - [`cost`], [`gradient`], [`optimizer`]: the variational loop
//!
//! The crate never prepares quantum states itself. Every expectation value
//! comes from an [`ExpectationOracle`].
//!
//! # Quick start
//!
//! ```rust
//! use num_complex::Complex64;
//! use vqls_core::WeightedOperator;
//!
//! let a = WeightedOperator::parse(
//!     2,
//!     [
//!         (Complex64::new(1.0, 0.0), "IZ"),
//!         (Complex64::new(2.0, 0.0), "ZZ"),
//!         (Complex64::new(-0.5, 0.0), "IZ"),
//!     ],
//! )
//! .unwrap();
//!
//! let merged = a.simplify(1e-12);
//! assert_eq!(merged.num_terms(), 2);
//! assert!(a.is_hermitian(1e-12));
//! ```

pub mod ansatz;
pub mod cancel;
pub mod config;
pub mod cost;
pub mod error;
pub mod gradient;
pub mod operator;
pub mod optimizer;
pub mod oracle;

pub use ansatz::{AnsatzGate, AnsatzSpec, Entangler, RotationScheme};
pub use cancel::CancelToken;
pub use config::{CoefficientSpec, GradientConfig, RunConfig, TermSpec};
pub use cost::{CostBreakdown, CostFunctional};
pub use error::{ErrorKind, OracleError, VqlsError, VqlsResult};
pub use gradient::{GradientEstimator, GradientMethod};
pub use operator::{OperatorTerm, Pauli, PauliString, WeightedOperator};
pub use optimizer::{
    CostSample, LearningRateSchedule, OptimizationReport, Optimizer, OptimizerConfig,
    OptimizerState,
};
pub use oracle::ExpectationOracle;
