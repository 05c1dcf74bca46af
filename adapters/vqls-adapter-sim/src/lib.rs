//! Local statevector oracle for `vqls-core`.
//!
//! Prepares the ansatz state exactly and evaluates weighted Pauli operators
//! against it. Useful for testing the variational loop and for small
//! problems; memory grows as `2^n`.
//!
//! | Qubits | Memory |
//! |--------|--------|
//! | 10 | ~16 KB |
//! | 15 | ~512 KB |
//! | 20 | ~16 MB |
//!
//! # Example
//!
//! ```rust
//! use num_complex::Complex64;
//! use vqls_adapter_sim::StatevectorOracle;
//! use vqls_core::{AnsatzSpec, CostFunctional, WeightedOperator};
//!
//! let ansatz = AnsatzSpec::new(2, 0).unwrap();
//! let a = WeightedOperator::parse(2, [(Complex64::new(1.0, 0.0), "II")]).unwrap();
//! let cost = CostFunctional::new(StatevectorOracle::new(), ansatz, a).unwrap();
//! assert!(cost.evaluate(&[]).unwrap().abs() < 1e-12);
//! ```

mod oracle;
mod statevector;

pub use oracle::{ReferenceState, ShotNoise, SimulatorConfig, StatevectorOracle};
pub use statevector::Statevector;
