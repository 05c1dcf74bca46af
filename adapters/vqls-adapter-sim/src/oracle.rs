//! Statevector-backed [`ExpectationOracle`].

use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicUsize, Ordering};

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHasher;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, trace};
use vqls_core::{AnsatzSpec, ExpectationOracle, OracleError, WeightedOperator};

use crate::statevector::Statevector;

/// State used for `⟨b|A|b⟩`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceState {
    /// `|0…0⟩`.
    #[default]
    Zero,
    /// `|+…+⟩`.
    Plus,
    /// Computational basis state `|k⟩`.
    Basis(usize),
}

/// Reproducible additive noise emulating finite-shot estimates.
///
/// Each expectation is shifted by a value in `[−amplitude, amplitude]`
/// drawn from an RNG seeded by `seed` and the call's inputs, so identical
/// calls stay identical.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ShotNoise {
    /// Maximum absolute shift.
    pub amplitude: f64,
    /// Base seed.
    #[serde(default)]
    pub seed: u64,
}

fn default_max_qubits() -> usize {
    20
}

/// Simulator settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SimulatorConfig {
    /// Largest ansatz accepted.
    #[serde(default = "default_max_qubits")]
    pub max_qubits: usize,
    /// Reference state preparation: `zero`, `plus` or `{ basis: k }`.
    #[serde(default, with = "serde_yaml_ng::with::singleton_map")]
    pub reference: ReferenceState,
    /// Optional shot noise.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub noise: Option<ShotNoise>,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self {
            max_qubits: default_max_qubits(),
            reference: ReferenceState::Zero,
            noise: None,
        }
    }
}

/// Exact statevector oracle, with optional deterministic noise.
///
/// Stateless apart from an evaluation counter, so one instance can serve
/// concurrent gradient evaluations.
#[derive(Debug, Default)]
pub struct StatevectorOracle {
    config: SimulatorConfig,
    evaluations: AtomicUsize,
}

impl StatevectorOracle {
    /// Noise-free oracle with a `|0…0⟩` reference and a 20-qubit limit.
    pub fn new() -> Self {
        Self::default()
    }

    /// Oracle with explicit settings.
    pub fn with_config(config: SimulatorConfig) -> Result<Self, OracleError> {
        if let Some(noise) = config.noise {
            if !noise.amplitude.is_finite() || noise.amplitude < 0.0 {
                return Err(OracleError::Unsupported(format!(
                    "noise amplitude must be finite and >= 0, got {}",
                    noise.amplitude
                )));
            }
        }
        Ok(Self {
            config,
            evaluations: AtomicUsize::new(0),
        })
    }

    /// Set the qubit limit.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: usize) -> Self {
        self.config.max_qubits = max_qubits;
        self
    }

    /// Set the reference state.
    #[must_use]
    pub fn with_reference(mut self, reference: ReferenceState) -> Self {
        self.config.reference = reference;
        self
    }

    /// Current settings.
    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Number of `expectation` calls served so far.
    pub fn evaluations(&self) -> usize {
        self.evaluations.load(Ordering::Relaxed)
    }

    fn check_qubits(&self, num_qubits: usize) -> Result<(), OracleError> {
        if num_qubits > self.config.max_qubits {
            return Err(OracleError::TooManyQubits {
                requested: num_qubits,
                max: self.config.max_qubits,
            });
        }
        Ok(())
    }

    fn reference_state(&self, num_qubits: usize) -> Result<Statevector, OracleError> {
        match self.config.reference {
            ReferenceState::Zero => Ok(Statevector::new(num_qubits)),
            ReferenceState::Plus => Ok(Statevector::plus(num_qubits)),
            ReferenceState::Basis(k) if k < (1usize << num_qubits) => {
                Ok(Statevector::basis(num_qubits, k))
            }
            ReferenceState::Basis(k) => Err(OracleError::Unsupported(format!(
                "basis state {k} does not exist on {num_qubits} qubits"
            ))),
        }
    }

    /// Add the configured noise, seeded by `params` and `operator`.
    fn perturb(&self, value: f64, params: &[f64], operator: &WeightedOperator) -> f64 {
        let Some(noise) = self.config.noise else {
            return value;
        };
        if noise.amplitude == 0.0 {
            return value;
        }

        let mut hasher = FxHasher::default();
        noise.seed.hash(&mut hasher);
        for p in params {
            p.to_bits().hash(&mut hasher);
        }
        for term in operator.terms() {
            term.pauli.hash(&mut hasher);
            term.coeff.re.to_bits().hash(&mut hasher);
            term.coeff.im.to_bits().hash(&mut hasher);
        }

        let mut rng = StdRng::seed_from_u64(hasher.finish());
        value + rng.gen_range(-noise.amplitude..=noise.amplitude)
    }
}

impl ExpectationOracle for StatevectorOracle {
    fn name(&self) -> &str {
        if self.config.noise.is_some() {
            "statevector+noise"
        } else {
            "statevector"
        }
    }

    #[instrument(level = "trace", skip_all, fields(qubits = ansatz.num_qubits(), terms = operator.num_terms()))]
    fn expectation(
        &self,
        ansatz: &AnsatzSpec,
        params: &[f64],
        operator: &WeightedOperator,
    ) -> Result<f64, OracleError> {
        self.check_qubits(ansatz.num_qubits())?;
        if operator.num_qubits() != ansatz.num_qubits() {
            return Err(OracleError::Unsupported(format!(
                "operator acts on {} qubits but the ansatz prepares {}",
                operator.num_qubits(),
                ansatz.num_qubits()
            )));
        }
        let expected = ansatz.parameter_count();
        if params.len() != expected {
            return Err(OracleError::ParameterCount {
                expected,
                found: params.len(),
            });
        }

        self.evaluations.fetch_add(1, Ordering::Relaxed);
        let sv = Statevector::prepare(ansatz, params);
        let value = self.perturb(sv.expectation(operator), params, operator);
        trace!(value, "expectation");
        Ok(value)
    }

    fn reference_expectation(&self, operator: &WeightedOperator) -> Result<f64, OracleError> {
        self.check_qubits(operator.num_qubits())?;
        let sv = self.reference_state(operator.num_qubits())?;
        let value = self.perturb(sv.expectation(operator), &[], operator);
        debug!(reference = ?self.config.reference, value, "reference expectation");
        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex64;

    fn op(n: usize, terms: &[(f64, &str)]) -> WeightedOperator {
        WeightedOperator::parse(n, terms.iter().map(|(c, l)| (Complex64::new(*c, 0.0), *l)))
            .unwrap()
    }

    #[test]
    fn test_reference_states() {
        let a = op(2, &[(1.0, "ZZ"), (0.5, "XX")]);

        let zero = StatevectorOracle::new();
        assert!((zero.reference_expectation(&a).unwrap() - 1.0).abs() < 1e-12);

        let plus = StatevectorOracle::new().with_reference(ReferenceState::Plus);
        assert!((plus.reference_expectation(&a).unwrap() - 0.5).abs() < 1e-12);

        let basis = StatevectorOracle::new().with_reference(ReferenceState::Basis(0b01));
        assert!((basis.reference_expectation(&a).unwrap() + 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_basis_out_of_range() {
        let oracle = StatevectorOracle::new().with_reference(ReferenceState::Basis(4));
        assert!(matches!(
            oracle.reference_expectation(&op(2, &[(1.0, "ZZ")])),
            Err(OracleError::Unsupported(_))
        ));
    }

    #[test]
    fn test_too_many_qubits() {
        let oracle = StatevectorOracle::new().with_max_qubits(2);
        let ansatz = AnsatzSpec::new(3, 0).unwrap();
        let result = oracle.expectation(&ansatz, &[], &op(3, &[(1.0, "ZZZ")]));
        assert!(matches!(
            result,
            Err(OracleError::TooManyQubits {
                requested: 3,
                max: 2
            })
        ));
        assert_eq!(oracle.evaluations(), 0);
    }

    #[test]
    fn test_parameter_count_checked() {
        let oracle = StatevectorOracle::new();
        let ansatz = AnsatzSpec::new(1, 1).unwrap();
        assert!(matches!(
            oracle.expectation(&ansatz, &[0.1], &op(1, &[(1.0, "Z")])),
            Err(OracleError::ParameterCount {
                expected: 2,
                found: 1
            })
        ));
    }

    #[test]
    fn test_noise_is_deterministic_and_bounded() {
        let config = SimulatorConfig {
            noise: Some(ShotNoise {
                amplitude: 0.05,
                seed: 7,
            }),
            ..SimulatorConfig::default()
        };
        let oracle = StatevectorOracle::with_config(config).unwrap();
        let ansatz = AnsatzSpec::new(1, 1).unwrap();
        let a = op(1, &[(1.0, "Z")]);

        let first = oracle.expectation(&ansatz, &[0.3, 0.2], &a).unwrap();
        let second = oracle.expectation(&ansatz, &[0.3, 0.2], &a).unwrap();
        assert_eq!(first.to_bits(), second.to_bits());

        let exact = StatevectorOracle::new()
            .expectation(&ansatz, &[0.3, 0.2], &a)
            .unwrap();
        assert!((first - exact).abs() <= 0.05);
        assert_eq!(oracle.evaluations(), 2);
    }

    #[test]
    fn test_negative_noise_rejected() {
        let config = SimulatorConfig {
            noise: Some(ShotNoise {
                amplitude: -1.0,
                seed: 0,
            }),
            ..SimulatorConfig::default()
        };
        assert!(StatevectorOracle::with_config(config).is_err());
    }

    #[test]
    fn test_config_yaml() {
        let config: SimulatorConfig =
            serde_yaml_ng::from_str("reference: { basis: 3 }\nnoise: { amplitude: 0.01 }\n")
                .unwrap();
        assert_eq!(config.max_qubits, 20);
        assert_eq!(config.reference, ReferenceState::Basis(3));
        assert_eq!(config.noise.map(|n| n.seed), Some(0));

        let plus: SimulatorConfig = serde_yaml_ng::from_str("reference: plus").unwrap();
        assert_eq!(plus.reference, ReferenceState::Plus);
    }

    #[test]
    fn test_reference_map_form_in_json() {
        let config: SimulatorConfig =
            serde_json::from_str(r#"{"reference":{"basis":2},"max_qubits":4}"#).unwrap();
        assert_eq!(config.reference, ReferenceState::Basis(2));

        let json = serde_json::to_value(config).unwrap();
        assert_eq!(json["reference"], serde_json::json!({ "basis": 2 }));

        let yaml = serde_yaml_ng::to_string(&config).unwrap();
        let back: SimulatorConfig = serde_yaml_ng::from_str(&yaml).unwrap();
        assert_eq!(back, config);
    }
}
