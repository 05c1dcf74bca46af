//! Serializable run configuration.
//!
//! A [`RunConfig`] is everything needed to build a cost functional and an
//! optimizer except the oracle. It is format-agnostic; callers pick YAML or
//! JSON.

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::ansatz::{AnsatzSpec, Entangler, RotationScheme};
use crate::error::{VqlsError, VqlsResult};
use crate::gradient::{GradientEstimator, GradientMethod};
use crate::operator::WeightedOperator;
use crate::optimizer::{LearningRateSchedule, OptimizerConfig};

/// A coefficient given either as a real number or as `[re, im]`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CoefficientSpec {
    /// Real coefficient.
    Real(f64),
    /// Complex coefficient as `[re, im]`.
    Complex([f64; 2]),
}

impl From<CoefficientSpec> for Complex64 {
    fn from(spec: CoefficientSpec) -> Self {
        match spec {
            CoefficientSpec::Real(re) => Complex64::new(re, 0.0),
            CoefficientSpec::Complex([re, im]) => Complex64::new(re, im),
        }
    }
}

/// One `{coefficient, label}` entry of the operator list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TermSpec {
    /// Term weight.
    pub coefficient: CoefficientSpec,
    /// Pauli label, one character per qubit.
    pub label: String,
}

/// Gradient settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GradientConfig {
    /// Estimation method.
    #[serde(default)]
    pub method: GradientMethod,
    /// Finite-difference step ε.
    #[serde(default = "default_step")]
    pub step: f64,
    /// Evaluate components on the rayon pool.
    #[serde(default)]
    pub parallel: bool,
}

impl Default for GradientConfig {
    fn default() -> Self {
        Self {
            method: GradientMethod::default(),
            step: default_step(),
            parallel: false,
        }
    }
}

fn default_step() -> f64 {
    GradientEstimator::DEFAULT_STEP
}

fn default_learning_rate() -> f64 {
    OptimizerConfig::default().learning_rate
}

fn default_max_iterations() -> usize {
    OptimizerConfig::default().max_iterations
}

/// Full description of a VQLS run, minus the oracle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunConfig {
    /// Number of qubits.
    pub qubits: usize,
    /// Number of ansatz layers.
    pub layers: usize,
    /// Rotation scheme.
    #[serde(default)]
    pub rotations: RotationScheme,
    /// Entangling pattern.
    #[serde(default)]
    pub entangler: Entangler,
    /// Base learning rate.
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,
    /// Iteration budget.
    #[serde(default = "default_max_iterations")]
    pub max_iterations: usize,
    /// Convergence threshold on `|C(θ)|`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tolerance: Option<f64>,
    /// Starting point. All zeros when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub initial_parameters: Option<Vec<f64>>,
    /// Gradient settings.
    #[serde(default)]
    pub gradient: GradientConfig,
    /// Learning-rate schedule.
    #[serde(default)]
    pub schedule: LearningRateSchedule,
    /// The operator `A` as an ordered term list.
    pub operator: Vec<TermSpec>,
}

impl RunConfig {
    /// Check every field, building the derived objects once.
    pub fn validate(&self) -> VqlsResult<()> {
        let ansatz = self.ansatz()?;
        self.operator()?;
        self.gradient()?;
        self.optimizer_config().validate()?;
        if let Some(initial) = &self.initial_parameters {
            ansatz.check_parameters(initial)?;
            if let Some(bad) = initial.iter().find(|p| !p.is_finite()) {
                return Err(VqlsError::InvalidConfig(format!(
                    "initial parameter {bad} is not finite"
                )));
            }
        }
        Ok(())
    }

    /// Parse the operator list.
    pub fn operator(&self) -> VqlsResult<WeightedOperator> {
        WeightedOperator::parse(
            self.qubits,
            self.operator
                .iter()
                .map(|t| (Complex64::from(t.coefficient), t.label.as_str())),
        )
    }

    /// Build the ansatz description.
    pub fn ansatz(&self) -> VqlsResult<AnsatzSpec> {
        Ok(AnsatzSpec::new(self.qubits, self.layers)?
            .with_rotations(self.rotations)
            .with_entangler(self.entangler))
    }

    /// Build the gradient estimator.
    pub fn gradient(&self) -> VqlsResult<GradientEstimator> {
        let estimator = match self.gradient.method {
            GradientMethod::ParameterShift => GradientEstimator::parameter_shift(),
            method => GradientEstimator::new(method, self.gradient.step)?,
        };
        Ok(estimator.with_parallel(self.gradient.parallel))
    }

    /// The descent-loop settings.
    pub fn optimizer_config(&self) -> OptimizerConfig {
        OptimizerConfig {
            learning_rate: self.learning_rate,
            max_iterations: self.max_iterations,
            tolerance: self.tolerance,
            schedule: self.schedule,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
qubits: 2
layers: 1
tolerance: 1.0e-6
gradient:
  method: central
  step: 1.0e-4
schedule:
  kind: exponential
  gamma: 0.9
operator:
  - { coefficient: 1.0, label: "IZ" }
  - { coefficient: [0.0, 0.5], label: "XY" }
"#;

    #[test]
    fn test_yaml_with_defaults() {
        let config: RunConfig = serde_yaml_ng::from_str(YAML).unwrap();
        assert_eq!(config.qubits, 2);
        assert_eq!(config.rotations, RotationScheme::RyRx);
        assert_eq!(config.entangler, Entangler::CnotChain);
        assert!((config.learning_rate - 0.1).abs() < 1e-15);
        assert_eq!(config.max_iterations, 50);
        assert_eq!(config.gradient.method, GradientMethod::Central);
        assert!(!config.gradient.parallel);
        assert_eq!(
            config.schedule,
            LearningRateSchedule::Exponential { gamma: 0.9 }
        );
        config.validate().unwrap();

        let op = config.operator().unwrap();
        assert_eq!(op.num_terms(), 2);
        assert_eq!(op.terms()[1].coeff, Complex64::new(0.0, 0.5));
    }

    #[test]
    fn test_json_minimal() {
        let config: RunConfig = serde_json::from_str(
            r#"{"qubits":1,"layers":0,"operator":[{"coefficient":2.0,"label":"Z"}]}"#,
        )
        .unwrap();
        assert_eq!(config.gradient, GradientConfig::default());
        assert_eq!(config.schedule, LearningRateSchedule::Constant);
        assert!(config.validate().is_ok());
        assert_eq!(config.ansatz().unwrap().parameter_count(), 0);
    }

    #[test]
    fn test_validate_rejects_bad_fields() {
        let mut config: RunConfig = serde_yaml_ng::from_str(YAML).unwrap();
        config.gradient.step = 0.0;
        assert!(matches!(
            config.validate(),
            Err(VqlsError::InvalidConfig(_))
        ));

        let mut config: RunConfig = serde_yaml_ng::from_str(YAML).unwrap();
        config.operator[0].label = "ZZZ".into();
        assert!(matches!(
            config.validate(),
            Err(VqlsError::MalformedOperator { term: 0, .. })
        ));

        let mut config: RunConfig = serde_yaml_ng::from_str(YAML).unwrap();
        config.initial_parameters = Some(vec![0.0; 3]);
        assert!(matches!(
            config.validate(),
            Err(VqlsError::ParameterCount {
                expected: 4,
                found: 3
            })
        ));
    }

    #[test]
    fn test_parameter_shift_ignores_step() {
        let mut config: RunConfig = serde_yaml_ng::from_str(YAML).unwrap();
        config.gradient.method = GradientMethod::ParameterShift;
        config.gradient.step = 0.0;
        assert!(config.gradient().is_ok());
    }
}
