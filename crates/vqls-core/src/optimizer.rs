//! Gradient-descent driver for the VQLS cost.
//!
//! ```text
//!   Initializing ──→ Iterating ──┬──→ Converged   (|C(θ)| < tolerance)
//!        │              ↺        ├──→ Exhausted   (iteration == max_iterations)
//!        │                       └──→ Failed      (any error, incl. cancellation)
//!        └──────────────────────────→ Exhausted / Failed
//! ```
//!
//! Each iteration evaluates `C(θ)`, records a [`CostSample`], checks the
//! tolerance, estimates `∇C(θ)` and commits `θ ← θ − η_k·∇C(θ)`. A failure
//! anywhere before the commit leaves the previous θ in place.

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::cancel::CancelToken;
use crate::cost::CostFunctional;
use crate::error::{VqlsError, VqlsResult};
use crate::gradient::GradientEstimator;
use crate::oracle::ExpectationOracle;

/// Lifecycle of an optimization run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OptimizerState {
    /// Parameters are being set up.
    Initializing,
    /// The descent loop is running.
    Iterating,
    /// The cost dropped below the tolerance.
    Converged,
    /// The iteration budget ran out.
    Exhausted,
    /// An error stopped the run.
    Failed,
}

impl OptimizerState {
    /// Whether the run has stopped.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            OptimizerState::Converged | OptimizerState::Exhausted | OptimizerState::Failed
        )
    }
}

impl std::fmt::Display for OptimizerState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            OptimizerState::Initializing => "initializing",
            OptimizerState::Iterating => "iterating",
            OptimizerState::Converged => "converged",
            OptimizerState::Exhausted => "exhausted",
            OptimizerState::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Step-size schedule `η_k`.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LearningRateSchedule {
    /// `η_k = η`.
    #[default]
    Constant,
    /// `η_k = η / (1 + decay·k)`.
    InverseTime {
        /// Decay rate, `>= 0`.
        decay: f64,
    },
    /// `η_k = η · gammaᵏ`.
    Exponential {
        /// Per-iteration factor, `> 0`.
        gamma: f64,
    },
}

impl LearningRateSchedule {
    /// Step size at iteration `k` for base rate `base`.
    pub fn rate(&self, base: f64, k: usize) -> f64 {
        match *self {
            LearningRateSchedule::Constant => base,
            LearningRateSchedule::InverseTime { decay } => base / (1.0 + decay * k as f64),
            LearningRateSchedule::Exponential { gamma } => {
                base * gamma.powi(i32::try_from(k).unwrap_or(i32::MAX))
            }
        }
    }

    fn validate(&self) -> VqlsResult<()> {
        match *self {
            LearningRateSchedule::Constant => Ok(()),
            LearningRateSchedule::InverseTime { decay } if decay.is_finite() && decay >= 0.0 => {
                Ok(())
            }
            LearningRateSchedule::Exponential { gamma } if gamma.is_finite() && gamma > 0.0 => {
                Ok(())
            }
            other => Err(VqlsError::InvalidConfig(format!(
                "invalid learning-rate schedule {other:?}"
            ))),
        }
    }
}

/// One recorded iteration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CostSample {
    /// Iteration index, starting at 0.
    pub iteration: usize,
    /// Parameters the cost was evaluated at.
    pub parameters: Vec<f64>,
    /// `C(parameters)`.
    pub cost: f64,
}

/// Descent-loop settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct OptimizerConfig {
    /// Base learning rate η.
    pub learning_rate: f64,
    /// Iteration budget.
    pub max_iterations: usize,
    /// Stop once `|C(θ)|` falls below this value.
    pub tolerance: Option<f64>,
    /// Step-size schedule.
    pub schedule: LearningRateSchedule,
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        Self {
            learning_rate: 0.1,
            max_iterations: 50,
            tolerance: None,
            schedule: LearningRateSchedule::Constant,
        }
    }
}

impl OptimizerConfig {
    /// Set the learning rate.
    #[must_use]
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    /// Set the iteration budget.
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: usize) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Enable the convergence check.
    #[must_use]
    pub fn with_tolerance(mut self, tolerance: f64) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Set the step-size schedule.
    #[must_use]
    pub fn with_schedule(mut self, schedule: LearningRateSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Check value ranges.
    pub fn validate(&self) -> VqlsResult<()> {
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(VqlsError::InvalidConfig(format!(
                "learning rate must be finite and > 0, got {}",
                self.learning_rate
            )));
        }
        if let Some(tol) = self.tolerance {
            if !tol.is_finite() || tol <= 0.0 {
                return Err(VqlsError::InvalidConfig(format!(
                    "tolerance must be finite and > 0, got {tol}"
                )));
            }
        }
        self.schedule.validate()
    }
}

/// Outcome of [`Optimizer::run`].
#[derive(Debug)]
pub struct OptimizationReport {
    /// Terminal state.
    pub state: OptimizerState,
    /// Last committed parameter vector.
    pub parameters: Vec<f64>,
    /// One sample per iteration that evaluated its cost.
    pub history: Vec<CostSample>,
    /// Number of committed parameter updates.
    pub iterations: usize,
    /// `C(parameters)`, when it was evaluated.
    ///
    /// Differs from the last sample's cost after an exhausted run, since
    /// that sample was taken before the final update.
    pub final_cost: Option<f64>,
    /// The error that stopped the run, if it failed.
    pub failure: Option<VqlsError>,
}

impl OptimizationReport {
    /// Most recent valid `(θ, C(θ))` pair.
    pub fn last_sample(&self) -> Option<&CostSample> {
        self.history.last()
    }

    /// Lowest-cost sample seen.
    pub fn best(&self) -> Option<&CostSample> {
        self.history.iter().min_by(|a, b| a.cost.total_cmp(&b.cost))
    }

    /// True for `Converged` and `Exhausted`.
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// Gradient-descent optimizer over the ansatz parameters.
///
/// Owns the only mutable copy of θ while a run is active.
pub struct Optimizer<O> {
    cost: CostFunctional<O>,
    gradient: GradientEstimator,
    config: OptimizerConfig,
    state: OptimizerState,
}

impl<O: ExpectationOracle> Optimizer<O> {
    /// Create an optimizer. Fails on an out-of-range configuration.
    pub fn new(
        cost: CostFunctional<O>,
        gradient: GradientEstimator,
        config: OptimizerConfig,
    ) -> VqlsResult<Self> {
        config.validate()?;
        Ok(Self {
            cost,
            gradient,
            config,
            state: OptimizerState::Initializing,
        })
    }

    /// Current state. Terminal after a run.
    pub fn state(&self) -> OptimizerState {
        self.state
    }

    /// The cost functional being minimized.
    pub fn cost_functional(&self) -> &CostFunctional<O> {
        &self.cost
    }

    /// The loop settings.
    pub fn config(&self) -> &OptimizerConfig {
        &self.config
    }

    /// Run from `initial` (all zeros if `None`).
    pub fn run(&mut self, initial: Option<Vec<f64>>, cancel: &CancelToken) -> OptimizationReport {
        self.run_with_observer(initial, cancel, |_| {})
    }

    /// Run from `initial`, calling `observer` with every recorded sample.
    pub fn run_with_observer<F>(
        &mut self,
        initial: Option<Vec<f64>>,
        cancel: &CancelToken,
        mut observer: F,
    ) -> OptimizationReport
    where
        F: FnMut(&CostSample),
    {
        self.state = OptimizerState::Initializing;
        let mut theta = initial.unwrap_or_else(|| vec![0.0; self.cost.parameter_count()]);
        let mut history = Vec::new();
        let mut iterations = 0;

        let outcome = match self.cost.ansatz().check_parameters(&theta) {
            Ok(()) => {
                info!(
                    parameters = theta.len(),
                    learning_rate = self.config.learning_rate,
                    max_iterations = self.config.max_iterations,
                    gradient = %self.gradient.method(),
                    oracle = self.cost.oracle().name(),
                    "starting optimization"
                );
                if self.config.max_iterations > 0 {
                    self.state = OptimizerState::Iterating;
                }
                self.descend(
                    &mut theta,
                    &mut history,
                    &mut iterations,
                    cancel,
                    &mut observer,
                )
            }
            Err(e) => Err(e),
        };

        let (state, final_cost, failure) = match outcome {
            Ok((state, cost)) => (state, Some(cost), None),
            Err(e) => {
                let cost = history
                    .last()
                    .filter(|s| s.parameters == theta)
                    .map(|s| s.cost);
                (OptimizerState::Failed, cost, Some(e))
            }
        };
        self.state = state;

        match &failure {
            None => info!(
                state = %state,
                iterations,
                final_cost,
                "optimization finished"
            ),
            Some(VqlsError::Cancelled) => {
                warn!(iterations, "optimization cancelled; keeping last committed parameters");
            }
            Some(e) => warn!(
                iterations,
                kind = %e.kind(),
                error = %e,
                "optimization failed"
            ),
        }

        OptimizationReport {
            state,
            parameters: theta,
            history,
            iterations,
            final_cost,
            failure,
        }
    }

    fn descend<F>(
        &self,
        theta: &mut Vec<f64>,
        history: &mut Vec<CostSample>,
        iterations: &mut usize,
        cancel: &CancelToken,
        observer: &mut F,
    ) -> VqlsResult<(OptimizerState, f64)>
    where
        F: FnMut(&CostSample),
    {
        while *iterations < self.config.max_iterations {
            let k = *iterations;
            cancel.check()?;

            let cost = self.cost.evaluate(theta)?;
            let sample = CostSample {
                iteration: k,
                parameters: theta.clone(),
                cost,
            };
            observer(&sample);
            history.push(sample);

            if k % 5 == 0 {
                info!(iteration = k, cost, "iteration");
            } else {
                debug!(iteration = k, cost, "iteration");
            }

            if let Some(tol) = self.config.tolerance {
                if cost.abs() < tol {
                    info!(iteration = k, cost, tolerance = tol, "converged");
                    return Ok((OptimizerState::Converged, cost));
                }
            }

            let gradient = self.gradient.estimate(&self.cost, theta, Some(cost), cancel)?;
            let eta = self.config.schedule.rate(self.config.learning_rate, k);

            // Commit point: θ only changes once the whole gradient succeeded.
            for (t, g) in theta.iter_mut().zip(&gradient) {
                *t -= eta * g;
            }
            *iterations += 1;
        }

        // θ moved past the last sample; price the parameters actually returned.
        let cost = self.cost.evaluate(theta)?;
        info!(
            max_iterations = self.config.max_iterations,
            final_cost = cost,
            "iteration budget exhausted"
        );
        Ok((OptimizerState::Exhausted, cost))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schedule_rates() {
        let base = 0.2;
        assert!((LearningRateSchedule::Constant.rate(base, 7) - 0.2).abs() < 1e-15);
        let inv = LearningRateSchedule::InverseTime { decay: 1.0 };
        assert!((inv.rate(base, 0) - 0.2).abs() < 1e-15);
        assert!((inv.rate(base, 1) - 0.1).abs() < 1e-15);
        let exp = LearningRateSchedule::Exponential { gamma: 0.5 };
        assert!((exp.rate(base, 2) - 0.05).abs() < 1e-15);
    }

    #[test]
    fn test_config_defaults() {
        let config = OptimizerConfig::default();
        assert!((config.learning_rate - 0.1).abs() < 1e-15);
        assert_eq!(config.max_iterations, 50);
        assert!(config.tolerance.is_none());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_validation() {
        assert!(
            OptimizerConfig::default()
                .with_learning_rate(0.0)
                .validate()
                .is_err()
        );
        assert!(
            OptimizerConfig::default()
                .with_tolerance(-1.0)
                .validate()
                .is_err()
        );
        assert!(
            OptimizerConfig::default()
                .with_schedule(LearningRateSchedule::Exponential { gamma: 0.0 })
                .validate()
                .is_err()
        );
        assert!(
            OptimizerConfig::default()
                .with_schedule(LearningRateSchedule::InverseTime { decay: 0.5 })
                .validate()
                .is_ok()
        );
    }

    #[test]
    fn test_state_terminality() {
        assert!(!OptimizerState::Initializing.is_terminal());
        assert!(!OptimizerState::Iterating.is_terminal());
        assert!(OptimizerState::Converged.is_terminal());
        assert!(OptimizerState::Exhausted.is_terminal());
        assert!(OptimizerState::Failed.is_terminal());
    }

    #[test]
    fn test_schedule_serde_tagged() {
        let s: LearningRateSchedule =
            serde_json::from_str(r#"{"kind":"inverse_time","decay":0.1}"#).unwrap();
        assert_eq!(s, LearningRateSchedule::InverseTime { decay: 0.1 });
        let c: LearningRateSchedule = serde_json::from_str(r#"{"kind":"constant"}"#).unwrap();
        assert_eq!(c, LearningRateSchedule::Constant);
    }
}
