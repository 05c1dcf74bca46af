//! Gradient estimation for the cost functional.
//!
//! Three strategies share one interface:
//!
//! | Method | Estimate of ∂C/∂θᵢ | Cost evaluations |
//! |--------|--------------------|------------------|
//! | `Forward` | `(C(θ+εeᵢ) − C(θ)) / ε` | `p` (+1 without a known base cost) |
//! | `Central` | `(C(θ+εeᵢ) − C(θ−εeᵢ)) / 2ε` | `2p` |
//! | `ParameterShift` | `(C(θ+π/2·eᵢ) − C(θ−π/2·eᵢ)) / 2` | `2p` |
//!
//! Parameter shift is exact for the Pauli-rotation ansätze in
//! [`crate::ansatz`], since every parameter drives exactly one `Ry`/`Rx`.
//!
//! The per-parameter evaluations are independent. With `parallel` set they
//! run on the rayon pool and share the cost functional read-only.

use std::f64::consts::FRAC_PI_2;

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cancel::CancelToken;
use crate::cost::CostFunctional;
use crate::error::{VqlsError, VqlsResult};
use crate::oracle::{ExpectationOracle, ensure_finite};

/// How partial derivatives are estimated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GradientMethod {
    /// Forward finite difference.
    #[default]
    Forward,
    /// Central finite difference.
    Central,
    /// Analytic parameter-shift rule.
    ParameterShift,
}

impl std::fmt::Display for GradientMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            GradientMethod::Forward => "forward",
            GradientMethod::Central => "central",
            GradientMethod::ParameterShift => "parameter-shift",
        };
        f.write_str(name)
    }
}

/// Gradient estimator configuration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientEstimator {
    method: GradientMethod,
    step: f64,
    parallel: bool,
}

impl GradientEstimator {
    /// Default finite-difference step ε.
    pub const DEFAULT_STEP: f64 = 1e-3;

    /// Create an estimator. `step` must be finite and strictly positive.
    pub fn new(method: GradientMethod, step: f64) -> VqlsResult<Self> {
        if !step.is_finite() || step <= 0.0 {
            return Err(VqlsError::InvalidConfig(format!(
                "finite-difference step must be finite and > 0, got {step}"
            )));
        }
        Ok(Self {
            method,
            step,
            parallel: false,
        })
    }

    /// Forward differences with step `step`.
    pub fn forward(step: f64) -> VqlsResult<Self> {
        Self::new(GradientMethod::Forward, step)
    }

    /// Central differences with step `step`.
    pub fn central(step: f64) -> VqlsResult<Self> {
        Self::new(GradientMethod::Central, step)
    }

    /// Parameter-shift rule.
    pub fn parameter_shift() -> Self {
        Self {
            method: GradientMethod::ParameterShift,
            step: Self::DEFAULT_STEP,
            parallel: false,
        }
    }

    /// Evaluate the per-parameter costs concurrently.
    #[must_use]
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// The estimation method.
    pub fn method(&self) -> GradientMethod {
        self.method
    }

    /// The finite-difference step (unused by parameter shift).
    pub fn step(&self) -> f64 {
        self.step
    }

    /// Whether evaluations run concurrently.
    pub fn is_parallel(&self) -> bool {
        self.parallel
    }

    /// Cost evaluations needed for one gradient over `num_params` parameters.
    pub fn evaluations_per_gradient(&self, num_params: usize, base_known: bool) -> usize {
        match self.method {
            GradientMethod::Forward => num_params + usize::from(!base_known),
            GradientMethod::Central | GradientMethod::ParameterShift => 2 * num_params,
        }
    }

    /// Estimate `∇C(θ)`.
    ///
    /// `base_cost` is `C(θ)` if the caller already has it; forward
    /// differences reuse it. Any failing evaluation fails the whole gradient.
    pub fn estimate<O: ExpectationOracle>(
        &self,
        cost: &CostFunctional<O>,
        params: &[f64],
        base_cost: Option<f64>,
        cancel: &CancelToken,
    ) -> VqlsResult<Vec<f64>> {
        cost.ansatz().check_parameters(params)?;

        let base = match (self.method, base_cost) {
            (GradientMethod::Forward, Some(c)) => c,
            (GradientMethod::Forward, None) => {
                cancel.check()?;
                cost.evaluate(params)?
            }
            _ => 0.0,
        };

        let shifted = |i: usize, delta: f64| -> VqlsResult<f64> {
            cancel.check()?;
            let mut p = params.to_vec();
            p[i] += delta;
            cost.evaluate(&p)
        };

        let component = |i: usize| -> VqlsResult<f64> {
            let h = self.step;
            let g = match self.method {
                GradientMethod::Forward => (shifted(i, h)? - base) / h,
                GradientMethod::Central => (shifted(i, h)? - shifted(i, -h)?) / (2.0 * h),
                GradientMethod::ParameterShift => {
                    (shifted(i, FRAC_PI_2)? - shifted(i, -FRAC_PI_2)?) / 2.0
                }
            };
            Ok(ensure_finite(g)?)
        };

        let n = params.len();
        let gradient = if self.parallel {
            (0..n)
                .into_par_iter()
                .map(component)
                .collect::<VqlsResult<Vec<f64>>>()?
        } else {
            (0..n).map(component).collect::<VqlsResult<Vec<f64>>>()?
        };

        debug!(
            method = %self.method,
            parallel = self.parallel,
            evaluations = self.evaluations_per_gradient(n, base_cost.is_some()),
            norm = gradient.iter().map(|g| g * g).sum::<f64>().sqrt(),
            "estimated gradient"
        );

        Ok(gradient)
    }
}
