//! Hardware-efficient ansatz description.
//!
//! An [`AnsatzSpec`] says how a flat parameter vector maps onto a layered
//! circuit. It never executes anything: oracles read [`AnsatzSpec::gates`]
//! and prepare the state themselves.
//!
//! Default layout for `n` qubits, one layer:
//!
//! ```text
//! q0 ─[Ry(θ0)]─[Rx(θ1)]─X──────────────────────
//!                       │
//! q1 ─────────────────── ●─[Ry(θ2)]─[Rx(θ3)]─X─
//!                                            │
//! q2 ────────────────────────────────────────●─ …
//! ```
//!
//! After the rotations on qubit `j` (for `j < n-1`) a CNOT is applied with
//! control `j+1` and target `j`.

use serde::{Deserialize, Serialize};

use crate::error::{VqlsError, VqlsResult};

/// Single-qubit rotations applied to every qubit in every layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RotationScheme {
    /// `Ry(θ)` followed by `Rx(θ')`: two parameters per qubit per layer.
    #[default]
    RyRx,
    /// `Ry(θ)` only: one parameter per qubit per layer.
    Ry,
}

impl RotationScheme {
    /// Parameters consumed per qubit per layer.
    pub fn parameters_per_qubit(&self) -> usize {
        match self {
            RotationScheme::RyRx => 2,
            RotationScheme::Ry => 1,
        }
    }
}

/// Fixed entangling pattern between neighbouring qubits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Entangler {
    /// CNOT with control `j+1`, target `j`.
    #[default]
    CnotChain,
    /// CZ between `j` and `j+1`.
    CzChain,
    /// No entanglement.
    None,
}

/// One gate of the prepared circuit.
///
/// Rotation gates reference an index into the parameter vector instead of
/// carrying an angle, so the same gate list serves every θ.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AnsatzGate {
    /// `Ry(θ[param])` on `qubit`.
    Ry {
        /// Target qubit.
        qubit: usize,
        /// Parameter index.
        param: usize,
    },
    /// `Rx(θ[param])` on `qubit`.
    Rx {
        /// Target qubit.
        qubit: usize,
        /// Parameter index.
        param: usize,
    },
    /// Controlled-X.
    Cx {
        /// Control qubit.
        control: usize,
        /// Target qubit.
        target: usize,
    },
    /// Controlled-Z (symmetric).
    Cz {
        /// First qubit.
        a: usize,
        /// Second qubit.
        b: usize,
    },
}

impl AnsatzGate {
    /// Parameter index read by this gate, if any.
    pub fn param(&self) -> Option<usize> {
        match self {
            AnsatzGate::Ry { param, .. } | AnsatzGate::Rx { param, .. } => Some(*param),
            AnsatzGate::Cx { .. } | AnsatzGate::Cz { .. } => None,
        }
    }
}

/// Layered hardware-efficient ansatz.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnsatzSpec {
    num_qubits: usize,
    num_layers: usize,
    #[serde(default)]
    rotations: RotationScheme,
    #[serde(default)]
    entangler: Entangler,
}

impl AnsatzSpec {
    /// Create an ansatz with the default `Ry·Rx` rotations and CNOT chain.
    ///
    /// Zero layers is allowed and prepares `|0…0⟩`.
    pub fn new(num_qubits: usize, num_layers: usize) -> VqlsResult<Self> {
        if num_qubits == 0 {
            return Err(VqlsError::InvalidConfig(
                "ansatz needs at least one qubit".into(),
            ));
        }
        Ok(Self {
            num_qubits,
            num_layers,
            rotations: RotationScheme::default(),
            entangler: Entangler::default(),
        })
    }

    /// Set the rotation scheme.
    #[must_use]
    pub fn with_rotations(mut self, rotations: RotationScheme) -> Self {
        self.rotations = rotations;
        self
    }

    /// Set the entangling pattern.
    #[must_use]
    pub fn with_entangler(mut self, entangler: Entangler) -> Self {
        self.entangler = entangler;
        self
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// Number of layers.
    pub fn num_layers(&self) -> usize {
        self.num_layers
    }

    /// Rotation scheme.
    pub fn rotations(&self) -> RotationScheme {
        self.rotations
    }

    /// Entangling pattern.
    pub fn entangler(&self) -> Entangler {
        self.entangler
    }

    /// Length of the parameter vector this ansatz consumes.
    pub fn parameter_count(&self) -> usize {
        self.num_qubits * self.num_layers * self.rotations.parameters_per_qubit()
    }

    /// Check that `params` fits this ansatz.
    pub fn check_parameters(&self, params: &[f64]) -> VqlsResult<()> {
        let expected = self.parameter_count();
        if params.len() == expected {
            Ok(())
        } else {
            Err(VqlsError::ParameterCount {
                expected,
                found: params.len(),
            })
        }
    }

    /// The gate sequence, in application order.
    pub fn gates(&self) -> Vec<AnsatzGate> {
        let n = self.num_qubits;
        let ppq = self.rotations.parameters_per_qubit();
        let mut gates = Vec::with_capacity(self.num_layers * n * (ppq + 1));

        for layer in 0..self.num_layers {
            for qubit in 0..n {
                let base = (layer * n + qubit) * ppq;
                gates.push(AnsatzGate::Ry { qubit, param: base });
                if self.rotations == RotationScheme::RyRx {
                    gates.push(AnsatzGate::Rx {
                        qubit,
                        param: base + 1,
                    });
                }
                if qubit + 1 < n {
                    match self.entangler {
                        Entangler::CnotChain => gates.push(AnsatzGate::Cx {
                            control: qubit + 1,
                            target: qubit,
                        }),
                        Entangler::CzChain => gates.push(AnsatzGate::Cz {
                            a: qubit,
                            b: qubit + 1,
                        }),
                        Entangler::None => {}
                    }
                }
            }
        }

        gates
    }
}
