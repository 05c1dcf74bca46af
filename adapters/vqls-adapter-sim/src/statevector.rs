//! Dense statevector for ansatz preparation and Pauli expectations.
//!
//! Basis index bit `q` holds qubit `q`, so label character `q` of a Pauli
//! string acts on bit `q`.

use num_complex::Complex64;
use vqls_core::{AnsatzGate, AnsatzSpec, Pauli, PauliString, WeightedOperator};

/// A pure state on `num_qubits` qubits.
#[derive(Debug, Clone, PartialEq)]
pub struct Statevector {
    /// The `2^n` amplitudes.
    amplitudes: Vec<Complex64>,
    num_qubits: usize,
}

impl Statevector {
    /// `|0…0⟩`.
    pub fn new(num_qubits: usize) -> Self {
        Self::basis(num_qubits, 0)
    }

    /// Computational basis state `|index⟩`. `index` must be below `2^n`.
    pub fn basis(num_qubits: usize, index: usize) -> Self {
        let mut amplitudes = vec![Complex64::new(0.0, 0.0); 1 << num_qubits];
        amplitudes[index] = Complex64::new(1.0, 0.0);
        Self {
            amplitudes,
            num_qubits,
        }
    }

    /// `|+…+⟩`.
    pub fn plus(num_qubits: usize) -> Self {
        let dim = 1usize << num_qubits;
        let amp = Complex64::new(1.0 / (dim as f64).sqrt(), 0.0);
        Self {
            amplitudes: vec![amp; dim],
            num_qubits,
        }
    }

    /// Run `ansatz` with `params` on `|0…0⟩`.
    ///
    /// `params` must already match `ansatz.parameter_count()`.
    pub fn prepare(ansatz: &AnsatzSpec, params: &[f64]) -> Self {
        let mut sv = Self::new(ansatz.num_qubits());
        for gate in ansatz.gates() {
            sv.apply(&gate, params);
        }
        sv
    }

    /// Number of qubits.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// The amplitudes, indexed by basis state.
    pub fn amplitudes(&self) -> &[Complex64] {
        &self.amplitudes
    }

    /// `⟨ψ|ψ⟩`.
    pub fn norm_sqr(&self) -> f64 {
        self.amplitudes.iter().map(|a| a.norm_sqr()).sum()
    }

    /// Apply one ansatz gate, reading its angle from `params`.
    pub fn apply(&mut self, gate: &AnsatzGate, params: &[f64]) {
        match *gate {
            AnsatzGate::Ry { qubit, param } => self.apply_ry(qubit, params[param]),
            AnsatzGate::Rx { qubit, param } => self.apply_rx(qubit, params[param]),
            AnsatzGate::Cx { control, target } => self.apply_cx(control, target),
            AnsatzGate::Cz { a, b } => self.apply_cz(a, b),
        }
    }

    /// Indices with `qubit` clear, paired with their partner with it set.
    fn pairs(&self, qubit: usize) -> impl Iterator<Item = (usize, usize)> + use<> {
        let mask = 1usize << qubit;
        (0..self.amplitudes.len())
            .filter(move |i| i & mask == 0)
            .map(move |i| (i, i | mask))
    }

    fn rotate(&mut self, qubit: usize, m: [[Complex64; 2]; 2]) {
        for (i, j) in self.pairs(qubit) {
            let a = self.amplitudes[i];
            let b = self.amplitudes[j];
            self.amplitudes[i] = m[0][0] * a + m[0][1] * b;
            self.amplitudes[j] = m[1][0] * a + m[1][1] * b;
        }
    }

    /// `Rx(θ) = exp(−iθX/2)`.
    pub fn apply_rx(&mut self, qubit: usize, theta: f64) {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new(0.0, -(theta / 2.0).sin());
        self.rotate(qubit, [[c, s], [s, c]]);
    }

    /// `Ry(θ) = exp(−iθY/2)`.
    pub fn apply_ry(&mut self, qubit: usize, theta: f64) {
        let c = Complex64::new((theta / 2.0).cos(), 0.0);
        let s = Complex64::new((theta / 2.0).sin(), 0.0);
        self.rotate(qubit, [[c, -s], [s, c]]);
    }

    /// Hadamard.
    #[cfg(test)]
    pub(crate) fn apply_h(&mut self, qubit: usize) {
        let h = Complex64::new(std::f64::consts::FRAC_1_SQRT_2, 0.0);
        self.rotate(qubit, [[h, h], [h, -h]]);
    }

    /// Controlled-X.
    pub fn apply_cx(&mut self, control: usize, target: usize) {
        let ctrl = 1usize << control;
        let pairs: Vec<_> = self.pairs(target).filter(|(i, _)| i & ctrl != 0).collect();
        for (i, j) in pairs {
            self.amplitudes.swap(i, j);
        }
    }

    /// Controlled-Z.
    pub fn apply_cz(&mut self, a: usize, b: usize) {
        let both = (1usize << a) | (1usize << b);
        for (i, amp) in self.amplitudes.iter_mut().enumerate() {
            if i & both == both {
                *amp = -*amp;
            }
        }
    }

    /// `⟨ψ|P|ψ⟩` for a single Pauli string.
    ///
    /// `P|i⟩ = i^{#Y} · (−1)^{popcount(i & zy)} · |i ⊕ xy⟩`, where `xy` marks
    /// the X/Y qubits and `zy` the Z/Y qubits.
    pub fn pauli_expectation(&self, pauli: &PauliString) -> Complex64 {
        let mut flip = 0usize;
        let mut sign = 0usize;
        let mut num_y = 0u32;
        for (q, op) in pauli.ops().iter().enumerate() {
            match op {
                Pauli::I => {}
                Pauli::X => flip |= 1 << q,
                Pauli::Z => sign |= 1 << q,
                Pauli::Y => {
                    flip |= 1 << q;
                    sign |= 1 << q;
                    num_y += 1;
                }
            }
        }

        let sum: Complex64 = self
            .amplitudes
            .iter()
            .enumerate()
            .map(|(i, amp)| {
                let v = self.amplitudes[i ^ flip].conj() * amp;
                if (i & sign).count_ones() % 2 == 1 { -v } else { v }
            })
            .sum();

        sum * Complex64::new(0.0, 1.0).powu(num_y % 4)
    }

    /// `Re⟨ψ|A|ψ⟩` summed term by term.
    pub fn expectation(&self, operator: &WeightedOperator) -> f64 {
        operator
            .terms()
            .iter()
            .map(|t| (t.coeff * self.pauli_expectation(&t.pauli)).re)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-10
    }

    fn op(n: usize, label: &str) -> WeightedOperator {
        WeightedOperator::parse(n, [(Complex64::new(1.0, 0.0), label)]).unwrap()
    }

    #[test]
    fn test_initial_state() {
        let sv = Statevector::new(2);
        assert_eq!(sv.amplitudes()[0], Complex64::new(1.0, 0.0));
        assert!(sv.amplitudes()[1..].iter().all(|a| a.norm() == 0.0));
        assert!(approx(sv.expectation(&op(2, "ZZ")), 1.0));
        assert!(approx(sv.expectation(&op(2, "XI")), 0.0));
    }

    #[test]
    fn test_ry_pi_flips() {
        let mut sv = Statevector::new(1);
        sv.apply_ry(0, PI);
        assert!(approx(sv.amplitudes()[1].re, 1.0));
        assert!(approx(sv.expectation(&op(1, "Z")), -1.0));
    }

    #[test]
    fn test_rotation_expectations() {
        let theta: f64 = 0.7;
        let mut sv = Statevector::new(1);
        sv.apply_rx(0, theta);
        assert!(approx(sv.expectation(&op(1, "Z")), theta.cos()));
        assert!(approx(sv.expectation(&op(1, "Y")), -theta.sin()));
        assert!(approx(sv.expectation(&op(1, "X")), 0.0));

        let mut sv = Statevector::new(1);
        sv.apply_ry(0, theta);
        assert!(approx(sv.expectation(&op(1, "X")), theta.sin()));
        assert!(approx(sv.expectation(&op(1, "Y")), 0.0));
    }

    #[test]
    fn test_bit_order_matches_label_order() {
        // Flip qubit 1 only: label "IZ" reads qubit 1.
        let sv = Statevector::basis(2, 0b10);
        assert!(approx(sv.expectation(&op(2, "ZI")), 1.0));
        assert!(approx(sv.expectation(&op(2, "IZ")), -1.0));
    }

    #[test]
    fn test_cx_orientation() {
        let mut sv = Statevector::basis(2, 0b10);
        sv.apply_cx(1, 0);
        assert!(approx(sv.amplitudes()[0b11].re, 1.0));

        let mut sv = Statevector::basis(2, 0b01);
        sv.apply_cx(1, 0);
        assert!(approx(sv.amplitudes()[0b01].re, 1.0));
    }

    #[test]
    fn test_bell_correlations() {
        let mut sv = Statevector::new(2);
        sv.apply_h(0);
        sv.apply_cx(0, 1);
        assert!(approx(sv.expectation(&op(2, "ZZ")), 1.0));
        assert!(approx(sv.expectation(&op(2, "XX")), 1.0));
        assert!(approx(sv.expectation(&op(2, "YY")), -1.0));
        assert!(approx(sv.expectation(&op(2, "ZI")), 0.0));
    }

    #[test]
    fn test_cz_phase() {
        let mut sv = Statevector::plus(2);
        sv.apply_cz(0, 1);
        assert!(approx(sv.amplitudes()[0b11].re, -0.5));
        assert!(approx(sv.expectation(&op(2, "XZ")), 1.0));
    }

    #[test]
    fn test_plus_state() {
        let sv = Statevector::plus(3);
        assert!(approx(sv.norm_sqr(), 1.0));
        assert!(approx(sv.expectation(&op(3, "XXX")), 1.0));
        assert!(approx(sv.expectation(&op(3, "ZII")), 0.0));
    }

    #[test]
    fn test_complex_coefficient_contributes_real_part() {
        let sv = Statevector::new(1);
        let a = WeightedOperator::parse(
            1,
            [(Complex64::new(0.5, 2.0), "Z"), (Complex64::new(0.0, 1.0), "I")],
        )
        .unwrap();
        assert!(approx(sv.expectation(&a), 0.5));
    }

    #[test]
    fn test_prepare_preserves_norm() {
        let ansatz = AnsatzSpec::new(3, 2).unwrap();
        let params: Vec<f64> = (0..ansatz.parameter_count())
            .map(|i| 0.37 * i as f64)
            .collect();
        let sv = Statevector::prepare(&ansatz, &params);
        assert!(approx(sv.norm_sqr(), 1.0));
    }
}
