//! Pauli operator algebra.
//!
//! An operator is a weighted sum of Pauli strings:
//!
//!   A = Σ_k  c_k · P_k,   c_k ∈ ℂ
//!
//! where every P_k is a dense tensor product `P_k = σ₀ ⊗ σ₁ ⊗ … ⊗ σ_{n-1}`
//! with σ ∈ {I, X, Y, Z}. Label character `q` acts on qubit `q`, so `"IZ"`
//! is `I` on qubit 0 and `Z` on qubit 1.
//!
//! # Example
//!
//! ```rust
//! use num_complex::Complex64;
//! use vqls_core::operator::WeightedOperator;
//!
//! let a = WeightedOperator::parse(2, [
//!     (Complex64::new(1.0, 0.0), "IZ"),
//!     (Complex64::new(2.0, 0.0), "ZZ"),
//! ]).unwrap();
//!
//! let a_sq = a.multiply(&a).unwrap().simplify(1e-12);
//! assert_eq!(a_sq.num_qubits(), 2);
//! ```

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use num_complex::Complex64;
use serde::{Deserialize, Serialize};

use crate::error::{VqlsError, VqlsResult};

/// Single-qubit Pauli operator.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub enum Pauli {
    /// Identity.
    I,
    /// Pauli-X.
    X,
    /// Pauli-Y.
    Y,
    /// Pauli-Z.
    Z,
}

impl Pauli {
    /// Get the label of this Pauli operator.
    pub fn name(&self) -> &'static str {
        match self {
            Pauli::I => "I",
            Pauli::X => "X",
            Pauli::Y => "Y",
            Pauli::Z => "Z",
        }
    }

    /// Parse a single label character. Only upper-case `IXYZ` is accepted.
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            'I' => Some(Pauli::I),
            'X' => Some(Pauli::X),
            'Y' => Some(Pauli::Y),
            'Z' => Some(Pauli::Z),
            _ => None,
        }
    }

    /// Product `self · rhs` on one qubit.
    ///
    /// Returns `(k, p)` such that `self · rhs = iᵏ · p`. The cyclic products
    /// `XY = iZ`, `YZ = iX`, `ZX = iY` carry `k = 1`, their reverses `k = 3`.
    pub fn compose(self, rhs: Pauli) -> (u8, Pauli) {
        use Pauli::{I, X, Y, Z};
        match (self, rhs) {
            (I, p) | (p, I) => (0, p),
            (X, X) | (Y, Y) | (Z, Z) => (0, I),
            (X, Y) => (1, Z),
            (Y, X) => (3, Z),
            (Y, Z) => (1, X),
            (Z, Y) => (3, X),
            (Z, X) => (1, Y),
            (X, Z) => (3, Y),
        }
    }
}

impl fmt::Display for Pauli {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Pauli {
    type Err = VqlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        match (chars.next().and_then(Pauli::from_char), chars.next()) {
            (Some(p), None) => Ok(p),
            _ => Err(VqlsError::malformed(0, format!("invalid Pauli label {s:?}"))),
        }
    }
}

/// `iᵏ` as a complex number.
fn i_power(k: u8) -> Complex64 {
    match k % 4 {
        0 => Complex64::new(1.0, 0.0),
        1 => Complex64::new(0.0, 1.0),
        2 => Complex64::new(-1.0, 0.0),
        _ => Complex64::new(0.0, -1.0),
    }
}

/// A dense tensor product of Pauli operators, one label per qubit.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub struct PauliString {
    ops: Vec<Pauli>,
}

impl PauliString {
    /// Build a string from explicit per-qubit operators.
    pub fn new(ops: Vec<Pauli>) -> Self {
        Self { ops }
    }

    /// `I⊗…⊗I` on `num_qubits` qubits.
    pub fn identity(num_qubits: usize) -> Self {
        Self {
            ops: vec![Pauli::I; num_qubits],
        }
    }

    /// Per-qubit operators, indexed by qubit.
    pub fn ops(&self) -> &[Pauli] {
        &self.ops
    }

    /// Number of qubits this string spans.
    pub fn num_qubits(&self) -> usize {
        self.ops.len()
    }

    /// Number of non-identity factors.
    pub fn weight(&self) -> usize {
        self.ops.iter().filter(|p| **p != Pauli::I).count()
    }

    /// True when every factor is the identity.
    pub fn is_identity(&self) -> bool {
        self.weight() == 0
    }

    /// Qubit-wise product. Both strings must have the same length.
    ///
    /// Returns the accumulated power of `i` (mod 4) and the product string.
    pub fn compose(&self, rhs: &PauliString) -> (u8, PauliString) {
        debug_assert_eq!(self.ops.len(), rhs.ops.len());
        let mut phase = 0u8;
        let ops = self
            .ops
            .iter()
            .zip(&rhs.ops)
            .map(|(&a, &b)| {
                let (k, p) = a.compose(b);
                phase = (phase + k) % 4;
                p
            })
            .collect();
        (phase, Self { ops })
    }

    /// Parse a label, returning the position and character of the first
    /// symbol outside `IXYZ` on failure.
    fn parse_label(label: &str) -> Result<Self, (usize, char)> {
        label
            .chars()
            .enumerate()
            .map(|(pos, c)| Pauli::from_char(c).ok_or((pos, c)))
            .collect::<Result<Vec<_>, _>>()
            .map(Self::new)
    }
}

impl fmt::Display for PauliString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for op in &self.ops {
            f.write_str(op.name())?;
        }
        Ok(())
    }
}

impl FromStr for PauliString {
    type Err = VqlsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse_label(s).map_err(|(pos, c)| {
            VqlsError::malformed(0, format!("invalid Pauli label {c:?} at position {pos}"))
        })
    }
}

impl From<PauliString> for String {
    fn from(value: PauliString) -> Self {
        value.to_string()
    }
}

impl TryFrom<String> for PauliString {
    type Error = VqlsError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

/// A single weighted term `coeff · pauli`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperatorTerm {
    /// Complex coefficient.
    pub coeff: Complex64,
    /// The Pauli string.
    pub pauli: PauliString,
}

impl OperatorTerm {
    /// Create a new term.
    pub fn new(coeff: Complex64, pauli: PauliString) -> Self {
        Self { coeff, pauli }
    }
}

/// An operator represented as an ordered sum of weighted Pauli strings.
///
/// Invariants: at least one term, and every string spans `num_qubits`
/// qubits. Terms are never merged implicitly; use [`simplify`] for the
/// canonical form.
///
/// [`simplify`]: WeightedOperator::simplify
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeightedOperator {
    num_qubits: usize,
    terms: Vec<OperatorTerm>,
}

impl WeightedOperator {
    /// Parse an operator from `(coefficient, label)` pairs.
    ///
    /// Every label must be exactly `num_qubits` characters from `IXYZ`.
    pub fn parse<I, S>(num_qubits: usize, terms: I) -> VqlsResult<Self>
    where
        I: IntoIterator<Item = (Complex64, S)>,
        S: AsRef<str>,
    {
        if num_qubits == 0 {
            return Err(VqlsError::malformed(0, "qubit count must be at least 1"));
        }

        let terms = terms
            .into_iter()
            .enumerate()
            .map(|(idx, (coeff, label))| {
                let label = label.as_ref();
                if !coeff.re.is_finite() || !coeff.im.is_finite() {
                    return Err(VqlsError::malformed(
                        idx,
                        format!("coefficient {coeff} is not finite"),
                    ));
                }
                let pauli = PauliString::parse_label(label).map_err(|(pos, c)| {
                    VqlsError::malformed(
                        idx,
                        format!("label {label:?} has invalid character {c:?} at position {pos}"),
                    )
                })?;
                if pauli.num_qubits() != num_qubits {
                    return Err(VqlsError::malformed(
                        idx,
                        format!(
                            "label {label:?} has length {}, expected {num_qubits}",
                            pauli.num_qubits()
                        ),
                    ));
                }
                Ok(OperatorTerm::new(coeff, pauli))
            })
            .collect::<VqlsResult<Vec<_>>>()?;

        if terms.is_empty() {
            return Err(VqlsError::malformed(0, "operator has no terms"));
        }

        Ok(Self { num_qubits, terms })
    }

    /// Build an operator from already-constructed terms.
    pub fn from_terms(num_qubits: usize, terms: Vec<OperatorTerm>) -> VqlsResult<Self> {
        if num_qubits == 0 {
            return Err(VqlsError::malformed(0, "qubit count must be at least 1"));
        }
        if terms.is_empty() {
            return Err(VqlsError::malformed(0, "operator has no terms"));
        }
        if let Some((idx, term)) = terms
            .iter()
            .enumerate()
            .find(|(_, t)| t.pauli.num_qubits() != num_qubits)
        {
            return Err(VqlsError::malformed(
                idx,
                format!(
                    "string {} spans {} qubits, expected {num_qubits}",
                    term.pauli,
                    term.pauli.num_qubits()
                ),
            ));
        }
        Ok(Self { num_qubits, terms })
    }

    /// `coeff · I⊗…⊗I`.
    pub fn identity(num_qubits: usize, coeff: Complex64) -> Self {
        Self {
            num_qubits,
            terms: vec![OperatorTerm::new(coeff, PauliString::identity(num_qubits))],
        }
    }

    /// Number of qubits every term spans.
    pub fn num_qubits(&self) -> usize {
        self.num_qubits
    }

    /// All terms, in insertion order.
    pub fn terms(&self) -> &[OperatorTerm] {
        &self.terms
    }

    /// Number of terms.
    pub fn num_terms(&self) -> usize {
        self.terms.len()
    }

    fn check_shape(&self, rhs: &WeightedOperator) -> VqlsResult<()> {
        if self.num_qubits == rhs.num_qubits {
            Ok(())
        } else {
            Err(VqlsError::OperatorShape {
                expected: self.num_qubits,
                found: rhs.num_qubits,
            })
        }
    }

    /// Operator product `self · rhs`.
    ///
    /// Every pair of terms contributes one term; the output has
    /// `self.num_terms() * rhs.num_terms()` terms in `self`-major order.
    pub fn multiply(&self, rhs: &WeightedOperator) -> VqlsResult<Self> {
        self.check_shape(rhs)?;
        let terms = self
            .terms
            .iter()
            .flat_map(|a| {
                rhs.terms.iter().map(move |b| {
                    let (phase, pauli) = a.pauli.compose(&b.pauli);
                    OperatorTerm::new(a.coeff * b.coeff * i_power(phase), pauli)
                })
            })
            .collect();
        Ok(Self {
            num_qubits: self.num_qubits,
            terms,
        })
    }

    /// Operator sum `self + rhs` as term concatenation.
    pub fn add(&self, rhs: &WeightedOperator) -> VqlsResult<Self> {
        self.check_shape(rhs)?;
        let terms = self.terms.iter().chain(&rhs.terms).cloned().collect();
        Ok(Self {
            num_qubits: self.num_qubits,
            terms,
        })
    }

    /// Hermitian adjoint. Pauli strings are self-adjoint, so only the
    /// coefficients are conjugated.
    pub fn adjoint(&self) -> Self {
        Self {
            num_qubits: self.num_qubits,
            terms: self
                .terms
                .iter()
                .map(|t| OperatorTerm::new(t.coeff.conj(), t.pauli.clone()))
                .collect(),
        }
    }

    /// Multiply every coefficient by `factor`.
    pub fn scale(&self, factor: Complex64) -> Self {
        Self {
            num_qubits: self.num_qubits,
            terms: self
                .terms
                .iter()
                .map(|t| OperatorTerm::new(t.coeff * factor, t.pauli.clone()))
                .collect(),
        }
    }

    /// Canonical form: identical strings merged, terms with
    /// `|coeff| <= tolerance` dropped, remaining terms sorted by string.
    ///
    /// An operator that cancels entirely becomes `0 · I`.
    pub fn simplify(&self, tolerance: f64) -> Self {
        let mut merged: BTreeMap<&PauliString, Complex64> = BTreeMap::new();
        for term in &self.terms {
            *merged.entry(&term.pauli).or_default() += term.coeff;
        }

        let terms: Vec<OperatorTerm> = merged
            .into_iter()
            .filter(|(_, c)| c.norm() > tolerance)
            .map(|(p, c)| OperatorTerm::new(c, p.clone()))
            .collect();

        if terms.is_empty() {
            return Self::identity(self.num_qubits, Complex64::new(0.0, 0.0));
        }
        Self {
            num_qubits: self.num_qubits,
            terms,
        }
    }

    /// True when the canonical form has only real coefficients.
    pub fn is_hermitian(&self, tolerance: f64) -> bool {
        self.simplify(tolerance)
            .terms
            .iter()
            .all(|t| t.coeff.im.abs() <= tolerance)
    }
}

impl fmt::Display for WeightedOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Operator ({} terms, {} qubits):",
            self.num_terms(),
            self.num_qubits
        )?;
        for term in &self.terms {
            let c = term.coeff;
            if c.im == 0.0 {
                writeln!(f, "  {:+.4} {}", c.re, term.pauli)?;
            } else {
                writeln!(f, "  ({:+.4}{:+.4}i) {}", c.re, c.im, term.pauli)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(re: f64) -> Complex64 {
        Complex64::new(re, 0.0)
    }

    #[test]
    fn test_pauli_compose_table() {
        assert_eq!(Pauli::X.compose(Pauli::Y), (1, Pauli::Z));
        assert_eq!(Pauli::Y.compose(Pauli::X), (3, Pauli::Z));
        assert_eq!(Pauli::Y.compose(Pauli::Z), (1, Pauli::X));
        assert_eq!(Pauli::Z.compose(Pauli::Y), (3, Pauli::X));
        assert_eq!(Pauli::Z.compose(Pauli::X), (1, Pauli::Y));
        assert_eq!(Pauli::X.compose(Pauli::Z), (3, Pauli::Y));
        for p in [Pauli::I, Pauli::X, Pauli::Y, Pauli::Z] {
            assert_eq!(p.compose(p), (0, Pauli::I));
            assert_eq!(Pauli::I.compose(p), (0, p));
            assert_eq!(p.compose(Pauli::I), (0, p));
        }
    }

    #[test]
    fn test_pauli_from_str() {
        assert_eq!("Y".parse::<Pauli>().unwrap(), Pauli::Y);
        assert!("y".parse::<Pauli>().is_err());
        assert!("XY".parse::<Pauli>().is_err());
        assert!("".parse::<Pauli>().is_err());
    }

    #[test]
    fn test_i_power_cycle() {
        assert_eq!(i_power(0), c(1.0));
        assert_eq!(i_power(1), Complex64::new(0.0, 1.0));
        assert_eq!(i_power(2), c(-1.0));
        assert_eq!(i_power(3), Complex64::new(0.0, -1.0));
        assert_eq!(i_power(5), i_power(1));
    }

    #[test]
    fn test_string_compose_accumulates_phase() {
        // (X⊗Y)(Y⊗Z) = (iZ)⊗(iX) = -Z⊗X
        let a: PauliString = "XY".parse().unwrap();
        let b: PauliString = "YZ".parse().unwrap();
        let (phase, p) = a.compose(&b);
        assert_eq!(phase, 2);
        assert_eq!(p.to_string(), "ZX");
    }

    #[test]
    fn test_parse_rejects_bad_character() {
        let err = WeightedOperator::parse(2, [(c(1.0), "IZ"), (c(1.0), "XQ")]).unwrap_err();
        match err {
            VqlsError::MalformedOperator { term, .. } => assert_eq!(term, 1),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_parse_rejects_lowercase() {
        assert!(WeightedOperator::parse(1, [(c(1.0), "x")]).is_err());
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        let err = WeightedOperator::parse(3, [(c(1.0), "IZ")]).unwrap_err();
        assert!(matches!(err, VqlsError::MalformedOperator { term: 0, .. }));
    }

    #[test]
    fn test_parse_rejects_empty_and_zero_qubits() {
        let empty: [(Complex64, &str); 0] = [];
        assert!(WeightedOperator::parse(2, empty).is_err());
        assert!(WeightedOperator::parse(0, [(c(1.0), "")]).is_err());
    }

    #[test]
    fn test_parse_rejects_nan_coefficient() {
        assert!(WeightedOperator::parse(1, [(c(f64::NAN), "Z")]).is_err());
    }

    #[test]
    fn test_multiply_shape_mismatch() {
        let a = WeightedOperator::parse(1, [(c(1.0), "Z")]).unwrap();
        let b = WeightedOperator::parse(2, [(c(1.0), "ZZ")]).unwrap();
        assert!(matches!(
            a.multiply(&b),
            Err(VqlsError::OperatorShape {
                expected: 1,
                found: 2
            })
        ));
        assert!(a.add(&b).is_err());
    }

    #[test]
    fn test_multiply_term_count_and_order() {
        let a = WeightedOperator::parse(1, [(c(1.0), "X"), (c(2.0), "Z")]).unwrap();
        let b = WeightedOperator::parse(1, [(c(3.0), "Y"), (c(4.0), "I")]).unwrap();
        let p = a.multiply(&b).unwrap();
        assert_eq!(p.num_terms(), 4);
        // X·Y = iZ, X·I = X, Z·Y = -iX, Z·I = Z
        assert_eq!(p.terms()[0].pauli.to_string(), "Z");
        assert_eq!(p.terms()[0].coeff, Complex64::new(0.0, 3.0));
        assert_eq!(p.terms()[1].pauli.to_string(), "X");
        assert_eq!(p.terms()[1].coeff, c(4.0));
        assert_eq!(p.terms()[2].pauli.to_string(), "X");
        assert_eq!(p.terms()[2].coeff, Complex64::new(0.0, -6.0));
        assert_eq!(p.terms()[3].pauli.to_string(), "Z");
        assert_eq!(p.terms()[3].coeff, c(8.0));
    }

    #[test]
    fn test_add_concatenates() {
        let a = WeightedOperator::parse(2, [(c(1.0), "IZ")]).unwrap();
        let b = WeightedOperator::parse(2, [(c(-1.0), "IZ")]).unwrap();
        let sum = a.add(&b).unwrap();
        assert_eq!(sum.num_terms(), 2);
        let simplified = sum.simplify(1e-12);
        assert_eq!(simplified.num_terms(), 1);
        assert!(simplified.terms()[0].pauli.is_identity());
        assert_eq!(simplified.terms()[0].coeff, c(0.0));
    }

    #[test]
    fn test_adjoint_and_hermitian() {
        let a = WeightedOperator::parse(1, [(Complex64::new(1.0, 2.0), "X")]).unwrap();
        assert!(!a.is_hermitian(1e-12));
        assert_eq!(a.adjoint().terms()[0].coeff, Complex64::new(1.0, -2.0));
        let h = a.add(&a.adjoint()).unwrap();
        assert!(h.is_hermitian(1e-12));
    }

    #[test]
    fn test_scale() {
        let a = WeightedOperator::parse(1, [(c(2.0), "Y")]).unwrap();
        let s = a.scale(Complex64::new(0.0, 1.0));
        assert_eq!(s.terms()[0].coeff, Complex64::new(0.0, 2.0));
    }

    #[test]
    fn test_display() {
        let a = WeightedOperator::parse(2, [(c(1.0), "IZ"), (Complex64::new(0.0, -0.5), "XY")])
            .unwrap();
        let text = a.to_string();
        assert!(text.contains("2 terms, 2 qubits"));
        assert!(text.contains("+1.0000 IZ"));
        assert!(text.contains("(+0.0000-0.5000i) XY"));
    }

    #[test]
    fn test_pauli_string_serde_as_label() {
        let p: PauliString = "XIZ".parse().unwrap();
        let json = serde_json::to_string(&p).unwrap();
        assert_eq!(json, "\"XIZ\"");
        let back: PauliString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, p);
        assert!(serde_json::from_str::<PauliString>("\"XA\"").is_err());
    }
}
