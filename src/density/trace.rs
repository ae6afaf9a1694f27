//! N-representability trace checks of the relaxed density matrices.

use std::fmt;

use anyhow;
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::io::format::write_subtitle;
use crate::onepdm::OneParticleResponse;
use crate::space::MoSpaces;
use crate::tensor::store::TensorStore;

#[cfg(test)]
#[path = "trace_tests.rs"]
mod trace_tests;

/// TPDM blocks entering the trace, with the weights that account for the packed storage of
/// same-space blocks and for the permutational images of the OVOV blocks.
const TPDM_TRACE_WEIGHTS: [(&str, f64); 10] = [
    ("Gamma <OO|OO>", 8.0),
    ("Gamma <Oo|Oo>", 8.0),
    ("Gamma <oo|oo>", 8.0),
    ("Gamma <VV|VV>", 8.0),
    ("Gamma <Vv|Vv>", 8.0),
    ("Gamma <vv|vv>", 8.0),
    ("Gamma <OV|OV>", 2.0),
    ("Gamma <Ov|Ov>", 2.0),
    ("Gamma <oV|oV>", 2.0),
    ("Gamma <ov|ov>", 2.0),
];

/// Structure containing the traces of the relaxed one- and two-particle density matrices and
/// their deviations from the exact values for `N` electrons.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct NRepresentabilityReport {
    /// The total number of electrons `N`.
    nelectrons: usize,

    /// The trace of the one-particle density matrix.
    opdm_trace: f64,

    /// The trace of the two-particle density matrix.
    tpdm_trace: f64,
}

impl NRepresentabilityReport {
    /// Returns a builder to construct a new [`NRepresentabilityReport`].
    pub fn builder() -> NRepresentabilityReportBuilder {
        NRepresentabilityReportBuilder::default()
    }

    pub fn nelectrons(&self) -> usize {
        self.nelectrons
    }

    pub fn opdm_trace(&self) -> f64 {
        self.opdm_trace
    }

    pub fn tpdm_trace(&self) -> f64 {
        self.tpdm_trace
    }

    /// Returns `N - tr γ`.
    pub fn opdm_deviation(&self) -> f64 {
        self.nelectrons as f64 - self.opdm_trace
    }

    /// Returns `N (N - 1) - tr Γ`.
    pub fn tpdm_deviation(&self) -> f64 {
        let n = self.nelectrons as f64;
        n * (n - 1.0) - self.tpdm_trace
    }

    /// Checks if both deviations are within `threshold` in magnitude.
    pub fn is_satisfied(&self, threshold: f64) -> bool {
        self.opdm_deviation().abs() <= threshold && self.tpdm_deviation().abs() <= threshold
    }
}

impl fmt::Display for NRepresentabilityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "N-representability")?;
        writeln!(f, "Number of electrons N: {}", self.nelectrons)?;
        writeln!(
            f,
            "OPDM trace: {:>20.12}  Deviation N - tr: {:>+12.4e}",
            self.opdm_trace,
            self.opdm_deviation()
        )?;
        writeln!(
            f,
            "TPDM trace: {:>20.12}  Deviation N(N-1) - tr: {:>+12.4e}",
            self.tpdm_trace,
            self.tpdm_deviation()
        )?;
        Ok(())
    }
}

/// Computes the traces of the relaxed density matrices.
///
/// The TPDM trace is accumulated from the diagonals of the OOOO, VVVV, and same-structure OVOV
/// blocks in `density`, and the OPDM trace from `tr κ + tr τ_occ + tr τ_vir` over both spins.
///
/// # Errors
///
/// Errors if any of the required density blocks is missing.
pub fn compute_n_representability(
    spaces: &MoSpaces,
    one_particle: &OneParticleResponse,
    density: &TensorStore,
) -> Result<NRepresentabilityReport, anyhow::Error> {
    let tpdm_trace = TPDM_TRACE_WEIGHTS
        .iter()
        .map(|(label, weight)| Ok(weight * density.tensor(label)?.diagonal_sum()?))
        .sum::<Result<f64, anyhow::Error>>()?;
    Ok(NRepresentabilityReport {
        nelectrons: spaces.total_nelectrons(),
        opdm_trace: one_particle.trace(),
        tpdm_trace,
    })
}
