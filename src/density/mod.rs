//! Relaxed two-particle density matrices.
//!
//! The relaxed two-particle density matrix (TPDM) of a density cumulant calculation is assembled
//! block by block from the cumulant response amplitudes `Λ`, the orbital-response intermediates
//! `Z`, and the spin-resolved one-particle response quantities. Each builder in this module reads
//! its inputs from an amplitude [`TensorStore`](crate::tensor::store::TensorStore) and commits
//! its blocks to a density store only once every block it produces has been assembled.
//!
//! Separable one-particle contributions are written as sums of [`DirectProductTerm`]s, each of
//! which adds `c · A(x, y) · B(z, w)` to an element `Γ(ij|kl)`, where `(x, y)` and `(z, w)` are
//! two complementary index pairings drawn from `(ij|kl)`.

use std::fmt;

use anyhow;
use itertools::Itertools;
use ndarray::Axis;
use rayon::prelude::*;

use crate::onepdm::BlockDiagonalMatrix;
use crate::space::{PairSpace, Spin};
use crate::tensor::BlockTensor;

mod oooo;
mod oovv;
mod ovov;
mod trace;
mod vvvv;

pub use oooo::build_relaxed_oooo;
pub use oovv::build_relaxed_oovv;
pub use ovov::{build_relaxed_ovov, OvovSpinCase};
pub use trace::{compute_n_representability, NRepresentabilityReport};
pub use vvvv::build_relaxed_vvvv;

#[cfg(test)]
pub(crate) mod density_fixtures;


// ==================
// Struct definitions
// ==================

// -----------
// SpinChannel
// -----------

/// Spin channels of an orbital-pair block: same-spin alpha, opposite-spin, and same-spin beta.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpinChannel {
    AlphaAlpha,
    AlphaBeta,
    BetaBeta,
}

impl SpinChannel {
    pub const ALL: [SpinChannel; 3] = [
        SpinChannel::AlphaAlpha,
        SpinChannel::AlphaBeta,
        SpinChannel::BetaBeta,
    ];

    /// The spins of the first and second orbitals of each pair.
    pub fn spins(&self) -> (Spin, Spin) {
        match self {
            SpinChannel::AlphaAlpha => (Spin::Alpha, Spin::Alpha),
            SpinChannel::AlphaBeta => (Spin::Alpha, Spin::Beta),
            SpinChannel::BetaBeta => (Spin::Beta, Spin::Beta),
        }
    }

    /// The occupied pair tag, *e.g.* `Oo`.
    pub fn occupied_tag(&self) -> &'static str {
        match self {
            SpinChannel::AlphaAlpha => "OO",
            SpinChannel::AlphaBeta => "Oo",
            SpinChannel::BetaBeta => "oo",
        }
    }

    /// The virtual pair tag, *e.g.* `Vv`.
    pub fn virtual_tag(&self) -> &'static str {
        match self {
            SpinChannel::AlphaAlpha => "VV",
            SpinChannel::AlphaBeta => "Vv",
            SpinChannel::BetaBeta => "vv",
        }
    }

    /// The stored occupied pair space: packed for same-spin channels, unpacked otherwise.
    pub fn occupied_pair_label(&self) -> &'static str {
        match self {
            SpinChannel::AlphaAlpha => "[O>O]-",
            SpinChannel::AlphaBeta => "[O,o]",
            SpinChannel::BetaBeta => "[o>o]-",
        }
    }

    /// The stored virtual pair space: packed for same-spin channels, unpacked otherwise.
    pub fn virtual_pair_label(&self) -> &'static str {
        match self {
            SpinChannel::AlphaAlpha => "[V>V]-",
            SpinChannel::AlphaBeta => "[V,v]",
            SpinChannel::BetaBeta => "[v>v]-",
        }
    }

    /// The label of an amplitude tensor `<occ occ|vir vir>` of this channel, *e.g.*
    /// `Lambda <Oo|Vv>`.
    pub fn amplitude_label(&self, name: &str) -> String {
        format!("{name} <{}|{}>", self.occupied_tag(), self.virtual_tag())
    }
}

impl fmt::Display for SpinChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (s1, s2) = self.spins();
        write!(f, "{s1}{s2}")
    }
}

// -------
// Pairing
// -------

/// Index pairings of a direct-product term acting on `Γ(ij|kl)`, named after the indices taken
/// by the first factor. The second factor takes the complementary pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Pairing {
    /// First factor over `(i, k)`, second over `(j, l)`.
    IK,

    /// First factor over `(i, l)`, second over `(j, k)`.
    IL,

    /// First factor over `(j, k)`, second over `(i, l)`.
    JK,

    /// First factor over `(j, l)`, second over `(i, k)`.
    JL,
}

// -----------------
// DirectProductTerm
// -----------------

/// A term `c · A(x, y) · B(z, w)` contributing to `Γ(ij|kl)`, with `(x, y)` and `(z, w)` chosen
/// by a [`Pairing`]. The term vanishes unless both pairs lie within a single irreducible
/// representation.
#[derive(Clone, Debug)]
pub struct DirectProductTerm<'a> {
    coefficient: f64,
    pairing: Pairing,
    first: &'a BlockDiagonalMatrix,
    second: &'a BlockDiagonalMatrix,
}

impl<'a> DirectProductTerm<'a> {
    pub fn new(
        coefficient: f64,
        pairing: Pairing,
        first: &'a BlockDiagonalMatrix,
        second: &'a BlockDiagonalMatrix,
    ) -> Self {
        Self {
            coefficient,
            pairing,
            first,
            second,
        }
    }

    /// Evaluates this term for orbitals given as `(irrep, relative index)` locations.
    fn evaluate(&self, bra: &[(usize, usize); 2], ket: &[(usize, usize); 2]) -> f64 {
        let [i, j] = *bra;
        let [k, l] = *ket;
        let ((x, y), (z, w)) = match self.pairing {
            Pairing::IK => ((i, k), (j, l)),
            Pairing::IL => ((i, l), (j, k)),
            Pairing::JK => ((j, k), (i, l)),
            Pairing::JL => ((j, l), (i, k)),
        };
        if x.0 == y.0 && z.0 == w.0 {
            self.coefficient * self.first.get(x.0, x.1, y.1) * self.second.get(z.0, z.1, w.1)
        } else {
            0.0
        }
    }
}

// ---------------
// ParticleFactors
// ---------------

/// The one-particle factors of a single spin channel entering the separable part of a
/// same-space TPDM block.
pub(crate) struct ParticleFactors<'a> {
    /// The reference occupation, present for occupied blocks only.
    pub(crate) kappa: Option<&'a BlockDiagonalMatrix>,

    /// `κ + τ` for occupied blocks, `τ` for virtual blocks.
    pub(crate) relaxed: &'a BlockDiagonalMatrix,

    /// `τ̄`.
    pub(crate) ptau: &'a BlockDiagonalMatrix,

    /// `τ`.
    pub(crate) tau: &'a BlockDiagonalMatrix,
}

// =========
// Functions
// =========

/// Returns the separable terms of a same-spin `Γ(ij|kl)` block.
pub(crate) fn same_spin_terms<'a>(factors: &ParticleFactors<'a>) -> Vec<DirectProductTerm<'a>> {
    let mut terms = vec![];
    if let Some(kappa) = factors.kappa {
        terms.push(DirectProductTerm::new(0.25, Pairing::IK, kappa, kappa));
        terms.push(DirectProductTerm::new(-0.25, Pairing::IL, kappa, kappa));
    }
    terms.extend([
        DirectProductTerm::new(0.25, Pairing::IK, factors.relaxed, factors.ptau),
        DirectProductTerm::new(-0.25, Pairing::IL, factors.relaxed, factors.ptau),
        DirectProductTerm::new(-0.25, Pairing::JK, factors.relaxed, factors.ptau),
        DirectProductTerm::new(0.25, Pairing::JL, factors.relaxed, factors.ptau),
        DirectProductTerm::new(-0.25, Pairing::IK, factors.tau, factors.tau),
        DirectProductTerm::new(0.25, Pairing::IL, factors.tau, factors.tau),
    ]);
    terms
}

/// Returns the separable terms of an opposite-spin `Γ(ij|kl)` block, where `i` and `k` carry
/// spin alpha and `j` and `l` carry spin beta.
pub(crate) fn mixed_spin_terms<'a>(
    alpha: &ParticleFactors<'a>,
    beta: &ParticleFactors<'a>,
) -> Vec<DirectProductTerm<'a>> {
    let mut terms = vec![];
    if let (Some(kappa_a), Some(kappa_b)) = (alpha.kappa, beta.kappa) {
        terms.push(DirectProductTerm::new(0.25, Pairing::IK, kappa_a, kappa_b));
    }
    terms.extend([
        DirectProductTerm::new(0.25, Pairing::IK, alpha.relaxed, beta.ptau),
        DirectProductTerm::new(0.25, Pairing::JL, beta.relaxed, alpha.ptau),
        DirectProductTerm::new(-0.25, Pairing::IK, alpha.tau, beta.tau),
    ]);
    terms
}

/// Adds direct-product terms to every element of a block tensor viewed through the given row and
/// column pair spaces.
///
/// Each irreducible-representation block is materialised through the views, updated in place,
/// and persisted back. Rows within a block are processed in parallel.
pub(crate) fn accumulate_direct_products(
    tensor: &mut BlockTensor,
    rows_view: &PairSpace,
    cols_view: &PairSpace,
    terms: &[DirectProductTerm],
) -> Result<(), anyhow::Error> {
    let locate_pairs = |view: &PairSpace, h: usize| {
        view.pairs(h)
            .iter()
            .map(|&(p, q)| [view.p_space().locate(p), view.q_space().locate(q)])
            .collect_vec()
    };
    for h in 0..tensor.nirrep() {
        let mut block = tensor.materialise(h, rows_view, cols_view)?;
        let bras = locate_pairs(rows_view, h);
        let kets = locate_pairs(cols_view, h);
        block
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .zip(bras.par_iter())
            .for_each(|(mut row, bra)| {
                row.iter_mut().zip(kets.iter()).for_each(|(elem, ket)| {
                    *elem += terms.iter().map(|term| term.evaluate(bra, ket)).sum::<f64>();
                });
            });
        tensor.persist(h, rows_view, cols_view, &block)?;
    }
    Ok(())
}
