//! Spin-resolved one-particle response quantities.
//!
//! Each spin channel carries the reference occupation `κ` over occupied orbitals, the
//! one-particle cumulant-derived corrections `τ` over occupied and virtual orbitals, and their
//! perturbed counterparts `τ̄`. All are block-diagonal over irreducible representations.

use std::fmt;
use std::ops::{Add, Sub};

use anyhow::{self, ensure, format_err};
use approx;
use derive_builder::Builder;
use itertools::Itertools;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::space::{MoSpaces, Spin};

#[cfg(test)]
#[path = "onepdm_tests.rs"]
mod onepdm_tests;

// ==================
// Struct definitions
// ==================

// -------------------
// BlockDiagonalMatrix
// -------------------

/// A real symmetric-shaped matrix that is block-diagonal over irreducible representations.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockDiagonalMatrix {
    blocks: Vec<Array2<f64>>,
}

impl BlockDiagonalMatrix {
    /// Constructs a block-diagonal matrix from its square blocks.
    pub fn new(blocks: Vec<Array2<f64>>) -> Result<Self, anyhow::Error> {
        for (h, block) in blocks.iter().enumerate() {
            ensure!(
                block.is_square(),
                "Block {h} of shape {:?} is not square.",
                block.dim()
            );
        }
        Ok(Self { blocks })
    }

    pub fn zeros(dims: &[usize]) -> Self {
        Self {
            blocks: dims.iter().map(|&n| Array2::zeros((n, n))).collect_vec(),
        }
    }

    pub fn identity(dims: &[usize]) -> Self {
        Self {
            blocks: dims.iter().map(|&n| Array2::eye(n)).collect_vec(),
        }
    }

    pub fn nirrep(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the dimension of each block.
    pub fn dims(&self) -> Vec<usize> {
        self.blocks.iter().map(|block| block.nrows()).collect_vec()
    }

    pub fn block(&self, h: usize) -> Result<&Array2<f64>, anyhow::Error> {
        self.blocks
            .get(h)
            .ok_or_else(|| format_err!("No block for irreducible representation {h}."))
    }

    /// Returns element `(i, j)` of block `h`, where `i` and `j` are indices relative to the start
    /// of the irreducible representation.
    pub fn get(&self, h: usize, i: usize, j: usize) -> f64 {
        self.blocks[h][(i, j)]
    }

    pub fn trace(&self) -> f64 {
        self.blocks.iter().map(|block| block.diag().sum()).sum()
    }

    /// Checks if every block is symmetric within a threshold.
    pub fn is_symmetric(&self, threshold: f64) -> bool {
        self.blocks.iter().all(|block| {
            Zip::from(block).and(block.t()).all(|&a, &b| {
                approx::relative_eq!(a, b, epsilon = threshold, max_relative = threshold)
            })
        })
    }
}

impl fmt::Display for BlockDiagonalMatrix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BlockDiagonalMatrix[{}]",
            self.dims().iter().map(|n| format!("{n}×{n}")).join(", ")
        )
    }
}

// ---
// Add
// ---
impl Add<&'_ BlockDiagonalMatrix> for &BlockDiagonalMatrix {
    type Output = BlockDiagonalMatrix;

    fn add(self, rhs: &BlockDiagonalMatrix) -> Self::Output {
        assert_eq!(
            self.dims(),
            rhs.dims(),
            "Inconsistent block dimensions between `self` and `rhs`."
        );
        BlockDiagonalMatrix {
            blocks: self
                .blocks
                .iter()
                .zip(rhs.blocks.iter())
                .map(|(a, b)| a + b)
                .collect_vec(),
        }
    }
}

// ---
// Sub
// ---
impl Sub<&'_ BlockDiagonalMatrix> for &BlockDiagonalMatrix {
    type Output = BlockDiagonalMatrix;

    fn sub(self, rhs: &BlockDiagonalMatrix) -> Self::Output {
        assert_eq!(
            self.dims(),
            rhs.dims(),
            "Inconsistent block dimensions between `self` and `rhs`."
        );
        BlockDiagonalMatrix {
            blocks: self
                .blocks
                .iter()
                .zip(rhs.blocks.iter())
                .map(|(a, b)| a - b)
                .collect_vec(),
        }
    }
}

// ---------------
// SpinOneParticle
// ---------------

/// One-particle response quantities of a single spin channel.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SpinOneParticle {
    /// The reference occupation over occupied orbitals.
    kappa: BlockDiagonalMatrix,

    /// The cumulant-derived correction over occupied orbitals.
    occupied_tau: BlockDiagonalMatrix,

    /// The perturbed cumulant-derived correction over occupied orbitals.
    occupied_ptau: BlockDiagonalMatrix,

    /// The cumulant-derived correction over virtual orbitals.
    virtual_tau: BlockDiagonalMatrix,

    /// The perturbed cumulant-derived correction over virtual orbitals.
    virtual_ptau: BlockDiagonalMatrix,
}

impl SpinOneParticleBuilder {
    fn validate(&self) -> Result<(), String> {
        let kappa = self.kappa.as_ref().ok_or("No `kappa` found.".to_string())?;
        let occupied = [
            ("occupied_tau", self.occupied_tau.as_ref()),
            ("occupied_ptau", self.occupied_ptau.as_ref()),
        ];
        for (name, matrix) in occupied {
            let matrix = matrix.ok_or(format!("No `{name}` found."))?;
            if matrix.dims() != kappa.dims() {
                return Err(format!(
                    "`{name}` has block dimensions {:?}, but `kappa` has {:?}.",
                    matrix.dims(),
                    kappa.dims()
                ));
            }
        }
        let virtual_tau = self
            .virtual_tau
            .as_ref()
            .ok_or("No `virtual_tau` found.".to_string())?;
        let virtual_ptau = self
            .virtual_ptau
            .as_ref()
            .ok_or("No `virtual_ptau` found.".to_string())?;
        if virtual_tau.dims() != virtual_ptau.dims() {
            return Err(format!(
                "`virtual_ptau` has block dimensions {:?}, but `virtual_tau` has {:?}.",
                virtual_ptau.dims(),
                virtual_tau.dims()
            ));
        }
        if virtual_tau.nirrep() != kappa.nirrep() {
            return Err(format!(
                "Occupied quantities have {} irreducible representations, but virtual ones have {}.",
                kappa.nirrep(),
                virtual_tau.nirrep()
            ));
        }
        Ok(())
    }
}

impl SpinOneParticle {
    /// Returns a builder to construct a new [`SpinOneParticle`].
    pub fn builder() -> SpinOneParticleBuilder {
        SpinOneParticleBuilder::default()
    }

    /// Constructs the quantities of an uncorrelated reference: `κ` is the identity over the
    /// occupied orbitals and every `τ` and `τ̄` vanishes.
    pub fn reference(occupied_dims: &[usize], virtual_dims: &[usize]) -> Self {
        Self {
            kappa: BlockDiagonalMatrix::identity(occupied_dims),
            occupied_tau: BlockDiagonalMatrix::zeros(occupied_dims),
            occupied_ptau: BlockDiagonalMatrix::zeros(occupied_dims),
            virtual_tau: BlockDiagonalMatrix::zeros(virtual_dims),
            virtual_ptau: BlockDiagonalMatrix::zeros(virtual_dims),
        }
    }

    pub fn kappa(&self) -> &BlockDiagonalMatrix {
        &self.kappa
    }

    pub fn occupied_tau(&self) -> &BlockDiagonalMatrix {
        &self.occupied_tau
    }

    pub fn occupied_ptau(&self) -> &BlockDiagonalMatrix {
        &self.occupied_ptau
    }

    pub fn virtual_tau(&self) -> &BlockDiagonalMatrix {
        &self.virtual_tau
    }

    pub fn virtual_ptau(&self) -> &BlockDiagonalMatrix {
        &self.virtual_ptau
    }

    /// Returns `κ + τ` over occupied orbitals.
    pub fn kappa_plus_occupied_tau(&self) -> BlockDiagonalMatrix {
        &self.kappa + &self.occupied_tau
    }

    /// Returns `τ̄ - τ` over occupied orbitals.
    pub fn occupied_ptau_minus_tau(&self) -> BlockDiagonalMatrix {
        &self.occupied_ptau - &self.occupied_tau
    }

    /// Returns the contribution of this spin channel to the trace of the one-particle density
    /// matrix, `tr κ + tr τ_occ + tr τ_vir`.
    pub fn trace(&self) -> f64 {
        self.kappa.trace() + self.occupied_tau.trace() + self.virtual_tau.trace()
    }

    fn iter_named(&self) -> impl Iterator<Item = (&'static str, &BlockDiagonalMatrix)> {
        [
            ("kappa", &self.kappa),
            ("occupied_tau", &self.occupied_tau),
            ("occupied_ptau", &self.occupied_ptau),
            ("virtual_tau", &self.virtual_tau),
            ("virtual_ptau", &self.virtual_ptau),
        ]
        .into_iter()
    }
}

// -------------------
// OneParticleResponse
// -------------------

/// Spin-resolved one-particle response quantities.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct OneParticleResponse {
    alpha: SpinOneParticle,

    beta: SpinOneParticle,
}

impl OneParticleResponse {
    /// Returns a builder to construct a new [`OneParticleResponse`].
    pub fn builder() -> OneParticleResponseBuilder {
        OneParticleResponseBuilder::default()
    }

    /// Constructs the quantities of an uncorrelated reference in the given orbital spaces.
    pub fn reference(spaces: &MoSpaces) -> Result<Self, anyhow::Error> {
        let spin_reference = |occ: char, vir: char| -> Result<SpinOneParticle, anyhow::Error> {
            Ok(SpinOneParticle::reference(
                spaces.orbitals_per_irrep(occ)?,
                spaces.orbitals_per_irrep(vir)?,
            ))
        };
        Ok(Self {
            alpha: spin_reference('O', 'V')?,
            beta: spin_reference('o', 'v')?,
        })
    }

    pub fn spin(&self, spin: Spin) -> &SpinOneParticle {
        match spin {
            Spin::Alpha => &self.alpha,
            Spin::Beta => &self.beta,
        }
    }

    /// Returns the trace of the one-particle density matrix summed over both spin channels.
    pub fn trace(&self) -> f64 {
        self.alpha.trace() + self.beta.trace()
    }

    /// Checks that the block dimensions of every quantity agree with the orbital spaces and that
    /// every quantity is symmetric.
    pub fn check_against(&self, spaces: &MoSpaces) -> Result<(), anyhow::Error> {
        for spin in [Spin::Alpha, Spin::Beta] {
            let occupied = spaces.occupied(spin)?;
            let virtuals = spaces.virtuals(spin)?;
            for (name, matrix) in self.spin(spin).iter_named() {
                let expected = if name.starts_with("occupied") || name == "kappa" {
                    occupied.orbitals_per_irrep()
                } else {
                    virtuals.orbitals_per_irrep()
                };
                ensure!(
                    matrix.dims() == expected,
                    "{spin} `{name}` has block dimensions {:?}, but the orbital space has {:?}.",
                    matrix.dims(),
                    expected
                );
                ensure!(
                    matrix.is_symmetric(1e-10),
                    "{spin} `{name}` is not symmetric."
                );
            }
        }
        Ok(())
    }
}

impl fmt::Display for OneParticleResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for spin in [Spin::Alpha, Spin::Beta] {
            let quantities = self.spin(spin);
            writeln!(
                f,
                "{spin}: tr κ = {:.8}, tr τ(occ) = {:.8}, tr τ(vir) = {:.8}",
                quantities.kappa().trace(),
                quantities.occupied_tau().trace(),
                quantities.virtual_tau().trace()
            )?;
        }
        Ok(())
    }
}
