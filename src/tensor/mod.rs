//! Irrep-blocked four-index tensors stored as matrices over orbital-pair spaces.
//!
//! A [`BlockTensor`] holds one dense block per pair irreducible representation `h`, whose rows
//! range over the row pairs of symmetry `h` and whose columns range over the column pairs of the
//! same symmetry. Only totally symmetric tensors are representable, which is all that is needed
//! for density and amplitude quantities.

use std::fmt;

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use ndarray::{Array2, Zip};
use serde::{Deserialize, Serialize};

use crate::space::PairSpace;

pub mod contract;
pub mod sort;
pub mod store;


/// Structure to manage a four-index tensor `T(pq|rs)` stored in symmetry blocks over a row pair
/// space `(pq)` and a column pair space `(rs)`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BlockTensor {
    /// The name of the tensor in its store, *e.g.* `Gamma <OO|OO>`.
    label: String,

    /// The stored row pair space.
    rows: PairSpace,

    /// The stored column pair space.
    cols: PairSpace,

    /// The dense block of each pair irreducible representation.
    blocks: Vec<Array2<f64>>,
}

impl BlockTensor {
    /// Constructs a zero tensor.
    ///
    /// # Arguments
    ///
    /// * `label` - The name of the tensor.
    /// * `rows` - The stored row pair space.
    /// * `cols` - The stored column pair space.
    pub fn zeros(label: &str, rows: PairSpace, cols: PairSpace) -> Result<Self, anyhow::Error> {
        ensure!(
            rows.nirrep() == cols.nirrep(),
            "Row space `{rows}` and column space `{cols}` of `{label}` have different numbers of irreducible representations."
        );
        let blocks = (0..rows.nirrep())
            .map(|h| Array2::zeros((rows.npairs(h), cols.npairs(h))))
            .collect_vec();
        Ok(Self {
            label: label.to_string(),
            rows,
            cols,
            blocks,
        })
    }

    /// Constructs a tensor whose stored elements are generated from their absolute orbital
    /// indices.
    ///
    /// # Arguments
    ///
    /// * `f` - A function mapping `(p, q, r, s)` to the value of `T(pq|rs)`. It is only called
    /// for stored elements, *i.e.* for symmetry-allowed elements with `p > q` (resp. `r > s`)
    /// in antisymmetrically packed row (resp. column) spaces.
    pub fn from_fn<F>(
        label: &str,
        rows: PairSpace,
        cols: PairSpace,
        mut f: F,
    ) -> Result<Self, anyhow::Error>
    where
        F: FnMut(usize, usize, usize, usize) -> f64,
    {
        let mut tensor = Self::zeros(label, rows, cols)?;
        let BlockTensor {
            rows, cols, blocks, ..
        } = &mut tensor;
        blocks.iter_mut().enumerate().for_each(|(h, block)| {
            block.indexed_iter_mut().for_each(|((i, j), elem)| {
                let (p, q) = rows.pairs(h)[i];
                let (r, s) = cols.pairs(h)[j];
                *elem = f(p, q, r, s);
            })
        });
        Ok(tensor)
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Renames this tensor.
    pub fn with_label(mut self, label: &str) -> Self {
        self.label = label.to_string();
        self
    }

    pub fn rows(&self) -> &PairSpace {
        &self.rows
    }

    pub fn cols(&self) -> &PairSpace {
        &self.cols
    }

    pub fn nirrep(&self) -> usize {
        self.blocks.len()
    }

    /// Returns the stored block of pair irreducible representation `h`.
    pub fn block(&self, h: usize) -> Result<&Array2<f64>, anyhow::Error> {
        self.blocks.get(h).ok_or_else(|| {
            format_err!(
                "Tensor `{}` has no block for irreducible representation {h}.",
                self.label
            )
        })
    }

    /// Returns the value of `T(pq|rs)` for absolute orbital indices, taking packing signs into
    /// account. Symmetry-forbidden and vanishing elements are zero.
    pub fn get(&self, p: usize, q: usize, r: usize, s: usize) -> f64 {
        match (self.rows.locate(p, q), self.cols.locate(r, s)) {
            (Some((h_pq, i, sign_pq)), Some((h_rs, j, sign_rs))) if h_pq == h_rs => {
                sign_pq * sign_rs * self.blocks[h_pq][(i, j)]
            }
            _ => 0.0,
        }
    }

    fn check_views(&self, rows_view: &PairSpace, cols_view: &PairSpace) -> Result<(), anyhow::Error> {
        ensure!(
            rows_view.is_view_of(&self.rows),
            "Row view `{rows_view}` is incompatible with the stored rows `{}` of `{}`.",
            self.rows,
            self.label
        );
        ensure!(
            cols_view.is_view_of(&self.cols),
            "Column view `{cols_view}` is incompatible with the stored columns `{}` of `{}`.",
            self.cols,
            self.label
        );
        Ok(())
    }

    /// Materialises the block of pair irreducible representation `h` as seen through row and
    /// column views.
    ///
    /// Unpacked views onto antisymmetrically packed storage are expanded with the appropriate
    /// signs, with vanishing diagonal pairs set to zero.
    pub fn materialise(
        &self,
        h: usize,
        rows_view: &PairSpace,
        cols_view: &PairSpace,
    ) -> Result<Array2<f64>, anyhow::Error> {
        self.check_views(rows_view, cols_view)?;
        let stored = self.block(h)?;
        let row_positions = view_positions(rows_view, &self.rows, h);
        let col_positions = view_positions(cols_view, &self.cols, h);
        let mut block = Array2::zeros((row_positions.len(), col_positions.len()));
        block.indexed_iter_mut().for_each(|((i, j), elem)| {
            if let (Some((si, sign_i)), Some((sj, sign_j))) = (row_positions[i], col_positions[j])
            {
                *elem = sign_i * sign_j * stored[(si, sj)];
            }
        });
        Ok(block)
    }

    /// Writes a block materialised through row and column views back into storage.
    ///
    /// Only the elements corresponding to stored pairs are written. Elements of an unpacked view
    /// that correspond to non-canonical or vanishing pairs of packed storage are discarded.
    pub fn persist(
        &mut self,
        h: usize,
        rows_view: &PairSpace,
        cols_view: &PairSpace,
        block: &Array2<f64>,
    ) -> Result<(), anyhow::Error> {
        self.check_views(rows_view, cols_view)?;
        ensure!(
            block.dim() == (rows_view.npairs(h), cols_view.npairs(h)),
            "Block of shape {:?} cannot be persisted into irreducible representation {h} of `{}` viewed as `{rows_view}` × `{cols_view}`.",
            block.dim(),
            self.label
        );
        let row_positions = stored_positions(rows_view, &self.rows, h)?;
        let col_positions = stored_positions(cols_view, &self.cols, h)?;
        let stored = self.blocks.get_mut(h).ok_or_else(|| {
            format_err!(
                "Tensor `{}` has no block for irreducible representation {h}.",
                self.label
            )
        })?;
        stored.indexed_iter_mut().for_each(|((i, j), elem)| {
            *elem = block[(row_positions[i], col_positions[j])];
        });
        Ok(())
    }

    fn check_square(&self) -> Result<(), anyhow::Error> {
        ensure!(
            self.rows == self.cols,
            "Tensor `{}` with rows `{}` and columns `{}` is not square.",
            self.label,
            self.rows,
            self.cols
        );
        Ok(())
    }

    /// Replaces this tensor by `(T + Tᵀ) / 2`, where the transpose exchanges bra and ket pairs.
    ///
    /// # Errors
    ///
    /// Errors if the row and column pair spaces differ.
    pub fn symmetrise(&mut self) -> Result<(), anyhow::Error> {
        self.check_square()?;
        self.blocks.iter_mut().for_each(|block| {
            let symmetrised = (&*block + &block.t()) * 0.5;
            *block = symmetrised;
        });
        Ok(())
    }

    /// Returns the largest absolute difference between `T(pq|rs)` and `T(rs|pq)` over all stored
    /// elements.
    pub fn max_asymmetry(&self) -> Result<f64, anyhow::Error> {
        self.check_square()?;
        Ok(self
            .blocks
            .iter()
            .map(|block| {
                Zip::from(block)
                    .and(block.t())
                    .fold(0.0, |acc: f64, a, b| acc.max((a - b).abs()))
            })
            .fold(0.0, f64::max))
    }

    /// Computes `c = alpha a + beta b + gamma c` elementwise.
    ///
    /// # Errors
    ///
    /// Errors if the three tensors do not share the same row and column pair spaces.
    pub fn linear_combination(
        a: &BlockTensor,
        b: &BlockTensor,
        c: &mut BlockTensor,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<(), anyhow::Error> {
        for operand in [a, b] {
            ensure!(
                operand.rows == c.rows && operand.cols == c.cols,
                "Tensor `{}` of shape `{}` × `{}` cannot be combined into `{}` of shape `{}` × `{}`.",
                operand.label,
                operand.rows,
                operand.cols,
                c.label,
                c.rows,
                c.cols
            );
        }
        c.blocks
            .iter_mut()
            .zip(a.blocks.iter().zip(b.blocks.iter()))
            .for_each(|(c_h, (a_h, b_h))| {
                Zip::from(c_h)
                    .and(a_h)
                    .and(b_h)
                    .for_each(|c_elem, &a_elem, &b_elem| {
                        *c_elem = alpha * a_elem + beta * b_elem + gamma * *c_elem;
                    });
            });
        Ok(())
    }

    /// Returns the sum of the diagonal elements of all stored blocks.
    pub fn diagonal_sum(&self) -> Result<f64, anyhow::Error> {
        self.check_square()?;
        Ok(self.blocks.iter().map(|block| block.diag().sum()).sum())
    }

    /// Returns the Frobenius norm over all stored elements.
    pub fn norm(&self) -> f64 {
        self.blocks
            .iter()
            .map(|block| block.iter().map(|x| x * x).sum::<f64>())
            .sum::<f64>()
            .sqrt()
    }
}

impl fmt::Display for BlockTensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} × {} ({})",
            self.label,
            self.rows,
            self.cols,
            self.blocks
                .iter()
                .map(|block| format!("{}×{}", block.nrows(), block.ncols()))
                .join(", ")
        )
    }
}

/// Maps each pair of a view onto its stored position and sign. Pairs without storage map to
/// `None`.
fn view_positions(view: &PairSpace, stored: &PairSpace, h: usize) -> Vec<Option<(usize, f64)>> {
    view.pairs(h)
        .iter()
        .map(|&(p, q)| stored.locate(p, q).map(|(_, idx, sign)| (idx, sign)))
        .collect_vec()
}

/// Maps each stored pair onto its position in a view.
fn stored_positions(
    view: &PairSpace,
    stored: &PairSpace,
    h: usize,
) -> Result<Vec<usize>, anyhow::Error> {
    stored
        .pairs(h)
        .iter()
        .map(|&(p, q)| {
            view.locate(p, q)
                .filter(|&(_, _, sign)| sign > 0.0)
                .map(|(_, idx, _)| idx)
                .ok_or_else(|| format_err!("Stored pair ({p}, {q}) is absent from view `{view}`."))
        })
        .collect()
}
