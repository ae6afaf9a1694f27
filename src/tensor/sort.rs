//! Index permutations of block tensors.

use std::fmt;
use std::str::FromStr;

use anyhow::{self, ensure, format_err};
use itertools::Itertools;
use ndarray::Axis;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::space::{PairPacking, PairSpace};
use crate::tensor::BlockTensor;

const INDEX_LETTERS: [char; 4] = ['p', 'q', 'r', 's'];

/// A permutation of the four indices `pqrs` of a block tensor.
///
/// The permutation is written as the source index letters in target order: the permutation
/// `prqs` produces a target `T'(pr|qs) = T(pq|rs)`, so that target position `k` carries the
/// source index `image[k]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SortPermutation {
    image: [usize; 4],
}

impl SortPermutation {
    /// Constructs a permutation from the source positions of the four target positions.
    pub fn from_image(image: [usize; 4]) -> Result<Self, anyhow::Error> {
        ensure!(
            image.iter().all(|&k| k < 4) && image.iter().all_unique(),
            "{image:?} is not a permutation of four indices."
        );
        Ok(Self { image })
    }

    pub fn identity() -> Self {
        Self {
            image: [0, 1, 2, 3],
        }
    }

    pub fn image(&self) -> &[usize; 4] {
        &self.image
    }

    /// Returns the permutation that undoes this one.
    pub fn inverse(&self) -> Self {
        let mut image = [0; 4];
        self.image
            .iter()
            .enumerate()
            .for_each(|(target, &source)| image[source] = target);
        Self { image }
    }

    /// Maps the four target indices onto the four source indices.
    pub fn source_indices(&self, target: [usize; 4]) -> [usize; 4] {
        let mut source = [0; 4];
        self.image
            .iter()
            .zip(target.iter())
            .for_each(|(&k, &idx)| source[k] = idx);
        source
    }
}

impl FromStr for SortPermutation {
    type Err = anyhow::Error;

    /// Parses a permutation written as four distinct letters from `pqrs`, *e.g.* `psqr`.
    fn from_str(permstr: &str) -> Result<Self, Self::Err> {
        let image = permstr
            .chars()
            .map(|c| {
                INDEX_LETTERS
                    .iter()
                    .position(|&letter| letter == c)
                    .ok_or_else(|| format_err!("Invalid index letter `{c}` in `{permstr}`."))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let image: [usize; 4] = image
            .try_into()
            .map_err(|_| format_err!("Permutation `{permstr}` must have exactly four letters."))?;
        Self::from_image(image)
    }
}

impl fmt::Display for SortPermutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            self.image.iter().map(|&k| INDEX_LETTERS[k]).collect::<String>()
        )
    }
}

impl BlockTensor {
    /// Produces a new tensor whose indices are a permutation of the indices of this tensor.
    ///
    /// # Arguments
    ///
    /// * `permutation` - The index permutation.
    /// * `rows` - The row pair space of the result.
    /// * `cols` - The column pair space of the result.
    /// * `label` - The name of the result.
    ///
    /// # Errors
    ///
    /// Errors if the orbital spaces of the result are not the permuted orbital spaces of this
    /// tensor, or if an antisymmetrically packed pair of the result does not come from an
    /// antisymmetrically packed pair of this tensor.
    pub fn resort(
        &self,
        permutation: SortPermutation,
        rows: PairSpace,
        cols: PairSpace,
        label: &str,
    ) -> Result<BlockTensor, anyhow::Error> {
        let source_spaces = [
            self.rows.p_space(),
            self.rows.q_space(),
            self.cols.p_space(),
            self.cols.q_space(),
        ];
        let target_spaces = [rows.p_space(), rows.q_space(), cols.p_space(), cols.q_space()];
        for (k, &source) in permutation.image().iter().enumerate() {
            ensure!(
                target_spaces[k] == source_spaces[source],
                "Sorting `{}` ({} × {}) by `{permutation}` cannot produce `{label}` ({rows} × {cols}): index {} spans `{}` instead of `{}`.",
                self.label,
                self.rows,
                self.cols,
                INDEX_LETTERS[k],
                target_spaces[k].label(),
                source_spaces[source].label()
            );
        }

        let source_packings = [self.rows.packing(), self.cols.packing()];
        for (pair, target_pair) in [&rows, &cols].into_iter().enumerate() {
            if target_pair.packing() != PairPacking::Antisymmetric {
                continue;
            }
            let (first, second) = (permutation.image()[2 * pair], permutation.image()[2 * pair + 1]);
            ensure!(
                first / 2 == second / 2
                    && source_packings[first / 2] == PairPacking::Antisymmetric,
                "Sorting `{}` ({} × {}) by `{permutation}` cannot produce `{label}` ({rows} × {cols}): indices {}{} are not antisymmetric in the source.",
                self.label,
                self.rows,
                self.cols,
                INDEX_LETTERS[2 * pair],
                INDEX_LETTERS[2 * pair + 1]
            );
        }

        let mut target = BlockTensor::zeros(label, rows, cols)?;
        let BlockTensor {
            rows, cols, blocks, ..
        } = &mut target;
        blocks.iter_mut().enumerate().for_each(|(h, block)| {
            let row_pairs = rows.pairs(h);
            let col_pairs = cols.pairs(h);
            block
                .axis_iter_mut(Axis(0))
                .into_par_iter()
                .zip(row_pairs.par_iter())
                .for_each(|(mut row, &(t0, t1))| {
                    row.iter_mut()
                        .zip(col_pairs.iter())
                        .for_each(|(elem, &(t2, t3))| {
                            let [p, q, r, s] = permutation.source_indices([t0, t1, t2, t3]);
                            *elem = self.get(p, q, r, s);
                        });
                });
        });
        log::debug!("Sorted `{}` by `{permutation}` into `{label}`.", self.label);
        Ok(target)
    }
}
