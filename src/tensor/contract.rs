//! Pair-space contractions of block tensors.

use anyhow::{self, ensure};
use ndarray::linalg::general_mat_mul;

use crate::tensor::BlockTensor;

/// Which pair space of an operand survives into the result of a contraction.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContractionTarget {
    /// The row pairs survive and the column pairs are summed over.
    Rows,

    /// The column pairs survive and the row pairs are summed over.
    Columns,
}

/// Computes `C = alpha A B + beta C`, where `A` and `B` are contracted over one pair index each.
///
/// For each pair irreducible representation the surviving pairs of `a` index the rows of `c` and
/// the surviving pairs of `b` index the columns of `c`. The sum runs over the stored pairs of
/// the contracted pair space, so antisymmetrically packed pair spaces are summed over canonical
/// pairs only.
///
/// # Arguments
///
/// * `a` - The first operand.
/// * `b` - The second operand.
/// * `c` - The result, which is accumulated into.
/// * `a_target` - The pair space of `a` that survives.
/// * `b_target` - The pair space of `b` that survives.
/// * `alpha` - The scaling factor of the product.
/// * `beta` - The scaling factor of the prior contents of `c`.
///
/// # Errors
///
/// Errors if the contracted pair spaces of `a` and `b` differ, or if the surviving pair spaces
/// do not match the row and column pair spaces of `c`.
pub fn contract(
    a: &BlockTensor,
    b: &BlockTensor,
    c: &mut BlockTensor,
    a_target: ContractionTarget,
    b_target: ContractionTarget,
    alpha: f64,
    beta: f64,
) -> Result<(), anyhow::Error> {
    let (a_kept, a_summed) = match a_target {
        ContractionTarget::Rows => (&a.rows, &a.cols),
        ContractionTarget::Columns => (&a.cols, &a.rows),
    };
    let (b_kept, b_summed) = match b_target {
        ContractionTarget::Rows => (&b.rows, &b.cols),
        ContractionTarget::Columns => (&b.cols, &b.rows),
    };
    ensure!(
        a_summed == b_summed,
        "Cannot contract `{}` over `{a_summed}` with `{}` over `{b_summed}`.",
        a.label,
        b.label
    );
    ensure!(
        a_kept == &c.rows && b_kept == &c.cols,
        "Contraction of `{}` and `{}` yields `{a_kept}` × `{b_kept}`, but `{}` is `{}` × `{}`.",
        a.label,
        b.label,
        c.label,
        c.rows,
        c.cols
    );

    c.blocks
        .iter_mut()
        .zip(a.blocks.iter().zip(b.blocks.iter()))
        .for_each(|(c_h, (a_h, b_h))| {
            let a_op = match a_target {
                ContractionTarget::Rows => a_h.view(),
                ContractionTarget::Columns => a_h.t(),
            };
            let b_op = match b_target {
                ContractionTarget::Rows => b_h.t(),
                ContractionTarget::Columns => b_h.view(),
            };
            if a_op.is_empty() || b_op.is_empty() {
                c_h.mapv_inplace(|x| beta * x);
            } else {
                general_mat_mul(alpha, &a_op, &b_op, beta, c_h);
            }
        });
    log::debug!(
        "Contracted `{}` and `{}` into `{}` (alpha = {alpha}, beta = {beta}).",
        a.label,
        b.label,
        c.label
    );
    Ok(())
}
