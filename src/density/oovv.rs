//! The occupied-occupied-virtual-virtual blocks of the relaxed TPDM.

use anyhow;

use crate::density::SpinChannel;
use crate::space::MoSpaces;
use crate::tensor::sort::SortPermutation;
use crate::tensor::store::TensorStore;
use crate::tensor::BlockTensor;

#[cfg(test)]
#[path = "oovv_tests.rs"]
mod oovv_tests;

/// Builds the relaxed `Γ <OO|VV>`, `Γ <Oo|Vv>`, and `Γ <oo|vv>` blocks as `¼ (Λ + Z)`, together
/// with their transposes `Γ <VV|OO>`, `Γ <Vv|Oo>`, and `Γ <vv|oo>`.
///
/// # Errors
///
/// Errors if any input is missing, in which case nothing is written to `density`.
pub fn build_relaxed_oovv(
    spaces: &MoSpaces,
    amplitudes: &TensorStore,
    density: &mut TensorStore,
) -> Result<(), anyhow::Error> {
    let rspq = SortPermutation::from_image([2, 3, 0, 1])?;
    let blocks = SpinChannel::ALL
        .iter()
        .map(|channel| {
            let oo = spaces.pair_space(channel.occupied_pair_label())?;
            let vv = spaces.pair_space(channel.virtual_pair_label())?;
            let lambda = amplitudes.tensor(&channel.amplitude_label("Lambda"))?;
            let z = amplitudes.tensor(&channel.amplitude_label("Z"))?;
            let (occ, vir) = (channel.occupied_tag(), channel.virtual_tag());

            let mut gamma =
                BlockTensor::zeros(&format!("Gamma <{occ}|{vir}>"), oo.clone(), vv.clone())?;
            BlockTensor::linear_combination(lambda, z, &mut gamma, 0.25, 0.25, 0.0)?;
            let transposed = gamma.resort(rspq, vv, oo, &format!("Gamma <{vir}|{occ}>"))?;
            log::debug!("Assembled `{}` and `{}`.", gamma.label(), transposed.label());
            Ok([gamma, transposed])
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;
    density.extend(blocks.into_iter().flatten());
    Ok(())
}
