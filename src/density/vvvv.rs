//! The virtual-virtual-virtual-virtual block of the relaxed TPDM.

use anyhow;

use crate::density::{
    accumulate_direct_products, mixed_spin_terms, same_spin_terms, ParticleFactors, SpinChannel,
};
use crate::onepdm::OneParticleResponse;
use crate::space::MoSpaces;
use crate::tensor::contract::{contract, ContractionTarget};
use crate::tensor::store::TensorStore;
use crate::tensor::BlockTensor;

#[cfg(test)]
#[path = "vvvv_tests.rs"]
mod vvvv_tests;

/// Builds the relaxed `Γ <VV|VV>`, `Γ <Vv|Vv>`, and `Γ <vv|vv>` blocks.
///
/// The cumulant part `¼ · ½ (Λᵀ Z + Zᵀ Λ)` is formed by contracting the response amplitudes over
/// occupied pairs, after which the separable terms built from the virtual `τ` and `τ̄` are
/// added. There is no reference-occupation contribution in the virtual space.
///
/// # Errors
///
/// Errors if any input is missing or has inconsistent dimensions, in which case nothing is
/// written to `density`.
pub fn build_relaxed_vvvv(
    spaces: &MoSpaces,
    amplitudes: &TensorStore,
    one_particle: &OneParticleResponse,
    density: &mut TensorStore,
) -> Result<(), anyhow::Error> {
    one_particle.check_against(spaces)?;
    let blocks = SpinChannel::ALL
        .iter()
        .map(|channel| {
            let vv = spaces.pair_space(channel.virtual_pair_label())?;
            let lambda = amplitudes.tensor(&channel.amplitude_label("Lambda"))?;
            let z = amplitudes.tensor(&channel.amplitude_label("Z"))?;
            let label = format!("Gamma <{}|{}>", channel.virtual_tag(), channel.virtual_tag());
            let mut gamma = BlockTensor::zeros(&label, vv.clone(), vv.clone())?;
            contract(
                lambda,
                z,
                &mut gamma,
                ContractionTarget::Columns,
                ContractionTarget::Columns,
                0.25,
                0.0,
            )?;
            gamma.symmetrise()?;

            let (spin1, spin2) = channel.spins();
            let (first, second) = (one_particle.spin(spin1), one_particle.spin(spin2));
            let factors1 = ParticleFactors {
                kappa: None,
                relaxed: first.virtual_tau(),
                ptau: first.virtual_ptau(),
                tau: first.virtual_tau(),
            };
            let factors2 = ParticleFactors {
                kappa: None,
                relaxed: second.virtual_tau(),
                ptau: second.virtual_ptau(),
                tau: second.virtual_tau(),
            };
            let terms = match channel {
                SpinChannel::AlphaBeta => mixed_spin_terms(&factors1, &factors2),
                _ => same_spin_terms(&factors1),
            };
            accumulate_direct_products(&mut gamma, &vv.unpacked()?, &vv, &terms)?;
            log::debug!("Assembled `{label}` ({channel}).");
            Ok(gamma)
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;
    density.extend(blocks);
    Ok(())
}
