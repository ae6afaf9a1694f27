//! The occupied-occupied-occupied-occupied block of the relaxed TPDM.

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
#[path = "oooo_tests.rs"]
mod oooo_tests;

/// Builds the relaxed `Γ <OO|OO>`, `Γ <Oo|Oo>`, and `Γ <oo|oo>` blocks.
///
/// For each spin channel, the cumulant part `¼ · ½ (Λ Zᵀ + Z Λᵀ)` is formed by contracting the
/// response amplitudes over virtual pairs and symmetrising. The separable one-particle terms
/// built from `κ`, `τ`, and `τ̄` of the occupied space are then added element by element, with
/// same-spin blocks viewed over unrestricted occupied pairs so that every ordering of `(ij)` is
/// visited before the result is repacked.
///
/// # Arguments
///
/// * `spaces` - The orbital spaces.
/// * `amplitudes` - The store holding `Lambda <OO|VV>`, `Z <OO|VV>`, and their `Oo|Vv` and
/// `oo|vv` counterparts.
/// * `one_particle` - The one-particle response quantities.
/// * `density` - The store into which the three blocks are inserted.
///
/// # Errors
///
/// Errors if any input is missing or has inconsistent dimensions, in which case nothing is
/// written to `density`.
pub fn build_relaxed_oooo(
    spaces: &MoSpaces,
    amplitudes: &TensorStore,
    one_particle: &OneParticleResponse,
    density: &mut TensorStore,
) -> Result<(), anyhow::Error> {
    one_particle.check_against(spaces)?;
    let blocks = SpinChannel::ALL
        .iter()
        .map(|channel| {
            let oo = spaces.pair_space(channel.occupied_pair_label())?;
            let lambda = amplitudes.tensor(&channel.amplitude_label("Lambda"))?;
            let z = amplitudes.tensor(&channel.amplitude_label("Z"))?;
            let label = format!(
                "Gamma <{}|{}>",
                channel.occupied_tag(),
                channel.occupied_tag()
            );
            let mut gamma = BlockTensor::zeros(&label, oo.clone(), oo.clone())?;
            contract(
                lambda,
                z,
                &mut gamma,
                ContractionTarget::Rows,
                ContractionTarget::Rows,
                0.25,
                0.0,
            )?;
            gamma.symmetrise()?;

            let (spin1, spin2) = channel.spins();
            let first = one_particle.spin(spin1);
            let second = one_particle.spin(spin2);
            let (relaxed1, relaxed2) = (
                first.kappa_plus_occupied_tau(),
                second.kappa_plus_occupied_tau(),
            );
            let factors1 = ParticleFactors {
                kappa: Some(first.kappa()),
                relaxed: &relaxed1,
                ptau: first.occupied_ptau(),
                tau: first.occupied_tau(),
            };
            let factors2 = ParticleFactors {
                kappa: Some(second.kappa()),
                relaxed: &relaxed2,
                ptau: second.occupied_ptau(),
                tau: second.occupied_tau(),
            };
            let terms = match channel {
                SpinChannel::AlphaBeta => mixed_spin_terms(&factors1, &factors2),
                _ => same_spin_terms(&factors1),
            };
            accumulate_direct_products(&mut gamma, &oo.unpacked()?, &oo, &terms)?;
            log::debug!("Assembled `{label}` ({channel}).");
            Ok(gamma)
        })
        .collect::<Result<Vec<_>, anyhow::Error>>()?;
    density.extend(blocks);
    Ok(())
}
