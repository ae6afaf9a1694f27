//! The occupied-virtual-occupied-virtual blocks of the relaxed TPDM.
//!
//! These blocks are assembled in chemists' notation `(ia|jb)`, where the response amplitudes and
//! intermediates of every spin combination couple through contractions over occupied-virtual
//! pairs, and are then sorted into physicists' notation `<ib|ja>`.

use std::fmt;

use anyhow;

use crate::density::{accumulate_direct_products, DirectProductTerm, Pairing};
use crate::onepdm::OneParticleResponse;
use crate::space::{MoSpaces, Spin};
use crate::tensor::contract::{contract, ContractionTarget};
use crate::tensor::sort::SortPermutation;
use crate::tensor::store::TensorStore;
use crate::tensor::BlockTensor;

#[cfg(test)]
#[path = "ovov_tests.rs"]
mod ovov_tests;

/// Chemists'-notation orbital-response intermediates required by the OVOV blocks, given as
/// source label, permutation, row space, column space, and result label. Later entries may
/// depend on earlier ones.
const RESPONSE_SORTS: [(&str, &str, &str, &str, &str); 4] = [
    ("Z <OO|VV>", "prqs", "[O,V]", "[O,V]", "Z (OV|OV)"),
    ("Z <Oo|Vv>", "psqr", "[O,v]", "[o,V]", "Z (Ov|oV)"),
    ("Z <oo|vv>", "prqs", "[o,v]", "[o,v]", "Z (ov|ov)"),
    ("Z (Ov|oV)", "psrq", "[O,V]", "[o,v]", "Z (OV|ov)"),
];

/// Spin cases of the relaxed OVOV blocks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum OvovSpinCase {
    /// `Γ <OV|OV>`.
    AlphaAlpha,

    /// `Γ <ov|ov>`.
    BetaBeta,

    /// `Γ <Ov|Ov>`, with alpha occupied and beta virtual orbitals.
    AlphaOccupiedBetaVirtual,

    /// `Γ <oV|oV>`, with beta occupied and alpha virtual orbitals.
    BetaOccupiedAlphaVirtual,

    /// `Γ <Ov|oV>` and its transpose `Γ <oV|Ov>`, which couple all four orbital spaces.
    Mixed,
}

/// A single accumulation `C += alpha A B` into an OVOV intermediate.
struct ContractionStep {
    first: &'static str,
    second: &'static str,
    first_target: ContractionTarget,
    second_target: ContractionTarget,
    alpha: f64,
}

/// How the blocks of one [`OvovSpinCase`] are assembled.
struct OvovRecipe {
    /// Label, row space, and column space of the intermediate the contractions accumulate into.
    intermediate: (&'static str, &'static str, &'static str),

    steps: Vec<ContractionStep>,

    /// Whether the intermediate is symmetrised after the contractions.
    symmetrise: bool,

    /// Permutation, row space, column space, and label of each block sorted out of the
    /// intermediate. If empty, the intermediate is itself the block.
    sorts: Vec<(&'static str, &'static str, &'static str, &'static str)>,

    /// Spins of the occupied and virtual one-particle quantities entering the separable
    /// correction, if any.
    correction: Option<(Spin, Spin)>,
}

impl ContractionStep {
    fn new(
        first: &'static str,
        second: &'static str,
        first_target: ContractionTarget,
        second_target: ContractionTarget,
        alpha: f64,
    ) -> Self {
        Self {
            first,
            second,
            first_target,
            second_target,
            alpha,
        }
    }
}

impl OvovSpinCase {
    pub const ALL: [OvovSpinCase; 5] = [
        OvovSpinCase::AlphaAlpha,
        OvovSpinCase::BetaBeta,
        OvovSpinCase::AlphaOccupiedBetaVirtual,
        OvovSpinCase::BetaOccupiedAlphaVirtual,
        OvovSpinCase::Mixed,
    ];

    /// Returns the labels of the density blocks produced for this spin case.
    pub fn block_labels(&self) -> Vec<&'static str> {
        let recipe = self.recipe();
        if recipe.sorts.is_empty() {
            vec![recipe.intermediate.0]
        } else {
            recipe.sorts.iter().map(|(_, _, _, label)| *label).collect()
        }
    }

    fn recipe(&self) -> OvovRecipe {
        use ContractionTarget::{Columns, Rows};
        match self {
            OvovSpinCase::AlphaAlpha => OvovRecipe {
                intermediate: ("Gamma (OV|OV)", "[O,V]", "[O,V]"),
                steps: vec![
                    ContractionStep::new("Lambda (OV|OV)", "Z (OV|OV)", Rows, Rows, -1.0),
                    ContractionStep::new("Lambda (OV|ov)", "Z (OV|ov)", Rows, Rows, -1.0),
                ],
                symmetrise: true,
                sorts: vec![("psrq", "[O,V]", "[O,V]", "Gamma <OV|OV>")],
                correction: Some((Spin::Alpha, Spin::Alpha)),
            },
            OvovSpinCase::BetaBeta => OvovRecipe {
                intermediate: ("Gamma (ov|ov)", "[o,v]", "[o,v]"),
                steps: vec![
                    ContractionStep::new("Lambda (ov|ov)", "Z (ov|ov)", Rows, Rows, -1.0),
                    ContractionStep::new("Lambda (OV|ov)", "Z (OV|ov)", Columns, Columns, -1.0),
                ],
                symmetrise: true,
                sorts: vec![("psrq", "[o,v]", "[o,v]", "Gamma <ov|ov>")],
                correction: Some((Spin::Beta, Spin::Beta)),
            },
            OvovSpinCase::AlphaOccupiedBetaVirtual => OvovRecipe {
                intermediate: ("Gamma <Ov|Ov>", "[O,v]", "[O,v]"),
                steps: vec![ContractionStep::new(
                    "Lambda (Ov|oV)",
                    "Z (Ov|oV)",
                    Rows,
                    Rows,
                    -1.0,
                )],
                symmetrise: true,
                sorts: vec![],
                correction: Some((Spin::Alpha, Spin::Beta)),
            },
            OvovSpinCase::BetaOccupiedAlphaVirtual => OvovRecipe {
                intermediate: ("Gamma <oV|oV>", "[o,V]", "[o,V]"),
                steps: vec![ContractionStep::new(
                    "Lambda (Ov|oV)",
                    "Z (Ov|oV)",
                    Columns,
                    Columns,
                    -1.0,
                )],
                symmetrise: true,
                sorts: vec![],
                correction: Some((Spin::Beta, Spin::Alpha)),
            },
            OvovSpinCase::Mixed => OvovRecipe {
                intermediate: ("Temp (OV|ov)", "[O,V]", "[o,v]"),
                steps: vec![
                    ContractionStep::new("Lambda (OV|OV)", "Z (OV|ov)", Rows, Columns, -0.5),
                    ContractionStep::new("Z (OV|OV)", "Lambda (OV|ov)", Rows, Columns, -0.5),
                    ContractionStep::new("Lambda (OV|ov)", "Z (ov|ov)", Rows, Columns, -0.5),
                    ContractionStep::new("Z (OV|ov)", "Lambda (ov|ov)", Rows, Columns, -0.5),
                ],
                symmetrise: false,
                sorts: vec![
                    ("psrq", "[O,v]", "[o,V]", "Gamma <Ov|oV>"),
                    ("rqps", "[o,V]", "[O,v]", "Gamma <oV|Ov>"),
                ],
                correction: None,
            },
        }
    }
}

impl fmt::Display for OvovSpinCase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.block_labels().join(", "))
    }
}

/// Looks a tensor up in the local intermediates first and in the amplitude store second.
fn fetch<'a>(
    scratch: &'a TensorStore,
    amplitudes: &'a TensorStore,
    label: &str,
) -> Result<&'a BlockTensor, anyhow::Error> {
    if scratch.contains(label) {
        scratch.tensor(label)
    } else {
        amplitudes.tensor(label)
    }
}

fn build_spin_case(
    case: OvovSpinCase,
    spaces: &MoSpaces,
    amplitudes: &TensorStore,
    scratch: &TensorStore,
    one_particle: &OneParticleResponse,
) -> Result<Vec<BlockTensor>, anyhow::Error> {
    let recipe = case.recipe();
    let (label, rows, cols) = recipe.intermediate;
    let mut intermediate =
        BlockTensor::zeros(label, spaces.pair_space(rows)?, spaces.pair_space(cols)?)?;
    for step in recipe.steps.iter() {
        contract(
            fetch(scratch, amplitudes, step.first)?,
            fetch(scratch, amplitudes, step.second)?,
            &mut intermediate,
            step.first_target,
            step.second_target,
            step.alpha,
            1.0,
        )?;
    }
    if recipe.symmetrise {
        intermediate.symmetrise()?;
    }

    let mut blocks = if recipe.sorts.is_empty() {
        vec![intermediate]
    } else {
        recipe
            .sorts
            .iter()
            .map(|(permutation, rows, cols, label)| {
                intermediate.resort(
                    permutation.parse::<SortPermutation>()?,
                    spaces.pair_space(rows)?,
                    spaces.pair_space(cols)?,
                    label,
                )
            })
            .collect::<Result<Vec<_>, _>>()?
    };

    if let Some((occupied_spin, virtual_spin)) = recipe.correction {
        let occupied = one_particle.spin(occupied_spin);
        let virtuals = one_particle.spin(virtual_spin);
        let relaxed = occupied.kappa_plus_occupied_tau();
        let excess = occupied.occupied_ptau_minus_tau();
        let terms = [
            DirectProductTerm::new(1.0, Pairing::IK, &relaxed, virtuals.virtual_ptau()),
            DirectProductTerm::new(1.0, Pairing::JL, virtuals.virtual_tau(), &excess),
        ];
        for block in blocks.iter_mut() {
            let (rows, cols) = (block.rows().clone(), block.cols().clone());
            accumulate_direct_products(block, &rows, &cols, &terms)?;
            block.symmetrise()?;
        }
    }
    log::debug!("Assembled OVOV spin case {case}.");
    Ok(blocks)
}

/// Builds the relaxed OVOV blocks `Γ <OV|OV>`, `Γ <ov|ov>`, `Γ <Ov|Ov>`, `Γ <oV|oV>`,
/// `Γ <Ov|oV>`, and `Γ <oV|Ov>`.
///
/// The orbital-response intermediates `Z` are first sorted into chemists' notation in a local
/// scratch store, leaving the amplitude store untouched. The chemists'-notation cumulant response
/// amplitudes `Lambda (OV|OV)`, `Lambda (OV|ov)`, `Lambda (ov|ov)`, and `Lambda (Ov|oV)` are read
/// from the amplitude store. Every same-spin and single-crossing block then receives the
/// separable correction `(κ + τ)(i,j) τ̄(a,b) + τ(a,b) (τ̄ - τ)(i,j)` of its occupied and virtual
/// spins and is symmetrised.
///
/// # Errors
///
/// Errors if any input is missing or has inconsistent dimensions, in which case nothing is
/// written to `density`.
pub fn build_relaxed_ovov(
    spaces: &MoSpaces,
    amplitudes: &TensorStore,
    one_particle: &OneParticleResponse,
    density: &mut TensorStore,
) -> Result<(), anyhow::Error> {
    one_particle.check_against(spaces)?;
    let mut scratch = TensorStore::new("OVOV response intermediates");
    for (source, permutation, rows, cols, label) in RESPONSE_SORTS {
        let sorted = fetch(&scratch, amplitudes, source)?.resort(
            permutation.parse()?,
            spaces.pair_space(rows)?,
            spaces.pair_space(cols)?,
            label,
        )?;
        scratch.insert(sorted);
    }

    let blocks = OvovSpinCase::ALL
        .iter()
        .map(|case| build_spin_case(*case, spaces, amplitudes, &scratch, one_particle))
        .collect::<Result<Vec<_>, anyhow::Error>>()?;
    density.extend(blocks.into_iter().flatten());
    Ok(())
}
