//! # dcrdm: relaxed two-particle density matrices for density cumulant gradients
//!
//! `dcrdm` assembles the relaxed two-particle reduced density matrix (TPDM) required for analytic
//! gradients of density cumulant functional theory (DC-06). The TPDM is built block by block in a
//! spin-orbital basis partitioned into occupied and virtual spaces of both spins, with every block
//! stored in irreducible-representation blocks of an Abelian point group:
//! - the OOOO blocks `Γ <OO|OO>`, `Γ <Oo|Oo>`, and `Γ <oo|oo>`,
//! - the OOVV blocks and their VVOO transposes,
//! - the six OVOV blocks including the mixed-spin `Γ <Ov|oV>` and `Γ <oV|Ov>`, and
//! - the VVVV blocks `Γ <VV|VV>`, `Γ <Vv|Vv>`, and `Γ <vv|vv>`.
//!
//! Uppercase orbital labels denote alpha-spin orbitals and lowercase labels beta-spin orbitals.
//! The traces of the assembled densities can be checked against the number of electrons.
//!
//! ## Getting started
//!
//! The binary `dcrdm` reads a YAML input file naming the orbital spaces, a binary store of
//! response amplitudes, and a binary file of one-particle response quantities:
//!
//! ```bash
//! dcrdm --config input.yml --output dcrdm.out
//! ```
//!
//! Within Rust, the [`drivers::relaxed_density::RelaxedDensityDriver`] runs the whole assembly,
//! and the individual builders in [`density`] can be called directly.

pub mod density;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod onepdm;
pub mod space;
pub mod tensor;
