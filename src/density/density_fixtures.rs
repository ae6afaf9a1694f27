//! Synthetic inputs for exercising the relaxed density builders.

use ndarray::Array2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::density::SpinChannel;
use crate::onepdm::{BlockDiagonalMatrix, OneParticleResponse, SpinOneParticle};
use crate::space::{MoSpaces, OrbitalSpace, Spin};
use crate::tensor::store::TensorStore;
use crate::tensor::BlockTensor;

/// Chemists'-notation cumulant response amplitudes, sorted from their physicists'-notation
/// counterparts in the same way as the orbital-response intermediates.
const LAMBDA_SORTS: [(&str, &str, &str, &str, &str); 4] = [
    ("Lambda <OO|VV>", "prqs", "[O,V]", "[O,V]", "Lambda (OV|OV)"),
    ("Lambda <Oo|Vv>", "psqr", "[O,v]", "[o,V]", "Lambda (Ov|oV)"),
    ("Lambda <oo|vv>", "prqs", "[o,v]", "[o,v]", "Lambda (ov|ov)"),
    ("Lambda (Ov|oV)", "psrq", "[O,V]", "[o,v]", "Lambda (OV|ov)"),
];

/// How a one-particle quantity is filled.
#[derive(Clone, Copy, Debug)]
pub(crate) enum Fill {
    Zero,
    Identity,
    Random,
}

/// Two irreducible representations with uneven occupations.
pub(crate) fn c2_spaces() -> MoSpaces {
    MoSpaces::builder()
        .alpha_occupied(vec![2, 1])
        .alpha_virtual(vec![1, 2])
        .beta_occupied(vec![1, 1])
        .beta_virtual(vec![2, 1])
        .build()
        .unwrap()
}

/// Four irreducible representations, one of which has no beta virtual orbitals.
pub(crate) fn d2_spaces() -> MoSpaces {
    MoSpaces::builder()
        .alpha_occupied(vec![1, 1, 1, 1])
        .alpha_virtual(vec![1, 1, 1, 1])
        .beta_occupied(vec![1, 1, 1, 1])
        .beta_virtual(vec![1, 0, 1, 1])
        .build()
        .unwrap()
}

/// Returns element `(p, q)` of a block-diagonal matrix over `space`, which vanishes unless `p`
/// and `q` share an irreducible representation.
pub(crate) fn element(
    matrix: &BlockDiagonalMatrix,
    space: &OrbitalSpace,
    p: usize,
    q: usize,
) -> f64 {
    let (hp, ip) = space.locate(p);
    let (hq, iq) = space.locate(q);
    if hp == hq {
        matrix.get(hp, ip, iq)
    } else {
        0.0
    }
}

fn fill_block_diagonal(dims: &[usize], fill: Fill, rng: &mut StdRng) -> BlockDiagonalMatrix {
    match fill {
        Fill::Zero => BlockDiagonalMatrix::zeros(dims),
        Fill::Identity => BlockDiagonalMatrix::identity(dims),
        Fill::Random => BlockDiagonalMatrix::new(
            dims.iter()
                .map(|&n| {
                    let a = Array2::from_shape_fn((n, n), |_| rng.gen_range(-0.5..0.5));
                    (&a + &a.t()) * 0.5
                })
                .collect(),
        )
        .unwrap(),
    }
}

/// Constructs one-particle response quantities, filling `κ`, `τ_occ`, `τ̄_occ`, `τ_vir`, and
/// `τ̄_vir` of both spins as given.
pub(crate) fn one_particle(spaces: &MoSpaces, fills: [Fill; 5], seed: u64) -> OneParticleResponse {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut spin_quantities = |occ: char, vir: char| {
        let occ_dims = spaces.orbitals_per_irrep(occ).unwrap().to_vec();
        let vir_dims = spaces.orbitals_per_irrep(vir).unwrap().to_vec();
        SpinOneParticle::builder()
            .kappa(fill_block_diagonal(&occ_dims, fills[0], &mut rng))
            .occupied_tau(fill_block_diagonal(&occ_dims, fills[1], &mut rng))
            .occupied_ptau(fill_block_diagonal(&occ_dims, fills[2], &mut rng))
            .virtual_tau(fill_block_diagonal(&vir_dims, fills[3], &mut rng))
            .virtual_ptau(fill_block_diagonal(&vir_dims, fills[4], &mut rng))
            .build()
            .unwrap()
    };
    let alpha = spin_quantities('O', 'V');
    let beta = spin_quantities('o', 'v');
    OneParticleResponse::builder()
        .alpha(alpha)
        .beta(beta)
        .build()
        .unwrap()
}

/// Constructs an amplitude store holding `Lambda` and `Z` for every spin channel together with
/// the chemists'-notation `Lambda` tensors. Elements are uniformly distributed in
/// `[-scale/2, scale/2)`.
pub(crate) fn amplitudes(spaces: &MoSpaces, scale: f64, seed: u64) -> TensorStore {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut store = TensorStore::new("amplitudes");
    for channel in SpinChannel::ALL {
        for name in ["Lambda", "Z"] {
            let tensor = BlockTensor::from_fn(
                &channel.amplitude_label(name),
                spaces.pair_space(channel.occupied_pair_label()).unwrap(),
                spaces.pair_space(channel.virtual_pair_label()).unwrap(),
                |_, _, _, _| scale * rng.gen_range(-0.5..0.5),
            )
            .unwrap();
            store.insert(tensor);
        }
    }
    for (source, permutation, rows, cols, label) in LAMBDA_SORTS {
        let sorted = store
            .tensor(source)
            .unwrap()
            .resort(
                permutation.parse().unwrap(),
                spaces.pair_space(rows).unwrap(),
                spaces.pair_space(cols).unwrap(),
                label,
            )
            .unwrap();
        store.insert(sorted);
    }
    store
}

/// Returns a copy of `store` with every tensor scaled by `factor`.
pub(crate) fn scaled(store: &TensorStore, factor: f64) -> TensorStore {
    let mut scaled = TensorStore::new(store.name());
    for tensor in store.iter() {
        let mut result =
            BlockTensor::zeros(tensor.label(), tensor.rows().clone(), tensor.cols().clone())
                .unwrap();
        BlockTensor::linear_combination(tensor, tensor, &mut result, factor, 0.0, 0.0).unwrap();
        scaled.insert(result);
    }
    scaled
}

/// Runs every relaxed density builder.
pub(crate) fn build_all(
    spaces: &MoSpaces,
    amplitudes: &TensorStore,
    one_particle: &OneParticleResponse,
) -> TensorStore {
    let mut density = TensorStore::new("density");
    crate::density::build_relaxed_oooo(spaces, amplitudes, one_particle, &mut density).unwrap();
    crate::density::build_relaxed_oovv(spaces, amplitudes, &mut density).unwrap();
    crate::density::build_relaxed_ovov(spaces, amplitudes, one_particle, &mut density).unwrap();
    crate::density::build_relaxed_vvvv(spaces, amplitudes, one_particle, &mut density).unwrap();
    density
}

/// Returns the occupied and virtual orbital spaces of `spin`.
pub(crate) fn orbital_spaces(spaces: &MoSpaces, spin: Spin) -> (OrbitalSpace, OrbitalSpace) {
    (
        spaces.occupied(spin).unwrap(),
        spaces.virtuals(spin).unwrap(),
    )
}
