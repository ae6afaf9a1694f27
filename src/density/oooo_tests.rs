use approx::assert_relative_eq;
use itertools::Itertools;

use crate::density::build_relaxed_oooo;
use crate::density::density_fixtures::{
    amplitudes, c2_spaces, d2_spaces, element, one_particle, orbital_spaces, Fill,
};
use crate::space::Spin;
use crate::tensor::store::TensorStore;

const RANDOM: [Fill; 5] = [Fill::Random; 5];

#[test]
fn test_oooo_separable_terms_same_spin() {
    let spaces = c2_spaces();
    let amps = amplitudes(&spaces, 0.0, 1);
    let opdm = one_particle(&spaces, RANDOM, 2);
    let mut density = TensorStore::new("density");
    build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).unwrap();

    for (spin, label) in [(Spin::Alpha, "Gamma <OO|OO>"), (Spin::Beta, "Gamma <oo|oo>")] {
        let gamma = density.tensor(label).unwrap();
        let (occ, _) = orbital_spaces(&spaces, spin);
        let quantities = opdm.spin(spin);
        let kappa = quantities.kappa();
        let tau = quantities.occupied_tau();
        let ptau = quantities.occupied_ptau();
        let relaxed = quantities.kappa_plus_occupied_tau();
        let e = |m, p, q| element(m, &occ, p, q);
        let n = occ.norbitals();
        for (i, j, k, l) in itertools::iproduct!(0..n, 0..n, 0..n, 0..n) {
            let expected = 0.25
                * (e(kappa, i, k) * e(kappa, j, l) - e(kappa, i, l) * e(kappa, j, k)
                    + e(&relaxed, i, k) * e(ptau, j, l)
                    - e(&relaxed, i, l) * e(ptau, j, k)
                    - e(&relaxed, j, k) * e(ptau, i, l)
                    + e(&relaxed, j, l) * e(ptau, i, k)
                    - e(tau, i, k) * e(tau, j, l)
                    + e(tau, i, l) * e(tau, j, k));
            assert_relative_eq!(gamma.get(i, j, k, l), expected, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_oooo_separable_terms_mixed_spin() {
    let spaces = c2_spaces();
    let amps = amplitudes(&spaces, 0.0, 3);
    let opdm = one_particle(&spaces, RANDOM, 4);
    let mut density = TensorStore::new("density");
    build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).unwrap();

    let gamma = density.tensor("Gamma <Oo|Oo>").unwrap();
    let (occ_a, _) = orbital_spaces(&spaces, Spin::Alpha);
    let (occ_b, _) = orbital_spaces(&spaces, Spin::Beta);
    let (alpha, beta) = (opdm.spin(Spin::Alpha), opdm.spin(Spin::Beta));
    let relaxed_a = alpha.kappa_plus_occupied_tau();
    let relaxed_b = beta.kappa_plus_occupied_tau();
    for (i, j, k, l) in itertools::iproduct!(0..3, 0..2, 0..3, 0..2) {
        let ea = |m, p, q| element(m, &occ_a, p, q);
        let eb = |m, p, q| element(m, &occ_b, p, q);
        let expected = 0.25
            * (ea(alpha.kappa(), i, k) * eb(beta.kappa(), j, l)
                + ea(&relaxed_a, i, k) * eb(beta.occupied_ptau(), j, l)
                + eb(&relaxed_b, j, l) * ea(alpha.occupied_ptau(), i, k)
                - ea(alpha.occupied_tau(), i, k) * eb(beta.occupied_tau(), j, l));
        assert_relative_eq!(gamma.get(i, j, k, l), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_oooo_cumulant_contraction() {
    let spaces = c2_spaces();
    let amps = amplitudes(&spaces, 1.0, 5);
    // κ = τ = 0 removes every separable term irrespective of τ̄.
    let opdm = one_particle(
        &spaces,
        [Fill::Zero, Fill::Zero, Fill::Identity, Fill::Random, Fill::Random],
        6,
    );
    let mut density = TensorStore::new("density");
    build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).unwrap();

    let lambda = amps.tensor("Lambda <OO|VV>").unwrap();
    let z = amps.tensor("Z <OO|VV>").unwrap();
    let gamma = density.tensor("Gamma <OO|OO>").unwrap();
    for (i, j, k, l) in itertools::iproduct!(0..3, 0..3, 0..3, 0..3) {
        let expected = 0.125
            * (0..3)
                .tuple_combinations()
                .map(|(b, a)| {
                    lambda.get(i, j, a, b) * z.get(k, l, a, b)
                        + z.get(i, j, a, b) * lambda.get(k, l, a, b)
                })
                .sum::<f64>();
        assert_relative_eq!(gamma.get(i, j, k, l), expected, epsilon = 1e-12);
    }

    let lambda = amps.tensor("Lambda <Oo|Vv>").unwrap();
    let z = amps.tensor("Z <Oo|Vv>").unwrap();
    let gamma = density.tensor("Gamma <Oo|Oo>").unwrap();
    for (i, j, k, l) in itertools::iproduct!(0..3, 0..2, 0..3, 0..2) {
        let expected = 0.125
            * itertools::iproduct!(0..3, 0..3)
                .map(|(a, b)| {
                    lambda.get(i, j, a, b) * z.get(k, l, a, b)
                        + z.get(i, j, a, b) * lambda.get(k, l, a, b)
                })
                .sum::<f64>();
        assert_relative_eq!(gamma.get(i, j, k, l), expected, epsilon = 1e-12);
    }
}

#[test]
fn test_oooo_symmetries() {
    let spaces = c2_spaces();
    let amps = amplitudes(&spaces, 1.0, 7);
    let opdm = one_particle(&spaces, RANDOM, 8);
    let mut density = TensorStore::new("density");
    build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).unwrap();
    assert_eq!(density.len(), 3);

    for label in ["Gamma <OO|OO>", "Gamma <Oo|Oo>", "Gamma <oo|oo>"] {
        let gamma = density.tensor(label).unwrap();
        assert!(gamma.max_asymmetry().unwrap() < 1e-12);
        assert!(gamma.norm() > 1e-3);
    }

    let gamma = density.tensor("Gamma <OO|OO>").unwrap();
    for (i, j, k, l) in itertools::iproduct!(0..3, 0..3, 0..3, 0..3) {
        assert_relative_eq!(gamma.get(i, j, k, l), -gamma.get(j, i, k, l));
        assert_relative_eq!(gamma.get(i, j, k, l), -gamma.get(i, j, l, k));
        assert_relative_eq!(gamma.get(i, j, k, l), gamma.get(k, l, i, j), epsilon = 1e-12);
    }
}

#[test]
fn test_oooo_selection_rule() {
    let spaces = d2_spaces();
    let amps = amplitudes(&spaces, 0.0, 9);
    let opdm = one_particle(&spaces, RANDOM, 10);
    let mut density = TensorStore::new("density");
    build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).unwrap();

    // One orbital per irreducible representation: i ∈ A, j ∈ B₃, k ∈ B₁, l ∈ B₂. Both pairs are
    // of symmetry B₃, but neither (i, k) nor (i, l) share an irreducible representation.
    for label in ["Gamma <OO|OO>", "Gamma <Oo|Oo>", "Gamma <oo|oo>"] {
        let gamma = density.tensor(label).unwrap();
        assert_eq!(gamma.get(0, 3, 1, 2), 0.0);
        assert_eq!(gamma.get(3, 0, 2, 1), 0.0);
        assert!(gamma.get(0, 3, 0, 3).abs() > 0.0);
    }
}

#[test]
fn test_oooo_missing_input_leaves_density_untouched() {
    let spaces = c2_spaces();
    let mut amps = amplitudes(&spaces, 1.0, 11);
    amps.remove("Z <oo|vv>");
    let opdm = one_particle(&spaces, RANDOM, 12);
    let mut density = TensorStore::new("density");
    let err = build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).unwrap_err();
    assert!(err.to_string().contains("Z <oo|vv>"));
    assert!(density.is_empty());
}

#[test]
fn test_oooo_mismatched_one_particle() {
    let spaces = c2_spaces();
    let amps = amplitudes(&spaces, 1.0, 13);
    let opdm = one_particle(&d2_spaces(), RANDOM, 14);
    let mut density = TensorStore::new("density");
    assert!(build_relaxed_oooo(&spaces, &amps, &opdm, &mut density).is_err());
    assert!(density.is_empty());
}
