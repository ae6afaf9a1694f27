use approx::assert_relative_eq;
use ndarray::array;

use crate::onepdm::{BlockDiagonalMatrix, OneParticleResponse, SpinOneParticle};
use crate::space::{MoSpaces, Spin};

fn spaces() -> MoSpaces {
    MoSpaces::builder()
        .alpha_occupied(vec![2, 1])
        .alpha_virtual(vec![1, 2])
        .beta_occupied(vec![1, 1])
        .beta_virtual(vec![2, 1])
        .build()
        .unwrap()
}

#[test]
fn test_onepdm_block_diagonal_matrix() {
    let a = BlockDiagonalMatrix::new(vec![array![[1.0, 0.5], [0.5, 2.0]], array![[3.0]]]).unwrap();
    assert_eq!(a.nirrep(), 2);
    assert_eq!(a.dims(), vec![2, 1]);
    assert_relative_eq!(a.get(0, 1, 0), 0.5);
    assert_relative_eq!(a.get(1, 0, 0), 3.0);
    assert_relative_eq!(a.trace(), 6.0);
    assert!(a.is_symmetric(1e-12));
    assert!(a.block(2).is_err());

    let i = BlockDiagonalMatrix::identity(&[2, 1]);
    assert_relative_eq!((&a + &i).trace(), 9.0);
    assert_relative_eq!((&a - &i).get(0, 0, 0), 0.0);
    assert_relative_eq!((&a - &i).get(0, 0, 1), 0.5);

    let asymmetric = BlockDiagonalMatrix::new(vec![array![[1.0, 0.5], [0.4, 2.0]]]).unwrap();
    assert!(!asymmetric.is_symmetric(1e-12));
    assert!(BlockDiagonalMatrix::new(vec![array![[1.0, 0.5]]]).is_err());
}

#[test]
#[should_panic]
fn test_onepdm_block_diagonal_matrix_add_mismatch() {
    let a = BlockDiagonalMatrix::identity(&[2, 1]);
    let b = BlockDiagonalMatrix::identity(&[1, 2]);
    let _ = &a + &b;
}

#[test]
fn test_onepdm_spin_builder_validation() {
    let occ = [2, 1];
    let vir = [1, 2];
    let built = SpinOneParticle::builder()
        .kappa(BlockDiagonalMatrix::identity(&occ))
        .occupied_tau(BlockDiagonalMatrix::zeros(&occ))
        .occupied_ptau(BlockDiagonalMatrix::zeros(&occ))
        .virtual_tau(BlockDiagonalMatrix::zeros(&vir))
        .virtual_ptau(BlockDiagonalMatrix::zeros(&vir))
        .build()
        .unwrap();
    assert_eq!(built, SpinOneParticle::reference(&occ, &vir));

    assert!(SpinOneParticle::builder()
        .kappa(BlockDiagonalMatrix::identity(&occ))
        .occupied_tau(BlockDiagonalMatrix::zeros(&vir))
        .occupied_ptau(BlockDiagonalMatrix::zeros(&occ))
        .virtual_tau(BlockDiagonalMatrix::zeros(&vir))
        .virtual_ptau(BlockDiagonalMatrix::zeros(&vir))
        .build()
        .is_err());
    assert!(SpinOneParticle::builder()
        .kappa(BlockDiagonalMatrix::identity(&occ))
        .occupied_tau(BlockDiagonalMatrix::zeros(&occ))
        .occupied_ptau(BlockDiagonalMatrix::zeros(&occ))
        .virtual_tau(BlockDiagonalMatrix::zeros(&[1, 2, 0, 0]))
        .virtual_ptau(BlockDiagonalMatrix::zeros(&[1, 2, 0, 0]))
        .build()
        .is_err());
    assert!(SpinOneParticle::builder()
        .kappa(BlockDiagonalMatrix::identity(&occ))
        .occupied_tau(BlockDiagonalMatrix::zeros(&occ))
        .occupied_ptau(BlockDiagonalMatrix::zeros(&occ))
        .virtual_tau(BlockDiagonalMatrix::zeros(&vir))
        .build()
        .is_err());
}

#[test]
fn test_onepdm_derived_quantities() {
    let occ = [2, 1];
    let vir = [1, 2];
    let spin = SpinOneParticle::builder()
        .kappa(BlockDiagonalMatrix::identity(&occ))
        .occupied_tau(
            BlockDiagonalMatrix::new(vec![array![[-0.1, 0.02], [0.02, -0.05]], array![[-0.2]]])
                .unwrap(),
        )
        .occupied_ptau(
            BlockDiagonalMatrix::new(vec![array![[-0.3, 0.01], [0.01, 0.1]], array![[0.4]]])
                .unwrap(),
        )
        .virtual_tau(
            BlockDiagonalMatrix::new(vec![array![[0.15]], array![[0.1, 0.0], [0.0, 0.1]]])
                .unwrap(),
        )
        .virtual_ptau(BlockDiagonalMatrix::zeros(&vir))
        .build()
        .unwrap();
    let relaxed = spin.kappa_plus_occupied_tau();
    assert_relative_eq!(relaxed.get(0, 0, 0), 0.9, epsilon = 1e-14);
    assert_relative_eq!(relaxed.get(0, 0, 1), 0.02);
    assert_relative_eq!(relaxed.get(1, 0, 0), 0.8, epsilon = 1e-14);
    let excess = spin.occupied_ptau_minus_tau();
    assert_relative_eq!(excess.get(0, 1, 1), 0.15, epsilon = 1e-14);
    assert_relative_eq!(excess.get(1, 0, 0), 0.6, epsilon = 1e-14);
    // 3 - 0.35 + 0.35
    assert_relative_eq!(spin.trace(), 3.0, epsilon = 1e-14);
}

#[test]
fn test_onepdm_response_reference_and_checks() {
    let spaces = spaces();
    let reference = OneParticleResponse::reference(&spaces).unwrap();
    assert!(reference.check_against(&spaces).is_ok());
    assert_relative_eq!(reference.trace(), 5.0);
    assert_relative_eq!(reference.spin(Spin::Alpha).trace(), 3.0);
    assert_relative_eq!(reference.spin(Spin::Beta).trace(), 2.0);

    let swapped = OneParticleResponse::builder()
        .alpha(reference.spin(Spin::Beta).clone())
        .beta(reference.spin(Spin::Alpha).clone())
        .build()
        .unwrap();
    assert!(swapped.check_against(&spaces).is_err());

    let asymmetric = OneParticleResponse::builder()
        .alpha(
            SpinOneParticle::builder()
                .kappa(
                    BlockDiagonalMatrix::new(vec![array![[1.0, 0.1], [0.0, 1.0]], array![[1.0]]])
                        .unwrap(),
                )
                .occupied_tau(BlockDiagonalMatrix::zeros(&[2, 1]))
                .occupied_ptau(BlockDiagonalMatrix::zeros(&[2, 1]))
                .virtual_tau(BlockDiagonalMatrix::zeros(&[1, 2]))
                .virtual_ptau(BlockDiagonalMatrix::zeros(&[1, 2]))
                .build()
                .unwrap(),
        )
        .beta(reference.spin(Spin::Beta).clone())
        .build()
        .unwrap();
    assert!(asymmetric.check_against(&spaces).is_err());
}
