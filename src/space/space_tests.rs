use crate::space::{irrep_product, MoSpaces, OrbitalSpace, PairPacking, PairSpace, Spin};

fn c2v_spaces() -> MoSpaces {
    MoSpaces::builder()
        .alpha_occupied(vec![2, 0, 1, 1])
        .alpha_virtual(vec![3, 1, 1, 2])
        .beta_occupied(vec![1, 1, 1, 0])
        .beta_virtual(vec![4, 0, 1, 2])
        .build()
        .unwrap()
}

#[test]
fn test_space_irrep_product() {
    assert_eq!(irrep_product(0, 0), 0);
    assert_eq!(irrep_product(1, 1), 0);
    assert_eq!(irrep_product(1, 2), 3);
    assert_eq!(irrep_product(3, 5), 6);
    assert_eq!(irrep_product(7, 4), 3);
}

#[test]
fn test_space_orbital_space() {
    let space = OrbitalSpace::new('O', &[2, 0, 1, 3]).unwrap();
    assert_eq!(space.norbitals(), 6);
    assert_eq!(space.nirrep(), 4);
    assert_eq!(space.offset(0), 0);
    assert_eq!(space.offset(1), 2);
    assert_eq!(space.offset(2), 2);
    assert_eq!(space.offset(3), 3);
    assert_eq!(space.locate(0), (0, 0));
    assert_eq!(space.locate(1), (0, 1));
    assert_eq!(space.locate(2), (2, 0));
    assert_eq!(space.locate(5), (3, 2));
    assert_eq!(space.to_string(), "O [2, 0, 1, 3]");

    assert!(OrbitalSpace::new('O', &[1, 2, 3]).is_err());
    assert!(OrbitalSpace::new('O', &[]).is_err());
}

#[test]
fn test_space_pair_space_antisymmetric() {
    let occ = OrbitalSpace::new('O', &[2, 1]).unwrap();
    let oo = PairSpace::new(occ.clone(), occ, PairPacking::Antisymmetric).unwrap();
    assert_eq!(oo.label(), "[O>O]-");
    // Orbitals 0, 1 in irrep 0 and orbital 2 in irrep 1.
    assert_eq!(oo.pairs(0), &[(1, 0)]);
    assert_eq!(oo.pairs(1), &[(2, 0), (2, 1)]);

    assert_eq!(oo.locate(1, 0), Some((0, 0, 1.0)));
    assert_eq!(oo.locate(0, 1), Some((0, 0, -1.0)));
    assert_eq!(oo.locate(1, 2), Some((1, 1, -1.0)));
    assert_eq!(oo.locate(1, 1), None);
    assert_eq!(oo.locate(3, 0), None);

    let unpacked = oo.unpacked().unwrap();
    assert_eq!(unpacked.label(), "[O,O]");
    assert_eq!(unpacked.npairs(0), 5);
    assert_eq!(unpacked.npairs(1), 4);
    assert!(unpacked.is_view_of(&oo));
    assert!(oo.is_view_of(&oo));
    assert!(!oo.is_view_of(&unpacked));
}

#[test]
fn test_space_pair_space_full() {
    let occ = OrbitalSpace::new('O', &[1, 1]).unwrap();
    let vir = OrbitalSpace::new('v', &[2, 1]).unwrap();
    let ov = PairSpace::new(occ.clone(), vir.clone(), PairPacking::Full).unwrap();
    assert_eq!(ov.label(), "[O,v]");
    assert_eq!(ov.pairs(0), &[(0, 0), (0, 1), (1, 2)]);
    assert_eq!(ov.pairs(1), &[(0, 2), (1, 0), (1, 1)]);
    assert_eq!(ov.locate(1, 1), Some((1, 2, 1.0)));

    assert!(PairSpace::new(occ, vir, PairPacking::Antisymmetric).is_err());
    let occ_d2h = OrbitalSpace::new('O', &[1; 8]).unwrap();
    let vir_c2 = OrbitalSpace::new('V', &[1, 1]).unwrap();
    assert!(PairSpace::new(occ_d2h, vir_c2, PairPacking::Full).is_err());
}

#[test]
fn test_space_mo_spaces_pair_space_labels() {
    let spaces = c2v_spaces();
    assert_eq!(spaces.nirrep(), 4);
    assert_eq!(spaces.nelectrons(Spin::Alpha), 4);
    assert_eq!(spaces.nelectrons(Spin::Beta), 3);
    assert_eq!(spaces.total_nelectrons(), 7);

    let oo = spaces.pair_space("[O>O]-").unwrap();
    assert_eq!(oo.packing(), PairPacking::Antisymmetric);
    assert_eq!((0..4).map(|h| oo.npairs(h)).sum::<usize>(), 6);

    let ov = spaces.pair_space("[o,V]").unwrap();
    assert_eq!(ov.packing(), PairPacking::Full);
    assert_eq!(ov.p_space().label(), 'o');
    assert_eq!(ov.q_space().label(), 'V');
    assert_eq!((0..4).map(|h| ov.npairs(h)).sum::<usize>(), 21);

    assert!(spaces.pair_space("[O>V]-").is_err());
    assert!(spaces.pair_space("[O>O]").is_err());
    assert!(spaces.pair_space("O,V").is_err());
    assert!(spaces.pair_space("[O,X]").is_err());
    assert!(spaces.pair_space("[OO,V]").is_err());
}

#[test]
fn test_space_mo_spaces_validation() {
    assert!(MoSpaces::builder()
        .alpha_occupied(vec![1, 1])
        .alpha_virtual(vec![1, 1])
        .beta_occupied(vec![1, 1, 0, 0])
        .beta_virtual(vec![1, 1])
        .build()
        .is_err());
    assert!(MoSpaces::builder()
        .alpha_occupied(vec![1, 1, 1])
        .alpha_virtual(vec![1, 1, 1])
        .beta_occupied(vec![1, 1, 1])
        .beta_virtual(vec![1, 1, 1])
        .build()
        .is_err());
    assert!(MoSpaces::builder()
        .alpha_occupied(vec![1])
        .alpha_virtual(vec![1])
        .beta_occupied(vec![1])
        .build()
        .is_err());

    let spaces: MoSpaces = serde_yaml::from_str(
        "alpha_occupied: [1, 1]\nalpha_virtual: [1]\nbeta_occupied: [1, 1]\nbeta_virtual: [2, 2]\n",
    )
    .unwrap();
    assert!(spaces.check().is_err());
    assert!(c2v_spaces().check().is_ok());
}
