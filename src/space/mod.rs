//! Orbital spaces and orbital-pair spaces partitioned by the irreducible representations of an
//! abelian point group.

use std::fmt;

use anyhow::{self, bail, ensure, format_err};
use derive_builder::Builder;
use itertools::Itertools;
use serde::{Deserialize, Serialize};

#[cfg(test)]
#[path = "space_tests.rs"]
mod space_tests;

// =========
// Functions
// =========

/// Returns the direct product of two irreducible representations of an abelian point group with
/// at most eight irreducible representations, all of which are one-dimensional.
pub fn irrep_product(h1: usize, h2: usize) -> usize {
    h1 ^ h2
}

// ==================
// Struct definitions
// ==================

// ----
// Spin
// ----

/// Spin channels of an unrestricted reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Spin {
    Alpha,
    Beta,
}

impl fmt::Display for Spin {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Spin::Alpha => write!(f, "α"),
            Spin::Beta => write!(f, "β"),
        }
    }
}

// ------------
// OrbitalSpace
// ------------

/// Structure to manage an orbital space whose orbitals are grouped by irreducible representation.
///
/// Orbitals are indexed absolutely across all irreducible representations, in irrep-major
/// order.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrbitalSpace {
    /// Single-character label of this space (`O`, `V`, `o`, or `v`).
    label: char,

    /// Number of orbitals in each irreducible representation.
    orbitals_per_irrep: Vec<usize>,

    /// Absolute index of the first orbital in each irreducible representation.
    offsets: Vec<usize>,

    /// Irreducible representation of each orbital.
    irreps: Vec<usize>,
}

impl OrbitalSpace {
    /// Constructs a new orbital space.
    ///
    /// # Errors
    ///
    /// Errors if the number of irreducible representations is not one of 1, 2, 4, or 8.
    pub fn new(label: char, orbitals_per_irrep: &[usize]) -> Result<Self, anyhow::Error> {
        let nirrep = orbitals_per_irrep.len();
        ensure!(
            matches!(nirrep, 1 | 2 | 4 | 8),
            "Orbital space `{label}` has {nirrep} irreducible representations, but only 1, 2, 4, or 8 are supported."
        );
        let offsets = orbitals_per_irrep
            .iter()
            .scan(0, |acc, &n| {
                let offset = *acc;
                *acc += n;
                Some(offset)
            })
            .collect_vec();
        let irreps = orbitals_per_irrep
            .iter()
            .enumerate()
            .flat_map(|(h, &n)| std::iter::repeat(h).take(n))
            .collect_vec();
        Ok(Self {
            label,
            orbitals_per_irrep: orbitals_per_irrep.to_vec(),
            offsets,
            irreps,
        })
    }

    pub fn label(&self) -> char {
        self.label
    }

    pub fn nirrep(&self) -> usize {
        self.orbitals_per_irrep.len()
    }

    /// Returns the total number of orbitals in this space.
    pub fn norbitals(&self) -> usize {
        self.irreps.len()
    }

    pub fn orbitals_per_irrep(&self) -> &[usize] {
        &self.orbitals_per_irrep
    }

    /// Returns the absolute index of the first orbital in irreducible representation `h`.
    pub fn offset(&self, h: usize) -> usize {
        self.offsets[h]
    }

    /// Returns the irreducible representation of absolute orbital `p`.
    pub fn irrep(&self, p: usize) -> usize {
        self.irreps[p]
    }

    /// Returns the irreducible representation of absolute orbital `p` together with the index of
    /// `p` relative to the start of that irreducible representation.
    pub fn locate(&self, p: usize) -> (usize, usize) {
        let h = self.irreps[p];
        (h, p - self.offsets[h])
    }
}

impl fmt::Display for OrbitalSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}]",
            self.label,
            self.orbitals_per_irrep.iter().map(|n| n.to_string()).join(", ")
        )
    }
}

// -----------
// PairPacking
// -----------

/// Storage conventions for ordered orbital pairs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PairPacking {
    /// Every ordered pair `(p, q)` is stored.
    Full,

    /// Only pairs with `p > q` are stored. The pair `(q, p)` is the negative of `(p, q)` and
    /// pairs with `p == q` vanish.
    Antisymmetric,
}

// ---------
// PairSpace
// ---------

/// Structure to manage a space of ordered orbital pairs grouped by the irreducible representation
/// of the pair.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairSpace {
    /// Space of the first orbital of each pair.
    p: OrbitalSpace,

    /// Space of the second orbital of each pair.
    q: OrbitalSpace,

    packing: PairPacking,

    /// Stored orbital pairs in each pair irreducible representation, in storage order.
    pairs: Vec<Vec<(usize, usize)>>,

    /// Storage positions `(h, index)` of ordered pairs, flattened as `p * nq + q`.
    positions: Vec<Option<(usize, usize)>>,
}

impl PairSpace {
    /// Constructs a new pair space from two orbital spaces.
    ///
    /// # Errors
    ///
    /// Errors if the two orbital spaces have different numbers of irreducible representations, or
    /// if an antisymmetric packing is requested for two different orbital spaces.
    pub fn new(
        p: OrbitalSpace,
        q: OrbitalSpace,
        packing: PairPacking,
    ) -> Result<Self, anyhow::Error> {
        ensure!(
            p.nirrep() == q.nirrep(),
            "Orbital spaces `{}` and `{}` have different numbers of irreducible representations.",
            p.label(),
            q.label()
        );
        if packing == PairPacking::Antisymmetric {
            ensure!(
                p == q,
                "Antisymmetric pair packing requires identical orbital spaces, but `{}` and `{}` were given.",
                p.label(),
                q.label()
            );
        }
        let nq = q.norbitals();
        let mut pairs = vec![vec![]; p.nirrep()];
        (0..p.norbitals())
            .cartesian_product(0..nq)
            .filter(|&(pp, qq)| packing == PairPacking::Full || pp > qq)
            .for_each(|(pp, qq)| {
                pairs[irrep_product(p.irrep(pp), q.irrep(qq))].push((pp, qq));
            });
        let mut positions = vec![None; p.norbitals() * nq];
        pairs.iter().enumerate().for_each(|(h, pairs_h)| {
            pairs_h.iter().enumerate().for_each(|(idx, &(pp, qq))| {
                positions[pp * nq + qq] = Some((h, idx));
            })
        });
        Ok(Self {
            p,
            q,
            packing,
            pairs,
            positions,
        })
    }

    /// Returns the same pair space without any packing.
    pub fn unpacked(&self) -> Result<Self, anyhow::Error> {
        Self::new(self.p.clone(), self.q.clone(), PairPacking::Full)
    }

    /// Returns the bracketed label of this pair space, *e.g.* `[O>O]-` or `[O,v]`.
    pub fn label(&self) -> String {
        match self.packing {
            PairPacking::Full => format!("[{},{}]", self.p.label(), self.q.label()),
            PairPacking::Antisymmetric => format!("[{}>{}]-", self.p.label(), self.q.label()),
        }
    }

    pub fn p_space(&self) -> &OrbitalSpace {
        &self.p
    }

    pub fn q_space(&self) -> &OrbitalSpace {
        &self.q
    }

    pub fn packing(&self) -> PairPacking {
        self.packing
    }

    pub fn nirrep(&self) -> usize {
        self.pairs.len()
    }

    /// Returns the number of stored pairs in pair irreducible representation `h`.
    pub fn npairs(&self, h: usize) -> usize {
        self.pairs[h].len()
    }

    /// Returns the stored pairs in pair irreducible representation `h`, in storage order.
    pub fn pairs(&self, h: usize) -> &[(usize, usize)] {
        &self.pairs[h]
    }

    /// Locates the ordered pair `(p, q)` in storage.
    ///
    /// # Returns
    ///
    /// The pair irreducible representation, the storage index within it, and the sign relating
    /// the stored value to the value of `(p, q)`. `None` is returned if `(p, q)` has no storage,
    /// either because it vanishes under antisymmetric packing or because it is out of range.
    pub fn locate(&self, p: usize, q: usize) -> Option<(usize, usize, f64)> {
        let nq = self.q.norbitals();
        let position = |pp: usize, qq: usize| {
            if pp < self.p.norbitals() && qq < nq {
                self.positions[pp * nq + qq]
            } else {
                None
            }
        };
        match self.packing {
            PairPacking::Full => position(p, q).map(|(h, idx)| (h, idx, 1.0)),
            PairPacking::Antisymmetric => {
                if p > q {
                    position(p, q).map(|(h, idx)| (h, idx, 1.0))
                } else if p < q {
                    position(q, p).map(|(h, idx)| (h, idx, -1.0))
                } else {
                    None
                }
            }
        }
    }

    /// Checks if this pair space can be used as a view onto data stored in `stored`.
    ///
    /// A view must range over the same orbital spaces as the storage. It may either share the
    /// storage packing or be unpacked, in which case packed data are expanded on read.
    pub fn is_view_of(&self, stored: &PairSpace) -> bool {
        self.p == stored.p
            && self.q == stored.q
            && (self.packing == stored.packing || self.packing == PairPacking::Full)
    }
}

impl fmt::Display for PairSpace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

// --------
// MoSpaces
// --------

/// Structure containing the occupied and virtual orbital counts per irreducible representation
/// for both spin channels.
#[derive(Clone, Builder, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct MoSpaces {
    /// Number of occupied alpha orbitals in each irreducible representation.
    alpha_occupied: Vec<usize>,

    /// Number of virtual alpha orbitals in each irreducible representation.
    alpha_virtual: Vec<usize>,

    /// Number of occupied beta orbitals in each irreducible representation.
    beta_occupied: Vec<usize>,

    /// Number of virtual beta orbitals in each irreducible representation.
    beta_virtual: Vec<usize>,
}

impl MoSpacesBuilder {
    fn validate(&self) -> Result<(), String> {
        let counts = [
            self.alpha_occupied.as_ref(),
            self.alpha_virtual.as_ref(),
            self.beta_occupied.as_ref(),
            self.beta_virtual.as_ref(),
        ];
        if counts.iter().any(|count| count.is_none()) {
            return Err("All four orbital spaces must be specified.".to_string());
        }
        check_orbital_counts(counts.iter().flatten().map(|count| count.as_slice()))
    }
}

fn check_orbital_counts<'a>(counts: impl Iterator<Item = &'a [usize]>) -> Result<(), String> {
    let nirreps = counts.map(|count| count.len()).collect_vec();
    if !nirreps.iter().all_equal() {
        Err(format!(
            "Orbital spaces have inconsistent numbers of irreducible representations: {nirreps:?}."
        ))
    } else if !nirreps
        .first()
        .map(|&nirrep| matches!(nirrep, 1 | 2 | 4 | 8))
        .unwrap_or(false)
    {
        Err(format!(
            "Only 1, 2, 4, or 8 irreducible representations are supported, but {nirreps:?} were given."
        ))
    } else {
        Ok(())
    }
}

impl MoSpaces {
    /// Returns a builder to construct a new [`MoSpaces`].
    pub fn builder() -> MoSpacesBuilder {
        MoSpacesBuilder::default()
    }

    /// Checks that all four orbital spaces share a supported number of irreducible
    /// representations. Useful for spaces that have been deserialised rather than built.
    pub fn check(&self) -> Result<(), anyhow::Error> {
        check_orbital_counts(
            [
                &self.alpha_occupied,
                &self.alpha_virtual,
                &self.beta_occupied,
                &self.beta_virtual,
            ]
            .into_iter()
            .map(|count| count.as_slice()),
        )
        .map_err(|err| format_err!(err))
    }

    pub fn nirrep(&self) -> usize {
        self.alpha_occupied.len()
    }

    /// Returns the orbital counts per irreducible representation of the space labelled `label`.
    ///
    /// The labels are `O` (occupied alpha), `V` (virtual alpha), `o` (occupied beta), and `v`
    /// (virtual beta).
    pub fn orbitals_per_irrep(&self, label: char) -> Result<&[usize], anyhow::Error> {
        match label {
            'O' => Ok(&self.alpha_occupied),
            'V' => Ok(&self.alpha_virtual),
            'o' => Ok(&self.beta_occupied),
            'v' => Ok(&self.beta_virtual),
            _ => bail!("Unknown orbital space label `{label}`."),
        }
    }

    /// Constructs the orbital space labelled `label`.
    pub fn orbital_space(&self, label: char) -> Result<OrbitalSpace, anyhow::Error> {
        OrbitalSpace::new(label, self.orbitals_per_irrep(label)?)
    }

    /// Constructs the occupied orbital space of spin `spin`.
    pub fn occupied(&self, spin: Spin) -> Result<OrbitalSpace, anyhow::Error> {
        match spin {
            Spin::Alpha => self.orbital_space('O'),
            Spin::Beta => self.orbital_space('o'),
        }
    }

    /// Constructs the virtual orbital space of spin `spin`.
    pub fn virtuals(&self, spin: Spin) -> Result<OrbitalSpace, anyhow::Error> {
        match spin {
            Spin::Alpha => self.orbital_space('V'),
            Spin::Beta => self.orbital_space('v'),
        }
    }

    /// Constructs a pair space from its bracketed label.
    ///
    /// # Arguments
    ///
    /// * `label` - A label of the form `[X>X]-` for an antisymmetrically packed pair space over a
    /// single orbital space `X`, or `[X,Y]` for an unpacked pair space over orbital spaces `X`
    /// and `Y`.
    pub fn pair_space(&self, label: &str) -> Result<PairSpace, anyhow::Error> {
        let inner = label
            .strip_prefix('[')
            .ok_or_else(|| format_err!("Pair-space label `{label}` does not start with `[`."))?;
        let (inner, antisymmetric) = if let Some(inner) = inner.strip_suffix("]-") {
            (inner, true)
        } else if let Some(inner) = inner.strip_suffix(']') {
            (inner, false)
        } else {
            bail!("Pair-space label `{label}` is not terminated by `]` or `]-`.");
        };
        match (inner.chars().collect_vec().as_slice(), antisymmetric) {
            ([p, '>', q], true) if p == q => PairSpace::new(
                self.orbital_space(*p)?,
                self.orbital_space(*q)?,
                PairPacking::Antisymmetric,
            ),
            ([p, ',', q], false) => PairSpace::new(
                self.orbital_space(*p)?,
                self.orbital_space(*q)?,
                PairPacking::Full,
            ),
            _ => bail!("Unsupported pair-space label `{label}`."),
        }
    }

    /// Returns the number of electrons of spin `spin`.
    pub fn nelectrons(&self, spin: Spin) -> usize {
        match spin {
            Spin::Alpha => self.alpha_occupied.iter().sum(),
            Spin::Beta => self.beta_occupied.iter().sum(),
        }
    }

    /// Returns the total number of electrons.
    pub fn total_nelectrons(&self) -> usize {
        self.nelectrons(Spin::Alpha) + self.nelectrons(Spin::Beta)
    }
}

impl fmt::Display for MoSpaces {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let fmt_counts = |counts: &[usize]| counts.iter().map(|n| n.to_string()).join(", ");
        writeln!(f, "Occupied α orbitals per irrep: [{}]", fmt_counts(&self.alpha_occupied))?;
        writeln!(f, "Virtual α orbitals per irrep : [{}]", fmt_counts(&self.alpha_virtual))?;
        writeln!(f, "Occupied β orbitals per irrep: [{}]", fmt_counts(&self.beta_occupied))?;
        writeln!(f, "Virtual β orbitals per irrep : [{}]", fmt_counts(&self.beta_virtual))?;
        Ok(())
    }
}
