//! YAML input specification of a `dcrdm` calculation.

use std::path::PathBuf;

use anyhow::{self, Context};
use serde::{Deserialize, Serialize};

use crate::drivers::relaxed_density::{RelaxedDensityDriver, RelaxedDensityParams};
use crate::drivers::DcrdmDriver;
use crate::interfaces::InputHandle;
use crate::io::format::{dcrdm_error, dcrdm_output};
use crate::io::{read_dcrdm_binary, DcrdmFileType};
use crate::onepdm::OneParticleResponse;
use crate::space::MoSpaces;
use crate::tensor::store::{StoreMode, TensorStore};


/// A structure containing `dcrdm` input parameters which can be serialised into and deserialised
/// from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// The numbers of orbitals per irreducible representation in each orbital space.
    pub spaces: MoSpaces,

    /// The name of the [`DcrdmFileType::Store`] binary file holding the response amplitudes,
    /// without its `.dcrdm.store` extension.
    pub amplitudes: PathBuf,

    /// The name of the [`DcrdmFileType::OneParticle`] binary file holding the one-particle
    /// response quantities, without its `.dcrdm.opdm` extension.
    pub one_particle: PathBuf,

    /// Control parameters for relaxed density assembly.
    ///
    /// # Default
    ///
    /// If not specified, [`RelaxedDensityParams::default`] is used.
    #[serde(default)]
    pub parameters: RelaxedDensityParams,

    /// Optional name (without the `.dcrdm.store` extension) under which the relaxed TPDM is
    /// saved as a [`DcrdmFileType::Store`] binary file. If `None`, the density is not saved.
    #[serde(default)]
    pub density_save_name: Option<PathBuf>,
}

impl Input {
    /// Reads the files named in this input, assembles the relaxed density, and saves it
    /// if requested.
    fn assemble(&self) -> Result<(), anyhow::Error> {
        self.spaces.check()?;
        let amplitudes = TensorStore::open(&self.amplitudes, StoreMode::Existing)?;
        let one_particle = read_dcrdm_binary::<OneParticleResponse, _>(
            &self.one_particle,
            DcrdmFileType::OneParticle,
        )
        .with_context(|| {
            format!(
                "Unable to read one-particle response quantities from `{}`.",
                self.one_particle.display()
            )
        })?;

        let mut driver = RelaxedDensityDriver::builder()
            .parameters(&self.parameters)
            .spaces(&self.spaces)
            .amplitudes(&amplitudes)
            .one_particle(&one_particle)
            .build()?;
        driver.run()?;

        if let Some(name) = self.density_save_name.as_ref() {
            let mut density = TensorStore::open(name, StoreMode::New)?;
            density.extend(driver.result()?.density().iter().cloned());
            density.close(true)?;
            let mut path = name.clone();
            path.set_extension(DcrdmFileType::Store.ext());
            dcrdm_output!("Relaxed TPDM saved to `{}`.", path.display());
            dcrdm_output!("");
        }
        amplitudes.close(false)
    }
}

impl InputHandle for Input {
    fn handle(&self) -> Result<(), anyhow::Error> {
        self.assemble().map_err(|err| {
            dcrdm_error!("{err:#}");
            err
        })
    }
}
