//! Driver for the assembly of relaxed two-particle density matrices.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use serde::{Deserialize, Serialize};

use crate::density::{
    build_relaxed_oooo, build_relaxed_oovv, build_relaxed_ovov, build_relaxed_vvvv,
    compute_n_representability, NRepresentabilityReport,
};
use crate::drivers::DcrdmDriver;
use crate::io::format::{
    dcrdm_output, dcrdm_warn, log_macsec_begin, log_macsec_end, log_subtitle, nice_bool,
    DcrdmOutput,
};
use crate::onepdm::OneParticleResponse;
use crate::space::MoSpaces;
use crate::tensor::store::TensorStore;


/// The number of blocks making up a complete relaxed TPDM.
const N_RELAXED_BLOCKS: usize = 18;

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

fn default_true() -> bool {
    true
}
fn default_trace_deviation_threshold() -> f64 {
    1e-8
}

/// A structure containing control parameters for relaxed density assembly.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
pub struct RelaxedDensityParams {
    /// The largest deviation of the density traces from their exact values that is tolerated
    /// without a warning.
    #[builder(default = "1e-8")]
    #[serde(default = "default_trace_deviation_threshold")]
    pub trace_deviation_threshold: f64,

    /// Boolean indicating if the N-representability traces are to be computed after assembly.
    #[builder(default = "true")]
    #[serde(default = "default_true")]
    pub check_n_representability: bool,

    /// Boolean indicating if the norm and the largest bra-ket asymmetry of every assembled block
    /// are to be reported.
    #[builder(default = "false")]
    #[serde(default)]
    pub write_symmetry_diagnostics: bool,
}

impl RelaxedDensityParams {
    /// Returns a builder to construct a [`RelaxedDensityParams`] structure.
    pub fn builder() -> RelaxedDensityParamsBuilder {
        RelaxedDensityParamsBuilder::default()
    }
}

impl Default for RelaxedDensityParams {
    fn default() -> Self {
        Self::builder()
            .build()
            .expect("Unable to construct a default `RelaxedDensityParams`.")
    }
}

impl fmt::Display for RelaxedDensityParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Check N-representability: {}",
            nice_bool(self.check_n_representability)
        )?;
        if self.check_n_representability {
            writeln!(
                f,
                "Trace deviation threshold: {:.3e}",
                self.trace_deviation_threshold
            )?;
        }
        writeln!(
            f,
            "Report block symmetry diagnostics: {}",
            nice_bool(self.write_symmetry_diagnostics)
        )?;
        writeln!(f)?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain relaxed density assembly results.
#[derive(Clone, Builder, Debug)]
pub struct RelaxedDensityResult {
    /// The control parameters used to obtain this set of results.
    parameters: RelaxedDensityParams,

    /// The store holding every block of the relaxed TPDM.
    density: TensorStore,

    /// The N-representability traces, if they have been requested.
    #[builder(default = "None")]
    n_representability: Option<NRepresentabilityReport>,
}

impl RelaxedDensityResult {
    fn builder() -> RelaxedDensityResultBuilder {
        RelaxedDensityResultBuilder::default()
    }

    pub fn parameters(&self) -> &RelaxedDensityParams {
        &self.parameters
    }

    /// Returns the store holding the relaxed TPDM blocks.
    pub fn density(&self) -> &TensorStore {
        &self.density
    }

    pub fn n_representability(&self) -> Option<&NRepresentabilityReport> {
        self.n_representability.as_ref()
    }

    /// Writes the norm and, for blocks whose bra and ket pair spaces coincide, the largest
    /// bra-ket asymmetry of every block.
    fn write_block_diagnostics(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label_width = self
            .density
            .labels()
            .map(|label| label.chars().count())
            .max()
            .unwrap_or(5)
            .max(5);
        writeln!(f, "{}", "┈".repeat(label_width + 32))?;
        writeln!(
            f,
            "{:<label_width$}  {:>14}  {:>14}",
            "Block", "Norm", "Asymmetry"
        )?;
        writeln!(f, "{}", "┈".repeat(label_width + 32))?;
        for tensor in self.density.iter() {
            let asymmetry = tensor
                .max_asymmetry()
                .map(|x| format!("{x:.6e}"))
                .unwrap_or_else(|_| "--".to_string());
            writeln!(
                f,
                "{:<label_width$}  {:>14.6e}  {:>14}",
                tensor.label(),
                tensor.norm(),
                asymmetry
            )?;
        }
        writeln!(f, "{}", "┈".repeat(label_width + 32))?;
        Ok(())
    }
}

impl fmt::Display for RelaxedDensityResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Relaxed TPDM blocks assembled: {}",
            self.density.len()
        )?;
        writeln!(f)?;
        if self.parameters.write_symmetry_diagnostics {
            self.write_block_diagnostics(f)?;
            writeln!(f)?;
        }
        if let Some(report) = self.n_representability.as_ref() {
            write!(f, "{report}")?;
            writeln!(f)?;
        }
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for the assembly of the relaxed TPDM.
///
/// All four builders are run in turn against the same amplitude store, after which the traces
/// of the assembled density are optionally checked against the number of electrons.
#[derive(Clone, Builder)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct RelaxedDensityDriver<'a> {
    /// The control parameters for relaxed density assembly.
    parameters: &'a RelaxedDensityParams,

    /// The orbital spaces.
    spaces: &'a MoSpaces,

    /// The store holding the response amplitudes `Λ` and `Z`.
    amplitudes: &'a TensorStore,

    /// The one-particle response quantities.
    one_particle: &'a OneParticleResponse,

    /// The result of the assembly.
    #[builder(setter(skip), default = "None")]
    result: Option<RelaxedDensityResult>,
}

impl<'a> RelaxedDensityDriverBuilder<'a> {
    fn validate(&self) -> Result<(), String> {
        let params = self
            .parameters
            .ok_or("No relaxed density parameters found.".to_string())?;
        if params.trace_deviation_threshold < 0.0 {
            return Err(format!(
                "Trace deviation threshold {:.3e} must be non-negative.",
                params.trace_deviation_threshold
            ));
        }
        let spaces = self
            .spaces
            .ok_or("No orbital spaces found.".to_string())?;
        spaces.check().map_err(|err| err.to_string())?;
        let one_particle = self
            .one_particle
            .ok_or("No one-particle response quantities found.".to_string())?;
        one_particle
            .check_against(spaces)
            .map_err(|err| err.to_string())
    }
}

impl<'a> RelaxedDensityDriver<'a> {
    /// Returns a builder to construct a [`RelaxedDensityDriver`] structure.
    pub fn builder() -> RelaxedDensityDriverBuilder<'a> {
        RelaxedDensityDriverBuilder::default()
    }

    /// Executes relaxed density assembly.
    fn assemble_relaxed_density(&mut self) -> Result<(), anyhow::Error> {
        log_macsec_begin("Relaxed Density Assembly");
        dcrdm_output!("");
        let params = self.parameters;
        params.log_output_display();
        self.spaces.log_output_display();
        dcrdm_output!("");

        log_subtitle("Relaxed TPDM blocks");
        dcrdm_output!("");
        let mut density = TensorStore::new("Relaxed TPDM");
        build_relaxed_oooo(self.spaces, self.amplitudes, self.one_particle, &mut density)?;
        dcrdm_output!("OOOO blocks assembled.");
        build_relaxed_oovv(self.spaces, self.amplitudes, &mut density)?;
        dcrdm_output!("OOVV and VVOO blocks assembled.");
        build_relaxed_ovov(self.spaces, self.amplitudes, self.one_particle, &mut density)?;
        dcrdm_output!("OVOV blocks assembled.");
        build_relaxed_vvvv(self.spaces, self.amplitudes, self.one_particle, &mut density)?;
        dcrdm_output!("VVVV blocks assembled.");
        dcrdm_output!("");
        if density.len() != N_RELAXED_BLOCKS {
            dcrdm_warn!(
                "{} relaxed TPDM blocks assembled, but {N_RELAXED_BLOCKS} are expected.",
                density.len()
            );
        }

        let n_representability = if params.check_n_representability {
            let report = compute_n_representability(self.spaces, self.one_particle, &density)?;
            if !report.is_satisfied(params.trace_deviation_threshold) {
                dcrdm_warn!(
                    "Density traces deviate from N = {} by more than {:.3e}: OPDM {:+.4e}, TPDM {:+.4e}.",
                    report.nelectrons(),
                    params.trace_deviation_threshold,
                    report.opdm_deviation(),
                    report.tpdm_deviation()
                );
            }
            Some(report)
        } else {
            None
        };

        let result = RelaxedDensityResult::builder()
            .parameters(params.clone())
            .density(density)
            .n_representability(n_representability)
            .build()?;
        result.log_output_display();
        self.result = Some(result);
        log_macsec_end("Relaxed Density Assembly");
        dcrdm_output!("");
        Ok(())
    }
}

impl DcrdmDriver for RelaxedDensityDriver<'_> {
    type Params = RelaxedDensityParams;

    type Outcome = RelaxedDensityResult;

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No relaxed density assembly results found."))
    }

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.assemble_relaxed_density()
    }
}
