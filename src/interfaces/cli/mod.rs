//! Command-line interface of `dcrdm`.

use std::path::PathBuf;

use clap::Parser;

use crate::io::format::dcrdm_output;

const VERSION: Option<&str> = option_env!("CARGO_PKG_VERSION");

/// Logs a nicely formatted `dcrdm` heading to the `dcrdm-output` logger.
pub fn log_heading() {
    let version = if let Some(ver) = VERSION {
        format!("v{ver}")
    } else {
        "v unknown".to_string()
    };
    dcrdm_output!("╭─────────────────────────────────────────────────────────────────────────────────────────────────────╮");
    dcrdm_output!("│                                                                                                     │");
    dcrdm_output!("│                       DDDDDD      CCCCCC    RRRRRRR    DDDDDD     MM      MM                        │");
    dcrdm_output!("│                       DD   DD    CC    CC   RR    RR   DD   DD    MMM    MMM                        │");
    dcrdm_output!("│                       DD    DD   CC         RR    RR   DD    DD   MMMM  MMMM                        │");
    dcrdm_output!("│                       DD    DD   CC         RRRRRRR    DD    DD   MM MMMM MM                        │");
    dcrdm_output!("│                       DD    DD   CC         RR  RR     DD    DD   MM  MM  MM                        │");
    dcrdm_output!("│                       DD   DD    CC    CC   RR   RR    DD   DD    MM      MM                        │");
    dcrdm_output!("│                       DDDDDD      CCCCCC    RR    RR   DDDDDD     MM      MM                        │");
    dcrdm_output!("│                                                                                                     │");
    dcrdm_output!("│                    Relaxed two-particle densities for density cumulant gradients                    │");
    dcrdm_output!("│                                                                                                     │");
    dcrdm_output!("│{version:>99}  │");
    dcrdm_output!("╰─────────────────────────────────────────────────────────────────────────────────────────────────────╯");
    dcrdm_output!("");
}

/// Assembles relaxed two-particle density matrices from density cumulant response amplitudes.
#[derive(Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// The YAML input file.
    #[arg(short, long)]
    pub config: PathBuf,

    /// The file to which program output is written. If absent, output goes to the console.
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}
