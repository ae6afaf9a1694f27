//! Layout helpers and logging macros for the `dcrdm-output` log target.
//!
//! Everything printed as part of a calculation report goes through the `dcrdm-output` target,
//! so that the binary can route it separately from diagnostic logging.

use std::fmt;

use log;

#[cfg(test)]
#[path = "format_tests.rs"]
mod format_tests;

/// Width of a macro-section delimiter line.
const DCRDM_BANNER_LENGTH: usize = 103;

/// Reports an error both on the default target and in the `dcrdm-output` report.
macro_rules! dcrdm_error {
    ($fmt:expr $(, $($arg:tt)*)?) => {
        log::error!($fmt, $($($arg)*)?);
        log::error!(target: "dcrdm-output", $fmt, $($($arg)*)?);
    }
}

/// Adds a warning to the `dcrdm-output` report.
macro_rules! dcrdm_warn {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::warn!(target: "dcrdm-output", $fmt, $($($arg)*)?); }
}

/// Adds a line to the `dcrdm-output` report.
macro_rules! dcrdm_output {
    ($fmt:expr $(, $($arg:tt)*)?) => { log::info!(target: "dcrdm-output", $fmt, $($($arg)*)?); }
}

pub(crate) use {dcrdm_error, dcrdm_output, dcrdm_warn};

/// Returns `text` followed by a double rule of the same visible width.
fn underlined(text: &str) -> [String; 2] {
    [text.to_string(), "═".repeat(text.chars().count())]
}

/// Returns the delimiter line opening (`[Begin]`) or closing (`[ End ]`) a macro-section.
fn macsec_line(sectitle: &str, begin: bool) -> String {
    let (tag, fill) = if begin { ("Begin", '❬') } else { (" End ", '❭') };
    let lead = fill.to_string().repeat(5);
    let head = format!("{lead} [{tag}] {sectitle} ");
    let padding = DCRDM_BANNER_LENGTH.saturating_sub(head.chars().count());
    format!("{head}{}", fill.to_string().repeat(padding))
}

/// Writes an underlined subtitle into a [`fmt::Formatter`].
pub(crate) fn write_subtitle(f: &mut fmt::Formatter<'_>, subtitle: &str) -> fmt::Result {
    underlined(subtitle)
        .iter()
        .try_for_each(|line| writeln!(f, "{line}"))
}

/// Reports an underlined subtitle.
pub(crate) fn log_subtitle(subtitle: &str) {
    underlined(subtitle)
        .iter()
        .for_each(|line| {
            dcrdm_output!("{line}");
        });
}

pub(crate) fn log_macsec_begin(sectitle: &str) {
    dcrdm_output!("{}", macsec_line(sectitle, true));
}

pub(crate) fn log_macsec_end(sectitle: &str) {
    dcrdm_output!("{}", macsec_line(sectitle, false));
}

/// Renders a flag as `yes` or `no`.
pub(crate) fn nice_bool(b: bool) -> String {
    let word = if b { "yes" } else { "no" };
    word.to_string()
}

/// Reporting of any displayable value, one `dcrdm-output` line per line of its [`fmt::Display`]
/// rendering.
pub(crate) trait DcrdmOutput: fmt::Debug + fmt::Display {
    fn log_output_display(&self) {
        self.to_string()
            .lines()
            .for_each(|line| {
                dcrdm_output!("{line}");
            });
    }
}

impl<T> DcrdmOutput for T where T: fmt::Debug + fmt::Display {}
