//! Reading and writing of `dcrdm` binary stores and YAML configuration files.

use std::fs::File;
use std::io::{BufReader, BufWriter};
use std::path::Path;

use anyhow::{self, format_err};
use bincode;
use serde::{de::DeserializeOwned, Serialize};
use serde_yaml;

pub(crate) mod format;


/// Kinds of binary file read and written by `dcrdm`, distinguished by extension.
pub enum DcrdmFileType {
    /// A [`TensorStore`](crate::tensor::store::TensorStore) of named block tensors.
    Store,

    /// A [`OneParticleResponse`](crate::onepdm::OneParticleResponse).
    OneParticle,
}

impl DcrdmFileType {
    /// The extension appended to file names of this kind.
    pub fn ext(&self) -> String {
        match self {
            DcrdmFileType::Store => "dcrdm.store".to_string(),
            DcrdmFileType::OneParticle => "dcrdm.opdm".to_string(),
        }
    }
}

/// Loads a bincode-encoded value from `name` with the extension of `file_type` appended.
///
/// # Errors
///
/// Errors if the file cannot be opened or does not decode into `T`.
pub fn read_dcrdm_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: DcrdmFileType,
) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut reader = BufReader::new(File::open(path).map_err(|err| format_err!(err))?);
    bincode::deserialize_from(&mut reader).map_err(|err| format_err!(err))
}

/// Saves `value` bincode-encoded to `name` with the extension of `file_type` appended,
/// replacing any existing file.
pub fn write_dcrdm_binary<T, P: AsRef<Path>>(
    name: P,
    file_type: DcrdmFileType,
    value: &T,
) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension(file_type.ext());
    let mut writer = BufWriter::new(File::create(path)?);
    bincode::serialize_into(&mut writer, value).map_err(|err| format_err!(err))
}

/// Parses a YAML document, such as an [`Input`](crate::interfaces::input::Input), from the file
/// at `name`. The path is used as given, extension included.
pub fn read_dcrdm_yaml<T, P: AsRef<Path>>(name: P) -> Result<T, anyhow::Error>
where
    T: DeserializeOwned,
{
    let mut reader = BufReader::new(File::open(name).map_err(|err| format_err!(err))?);
    serde_yaml::from_reader(&mut reader).map_err(|err| format_err!(err))
}

/// Writes `value` as YAML to `name` with a `.yml` extension.
pub fn write_dcrdm_yaml<T, P: AsRef<Path>>(name: P, value: &T) -> Result<(), anyhow::Error>
where
    T: Serialize,
{
    let mut path = name.as_ref().to_path_buf();
    path.set_extension("yml");
    let mut writer = BufWriter::new(File::create(path)?);
    serde_yaml::to_writer(&mut writer, value).map_err(|err| format_err!(err))
}
