//! Named collections of block tensors.

use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{self, format_err};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::io::{read_dcrdm_binary, write_dcrdm_binary, DcrdmFileType};
use crate::tensor::BlockTensor;

#[cfg(test)]
#[path = "store_tests.rs"]
mod store_tests;

/// How a [`TensorStore`] is opened.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StoreMode {
    /// Starts an empty store, discarding anything previously written under the same name.
    New,

    /// Reads a previously written store.
    Existing,
}

/// A named collection of block tensors, retrieved by label.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct TensorStore {
    name: String,

    tensors: IndexMap<String, BlockTensor>,

    /// The file this store is backed by, without `dcrdm`-specific extensions.
    #[serde(skip)]
    path: Option<PathBuf>,
}

impl TensorStore {
    /// Creates an empty in-memory store.
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            tensors: IndexMap::new(),
            path: None,
        }
    }

    /// Opens a store backed by a file.
    ///
    /// # Arguments
    ///
    /// * `path` - The name of the backing file, without `dcrdm`-specific extensions.
    /// * `mode` - Whether to start afresh or to read the existing contents.
    pub fn open<P: AsRef<Path>>(path: P, mode: StoreMode) -> Result<Self, anyhow::Error> {
        let path = path.as_ref().to_path_buf();
        let mut store = match mode {
            StoreMode::New => Self::new(
                &path
                    .file_name()
                    .map(|name| name.to_string_lossy().to_string())
                    .unwrap_or_default(),
            ),
            StoreMode::Existing => read_dcrdm_binary::<TensorStore, _>(&path, DcrdmFileType::Store)
                .map_err(|err| {
                    format_err!("Unable to open tensor store `{}`: {err}", path.display())
                })?,
        };
        store.path = Some(path);
        Ok(store)
    }

    /// Closes the store, writing its contents to its backing file if `keep` is set.
    pub fn close(self, keep: bool) -> Result<(), anyhow::Error> {
        match (&self.path, keep) {
            (Some(path), true) => write_dcrdm_binary(path, DcrdmFileType::Store, &self),
            _ => Ok(()),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.tensors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tensors.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.tensors.contains_key(label)
    }

    /// Returns the labels of all tensors in insertion order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.tensors.keys().map(|label| label.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = &BlockTensor> {
        self.tensors.values()
    }

    /// Retrieves a tensor by label.
    ///
    /// # Errors
    ///
    /// Errors if no tensor of that label exists, which typically means that an upstream step has
    /// not been run.
    pub fn tensor(&self, label: &str) -> Result<&BlockTensor, anyhow::Error> {
        self.tensors.get(label).ok_or_else(|| {
            format_err!(
                "Tensor `{label}` not found in store `{}`. Has the step producing it been run?",
                self.name
            )
        })
    }

    /// Inserts a tensor under its own label, returning any tensor it replaces.
    pub fn insert(&mut self, tensor: BlockTensor) -> Option<BlockTensor> {
        self.tensors.insert(tensor.label().to_string(), tensor)
    }

    pub fn remove(&mut self, label: &str) -> Option<BlockTensor> {
        self.tensors.shift_remove(label)
    }
}

impl Extend<BlockTensor> for TensorStore {
    fn extend<I: IntoIterator<Item = BlockTensor>>(&mut self, tensors: I) {
        tensors.into_iter().for_each(|tensor| {
            self.insert(tensor);
        });
    }
}

impl fmt::Display for TensorStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Tensor store `{}` ({} tensors):", self.name, self.len())?;
        for tensor in self.iter() {
            writeln!(f, "  {tensor}")?;
        }
        Ok(())
    }
}
