//! Local durable mirror of the cart.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::domain::state::CartState;

/// Failure reading or writing a local mirror.
#[derive(Debug, Error)]
pub enum MirrorError {
    /// File system failure.
    #[error("mirror i/o error: {0}")]
    Io(#[from] std::io::Error),

    /// The stored cart could not be (de)serialized.
    #[error("mirror serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Device-local storage for the cart, read once at start-up and written
/// after every change.
pub trait LocalCartMirror: Send + Sync {
    /// Loads the stored cart, `None` if nothing was stored yet.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError` if the store exists but cannot be read.
    fn load(&self) -> Result<Option<CartState>, MirrorError>;

    /// Overwrites the stored cart.
    ///
    /// # Errors
    ///
    /// Returns `MirrorError` if the cart cannot be written.
    fn save(&self, state: &CartState) -> Result<(), MirrorError>;
}

/// Mirror backed by a single JSON file.
#[derive(Debug, Clone)]
pub struct JsonFileMirror {
    path: PathBuf,
}

impl JsonFileMirror {
    /// Creates a mirror at `path`. Nothing is touched until first use.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl LocalCartMirror for JsonFileMirror {
    fn load(&self) -> Result<Option<CartState>, MirrorError> {
        let bytes = match std::fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(err) => return Err(err.into()),
        };
        Ok(Some(serde_json::from_slice(&bytes)?))
    }

    fn save(&self, state: &CartState) -> Result<(), MirrorError> {
        let json = serde_json::to_vec(state)?;
        // Rename is atomic within one file system; readers never see a partial cart.
        let tmp = self.path.with_extension("tmp");
        std::fs::write(&tmp, json)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}
