//! On-disk bytecode cache keyed by source checksum.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use super::{Bytecode, Checksum, CodecError};

#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache I/O error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("corrupt cache entry at {path}: {source}")]
    Corrupt { path: PathBuf, source: CodecError },
}

/// What is written to disk: the unit payload plus the checksum it was
/// compiled from.
#[derive(Serialize, Deserialize)]
struct CacheRecord {
    checksum: Checksum,
    bytecode: Bytecode,
}

#[derive(Debug, Clone)]
pub struct BytecodeCache {
    directory: PathBuf,
}

impl BytecodeCache {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// The cache under the platform cache directory, if the platform has one.
    pub fn platform_default() -> Option<Self> {
        dirs::cache_dir().map(|dir| Self::new(dir.join("weft")))
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    pub fn path_for(&self, checksum: Checksum) -> PathBuf {
        self.directory.join(format!("{}.wfc", checksum.to_hex()))
    }

    /// Look up the unit compiled from a source with the given checksum.
    ///
    /// A missing entry, or an entry recorded for a different checksum, is a
    /// miss.
    pub fn load(&self, checksum: Checksum) -> Result<Option<Bytecode>, CacheError> {
        let path = self.path_for(checksum);
        let bytes = match fs::read(&path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "bytecode cache miss");
                return Ok(None);
            }
            Err(source) => return Err(CacheError::Io { path, source }),
        };

        let record: CacheRecord = rmp_serde::from_slice(&bytes).map_err(|e| CacheError::Corrupt {
            path: path.clone(),
            source: e.into(),
        })?;

        if record.checksum != checksum {
            warn!(
                path = %path.display(),
                expected = %checksum.to_hex(),
                found = %record.checksum.to_hex(),
                "ignoring cache entry with mismatched checksum"
            );
            return Ok(None);
        }

        debug!(path = %path.display(), "bytecode cache hit");
        Ok(Some(record.bytecode.with_checksum(checksum)))
    }

    pub fn store(&self, bytecode: &Bytecode) -> Result<(), CacheError> {
        let path = self.path_for(bytecode.checksum);
        fs::create_dir_all(&self.directory).map_err(|source| CacheError::Io {
            path: self.directory.clone(),
            source,
        })?;

        let record = CacheRecord {
            checksum: bytecode.checksum,
            bytecode: bytecode.clone(),
        };
        let bytes = rmp_serde::to_vec_named(&record).map_err(|e| CacheError::Corrupt {
            path: path.clone(),
            source: e.into(),
        })?;
        fs::write(&path, bytes).map_err(|source| CacheError::Io {
            path: path.clone(),
            source,
        })?;

        debug!(path = %path.display(), "stored bytecode in cache");
        Ok(())
    }
}
