//! Disk cache of raw response bodies, keyed by the SHA-1 of the request identity.
//!
//! Entries are never expired. Writes go through a temp file in the cache directory
//! followed by a rename, so a reader sees either the old state or a full entry.

use crate::error::{Error, Result};
use crate::payload::{Payload, PayloadFormat};
use sha1::{Digest, Sha1};
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Lowercase hex SHA-1 of `identity`.
pub fn identity_digest(identity: &str) -> String {
    let mut hasher = Sha1::new();
    hasher.update(identity.as_bytes());
    format!("{:x}", hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct DiskCache {
    dir: PathBuf,
}

impl DiskCache {
    /// Open (and create if needed) a cache rooted at `dir`.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn path_for(&self, identity: &str, format: PayloadFormat) -> PathBuf {
        self.dir
            .join(format!("{}.{}", identity_digest(identity), format.extension()))
    }

    /// Look up `identity`.
    ///
    /// `Ok(None)` is a plain miss. `Err(CacheRead)` means an entry exists but could not be
    /// used (unreadable, truncated, wrong shape); callers treat it as a miss too.
    pub fn read(&self, identity: &str, format: PayloadFormat) -> Result<Option<Payload>> {
        let path = self.path_for(identity, format);
        let bytes = match fs::read(&path) {
            Ok(b) => b,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(Error::CacheRead {
                    path,
                    reason: e.to_string(),
                });
            }
        };
        Payload::parse(&bytes, format)
            .map(Some)
            .map_err(|e| Error::CacheRead {
                path,
                reason: e.to_string(),
            })
    }

    /// Store `body` for `identity`, replacing any previous entry atomically.
    ///
    /// ### Errors
    /// [`Error::CacheWrite`] when the temp file cannot be created, written or renamed.
    pub fn write(&self, identity: &str, format: PayloadFormat, body: &[u8]) -> Result<PathBuf> {
        let path = self.path_for(identity, format);
        let wrap = |reason: String| Error::CacheWrite {
            path: path.clone(),
            reason,
        };
        let mut tmp = NamedTempFile::new_in(&self.dir).map_err(|e| wrap(e.to_string()))?;
        tmp.write_all(body).map_err(|e| wrap(e.to_string()))?;
        tmp.flush().map_err(|e| wrap(e.to_string()))?;
        // The temp file is removed on drop if persisting fails.
        tmp.persist(&path).map_err(|e| wrap(e.error.to_string()))?;
        Ok(path)
    }
}
