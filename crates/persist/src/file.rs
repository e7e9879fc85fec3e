//! Envelopes on disk.
//!
//! One pipeline for every kind: encode to an envelope, compress with
//! zstd, write. Loading reverses it and funnels into the same checked
//! decode as in-memory restore.

use std::path::Path;

use tracing::{debug, info};

use crate::envelope::{from_bytes, to_bytes, Persistable};
use crate::error::{Error, Result};

/// Default zstd compression level (3 = good balance of speed/size).
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

pub fn save<T: Persistable>(value: &T, path: &Path) -> Result<()> {
    save_with_level(value, path, DEFAULT_COMPRESSION_LEVEL)
}

pub fn save_with_level<T: Persistable>(value: &T, path: &Path, level: i32) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| Error::Io(e.to_string()))?;
    }
    let encoded = to_bytes(value)?;
    let compressed =
        zstd::encode_all(&encoded[..], level).map_err(|e| Error::Io(e.to_string()))?;
    debug!(
        bytes = encoded.len(),
        compressed = compressed.len(),
        "envelope compressed"
    );
    std::fs::write(path, compressed).map_err(|e| Error::Io(e.to_string()))?;
    info!(path = %path.display(), kind = ?T::KIND, "envelope written");
    Ok(())
}

pub fn load<T: Persistable>(path: &Path) -> Result<T> {
    let compressed = std::fs::read(path).map_err(|e| Error::Io(e.to_string()))?;
    let encoded = zstd::decode_all(&compressed[..]).map_err(|e| Error::Io(e.to_string()))?;
    debug!(
        path = %path.display(),
        compressed = compressed.len(),
        bytes = encoded.len(),
        "envelope decompressed"
    );
    let value = from_bytes(&encoded)?;
    info!(path = %path.display(), kind = ?T::KIND, "envelope loaded");
    Ok(value)
}
