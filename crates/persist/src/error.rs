//! Persistence error taxonomy.

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Anything wrong with envelope bytes themselves: decode failures,
    /// unknown tags, checksum mismatches, registry refusals.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The envelope was written by a different protocol version.
    #[error("envelope version {found} is not supported (this build reads version {supported})")]
    IncompatibleVersion { found: u32, supported: u32 },

    /// A sub-envelope inside an operator failed to restore. The whole
    /// operator restore aborts; no partially wired operator is returned.
    #[error("operator parameter `{parameter}` failed to restore")]
    CorruptReference {
        parameter: String,
        #[source]
        source: Box<Error>,
    },

    #[error("I/O error: {0}")]
    Io(String),
}

pub type Result<T> = std::result::Result<T, Error>;
