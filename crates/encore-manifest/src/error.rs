use thiserror::Error;

pub type Result<T, E = ManifestError> = std::result::Result<T, E>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ManifestError {
    /// A path could not be resolved against an absolute base URL.
    #[error("cannot resolve '{path}' against '{base}': {reason}")]
    InvalidUrl {
        base: String,
        path: String,
        reason: String,
    },

    #[error("unsupported integrity hash algorithm '{algorithm}' (expected sha256, sha384 or sha512)")]
    UnsupportedAlgorithm { algorithm: String },
}
