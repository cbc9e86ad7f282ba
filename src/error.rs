use crate::Digest;
use oci_spec::{image::MediaType, OciSpecError};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    //
    // Manifest state
    //
    #[error("Manifest unavailable, load or set content first: {0}")]
    Unavailable(String),
    #[error("Unsupported media type: {0}")]
    UnsupportedMediaType(String),
    #[error("Manifest is already loaded: {0}")]
    AlreadyLoaded(MediaType),

    //
    // Integrity of received content
    //
    #[error("Digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: Digest },
    #[error("Size mismatch: expected {expected}, got {actual}")]
    SizeMismatch { expected: u64, actual: u64 },

    //
    // Invalid user input
    //
    #[error("Invalid digest: {0}")]
    InvalidDigest(String),
    #[error("Unsupported digest algorithm: {0}")]
    UnsupportedDigestAlgorithm(String),
    #[error("Invalid name for repository: {0}")]
    InvalidName(String),
    #[error("Invalid reference to image: {0}")]
    InvalidReference(String),
    #[error(transparent)]
    InvalidPort(#[from] std::num::ParseIntError),
    #[error("Invalid platform: {0}")]
    InvalidPlatform(String),
    #[error("Invalid target-triple: {0}")]
    InvalidTargetTriple(String),

    //
    // Invalid document
    //
    #[error(transparent)]
    InvalidJson(#[from] serde_json::error::Error),
    #[error("Invalid OCI structure: {0}")]
    InvalidStructure(String),

    //
    // Configuration
    //
    #[error("Unsupported config version: {0}")]
    UnsupportedConfigVersion(u32),
    #[error("Config is not bound to any file")]
    MissingConfigFilename,

    //
    // System error
    //
    #[error("No valid home directory path could be retrieved from the operating system.")]
    NoValidHomeDirectory,
    #[error(transparent)]
    UnknownIo(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<OciSpecError> for Error {
    fn from(e: OciSpecError) -> Self {
        match e {
            OciSpecError::SerDe(e) => Error::InvalidJson(e),
            OciSpecError::Io(e) => Error::UnknownIo(e),
            OciSpecError::Builder(e) => Error::InvalidStructure(e.to_string()),
            OciSpecError::Other(e) => Error::InvalidStructure(e),
        }
    }
}
