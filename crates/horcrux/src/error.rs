//! error types for horcrux

use std::path::PathBuf;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// coarse classification used by callers deciding how to report a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// shard set or parameters are unusable as given
    Validation,
    /// the filesystem refused a read, write or seek
    Io,
    /// secret sharing or cipher setup failed
    Crypto,
    /// destination exists and overwriting was not permitted
    Collision,
}

#[derive(Debug, Error)]
pub enum Error {
    // === validation errors ===
    #[error("invalid parameters: total must be in 2..=255 and threshold in 2..=total (got total {total}, threshold {threshold})")]
    InvalidParameters { total: usize, threshold: usize },

    #[error("malformed shard {path}: {reason}")]
    MalformedShard { path: PathBuf, reason: String },

    #[error("no shards found")]
    NoShards,

    #[error("shards are from different split operations ({first} and {other} disagree)")]
    InconsistentShards { first: PathBuf, other: PathBuf },

    #[error("not enough shards: {required} required, {available} available")]
    NotEnoughShards { required: usize, available: usize },

    #[error("missing shard {0} for all-shards-required reconstruction")]
    MissingShard(u8),

    #[error("shard {0} supplied more than once")]
    DuplicateShard(u8),

    #[error("shard {0} does not belong to this split")]
    UnexpectedShard(u8),

    #[error("destination must be a directory: {0}")]
    NotADirectory(PathBuf),

    // === io errors ===
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    // === crypto errors ===
    #[error("secret sharing failed: {0}")]
    Sharing(String),

    #[error("fragment length mismatch: expected {expected} bytes, got {got}")]
    FragmentLength { expected: usize, got: usize },

    #[error("cipher setup failed: {0}")]
    Cipher(String),

    #[error("randomness source failed: {0}")]
    Randomness(#[from] rand::Error),

    // === collision errors ===
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidParameters { .. }
            | Error::MalformedShard { .. }
            | Error::NoShards
            | Error::InconsistentShards { .. }
            | Error::NotEnoughShards { .. }
            | Error::MissingShard(_)
            | Error::DuplicateShard(_)
            | Error::UnexpectedShard(_)
            | Error::NotADirectory(_) => ErrorKind::Validation,
            Error::Io(_) => ErrorKind::Io,
            Error::Sharing(_)
            | Error::FragmentLength { .. }
            | Error::Cipher(_)
            | Error::Randomness(_) => ErrorKind::Crypto,
            Error::AlreadyExists(_) => ErrorKind::Collision,
        }
    }

    pub(crate) fn malformed(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Error::MalformedShard {
            path: path.into(),
            reason: reason.into(),
        }
    }
}
