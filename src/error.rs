use std::fmt;
use std::io;
use std::path::PathBuf;
use std::string::FromUtf8Error;

use thiserror::Error;

/// File operation that failed, reported alongside the path.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum FileOp {
    Create,
    Open,
}

impl fmt::Display for FileOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            FileOp::Create => "create",
            FileOp::Open => "open",
        })
    }
}

/// Errors returned by `ChainMap` lookups and persistence.
#[derive(Error, Debug)]
pub enum Error {
    /// Lookup of a key that is not in the map.
    #[error("key not found")]
    KeyNotFound,

    /// The file could not be opened or created.
    #[error("failed to {op} {path:?}: {source}")]
    Io {
        op: FileOp,
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// Writing an encoded map failed.
    #[error("encode error: {0}")]
    Encode(#[from] EncodeError),

    /// The stream does not hold a valid encoded map. Any table that was
    /// being rebuilt from it has been discarded.
    #[error("decode error: {0}")]
    Decode(#[from] DecodeError),
}

/// Errors raised while encoding.
#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// The text format is line based; a key with a line break cannot be stored.
    #[error("key {0:?} contains a line break and cannot be written as text")]
    UnrepresentableKey(String),
}

/// Errors raised while decoding either format.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("I/O error: {0}")]
    Io(io::Error),

    /// The stream ended inside the named field.
    #[error("stream truncated while reading {0}")]
    Truncated(&'static str),

    #[error("invalid header: {0}")]
    InvalidHeader(String),

    #[error("line {line}: {reason}")]
    InvalidLine { line: usize, reason: String },

    /// A header or length field is negative or above the configured limit.
    #[error("{field} {value} is out of range (limit {limit})")]
    OutOfRange {
        field: &'static str,
        value: i64,
        limit: u64,
    },

    #[error("not valid UTF-8: {0}")]
    Utf8(#[from] FromUtf8Error),

    #[error("duplicate key {0:?}")]
    DuplicateKey(String),

    #[error("header declares {expected} entries but {found} were read")]
    EntryCountMismatch { expected: usize, found: usize },
}

impl DecodeError {
    /// Map a read failure on `field`; an early EOF means the stream was cut short.
    pub(crate) fn read(field: &'static str, e: io::Error) -> Self {
        if e.kind() == io::ErrorKind::UnexpectedEof {
            DecodeError::Truncated(field)
        } else {
            DecodeError::Io(e)
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
