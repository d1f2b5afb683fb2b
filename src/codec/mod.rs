//! Persistence for `ChainMap`: a little-endian binary layout and a
//! line-oriented text layout.
//!
//! Both codecs are stateless single-pass functions over `Write`/`Read`.
//! Decoding always builds a fresh table with the recorded capacity and places
//! every entry directly into its bucket, bypassing the growth policy. Each
//! chain is rebuilt in stream order, so decoding and re-encoding at the same
//! capacity reproduces the input exactly.
//!
//! Header and length fields are untrusted: they are checked against
//! [`DecodeLimits`] before anything is allocated from them.

pub mod binary;
pub mod text;

use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use crate::chain_map::ChainMap;
use crate::digest::{Digest, Fnv1a};
use crate::error::{DecodeError, EncodeError, Error, FileOp, Result};

/// On-disk encoding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum Format {
    Binary,
    Text,
}

/// Bounds applied to header and length fields while decoding.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct DecodeLimits {
    /// Largest accepted bucket count.
    pub max_capacity: u64,
    /// Largest accepted entry count.
    pub max_entries: u64,
    /// Largest accepted key length in bytes. Text lines are capped at this
    /// plus [`DecodeLimits::LINE_OVERHEAD`].
    pub max_key_len: u64,
    /// Largest accepted ratio of buckets to declared entries once the
    /// capacity exceeds [`DecodeLimits::SPARSE_CAPACITY_FLOOR`].
    pub max_buckets_per_entry: u64,
}

impl DecodeLimits {
    pub const DEFAULT_MAX_CAPACITY: u64 = 1 << 20;
    pub const DEFAULT_MAX_ENTRIES: u64 = 1 << 27;
    pub const DEFAULT_MAX_KEY_LEN: u64 = 1 << 20;
    pub const DEFAULT_MAX_BUCKETS_PER_ENTRY: u64 = 64;
    /// Capacities up to this many buckets are accepted whatever the size.
    pub const SPARSE_CAPACITY_FLOOR: u64 = 1 << 16;
    /// Text line bytes beyond the key: separator, `i32` value and `"\r\n"`.
    pub const LINE_OVERHEAD: u64 = 32;

    pub const fn new() -> Self {
        Self {
            max_capacity: Self::DEFAULT_MAX_CAPACITY,
            max_entries: Self::DEFAULT_MAX_ENTRIES,
            max_key_len: Self::DEFAULT_MAX_KEY_LEN,
            max_buckets_per_entry: Self::DEFAULT_MAX_BUCKETS_PER_ENTRY,
        }
    }

    pub const fn with_max_capacity(mut self, n: u64) -> Self {
        self.max_capacity = n;
        self
    }

    pub const fn with_max_entries(mut self, n: u64) -> Self {
        self.max_entries = n;
        self
    }

    pub const fn with_max_key_len(mut self, n: u64) -> Self {
        self.max_key_len = n;
        self
    }

    pub const fn with_max_buckets_per_entry(mut self, n: u64) -> Self {
        self.max_buckets_per_entry = n;
        self
    }

    pub(crate) fn capacity(&self, value: i64) -> std::result::Result<usize, DecodeError> {
        bounded("capacity", value, 1, self.max_capacity)
    }

    pub(crate) fn entries(&self, value: i64) -> std::result::Result<usize, DecodeError> {
        bounded("size", value, 0, self.max_entries)
    }

    pub(crate) fn key_len(&self, value: i64) -> std::result::Result<usize, DecodeError> {
        bounded("key length", value, 0, self.max_key_len)
    }

    /// Reject a bucket vector far larger than the declared entries need.
    /// Runs after both header fields passed their own bounds.
    pub(crate) fn density(
        &self,
        capacity: usize,
        size: usize,
    ) -> std::result::Result<(), DecodeError> {
        let limit = (size.max(1) as u64)
            .saturating_mul(self.max_buckets_per_entry)
            .max(Self::SPARSE_CAPACITY_FLOOR);
        if capacity as u64 > limit {
            return Err(DecodeError::OutOfRange {
                field: "capacity",
                value: capacity as i64,
                limit,
            });
        }
        Ok(())
    }

    pub(crate) fn line_len(&self) -> u64 {
        self.max_key_len.saturating_add(Self::LINE_OVERHEAD)
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::new()
    }
}

fn bounded(
    field: &'static str,
    value: i64,
    min: i64,
    limit: u64,
) -> std::result::Result<usize, DecodeError> {
    let out_of_range = DecodeError::OutOfRange {
        field,
        value,
        limit,
    };
    if value < min || value as u64 > limit {
        return Err(out_of_range);
    }
    usize::try_from(value).map_err(|_| out_of_range)
}

impl<D: Digest> ChainMap<D> {
    /// Encode the map into the file at `path`, creating or truncating it.
    pub fn save(&self, path: impl AsRef<Path>, format: Format) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| Error::Io {
            op: FileOp::Create,
            path: path.to_path_buf(),
            source,
        })?;
        let mut writer = BufWriter::new(file);
        match format {
            Format::Binary => binary::encode(self, &mut writer)?,
            Format::Text => text::encode(self, &mut writer)?,
        }
        writer.flush().map_err(EncodeError::from)?;
        log::debug!(
            "saved {} entries ({} buckets) as {:?} to {:?}",
            self.len(),
            self.capacity(),
            format,
            path
        );
        Ok(())
    }

    pub fn write_binary(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(path, Format::Binary)
    }

    pub fn write_text(&self, path: impl AsRef<Path>) -> Result<()> {
        self.save(path, Format::Text)
    }

    /// Decode a new map from the file at `path` using `digest` for bucket
    /// placement. On error nothing of the partially decoded table survives.
    pub fn load_with(
        path: impl AsRef<Path>,
        format: Format,
        digest: D,
        limits: &DecodeLimits,
    ) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Io {
            op: FileOp::Open,
            path: path.to_path_buf(),
            source,
        })?;
        let reader = BufReader::new(file);
        let map = match format {
            Format::Binary => binary::decode(reader, digest, limits),
            Format::Text => text::decode(reader, digest, limits),
        }
        .inspect_err(|e| log::debug!("rejected {format:?} map at {path:?}: {e}"))?;
        log::debug!(
            "loaded {} entries ({} buckets) as {:?} from {:?}",
            map.len(),
            map.capacity(),
            format,
            path
        );
        Ok(map)
    }
}

impl ChainMap<Fnv1a> {
    pub fn load(path: impl AsRef<Path>, format: Format) -> Result<Self> {
        Self::load_with(path, format, Fnv1a, &DecodeLimits::default())
    }

    pub fn read_binary(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path, Format::Binary)
    }

    pub fn read_text(path: impl AsRef<Path>) -> Result<Self> {
        Self::load(path, Format::Text)
    }
}
