//! Binary layout, little-endian throughout:
//!
//! ```text
//! i64 capacity
//! i64 size
//! repeat size times:
//!   i64 key length
//!   u8[key length] key bytes (UTF-8, no terminator)
//!   i32 value
//! ```

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use super::DecodeLimits;
use crate::chain_map::ChainMap;
use crate::digest::Digest;
use crate::error::{DecodeError, EncodeError};

/// Write `map` in bucket-then-chain order.
pub fn encode<W: Write, D: Digest>(map: &ChainMap<D>, mut writer: W) -> Result<(), EncodeError> {
    writer.write_i64::<LittleEndian>(map.capacity() as i64)?;
    writer.write_i64::<LittleEndian>(map.len() as i64)?;
    for (key, value) in map {
        writer.write_i64::<LittleEndian>(key.len() as i64)?;
        writer.write_all(key.as_bytes())?;
        writer.write_i32::<LittleEndian>(value)?;
    }
    Ok(())
}

/// Read a map written by [`encode`]. Bytes after the last entry are ignored.
pub fn decode<R: Read, D: Digest>(
    mut reader: R,
    digest: D,
    limits: &DecodeLimits,
) -> Result<ChainMap<D>, DecodeError> {
    let capacity = reader
        .read_i64::<LittleEndian>()
        .map_err(|e| DecodeError::read("capacity", e))?;
    let capacity = limits.capacity(capacity)?;
    let size = reader
        .read_i64::<LittleEndian>()
        .map_err(|e| DecodeError::read("size", e))?;
    let size = limits.entries(size)?;
    limits.density(capacity, size)?;

    let mut map = ChainMap::for_decode(capacity, digest, size);
    for _ in 0..size {
        let key_len = reader
            .read_i64::<LittleEndian>()
            .map_err(|e| DecodeError::read("key length", e))?;
        let key_len = limits.key_len(key_len)?;

        // `take` keeps a lying length field from reserving more than the stream holds.
        let mut key = Vec::new();
        reader
            .by_ref()
            .take(key_len as u64)
            .read_to_end(&mut key)
            .map_err(|e| DecodeError::read("key bytes", e))?;
        if key.len() != key_len {
            return Err(DecodeError::Truncated("key bytes"));
        }
        let key = String::from_utf8(key)?;

        let value = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| DecodeError::read("value", e))?;
        map.place(key, value)?;
    }
    Ok(map)
}
