//! Text layout:
//!
//! ```text
//! <capacity> <size>
//! <key> <value>
//! ...
//! ```
//!
//! Key and value are split at the last space of the line, so keys may
//! contain spaces. Blank lines are skipped.

use std::io::{BufRead, Read, Write};

use super::DecodeLimits;
use crate::chain_map::ChainMap;
use crate::digest::Digest;
use crate::error::{DecodeError, EncodeError};

/// Write `map` in bucket-then-chain order, one entry per line.
pub fn encode<W: Write, D: Digest>(map: &ChainMap<D>, mut writer: W) -> Result<(), EncodeError> {
    writeln!(writer, "{} {}", map.capacity(), map.len())?;
    for (key, value) in map {
        if key.contains(['\n', '\r']) {
            return Err(EncodeError::UnrepresentableKey(key.to_owned()));
        }
        writeln!(writer, "{key} {value}")?;
    }
    Ok(())
}

/// Read a map written by [`encode`]. The number of entry lines must match
/// the header.
pub fn decode<R: BufRead, D: Digest>(
    mut reader: R,
    digest: D,
    limits: &DecodeLimits,
) -> Result<ChainMap<D>, DecodeError> {
    let max_line = limits.line_len();
    let header = read_line(&mut reader, max_line)?
        .ok_or_else(|| DecodeError::InvalidHeader("empty stream".to_string()))?;
    let (capacity, size) = parse_header(&header)?;
    let capacity = limits.capacity(capacity)?;
    let size = limits.entries(size)?;
    limits.density(capacity, size)?;

    let mut map = ChainMap::for_decode(capacity, digest, size);
    let mut found = 0;
    let mut line_no = 1;
    while let Some(line) = read_line(&mut reader, max_line)? {
        line_no += 1;
        if line.is_empty() {
            continue;
        }
        let (key, value) =
            parse_entry(&line).map_err(|reason| DecodeError::InvalidLine { line: line_no, reason })?;
        limits.key_len(key.len() as i64)?;
        if found == size {
            return Err(DecodeError::EntryCountMismatch {
                expected: size,
                found: found + 1,
            });
        }
        map.place(key.to_owned(), value)?;
        found += 1;
    }
    if found != size {
        return Err(DecodeError::EntryCountMismatch {
            expected: size,
            found,
        });
    }
    Ok(map)
}

/// Next line without its `"\n"` or `"\r\n"` terminator, `None` at end of
/// stream. At most `max_len + 1` bytes are buffered per line.
fn read_line<R: BufRead>(reader: &mut R, max_len: u64) -> Result<Option<String>, DecodeError> {
    let mut buf = Vec::new();
    let n = reader
        .by_ref()
        .take(max_len.saturating_add(1))
        .read_until(b'\n', &mut buf)
        .map_err(DecodeError::Io)?;
    if n == 0 {
        return Ok(None);
    }
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    } else if n as u64 > max_len {
        return Err(DecodeError::OutOfRange {
            field: "line length",
            value: i64::try_from(n).unwrap_or(i64::MAX),
            limit: max_len,
        });
    }
    Ok(Some(String::from_utf8(buf)?))
}

fn parse_header(line: &str) -> Result<(i64, i64), DecodeError> {
    let mut fields = line.split_whitespace();
    let (Some(capacity), Some(size), None) = (fields.next(), fields.next(), fields.next()) else {
        return Err(DecodeError::InvalidHeader(format!(
            "expected \"<capacity> <size>\", got {line:?}"
        )));
    };
    let parse = |name: &str, field: &str| {
        field
            .parse::<i64>()
            .map_err(|e| DecodeError::InvalidHeader(format!("{name} {field:?}: {e}")))
    };
    Ok((parse("capacity", capacity)?, parse("size", size)?))
}

fn parse_entry(line: &str) -> Result<(&str, i32), String> {
    let (key, value) = line
        .rsplit_once(' ')
        .ok_or_else(|| "no space between key and value".to_string())?;
    let value = value
        .parse::<i32>()
        .map_err(|e| format!("invalid value {value:?}: {e}"))?;
    Ok((key, value))
}
