//! Molecule serialization primitives
//!
//! Layouts (all integers little-endian u32 unless noted):
//! - struct: fixed-width fields back to back, no header (built directly into
//!   arrays by the entity types)
//! - fixvec: `item_count || items`, every item the same width (`Bytes` is a fixvec of bytes)
//! - dynvec / table: `total_size || offsets[n] || items`; an empty one is just `total_size = 4`
//! - option: empty for `None`, the inner encoding for `Some`
//!
//! Builders return owned buffers grown with `try_reserve`, so allocation
//! failure surfaces as [`Error::OutOfMemory`] instead of aborting.

use crate::error::{Error, Result};

const HEADER_SIZE: usize = 4;

fn alloc(capacity: usize) -> Result<Vec<u8>> {
    let mut buf = Vec::new();
    buf.try_reserve_exact(capacity)?;
    Ok(buf)
}

fn len_u32(len: usize) -> Result<[u8; 4]> {
    u32::try_from(len)
        .map(u32::to_le_bytes)
        .map_err(|_| Error::InvalidParameter("molecule item larger than 4 GiB"))
}

/// Length-prefixed byte blob (`Bytes`)
pub fn bytes(data: &[u8]) -> Result<Vec<u8>> {
    let mut buf = alloc(HEADER_SIZE + data.len())?;
    buf.extend_from_slice(&len_u32(data.len())?);
    buf.extend_from_slice(data);
    Ok(buf)
}

/// Vector of equal-width items
pub fn fixvec<T: AsRef<[u8]>>(items: &[T]) -> Result<Vec<u8>> {
    let body: usize = items.iter().map(|i| i.as_ref().len()).sum();
    debug_assert!(items.windows(2).all(|w| w[0].as_ref().len() == w[1].as_ref().len()));

    let mut buf = alloc(HEADER_SIZE + body)?;
    buf.extend_from_slice(&len_u32(items.len())?);
    for item in items {
        buf.extend_from_slice(item.as_ref());
    }
    Ok(buf)
}

/// Vector of variable-width items behind an offset table
pub fn dynvec<T: AsRef<[u8]>>(items: &[T]) -> Result<Vec<u8>> {
    let header = HEADER_SIZE * (1 + items.len());
    let total = header + items.iter().map(|i| i.as_ref().len()).sum::<usize>();

    let mut buf = alloc(total)?;
    buf.extend_from_slice(&len_u32(total)?);
    let mut offset = header;
    for item in items {
        buf.extend_from_slice(&len_u32(offset)?);
        offset += item.as_ref().len();
    }
    for item in items {
        buf.extend_from_slice(item.as_ref());
    }
    Ok(buf)
}

/// Table of heterogeneous fields; same layout as [`dynvec`]
pub fn table<T: AsRef<[u8]>>(fields: &[T]) -> Result<Vec<u8>> {
    dynvec(fields)
}

/// Optional field: absent encodes to nothing
pub fn option(inner: Option<Vec<u8>>) -> Vec<u8> {
    inner.unwrap_or_default()
}

fn read_u32(data: &[u8], at: usize) -> Result<usize> {
    let raw = data
        .get(at..at + HEADER_SIZE)
        .ok_or(Error::Malformed("truncated header"))?;
    let mut word = [0u8; 4];
    word.copy_from_slice(raw);
    Ok(u32::from_le_bytes(word) as usize)
}

/// Payload of a `Bytes` blob; the blob must span all of `data`
pub fn read_bytes(data: &[u8]) -> Result<&[u8]> {
    let len = read_u32(data, 0)?;
    if data.len() != HEADER_SIZE + len {
        return Err(Error::Malformed("bytes length mismatch"));
    }
    Ok(&data[HEADER_SIZE..])
}

/// Items of a fixvec whose items are `item_size` bytes wide
pub fn read_fixvec(data: &[u8], item_size: usize) -> Result<Vec<&[u8]>> {
    let count = read_u32(data, 0)?;
    let expected = count
        .checked_mul(item_size)
        .and_then(|body| body.checked_add(HEADER_SIZE))
        .ok_or(Error::Malformed("fixvec too large"))?;
    if data.len() != expected {
        return Err(Error::Malformed("fixvec length mismatch"));
    }
    Ok(data[HEADER_SIZE..].chunks_exact(item_size).collect())
}

/// Items of a dynvec
pub fn read_dynvec(data: &[u8]) -> Result<Vec<&[u8]>> {
    let total = read_u32(data, 0)?;
    if total != data.len() {
        return Err(Error::Malformed("total size mismatch"));
    }
    if total == HEADER_SIZE {
        return Ok(Vec::new());
    }

    let first = read_u32(data, HEADER_SIZE)?;
    if first % HEADER_SIZE != 0 || first < HEADER_SIZE * 2 || first > total {
        return Err(Error::Malformed("invalid first offset"));
    }
    let count = first / HEADER_SIZE - 1;

    let mut offsets = Vec::with_capacity(count + 1);
    for i in 0..count {
        offsets.push(read_u32(data, HEADER_SIZE * (1 + i))?);
    }
    offsets.push(total);

    let mut items = Vec::with_capacity(count);
    for pair in offsets.windows(2) {
        if pair[0] > pair[1] {
            return Err(Error::Malformed("offsets out of order"));
        }
        items.push(&data[pair[0]..pair[1]]);
    }
    Ok(items)
}

/// Fields of a table that must have exactly `field_count` fields
pub fn read_table(data: &[u8], field_count: usize) -> Result<Vec<&[u8]>> {
    let fields = read_dynvec(data)?;
    if fields.len() != field_count {
        return Err(Error::Malformed("unexpected table field count"));
    }
    Ok(fields)
}

/// `None` for an empty slice
pub fn read_option(data: &[u8]) -> Option<&[u8]> {
    if data.is_empty() {
        None
    } else {
        Some(data)
    }
}
