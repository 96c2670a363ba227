//! Primitive codec for DWARF section bytes.
//!
//! Every multi-byte read in the crate goes through this module, so byte
//! order and bounds checks live in exactly one place. The free functions
//! operate on a caller-supplied `u64` cursor; [`Reader`] wraps a section
//! slice and cursor together for the higher-level parsers.

use crate::error::{DwarfError, Result};
use crate::leb128;

pub use crate::leb128::{encode_sleb128, encode_uleb128};

/// Byte order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endianness {
    Little,
    Big,
}

impl Endianness {
    /// Map the ELF `EI_DATA` identification byte to a byte order.
    pub fn from_elf_data(ei_data: u8) -> Option<Self> {
        match ei_data {
            1 => Some(Endianness::Little),
            2 => Some(Endianness::Big),
            _ => None,
        }
    }

    /// The byte order of the host.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// 32-bit or 64-bit DWARF representation of a unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Format {
    Dwarf32,
    Dwarf64,
}

impl Format {
    /// Width in bytes of offset-sized fields.
    pub fn offset_size(self) -> usize {
        match self {
            Format::Dwarf32 => 4,
            Format::Dwarf64 => 8,
        }
    }

    /// Size in bytes of the initial length field.
    pub fn initial_length_size(self) -> u64 {
        match self {
            Format::Dwarf32 => 4,
            Format::Dwarf64 => 12,
        }
    }
}

/// Per-unit parameters that decide how attribute values are encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Encoding {
    pub format: Format,
    pub version: u16,
    /// Size in bytes of a target address.
    pub address_size: u8,
}

/// Escape value in a 32-bit initial length announcing 64-bit DWARF.
pub const DWARF64_ESCAPE: u64 = 0xffff_ffff;

/// Resolve `cursor..cursor + len` inside `data`, or report truncation.
fn span(data: &[u8], cursor: u64, len: u64, context: &'static str) -> Result<std::ops::Range<usize>> {
    let size = data.len() as u64;
    let available = size.saturating_sub(cursor);
    if cursor > size || len > available {
        return Err(DwarfError::truncated(cursor, len, available, context));
    }
    // Both ends are bounded by data.len(), so they fit in usize
    let start = cursor as usize;
    Ok(start..start + len as usize)
}

fn check_width(width: usize, cursor: u64) -> Result<()> {
    match width {
        1 | 2 | 4 | 8 => Ok(()),
        _ => Err(DwarfError::UnsupportedWidth {
            offset: cursor,
            width,
        }),
    }
}

/// Read a `width`-byte integer at `*cursor` and advance the cursor.
pub fn read_fixed(data: &[u8], cursor: &mut u64, width: usize, order: Endianness) -> Result<u64> {
    check_width(width, *cursor)?;
    let range = span(data, *cursor, width as u64, "fixed-width value")?;

    let mut buf = [0u8; 8];
    let value = match order {
        Endianness::Little => {
            buf[..width].copy_from_slice(&data[range]);
            u64::from_le_bytes(buf)
        }
        Endianness::Big => {
            buf[8 - width..].copy_from_slice(&data[range]);
            u64::from_be_bytes(buf)
        }
    };

    *cursor += width as u64;
    Ok(value)
}

/// Write the low `width` bytes of `value` at `*cursor` and advance the cursor.
pub fn write_fixed(
    data: &mut [u8],
    cursor: &mut u64,
    value: u64,
    width: usize,
    order: Endianness,
) -> Result<()> {
    check_width(width, *cursor)?;
    let range = span(data, *cursor, width as u64, "fixed-width value")?;

    match order {
        Endianness::Little => data[range].copy_from_slice(&value.to_le_bytes()[..width]),
        Endianness::Big => data[range].copy_from_slice(&value.to_be_bytes()[8 - width..]),
    }

    *cursor += width as u64;
    Ok(())
}

/// Decode an unsigned LEB128 value at `*cursor`.
pub fn read_uleb128(data: &[u8], cursor: &mut u64) -> Result<u64> {
    leb128::read_uleb128(data, cursor)
}

/// Decode a signed LEB128 value at `*cursor`.
pub fn read_sleb128(data: &[u8], cursor: &mut u64) -> Result<i64> {
    leb128::read_sleb128(data, cursor)
}

/// Read a null-terminated string at `*cursor`.
///
/// The returned bytes exclude the terminator. An unterminated string runs
/// to the end of `data`; the cursor then stops at the end instead of
/// stepping past a terminator that is not there.
pub fn read_cstring<'a>(data: &'a [u8], cursor: &mut u64) -> Result<&'a [u8]> {
    let start = usize::try_from(*cursor)
        .ok()
        .filter(|&start| start <= data.len())
        .ok_or_else(|| DwarfError::truncated(*cursor, 1, 0, "null-terminated string"))?;

    let rest = &data[start..];
    match rest.iter().position(|&b| b == 0) {
        Some(len) => {
            *cursor += len as u64 + 1;
            Ok(&rest[..len])
        }
        None => {
            *cursor += rest.len() as u64;
            Ok(rest)
        }
    }
}

/// Borrow `length` bytes at `*cursor` and advance the cursor.
pub fn read_block<'a>(data: &'a [u8], cursor: &mut u64, length: u64) -> Result<&'a [u8]> {
    let range = span(data, *cursor, length, "byte block")?;
    *cursor += length;
    Ok(&data[range])
}

/// Look up a null-terminated string in `.debug_str` by offset.
pub fn read_str_at(debug_str: &[u8], offset: u64) -> Option<&str> {
    let start = usize::try_from(offset).ok()?;
    let bytes = debug_str.get(start..)?;
    let end = bytes.iter().position(|&b| b == 0)?;
    std::str::from_utf8(&bytes[..end]).ok()
}

/// A cursor over one DWARF section.
///
/// Offsets are always relative to the start of the section, even when the
/// reader has been narrowed with [`Reader::limit`].
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    data: &'a [u8],
    offset: u64,
    endianness: Endianness,
}

impl<'a> Reader<'a> {
    pub fn new(data: &'a [u8], endianness: Endianness) -> Self {
        Self {
            data,
            offset: 0,
            endianness,
        }
    }

    /// A reader positioned at `offset` that cannot read past `end`.
    pub fn limit(&self, offset: u64, end: u64) -> Result<Reader<'a>> {
        let range = span(self.data, 0, end, "section range")?;
        Ok(Reader {
            data: &self.data[range],
            offset,
            endianness: self.endianness,
        })
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Current section offset.
    pub fn position(&self) -> u64 {
        self.offset
    }

    pub fn seek(&mut self, offset: u64) {
        self.offset = offset;
    }

    /// Section length visible to this reader.
    pub fn len(&self) -> u64 {
        self.data.len() as u64
    }

    /// Bytes left between the cursor and the end.
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.offset)
    }

    /// True when the cursor is at or past the end.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn fixed(&mut self, width: usize) -> Result<u64> {
        read_fixed(self.data, &mut self.offset, width, self.endianness)
    }

    pub fn u8(&mut self) -> Result<u8> {
        Ok(self.fixed(1)? as u8)
    }

    pub fn u16(&mut self) -> Result<u16> {
        Ok(self.fixed(2)? as u16)
    }

    pub fn u32(&mut self) -> Result<u32> {
        Ok(self.fixed(4)? as u32)
    }

    pub fn u64(&mut self) -> Result<u64> {
        self.fixed(8)
    }

    /// An offset-sized value for the given format.
    pub fn offset(&mut self, format: Format) -> Result<u64> {
        self.fixed(format.offset_size())
    }

    /// A target address of `size` bytes.
    pub fn address(&mut self, size: u8) -> Result<u64> {
        self.fixed(usize::from(size))
    }

    pub fn uleb128(&mut self) -> Result<u64> {
        read_uleb128(self.data, &mut self.offset)
    }

    pub fn sleb128(&mut self) -> Result<i64> {
        read_sleb128(self.data, &mut self.offset)
    }

    pub fn cstring(&mut self) -> Result<&'a [u8]> {
        read_cstring(self.data, &mut self.offset)
    }

    pub fn block(&mut self, length: u64) -> Result<&'a [u8]> {
        read_block(self.data, &mut self.offset, length)
    }

    /// Read an initial length field, detecting the 64-bit escape.
    ///
    /// Returns the unit length and its format.
    pub fn initial_length(&mut self) -> Result<(u64, Format)> {
        let length = self.fixed(4)?;
        if length == DWARF64_ESCAPE {
            Ok((self.u64()?, Format::Dwarf64))
        } else {
            Ok((length, Format::Dwarf32))
        }
    }
}
