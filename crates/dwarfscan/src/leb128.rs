//! LEB128 (Little Endian Base 128) encoding/decoding.
//!
//! DWARF uses LEB128 for variable-length integers. This encoding uses
//! 7 bits per byte, with the high bit indicating continuation.

use crate::error::{DwarfError, Result};

fn next_byte(data: &[u8], cursor: u64, start: u64, context: &'static str) -> Result<u8> {
    usize::try_from(cursor)
        .ok()
        .and_then(|index| data.get(index).copied())
        .ok_or_else(|| {
            DwarfError::truncated(
                start,
                cursor - start + 1,
                (data.len() as u64).saturating_sub(start),
                context,
            )
        })
}

/// Decode an unsigned LEB128 value at `*cursor`, advancing the cursor past it.
pub fn read_uleb128(data: &[u8], cursor: &mut u64) -> Result<u64> {
    let start = *cursor;
    let mut pos = start;
    let mut result: u64 = 0;
    let mut shift: u32 = 0;

    loop {
        let byte = next_byte(data, pos, start, "ULEB128 value")?;
        pos += 1;

        let low_bits = u64::from(byte & 0x7F);

        // Payload bits past bit 63 cannot be represented
        if (shift >= 64 && low_bits != 0) || (shift == 63 && low_bits > 1) {
            return Err(DwarfError::Leb128Overflow { offset: start });
        }
        if shift < 64 {
            result |= low_bits << shift;
        }
        shift += 7;

        // High bit clear means this is the last byte
        if byte & 0x80 == 0 {
            break;
        }
    }

    *cursor = pos;
    Ok(result)
}

/// Decode a signed LEB128 value at `*cursor`, advancing the cursor past it.
///
/// The result is sign-extended from bit 6 of the final byte whenever the
/// accumulated shift is still inside the 64-bit range.
pub fn read_sleb128(data: &[u8], cursor: &mut u64) -> Result<i64> {
    let start = *cursor;
    let mut pos = start;
    let mut result: i64 = 0;
    let mut shift: u32 = 0;
    let mut last_byte;

    loop {
        let byte = next_byte(data, pos, start, "SLEB128 value")?;
        last_byte = byte;
        pos += 1;

        if shift >= 64 {
            return Err(DwarfError::Leb128Overflow { offset: start });
        }
        result |= i64::from(byte & 0x7F) << shift;
        shift += 7;

        if byte & 0x80 == 0 {
            break;
        }
    }

    // Sign extend if the sign bit (bit 6 of last byte) is set
    if shift < 64 && (last_byte & 0x40) != 0 {
        result |= !0i64 << shift;
    }

    *cursor = pos;
    Ok(result)
}

/// Append the unsigned LEB128 encoding of `value` to `out`.
/// Returns the number of bytes written.
pub fn encode_uleb128(mut value: u64, out: &mut Vec<u8>) -> usize {
    let mut written = 0;
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        out.push(byte);
        written += 1;
        if value == 0 {
            return written;
        }
    }
}

/// Append the signed LEB128 encoding of `value` to `out`.
/// Returns the number of bytes written.
pub fn encode_sleb128(mut value: i64, out: &mut Vec<u8>) -> usize {
    let mut written = 0;
    loop {
        let byte = (value & 0x7F) as u8;
        // Arithmetic shift keeps the sign
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        out.push(if done { byte } else { byte | 0x80 });
        written += 1;
        if done {
            return written;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uleb(data: &[u8]) -> (u64, u64) {
        let mut cursor = 0;
        let value = read_uleb128(data, &mut cursor).unwrap();
        (value, cursor)
    }

    fn sleb(data: &[u8]) -> (i64, u64) {
        let mut cursor = 0;
        let value = read_sleb128(data, &mut cursor).unwrap();
        (value, cursor)
    }

    #[test]
    fn test_uleb128_single_byte() {
        // Values 0-127 fit in a single byte
        assert_eq!(uleb(&[0x00]), (0, 1));
        assert_eq!(uleb(&[0x01]), (1, 1));
        assert_eq!(uleb(&[0x7F]), (127, 1));
    }

    #[test]
    fn test_uleb128_multi_byte() {
        assert_eq!(uleb(&[0x80, 0x01]), (128, 2));
        // 624485 = 0xE5 0x8E 0x26
        assert_eq!(uleb(&[0xE5, 0x8E, 0x26]), (624485, 3));
    }

    #[test]
    fn test_uleb128_reads_from_cursor() {
        let data = [0xFF, 0x80, 0x01, 0x05];
        let mut cursor = 1;
        assert_eq!(read_uleb128(&data, &mut cursor).unwrap(), 128);
        assert_eq!(cursor, 3);
        assert_eq!(read_uleb128(&data, &mut cursor).unwrap(), 5);
        assert_eq!(cursor, 4);
    }

    #[test]
    fn test_uleb128_truncated() {
        let mut cursor = 0;
        let err = read_uleb128(&[0x80, 0x80], &mut cursor).unwrap_err();
        assert!(matches!(err, DwarfError::TruncatedBuffer { offset: 0, .. }));
        // Cursor is untouched on failure
        assert_eq!(cursor, 0);
    }

    #[test]
    fn test_uleb128_overflow() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x02];
        let mut cursor = 0;
        assert!(matches!(
            read_uleb128(&data, &mut cursor),
            Err(DwarfError::Leb128Overflow { offset: 0 })
        ));
    }

    #[test]
    fn test_uleb128_max() {
        let data = [0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0xFF, 0x01];
        assert_eq!(uleb(&data), (u64::MAX, 10));
    }

    #[test]
    fn test_sleb128_positive() {
        assert_eq!(sleb(&[0x00]), (0, 1));
        assert_eq!(sleb(&[0x01]), (1, 1));
        assert_eq!(sleb(&[0x3F]), (63, 1));
        assert_eq!(sleb(&[0x80, 0x01]), (128, 2));
    }

    #[test]
    fn test_sleb128_negative() {
        assert_eq!(sleb(&[0x7F]), (-1, 1));
        assert_eq!(sleb(&[0x40]), (-64, 1));
        assert_eq!(sleb(&[0xBF, 0x7F]), (-65, 2));
        // -123456 = 0xC0 0xBB 0x78
        assert_eq!(sleb(&[0xC0, 0xBB, 0x78]), (-123456, 3));
    }

    #[test]
    fn test_sleb128_extends_past_32_bits() {
        let mut buf = Vec::new();
        encode_sleb128(i64::MIN / 2, &mut buf);
        assert_eq!(buf.len(), 9);
        assert_eq!(sleb(&buf), (i64::MIN / 2, 9));

        buf.clear();
        encode_sleb128(-(1i64 << 40), &mut buf);
        assert_eq!(sleb(&buf).0, -(1i64 << 40));
    }

    #[test]
    fn test_uleb128_boundaries_round_trip() {
        for value in [0, 127, 128, u64::from(u32::MAX), i64::MAX as u64, u64::MAX] {
            let mut buf = Vec::new();
            let written = encode_uleb128(value, &mut buf);
            assert_eq!(uleb(&buf), (value, written as u64));
        }
    }

    #[test]
    fn test_sleb128_boundaries_round_trip() {
        for value in [0, -1, 63, 64, -64, -65, i64::MIN / 2, i64::MIN, i64::MAX] {
            let mut buf = Vec::new();
            let written = encode_sleb128(value, &mut buf);
            assert_eq!(sleb(&buf), (value, written as u64));
        }
    }
}
