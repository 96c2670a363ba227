//! Error types for DWARF decoding.

use std::collections::TryReserveError;

use thiserror::Error;

/// Result alias used throughout the crate.
pub type Result<T> = std::result::Result<T, DwarfError>;

/// The category of a [`DwarfError`], without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    OutOfMemory,
    InvalidUnit,
    UnsupportedVersion,
    MalformedAbbreviation,
    MalformedDie,
    TruncatedBuffer,
    UnsupportedWidth,
    Leb128Overflow,
}

/// Error type for DWARF decoding.
///
/// Every variant records the byte offset, within the section being read,
/// at which the problem was detected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DwarfError {
    /// An allocation failed while building nodes or tables.
    #[error("out of memory while building {context} at offset {offset:#x}")]
    OutOfMemory { offset: u64, context: &'static str },

    /// A unit header declares more bytes than the section has left.
    #[error("invalid unit at offset {offset:#x}: length {length:#x} exceeds {remaining:#x} remaining bytes")]
    InvalidUnit {
        offset: u64,
        length: u64,
        remaining: u64,
    },

    /// Compilation unit version outside the supported set.
    #[error("unsupported DWARF version {version} in unit at offset {offset:#x}")]
    UnsupportedVersion { offset: u64, version: u16 },

    /// Ill-formed abbreviation code, tag or form stream.
    #[error("malformed abbreviation at offset {offset:#x}: {reason}")]
    MalformedAbbreviation { offset: u64, reason: &'static str },

    /// A DIE that cannot be decoded against its unit's abbreviations.
    #[error("malformed DIE at offset {offset:#x}: {reason}")]
    MalformedDie { offset: u64, reason: &'static str },

    /// A read would have consumed bytes past the end of the section.
    #[error("truncated data at offset {offset:#x}: needed {needed} bytes, {available} available while reading {context}")]
    TruncatedBuffer {
        offset: u64,
        needed: u64,
        available: u64,
        context: &'static str,
    },

    /// Fixed-width read or write with a width outside {1, 2, 4, 8}.
    #[error("unsupported {width}-byte fixed-width value at offset {offset:#x}")]
    UnsupportedWidth { offset: u64, width: usize },

    /// A LEB128 value that does not fit in 64 bits.
    #[error("LEB128 value at offset {offset:#x} overflows 64 bits")]
    Leb128Overflow { offset: u64 },
}

impl DwarfError {
    /// Returns the error category.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::OutOfMemory { .. } => ErrorKind::OutOfMemory,
            Self::InvalidUnit { .. } => ErrorKind::InvalidUnit,
            Self::UnsupportedVersion { .. } => ErrorKind::UnsupportedVersion,
            Self::MalformedAbbreviation { .. } => ErrorKind::MalformedAbbreviation,
            Self::MalformedDie { .. } => ErrorKind::MalformedDie,
            Self::TruncatedBuffer { .. } => ErrorKind::TruncatedBuffer,
            Self::UnsupportedWidth { .. } => ErrorKind::UnsupportedWidth,
            Self::Leb128Overflow { .. } => ErrorKind::Leb128Overflow,
        }
    }

    /// Returns the section offset at which the error was detected.
    pub fn offset(&self) -> u64 {
        match *self {
            Self::OutOfMemory { offset, .. }
            | Self::InvalidUnit { offset, .. }
            | Self::UnsupportedVersion { offset, .. }
            | Self::MalformedAbbreviation { offset, .. }
            | Self::MalformedDie { offset, .. }
            | Self::TruncatedBuffer { offset, .. }
            | Self::UnsupportedWidth { offset, .. }
            | Self::Leb128Overflow { offset } => offset,
        }
    }

    /// Creates a new TruncatedBuffer error.
    pub fn truncated(offset: u64, needed: u64, available: u64, context: &'static str) -> Self {
        Self::TruncatedBuffer {
            offset,
            needed,
            available,
            context,
        }
    }

    /// Creates a new MalformedDie error.
    pub fn malformed_die(offset: u64, reason: &'static str) -> Self {
        Self::MalformedDie { offset, reason }
    }

    /// Creates a new MalformedAbbreviation error.
    pub fn malformed_abbrev(offset: u64, reason: &'static str) -> Self {
        Self::MalformedAbbreviation { offset, reason }
    }

    pub(crate) fn out_of_memory(offset: u64, context: &'static str) -> impl Fn(TryReserveError) -> Self {
        move |_| Self::OutOfMemory { offset, context }
    }
}

/// Pushes onto `vec`, reporting allocation failure instead of aborting.
pub(crate) fn try_push<T>(
    vec: &mut Vec<T>,
    value: T,
    offset: u64,
    context: &'static str,
) -> Result<()> {
    vec.try_reserve(1)
        .map_err(DwarfError::out_of_memory(offset, context))?;
    vec.push(value);
    Ok(())
}
