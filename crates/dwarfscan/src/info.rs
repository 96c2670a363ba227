//! DWARF compilation unit parsing (.debug_info).
//!
//! This module segments the .debug_info section into compilation units.
//! Units are strictly sequential: the start of unit n+1 is only known once
//! the header of unit n has been read, so parsing stops at the first unit
//! that fails.

use crate::abbrev::AbbreviationTable;
use crate::codec::{Encoding, Endianness, Format, Reader};
use crate::die::{AttributeValue, Die, DieId, DieParser, DieTree};
use crate::error::{DwarfError, Result};
use crate::types::{DwAt, DwLang, DwTag};

/// Compilation unit versions this decoder accepts.
pub const SUPPORTED_VERSIONS: std::ops::RangeInclusive<u16> = 2..=3;

/// A DWARF compilation unit header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompilationUnitHeader {
    /// Offset of this CU in .debug_info.
    pub offset: u64,
    /// Unit length (excluding the length field itself).
    pub unit_length: u64,
    /// 32-bit or 64-bit DWARF.
    pub format: Format,
    /// DWARF version.
    pub version: u16,
    /// Offset into .debug_abbrev section.
    pub debug_abbrev_offset: u64,
    /// Address size in bytes.
    pub address_size: u8,
    /// Offset of the first DIE.
    pub entries_offset: u64,
    /// Offset of the following unit.
    pub next_offset: u64,
}

impl CompilationUnitHeader {
    pub fn encoding(&self) -> Encoding {
        Encoding {
            format: self.format,
            version: self.version,
            address_size: self.address_size,
        }
    }

    /// Size of the header, initial length included.
    pub fn header_size(&self) -> u64 {
        self.entries_offset - self.offset
    }
}

/// A parsed compilation unit.
#[derive(Debug, Clone)]
pub struct CompilationUnit {
    /// The compilation unit header.
    pub header: CompilationUnitHeader,
    /// The unit's abbreviation table.
    pub abbrevs: AbbreviationTable,
    /// Every DIE in the unit.
    pub dies: DieTree,
}

impl CompilationUnit {
    pub fn offset(&self) -> u64 {
        self.header.offset
    }

    pub fn next_offset(&self) -> u64 {
        self.header.next_offset
    }

    /// True if the section offset falls inside this unit.
    pub fn contains(&self, offset: u64) -> bool {
        (self.header.offset..self.header.next_offset).contains(&offset)
    }

    /// The DW_TAG_compile_unit entry.
    pub fn root(&self) -> Option<&Die> {
        self.dies.root()
    }

    /// Get the name of the compilation unit (source file).
    pub fn name(&self) -> Option<&str> {
        self.root()?.name()
    }

    /// Get the compilation directory.
    pub fn comp_dir(&self) -> Option<&str> {
        match self.root()?.attr(DwAt::CompDir)? {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the producer (compiler) string.
    pub fn producer(&self) -> Option<&str> {
        match self.root()?.attr(DwAt::Producer)? {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the source language.
    pub fn language(&self) -> Option<DwLang> {
        let value = self.root()?.attr(DwAt::Language)?.as_u64()?;
        u16::try_from(value).ok().map(DwLang::from)
    }

    /// Get the offset into .debug_line for line number info.
    pub fn stmt_list(&self) -> Option<u64> {
        match self.root()?.attr(DwAt::StmtList)? {
            AttributeValue::SecOffset(offset) | AttributeValue::Unsigned(offset) => Some(*offset),
            _ => None,
        }
    }

    /// Resolve a reference attribute to a DIE of this unit.
    ///
    /// CU-relative references are rebased on the unit offset; `RefAddr`
    /// values are already section offsets and only resolve when they land
    /// inside this unit.
    pub fn resolve_reference(&self, value: &AttributeValue) -> Option<DieId> {
        let target = match *value {
            AttributeValue::Reference(relative) => self.header.offset.checked_add(relative)?,
            AttributeValue::RefAddr(absolute) => absolute,
            _ => return None,
        };
        self.dies.by_offset(target)
    }

    /// Iterate over all subprograms in this compilation unit.
    pub fn subprograms(&self) -> impl Iterator<Item = &Die> {
        self.dies
            .iter()
            .map(|(_, die)| die)
            .filter(|die| die.tag == DwTag::Subprogram)
    }
}

/// Parser for the .debug_info section.
pub struct DebugInfoParser<'a> {
    /// The raw .debug_info data.
    debug_info: &'a [u8],
    /// The raw .debug_abbrev data.
    debug_abbrev: &'a [u8],
    endianness: Endianness,
}

impl<'a> DebugInfoParser<'a> {
    /// Create a new debug info parser.
    pub fn new(debug_info: &'a [u8], debug_abbrev: &'a [u8], endianness: Endianness) -> Self {
        Self {
            debug_info,
            debug_abbrev,
            endianness,
        }
    }

    /// Iterate the units of the section, one per step.
    pub fn units(&self) -> Units<'_, 'a> {
        Units {
            parser: self,
            offset: 0,
            done: false,
        }
    }

    /// Parse all compilation units in the .debug_info section.
    pub fn parse_all(&self) -> Result<Vec<CompilationUnit>> {
        self.units().collect()
    }

    /// Read and validate the header of the unit starting at `offset`.
    pub fn parse_header(&self, offset: u64) -> Result<CompilationUnitHeader> {
        let mut reader = Reader::new(self.debug_info, self.endianness);
        reader.seek(offset);

        let (unit_length, format) = reader.initial_length()?;
        let after_length = reader.position();
        let remaining = reader.remaining();
        if unit_length > remaining {
            return Err(DwarfError::InvalidUnit {
                offset,
                length: unit_length,
                remaining,
            });
        }
        let next_offset = after_length + unit_length;

        // The rest of the header must fit inside the declared length
        let mut reader = reader.limit(after_length, next_offset)?;
        let version = reader.u16()?;
        let debug_abbrev_offset = reader.offset(format)?;
        let address_size = reader.u8()?;

        if !SUPPORTED_VERSIONS.contains(&version) {
            return Err(DwarfError::UnsupportedVersion { offset, version });
        }
        if !matches!(address_size, 1 | 2 | 4 | 8) {
            return Err(DwarfError::UnsupportedWidth {
                offset,
                width: usize::from(address_size),
            });
        }

        Ok(CompilationUnitHeader {
            offset,
            unit_length,
            format,
            version,
            debug_abbrev_offset,
            address_size,
            entries_offset: reader.position(),
            next_offset,
        })
    }

    /// Parse a single compilation unit at the given offset.
    pub fn parse_compilation_unit(&self, offset: u64) -> Result<CompilationUnit> {
        let header = self.parse_header(offset)?;

        tracing::debug!(
            offset,
            length = header.unit_length,
            version = header.version,
            format = ?header.format,
            abbrev_offset = header.debug_abbrev_offset,
            "compilation unit"
        );

        let abbrevs = AbbreviationTable::parse(
            self.debug_abbrev,
            header.debug_abbrev_offset,
            self.endianness,
        )?;

        let dies = DieParser::new(
            self.debug_info,
            self.endianness,
            &abbrevs,
            header.encoding(),
            header.entries_offset,
            header.next_offset,
        )?
        .parse_tree()?;

        Ok(CompilationUnit {
            header,
            abbrevs,
            dies,
        })
    }
}

/// Iterator over the compilation units of a section.
///
/// Yields `Err` at most once; iteration ends after the first failure.
pub struct Units<'p, 'a> {
    parser: &'p DebugInfoParser<'a>,
    offset: u64,
    done: bool,
}

impl Units<'_, '_> {
    /// Offset of the next unit to be parsed.
    pub fn offset(&self) -> u64 {
        self.offset
    }
}

impl Iterator for Units<'_, '_> {
    type Item = Result<CompilationUnit>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.offset >= self.parser.debug_info.len() as u64 {
            return None;
        }

        match self.parser.parse_compilation_unit(self.offset) {
            Ok(unit) => {
                self.offset = unit.next_offset();
                Some(Ok(unit))
            }
            Err(err) => {
                tracing::debug!(offset = self.offset, error = %err, "stopping unit scan");
                self.done = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for Units<'_, '_> {}
