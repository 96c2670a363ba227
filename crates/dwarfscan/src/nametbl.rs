//! Name-pair lookup tables (.debug_pubnames, .debug_pubtypes).
//!
//! Each table in these sections covers one compilation unit and lists
//! `(offset, name)` pairs, where the offset is relative to the start of that
//! unit. The section is decoded after .debug_info so that every table can be
//! tied back to its unit.
//!
//! # Section Format
//!
//! ```text
//! Header:
//!   unit_length: 4 bytes (or 12 for 64-bit DWARF)
//!   version: 2 bytes
//!   debug_info_offset: 4/8 bytes
//!   debug_info_length: 4/8 bytes
//!
//! Body:
//!   offset: 4/8 bytes, name: null-terminated string
//!   ...
//!   0: 4/8 bytes
//! ```

use std::collections::HashMap;

use crate::codec::{Endianness, Format, Reader};
use crate::error::{try_push, DwarfError, Result};
use crate::info::CompilationUnit;

/// One name and the unit-relative offset of the DIE it names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamePair {
    /// Offset of the DIE from the start of its compilation unit.
    pub offset: u64,
    pub name: String,
    /// Index of the owning table in [`NameSection::tables`].
    pub table: usize,
}

/// The pairs for one compilation unit.
#[derive(Debug, Clone)]
pub struct NameTable {
    /// Offset of this table in the name section.
    pub offset: u64,
    pub length: u64,
    pub format: Format,
    pub version: u16,
    /// Offset of the described unit in .debug_info.
    pub cu_offset: u64,
    /// Size of the described unit's contribution to .debug_info.
    pub cu_length: u64,
    /// Index of the matching unit in the unit list, if one was found.
    pub unit: Option<usize>,
    pairs: Vec<NamePair>,
}

impl NameTable {
    pub fn pairs(&self) -> &[NamePair] {
        &self.pairs
    }

    /// Section offset in .debug_info of the DIE a pair names.
    pub fn die_offset(&self, pair: &NamePair) -> Option<u64> {
        self.cu_offset.checked_add(pair.offset)
    }
}

/// Position of a pair inside its table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct PairRef {
    table: usize,
    pair: usize,
}

/// All name tables of a section plus a flattened, globally indexed view.
#[derive(Debug, Clone, Default)]
pub struct NameSection {
    tables: Vec<NameTable>,
    flat: Vec<PairRef>,
    by_name: HashMap<String, Vec<usize>>,
}

impl NameSection {
    /// Parse a name section and link its tables to `units`.
    ///
    /// A table whose unit offset matches none of `units` is still kept,
    /// with [`NameTable::unit`] left empty.
    pub fn parse(data: &[u8], endianness: Endianness, units: &[CompilationUnit]) -> Result<Self> {
        let mut reader = Reader::new(data, endianness);
        let mut section = NameSection::default();
        let mut pair_count = 0usize;

        while !reader.is_empty() {
            let table_offset = reader.position();
            let (length, format) = reader.initial_length()?;
            let after_length = reader.position();
            let remaining = reader.remaining();
            if length > remaining {
                return Err(DwarfError::InvalidUnit {
                    offset: table_offset,
                    length,
                    remaining,
                });
            }
            let end = after_length + length;

            let mut body = reader.limit(after_length, end)?;
            let version = body.u16()?;
            let cu_offset = body.offset(format)?;
            let cu_length = body.offset(format)?;

            let unit = units.iter().position(|u| u.offset() == cu_offset);
            if unit.is_none() {
                tracing::warn!(
                    table_offset,
                    cu_offset,
                    "name table refers to no known compilation unit"
                );
            }

            let table_index = section.tables.len();
            let mut pairs = Vec::new();
            loop {
                if body.remaining() < format.offset_size() as u64 {
                    tracing::warn!(table_offset, "name table ends without a terminator");
                    break;
                }
                let pair_offset = body.position();
                let offset = body.offset(format)?;
                if offset == 0 {
                    break;
                }
                let name = String::from_utf8_lossy(body.cstring()?).into_owned();
                try_push(
                    &mut pairs,
                    NamePair {
                        offset,
                        name,
                        table: table_index,
                    },
                    pair_offset,
                    "name pair list",
                )?;
                pair_count += 1;
            }

            tracing::debug!(
                table_offset,
                length,
                version,
                cu_offset,
                pairs = pairs.len(),
                "name table"
            );

            try_push(
                &mut section.tables,
                NameTable {
                    offset: table_offset,
                    length,
                    format,
                    version,
                    cu_offset,
                    cu_length,
                    unit,
                    pairs,
                },
                table_offset,
                "name table list",
            )?;

            // Skip any padding after the terminator
            reader.seek(end);
        }

        section.build_index(data.len() as u64)?;
        debug_assert_eq!(section.flat.len(), pair_count);
        Ok(section)
    }

    fn build_index(&mut self, end: u64) -> Result<()> {
        let total: usize = self.tables.iter().map(|t| t.pairs.len()).sum();
        self.flat
            .try_reserve_exact(total)
            .map_err(DwarfError::out_of_memory(end, "flattened name array"))?;

        for (table, t) in self.tables.iter().enumerate() {
            for (pair, p) in t.pairs.iter().enumerate() {
                let index = self.flat.len();
                self.flat.push(PairRef { table, pair });
                self.by_name.entry(p.name.clone()).or_default().push(index);
            }
        }
        Ok(())
    }

    pub fn tables(&self) -> &[NameTable] {
        &self.tables
    }

    /// Total number of pairs across all tables.
    pub fn len(&self) -> usize {
        self.flat.len()
    }

    pub fn is_empty(&self) -> bool {
        self.flat.is_empty()
    }

    /// The pair at `index` of the flattened array.
    pub fn get(&self, index: usize) -> Option<&NamePair> {
        let r = self.flat.get(index)?;
        self.tables.get(r.table)?.pairs.get(r.pair)
    }

    /// All pairs, in table-then-pair order.
    pub fn iter(&self) -> impl Iterator<Item = &NamePair> {
        self.tables.iter().flat_map(|t| t.pairs.iter())
    }

    /// The table owning `pair`.
    pub fn table_of(&self, pair: &NamePair) -> Option<&NameTable> {
        self.tables.get(pair.table)
    }

    /// Flattened indices of every pair with this exact name.
    pub fn find(&self, name: &str) -> &[usize] {
        self.by_name.get(name).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Section offset in .debug_info of the DIE a pair names.
    pub fn die_offset(&self, pair: &NamePair) -> Option<u64> {
        self.table_of(pair)?.die_offset(pair)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use crate::info::DebugInfoParser;
    use crate::test_util::{SectionBuilder, SIMPLE_ABBREVS};

    fn two_units() -> (Vec<u8>, Vec<CompilationUnit>) {
        let mut info = SectionBuilder::new(Endianness::Little);
        info.unit32(2, 0, 8, |u| u.compile_unit("a.c").subprogram("main").end_children());
        info.unit32(2, 0, 8, |u| {
            u.compile_unit("b.c")
                .subprogram("helper")
                .subprogram("main")
                .end_children()
        });
        let info = info.finish();
        let units = DebugInfoParser::new(&info, SIMPLE_ABBREVS, Endianness::Little)
            .parse_all()
            .unwrap();
        (info, units)
    }

    #[test]
    fn test_flattening_order() {
        let (_, units) = two_units();
        let second = units[1].offset();

        let mut names = SectionBuilder::new(Endianness::Little);
        names.name_table(Format::Dwarf32, 2, 0, second, &[(0x0B, "a1"), (0x20, "a2")]);
        names.name_table(
            Format::Dwarf32,
            2,
            second,
            0x40,
            &[(0x0B, "b1"), (0x12, "b2"), (0x19, "b3")],
        );
        let section = NameSection::parse(&names.finish(), Endianness::Little, &units).unwrap();

        assert_eq!(section.tables().len(), 2);
        assert_eq!(section.tables()[0].pairs().len(), 2);
        assert_eq!(section.tables()[1].pairs().len(), 3);
        assert_eq!(section.len(), 5);

        let flat: Vec<&str> = (0..section.len())
            .map(|i| section.get(i).unwrap().name.as_str())
            .collect();
        assert_eq!(flat, ["a1", "a2", "b1", "b2", "b3"]);
        let iterated: Vec<&str> = section.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(iterated, flat);
        assert!(section.get(5).is_none());

        assert_eq!(section.tables()[0].unit, Some(0));
        assert_eq!(section.tables()[1].unit, Some(1));
        let b2 = section.get(3).unwrap();
        assert_eq!(section.table_of(b2).unwrap().cu_offset, second);
        assert_eq!(section.die_offset(b2), Some(second + 0x12));
    }

    #[test]
    fn test_pairs_resolve_to_dies() {
        let (_, units) = two_units();
        let unit = &units[1];
        let helper = unit.subprograms().find(|d| d.name() == Some("helper")).unwrap();

        let mut names = SectionBuilder::new(Endianness::Little);
        names.name_table(
            Format::Dwarf32,
            2,
            unit.offset(),
            unit.header.unit_length,
            &[(helper.offset - unit.offset(), "helper")],
        );
        let section = NameSection::parse(&names.finish(), Endianness::Little, &units).unwrap();

        let index = section.find("helper")[0];
        let pair = section.get(index).unwrap();
        let die_offset = section.die_offset(pair).unwrap();
        assert_eq!(unit.dies.die_at(die_offset).unwrap().name(), Some("helper"));
        assert!(section.find("missing").is_empty());
    }

    #[test]
    fn test_unresolved_unit_is_kept() {
        let (_, units) = two_units();
        let mut names = SectionBuilder::new(Endianness::Little);
        names.name_table(Format::Dwarf32, 2, 0x9999, 0x10, &[(0x0B, "orphan")]);
        let section = NameSection::parse(&names.finish(), Endianness::Little, &units).unwrap();

        assert_eq!(section.tables()[0].unit, None);
        assert_eq!(section.len(), 1);
        assert_eq!(section.get(0).unwrap().name, "orphan");
    }

    #[test]
    fn test_64bit_table() {
        let (_, units) = two_units();
        let mut names = SectionBuilder::new(Endianness::Little);
        names.name_table(Format::Dwarf64, 2, 0, 0x30, &[(0x0B, "wide")]);
        let section = NameSection::parse(&names.finish(), Endianness::Little, &units).unwrap();

        let table = &section.tables()[0];
        assert_eq!(table.format, Format::Dwarf64);
        assert_eq!(table.cu_length, 0x30);
        assert_eq!(table.unit, Some(0));
        assert_eq!(section.get(0).unwrap().name, "wide");
    }

    #[test]
    fn test_duplicate_names_indexed() {
        let (_, units) = two_units();
        let mut names = SectionBuilder::new(Endianness::Little);
        names.name_table(Format::Dwarf32, 2, 0, 0x20, &[(0x0B, "main")]);
        names.name_table(Format::Dwarf32, 2, units[1].offset(), 0x20, &[(0x12, "main")]);
        let section = NameSection::parse(&names.finish(), Endianness::Little, &units).unwrap();
        assert_eq!(section.find("main"), &[0, 1]);
    }

    #[test]
    fn test_table_length_past_end() {
        let data = [0x40, 0x00, 0x00, 0x00, 0x02, 0x00];
        let err = NameSection::parse(&data, Endianness::Little, &[]).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidUnit);
        assert_eq!(err.offset(), 0);
    }

    #[test]
    fn test_padding_after_terminator() {
        let mut names = SectionBuilder::new(Endianness::Little);
        names.raw(&[
            0x16, 0x00, 0x00, 0x00, // length = 22
            0x02, 0x00, // version
            0x00, 0x00, 0x00, 0x00, // cu_offset
            0x10, 0x00, 0x00, 0x00, // cu_length
            0x0B, 0x00, 0x00, 0x00, b'x', 0x00, // pair
            0x00, 0x00, 0x00, 0x00, // terminator
            0x00, 0x00, // padding
        ]);
        names.name_table(Format::Dwarf32, 2, 0, 0x10, &[(0x0B, "y")]);
        let section = NameSection::parse(&names.finish(), Endianness::Little, &[]).unwrap();
        let all: Vec<&str> = section.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(all, ["x", "y"]);
        assert_eq!(section.tables()[1].offset, 26);
    }

    #[test]
    fn test_missing_terminator_tolerated() {
        let data = [
            0x0F, 0x00, 0x00, 0x00, // length = 15
            0x02, 0x00, //
            0x00, 0x00, 0x00, 0x00, //
            0x10, 0x00, 0x00, 0x00, //
            0x0B, 0x00, 0x00, 0x00, b'z', //
        ];
        let section = NameSection::parse(&data, Endianness::Little, &[]).unwrap();
        assert_eq!(section.get(0).unwrap().name, "z");
    }

    #[test]
    fn test_partial_terminator_tolerated() {
        for leftover in 1..4usize {
            let mut data = vec![(16 + leftover) as u8, 0x00, 0x00, 0x00];
            data.extend_from_slice(&[
                0x02, 0x00, //
                0x00, 0x00, 0x00, 0x00, //
                0x10, 0x00, 0x00, 0x00, //
                0x0B, 0x00, 0x00, 0x00, b'p', 0x00, //
            ]);
            data.extend(std::iter::repeat(0).take(leftover));
            let section = NameSection::parse(&data, Endianness::Little, &[]).unwrap();
            assert_eq!(section.len(), 1);
            assert_eq!(section.get(0).unwrap().name, "p");
        }
    }

    #[test]
    fn test_empty_section() {
        let section = NameSection::parse(&[], Endianness::Little, &[]).unwrap();
        assert!(section.is_empty());
        assert!(section.tables().is_empty());
    }
}
