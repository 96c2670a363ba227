//! DWARF abbreviation table parsing (.debug_abbrev).
//!
//! The abbreviation table defines the structure of DIEs (Debug Information Entries).
//! Each abbreviation specifies a tag, a has-children flag and a list of
//! attribute specifications. A table ends at the first zero code.

use std::collections::HashMap;

use crate::codec::{Endianness, Reader};
use crate::error::{try_push, DwarfError, Result};
use crate::types::{DwAt, DwForm, DwTag};

/// An attribute specification in an abbreviation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec {
    /// The attribute name (DW_AT_*).
    pub name: DwAt,
    /// The attribute form (DW_FORM_*).
    pub form: DwForm,
}

/// An abbreviation declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation {
    /// The abbreviation code, never zero.
    pub code: u64,
    /// The tag for this abbreviation (DW_TAG_*).
    pub tag: DwTag,
    /// Whether DIEs with this abbreviation have children.
    pub has_children: bool,
    /// The attribute specifications, in declaration order.
    pub attributes: Vec<AttributeSpec>,
}

/// A table of abbreviations, keyed by code.
#[derive(Debug, Default, Clone)]
pub struct AbbreviationTable {
    /// Offset of the table in .debug_abbrev.
    pub offset: u64,
    /// Map from abbreviation code to abbreviation.
    entries: HashMap<u64, Abbreviation>,
    /// Codes in the order they were declared.
    order: Vec<u64>,
}

impl AbbreviationTable {
    /// Parse the abbreviation table starting at `offset` in `.debug_abbrev`.
    pub fn parse(debug_abbrev: &[u8], offset: u64, endianness: Endianness) -> Result<Self> {
        let mut reader = Reader::new(debug_abbrev, endianness);
        reader.seek(offset);
        Self::parse_from(&mut reader)
    }

    /// Parse one table from the reader's position, leaving the reader just
    /// past the terminating zero code.
    pub fn parse_from(reader: &mut Reader<'_>) -> Result<Self> {
        let mut table = AbbreviationTable {
            offset: reader.position(),
            ..Default::default()
        };

        loop {
            let code_offset = reader.position();
            let code = reader.uleb128()?;

            // Code 0 marks end of abbreviation table
            if code == 0 {
                break;
            }

            let tag_offset = reader.position();
            let tag_value = reader.uleb128()?;
            let tag = u16::try_from(tag_value)
                .map(DwTag::from)
                .map_err(|_| DwarfError::malformed_abbrev(tag_offset, "tag out of range"))?;

            let has_children = reader.u8()? != 0;

            let mut attributes = Vec::new();
            loop {
                let spec_offset = reader.position();
                let name_value = reader.uleb128()?;
                let form_value = reader.uleb128()?;

                // (0, 0) marks end of attribute list
                if name_value == 0 && form_value == 0 {
                    break;
                }
                if name_value == 0 {
                    return Err(DwarfError::malformed_abbrev(spec_offset, "zero attribute name"));
                }

                let name = u16::try_from(name_value)
                    .map(DwAt::from)
                    .map_err(|_| DwarfError::malformed_abbrev(spec_offset, "attribute out of range"))?;
                let form = u8::try_from(form_value)
                    .map(DwForm::from)
                    .ok()
                    .filter(|form| form.is_known())
                    .ok_or_else(|| DwarfError::malformed_abbrev(spec_offset, "unknown form"))?;

                try_push(&mut attributes, AttributeSpec { name, form }, spec_offset, "attribute list")?;
            }

            if table.entries.contains_key(&code) {
                return Err(DwarfError::malformed_abbrev(code_offset, "duplicate abbreviation code"));
            }
            table
                .entries
                .try_reserve(1)
                .map_err(DwarfError::out_of_memory(code_offset, "abbreviation table"))?;
            table.entries.insert(
                code,
                Abbreviation {
                    code,
                    tag,
                    has_children,
                    attributes,
                },
            );
            try_push(&mut table.order, code, code_offset, "abbreviation table")?;
        }

        tracing::trace!(
            offset = table.offset,
            count = table.len(),
            "parsed abbreviation table"
        );
        Ok(table)
    }

    /// Get an abbreviation by code.
    pub fn get(&self, code: u64) -> Option<&Abbreviation> {
        self.entries.get(&code)
    }

    /// Iterate abbreviations in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = &Abbreviation> {
        self.order.iter().filter_map(|code| self.entries.get(code))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn parse(data: &[u8]) -> Result<AbbreviationTable> {
        AbbreviationTable::parse(data, 0, Endianness::Little)
    }

    #[test]
    fn test_parse_empty_table() {
        // Just a terminator
        let table = parse(&[0x00]).unwrap();
        assert!(table.is_empty());
    }

    #[test]
    fn test_parse_simple_abbrev() {
        let data = [
            0x01, // code = 1
            0x11, // tag = DW_TAG_compile_unit
            0x01, // has_children = true
            0x03, // DW_AT_name
            0x08, // DW_FORM_string
            0x00, 0x00, // end attributes
            0x00, // end table
        ];

        let table = parse(&data).unwrap();
        assert_eq!(table.len(), 1);

        let abbrev = table.get(1).unwrap();
        assert_eq!(abbrev.code, 1);
        assert_eq!(abbrev.tag, DwTag::CompileUnit);
        assert!(abbrev.has_children);
        assert_eq!(
            abbrev.attributes,
            [AttributeSpec {
                name: DwAt::Name,
                form: DwForm::String
            }]
        );
    }

    #[test]
    fn test_sparse_codes_and_order() {
        let data = [
            0x07, 0x2E, 0x00, 0x03, 0x08, 0x00, 0x00, // code 7: subprogram
            0x80, 0x01, 0x34, 0x00, 0x49, 0x13, 0x00, 0x00, // code 128: variable
            0x02, 0x24, 0x00, 0x00, 0x00, // code 2: base_type, no attributes
            0x00,
        ];

        let table = parse(&data).unwrap();
        let codes: Vec<u64> = table.iter().map(|a| a.code).collect();
        assert_eq!(codes, [7, 128, 2]);
        assert_eq!(table.get(128).unwrap().tag, DwTag::Variable);
        assert_eq!(table.get(128).unwrap().attributes[0].form, DwForm::Ref4);
        assert!(table.get(2).unwrap().attributes.is_empty());
        assert!(table.get(3).is_none());
    }

    #[test]
    fn test_parse_at_offset() {
        let data = [0x00, 0x00, 0x01, 0x24, 0x00, 0x00, 0x00, 0x00];
        let table = AbbreviationTable::parse(&data, 2, Endianness::Little).unwrap();
        assert_eq!(table.offset, 2);
        assert_eq!(table.get(1).unwrap().tag, DwTag::BaseType);
    }

    #[test]
    fn test_unknown_form_rejected() {
        let data = [0x01, 0x11, 0x00, 0x03, 0x7F, 0x00, 0x00, 0x00];
        let err = parse(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedAbbreviation);
        assert_eq!(err.offset(), 3);
    }

    #[test]
    fn test_nonzero_children_flag() {
        let data = [0x01, 0x11, 0x05, 0x00, 0x00, 0x02, 0x2E, 0x00, 0x00, 0x00, 0x00];
        let table = parse(&data).unwrap();
        assert!(table.get(1).unwrap().has_children);
        assert!(!table.get(2).unwrap().has_children);
    }

    #[test]
    fn test_duplicate_code() {
        let data = [0x01, 0x24, 0x00, 0x00, 0x00, 0x01, 0x24, 0x00, 0x00, 0x00, 0x00];
        let err = parse(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::MalformedAbbreviation);
        assert_eq!(err.offset(), 5);
    }

    #[test]
    fn test_truncated_table() {
        let data = [0x01, 0x11, 0x01, 0x03];
        let err = parse(&data).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer);
    }

    #[test]
    fn test_offset_past_end() {
        let err = AbbreviationTable::parse(&[0x00], 10, Endianness::Little).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::TruncatedBuffer);
    }
}
