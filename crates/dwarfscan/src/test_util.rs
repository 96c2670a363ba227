//! Section builders shared by the unit tests.

use crate::codec::{encode_uleb128, write_fixed, Endianness, Format, DWARF64_ESCAPE};

/// Abbreviations matching the entries [`UnitBuilder`] emits.
pub const SIMPLE_ABBREVS: &[u8] = &[
    // 1: compile_unit, children: name string, language data2
    0x01, 0x11, 0x01, 0x03, 0x08, 0x13, 0x05, 0x00, 0x00,
    // 2: subprogram: name string, low_pc addr
    0x02, 0x2E, 0x00, 0x03, 0x08, 0x11, 0x01, 0x00, 0x00,
    // 3: base_type: name string, byte_size data1
    0x03, 0x24, 0x00, 0x03, 0x08, 0x0B, 0x0B, 0x00, 0x00,
    // 4: variable: name string, type ref4
    0x04, 0x34, 0x00, 0x03, 0x08, 0x49, 0x13, 0x00, 0x00,
    // 5: structure_type, children: name string
    0x05, 0x13, 0x01, 0x03, 0x08, 0x00, 0x00,
    0x00,
];

fn put(out: &mut Vec<u8>, value: u64, width: usize, endianness: Endianness) {
    let mut cursor = out.len() as u64;
    out.resize(out.len() + width, 0);
    write_fixed(out, &mut cursor, value, width, endianness).unwrap();
}

fn put_str(out: &mut Vec<u8>, s: &str) {
    out.extend_from_slice(s.as_bytes());
    out.push(0);
}

/// Assembles a section one unit or table at a time.
pub struct SectionBuilder {
    data: Vec<u8>,
    endianness: Endianness,
}

impl SectionBuilder {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            data: Vec::new(),
            endianness,
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.data.extend_from_slice(bytes);
        self
    }

    fn initial_length(&mut self, format: Format, length: u64) {
        match format {
            Format::Dwarf32 => put(&mut self.data, length, 4, self.endianness),
            Format::Dwarf64 => {
                put(&mut self.data, DWARF64_ESCAPE, 4, self.endianness);
                put(&mut self.data, length, 8, self.endianness);
            }
        }
    }

    fn unit<F>(&mut self, format: Format, version: u16, abbrev_offset: u64, address_size: u8, f: F) -> &mut Self
    where
        F: FnOnce(&mut UnitBuilder) -> &mut UnitBuilder,
    {
        let mut unit = UnitBuilder {
            body: Vec::new(),
            endianness: self.endianness,
            address_size,
        };
        put(&mut unit.body, u64::from(version), 2, self.endianness);
        put(&mut unit.body, abbrev_offset, format.offset_size(), self.endianness);
        unit.body.push(address_size);
        f(&mut unit);

        self.initial_length(format, unit.body.len() as u64);
        self.data.extend_from_slice(&unit.body);
        self
    }

    /// Append a 32-bit DWARF compilation unit.
    pub fn unit32<F>(&mut self, version: u16, abbrev_offset: u64, address_size: u8, f: F) -> &mut Self
    where
        F: FnOnce(&mut UnitBuilder) -> &mut UnitBuilder,
    {
        self.unit(Format::Dwarf32, version, abbrev_offset, address_size, f)
    }

    /// Append a 64-bit DWARF compilation unit.
    pub fn unit64<F>(&mut self, version: u16, abbrev_offset: u64, address_size: u8, f: F) -> &mut Self
    where
        F: FnOnce(&mut UnitBuilder) -> &mut UnitBuilder,
    {
        self.unit(Format::Dwarf64, version, abbrev_offset, address_size, f)
    }

    /// Append one name table in the .debug_pubnames layout.
    pub fn name_table(
        &mut self,
        format: Format,
        version: u16,
        cu_offset: u64,
        cu_length: u64,
        pairs: &[(u64, &str)],
    ) -> &mut Self {
        let width = format.offset_size();
        let mut body = Vec::new();
        put(&mut body, u64::from(version), 2, self.endianness);
        put(&mut body, cu_offset, width, self.endianness);
        put(&mut body, cu_length, width, self.endianness);
        for &(offset, name) in pairs {
            put(&mut body, offset, width, self.endianness);
            put_str(&mut body, name);
        }
        put(&mut body, 0, width, self.endianness);

        self.initial_length(format, body.len() as u64);
        self.data.extend_from_slice(&body);
        self
    }

    pub fn finish(&self) -> Vec<u8> {
        self.data.clone()
    }
}

/// Emits DIEs using the codes in [`SIMPLE_ABBREVS`].
pub struct UnitBuilder {
    body: Vec<u8>,
    endianness: Endianness,
    address_size: u8,
}

impl UnitBuilder {
    fn code(&mut self, code: u64) {
        encode_uleb128(code, &mut self.body);
    }

    /// Opens a compile_unit entry; close it with `end_children`.
    pub fn compile_unit(&mut self, name: &str) -> &mut Self {
        self.code(1);
        put_str(&mut self.body, name);
        put(&mut self.body, 0x0C, 2, self.endianness);
        self
    }

    pub fn subprogram(&mut self, name: &str) -> &mut Self {
        self.code(2);
        put_str(&mut self.body, name);
        put(&mut self.body, 0x1000, usize::from(self.address_size), self.endianness);
        self
    }

    pub fn base_type(&mut self, name: &str) -> &mut Self {
        self.code(3);
        put_str(&mut self.body, name);
        self.body.push(4);
        self
    }

    /// A variable whose DW_AT_type is the unit-relative offset `type_ref`.
    pub fn variable_ref(&mut self, name: &str, type_ref: u32) -> &mut Self {
        self.code(4);
        put_str(&mut self.body, name);
        put(&mut self.body, u64::from(type_ref), 4, self.endianness);
        self
    }

    /// Opens a structure_type entry; close it with `end_children`.
    pub fn structure(&mut self, name: &str) -> &mut Self {
        self.code(5);
        put_str(&mut self.body, name);
        self
    }

    /// Null entry closing the innermost open children list.
    pub fn end_children(&mut self) -> &mut Self {
        self.body.push(0);
        self
    }
}
