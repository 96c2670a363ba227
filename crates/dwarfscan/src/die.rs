//! DWARF Debug Information Entry (DIE) parsing.
//!
//! DIEs are the fundamental units of DWARF information. Each DIE describes
//! a programming language entity (function, variable, type, etc.).
//!
//! The DIEs of one compilation unit live in a [`DieTree`] arena. Parent,
//! first-child and next-sibling links are [`DieId`] indices into that arena,
//! and a hash index maps each DIE's section offset back to its id.

use std::collections::HashMap;

use crate::abbrev::AbbreviationTable;
use crate::codec::{Encoding, Endianness, Reader};
use crate::error::{try_push, DwarfError, Result};
use crate::types::{DwAt, DwForm, DwTag};

/// An attribute value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttributeValue {
    /// An address value.
    Address(u64),
    /// A block of bytes.
    Block(Vec<u8>),
    /// Unsigned constant.
    Unsigned(u64),
    /// Signed constant.
    Signed(i64),
    /// An inline string value.
    String(String),
    /// An offset into .debug_str.
    StringOffset(u64),
    /// A flag (boolean).
    Flag(bool),
    /// A reference to another DIE (offset from start of compilation unit).
    Reference(u64),
    /// A reference to another DIE (offset from start of .debug_info).
    RefAddr(u64),
    /// An offset into another section.
    SecOffset(u64),
    /// An encoded DWARF expression, kept opaque.
    ExprLoc(Vec<u8>),
    /// An 8-byte type signature.
    RefSig8(u64),
}

impl AttributeValue {
    /// The value as an unsigned integer, for the constant-like variants.
    pub fn as_u64(&self) -> Option<u64> {
        match *self {
            AttributeValue::Address(v)
            | AttributeValue::Unsigned(v)
            | AttributeValue::SecOffset(v) => Some(v),
            AttributeValue::Signed(v) => u64::try_from(v).ok(),
            _ => None,
        }
    }
}

/// A single attribute of a DIE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attribute {
    /// The attribute name.
    pub name: DwAt,
    /// The form the value was encoded with, after resolving DW_FORM_indirect.
    pub form: DwForm,
    /// The attribute value.
    pub value: AttributeValue,
}

/// Index of a DIE within its unit's [`DieTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct DieId(usize);

impl DieId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// A Debug Information Entry.
#[derive(Debug, Clone)]
pub struct Die {
    /// Offset of this DIE from the start of .debug_info.
    pub offset: u64,
    /// The abbreviation code this DIE was decoded with.
    pub abbrev_code: u64,
    /// The tag indicating what this DIE represents.
    pub tag: DwTag,
    /// Whether the abbreviation declares children.
    pub has_children: bool,
    /// The attributes of this DIE.
    pub attributes: Vec<Attribute>,
    /// Nesting depth; top-level DIEs of a unit are at depth 0.
    pub depth: usize,
    parent: Option<DieId>,
    first_child: Option<DieId>,
    next_sibling: Option<DieId>,
}

impl Die {
    /// Get an attribute by name.
    pub fn attr(&self, name: DwAt) -> Option<&AttributeValue> {
        self.attributes
            .iter()
            .find(|a| a.name == name)
            .map(|a| &a.value)
    }

    /// Get the name attribute as a string.
    pub fn name(&self) -> Option<&str> {
        match self.attr(DwAt::Name)? {
            AttributeValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Get the low PC (start address) of this DIE.
    pub fn low_pc(&self) -> Option<u64> {
        match self.attr(DwAt::LowPc)? {
            AttributeValue::Address(addr) => Some(*addr),
            AttributeValue::Unsigned(val) => Some(*val),
            _ => None,
        }
    }

    /// Get the high PC of this DIE.
    ///
    /// Address-class values are returned as-is; constant-class values are
    /// an offset from the low PC and are converted to an address.
    pub fn high_pc(&self) -> Option<u64> {
        match self.attr(DwAt::HighPc)? {
            AttributeValue::Address(addr) => Some(*addr),
            AttributeValue::Unsigned(size) => self.low_pc()?.checked_add(*size),
            _ => None,
        }
    }

    /// Get the declaration file index.
    pub fn decl_file(&self) -> Option<u64> {
        self.attr(DwAt::DeclFile)?.as_u64()
    }

    /// Get the declaration line number.
    pub fn decl_line(&self) -> Option<u64> {
        self.attr(DwAt::DeclLine)?.as_u64()
    }

    /// Get the raw type reference.
    pub fn type_ref(&self) -> Option<&AttributeValue> {
        let value = self.attr(DwAt::Type)?;
        matches!(value, AttributeValue::Reference(_) | AttributeValue::RefAddr(_)).then_some(value)
    }

    pub fn parent(&self) -> Option<DieId> {
        self.parent
    }

    pub fn first_child(&self) -> Option<DieId> {
        self.first_child
    }

    pub fn next_sibling(&self) -> Option<DieId> {
        self.next_sibling
    }
}

/// The DIEs of one compilation unit.
#[derive(Debug, Default, Clone)]
pub struct DieTree {
    dies: Vec<Die>,
    by_offset: HashMap<u64, DieId>,
    first_root: Option<DieId>,
}

impl DieTree {
    pub fn get(&self, id: DieId) -> Option<&Die> {
        self.dies.get(id.0)
    }

    /// Find a DIE by its .debug_info offset.
    pub fn by_offset(&self, offset: u64) -> Option<DieId> {
        self.by_offset.get(&offset).copied()
    }

    /// Find a DIE by offset and return it directly.
    pub fn die_at(&self, offset: u64) -> Option<&Die> {
        self.by_offset(offset).and_then(|id| self.get(id))
    }

    pub fn len(&self) -> usize {
        self.dies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dies.is_empty()
    }

    /// All DIEs in the order they appear in the section.
    pub fn iter(&self) -> impl Iterator<Item = (DieId, &Die)> {
        self.dies.iter().enumerate().map(|(i, die)| (DieId(i), die))
    }

    /// The first top-level DIE, normally the DW_TAG_compile_unit entry.
    pub fn root(&self) -> Option<&Die> {
        self.first_root.and_then(|id| self.get(id))
    }

    /// Top-level DIEs of the unit.
    pub fn roots(&self) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: self.first_root,
        }
    }

    /// Direct children of `id`.
    pub fn children(&self, id: DieId) -> Siblings<'_> {
        Siblings {
            tree: self,
            next: self.get(id).and_then(|die| die.first_child),
        }
    }

    pub fn parent(&self, id: DieId) -> Option<DieId> {
        self.get(id)?.parent
    }

    fn push(&mut self, die: Die) -> Result<DieId> {
        let id = DieId(self.dies.len());
        let offset = die.offset;
        try_push(&mut self.dies, die, offset, "DIE arena")?;
        self.by_offset
            .try_reserve(1)
            .map_err(DwarfError::out_of_memory(offset, "DIE offset index"))?;
        let previous = self.by_offset.insert(offset, id);
        debug_assert!(previous.is_none(), "two DIEs at offset {offset:#x}");
        Ok(id)
    }
}

/// Iterator over a chain of sibling DIEs.
pub struct Siblings<'a> {
    tree: &'a DieTree,
    next: Option<DieId>,
}

impl<'a> Iterator for Siblings<'a> {
    type Item = (DieId, &'a Die);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.next?;
        let die = self.tree.get(id)?;
        self.next = die.next_sibling;
        Some((id, die))
    }
}

/// One open level of the tree while parsing.
struct Level {
    parent: Option<DieId>,
    last_child: Option<DieId>,
}

/// Builds the DIE tree of one compilation unit.
pub struct DieParser<'a> {
    reader: Reader<'a>,
    abbrev_table: &'a AbbreviationTable,
    encoding: Encoding,
}

impl<'a> DieParser<'a> {
    /// Create a parser over `start..end` of the `.debug_info` section.
    pub fn new(
        debug_info: &'a [u8],
        endianness: Endianness,
        abbrev_table: &'a AbbreviationTable,
        encoding: Encoding,
        start: u64,
        end: u64,
    ) -> Result<Self> {
        let reader = Reader::new(debug_info, endianness).limit(start, end)?;
        Ok(Self {
            reader,
            abbrev_table,
            encoding,
        })
    }

    /// Parse every entry up to the end of the unit.
    pub fn parse_tree(mut self) -> Result<DieTree> {
        let mut tree = DieTree::default();
        let mut levels = vec![Level {
            parent: None,
            last_child: None,
        }];

        let abbrev_table = self.abbrev_table;

        while !self.reader.is_empty() {
            let die_offset = self.reader.position();
            let code = self.reader.uleb128()?;

            // Null entry closes the current sibling list
            if code == 0 {
                if levels.len() > 1 {
                    levels.pop();
                }
                continue;
            }

            let abbrev = abbrev_table
                .get(code)
                .ok_or_else(|| DwarfError::malformed_die(die_offset, "unknown abbreviation code"))?;

            let mut attributes = Vec::new();
            attributes
                .try_reserve(abbrev.attributes.len())
                .map_err(DwarfError::out_of_memory(die_offset, "attribute list"))?;
            for spec in &abbrev.attributes {
                let (form, value) = self.parse_attribute_value(spec.form)?;
                attributes.push(Attribute {
                    name: spec.name,
                    form,
                    value,
                });
            }

            let depth = levels.len() - 1;
            let level = levels
                .last_mut()
                .ok_or_else(|| DwarfError::malformed_die(die_offset, "empty parent stack"))?;

            let id = tree.push(Die {
                offset: die_offset,
                abbrev_code: code,
                tag: abbrev.tag,
                has_children: abbrev.has_children,
                attributes,
                depth,
                parent: level.parent,
                first_child: None,
                next_sibling: None,
            })?;

            match (level.last_child, level.parent) {
                (Some(prev), _) => tree.dies[prev.0].next_sibling = Some(id),
                (None, Some(parent)) => tree.dies[parent.0].first_child = Some(id),
                (None, None) => tree.first_root = Some(id),
            }
            level.last_child = Some(id);

            tracing::trace!(offset = die_offset, code, tag = %abbrev.tag, depth, "DIE");

            if abbrev.has_children {
                levels.push(Level {
                    parent: Some(id),
                    last_child: None,
                });
            }
        }

        if levels.len() > 1 {
            return Err(DwarfError::malformed_die(
                self.reader.position(),
                "unit ended inside an unterminated children list",
            ));
        }

        Ok(tree)
    }

    /// Decode one attribute value, resolving DW_FORM_indirect first.
    fn parse_attribute_value(&mut self, form: DwForm) -> Result<(DwForm, AttributeValue)> {
        let mut form = form;
        while form == DwForm::Indirect {
            let form_offset = self.reader.position();
            form = u8::try_from(self.reader.uleb128()?)
                .map(DwForm::from)
                .ok()
                .filter(|form| form.is_known())
                .ok_or_else(|| DwarfError::malformed_die(form_offset, "unknown indirect form"))?;
        }

        let format = self.encoding.format;
        let reader = &mut self.reader;
        let value = match form {
            DwForm::Addr => AttributeValue::Address(reader.address(self.encoding.address_size)?),
            DwForm::Block1 => {
                let len = u64::from(reader.u8()?);
                AttributeValue::Block(reader.block(len)?.to_vec())
            }
            DwForm::Block2 => {
                let len = u64::from(reader.u16()?);
                AttributeValue::Block(reader.block(len)?.to_vec())
            }
            DwForm::Block4 => {
                let len = u64::from(reader.u32()?);
                AttributeValue::Block(reader.block(len)?.to_vec())
            }
            DwForm::Block => {
                let len = reader.uleb128()?;
                AttributeValue::Block(reader.block(len)?.to_vec())
            }
            DwForm::Data1 => AttributeValue::Unsigned(u64::from(reader.u8()?)),
            DwForm::Data2 => AttributeValue::Unsigned(u64::from(reader.u16()?)),
            DwForm::Data4 => AttributeValue::Unsigned(u64::from(reader.u32()?)),
            DwForm::Data8 => AttributeValue::Unsigned(reader.u64()?),
            DwForm::String => {
                AttributeValue::String(String::from_utf8_lossy(reader.cstring()?).into_owned())
            }
            DwForm::Strp => AttributeValue::StringOffset(reader.offset(format)?),
            DwForm::Udata => AttributeValue::Unsigned(reader.uleb128()?),
            DwForm::Sdata => AttributeValue::Signed(reader.sleb128()?),
            DwForm::Flag => AttributeValue::Flag(reader.u8()? != 0),
            DwForm::FlagPresent => AttributeValue::Flag(true),
            DwForm::Ref1 => AttributeValue::Reference(u64::from(reader.u8()?)),
            DwForm::Ref2 => AttributeValue::Reference(u64::from(reader.u16()?)),
            DwForm::Ref4 => AttributeValue::Reference(u64::from(reader.u32()?)),
            DwForm::Ref8 => AttributeValue::Reference(reader.u64()?),
            DwForm::RefUdata => AttributeValue::Reference(reader.uleb128()?),
            DwForm::RefAddr => {
                // Address-sized in DWARF 2, offset-sized from DWARF 3 on
                let offset = if self.encoding.version <= 2 {
                    reader.address(self.encoding.address_size)?
                } else {
                    reader.offset(format)?
                };
                AttributeValue::RefAddr(offset)
            }
            DwForm::RefSig8 => AttributeValue::RefSig8(reader.u64()?),
            DwForm::SecOffset => AttributeValue::SecOffset(reader.offset(format)?),
            DwForm::Exprloc => {
                let len = reader.uleb128()?;
                AttributeValue::ExprLoc(reader.block(len)?.to_vec())
            }
            DwForm::Indirect | DwForm::Unknown(_) => {
                return Err(DwarfError::malformed_die(reader.position(), "unknown DWARF form"))
            }
        };

        Ok((form, value))
    }
}
