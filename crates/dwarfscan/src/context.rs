//! A decode session over one object's debug sections.

use crate::codec::Endianness;
use crate::die::Die;
use crate::error::{DwarfError, Result};
use crate::info::{CompilationUnit, DebugInfoParser};
use crate::nametbl::NameSection;

/// Holds the units and name tables decoded from one object.
///
/// Every read uses the same byte order. The first error of the most recent
/// load is kept until the next load.
#[derive(Debug)]
pub struct DebugContext {
    endianness: Endianness,
    units: Vec<CompilationUnit>,
    names: Option<NameSection>,
    last_error: Option<DwarfError>,
}

impl DebugContext {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            endianness,
            units: Vec::new(),
            names: None,
            last_error: None,
        }
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Decode every compilation unit of .debug_info.
    ///
    /// Replaces anything loaded before. Units decoded ahead of a failure are
    /// kept; the failing unit and everything after it are dropped and the
    /// error is also recorded in [`DebugContext::last_error`].
    pub fn load_info(&mut self, debug_info: &[u8], debug_abbrev: &[u8]) -> Result<usize> {
        self.units.clear();
        self.names = None;
        self.last_error = None;

        let parser = DebugInfoParser::new(debug_info, debug_abbrev, self.endianness);
        for unit in parser.units() {
            match unit {
                Ok(unit) => self.units.push(unit),
                Err(err) => {
                    tracing::warn!(
                        units = self.units.len(),
                        error = %err,
                        "debug info load stopped"
                    );
                    self.last_error = Some(err.clone());
                    return Err(err);
                }
            }
        }

        tracing::debug!(units = self.units.len(), "debug info loaded");
        Ok(self.units.len())
    }

    /// Decode a .debug_pubnames style section against the loaded units.
    ///
    /// Replaces any name section loaded before, even when this one fails.
    pub fn load_names(&mut self, section: &[u8]) -> Result<&NameSection> {
        self.names = None;
        match NameSection::parse(section, self.endianness, &self.units) {
            Ok(names) => Ok(self.names.insert(names)),
            Err(err) => {
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Units in section order.
    pub fn units(&self) -> &[CompilationUnit] {
        &self.units
    }

    pub fn names(&self) -> Option<&NameSection> {
        self.names.as_ref()
    }

    pub fn last_error(&self) -> Option<&DwarfError> {
        self.last_error.as_ref()
    }

    /// The unit whose header starts at `offset`.
    pub fn unit_at(&self, offset: u64) -> Option<&CompilationUnit> {
        let index = self
            .units
            .binary_search_by_key(&offset, CompilationUnit::offset)
            .ok()?;
        self.units.get(index)
    }

    /// The unit whose byte range covers `offset`.
    pub fn unit_containing(&self, offset: u64) -> Option<&CompilationUnit> {
        let index = self.units.partition_point(|u| u.offset() <= offset);
        let unit = self.units.get(index.checked_sub(1)?)?;
        unit.contains(offset).then_some(unit)
    }

    /// The DIE starting at a .debug_info section offset.
    pub fn find_die(&self, offset: u64) -> Option<(&CompilationUnit, &Die)> {
        let unit = self.unit_containing(offset)?;
        Some((unit, unit.dies.die_at(offset)?))
    }

    /// DIEs named `name` in the loaded name table.
    pub fn resolve_name<'c>(
        &'c self,
        name: &str,
    ) -> impl Iterator<Item = (&'c CompilationUnit, &'c Die)> + 'c {
        let names = self.names.as_ref();
        let indices = names.map(|n| n.find(name)).unwrap_or(&[]);
        indices.iter().filter_map(move |&index| {
            let names = names?;
            let pair = names.get(index)?;
            let unit = self.units.get(names.table_of(pair)?.unit?)?;
            let die = unit.dies.die_at(names.die_offset(pair)?)?;
            Some((unit, die))
        })
    }
}
