//! # dwarfscan
//!
//! Decoder for DWARF 2 and 3 debugging information. This crate provides:
//! - Endian-aware fixed-width and LEB128 primitive reads
//! - Compilation unit header parsing for 32-bit and 64-bit DWARF
//! - Abbreviation tables from .debug_abbrev
//! - Per-unit DIE trees with offset lookup
//! - Name tables from .debug_pubnames and .debug_pubtypes
//!
//! Section bytes are supplied by the caller; no object file parsing is done
//! here.
//!
//! ```no_run
//! use dwarfscan::{DebugContext, Endianness};
//!
//! # fn sections() -> (Vec<u8>, Vec<u8>, Vec<u8>) { unimplemented!() }
//! let (info, abbrev, pubnames) = sections();
//! let mut ctx = DebugContext::new(Endianness::Little);
//! ctx.load_info(&info, &abbrev)?;
//! ctx.load_names(&pubnames)?;
//! for (unit, die) in ctx.resolve_name("main") {
//!     println!("{:?} {:#x} {}", unit.name(), die.offset, die.tag);
//! }
//! # Ok::<(), dwarfscan::DwarfError>(())
//! ```

pub mod abbrev;
pub mod codec;
pub mod context;
pub mod die;
pub mod error;
pub mod info;
pub mod leb128;
pub mod nametbl;
pub mod types;

#[cfg(test)]
mod test_util;

pub use abbrev::{Abbreviation, AbbreviationTable, AttributeSpec};
pub use codec::{Encoding, Endianness, Format, Reader};
pub use context::DebugContext;
pub use die::{Attribute, AttributeValue, Die, DieId, DieParser, DieTree};
pub use error::{DwarfError, ErrorKind, Result};
pub use info::{CompilationUnit, CompilationUnitHeader, DebugInfoParser};
pub use nametbl::{NamePair, NameSection, NameTable};
pub use types::{DwAt, DwForm, DwLang, DwTag};
