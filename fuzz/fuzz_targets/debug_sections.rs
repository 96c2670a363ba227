#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use dwarfscan::{DebugContext, Endianness};

/// Separate section buffers so each parser sees its own input
#[derive(Debug, Arbitrary)]
struct FuzzedSections {
    big_endian: bool,
    debug_abbrev: Vec<u8>,
    debug_info: Vec<u8>,
    debug_pubnames: Vec<u8>,
    lookups: Vec<String>,
}

fuzz_target!(|input: FuzzedSections| {
    let endianness = if input.big_endian {
        Endianness::Big
    } else {
        Endianness::Little
    };

    let mut ctx = DebugContext::new(endianness);
    let _ = ctx.load_info(&input.debug_info, &input.debug_abbrev);
    if ctx.load_names(&input.debug_pubnames).is_ok() {
        for name in &input.lookups {
            for (unit, die) in ctx.resolve_name(name) {
                assert!(unit.contains(die.offset));
            }
        }
    }
});
