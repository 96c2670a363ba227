#![no_main]

use libfuzzer_sys::fuzz_target;
use dwarfscan::{DebugContext, Endianness};

fuzz_target!(|data: &[u8]| {
    // First byte picks the byte order, the rest is split between
    // .debug_abbrev and .debug_info
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let endianness = if selector & 1 == 0 {
        Endianness::Little
    } else {
        Endianness::Big
    };
    let split = usize::from(selector >> 1).min(rest.len());
    let (abbrev, info) = rest.split_at(split);

    let mut ctx = DebugContext::new(endianness);
    let _ = ctx.load_info(info, abbrev);

    for unit in ctx.units() {
        let _ = unit.name();
        let _ = unit.language();
        for (id, die) in unit.dies.iter() {
            let _ = unit.dies.parent(id);
            let _ = unit.dies.children(id).count();
            if let Some(value) = die.type_ref() {
                let _ = unit.resolve_reference(value);
            }
            let _ = ctx.find_die(die.offset);
        }
    }
});
