//! Data cache maintenance by set/way.
//!
//! Set/way operations only act on the executing core, which is all the
//! handoff needs as the other cores are still parked.
use super::{
    instructions::{dc_cisw, dsb_sy, isb},
    registers::{Ccsidr, Clidr, Csselr},
};

/// Cache type field values at or above this one include a data cache.
const CTYPE_DATA: u64 = 0b010;

/// Cleans and invalidates every data and unified cache level up to the
/// point of coherency.
pub fn clean_invalidate_all() {
    let clidr = Clidr::read();
    let level_of_coherency = (clidr >> 24) & 0b111;

    for level in 0..level_of_coherency {
        let ctype = (clidr >> (level * 3)) & 0b111;
        if ctype < CTYPE_DATA {
            continue;
        }

        // Safety:
        // Selecting a data cache level that CLIDR reports as present.
        unsafe { Csselr::write(level << 1) };
        isb();

        let ccsidr = Ccsidr::read();
        let line_shift = (ccsidr & 0b111) + 4;
        let ways = ((ccsidr >> 3) & 0x3FF) + 1;
        let sets = ((ccsidr >> 13) & 0x7FFF) + 1;
        // Way index lives in the top bits of the operand
        let way_shift = (ways - 1).leading_zeros() - 32;

        for set in 0..sets {
            for way in 0..ways {
                dc_cisw((way << way_shift) | (set << line_shift) | (level << 1));
            }
        }
    }

    dsb_sy();
    isb();
}
