//! Human-readable dump of a table's index and heap state.
//!
//! The original console printer is externalized as a [`core::fmt::Display`]
//! implementation so callers choose the sink; the table itself performs no
//! I/O.

use core::fmt;

use crate::layout::NONE;
use crate::map::FixedMap;

impl fmt::Display for FixedMap<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "packtab size={} capacity={} count={} hashes={} pile={}",
            self.size(),
            self.capacity(),
            self.count(),
            self.hash_count(),
            self.pile_len(),
        )?;
        writeln!(f, "{:>5} {:>6} {:>6}  chain", "slot", "hash", "entry")?;
        for slot in 0..self.hash_count() as usize {
            write!(
                f,
                "{:>5} {:#06x} {:>6} ",
                slot,
                self.hash_slot(slot),
                self.slot_entry(slot),
            )?;
            let head = self.head(slot);
            if head == NONE {
                writeln!(f, " -")?;
            } else {
                write!(f, " [")?;
                let mut at = head as usize;
                loop {
                    let entry = self.pile(at);
                    if entry == NONE {
                        break;
                    }
                    if at != head as usize {
                        write!(f, ", ")?;
                    }
                    write!(f, "{entry}")?;
                    at += 1;
                }
                writeln!(f, "]")?;
            }
        }
        writeln!(f, "{:>5} {:>6} {:>5} {:>5}  key", "entry", "tail", "data", "tag")?;
        for entry in self.entries() {
            writeln!(
                f,
                "{:>5} {:>6} {:>5} {:>5}  {:?} = {} bytes",
                entry.index,
                self.key_tail(entry.index),
                self.data_off(entry.index),
                entry.tag,
                entry.key,
                entry.value.len(),
            )?;
        }
        Ok(())
    }
}
