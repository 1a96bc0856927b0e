//! The fixed-arena associative table.

use crate::err::Error;
use crate::layout::{self, Regions, HEADER_LEN, MAX_ARENA, MAX_CAPACITY, NONE};

/// A string-keyed table living entirely inside one caller-owned buffer.
///
/// The arena is self-describing: a 16-byte header records the buffer size,
/// capacity, and live counts, and every region offset is derived from the
/// capacity alone. Keys and values are appended to a heap growing downward
/// from the high end of the arena; index metadata grows upward from the
/// header. The two never overlap; an insert that would make them collide
/// fails with [`Error::BufferOverflow`] before any byte is written.
///
/// Lookup is a binary search over a sorted array of 16-bit key hashes.
/// Keys whose hashes collide are linked through a side pile of index
/// chains, each terminated by [`NONE`].
///
/// The table is a single-owner value type. It is not safe for concurrent
/// mutation; the `&mut` borrow of the arena enforces exclusive access at
/// compile time.
pub struct FixedMap<'a> {
    arena: &'a mut [u8],
}

/// One live entry, borrowed from the arena.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Entry<'m> {
    /// Insertion-order index of the entry.
    pub index: u16,
    /// The entry's key.
    pub key: &'m str,
    /// Caller-supplied tag byte stored with the entry.
    pub tag: u8,
    /// The entry's value bytes.
    pub value: &'m [u8],
}

impl<'a> FixedMap<'a> {
    /// Format a fresh table over caller-provided memory.
    ///
    /// Fails with [`Error::TooSmall`] if the arena cannot hold the header
    /// and index regions for `capacity` entries plus at least one minimal
    /// entry, and with [`Error::InvalidHeader`] if `capacity` is zero or
    /// the arena exceeds the largest addressable size.
    pub fn create(arena: &'a mut [u8], capacity: u16) -> Result<Self, Error> {
        if capacity == 0 || capacity as usize > MAX_CAPACITY {
            return Err(Error::InvalidHeader("unsupported capacity"));
        }
        if arena.len() > MAX_ARENA {
            return Err(Error::InvalidHeader("arena larger than 64 KiB"));
        }
        let regions = Regions::for_capacity(capacity as usize);
        // Room for the metadata plus one one-byte key and its terminator.
        if arena.len() < regions.meta_end + 2 {
            return Err(Error::TooSmall);
        }
        arena[..HEADER_LEN].fill(0);
        layout::put32(arena, layout::SIZE_OFF, arena.len() as u32);
        layout::put16(arena, layout::CAPACITY_OFF, capacity);
        Ok(Self { arena })
    }

    /// Re-attach to an arena previously formatted by [`FixedMap::create`].
    ///
    /// The header and every index region are validated before the table is
    /// handed back, so the borrowing accessors cannot be tripped up by a
    /// corrupt buffer.
    pub fn open(arena: &'a mut [u8]) -> Result<Self, Error> {
        validate(arena)?;
        Ok(Self { arena })
    }

    /// Number of live entries.
    pub fn len(&self) -> usize {
        self.count() as usize
    }

    /// True if the table holds no entries.
    pub fn is_empty(&self) -> bool {
        self.count() == 0
    }

    /// Maximum number of entries the table can hold.
    pub fn capacity(&self) -> u16 {
        layout::get16(self.arena, layout::CAPACITY_OFF)
    }

    /// Bytes left in the gap between the metadata and the key/value heap.
    pub fn free_bytes(&self) -> usize {
        let regions = self.regions();
        self.size() - regions.meta_end - self.watermark()
    }

    /// The raw arena, header included.
    pub fn as_bytes(&self) -> &[u8] {
        self.arena
    }

    /// True if `address` points into this table's arena.
    pub fn contains(&self, address: *const u8) -> bool {
        self.arena.as_ptr_range().contains(&address)
    }

    /// Insert a key/value pair tagged with `tag`.
    ///
    /// Returns the entry's insertion-order index. Re-inserting an existing
    /// key returns the existing index without touching the arena; the
    /// stored tag and value are kept. All space checks run before the
    /// first byte is written, so a failed insert leaves the arena
    /// byte-for-byte unchanged.
    pub fn insert(&mut self, key: &str, tag: u8, value: &[u8]) -> Result<u16, Error> {
        if key.is_empty() || key.as_bytes().contains(&0) {
            return Err(Error::InvalidKey);
        }
        let hash = bytefold::hash16(key.as_bytes());
        let needed = key.len() + 1 + value.len();

        match self.locate_hash(hash) {
            Err(slot) => {
                // New distinct hash: open a sorted slot at the insertion
                // point and append the entry.
                self.check_room(needed, 0)?;
                let entry = self.count();
                self.append_heap(entry, key, tag, value);
                self.open_slot(slot);
                self.set_hash_slot(slot, hash);
                self.set_slot_entry(slot, entry);
                self.set_head(slot, NONE);
                self.set_hash_count(self.hash_count() + 1);
                self.set_count(entry + 1);
                Ok(entry)
            }
            Ok(slot) if self.chain_head(slot).is_none() => {
                let existing = self.slot_entry(slot);
                if self.key_at(existing) == key {
                    return Ok(existing);
                }
                // Two distinct keys share a hash for the first time: start
                // a chain holding both, terminator included.
                self.check_room(needed, 3)?;
                let entry = self.count();
                let run = self.pile_len();
                self.append_heap(entry, key, tag, value);
                self.set_pile(run, existing);
                self.set_pile(run + 1, entry);
                self.set_pile(run + 2, NONE);
                self.set_pile_len(run + 3);
                self.set_head(slot, run as u16);
                self.set_count(entry + 1);
                Ok(entry)
            }
            Ok(slot) => {
                // Walk the existing chain; `at` lands on the terminator.
                let mut at = self.head(slot) as usize;
                loop {
                    let e = self.pile(at);
                    if e == NONE {
                        break;
                    }
                    if self.key_at(e) == key {
                        return Ok(e);
                    }
                    at += 1;
                }
                self.check_room(needed, 1)?;
                let entry = self.count();
                let pile_len = self.pile_len();
                let pile_base = self.regions().pile;
                self.append_heap(entry, key, tag, value);
                // Splice the new index in ahead of the terminator. Runs
                // that start past the splice point move up one slot.
                layout::shift_right16(self.arena, pile_base, at, pile_len);
                self.set_pile(at, entry);
                self.set_pile_len(pile_len + 1);
                self.adjust_heads_above(at, 1);
                self.set_count(entry + 1);
                Ok(entry)
            }
        }
    }

    /// Look up a key, returning its insertion-order index.
    pub fn find(&self, key: &str) -> Option<u16> {
        if self.is_empty() {
            return None;
        }
        let hash = bytefold::hash16(key.as_bytes());
        let slot = self.locate_hash(hash).ok()?;
        let Some(mut at) = self.chain_head(slot) else {
            let entry = self.slot_entry(slot);
            return (self.key_at(entry) == key).then_some(entry);
        };
        loop {
            let entry = self.pile(at);
            if entry == NONE {
                return None;
            }
            if self.key_at(entry) == key {
                return Some(entry);
            }
            at += 1;
        }
    }

    /// The key stored at `index`.
    ///
    /// Panics if `index` is not a live entry.
    pub fn key_at(&self, index: u16) -> &str {
        assert!(index < self.count());
        let size = self.size();
        let tail = self.key_tail(index) as usize;
        let key_len = tail - self.data_off(index) as usize - 1;
        let bytes = &self.arena[size - tail..size - tail + key_len];
        core::str::from_utf8(bytes).expect("keys validated on create/open")
    }

    /// The value stored at `index`.
    ///
    /// Panics if `index` is not a live entry.
    pub fn value_at(&self, index: u16) -> &[u8] {
        assert!(index < self.count());
        let size = self.size();
        let data_off = self.data_off(index) as usize;
        let value_len = data_off - self.prev_tail(index);
        &self.arena[size - data_off..size - data_off + value_len]
    }

    /// The tag byte stored at `index`.
    ///
    /// Panics if `index` is not a live entry.
    pub fn tag_at(&self, index: u16) -> u8 {
        assert!(index < self.count());
        self.arena[self.regions().states + index as usize]
    }

    /// Iterate the live entries in insertion order.
    pub fn entries(&self) -> impl Iterator<Item = Entry<'_>> + '_ {
        (0..self.count()).map(move |index| Entry {
            index,
            key: self.key_at(index),
            tag: self.tag_at(index),
            value: self.value_at(index),
        })
    }

    /// The live sorted hash index, ascending.
    pub fn sorted_hashes(&self) -> impl Iterator<Item = u16> + '_ {
        (0..self.hash_count() as usize).map(move |slot| self.hash_slot(slot))
    }

    /// Remove a key, returning the index it occupied.
    ///
    /// Later entries are renumbered down by one and the heap is compacted,
    /// so previously returned indices above the removed one shift.
    pub fn remove(&mut self, key: &str) -> Option<u16> {
        let entry = self.find(key)?;
        self.remove_entry(entry);
        Some(entry)
    }

    /// Remove a key after copying its value into `dst`.
    ///
    /// Returns `Ok(None)` if the key is absent. Fails without removing
    /// anything if `dst` cannot hold the value.
    pub fn remove_copy(&mut self, key: &str, dst: &mut [u8]) -> Result<Option<usize>, Error> {
        let Some(entry) = self.find(key) else {
            return Ok(None);
        };
        let value = self.value_at(entry);
        let needed = value.len();
        if dst.len() < needed {
            return Err(Error::DestinationTooSmall { needed });
        }
        dst[..needed].copy_from_slice(value);
        self.remove_entry(entry);
        Ok(Some(needed))
    }

    /// Keep only the entries whose key satisfies `pred`.
    pub fn retain(&mut self, mut pred: impl FnMut(&str) -> bool) {
        let mut index = 0;
        while index < self.count() {
            if pred(self.key_at(index)) {
                index += 1;
            } else {
                self.remove_entry(index);
            }
        }
    }

    /// Forget all entries. The heap bytes stay in place until overwritten.
    pub fn clear(&mut self) {
        self.set_count(0);
        self.set_hash_count(0);
        self.set_pile_len(0);
    }

    /// Zero the entire arena, header included. Irreversible; the buffer
    /// must be re-formatted with [`FixedMap::create`] before reuse.
    pub fn wipe(self) {
        self.arena.fill(0);
    }

    // ---- index repair for removal ----

    fn remove_entry(&mut self, entry: u16) {
        let count = self.count();
        debug_assert!(entry < count);
        let hash = bytefold::hash16(self.key_at(entry).as_bytes());
        let slot = self
            .locate_hash(hash)
            .expect("live entry always has a sorted slot");

        if let Some(run) = self.chain_head(slot) {
            let mut at = run;
            while self.pile(at) != entry {
                at += 1;
            }
            let pile_len = self.pile_len();
            let pile_base = self.regions().pile;
            layout::shift_left16(self.arena, pile_base, at + 1, pile_len, 1);
            self.set_pile_len(pile_len - 1);
            self.adjust_heads_above(at, -1);

            let survivor = self.pile(run);
            debug_assert_ne!(survivor, NONE);
            if self.pile(run + 1) == NONE {
                // Chain collapsed to one entry: fold it back into a direct
                // slot and reclaim the whole run.
                self.set_slot_entry(slot, survivor);
                self.set_head(slot, NONE);
                let pile_len = self.pile_len();
                let pile_base = self.regions().pile;
                layout::shift_left16(self.arena, pile_base, run + 2, pile_len, 2);
                self.set_pile_len(pile_len - 2);
                self.adjust_heads_above(run, -2);
            } else {
                self.set_slot_entry(slot, survivor);
            }
        } else {
            // Sole owner of the hash: close up the sorted slot.
            self.close_slot(slot);
            self.set_hash_count(self.hash_count() - 1);
        }

        // Compact the heap: slide everything below the removed entry's
        // bytes toward the arena end.
        let size = self.size();
        let tail = self.key_tail(entry) as usize;
        let freed = tail - self.prev_tail(entry);
        let deepest = self.key_tail(count - 1) as usize;
        self.arena
            .copy_within(size - deepest..size - tail, size - deepest + freed);

        // Renumber the per-entry arrays, rebasing offsets past the hole.
        let regions = self.regions();
        for j in entry as usize + 1..count as usize {
            let kt = layout::get16(self.arena, regions.key_tails + 2 * j) - freed as u16;
            layout::put16(self.arena, regions.key_tails + 2 * (j - 1), kt);
            let doff = layout::get16(self.arena, regions.data_offs + 2 * j) - freed as u16;
            layout::put16(self.arena, regions.data_offs + 2 * (j - 1), doff);
            self.arena[regions.states + j - 1] = self.arena[regions.states + j];
        }

        // Every stored index above the removed entry shifts down by one.
        for slot in 0..self.hash_count() as usize {
            let e = self.slot_entry(slot);
            if e != NONE && e > entry {
                self.set_slot_entry(slot, e - 1);
            }
        }
        for at in 0..self.pile_len() {
            let e = self.pile(at);
            if e != NONE && e > entry {
                self.set_pile(at, e - 1);
            }
        }
        self.set_count(count - 1);
    }

    // ---- header and region accessors ----

    pub(crate) fn size(&self) -> usize {
        layout::get32(self.arena, layout::SIZE_OFF) as usize
    }

    pub(crate) fn count(&self) -> u16 {
        layout::get16(self.arena, layout::COUNT_OFF)
    }

    fn set_count(&mut self, count: u16) {
        layout::put16(self.arena, layout::COUNT_OFF, count);
    }

    pub(crate) fn hash_count(&self) -> u16 {
        layout::get16(self.arena, layout::HASH_COUNT_OFF)
    }

    fn set_hash_count(&mut self, hash_count: u16) {
        layout::put16(self.arena, layout::HASH_COUNT_OFF, hash_count);
    }

    pub(crate) fn pile_len(&self) -> usize {
        layout::get16(self.arena, layout::PILE_LEN_OFF) as usize
    }

    fn set_pile_len(&mut self, pile_len: usize) {
        layout::put16(self.arena, layout::PILE_LEN_OFF, pile_len as u16);
    }

    pub(crate) fn regions(&self) -> Regions {
        Regions::for_capacity(self.capacity() as usize)
    }

    pub(crate) fn hash_slot(&self, slot: usize) -> u16 {
        layout::get16(self.arena, self.regions().hashes + 2 * slot)
    }

    fn set_hash_slot(&mut self, slot: usize, hash: u16) {
        layout::put16(self.arena, self.regions().hashes + 2 * slot, hash);
    }

    pub(crate) fn slot_entry(&self, slot: usize) -> u16 {
        layout::get16(self.arena, self.regions().slots + 2 * slot)
    }

    fn set_slot_entry(&mut self, slot: usize, entry: u16) {
        layout::put16(self.arena, self.regions().slots + 2 * slot, entry);
    }

    pub(crate) fn head(&self, slot: usize) -> u16 {
        layout::get16(self.arena, self.regions().heads + 2 * slot)
    }

    /// The slot's collision chain start, decoded from the sentinel form.
    pub(crate) fn chain_head(&self, slot: usize) -> Option<usize> {
        match self.head(slot) {
            NONE => None,
            head => Some(head as usize),
        }
    }

    fn set_head(&mut self, slot: usize, head: u16) {
        layout::put16(self.arena, self.regions().heads + 2 * slot, head);
    }

    pub(crate) fn pile(&self, at: usize) -> u16 {
        layout::get16(self.arena, self.regions().pile + 2 * at)
    }

    fn set_pile(&mut self, at: usize, entry: u16) {
        layout::put16(self.arena, self.regions().pile + 2 * at, entry);
    }

    pub(crate) fn key_tail(&self, entry: u16) -> u16 {
        layout::get16(self.arena, self.regions().key_tails + 2 * entry as usize)
    }

    pub(crate) fn data_off(&self, entry: u16) -> u16 {
        layout::get16(self.arena, self.regions().data_offs + 2 * entry as usize)
    }

    /// Heap watermark just above entry `index`'s bytes.
    fn prev_tail(&self, index: u16) -> usize {
        if index == 0 {
            0
        } else {
            self.key_tail(index - 1) as usize
        }
    }

    /// Total heap bytes in use.
    fn watermark(&self) -> usize {
        self.prev_tail(self.count())
    }

    // ---- insert helpers ----

    /// Binary search the sorted hash index.
    fn locate_hash(&self, hash: u16) -> Result<usize, usize> {
        let mut low = 0;
        let mut high = self.hash_count() as usize;
        while low < high {
            let mid = (low + high) / 2;
            match self.hash_slot(mid).cmp(&hash) {
                core::cmp::Ordering::Less => low = mid + 1,
                core::cmp::Ordering::Greater => high = mid,
                core::cmp::Ordering::Equal => return Ok(mid),
            }
        }
        Err(low)
    }

    /// Verify capacity, pile, and heap room before any mutation.
    fn check_room(&self, heap_bytes: usize, pile_growth: usize) -> Result<(), Error> {
        if self.count() >= self.capacity() {
            return Err(Error::CapacityExhausted);
        }
        if self.pile_len() + pile_growth > layout::pile_cap(self.capacity() as usize) {
            return Err(Error::BufferOverflow);
        }
        if heap_bytes > self.free_bytes() {
            return Err(Error::BufferOverflow);
        }
        Ok(())
    }

    /// Append key and value bytes to the heap and record the entry's
    /// offsets and tag. The caller has already verified the space.
    fn append_heap(&mut self, entry: u16, key: &str, tag: u8, value: &[u8]) {
        let size = self.size();
        let watermark = self.watermark();
        let data_off = watermark + value.len();
        let tail = data_off + key.len() + 1;

        self.arena[size - data_off..size - watermark].copy_from_slice(value);
        self.arena[size - tail..size - tail + key.len()].copy_from_slice(key.as_bytes());
        self.arena[size - data_off - 1] = 0;

        let regions = self.regions();
        layout::put16(
            self.arena,
            regions.key_tails + 2 * entry as usize,
            tail as u16,
        );
        layout::put16(
            self.arena,
            regions.data_offs + 2 * entry as usize,
            data_off as u16,
        );
        self.arena[regions.states + entry as usize] = tag;
    }

    /// Shift the three sorted-index arrays right to open `slot`.
    fn open_slot(&mut self, slot: usize) {
        let regions = self.regions();
        let live = self.hash_count() as usize;
        layout::shift_right16(self.arena, regions.hashes, slot, live);
        layout::shift_right16(self.arena, regions.slots, slot, live);
        layout::shift_right16(self.arena, regions.heads, slot, live);
    }

    /// Shift the three sorted-index arrays left to close `slot`.
    fn close_slot(&mut self, slot: usize) {
        let regions = self.regions();
        let live = self.hash_count() as usize;
        layout::shift_left16(self.arena, regions.hashes, slot + 1, live, 1);
        layout::shift_left16(self.arena, regions.slots, slot + 1, live, 1);
        layout::shift_left16(self.arena, regions.heads, slot + 1, live, 1);
    }

    /// Rebase chain heads after the pile shifted at `pivot`.
    fn adjust_heads_above(&mut self, pivot: usize, delta: isize) {
        for slot in 0..self.hash_count() as usize {
            let head = self.head(slot);
            if head != NONE && head as usize > pivot {
                self.set_head(slot, (head as isize + delta) as u16);
            }
        }
    }
}

/// Full validation of a foreign arena before [`FixedMap::open`] trusts it.
fn validate(arena: &[u8]) -> Result<(), Error> {
    if arena.len() < HEADER_LEN {
        return Err(Error::InvalidHeader("shorter than the header"));
    }
    if layout::get32(arena, layout::SIZE_OFF) as usize != arena.len() {
        return Err(Error::InvalidHeader("size field disagrees with buffer"));
    }
    if arena.len() > MAX_ARENA {
        return Err(Error::InvalidHeader("arena larger than 64 KiB"));
    }
    let capacity = layout::get16(arena, layout::CAPACITY_OFF) as usize;
    if capacity == 0 || capacity > MAX_CAPACITY {
        return Err(Error::InvalidHeader("unsupported capacity"));
    }
    let regions = Regions::for_capacity(capacity);
    if regions.meta_end + 2 > arena.len() {
        return Err(Error::InvalidHeader("metadata exceeds the arena"));
    }
    let count = layout::get16(arena, layout::COUNT_OFF) as usize;
    let hash_count = layout::get16(arena, layout::HASH_COUNT_OFF) as usize;
    let pile_len = layout::get16(arena, layout::PILE_LEN_OFF) as usize;
    if count > capacity || hash_count > count || pile_len > layout::pile_cap(capacity) {
        return Err(Error::InvalidHeader("counters out of range"));
    }

    // Sorted index: strictly ascending hashes, live references only.
    for slot in 0..hash_count {
        if slot > 0 {
            let prev = layout::get16(arena, regions.hashes + 2 * (slot - 1));
            let here = layout::get16(arena, regions.hashes + 2 * slot);
            if prev >= here {
                return Err(Error::InvalidHeader("hash index not sorted"));
            }
        }
        if layout::get16(arena, regions.slots + 2 * slot) as usize >= count {
            return Err(Error::InvalidHeader("slot entry out of range"));
        }
        let head = layout::get16(arena, regions.heads + 2 * slot);
        if head == NONE {
            continue;
        }
        if head as usize >= pile_len {
            return Err(Error::InvalidHeader("chain head out of range"));
        }
        // Chain walks stop at the terminator; require one inside the pile
        // so a walk can never run past `pile_len`.
        let mut at = head as usize;
        while layout::get16(arena, regions.pile + 2 * at) != NONE {
            at += 1;
            if at >= pile_len {
                return Err(Error::InvalidHeader("chain missing its terminator"));
            }
        }
    }
    for at in 0..pile_len {
        let entry = layout::get16(arena, regions.pile + 2 * at);
        if entry != NONE && entry as usize >= count {
            return Err(Error::InvalidHeader("pile entry out of range"));
        }
    }

    // Heap offsets: monotonic tails, keys NUL-terminated valid UTF-8.
    let size = arena.len();
    let mut prev_tail = 0usize;
    for entry in 0..count {
        let tail = layout::get16(arena, regions.key_tails + 2 * entry) as usize;
        let data_off = layout::get16(arena, regions.data_offs + 2 * entry) as usize;
        if data_off < prev_tail || tail <= data_off + 1 || tail > size - regions.meta_end {
            return Err(Error::InvalidHeader("heap offsets out of order"));
        }
        let key_len = tail - data_off - 1;
        let key = &arena[size - tail..size - tail + key_len];
        if arena[size - data_off - 1] != 0 {
            return Err(Error::InvalidHeader("key missing its terminator"));
        }
        if key.contains(&0) || core::str::from_utf8(key).is_err() {
            return Err(Error::InvalidHeader("key is not valid UTF-8"));
        }
        prev_tail = tail;
    }
    Ok(())
}
