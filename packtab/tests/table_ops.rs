//! Integration tests for the arena table.

use packtab::{Error, FixedMap};

fn sorted_is_strictly_ascending(map: &FixedMap<'_>) -> bool {
    let hashes: Vec<u16> = map.sorted_hashes().collect();
    hashes.windows(2).all(|pair| pair[0] < pair[1])
}

#[test]
fn insert_then_find_round_trips() {
    let mut arena = [0u8; 1024];
    let mut map = FixedMap::create(&mut arena, 16).unwrap();

    let a = map.insert("alpha", 1, b"first").unwrap();
    let b = map.insert("beta", 2, b"second").unwrap();
    let c = map.insert("gamma", 3, b"").unwrap();

    assert_eq!(map.find("alpha"), Some(a));
    assert_eq!(map.find("beta"), Some(b));
    assert_eq!(map.find("gamma"), Some(c));
    assert_eq!(map.find("delta"), None);

    assert_eq!(map.value_at(a), b"first");
    assert_eq!(map.value_at(b), b"second");
    assert_eq!(map.value_at(c), b"");
    assert_eq!(map.key_at(b), "beta");
    assert_eq!(map.tag_at(c), 3);
}

#[test]
fn reinsert_is_idempotent() {
    let mut arena = [0u8; 1024];
    let mut map = FixedMap::create(&mut arena, 8).unwrap();

    let first = map.insert("speed", 4, b"\x10\x27").unwrap();
    let len = map.len();
    let again = map.insert("speed", 9, b"something else").unwrap();

    assert_eq!(first, again);
    assert_eq!(map.len(), len);
    // The original tag and value win.
    assert_eq!(map.tag_at(first), 4);
    assert_eq!(map.value_at(first), b"\x10\x27");
}

#[test]
fn sorted_index_stays_sorted() {
    let mut arena = [0u8; 4096];
    let mut map = FixedMap::create(&mut arena, 64).unwrap();

    for word in [
        "mains", "gain", "attack", "decay", "sustain", "release", "mode", "rate", "depth",
        "cutoff", "resonance", "drive", "pan", "width", "tempo", "swing",
    ] {
        map.insert(word, 0, word.as_bytes()).unwrap();
        assert!(sorted_is_strictly_ascending(&map));
    }
    assert_eq!(map.len(), 16);
}

#[test]
fn engineered_collisions_chain_correctly() {
    // The 16-bit fold hash only sees the byte sum, so permutations of the
    // same letters collide: "az", "za", "by", and "yb" all share a hash.
    assert_eq!(bytefold::hash16(b"az"), bytefold::hash16(b"za"));
    assert_eq!(bytefold::hash16(b"az"), bytefold::hash16(b"by"));
    assert_eq!(bytefold::hash16(b"az"), bytefold::hash16(b"yb"));

    let mut arena = [0u8; 1024];
    let mut map = FixedMap::create(&mut arena, 8).unwrap();

    let az = map.insert("az", 0, b"1").unwrap();
    let za = map.insert("za", 0, b"2").unwrap();
    let by = map.insert("by", 0, b"3").unwrap();
    let yb = map.insert("yb", 0, b"4").unwrap();

    // All four are independently findable through the chain.
    assert_eq!(map.find("az"), Some(az));
    assert_eq!(map.find("za"), Some(za));
    assert_eq!(map.find("by"), Some(by));
    assert_eq!(map.find("yb"), Some(yb));
    assert_eq!(map.find("ya"), None);

    // Re-inserting a chained key is still idempotent.
    assert_eq!(map.insert("by", 7, b"x").unwrap(), by);
    assert_eq!(map.len(), 4);
    assert_eq!(map.value_at(by), b"3");

    // Mixing in non-colliding keys keeps everything reachable.
    map.insert("plain", 0, b"5").unwrap();
    assert_eq!(map.find("za"), Some(za));
    assert!(sorted_is_strictly_ascending(&map));
}

#[test]
fn overflow_leaves_arena_untouched() {
    let mut arena = [0u8; 256];
    let mut map = FixedMap::create(&mut arena, 4).unwrap();
    map.insert("k", 0, b"v").unwrap();

    let before = map.as_bytes().to_vec();
    let huge_value = [0xAB; 512];
    assert_eq!(
        map.insert("big", 0, &huge_value),
        Err(Error::BufferOverflow)
    );
    assert_eq!(map.as_bytes(), before.as_slice());
    assert_eq!(map.len(), 1);

    // Exhausting the entry capacity is a distinct failure.
    map.insert("a", 0, b"").unwrap();
    map.insert("b", 0, b"").unwrap();
    map.insert("c", 0, b"").unwrap();
    assert_eq!(map.insert("d", 0, b""), Err(Error::CapacityExhausted));
}

#[test]
fn key_validation() {
    let mut arena = [0u8; 512];
    let mut map = FixedMap::create(&mut arena, 4).unwrap();
    assert_eq!(map.insert("", 0, b""), Err(Error::InvalidKey));
    assert_eq!(map.insert("nu\0l", 0, b""), Err(Error::InvalidKey));
}

#[test]
fn remove_repairs_index_and_heap() {
    let mut arena = [0u8; 2048];
    let mut map = FixedMap::create(&mut arena, 16).unwrap();

    map.insert("az", 0, b"one").unwrap();
    map.insert("za", 0, b"two").unwrap();
    map.insert("by", 0, b"three").unwrap();
    map.insert("keep", 0, b"kept value").unwrap();
    map.insert("drop", 0, b"dropped").unwrap();

    // Remove from the middle of a chain.
    assert!(map.remove("za").is_some());
    assert_eq!(map.len(), 4);
    assert_eq!(map.find("za"), None);
    let az = map.find("az").unwrap();
    let by = map.find("by").unwrap();
    assert_eq!(map.value_at(az), b"one");
    assert_eq!(map.value_at(by), b"three");

    // Collapse the chain to a single survivor.
    assert!(map.remove("az").is_some());
    let by = map.find("by").unwrap();
    assert_eq!(map.value_at(by), b"three");
    assert!(sorted_is_strictly_ascending(&map));

    // Remove a plain entry and confirm the heap compacted around it.
    assert!(map.remove("drop").is_some());
    assert_eq!(map.find("drop"), None);
    let keep = map.find("keep").unwrap();
    assert_eq!(map.value_at(keep), b"kept value");
    assert_eq!(map.len(), 2);

    // Removing a missing key is a no-op.
    assert_eq!(map.remove("ghost"), None);
}

#[test]
fn remove_copy_hands_back_the_value() {
    let mut arena = [0u8; 512];
    let mut map = FixedMap::create(&mut arena, 4).unwrap();
    map.insert("payload", 0, b"\xDE\xAD\xBE\xEF").unwrap();

    let mut small = [0u8; 2];
    assert_eq!(
        map.remove_copy("payload", &mut small),
        Err(Error::DestinationTooSmall { needed: 4 })
    );
    // The failed copy removed nothing.
    assert!(map.find("payload").is_some());

    let mut dst = [0u8; 8];
    assert_eq!(map.remove_copy("payload", &mut dst), Ok(Some(4)));
    assert_eq!(&dst[..4], b"\xDE\xAD\xBE\xEF");
    assert_eq!(map.find("payload"), None);

    assert_eq!(map.remove_copy("payload", &mut dst), Ok(None));
}

#[test]
fn retain_keeps_matching_entries() {
    let mut arena = [0u8; 2048];
    let mut map = FixedMap::create(&mut arena, 16).unwrap();
    for key in ["cfg.baud", "cfg.mode", "tmp.a", "cfg.rate", "tmp.b"] {
        map.insert(key, 0, key.as_bytes()).unwrap();
    }

    map.retain(|key| key.starts_with("cfg."));

    assert_eq!(map.len(), 3);
    assert_eq!(map.find("tmp.a"), None);
    assert_eq!(map.find("tmp.b"), None);
    for key in ["cfg.baud", "cfg.mode", "cfg.rate"] {
        let idx = map.find(key).unwrap();
        assert_eq!(map.value_at(idx), key.as_bytes());
    }
    assert!(sorted_is_strictly_ascending(&map));
}

#[test]
fn clear_and_wipe() {
    let mut arena = [0u8; 512];
    let mut map = FixedMap::create(&mut arena, 4).unwrap();
    map.insert("a", 0, b"1").unwrap();
    map.clear();
    assert!(map.is_empty());
    assert_eq!(map.find("a"), None);
    map.insert("b", 0, b"2").unwrap();
    assert_eq!(map.len(), 1);

    map.wipe();
    assert!(arena.iter().all(|&byte| byte == 0));
}

#[test]
fn reopen_a_self_describing_arena() {
    let mut arena = [0u8; 1024];
    {
        let mut map = FixedMap::create(&mut arena, 8).unwrap();
        map.insert("az", 1, b"one").unwrap();
        map.insert("za", 2, b"two").unwrap();
        map.insert("other", 3, b"three").unwrap();
    }
    let map = FixedMap::open(&mut arena).unwrap();
    assert_eq!(map.len(), 3);
    let za = map.find("za").unwrap();
    assert_eq!(map.value_at(za), b"two");
    assert_eq!(map.tag_at(za), 2);

    let dump = map.to_string();
    assert!(dump.contains("count=3"));
    assert!(dump.contains("\"az\""));
}

#[test]
fn open_rejects_corrupt_headers() {
    let mut arena = [0u8; 256];
    FixedMap::create(&mut arena, 4).unwrap();

    let mut wrong_size = arena;
    wrong_size[0] ^= 0xFF;
    assert!(matches!(
        FixedMap::open(&mut wrong_size),
        Err(Error::InvalidHeader(_))
    ));

    let mut wrong_count = arena;
    wrong_count[6] = 0xFF; // count > capacity
    assert!(matches!(
        FixedMap::open(&mut wrong_count),
        Err(Error::InvalidHeader(_))
    ));

    assert!(matches!(
        FixedMap::open(&mut [0u8; 4]),
        Err(Error::InvalidHeader(_))
    ));
}

#[test]
fn open_rejects_chains_without_terminators() {
    let mut arena = [0u8; 256];
    {
        let mut map = FixedMap::create(&mut arena, 4).unwrap();
        // "az" and "za" collide, starting the chain [0, 1, NONE].
        map.insert("az", 0, b"1").unwrap();
        map.insert("za", 0, b"2").unwrap();
    }
    // At capacity 4 the pile begins at byte 40 (16-byte header plus three
    // 8-byte index bands), so the chain terminator sits at bytes 44..46.
    // Overwrite it with a live entry index and the chain never ends.
    arena[44..46].copy_from_slice(&0u16.to_le_bytes());
    assert!(matches!(
        FixedMap::open(&mut arena),
        Err(Error::InvalidHeader("chain missing its terminator"))
    ));
}

#[test]
fn contains_covers_exactly_the_arena() {
    let mut arena = [0u8; 256];
    let outside = 0usize as *const u8;
    let map = FixedMap::create(&mut arena, 4).unwrap();
    let first = map.as_bytes().as_ptr();
    let last = unsafe { first.add(255) };
    assert!(map.contains(first));
    assert!(map.contains(last));
    assert!(!map.contains(unsafe { first.add(256) }));
    assert!(!map.contains(outside));
}

#[test]
fn entries_iterate_in_insertion_order() {
    let mut arena = [0u8; 1024];
    let mut map = FixedMap::create(&mut arena, 8).unwrap();
    map.insert("zed", 1, b"z").unwrap();
    map.insert("abc", 2, b"a").unwrap();

    let collected: Vec<(&str, u8)> = map.entries().map(|e| (e.key, e.tag)).collect();
    assert_eq!(collected, vec![("zed", 1), ("abc", 2)]);
}
