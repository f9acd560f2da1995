//! Fuzz target for chunked hashing
//!
//! Digests must not depend on the read size or on how writes are split.

#![no_main]

use arbitrary::Arbitrary;
use libfuzzer_sys::fuzz_target;
use r2index_checksum::{ChecksumEngine, MultiHasher, checksum_bytes};

#[derive(Debug, Arbitrary)]
struct ChunkedInput {
    data: Vec<u8>,
    chunk_size: u16,
    splits: Vec<u16>,
}

fuzz_target!(|input: ChunkedInput| {
    let reference = checksum_bytes(&input.data);
    assert_eq!(reference.size, input.data.len() as u64);

    // Use reasonable chunk sizes (1 byte to 64KB)
    let chunk_size = usize::from(input.chunk_size).max(1);
    let chunked = ChecksumEngine::new()
        .with_chunk_size(chunk_size)
        .compute_from_reader(&input.data[..])
        .expect("reading from a slice cannot fail");
    assert_eq!(chunked, reference);

    let mut hasher = MultiHasher::new();
    let mut rest = &input.data[..];
    for split in input.splits {
        let (head, tail) = rest.split_at(usize::from(split).min(rest.len()));
        hasher.update(head);
        rest = tail;
    }
    hasher.update(rest);
    assert_eq!(hasher.finalize(), reference);
});
