//! Property tests for frame reassembly.
//!
//! Chunk boundaries must never influence frame boundaries, and the assembler
//! may only drop bytes through an accounted overflow.

use hmilink_frame::{Frame, FrameAssembler};
use proptest::prelude::*;
use proptest::sample::Index;

fn wire_strategy() -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(
        prop_oneof![3 => b'a'..=b'f', 1 => Just(b'\n'), 1 => Just(b';')],
        0..400,
    )
}

fn split_at_cuts<'a>(wire: &'a [u8], cuts: &[Index]) -> Vec<&'a [u8]> {
    let mut points: Vec<usize> = cuts.iter().map(|i| i.index(wire.len() + 1)).collect();
    points.sort_unstable();
    points.dedup();

    let mut chunks = Vec::new();
    let mut start = 0;
    for point in points {
        chunks.push(&wire[start..point]);
        start = point;
    }
    chunks.push(&wire[start..]);
    chunks
}

fn feed_all(asm: &mut FrameAssembler, chunks: &[&[u8]]) -> Vec<Frame> {
    let mut out = Vec::new();
    for chunk in chunks {
        let _ = asm.feed(chunk, &mut out);
    }
    out
}

proptest! {
    /// Without overflow, frames plus their delimiters plus the pending tail
    /// reproduce the input exactly.
    #[test]
    fn prop_bytes_are_conserved(wire in wire_strategy(), cuts in prop::collection::vec(any::<Index>(), 0..12)) {
        let mut asm = FrameAssembler::with_capacity(wire.len().max(1)).unwrap();
        let frames = feed_all(&mut asm, &split_at_cuts(&wire, &cuts));

        let mut rebuilt = Vec::new();
        for frame in &frames {
            rebuilt.extend_from_slice(frame.as_bytes());
            rebuilt.push(b'\n');
        }
        rebuilt.extend_from_slice(asm.pending());

        prop_assert_eq!(rebuilt, wire);
        prop_assert_eq!(asm.stats().overflows, 0);
    }

    /// Any split of the same bytes yields the same frames, the same pending
    /// tail and the same overflow accounting.
    #[test]
    fn prop_chunking_never_moves_frame_boundaries(
        wire in wire_strategy(),
        cuts in prop::collection::vec(any::<Index>(), 0..12),
        capacity in 4usize..64,
    ) {
        let mut whole = FrameAssembler::with_capacity(capacity).unwrap();
        let mut split = FrameAssembler::with_capacity(capacity).unwrap();

        let expected = feed_all(&mut whole, &[&wire]);
        let actual = feed_all(&mut split, &split_at_cuts(&wire, &cuts));

        prop_assert_eq!(&actual, &expected);
        prop_assert_eq!(split.pending(), whole.pending());
        prop_assert_eq!(split.stats().overflows, whole.stats().overflows);
        prop_assert_eq!(split.stats().discarded_bytes, whole.stats().discarded_bytes);
        prop_assert!(split.pending().len() <= capacity);
    }

    /// With overflow, every input byte is either emitted, pending, or
    /// counted as discarded.
    #[test]
    fn prop_overflow_accounts_for_every_byte(
        wire in wire_strategy(),
        cuts in prop::collection::vec(any::<Index>(), 0..12),
        capacity in 1usize..32,
    ) {
        let mut asm = FrameAssembler::with_capacity(capacity).unwrap();
        let frames = feed_all(&mut asm, &split_at_cuts(&wire, &cuts));

        let emitted: usize = frames.iter().map(|f| f.len() + 1).sum();
        let stats = asm.stats();

        prop_assert_eq!(stats.bytes_in as usize, wire.len());
        prop_assert_eq!(
            emitted + asm.pending().len() + stats.discarded_bytes as usize,
            wire.len()
        );
        prop_assert!(frames.iter().all(|f| f.len() <= capacity));
        prop_assert!(asm.pending().len() <= capacity);
    }
}
