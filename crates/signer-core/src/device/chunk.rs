//! Payload chunking for multi-frame transfers.
//!
//! A logical payload larger than one frame is split into consecutive
//! slices of at most [`Apdu::MAX_DATA`] bytes. The first slice is tagged
//! `P1 = 0x00` and every later slice `P1 = 0x80`; the tag is how the
//! device knows to reset its accumulation buffer at the start of a new
//! logical message rather than appending to the previous one.
//!
//! The partition is deterministic and order-preserving, and an empty
//! payload still produces exactly one (empty) chunk so that every command
//! sends at least one frame.

use super::apdu::Apdu;

/// P1 value for the first (or only) chunk of a logical message.
pub(crate) const P1_FIRST: u8 = 0x00;

/// P1 value for every continuation chunk.
pub(crate) const P1_MORE: u8 = 0x80;

/// One slice of a logical payload, tagged with its position marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Chunk<'a> {
    /// Position marker: [`P1_FIRST`] or [`P1_MORE`].
    pub(crate) p1: u8,

    /// The slice itself, at most [`Apdu::MAX_DATA`] bytes.
    pub(crate) data: &'a [u8],
}

/// Number of chunks a payload of `len` bytes splits into.
pub(crate) const fn count(len: usize) -> usize {
    if len == 0 {
        1
    } else {
        len.div_ceil(Apdu::MAX_DATA)
    }
}

/// Splits a payload into position-tagged chunks.
pub(crate) fn split(payload: &[u8]) -> impl ExactSizeIterator<Item = Chunk<'_>> {
    let total = count(payload.len());
    (0..total).map(move |i| {
        let start = i * Apdu::MAX_DATA;
        let end = usize::min(start + Apdu::MAX_DATA, payload.len());
        Chunk {
            p1: if i == 0 { P1_FIRST } else { P1_MORE },
            data: &payload[start..end],
        }
    })
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn empty_payload_is_one_empty_chunk() {
        let chunks: Vec<_> = split(&[]).collect();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].p1, P1_FIRST);
        assert!(chunks[0].data.is_empty());
    }

    #[test]
    fn short_payload_is_one_chunk() {
        let payload = vec![0xAB; 255];
        let chunks: Vec<_> = split(&payload).collect();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].p1, P1_FIRST);
        assert_eq!(chunks[0].data, payload.as_slice());
    }

    #[test]
    fn boundary_payload_splits_exactly() {
        // 256 bytes is the smallest payload needing a continuation frame.
        let payload = vec![0xCD; 256];
        let chunks: Vec<_> = split(&payload).collect();

        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].data.len(), 255);
        assert_eq!(chunks[1].data.len(), 1);
        assert_eq!(chunks[0].p1, P1_FIRST);
        assert_eq!(chunks[1].p1, P1_MORE);
    }

    proptest! {
        #[test]
        fn concatenation_recovers_payload(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            let mut rebuilt = Vec::new();
            for chunk in split(&payload) {
                rebuilt.extend_from_slice(chunk.data);
            }
            prop_assert_eq!(rebuilt, payload);
        }

        #[test]
        fn chunk_count_is_ceiling_division(len in 0usize..4096) {
            let payload = vec![0u8; len];
            let expected = if len == 0 { 1 } else { len.div_ceil(255) };
            prop_assert_eq!(split(&payload).len(), expected);
            prop_assert_eq!(count(len), expected);
        }

        #[test]
        fn only_the_first_chunk_is_tagged_first(payload in proptest::collection::vec(any::<u8>(), 0..2048)) {
            for (i, chunk) in split(&payload).enumerate() {
                if i == 0 {
                    prop_assert_eq!(chunk.p1, P1_FIRST);
                } else {
                    prop_assert_eq!(chunk.p1, P1_MORE);
                }
                prop_assert!(chunk.data.len() <= Apdu::MAX_DATA);
            }
        }
    }
}
