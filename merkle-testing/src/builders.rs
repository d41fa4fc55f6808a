//! Proptest strategies for transaction buffers.
//!
//! Keys come from a small alphabet so that generated streams overwrite and
//! remove keys that actually exist.

use bytes::Bytes;
use merkle_app::Transaction;
use proptest::prelude::*;

fn arb_key() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(prop::sample::select(vec![b'a', b'b', b'c', 0x00, 0xFF]), 0..4)
        .prop_map(Bytes::from)
}

fn arb_value() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..16).prop_map(Bytes::from)
}

/// A well-formed Set or Remove.
pub fn arb_tx() -> impl Strategy<Value = Transaction> {
    prop_oneof![
        3 => (arb_key(), arb_value()).prop_map(|(key, value)| Transaction::set(key, value)),
        1 => arb_key().prop_map(Transaction::remove),
    ]
}

/// A stream of encoded well-formed transactions.
pub fn arb_tx_stream(max_len: usize) -> impl Strategy<Value = Vec<Bytes>> {
    prop::collection::vec(arb_tx().prop_map(|tx| tx.encode()), 0..max_len)
}

/// A buffer that no decoder may accept: a valid transaction with trailing
/// bytes, a strict prefix of one, or a valid key under an unknown tag.
pub fn arb_malformed_tx() -> impl Strategy<Value = Bytes> {
    let trailing = (arb_tx(), prop::collection::vec(any::<u8>(), 1..4)).prop_map(|(tx, extra)| {
        let mut buf = tx.encode().to_vec();
        buf.extend_from_slice(&extra);
        Bytes::from(buf)
    });

    let truncated = (arb_tx(), any::<prop::sample::Index>()).prop_map(|(tx, cut)| {
        let encoded = tx.encode();
        let len = cut.index(encoded.len());
        encoded.slice(..len)
    });

    let unknown_tag = (
        any::<u8>().prop_filter("known tag", |tag| *tag != 0x01 && *tag != 0x02),
        arb_tx(),
    )
        .prop_map(|(tag, tx)| {
            let mut buf = tx.encode().to_vec();
            buf[0] = tag;
            Bytes::from(buf)
        });

    prop_oneof![trailing, truncated, unknown_tag]
}
