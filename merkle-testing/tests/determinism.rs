//! Property tests for replica determinism and rejection of malformed input.

use bytes::Bytes;
use merkle_app::{MerkleApp, MerkleAppConfig, MerkleStore, QueryRequest, Transaction};
use merkle_testing::{arb_malformed_tx, arb_tx_stream, ReplicaSet};
use proptest::prelude::*;
use std::collections::BTreeMap;

fn quiet_app() -> MerkleApp {
    MerkleApp::new(MerkleAppConfig::default().with_trace_sets(false))
}

proptest! {
    /// Replicas fed the same stream agree on every result and on the commit.
    #[test]
    fn replicas_agree_on_any_stream(stream in arb_tx_stream(40)) {
        let mut set = ReplicaSet::new(3, MerkleAppConfig::default().with_trace_sets(false))
            .unwrap();
        let results = set.append_all(&stream).unwrap();
        prop_assert!(results.iter().all(|r| r.is_ok()));
        prop_assert!(set.commit().is_ok());
    }

    /// The commit depends on final contents, not on the order they were written.
    #[test]
    fn commit_ignores_insertion_order(
        entries in prop::collection::btree_map(
            prop::collection::vec(any::<u8>(), 0..8),
            prop::collection::vec(any::<u8>(), 0..8),
            1..30,
        )
    ) {
        let mut forward = quiet_app();
        let mut backward = quiet_app();

        for (key, value) in &entries {
            forward.append_tx(&Transaction::set(key.clone(), value.clone()).encode());
        }
        for (key, value) in entries.iter().rev() {
            backward.append_tx(&Transaction::set(key.clone(), value.clone()).encode());
        }

        prop_assert_eq!(forward.commit(), backward.commit());
    }

    /// A stream applied to the app leaves the same contents as a plain map.
    #[test]
    fn app_matches_model(stream in arb_tx_stream(60)) {
        let mut app = quiet_app();
        let mut model: BTreeMap<Bytes, Bytes> = BTreeMap::new();

        for tx in &stream {
            prop_assert!(app.append_tx(tx).is_ok());
            match Transaction::decode(tx).unwrap() {
                Transaction::Set { key, value } => {
                    model.insert(key, value);
                }
                Transaction::Remove { key } => {
                    model.remove(&key);
                }
            }
        }

        let size = app.query(&QueryRequest::Size.encode());
        let expected_size = (model.len() as u32).to_be_bytes();
        prop_assert_eq!(size.data.as_ref(), &expected_size[..]);

        for (index, key) in model.keys().enumerate() {
            let found = app.query(&QueryRequest::GetByIndex { index: index as u64 }.encode());
            prop_assert_eq!(&found.data, key);
        }
    }

    /// Malformed buffers are refused and never touch the store.
    #[test]
    fn malformed_txs_leave_store_untouched(
        prefix in arb_tx_stream(10),
        bad in prop::collection::vec(arb_malformed_tx(), 1..10),
    ) {
        let mut app = quiet_app();
        for tx in &prefix {
            app.append_tx(tx);
        }
        let before = app.commit();
        let size_before = app.store().size();

        for tx in &bad {
            let checked = app.check_tx(tx);
            let appended = app.append_tx(tx);
            prop_assert!(!checked.is_ok());
            prop_assert_eq!(&checked, &appended);
        }

        prop_assert_eq!(app.commit(), before);
        prop_assert_eq!(app.store().size(), size_before);
    }

    /// Arbitrary bytes never panic and CheckTx always agrees with AppendTx.
    #[test]
    fn arbitrary_bytes_check_matches_append(buf in prop::collection::vec(any::<u8>(), 0..32)) {
        let mut app = quiet_app();
        let checked = app.check_tx(&buf);
        let appended = app.append_tx(&buf);
        prop_assert_eq!(&checked, &appended);
        prop_assert_eq!(appended.is_ok(), app.applied_txs() == 1);

        let _ = app.query(&buf);
    }
}
