//! Property tests for the shared state store.
//!
//! - Values survive a set/get through the databag unchanged
//! - Keys never written stay absent whether or not the store is ready
//! - Delete after set leaves the key absent

#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![deny(clippy::panic)]

use openldap_state::{DataBag, SharedState, StateValue};
use proptest::prelude::*;

fn scalar() -> impl Strategy<Value = StateValue> {
    prop_oneof![
        any::<i64>().prop_map(StateValue::Int),
        "[ -~]{0,40}".prop_map(StateValue::Str),
        any::<bool>().prop_map(StateValue::Bool),
        (-1_000_000_i32..1_000_000).prop_map(|n| StateValue::Float(f64::from(n) / 4.0)),
    ]
}

fn value() -> impl Strategy<Value = StateValue> {
    prop_oneof![
        scalar(),
        prop::collection::vec(scalar(), 0..8).prop_map(StateValue::List),
    ]
}

proptest! {
    /// Property: set followed by get returns an equal value
    #[test]
    fn prop_round_trip(key in "[a-z_]{1,16}", value in value()) {
        let mut peer = Some(DataBag::new());
        let mut state = SharedState::new(&mut peer);

        prop_assert!(state.set(&key, value.clone()).is_ok());
        let read = state.get(&key);
        prop_assert!(read.is_ok());
        prop_assert_eq!(read.ok().flatten(), Some(value));
    }

    /// Property: unwritten keys are absent before and after readiness
    #[test]
    fn prop_unwritten_keys_absent(key in "[a-z_]{1,16}") {
        let mut peer: Option<DataBag> = None;
        {
            let state = SharedState::new(&mut peer);
            prop_assert!(!state.is_ready());
            prop_assert_eq!(state.get(&key).ok().flatten(), None);
        }

        peer = Some(DataBag::new());
        let state = SharedState::new(&mut peer);
        prop_assert!(state.is_ready());
        prop_assert_eq!(state.get(&key).ok().flatten(), None);
    }

    /// Property: delete after set makes the key absent again
    #[test]
    fn prop_delete_after_set(key in "[a-z_]{1,16}", value in scalar()) {
        let mut peer = Some(DataBag::new());
        let mut state = SharedState::new(&mut peer);

        prop_assert!(state.set(&key, value).is_ok());
        prop_assert!(state.delete(&key).is_ok());
        prop_assert_eq!(state.get(&key).ok().flatten(), None);
        prop_assert!(state.delete(&key).is_ok());
    }
}

#[test]
fn test_empty_store_without_peer_relation() {
    let mut peer: Option<DataBag> = None;
    let state = SharedState::new(&mut peer);
    assert!(!state.is_ready());
    assert!(matches!(state.get("foo"), Ok(None)));
}
