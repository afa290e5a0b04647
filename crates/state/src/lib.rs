//! Peer-shared application state.
//!
//! Every unit of the application sees the same peer relation databag. This
//! crate layers a small typed key/value store on top of it:
//!
//! - [`DataBag`]: the raw string map, journaling what changed so the host can
//!   flush only the difference.
//! - [`StateValue`]: the tagged value stored under each key, encoded as JSON.
//! - [`SharedState`]: get/set/delete over a bag obtained through a
//!   [`BagResolver`], with "not ready" as a normal state rather than an error.
//!
//! # Example
//!
//! ```
//! use openldap_state::{DataBag, SharedState};
//!
//! let mut peer: Option<DataBag> = Some(DataBag::new());
//! let mut state = SharedState::new(&mut peer);
//! assert!(state.is_ready());
//!
//! state.set("answer", 42).ok();
//! assert_eq!(state.get("answer").ok().flatten(), Some(42.into()));
//! ```

pub mod bag;
pub mod error;
pub mod store;
pub mod value;

pub use bag::DataBag;
pub use error::{Error, Result};
pub use store::{BagResolver, BagResolverMut, SharedState, keys};
pub use value::StateValue;
