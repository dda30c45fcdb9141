//! Ports implemented by infrastructure crates

mod session_store;

pub use session_store::{SessionStore, StoreResult};
