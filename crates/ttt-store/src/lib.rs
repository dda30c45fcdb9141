//! # ttt-store
//!
//! Client-local persistence behind the `SessionStore` port.
//!
//! ## Stores
//!
//! - **File**: one JSON document per key under a storage directory,
//!   written atomically; survives restarts
//! - **Memory**: process-local, for tests and ephemeral clients
//!
//! ## Example
//!
//! ```ignore
//! use ttt_store::FileSessionStore;
//! use ttt_core::SessionStore;
//!
//! let store = FileSessionStore::new(".tictactoe");
//! store.save_session(&session).await?;
//! let restored = store.load_session().await?;
//! ```

pub mod error;
pub mod session;

pub use error::StoreError;
pub use session::{FileSessionStore, MemorySessionStore, MATCH_KEY, SESSION_KEY};
