//! Persistence for the signal relay.
//!
//! - `store`: the [`ChannelStore`] collaborator with in-memory and JSON file backends
//! - `writer`: daily-rotated, append-only JSON Lines writer
//! - `journal`: trade journal built on the JSON Lines writer

pub mod error;
pub mod journal;
pub mod store;
pub mod writer;

pub use error::{PersistenceError, PersistenceResult};
pub use journal::TradeJournal;
pub use store::{ChannelStore, DynChannelStore, InMemoryChannelStore, JsonChannelStore};
pub use writer::JsonLinesWriter;
