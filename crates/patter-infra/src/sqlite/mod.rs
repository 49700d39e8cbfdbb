//! SQLite persistence layer.
//!
//! Split reader/writer pool plus repository implementations of the core
//! store traits. All repositories follow the same pattern: raw queries,
//! private Row structs for SQLite-to-domain mapping, reads on the reader
//! pool and writes on the single-connection writer pool.

pub mod conversation;
pub mod domain;
pub mod pool;

pub use conversation::SqliteConversationStore;
pub use domain::SqliteDomainLookup;
pub use pool::{DatabasePool, default_database_url};
