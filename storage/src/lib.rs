//! Profile persistence for Aura.
//!
//! Two [`ProfileStore`](aura_core::ProfileStore) backends:
//! [`InMemoryProfileStore`] for tests and ephemeral runs, and
//! [`SqliteProfileStore`] for the identity database.

pub mod memory;
pub mod sqlite;

pub use memory::InMemoryProfileStore;
pub use sqlite::SqliteProfileStore;
