//! Shared test fixtures for the Aura workspace.
//!
//! - Capability profiles and pages covering the common scenarios
//! - Scripted phase replies and a provider builder for orchestrator tests
//! - A throwaway SQLite database for profile store tests

mod fixtures;

pub use fixtures::*;
use std::sync::atomic::{AtomicU32, Ordering};
use tempfile::TempDir;

static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

pub fn unique_id(prefix: &str) -> String {
    let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}", prefix, id)
}

pub fn unique_aura_id() -> String {
    unique_id("test-aura")
}

/// SQLite database file living in a temporary directory.
///
/// The directory and the database are removed when the fixture drops.
pub struct SqliteFixture {
    #[allow(dead_code)]
    dir: TempDir,
    url: String
}

impl SqliteFixture {
    pub fn url(&self) -> &str {
        &self.url
    }
}

pub fn sqlite() -> std::io::Result<SqliteFixture> {
    let dir = tempfile::tempdir()?;
    let path = dir.path().join(format!("{}.db", unique_id("aura")));
    let url = format!("sqlite://{}?mode=rwc", path.display());
    tracing::debug!("SQLite fixture at {}", url);
    Ok(SqliteFixture { dir, url })
}
