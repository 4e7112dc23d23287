//! JSON fixtures describing both backends and the cutover ledger

use super::{BackendSelector, MemoryMigrationLedger, MemorySessionStore};
use serde::{Deserialize, Serialize};
use sessionscope_core::{
    BackendKind, Course, ErrorContext, FeedbackSession, MembershipRecord, ScopeError, ScopeResult,
};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// Records held by one backend
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendFixture {
    pub courses: Vec<Course>,
    pub memberships: Vec<MembershipRecord>,
    pub sessions: Vec<FeedbackSession>,
}

impl BackendFixture {
    fn into_store(self) -> MemorySessionStore {
        MemorySessionStore::from_records(self.courses, self.memberships, self.sessions)
    }
}

/// Both backends plus the course -> backend cutover record
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Fixture {
    pub legacy: BackendFixture,
    pub migrated: BackendFixture,
    pub cutover: BTreeMap<String, BackendKind>,
}

impl Fixture {
    pub fn from_file<P: AsRef<Path>>(path: P) -> ScopeResult<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ScopeError::Config {
            message: format!("Failed to read fixture {}: {}", path.display(), e),
            source: Some(Box::new(e)),
            context: ErrorContext::new("fixture").with_operation("read_file"),
        })?;

        let fixture = Self::from_json(&content)?;
        info!(
            path = %path.display(),
            courses = fixture.cutover.len(),
            "Loaded fixture"
        );
        Ok(fixture)
    }

    pub fn from_json(content: &str) -> ScopeResult<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Build in-memory stores and a selector routed by the cutover record
    pub fn into_selector(self) -> BackendSelector {
        let ledger = MemoryMigrationLedger::from_entries(self.cutover);
        BackendSelector::new(
            Arc::new(self.legacy.into_store()),
            Arc::new(self.migrated.into_store()),
            Arc::new(ledger),
        )
    }
}
