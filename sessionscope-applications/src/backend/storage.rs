//! In-memory backends
//!
//! Reference implementations of the store traits, used by the CLI fixtures
//! and by tests to stand in for either side of the migration.

use async_trait::async_trait;
use sessionscope_core::{
    BackendKind, Course, EntityType, FeedbackSession, MembershipRecord, MigrationLedger,
    ScopeResult, SessionStore,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

#[derive(Default)]
struct StoreData {
    courses: HashMap<String, Course>,
    /// Insertion order is the backend-native order
    memberships: Vec<MembershipRecord>,
    sessions: Vec<FeedbackSession>,
}

/// In-memory session store
#[derive(Default)]
pub struct MemorySessionStore {
    data: Arc<RwLock<StoreData>>,
}

impl MemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from records, keeping their order
    pub fn from_records(
        courses: Vec<Course>,
        memberships: Vec<MembershipRecord>,
        sessions: Vec<FeedbackSession>,
    ) -> Self {
        let data = StoreData {
            courses: courses
                .into_iter()
                .map(|course| (course.id.clone(), course))
                .collect(),
            memberships,
            sessions,
        };

        Self {
            data: Arc::new(RwLock::new(data)),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn get_course(&self, course_id: &str) -> ScopeResult<Option<Course>> {
        Ok(self.data.read().await.courses.get(course_id).cloned())
    }

    async fn get_membership(
        &self,
        course_id: &str,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Option<MembershipRecord>> {
        let data = self.data.read().await;
        Ok(data
            .memberships
            .iter()
            .find(|m| m.course_id == course_id && m.user_id == user_id && m.role() == role)
            .cloned())
    }

    async fn list_sessions(&self, course_id: &str) -> ScopeResult<Vec<FeedbackSession>> {
        let data = self.data.read().await;
        Ok(data
            .sessions
            .iter()
            .filter(|s| s.course_id == course_id && !s.is_soft_deleted())
            .cloned()
            .collect())
    }

    async fn list_soft_deleted_sessions(
        &self,
        course_id: &str,
    ) -> ScopeResult<Vec<FeedbackSession>> {
        let data = self.data.read().await;
        Ok(data
            .sessions
            .iter()
            .filter(|s| s.course_id == course_id && s.is_soft_deleted())
            .cloned()
            .collect())
    }

    async fn list_courses_for_caller(
        &self,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Vec<MembershipRecord>> {
        let data = self.data.read().await;
        let memberships: Vec<MembershipRecord> = data
            .memberships
            .iter()
            .filter(|m| m.user_id == user_id && m.role() == role)
            .cloned()
            .collect();

        debug!(
            user_id = user_id,
            role = %role,
            count = memberships.len(),
            "Listed memberships"
        );
        Ok(memberships)
    }
}

/// In-memory migration cutover record
#[derive(Default)]
pub struct MemoryMigrationLedger {
    cutover: Arc<RwLock<HashMap<String, BackendKind>>>,
}

impl MemoryMigrationLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_entries(entries: impl IntoIterator<Item = (String, BackendKind)>) -> Self {
        Self {
            cutover: Arc::new(RwLock::new(entries.into_iter().collect())),
        }
    }

    /// Record which backend is authoritative for a course
    pub async fn set_backend(&self, course_id: &str, kind: BackendKind) {
        self.cutover
            .write()
            .await
            .insert(course_id.to_string(), kind);
    }
}

#[async_trait]
impl MigrationLedger for MemoryMigrationLedger {
    async fn backend_for_course(&self, course_id: &str) -> ScopeResult<Option<BackendKind>> {
        Ok(self.cutover.read().await.get(course_id).copied())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};
    use sessionscope_core::{MembershipDetails, ResponseVisibility, SessionVisibility};

    fn session(name: &str, deleted: bool) -> FeedbackSession {
        let now = Utc::now();
        FeedbackSession {
            course_id: "CS101".to_string(),
            name: name.to_string(),
            instructions: String::new(),
            time_zone: "UTC".to_string(),
            start_time: now,
            end_time: now + Duration::days(1),
            grace_period_minutes: 0,
            session_visibility: SessionVisibility::FollowOpening,
            response_visibility: ResponseVisibility::Later,
            closing_email_enabled: true,
            published_email_enabled: true,
            created_at: now,
            deleted_at: deleted.then_some(now),
            student_deadlines: Default::default(),
            instructor_deadlines: Default::default(),
            viewer_email: None,
        }
    }

    #[test]
    fn test_active_and_soft_deleted_are_disjoint() {
        let store = MemorySessionStore::from_records(
            Vec::new(),
            Vec::new(),
            vec![session("A", false), session("B", true), session("C", false)],
        );

        let active = tokio_test::block_on(store.list_sessions("CS101")).unwrap();
        let deleted = tokio_test::block_on(store.list_soft_deleted_sessions("CS101")).unwrap();

        assert_eq!(
            active.iter().map(|s| s.name.as_str()).collect::<Vec<_>>(),
            vec!["A", "C"]
        );
        assert_eq!(deleted.len(), 1);
        assert_eq!(deleted[0].name, "B");
    }

    #[tokio::test]
    async fn test_membership_lookup_matches_role() {
        let store = MemorySessionStore::from_records(
            Vec::new(),
            vec![MembershipRecord {
                course_id: "CS101".to_string(),
                user_id: "ta".to_string(),
                email: "ta@uni.edu".to_string(),
                details: MembershipDetails::Student {
                    section: None,
                    team: None,
                },
            }],
            Vec::new(),
        );

        assert!(store
            .get_membership("CS101", "ta", EntityType::Student)
            .await
            .unwrap()
            .is_some());
        assert!(store
            .get_membership("CS101", "ta", EntityType::Instructor)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_ledger_updates() {
        let ledger = MemoryMigrationLedger::new();
        assert_eq!(ledger.backend_for_course("CS101").await.unwrap(), None);

        ledger.set_backend("CS101", BackendKind::Migrated).await;
        assert_eq!(
            ledger.backend_for_course("CS101").await.unwrap(),
            Some(BackendKind::Migrated)
        );
    }
}
