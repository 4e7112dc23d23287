//! Core trait definitions
//!
//! The pipeline only ever reads through these traits; neither backend's
//! internals leak past them.

use crate::error::ScopeResult;
use crate::types::*;
use async_trait::async_trait;

/// Read operations the pipeline needs from a storage backend
///
/// Implementations report their own failures as `ScopeError::RetrievalFailure`.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Load a course by ID
    async fn get_course(&self, course_id: &str) -> ScopeResult<Option<Course>>;

    /// Membership of a user in a course for the given role
    async fn get_membership(
        &self,
        course_id: &str,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Option<MembershipRecord>>;

    /// Active (not soft-deleted) sessions of a course, in backend order
    async fn list_sessions(&self, course_id: &str) -> ScopeResult<Vec<FeedbackSession>>;

    /// Soft-deleted sessions of a course, in backend order
    async fn list_soft_deleted_sessions(
        &self,
        course_id: &str,
    ) -> ScopeResult<Vec<FeedbackSession>>;

    /// Every membership this backend holds for a user in the given role
    async fn list_courses_for_caller(
        &self,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Vec<MembershipRecord>>;
}

/// Migration cutover record kept by the persistence layer
#[async_trait]
pub trait MigrationLedger: Send + Sync {
    /// Backend that is authoritative for a course, or `None` for an unknown course
    async fn backend_for_course(&self, course_id: &str) -> ScopeResult<Option<BackendKind>>;
}
