//! Backend selection
//!
//! The only place that knows two backends exist. Everything downstream holds
//! a [`CourseRef`] whose [`Backend`] variant was fixed at resolution time;
//! dropping the legacy store later means deleting the `Legacy` arm here.

use sessionscope_core::{
    not_found_error, with_timeout, BackendKind, Course, EntityType, FeedbackSession,
    MembershipRecord, MigrationLedger, ScopeResult, SessionStore,
};
use std::sync::Arc;
use tracing::debug;

const DEFAULT_BACKEND_TIMEOUT_MS: u64 = 5_000;

/// Store handle that applies the per-call timeout
#[derive(Clone)]
pub struct StoreHandle {
    store: Arc<dyn SessionStore>,
    timeout_ms: u64,
}

impl StoreHandle {
    pub fn new(store: Arc<dyn SessionStore>, timeout_ms: u64) -> Self {
        Self { store, timeout_ms }
    }

    pub async fn get_course(&self, course_id: &str) -> ScopeResult<Option<Course>> {
        with_timeout(self.store.get_course(course_id), self.timeout_ms, "get_course").await
    }

    pub async fn get_membership(
        &self,
        course_id: &str,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Option<MembershipRecord>> {
        with_timeout(
            self.store.get_membership(course_id, user_id, role),
            self.timeout_ms,
            "get_membership",
        )
        .await
    }

    pub async fn list_sessions(&self, course_id: &str) -> ScopeResult<Vec<FeedbackSession>> {
        with_timeout(
            self.store.list_sessions(course_id),
            self.timeout_ms,
            "list_sessions",
        )
        .await
    }

    pub async fn list_soft_deleted_sessions(
        &self,
        course_id: &str,
    ) -> ScopeResult<Vec<FeedbackSession>> {
        with_timeout(
            self.store.list_soft_deleted_sessions(course_id),
            self.timeout_ms,
            "list_soft_deleted_sessions",
        )
        .await
    }

    pub async fn list_courses_for_caller(
        &self,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Vec<MembershipRecord>> {
        with_timeout(
            self.store.list_courses_for_caller(user_id, role),
            self.timeout_ms,
            "list_courses_for_caller",
        )
        .await
    }
}

/// Authoritative backend for a course
#[derive(Clone)]
pub enum Backend {
    Legacy(StoreHandle),
    Migrated(StoreHandle),
}

impl Backend {
    pub fn kind(&self) -> BackendKind {
        match self {
            Backend::Legacy(_) => BackendKind::Legacy,
            Backend::Migrated(_) => BackendKind::Migrated,
        }
    }

    pub fn handle(&self) -> &StoreHandle {
        match self {
            Backend::Legacy(handle) | Backend::Migrated(handle) => handle,
        }
    }
}

/// A course together with the backend resolved for it in this request
#[derive(Clone)]
pub struct CourseRef {
    course: Course,
    backend: Backend,
}

impl CourseRef {
    pub fn course_id(&self) -> &str {
        &self.course.id
    }

    pub fn course(&self) -> &Course {
        &self.course
    }

    pub fn kind(&self) -> BackendKind {
        self.backend.kind()
    }

    pub async fn membership(
        &self,
        user_id: &str,
        role: EntityType,
    ) -> ScopeResult<Option<MembershipRecord>> {
        self.backend
            .handle()
            .get_membership(&self.course.id, user_id, role)
            .await
    }

    pub async fn sessions(&self) -> ScopeResult<Vec<FeedbackSession>> {
        self.backend.handle().list_sessions(&self.course.id).await
    }

    pub async fn soft_deleted_sessions(&self) -> ScopeResult<Vec<FeedbackSession>> {
        self.backend
            .handle()
            .list_soft_deleted_sessions(&self.course.id)
            .await
    }
}

impl std::fmt::Debug for CourseRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CourseRef")
            .field("course_id", &self.course.id)
            .field("backend", &self.kind())
            .finish()
    }
}

/// Routes each course to the backend the migration ledger names
pub struct BackendSelector {
    legacy: Arc<dyn SessionStore>,
    migrated: Arc<dyn SessionStore>,
    ledger: Arc<dyn MigrationLedger>,
    timeout_ms: u64,
}

impl BackendSelector {
    pub fn new(
        legacy: Arc<dyn SessionStore>,
        migrated: Arc<dyn SessionStore>,
        ledger: Arc<dyn MigrationLedger>,
    ) -> Self {
        Self {
            legacy,
            migrated,
            ledger,
            timeout_ms: DEFAULT_BACKEND_TIMEOUT_MS,
        }
    }

    /// Set the timeout applied to every backend call
    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }

    pub fn backend(&self, kind: BackendKind) -> Backend {
        match kind {
            BackendKind::Legacy => {
                Backend::Legacy(StoreHandle::new(self.legacy.clone(), self.timeout_ms))
            }
            BackendKind::Migrated => {
                Backend::Migrated(StoreHandle::new(self.migrated.clone(), self.timeout_ms))
            }
        }
    }

    /// Both backends in enumeration order: legacy first, then migrated
    pub fn backends(&self) -> [Backend; 2] {
        [
            self.backend(BackendKind::Legacy),
            self.backend(BackendKind::Migrated),
        ]
    }

    /// Resolve the authoritative backend for a course.
    ///
    /// Fails with `NotFound` when the ledger does not know the course or the
    /// course is missing from the backend the ledger names.
    pub async fn resolve_backend(&self, course_id: &str) -> ScopeResult<CourseRef> {
        let kind = with_timeout(
            self.ledger.backend_for_course(course_id),
            self.timeout_ms,
            "backend_for_course",
        )
        .await?
        .ok_or_else(|| not_found_error!(format!("course {}", course_id), "backend_selector"))?;

        let backend = self.backend(kind);
        let course = backend
            .handle()
            .get_course(course_id)
            .await?
            .ok_or_else(|| {
                not_found_error!(
                    format!("course {} in {} backend", course_id, kind),
                    "backend_selector"
                )
            })?;

        debug!(course_id = course_id, backend = %kind, "Resolved course backend");

        Ok(CourseRef { course, backend })
    }
}
