//! Session retrieval
//!
//! Two shapes: a single course the gate already resolved, or every course
//! the caller belongs to, enumerated over both backends and fetched
//! concurrently.

use super::shaping::MembershipIndex;
use crate::auth::AccessGrant;
use crate::backend::{BackendSelector, CourseRef};
use sessionscope_core::{
    invariant_error, try_join_ordered, EntityType, FeedbackSession, MembershipRecord,
    RetrievalConfig, ScopeError, ScopeResult,
};
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "session_retriever";

/// Sessions fetched for a request together with the memberships that scoped them
#[derive(Debug, Clone, Default)]
pub struct Retrieval {
    pub sessions: Vec<FeedbackSession>,
    pub memberships: Vec<MembershipRecord>,
}

pub struct SessionRetriever {
    selector: Arc<BackendSelector>,
    max_concurrent_courses: usize,
}

impl SessionRetriever {
    pub fn new(selector: Arc<BackendSelector>, config: &RetrievalConfig) -> Self {
        Self {
            selector,
            max_concurrent_courses: config.max_concurrent_courses,
        }
    }

    /// Fetch the raw sessions an authorized request covers
    pub async fn retrieve(
        &self,
        grant: &AccessGrant,
        entity_type: EntityType,
        is_in_recycle_bin: bool,
    ) -> ScopeResult<Retrieval> {
        match grant.course_id.as_deref() {
            Some(course_id) => self.retrieve_for_course(grant, course_id, entity_type).await,
            None => {
                self.retrieve_across_courses(&grant.caller.user_id, entity_type, is_in_recycle_bin)
                    .await
            }
        }
    }

    async fn retrieve_for_course(
        &self,
        grant: &AccessGrant,
        course_id: &str,
        entity_type: EntityType,
    ) -> ScopeResult<Retrieval> {
        let course = match &grant.course {
            Some(course) => course.clone(),
            None => self.selector.resolve_backend(course_id).await?,
        };
        let sessions = course.sessions().await?;

        debug!(
            course_id = course_id,
            backend = %course.kind(),
            count = sessions.len(),
            "Retrieved course sessions"
        );

        match entity_type {
            EntityType::Student => {
                if sessions.is_empty() {
                    return Ok(Retrieval::default());
                }
                let membership = self
                    .caller_membership(grant, &course, entity_type)
                    .await?
                    .ok_or_else(|| {
                        invariant_error!(
                            format!(
                                "No student record for {} in course {}",
                                grant.caller.user_id, course_id
                            ),
                            COMPONENT
                        )
                    })?;

                let sessions = sessions
                    .iter()
                    .map(|session| session.copy_for_student(&membership.email))
                    .collect();
                Ok(Retrieval {
                    sessions,
                    memberships: vec![membership],
                })
            }
            EntityType::Instructor => {
                let membership = self.caller_membership(grant, &course, entity_type).await?;
                Ok(Retrieval {
                    sessions,
                    memberships: membership.into_iter().collect(),
                })
            }
        }
    }

    /// Membership found by the gate, or looked up now for callers it skipped
    async fn caller_membership(
        &self,
        grant: &AccessGrant,
        course: &CourseRef,
        entity_type: EntityType,
    ) -> ScopeResult<Option<MembershipRecord>> {
        match &grant.membership {
            Some(membership) => Ok(Some(membership.clone())),
            None => course.membership(&grant.caller.user_id, entity_type).await,
        }
    }

    async fn retrieve_across_courses(
        &self,
        user_id: &str,
        entity_type: EntityType,
        is_in_recycle_bin: bool,
    ) -> ScopeResult<Retrieval> {
        let enumerated = self.enumerate_memberships(user_id, entity_type).await?;
        let memberships: Vec<MembershipRecord> =
            enumerated.iter().map(|(_, m)| m.clone()).collect();
        if entity_type == EntityType::Student {
            MembershipIndex::build(memberships.clone())?;
        }

        let per_course = try_join_ordered(
            enumerated,
            self.max_concurrent_courses,
            |(course, membership)| async move {
                let sessions: Vec<FeedbackSession> = match entity_type {
                    EntityType::Student => course
                        .sessions()
                        .await?
                        .iter()
                        .map(|session| session.copy_for_student(&membership.email))
                        .collect(),
                    EntityType::Instructor if is_in_recycle_bin => {
                        course.soft_deleted_sessions().await?
                    }
                    EntityType::Instructor => course.sessions().await?,
                };
                debug!(
                    course_id = course.course_id(),
                    backend = %course.kind(),
                    count = sessions.len(),
                    "Retrieved course sessions"
                );
                Ok::<_, ScopeError>(sessions)
            },
        )
        .await?;

        Ok(Retrieval {
            sessions: per_course.into_iter().flatten().collect(),
            memberships,
        })
    }

    /// Memberships of the caller in every course, legacy backend first.
    ///
    /// A membership only counts when the backend that listed it is the one
    /// authoritative for its course. Archived instructor memberships are skipped.
    async fn enumerate_memberships(
        &self,
        user_id: &str,
        entity_type: EntityType,
    ) -> ScopeResult<Vec<(CourseRef, MembershipRecord)>> {
        let mut enumerated = Vec::new();

        for backend in self.selector.backends() {
            let listed = backend
                .handle()
                .list_courses_for_caller(user_id, entity_type)
                .await?;

            for membership in listed {
                if membership.is_archived() {
                    debug!(course_id = %membership.course_id, "Skipping archived course");
                    continue;
                }

                let course = self.selector.resolve_backend(&membership.course_id).await?;
                if course.kind() != backend.kind() {
                    debug!(
                        course_id = %membership.course_id,
                        listed_by = %backend.kind(),
                        authoritative = %course.kind(),
                        "Skipping stale membership"
                    );
                    continue;
                }

                enumerated.push((course, membership));
            }
        }

        debug!(
            user_id = user_id,
            courses = enumerated.len(),
            "Enumerated caller courses"
        );
        Ok(enumerated)
    }
}
