//! sessionscope applications - the feedback session listing pipeline
//!
//! Answers "which feedback sessions can this caller see, and what may they
//! do with each?" while courses are split across a legacy and a migrated
//! datastore.
//!
//! ## Architecture
//!
//! A request flows through five stages:
//! - **Authorization** ([`auth`]): role and membership checks, admin bypass
//! - **Backend selection** ([`backend`]): routes each course to its authoritative store
//! - **Retrieval** ([`sessions::retriever`]): one course, or all of the caller's courses
//! - **Shaping** ([`sessions::shaping`]): student redaction or instructor privileges
//! - **Assembly** ([`sessions::assembler`]): the ordered response body

pub mod auth;
pub mod backend;
pub mod sessions;

pub use auth::{AccessGrant, AuthorizationGate, CallerIdentity, PrivilegeSet};
pub use backend::{
    Backend, BackendSelector, CourseRef, Fixture, MemoryMigrationLedger, MemorySessionStore,
};
pub use sessions::{
    FeedbackSessionData, FeedbackSessionsData, FeedbackSessionsRequest, MembershipIndex,
    PublishStatus, SessionRetriever, SubmissionStatus,
};

use chrono::{DateTime, Utc};
use sessionscope_core::{
    log_operation_start, log_operation_success, performance, EntityType, RetrievalConfig,
    ScopeResult,
};
use std::sync::Arc;
use tracing::warn;

/// Feedback session listing service
pub struct FeedbackSessionsService {
    gate: AuthorizationGate,
    retriever: SessionRetriever,
}

/// Builder for FeedbackSessionsService
pub struct FeedbackSessionsServiceBuilder {
    selector: BackendSelector,
    retrieval: RetrievalConfig,
}

impl FeedbackSessionsServiceBuilder {
    pub fn new(selector: BackendSelector) -> Self {
        Self {
            selector,
            retrieval: RetrievalConfig::default(),
        }
    }

    /// Concurrency and timeout settings for backend calls
    pub fn with_retrieval_config(mut self, config: RetrievalConfig) -> Self {
        self.retrieval = config;
        self
    }

    pub fn build(self) -> FeedbackSessionsService {
        let selector = Arc::new(
            self.selector
                .with_timeout_ms(self.retrieval.backend_timeout_ms),
        );

        FeedbackSessionsService {
            gate: AuthorizationGate::new(selector.clone()),
            retriever: SessionRetriever::new(selector, &self.retrieval),
        }
    }
}

impl FeedbackSessionsService {
    pub fn builder(selector: BackendSelector) -> FeedbackSessionsServiceBuilder {
        FeedbackSessionsServiceBuilder::new(selector)
    }

    /// List the sessions visible to `caller`, evaluated at the current time
    pub async fn get_feedback_sessions(
        &self,
        caller: &CallerIdentity,
        request: &FeedbackSessionsRequest,
    ) -> ScopeResult<FeedbackSessionsData> {
        self.get_feedback_sessions_at(caller, request, Utc::now())
            .await
    }

    /// List the sessions visible to `caller` as of `now`.
    ///
    /// Any stage failing aborts the request; no partial response is produced.
    pub async fn get_feedback_sessions_at(
        &self,
        caller: &CallerIdentity,
        request: &FeedbackSessionsRequest,
        now: DateTime<Utc>,
    ) -> ScopeResult<FeedbackSessionsData> {
        performance::measure_async("get_feedback_sessions", async {
            log_operation_start!(
                "get_feedback_sessions",
                caller = %caller.summary(),
                entity_type = %request.entity_type,
                course_id = ?request.course_id,
                recycle_bin = request.is_in_recycle_bin
            );

            let result = self.run(caller, request, now).await;
            match &result {
                Ok(data) => {
                    log_operation_success!("get_feedback_sessions", count = data.len());
                }
                Err(err) => err.log(),
            }
            result
        })
        .await
    }

    async fn run(
        &self,
        caller: &CallerIdentity,
        request: &FeedbackSessionsRequest,
        now: DateTime<Utc>,
    ) -> ScopeResult<FeedbackSessionsData> {
        let grant = self
            .gate
            .authorize(caller, &request.entity_type, request.course_id.as_deref())
            .await?;

        let Some(entity_type) = grant.entity_type else {
            warn!(
                caller = %caller.summary(),
                entity_type = %request.entity_type,
                "Unsupported entity type for admin request, returning no sessions"
            );
            return Ok(sessions::assemble(Vec::new()));
        };

        let retrieval = self
            .retriever
            .retrieve(&grant, entity_type, request.is_in_recycle_bin)
            .await?;

        let index = match entity_type {
            EntityType::Instructor => MembershipIndex::build(retrieval.memberships)?,
            EntityType::Student => MembershipIndex::default(),
        };
        let shaped = sessions::shape(retrieval.sessions, entity_type, &index, now)?;

        Ok(sessions::assemble(shaped))
    }
}
