//! Authorization Gate
//!
//! First stage of the pipeline. Nothing is retrieved for a caller the gate
//! rejects.

use super::{AccessGrant, CallerIdentity};
use crate::backend::BackendSelector;
use sessionscope_core::{unauthorized_error, EntityType, ScopeError, ScopeResult};
use std::sync::Arc;
use tracing::{debug, warn};

const COMPONENT: &str = "authorization_gate";

pub struct AuthorizationGate {
    selector: Arc<BackendSelector>,
}

impl AuthorizationGate {
    pub fn new(selector: Arc<BackendSelector>) -> Self {
        Self { selector }
    }

    /// Authorize a request for `entity_type` sessions, optionally scoped to one course.
    ///
    /// Role checks run before any backend access. For a course-scoped
    /// request the course is resolved and the caller's membership in it is
    /// looked up; both are carried on the returned grant.
    pub async fn authorize(
        &self,
        caller: &CallerIdentity,
        entity_type: &str,
        course_id: Option<&str>,
    ) -> ScopeResult<AccessGrant> {
        if caller.is_admin {
            debug!(caller = %caller.summary(), "Admin bypass");
            return Ok(AccessGrant::admin(
                caller.clone(),
                entity_type.parse().ok(),
                course_id.map(str::to_string),
            ));
        }

        let entity = entity_type
            .parse::<EntityType>()
            .map_err(|_| deny(caller, "entity type not supported.".to_string()))?;

        let has_role = match entity {
            EntityType::Student => caller.is_student,
            EntityType::Instructor => caller.is_instructor,
        };
        if !has_role {
            return Err(deny(
                caller,
                format!(
                    "User {} does not have {} privileges",
                    caller.user_id,
                    entity.to_string().to_lowercase()
                ),
            ));
        }

        let Some(course_id) = course_id else {
            return Ok(AccessGrant {
                caller: caller.clone(),
                entity_type: Some(entity),
                course_id: None,
                course: None,
                membership: None,
            });
        };

        let course = self.selector.resolve_backend(course_id).await?;
        let membership = course
            .membership(&caller.user_id, entity)
            .await?
            .ok_or_else(|| {
                deny(
                    caller,
                    format!("Course {} is not accessible to {}", course_id, caller.user_id),
                )
            })?;

        debug!(
            caller = %caller.summary(),
            course_id = course_id,
            backend = %course.kind(),
            "Caller authorized for course"
        );

        Ok(AccessGrant {
            caller: caller.clone(),
            entity_type: Some(entity),
            course_id: Some(course_id.to_string()),
            course: Some(course),
            membership: Some(membership),
        })
    }
}

fn deny(caller: &CallerIdentity, message: String) -> ScopeError {
    warn!(caller = %caller.summary(), reason = %message, "Access denied");
    unauthorized_error!(message, COMPONENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{MemoryMigrationLedger, MemorySessionStore};
    use sessionscope_core::{BackendKind, Course, ErrorSurface, MembershipDetails, MembershipRecord};

    fn gate() -> AuthorizationGate {
        let legacy = MemorySessionStore::from_records(
            vec![Course {
                id: "CS101".to_string(),
                name: "Intro".to_string(),
                time_zone: "UTC".to_string(),
            }],
            vec![MembershipRecord {
                course_id: "CS101".to_string(),
                user_id: "alice".to_string(),
                email: "alice@uni.edu".to_string(),
                details: MembershipDetails::Student {
                    section: None,
                    team: None,
                },
            }],
            Vec::new(),
        );
        let ledger =
            MemoryMigrationLedger::from_entries([("CS101".to_string(), BackendKind::Legacy)]);
        let selector = BackendSelector::new(
            Arc::new(legacy),
            Arc::new(MemorySessionStore::new()),
            Arc::new(ledger),
        );
        AuthorizationGate::new(Arc::new(selector))
    }

    #[tokio::test]
    async fn test_unknown_entity_type_denied() {
        let err = gate()
            .authorize(&CallerIdentity::student("alice"), "TA", None)
            .await
            .unwrap_err();
        assert_eq!(err.surface(), ErrorSurface::AccessDenied);
        assert!(err.to_string().contains("entity type not supported"));
    }

    #[tokio::test]
    async fn test_missing_role_denied() {
        let err = gate()
            .authorize(&CallerIdentity::instructor("alice"), "STUDENT", None)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("does not have student privileges"));
    }

    #[tokio::test]
    async fn test_course_membership_carried_on_grant() {
        let grant = gate()
            .authorize(&CallerIdentity::student("alice"), "student", Some("CS101"))
            .await
            .unwrap();

        assert_eq!(grant.entity_type, Some(EntityType::Student));
        assert_eq!(grant.course.unwrap().kind(), BackendKind::Legacy);
        assert_eq!(grant.membership.unwrap().email, "alice@uni.edu");
    }

    #[tokio::test]
    async fn test_non_member_denied() {
        let err = gate()
            .authorize(&CallerIdentity::student("bob"), "STUDENT", Some("CS101"))
            .await
            .unwrap_err();
        assert_eq!(err.surface(), ErrorSurface::AccessDenied);
    }

    #[tokio::test]
    async fn test_admin_bypass_keeps_unsupported_entity_type() {
        let grant = gate()
            .authorize(&CallerIdentity::admin("root"), "GUEST", Some("NOPE"))
            .await
            .unwrap();

        assert!(grant.entity_type.is_none());
        assert!(grant.course.is_none());
        assert_eq!(grant.course_id.as_deref(), Some("NOPE"));
    }
}
