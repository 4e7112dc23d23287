//! Access Grant
//!
//! Outcome of a successful authorization. Carries what the gate already
//! resolved so later stages never repeat the lookups.

use super::CallerIdentity;
use crate::backend::CourseRef;
use sessionscope_core::{EntityType, MembershipRecord};

/// Authorization result handed from the gate to the retriever
#[derive(Clone)]
pub struct AccessGrant {
    /// The authorized caller
    pub caller: CallerIdentity,
    /// Requested view; `None` only when an admin asked for an unsupported entity type
    pub entity_type: Option<EntityType>,
    /// Requested course, as resolved by the gate
    pub course_id: Option<String>,
    /// Course resolved during the membership check (non-admin callers only)
    pub course: Option<CourseRef>,
    /// Membership found during the check (non-admin callers only)
    pub membership: Option<MembershipRecord>,
}

impl AccessGrant {
    /// Grant produced by the admin bypass; nothing has been looked up
    pub fn admin(
        caller: CallerIdentity,
        entity_type: Option<EntityType>,
        course_id: Option<String>,
    ) -> Self {
        Self {
            caller,
            entity_type,
            course_id,
            course: None,
            membership: None,
        }
    }
}

impl std::fmt::Debug for AccessGrant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessGrant")
            .field("caller", &self.caller.summary())
            .field("entity_type", &self.entity_type)
            .field("course_id", &self.course_id)
            .field("backend", &self.course.as_ref().map(|c| c.kind()))
            .field("has_membership", &self.membership.is_some())
            .finish()
    }
}
