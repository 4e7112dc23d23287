//! Redaction and annotation of retrieved sessions
//!
//! Students get visible sessions only, stripped of instructor information.
//! Instructors get every session annotated with their privileges for it.

use super::types::FeedbackSessionData;
use crate::auth::PrivilegeSet;
use chrono::{DateTime, Utc};
use sessionscope_core::{invariant_error, EntityType, FeedbackSession, MembershipRecord, ScopeResult};
use std::collections::HashMap;
use tracing::debug;

const COMPONENT: &str = "session_shaping";

/// Caller memberships keyed by course, at most one per course
#[derive(Debug, Clone, Default)]
pub struct MembershipIndex {
    by_course: HashMap<String, MembershipRecord>,
}

impl MembershipIndex {
    /// Index memberships by course. Two memberships for one course is an error.
    pub fn build(memberships: impl IntoIterator<Item = MembershipRecord>) -> ScopeResult<Self> {
        let mut by_course = HashMap::new();
        for membership in memberships {
            let course_id = membership.course_id.clone();
            if by_course.insert(course_id.clone(), membership).is_some() {
                return Err(invariant_error!(
                    format!("Multiple memberships found for course {}", course_id),
                    COMPONENT
                ));
            }
        }
        Ok(Self { by_course })
    }

    pub fn get(&self, course_id: &str) -> Option<&MembershipRecord> {
        self.by_course.get(course_id)
    }
}

/// Convert and shape retrieved sessions for the requested view
pub fn shape(
    sessions: Vec<FeedbackSession>,
    entity_type: EntityType,
    index: &MembershipIndex,
    now: DateTime<Utc>,
) -> ScopeResult<Vec<FeedbackSessionData>> {
    let records = sessions
        .iter()
        .map(|session| FeedbackSessionData::from_session(session, now))
        .collect();

    match entity_type {
        EntityType::Student => Ok(shape_for_student(records)),
        EntityType::Instructor => annotate_for_instructor(records, index),
    }
}

/// Drop sessions not yet visible and redact the rest; order is preserved
pub fn shape_for_student(records: Vec<FeedbackSessionData>) -> Vec<FeedbackSessionData> {
    let total = records.len();
    let shaped: Vec<FeedbackSessionData> = records
        .into_iter()
        .filter(|record| record.is_visible)
        .map(|record| record.hide_information_for_student())
        .collect();

    debug!(
        total = total,
        visible = shaped.len(),
        "Shaped sessions for student"
    );
    shaped
}

/// Attach per-session privileges for records whose course has a membership.
///
/// Records without a matching membership are left unannotated. A record
/// that already carries privileges is rejected.
pub fn annotate_for_instructor(
    records: Vec<FeedbackSessionData>,
    index: &MembershipIndex,
) -> ScopeResult<Vec<FeedbackSessionData>> {
    records
        .into_iter()
        .map(|mut record| {
            if record.privileges.is_some() {
                return Err(invariant_error!(
                    format!(
                        "Session {} in course {} is already annotated",
                        record.feedback_session_name, record.course_id
                    ),
                    COMPONENT
                ));
            }
            record.privileges = index.get(&record.course_id).and_then(|membership| {
                PrivilegeSet::for_membership(membership, &record.feedback_session_name)
            });
            Ok(record)
        })
        .collect()
}
