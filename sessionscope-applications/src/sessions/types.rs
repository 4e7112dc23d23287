//! Request and response types for session listing

use crate::auth::PrivilegeSet;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sessionscope_core::{FeedbackSession, ResponseVisibility, SessionVisibility};
use std::collections::BTreeMap;

/// Parameters of a listing request
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSessionsRequest {
    /// Requested view, `STUDENT` or `INSTRUCTOR`; validated by the gate
    pub entity_type: String,
    #[serde(default)]
    pub course_id: Option<String>,
    /// List soft-deleted sessions instead; instructor listings across courses only
    #[serde(default)]
    pub is_in_recycle_bin: bool,
}

impl FeedbackSessionsRequest {
    pub fn new(entity_type: impl Into<String>) -> Self {
        Self {
            entity_type: entity_type.into(),
            course_id: None,
            is_in_recycle_bin: false,
        }
    }

    pub fn for_course(mut self, course_id: impl Into<String>) -> Self {
        self.course_id = Some(course_id.into());
        self
    }

    pub fn in_recycle_bin(mut self, is_in_recycle_bin: bool) -> Self {
        self.is_in_recycle_bin = is_in_recycle_bin;
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SubmissionStatus {
    NotVisible,
    VisibleNotOpen,
    Open,
    GracePeriod,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PublishStatus {
    Published,
    NotPublished,
}

/// Settings only instructors get to see
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorOnlyFields {
    pub grace_period_minutes: i64,
    pub session_visibility: SessionVisibility,
    pub response_visibility: ResponseVisibility,
    pub session_visible_from: DateTime<Utc>,
    pub results_visible_from: Option<DateTime<Utc>>,
    pub closing_email_enabled: bool,
    pub published_email_enabled: bool,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Outward-facing session record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSessionData {
    pub course_id: String,
    pub feedback_session_name: String,
    pub instructions: String,
    pub time_zone: String,
    pub submission_start_time: DateTime<Utc>,
    /// Deadline that applies to the viewer
    pub submission_end_time: DateTime<Utc>,
    pub submission_status: SubmissionStatus,
    pub publish_status: PublishStatus,
    pub is_visible: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub instructor_only: Option<InstructorOnlyFields>,
    #[serde(default)]
    pub student_deadlines: BTreeMap<String, DateTime<Utc>>,
    #[serde(default)]
    pub instructor_deadlines: BTreeMap<String, DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub privileges: Option<PrivilegeSet>,
    /// Student the record was specialised for; never serialized
    #[serde(skip)]
    pub viewer_email: Option<String>,
}

impl FeedbackSessionData {
    /// Convert a backend record, computing statuses as of `now`
    pub fn from_session(session: &FeedbackSession, now: DateTime<Utc>) -> Self {
        Self {
            course_id: session.course_id.clone(),
            feedback_session_name: session.name.clone(),
            instructions: session.instructions.clone(),
            time_zone: session.time_zone.clone(),
            submission_start_time: session.start_time,
            submission_end_time: session.effective_deadline(),
            submission_status: submission_status(session, now),
            publish_status: if session.is_published(now) {
                PublishStatus::Published
            } else {
                PublishStatus::NotPublished
            },
            is_visible: session.is_visible(now),
            instructor_only: Some(InstructorOnlyFields {
                grace_period_minutes: session.grace_period_minutes,
                session_visibility: session.session_visibility.clone(),
                response_visibility: session.response_visibility.clone(),
                session_visible_from: session.visible_from(),
                results_visible_from: session.results_visible_from(),
                closing_email_enabled: session.closing_email_enabled,
                published_email_enabled: session.published_email_enabled,
                created_at: session.created_at,
                deleted_at: session.deleted_at,
            }),
            student_deadlines: session.student_deadlines.clone(),
            instructor_deadlines: session.instructor_deadlines.clone(),
            privileges: None,
            viewer_email: session.viewer_email.clone(),
        }
    }

    /// Copy with instructor-only information removed.
    ///
    /// Only the viewer's own extension survives; without a known viewer all
    /// extensions are dropped. Applying it twice gives the same record.
    pub fn hide_information_for_student(&self) -> Self {
        let mut redacted = self.clone();
        redacted.instructor_only = None;
        redacted.instructor_deadlines.clear();
        redacted.privileges = None;
        match &self.viewer_email {
            Some(email) => redacted.student_deadlines.retain(|e, _| e == email),
            None => redacted.student_deadlines.clear(),
        }
        redacted
    }

    pub fn is_redacted_for_student(&self) -> bool {
        self.instructor_only.is_none()
            && self.instructor_deadlines.is_empty()
            && self.privileges.is_none()
            && self
                .student_deadlines
                .keys()
                .all(|email| Some(email) == self.viewer_email.as_ref())
    }
}

fn submission_status(session: &FeedbackSession, now: DateTime<Utc>) -> SubmissionStatus {
    if !session.is_visible(now) {
        SubmissionStatus::NotVisible
    } else if now < session.start_time {
        SubmissionStatus::VisibleNotOpen
    } else if session.is_opened(now) {
        SubmissionStatus::Open
    } else if session.is_closed(now) {
        SubmissionStatus::Closed
    } else {
        SubmissionStatus::GracePeriod
    }
}

/// Response body of a listing request
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSessionsData {
    pub feedback_sessions: Vec<FeedbackSessionData>,
}

impl FeedbackSessionsData {
    pub fn len(&self) -> usize {
        self.feedback_sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.feedback_sessions.is_empty()
    }

    pub fn names(&self) -> Vec<&str> {
        self.feedback_sessions
            .iter()
            .map(|s| s.feedback_session_name.as_str())
            .collect()
    }
}
