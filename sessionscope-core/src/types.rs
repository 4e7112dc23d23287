//! Core data type definitions

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Storage backend holding a course's data during the migration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackendKind {
    Legacy,
    Migrated,
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BackendKind::Legacy => write!(f, "legacy"),
            BackendKind::Migrated => write!(f, "migrated"),
        }
    }
}

/// Role under which results are requested, and the role a membership grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    Student,
    Instructor,
}

impl std::fmt::Display for EntityType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EntityType::Student => write!(f, "STUDENT"),
            EntityType::Instructor => write!(f, "INSTRUCTOR"),
        }
    }
}

impl std::str::FromStr for EntityType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_uppercase().as_str() {
            "STUDENT" => Ok(EntityType::Student),
            "INSTRUCTOR" => Ok(EntityType::Instructor),
            _ => Err(format!("Unknown entity type: {}", s)),
        }
    }
}

/// Course as stored by either backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    pub id: String,
    pub name: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

/// Instructor roles with their default course-level permissions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructorRole {
    CoOwner,
    Manager,
    Observer,
    Tutor,
    Custom,
}

impl InstructorRole {
    /// Get default course-level permissions for this role
    pub fn default_permissions(&self) -> BTreeSet<InstructorPermission> {
        use InstructorPermission::*;

        match self {
            InstructorRole::CoOwner => InstructorPermission::all().into_iter().collect(),
            InstructorRole::Manager => InstructorPermission::all()
                .into_iter()
                .filter(|p| *p != ModifyCourse)
                .collect(),
            InstructorRole::Observer => [ViewStudentInSections, ViewSessionInSections]
                .into_iter()
                .collect(),
            InstructorRole::Tutor => [
                ViewStudentInSections,
                ViewSessionInSections,
                SubmitSessionInSections,
            ]
            .into_iter()
            .collect(),
            InstructorRole::Custom => BTreeSet::new(),
        }
    }
}

impl std::fmt::Display for InstructorRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            InstructorRole::CoOwner => write!(f, "co_owner"),
            InstructorRole::Manager => write!(f, "manager"),
            InstructorRole::Observer => write!(f, "observer"),
            InstructorRole::Tutor => write!(f, "tutor"),
            InstructorRole::Custom => write!(f, "custom"),
        }
    }
}

/// Individual capabilities an instructor may hold in a course
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InstructorPermission {
    ModifyCourse,
    ModifySession,
    ModifyStudent,
    ModifyInstructor,
    ViewStudentInSections,
    ViewSessionInSections,
    SubmitSessionInSections,
    ModifySessionCommentsInSections,
}

impl InstructorPermission {
    pub fn all() -> [InstructorPermission; 8] {
        use InstructorPermission::*;
        [
            ModifyCourse,
            ModifySession,
            ModifyStudent,
            ModifyInstructor,
            ViewStudentInSections,
            ViewSessionInSections,
            SubmitSessionInSections,
            ModifySessionCommentsInSections,
        ]
    }

    /// Whether the permission can be narrowed to a single session in a section
    pub fn is_session_scoped(&self) -> bool {
        matches!(
            self,
            InstructorPermission::ViewSessionInSections
                | InstructorPermission::SubmitSessionInSections
                | InstructorPermission::ModifySessionCommentsInSections
        )
    }
}

/// Privileges stored with an instructor membership
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct InstructorPrivileges {
    /// Permissions held across the whole course
    pub course_level: BTreeSet<InstructorPermission>,
    /// Section name -> permissions granted in that section
    pub section_level: BTreeMap<String, BTreeSet<InstructorPermission>>,
    /// Section name -> session name -> permissions for that session in that section
    pub session_level: BTreeMap<String, BTreeMap<String, BTreeSet<InstructorPermission>>>,
}

impl InstructorPrivileges {
    pub fn for_role(role: InstructorRole) -> Self {
        Self {
            course_level: role.default_permissions(),
            ..Default::default()
        }
    }
}

/// Role-specific payload of a membership record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "role", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum MembershipDetails {
    Student {
        #[serde(default)]
        section: Option<String>,
        #[serde(default)]
        team: Option<String>,
    },
    #[serde(rename_all = "camelCase")]
    Instructor {
        instructor_role: InstructorRole,
        #[serde(default)]
        privileges: Option<InstructorPrivileges>,
        #[serde(default)]
        is_archived: bool,
    },
}

/// Proof that a user belongs to a course in a given role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MembershipRecord {
    pub course_id: String,
    pub user_id: String,
    pub email: String,
    #[serde(flatten)]
    pub details: MembershipDetails,
}

impl MembershipRecord {
    pub fn role(&self) -> EntityType {
        match self.details {
            MembershipDetails::Student { .. } => EntityType::Student,
            MembershipDetails::Instructor { .. } => EntityType::Instructor,
        }
    }

    pub fn is_archived(&self) -> bool {
        matches!(
            self.details,
            MembershipDetails::Instructor {
                is_archived: true,
                ..
            }
        )
    }

    /// Stored privileges, falling back to the role defaults when none are stored
    pub fn instructor_privileges(&self) -> Option<InstructorPrivileges> {
        match &self.details {
            MembershipDetails::Instructor {
                instructor_role,
                privileges,
                ..
            } => Some(
                privileges
                    .clone()
                    .unwrap_or_else(|| InstructorPrivileges::for_role(*instructor_role)),
            ),
            MembershipDetails::Student { .. } => None,
        }
    }
}

/// When a session becomes visible to students
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum SessionVisibility {
    /// Visible as soon as submissions open
    FollowOpening,
    At(DateTime<Utc>),
}

/// When responses become visible to students
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "at", rename_all = "snake_case")]
pub enum ResponseVisibility {
    /// Published together with the session becoming visible
    FollowVisible,
    /// Only published manually, never on a schedule
    Later,
    At(DateTime<Utc>),
}

/// Feedback session as returned by a backend, before any viewer shaping
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackSession {
    pub course_id: String,
    pub name: String,
    #[serde(default)]
    pub instructions: String,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub grace_period_minutes: i64,
    pub session_visibility: SessionVisibility,
    pub response_visibility: ResponseVisibility,
    #[serde(default = "default_true")]
    pub closing_email_enabled: bool,
    #[serde(default = "default_true")]
    pub published_email_enabled: bool,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub deleted_at: Option<DateTime<Utc>>,
    /// Student email -> extended deadline
    #[serde(default)]
    pub student_deadlines: BTreeMap<String, DateTime<Utc>>,
    /// Instructor email -> extended deadline
    #[serde(default)]
    pub instructor_deadlines: BTreeMap<String, DateTime<Utc>>,
    /// Student email this copy was specialised for
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub viewer_email: Option<String>,
}

fn default_true() -> bool {
    true
}

impl FeedbackSession {
    /// Produce a copy specialised for one student.
    ///
    /// Other students' extensions and all instructor extensions are dropped
    /// and the copy remembers whose deadline applies. `self` is untouched.
    pub fn copy_for_student(&self, student_email: &str) -> Self {
        let mut copy = self.clone();
        copy.student_deadlines
            .retain(|email, _| email == student_email);
        copy.instructor_deadlines.clear();
        copy.viewer_email = Some(student_email.to_string());
        copy
    }

    pub fn visible_from(&self) -> DateTime<Utc> {
        match &self.session_visibility {
            SessionVisibility::FollowOpening => self.start_time,
            SessionVisibility::At(at) => *at,
        }
    }

    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        now >= self.visible_from()
    }

    pub fn results_visible_from(&self) -> Option<DateTime<Utc>> {
        match &self.response_visibility {
            ResponseVisibility::FollowVisible => Some(self.visible_from()),
            ResponseVisibility::Later => None,
            ResponseVisibility::At(at) => Some(*at),
        }
    }

    pub fn is_published(&self, now: DateTime<Utc>) -> bool {
        self.results_visible_from().is_some_and(|at| now >= at)
    }

    /// Deadline that applies to the viewer of this copy
    pub fn effective_deadline(&self) -> DateTime<Utc> {
        self.viewer_email
            .as_ref()
            .and_then(|email| self.student_deadlines.get(email))
            .copied()
            .unwrap_or(self.end_time)
    }

    pub fn is_opened(&self, now: DateTime<Utc>) -> bool {
        now >= self.start_time && now < self.effective_deadline()
    }

    /// End of the grace window, `None` when it lies beyond the representable range
    fn grace_end(&self) -> Option<DateTime<Utc>> {
        Duration::try_minutes(self.grace_period_minutes.max(0))
            .and_then(|grace| self.effective_deadline().checked_add_signed(grace))
    }

    pub fn is_in_grace_period(&self, now: DateTime<Utc>) -> bool {
        now >= self.effective_deadline() && self.grace_end().map_or(true, |end| now < end)
    }

    pub fn is_closed(&self, now: DateTime<Utc>) -> bool {
        self.grace_end().is_some_and(|end| now >= end)
    }

    pub fn is_soft_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}
