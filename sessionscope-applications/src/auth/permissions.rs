//! Privilege System
//!
//! Computes the capability bundle an instructor holds for one session from
//! the privileges stored on their membership.

use serde::{Deserialize, Serialize};
use sessionscope_core::{InstructorPermission, InstructorPrivileges, MembershipRecord};

/// Per-(instructor, session) capability bundle attached to shaped records
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrivilegeSet {
    pub can_modify_course: bool,
    pub can_modify_session: bool,
    pub can_modify_student: bool,
    pub can_modify_instructor: bool,
    pub can_view_student_in_sections: bool,
    pub can_view_session_in_sections: bool,
    pub can_submit_session_in_sections: bool,
    pub can_modify_session_comments_in_sections: bool,
}

impl PrivilegeSet {
    /// Compute the privileges an instructor has for a given session.
    ///
    /// Course-wide permissions apply as stored. A session-scoped permission
    /// is also granted when any section grants it for this session; within a
    /// section a per-session entry overrides the section-wide one.
    pub fn for_session(privileges: &InstructorPrivileges, session_name: &str) -> Self {
        let allowed = |permission: InstructorPermission| {
            privileges.course_level.contains(&permission)
                || (permission.is_session_scoped()
                    && allowed_in_any_section(privileges, session_name, permission))
        };

        Self {
            can_modify_course: allowed(InstructorPermission::ModifyCourse),
            can_modify_session: allowed(InstructorPermission::ModifySession),
            can_modify_student: allowed(InstructorPermission::ModifyStudent),
            can_modify_instructor: allowed(InstructorPermission::ModifyInstructor),
            can_view_student_in_sections: allowed(InstructorPermission::ViewStudentInSections),
            can_view_session_in_sections: allowed(InstructorPermission::ViewSessionInSections),
            can_submit_session_in_sections: allowed(
                InstructorPermission::SubmitSessionInSections,
            ),
            can_modify_session_comments_in_sections: allowed(
                InstructorPermission::ModifySessionCommentsInSections,
            ),
        }
    }

    /// Privileges for a membership, `None` if it is not an instructor membership
    pub fn for_membership(membership: &MembershipRecord, session_name: &str) -> Option<Self> {
        membership
            .instructor_privileges()
            .map(|privileges| Self::for_session(&privileges, session_name))
    }
}

fn allowed_in_any_section(
    privileges: &InstructorPrivileges,
    session_name: &str,
    permission: InstructorPermission,
) -> bool {
    let mut section_names = privileges
        .section_level
        .keys()
        .chain(privileges.session_level.keys());

    section_names.any(|section| {
        match privileges
            .session_level
            .get(section)
            .and_then(|sessions| sessions.get(session_name))
        {
            Some(session_permissions) => session_permissions.contains(&permission),
            None => privileges
                .section_level
                .get(section)
                .is_some_and(|section_permissions| section_permissions.contains(&permission)),
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sessionscope_core::{InstructorRole, MembershipDetails};
    use std::collections::{BTreeMap, BTreeSet};

    fn set(permissions: &[InstructorPermission]) -> BTreeSet<InstructorPermission> {
        permissions.iter().copied().collect()
    }

    #[test]
    fn test_co_owner_has_everything() {
        let privileges = InstructorPrivileges::for_role(InstructorRole::CoOwner);
        let set = PrivilegeSet::for_session(&privileges, "Week 1");

        assert!(set.can_modify_course);
        assert!(set.can_modify_session);
        assert!(set.can_submit_session_in_sections);
        assert!(set.can_modify_session_comments_in_sections);
    }

    #[test]
    fn test_observer_is_view_only() {
        let privileges = InstructorPrivileges::for_role(InstructorRole::Observer);
        let set = PrivilegeSet::for_session(&privileges, "Week 1");

        assert!(set.can_view_session_in_sections);
        assert!(set.can_view_student_in_sections);
        assert!(!set.can_submit_session_in_sections);
        assert!(!set.can_modify_session);
    }

    #[test]
    fn test_session_override_grants_only_that_session() {
        let mut session_level = BTreeMap::new();
        session_level.insert(
            "Section A".to_string(),
            [(
                "Week 1".to_string(),
                set(&[InstructorPermission::SubmitSessionInSections]),
            )]
            .into_iter()
            .collect::<BTreeMap<_, _>>(),
        );
        let privileges = InstructorPrivileges {
            course_level: BTreeSet::new(),
            section_level: BTreeMap::new(),
            session_level,
        };

        assert!(PrivilegeSet::for_session(&privileges, "Week 1").can_submit_session_in_sections);
        assert!(!PrivilegeSet::for_session(&privileges, "Week 2").can_submit_session_in_sections);
    }

    #[test]
    fn test_session_override_takes_precedence_over_section() {
        let section_level = [(
            "Section A".to_string(),
            set(&[
                InstructorPermission::ViewSessionInSections,
                InstructorPermission::ModifySession,
            ]),
        )]
        .into_iter()
        .collect();
        let session_level = [(
            "Section A".to_string(),
            [("Week 1".to_string(), BTreeSet::new())]
                .into_iter()
                .collect::<BTreeMap<_, _>>(),
        )]
        .into_iter()
        .collect();
        let privileges = InstructorPrivileges {
            course_level: BTreeSet::new(),
            section_level,
            session_level,
        };

        let week1 = PrivilegeSet::for_session(&privileges, "Week 1");
        assert!(!week1.can_view_session_in_sections);

        let week2 = PrivilegeSet::for_session(&privileges, "Week 2");
        assert!(week2.can_view_session_in_sections);
        // Non-session permissions are never granted through sections
        assert!(!week2.can_modify_session);
    }

    #[test]
    fn test_membership_without_stored_privileges_uses_role_defaults() {
        let membership = MembershipRecord {
            course_id: "CS101".to_string(),
            user_id: "prof".to_string(),
            email: "prof@uni.edu".to_string(),
            details: MembershipDetails::Instructor {
                instructor_role: InstructorRole::Tutor,
                privileges: None,
                is_archived: false,
            },
        };

        let set = PrivilegeSet::for_membership(&membership, "Week 1").unwrap();
        assert!(set.can_submit_session_in_sections);
        assert!(!set.can_modify_session);
    }

    #[test]
    fn test_student_membership_has_no_privileges() {
        let membership = MembershipRecord {
            course_id: "CS101".to_string(),
            user_id: "alice".to_string(),
            email: "alice@uni.edu".to_string(),
            details: MembershipDetails::Student {
                section: None,
                team: None,
            },
        };

        assert!(PrivilegeSet::for_membership(&membership, "Week 1").is_none());
    }
}
