//! Caller Identity
//!
//! The already-authenticated caller, as resolved by the transport layer.

use serde::{Deserialize, Serialize};

/// Who is asking, and which account-level roles they hold
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CallerIdentity {
    /// Opaque user identifier (login id)
    pub user_id: String,
    pub is_admin: bool,
    pub is_student: bool,
    pub is_instructor: bool,
}

impl CallerIdentity {
    pub fn new(user_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            is_admin: false,
            is_student: false,
            is_instructor: false,
        }
    }

    /// Caller holding the student role
    pub fn student(user_id: impl Into<String>) -> Self {
        Self {
            is_student: true,
            ..Self::new(user_id)
        }
    }

    /// Caller holding the instructor role
    pub fn instructor(user_id: impl Into<String>) -> Self {
        Self {
            is_instructor: true,
            ..Self::new(user_id)
        }
    }

    /// Caller holding the admin role
    pub fn admin(user_id: impl Into<String>) -> Self {
        Self {
            is_admin: true,
            ..Self::new(user_id)
        }
    }

    pub fn with_student(mut self, is_student: bool) -> Self {
        self.is_student = is_student;
        self
    }

    pub fn with_instructor(mut self, is_instructor: bool) -> Self {
        self.is_instructor = is_instructor;
        self
    }

    pub fn with_admin(mut self, is_admin: bool) -> Self {
        self.is_admin = is_admin;
        self
    }

    /// Create a summary string for logging
    pub fn summary(&self) -> String {
        let mut roles = Vec::new();
        if self.is_admin {
            roles.push("admin");
        }
        if self.is_instructor {
            roles.push("instructor");
        }
        if self.is_student {
            roles.push("student");
        }
        if roles.is_empty() {
            roles.push("none");
        }

        format!("Caller[user={}, roles={}]", self.user_id, roles.join("+"))
    }
}
