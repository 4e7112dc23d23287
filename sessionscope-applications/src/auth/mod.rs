//! Authorization Module
//!
//! Decides whether a caller may list sessions for a view and, optionally, a
//! course:
//! - Admins bypass every check
//! - Students and instructors need the matching account role
//! - A course-scoped request also needs a membership in that course

pub mod context;
pub mod gate;
pub mod identity;
pub mod permissions;

pub use context::AccessGrant;
pub use gate::AuthorizationGate;
pub use identity::CallerIdentity;
pub use permissions::PrivilegeSet;
