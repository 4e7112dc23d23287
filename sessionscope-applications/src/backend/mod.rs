//! Backend Module
//!
//! Course-to-backend routing during the datastore migration, plus the
//! in-memory stores and fixture loader used by the CLI and tests.

pub mod fixture;
pub mod selector;
pub mod storage;

pub use fixture::{BackendFixture, Fixture};
pub use selector::{Backend, BackendSelector, CourseRef, StoreHandle};
pub use storage::{MemoryMigrationLedger, MemorySessionStore};
