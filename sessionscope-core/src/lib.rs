//! sessionscope core - shared types and trait definitions
//!
//! Defines the domain records, the read-only store traits both storage
//! backends implement, and the ambient infrastructure (errors, logging,
//! configuration, async helpers) used by the rest of the workspace.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
