//! Detective Core - Core data structures and trait definitions
//!
//! Shared types, errors, configuration and logging for the Digital Detective workspace

pub mod config;
pub mod error;
pub mod logging;
pub mod traits;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tracing;
