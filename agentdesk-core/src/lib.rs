//! agentdesk Core - shared data structures, errors, configuration and logging
//!
//! Every other crate in the workspace builds on the types defined here.

pub mod config;
pub mod error;
pub mod logging;
pub mod types;

pub use config::*;
pub use error::*;
pub use logging::*;
pub use types::*;

// Re-export commonly used external types
pub use tracing;
