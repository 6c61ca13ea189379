//! HTTP request handlers organized by domain
//!
//! Each submodule contains handlers for a specific API area.

pub mod analyze;
pub mod export;
pub mod health;
pub mod sample;

// Re-export all handlers for use in router
pub use analyze::*;
pub use export::*;
pub use health::*;
pub use sample::*;
