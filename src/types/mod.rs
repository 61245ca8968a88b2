//! Core types used throughout the library.

pub mod config;
pub mod dialog;
pub mod event;
pub mod streaming;

// Re-export commonly used types
pub use config::*;
pub use dialog::*;
pub use event::*;
pub use streaming::*;
