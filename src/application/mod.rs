//! Application layer - Use cases and port interfaces
//!
//! Contains the core business operations and trait definitions
//! for external system interactions.

pub mod controller;
pub mod ports;
pub mod restore;

// Re-export use cases
pub use controller::{SessionCallbacks, SessionController};
pub use restore::{restore_session, RestoredUtterance};
