//! Services
//!
//! Business logic of the bridge.

pub mod bridge;
