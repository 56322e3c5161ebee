//! # Configuration Module
//!
//! Centralizes the constants that define taproot's on-disk geometry and
//! runtime sizing. Values that depend on each other live side by side and
//! are guarded by compile-time assertions so a change to one cannot
//! silently invalidate another.

pub mod constants;
pub use constants::*;
