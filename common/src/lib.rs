//! Cambio Common Types
//!
//! Shared reference types for the cambio currency module: currency codes
//! and descriptors, display formatting, and time utilities.

pub mod currency;
pub mod format;
pub mod time;

pub use currency::*;
pub use format::*;
pub use time::*;
