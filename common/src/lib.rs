//! RemitFX Common Types
//!
//! This crate contains shared types used across RemitFX, including payout
//! currencies, cent rounding, rate snapshots and time helpers.

pub mod monetary;
pub mod rates;
pub mod time;

pub use monetary::*;
pub use rates::*;
pub use time::*;
