//! Domain layer types and invariants.

pub mod catalog;
pub mod entities;
pub mod error;
pub mod ids;
pub mod slug;
pub mod snapshots;
