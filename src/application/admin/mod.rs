//! Application services for the administrative surface.

pub mod audit;
pub mod snapshots;

pub use audit::AdminAuditService;
pub use snapshots::InventorySnapshotService;
