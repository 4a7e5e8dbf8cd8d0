/// Field-level mutations and change notifications.
pub mod changes;
/// Typed record definitions.
pub mod models;
/// Storage error types shared by every backend.
pub mod storage;
/// Boundary to the external sync layer.
pub mod sync_store;
