/// Entities exchanged with the persistence layer.
pub mod models;
/// Score ledger abstraction and its backends.
pub mod score_store;
/// Backend-agnostic storage errors.
pub mod storage;
