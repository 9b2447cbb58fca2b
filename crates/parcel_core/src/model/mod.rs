//! Parcel tracking domain model.
//!
//! # Responsibility
//! - Define data structures shared by the store, service and CLI layers.
//!
//! # Invariants
//! - Every stored parcel is identified by a storage-assigned `ParcelNumber`.
//! - Deletion is a hard delete, gated on `registered` status.

pub mod parcel;
