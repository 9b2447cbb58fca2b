//! Core domain logic for the parcel tracker.
//! This crate owns the `parcel` table contract and its status-guarded
//! mutation policy.

pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use logging::{default_log_level, init_logging, logging_status, LogConfig};
pub use model::parcel::{
    now_rfc3339, ClientId, Parcel, ParcelNumber, ParcelStatus, PARCEL_STATUS_DELIVERED,
    PARCEL_STATUS_REGISTERED, PARCEL_STATUS_SENT,
};
pub use repo::parcel_repo::{
    GuardedAction, ParcelRepository, RepoError, RepoResult, SqliteParcelStore,
};
pub use service::parcel_service::{ParcelService, ServiceError, ServiceResult};

/// Minimal health-check API for CLI wiring probes.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
