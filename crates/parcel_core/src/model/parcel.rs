//! Parcel domain model.
//!
//! # Responsibility
//! - Define the shipment record persisted in the `parcel` table.
//! - Own the status lifecycle (`registered -> sent -> delivered`).
//!
//! # Invariants
//! - `number` is assigned by storage on insert and never changes afterwards.
//! - `client` and `created_at` are immutable after creation.
//! - `address` may change only while status is `registered`.
//! - Status values outside the known set are preserved, never rejected.

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

/// Storage-assigned parcel identity.
pub type ParcelNumber = i64;

/// Opaque owning-client identifier.
pub type ClientId = i64;

pub const PARCEL_STATUS_REGISTERED: &str = "registered";
pub const PARCEL_STATUS_SENT: &str = "sent";
pub const PARCEL_STATUS_DELIVERED: &str = "delivered";

/// Shipment lifecycle state.
///
/// The set is open at the data layer: unknown persisted values round-trip
/// through `Other` unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ParcelStatus {
    /// Accepted, not yet handed to a carrier. Only state allowing edits.
    Registered,
    /// In transit.
    Sent,
    /// Handed to the recipient.
    Delivered,
    /// Any value not produced by this crate.
    Other(String),
}

impl ParcelStatus {
    /// Returns the text stored in `parcel.status`.
    pub fn as_str(&self) -> &str {
        match self {
            Self::Registered => PARCEL_STATUS_REGISTERED,
            Self::Sent => PARCEL_STATUS_SENT,
            Self::Delivered => PARCEL_STATUS_DELIVERED,
            Self::Other(value) => value.as_str(),
        }
    }

    /// Returns the following lifecycle state, if any.
    ///
    /// `delivered` and unknown values are terminal.
    pub fn next(&self) -> Option<Self> {
        match self {
            Self::Registered => Some(Self::Sent),
            Self::Sent => Some(Self::Delivered),
            Self::Delivered | Self::Other(_) => None,
        }
    }

    /// Whether address change and deletion are allowed in this state.
    pub fn allows_edit(&self) -> bool {
        self.as_str() == PARCEL_STATUS_REGISTERED
    }
}

impl Display for ParcelStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for ParcelStatus {
    fn from(value: &str) -> Self {
        match value {
            PARCEL_STATUS_REGISTERED => Self::Registered,
            PARCEL_STATUS_SENT => Self::Sent,
            PARCEL_STATUS_DELIVERED => Self::Delivered,
            other => Self::Other(other.to_string()),
        }
    }
}

impl From<String> for ParcelStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            PARCEL_STATUS_REGISTERED | PARCEL_STATUS_SENT | PARCEL_STATUS_DELIVERED => {
                Self::from(value.as_str())
            }
            _ => Self::Other(value),
        }
    }
}

impl From<ParcelStatus> for String {
    fn from(value: ParcelStatus) -> Self {
        match value {
            ParcelStatus::Other(value) => value,
            known => known.as_str().to_string(),
        }
    }
}

/// One row of the `parcel` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parcel {
    /// Zero until the parcel has been stored.
    pub number: ParcelNumber,
    pub client: ClientId,
    pub status: ParcelStatus,
    pub address: String,
    /// RFC3339 text, kept verbatim as stored.
    pub created_at: String,
}

impl Parcel {
    /// Creates an unsaved `registered` parcel stamped with the current UTC time.
    pub fn new(client: ClientId, address: impl Into<String>) -> Self {
        Self {
            number: 0,
            client,
            status: ParcelStatus::Registered,
            address: address.into(),
            created_at: now_rfc3339(),
        }
    }

    /// Whether storage has assigned this parcel a number yet.
    pub fn is_stored(&self) -> bool {
        self.number > 0
    }
}

/// Current UTC time as RFC3339 with second precision, e.g. `2024-05-01T10:00:00Z`.
pub fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)
}
