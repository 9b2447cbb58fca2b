use chrono::DateTime;
use parcel_core::{Parcel, ParcelStatus, PARCEL_STATUS_DELIVERED, PARCEL_STATUS_REGISTERED};

#[test]
fn new_parcel_is_registered_and_unsaved() {
    let parcel = Parcel::new(1000, "test");

    assert_eq!(parcel.number, 0);
    assert!(!parcel.is_stored());
    assert_eq!(parcel.client, 1000);
    assert_eq!(parcel.status, ParcelStatus::Registered);
    assert_eq!(parcel.address, "test");
    assert!(DateTime::parse_from_rfc3339(&parcel.created_at).is_ok());
    assert!(parcel.created_at.ends_with('Z'));
}

#[test]
fn status_text_matches_storage_constants() {
    assert_eq!(ParcelStatus::Registered.as_str(), PARCEL_STATUS_REGISTERED);
    assert_eq!(ParcelStatus::Delivered.as_str(), PARCEL_STATUS_DELIVERED);
    assert_eq!(ParcelStatus::from("sent"), ParcelStatus::Sent);
    assert_eq!(
        ParcelStatus::from("returned".to_string()),
        ParcelStatus::Other("returned".to_string())
    );
}

#[test]
fn lifecycle_has_two_steps() {
    assert_eq!(ParcelStatus::Registered.next(), Some(ParcelStatus::Sent));
    assert_eq!(ParcelStatus::Sent.next(), Some(ParcelStatus::Delivered));
    assert_eq!(ParcelStatus::Delivered.next(), None);
    assert_eq!(ParcelStatus::from("returned").next(), None);
}

#[test]
fn only_registered_allows_edit() {
    assert!(ParcelStatus::Registered.allows_edit());
    assert!(!ParcelStatus::Sent.allows_edit());
    assert!(!ParcelStatus::Delivered.allows_edit());
    assert!(!ParcelStatus::from("returned").allows_edit());
}

#[test]
fn parcel_serializes_status_as_plain_string() {
    let mut parcel = Parcel::new(5, "Main st. 1");
    parcel.number = 12;
    parcel.created_at = "2024-05-01T10:00:00Z".to_string();

    let value = serde_json::to_value(&parcel).unwrap();
    assert_eq!(value["number"], 12);
    assert_eq!(value["status"], "registered");
    assert_eq!(value["created_at"], "2024-05-01T10:00:00Z");

    let decoded: Parcel = serde_json::from_value(value).unwrap();
    assert_eq!(decoded, parcel);
}

#[test]
fn unknown_status_survives_json() {
    let json = r#"{"number":3,"client":9,"status":"lost","address":"x","created_at":"2024-05-01T10:00:00Z"}"#;

    let parcel: Parcel = serde_json::from_str(json).unwrap();
    assert_eq!(parcel.status, ParcelStatus::Other("lost".to_string()));
    assert_eq!(serde_json::to_string(&parcel).unwrap(), json);
}
