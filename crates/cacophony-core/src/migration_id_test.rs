use super::*;

#[test]
fn test_parse_timestamp_prefixed_id() {
    let id = MigrationId::parse("20230615021417-add-device-heartbeat").unwrap();
    assert_eq!(id.as_str(), "20230615021417-add-device-heartbeat");
    assert_eq!(id.timestamp_prefix(), "20230615021417");
}

#[test]
fn test_parse_accepts_dots_and_underscores() {
    assert!(MigrationId::parse("20190603.create_devices").is_ok());
    assert!(MigrationId::parse("20240101").is_ok());
}

#[test]
fn test_parse_rejects_empty() {
    let err = MigrationId::parse("").unwrap_err();
    assert!(err.to_string().contains("must not be empty"));
}

#[test]
fn test_parse_rejects_short_timestamp() {
    let err = MigrationId::parse("2023-add-tags").unwrap_err();
    assert!(matches!(err, CoreError::InvalidMigrationId { .. }));
    assert!(err.to_string().contains("timestamp"));
}

#[test]
fn test_parse_rejects_whitespace_and_slashes() {
    assert!(MigrationId::parse("20230101 add tags").is_err());
    assert!(MigrationId::parse("20230101/add-tags").is_err());
}

#[test]
#[should_panic(expected = "C004")]
fn test_new_panics_on_invalid() {
    let _ = MigrationId::new("not-a-migration");
}

#[test]
fn test_ordering_is_lexical() {
    let mut ids = vec![
        MigrationId::new("20240101-a"),
        MigrationId::new("20230101-b"),
        MigrationId::new("20230101-a"),
    ];
    ids.sort();
    let ordered: Vec<&str> = ids.iter().map(|i| i.as_str()).collect();
    assert_eq!(ordered, vec!["20230101-a", "20230101-b", "20240101-a"]);
}

#[test]
fn test_deserialize_validates() {
    let ok: MigrationId = serde_yaml::from_str("\"20230101-a\"").unwrap();
    assert_eq!(ok, "20230101-a");

    let err = serde_yaml::from_str::<MigrationId>("\"latest\"");
    assert!(err.is_err());
}
