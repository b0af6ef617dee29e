//! Tests for serializable queue configuration.

use pushable::{Pushable, PushableConfig, PushableError, PushableV};

#[test]
fn defaults() {
    let config = PushableConfig::default();
    assert!(config.object_mode);
    assert_eq!(config.high_water_mark, None);
    assert_eq!(config.page_capacity, 16);
}

#[test]
fn deserializes_with_defaults() {
    let config: PushableConfig = serde_json::from_str("{}").unwrap();
    assert_eq!(config, PushableConfig::default());

    let config: PushableConfig =
        serde_json::from_str(r#"{"object_mode": false, "high_water_mark": 1024}"#).unwrap();
    assert!(!config.object_mode);
    assert_eq!(config.high_water_mark, Some(1024));
    assert_eq!(config.page_capacity, 16);
}

#[test]
fn serializes_all_fields() {
    let config = PushableConfig::new().high_water_mark(8).page_capacity(64);
    let json = serde_json::to_value(&config).unwrap();

    assert_eq!(json["object_mode"], true);
    assert_eq!(json["high_water_mark"], 8);
    assert_eq!(json["page_capacity"], 64);
}

#[test]
fn byte_mode_config_needs_a_measure() {
    let config = PushableConfig::new().object_mode(false);

    let err = Pushable::<Vec<u8>>::builder()
        .config(&config)
        .build()
        .unwrap_err();
    assert!(matches!(err, PushableError::Configuration(_)));

    // measure installed before or after the config
    assert!(
        Pushable::<Vec<u8>>::builder()
            .byte_mode()
            .config(&config)
            .build()
            .is_ok()
    );
    assert!(
        Pushable::<Vec<u8>>::builder()
            .config(&config)
            .byte_mode()
            .build()
            .is_ok()
    );
}

#[tokio::test]
async fn byte_mode_config_measures_bytes() {
    let config = PushableConfig::new().object_mode(false);
    let source = Pushable::<String>::builder()
        .config(&config)
        .byte_mode()
        .build()
        .unwrap();

    let _ = source.push("abcd".to_string());
    assert_eq!(source.readable_length(), 4);
}

#[test]
fn object_mode_config_overrides_byte_mode() {
    let config = PushableConfig::new();
    let source = Pushable::<Vec<u8>>::builder()
        .byte_mode()
        .config(&config)
        .build()
        .unwrap();

    let _ = source.try_push(vec![1, 2, 3]);
    assert_eq!(source.readable_length(), 1);
}

#[test]
fn invalid_page_capacity_is_rejected() {
    let config = PushableConfig::new().page_capacity(10);

    let err = Pushable::<u32>::builder().config(&config).build().unwrap_err();
    assert!(matches!(err, PushableError::Configuration(_)));

    let err = PushableV::<u32>::builder()
        .page_capacity(0)
        .build_vectored()
        .unwrap_err();
    assert!(matches!(err, PushableError::Configuration(_)));
}

#[tokio::test]
async fn small_pages_still_deliver_everything() {
    let source = Pushable::builder().page_capacity(1).build().unwrap();
    for n in 0..100 {
        let _ = source.push(n);
    }
    let _ = source.end();

    let mut received = Vec::new();
    while let Some(n) = source.next().await.unwrap() {
        received.push(n);
    }
    assert_eq!(received, (0..100).collect::<Vec<_>>());
}
