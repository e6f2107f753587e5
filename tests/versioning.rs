//! Integration tests for version dispatch through the codec manager

#![allow(clippy::expect_used, clippy::unwrap_used, clippy::panic)]

use versioned_codec::{record, CodecError, CodecManager, LinearCodec, Poly};

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Counter {
        pub count: u32,
        pub label: String,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct CounterV2 {
        pub count: u64,
        pub label: String,
        pub tags: Vec<String>,
    }
}

fn manager() -> CodecManager {
    let manager = CodecManager::default();
    manager
        .register_codec(1, LinearCodec::default())
        .expect("register v1");
    manager
}

#[test]
fn test_example_scenario_bytes() {
    let manager = manager();
    let value = Counter {
        count: 7,
        label: "ok".to_string(),
    };

    let bytes = manager.marshal(1, &value).expect("marshal");
    assert_eq!(
        bytes,
        vec![0x00, 0x01, 0x00, 0x00, 0x00, 0x07, 0x00, 0x02, 0x6F, 0x6B]
    );
    assert_eq!(manager.size(1, &value).unwrap(), bytes.len());

    let mut decoded = Counter::default();
    let version = manager.unmarshal(&bytes, &mut decoded).expect("unmarshal");
    assert_eq!(version, 1);
    assert_eq!(decoded, value);
}

#[test]
fn test_duplicate_version_rejected() {
    let manager = manager();
    assert_eq!(
        manager.register_codec(1, LinearCodec::default()),
        Err(CodecError::DuplicateType(1))
    );
    assert_eq!(manager.versions().unwrap(), vec![1]);
}

#[test]
fn test_marshal_unknown_version() {
    let manager = manager();
    assert_eq!(
        manager.marshal(9, &Counter::default()),
        Err(CodecError::UnknownVersion(9))
    );
    assert_eq!(
        manager.size(9, &Counter::default()),
        Err(CodecError::UnknownVersion(9))
    );
}

#[test]
fn test_unmarshal_unknown_version_leaves_dest() {
    let manager = manager();
    let original = Counter {
        count: 1,
        label: "keep".into(),
    };
    let mut dest = original.clone();

    let result = manager.unmarshal(&[0x00, 0x05, 0x00, 0x00, 0x00, 0x07, 0x00, 0x00], &mut dest);
    assert_eq!(result, Err(CodecError::UnknownVersion(5)));
    assert_eq!(dest, original);
    assert_eq!(CodecManager::peek_version(&[0x00, 0x05]).unwrap(), 5);
}

#[test]
fn test_unmarshal_missing_version() {
    let manager = manager();
    let mut dest = Counter::default();
    assert_eq!(
        manager.unmarshal(&[], &mut dest),
        Err(CodecError::CantUnpackVersion)
    );
    assert_eq!(
        manager.unmarshal(&[0x00], &mut dest),
        Err(CodecError::CantUnpackVersion)
    );
}

#[test]
fn test_unmarshal_failure_leaves_dest() {
    let manager = manager();
    let original = Counter {
        count: 3,
        label: "x".into(),
    };
    let mut dest = original.clone();
    // label claims 2 bytes, only 1 present
    let result = manager.unmarshal(&[0, 1, 0, 0, 0, 9, 0, 2, b'a'], &mut dest);
    assert_eq!(
        result,
        Err(CodecError::Decode {
            version: 1,
            source: Box::new(CodecError::InsufficientLength),
        })
    );
    assert_eq!(dest, original);
}

#[test]
fn test_cant_pack_version_when_max_size_too_small() {
    let manager = CodecManager::new(1);
    manager.register_codec(1, LinearCodec::default()).unwrap();
    assert_eq!(
        manager.marshal(1, &0u8),
        Err(CodecError::CantPackVersion)
    );
}

#[test]
fn test_oversized_payload_rejected() {
    let manager = CodecManager::new(16);
    manager.register_codec(1, LinearCodec::default()).unwrap();
    let result = manager.marshal(1, &vec![0u8; 64]);
    assert!(matches!(
        result,
        Err(CodecError::MaxSizeExceeded { limit: 16, .. })
    ));
}

#[test]
fn test_multiple_versions_decode_to_their_own_shape() {
    let manager = manager();
    manager.register_codec(2, LinearCodec::default()).unwrap();
    assert_eq!(manager.versions().unwrap(), vec![1, 2]);
    assert!(manager.has_version(2).unwrap());
    assert!(!manager.has_version(3).unwrap());

    let v2 = CounterV2 {
        count: u64::MAX,
        label: "two".into(),
        tags: vec!["a".into(), "b".into()],
    };
    let bytes = manager.marshal(2, &v2).unwrap();
    assert_eq!(&bytes[..2], &[0, 2]);

    let (version, decoded): (u16, CounterV2) = manager.decode(&bytes).unwrap();
    assert_eq!(version, 2);
    assert_eq!(decoded, v2);
}

#[test]
fn test_trailing_bytes_policy() {
    let lenient = manager();
    let mut bytes = lenient.marshal(1, &Counter::default()).unwrap();
    bytes.push(0xFF);

    let mut dest = Counter::default();
    assert_eq!(lenient.unmarshal(&bytes, &mut dest), Ok(1));

    let strict = CodecManager::default().with_trailing_bytes(false);
    strict.register_codec(1, LinearCodec::default()).unwrap();
    let err = strict.unmarshal(&bytes, &mut dest).unwrap_err();
    assert_eq!(err.root(), &CodecError::TrailingBytes(1));
    assert_eq!(err.version(), Some(1));
}

#[test]
fn test_polymorphic_payload_through_manager() {
    let codec = LinearCodec::default();
    codec.register_type::<Counter>().unwrap();
    codec.register_type::<CounterV2>().unwrap();
    let manager = CodecManager::default();
    manager.register_codec(3, codec).unwrap();

    let value = vec![
        Poly::new(CounterV2::default()),
        Poly::new(Counter {
            count: 1,
            label: "poly".into(),
        }),
    ];
    let bytes = manager.marshal(3, &value).unwrap();
    assert_eq!(manager.size(3, &value).unwrap(), bytes.len());

    let mut decoded: Vec<Poly> = Vec::new();
    assert_eq!(manager.unmarshal(&bytes, &mut decoded).unwrap(), 3);
    assert_eq!(decoded, value);
    assert_eq!(
        decoded[1].downcast_ref::<Counter>().map(|c| c.label.as_str()),
        Some("poly")
    );
}

#[test]
fn test_metrics_track_calls() {
    let manager = manager();
    let bytes = manager.marshal(1, &Counter::default()).unwrap();
    let _ = manager.marshal(4, &Counter::default());
    let _ = manager.decode::<Counter>(&bytes);
    let _ = manager.decode::<Counter>(&[0]);

    let snapshot = manager.metrics().snapshot();
    assert_eq!(snapshot.marshal_total, 2);
    assert_eq!(snapshot.marshal_failed, 1);
    assert_eq!(snapshot.bytes_encoded, bytes.len() as u64);
    assert_eq!(snapshot.unmarshal_total, 2);
    assert_eq!(snapshot.unmarshal_failed, 1);
    assert_eq!(snapshot.unknown_versions, 1);
}
