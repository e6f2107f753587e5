//! Concurrent use of one manager from many tasks

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::sync::Arc;
use tokio::task::JoinSet;
use versioned_codec::{record, CodecError, CodecManager, LinearCodec, Poly};

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Heartbeat {
        pub node: u32,
        pub seq: u64,
        pub payload: Vec<u8>,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Leave {
        pub node: u32,
    }
}

fn shared_manager() -> Arc<CodecManager> {
    let manager = CodecManager::default();
    for version in 0..4u16 {
        let codec = LinearCodec::default();
        codec.register_type::<Heartbeat>().unwrap();
        codec.register_type::<Leave>().unwrap();
        manager.register_codec(version, codec).unwrap();
    }
    Arc::new(manager)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 8)]
async fn concurrent_marshal_unmarshal_heavy() {
    let iterations = 2_000u64;
    let payload_sizes = [0usize, 16, 256, 4096];
    let manager = shared_manager();

    let mut tasks = JoinSet::new();
    for (node, &size) in payload_sizes.iter().enumerate() {
        let manager = Arc::clone(&manager);
        tasks.spawn(async move {
            let version = node as u16;
            for seq in 0..iterations {
                let value = Heartbeat {
                    node: node as u32,
                    seq,
                    payload: vec![(seq & 0xFF) as u8; size],
                };
                let bytes = manager.marshal(version, &value).unwrap();
                let mut decoded = Heartbeat::default();
                assert_eq!(manager.unmarshal(&bytes, &mut decoded).unwrap(), version);
                assert_eq!(decoded, value);
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    let snapshot = manager.metrics().snapshot();
    let expected = iterations * payload_sizes.len() as u64;
    assert_eq!(snapshot.marshal_total, expected);
    assert_eq!(snapshot.unmarshal_total, expected);
    assert_eq!(snapshot.marshal_failed, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_polymorphic_values() {
    let manager = shared_manager();

    let mut tasks = JoinSet::new();
    for node in 0..16u32 {
        let manager = Arc::clone(&manager);
        tasks.spawn(async move {
            let items = vec![
                Poly::new(Leave { node }),
                Poly::new(Heartbeat {
                    node,
                    seq: u64::from(node),
                    payload: Vec::new(),
                }),
            ];
            for _ in 0..500 {
                let bytes = manager.marshal(3, &items).unwrap();
                let (version, decoded): (u16, Vec<Poly>) = manager.decode(&bytes).unwrap();
                assert_eq!(version, 3);
                assert_eq!(decoded, items);
            }
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn registration_races_with_lookups() {
    let manager = Arc::new(CodecManager::default());
    manager.register_codec(0, LinearCodec::default()).unwrap();

    let mut tasks = JoinSet::new();
    for version in 1..=32u16 {
        let manager = Arc::clone(&manager);
        tasks.spawn(async move {
            manager.register_codec(version, LinearCodec::default()).unwrap();
            let bytes = manager.marshal(0, &u32::from(version)).unwrap();
            let (_, value): (u16, u32) = manager.decode(&bytes).unwrap();
            assert_eq!(value, u32::from(version));
        });
    }

    while let Some(res) = tasks.join_next().await {
        res.unwrap();
    }

    assert_eq!(manager.versions().unwrap().len(), 33);
    assert_eq!(
        manager.register_codec(7, LinearCodec::default()),
        Err(CodecError::DuplicateType(7))
    );
}
