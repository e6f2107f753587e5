#![no_main]

use libfuzzer_sys::fuzz_target;
use std::sync::OnceLock;
use versioned_codec::{record, CodecManager, LinearCodec, Poly};

record! {
    #[derive(Debug, Clone, PartialEq)]
    struct Item {
        id: u32,
        name: String,
        tags: Vec<String>,
        nested: Vec<Poly>,
    }
}

fn manager() -> &'static CodecManager {
    static MANAGER: OnceLock<CodecManager> = OnceLock::new();
    MANAGER.get_or_init(|| {
        let codec = LinearCodec::new(1024);
        let _ = codec.register_type::<Item>();
        let _ = codec.register_type::<u64>();
        let manager = CodecManager::default();
        let _ = manager.register_codec(0, codec);
        manager
    })
}

fuzz_target!(|data: &[u8]| {
    // Malformed payloads must fail cleanly; accepted ones must re-encode to their predicted size
    if let Ok((version, value)) = manager().decode::<Vec<Poly>>(data) {
        if let Ok(bytes) = manager().marshal(version, &value) {
            assert_eq!(manager().size(version, &value).ok(), Some(bytes.len()));
        }
    }
});
