//! Example: Evolving a payload across codec versions
//!
//! Version 1 knows `Transfer` and `Stake`. Version 2 retires `Stake` but
//! keeps later tags stable, then adds `Memo`. Payloads written by either
//! version decode through one manager.
//!
//! Run with: `cargo run --example versioned_payload`

#![allow(clippy::uninlined_format_args)]

use versioned_codec::utils::logging::init_logging;
use versioned_codec::utils::metrics::Timer;
use versioned_codec::{record, CodecConfig, CodecManager, Id, LinearCodec, Poly};

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Transfer {
        pub to: Id,
        pub amount: u64,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Stake {
        pub amount: u64,
        pub lock_days: u16,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct Memo {
        pub text: String,
    }
}

record! {
    #[derive(Debug, Clone, Default, PartialEq)]
    pub struct Batch {
        pub nonce: u32,
        pub ops: Vec<Poly>,
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CodecConfig::from_env()?;
    config.validate_strict()?;
    init_logging(&config.logging)?;

    let v1 = LinearCodec::from_config(&config);
    v1.register_type::<Transfer>()?;
    v1.register_type::<Stake>()?;

    let v2 = LinearCodec::from_config(&config);
    v2.register_type::<Transfer>()?;
    v2.skip_registrations(1)?;
    v2.register_type::<Memo>()?;

    let manager = CodecManager::from_config(&config);
    manager.register_codec(1, v1)?;
    manager.register_codec(2, v2)?;
    println!("Registered versions: {:?}", manager.versions()?);

    let old = Batch {
        nonce: 1,
        ops: vec![
            Poly::new(Transfer {
                to: Id::new([0x11; 32]),
                amount: 250,
            }),
            Poly::new(Stake {
                amount: 1_000,
                lock_days: 30,
            }),
        ],
    };
    let new = Batch {
        nonce: 2,
        ops: vec![
            Poly::new(Transfer {
                to: Id::new([0x22; 32]),
                amount: 75,
            }),
            Poly::new(Memo {
                text: "rent".to_string(),
            }),
        ],
    };

    let payloads = {
        let _timer = Timer::start("marshal_batches");
        vec![manager.marshal(1, &old)?, manager.marshal(2, &new)?]
    };

    for bytes in &payloads {
        println!("Payload ({} bytes): {}", bytes.len(), hex::encode(bytes));

        let mut decoded = Batch::default();
        let version = manager.unmarshal(bytes, &mut decoded)?;
        println!("  version {} nonce {}", version, decoded.nonce);
        for op in &decoded.ops {
            println!("    {:?}", op);
        }
    }

    // Stake was retired, so version 2 refuses to encode it
    match manager.marshal(2, &old) {
        Ok(_) => println!("Unexpectedly encoded a retired type"),
        Err(e) => println!("Version 2 rejects the old batch: {}", e),
    }

    manager.metrics().log_metrics();
    Ok(())
}
