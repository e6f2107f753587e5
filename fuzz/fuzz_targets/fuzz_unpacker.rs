#![no_main]

use libfuzzer_sys::fuzz_target;
use versioned_codec::Unpacker;

fuzz_target!(|data: &[u8]| {
    // Drive the raw cursor with reads chosen by the input itself
    let mut unpacker = Unpacker::new(data);
    while unpacker.remaining() > 0 && !unpacker.errored() {
        match unpacker.read_u8() % 7 {
            0 => {
                let _ = unpacker.read_u16();
            }
            1 => {
                let _ = unpacker.read_u32();
            }
            2 => {
                let _ = unpacker.read_u64();
            }
            3 => {
                let _ = unpacker.read_str();
            }
            4 => {
                let _ = unpacker.read_bytes();
            }
            5 => {
                let _ = unpacker.try_read_ip();
            }
            _ => {
                let _ = unpacker.read_bool();
            }
        }
    }
    let offset = unpacker.offset();
    assert!(offset <= data.len());
});
