#![no_main]
use libfuzzer_sys::fuzz_target;
use parhuff::{Codec, CodecConfig};

fuzz_target!(|data: &[u8]| {
    let codec = Codec::new(CodecConfig::new().with_workers(2));
    // Any outcome is fine as long as it is not a panic.
    let _ = codec.decompress_to_vec(data);
});
