#![no_main]
use libfuzzer_sys::fuzz_target;
use parhuff::{Codec, CodecConfig};

fuzz_target!(|data: (Vec<u8>, u8, u16)| {
    let (input, workers, interval) = data;
    let config = CodecConfig::new()
        .with_workers(workers as usize % 8 + 1)
        .with_checkpoint_interval(interval as usize);
    let codec = Codec::new(config);

    let packed = match codec.compress_to_vec(&input) {
        Ok(packed) => packed,
        Err(_) => return,
    };
    let restored = codec.decompress_to_vec(&packed).unwrap();
    assert_eq!(input, restored);
});
