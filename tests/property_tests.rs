use parhuff::container::{checkpoint_count, Header};
use parhuff::{Codec, CodecConfig, CodeTable, CodeTree, CorruptKind, Error, Histogram, SliceBuffer};
use proptest::prelude::*;

fn codec(workers: usize, interval: usize) -> Codec {
    Codec::new(
        CodecConfig::new()
            .with_workers(workers)
            .with_block_align(16)
            .with_checkpoint_interval(interval),
    )
}

/// Stream size from the header layout plus a direct sum of code lengths.
fn expected_len(input: &[u8], interval: usize) -> usize {
    let histogram = Histogram::of(input);
    let table = CodeTable::derive(&CodeTree::build(&histogram)).unwrap();
    let bits: u64 = input.iter().map(|&b| table.len_of(b) as u64).sum();
    Header::encoded_len_for(histogram.distinct(), checkpoint_count(input.len(), interval))
        + bits.div_ceil(8) as usize
}

#[test]
fn test_roundtrip_edge_inputs() {
    let all_bytes: Vec<u8> = (0..=255u8).collect();
    let cases: Vec<Vec<u8>> = vec![Vec::new(), vec![0x41; 1000], vec![0; 3], all_bytes];
    let c = codec(4, 64);
    for input in cases {
        let packed = c.compress_to_vec(&input).unwrap();
        assert_eq!(c.decompress_to_vec(&packed).unwrap(), input);
    }
}

#[test]
fn test_skewed_input_shrinks() {
    let mut input = vec![0x41u8; 1_000_000];
    for (i, b) in input.iter_mut().enumerate().filter(|(i, _)| i % 100 == 0) {
        *b = (i / 100 % 7) as u8;
    }
    let c = Codec::default();
    let packed = c.compress_to_vec(&input).unwrap();
    assert!(packed.len() < input.len());
    assert_eq!(c.decompress_to_vec(&packed).unwrap(), input);
}

#[test]
fn test_free_functions_use_default_codec() {
    let input = b"the quick brown fox jumps over the lazy dog".to_vec();
    let mut packed = vec![0u8; 4096];
    let written = parhuff::compress(&input, &mut packed).unwrap();
    packed.truncate(written as usize);

    let mut out = Vec::new();
    assert_eq!(parhuff::decompress(&packed, &mut out).unwrap(), input.len() as u64);
    assert_eq!(out, input);
}

#[test]
fn test_decompress_into_caller_storage() {
    let input = b"mississippi".to_vec();
    let packed = codec(2, 0).compress_to_vec(&input).unwrap();
    let mut storage = [0xFFu8; 32];
    let mut out = SliceBuffer::new(&mut storage);
    assert_eq!(codec(2, 0).decompress(&packed, &mut out).unwrap(), 11);
    assert_eq!(parhuff::ByteBuffer::as_slice(&out), &input[..]);
}

#[test]
fn test_truncated_stream_is_corrupt() {
    let input: Vec<u8> = (0..2000u32).map(|i| (i % 13) as u8).collect();
    let c = codec(3, 256);
    let packed = c.compress_to_vec(&input).unwrap();
    for cut in [1, packed.len() / 2, packed.len() - 1] {
        let err = c.decompress_to_vec(&packed[..packed.len() - cut]).unwrap_err();
        assert!(matches!(err, Error::CorruptStream(_)), "cut {}: {:?}", cut, err);
    }
}

#[test]
fn test_bad_magic() {
    let mut packed = codec(1, 0).compress_to_vec(b"abc").unwrap();
    packed[0] = b'X';
    assert_eq!(
        codec(1, 0).decompress_to_vec(&packed).unwrap_err().corrupt_kind(),
        Some(CorruptKind::BadMagic)
    );
}

proptest! {
    #[test]
    fn prop_roundtrip(
        input in prop::collection::vec(any::<u8>(), 0..4000),
        workers in 1usize..6,
        interval in prop_oneof![Just(0usize), 1usize..600],
    ) {
        let c = codec(workers, interval);
        let packed = c.compress_to_vec(&input).unwrap();
        prop_assert_eq!(packed.len(), expected_len(&input, interval));
        prop_assert_eq!(c.decompress_to_vec(&packed).unwrap(), input);
    }

    #[test]
    fn prop_output_independent_of_workers(
        input in prop::collection::vec(0u8..20, 0..3000),
        workers in 2usize..9,
    ) {
        let one = codec(1, 128).compress_to_vec(&input).unwrap();
        let many = codec(workers, 128).compress_to_vec(&input).unwrap();
        prop_assert_eq!(&one, &many);
        prop_assert_eq!(one, codec(workers, 128).compress_to_vec(&input).unwrap());
    }

    #[test]
    fn prop_truncation_never_decodes(
        input in prop::collection::vec(any::<u8>(), 1..1000),
        cut in 1usize..64,
    ) {
        let c = codec(2, 100);
        let packed = c.compress_to_vec(&input).unwrap();
        let keep = packed.len().saturating_sub(cut);
        prop_assert!(c.decompress_to_vec(&packed[..keep]).is_err());
    }
}
