#![no_main]

use bitmap_compression::{CompressionType, MAX_BLOCK_COUNT, compress, decompress};
use libfuzzer_sys::fuzz_target;

/// Verifies that the decoder safely handles arbitrary, potentially malformed input.
///
/// # Invariant
/// The decoder must return either `Ok(_)` or `Err(_)`. It must **never** panic,
/// regardless of the input data.
fn verify_decompression_robustness(data: &[u8]) {
    let mut output = vec![0u32; MAX_BLOCK_COUNT];
    let _ = decompress(data, &mut output);
}

/// Verifies the lossless round trip for both compression types.
///
/// The fuzz input is reinterpreted as little-endian 32-bit words, truncated to
/// the header's block limit.
///
/// # Panics
/// Panics if the decoded bitmap does not match the input or the decoder
/// rejects a stream the encoder produced.
fn verify_round_trip(data: &[u8]) {
    let words: Vec<u32> = data
        .chunks_exact(4)
        .take(MAX_BLOCK_COUNT)
        .map(|c| u32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect();

    for compression_type in [CompressionType::None, CompressionType::Default] {
        let mut compressed = Vec::new();
        if let Err(e) = compress(compression_type, &words, &mut compressed) {
            panic!("Compression failed: {e:?}\nWords: {}", words.len());
        }

        let mut decompressed = vec![0u32; words.len()];
        match decompress(&compressed, &mut decompressed) {
            Ok(len) => {
                if len != words.len() || decompressed != words {
                    panic!(
                        "Round-trip mismatch!\nWords: {}\nCompressed len: {}\nDecoded len: {}",
                        words.len(),
                        compressed.len(),
                        len
                    );
                }
            }
            Err(e) => {
                panic!(
                    "Round-trip failed! Decoder rejected valid compressed data.\nError: {:?}\nWords: {}",
                    e,
                    words.len()
                );
            }
        }
    }
}

fuzz_target!(|data: &[u8]| {
    // 1. Robustness: Ensure random noise doesn't crash the decoder.
    verify_decompression_robustness(data);

    // 2. Correctness: Ensure valid bitmaps survive a compress-decompress cycle.
    verify_round_trip(data);
});
