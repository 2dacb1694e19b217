#![no_main]
use hmqc::compress::{self, CompressOptions};
use hmqc::metadata::ContentType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if data.len() < 2 {
        return;
    }

    // First byte picks the mode, second tunes the pattern dictionary.
    let ct = ContentType::ALL[(data[0] % 4) as usize];
    let opts = CompressOptions {
        support_threshold: (data[1] & 0x0F) as usize,
        max_patterns: (data[1] >> 2) as usize,
    };
    let payload = &data[2..];

    let enc = compress::compress_with_options(payload, ct, &opts);
    let dec = compress::decompress(&enc, ct).unwrap();
    assert_eq!(dec, payload);
});
