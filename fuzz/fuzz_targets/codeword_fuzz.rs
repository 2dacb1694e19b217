#![no_main]
use hmqc::fec;
use hmqc::pipeline::{self, DecodeOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Raw streams through the whole decode path.
    let lenient = DecodeOptions {
        unknown_type_as_binary: true,
    };
    let _ = pipeline::decode_codewords(data, &DecodeOptions::default());
    let _ = pipeline::decode_codewords(data, &lenient);

    // Re-protected garbage: the header check and decompression see
    // arbitrary but correctable content.
    let stream = fec::encode(data);
    let _ = pipeline::decode_codewords(&stream, &lenient);
});
