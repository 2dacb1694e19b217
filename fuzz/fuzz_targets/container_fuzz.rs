#![no_main]
use hmqc::io::from_bytes;
use hmqc::metadata::MetadataHeader;
use hmqc::pipeline::{self, DecodeOptions};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let _ = MetadataHeader::decode(data);
    let _ = MetadataHeader::decode_lenient(data);

    if let Ok(stored) = from_bytes(data) {
        let corners = pipeline::module_corners(&stored.matrix);
        let _ = pipeline::read_header(&stored.matrix, &corners, &DecodeOptions::default());
    }
});
