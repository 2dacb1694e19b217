#![no_main]
use hmqc::compress;
use hmqc::metadata::ContentType;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary bytes must decompress to a value or an error in every mode,
    // never a panic.
    for ct in ContentType::ALL {
        let _ = compress::decompress(data, ct);
    }
});
