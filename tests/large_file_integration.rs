use hmqc::io::{ContainerOptions, decode_file, encode_file, load_matrix};
use hmqc::{ContentType, DecodeOptions, EncodeOptions, ModuleDepth};
use tempfile::NamedTempFile;

fn generate_data(size: usize, seed: u64) -> Vec<u8> {
    let mut state = seed;
    let mut data = Vec::with_capacity(size);
    for _ in 0..size {
        state = state
            .wrapping_mul(6364136223846793005)
            .wrapping_add(1442695040888963407);
        data.push((state >> 33) as u8);
    }
    data
}

fn file_roundtrip(payload: &[u8], ct: ContentType, opts: &EncodeOptions) -> usize {
    let input = NamedTempFile::new().unwrap();
    let container = NamedTempFile::new().unwrap();
    let output = NamedTempFile::new().unwrap();
    std::fs::write(input.path(), payload).unwrap();

    let enc = encode_file(
        input.path(),
        container.path(),
        ct,
        opts,
        &ContainerOptions::default(),
    )
    .unwrap();
    assert_eq!(enc.input_size, payload.len() as u64);
    assert_eq!(
        enc.container_size,
        std::fs::metadata(container.path()).unwrap().len()
    );

    let dec = decode_file(container.path(), output.path(), &DecodeOptions::default()).unwrap();
    assert_eq!(dec.output_size, payload.len() as u64);
    assert_eq!(dec.content_type, ct);
    assert_eq!(dec.corrected_errors, 0);
    assert_eq!(dec.output_sha256, enc.input_sha256);
    assert_eq!(std::fs::read(output.path()).unwrap(), payload);
    enc.side
}

#[test]
fn megabyte_binary_file_roundtrip() {
    let payload = generate_data(1024 * 1024, 11);
    let side = file_roundtrip(&payload, ContentType::Binary, &EncodeOptions::default());
    // Incompressible: about 1.2 MB of codewords in 4-byte modules.
    assert!((540..600).contains(&side), "side={side}");
}

#[test]
fn megabyte_text_file_shrinks_matrix() {
    let payload = b"there and then the weather in the evening turned ".repeat(20_000);
    let side = file_roundtrip(&payload, ContentType::Text, &EncodeOptions::default());
    let raw_side = hmqc::matrix::required_side(
        hmqc::fec::encoded_len(payload.len() + 32),
        ModuleDepth::Color32,
    )
    .unwrap();
    assert!(side < raw_side, "side={side} raw={raw_side}");
}

#[test]
fn reduced_depth_file_roundtrip() {
    let payload = generate_data(64 * 1024, 12);
    let opts = EncodeOptions {
        depth: ModuleDepth::Reduced(1),
        ..EncodeOptions::default()
    };
    file_roundtrip(&payload, ContentType::Image, &opts);
}

#[test]
#[ignore = "tens of megabytes of matrix data; opt-in due runtime and memory"]
fn near_capacity_file_roundtrip() {
    // Close to the largest payload a 4096-module matrix can carry.
    let payload = generate_data(55 * 1024 * 1024, 13);
    let side = file_roundtrip(&payload, ContentType::Binary, &EncodeOptions::default());
    assert!(side > 3800, "side={side}");
}

#[test]
fn small_file_uses_minimum_side() {
    let input = NamedTempFile::new().unwrap();
    let container = NamedTempFile::new().unwrap();
    std::fs::write(input.path(), b"small").unwrap();
    encode_file(
        input.path(),
        container.path(),
        ContentType::Text,
        &EncodeOptions::default(),
        &ContainerOptions::default(),
    )
    .unwrap();
    let stored = load_matrix(container.path()).unwrap();
    assert_eq!(stored.matrix.side(), 256);
    assert_eq!(stored.module_px, 4);
}
