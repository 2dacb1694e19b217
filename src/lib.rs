//! HMQC: resilient 2D matrix codes for arbitrary payloads.
//!
//! A payload is compressed with a mode chosen by its content type, framed
//! by a 32-byte metadata header, protected with RS(255, 223) codewords and
//! laid out in a square module matrix with four corner finder markers.
//!
//! The crate provides:
//! - Metadata header codec (`metadata`)
//! - Content-aware compression (`compress`)
//! - Reed-Solomon forward error correction (`fec`)
//! - Matrix layout, geometry and a reference rasterizer (`matrix`)
//! - End-to-end encode/decode (`pipeline`)
//! - The `.hmx` container and file helpers (`io`)
//! - An optional CLI (`cli` feature)
//!
//! # Quick Start
//!
//! ```
//! use hmqc::{ContentType, decode, encode_auto, module_corners};
//!
//! let matrix = encode_auto(b"a cat", ContentType::Text).unwrap();
//! let decoded = decode(&matrix, &module_corners(&matrix)).unwrap();
//! assert_eq!(decoded.payload, b"a cat");
//! assert_eq!(decoded.corrected_errors, 0);
//! ```

pub mod compress;
pub mod error;
pub mod fec;
pub mod io;
pub mod matrix;
pub mod metadata;
pub mod pipeline;

#[cfg(feature = "cli")]
pub mod cli;

pub use error::{Error, Result};
pub use matrix::{Matrix, ModuleDepth, Point};
pub use metadata::{ContentType, MetadataHeader};
pub use pipeline::{
    DecodeOptions, Decoded, EncodeOptions, Encoded, NoProgress, ProgressEvent, ProgressSink,
    Stage, decode, decode_with, encode, encode_auto, encode_with, module_corners,
};
