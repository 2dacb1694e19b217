// `.hmx` matrix container and file-level helpers.
//
// Container layout (all integers big-endian):
//
//   magic      "HMX1"
//   flags      u8   (ContainerFlags)
//   depth      u8   (ModuleDepth::code)
//   module_px  u16  rendering hint, pixels per module edge
//   side       u32
//   modules    side*side x u32
//   adler32    u32  over everything above, present iff CHECKSUM
//
// `encode_file()` and `decode_file()` wrap the pipeline with buffered file
// I/O. SHA-256 digests of the payload are computed when the `file-io`
// feature is enabled.

use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use bitflags::bitflags;
use thiserror::Error;

#[cfg(feature = "file-io")]
use sha2::Digest;

use crate::error::Result;
use crate::matrix::{LayoutError, MAX_SIDE, MIN_SIDE, Matrix, ModuleDepth};
use crate::metadata::ContentType;
use crate::pipeline::{self, DecodeOptions, EncodeOptions, NoProgress};

pub const HMX_MAGIC: [u8; 4] = *b"HMX1";
pub const CONTAINER_HEADER_LEN: usize = 12;
const CHECKSUM_LEN: usize = 4;

const BUF_SIZE: usize = 64 * 1024; // 64 KiB

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ContainerFlags: u8 {
        /// An Adler-32 trailer follows the module data.
        const CHECKSUM = 0b0000_0001;
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ContainerError {
    #[error("bad container magic: expected {:02X?}, got {found:02X?}", HMX_MAGIC)]
    BadMagic { found: [u8; 4] },

    #[error("container truncated: need {needed} bytes, got {len}")]
    Truncated { needed: usize, len: usize },

    #[error("{extra} unexpected bytes after container data")]
    TrailingBytes { extra: usize },

    #[error("unknown container flags {bits:#04X}")]
    UnknownFlags { bits: u8 },

    #[error("container checksum mismatch: stored {stored:#010X}, computed {computed:#010X}")]
    ChecksumMismatch { stored: u32, computed: u32 },
}

// ---------------------------------------------------------------------------
// Options / stats
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContainerOptions {
    pub module_px: u16,
    pub checksum: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        Self {
            module_px: 4,
            checksum: true,
        }
    }
}

/// A matrix read back from a container.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredMatrix {
    pub matrix: Matrix,
    pub module_px: u16,
    pub flags: ContainerFlags,
}

/// Statistics returned by `encode_file()`.
#[derive(Debug, Clone)]
pub struct EncodeStats {
    /// Payload file size in bytes.
    pub input_size: u64,
    /// Container file size in bytes.
    pub container_size: u64,
    /// Compressed payload size, header excluded.
    pub compressed_size: u64,
    pub codewords: u64,
    pub side: usize,
    pub depth: ModuleDepth,
    /// SHA-256 of the payload (if `file-io` feature is enabled).
    pub input_sha256: Option<[u8; 32]>,
}

/// Statistics returned by `decode_file()`.
#[derive(Debug, Clone)]
pub struct DecodeStats {
    /// Container file size in bytes.
    pub container_size: u64,
    /// Recovered payload size in bytes.
    pub output_size: u64,
    pub content_type: ContentType,
    pub corrected_errors: usize,
    pub side: usize,
    /// SHA-256 of the recovered payload (if `file-io` feature is enabled).
    pub output_sha256: Option<[u8; 32]>,
}

// ---------------------------------------------------------------------------
// Adler-32
// ---------------------------------------------------------------------------

fn compute_adler32(data: &[u8]) -> u32 {
    #[cfg(feature = "adler32")]
    {
        let mut hasher = simd_adler32::Adler32::new();
        hasher.write(data);
        hasher.finish()
    }
    #[cfg(not(feature = "adler32"))]
    {
        const MOD_ADLER: u32 = 65521;
        let mut a: u32 = 1;
        let mut b: u32 = 0;
        for chunk in data.chunks(5552) {
            for &byte in chunk {
                a += u32::from(byte);
                b += a;
            }
            a %= MOD_ADLER;
            b %= MOD_ADLER;
        }
        (b << 16) | a
    }
}

#[cfg(feature = "file-io")]
fn sha256(data: &[u8]) -> Option<[u8; 32]> {
    Some(sha2::Sha256::digest(data).into())
}

#[cfg(not(feature = "file-io"))]
fn sha256(_data: &[u8]) -> Option<[u8; 32]> {
    None
}

// ---------------------------------------------------------------------------
// Container codec
// ---------------------------------------------------------------------------

/// Serialize a matrix into container bytes.
pub fn to_bytes(matrix: &Matrix, opts: &ContainerOptions) -> Vec<u8> {
    let mut flags = ContainerFlags::empty();
    flags.set(ContainerFlags::CHECKSUM, opts.checksum);

    let body = matrix.modules().len() * 4;
    let mut out = Vec::with_capacity(CONTAINER_HEADER_LEN + body + CHECKSUM_LEN);
    out.extend_from_slice(&HMX_MAGIC);
    out.push(flags.bits());
    out.push(matrix.depth().code());
    out.extend_from_slice(&opts.module_px.to_be_bytes());
    out.extend_from_slice(&(matrix.side() as u32).to_be_bytes());
    for &module in matrix.modules() {
        out.extend_from_slice(&module.to_be_bytes());
    }
    if opts.checksum {
        let sum = compute_adler32(&out);
        out.extend_from_slice(&sum.to_be_bytes());
    }
    out
}

/// Parse container bytes.
pub fn from_bytes(bytes: &[u8]) -> Result<StoredMatrix> {
    let truncated = |needed| ContainerError::Truncated {
        needed,
        len: bytes.len(),
    };
    if bytes.len() < CONTAINER_HEADER_LEN {
        return Err(truncated(CONTAINER_HEADER_LEN).into());
    }

    let found = [bytes[0], bytes[1], bytes[2], bytes[3]];
    if found != HMX_MAGIC {
        return Err(ContainerError::BadMagic { found }.into());
    }
    let flags = ContainerFlags::from_bits(bytes[4])
        .ok_or(ContainerError::UnknownFlags { bits: bytes[4] })?;
    let depth = ModuleDepth::from_code(bytes[5])?;
    let module_px = u16::from_be_bytes([bytes[6], bytes[7]]);
    let side = u32::from_be_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]) as usize;
    if !(MIN_SIDE..=MAX_SIDE).contains(&side) {
        return Err(LayoutError::SideOutOfRange { side }.into());
    }

    let data_end = CONTAINER_HEADER_LEN + side * side * 4;
    let checksum_len = if flags.contains(ContainerFlags::CHECKSUM) {
        CHECKSUM_LEN
    } else {
        0
    };
    let needed = data_end + checksum_len;
    if bytes.len() < needed {
        return Err(truncated(needed).into());
    }
    if bytes.len() > needed {
        return Err(ContainerError::TrailingBytes {
            extra: bytes.len() - needed,
        }
        .into());
    }

    if checksum_len > 0 {
        let t = &bytes[data_end..needed];
        let stored = u32::from_be_bytes([t[0], t[1], t[2], t[3]]);
        let computed = compute_adler32(&bytes[..data_end]);
        if stored != computed {
            return Err(ContainerError::ChecksumMismatch { stored, computed }.into());
        }
    }

    let modules = bytes[CONTAINER_HEADER_LEN..data_end]
        .chunks_exact(4)
        .map(|c| u32::from_be_bytes([c[0], c[1], c[2], c[3]]))
        .collect();
    let matrix = Matrix::from_modules(side, depth, modules)?;
    Ok(StoredMatrix {
        matrix,
        module_px,
        flags,
    })
}

pub fn write_matrix<W: Write>(w: &mut W, matrix: &Matrix, opts: &ContainerOptions) -> Result<u64> {
    let bytes = to_bytes(matrix, opts);
    w.write_all(&bytes)?;
    Ok(bytes.len() as u64)
}

pub fn read_matrix<R: Read>(r: &mut R) -> Result<StoredMatrix> {
    let mut bytes = Vec::new();
    r.read_to_end(&mut bytes)?;
    from_bytes(&bytes)
}

pub fn save_matrix(path: &Path, matrix: &Matrix, opts: &ContainerOptions) -> Result<u64> {
    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(path)?);
    let written = write_matrix(&mut writer, matrix, opts)?;
    writer.flush()?;
    Ok(written)
}

pub fn load_matrix(path: &Path) -> Result<StoredMatrix> {
    let mut reader = BufReader::with_capacity(BUF_SIZE, File::open(path)?);
    read_matrix(&mut reader)
}

// ---------------------------------------------------------------------------
// encode_file / decode_file
// ---------------------------------------------------------------------------

/// Encode the file at `input_path` into a container at `output_path`.
pub fn encode_file(
    input_path: &Path,
    output_path: &Path,
    content_type: ContentType,
    opts: &EncodeOptions,
    container: &ContainerOptions,
) -> Result<EncodeStats> {
    let payload = std::fs::read(input_path)?;
    let encoded = pipeline::encode_with(&payload, content_type, opts, &mut NoProgress)?;
    let container_size = save_matrix(output_path, &encoded.matrix, container)?;

    Ok(EncodeStats {
        input_size: payload.len() as u64,
        container_size,
        compressed_size: encoded.stats.compressed_size as u64,
        codewords: encoded.stats.codewords as u64,
        side: encoded.stats.side,
        depth: encoded.matrix.depth(),
        input_sha256: sha256(&payload),
    })
}

/// Decode the container at `input_path`, writing the payload to `output_path`.
pub fn decode_file(
    input_path: &Path,
    output_path: &Path,
    opts: &DecodeOptions,
) -> Result<DecodeStats> {
    let container_size = std::fs::metadata(input_path)?.len();
    let stored = load_matrix(input_path)?;
    let corners = pipeline::module_corners(&stored.matrix);
    let decoded = pipeline::decode_with(&stored.matrix, &corners, opts, &mut NoProgress)?;

    let mut writer = BufWriter::with_capacity(BUF_SIZE, File::create(output_path)?);
    writer.write_all(&decoded.payload)?;
    writer.flush()?;

    Ok(DecodeStats {
        container_size,
        output_size: decoded.payload.len() as u64,
        content_type: decoded.content_type,
        corrected_errors: decoded.corrected_errors,
        side: stored.matrix.side(),
        output_sha256: sha256(&decoded.payload),
    })
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
