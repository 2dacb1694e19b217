// HMQC metadata header encoding/decoding.
//
// Every encoded matrix starts its data region with a fixed 32-byte header,
// all fields big-endian u32:
//
//   0  magic            "HMQC"
//   4  version          major << 16 | minor << 8 | patch
//   8  content_type     ContentType wire code
//   12 original_size    payload length before compression
//   16 compressed_size  compressed length (pre-FEC, header excluded)
//   20 timestamp        Unix seconds at encode time
//   24 id               random instance id (non-cryptographic)
//   28 reserved         zero

use std::fmt;
use std::io::{self, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use thiserror::Error;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

pub const HMQC_MAGIC: [u8; 4] = *b"HMQC";

/// Size of the encoded header in bytes.
pub const HEADER_LEN: usize = 32;

/// Format version written by this crate.
pub const CURRENT_VERSION: Version = Version {
    major: 1,
    minor: 0,
    patch: 0,
};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum HeaderError {
    #[error("{field} of {value} bytes does not fit in 32 bits")]
    SizeOverflow { field: &'static str, value: u64 },

    #[error("bad magic: expected {:02X?}, got {found:02X?}", HMQC_MAGIC)]
    BadMagic { found: [u8; 4] },

    #[error("unknown content type code {code}")]
    UnknownContentType { code: u32 },

    #[error("header truncated: need {} bytes, got {len}", HEADER_LEN)]
    Truncated { len: usize },

    #[error("unsupported format version {found} (this build reads {})", CURRENT_VERSION)]
    UnsupportedVersion { found: Version },
}

// ---------------------------------------------------------------------------
// Content type
// ---------------------------------------------------------------------------

/// Declared payload kind. Selects the compression mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    Text,
    Image,
    Audio,
    Binary,
}

impl ContentType {
    pub const ALL: [ContentType; 4] = [Self::Text, Self::Image, Self::Audio, Self::Binary];

    /// Wire code stored in the header.
    pub fn code(self) -> u32 {
        match self {
            Self::Text => 1,
            Self::Image => 2,
            Self::Audio => 3,
            Self::Binary => 4,
        }
    }

    pub fn from_code(code: u32) -> Option<Self> {
        match code {
            1 => Some(Self::Text),
            2 => Some(Self::Image),
            3 => Some(Self::Audio),
            4 => Some(Self::Binary),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
            Self::Audio => "audio",
            Self::Binary => "binary",
        }
    }
}

impl fmt::Display for ContentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Version
// ---------------------------------------------------------------------------

/// Format version, packed into a single u32 on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Version {
    pub major: u8,
    pub minor: u8,
    pub patch: u8,
}

impl Version {
    pub fn pack(self) -> u32 {
        (self.major as u32) << 16 | (self.minor as u32) << 8 | self.patch as u32
    }

    /// The top byte is ignored.
    pub fn unpack(word: u32) -> Self {
        Self {
            major: (word >> 16) as u8,
            minor: (word >> 8) as u8,
            patch: word as u8,
        }
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

// ---------------------------------------------------------------------------
// Header
// ---------------------------------------------------------------------------

/// Parsed HMQC metadata header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataHeader {
    pub version: Version,
    pub content_type: ContentType,
    /// Payload length before compression.
    pub original_size: u32,
    /// Compressed payload length, header excluded.
    pub compressed_size: u32,
    /// Unix seconds at encode time.
    pub timestamp: u32,
    /// Random instance identifier.
    pub id: u32,
}

impl MetadataHeader {
    /// Build a header stamped with the current time and a random id.
    pub fn new(
        content_type: ContentType,
        original_size: usize,
        compressed_size: usize,
    ) -> Result<Self, HeaderError> {
        let timestamp = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs() as u32)
            .unwrap_or(0);
        Self::with_identity(
            content_type,
            original_size,
            compressed_size,
            timestamp,
            rand::random(),
        )
    }

    /// Build a header with a caller-chosen timestamp and id.
    ///
    /// Two encodes of the same payload with the same identity produce
    /// byte-identical matrices.
    pub fn with_identity(
        content_type: ContentType,
        original_size: usize,
        compressed_size: usize,
        timestamp: u32,
        id: u32,
    ) -> Result<Self, HeaderError> {
        Ok(Self {
            version: CURRENT_VERSION,
            content_type,
            original_size: fit_u32("original_size", original_size)?,
            compressed_size: fit_u32("compressed_size", compressed_size)?,
            timestamp,
            id,
        })
    }

    /// Serialize to the 32-byte wire layout.
    pub fn to_bytes(&self) -> [u8; HEADER_LEN] {
        let words = [
            u32::from_be_bytes(HMQC_MAGIC),
            self.version.pack(),
            self.content_type.code(),
            self.original_size,
            self.compressed_size,
            self.timestamp,
            self.id,
            0,
        ];
        let mut out = [0u8; HEADER_LEN];
        for (chunk, word) in out.chunks_exact_mut(4).zip(words) {
            chunk.copy_from_slice(&word.to_be_bytes());
        }
        out
    }

    /// Write the header to a writer.
    pub fn encode<W: Write>(&self, w: &mut W) -> io::Result<()> {
        w.write_all(&self.to_bytes())
    }

    /// Parse a header from the first 32 bytes of `bytes`.
    ///
    /// Validation order: length, magic, version, content type.
    pub fn decode(bytes: &[u8]) -> Result<Self, HeaderError> {
        let (header, code) = Self::decode_fields(bytes)?;
        let content_type =
            ContentType::from_code(code).ok_or(HeaderError::UnknownContentType { code })?;
        Ok(Self {
            content_type,
            ..header
        })
    }

    /// Like [`decode`](Self::decode), but an unknown content type is read
    /// as [`ContentType::Binary`]. The second value is `true` when the
    /// fallback was taken.
    pub fn decode_lenient(bytes: &[u8]) -> Result<(Self, bool), HeaderError> {
        let (header, code) = Self::decode_fields(bytes)?;
        match ContentType::from_code(code) {
            Some(content_type) => Ok((
                Self {
                    content_type,
                    ..header
                },
                false,
            )),
            None => {
                log::warn!("unknown content type code {code}, decoding as binary");
                Ok((header, true))
            }
        }
    }

    /// Header + compressed payload length.
    pub fn framed_len(&self) -> usize {
        HEADER_LEN + self.compressed_size as usize
    }

    fn decode_fields(bytes: &[u8]) -> Result<(Self, u32), HeaderError> {
        if bytes.len() < HEADER_LEN {
            return Err(HeaderError::Truncated { len: bytes.len() });
        }
        let word = |i: usize| {
            let off = i * 4;
            u32::from_be_bytes([bytes[off], bytes[off + 1], bytes[off + 2], bytes[off + 3]])
        };

        let magic = word(0).to_be_bytes();
        if magic != HMQC_MAGIC {
            return Err(HeaderError::BadMagic { found: magic });
        }

        let version = Version::unpack(word(1));
        if version.major != CURRENT_VERSION.major {
            return Err(HeaderError::UnsupportedVersion { found: version });
        }

        Ok((
            Self {
                version,
                content_type: ContentType::Binary,
                original_size: word(3),
                compressed_size: word(4),
                timestamp: word(5),
                id: word(6),
            },
            word(2),
        ))
    }
}

fn fit_u32(field: &'static str, value: usize) -> Result<u32, HeaderError> {
    u32::try_from(value).map_err(|_| HeaderError::SizeOverflow {
        field,
        value: value as u64,
    })
}

// ---------------------------------------------------------------------------
// Free-function API
// ---------------------------------------------------------------------------

/// Encode a fresh header (current time, random id) to its wire bytes.
pub fn encode_header(
    content_type: ContentType,
    original_size: usize,
    compressed_size: usize,
) -> Result<[u8; HEADER_LEN], HeaderError> {
    Ok(MetadataHeader::new(content_type, original_size, compressed_size)?.to_bytes())
}

/// Parse and validate a header.
pub fn decode_header(bytes: &[u8]) -> Result<MetadataHeader, HeaderError> {
    MetadataHeader::decode(bytes)
}

/// Parse a header, reading an unknown content type as binary.
pub fn decode_header_lenient(bytes: &[u8]) -> Result<MetadataHeader, HeaderError> {
    MetadataHeader::decode_lenient(bytes).map(|(header, _)| header)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
