// Adaptive multi-mode compression.
//
// The mode is a pure function of the declared ContentType:
//
// - Text:          `text`, fixed dictionary of short fragments
// - Binary/Image:  `delta` then `pattern` (frequency-pattern substitution)
// - Audio:         16-bit sample delta, then the binary path
//
// Every mode finishes with the `rle` pass. Decompression undoes RLE first,
// then the mode-specific stages in reverse.
//
// `decompress(compress(x, t), t) == x` holds for every input and every mode.

pub mod delta;
pub mod pattern;
pub mod rle;
pub mod text;

use thiserror::Error;

use crate::metadata::ContentType;

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Encoder-side tuning. The decoder reads everything it needs from the stream.
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// A 3..=5 byte pattern must occur more than this many times to be
    /// considered for the in-band dictionary.
    pub support_threshold: usize,
    /// Upper bound on dictionary entries (also bounded by free byte values).
    pub max_patterns: usize,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            support_threshold: 3,
            max_patterns: 64,
        }
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CompressError {
    #[error("corrupt {stage} stream at offset {offset}: {reason}")]
    CorruptStream {
        stage: &'static str,
        offset: usize,
        reason: &'static str,
    },
}

impl CompressError {
    pub(crate) fn corrupt(stage: &'static str, offset: usize, reason: &'static str) -> Self {
        Self::CorruptStream {
            stage,
            offset,
            reason,
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// Compress with default options. Never fails.
pub fn compress(data: &[u8], content_type: ContentType) -> Vec<u8> {
    compress_with_options(data, content_type, &CompressOptions::default())
}

pub fn compress_with_options(
    data: &[u8],
    content_type: ContentType,
    opts: &CompressOptions,
) -> Vec<u8> {
    let staged = match content_type {
        ContentType::Text => text::encode(data),
        ContentType::Image | ContentType::Binary => pattern::encode(&delta::encode(data), opts),
        ContentType::Audio => {
            pattern::encode(&delta::encode(&delta::encode_samples(data)), opts)
        }
    };
    let out = rle::encode(&staged);
    log::debug!(
        "compress {content_type}: {} -> {} bytes (stage output {})",
        data.len(),
        out.len(),
        staged.len()
    );
    out
}

pub fn decompress(data: &[u8], content_type: ContentType) -> Result<Vec<u8>, CompressError> {
    let staged = rle::decode(data)?;
    let out = match content_type {
        ContentType::Text => text::decode(&staged)?,
        ContentType::Image | ContentType::Binary => delta::decode(&pattern::decode(&staged)?),
        ContentType::Audio => delta::decode_samples(&delta::decode(&pattern::decode(&staged)?)),
    };
    log::debug!(
        "decompress {content_type}: {} -> {} bytes",
        data.len(),
        out.len()
    );
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
