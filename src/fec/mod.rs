// Block-level forward error correction.
//
// The byte stream is cut into 223-byte messages (the last one zero-padded),
// each emitted as a 255-byte RS(255, 223) codeword. The true payload length
// is carried by the metadata header inside the stream, not by this layer.
//
// - `gf256`         GF(2^8) arithmetic
// - `reed_solomon`  single-codeword encode/decode
//
// Blocks are independent; with the `parallel` feature they are processed on
// rayon workers and reassembled in index order.

pub mod gf256;
pub mod reed_solomon;

use thiserror::Error;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

pub use reed_solomon::{
    K as MESSAGE_LEN, N as CODEWORD_LEN, PARITY as PARITY_LEN, T as MAX_CORRECTABLE,
};

// ---------------------------------------------------------------------------
// Errors / results
// ---------------------------------------------------------------------------

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FecError {
    #[error("codeword stream of {len} bytes is not a whole number of {}-byte codewords", CODEWORD_LEN)]
    TruncatedCodeword { len: usize },
}

/// Outcome for one codeword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockReport {
    pub index: usize,
    /// Symbols corrected (0 when uncorrectable).
    pub corrected: usize,
    pub uncorrectable: bool,
}

/// Result of decoding a codeword stream.
#[derive(Debug, Clone)]
pub struct FecOutput {
    /// Message bytes of every block, padding included. Uncorrectable blocks
    /// contribute their received (uncorrected) message bytes.
    pub data: Vec<u8>,
    /// Total symbols corrected across all blocks.
    pub corrected_errors: usize,
    /// True if any block exceeded the correction capacity.
    pub uncorrectable: bool,
    pub blocks: Vec<BlockReport>,
}

impl FecOutput {
    /// Indices of the blocks that could not be corrected.
    pub fn failed_blocks(&self) -> Vec<usize> {
        self.blocks
            .iter()
            .filter(|b| b.uncorrectable)
            .map(|b| b.index)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Encode
// ---------------------------------------------------------------------------

/// Encoded length of a `len`-byte stream.
pub fn encoded_len(len: usize) -> usize {
    len.div_ceil(MESSAGE_LEN) * CODEWORD_LEN
}

/// Number of codewords needed for a `len`-byte stream.
pub fn block_count(len: usize) -> usize {
    len.div_ceil(MESSAGE_LEN)
}

fn encode_chunk(chunk: &[u8]) -> [u8; CODEWORD_LEN] {
    let mut message = [0u8; MESSAGE_LEN];
    message[..chunk.len()].copy_from_slice(chunk);
    reed_solomon::encode_block(&message)
}

/// FEC-encode a byte stream. An empty input yields an empty stream.
pub fn encode(data: &[u8]) -> Vec<u8> {
    #[cfg(feature = "parallel")]
    let blocks: Vec<[u8; CODEWORD_LEN]> =
        data.par_chunks(MESSAGE_LEN).map(encode_chunk).collect();
    #[cfg(not(feature = "parallel"))]
    let blocks: Vec<[u8; CODEWORD_LEN]> = data.chunks(MESSAGE_LEN).map(encode_chunk).collect();

    log::debug!(
        "fec: {} bytes -> {} codewords ({} bytes)",
        data.len(),
        blocks.len(),
        blocks.len() * CODEWORD_LEN
    );
    blocks.concat()
}

// ---------------------------------------------------------------------------
// Decode
// ---------------------------------------------------------------------------

fn decode_codeword(index: usize, received: &[u8]) -> ([u8; MESSAGE_LEN], BlockReport) {
    let mut codeword = [0u8; CODEWORD_LEN];
    codeword.copy_from_slice(received);

    let report = match reed_solomon::decode_block(&mut codeword) {
        Ok(corrected) => {
            if corrected > 0 {
                log::trace!("fec: block {index}: corrected {corrected} symbols");
            }
            BlockReport {
                index,
                corrected,
                uncorrectable: false,
            }
        }
        Err(reed_solomon::Uncorrectable) => {
            log::warn!("fec: block {index}: more than {MAX_CORRECTABLE} symbol errors");
            BlockReport {
                index,
                corrected: 0,
                uncorrectable: true,
            }
        }
    };

    let mut message = [0u8; MESSAGE_LEN];
    message.copy_from_slice(&codeword[..MESSAGE_LEN]);
    (message, report)
}

/// Decode and correct a codeword stream.
pub fn decode(data: &[u8]) -> Result<FecOutput, FecError> {
    if data.len() % CODEWORD_LEN != 0 {
        return Err(FecError::TruncatedCodeword { len: data.len() });
    }

    #[cfg(feature = "parallel")]
    let results: Vec<_> = data
        .par_chunks_exact(CODEWORD_LEN)
        .enumerate()
        .map(|(i, cw)| decode_codeword(i, cw))
        .collect();
    #[cfg(not(feature = "parallel"))]
    let results: Vec<_> = data
        .chunks_exact(CODEWORD_LEN)
        .enumerate()
        .map(|(i, cw)| decode_codeword(i, cw))
        .collect();

    let mut out = FecOutput {
        data: Vec::with_capacity(results.len() * MESSAGE_LEN),
        corrected_errors: 0,
        uncorrectable: false,
        blocks: Vec::with_capacity(results.len()),
    };
    for (message, report) in results {
        out.data.extend_from_slice(&message);
        out.corrected_errors += report.corrected;
        out.uncorrectable |= report.uncorrectable;
        out.blocks.push(report);
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
