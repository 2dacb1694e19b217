// Run-length pass applied after every compression mode.
//
// Runs of more than three identical bytes become a 3-byte record
// (RLE_SENTINEL, count, value). A literal sentinel byte is always written as
// a record (count >= 1) so the decoder never mistakes data for a record.

use super::CompressError;

pub const RLE_SENTINEL: u8 = 0xA5;

/// Shortest run replaced by a record.
pub const MIN_RUN: usize = 4;

/// Longest run a single record can carry.
const MAX_RUN: usize = u8::MAX as usize;

/// Length of the run of `byte` at the start of `data`, capped at `MAX_RUN`.
#[inline]
fn run_length(data: &[u8], byte: u8) -> usize {
    data.iter()
        .take(MAX_RUN)
        .take_while(|&&b| b == byte)
        .count()
}

pub fn encode(data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(data.len() + data.len() / 64 + 4);
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        let run = run_length(&data[i..], byte);
        if run >= MIN_RUN || byte == RLE_SENTINEL {
            out.extend_from_slice(&[RLE_SENTINEL, run as u8, byte]);
        } else {
            out.extend(std::iter::repeat_n(byte, run));
        }
        i += run;
    }
    out
}

pub fn decode(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let mut out = Vec::with_capacity(data.len() * 2);
    let mut i = 0;
    while i < data.len() {
        let byte = data[i];
        if byte != RLE_SENTINEL {
            out.push(byte);
            i += 1;
            continue;
        }
        let (count, value) = match data.get(i + 1..i + 3) {
            Some(&[count, value]) => (count, value),
            _ => return Err(CompressError::corrupt("rle", i, "truncated run record")),
        };
        if count == 0 {
            return Err(CompressError::corrupt("rle", i, "zero-length run"));
        }
        out.extend(std::iter::repeat_n(value, count as usize));
        i += 3;
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
