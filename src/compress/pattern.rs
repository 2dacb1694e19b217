// Frequency-pattern substitution for the binary, image and audio modes.
//
// The most frequent 3..=5 byte subsequences are each given a one-byte code.
// Codes are byte values that do not occur in the input at all, so only the
// escape byte (the least frequent value) ever needs escaping.
//
// Stream layout:
//
//   escape
//   (len, code, pattern[len])*    len in MIN_PATTERN..=MAX_PATTERN
//   DICT_END                      a zero length terminates the dictionary
//   body                          literals, codes, or (escape, literal)

use std::cmp::Reverse;
use std::collections::HashMap;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use super::{CompressError, CompressOptions};

pub const MIN_PATTERN: usize = 3;
pub const MAX_PATTERN: usize = 5;

const DICT_END: u8 = 0;

/// Inputs at least this large are counted on rayon workers.
#[cfg(feature = "parallel")]
const PARALLEL_COUNT_CHUNK: usize = 64 * 1024;

// ---------------------------------------------------------------------------
// Encoding
// ---------------------------------------------------------------------------

pub fn encode(data: &[u8], opts: &CompressOptions) -> Vec<u8> {
    let mut freq = [0usize; 256];
    for &b in data {
        freq[b as usize] += 1;
    }

    let escape = (0..=u8::MAX)
        .min_by_key(|&b| (freq[b as usize], b))
        .unwrap_or(0);
    let free_codes: Vec<u8> = (0..=u8::MAX)
        .filter(|&b| b != escape && freq[b as usize] == 0)
        .take(opts.max_patterns)
        .collect();

    let patterns = if free_codes.is_empty() {
        Vec::new()
    } else {
        select_patterns(data, opts.support_threshold, free_codes.len())
    };

    let mut reserved = [false; 256];
    reserved[escape as usize] = true;
    let mut lookup: HashMap<&[u8], u8> = HashMap::with_capacity(patterns.len());

    let dict_len: usize = patterns.iter().map(|p| p.len() + 2).sum();
    let mut out = Vec::with_capacity(data.len() + dict_len + 2);
    out.push(escape);
    for (pattern, &code) in patterns.iter().zip(free_codes.iter()) {
        out.push(pattern.len() as u8);
        out.push(code);
        out.extend_from_slice(pattern);
        reserved[code as usize] = true;
        lookup.insert(pattern.as_slice(), code);
    }
    out.push(DICT_END);

    let mut i = 0;
    'scan: while i < data.len() {
        if !lookup.is_empty() {
            for len in (MIN_PATTERN..=MAX_PATTERN).rev() {
                if let Some(window) = data.get(i..i + len)
                    && let Some(&code) = lookup.get(window)
                {
                    out.push(code);
                    i += len;
                    continue 'scan;
                }
            }
        }
        let byte = data[i];
        if reserved[byte as usize] {
            out.push(escape);
        }
        out.push(byte);
        i += 1;
    }

    log::trace!(
        "pattern: {} entries, escape {escape:#04X}, {} -> {} bytes",
        patterns.len(),
        data.len(),
        out.len()
    );
    out
}

/// Pick up to `limit` patterns whose support exceeds `threshold`, ordered by
/// estimated saving. Ordering is total, so the result is deterministic.
fn select_patterns(data: &[u8], threshold: usize, limit: usize) -> Vec<Vec<u8>> {
    let counts = count_patterns(data);

    let mut candidates: Vec<(i64, &[u8])> = counts
        .into_iter()
        .filter(|&(_, count)| count > threshold)
        .filter_map(|(pattern, count)| {
            // Each hit saves len-1 bytes; the dictionary entry costs len+2.
            let len = pattern.len() as i64;
            let gain = count as i64 * (len - 1) - (len + 2);
            (gain > 0).then_some((gain, pattern))
        })
        .collect();

    candidates.sort_unstable_by_key(|&(gain, pattern)| {
        (Reverse(gain), Reverse(pattern.len()), pattern)
    });
    candidates
        .into_iter()
        .take(limit)
        .map(|(_, pattern)| pattern.to_vec())
        .collect()
}

/// Occurrence counts (overlapping) of every 3..=5 byte window.
#[cfg(not(feature = "parallel"))]
fn count_patterns(data: &[u8]) -> HashMap<&[u8], usize> {
    count_range(data, 0, data.len())
}

#[cfg(feature = "parallel")]
fn count_patterns(data: &[u8]) -> HashMap<&[u8], usize> {
    if data.len() < 2 * PARALLEL_COUNT_CHUNK {
        return count_range(data, 0, data.len());
    }
    let starts: Vec<usize> = (0..data.len()).step_by(PARALLEL_COUNT_CHUNK).collect();
    starts
        .par_iter()
        .map(|&start| count_range(data, start, (start + PARALLEL_COUNT_CHUNK).min(data.len())))
        .reduce(HashMap::new, |mut acc, part| {
            for (pattern, count) in part {
                *acc.entry(pattern).or_insert(0) += count;
            }
            acc
        })
}

/// Count windows starting in `start..end`; windows may extend past `end`.
fn count_range(data: &[u8], start: usize, end: usize) -> HashMap<&[u8], usize> {
    let mut counts: HashMap<&[u8], usize> = HashMap::new();
    for i in start..end {
        for len in MIN_PATTERN..=MAX_PATTERN {
            match data.get(i..i + len) {
                Some(window) => *counts.entry(window).or_insert(0) += 1,
                None => break,
            }
        }
    }
    counts
}

// ---------------------------------------------------------------------------
// Decoding
// ---------------------------------------------------------------------------

pub fn decode(data: &[u8]) -> Result<Vec<u8>, CompressError> {
    let truncated = |offset| CompressError::corrupt("pattern", offset, "truncated dictionary");

    let escape = *data.first().ok_or_else(|| truncated(0))?;
    let mut table: [Option<&[u8]>; 256] = [None; 256];
    let mut pos = 1;
    loop {
        let len = *data.get(pos).ok_or_else(|| truncated(pos))? as usize;
        if len == DICT_END as usize {
            pos += 1;
            break;
        }
        if !(MIN_PATTERN..=MAX_PATTERN).contains(&len) {
            return Err(CompressError::corrupt(
                "pattern",
                pos,
                "invalid dictionary entry length",
            ));
        }
        let code = *data.get(pos + 1).ok_or_else(|| truncated(pos + 1))?;
        if code == escape {
            return Err(CompressError::corrupt(
                "pattern",
                pos + 1,
                "dictionary code collides with escape",
            ));
        }
        let pattern = data
            .get(pos + 2..pos + 2 + len)
            .ok_or_else(|| truncated(pos + 2))?;
        table[code as usize] = Some(pattern);
        pos += 2 + len;
    }

    let mut out = Vec::with_capacity((data.len() - pos) * 2);
    while pos < data.len() {
        let byte = data[pos];
        if byte == escape {
            let literal = *data
                .get(pos + 1)
                .ok_or_else(|| CompressError::corrupt("pattern", pos, "truncated escape"))?;
            out.push(literal);
            pos += 2;
        } else if let Some(pattern) = table[byte as usize] {
            out.extend_from_slice(pattern);
            pos += 1;
        } else {
            out.push(byte);
            pos += 1;
        }
    }
    Ok(out)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
