// Reed-Solomon RS(255, 223) over GF(2^8).
//
// Systematic code: a codeword is message[223] || parity[32]. The generator
// polynomial is g(x) = prod_{i=0}^{31} (x - alpha^i) (first consecutive
// root 0). Codeword index j holds the coefficient of x^(254 - j).
//
// Decoding: syndromes, Berlekamp-Massey for the error locator, Chien search
// for the error positions, Forney for the error values, then a syndrome
// re-check of the corrected word.

use std::sync::OnceLock;

use super::gf256::{self, ORDER};

/// Codeword length in symbols.
pub const N: usize = 255;
/// Message symbols per codeword.
pub const K: usize = 223;
/// Parity symbols per codeword.
pub const PARITY: usize = N - K;
/// Guaranteed correctable symbol errors per codeword.
pub const T: usize = PARITY / 2;

/// More than `T` symbol errors, or an inconsistent error locator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Uncorrectable;

fn generator() -> &'static [u8] {
    static GEN: OnceLock<Vec<u8>> = OnceLock::new();
    GEN.get_or_init(|| {
        (0..PARITY).fold(vec![1u8], |g, i| {
            gf256::poly_mul(&g, &[1, gf256::alpha_pow(i as isize)])
        })
    })
}

/// Append 32 parity symbols to a full 223-symbol message.
pub fn encode_block(message: &[u8; K]) -> [u8; N] {
    let g = generator();
    // Remainder of message(x) * x^32 / g(x), via an LFSR.
    let mut remainder = [0u8; PARITY];
    for &symbol in message {
        let feedback = gf256::add(symbol, remainder[0]);
        remainder.copy_within(1.., 0);
        remainder[PARITY - 1] = 0;
        if feedback != 0 {
            for (r, &gc) in remainder.iter_mut().zip(&g[1..]) {
                *r ^= gf256::mul(feedback, gc);
            }
        }
    }

    let mut codeword = [0u8; N];
    codeword[..K].copy_from_slice(message);
    codeword[K..].copy_from_slice(&remainder);
    codeword
}

/// S_i = r(alpha^i) for i in 0..32.
fn syndromes(codeword: &[u8; N]) -> [u8; PARITY] {
    let mut s = [0u8; PARITY];
    for (i, si) in s.iter_mut().enumerate() {
        *si = gf256::eval_desc(codeword, gf256::alpha_pow(i as isize));
    }
    s
}

/// Error locator Lambda(x), lowest degree first, and its register length L.
fn berlekamp_massey(s: &[u8; PARITY]) -> (Vec<u8>, usize) {
    let mut lambda = vec![0u8; PARITY + 1];
    lambda[0] = 1;
    let mut prev = lambda.clone();
    let mut len = 0usize;
    let mut shift = 1usize;
    let mut prev_discrepancy = 1u8;

    for r in 0..PARITY {
        let mut d = s[r];
        for i in 1..=len {
            d ^= gf256::mul(lambda[i], s[r - i]);
        }
        if d == 0 {
            shift += 1;
            continue;
        }

        let coef = gf256::div(d, prev_discrepancy);
        let snapshot = (2 * len <= r).then(|| lambda.clone());
        for i in 0..=PARITY - shift {
            lambda[i + shift] ^= gf256::mul(coef, prev[i]);
        }
        match snapshot {
            Some(old) => {
                len = r + 1 - len;
                prev = old;
                prev_discrepancy = d;
                shift = 1;
            }
            None => shift += 1,
        }
    }

    lambda.truncate(len + 1);
    (lambda, len)
}

/// Powers p (codeword index 254 - p) where Lambda(alpha^-p) = 0.
fn chien_search(lambda: &[u8]) -> Vec<usize> {
    (0..N)
        .filter(|&p| gf256::eval_asc(lambda, gf256::alpha_pow(-(p as isize))) == 0)
        .collect()
}

/// Error values e_k = X_k * Omega(X_k^-1) / Lambda'(X_k^-1).
fn forney(lambda: &[u8], s: &[u8; PARITY], powers: &[usize]) -> Result<Vec<u8>, Uncorrectable> {
    // Omega(x) = S(x) * Lambda(x) mod x^32, lowest degree first.
    let mut omega = [0u8; PARITY];
    for (i, &l) in lambda.iter().enumerate() {
        for (j, &sj) in s.iter().enumerate().take(PARITY - i.min(PARITY)) {
            omega[i + j] ^= gf256::mul(l, sj);
        }
    }

    // Formal derivative: only odd-degree terms survive in characteristic 2.
    let derivative: Vec<u8> = lambda
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, &c)| if i % 2 == 1 { c } else { 0 })
        .collect();

    powers
        .iter()
        .map(|&p| {
            let x = gf256::alpha_pow(p as isize);
            let x_inv = gf256::alpha_pow(-(p as isize));
            let denom = gf256::eval_asc(&derivative, x_inv);
            if denom == 0 {
                return Err(Uncorrectable);
            }
            Ok(gf256::mul(x, gf256::div(gf256::eval_asc(&omega, x_inv), denom)))
        })
        .collect()
}

/// Correct `codeword` in place. Returns the number of symbols corrected.
///
/// On `Err`, `codeword` is left untouched.
pub fn decode_block(codeword: &mut [u8; N]) -> Result<usize, Uncorrectable> {
    let s = syndromes(codeword);
    if s.iter().all(|&v| v == 0) {
        return Ok(0);
    }

    let (lambda, errors) = berlekamp_massey(&s);
    if errors == 0 || errors > T {
        return Err(Uncorrectable);
    }

    let powers = chien_search(&lambda);
    if powers.len() != errors {
        return Err(Uncorrectable);
    }
    let values = forney(&lambda, &s, &powers)?;

    let mut corrected = *codeword;
    for (&p, &e) in powers.iter().zip(&values) {
        corrected[ORDER - 1 - p] ^= e;
    }
    if syndromes(&corrected).iter().any(|&v| v != 0) {
        return Err(Uncorrectable);
    }

    *codeword = corrected;
    Ok(errors)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
