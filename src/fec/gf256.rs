// GF(2^8) arithmetic with primitive polynomial x^8 + x^4 + x^3 + x^2 + 1.
//
// Log/exp tables are built once and shared; they are immutable after
// initialisation.

use std::sync::OnceLock;

const PRIM_POLY: u16 = 0x11D;

/// Multiplicative group order.
pub const ORDER: usize = 255;

struct Tables {
    /// exp[i] = alpha^i, doubled so that exp[log a + log b] needs no reduction.
    exp: [u8; 2 * ORDER],
    /// log[0] is unused.
    log: [u8; 256],
}

fn tables() -> &'static Tables {
    static TABLES: OnceLock<Tables> = OnceLock::new();
    TABLES.get_or_init(|| {
        let mut exp = [0u8; 2 * ORDER];
        let mut log = [0u8; 256];
        let mut x: u16 = 1;
        for i in 0..ORDER {
            exp[i] = x as u8;
            exp[i + ORDER] = x as u8;
            log[x as usize] = i as u8;
            x <<= 1;
            if x & 0x100 != 0 {
                x ^= PRIM_POLY;
            }
        }
        Tables { exp, log }
    })
}

#[inline]
pub fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

#[inline]
pub fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    let t = tables();
    t.exp[t.log[a as usize] as usize + t.log[b as usize] as usize]
}

/// `a / b`. `b` must be nonzero.
#[inline]
pub fn div(a: u8, b: u8) -> u8 {
    debug_assert_ne!(b, 0, "division by zero in GF(256)");
    if a == 0 {
        return 0;
    }
    let t = tables();
    t.exp[t.log[a as usize] as usize + ORDER - t.log[b as usize] as usize]
}

/// alpha^power for any power, negative exponents included.
#[inline]
pub fn alpha_pow(power: isize) -> u8 {
    tables().exp[power.rem_euclid(ORDER as isize) as usize]
}

/// Evaluate a polynomial given highest-degree coefficient first.
pub fn eval_desc(poly: &[u8], x: u8) -> u8 {
    poly.iter().fold(0u8, |acc, &c| add(mul(acc, x), c))
}

/// Evaluate a polynomial given lowest-degree coefficient first.
pub fn eval_asc(poly: &[u8], x: u8) -> u8 {
    poly.iter().rev().fold(0u8, |acc, &c| add(mul(acc, x), c))
}

/// Product of two polynomials, highest-degree coefficient first.
pub fn poly_mul(a: &[u8], b: &[u8]) -> Vec<u8> {
    let mut out = vec![0u8; a.len() + b.len() - 1];
    for (i, &ac) in a.iter().enumerate() {
        for (j, &bc) in b.iter().enumerate() {
            out[i + j] ^= mul(ac, bc);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn alpha_generates_the_field() {
        let mut seen = [false; 256];
        for i in 0..ORDER as isize {
            let v = alpha_pow(i);
            assert!(!seen[v as usize], "alpha^{i} repeats");
            seen[v as usize] = true;
        }
        assert!(!seen[0]);
        assert_eq!(alpha_pow(255), 1);
        assert_eq!(alpha_pow(-1), alpha_pow(254));
    }

    #[test]
    fn mul_div_inverse() {
        for a in 1..=255u8 {
            for b in [1u8, 2, 3, 0x53, 0xCA, 0xFF] {
                assert_eq!(div(mul(a, b), b), a);
            }
            assert_eq!(mul(a, div(1, a)), 1);
        }
    }

    #[test]
    fn known_products() {
        assert_eq!(mul(2, 0x80), 0x1D);
        assert_eq!(mul(0, 77), 0);
        assert_eq!(alpha_pow(8), 0x1D);
    }

    #[test]
    fn eval_orders_agree() {
        let desc = [3u8, 0, 7, 1];
        let asc: Vec<u8> = desc.iter().rev().copied().collect();
        for x in [0u8, 1, 2, 9, 200] {
            assert_eq!(eval_desc(&desc, x), eval_asc(&asc, x));
        }
    }

    #[test]
    fn poly_mul_roots() {
        // (x - a)(x - b) vanishes at a and b.
        let p = poly_mul(&[1, 5], &[1, 9]);
        assert_eq!(eval_desc(&p, 5), 0);
        assert_eq!(eval_desc(&p, 9), 0);
    }
}
