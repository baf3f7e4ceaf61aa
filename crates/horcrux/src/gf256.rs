//! arithmetic over GF(256) with the AES reduction polynomial
//!
//! addition and subtraction are both xor. multiplication goes through
//! exp/log tables built at compile time from the generator 0x03, modulo
//! x^8 + x^4 + x^3 + x + 1.

/// low byte of the AES polynomial 0x11b
const REDUCTION: u8 = 0x1b;

/// order of the multiplicative group
const ORDER: usize = 255;

struct Tables {
    /// `exp[i] = 3^i`, stored twice so log sums need no reduction
    exp: [u8; 2 * ORDER],
    /// `log[3^i] = i`; `log[0]` is unused
    log: [u8; 256],
}

static TABLES: Tables = build_tables();

/// multiply by x, reducing on overflow
const fn xtime(a: u8) -> u8 {
    let shifted = a << 1;
    if a & 0x80 != 0 {
        shifted ^ REDUCTION
    } else {
        shifted
    }
}

const fn build_tables() -> Tables {
    let mut exp = [0u8; 2 * ORDER];
    let mut log = [0u8; 256];
    let mut power = 1u8;
    let mut i = 0;
    while i < ORDER {
        exp[i] = power;
        exp[i + ORDER] = power;
        log[power as usize] = i as u8;
        // power * 3 = power * x + power
        power ^= xtime(power);
        i += 1;
    }
    Tables { exp, log }
}

#[inline]
fn log(a: u8) -> usize {
    TABLES.log[a as usize] as usize
}

#[inline]
pub(crate) fn add(a: u8, b: u8) -> u8 {
    a ^ b
}

pub(crate) fn mul(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    TABLES.exp[log(a) + log(b)]
}

/// multiplicative inverse; zero maps to zero
///
/// share indices are distinct and non-zero, so nothing divides by zero.
pub(crate) fn inv(a: u8) -> u8 {
    if a == 0 {
        return 0;
    }
    TABLES.exp[ORDER - log(a)]
}

pub(crate) fn div(a: u8, b: u8) -> u8 {
    if a == 0 || b == 0 {
        return 0;
    }
    TABLES.exp[log(a) + ORDER - log(b)]
}

/// horner evaluation; `coeffs[0]` is the constant term
pub(crate) fn poly_eval(coeffs: &[u8], x: u8) -> u8 {
    coeffs
        .iter()
        .rev()
        .fold(0u8, |acc, &coeff| add(mul(acc, x), coeff))
}

/// lagrange basis polynomials of `xs` evaluated at zero
///
/// `f(0) = sum(weights[i] * f(xs[i]))` for any polynomial of degree below
/// `xs.len()`. `xs` must be distinct and non-zero.
pub(crate) fn basis_at_zero(xs: &[u8]) -> Vec<u8> {
    xs.iter()
        .enumerate()
        .map(|(i, &xi)| {
            xs.iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                // (0 - xj) / (xi - xj)
                .fold(1u8, |acc, (_, &xj)| mul(acc, div(xj, add(xi, xj))))
        })
        .collect()
}
