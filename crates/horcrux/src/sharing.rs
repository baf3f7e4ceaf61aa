//! threshold secret sharing using shamir's scheme over GF(256)
//!
//! every byte of the secret gets its own random polynomial of degree
//! `threshold - 1` with that byte as the constant term. share `i` holds the
//! evaluations at `x = i`, so share indices run 1..=total and 0 stays
//! reserved for the secret itself.

use rand::{rngs::OsRng, CryptoRng, RngCore};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use crate::gf256;
use crate::{Error, Result};

/// a single share of a split secret
#[derive(Clone, Debug, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Share {
    /// share index (1-indexed, must be non-zero)
    pub index: u8,
    /// share data (same length as secret)
    pub fragment: Vec<u8>,
}

impl Share {
    pub fn new(index: u8, fragment: Vec<u8>) -> Self {
        Self { index, fragment }
    }
}

/// check `total` and `threshold` against the limits of a single-byte index
pub fn check_parameters(total: usize, threshold: usize) -> Result<()> {
    if !(2..=255).contains(&total) || threshold < 2 || threshold > total {
        return Err(Error::InvalidParameters { total, threshold });
    }
    Ok(())
}

/// split `secret` into `total` shares, any `threshold` of which recover it
pub fn split(secret: &[u8], total: usize, threshold: usize) -> Result<Vec<Share>> {
    split_with_rng(secret, total, threshold, &mut OsRng)
}

/// like [`split`] with a caller-provided rng
pub fn split_with_rng<R: RngCore + CryptoRng>(
    secret: &[u8],
    total: usize,
    threshold: usize,
    rng: &mut R,
) -> Result<Vec<Share>> {
    check_parameters(total, threshold)?;
    if secret.is_empty() {
        return Err(Error::Sharing("secret must not be empty".into()));
    }

    let mut shares: Vec<Share> = (1..=total)
        .map(|x| Share::new(x as u8, vec![0u8; secret.len()]))
        .collect();

    // coeffs[0] is the secret byte, the rest are fresh per position
    let mut coeffs = Zeroizing::new(vec![0u8; threshold]);

    for (pos, &byte) in secret.iter().enumerate() {
        coeffs[0] = byte;
        rng.try_fill_bytes(&mut coeffs[1..])?;

        for share in shares.iter_mut() {
            share.fragment[pos] = gf256::poly_eval(&coeffs, share.index);
        }
    }

    Ok(shares)
}

/// reconstruct the secret from shares of one split
///
/// all supplied shares take part in the interpolation. passing fewer than
/// the original threshold does not fail, it yields an unrelated value.
pub fn combine(shares: &[Share]) -> Result<Zeroizing<Vec<u8>>> {
    if shares.len() < 2 {
        return Err(Error::Sharing(format!(
            "at least 2 shares are needed, got {}",
            shares.len()
        )));
    }

    let len = shares[0].fragment.len();
    if len == 0 {
        return Err(Error::Sharing("empty share fragment".into()));
    }

    let mut seen = [false; 256];
    for share in shares {
        if share.fragment.len() != len {
            return Err(Error::FragmentLength {
                expected: len,
                got: share.fragment.len(),
            });
        }
        if share.index == 0 {
            return Err(Error::Sharing("share index 0 is reserved".into()));
        }
        if std::mem::replace(&mut seen[share.index as usize], true) {
            return Err(Error::Sharing(format!("duplicate share index {}", share.index)));
        }
    }

    // every byte position shares the same x coordinates
    let xs: Vec<u8> = shares.iter().map(|share| share.index).collect();
    let weights = gf256::basis_at_zero(&xs);

    let mut secret = Zeroizing::new(vec![0u8; len]);
    for (pos, out) in secret.iter_mut().enumerate() {
        *out = shares
            .iter()
            .zip(&weights)
            .fold(0u8, |acc, (share, &w)| gf256::add(acc, gf256::mul(w, share.fragment[pos])));
    }

    Ok(secret)
}
