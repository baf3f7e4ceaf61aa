//! stream cipher adapter
//!
//! aes-256 in output-feedback mode with a fixed all-zero iv. ofb xors a
//! keystream into the data, so the same transform encrypts and decrypts.
//!
//! the zero iv is part of the shard format: a key must never encrypt two
//! different payloads. [`generate_key`] draws a fresh key for every split.

use std::io::{self, Read};

use ofb::cipher::{KeyIvInit, StreamCipher};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::{Error, Result};

type Aes256Ofb = ofb::Ofb<aes::Aes256>;

/// length of the file encryption key in bytes
pub const KEY_LEN: usize = 32;

/// block size of aes, and the length of the iv
const IV_LEN: usize = 16;

const ZERO_IV: [u8; IV_LEN] = [0u8; IV_LEN];

/// draw a fresh file key from the os rng
pub fn generate_key() -> Result<Zeroizing<[u8; KEY_LEN]>> {
    let mut key = Zeroizing::new([0u8; KEY_LEN]);
    OsRng.try_fill_bytes(&mut key[..])?;
    Ok(key)
}

fn keystream(key: &[u8], iv: &[u8]) -> Result<Aes256Ofb> {
    Aes256Ofb::new_from_slices(key, iv).map_err(|e| Error::Cipher(e.to_string()))
}

/// wraps a reader and applies the keystream to everything read through it
pub struct CipherReader<R> {
    inner: R,
    cipher: Aes256Ofb,
}

impl<R: Read> CipherReader<R> {
    /// `key` must be exactly [`KEY_LEN`] bytes
    pub fn new(inner: R, key: &[u8]) -> Result<Self> {
        Ok(Self {
            inner,
            cipher: keystream(key, &ZERO_IV)?,
        })
    }
}

impl<R: Read> Read for CipherReader<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let n = self.inner.read(buf)?;
        self.cipher.apply_keystream(&mut buf[..n]);
        Ok(n)
    }
}

/// apply the keystream to a buffer in place
pub fn apply(key: &[u8], data: &mut [u8]) -> Result<()> {
    keystream(key, &ZERO_IV)?.apply_keystream(data);
    Ok(())
}
