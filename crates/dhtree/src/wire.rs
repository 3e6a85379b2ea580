//! Wire helpers for fixed-size fields.
//!
//! Tree claims are encoded as `root(32) | (next(32) | sig(64))*` with no
//! length prefix; the hop count is implied by the remaining length.

use crate::crypto::{PublicKey, Sig, PUBLIC_KEY_SIZE, SIGNATURE_SIZE};
use crate::types::Error;

/// A cursor for decoding wire messages.
pub(crate) struct WireReader<'a> {
    data: &'a [u8],
}

impl<'a> WireReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self { data }
    }

    pub fn remaining(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn read_fixed<const N: usize>(&mut self) -> Result<[u8; N], Error> {
        if self.data.len() < N {
            return Err(Error::Decode);
        }
        let mut out = [0u8; N];
        out.copy_from_slice(&self.data[..N]);
        self.data = &self.data[N..];
        Ok(out)
    }

    pub fn read_public_key(&mut self) -> Result<PublicKey, Error> {
        self.read_fixed::<PUBLIC_KEY_SIZE>()
    }

    pub fn read_signature(&mut self) -> Result<Sig, Error> {
        self.read_fixed::<SIGNATURE_SIZE>()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_fixed_fields_in_order() {
        let mut buf = vec![1u8; PUBLIC_KEY_SIZE];
        buf.extend_from_slice(&[2u8; SIGNATURE_SIZE]);
        let mut r = WireReader::new(&buf);
        assert_eq!(r.remaining(), PUBLIC_KEY_SIZE + SIGNATURE_SIZE);
        assert_eq!(r.read_public_key().unwrap(), [1u8; PUBLIC_KEY_SIZE]);
        assert_eq!(r.read_signature().unwrap(), [2u8; SIGNATURE_SIZE]);
        assert!(r.is_empty());
    }

    #[test]
    fn short_read_fails_without_consuming() {
        let buf = [7u8; PUBLIC_KEY_SIZE - 1];
        let mut r = WireReader::new(&buf);
        assert_eq!(r.read_public_key(), Err(Error::Decode));
        assert_eq!(r.remaining(), PUBLIC_KEY_SIZE - 1);
    }
}
