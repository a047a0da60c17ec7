use std::fmt;
use std::mem;
use std::ops::{Deref, DerefMut};

use zeroize::Zeroize;

use super::AtcaStatus;

/// An owned byte buffer that zeroes its contents before the memory is released.
///
/// Keys, nonces, digests and signatures all travel through this type.
/// An absent buffer is expressed as `Option<OctetBuffer>`; a zero-length
/// buffer is a valid, present value.
#[derive(Clone, Default)]
pub struct OctetBuffer {
    bytes: Vec<u8>,
}

impl OctetBuffer {
    /// A zero-initialized buffer of `len` bytes
    pub fn new(len: usize) -> OctetBuffer {
        OctetBuffer {
            bytes: vec![0u8; len],
        }
    }

    pub fn from_slice(data: &[u8]) -> OctetBuffer {
        OctetBuffer {
            bytes: data.to_vec(),
        }
    }

    /// Parses ASCII hex, ignoring whitespace and an optional `0x` prefix per token
    pub fn from_hex(text: &str) -> Result<OctetBuffer, AtcaStatus> {
        let mut digits: Vec<u8> = Vec::with_capacity(text.len());
        for token in text.split_whitespace() {
            let token = token
                .strip_prefix("0x")
                .or_else(|| token.strip_prefix("0X"))
                .unwrap_or(token);
            digits.extend(token.bytes().filter(|b| *b != b','));
        }
        let decoded = hex::decode(&digits);
        digits.zeroize();
        match decoded {
            Ok(bytes) => Ok(OctetBuffer::from(bytes)),
            Err(hex::FromHexError::OddLength) => Err(AtcaStatus::AtcaInvalidSize),
            Err(_) => Err(AtcaStatus::AtcaBadParam),
        }
    }

    pub fn to_hex(&self) -> String {
        hex::encode_upper(&self.bytes)
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.bytes
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.bytes
    }

    /// Appends bytes, wiping the old allocation if the vector has to grow
    pub fn extend_from_slice(&mut self, data: &[u8]) {
        if self.bytes.len() + data.len() > self.bytes.capacity() {
            let mut grown = Vec::with_capacity((self.bytes.len() + data.len()).max(16) * 2);
            grown.extend_from_slice(&self.bytes);
            mem::replace(&mut self.bytes, grown).zeroize();
        }
        self.bytes.extend_from_slice(data);
    }

    /// Copies `len` bytes starting at `start` into a new buffer
    pub fn slice(&self, start: usize, len: usize) -> OctetBuffer {
        OctetBuffer::from_slice(&self.bytes[start..start + len])
    }

    /// Compares two buffers in time independent of where they differ
    pub fn ct_eq(&self, other: &[u8]) -> bool {
        self.bytes.len() == other.len()
            && ring::constant_time::verify_slices_are_equal(&self.bytes, other).is_ok()
    }

    /// Overwrites the contents with zeros, keeping the length
    pub fn wipe(&mut self) {
        self.bytes.as_mut_slice().zeroize();
    }
}

impl Drop for OctetBuffer {
    fn drop(&mut self) {
        // covers the spare capacity as well
        self.bytes.zeroize();
    }
}

impl Deref for OctetBuffer {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for OctetBuffer {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl AsRef<[u8]> for OctetBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl From<&[u8]> for OctetBuffer {
    fn from(data: &[u8]) -> OctetBuffer {
        OctetBuffer::from_slice(data)
    }
}

impl From<Vec<u8>> for OctetBuffer {
    fn from(bytes: Vec<u8>) -> OctetBuffer {
        OctetBuffer { bytes }
    }
}

impl PartialEq for OctetBuffer {
    fn eq(&self, other: &OctetBuffer) -> bool {
        self.ct_eq(&other.bytes)
    }
}

impl PartialEq<[u8]> for OctetBuffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.ct_eq(other)
    }
}

// Contents stay out of debug output; traces go through LogContext::hex_dump().
impl fmt::Debug for OctetBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OctetBuffer")
            .field("len", &self.bytes.len())
            .finish()
    }
}
