//! Host side SHA-256, HMAC-SHA-256 and ECDSA P-256 used to check what a device
//! produces, implemented on top of `ring`.

use std::fs;
use std::io::{self, Read};
use std::path::Path;

use log::error;
use ring::signature::KeyPair as _;
use ring::{digest, hmac, rand, signature};

use super::{AtcaStatus, OctetBuffer};
use super::{ATCA_ATECC_PUB_KEY_SIZE, ATCA_SHA2_256_DIGEST_SIZE, ATCA_SIG_SIZE};

/// Tag of an uncompressed curve point
const UNCOMPRESSED_POINT_TAG: u8 = 0x04;

pub fn sha256(data: &[u8]) -> OctetBuffer {
    OctetBuffer::from_slice(digest::digest(&digest::SHA256, data).as_ref())
}

/// SHA-256 over everything `reader` yields
pub fn sha256_reader<R: Read>(mut reader: R) -> io::Result<OctetBuffer> {
    let mut context = digest::Context::new(&digest::SHA256);
    let mut chunk = OctetBuffer::new(4096);
    loop {
        let count = reader.read(&mut chunk)?;
        if count == 0 {
            break;
        }
        context.update(&chunk[..count]);
    }
    Ok(OctetBuffer::from_slice(context.finish().as_ref()))
}

pub fn hmac_sha256(key: &[u8], data: &[u8]) -> OctetBuffer {
    let key = hmac::Key::new(hmac::HMAC_SHA256, key);
    OctetBuffer::from_slice(hmac::sign(&key, data).as_ref())
}

/// HKDF-SHA-256 extract step. A missing salt is a block of zeros.
pub fn hkdf_sha256_extract(salt: Option<&[u8]>, ikm: &[u8]) -> OctetBuffer {
    let zeros = [0u8; ATCA_SHA2_256_DIGEST_SIZE];
    hmac_sha256(salt.unwrap_or(&zeros), ikm)
}

/// Verifies an ECDSA P-256 signature R || S over SHA-256 of `message`.
///
/// `public_key` is either X || Y (64 bytes) or an uncompressed point (65 bytes).
/// A signature that does not verify is `Ok(false)`.
pub fn ecdsa_p256_verify(
    public_key: &[u8],
    message: &[u8],
    signature: &[u8],
) -> Result<bool, AtcaStatus> {
    let key = uncompressed_point(public_key)?;
    if signature.len() != ATCA_SIG_SIZE {
        return Err(AtcaStatus::AtcaInvalidSize);
    }
    let key = signature::UnparsedPublicKey::new(&signature::ECDSA_P256_SHA256_FIXED, &key[..]);
    Ok(key.verify(message, signature).is_ok())
}

/// An ECDSA P-256 key pair held by the host
pub struct EccKeyPair {
    pkcs8: OctetBuffer,
    key_pair: signature::EcdsaKeyPair,
}

impl EccKeyPair {
    pub fn generate() -> Result<EccKeyPair, AtcaStatus> {
        let rng = rand::SystemRandom::new();
        let document = signature::EcdsaKeyPair::generate_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            &rng,
        )
        .map_err(|_| AtcaStatus::AtcaUnknown)?;
        EccKeyPair::from_pkcs8(document.as_ref())
    }

    pub fn from_pkcs8(pkcs8: &[u8]) -> Result<EccKeyPair, AtcaStatus> {
        let key_pair = signature::EcdsaKeyPair::from_pkcs8(
            &signature::ECDSA_P256_SHA256_FIXED_SIGNING,
            pkcs8,
        )
        .map_err(|err| {
            error!("Rejected private key: {}", err);
            AtcaStatus::AtcaBadParam
        })?;
        Ok(EccKeyPair {
            pkcs8: OctetBuffer::from_slice(pkcs8),
            key_pair,
        })
    }

    /// Loads a PKCS#8 DER private key file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<EccKeyPair, AtcaStatus> {
        let der = fs::read(path.as_ref()).map_err(|err| {
            error!("Cannot read {}: {}", path.as_ref().display(), err);
            AtcaStatus::AtcaBadParam
        })?;
        let der = OctetBuffer::from(der);
        EccKeyPair::from_pkcs8(&der)
    }

    /// Stores the private key as a PKCS#8 DER file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        fs::write(path, &self.pkcs8)
    }

    pub fn pkcs8(&self) -> &[u8] {
        &self.pkcs8
    }

    /// Public key as X || Y
    pub fn public_key(&self) -> OctetBuffer {
        let point = self.key_pair.public_key().as_ref();
        OctetBuffer::from_slice(&point[1..])
    }

    /// Signs SHA-256 of `message`, returning R || S
    pub fn sign(&self, message: &[u8]) -> Result<OctetBuffer, AtcaStatus> {
        let rng = rand::SystemRandom::new();
        let sig = self
            .key_pair
            .sign(&rng, message)
            .map_err(|_| AtcaStatus::AtcaUnknown)?;
        Ok(OctetBuffer::from_slice(sig.as_ref()))
    }
}

fn uncompressed_point(public_key: &[u8]) -> Result<[u8; ATCA_ATECC_PUB_KEY_SIZE + 1], AtcaStatus> {
    let mut point = [UNCOMPRESSED_POINT_TAG; ATCA_ATECC_PUB_KEY_SIZE + 1];
    match public_key.len() {
        ATCA_ATECC_PUB_KEY_SIZE => point[1..].copy_from_slice(public_key),
        len if len == ATCA_ATECC_PUB_KEY_SIZE + 1 && public_key[0] == UNCOMPRESSED_POINT_TAG => {
            point.copy_from_slice(public_key)
        }
        _ => return Err(AtcaStatus::AtcaBadParam),
    }
    Ok(point)
}
