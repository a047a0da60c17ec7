//! Software reconstruction of the message a device builds internally for its
//! MAC and HMAC commands, so that a digest produced by a device can be
//! verified on the host.
//!
//! Both constructions use the default command settings: no OTP or serial
//! number bytes are included, so those fields are zero apart from the fixed
//! serial number bytes the device always inserts.

use super::command::OpCode;
use super::host_crypto::{hmac_sha256, sha256};
use super::OctetBuffer;
use super::{ATCA_ATECC_SLOTS_COUNT, ATCA_KEY_SIZE, ATCA_SHA2_256_DIGEST_SIZE};

/// Mode byte of a Mac command computing SHA-256 over key and challenge
pub const MAC_MODE_DEFAULT: u8 = 0x00;
/// Mode byte of an Hmac command over TempKey
pub const HMAC_MODE_DEFAULT: u8 = 0x04;

/// Length of the message the device feeds to HMAC-SHA-256
pub const HMAC_MESSAGE_SIZE: usize = 88;

/// Serial number byte 8, fixed on every device
const SN8: u8 = 0xEE;
/// Serial number bytes 0 and 1, fixed on every device
const SN01: [u8; 2] = [0x01, 0x23];

/// Optional device fields mixed into the MAC message
#[derive(Clone, Debug, Default)]
pub struct MacContext {
    pub otp8: [u8; 8],
    pub otp3: [u8; 3],
    pub sn4: [u8; 4],
    pub sn23: [u8; 2],
}

/// The part of the message shared by both constructions, starting at the opcode
fn mac_trailer(opcode: OpCode, mode: u8, slot: u8, context: &MacContext) -> OctetBuffer {
    assert!(slot < ATCA_ATECC_SLOTS_COUNT, "key slot {} out of range", slot);
    let param2 = (slot as u16).to_le_bytes();

    let mut trailer = OctetBuffer::new(0);
    trailer.extend_from_slice(&[opcode as u8, mode]);
    trailer.extend_from_slice(&param2);
    trailer.extend_from_slice(&context.otp8);
    trailer.extend_from_slice(&context.otp3);
    trailer.extend_from_slice(&[SN8]);
    trailer.extend_from_slice(&context.sn4);
    trailer.extend_from_slice(&SN01);
    trailer.extend_from_slice(&context.sn23);
    trailer
}

/// SHA-256 of key || challenge || opcode || mode || param2 || OTP and SN fields
pub fn perform_hash(
    challenge: &[u8; ATCA_KEY_SIZE],
    key: &[u8; ATCA_KEY_SIZE],
    mode: u8,
    slot: u8,
    context: &MacContext,
) -> OctetBuffer {
    let mut message = OctetBuffer::from_slice(key);
    message.extend_from_slice(challenge);
    message.extend_from_slice(&mac_trailer(OpCode::Mac, mode, slot, context));
    sha256(&message)
}

/// The 88-byte message of an HMAC: 32 zero bytes || challenge || opcode || ...
pub fn prepare_hmac_buffer(
    challenge: &[u8; ATCA_KEY_SIZE],
    mode: u8,
    slot: u8,
    context: &MacContext,
) -> OctetBuffer {
    let mut message = OctetBuffer::new(ATCA_KEY_SIZE);
    message.extend_from_slice(challenge);
    message.extend_from_slice(&mac_trailer(OpCode::Hmac, mode, slot, context));
    assert_eq!(message.len(), HMAC_MESSAGE_SIZE);
    message
}

/// HMAC-SHA-256 keyed with `key` over `prepare_hmac_buffer()`
pub fn perform_hmac_256(
    challenge: &[u8; ATCA_KEY_SIZE],
    key: &[u8; ATCA_KEY_SIZE],
    mode: u8,
    slot: u8,
    context: &MacContext,
) -> OctetBuffer {
    let message = prepare_hmac_buffer(challenge, mode, slot, context);
    hmac_sha256(key, &message)
}

/// Digest a device returns for Mac(mode 0) with `key` in `slot`
pub fn hash_default(
    challenge: &[u8; ATCA_KEY_SIZE],
    key: &[u8; ATCA_KEY_SIZE],
    slot: u8,
) -> OctetBuffer {
    perform_hash(challenge, key, MAC_MODE_DEFAULT, slot, &MacContext::default())
}

/// Digest a device returns for Hmac(mode 0x04) with `challenge` in TempKey and `key` in `slot`
pub fn hmac_default(
    challenge: &[u8; ATCA_KEY_SIZE],
    key: &[u8; ATCA_KEY_SIZE],
    slot: u8,
) -> OctetBuffer {
    perform_hmac_256(challenge, key, HMAC_MODE_DEFAULT, slot, &MacContext::default())
}

/// Checks a Mac response against the expected digest
pub fn verify_hash_default(
    challenge: &[u8; ATCA_KEY_SIZE],
    response: &[u8],
    key: &[u8; ATCA_KEY_SIZE],
    slot: u8,
) -> bool {
    response.len() == ATCA_SHA2_256_DIGEST_SIZE
        && hash_default(challenge, key, slot).ct_eq(response)
}

/// Checks an Hmac response against the expected digest
pub fn verify_hmac_default(
    challenge: &[u8; ATCA_KEY_SIZE],
    response: &[u8],
    key: &[u8; ATCA_KEY_SIZE],
    slot: u8,
) -> bool {
    response.len() == ATCA_SHA2_256_DIGEST_SIZE
        && hmac_default(challenge, key, slot).ct_eq(response)
}
