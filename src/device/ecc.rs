use log::warn;

use super::AteccDevice;
use crate::command::{Command, OpCode};
use crate::host_crypto::sha256;
use crate::response::Response;
use crate::{AtcaStatus, OctetBuffer, StatusCode};
use crate::{ATCA_ATECC_PUB_KEY_SIZE, ATCA_KEY_SIZE, ATCA_NONCE_SIZE, ATCA_SIG_SIZE};

/// GenKey mode creating a new private key in the slot
const GENKEY_MODE_PRIVATE: u8 = 0x04;
/// GenKey mode computing the public key of the slot's private key
const GENKEY_MODE_PUBLIC: u8 = 0x00;
/// Sign mode for an externally supplied digest held in TempKey
const SIGN_MODE_EXTERNAL: u8 = 0x80;
/// Verify mode for a public key passed with the command
const VERIFY_MODE_EXTERNAL: u8 = 0x02;
/// Verify key type: P256 curve
const VERIFY_KEY_P256: [u8; 2] = [0x04, 0x00];
/// ECDH mode: private key from a slot, shared secret returned in the clear
const ECDH_MODE_OUTPUT_CLEAR: u8 = 0x0C;

impl AteccDevice {
    /// Request ATECC to generate a cryptographic key.
    /// With `private` a new key is created in the slot, otherwise the public key
    /// of the key already there is computed. Returns the 64-byte public key X || Y.
    pub fn gen_ecc_key(&self, slot_id: u8, private: bool) -> Result<OctetBuffer, AtcaStatus> {
        self.check_ecc_device()?;
        self.check_slot(slot_id)?;
        let mode = if private {
            GENKEY_MODE_PRIVATE
        } else {
            GENKEY_MODE_PUBLIC
        };
        let command = Command::new(OpCode::GenKey, mode, [slot_id, 0], &[])
            .with_exec_time(OpCode::GenKey.max_exec_time());
        self.execute_data(&command, ATCA_ATECC_PUB_KEY_SIZE)
    } // AteccDevice::gen_ecc_key()

    /// Request ATECC to sign the digest held in TempKey with the slot's private key.
    /// Returns the 64-byte signature R || S.
    pub fn ecc_sign(&self, slot_id: u8) -> Result<OctetBuffer, AtcaStatus> {
        self.check_ecc_device()?;
        self.check_slot(slot_id)?;
        let command = Command::new(OpCode::Sign, SIGN_MODE_EXTERNAL, [slot_id, 0], &[])
            .with_exec_time(OpCode::Sign.max_exec_time());
        self.execute_data(&command, ATCA_SIG_SIZE)
    } // AteccDevice::ecc_sign()

    /// Signs SHA-256 of `data` with the slot's private key in one session.
    /// The device is woken up, its RNG seed refreshed and the digest loaded into
    /// TempKey before signing. The device is left idle whatever the outcome.
    pub fn ecdsa_p256_hash_sign(
        &self,
        data: &[u8],
        slot_id: u8,
    ) -> Result<OctetBuffer, AtcaStatus> {
        self.check_ecc_device()?;
        self.check_slot(slot_id)?;
        let mut digest = [0u8; ATCA_NONCE_SIZE];
        digest.copy_from_slice(&sha256(data));
        self.wake()?;
        let result = self.sign_digest(&digest, slot_id);
        if let Err(err) = self.idle() {
            warn!("Could not put the device in idle mode: {}", err);
        }
        result
    } // AteccDevice::ecdsa_p256_hash_sign()

    /// Request ATECC to verify a signature of the digest held in TempKey.
    /// A signature that does not match is reported as `Ok(false)`.
    pub fn ecc_verify(
        &self,
        public_key: &[u8; ATCA_ATECC_PUB_KEY_SIZE],
        signature: &[u8; ATCA_SIG_SIZE],
    ) -> Result<bool, AtcaStatus> {
        self.check_ecc_device()?;
        let mut payload = OctetBuffer::from_slice(signature);
        payload.extend_from_slice(public_key);
        let command = Command::new(OpCode::Verify, VERIFY_MODE_EXTERNAL, VERIFY_KEY_P256, &payload)
            .with_exec_time(OpCode::Verify.max_exec_time());
        match self.execute(&command, 1)? {
            Response::Status(StatusCode::CheckMacMiscompare) => Ok(false),
            response => Ok(response.into_ack()? == 0),
        }
    } // AteccDevice::ecc_verify()

    /// Request ATECC to compute an ECDH shared secret between the slot's private key
    /// and the peer's public key X || Y
    pub fn ecdh(
        &self,
        slot_id: u8,
        peer_public_key: &[u8; ATCA_ATECC_PUB_KEY_SIZE],
    ) -> Result<OctetBuffer, AtcaStatus> {
        self.check_ecc_device()?;
        self.check_slot(slot_id)?;
        let command = Command::new(
            OpCode::Ecdh,
            ECDH_MODE_OUTPUT_CLEAR,
            [slot_id, 0],
            peer_public_key,
        );
        self.execute_data(&command, ATCA_KEY_SIZE)
    } // AteccDevice::ecdh()

    // Private functions

    fn sign_digest(
        &self,
        digest: &[u8; ATCA_NONCE_SIZE],
        slot_id: u8,
    ) -> Result<OctetBuffer, AtcaStatus> {
        self.random(true)?;
        if !self.load_nonce(digest)? {
            return Err(AtcaStatus::AtcaExecutionError);
        }
        let signature = self.ecc_sign(slot_id)?;
        if signature.len() != ATCA_SIG_SIZE {
            return Err(AtcaStatus::AtcaInvalidSize);
        }
        Ok(signature)
    } // AteccDevice::sign_digest()
}
