//! In-memory device answering the wire protocol like a chip on an I2C bus.
//!
//! `SoftChip` implements `AtcaBus`, so a driver runs unmodified on top of it.
//! It holds the configuration, OTP and data zones, enforces the lock rules of
//! the provisioning state machine and executes the commands of the catalog.
//! Clones share one chip, which lets a test keep a handle for inspection and
//! fault injection while the driver owns the bus.
//!
//! Limitations: Sign and Verify hash TempKey before using it as the message,
//! encrypted writes and ECDH are answered with a parse error.

use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};

use log::{debug, trace, warn};
use rand::{distributions::Standard, Rng};

use super::command::{Command, OpCode};
use super::crc::{crc16, crc16_bytes};
use super::device::atcab_get_config_from_config_zone;
use super::host_crypto::{ecdsa_p256_verify, sha256, EccKeyPair};
use super::response::Response;
use super::soft_mac::{perform_hash, perform_hmac_256, MacContext};
use super::transport::AtcaBus;
use super::{AtcaDeviceType, AtcaSlot, AtcaStatus, FrameVariant, KeyType, OctetBuffer};
use super::{StatusCode, WriteConfig};
use super::{
    ATCA_ATECC_CONFIG_BUFFER_SIZE, ATCA_ATECC_PUB_KEY_SIZE, ATCA_ATECC_SLOTS_COUNT,
    ATCA_BLOCK_SIZE, ATCA_CMD_PREAMBLE, ATCA_KEY_SIZE, ATCA_NONCE_NUMIN_SIZE, ATCA_NONCE_SIZE,
    ATCA_OTP_MODE_READ_ONLY, ATCA_OTP_ZONE_SIZE, ATCA_RANDOM_BUFFER_SIZE, ATCA_RSP_FRAME_OVERHEAD,
    ATCA_SIG_SIZE, ATCA_WORD_ADDRESS_IDLE, ATCA_WORD_ADDRESS_SLEEP, ATCA_WORD_SIZE,
    ATCA_ZONE_UNLOCKED,
};

/// Answer to a wake token: status frame carrying 0x11
const WAKE_RESPONSE: [u8; 4] = [0x04, 0x11, 0x33, 0x43];
/// Bytes per data slot
const SLOT_SIZE: usize = 72;
/// Value every unlocked zone reads as before the first write
const ERASED: u8 = 0xFF;

const ZONE_CONFIG: u8 = 0x00;
const ZONE_OTP: u8 = 0x01;
const ZONE_DATA: u8 = 0x02;
const ZONE_MASK: u8 = 0x03;
const ZONE_FLAG_32_BYTES: u8 = 0x80;

const I2C_ADDRESS_INDEX: usize = 16;
const OTP_MODE_INDEX: usize = 18;
const LOCK_VALUE_INDEX: usize = 86;
const LOCK_CONFIG_INDEX: usize = 87;
const SLOT_LOCKED_INDEX: usize = 88;
const SLOT_CONFIG_INDEX: usize = 20;
const KEY_CONFIG_INDEX: usize = 96;
/// Config words no Write command may touch
const CONFIG_READ_ONLY_WORDS: [usize; 5] = [0, 1, 2, 3, 21];
const ZONE_LOCKED: u8 = 0x00;
const DEFAULT_I2C_ADDRESS: u8 = 0xC0;

const LOCK_MODE_MASK: u8 = 0x03;
const LOCK_MODE_CONFIG: u8 = 0x00;
const LOCK_MODE_DATA: u8 = 0x01;
const LOCK_FLAG_SKIP_CRC: u8 = 0x80;

const NONCE_MODE_MASK: u8 = 0x03;
const NONCE_MODE_PASSTHROUGH: u8 = 0x03;
const MAC_MODE_CHALLENGE: u8 = 0x00;
const HMAC_MODE_TEMPKEY: u8 = 0x04;
const GENKEY_MODE_PRIVATE: u8 = 0x04;
const GENKEY_MODE_PUBLIC: u8 = 0x00;
const SIGN_MODE_EXTERNAL: u8 = 0x80;
const VERIFY_MODE_EXTERNAL: u8 = 0x02;
const VERIFY_KEY_P256: [u8; 2] = [0x04, 0x00];

/// Random output of a device whose configuration is not locked yet
const UNLOCKED_RANDOM_PATTERN: [u8; 4] = [0xFF, 0xFF, 0x00, 0x00];

static CHIP_COUNTER: AtomicUsize = AtomicUsize::new(0);

/// Pending one-shot faults
#[derive(Debug, Default)]
struct Faults {
    naks: usize,
    awake: usize,
    corrupt_crc: usize,
    short_writes: usize,
}

struct ChipState {
    dev_type: AtcaDeviceType,
    variant: FrameVariant,
    awake: bool,
    config: [u8; ATCA_ATECC_CONFIG_BUFFER_SIZE],
    otp: [u8; ATCA_OTP_ZONE_SIZE],
    slots: Vec<[u8; SLOT_SIZE]>,
    /// PKCS#8 documents of the private keys created by GenKey
    keys: Vec<Option<OctetBuffer>>,
    tempkey: Option<[u8; ATCA_KEY_SIZE]>,
    response: Option<OctetBuffer>,
    cursor: usize,
    faults: Faults,
    reads: usize,
    writes: usize,
}

/// A simulated ATSHA/ATECC device
#[derive(Clone)]
pub struct SoftChip {
    id: String,
    state: Arc<Mutex<ChipState>>,
}

impl SoftChip {
    /// A factory-fresh device: both zones unlocked, asleep
    pub fn new(dev_type: AtcaDeviceType) -> SoftChip {
        let serial: Vec<u8> = rand::thread_rng().sample_iter(Standard).take(6).collect();
        let state = ChipState {
            dev_type,
            variant: FrameVariant::Framed,
            awake: false,
            config: factory_config(dev_type, &serial),
            otp: [ERASED; ATCA_OTP_ZONE_SIZE],
            slots: vec![[ERASED; SLOT_SIZE]; ATCA_ATECC_SLOTS_COUNT as usize],
            keys: vec![None; ATCA_ATECC_SLOTS_COUNT as usize],
            tempkey: None,
            response: None,
            cursor: 0,
            faults: Faults::default(),
            reads: 0,
            writes: 0,
        };
        SoftChip {
            id: format!("soft-chip-{}", CHIP_COUNTER.fetch_add(1, Ordering::SeqCst)),
            state: Arc::new(Mutex::new(state)),
        }
    } // SoftChip::new()

    /// Switches the chip to the framing a kernel driver presents
    pub fn with_frame_variant(self, variant: FrameVariant) -> SoftChip {
        self.state().variant = variant;
        self
    }

    /// The next `count` reads fail as if the device were still busy
    pub fn inject_naks(&self, count: usize) {
        self.state().faults.naks = count;
    }

    /// The next `count` commands are answered with the AWAKE status
    /// instead of being executed
    pub fn inject_awake(&self, count: usize) {
        self.state().faults.awake = count;
    }

    /// The next `count` reads return the pending response with a damaged CRC
    pub fn corrupt_crc(&self, count: usize) {
        self.state().faults.corrupt_crc = count;
    }

    /// The next `count` writes transfer only one byte
    pub fn short_writes(&self, count: usize) {
        self.state().faults.short_writes = count;
    }

    /// Number of read transfers seen so far
    pub fn reads(&self) -> usize {
        self.state().reads
    }

    /// Number of write transfers seen so far
    pub fn writes(&self) -> usize {
        self.state().writes
    }

    pub fn is_awake(&self) -> bool {
        self.state().awake
    }

    pub fn tempkey(&self) -> Option<[u8; ATCA_KEY_SIZE]> {
        self.state().tempkey
    }

    pub fn config_zone(&self) -> OctetBuffer {
        OctetBuffer::from_slice(&self.state().config)
    }

    /// Stores `data` at the start of a slot, bypassing every access rule
    pub fn program_slot(&self, slot: u8, data: &[u8]) {
        let mut state = self.state();
        let len = data.len().min(SLOT_SIZE);
        state.slots[slot as usize][..len].copy_from_slice(&data[..len]);
    }

    fn state(&self) -> MutexGuard<'_, ChipState> {
        self.state.lock().expect("Could not lock soft chip state")
    }
}

impl AtcaBus for SoftChip {
    fn identifier(&self) -> String {
        self.id.clone()
    }

    fn acquire(&mut self, address: u8) -> Result<(), AtcaStatus> {
        let state = self.state();
        if address == 0 || address == state.config[I2C_ADDRESS_INDEX] {
            return Ok(());
        }
        warn!("No device answers at address 0x{:02X}", address);
        Err(AtcaStatus::AtcaNoDevices)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.writes += 1;
        if state.faults.short_writes > 0 {
            state.faults.short_writes -= 1;
            return Ok(data.len().min(1));
        }
        if state.variant == FrameVariant::Kernel {
            state.receive(data);
            return Ok(data.len());
        }
        match data.first().copied() {
            None => Ok(0),
            Some(0x00) => {
                state.wake();
                Ok(data.len())
            }
            Some(_) if !state.awake => Err(not_acknowledged()),
            Some(ATCA_WORD_ADDRESS_SLEEP) => {
                state.sleep();
                Ok(1)
            }
            Some(ATCA_WORD_ADDRESS_IDLE) => {
                state.idle();
                Ok(1)
            }
            Some(ATCA_CMD_PREAMBLE) => {
                state.receive(data);
                Ok(data.len())
            }
            Some(word_address) => Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("unknown word address 0x{:02X}", word_address),
            )),
        }
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut state = self.state();
        state.reads += 1;
        state.read_response(buffer)
    }
}

impl ChipState {
    fn wake(&mut self) {
        trace!("Soft chip woken up");
        self.awake = true;
        self.set_response(OctetBuffer::from_slice(&WAKE_RESPONSE));
    }

    fn idle(&mut self) {
        self.awake = false;
        self.response = None;
    }

    fn sleep(&mut self) {
        self.idle();
        self.tempkey = None;
    }

    fn set_response(&mut self, response: OctetBuffer) {
        self.response = Some(response);
        self.cursor = 0;
    }

    fn read_response(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        if self.variant == FrameVariant::Framed && !self.awake {
            return Err(not_acknowledged());
        }
        if self.faults.naks > 0 {
            self.faults.naks -= 1;
            return Err(io::Error::new(io::ErrorKind::WouldBlock, "device busy"));
        }
        let pending = self.response.as_ref().ok_or_else(not_acknowledged)?;
        let remaining = &pending[self.cursor..];
        let count = remaining.len().min(buffer.len());
        buffer[..count].copy_from_slice(&remaining[..count]);
        let reported = match self.variant {
            FrameVariant::Framed => {
                // The bus clocks out the requested length whatever the device has.
                for byte in buffer[count..].iter_mut() {
                    *byte = ERASED;
                }
                buffer.len()
            }
            FrameVariant::Kernel => count,
        };

        if self.faults.corrupt_crc > 0 && count > 0 {
            self.faults.corrupt_crc -= 1;
            buffer[count - 1] ^= 0x01;
            return Ok(reported);
        }
        self.cursor += count;
        if self.cursor >= pending.len() {
            self.response = None;
            self.cursor = 0;
        }
        Ok(reported)
    }

    /// Parses and executes a received command, leaving its answer pending
    fn receive(&mut self, frame: &[u8]) {
        let response = match Command::deserialize(frame, self.variant) {
            Ok(_) if self.faults.awake > 0 => {
                self.faults.awake -= 1;
                Response::Status(StatusCode::Awake)
            }
            Ok(command) => {
                debug!("Soft chip executing {}", command.opcode);
                self.execute(&command).unwrap_or_else(Response::Status)
            }
            Err(AtcaStatus::AtcaBadOpcode) => Response::Status(StatusCode::ParseError),
            Err(err) => {
                warn!("Soft chip rejected a frame: {}", err);
                Response::Status(StatusCode::CommError)
            }
        };
        let encoded = self.encode(response);
        self.set_response(encoded);
    }

    fn encode(&self, response: Response) -> OctetBuffer {
        let payload = match response {
            Response::Status(status) => OctetBuffer::from_slice(&[u8::from(status)]),
            Response::Data(data) => data,
            Response::Nak => OctetBuffer::new(0),
        };
        match self.variant {
            FrameVariant::Kernel => payload,
            FrameVariant::Framed => {
                let mut frame =
                    OctetBuffer::from_slice(&[(payload.len() + ATCA_RSP_FRAME_OVERHEAD) as u8]);
                frame.extend_from_slice(&payload);
                let crc = crc16_bytes(&frame);
                frame.extend_from_slice(&crc);
                frame
            }
        }
    }

    fn execute(&mut self, command: &Command) -> Result<Response, StatusCode> {
        let ecc_only = matches!(
            command.opcode,
            OpCode::GenKey | OpCode::Sign | OpCode::Verify | OpCode::Ecdh
        );
        if ecc_only && self.dev_type == AtcaDeviceType::ATSHA204A {
            return Err(StatusCode::ParseError);
        }
        match command.opcode {
            OpCode::Read => self.read_zone(command),
            OpCode::Write => self.write_zone(command),
            OpCode::Lock => self.lock_zone(command),
            OpCode::Random => Ok(self.random()),
            OpCode::Nonce => self.nonce(command),
            OpCode::DevRev => Ok(Response::Data(OctetBuffer::from_slice(&self.config[4..8]))),
            OpCode::Mac => self.mac(command),
            OpCode::Hmac => self.hmac(command),
            OpCode::GenKey => self.gen_key(command),
            OpCode::Sign => self.sign(command),
            OpCode::Verify => self.verify(command),
            other => {
                debug!("{} is not simulated", other);
                Err(StatusCode::ParseError)
            }
        }
    }

    fn read_zone(&self, command: &Command) -> Result<Response, StatusCode> {
        let zone = command.param1 & ZONE_MASK;
        let len = transfer_size(command.param1);
        let (slot, offset) = decode_address(zone, u16::from_le_bytes(command.param2));
        let data: &[u8] = match zone {
            ZONE_CONFIG => &self.config,
            ZONE_OTP => {
                self.require_data_locked()?;
                &self.otp
            }
            ZONE_DATA => {
                self.require_data_locked()?;
                if self.slot(slot)?.config.is_secret {
                    return Err(StatusCode::ExecutionError);
                }
                &self.slots[slot]
            }
            _ => return Err(StatusCode::ParseError),
        };
        data.get(offset..offset + len)
            .map(|bytes| Response::Data(OctetBuffer::from_slice(bytes)))
            .ok_or(StatusCode::ParseError)
    }

    fn write_zone(&mut self, command: &Command) -> Result<Response, StatusCode> {
        let zone = command.param1 & ZONE_MASK;
        let len = transfer_size(command.param1);
        if command.data.len() != len {
            // MAC-authenticated writes are not simulated
            return Err(StatusCode::ParseError);
        }
        let (slot, offset) = decode_address(zone, u16::from_le_bytes(command.param2));
        let target: &mut [u8] = match zone {
            ZONE_CONFIG => {
                let first_word = offset / ATCA_WORD_SIZE;
                let last_word = (offset + len) / ATCA_WORD_SIZE;
                if self.config_locked()
                    || (first_word..last_word).any(|word| CONFIG_READ_ONLY_WORDS.contains(&word))
                {
                    return Err(StatusCode::ExecutionError);
                }
                &mut self.config
            }
            ZONE_OTP => {
                if !self.config_locked() || self.data_locked() {
                    return Err(StatusCode::ExecutionError);
                }
                &mut self.otp
            }
            ZONE_DATA => {
                if !self.config_locked() {
                    return Err(StatusCode::ExecutionError);
                }
                let atca_slot = self.slot(slot)?;
                if self.data_locked()
                    && (atca_slot.is_locked || atca_slot.config.write_config != WriteConfig::Always)
                {
                    return Err(StatusCode::ExecutionError);
                }
                &mut self.slots[slot]
            }
            _ => return Err(StatusCode::ParseError),
        };
        target
            .get_mut(offset..offset + len)
            .ok_or(StatusCode::ParseError)?
            .copy_from_slice(&command.data);
        Ok(Response::Status(StatusCode::Success))
    }

    fn lock_zone(&mut self, command: &Command) -> Result<Response, StatusCode> {
        let check_crc = command.param1 & LOCK_FLAG_SKIP_CRC == 0;
        let summary = u16::from_le_bytes(command.param2);
        match command.param1 & LOCK_MODE_MASK {
            LOCK_MODE_CONFIG => {
                if self.config_locked() {
                    return Err(StatusCode::ExecutionError);
                }
                if check_crc && crc16(&self.config) != summary {
                    warn!("Configuration zone CRC mismatch, not locking");
                    return Err(StatusCode::ExecutionError);
                }
                self.config[LOCK_CONFIG_INDEX] = ZONE_LOCKED;
            }
            LOCK_MODE_DATA => {
                if !self.config_locked() || self.data_locked() {
                    return Err(StatusCode::ExecutionError);
                }
                if check_crc {
                    let mut image = OctetBuffer::new(0);
                    for slot in self.slots.iter() {
                        image.extend_from_slice(slot);
                    }
                    image.extend_from_slice(&self.otp);
                    if crc16(&image) != summary {
                        warn!("Data zone CRC mismatch, not locking");
                        return Err(StatusCode::ExecutionError);
                    }
                }
                self.config[LOCK_VALUE_INDEX] = ZONE_LOCKED;
            }
            _ => return Err(StatusCode::ParseError),
        }
        Ok(Response::Status(StatusCode::Success))
    }

    fn random(&self) -> Response {
        let bytes: Vec<u8> = if self.config_locked() {
            random_bytes(ATCA_RANDOM_BUFFER_SIZE)
        } else {
            UNLOCKED_RANDOM_PATTERN
                .iter()
                .cycle()
                .take(ATCA_RANDOM_BUFFER_SIZE)
                .cloned()
                .collect()
        };
        Response::Data(OctetBuffer::from(bytes))
    }

    fn nonce(&mut self, command: &Command) -> Result<Response, StatusCode> {
        let mode = command.param1 & NONCE_MODE_MASK;
        match mode {
            NONCE_MODE_PASSTHROUGH => {
                self.tempkey = Some(to_key(&command.data, ATCA_NONCE_SIZE)?);
                Ok(Response::Status(StatusCode::Success))
            }
            0x00 | 0x01 => {
                if command.data.len() != ATCA_NONCE_NUMIN_SIZE {
                    return Err(StatusCode::ParseError);
                }
                let rand_out = OctetBuffer::from(random_bytes(ATCA_RANDOM_BUFFER_SIZE));
                let mut message = rand_out.clone();
                message.extend_from_slice(&command.data);
                message.extend_from_slice(&[OpCode::Nonce as u8, mode, command.param2[0]]);
                self.tempkey = Some(to_key(&sha256(&message), ATCA_KEY_SIZE)?);
                Ok(Response::Data(rand_out))
            }
            _ => Err(StatusCode::ParseError),
        }
    }

    fn mac(&self, command: &Command) -> Result<Response, StatusCode> {
        if command.param1 != MAC_MODE_CHALLENGE {
            return Err(StatusCode::ParseError);
        }
        let slot = slot_param(command)?;
        let challenge = to_key(&command.data, ATCA_KEY_SIZE)?;
        let key = self.slot_key(slot);
        let digest = perform_hash(
            &challenge,
            &key,
            command.param1,
            slot as u8,
            &MacContext::default(),
        );
        Ok(Response::Data(digest))
    }

    fn hmac(&self, command: &Command) -> Result<Response, StatusCode> {
        if command.param1 != HMAC_MODE_TEMPKEY {
            return Err(StatusCode::ParseError);
        }
        let slot = slot_param(command)?;
        let tempkey = self.tempkey.ok_or(StatusCode::ExecutionError)?;
        let key = self.slot_key(slot);
        let digest = perform_hmac_256(
            &tempkey,
            &key,
            command.param1,
            slot as u8,
            &MacContext::default(),
        );
        Ok(Response::Data(digest))
    }

    fn gen_key(&mut self, command: &Command) -> Result<Response, StatusCode> {
        let slot = slot_param(command)?;
        if !self.config_locked() || self.slot(slot)?.config.key_type != KeyType::P256EccKey {
            return Err(StatusCode::ExecutionError);
        }
        let key_pair = match command.param1 {
            GENKEY_MODE_PRIVATE => {
                let key_pair = EccKeyPair::generate().map_err(|_| StatusCode::ExecutionError)?;
                self.keys[slot] = Some(OctetBuffer::from_slice(key_pair.pkcs8()));
                key_pair
            }
            GENKEY_MODE_PUBLIC => self.key_pair(slot)?,
            _ => return Err(StatusCode::ParseError),
        };
        Ok(Response::Data(key_pair.public_key()))
    }

    fn sign(&self, command: &Command) -> Result<Response, StatusCode> {
        if command.param1 != SIGN_MODE_EXTERNAL {
            return Err(StatusCode::ParseError);
        }
        let slot = slot_param(command)?;
        let tempkey = self.tempkey.ok_or(StatusCode::ExecutionError)?;
        let signature = self
            .key_pair(slot)?
            .sign(&tempkey)
            .map_err(|_| StatusCode::ExecutionError)?;
        Ok(Response::Data(signature))
    }

    fn verify(&self, command: &Command) -> Result<Response, StatusCode> {
        if command.param1 != VERIFY_MODE_EXTERNAL
            || command.param2 != VERIFY_KEY_P256
            || command.data.len() != ATCA_SIG_SIZE + ATCA_ATECC_PUB_KEY_SIZE
        {
            return Err(StatusCode::ParseError);
        }
        let tempkey = self.tempkey.ok_or(StatusCode::ExecutionError)?;
        let (signature, public_key) = command.data.split_at(ATCA_SIG_SIZE);
        match ecdsa_p256_verify(public_key, &tempkey, signature) {
            Ok(true) => Ok(Response::Status(StatusCode::Success)),
            Ok(false) => Err(StatusCode::CheckMacMiscompare),
            Err(_) => Err(StatusCode::ParseError),
        }
    }

    // ---------------------------------------------------------------
    // Private functions
    // ---------------------------------------------------------------

    fn config_locked(&self) -> bool {
        self.config[LOCK_CONFIG_INDEX] != ATCA_ZONE_UNLOCKED
    }

    fn data_locked(&self) -> bool {
        self.config[LOCK_VALUE_INDEX] != ATCA_ZONE_UNLOCKED
    }

    fn require_data_locked(&self) -> Result<(), StatusCode> {
        match self.data_locked() {
            true => Ok(()),
            false => Err(StatusCode::ExecutionError),
        }
    }

    /// Slot settings as decoded from the current configuration zone
    fn slot(&self, slot: usize) -> Result<AtcaSlot, StatusCode> {
        let mut atca_slots = Vec::new();
        atcab_get_config_from_config_zone(&self.config, &mut atca_slots);
        atca_slots.into_iter().nth(slot).ok_or(StatusCode::ParseError)
    }

    fn slot_key(&self, slot: usize) -> [u8; ATCA_KEY_SIZE] {
        let mut key = [0u8; ATCA_KEY_SIZE];
        key.copy_from_slice(&self.slots[slot][..ATCA_KEY_SIZE]);
        key
    }

    fn key_pair(&self, slot: usize) -> Result<EccKeyPair, StatusCode> {
        let pkcs8 = self.keys[slot].as_ref().ok_or(StatusCode::ExecutionError)?;
        EccKeyPair::from_pkcs8(pkcs8).map_err(|_| StatusCode::ExecutionError)
    }
}

// ---------------------------------------------------------------
// Free Auxiliary Functions
// ---------------------------------------------------------------

fn not_acknowledged() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "address not acknowledged")
}

fn random_bytes(len: usize) -> Vec<u8> {
    rand::thread_rng().sample_iter(Standard).take(len).collect()
}

fn transfer_size(param1: u8) -> usize {
    match param1 & ZONE_FLAG_32_BYTES {
        0 => ATCA_WORD_SIZE,
        _ => ATCA_BLOCK_SIZE,
    }
}

/// Splits a Read/Write address into a slot index (data zone only) and a byte offset
fn decode_address(zone: u8, address: u16) -> (usize, usize) {
    let word_offset = (address & 0x07) as usize * ATCA_WORD_SIZE;
    match zone {
        ZONE_DATA => (
            ((address >> 3) & 0x0F) as usize,
            ((address >> 8) & 0x0F) as usize * ATCA_BLOCK_SIZE + word_offset,
        ),
        _ => (0, ((address >> 3) & 0x03) as usize * ATCA_BLOCK_SIZE + word_offset),
    }
}

fn slot_param(command: &Command) -> Result<usize, StatusCode> {
    match command.param2[0] {
        slot if slot < ATCA_ATECC_SLOTS_COUNT => Ok(slot as usize),
        _ => Err(StatusCode::ParseError),
    }
}

fn to_key(data: &[u8], expected_len: usize) -> Result<[u8; ATCA_KEY_SIZE], StatusCode> {
    if data.len() != expected_len || expected_len != ATCA_KEY_SIZE {
        return Err(StatusCode::ParseError);
    }
    let mut key = [0u8; ATCA_KEY_SIZE];
    key.copy_from_slice(data);
    Ok(key)
}

fn revision(dev_type: AtcaDeviceType) -> [u8; 4] {
    match dev_type {
        AtcaDeviceType::ATSHA204A => [0x00, 0x02, 0x00, 0x09],
        AtcaDeviceType::ATECC108A => [0x00, 0x00, 0x10, 0x05],
        AtcaDeviceType::ATECC608A => [0x00, 0x00, 0x60, 0x02],
        _ => [0x00, 0x00, 0x50, 0x00],
    }
}

/// Configuration zone as shipped: slots 0 to 7 hold P256 private keys,
/// slots 8 to 15 hold clear-text data
fn factory_config(dev_type: AtcaDeviceType, serial: &[u8]) -> [u8; ATCA_ATECC_CONFIG_BUFFER_SIZE] {
    let mut config = [0u8; ATCA_ATECC_CONFIG_BUFFER_SIZE];
    config[0..2].copy_from_slice(&[0x01, 0x23]);
    config[2..4].copy_from_slice(&serial[0..2]);
    config[4..8].copy_from_slice(&revision(dev_type));
    config[8..12].copy_from_slice(&serial[2..6]);
    config[12] = 0xEE;
    config[14] = 0x01;
    config[I2C_ADDRESS_INDEX] = DEFAULT_I2C_ADDRESS;
    config[OTP_MODE_INDEX] = ATCA_OTP_MODE_READ_ONLY;
    for slot in 0..ATCA_ATECC_SLOTS_COUNT as usize {
        let (slot_config, key_config) = match slot {
            0..=7 => ([0x87, 0x20], [0x33, 0x00]),
            _ => ([0x00, 0x00], [0x3C, 0x00]),
        };
        let slot_pos = SLOT_CONFIG_INDEX + slot * 2;
        let key_pos = KEY_CONFIG_INDEX + slot * 2;
        config[slot_pos..slot_pos + 2].copy_from_slice(&slot_config);
        config[key_pos..key_pos + 2].copy_from_slice(&key_config);
    }
    config[LOCK_VALUE_INDEX] = ATCA_ZONE_UNLOCKED;
    config[LOCK_CONFIG_INDEX] = ATCA_ZONE_UNLOCKED;
    config[SLOT_LOCKED_INDEX] = 0xFF;
    config[SLOT_LOCKED_INDEX + 1] = 0xFF;
    config
}
