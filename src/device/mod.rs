use std::collections::HashSet;
use std::sync::Mutex;

use log::{error, info};

use super::command::{Command, OpCode};
use super::response::Response;
use super::transport::{AtcaBus, Transport};
use super::{AtcaDeviceType, AtcaIfaceCfg, AtcaIfaceType, AtcaStatus, OctetBuffer, Zone};
use super::{
    ATCA_ATECC_SLOTS_COUNT, ATCA_DEV_REV_SIZE, ATCA_KEY_SIZE, ATCA_NONCE_NUMIN_SIZE,
    ATCA_NONCE_SIZE, ATCA_RANDOM_BUFFER_SIZE, ATCA_SERIAL_NUM_SIZE, ATCA_SHA2_256_DIGEST_SIZE,
};

mod ecc;
mod provisioning;
mod zone;

pub use provisioning::{build_otp_zone, config_zone_lock_crc};
pub use zone::atcab_get_config_from_config_zone;

/// Nonce mode combining a host number with a device random number
const NONCE_MODE_SEED_UPDATE: u8 = 0x00;
/// Nonce mode loading TempKey with the host value as is
const NONCE_MODE_PASSTHROUGH: u8 = 0x03;
/// Mac mode: challenge from the command, key from a slot
const MAC_MODE_CHALLENGE: u8 = 0x00;
/// Hmac mode: message from TempKey, TempKey source flag set
const HMAC_MODE_TEMPKEY: u8 = 0x04;

struct AteccResourceManager {
    in_use: HashSet<String>,
}

lazy_static! {
    static ref ATECC_RESOURCE_MANAGER: Mutex<AteccResourceManager> =
        Mutex::new(AteccResourceManager {
            in_use: HashSet::new()
        });
}

impl AteccResourceManager {
    // Aquire an acceptance to drive the device behind `bus_id`
    fn acquire(&mut self, bus_id: &str) -> bool {
        self.in_use.insert(bus_id.to_owned())
    }

    // Release a reservation of the device behind `bus_id`
    fn release(&mut self, bus_id: &str) -> bool {
        self.in_use.remove(bus_id)
    }
}

/// An ATECC cryptochip context holder.
pub struct AteccDevice {
    /// Serializes access to the bus and the device's volatile state
    api_mutex: Mutex<Transport>,
    dev_type: AtcaDeviceType,
    bus_id: String,
}

impl AteccDevice {
    /// ATECC device instance constructor. Opens the configured bus and wakes the device.
    pub fn new(r_iface_cfg: AtcaIfaceCfg) -> Result<AteccDevice, String> {
        let bus: Box<dyn AtcaBus> = match r_iface_cfg.iface_type {
            #[cfg(all(feature = "hardware-backend", target_os = "linux"))]
            AtcaIfaceType::AtcaI2cIface => {
                let path = match r_iface_cfg.bus_path() {
                    Some(path) => path,
                    None => return Err(AtcaStatus::AtcaBadParam.to_string()),
                };
                Box::new(super::hw_impl::I2cBus::open(&path).map_err(|err| err.to_string())?)
            }
            AtcaIfaceType::AtcaTestIface => Box::new(
                super::sw_impl::SoftChip::new(r_iface_cfg.devtype)
                    .with_frame_variant(r_iface_cfg.frame_variant),
            ),
            _ => {
                error!(
                    "Interface {} is not available in this build",
                    r_iface_cfg.iface_type
                );
                return Err(AtcaStatus::AtcaBadParam.to_string());
            }
        };

        let device = AteccDevice::with_bus(bus, &r_iface_cfg).map_err(|err| err.to_string())?;
        device.wake().map_err(|err| err.to_string())?;
        info!("{} ready on {}", device.dev_type, device.bus_id);
        Ok(device)
    } // AteccDevice::new()

    /// Builds a device on top of an already opened bus channel. The device is not woken up.
    pub fn with_bus(
        bus: Box<dyn AtcaBus>,
        r_iface_cfg: &AtcaIfaceCfg,
    ) -> Result<AteccDevice, AtcaStatus> {
        let bus_id = bus.identifier();
        if !ATECC_RESOURCE_MANAGER
            .lock()
            .expect("Could not lock resource manager")
            .acquire(&bus_id)
        {
            error!("Device on {} is already in use", bus_id);
            return Err(AtcaStatus::AtcaAllocFailure);
        }
        let device = AteccDevice {
            api_mutex: Mutex::new(Transport::new(bus, r_iface_cfg)),
            dev_type: r_iface_cfg.devtype,
            bus_id,
        };
        let address = r_iface_cfg
            .iface
            .map(|iface| iface.atcai2c.slave_address)
            .unwrap_or_default();
        let acquired = device.transport().acquire(address);
        // On error the device is dropped here, which releases the registration.
        acquired?;
        Ok(device)
    } // AteccDevice::with_bus()

    /// Puts the device to sleep and releases it
    pub fn release(self) -> AtcaStatus {
        match self.sleep() {
            Ok(()) => AtcaStatus::AtcaSuccess,
            Err(err) => err,
        }
    } // AteccDevice::release()

    /// Request ATECC to return own device type
    pub fn get_device_type(&self) -> AtcaDeviceType {
        self.dev_type
    } // AteccDevice::get_device_type()

    pub fn wake(&self) -> Result<(), AtcaStatus> {
        match self.transport().wakeup() {
            true => Ok(()),
            false => Err(AtcaStatus::AtcaWakeFailed),
        }
    } // AteccDevice::wake()

    /// Idle mode keeps TempKey, the device needs a wake token afterwards
    pub fn idle(&self) -> Result<(), AtcaStatus> {
        match self.transport().idle() {
            true => Ok(()),
            false => Err(AtcaStatus::AtcaCommFail),
        }
    } // AteccDevice::idle()

    /// Sleep mode clears TempKey, the device needs a wake token afterwards
    pub fn sleep(&self) -> Result<(), AtcaStatus> {
        match self.transport().sleep() {
            true => Ok(()),
            false => Err(AtcaStatus::AtcaCommFail),
        }
    } // AteccDevice::sleep()

    /// Request ATECC to generate 32 random bytes.
    /// With `update_seed` the device refreshes its EEPROM seed first.
    pub fn random(&self, update_seed: bool) -> Result<OctetBuffer, AtcaStatus> {
        let mode = if update_seed { 0x00 } else { 0x01 };
        let command = Command::new(OpCode::Random, mode, [0, 0], &[]);
        self.execute_data(&command, ATCA_RANDOM_BUFFER_SIZE)
    } // AteccDevice::random()

    /// Reads the 4-byte device revision
    pub fn dev_rev(&self) -> Result<[u8; ATCA_DEV_REV_SIZE], AtcaStatus> {
        let command = Command::new(OpCode::DevRev, 0x00, [0, 0], &[]);
        let payload = self
            .transport()
            .send_and_get_rsp(&command, ATCA_DEV_REV_SIZE)?;
        if payload.len() != ATCA_DEV_REV_SIZE {
            return Err(AtcaStatus::AtcaInvalidSize);
        }
        let mut revision = [0u8; ATCA_DEV_REV_SIZE];
        revision.copy_from_slice(&payload);
        Ok(revision)
    } // AteccDevice::dev_rev()

    /// Request ATECC to read 9 byte serial number of the device from the config zone
    pub fn get_serial_number(&self) -> Result<OctetBuffer, AtcaStatus> {
        const SN_WORDS: [u16; 3] = [0, 2, 3];

        let mut serial = OctetBuffer::new(0);
        for word in SN_WORDS.iter() {
            let data = self.read4(Zone::Config, *word)?;
            serial.extend_from_slice(&data);
        }
        Ok(serial.slice(0, ATCA_SERIAL_NUM_SIZE))
    } // AteccDevice::get_serial_number()

    /// Execute a Nonce command.
    /// A 32-byte input is loaded into TempKey as is and an empty buffer is returned.
    /// A 20-byte input is combined with a device random number, which is returned.
    pub fn gen_nonce(&self, data: &[u8]) -> Result<OctetBuffer, AtcaStatus> {
        match data.len() {
            ATCA_NONCE_SIZE => {
                let command = Command::new(OpCode::Nonce, NONCE_MODE_PASSTHROUGH, [0, 0], data);
                match self.execute(&command, 1)?.into_ack()? {
                    0 => Ok(OctetBuffer::new(0)),
                    _ => Err(AtcaStatus::AtcaExecutionError),
                }
            }
            ATCA_NONCE_NUMIN_SIZE => {
                let command = Command::new(OpCode::Nonce, NONCE_MODE_SEED_UPDATE, [0, 0], data);
                self.execute_data(&command, ATCA_RANDOM_BUFFER_SIZE)
            }
            _ => Err(AtcaStatus::AtcaInvalidSize),
        }
    } // AteccDevice::gen_nonce()

    /// Loads a 32-byte value into TempKey
    pub fn load_nonce(&self, data: &[u8; ATCA_NONCE_SIZE]) -> Result<bool, AtcaStatus> {
        let command = Command::new(OpCode::Nonce, NONCE_MODE_PASSTHROUGH, [0, 0], data);
        Ok(self.execute(&command, 1)?.into_ack()? == 0)
    } // AteccDevice::load_nonce()

    /// Random nonce seeded with the first 20 bytes of the OTP zone.
    /// The OTP zone is readable only once the data zone is locked.
    pub fn get_nonce(&self) -> Result<OctetBuffer, AtcaStatus> {
        let otp = self.get_otp_zone()?;
        self.gen_nonce(&otp[..ATCA_NONCE_NUMIN_SIZE])
    } // AteccDevice::get_nonce()

    /// Request ATECC to compute SHA-256 over the slot key and a 32-byte challenge
    pub fn mac(
        &self,
        slot_id: u8,
        challenge: &[u8; ATCA_KEY_SIZE],
    ) -> Result<OctetBuffer, AtcaStatus> {
        self.check_slot(slot_id)?;
        let command = Command::new(OpCode::Mac, MAC_MODE_CHALLENGE, [slot_id, 0], challenge);
        self.execute_data(&command, ATCA_SHA2_256_DIGEST_SIZE)
    } // AteccDevice::mac()

    /// Request ATECC to compute HMAC-SHA-256 with the slot key over TempKey.
    /// TempKey must have been loaded by a preceding nonce command.
    pub fn hmac(&self, slot_id: u8) -> Result<OctetBuffer, AtcaStatus> {
        self.check_slot(slot_id)?;
        let command = Command::new(OpCode::Hmac, HMAC_MODE_TEMPKEY, [slot_id, 0], &[]);
        self.execute_data(&command, ATCA_SHA2_256_DIGEST_SIZE)
    } // AteccDevice::hmac()

    // ---------------------------------------------------------------
    // Private functions
    // ---------------------------------------------------------------

    fn transport(&self) -> std::sync::MutexGuard<'_, Transport> {
        self.api_mutex
            .lock()
            .expect("Could not lock atcab API mutex")
    } // AteccDevice::transport()

    /// Runs one exchange, holding the API mutex for its duration
    fn execute(&self, command: &Command, payload_len: usize) -> Result<Response, AtcaStatus> {
        self.transport().exchange(command, payload_len)
    } // AteccDevice::execute()

    /// Runs one exchange and insists on a data answer of `payload_len` bytes
    fn execute_data(
        &self,
        command: &Command,
        payload_len: usize,
    ) -> Result<OctetBuffer, AtcaStatus> {
        let payload = self.execute(command, payload_len)?.into_payload()?;
        if payload.len() != payload_len {
            return Err(AtcaStatus::AtcaInvalidSize);
        }
        Ok(payload)
    } // AteccDevice::execute_data()

    fn check_slot(&self, slot_id: u8) -> Result<(), AtcaStatus> {
        match slot_id < ATCA_ATECC_SLOTS_COUNT {
            true => Ok(()),
            false => Err(AtcaStatus::AtcaInvalidId),
        }
    } // AteccDevice::check_slot()

    /// ECC commands exist on the ATECC family only
    fn check_ecc_device(&self) -> Result<(), AtcaStatus> {
        match self.dev_type {
            AtcaDeviceType::ATSHA204A => Err(AtcaStatus::AtcaBadOpcode),
            _ => Ok(()),
        }
    } // AteccDevice::check_ecc_device()
}

impl Drop for AteccDevice {
    fn drop(&mut self) {
        ATECC_RESOURCE_MANAGER
            .lock()
            .expect("Could not lock resource manager")
            .release(&self.bus_id);
    }
}
