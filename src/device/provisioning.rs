// ATTENTION these functions should be called knowing what you are doing !!!
//
// Locking a zone cannot be undone. Once the configuration zone is locked the
// slot layout is fixed for the lifetime of the chip, and once the data zone is
// locked the OTP zone and the slot contents are only accessible as the slot
// configuration permits.
// -------------------------------------------------------------------------------------------------

use std::ops::Range;
use std::time::{SystemTime, UNIX_EPOCH};

use log::{info, warn};

use super::AteccDevice;
use crate::command::{Command, OpCode};
use crate::crc::crc16;
use crate::{AtcaStatus, DeviceState, OctetBuffer, Zone};
use crate::{ATCA_ATECC_CONFIG_BUFFER_SIZE, ATCA_OTP_BLOCKS_COUNT, ATCA_OTP_ZONE_SIZE};
use crate::{ATCA_BLOCK_SIZE, ATCA_WORD_SIZE, ATCA_ZONE_UNLOCKED};

/// Config block holding LockValue and LockConfig
const LOCK_BYTES_BLOCK: u8 = 2;
/// Offset of LockConfig within that block
const LOCK_CONFIG_OFFSET: usize = 23;
/// Offset of LockValue (data and OTP zones) within that block
const LOCK_VALUE_OFFSET: usize = 22;

const LOCK_MODE_CONFIG: u8 = 0x00;
const LOCK_MODE_DATA: u8 = 0x01;
/// Lock mode flag telling the device not to check the zone CRC
const LOCK_FLAG_SKIP_CRC: u8 = 0x80;

/// Serial number and revision, programmed at the factory
const CONFIG_FACTORY_BYTES: Range<usize> = 0..16;
/// UserExtra, Selector, LockValue and LockConfig, changed only by dedicated commands
const CONFIG_PROTECTED_BYTES: Range<usize> = 84..88;
/// Config word overlapping the protected bytes
const CONFIG_PROTECTED_WORD: usize = 21;
/// First config word the Write command accepts
const CONFIG_FIRST_WRITABLE_WORD: usize = 4;

const OTP_STAMP_PRODUCT: &str = "RUST CRYPTOAUTH";

impl DeviceState {
    /// Derives the provisioning state from the two lock flags.
    /// A locked data zone on an unlocked configuration cannot happen on a sane device.
    pub fn from_locks(config_locked: bool, data_locked: bool) -> Result<DeviceState, AtcaStatus> {
        match (config_locked, data_locked) {
            (false, false) => Ok(DeviceState::Factory),
            (true, false) => Ok(DeviceState::Initialized),
            (true, true) => Ok(DeviceState::Personalized),
            (false, true) => Err(AtcaStatus::AtcaAssertFailure),
        }
    }
}

impl AteccDevice {
    /// A function that reads the configuration zone to check if the specified zone is locked.
    /// The OTP zone shares its lock with the data zone.
    pub fn is_locked(&self, zone: Zone) -> Result<bool, AtcaStatus> {
        let address = Zone::Config.slot_address(LOCK_BYTES_BLOCK)?;
        let block = self.read32(Zone::Config, address as u16)?;
        let offset = match zone {
            Zone::Config => LOCK_CONFIG_OFFSET,
            Zone::Otp | Zone::Data => LOCK_VALUE_OFFSET,
        };
        Ok(block[offset] != ATCA_ZONE_UNLOCKED)
    } // AteccDevice::is_locked()

    pub fn is_configuration_locked(&self) -> Result<bool, AtcaStatus> {
        self.is_locked(Zone::Config)
    } // AteccDevice::is_configuration_locked()

    pub fn is_data_zone_locked(&self) -> Result<bool, AtcaStatus> {
        self.is_locked(Zone::Data)
    } // AteccDevice::is_data_zone_locked()

    /// Current provisioning state, read live from the device
    pub fn device_state(&self) -> Result<DeviceState, AtcaStatus> {
        let config_locked = self.is_locked(Zone::Config)?;
        let data_locked = self.is_locked(Zone::Data)?;
        DeviceState::from_locks(config_locked, data_locked)
    } // AteccDevice::device_state()

    /// Execute this command prevents future modifications of the zone.
    ///
    /// With `crc` the device checks it against the zone contents and refuses
    /// to lock on mismatch. Without it the CRC check is skipped.
    /// Locking an already locked zone succeeds without touching the device.
    /// The data and OTP zones can only be locked after the configuration zone.
    pub fn lock(&self, zone: Zone, crc: Option<u16>) -> Result<bool, AtcaStatus> {
        if self.is_locked(zone)? {
            return Ok(true);
        }
        let mode = match zone {
            Zone::Config => LOCK_MODE_CONFIG,
            Zone::Otp | Zone::Data => {
                if !self.is_locked(Zone::Config)? {
                    return Err(AtcaStatus::AtcaNotLocked);
                }
                LOCK_MODE_DATA
            }
        };
        let (mode, summary) = match crc {
            Some(crc) => (mode, crc),
            None => (mode | LOCK_FLAG_SKIP_CRC, 0),
        };
        let command = Command::new(OpCode::Lock, mode, summary.to_le_bytes(), &[]);
        let locked = self.execute(&command, 1)?.into_ack()? == 0;
        if locked {
            info!("{} zone locked", zone);
        }
        Ok(locked)
    } // AteccDevice::lock()

    /// Function for uploading configuration to the chip.
    /// First 16 bytes of data are skipped as they are not writable. UserExtra, Selector,
    /// LockValue and LockConfig are also skipped and can only be changed via dedicated commands.
    pub fn burn_config_zone(
        &self,
        config: &[u8; ATCA_ATECC_CONFIG_BUFFER_SIZE],
    ) -> Result<(), AtcaStatus> {
        if self.is_locked(Zone::Config)? {
            return Err(AtcaStatus::AtcaConfigZoneLocked);
        }
        let words = ATCA_ATECC_CONFIG_BUFFER_SIZE / ATCA_WORD_SIZE;
        for word in (CONFIG_FIRST_WRITABLE_WORD..words).filter(|w| *w != CONFIG_PROTECTED_WORD) {
            let mut data = [0u8; ATCA_WORD_SIZE];
            data.copy_from_slice(&config[word * ATCA_WORD_SIZE..(word + 1) * ATCA_WORD_SIZE]);
            if !self.write4(Zone::Config, word as u16, &data)? {
                warn!("Config word {} was not accepted", word);
                return Err(AtcaStatus::AtcaExecutionError);
            }
        }
        Ok(())
    } // AteccDevice::burn_config_zone()

    /// Locks the configuration zone after checking that the device holds `config`
    pub fn lock_config_zone(
        &self,
        config: &[u8; ATCA_ATECC_CONFIG_BUFFER_SIZE],
    ) -> Result<bool, AtcaStatus> {
        if self.is_locked(Zone::Config)? {
            return Ok(true);
        }
        let device_image = self.get_config_zone()?;
        let crc = config_zone_lock_crc(config, &device_image)?;
        self.lock(Zone::Config, Some(crc))
    } // AteccDevice::lock_config_zone()

    /// Writes the 64-byte OTP image. Requires a locked configuration and an unlocked data zone.
    pub fn burn_otp_zone(&self, otp: &[u8; ATCA_OTP_ZONE_SIZE]) -> Result<(), AtcaStatus> {
        match self.device_state()? {
            DeviceState::Factory => return Err(AtcaStatus::AtcaNotLocked),
            DeviceState::Personalized => return Err(AtcaStatus::AtcaDataZoneLocked),
            DeviceState::Initialized => (),
        }
        for block in 0..ATCA_OTP_BLOCKS_COUNT {
            let start = block as usize * ATCA_BLOCK_SIZE;
            let mut data = [0u8; ATCA_BLOCK_SIZE];
            data.copy_from_slice(&otp[start..start + ATCA_BLOCK_SIZE]);
            let address = Zone::Otp.slot_address(block)?;
            if !self.write32(Zone::Otp, address as u16, &data, None)? {
                warn!("OTP block {} was not accepted", block);
                return Err(AtcaStatus::AtcaExecutionError);
            }
        }
        Ok(())
    } // AteccDevice::burn_otp_zone()

    /// Drives a device to the Personalized state. Steps already completed are skipped,
    /// so the function can be run again after an interruption.
    pub fn personalize(
        &self,
        config: &[u8; ATCA_ATECC_CONFIG_BUFFER_SIZE],
        otp: &[u8; ATCA_OTP_ZONE_SIZE],
    ) -> Result<DeviceState, AtcaStatus> {
        let mut state = self.device_state()?;

        if state == DeviceState::Factory {
            self.burn_config_zone(config)?;
            if !self.lock_config_zone(config)? {
                return Err(AtcaStatus::AtcaExecutionError);
            }
            state = self.device_state()?;
            info!("Device moved to {}", state);
        }

        if state == DeviceState::Initialized {
            self.burn_otp_zone(otp)?;
            if !self.lock(Zone::Data, None)? {
                return Err(AtcaStatus::AtcaExecutionError);
            }
            state = self.device_state()?;
            info!("Device moved to {}", state);
        }

        Ok(state)
    } // AteccDevice::personalize()
}

// ---------------------------------------------------------------
// Free Auxiliary Functions
// ---------------------------------------------------------------

/// CRC the configuration zone is locked with.
///
/// `config` is the intended image, `device_image` what the device reports.
/// The factory bytes and the protected bytes are taken from the device since
/// the Write command never changes them. Any other difference means the
/// device does not hold the intended configuration.
pub fn config_zone_lock_crc(config: &[u8], device_image: &[u8]) -> Result<u16, AtcaStatus> {
    if config.len() != ATCA_ATECC_CONFIG_BUFFER_SIZE
        || device_image.len() != ATCA_ATECC_CONFIG_BUFFER_SIZE
    {
        return Err(AtcaStatus::AtcaInvalidSize);
    }
    let mut expected = OctetBuffer::from_slice(config);
    expected[CONFIG_FACTORY_BYTES].copy_from_slice(&device_image[CONFIG_FACTORY_BYTES]);
    expected[CONFIG_PROTECTED_BYTES].copy_from_slice(&device_image[CONFIG_PROTECTED_BYTES]);

    let crc = crc16(&expected);
    if crc != crc16(device_image) {
        warn!("Configuration zone differs from the intended image, refusing to lock");
        return Err(AtcaStatus::AtcaConfigZoneMismatch);
    }
    Ok(crc)
}

/// OTP image stamped with the product, the library version and the time of provisioning
pub fn build_otp_zone() -> OctetBuffer {
    let seconds = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    let stamp = format!(
        "{} SV: {}, TOL: {}",
        OTP_STAMP_PRODUCT,
        env!("CARGO_PKG_VERSION"),
        seconds
    );
    let mut otp = OctetBuffer::new(ATCA_OTP_ZONE_SIZE);
    let len = stamp.len().min(ATCA_OTP_ZONE_SIZE);
    otp[..len].copy_from_slice(&stamp.as_bytes()[..len]);
    otp
}
