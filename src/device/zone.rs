use std::time::Duration;

use super::AteccDevice;
use crate::command::{Command, OpCode};
use crate::{AtcaSlot, AtcaStatus, KeyType, OctetBuffer, SlotConfig, WriteConfig, Zone};
use crate::{
    ATCA_ATECC_CONFIG_BUFFER_SIZE, ATCA_ATECC_SLOTS_COUNT, ATCA_BLOCK_SIZE,
    ATCA_CONFIG_BLOCKS_COUNT, ATCA_OTP_BLOCKS_COUNT, ATCA_OTP_MODE_READ_ONLY, ATCA_OTP_ZONE_SIZE,
    ATCA_WORD_SIZE,
};

/// Read and Write param1 flag selecting a 32-byte transfer
const ZONE_FLAG_32_BYTES: u8 = 0x80;
/// Reads are given a fixed wait instead of the typical read time
const READ_EXEC_TIME: Duration = Duration::from_millis(1);
/// Config word holding the OTP mode byte
const OTP_MODE_WORD: u16 = 4;
const OTP_MODE_INDEX: usize = 2;

impl Zone {
    /// Zone selector folded into param1 of Read, Write and Lock
    pub fn bits(self) -> u8 {
        match self {
            Zone::Config => 0x00,
            Zone::Otp => 0x01,
            Zone::Data => 0x02,
        }
    }

    /// Protocol address of a slot (data zone) or 32-byte block (config and OTP zones)
    pub fn slot_address(self, slot: u8) -> Result<u8, AtcaStatus> {
        let limit = match self {
            Zone::Config => ATCA_CONFIG_BLOCKS_COUNT,
            Zone::Otp => ATCA_OTP_BLOCKS_COUNT,
            Zone::Data => ATCA_ATECC_SLOTS_COUNT,
        };
        if slot >= limit {
            return Err(AtcaStatus::AtcaInvalidId);
        }
        Ok(slot << 3)
    }

    /// Size of the zone in bytes. The data zone's size depends on the slot.
    pub fn size(self) -> Option<usize> {
        match self {
            Zone::Config => Some(ATCA_ATECC_CONFIG_BUFFER_SIZE),
            Zone::Otp => Some(ATCA_OTP_ZONE_SIZE),
            Zone::Data => None,
        }
    }
}

impl AteccDevice {
    /// Reads one 4-byte word
    pub fn read4(&self, zone: Zone, address: u16) -> Result<OctetBuffer, AtcaStatus> {
        let command = Command::new(OpCode::Read, zone.bits(), [0, 0], &[])
            .with_param2_u16(address)
            .with_exec_time(READ_EXEC_TIME);
        self.execute_data(&command, ATCA_WORD_SIZE)
    } // AteccDevice::read4()

    /// Reads one 32-byte block
    pub fn read32(&self, zone: Zone, address: u16) -> Result<OctetBuffer, AtcaStatus> {
        let command = Command::new(OpCode::Read, zone.bits() | ZONE_FLAG_32_BYTES, [0, 0], &[])
            .with_param2_u16(address)
            .with_exec_time(READ_EXEC_TIME);
        self.execute_data(&command, ATCA_BLOCK_SIZE)
    } // AteccDevice::read32()

    /// Writes one 4-byte word. True when the device acknowledged the write.
    pub fn write4(
        &self,
        zone: Zone,
        address: u16,
        data: &[u8; ATCA_WORD_SIZE],
    ) -> Result<bool, AtcaStatus> {
        let command =
            Command::new(OpCode::Write, zone.bits(), [0, 0], data).with_param2_u16(address);
        Ok(self.execute(&command, 1)?.into_ack()? == 0)
    } // AteccDevice::write4()

    /// Writes one 32-byte block, optionally authenticated with a MAC.
    /// True when the device acknowledged the write.
    pub fn write32(
        &self,
        zone: Zone,
        address: u16,
        data: &[u8; ATCA_BLOCK_SIZE],
        mac: Option<&[u8; ATCA_BLOCK_SIZE]>,
    ) -> Result<bool, AtcaStatus> {
        let mut payload = OctetBuffer::from_slice(data);
        if let Some(mac) = mac {
            payload.extend_from_slice(mac);
        }
        let param1 = zone.bits() | ZONE_FLAG_32_BYTES;
        let command =
            Command::new(OpCode::Write, param1, [0, 0], &payload).with_param2_u16(address);
        Ok(self.execute(&command, 1)?.into_ack()? == 0)
    } // AteccDevice::write32()

    /// Reads the first block of a data slot
    pub fn read_slot(&self, slot_id: u8) -> Result<OctetBuffer, AtcaStatus> {
        let address = Zone::Data.slot_address(slot_id)?;
        self.read32(Zone::Data, address as u16)
    } // AteccDevice::read_slot()

    /// Writes the first block of a data slot in clear text
    pub fn write_slot(
        &self,
        slot_id: u8,
        data: &[u8; ATCA_BLOCK_SIZE],
    ) -> Result<bool, AtcaStatus> {
        let address = Zone::Data.slot_address(slot_id)?;
        self.write32(Zone::Data, address as u16, data, None)
    } // AteccDevice::write_slot()

    /// Request ATECC to read the whole configuration zone, one word at a time
    pub fn get_config_zone(&self) -> Result<OctetBuffer, AtcaStatus> {
        let words = (ATCA_ATECC_CONFIG_BUFFER_SIZE / ATCA_WORD_SIZE) as u16;
        let mut config = OctetBuffer::new(0);
        for word in 0..words {
            config.extend_from_slice(&self.read4(Zone::Config, word)?);
        }
        Ok(config)
    } // AteccDevice::get_config_zone()

    /// Request ATECC to read the OTP zone. Only possible once the data zone is locked.
    pub fn get_otp_zone(&self) -> Result<OctetBuffer, AtcaStatus> {
        let mut otp = OctetBuffer::new(0);
        for block in 0..ATCA_OTP_BLOCKS_COUNT {
            let address = Zone::Otp.slot_address(block)?;
            otp.extend_from_slice(&self.read32(Zone::Otp, address as u16)?);
        }
        Ok(otp)
    } // AteccDevice::get_otp_zone()

    /// True when the OTP zone is configured read-only
    pub fn is_otp_read_only_mode(&self) -> Result<bool, AtcaStatus> {
        let word = self.read4(Zone::Config, OTP_MODE_WORD)?;
        Ok(word[OTP_MODE_INDEX] == ATCA_OTP_MODE_READ_ONLY)
    } // AteccDevice::is_otp_read_only_mode()

    /// Returns the slot configuration decoded from the configuration zone
    pub fn get_config(&self) -> Result<Vec<AtcaSlot>, AtcaStatus> {
        let config = self.get_config_zone()?;
        let mut atca_slots = Vec::new();
        atcab_get_config_from_config_zone(&config, &mut atca_slots);
        Ok(atca_slots)
    } // AteccDevice::get_config()
}

// ---------------------------------------------------------------
// Free Auxiliary Functions
// ---------------------------------------------------------------

fn atcab_get_bit_value(byte: u8, bit_pos: u8) -> bool {
    if bit_pos < 8 {
        ((byte >> bit_pos) & 1) != 0
    } else {
        false
    }
}

fn atcab_get_write_config(data: u8) -> WriteConfig {
    match data & 0b00001111 {
        0 => WriteConfig::Always,
        1 => WriteConfig::PubInvalid,
        2..=3 | 8..=11 => WriteConfig::Never,
        _ => WriteConfig::Encrypt,
    }
}

fn atcab_get_key_type(data: u8) -> KeyType {
    match data & 0b00000111 {
        4 => KeyType::P256EccKey,
        6 => KeyType::Aes,
        7 => KeyType::ShaOrText,
        _ => KeyType::Rfu,
    }
}

/// Decodes SlotConfig, KeyConfig and SlotLocked of a 128-byte configuration image
pub fn atcab_get_config_from_config_zone(config_data: &[u8], atca_slots: &mut Vec<AtcaSlot>) {
    const IDX_SLOT_LOCKED: usize = 88;
    const IDX_SLOT_CONFIG: usize = 20;
    const IDX_KEY_CONFIG: usize = 96;

    if config_data.len() < ATCA_ATECC_CONFIG_BUFFER_SIZE {
        return;
    }
    for idx in 0..ATCA_ATECC_SLOTS_COUNT {
        let slot_cfg_pos = IDX_SLOT_CONFIG + (idx * 2) as usize;
        let key_cfg_pos = IDX_KEY_CONFIG + (idx * 2) as usize;
        let slot_cfg = config_data[slot_cfg_pos];
        let key_cfg = config_data[key_cfg_pos];
        let config = SlotConfig {
            write_config: atcab_get_write_config(config_data[slot_cfg_pos + 1] >> 4),
            key_type: atcab_get_key_type(key_cfg >> 2),
            encrypt_read: atcab_get_bit_value(slot_cfg, 6),
            read_key: slot_cfg & 0b00001111,
            write_key: config_data[slot_cfg_pos + 1] & 0b00001111,
            is_secret: atcab_get_bit_value(slot_cfg, 7),
            limited_use: atcab_get_bit_value(slot_cfg, 5),
            no_mac: atcab_get_bit_value(slot_cfg, 4),
            is_private: atcab_get_bit_value(key_cfg, 0),
            ecdh_operation: atcab_get_bit_value(slot_cfg, 2),
            lockable: atcab_get_bit_value(key_cfg, 5),
        };
        let locked_bits = config_data[IDX_SLOT_LOCKED + (idx / 8) as usize];
        atca_slots.push(AtcaSlot {
            id: idx,
            // SlotLocked bits are cleared for locked slots
            is_locked: !atcab_get_bit_value(locked_bits, idx % 8),
            config,
        });
    }
}
