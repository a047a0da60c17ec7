//! CRC-16 as computed by the CryptoAuthentication devices: polynomial 0x8005,
//! initial value 0, input bits consumed least significant first, result
//! transmitted little-endian.

use super::ATCA_CRC_SIZE;

const CRC16_POLYNOMIAL: u16 = 0x8005;

lazy_static! {
    static ref CRC16_TABLE: [u16; 256] = {
        let mut table = [0u16; 256];
        for (idx, entry) in table.iter_mut().enumerate() {
            let mut crc = (idx as u16) << 8;
            for _ in 0..8 {
                crc = if crc & 0x8000 != 0 {
                    (crc << 1) ^ CRC16_POLYNOMIAL
                } else {
                    crc << 1
                };
            }
            *entry = crc;
        }
        table
    };
}

/// Table driven CRC-16 over `data`
pub fn crc16(data: &[u8]) -> u16 {
    data.iter().fold(0u16, |crc, byte| {
        let idx = ((crc >> 8) as u8 ^ byte.reverse_bits()) as usize;
        (crc << 8) ^ CRC16_TABLE[idx]
    })
}

/// Bit-at-a-time form of `crc16()`, kept as the reference the table is checked against
pub fn crc16_bitwise(data: &[u8]) -> u16 {
    let mut crc: u16 = 0;
    for byte in data {
        for bit in 0..8 {
            let data_bit = (byte >> bit) & 1;
            let crc_bit = (crc >> 15) as u8;
            crc <<= 1;
            if data_bit != crc_bit {
                crc ^= CRC16_POLYNOMIAL;
            }
        }
    }
    crc
}

/// CRC-16 of `data` in wire order
pub fn crc16_bytes(data: &[u8]) -> [u8; ATCA_CRC_SIZE] {
    crc16(data).to_le_bytes()
}

/// Recomputes the CRC of `data` and compares it with `claimed_crc`
pub fn is_crc16_valid(data: &[u8], claimed_crc: u16) -> bool {
    crc16(data) == claimed_crc
}

/// Checks a received frame whose last two bytes are the little-endian CRC of the rest
pub fn is_frame_crc_valid(frame: &[u8]) -> bool {
    if frame.len() < ATCA_CRC_SIZE {
        return false;
    }
    let (body, trailer) = frame.split_at(frame.len() - ATCA_CRC_SIZE);
    is_crc16_valid(body, u16::from_le_bytes([trailer[0], trailer[1]]))
}
