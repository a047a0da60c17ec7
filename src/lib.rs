//! Native driver for Microchip ATSHA204A/ATECC108A/ATECC508A/ATECC608A
//! CryptoAuthentication devices.
//!
//! Commands are framed, checksummed and exchanged with the device directly
//! over a byte channel (`AtcaBus`), either a Linux I2C character device or an
//! in-memory simulated chip. A software mirror of the device's MAC/HMAC
//! construction allows verifying device output without the device.

#[macro_use]
extern crate strum_macros; // 0.21.1
#[macro_use]
extern crate lazy_static;

mod atca_iface_cfg;
pub mod command;
pub mod crc;
mod device;
mod exchange;
pub mod host_crypto;
#[cfg(all(feature = "hardware-backend", target_os = "linux"))]
pub mod hw_impl;
mod octet_buffer;
pub mod response;
pub mod soft_mac;
pub mod sw_impl;
pub mod transport;
mod types;

pub use device::AteccDevice;
pub use device::{atcab_get_config_from_config_zone, build_otp_zone, config_zone_lock_crc};
pub use octet_buffer::OctetBuffer;
pub use transport::{AtcaBus, LogContext, Transport};
pub use types::*;

/// First byte of every framed command
pub const ATCA_CMD_PREAMBLE: u8 = 0x03;
/// Word address byte that puts the device to sleep
pub const ATCA_WORD_ADDRESS_SLEEP: u8 = 0x01;
/// Word address byte that puts the device into idle mode
pub const ATCA_WORD_ADDRESS_IDLE: u8 = 0x02;
pub const ATCA_CRC_SIZE: usize = 2;
/// Largest payload whose frame length still fits the length byte
pub const ATCA_CMD_MAX_DATA_SIZE: usize = 248;
/// Length prefix plus CRC trailer of a response frame
pub const ATCA_RSP_FRAME_OVERHEAD: usize = 3;
pub const ATCA_STATUS_FRAME_SIZE: usize = 4;
/// Number of times a command is sent when the device answers it was asleep
pub const ATCA_TX_RETRIES: u32 = 10;
/// Number of wake tokens sent before giving up
pub const ATCA_WAKE_RETRIES: u32 = 10;
pub const ATCA_DEFAULT_RX_RETRIES: i32 = 10;
/// Wake-high delay in microseconds
pub const ATCA_DEFAULT_WAKE_DELAY: u16 = 1500;

pub const ATCA_WORD_SIZE: usize = 4;
pub const ATCA_BLOCK_SIZE: usize = 32;
pub const ATCA_KEY_SIZE: usize = 32;
pub const ATCA_ATECC_CONFIG_BUFFER_SIZE: usize = 128;
pub const ATCA_OTP_ZONE_SIZE: usize = 64;
pub const ATCA_ATECC_SLOTS_COUNT: u8 = 16;
pub const ATCA_OTP_BLOCKS_COUNT: u8 = 2;
pub const ATCA_CONFIG_BLOCKS_COUNT: u8 = 3;
pub const ATCA_SERIAL_NUM_SIZE: usize = 9;
pub const ATCA_RANDOM_BUFFER_SIZE: usize = 32;
pub const ATCA_NONCE_SIZE: usize = 32;
pub const ATCA_NONCE_NUMIN_SIZE: usize = 20;
pub const ATCA_SHA2_256_DIGEST_SIZE: usize = 32;
pub const ATCA_ATECC_PUB_KEY_SIZE: usize = 64;
pub const ATCA_SIG_SIZE: usize = 64;
pub const ATCA_DEV_REV_SIZE: usize = 4;
/// Lock byte value of a zone that has not been locked
pub const ATCA_ZONE_UNLOCKED: u8 = 0x55;
/// OTP mode byte value selecting read-only mode
pub const ATCA_OTP_MODE_READ_ONLY: u8 = 0xAA;

/// Creates a device from its interface configuration and wakes it up
pub fn setup_atecc_device(r_iface_cfg: AtcaIfaceCfg) -> Result<AteccDevice, String> {
    AteccDevice::new(r_iface_cfg)
}
