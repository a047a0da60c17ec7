use log::LevelFilter;

/// Memory zones of an ATSHA/ATECC device
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum Zone {
    /// 128 bytes of device configuration, including the lock bytes
    Config,
    /// 64 bytes of one-time-programmable memory
    Otp,
    /// Key and data slots
    Data,
} // pub enum Zone

/// Provisioning state of a device, derived from the lock bytes of the
/// configuration zone. Transitions only ever move forward:
/// Factory -> Initialized -> Personalized.
#[derive(Copy, Clone, Debug, Display, PartialEq, PartialOrd)]
pub enum DeviceState {
    /// Neither the configuration zone nor the data zone is locked
    Factory,
    /// The configuration zone is locked, the data and OTP zones are not
    Initialized,
    /// Both lockable zone groups are locked
    Personalized,
} // pub enum DeviceState

/// Wire framing of outbound commands
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum FrameVariant {
    /// `[0x03][len][opcode][p1][p2lo][p2hi][payload][crc_lo][crc_hi]`,
    /// responses carry a length prefix and a CRC trailer
    Framed,
    /// `[opcode][p1][p2lo][p2hi][payload]` handed to a kernel driver which
    /// adds and strips the framing itself
    Kernel,
} // pub enum FrameVariant

/// Status byte carried by a 4-byte status frame
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum StatusCode {
    Success,
    CheckMacMiscompare,
    ParseError,
    EccFault,
    ExecutionError,
    /// The device has just woken up and did not see the command
    Awake,
    /// The device did not receive the command properly
    CommError,
    Unknown(u8),
} // pub enum StatusCode

/// An ATECC slot
#[derive(Copy, Clone, Debug)]
pub struct AtcaSlot {
    /// ATECC slot id (for diagnostic)
    pub id: u8,
    /// Lock status of slot (locked or not). If is_locked is true,
    /// slot cannot be written
    pub is_locked: bool,
    /// Slot configuration as can be read from configuration zone
    pub config: SlotConfig,
}

/// Detailed ATECC key slot configuration
#[derive(Copy, Clone, Debug)]
pub struct SlotConfig {
    /// Controls the ability to modify the data in this slot.
    pub write_config: WriteConfig,

    pub key_type: KeyType,

    /// true = Reads from this slot are encrypted with the key in 'read_key'
    pub encrypt_read: bool,

    /// Slot holding the key used for encrypted reads (0 to 15)
    pub read_key: u8,

    /// Use this key to validate and encrypt data written to the slot
    /// indicated by this variable.
    /// Valid range from 0 to 15.
    pub write_key: u8,

    /// true = The contents of this slot are secret. Clear text reads are
    /// prohibited and both 4-byte reads and writes are prohibited.
    pub is_secret: bool,

    /// true = The key stored in the slot is "Limited Use".
    pub limited_use: bool,

    /// true = The key stored in the slot cannot be used by the MAC or HMAC commands.
    pub no_mac: bool,

    /// true = The slot contains an ECC private key, usable by GenKey and Sign.
    pub is_private: bool,

    /// true = ECDH operation is permitted for this key.
    pub ecdh_operation: bool,

    /// If true then this slot can be individually locked using the Lock command.
    pub lockable: bool,
}

/// Detailed ATECC key slot write configuration
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WriteConfig {
    /// Clear text writes are always permitted on this slot.
    Always,
    /// If a validated public key is stored in the slot, writes are prohibited.
    PubInvalid,
    /// Writes are never permitted on this slot using the Write command.
    Never,
    /// Writes to this slot require a properly computed MAC and encrypted input.
    Encrypt,
}

/// ATECC key slot types
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum KeyType {
    /// Do not use (Reserved for Future Use)
    Rfu,
    /// Slot may contain ECC key
    P256EccKey,
    /// Slot may contain AES key
    Aes,
    /// Slot may contain hash value or a raw text
    ShaOrText,
}

/// ATECC interface configuration
#[derive(Clone, Debug)]
pub struct AtcaIfaceCfg {
    /// ATECC interface type
    pub iface_type: AtcaIfaceType,
    /// ATECC device type
    pub devtype: AtcaDeviceType,
    /// ATECC interface details (contents depend on interface type)
    pub iface: Option<AtcaIface>,
    /// Delay between the wake token and the wake response, in microseconds
    pub wake_delay: u16,
    /// Number of reads attempted per command before giving up
    pub rx_retries: i32,
    /// Framing used on the bus
    pub frame_variant: FrameVariant,
    /// Verbosity of this device's protocol traces
    pub log_level: LevelFilter,
} // pub struct AtcaIfaceCfg

/// ATECC interface
#[derive(Copy, Clone, Debug)]
pub struct AtcaIface {
    /// ATECC I2C interface settings
    pub atcai2c: AtcaIfaceI2c,
} // pub struct AtcaIface

/// ATECC I2C interface details
#[derive(Copy, Clone, Debug, Default)]
pub struct AtcaIfaceI2c {
    /// ATECC I2C bus address in its 8-bit form (0xC0 for a factory device)
    pub slave_address: u8,
    /// ATECC I2C bus number
    pub bus: u8,
    /// ATECC I2C bus baud rate
    pub baud: u32,
} // pub struct AtcaIfaceI2c

/// Supported ATECC interfaces
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum AtcaIfaceType {
    AtcaI2cIface,
    /// Simulated device speaking the wire protocol in memory
    AtcaTestIface,
    AtcaUnknownIface,
} // pub enum AtcaIfaceType

/// ATECC/ATSHA device types
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum AtcaDeviceType {
    ATSHA204A,
    ATECC108A,
    ATECC508A,
    ATECC608A,
    AtcaDevUnknown,
} // pub enum AtcaDeviceType

/// Return status for device accessing functions
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum AtcaStatus {
    /// Function succeeded.
    AtcaSuccess,
    AtcaConfigZoneLocked,
    AtcaDataZoneLocked,
    /// Configuration zone read back from the device does not match the
    /// image it is about to be locked with
    AtcaConfigZoneMismatch,
    /// device did not answer the wake token with a valid response
    AtcaWakeFailed,
    /// response status byte indicates CheckMac failure (status byte = 0x01)
    AtcaCheckMacVerifyFailed,
    /// response status byte indicates parsing error (status byte = 0x03)
    AtcaParseError,
    /// response status byte indicates DEVICE did not receive data properly (status byte = 0xFF)
    AtcaStatusCrc,
    /// response status byte is unknown
    AtcaStatusUnknown,
    /// response status byte is ECC fault (status byte = 0x05)
    AtcaStatusEcc,
    /// bad argument (out of range, null pointer, etc.)
    AtcaBadParam,
    /// invalid device id, id not set
    AtcaInvalidId,
    /// Count value is out of range or greater than buffer size.
    AtcaInvalidSize,
    /// CRC error in data received from device
    AtcaRxCrcError,
    /// Device did not respond too many times during a transmission.
    /// Could indicate no device present.
    AtcaTooManyCommRetries,
    /// Communication with device failed. Same as in hardware dependent modules.
    AtcaCommFail,
    /// the bus device could not be opened
    AtcaBusUnavailable,
    /// opcode is not supported by the device
    AtcaBadOpcode,
    /// chip was in a state where it could not execute the command,
    /// response status byte indicates command execution error (status byte = 0x0F)
    AtcaExecutionError,
    /// Code failed run-time consistency check
    AtcaAssertFailure,
    /// Failed to write
    AtcaTxFail,
    /// required zone was not locked
    AtcaNotLocked,
    /// no device answers on the requested bus address
    AtcaNoDevices,
    /// Couldn't allocate required memory
    AtcaAllocFailure,
    /// Unknown error occured
    AtcaUnknown,
} // pub enum AtcaStatus
