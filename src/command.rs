use std::convert::TryFrom;
use std::time::Duration;

use super::crc::{crc16_bytes, is_frame_crc_valid};
use super::{AtcaStatus, FrameVariant, OctetBuffer};
use super::{ATCA_CMD_MAX_DATA_SIZE, ATCA_CMD_PREAMBLE, ATCA_CRC_SIZE};

/// Size of opcode, param1 and param2 on the wire
const ATCA_CMD_HEADER_SIZE: usize = 4;

/// Command opcodes understood by the ATSHA/ATECC devices
#[repr(u8)]
#[derive(Copy, Clone, Debug, Display, PartialEq)]
pub enum OpCode {
    Pause = 0x01,
    Read = 0x02,
    Mac = 0x08,
    Hmac = 0x11,
    Write = 0x12,
    GenDig = 0x15,
    Nonce = 0x16,
    Lock = 0x17,
    Random = 0x1B,
    DeriveKey = 0x1C,
    UpdateExtra = 0x20,
    CheckMac = 0x28,
    DevRev = 0x30,
    GenKey = 0x40,
    Sign = 0x41,
    Ecdh = 0x43,
    Verify = 0x45,
} // pub enum OpCode

impl TryFrom<u8> for OpCode {
    type Error = AtcaStatus;

    fn try_from(value: u8) -> Result<OpCode, AtcaStatus> {
        let opcode = match value {
            0x01 => OpCode::Pause,
            0x02 => OpCode::Read,
            0x08 => OpCode::Mac,
            0x11 => OpCode::Hmac,
            0x12 => OpCode::Write,
            0x15 => OpCode::GenDig,
            0x16 => OpCode::Nonce,
            0x17 => OpCode::Lock,
            0x1B => OpCode::Random,
            0x1C => OpCode::DeriveKey,
            0x20 => OpCode::UpdateExtra,
            0x28 => OpCode::CheckMac,
            0x30 => OpCode::DevRev,
            0x40 => OpCode::GenKey,
            0x41 => OpCode::Sign,
            0x43 => OpCode::Ecdh,
            0x45 => OpCode::Verify,
            _ => return Err(AtcaStatus::AtcaBadOpcode),
        };
        Ok(opcode)
    }
}

impl OpCode {
    /// Typical execution time of the command on the device
    pub fn avg_exec_time(self) -> Duration {
        Duration::from_nanos(match self {
            OpCode::DeriveKey => 14_000_000,
            OpCode::Mac => 12_000_000,
            OpCode::DevRev => 400_000,
            OpCode::GenDig => 11_000_000,
            OpCode::Hmac => 27_000_000,
            OpCode::CheckMac => 12_000_000,
            OpCode::Lock => 5_000_000,
            OpCode::Nonce => 22_000_000,
            OpCode::Pause => 400_000,
            OpCode::Read => 400_000,
            OpCode::UpdateExtra => 8_000_000,
            OpCode::Write => 4_000_000,
            OpCode::Random => 11_000_000,
            OpCode::GenKey => 9_000_000,
            OpCode::Sign => 33_000_000,
            OpCode::Verify => 36_000_000,
            OpCode::Ecdh => 38_000_000,
        })
    }

    /// Worst case execution time of the command on the device
    pub fn max_exec_time(self) -> Duration {
        Duration::from_nanos(match self {
            OpCode::DeriveKey => 62_000_000,
            OpCode::Mac => 35_000_000,
            OpCode::DevRev => 2_000_000,
            OpCode::GenDig => 43_000_000,
            OpCode::Hmac => 69_000_000,
            OpCode::CheckMac => 38_000_000,
            OpCode::Lock => 24_000_000,
            OpCode::Nonce => 60_000_000,
            OpCode::Pause => 2_000_000,
            OpCode::Read => 4_000_000,
            OpCode::UpdateExtra => 12_000_000,
            OpCode::Write => 42_000_000,
            OpCode::Random => 50_000_000,
            OpCode::GenKey => 96_000_000,
            OpCode::Sign => 38_000_000,
            OpCode::Verify => 73_000_000,
            OpCode::Ecdh => 58_000_000,
        })
    }
}

/// One logical device command. Built per call and consumed by a single exchange.
#[derive(Clone, Debug)]
pub struct Command {
    pub opcode: OpCode,
    pub param1: u8,
    /// Second parameter, little-endian on the wire
    pub param2: [u8; 2],
    pub data: OctetBuffer,
    /// Time the device needs before its response can be read
    pub exec_time: Duration,
}

impl Command {
    /// Builds a command, copying `data` into command-owned storage.
    /// The execution time defaults to the opcode's typical time.
    pub fn new(opcode: OpCode, param1: u8, param2: [u8; 2], data: &[u8]) -> Command {
        assert!(
            data.len() <= ATCA_CMD_MAX_DATA_SIZE,
            "command payload of {} bytes does not fit a frame",
            data.len()
        );
        Command {
            opcode,
            param1,
            param2,
            data: OctetBuffer::from_slice(data),
            exec_time: opcode.avg_exec_time(),
        }
    }

    pub fn with_exec_time(mut self, exec_time: Duration) -> Command {
        self.exec_time = exec_time;
        self
    }

    /// Sets `param2` from a 16-bit value
    pub fn with_param2_u16(mut self, param2: u16) -> Command {
        self.param2 = param2.to_le_bytes();
        self
    }

    /// Total size of the framed command, preamble and CRC included
    pub fn frame_len(&self) -> usize {
        1 + 1 + ATCA_CMD_HEADER_SIZE + self.data.len() + ATCA_CRC_SIZE
    }

    /// Lays the command out for the wire
    pub fn serialize(&self, variant: FrameVariant) -> OctetBuffer {
        match variant {
            FrameVariant::Framed => {
                let mut frame = OctetBuffer::new(0);
                frame.extend_from_slice(&[ATCA_CMD_PREAMBLE, (self.frame_len() - 1) as u8]);
                frame.extend_from_slice(&self.header());
                frame.extend_from_slice(&self.data);
                let crc = crc16_bytes(&frame[1..]);
                frame.extend_from_slice(&crc);
                frame
            }
            FrameVariant::Kernel => {
                let mut frame = OctetBuffer::from_slice(&self.header());
                frame.extend_from_slice(&self.data);
                frame
            }
        }
    }

    /// Recovers a command from its wire form. The execution time is reset
    /// to the opcode's typical time since it never travels on the wire.
    pub fn deserialize(frame: &[u8], variant: FrameVariant) -> Result<Command, AtcaStatus> {
        let body = match variant {
            FrameVariant::Framed => {
                if frame.len() < 2 + ATCA_CMD_HEADER_SIZE + ATCA_CRC_SIZE {
                    return Err(AtcaStatus::AtcaInvalidSize);
                }
                if frame[0] != ATCA_CMD_PREAMBLE {
                    return Err(AtcaStatus::AtcaBadParam);
                }
                if frame[1] as usize != frame.len() - 1 {
                    return Err(AtcaStatus::AtcaInvalidSize);
                }
                if !is_frame_crc_valid(&frame[1..]) {
                    return Err(AtcaStatus::AtcaRxCrcError);
                }
                &frame[2..frame.len() - ATCA_CRC_SIZE]
            }
            FrameVariant::Kernel => {
                if frame.len() < ATCA_CMD_HEADER_SIZE
                    || frame.len() > ATCA_CMD_HEADER_SIZE + ATCA_CMD_MAX_DATA_SIZE
                {
                    return Err(AtcaStatus::AtcaInvalidSize);
                }
                frame
            }
        };
        let opcode = OpCode::try_from(body[0])?;
        Ok(Command::new(
            opcode,
            body[1],
            [body[2], body[3]],
            &body[ATCA_CMD_HEADER_SIZE..],
        ))
    }

    fn header(&self) -> [u8; ATCA_CMD_HEADER_SIZE] {
        [
            self.opcode as u8,
            self.param1,
            self.param2[0],
            self.param2[1],
        ]
    }
}
