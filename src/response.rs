use super::crc::{is_crc16_valid, is_frame_crc_valid};
use super::{AtcaStatus, OctetBuffer, StatusCode};
use super::{ATCA_CRC_SIZE, ATCA_RSP_FRAME_OVERHEAD, ATCA_STATUS_FRAME_SIZE};

/// A classified device answer
#[derive(Debug, PartialEq)]
pub enum Response {
    /// 4-byte status frame
    Status(StatusCode),
    /// Full-length data frame with its length prefix and CRC removed
    Data(OctetBuffer),
    /// Nothing usable was read; the read should be attempted again
    Nak,
}

impl From<u8> for StatusCode {
    fn from(status: u8) -> StatusCode {
        match status {
            0x00 => StatusCode::Success,
            0x01 => StatusCode::CheckMacMiscompare,
            0x03 => StatusCode::ParseError,
            0x05 => StatusCode::EccFault,
            0x0F => StatusCode::ExecutionError,
            0x11 => StatusCode::Awake,
            0xFF => StatusCode::CommError,
            _ => StatusCode::Unknown(status),
        }
    }
}

impl From<StatusCode> for u8 {
    fn from(status: StatusCode) -> u8 {
        match status {
            StatusCode::Success => 0x00,
            StatusCode::CheckMacMiscompare => 0x01,
            StatusCode::ParseError => 0x03,
            StatusCode::EccFault => 0x05,
            StatusCode::ExecutionError => 0x0F,
            StatusCode::Awake => 0x11,
            StatusCode::CommError => 0xFF,
            StatusCode::Unknown(status) => status,
        }
    }
}

impl From<StatusCode> for AtcaStatus {
    fn from(status: StatusCode) -> AtcaStatus {
        match status {
            StatusCode::Success => AtcaStatus::AtcaSuccess,
            StatusCode::CheckMacMiscompare => AtcaStatus::AtcaCheckMacVerifyFailed,
            StatusCode::ParseError => AtcaStatus::AtcaParseError,
            StatusCode::EccFault => AtcaStatus::AtcaStatusEcc,
            StatusCode::ExecutionError => AtcaStatus::AtcaExecutionError,
            StatusCode::Awake => AtcaStatus::AtcaWakeFailed,
            StatusCode::CommError => AtcaStatus::AtcaStatusCrc,
            StatusCode::Unknown(_) => AtcaStatus::AtcaStatusUnknown,
        }
    }
}

impl Response {
    /// Payload of a successful answer. A bare success status stands for a
    /// single zero acknowledgement byte; any other status becomes an error.
    pub fn into_payload(self) -> Result<OctetBuffer, AtcaStatus> {
        match self {
            Response::Data(payload) => Ok(payload),
            Response::Status(StatusCode::Success) => Ok(OctetBuffer::new(1)),
            Response::Status(status) => Err(status.into()),
            Response::Nak => Err(AtcaStatus::AtcaTooManyCommRetries),
        }
    }

    /// The acknowledgement byte of a command whose only output is pass/fail.
    /// A miscompare is a regular negative answer, not an error.
    pub fn into_ack(self) -> Result<u8, AtcaStatus> {
        match self {
            Response::Status(StatusCode::CheckMacMiscompare) => Ok(0x01),
            Response::Data(payload) if payload.len() == 1 => Ok(payload[0]),
            Response::Data(_) => Err(AtcaStatus::AtcaInvalidSize),
            other => Ok(other.into_payload()?[0]),
        }
    }
}

/// Classifies a framed response read into a buffer sized for a payload of
/// `payload_len` bytes.
///
/// The status-frame shape is checked first. A frame of exactly four bytes with
/// a valid CRC is therefore always a status, even when the caller expected a
/// one-byte data payload; the devices answer that way too.
pub fn classify(raw: &[u8], payload_len: usize) -> Response {
    let frame_len = payload_len + ATCA_RSP_FRAME_OVERHEAD;
    if raw.len() != frame_len || raw.len() < ATCA_STATUS_FRAME_SIZE {
        return Response::Nak;
    }

    if raw[0] as usize == ATCA_STATUS_FRAME_SIZE
        && is_crc16_valid(&raw[..2], u16::from_le_bytes([raw[2], raw[3]]))
    {
        return Response::Status(StatusCode::from(raw[1]));
    }

    if raw[0] as usize == frame_len && is_frame_crc_valid(raw) {
        return Response::Data(OctetBuffer::from_slice(&raw[1..frame_len - ATCA_CRC_SIZE]));
    }

    Response::Nak
}

/// Classifies a response received through a kernel driver, which has already
/// stripped the length prefix and the CRC. A lone byte is a status.
pub fn classify_kernel(raw: &[u8]) -> Response {
    match raw.len() {
        0 => Response::Nak,
        1 => Response::Status(StatusCode::from(raw[0])),
        _ => Response::Data(OctetBuffer::from_slice(raw)),
    }
}
