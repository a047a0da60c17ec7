use super::common::{data_frame, status_frame};
use crate::response::{classify, classify_kernel, Response};
use crate::{AtcaStatus, OctetBuffer, StatusCode};

#[test]
fn status_frame_classified() {
    assert_eq!(
        classify(&[0x04, 0x00, 0x03, 0x40], 1),
        Response::Status(StatusCode::Success)
    );
    assert_eq!(
        classify(&status_frame(0x01), 1),
        Response::Status(StatusCode::CheckMacMiscompare)
    );
}

#[test]
fn status_frame_in_data_sized_read() {
    let mut raw = status_frame(0x0F);
    raw.resize(32 + 3, 0xFF);
    assert_eq!(
        classify(&raw, 32),
        Response::Status(StatusCode::ExecutionError)
    );
}

#[test]
fn data_frame_classified() {
    let raw = data_frame(&[0x01, 0x02, 0x03, 0x04]);
    assert_eq!(
        classify(&raw, 4),
        Response::Data(OctetBuffer::from_slice(&[0x01, 0x02, 0x03, 0x04]))
    );
}

#[test]
fn unusable_reads_are_naks() {
    // length differs from what the command produces
    assert_eq!(classify(&status_frame(0x00), 4), Response::Nak);
    assert_eq!(classify(&[], 4), Response::Nak);

    let mut damaged = data_frame(&[0x01, 0x02, 0x03, 0x04]);
    damaged[2] ^= 0x80;
    assert_eq!(classify(&damaged, 4), Response::Nak);

    // length prefix does not match the buffer
    let mut shifted = data_frame(&[0x01, 0x02, 0x03, 0x04]);
    shifted.push(0xFF);
    assert_eq!(classify(&shifted, 5), Response::Nak);
}

#[test]
fn four_byte_frame_is_a_status() {
    // A one-byte data payload and a status frame look the same on the wire.
    let raw = data_frame(&[0x55]);
    assert_eq!(raw, status_frame(0x55));
    assert_eq!(classify(&raw, 1), Response::Status(StatusCode::Unknown(0x55)));
}

#[test]
fn kernel_responses() {
    assert_eq!(classify_kernel(&[]), Response::Nak);
    assert_eq!(
        classify_kernel(&[0x0F]),
        Response::Status(StatusCode::ExecutionError)
    );
    assert_eq!(
        classify_kernel(&[0x01, 0x02]),
        Response::Data(OctetBuffer::from_slice(&[0x01, 0x02]))
    );
}

#[test]
fn status_codes() {
    for code in [0x00u8, 0x01, 0x03, 0x05, 0x0F, 0x11, 0xFF, 0x42].iter() {
        assert_eq!(u8::from(StatusCode::from(*code)), *code);
    }
    assert_eq!(
        AtcaStatus::from(StatusCode::ParseError),
        AtcaStatus::AtcaParseError
    );
    assert_eq!(
        AtcaStatus::from(StatusCode::Unknown(0x42)),
        AtcaStatus::AtcaStatusUnknown
    );
}

#[test]
fn response_payloads() {
    assert_eq!(
        Response::Status(StatusCode::Success).into_payload(),
        Ok(OctetBuffer::new(1))
    );
    assert_eq!(
        Response::Status(StatusCode::EccFault).into_payload(),
        Err(AtcaStatus::AtcaStatusEcc)
    );
    assert_eq!(
        Response::Nak.into_payload(),
        Err(AtcaStatus::AtcaTooManyCommRetries)
    );
    assert_eq!(Response::Status(StatusCode::Success).into_ack(), Ok(0x00));
    assert_eq!(
        Response::Status(StatusCode::CheckMacMiscompare).into_ack(),
        Ok(0x01)
    );
    assert_eq!(
        Response::Data(OctetBuffer::from_slice(&[0x01, 0x02])).into_ack(),
        Err(AtcaStatus::AtcaInvalidSize)
    );
}
