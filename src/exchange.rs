use std::thread::sleep;

use log::{debug, error, warn};

use super::command::Command;
use super::crc::is_frame_crc_valid;
use super::response::{classify, classify_kernel, Response};
use super::transport::Transport;
use super::{AtcaStatus, FrameVariant, OctetBuffer, StatusCode};
use super::{ATCA_CRC_SIZE, ATCA_RSP_FRAME_OVERHEAD, ATCA_STATUS_FRAME_SIZE, ATCA_TX_RETRIES};

impl Transport {
    /// Runs one request/response exchange for `command`, whose answer carries
    /// `payload_len` bytes of data.
    ///
    /// An AWAKE status means the device missed the command, so the whole frame
    /// is sent again. A NAK means the response was not ready or arrived
    /// damaged, so only the read is repeated. Both loops are bounded.
    pub fn exchange(
        &mut self,
        command: &Command,
        payload_len: usize,
    ) -> Result<Response, AtcaStatus> {
        if self.log.enabled(log::Level::Debug) {
            debug!(
                "{} command, param1 0x{:02X}, param2 {:02X?}",
                command.opcode, command.param1, command.param2
            );
        }
        let frame = command.serialize(self.variant);
        match self.variant {
            FrameVariant::Framed => self.exchange_framed(command, &frame, payload_len),
            FrameVariant::Kernel => self.exchange_kernel(&frame, payload_len),
        }
    } // Transport::exchange()

    /// Exchange for commands whose response length is only known from its
    /// length prefix. Returns the payload of at most `max_payload_len` bytes.
    pub fn send_and_get_rsp(
        &mut self,
        command: &Command,
        max_payload_len: usize,
    ) -> Result<OctetBuffer, AtcaStatus> {
        if self.variant == FrameVariant::Kernel {
            return self.exchange(command, max_payload_len)?.into_payload();
        }
        let frame = command.serialize(self.variant);
        self.send(&frame)?;
        sleep(command.exec_time);

        let mut header = OctetBuffer::new(ATCA_STATUS_FRAME_SIZE);
        if self.read_sleep(&mut header).ok() != Some(ATCA_STATUS_FRAME_SIZE) {
            return Err(AtcaStatus::AtcaCommFail);
        }
        let frame_len = header[0] as usize;
        if frame_len == ATCA_STATUS_FRAME_SIZE {
            if !is_frame_crc_valid(&header) {
                return Err(AtcaStatus::AtcaRxCrcError);
            }
            return Response::Status(StatusCode::from(header[1])).into_payload();
        }
        let max_frame_len = max_payload_len + ATCA_RSP_FRAME_OVERHEAD;
        if frame_len < ATCA_STATUS_FRAME_SIZE || frame_len > max_frame_len {
            error!("Response length {} out of range", frame_len);
            return Err(AtcaStatus::AtcaInvalidSize);
        }

        let mut rest = OctetBuffer::new(frame_len - ATCA_STATUS_FRAME_SIZE);
        if self.read_sleep(&mut rest).ok() != Some(rest.len()) {
            return Err(AtcaStatus::AtcaCommFail);
        }
        let mut raw = header;
        raw.extend_from_slice(&rest);
        if !is_frame_crc_valid(&raw) {
            return Err(AtcaStatus::AtcaRxCrcError);
        }
        Ok(raw.slice(1, frame_len - 1 - ATCA_CRC_SIZE))
    } // Transport::send_and_get_rsp()

    // ---------------------------------------------------------------
    // Private functions
    // ---------------------------------------------------------------

    fn exchange_framed(
        &mut self,
        command: &Command,
        frame: &[u8],
        payload_len: usize,
    ) -> Result<Response, AtcaStatus> {
        for attempt in 1..=ATCA_TX_RETRIES {
            self.send(frame)?;

            let mut reads: u32 = 0;
            let response = loop {
                sleep(command.exec_time);
                reads += 1;
                match self.read_and_validate(payload_len) {
                    Response::Nak if reads < self.rx_retries => {
                        warn!("{}: no valid response, reading again", command.opcode);
                    }
                    Response::Nak => {
                        error!(
                            "{}: no valid response after {} reads",
                            command.opcode, reads
                        );
                        return Err(AtcaStatus::AtcaTooManyCommRetries);
                    }
                    other => break other,
                }
            };

            match response {
                Response::Status(StatusCode::Awake) => {
                    warn!("{}: device was asleep, sending again ({})", command.opcode, attempt);
                }
                other => {
                    if self.log.enabled(log::Level::Debug) {
                        if let Response::Status(status) = &other {
                            debug!("{}: response status {}", command.opcode, status);
                        }
                    }
                    return Ok(other);
                }
            }
        }
        error!(
            "{}: device out of sync after {} attempts",
            command.opcode, ATCA_TX_RETRIES
        );
        Err(AtcaStatus::AtcaTooManyCommRetries)
    } // Transport::exchange_framed()

    fn exchange_kernel(
        &mut self,
        frame: &[u8],
        payload_len: usize,
    ) -> Result<Response, AtcaStatus> {
        match self.write(frame) {
            Ok(written) if written == frame.len() => (),
            Ok(written) => {
                error!("Write failed, {} of {} bytes sent", written, frame.len());
                return Err(AtcaStatus::AtcaTxFail);
            }
            Err(err) => {
                error!("Write failed: {}", err);
                return Err(AtcaStatus::AtcaTxFail);
            }
        }
        let mut buffer = OctetBuffer::new(payload_len);
        match self.read(&mut buffer) {
            Ok(count) => Ok(classify_kernel(&buffer[..count])),
            Err(err) => {
                error!("Read failed: {}", err);
                Err(AtcaStatus::AtcaCommFail)
            }
        }
    } // Transport::exchange_kernel()

    /// Writes a frame. Anything short of two bytes leaves the bus unusable.
    fn send(&mut self, frame: &[u8]) -> Result<(), AtcaStatus> {
        match self.write(frame) {
            Ok(written) if written > 1 => Ok(()),
            Ok(written) => {
                error!("Send failed, {} bytes written", written);
                Err(AtcaStatus::AtcaTxFail)
            }
            Err(err) => {
                error!("Send failed: {}", err);
                Err(AtcaStatus::AtcaTxFail)
            }
        }
    } // Transport::send()

    /// One read attempt. Failed reads and damaged frames both come back as a NAK.
    fn read_and_validate(&mut self, payload_len: usize) -> Response {
        let mut buffer = OctetBuffer::new(payload_len + ATCA_RSP_FRAME_OVERHEAD);
        match self.read(&mut buffer) {
            Ok(count) => classify(&buffer[..count], payload_len),
            Err(_) => Response::Nak,
        }
    } // Transport::read_and_validate()
}
