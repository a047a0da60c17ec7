use std::io;
use std::thread::sleep;
use std::time::Duration;

use log::{debug, error, log_enabled, trace, warn, Level, LevelFilter};

use super::crc::is_frame_crc_valid;
use super::{AtcaIfaceCfg, AtcaStatus, FrameVariant};
use super::{
    ATCA_DEFAULT_RX_RETRIES, ATCA_STATUS_FRAME_SIZE, ATCA_WAKE_RETRIES, ATCA_WORD_ADDRESS_IDLE,
    ATCA_WORD_ADDRESS_SLEEP,
};

/// Number of attempts made by `Transport::read_sleep()`
const READ_SLEEP_RETRIES: u32 = 3;
/// Pause between two attempts of `Transport::read_sleep()`
const READ_SLEEP_BACKOFF: Duration = Duration::from_millis(1);

/// A byte-oriented duplex channel to one device.
///
/// Opening happens in the implementor's constructor and closing in its `Drop`.
pub trait AtcaBus: Send {
    /// A name unique to the physical bus and address, used to keep two
    /// drivers off the same device
    fn identifier(&self) -> String;
    /// Binds the channel to the device's bus address
    fn acquire(&mut self, address: u8) -> Result<(), AtcaStatus>;
    fn write(&mut self, data: &[u8]) -> io::Result<usize>;
    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize>;
}

/// Logging settings owned by one driver instance
#[derive(Copy, Clone, Debug)]
pub struct LogContext {
    level: LevelFilter,
}

impl LogContext {
    pub fn new(level: LevelFilter) -> LogContext {
        LogContext { level }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.level && log_enabled!(level)
    }

    /// Dumps `data` as hex at debug level
    pub fn hex_dump(&self, label: &str, data: &[u8]) {
        if self.enabled(Level::Debug) {
            debug!("{} ({} bytes): {:02X?}", label, data.len(), data);
        }
    }
}

impl Default for LogContext {
    fn default() -> LogContext {
        LogContext::new(LevelFilter::Info)
    }
}

/// Power control and raw I/O over a bus channel
pub struct Transport {
    bus: Box<dyn AtcaBus>,
    pub(crate) variant: FrameVariant,
    pub(crate) wake_delay: Duration,
    pub(crate) rx_retries: u32,
    pub(crate) log: LogContext,
}

impl Transport {
    pub fn new(bus: Box<dyn AtcaBus>, cfg: &AtcaIfaceCfg) -> Transport {
        let rx_retries = if cfg.rx_retries > 0 {
            cfg.rx_retries as u32
        } else {
            ATCA_DEFAULT_RX_RETRIES as u32
        };
        Transport {
            bus,
            variant: cfg.frame_variant,
            wake_delay: Duration::from_micros(cfg.wake_delay as u64),
            rx_retries,
            log: LogContext::new(cfg.log_level),
        }
    } // Transport::new()

    pub fn identifier(&self) -> String {
        self.bus.identifier()
    }

    pub fn acquire(&mut self, address: u8) -> Result<(), AtcaStatus> {
        self.bus.acquire(address)
    } // Transport::acquire()

    /// Sends the wake token and waits for the 4-byte wake response.
    /// Gives up after a bounded number of attempts.
    pub fn wakeup(&mut self) -> bool {
        // Kernel drivers wake the device on their own.
        if self.variant == FrameVariant::Kernel {
            return true;
        }
        let wake_token = [0x00u8; 2];
        for attempt in 1..=ATCA_WAKE_RETRIES {
            match self.bus.write(&wake_token) {
                Ok(written) if written > 1 => {
                    sleep(self.wake_delay);
                    let mut buffer = [0u8; ATCA_STATUS_FRAME_SIZE];
                    match self.bus.read(&mut buffer) {
                        Ok(ATCA_STATUS_FRAME_SIZE) if is_frame_crc_valid(&buffer) => {
                            self.log.hex_dump("Wake response", &buffer);
                            return true;
                        }
                        Ok(_) => warn!("Invalid wake response, attempt {}", attempt),
                        Err(err) => warn!("No wake response ({}), attempt {}", err, attempt),
                    }
                }
                // The device holds the bus while it wakes up, a failed token is expected.
                _ => trace!("Wake token not acknowledged, attempt {}", attempt),
            }
            sleep(self.wake_delay);
        }
        error!("Device did not wake up after {} attempts", ATCA_WAKE_RETRIES);
        false
    } // Transport::wakeup()

    /// Puts the device into idle mode, which preserves TempKey
    pub fn idle(&mut self) -> bool {
        self.send_control(ATCA_WORD_ADDRESS_IDLE, "idle")
    } // Transport::idle()

    /// Puts the device to sleep, which clears TempKey
    pub fn sleep(&mut self) -> bool {
        self.send_control(ATCA_WORD_ADDRESS_SLEEP, "sleep")
    } // Transport::sleep()

    pub fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.log.hex_dump("Sending", data);
        self.bus.write(data)
    } // Transport::write()

    pub fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let result = self.bus.read(buffer);
        if let Ok(count) = result {
            self.log.hex_dump("Received", &buffer[..count]);
        }
        result
    } // Transport::read()

    /// Read that retries a failed attempt a few times after a short pause
    pub fn read_sleep(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut attempt = 1;
        loop {
            match self.read(buffer) {
                Ok(count) => return Ok(count),
                Err(err) if attempt < READ_SLEEP_RETRIES => {
                    trace!("Read failed ({}), retrying", err);
                    attempt += 1;
                    sleep(READ_SLEEP_BACKOFF);
                }
                Err(err) => return Err(err),
            }
        }
    } // Transport::read_sleep()

    // ---------------------------------------------------------------
    // Private functions
    // ---------------------------------------------------------------

    fn send_control(&mut self, word_address: u8, name: &str) -> bool {
        if self.variant == FrameVariant::Kernel {
            return true;
        }
        match self.bus.write(&[word_address]) {
            Ok(1) => true,
            Ok(_) => {
                error!("Short write while sending {}", name);
                false
            }
            Err(err) => {
                error!("Failed to send {}: {}", name, err);
                false
            }
        }
    } // Transport::send_control()
}
