use serde::Deserialize;
use std::collections::VecDeque;
use std::fs::read_to_string;
use std::io;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

// Types
use crate::crc::crc16_bytes;
use crate::sw_impl::SoftChip;
use crate::transport::AtcaBus;
use crate::{AtcaIface, AtcaIfaceCfg, AtcaIfaceI2c, AtcaStatus, AteccDevice};
// Constants
use crate::{ATCA_ATECC_CONFIG_BUFFER_SIZE, ATCA_OTP_ZONE_SIZE, ATCA_RSP_FRAME_OVERHEAD};
// Functions
use crate::setup_atecc_device;

#[derive(Deserialize)]
struct Config {
    pub device: Device,
    pub interface: Option<Interface>,
}

#[derive(Deserialize)]
struct Device {
    pub device_type: String,
    pub iface_type: String,
    pub wake_delay: Option<u16>,
    pub rx_retries: Option<i32>,
}

#[derive(Deserialize, Copy, Clone)]
struct Interface {
    pub slave_address: u8,
    pub bus: u8,
    pub baud: u32,
}

pub(crate) const TEST_KEY: [u8; 32] = [
    0x4D, 0x50, 0x72, 0x6F, 0x20, 0x49, 0x4F, 0x20, 0x4B, 0x65, 0x79, 0x20, 0x9E, 0x31, 0xBD, 0x05,
    0x82, 0x58, 0x76, 0xCE, 0x37, 0x90, 0xEA, 0x77, 0x42, 0x32, 0xBB, 0x51, 0x81, 0x49, 0x66, 0x45,
];

pub(crate) const WAKE_RESPONSE: [u8; 4] = [0x04, 0x11, 0x33, 0x43];

pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

pub(crate) fn iface_setup(config_file: String) -> Result<AtcaIfaceCfg, String> {
    let config_path = Path::new(&config_file);
    let config_string = read_to_string(config_path).expect("file not found");
    let config: Config = toml::from_str(&config_string).unwrap();
    let mut iface_cfg = AtcaIfaceCfg::default()
        .set_iface_type(config.device.iface_type.clone())
        .set_devtype(config.device.device_type);
    if let Some(wake_delay) = config.device.wake_delay {
        iface_cfg = iface_cfg.set_wake_delay(wake_delay);
    }
    if let Some(rx_retries) = config.device.rx_retries {
        iface_cfg = iface_cfg.set_rx_retries(rx_retries);
    }
    if let Some(interface) = config.interface {
        iface_cfg = iface_cfg.set_iface(
            AtcaIface::default().set_atcai2c(
                AtcaIfaceI2c::default()
                    .set_slave_address(interface.slave_address)
                    .set_bus(interface.bus)
                    .set_baud(interface.baud),
            ),
        );
    }

    match config.device.iface_type.as_str() {
        "i2c" | "test-interface" => Ok(iface_cfg),
        _ => Err("unsupported interface type".to_owned()),
    }
}

/// Setup tests.
pub(crate) fn test_setup() -> AteccDevice {
    init_logger();
    let result_iface_cfg = iface_setup("config.toml".to_owned());
    assert!(result_iface_cfg.is_ok());

    let result = setup_atecc_device(result_iface_cfg.unwrap());
    match result {
        Ok(_) => (),
        Err(err) => panic!("{}", err),
    };

    result.unwrap()
}

pub(crate) fn soft_cfg(device_type: &str) -> AtcaIfaceCfg {
    AtcaIfaceCfg::default()
        .set_iface_type("test-interface".to_owned())
        .set_devtype(device_type.to_owned())
        .set_wake_delay(0)
}

/// A woken up device on a fresh simulated chip, plus a handle on the chip
pub(crate) fn soft_setup(device_type: &str) -> (AteccDevice, SoftChip) {
    init_logger();
    let chip = SoftChip::new(soft_cfg(device_type).devtype);
    let device = AteccDevice::with_bus(Box::new(chip.clone()), &soft_cfg(device_type)).unwrap();
    assert_eq!(device.wake(), Ok(()));
    (device, chip)
}

/// The chip's factory configuration image as a fixed-size array
pub(crate) fn config_image(chip: &SoftChip) -> [u8; ATCA_ATECC_CONFIG_BUFFER_SIZE] {
    let mut config = [0u8; ATCA_ATECC_CONFIG_BUFFER_SIZE];
    config.copy_from_slice(&chip.config_zone());
    config
}

pub(crate) fn otp_image() -> [u8; ATCA_OTP_ZONE_SIZE] {
    let mut otp = [0u8; ATCA_OTP_ZONE_SIZE];
    otp.copy_from_slice(&crate::build_otp_zone());
    otp
}

/// Burns and locks the configuration zone, leaving the device Initialized
pub(crate) fn initialize(device: &AteccDevice, chip: &SoftChip) {
    let config = config_image(chip);
    assert_eq!(device.burn_config_zone(&config), Ok(()));
    assert_eq!(device.lock_config_zone(&config), Ok(true));
}

pub(crate) fn status_frame(status: u8) -> Vec<u8> {
    let mut frame = vec![0x04, status];
    let crc = crc16_bytes(&frame);
    frame.extend_from_slice(&crc);
    frame
}

pub(crate) fn data_frame(payload: &[u8]) -> Vec<u8> {
    let mut frame = vec![(payload.len() + ATCA_RSP_FRAME_OVERHEAD) as u8];
    frame.extend_from_slice(payload);
    let crc = crc16_bytes(&frame);
    frame.extend_from_slice(&crc);
    frame
}

static SCRIPT_COUNTER: AtomicUsize = AtomicUsize::new(0);

#[derive(Default)]
struct Script {
    /// `None` stands for a read the device does not acknowledge
    reads: VecDeque<Option<Vec<u8>>>,
    writes: Vec<Vec<u8>>,
    read_calls: usize,
    short_write: Option<usize>,
}

/// A bus replaying canned reads and recording every write
#[derive(Clone)]
pub(crate) struct ScriptedBus {
    id: String,
    script: Arc<Mutex<Script>>,
}

impl ScriptedBus {
    pub(crate) fn new() -> ScriptedBus {
        ScriptedBus {
            id: format!(
                "scripted-bus-{}",
                SCRIPT_COUNTER.fetch_add(1, Ordering::SeqCst)
            ),
            script: Arc::new(Mutex::new(Script::default())),
        }
    }

    pub(crate) fn push_read(&self, bytes: &[u8]) {
        self.script.lock().unwrap().reads.push_back(Some(bytes.to_vec()));
    }

    pub(crate) fn push_nak(&self) {
        self.script.lock().unwrap().reads.push_back(None);
    }

    /// Every following write reports `count` bytes transferred
    pub(crate) fn set_short_write(&self, count: usize) {
        self.script.lock().unwrap().short_write = Some(count);
    }

    pub(crate) fn writes(&self) -> Vec<Vec<u8>> {
        self.script.lock().unwrap().writes.clone()
    }

    pub(crate) fn reads(&self) -> usize {
        self.script.lock().unwrap().read_calls
    }
}

impl AtcaBus for ScriptedBus {
    fn identifier(&self) -> String {
        self.id.clone()
    }

    fn acquire(&mut self, _address: u8) -> Result<(), AtcaStatus> {
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        let mut script = self.script.lock().unwrap();
        script.writes.push(data.to_vec());
        Ok(script.short_write.unwrap_or(data.len()))
    }

    fn read(&mut self, buffer: &mut [u8]) -> io::Result<usize> {
        let mut script = self.script.lock().unwrap();
        script.read_calls += 1;
        match script.reads.pop_front() {
            Some(Some(bytes)) => {
                let count = bytes.len().min(buffer.len());
                buffer[..count].copy_from_slice(&bytes[..count]);
                Ok(count)
            }
            _ => Err(io::Error::new(io::ErrorKind::Other, "not acknowledged")),
        }
    }
}

/// A device on a scripted bus, never woken up
pub(crate) fn scripted_setup(device_type: &str) -> (AteccDevice, ScriptedBus) {
    init_logger();
    let bus = ScriptedBus::new();
    let device = AteccDevice::with_bus(Box::new(bus.clone()), &soft_cfg(device_type)).unwrap();
    (device, bus)
}
