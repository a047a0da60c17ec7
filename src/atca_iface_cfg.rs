use super::{AtcaDeviceType, AtcaIface, AtcaIfaceCfg, AtcaIfaceI2c, AtcaIfaceType, FrameVariant};
use super::{ATCA_DEFAULT_RX_RETRIES, ATCA_DEFAULT_WAKE_DELAY};
use log::{error, LevelFilter};

impl Default for AtcaIfaceCfg {
    fn default() -> AtcaIfaceCfg {
        AtcaIfaceCfg {
            iface_type: AtcaIfaceType::AtcaUnknownIface,
            devtype: AtcaDeviceType::AtcaDevUnknown,
            iface: None,
            wake_delay: ATCA_DEFAULT_WAKE_DELAY,
            rx_retries: ATCA_DEFAULT_RX_RETRIES,
            frame_variant: FrameVariant::Framed,
            log_level: LevelFilter::Info,
        }
    }
}

impl Default for AtcaIface {
    fn default() -> AtcaIface {
        AtcaIface {
            atcai2c: AtcaIfaceI2c::default(),
        }
    }
}

impl AtcaIfaceCfg {
    pub fn set_iface_type(mut self, iface_type: String) -> AtcaIfaceCfg {
        self.iface_type = match iface_type.as_str() {
            "i2c" => AtcaIfaceType::AtcaI2cIface,
            "test-interface" => AtcaIfaceType::AtcaTestIface,
            _ => {
                error!("Unsupported ATCA interface type {}", iface_type);
                AtcaIfaceType::AtcaUnknownIface
            }
        };
        self
    }
    pub fn set_devtype(mut self, devtype: String) -> AtcaIfaceCfg {
        self.devtype = match devtype.as_str() {
            "atsha204a" => AtcaDeviceType::ATSHA204A,
            "atecc108a" => AtcaDeviceType::ATECC108A,
            "atecc508a" => AtcaDeviceType::ATECC508A,
            "atecc608a" => AtcaDeviceType::ATECC608A,
            _ => {
                error!("Unsupported ATCA device type {}", devtype);
                AtcaDeviceType::AtcaDevUnknown
            }
        };
        self
    }
    pub fn set_wake_delay(mut self, wake_delay: u16) -> AtcaIfaceCfg {
        self.wake_delay = wake_delay;
        self
    }
    pub fn set_rx_retries(mut self, rx_retries: i32) -> AtcaIfaceCfg {
        self.rx_retries = rx_retries;
        self
    }
    pub fn set_frame_variant(mut self, frame_variant: FrameVariant) -> AtcaIfaceCfg {
        self.frame_variant = frame_variant;
        self
    }
    pub fn set_log_level(mut self, log_level: LevelFilter) -> AtcaIfaceCfg {
        self.log_level = log_level;
        self
    }
    pub fn set_iface(mut self, iface: AtcaIface) -> AtcaIfaceCfg {
        self.iface = Some(iface);
        self
    }

    /// Path of the character device backing the configured I2C bus
    pub fn bus_path(&self) -> Option<String> {
        self.iface
            .map(|iface| format!("/dev/i2c-{}", iface.atcai2c.bus))
    }
}

impl AtcaIface {
    pub fn set_atcai2c(mut self, atcai2c: AtcaIfaceI2c) -> AtcaIface {
        self.atcai2c = atcai2c;
        self
    }
}

impl AtcaIfaceI2c {
    pub fn set_slave_address(mut self, slave_address: u8) -> AtcaIfaceI2c {
        self.slave_address = slave_address;
        self
    }
    pub fn set_bus(mut self, bus: u8) -> AtcaIfaceI2c {
        self.bus = bus;
        self
    }
    pub fn set_baud(mut self, baud: u32) -> AtcaIfaceI2c {
        self.baud = baud;
        self
    }
}
