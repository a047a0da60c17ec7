use serial_test::serial;

use super::common;
use crate::crc::crc16;
use crate::{config_zone_lock_crc, AtcaStatus, DeviceState, WriteConfig, Zone};
use crate::{ATCA_BLOCK_SIZE, ATCA_RANDOM_BUFFER_SIZE};

#[test]
fn state_from_lock_flags() {
    assert_eq!(DeviceState::from_locks(false, false), Ok(DeviceState::Factory));
    assert_eq!(DeviceState::from_locks(true, false), Ok(DeviceState::Initialized));
    assert_eq!(DeviceState::from_locks(true, true), Ok(DeviceState::Personalized));
    assert_eq!(
        DeviceState::from_locks(false, true),
        Err(AtcaStatus::AtcaAssertFailure)
    );
    assert!(DeviceState::Factory < DeviceState::Initialized);
    assert!(DeviceState::Initialized < DeviceState::Personalized);
}

#[test]
fn lock_crc_of_config_image() {
    let device_image: Vec<u8> = (0u8..128).collect();
    let mut intended = device_image.clone();
    // serial number and lock bytes are taken from the device
    intended[0] = 0xAA;
    intended[86] = 0x00;
    assert_eq!(
        config_zone_lock_crc(&intended, &device_image),
        Ok(crc16(&device_image))
    );

    intended[30] ^= 0x01;
    assert_eq!(
        config_zone_lock_crc(&intended, &device_image),
        Err(AtcaStatus::AtcaConfigZoneMismatch)
    );
    assert_eq!(
        config_zone_lock_crc(&intended[..64], &device_image),
        Err(AtcaStatus::AtcaInvalidSize)
    );
}

#[test]
#[serial]
fn data_lock_needs_config_lock() {
    let (device, _chip) = common::soft_setup("atecc508a");
    assert_eq!(device.device_state(), Ok(DeviceState::Factory));
    assert_eq!(device.lock(Zone::Data, None), Err(AtcaStatus::AtcaNotLocked));
    assert_eq!(device.lock(Zone::Otp, None), Err(AtcaStatus::AtcaNotLocked));
    assert_eq!(
        device.burn_otp_zone(&common::otp_image()),
        Err(AtcaStatus::AtcaNotLocked)
    );
    assert_eq!(device.device_state(), Ok(DeviceState::Factory));
}

#[test]
#[serial]
fn config_mismatch_refuses_lock() {
    let (device, chip) = common::soft_setup("atecc508a");
    let mut config = common::config_image(&chip);
    // Never burnt, so the device still holds the factory image.
    config[40] ^= 0x0F;

    assert_eq!(
        device.lock_config_zone(&config),
        Err(AtcaStatus::AtcaConfigZoneMismatch)
    );
    assert_eq!(device.is_configuration_locked(), Ok(false));
}

#[test]
#[serial]
fn wrong_lock_crc_rejected_by_device() {
    let (device, _chip) = common::soft_setup("atecc508a");
    assert_eq!(
        device.lock(Zone::Config, Some(0x1234)),
        Err(AtcaStatus::AtcaExecutionError)
    );
    assert_eq!(device.device_state(), Ok(DeviceState::Factory));
}

#[test]
#[serial]
fn factory_to_personalized() {
    let (device, chip) = common::soft_setup("atecc508a");
    let mut config = common::config_image(&chip);
    // slot 10 becomes write-never
    config[20 + 10 * 2 + 1] = 0x80;
    let otp = common::otp_image();

    assert_eq!(device.burn_config_zone(&config), Ok(()));
    assert_eq!(device.device_state(), Ok(DeviceState::Factory));
    assert_eq!(device.lock_config_zone(&config), Ok(true));
    assert_eq!(device.device_state(), Ok(DeviceState::Initialized));
    assert_eq!(
        device.burn_config_zone(&config),
        Err(AtcaStatus::AtcaConfigZoneLocked)
    );
    assert_eq!(device.lock(Zone::Config, None), Ok(true));

    assert_eq!(device.burn_otp_zone(&otp), Ok(()));
    assert_eq!(device.lock(Zone::Data, None), Ok(true));
    assert_eq!(device.device_state(), Ok(DeviceState::Personalized));

    assert_eq!(&device.get_otp_zone().unwrap()[..], &otp[..]);
    assert_eq!(
        device.burn_otp_zone(&otp),
        Err(AtcaStatus::AtcaDataZoneLocked)
    );
    assert_eq!(device.get_config().unwrap()[10].config.write_config, WriteConfig::Never);
    assert_eq!(device.release().to_string(), "AtcaSuccess");
}

#[test]
#[serial]
fn personalize_is_idempotent() {
    let (device, chip) = common::soft_setup("atecc508a");
    let config = common::config_image(&chip);
    let otp = common::otp_image();

    assert_eq!(device.personalize(&config, &otp), Ok(DeviceState::Personalized));
    let writes = chip.writes();
    assert_eq!(device.personalize(&config, &otp), Ok(DeviceState::Personalized));
    // only the lock state was read back
    let state_reads = 2;
    assert_eq!(chip.writes(), writes + state_reads);
}

#[test]
#[serial]
fn personalize_resumes_from_initialized() {
    let (device, chip) = common::soft_setup("atecc508a");
    common::initialize(&device, &chip);
    assert_eq!(device.device_state(), Ok(DeviceState::Initialized));

    let config = common::config_image(&chip);
    assert_eq!(
        device.personalize(&config, &common::otp_image()),
        Ok(DeviceState::Personalized)
    );
}

#[test]
#[serial]
fn slot_access_after_personalization() {
    let (device, chip) = common::soft_setup("atecc508a");
    let config = common::config_image(&chip);
    assert_eq!(
        device.personalize(&config, &common::otp_image()),
        Ok(DeviceState::Personalized)
    );

    let data = [0x3Cu8; ATCA_BLOCK_SIZE];
    assert_eq!(device.write_slot(8, &data), Ok(true));
    assert_eq!(&device.read_slot(8).unwrap()[..], &data[..]);

    // private key slots are neither writable nor readable
    assert_eq!(
        device.write_slot(0, &data),
        Err(AtcaStatus::AtcaExecutionError)
    );
    assert_eq!(device.read_slot(0).err(), Some(AtcaStatus::AtcaExecutionError));

    let random = device.random(true).unwrap();
    assert_eq!(random.len(), ATCA_RANDOM_BUFFER_SIZE);
    assert!(random.chunks(4).any(|chunk| chunk != [0xFF, 0xFF, 0x00, 0x00]));

    let nonce = device.get_nonce().unwrap();
    assert_eq!(nonce.len(), ATCA_RANDOM_BUFFER_SIZE);
}
