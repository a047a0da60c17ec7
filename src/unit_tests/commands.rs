use serial_test::serial;
use std::time::Instant;

use super::common::{self, data_frame, TEST_KEY};
use crate::command::OpCode;
use crate::host_crypto::{ecdsa_p256_verify, sha256, EccKeyPair};
use crate::soft_mac::{hash_default, hmac_default, verify_hash_default, verify_hmac_default};
use crate::{AtcaStatus, OctetBuffer};
use crate::{ATCA_ATECC_PUB_KEY_SIZE, ATCA_KEY_SIZE, ATCA_RANDOM_BUFFER_SIZE, ATCA_SIG_SIZE};

const CHALLENGE: [u8; ATCA_KEY_SIZE] = [
    0x6C, 0x96, 0x3F, 0x1A, 0x02, 0x55, 0x80, 0xE4, 0x11, 0x2B, 0xC7, 0x9D, 0x40, 0x73, 0x5E, 0xA8,
    0x0D, 0xF1, 0x36, 0x99, 0xBE, 0x27, 0x48, 0x6A, 0xD3, 0x5C, 0x04, 0x8F, 0xE0, 0x1B, 0x72, 0xC5,
];

#[test]
#[serial]
fn random_before_config_lock() {
    let (device, _chip) = common::soft_setup("atecc508a");
    let random = device.random(false).unwrap();
    assert_eq!(random.len(), ATCA_RANDOM_BUFFER_SIZE);
    assert!(random.chunks(4).all(|chunk| chunk == [0xFF, 0xFF, 0x00, 0x00]));
    assert_eq!(device.release().to_string(), "AtcaSuccess");
}

#[test]
#[serial]
fn device_revision() {
    let (device, _chip) = common::soft_setup("atecc508a");
    assert_eq!(device.dev_rev(), Ok([0x00, 0x00, 0x50, 0x00]));
    let (device, _chip) = common::soft_setup("atsha204a");
    assert_eq!(device.dev_rev(), Ok([0x00, 0x02, 0x00, 0x09]));
}

#[test]
#[serial]
fn nonce_modes() {
    let (device, chip) = common::soft_setup("atecc508a");

    assert_eq!(device.gen_nonce(&TEST_KEY), Ok(OctetBuffer::new(0)));
    assert_eq!(chip.tempkey(), Some(TEST_KEY));

    let num_in = [0x21u8; 20];
    let rand_out = device.gen_nonce(&num_in).unwrap();
    assert_eq!(rand_out.len(), ATCA_RANDOM_BUFFER_SIZE);
    let mut message = rand_out.clone();
    message.extend_from_slice(&num_in);
    message.extend_from_slice(&[0x16, 0x00, 0x00]);
    assert_eq!(&chip.tempkey().unwrap()[..], &sha256(&message)[..]);

    assert_eq!(device.gen_nonce(&[0u8; 7]), Err(AtcaStatus::AtcaInvalidSize));
    assert_eq!(device.load_nonce(&CHALLENGE), Ok(true));
    assert_eq!(chip.tempkey(), Some(CHALLENGE));
}

#[test]
#[serial]
fn sleep_clears_tempkey() {
    let (device, chip) = common::soft_setup("atecc508a");
    chip.program_slot(8, &TEST_KEY);
    assert_eq!(device.load_nonce(&CHALLENGE), Ok(true));

    assert_eq!(device.idle(), Ok(()));
    assert!(!chip.is_awake());
    assert_eq!(device.wake(), Ok(()));
    assert_eq!(chip.tempkey(), Some(CHALLENGE));

    assert_eq!(device.sleep(), Ok(()));
    assert_eq!(device.wake(), Ok(()));
    assert_eq!(chip.tempkey(), None);
    assert_eq!(device.hmac(8).err(), Some(AtcaStatus::AtcaExecutionError));
}

#[test]
#[serial]
fn commands_fail_while_asleep() {
    let (device, _chip) = common::soft_setup("atecc508a");
    assert_eq!(device.sleep(), Ok(()));
    assert_eq!(device.random(false).err(), Some(AtcaStatus::AtcaTxFail));
    assert_eq!(device.wake(), Ok(()));
    assert!(device.random(false).is_ok());
}

#[test]
#[serial]
fn mac_matches_software_mirror() {
    let (device, chip) = common::soft_setup("atecc508a");
    chip.program_slot(9, &TEST_KEY);

    let digest = device.mac(9, &CHALLENGE).unwrap();
    assert_eq!(digest, hash_default(&CHALLENGE, &TEST_KEY, 9));
    assert!(verify_hash_default(&CHALLENGE, &digest, &TEST_KEY, 9));
    assert!(!verify_hash_default(&CHALLENGE, &digest, &TEST_KEY, 10));
}

#[test]
#[serial]
fn hmac_matches_software_mirror() {
    let (device, chip) = common::soft_setup("atecc508a");
    chip.program_slot(12, &TEST_KEY);

    assert_eq!(device.load_nonce(&CHALLENGE), Ok(true));
    let digest = device.hmac(12).unwrap();
    assert_eq!(digest, hmac_default(&CHALLENGE, &TEST_KEY, 12));
    assert!(verify_hmac_default(&CHALLENGE, &digest, &TEST_KEY, 12));
    assert!(!verify_hmac_default(&CHALLENGE, &digest, &TEST_KEY, 0));
}

#[test]
#[serial]
fn ecc_keys_need_locked_config() {
    let (device, _chip) = common::soft_setup("atecc508a");
    assert_eq!(
        device.gen_ecc_key(0, true).err(),
        Some(AtcaStatus::AtcaExecutionError)
    );
}

#[test]
#[serial]
fn sign_and_verify() {
    let (device, chip) = common::soft_setup("atecc608a");
    common::initialize(&device, &chip);

    let public_key = device.gen_ecc_key(2, true).unwrap();
    assert_eq!(public_key.len(), ATCA_ATECC_PUB_KEY_SIZE);
    assert_eq!(device.gen_ecc_key(2, false).unwrap(), public_key);
    assert_eq!(
        device.gen_ecc_key(8, true).err(),
        Some(AtcaStatus::AtcaExecutionError)
    );

    assert_eq!(device.load_nonce(&CHALLENGE), Ok(true));
    let signature = device.ecc_sign(2).unwrap();
    assert_eq!(signature.len(), ATCA_SIG_SIZE);
    assert_eq!(ecdsa_p256_verify(&public_key, &CHALLENGE, &signature), Ok(true));

    let mut key = [0u8; ATCA_ATECC_PUB_KEY_SIZE];
    key.copy_from_slice(&public_key);
    let mut sig = [0u8; ATCA_SIG_SIZE];
    sig.copy_from_slice(&signature);
    assert_eq!(device.ecc_verify(&key, &sig), Ok(true));

    sig[10] ^= 0x01;
    assert_eq!(device.ecc_verify(&key, &sig), Ok(false));
}

#[test]
#[serial]
fn genkey_waits_for_worst_case() {
    let (device, bus) = common::scripted_setup("atecc608a");
    let public_key = [0x3Cu8; ATCA_ATECC_PUB_KEY_SIZE];
    bus.push_read(&data_frame(&public_key));

    let start = Instant::now();
    assert_eq!(device.gen_ecc_key(0, true), Ok(OctetBuffer::from_slice(&public_key)));
    assert!(start.elapsed() >= OpCode::GenKey.max_exec_time());
    assert_eq!(bus.reads(), 1);
    assert_eq!(&bus.writes()[0][2..6], &[0x40, 0x04, 0x00, 0x00]);
}

#[test]
#[serial]
fn hash_sign_in_one_session() {
    const MESSAGE: &[u8] = b"firmware image 1.2.0";

    let (device, chip) = common::soft_setup("atecc608a");
    common::initialize(&device, &chip);
    let public_key = device.gen_ecc_key(1, true).unwrap();

    let signature = device.ecdsa_p256_hash_sign(MESSAGE, 1).unwrap();
    assert_eq!(signature.len(), ATCA_SIG_SIZE);
    assert!(!chip.is_awake());

    // The simulated chip signs SHA-256 of TempKey, which holds SHA-256 of the message.
    let digest = sha256(MESSAGE);
    assert_eq!(chip.tempkey().map(|key| key.to_vec()), Some(digest.to_vec()));
    assert_eq!(ecdsa_p256_verify(&public_key, &digest, &signature), Ok(true));
    assert_eq!(ecdsa_p256_verify(&public_key, MESSAGE, &signature), Ok(false));

    // Idle mode kept TempKey, the device checks its own signature after a wake.
    let mut key = [0u8; ATCA_ATECC_PUB_KEY_SIZE];
    key.copy_from_slice(&public_key);
    let mut sig = [0u8; ATCA_SIG_SIZE];
    sig.copy_from_slice(&signature);
    assert_eq!(device.wake(), Ok(()));
    assert_eq!(device.ecc_verify(&key, &sig), Ok(true));
}

#[test]
#[serial]
fn hash_sign_failure_leaves_device_idle() {
    let (device, chip) = common::soft_setup("atecc608a");
    common::initialize(&device, &chip);

    // no key was generated in slot 3
    assert_eq!(
        device.ecdsa_p256_hash_sign(b"data", 3).err(),
        Some(AtcaStatus::AtcaExecutionError)
    );
    assert!(!chip.is_awake());

    let writes = chip.writes();
    assert_eq!(
        device.ecdsa_p256_hash_sign(b"data", 16).err(),
        Some(AtcaStatus::AtcaInvalidId)
    );
    assert_eq!(chip.writes(), writes);

    let (device, chip) = common::soft_setup("atsha204a");
    let writes = chip.writes();
    assert_eq!(
        device.ecdsa_p256_hash_sign(b"data", 0).err(),
        Some(AtcaStatus::AtcaBadOpcode)
    );
    assert_eq!(chip.writes(), writes);
}

#[test]
#[serial]
fn verify_host_signature() {
    let (device, _chip) = common::soft_setup("atecc508a");
    let key_pair = EccKeyPair::generate().unwrap();
    let signature = key_pair.sign(&CHALLENGE).unwrap();

    let mut key = [0u8; ATCA_ATECC_PUB_KEY_SIZE];
    key.copy_from_slice(&key_pair.public_key());
    let mut sig = [0u8; ATCA_SIG_SIZE];
    sig.copy_from_slice(&signature);

    assert_eq!(device.load_nonce(&CHALLENGE), Ok(true));
    assert_eq!(device.ecc_verify(&key, &sig), Ok(true));
    assert_eq!(device.load_nonce(&TEST_KEY), Ok(true));
    assert_eq!(device.ecc_verify(&key, &sig), Ok(false));
}

#[test]
#[serial]
fn ecdh_command_layout() {
    let (device, bus) = common::scripted_setup("atecc508a");
    let secret = [0x77u8; ATCA_KEY_SIZE];
    bus.push_read(&data_frame(&secret));
    let peer = [0x42u8; ATCA_ATECC_PUB_KEY_SIZE];

    assert_eq!(device.ecdh(2, &peer), Ok(OctetBuffer::from_slice(&secret)));
    let writes = bus.writes();
    assert_eq!(writes.len(), 1);
    assert_eq!(writes[0][1] as usize, writes[0].len() - 1);
    assert_eq!(&writes[0][2..6], &[0x43, 0x0C, 0x02, 0x00]);
    assert_eq!(&writes[0][6..70], &peer[..]);
}

#[test]
#[serial]
fn ecdh_not_simulated() {
    let (device, chip) = common::soft_setup("atecc508a");
    common::initialize(&device, &chip);
    assert_eq!(
        device.ecdh(0, &[0x42u8; ATCA_ATECC_PUB_KEY_SIZE]).err(),
        Some(AtcaStatus::AtcaParseError)
    );
}

#[test]
#[serial]
fn ecc_commands_refused_on_atsha() {
    let (device, chip) = common::soft_setup("atsha204a");
    let writes = chip.writes();

    assert_eq!(device.gen_ecc_key(0, true).err(), Some(AtcaStatus::AtcaBadOpcode));
    assert_eq!(device.ecc_sign(0).err(), Some(AtcaStatus::AtcaBadOpcode));
    assert_eq!(
        device.ecc_verify(&[0u8; 64], &[0u8; 64]).err(),
        Some(AtcaStatus::AtcaBadOpcode)
    );
    assert_eq!(
        device.ecdh(0, &[0u8; 64]).err(),
        Some(AtcaStatus::AtcaBadOpcode)
    );
    assert_eq!(chip.writes(), writes);

    // SHA commands are still available
    chip.program_slot(1, &TEST_KEY);
    assert!(device.mac(1, &CHALLENGE).is_ok());
}

#[test]
#[serial]
fn faults_are_recovered() {
    let (device, chip) = common::soft_setup("atecc508a");

    let (reads, writes) = (chip.reads(), chip.writes());
    chip.inject_naks(3);
    assert!(device.read4(crate::Zone::Config, 0).is_ok());
    assert_eq!(chip.reads(), reads + 4);
    assert_eq!(chip.writes(), writes + 1);

    let (reads, writes) = (chip.reads(), chip.writes());
    chip.inject_awake(2);
    assert!(device.random(false).is_ok());
    assert_eq!(chip.writes(), writes + 3);
    assert_eq!(chip.reads(), reads + 3);

    let reads = chip.reads();
    chip.corrupt_crc(1);
    assert!(device.random(false).is_ok());
    assert_eq!(chip.reads(), reads + 2);

    chip.short_writes(1);
    assert_eq!(device.random(false).err(), Some(AtcaStatus::AtcaTxFail));
}

#[test]
#[serial]
fn too_many_naks_reported() {
    let (device, chip) = common::soft_setup("atecc508a");
    chip.inject_naks(50);
    assert_eq!(
        device.read4(crate::Zone::Config, 0).err(),
        Some(AtcaStatus::AtcaTooManyCommRetries)
    );
}
