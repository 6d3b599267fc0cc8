#![allow(clippy::unwrap_used, clippy::expect_used)]

use crypto_service::{
    Algorithm, CryptoService, HashOperation, INVALID_HANDLE, KeyType, MAX_HASH_SIZE,
    MAX_MAC_SIZE, MacOperation, ServiceConfig, Status,
};
use crypto_service_logger::log_init;

const SHA256_ABC: &str = "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad";
// RFC 4231, test case 2
const HMAC_KEY: &[u8] = b"Jefe";
const HMAC_DATA: &[u8] = b"what do ya want for nothing?";
const HMAC_SHA256_TAG: &str = "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843";

fn service() -> CryptoService {
    log_init(None);
    CryptoService::new(&ServiceConfig::default()).unwrap()
}

fn digest(svc: &mut CryptoService, algorithm: Algorithm, parts: &[&[u8]]) -> Vec<u8> {
    let mut op = HashOperation::default();
    svc.hash_setup(&mut op, algorithm).unwrap();
    for part in parts {
        svc.hash_update(&mut op, part).unwrap();
    }
    let mut out = [0_u8; MAX_HASH_SIZE];
    let n = svc.hash_finish(&mut op, &mut out).unwrap();
    out[..n].to_vec()
}

#[test]
fn hash_known_answer_and_update_associativity() {
    let mut svc = service();
    assert_eq!(hex::encode(digest(&mut svc, Algorithm::Sha256, &[b"abc"])), SHA256_ABC);
    assert_eq!(
        hex::encode(digest(&mut svc, Algorithm::Sha256, &[b"a", b"", b"bc"])),
        SHA256_ABC
    );

    let data = [0x3c_u8; 300];
    for algorithm in [
        Algorithm::Sha224,
        Algorithm::Sha256,
        Algorithm::Sha384,
        Algorithm::Sha512,
    ] {
        let whole = digest(&mut svc, algorithm, &[&data]);
        let split = digest(&mut svc, algorithm, &[&data[..1], &data[1..129], &data[129..]]);
        assert_eq!(whole, split, "{algorithm}");
    }
    assert_eq!(svc.registry().in_use(), 0);
}

#[test]
fn hash_finish_retry_after_buffer_too_small() {
    let mut svc = service();
    let mut op = HashOperation::default();
    svc.hash_setup(&mut op, Algorithm::Sha256).unwrap();
    svc.hash_update(&mut op, b"abc").unwrap();

    let mut small = [0_u8; 31];
    let err = svc.hash_finish(&mut op, &mut small).unwrap_err();
    assert_eq!(err.status(), Status::BufferTooSmall);
    assert!(op.is_active());

    let mut out = [0_u8; 32];
    assert_eq!(svc.hash_finish(&mut op, &mut out).unwrap(), 32);
    assert_eq!(hex::encode(out), SHA256_ABC);
    assert!(!op.is_active());

    // finish after finish
    let err = svc.hash_finish(&mut op, &mut out).unwrap_err();
    assert_eq!(err.status(), Status::InvalidHandle);
}

#[test]
fn hash_verify_releases_on_match_and_mismatch() {
    let mut svc = service();
    let expected = hex::decode(SHA256_ABC).unwrap();

    let mut op = HashOperation::default();
    svc.hash_setup(&mut op, Algorithm::Sha256).unwrap();
    svc.hash_update(&mut op, b"abc").unwrap();
    svc.hash_verify(&mut op, &expected).unwrap();
    assert_eq!(op.handle, INVALID_HANDLE);

    let mut op = HashOperation::default();
    svc.hash_setup(&mut op, Algorithm::Sha256).unwrap();
    svc.hash_update(&mut op, b"abd").unwrap();
    let handle = op.handle;
    let err = svc.hash_verify(&mut op, &expected).unwrap_err();
    assert_eq!(err.status(), Status::InvalidSignature);
    assert_eq!(op.handle, INVALID_HANDLE);

    let mut stale = HashOperation { handle };
    assert_eq!(
        svc.hash_update(&mut stale, b"x").unwrap_err().status(),
        Status::InvalidHandle
    );

    // a truncated digest never matches
    let mut op = HashOperation::default();
    svc.hash_setup(&mut op, Algorithm::Sha256).unwrap();
    svc.hash_update(&mut op, b"abc").unwrap();
    let err = svc.hash_verify(&mut op, &expected[..16]).unwrap_err();
    assert_eq!(err.status(), Status::InvalidSignature);
    assert_eq!(svc.registry().in_use(), 0);
}

#[test]
fn hash_setup_rejects_unknown_algorithm_identifier() {
    let err = Algorithm::try_from(0x0100_00ff).unwrap_err();
    assert_eq!(err.status(), Status::UnsupportedAlgorithm);

    let mut svc = service();
    let mut op = HashOperation::default();
    let err = svc.hash_setup(&mut op, Algorithm::Ctr).unwrap_err();
    assert_eq!(err.status(), Status::UnsupportedAlgorithm);
    assert!(!op.is_active());
}

#[test]
fn mac_sign_and_verify() {
    let mut svc = service();
    svc.import_key(4, KeyType::Hmac, HMAC_KEY).unwrap();

    let mut op = MacOperation::default();
    svc.mac_sign_setup(&mut op, 4, Algorithm::HmacSha256).unwrap();
    svc.mac_update(&mut op, &HMAC_DATA[..10]).unwrap();
    svc.mac_update(&mut op, &HMAC_DATA[10..]).unwrap();
    let mut small = [0_u8; 16];
    assert_eq!(
        svc.mac_sign_finish(&mut op, &mut small).unwrap_err().status(),
        Status::BufferTooSmall
    );
    let mut tag = [0_u8; MAX_MAC_SIZE];
    let n = svc.mac_sign_finish(&mut op, &mut tag).unwrap();
    assert_eq!(hex::encode(&tag[..n]), HMAC_SHA256_TAG);
    assert!(!op.is_active());

    svc.mac_verify_setup(&mut op, 4, Algorithm::HmacSha256).unwrap();
    svc.mac_update(&mut op, HMAC_DATA).unwrap();
    svc.mac_verify_finish(&mut op, &tag[..n]).unwrap();

    svc.mac_verify_setup(&mut op, 4, Algorithm::HmacSha256).unwrap();
    svc.mac_update(&mut op, b"something else").unwrap();
    let err = svc.mac_verify_finish(&mut op, &tag[..n]).unwrap_err();
    assert_eq!(err.status(), Status::InvalidSignature);
    assert!(!op.is_active());
    assert_eq!(svc.registry().in_use(), 0);
}

#[test]
fn mac_direction_mismatch_is_bad_state() {
    let mut svc = service();
    svc.import_key(4, KeyType::Hmac, HMAC_KEY).unwrap();
    let mut op = MacOperation::default();
    svc.mac_verify_setup(&mut op, 4, Algorithm::HmacSha512).unwrap();
    let err = svc.mac_sign_finish(&mut op, &mut [0; 64]).unwrap_err();
    assert_eq!(err.status(), Status::BadState);
    assert!(!op.is_active());
    assert_eq!(svc.registry().in_use(), 0);
}

#[test]
fn mac_setup_checks() {
    let mut svc = service();
    svc.import_key(1, KeyType::Aes, &[0; 16]).unwrap();
    svc.import_key(2, KeyType::Hmac, HMAC_KEY).unwrap();
    let mut op = MacOperation::default();

    let err = svc.mac_sign_setup(&mut op, 1, Algorithm::HmacSha256).unwrap_err();
    assert_eq!(err.status(), Status::InvalidAlgorithm);
    let err = svc.mac_sign_setup(&mut op, 2, Algorithm::Sha256).unwrap_err();
    assert_eq!(err.status(), Status::InvalidAlgorithm);
    let err = svc.mac_sign_setup(&mut op, 5, Algorithm::HmacSha256).unwrap_err();
    assert_eq!(err.status(), Status::InvalidKeyId);
    assert_eq!(svc.registry().in_use(), 0);

    svc.mac_sign_setup(&mut op, 2, Algorithm::HmacSha384).unwrap();
    svc.mac_abort(&mut op).unwrap();
    assert_eq!(
        svc.mac_abort(&mut MacOperation { handle: 1 }).unwrap_err().status(),
        Status::InvalidHandle
    );
}
