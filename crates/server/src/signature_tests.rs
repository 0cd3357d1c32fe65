use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::signature::verify_signature;

fn sign(secret: &str, body: &[u8]) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes()).unwrap();
    mac.update(body);
    hex::encode(mac.finalize().into_bytes())
}

#[test]
fn test_valid_signature_verifies() {
    let secret = "test_secret";
    let body = b"{\"action\":\"opened\"}";

    let signature = sign(secret, body);

    assert!(verify_signature(secret, body, &signature));
}

#[test]
fn test_sha256_prefixed_signature_verifies() {
    let secret = "test_secret";
    let body = b"payload bytes";

    let signature = format!("sha256={}", sign(secret, body));

    assert!(verify_signature(secret, body, &signature));
}

#[test]
fn test_mutated_body_fails_verification() {
    let secret = "test_secret";
    let body = b"payload bytes";
    let signature = sign(secret, body);

    assert!(!verify_signature(secret, b"payload byteZ", &signature));
}

#[test]
fn test_mutated_signature_fails_verification() {
    let secret = "test_secret";
    let body = b"payload bytes";
    let mut signature = sign(secret, body);

    // Flip one hex digit.
    let last = signature.pop().unwrap();
    signature.push(if last == '0' { '1' } else { '0' });

    assert!(!verify_signature(secret, body, &signature));
}

#[test]
fn test_wrong_secret_fails_verification() {
    let body = b"payload bytes";
    let signature = sign("secret_a", body);

    assert!(!verify_signature("secret_b", body, &signature));
}

#[test]
fn test_non_hex_signature_fails_verification() {
    assert!(!verify_signature("secret", b"body", "not-hex-at-all"));
}

#[test]
fn test_empty_signature_fails_verification() {
    assert!(!verify_signature("secret", b"body", ""));
}
