//! HMAC-SHA256 helpers shared by the payment gateways.
//!
//! Signatures travel as lowercase hex. Verification decodes the candidate and hands it to
//! [`Mac::verify_slice`], which compares in constant time.
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

fn keyed(secret: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail.
    <HmacSha256 as Mac>::new_from_slice(secret).unwrap_or_else(|_| unreachable!("HMAC takes keys of any size"))
}

pub fn hmac_sha256_hex(secret: &[u8], message: &[u8]) -> String {
    let mut mac = keyed(secret);
    mac.update(message);
    hex::encode(mac.finalize().into_bytes())
}

/// Returns `true` if `signature_hex` is the HMAC-SHA256 of `message` under `secret`.
pub fn verify_hmac_sha256_hex(secret: &[u8], message: &[u8], signature_hex: &str) -> bool {
    let Ok(candidate) = hex::decode(signature_hex.trim()) else {
        return false;
    };
    let mut mac = keyed(secret);
    mac.update(message);
    mac.verify_slice(&candidate).is_ok()
}
