mod hmac_signature;
mod ids;

pub use hmac_signature::{hmac_sha256_hex, verify_hmac_sha256_hex};
pub use ids::random_hex;
