use rand::RngCore;

/// Returns `n_bytes` of OS-seeded randomness as a lowercase hex string (`2 * n_bytes` characters).
pub fn random_hex(n_bytes: usize) -> String {
    let mut buf = vec![0u8; n_bytes];
    rand::thread_rng().fill_bytes(&mut buf);
    hex::encode(buf)
}
