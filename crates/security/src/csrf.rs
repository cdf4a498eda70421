//! Double-submit CSRF tokens.

use rand::RngCore;
use subtle::ConstantTimeEq;

const TOKEN_BYTES: usize = 32;

/// A fresh random token, hex encoded
pub fn generate_token() -> String {
    let mut bytes = [0u8; TOKEN_BYTES];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Only state-changing methods are checked
pub fn requires_check(method: &str) -> bool {
    matches!(
        method.to_ascii_uppercase().as_str(),
        "POST" | "PUT" | "PATCH" | "DELETE"
    )
}

/// Header and cookie must both be present and equal
pub fn verify(header: Option<&str>, cookie: Option<&str>) -> bool {
    match (header, cookie) {
        (Some(header), Some(cookie)) if !header.is_empty() => {
            header.as_bytes().ct_eq(cookie.as_bytes()).into()
        }
        _ => false,
    }
}
