use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// CSRF-style nonce: hex HMAC of the session token under the server secret.
pub fn create_nonce(secret: &str, session_token: &str) -> String {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(session_token.as_bytes());
    hex::encode(mac.finalize().into_bytes())
}

pub fn verify_nonce(secret: &str, session_token: &str, nonce: &str) -> bool {
    let Ok(expected) = hex::decode(nonce) else {
        return false;
    };
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC accepts any key length");
    mac.update(session_token.as_bytes());
    mac.verify_slice(&expected).is_ok()
}
