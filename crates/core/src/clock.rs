use chrono::{DateTime, Utc};
use rand::RngCore;
use sha2::{Digest, Sha256};

pub fn utc_now() -> DateTime<Utc> {
    Utc::now()
}

/// Opaque server-issued id: `<prefix>_<12 lowercase hex chars>`, e.g.
/// `w_3fa0c9d1e2ab` or `t_9b1dfe0a7c44`.
pub fn new_id(prefix: &str) -> String {
    let raw = uuid::Uuid::new_v4().simple().to_string();
    format!("{prefix}_{}", &raw[..12])
}

/// 256-bit-entropy bearer token, returned to the caller exactly once.
pub fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::rngs::OsRng.fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// One-way hash of a presented token. The store only ever persists this.
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}
