//! util — small shared helpers (time, hashing, hex, human-readable sizes).

use sha2::{Digest, Sha256};

/// Current Unix time in milliseconds.
#[inline]
pub fn now_ms() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex_encode(&hasher.finalize())
}

pub fn hex_encode(bytes: &[u8]) -> String {
    const HEX: &[u8; 16] = b"0123456789abcdef";
    let mut out = String::with_capacity(bytes.len() * 2);
    for &b in bytes {
        out.push(HEX[(b >> 4) as usize] as char);
        out.push(HEX[(b & 0x0f) as usize] as char);
    }
    out
}

/// Random hex string of `n_bytes * 2` chars (OS RNG).
pub fn random_hex(n_bytes: usize) -> String {
    use rand::RngCore;
    let mut buf = vec![0u8; n_bytes];
    rand::rngs::OsRng.fill_bytes(&mut buf);
    hex_encode(&buf)
}

/// 1536 -> "1.50 KB", 0 -> "0 B".
pub fn human_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];
    if bytes < 1024 {
        return format!("{} B", bytes);
    }
    let mut v = bytes as f64;
    let mut unit = 0;
    while v >= 1024.0 && unit < UNITS.len() - 1 {
        v /= 1024.0;
        unit += 1;
    }
    format!("{:.2} {}", v, UNITS[unit])
}

/// Unix ms -> "YYYYMMDD-HHMMSS" (UTC). Out-of-range values fall back to the raw number.
pub fn compact_utc(ts_ms: u64) -> String {
    match chrono::DateTime::from_timestamp_millis(ts_ms as i64) {
        Some(dt) => dt.format("%Y%m%d-%H%M%S").to_string(),
        None => ts_ms.to_string(),
    }
}

/// Unix ms -> RFC 3339 (UTC), for human-readable listings.
pub fn rfc3339_utc(ts_ms: u64) -> String {
    match chrono::DateTime::from_timestamp_millis(ts_ms as i64) {
        Some(dt) => dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        None => ts_ms.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn now_ms_monotonic_nonzero() {
        let a = now_ms();
        let b = now_ms();
        assert!(a > 0);
        assert!(b >= a);
    }

    #[test]
    fn human_size_units() {
        assert_eq!(human_size(0), "0 B");
        assert_eq!(human_size(1023), "1023 B");
        assert_eq!(human_size(1536), "1.50 KB");
        assert_eq!(human_size(50 * 1024 * 1024), "50.00 MB");
    }

    #[test]
    fn sha256_known_vector() {
        assert_eq!(
            sha256_hex(b"abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn random_hex_len() {
        let h = random_hex(4);
        assert_eq!(h.len(), 8);
        assert!(h.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn compact_utc_epoch() {
        assert_eq!(compact_utc(0), "19700101-000000");
        assert_eq!(compact_utc(1_000), "19700101-000001");
    }
}
