use chrono::{NaiveDateTime, Timelike, Utc};
use data_encoding::HEXUPPER;
use ring::digest::{Context, SHA256};

/// Timestamp format used both for hashing and for the ledger view.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Current UTC time truncated to whole seconds
pub fn current_timestamp() -> NaiveDateTime {
    let now = Utc::now().naive_utc();
    now.with_nanosecond(0).unwrap_or(now)
}

pub fn sha256_digest(data: &[u8]) -> Vec<u8> {
    let mut context = Context::new(&SHA256);
    context.update(data);
    let digest = context.finish();
    digest.as_ref().to_vec()
}

/// SHA-256 over the UTF-8 bytes of `text`, rendered as upper-case hex
pub fn sha256_hex_upper(text: &str) -> String {
    HEXUPPER.encode(sha256_digest(text.as_bytes()).as_slice())
}
