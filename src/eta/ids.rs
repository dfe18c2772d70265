//! Synthetic correlation identifiers.

use chrono::{DateTime, Utc};
use rand::{Rng, RngCore};
use uuid::Builder;

/// Long ID: `ETA{yyyyMMdd}{6 digits}`.
pub fn long_id<R: RngCore>(rng: &mut R, now: DateTime<Utc>) -> String {
    let serial: u32 = rng.random_range(100_000..999_999);
    format!("ETA{}{serial}", now.format("%Y%m%d"))
}

/// Internal ID: `INT` followed by the first 8 hex digits of a random UUID,
/// uppercased.
pub fn internal_id<R: RngCore>(rng: &mut R) -> String {
    let uuid = submission_uuid(rng);
    let hex = uuid.simple().to_string();
    format!("INT{}", hex[..8].to_ascii_uppercase())
}

/// A random v4 UUID drawn from `rng`.
pub fn submission_uuid<R: RngCore>(rng: &mut R) -> uuid::Uuid {
    let mut bytes = [0u8; 16];
    rng.fill_bytes(&mut bytes);
    Builder::from_random_bytes(bytes).into_uuid()
}
