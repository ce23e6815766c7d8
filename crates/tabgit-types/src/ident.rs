//! Human-facing id generation for columns, rows, and sheets.
//!
//! These ids are presentation-layer handles only. Object identity is always
//! the content hash ([`crate::ObjectId`]); generated ids exist so that
//! column/row metadata keeps a stable key across reorders and renames.

use chrono::Utc;
use rand::Rng;

const BASE36: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate an id of the form `{prefix}_{timestamp}_{random}`.
///
/// The timestamp segment is the current UNIX millisecond count in base 36;
/// the random segment is 48 bits of RNG output in base 36. Collisions are
/// possible in principle but never matter: these ids are map keys scoped to
/// a single structure, not identity.
pub fn generate_id(prefix: &str) -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;
    let random: u64 = rand::thread_rng().gen_range(0..(1u64 << 48));
    format!("{prefix}_{}_{}", to_base36(millis), to_base36(random))
}

fn to_base36(mut n: u64) -> String {
    if n == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while n > 0 {
        digits.push(BASE36[(n % 36) as usize]);
        n /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
