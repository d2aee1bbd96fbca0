//! Record ID generation.
//!
//! IDs are `<prefix>-<hash>` where the hash is base36 (0-9, a-z) from
//! SHA256 over a content seed, with adaptive length based on store
//! size and nonce probing on collision.

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

/// Prefix for issue IDs.
pub const ISSUE_ID_PREFIX: &str = "it";

/// Prefix for project IDs.
pub const PROJECT_ID_PREFIX: &str = "pr";

/// Generate a unique record ID with the given prefix.
///
/// `seed` is the record's identifying content (e.g. `title|creator`),
/// `record_count` sizes the hash via a birthday-bound estimate, and
/// the `exists` closure checks candidates for collisions.
pub fn generate_id<F>(
    prefix: &str,
    seed: &str,
    created_at: DateTime<Utc>,
    record_count: usize,
    exists: F,
) -> String
where
    F: Fn(&str) -> bool,
{
    let mut length = optimal_hash_length(record_count);

    loop {
        for nonce in 0..10 {
            let id = format!("{prefix}-{}", hash_candidate(seed, created_at, nonce, length));
            if !exists(&id) {
                return id;
            }
        }

        if length < 8 {
            length += 1;
        } else {
            // All short candidates collided: go long and keep probing.
            tracing::warn!(prefix, record_count, "short id candidates exhausted");
            let mut nonce = 0u32;
            loop {
                let hash_str = hash_candidate(seed, created_at, nonce, 12);
                let id = format!("{prefix}-{hash_str}");
                if !exists(&id) {
                    return id;
                }
                nonce += 1;
                if nonce > 1000 {
                    return format!("{prefix}-{hash_str}{nonce}");
                }
            }
        }
    }
}

/// Compute the optimal hash length for a given record count.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn optimal_hash_length(record_count: usize) -> usize {
    let n = record_count as f64;
    let max_prob = 0.25;

    for (len, exp) in [(3_usize, 3_i32), (4, 4), (5, 5), (6, 6), (7, 7), (8, 8)] {
        let space = 36_f64.powi(exp);
        let prob = 1.0 - (-n * n / (2.0 * space)).exp();
        if prob < max_prob {
            return len;
        }
    }
    8
}

fn hash_candidate(seed: &str, created_at: DateTime<Utc>, nonce: u32, length: usize) -> String {
    let input = format!(
        "{}|{}|{}",
        seed,
        created_at.timestamp_nanos_opt().unwrap_or(0),
        nonce
    );
    compute_id_hash(&input, length)
}

fn compute_id_hash(input: &str, length: usize) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input.as_bytes());
    let result = hasher.finalize();

    let mut num = 0u64;
    for &byte in result.iter().take(8) {
        num = (num << 8) | u64::from(byte);
    }

    let mut encoded = base36_encode(num);
    if encoded.len() < length {
        encoded = format!("{encoded:0>length$}");
    }
    encoded.chars().take(length).collect()
}

fn base36_encode(mut num: u64) -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    if num == 0 {
        return "0".to_string();
    }
    let mut chars = Vec::new();
    while num > 0 {
        chars.push(ALPHABET[(num % 36) as usize] as char);
        num /= 36;
    }
    chars.into_iter().rev().collect()
}
