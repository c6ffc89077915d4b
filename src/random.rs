//! Random identifiers.

use chrono::{Datelike, Local};
use rand::Rng;

const CHARS: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const NUMBERS: &[u8] = b"0123456789";

fn pick(alphabet: &[u8], len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| alphabet[rng.random_range(0..alphabet.len())] as char)
        .collect()
}

/// `len` characters of `[a-z0-9]`.
pub fn random_string(len: usize) -> String {
    pick(CHARS, len)
}

/// `len` decimal digits. Leading zeros are kept.
pub fn random_number(len: usize) -> String {
    pick(NUMBERS, len)
}

/// `{prefix}{yy}{month}{random}`, e.g. `INV2411k3x9q` for November 2024.
///
/// The month is not zero padded.
pub fn generate_random_id(len: usize, prefix: &str) -> String {
    let now = Local::now();
    format!("{prefix}{:02}{}{}", now.year() % 100, now.month(), random_string(len))
}
