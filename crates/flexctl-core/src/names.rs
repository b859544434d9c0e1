//! Random resource names and administrator passwords

use rand::Rng;
use rand::seq::SliceRandom;

/// Random characters always appended, even when the prefix must be cut
pub const MIN_RANDOM_CHARS: usize = 5;

const NAME_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";
const UPPER: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ";
const LOWER: &[u8] = b"abcdefghijkmnopqrstuvwxyz";
const DIGITS: &[u8] = b"23456789";
const SYMBOLS: &[u8] = b"!@#%^*-_+=";

/// Build `prefix` + random lowercase alphanumerics, exactly `max_len` long
///
/// A prefix that leaves fewer than [`MIN_RANDOM_CHARS`] random characters
/// is truncated.
///
/// ```rust
/// let name = flexctl_core::names::random_resource_name("netserver", 20);
/// assert_eq!(name.len(), 20);
/// assert!(name.starts_with("netserver"));
/// ```
pub fn random_resource_name(prefix: &str, max_len: usize) -> String {
    let prefix_len = prefix.chars().count();
    let suffix_len = max_len
        .saturating_sub(prefix_len)
        .max(MIN_RANDOM_CHARS)
        .min(max_len);
    let keep = max_len - suffix_len;

    let mut rng = rand::thread_rng();
    let mut name: String = prefix.chars().take(keep).collect();
    name.extend(
        (0..suffix_len).map(|_| NAME_CHARSET[rng.gen_range(0..NAME_CHARSET.len())] as char),
    );
    name
}

/// Generate a password with upper, lower, digit and symbol characters
///
/// `len` is raised to 12 if smaller.
pub fn random_password(len: usize) -> String {
    let len = len.max(12);
    let mut rng = rand::thread_rng();
    let classes = [UPPER, LOWER, DIGITS, SYMBOLS];

    let mut chars: Vec<u8> = classes
        .iter()
        .map(|class| class[rng.gen_range(0..class.len())])
        .collect();
    while chars.len() < len {
        let class = classes[rng.gen_range(0..classes.len())];
        chars.push(class[rng.gen_range(0..class.len())]);
    }
    chars.shuffle(&mut rng);

    chars.into_iter().map(char::from).collect()
}
