// Public invoice identifiers

use rand::Rng;

/// URL-safe alphabet (the nanoid default)
const ALPHABET: &[u8; 64] = b"useandom-26T198340PX75pxJACKVERYMINDBUSHWOLF_GQZbfghjklqvwyzrict";

pub const SHORT_ID_LEN: usize = 8;

/// Generate an 8-character public identifier.
///
/// Collisions are not re-checked before insert.
pub fn generate_short_id() -> String {
    let mut rng = rand::thread_rng();
    (0..SHORT_ID_LEN)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}

/// Whether `value` could have come from `generate_short_id`
pub fn is_short_id(value: &str) -> bool {
    value.len() == SHORT_ID_LEN && value.bytes().all(|b| ALPHABET.contains(&b))
}
