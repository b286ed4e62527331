//! Referral codes

use rand::Rng;

pub const CODE_PREFIX: &str = "ZUG-";

/// Uppercase alphabet without 0/O and 1/I.
pub const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

const CODE_BODY_LEN: usize = 8;

/// `ZUG-` followed by eight random alphabet characters.
pub fn generate_referral_code<R: Rng + ?Sized>(rng: &mut R) -> String {
    let body: String = (0..CODE_BODY_LEN)
        .map(|_| char::from(CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())]))
        .collect();
    format!("{CODE_PREFIX}{body}")
}

/// Cheap shape check before a store lookup. Case-insensitive.
pub fn is_well_formed_code(code: &str) -> bool {
    let upper = code.trim().to_ascii_uppercase();
    let Some(body) = upper.strip_prefix(CODE_PREFIX) else {
        return false;
    };
    // codes issued before the alphabet was narrowed used base36
    !body.is_empty() && body.len() <= 16 && body.bytes().all(|b| b.is_ascii_alphanumeric())
}
