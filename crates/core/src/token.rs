//! Opaque deck identifiers.

use rand::Rng;

/// Length of a generated deck token.
pub const TOKEN_LENGTH: usize = 12;

/// How many fresh tokens deck creation tries before giving up.
pub const MAX_TOKEN_ATTEMPTS: usize = 30;

/// Generate a random deck token from the 62-character alphanumeric alphabet.
pub fn generate_deck_token() -> String {
    rand::rng()
        .sample_iter(&rand::distr::Alphanumeric)
        .take(TOKEN_LENGTH)
        .map(char::from)
        .collect()
}

/// Whether `token` has the shape of a generated deck token.
///
/// Lets callers reject garbage ids without a database round trip.
pub fn is_well_formed(token: &str) -> bool {
    token.len() == TOKEN_LENGTH && token.bytes().all(|b| b.is_ascii_alphanumeric())
}
