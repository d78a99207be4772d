//! Card code table.
//!
//! A code is `<value><suit>`: values `A 2 3 4 5 6 7 8 9 10 J Q K`, suits
//! `S H D C`. Jokers are `ZR` (red) and `ZB` (black). Lookups accept any
//! case and surrounding whitespace; stored codes are always normalized.

use crate::error::CoreError;

/// Card values in packet order.
pub const VALUES: [&str; 13] = [
    "A", "2", "3", "4", "5", "6", "7", "8", "9", "10", "J", "Q", "K",
];

/// Suits in packet order.
pub const SUITS: [&str; 4] = ["S", "H", "D", "C"];

/// Joker codes appended to a packet when jokers are enabled.
pub const JOKERS: [&str; 2] = ["ZB", "ZR"];

const JOKER_VALUE: &str = "Z";

/// Trim and upper-case a code without validating it.
pub fn normalize_code(code: &str) -> String {
    code.trim().to_ascii_uppercase()
}

/// Split a normalized code into its value and suit parts.
fn split(code: &str) -> Option<(&str, &str)> {
    if !code.is_ascii() || code.len() < 2 {
        return None;
    }
    let (value, suit) = code.split_at(code.len() - 1);
    Some((value, suit))
}

/// Whether `code` (already normalized) names a real card.
pub fn is_valid_code(code: &str) -> bool {
    match split(code) {
        Some((JOKER_VALUE, suit)) => suit == "R" || suit == "B",
        Some((value, suit)) => VALUES.contains(&value) && SUITS.contains(&suit),
        None => false,
    }
}

/// Normalize and validate a single code.
pub fn parse_code(raw: &str) -> Result<String, CoreError> {
    let code = normalize_code(raw);
    if is_valid_code(&code) {
        Ok(code)
    } else {
        Err(CoreError::InvalidCardCode(raw.trim().to_string()))
    }
}

/// Normalize and validate a batch of codes, preserving order.
pub fn parse_codes<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, CoreError> {
    raw.iter().map(|c| parse_code(c.as_ref())).collect()
}

/// Reject a batch that names the same code twice.
pub fn ensure_distinct(codes: &[String]) -> Result<(), CoreError> {
    let mut seen = std::collections::HashSet::with_capacity(codes.len());
    for code in codes {
        if !seen.insert(code.as_str()) {
            return Err(CoreError::DuplicateCards(code.clone()));
        }
    }
    Ok(())
}

/// Human-readable value of a card.
pub fn value_of(raw: &str) -> Result<&'static str, CoreError> {
    let code = parse_code(raw)?;
    let value = match split(&code).map(|(v, _)| v) {
        Some("A") => "ACE",
        Some("2") => "2",
        Some("3") => "3",
        Some("4") => "4",
        Some("5") => "5",
        Some("6") => "6",
        Some("7") => "7",
        Some("8") => "8",
        Some("9") => "9",
        Some("10") => "10",
        Some("J") => "JACK",
        Some("Q") => "QUEEN",
        Some("K") => "KING",
        Some(JOKER_VALUE) => "JOKER",
        _ => return Err(CoreError::InvalidCardCode(code)),
    };
    Ok(value)
}

/// Human-readable suit of a card. Jokers have no suit.
pub fn suit_of(raw: &str) -> Result<&'static str, CoreError> {
    let code = parse_code(raw)?;
    match split(&code) {
        Some((JOKER_VALUE, _)) => Err(CoreError::InvalidCardCode(code)),
        Some((_, "S")) => Ok("SPADES"),
        Some((_, "H")) => Ok("HEARTS"),
        Some((_, "D")) => Ok("DIAMONDS"),
        Some((_, "C")) => Ok("CLUBS"),
        _ => Err(CoreError::InvalidCardCode(code)),
    }
}
