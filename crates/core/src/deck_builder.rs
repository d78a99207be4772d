//! Builders for the card lists a new deck is created from.

use crate::card::{self, JOKERS, SUITS, VALUES};
use crate::error::CoreError;

/// Maximum number of packets in a standard multi-packet deck.
pub const MAX_DECK_COUNT: u32 = 20;

/// Maximum number of cards accepted for a custom deck.
pub const MAX_CUSTOM_DECK_CARDS: usize = 104;

/// Build `deck_count` standard packets in value-major order
/// (`AS AH AD AC 2S ...`), with `ZB ZR` closing each packet when
/// `jokers` is set.
pub fn standard_deck(deck_count: u32, jokers: bool) -> Result<Vec<String>, CoreError> {
    if deck_count == 0 {
        return Err(CoreError::InvalidParameter(
            "deck_count must be at least 1".to_string(),
        ));
    }
    if deck_count > MAX_DECK_COUNT {
        return Err(CoreError::OutOfRange(format!(
            "deck_count must not exceed {MAX_DECK_COUNT}"
        )));
    }

    let per_packet = VALUES.len() * SUITS.len() + if jokers { JOKERS.len() } else { 0 };
    let mut cards = Vec::with_capacity(per_packet * deck_count as usize);
    for _ in 0..deck_count {
        for value in VALUES {
            for suit in SUITS {
                cards.push(format!("{value}{suit}"));
            }
        }
        if jokers {
            cards.extend(JOKERS.iter().map(|j| j.to_string()));
        }
    }
    Ok(cards)
}

/// Validate a caller-supplied card list: every code must be real, no code
/// may repeat, and the list must fit in [`MAX_CUSTOM_DECK_CARDS`].
/// Blank entries are skipped. Returns the normalized codes.
pub fn custom_deck<S: AsRef<str>>(raw: &[S]) -> Result<Vec<String>, CoreError> {
    let non_blank: Vec<&str> = raw
        .iter()
        .map(|c| c.as_ref())
        .filter(|c| !c.trim().is_empty())
        .collect();

    if non_blank.is_empty() {
        return Err(CoreError::InvalidParameter(
            "a custom deck needs at least one card".to_string(),
        ));
    }
    if non_blank.len() > MAX_CUSTOM_DECK_CARDS {
        return Err(CoreError::OutOfRange(format!(
            "a custom deck may hold at most {MAX_CUSTOM_DECK_CARDS} cards"
        )));
    }

    let codes = card::parse_codes(non_blank.as_slice())?;
    card::ensure_distinct(&codes)?;
    Ok(codes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn single_packet_without_jokers() {
        let cards = standard_deck(1, false).unwrap();
        assert_eq!(cards.len(), 52);
        assert_eq!(&cards[..5], ["AS", "AH", "AD", "AC", "2S"]);
        assert_eq!(cards.last().unwrap(), "KC");
    }

    #[test]
    fn jokers_close_every_packet() {
        let cards = standard_deck(2, true).unwrap();
        assert_eq!(cards.len(), 108);
        assert_eq!(&cards[52..54], ["ZB", "ZR"]);
        assert_eq!(&cards[106..], ["ZB", "ZR"]);
    }

    #[test]
    fn zero_packets_rejected() {
        assert_matches!(standard_deck(0, false), Err(CoreError::InvalidParameter(_)));
    }

    #[test]
    fn too_many_packets_rejected() {
        assert_matches!(
            standard_deck(MAX_DECK_COUNT + 1, false),
            Err(CoreError::OutOfRange(_))
        );
    }

    #[test]
    fn custom_deck_normalizes_and_skips_blanks() {
        let cards = custom_deck(&["as", " ", "10h", "kd "]).unwrap();
        assert_eq!(cards, ["AS", "10H", "KD"]);
    }

    #[test]
    fn custom_deck_rejects_duplicates_after_normalizing() {
        assert_matches!(custom_deck(&["AS", "as"]), Err(CoreError::DuplicateCards(_)));
    }

    #[test]
    fn custom_deck_rejects_invalid_code() {
        assert_matches!(custom_deck(&["AS", "XX"]), Err(CoreError::InvalidCardCode(_)));
    }

    #[test]
    fn custom_deck_rejects_empty_list() {
        let empty: [&str; 0] = [];
        assert_matches!(custom_deck(&empty), Err(CoreError::InvalidParameter(_)));
    }

    #[test]
    fn custom_deck_size_limit() {
        let two_packets = standard_deck(2, false).unwrap();
        // 104 cards but with repeats: the size check passes, the duplicate check fires.
        assert_matches!(custom_deck(two_packets.as_slice()), Err(CoreError::DuplicateCards(_)));

        let mut too_many = two_packets;
        too_many.push("ZB".into());
        assert_matches!(custom_deck(too_many.as_slice()), Err(CoreError::OutOfRange(_)));
    }
}
