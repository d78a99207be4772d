/// Coarse classification of every failure the store can report.
///
/// Callers (an HTTP layer, a CLI) map these onto their own status codes;
/// the store itself never decides presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Deck, pile, or card absent.
    NotFound,
    /// Malformed code, duplicate codes in one request, out-of-range count.
    InvalidInput,
    /// The ledger would be violated by the requested move.
    Conflict,
    /// Deck empty, pile empty, or token generation gave up.
    ResourceExhausted,
    /// Transaction failure or a structurally broken list.
    StorageFailure,
}

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Deck not found: {0}")]
    DeckNotFound(String),

    #[error("Pile '{pile}' not found in deck {deck_id}")]
    PileNotFound { deck_id: String, pile: String },

    #[error("Card {code} not found in deck {deck_id}")]
    CardNotInDeck { deck_id: String, code: String },

    #[error("Card {code} not found in pile '{pile}'")]
    CardNotInPile { pile: String, code: String },

    #[error("Card {code} is not drawn (total={total}, in_deck={in_deck}, in_pile={in_pile})")]
    CardNotDrawn {
        code: String,
        total: i32,
        in_deck: i32,
        in_pile: i32,
    },

    #[error("Invalid card code: {0}")]
    InvalidCardCode(String),

    #[error("Duplicate cards in request: {0}")]
    DuplicateCards(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Parameter out of range: {0}")]
    OutOfRange(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Deck {0} is empty")]
    DeckEmpty(String),

    #[error("Pile '{0}' is empty")]
    PileEmpty(String),

    #[error("Could not generate a unique deck id after {attempts} attempts")]
    TokenSpaceExhausted { attempts: usize },

    #[error("Corrupted list: {0}")]
    CorruptedList(String),
}

impl CoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CoreError::DeckNotFound(_)
            | CoreError::PileNotFound { .. }
            | CoreError::CardNotInDeck { .. }
            | CoreError::CardNotInPile { .. } => ErrorKind::NotFound,
            CoreError::InvalidCardCode(_)
            | CoreError::DuplicateCards(_)
            | CoreError::InvalidParameter(_)
            | CoreError::OutOfRange(_) => ErrorKind::InvalidInput,
            CoreError::CardNotDrawn { .. } | CoreError::Conflict(_) => ErrorKind::Conflict,
            CoreError::DeckEmpty(_)
            | CoreError::PileEmpty(_)
            | CoreError::TokenSpaceExhausted { .. } => ErrorKind::ResourceExhausted,
            CoreError::CorruptedList(_) => ErrorKind::StorageFailure,
        }
    }
}
