use rust_decimal::Decimal;

use crate::domain::Money;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Card {0} not found")]
    CardNotFound(String),

    #[error("Card {0} is not active")]
    CardInactive(String),

    #[error("Amount {amount} must be whole cents within {min}..={max}")]
    InvalidAmount {
        amount: Decimal,
        min: Money,
        max: Money,
    },

    #[error("Balance overflow: {0}")]
    BalanceOverflow(String),

    #[error("Malformed request: {0}")]
    BadRequest(String),

    #[error("Card {0} already exists")]
    DuplicateCard(String),

    #[error("Seeding failed with: {0}")]
    Seed(String),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Stable machine-readable name, used in HTTP error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Error::CardNotFound(_) => "card_not_found",
            Error::CardInactive(_) => "card_inactive",
            Error::InvalidAmount { .. } => "invalid_amount",
            Error::BalanceOverflow(_) => "balance_overflow",
            Error::BadRequest(_) => "bad_request",
            Error::DuplicateCard(_) => "duplicate_card",
            Error::Seed(_) => "seed_error",
            Error::Config(_) => "config_error",
        }
    }
}
