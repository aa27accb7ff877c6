use serde::{Deserialize, Serialize};

use crate::domain::Money;

pub const DEFAULT_EXPIRY: &str = "0128";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CardStatus {
    #[default]
    Active,
    Inactive,
}

impl CardStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CardStatus::Active => "active",
            CardStatus::Inactive => "inactive",
        }
    }
}

impl core::str::FromStr for CardStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(CardStatus::Active),
            "inactive" => Ok(CardStatus::Inactive),
            other => Err(format!("Invalid card status: {}", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CardRecord {
    pub pan: String,
    pub pin: String, // display only, derived from the PAN
    pub cvv: String, // display only, derived from the PAN
    pub exp: String,
    pub balance: Money,
    pub status: CardStatus,
}

impl CardRecord {
    pub fn new(pan: impl Into<String>, balance: Money, status: CardStatus) -> Self {
        let pan = pan.into();
        Self {
            pin: display_pin(&pan),
            cvv: display_cvv(&pan),
            exp: DEFAULT_EXPIRY.to_string(),
            pan,
            balance,
            status,
        }
    }

    pub fn with_expiry(mut self, exp: impl Into<String>) -> Self {
        self.exp = exp.into();
        self
    }

    pub fn is_active(&self) -> bool {
        self.status == CardStatus::Active
    }
}

/// Last four characters of the PAN. Demonstration data, not a secret.
fn display_pin(pan: &str) -> String {
    let chars: Vec<char> = pan.chars().collect();
    let start = chars.len().saturating_sub(4);
    chars[start..].iter().collect()
}

/// Last two PAN digits as a zero-padded three digit string. Demonstration
/// data, not a secret.
fn display_cvv(pan: &str) -> String {
    let chars: Vec<char> = pan.chars().collect();
    let start = chars.len().saturating_sub(2);
    let tail: String = chars[start..].iter().collect();
    let value = tail.parse::<u32>().unwrap_or(0) % 1000;
    format!("{:03}", value)
}

impl core::fmt::Display for CardRecord {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{},{},{}", self.pan, self.status.as_str(), self.balance)
    }
}
