use serde::Serialize;

use crate::domain::{CardRecord, Error, Money};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AggregateStats {
    pub cards: usize,
    pub active_cards: usize,
    pub inactive_cards: usize,
    pub total_balance: Money,
}

impl AggregateStats {
    /// Fails with `BalanceOverflow` if the total does not fit in a `Decimal`.
    pub fn from_cards<'a>(cards: impl IntoIterator<Item = &'a CardRecord>) -> Result<Self, Error> {
        cards.into_iter().try_fold(Self::default(), |mut stats, card| {
            stats.cards += 1;
            if card.is_active() {
                stats.active_cards += 1;
            } else {
                stats.inactive_cards += 1;
            }
            stats.total_balance = stats
                .total_balance
                .checked_add(card.balance)
                .ok_or_else(|| {
                    Error::BalanceOverflow(format!("total balance overflows at card {}", card.pan))
                })?;
            Ok(stats)
        })
    }
}
