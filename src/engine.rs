use std::sync::Arc;

use futures::StreamExt;
use rust_decimal::Decimal;
use tokio::sync::Mutex;

use crate::config::{KioskConfig, LoadLimits};
use crate::domain::{
    AggregateStats, CardRecord, Error, Money,
    traits::{CardSource, CardStore, RejectionLog},
};
use crate::ingestion::open_seed;
use crate::rejections::TracingRejectionLog;
use crate::store::InMemoryCardStore;

/// The ledger the server runs with: one lock around the whole store.
pub type SharedLedger = Arc<Mutex<CardLedger<InMemoryCardStore, TracingRejectionLog>>>;

#[derive(Debug)]
pub struct CardLedger<S, R>
where
    S: CardStore,
    R: RejectionLog,
{
    store: S,
    rejections: R,
    limits: LoadLimits,
}

impl<S, R> CardLedger<S, R>
where
    S: CardStore,
    R: RejectionLog,
{
    pub fn new(store: S, rejections: R, limits: LoadLimits) -> Self {
        Self {
            store,
            rejections,
            limits,
        }
    }

    #[cfg(test)]
    pub(crate) fn rejections(&self) -> &R {
        &self.rejections
    }

    pub fn get(&self, pan: &str) -> Result<CardRecord, Error> {
        match self.store.get(pan) {
            Some(card) => Ok(card.clone()),
            None => {
                let e = Error::CardNotFound(pan.to_string());
                self.rejections.report("get", &e);
                Err(e)
            }
        }
    }

    /// Adds `amount` to the card's balance. The amount must be whole cents
    /// within the load limits; it is never rounded. Not idempotent: a
    /// retried request is applied again.
    pub fn reload(&mut self, pan: &str, amount: impl Into<Decimal>) -> Result<CardRecord, Error> {
        let amount = amount.into();
        match self.apply_reload(pan, amount) {
            Ok(card) => {
                tracing::info!(pan, %amount, new_balance = %card.balance, "card reloaded");
                Ok(card)
            }
            Err(e) => {
                self.rejections.report("reload", &e);
                Err(e)
            }
        }
    }

    fn apply_reload(&mut self, pan: &str, amount: Decimal) -> Result<CardRecord, Error> {
        let LoadLimits { min_load, max_load } = self.limits;
        if !Money::is_whole_cents(amount) || !self.limits.contains(amount) {
            return Err(Error::InvalidAmount {
                amount,
                min: min_load,
                max: max_load,
            });
        }
        let amount = Money::new(amount);

        let card = self
            .store
            .get_mut(pan)
            .ok_or_else(|| Error::CardNotFound(pan.to_string()))?;

        if !card.is_active() {
            return Err(Error::CardInactive(pan.to_string()));
        }

        card.balance = card
            .balance
            .checked_add(amount)
            .ok_or_else(|| Error::BalanceOverflow(format!("card {} cannot take {}", pan, amount)))?;

        Ok(card.clone())
    }

    pub fn summary(&self) -> Result<AggregateStats, Error> {
        AggregateStats::from_cards(self.store.cards())
    }

    pub fn insert(&mut self, card: CardRecord) -> Result<(), Error> {
        self.store.insert(card)
    }

    /// All records, ordered by PAN.
    pub fn cards(&self) -> Vec<CardRecord> {
        let mut cards: Vec<CardRecord> = self.store.cards().cloned().collect();
        cards.sort_by(|a, b| a.pan.cmp(&b.pan));
        cards
    }

    /// Drains `source` into the store. Any bad record aborts seeding.
    pub async fn seed<C: CardSource>(&mut self, mut source: C) -> Result<usize, Error> {
        self.seed_stream(source.stream()).await
    }

    pub async fn seed_stream<St>(&mut self, mut cards: St) -> Result<usize, Error>
    where
        St: futures::Stream<Item = Result<CardRecord, Error>> + Unpin,
    {
        let mut seeded = 0;
        while let Some(card) = cards.next().await {
            self.store.insert(card?)?;
            seeded += 1;
        }
        Ok(seeded)
    }

    pub fn into_shared(self) -> Arc<Mutex<Self>> {
        Arc::new(Mutex::new(self))
    }
}

impl CardLedger<InMemoryCardStore, TracingRejectionLog> {
    pub fn in_memory(limits: LoadLimits) -> Self {
        Self::new(InMemoryCardStore::new(), TracingRejectionLog::default(), limits)
    }

    /// Builds a fresh ledger and runs every configured seed source in order.
    pub async fn from_config(config: &KioskConfig) -> Result<Self, Error> {
        config.validate()?;
        let mut ledger = Self::in_memory(config.limits);
        for seed in &config.seed {
            let cards = open_seed(seed, &config.card_defaults.exp)?;
            let seeded = ledger.seed_stream(cards).await?;
            tracing::info!(?seed, seeded, "seeded cards");
        }
        let stats = ledger.summary()?;
        tracing::info!(cards = stats.cards, total = %stats.total_balance, "ledger ready");
        Ok(ledger)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DEMO_PAN;
    use crate::domain::CardStatus;
    use crate::ingestion::{GeneratedCards, SingleCard};
    use crate::rejections::RecordingRejectionLog;

    type TestLedger = CardLedger<InMemoryCardStore, RecordingRejectionLog>;

    fn money(s: &str) -> Money {
        Money::from_decimal_str(s).unwrap()
    }

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn ledger_with(cards: &[(&str, &str, CardStatus)]) -> TestLedger {
        let mut ledger = CardLedger::new(
            InMemoryCardStore::new(),
            RecordingRejectionLog::default(),
            LoadLimits::default(),
        );
        for (pan, balance, status) in cards {
            ledger
                .insert(CardRecord::new(*pan, money(balance), *status))
                .unwrap();
        }
        ledger
    }

    #[test]
    fn get_returns_record_for_queried_pan() {
        let ledger = ledger_with(&[
            (DEMO_PAN, "295.50", CardStatus::Active),
            ("4000000000000002", "1", CardStatus::Inactive),
        ]);
        for pan in [DEMO_PAN, "4000000000000002"] {
            assert_eq!(ledger.get(pan).unwrap().pan, pan);
        }
    }

    #[test]
    fn unknown_pan_is_not_found() {
        let mut ledger = ledger_with(&[(DEMO_PAN, "295.50", CardStatus::Active)]);

        assert!(matches!(ledger.get("0000000000000000"), Err(Error::CardNotFound(_))));
        assert!(matches!(
            ledger.reload("0000000000000000", money("100")),
            Err(Error::CardNotFound(_))
        ));
        assert_eq!(
            ledger.rejections().entries(),
            vec![
                ("get".to_string(), "card_not_found".to_string()),
                ("reload".to_string(), "card_not_found".to_string()),
            ]
        );
    }

    #[test]
    fn reload_adds_exact_amount() {
        let mut ledger = ledger_with(&[(DEMO_PAN, "295.50", CardStatus::Active)]);

        let card = ledger.reload(DEMO_PAN, money("100")).unwrap();
        assert_eq!(card.balance, money("395.50"));
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, money("395.50"));
    }

    #[test]
    fn reload_is_not_idempotent() {
        let mut ledger = ledger_with(&[(DEMO_PAN, "0", CardStatus::Active)]);

        ledger.reload(DEMO_PAN, money("20")).unwrap();
        ledger.reload(DEMO_PAN, money("20")).unwrap();
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, money("40"));
    }

    #[test]
    fn out_of_bounds_amount_leaves_balance_untouched() {
        let mut ledger = ledger_with(&[(DEMO_PAN, "295.50", CardStatus::Active)]);

        for amount in ["19.99", "0", "-5", "5000.01"] {
            let err = ledger.reload(DEMO_PAN, money(amount)).unwrap_err();
            assert!(matches!(err, Error::InvalidAmount { .. }), "{amount}");
        }
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, money("295.50"));

        ledger.reload(DEMO_PAN, money("20")).unwrap();
        ledger.reload(DEMO_PAN, money("5000")).unwrap();
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, money("5315.50"));
    }

    #[test]
    fn sub_cent_amounts_are_not_rounded_into_range() {
        let mut ledger = ledger_with(&[(DEMO_PAN, "100", CardStatus::Active)]);

        for amount in ["19.995", "5000.005", "20.001", "100.005"] {
            let err = ledger.reload(DEMO_PAN, dec(amount)).unwrap_err();
            assert!(
                matches!(err, Error::InvalidAmount { amount: a, .. } if a == dec(amount)),
                "{amount}"
            );
        }
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, money("100"));

        let card = ledger.reload(DEMO_PAN, dec("20.10")).unwrap();
        assert_eq!(card.balance.as_decimal(), dec("100") + dec("20.10"));
    }

    #[test]
    fn balance_overflow_is_its_own_error() {
        let huge = Money::new(dec("79228162514264337593543950000"));
        let mut ledger = ledger_with(&[]);
        ledger
            .insert(CardRecord::new(DEMO_PAN, huge, CardStatus::Active))
            .unwrap();

        let err = ledger.reload(DEMO_PAN, dec("5000")).unwrap_err();
        assert!(matches!(err, Error::BalanceOverflow(_)));
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, huge);
    }

    #[test]
    fn summary_overflow_is_an_error() {
        let mut ledger = ledger_with(&[]);
        for pan in ["1", "2", "3", "4"] {
            ledger
                .insert(CardRecord::new(
                    pan,
                    Money::new(dec("50000000000000000000000000000")),
                    CardStatus::Active,
                ))
                .unwrap();
        }
        assert!(matches!(ledger.summary(), Err(Error::BalanceOverflow(_))));
    }

    #[test]
    fn amount_is_checked_before_card_lookup() {
        let mut ledger = ledger_with(&[]);
        assert!(matches!(
            ledger.reload("missing", money("1")),
            Err(Error::InvalidAmount { .. })
        ));
    }

    #[test]
    fn inactive_card_rejects_reload() {
        let mut ledger = ledger_with(&[("4000000000000002", "10", CardStatus::Inactive)]);

        let err = ledger.reload("4000000000000002", money("50")).unwrap_err();
        assert!(matches!(err, Error::CardInactive(pan) if pan == "4000000000000002"));
        assert_eq!(ledger.get("4000000000000002").unwrap().balance, money("10"));
    }

    #[test]
    fn summary_tracks_balances() {
        let mut ledger = ledger_with(&[
            (DEMO_PAN, "295.50", CardStatus::Active),
            ("4000000000000002", "10.25", CardStatus::Inactive),
            ("4000000000000003", "1000", CardStatus::Active),
        ]);

        let stats = ledger.summary().unwrap();
        let sum: Decimal = ledger.cards().iter().map(|c| c.balance.as_decimal()).sum();
        assert_eq!(stats.total_balance.as_decimal(), sum);
        assert_eq!(stats.cards, 3);
        assert_eq!(stats.active_cards, 2);
        assert_eq!(stats.inactive_cards, 1);

        ledger.reload(DEMO_PAN, money("100")).unwrap();
        assert_eq!(ledger.summary().unwrap().total_balance, money("1405.75"));
    }

    #[test]
    fn cards_are_sorted_by_pan() {
        let ledger = ledger_with(&[
            ("3", "1", CardStatus::Active),
            ("1", "1", CardStatus::Active),
            ("2", "1", CardStatus::Active),
        ]);
        let pans: Vec<_> = ledger.cards().into_iter().map(|c| c.pan).collect();
        assert_eq!(pans, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn seeds_from_sources() {
        let mut ledger = ledger_with(&[]);
        let single = CardRecord::new(DEMO_PAN, money("295.50"), CardStatus::Active);

        assert_eq!(ledger.seed(SingleCard::new(single)).await.unwrap(), 1);
        let seeded = ledger
            .seed(GeneratedCards::new(2000, 4060220000000000, money("1000"), "0128"))
            .await
            .unwrap();
        assert_eq!(seeded, 2000);
        assert_eq!(ledger.summary().unwrap().cards, 2001);
        assert_eq!(ledger.summary().unwrap().total_balance, money("2000295.50"));
    }

    #[tokio::test]
    async fn duplicate_seed_aborts() {
        let mut ledger = ledger_with(&[("5", "1", CardStatus::Active)]);
        let err = ledger
            .seed(GeneratedCards::new(3, 4, money("1"), "0128"))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateCard(pan) if pan == "5"));
    }

    #[tokio::test]
    async fn default_config_seeds_demo_card_and_batch() {
        let ledger = CardLedger::from_config(&KioskConfig::default()).await.unwrap();

        let stats = ledger.summary().unwrap();
        assert_eq!(stats.cards, 2001);
        assert_eq!(stats.active_cards, 2001);
        assert_eq!(ledger.get(DEMO_PAN).unwrap().balance, money("295.50"));
        assert_eq!(ledger.get("4060220000001999").unwrap().balance, money("1000"));
        assert!(ledger.get("4060220000002000").is_err());
    }

    #[tokio::test]
    async fn config_seed_overlap_is_rejected() {
        let config = KioskConfig::from_yaml(
            r#"
seed:
  - kind: generated
    count: 2
    first_pan: 10
    balance: 1
  - kind: single
    pan: "11"
    balance: 5
"#,
        )
        .unwrap();
        assert!(matches!(
            CardLedger::from_config(&config).await,
            Err(Error::DuplicateCard(pan)) if pan == "11"
        ));
    }

    #[tokio::test]
    async fn oversized_seed_total_fails_startup_without_panicking() {
        let config = KioskConfig::from_yaml(
            r#"
seed:
  - kind: single
    pan: "1"
    balance: "50000000000000000000000000000"
  - kind: single
    pan: "2"
    balance: "50000000000000000000000000000"
"#,
        )
        .unwrap();
        assert!(matches!(
            CardLedger::from_config(&config).await,
            Err(Error::BalanceOverflow(_))
        ));
    }

    #[tokio::test]
    async fn shared_ledger_serializes_concurrent_reloads() {
        let mut ledger = CardLedger::in_memory(LoadLimits::default());
        ledger
            .insert(CardRecord::new(DEMO_PAN, money("0"), CardStatus::Active))
            .unwrap();
        let shared = ledger.into_shared();

        let mut handles = Vec::new();
        for _ in 0..50 {
            let shared = shared.clone();
            handles.push(tokio::spawn(async move {
                shared.lock().await.reload(DEMO_PAN, money("20")).unwrap();
            }));
        }
        for handle in handles {
            handle.await.unwrap();
        }

        assert_eq!(shared.lock().await.get(DEMO_PAN).unwrap().balance, money("1000"));
    }
}
