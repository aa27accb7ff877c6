use std::fs::File;
use std::io::Read;
use std::pin::Pin;

use futures::stream::{self, Stream};
use serde::Deserialize;

use crate::config::SeedConfig;
use crate::domain::traits::CardSource;
use crate::domain::{CardRecord, CardStatus, Error, Money};

pub type CardStream = Pin<Box<dyn Stream<Item = Result<CardRecord, Error>> + Send>>;

pub struct CsvReader<R: Read> {
    reader: Option<csv::Reader<R>>,
    exp: String,
}

impl<R: Read> CsvReader<R> {
    pub fn new(reader: R, exp: impl Into<String>) -> Self {
        let rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        Self {
            reader: Some(rdr),
            exp: exp.into(),
        }
    }
}

/// Internal shape used only for CSV deserialization.
#[derive(Debug, Deserialize)]
struct CsvRow {
    pan: String,
    balance: String,
    status: Option<String>,
}

impl CsvRow {
    fn into_card(self, exp: &str) -> Result<CardRecord, Error> {
        if self.pan.is_empty() {
            return Err(Error::Seed("Empty pan".to_string()));
        }
        let balance = Money::from_decimal_str(&self.balance).ok_or_else(|| {
            Error::Seed(format!("Invalid balance for {}: {}", self.pan, self.balance))
        })?;
        if balance.is_negative() {
            return Err(Error::Seed(format!(
                "Negative balance for {}: {}",
                self.pan, balance
            )));
        }
        let status = match self.status.as_deref() {
            None | Some("") => CardStatus::Active,
            Some(raw) => raw.parse::<CardStatus>().map_err(Error::Seed)?,
        };

        Ok(CardRecord::new(self.pan, balance, status).with_expiry(exp))
    }
}

impl<R: Read + Send + 'static> CardSource for CsvReader<R> {
    type CardStream = CardStream;

    fn stream(&mut self) -> Self::CardStream {
        let reader = match self.reader.take() {
            Some(r) => r,
            // Already consumed.
            None => return Box::pin(stream::empty::<Result<CardRecord, Error>>()),
        };
        let exp = self.exp.clone();

        let iter = reader
            .into_deserialize::<CsvRow>()
            .map(move |row_res| match row_res {
                Ok(row) => row.into_card(&exp),
                Err(e) => Err(Error::Seed(format!("CSV deserialization error: {}", e))),
            });

        Box::pin(stream::iter(iter))
    }
}

/// Sequential PANs starting at `first_pan`, all with the same balance.
pub struct GeneratedCards {
    next_pan: u64,
    remaining: u64,
    balance: Money,
    exp: String,
}

impl GeneratedCards {
    pub fn new(count: u64, first_pan: u64, balance: Money, exp: impl Into<String>) -> Self {
        Self {
            next_pan: first_pan,
            remaining: count,
            balance,
            exp: exp.into(),
        }
    }
}

impl CardSource for GeneratedCards {
    type CardStream = CardStream;

    fn stream(&mut self) -> Self::CardStream {
        let first = self.next_pan;
        let count = std::mem::take(&mut self.remaining);
        let balance = self.balance;
        let exp = self.exp.clone();

        let iter = (0..count).map(move |offset| {
            first
                .checked_add(offset)
                .map(|pan| {
                    CardRecord::new(pan.to_string(), balance, CardStatus::Active)
                        .with_expiry(exp.as_str())
                })
                .ok_or_else(|| Error::Seed(format!("PAN overflow after {}", first)))
        });

        Box::pin(stream::iter(iter))
    }
}

/// A single hardcoded card.
pub struct SingleCard {
    card: Option<CardRecord>,
}

impl SingleCard {
    pub fn new(card: CardRecord) -> Self {
        Self { card: Some(card) }
    }
}

impl CardSource for SingleCard {
    type CardStream = CardStream;

    fn stream(&mut self) -> Self::CardStream {
        Box::pin(stream::iter(self.card.take().map(Ok::<_, Error>)))
    }
}

/// Builds the stream for one configured seed source.
pub fn open_seed(seed: &SeedConfig, exp: &str) -> Result<CardStream, Error> {
    let stream = match seed {
        SeedConfig::Single {
            pan,
            balance,
            status,
        } => {
            if balance.is_negative() {
                return Err(Error::Seed(format!("Negative balance for {}: {}", pan, balance)));
            }
            SingleCard::new(CardRecord::new(pan.clone(), *balance, *status).with_expiry(exp))
                .stream()
        }
        SeedConfig::Generated {
            count,
            first_pan,
            balance,
        } => {
            if balance.is_negative() {
                return Err(Error::Seed(format!("Negative generated balance: {}", balance)));
            }
            GeneratedCards::new(*count, *first_pan, *balance, exp).stream()
        }
        SeedConfig::Csv { path } => {
            let file = File::open(path).map_err(|e| {
                Error::Seed(format!("Couldn't open {}: {}", path.display(), e))
            })?;
            CsvReader::new(file, exp).stream()
        }
    };
    Ok(stream)
}
