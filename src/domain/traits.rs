use futures::Stream;

use crate::domain::{CardRecord, Error};

/// A source of seed records, consumed once at start-up.
pub trait CardSource {
    type CardStream: Stream<Item = Result<CardRecord, Error>> + Send + Unpin + 'static;
    fn stream(&mut self) -> Self::CardStream;
}

pub trait RejectionLog {
    fn report(&self, operation: &str, error: &Error);
}

pub trait CardStore {
    fn get(&self, pan: &str) -> Option<&CardRecord>;

    fn get_mut(&mut self, pan: &str) -> Option<&mut CardRecord>;

    /// Fails with `DuplicateCard` if the PAN is already present.
    fn insert(&mut self, card: CardRecord) -> Result<(), Error>;

    fn cards(&self) -> Box<dyn Iterator<Item = &CardRecord> + '_>;
}
