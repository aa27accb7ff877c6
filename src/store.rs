use std::collections::HashMap;
use std::collections::hash_map::Entry;

use crate::domain::{CardRecord, CardStore, Error};

#[derive(Default, Debug)]
pub struct InMemoryCardStore {
    cards: HashMap<String, CardRecord>,
}

impl InMemoryCardStore {
    pub fn new() -> Self {
        Self {
            cards: HashMap::new(),
        }
    }
}

impl CardStore for InMemoryCardStore {
    fn get(&self, pan: &str) -> Option<&CardRecord> {
        self.cards.get(pan)
    }

    fn get_mut(&mut self, pan: &str) -> Option<&mut CardRecord> {
        self.cards.get_mut(pan)
    }

    fn insert(&mut self, card: CardRecord) -> Result<(), Error> {
        match self.cards.entry(card.pan.clone()) {
            Entry::Vacant(e) => {
                e.insert(card);
                Ok(())
            }
            Entry::Occupied(e) => Err(Error::DuplicateCard(e.key().clone())),
        }
    }

    fn cards(&self) -> Box<dyn Iterator<Item = &CardRecord> + '_> {
        Box::new(self.cards.values())
    }
}
