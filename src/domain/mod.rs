pub mod card;
pub mod error;
pub mod money;
pub mod summary;
pub mod traits;

pub use card::{CardRecord, CardStatus};
pub use error::Error;
pub use money::Money;
pub use summary::AggregateStats;
pub use traits::{CardSource, CardStore, RejectionLog};
