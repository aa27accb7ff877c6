pub mod config;
pub mod domain;
pub mod engine;
pub mod ingestion;
pub mod rejections;
pub mod server;
pub mod store;
pub mod telemetry;

pub use config::KioskConfig;
pub use domain::{AggregateStats, CardRecord, CardStatus, Error, Money};
pub use engine::{CardLedger, SharedLedger};
