pub mod casino;
pub mod config;
pub mod engine;
pub mod feed;
pub mod ledger;

#[cfg(any(test, feature = "mocks"))]
pub mod mocks;

pub use config::{Config, ConfigError, ValidatedConfig};
pub use engine::{Engine, EngineError, Phase, SessionSnapshot};
pub use feed::{ActivityFeed, NoopFeed, TracingFeed};
pub use ledger::{InsufficientFunds, Ledger, Totals};
