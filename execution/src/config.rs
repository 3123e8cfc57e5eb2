use crate::casino::{crash::DEFAULT_COUNTDOWN_MS, PayoutTable, Rules, Seed};
use commonware_utils::from_hex_formatted;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use thiserror::Error;
use tracing::Level;
use wager_types::casino::STARTING_BALANCE;

/// Configuration for the [crate::Engine].
///
/// Every field has a default, so an empty document is a valid config.
#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Config {
    #[serde(default = "default_starting_balance")]
    pub starting_balance: u64,
    /// Hex-encoded 32-byte seed. A fresh random seed is used when absent.
    #[serde(default)]
    pub seed: Option<String>,
    #[serde(default = "default_crash_countdown_ms")]
    pub crash_countdown_ms: u64,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default)]
    pub payouts: PayoutTable,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            starting_balance: default_starting_balance(),
            seed: None,
            crash_countdown_ms: default_crash_countdown_ms(),
            log_level: default_log_level(),
            payouts: PayoutTable::default(),
        }
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    #[error("{field} must be hex: {value}")]
    InvalidHex { field: &'static str, value: String },
    #[error("seed must be 32 bytes (got {len})")]
    InvalidSeedLength { len: usize },
    #[error("invalid log level: {value}")]
    InvalidLogLevel { value: String },
    #[error("{field} must be > 0 (got {value})")]
    InvalidNonZero { field: &'static str, value: u64 },
    #[error("{table} is not a valid distribution")]
    InvalidDistribution { table: String },
    #[error("{table} pays {ev} on average and leaves no house edge")]
    NoHouseEdge { table: String, ev: f64 },
}

#[derive(Clone, Debug)]
pub struct ValidatedConfig {
    pub starting_balance: u64,
    pub seed: Seed,
    pub log_level: Level,
    pub rules: Rules,
}

fn default_starting_balance() -> u64 {
    STARTING_BALANCE
}

fn default_crash_countdown_ms() -> u64 {
    DEFAULT_COUNTDOWN_MS
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Largest table whose segment index still fits an outcome's `u8`.
const MAX_TABLE_ENTRIES: usize = u8::MAX as usize;

fn parse_seed(value: &str) -> Result<Seed, ConfigError> {
    let bytes = from_hex_formatted(value).ok_or(ConfigError::InvalidHex {
        field: "seed",
        value: value.to_string(),
    })?;
    Seed::try_from(bytes.as_slice()).map_err(|_| ConfigError::InvalidSeedLength { len: bytes.len() })
}

fn random_seed() -> Seed {
    let mut seed = Seed::default();
    rand::thread_rng().fill_bytes(&mut seed);
    seed
}

fn check_sizes(payouts: &PayoutTable) -> Result<(), ConfigError> {
    let oversized = |table: &str, len: usize| {
        if len > MAX_TABLE_ENTRIES {
            Err(ConfigError::InvalidDistribution {
                table: table.to_string(),
            })
        } else {
            Ok(())
        }
    };
    oversized("wheel", payouts.wheel.len())?;
    oversized("roulette", payouts.roulette.len())?;
    oversized("slots", payouts.slots.symbols.len())?;
    for case in &payouts.cases {
        oversized(&format!("case/{:?}", case.tier).to_lowercase(), case.items.len())?;
        if case.price == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "case price",
                value: 0,
            });
        }
    }
    Ok(())
}

impl Config {
    /// Parse a YAML document.
    pub fn from_yaml(yaml: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(yaml)
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.starting_balance == 0 {
            return Err(ConfigError::InvalidNonZero {
                field: "starting_balance",
                value: self.starting_balance,
            });
        }

        let seed = match &self.seed {
            Some(value) => parse_seed(value)?,
            None => random_seed(),
        };

        let log_level =
            Level::from_str(&self.log_level).map_err(|_| ConfigError::InvalidLogLevel {
                value: self.log_level.clone(),
            })?;

        check_sizes(&self.payouts)?;
        for (table, ev) in self.payouts.expected_values() {
            let ev = ev.map_err(|_| ConfigError::InvalidDistribution {
                table: table.clone(),
            })?;
            if !ev.below_one() {
                return Err(ConfigError::NoHouseEdge {
                    table,
                    ev: ev.as_f64(),
                });
            }
        }

        Ok(ValidatedConfig {
            starting_balance: self.starting_balance,
            seed,
            log_level,
            rules: Rules {
                payouts: self.payouts,
                crash_countdown_ms: self.crash_countdown_ms,
            },
        })
    }
}
