use crate::error::{LedgerError, Result};
use crate::network::DEFAULT_LEDGER_ADDR;
use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::env;
use std::str::FromStr;
use std::sync::RwLock;
use std::time::Duration;

pub static GLOBAL_CONFIG: Lazy<Config> = Lazy::new(Config::new);

const LEDGER_ADDRESS_KEY: &str = "LEDGER_ADDRESS";
const GENESIS_DIFFICULTY_KEY: &str = "GENESIS_DIFFICULTY";
const KEY_BITS_KEY: &str = "KEY_BITS";
const KEY_CERTAINTY_KEY: &str = "KEY_CERTAINTY";
const MINING_TIMEOUT_KEY: &str = "MINING_TIMEOUT_SECS";
const HASH_RATE_SAMPLE_KEY: &str = "HASH_RATE_SAMPLE_MS";

const DEFAULT_GENESIS_DIFFICULTY: u32 = 2;
const DEFAULT_KEY_BITS: u64 = 400;
const DEFAULT_KEY_CERTAINTY: u32 = 100;
const DEFAULT_HASH_RATE_SAMPLE_MS: u64 = 1000;

const ENV_KEYS: [&str; 6] = [
    LEDGER_ADDRESS_KEY,
    GENESIS_DIFFICULTY_KEY,
    KEY_BITS_KEY,
    KEY_CERTAINTY_KEY,
    MINING_TIMEOUT_KEY,
    HASH_RATE_SAMPLE_KEY,
];

/// String settings seeded from the environment, read through typed getters
pub struct Config {
    inner: RwLock<HashMap<String, String>>,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub fn new() -> Config {
        let mut map = HashMap::new();
        for key in ENV_KEYS {
            if let Ok(value) = env::var(key) {
                map.insert(String::from(key), value);
            }
        }

        Config {
            inner: RwLock::new(map),
        }
    }

    /// Config with no environment overrides
    pub fn empty() -> Config {
        Config {
            inner: RwLock::new(HashMap::new()),
        }
    }

    fn get(&self, key: &str) -> Option<String> {
        match self.inner.read() {
            Ok(inner) => inner.get(key).cloned(),
            Err(_) => {
                log::error!("Failed to acquire read lock on config");
                None
            }
        }
    }

    fn set(&self, key: &str, value: String) {
        match self.inner.write() {
            Ok(mut inner) => {
                inner.insert(String::from(key), value);
            }
            Err(_) => log::error!("Failed to acquire write lock on config"),
        }
    }

    fn parse_or<T: FromStr>(&self, key: &str, default: T) -> Result<T> {
        match self.get(key) {
            Some(raw) => raw
                .trim()
                .parse::<T>()
                .map_err(|_| LedgerError::Config(format!("{key} has an invalid value: {raw}"))),
            None => Ok(default),
        }
    }

    pub fn get_ledger_addr(&self) -> String {
        self.get(LEDGER_ADDRESS_KEY)
            .unwrap_or_else(|| String::from(DEFAULT_LEDGER_ADDR))
    }

    pub fn set_ledger_addr(&self, addr: String) {
        self.set(LEDGER_ADDRESS_KEY, addr);
    }

    pub fn get_genesis_difficulty(&self) -> Result<u32> {
        self.parse_or(GENESIS_DIFFICULTY_KEY, DEFAULT_GENESIS_DIFFICULTY)
    }

    pub fn set_genesis_difficulty(&self, difficulty: u32) {
        self.set(GENESIS_DIFFICULTY_KEY, difficulty.to_string());
    }

    pub fn get_key_bits(&self) -> Result<u64> {
        self.parse_or(KEY_BITS_KEY, DEFAULT_KEY_BITS)
    }

    pub fn get_key_certainty(&self) -> Result<u32> {
        self.parse_or(KEY_CERTAINTY_KEY, DEFAULT_KEY_CERTAINTY)
    }

    /// `None` means mining may run as long as it takes
    pub fn get_mining_timeout(&self) -> Result<Option<Duration>> {
        match self.get(MINING_TIMEOUT_KEY) {
            Some(_) => Ok(Some(Duration::from_secs(self.parse_or(MINING_TIMEOUT_KEY, 0)?))),
            None => Ok(None),
        }
    }

    pub fn set_mining_timeout(&self, seconds: u64) {
        self.set(MINING_TIMEOUT_KEY, seconds.to_string());
    }

    pub fn get_hash_rate_window(&self) -> Result<Duration> {
        Ok(Duration::from_millis(
            self.parse_or(HASH_RATE_SAMPLE_KEY, DEFAULT_HASH_RATE_SAMPLE_MS)?,
        ))
    }
}
