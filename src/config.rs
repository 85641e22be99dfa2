use crate::error::{Error, Result};
use dotenvy::dotenv;
use std::env;
use std::sync::OnceLock;

pub const DEFAULT_COUNTDOWN_SECONDS: u32 = 5;
pub const DEFAULT_BREAK_SECONDS: u32 = 120;
pub const DEFAULT_MAX_ATTEMPTS: i32 = 3;

#[derive(Debug, Clone)]
pub struct Config {
    pub server_address: String,
    /// JSON question bank; the bundled bank is used when unset.
    pub question_bank_path: Option<String>,
    /// JSON file standing in for client-local storage; in-memory when unset.
    pub session_store_path: Option<String>,
    pub countdown_seconds: u32,
    pub break_seconds: u32,
    pub max_attempts: i32,
}

pub static CONFIG: OnceLock<Config> = OnceLock::new();

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenv().ok();

        let config = Self {
            server_address: get_env("SERVER_ADDRESS")?,
            question_bank_path: env::var("QUESTION_BANK_PATH").ok(),
            session_store_path: env::var("SESSION_STORE_PATH").ok(),
            countdown_seconds: get_env_parse_or("COUNTDOWN_SECONDS", DEFAULT_COUNTDOWN_SECONDS)?,
            break_seconds: get_env_parse_or("BREAK_SECONDS", DEFAULT_BREAK_SECONDS)?,
            max_attempts: get_env_parse_or("MAX_ATTEMPTS", DEFAULT_MAX_ATTEMPTS)?,
        };

        if config.max_attempts < 1 {
            return Err(Error::Config("MAX_ATTEMPTS must be at least 1".to_string()));
        }
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_address: "127.0.0.1:8080".to_string(),
            question_bank_path: None,
            session_store_path: None,
            countdown_seconds: DEFAULT_COUNTDOWN_SECONDS,
            break_seconds: DEFAULT_BREAK_SECONDS,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }
}

fn get_env(name: &str) -> Result<String> {
    env::var(name).map_err(|_| Error::Config(format!("Missing environment variable: {}", name)))
}

fn get_env_parse_or<T>(name: &str, default: T) -> Result<T>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match env::var(name) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| Error::Config(format!("Invalid value for {}: {}", name, e))),
        Err(_) => Ok(default),
    }
}

pub fn init_config() -> Result<()> {
    let config = Config::from_env()?;
    CONFIG
        .set(config)
        .map_err(|_| Error::Config("Configuration has already been initialized".to_string()))?;
    Ok(())
}

pub fn get_config() -> &'static Config {
    CONFIG
        .get()
        .expect("Configuration has not been initialized")
}
