use std::env;
use std::path::PathBuf;

pub const DEFAULT_SOURCE: &str = "data/vocab.csv";
pub const DEFAULT_DATA_DIR: &str = ".vocab";

/// Process-wide settings, read once at startup.
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Directory holding the persisted collection, preferences and favorites
    pub data_dir: PathBuf,
    /// Loaded when nothing is persisted yet
    pub default_source: String,
    /// Enables import, export and reset
    pub admin: bool,
}

fn parse_flag(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

impl Config {
    pub fn new() -> Self {
        let data_dir = env::var("VOCAB_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_DATA_DIR));

        let default_source =
            env::var("VOCAB_DEFAULT_SOURCE").unwrap_or_else(|_| DEFAULT_SOURCE.to_string());

        let admin = env::var("VOCAB_ADMIN")
            .map(|v| parse_flag(&v))
            .unwrap_or(false);

        Config {
            data_dir,
            default_source,
            admin,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}
