//! Bilingual (Chinese/English) vocabulary deck.
//!
//! CSV rows are normalized into [`VocabEntry`] values, held in a
//! [`VocabStore`] that derives filtered and sorted views, and persisted
//! through a key/value [`persist::Storage`].

pub mod app;
pub mod config;
pub mod entry;
pub mod export;
pub mod normalize;
pub mod persist;
pub mod prefs;
pub mod sources;
pub mod store;
pub mod study;

pub use app::App;
pub use config::Config;
pub use entry::{Batch, VocabEntry};
pub use prefs::{ContentMode, Favorites, Preferences, Theme, UiLanguage};
pub use store::{QueryState, SortKey, VocabStore};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("export produced invalid UTF-8")]
    Utf8(#[from] std::string::FromUtf8Error),

    #[error("no valid entries in {0}")]
    Empty(String),

    #[error("built-in asset {0} is missing")]
    MissingAsset(&'static str),
}

pub type Result<T> = std::result::Result<T, Error>;
