use std::collections::BTreeSet;

use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::entry::VocabEntry;
use crate::persist::{self, Storage, FAVORITES_KEY, PREFS_KEY};
use crate::store::SortKey;
use crate::Result;

/// Favorited entry ids. Ids of entries that no longer exist stay inert.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Favorites(BTreeSet<String>);

impl Favorites {
    pub fn load(storage: &dyn Storage) -> Self {
        persist::load(storage, FAVORITES_KEY, Self::default())
    }

    pub fn save(&self, storage: &dyn Storage) -> Result<()> {
        persist::save(storage, FAVORITES_KEY, self)
    }

    /// Flips membership and returns the new state.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.0.remove(id) {
            false
        } else {
            self.0.insert(id.to_string());
            true
        }
    }

    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn is_favorite(&self, entry: &VocabEntry) -> bool {
        self.contains(&entry.id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum UiLanguage {
    #[default]
    Zh,
    En,
}

/// Which language columns are shown for each entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ContentMode {
    Zh,
    En,
    #[default]
    Both,
}

impl ContentMode {
    pub fn title(&self, entry: &VocabEntry) -> String {
        pick(self, entry.title_zh.as_deref(), entry.title_en.as_deref())
    }

    pub fn definition(&self, entry: &VocabEntry) -> String {
        pick(self, entry.def_zh.as_deref(), entry.def_en.as_deref())
    }
}

/// Falls back to the other language when the chosen one is missing.
fn pick(mode: &ContentMode, zh: Option<&str>, en: Option<&str>) -> String {
    match (mode, zh, en) {
        (ContentMode::Both, Some(zh), Some(en)) => format!("{zh} / {en}"),
        (ContentMode::Zh, Some(zh), _) | (ContentMode::En, None, Some(zh)) => zh.to_string(),
        (ContentMode::En, _, Some(en)) | (ContentMode::Zh, None, Some(en)) => en.to_string(),
        (_, Some(s), None) | (_, None, Some(s)) => s.to_string(),
        (_, None, None) => String::new(),
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub ui_language: UiLanguage,
    pub content_mode: ContentMode,
    pub sort: SortKey,
}

impl Preferences {
    /// Persisted preferences, or defaults.
    pub fn init(storage: &dyn Storage) -> Self {
        persist::load(storage, PREFS_KEY, Self::default())
    }

    /// Applies `change` in memory and persists the result.
    pub fn update<F>(&mut self, storage: &dyn Storage, change: F) -> Result<()>
    where
        F: FnOnce(&mut Self),
    {
        change(self);
        persist::save(storage, PREFS_KEY, self)
    }
}
