use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// One vocabulary item. Immutable once normalized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VocabEntry {
    pub id: String,
    #[serde(default)]
    pub title_zh: Option<String>,
    #[serde(default)]
    pub title_en: Option<String>,
    #[serde(default)]
    pub def_zh: Option<String>,
    #[serde(default)]
    pub def_en: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub example: Option<String>,
    #[serde(default)]
    pub details: Option<String>,
    #[serde(default)]
    pub images: Vec<String>,
    #[serde(default)]
    pub frequency: Option<f64>,
    /// Unix milliseconds
    pub added_at: i64,
}

impl VocabEntry {
    /// English title when present, otherwise the Chinese one.
    pub fn preferred_title(&self) -> &str {
        self.title_en
            .as_deref()
            .or(self.title_zh.as_deref())
            .unwrap_or("")
    }

    pub fn has_zh_pair(&self) -> bool {
        self.title_zh.is_some() && self.def_zh.is_some()
    }

    pub fn has_en_pair(&self) -> bool {
        self.title_en.is_some() && self.def_en.is_some()
    }

    /// Lowercased text the free-text filter searches in.
    pub fn haystack(&self) -> String {
        let tags = self.tags.join(" ");
        [
            self.title_zh.as_deref(),
            self.title_en.as_deref(),
            self.def_zh.as_deref(),
            self.def_en.as_deref(),
            self.category.as_deref(),
            self.example.as_deref(),
        ]
        .into_iter()
        .flatten()
        .chain(std::iter::once(tags.as_str()))
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
    }
}

/// Shared context for one ingestion run: every entry of a batch gets the
/// same timestamp, and ids are unique within the batch via the row index.
#[derive(Debug, Clone, Copy)]
pub struct Batch {
    pub started_at: i64,
}

impl Batch {
    pub fn now() -> Self {
        Self {
            started_at: Utc::now().timestamp_millis(),
        }
    }

    pub fn at(started_at: i64) -> Self {
        Self { started_at }
    }

    pub fn id_for(&self, index: usize) -> String {
        let suffix: String = rand::rng()
            .sample_iter(&Alphanumeric)
            .take(6)
            .map(char::from)
            .collect();
        format!("{}-{}-{}", self.started_at, index, suffix.to_lowercase())
    }
}
