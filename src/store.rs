use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use clap::ValueEnum;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

use crate::entry::VocabEntry;
use crate::prefs::Favorites;

/// Sentinel for "no category/tag filter".
pub const ALL: &str = "all";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    #[default]
    Alpha,
    Initial,
    Category,
    Recent,
    Frequency,
    Random,
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SortKey::Alpha => "alpha",
            SortKey::Initial => "initial",
            SortKey::Category => "category",
            SortKey::Recent => "recent",
            SortKey::Frequency => "frequency",
            SortKey::Random => "random",
        };
        f.write_str(name)
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        <SortKey as ValueEnum>::from_str(s, true)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct QueryState {
    pub query: String,
    pub category: String,
    pub tag: String,
    pub sort: SortKey,
    pub favorites_only: bool,
}

impl Default for QueryState {
    fn default() -> Self {
        Self {
            query: String::new(),
            category: ALL.to_string(),
            tag: ALL.to_string(),
            sort: SortKey::default(),
            favorites_only: false,
        }
    }
}

/// Owns the collection and the current query.
#[derive(Debug, Default)]
pub struct VocabStore {
    entries: Vec<VocabEntry>,
    pub query: QueryState,
}

impl VocabStore {
    pub fn new(entries: Vec<VocabEntry>) -> Self {
        Self {
            entries,
            query: QueryState::default(),
        }
    }

    pub fn entries(&self) -> &[VocabEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&VocabEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    /// Swaps in a freshly imported collection. Favorites live elsewhere and
    /// are untouched.
    pub fn replace(&mut self, entries: Vec<VocabEntry>) {
        self.entries = entries;
    }

    fn matches(&self, entry: &VocabEntry, needle: &str, favorites: &Favorites) -> bool {
        let q = &self.query;

        if !needle.is_empty() && !entry.haystack().contains(needle) {
            return false;
        }
        if q.category != ALL && entry.category.as_deref() != Some(q.category.as_str()) {
            return false;
        }
        if q.tag != ALL && !entry.tags.iter().any(|t| *t == q.tag) {
            return false;
        }
        if q.favorites_only && !favorites.contains(&entry.id) {
            return false;
        }
        true
    }

    /// Filtered and ordered copy of the collection. With [`SortKey::Random`]
    /// every call yields a fresh order.
    pub fn view(&self, favorites: &Favorites) -> Vec<VocabEntry> {
        let needle = self.query.query.trim().to_lowercase();
        let mut view: Vec<VocabEntry> = self
            .entries
            .iter()
            .filter(|e| self.matches(e, &needle, favorites))
            .cloned()
            .collect();

        match self.query.sort {
            SortKey::Random => shuffle(&mut view),
            key => sort_entries(&mut view, key),
        }
        view
    }

    /// Cards for study mode: the view, or everything when the filters leave
    /// nothing to show.
    pub fn study_deck(&self, view: Vec<VocabEntry>) -> Vec<VocabEntry> {
        if view.is_empty() && !self.entries.is_empty() {
            self.entries.clone()
        } else {
            view
        }
    }

    pub fn categories(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .entries
            .iter()
            .filter_map(|e| e.category.as_deref())
            .collect();
        set.into_iter().map(str::to_string).collect()
    }

    pub fn tags(&self) -> Vec<String> {
        let set: BTreeSet<&str> = self
            .entries
            .iter()
            .flat_map(|e| e.tags.iter().map(String::as_str))
            .collect();
        set.into_iter().map(str::to_string).collect()
    }
}

/// Transliterated, case-folded key so Chinese titles order by pinyin
/// alongside English ones.
fn collation_key(s: &str) -> String {
    unidecode::unidecode(s).trim().to_lowercase()
}

fn collate(a: &str, b: &str) -> Ordering {
    collation_key(a)
        .cmp(&collation_key(b))
        .then_with(|| a.cmp(b))
}

fn alphabetical(a: &VocabEntry, b: &VocabEntry) -> Ordering {
    collate(a.preferred_title(), b.preferred_title())
}

/// `A`..=`Z`, or `#` for titles that do not start with a Latin letter.
pub fn initial_bucket(entry: &VocabEntry) -> char {
    collation_key(entry.preferred_title())
        .chars()
        .next()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .unwrap_or('#')
}

fn bucket_order(c: char) -> (bool, char) {
    (c == '#', c)
}

/// Stable sort by a deterministic key. `Random` is handled by [`shuffle`]
/// and leaves the order unchanged here.
pub fn sort_entries(entries: &mut [VocabEntry], key: SortKey) {
    match key {
        SortKey::Alpha => entries.sort_by(alphabetical),
        SortKey::Initial => entries.sort_by(|a, b| {
            bucket_order(initial_bucket(a))
                .cmp(&bucket_order(initial_bucket(b)))
                .then_with(|| alphabetical(a, b))
        }),
        SortKey::Category => entries.sort_by(|a, b| {
            match (a.category.as_deref(), b.category.as_deref()) {
                (Some(x), Some(y)) => collate(x, y),
                (Some(_), None) => Ordering::Less,
                (None, Some(_)) => Ordering::Greater,
                (None, None) => Ordering::Equal,
            }
            .then_with(|| alphabetical(a, b))
        }),
        SortKey::Recent => entries.sort_by(|a, b| b.added_at.cmp(&a.added_at)),
        SortKey::Frequency => entries.sort_by(|a, b| {
            let fa = a.frequency.unwrap_or(0.0);
            let fb = b.frequency.unwrap_or(0.0);
            fb.total_cmp(&fa)
        }),
        SortKey::Random => {}
    }
}

pub fn shuffle(entries: &mut [VocabEntry]) {
    entries.shuffle(&mut rand::rng());
}
