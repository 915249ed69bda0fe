use crate::config::Config;
use crate::entry::{Batch, VocabEntry};
use crate::export;
use crate::persist::{self, Storage, COLLECTION_KEY};
use crate::prefs::{Favorites, Preferences};
use crate::sources::{self, VocabSource};
use crate::store::VocabStore;
use crate::Result;

/// Everything a front end needs, loaded once at startup.
pub struct App {
    pub config: Config,
    pub storage: Box<dyn Storage>,
    pub store: VocabStore,
    pub favorites: Favorites,
    pub prefs: Preferences,
    /// Shown to the user when the sample dataset was substituted.
    pub notice: Option<String>,
}

impl App {
    /// Restores persisted state. With no stored collection the default
    /// source is read, falling back to the built-in sample.
    pub fn open(config: Config, storage: Box<dyn Storage>) -> Result<Self> {
        let prefs = Preferences::init(storage.as_ref());
        let favorites = Favorites::load(storage.as_ref());
        let entries: Vec<VocabEntry> = persist::load(storage.as_ref(), COLLECTION_KEY, Vec::new());

        let mut app = App {
            store: VocabStore::new(entries),
            config,
            storage,
            favorites,
            prefs,
            notice: None,
        };
        app.store.query.sort = app.prefs.sort;

        if app.store.is_empty() {
            app.load_default()?;
        }
        Ok(app)
    }

    fn load_default(&mut self) -> Result<()> {
        let source = sources::source_for(&self.config.default_source);
        let loaded = sources::load_default(source.as_ref(), &Batch::now())?;
        self.notice = loaded.notice;
        self.store.replace(loaded.entries);

        // Unsaved data is still shown; the next start reloads the default.
        if let Err(e) = self.save_collection() {
            tracing::warn!(error = %e, "could not persist collection");
            let failed =
                format!("Could not save the collection ({e}); it will be reloaded next time.");
            self.notice = Some(match self.notice.take() {
                Some(notice) => format!("{notice} {failed}"),
                None => failed,
            });
        }
        Ok(())
    }

    pub fn save_collection(&self) -> Result<()> {
        persist::save(self.storage.as_ref(), COLLECTION_KEY, self.store.entries())
    }

    /// Replaces the collection with the source's entries. On any failure the
    /// current collection is kept.
    pub fn import(&mut self, source: &dyn VocabSource) -> Result<usize> {
        let entries = sources::ingest(source, &Batch::now())?;
        let count = entries.len();
        persist::save(self.storage.as_ref(), COLLECTION_KEY, &entries)?;
        self.store.replace(entries);
        tracing::info!(source = %source.name(), count, "imported");
        Ok(count)
    }

    /// CSV of the whole collection.
    pub fn export(&self) -> Result<String> {
        export::serialize(self.store.entries())
    }

    /// Drops the stored collection and reloads the default source.
    pub fn reset(&mut self) -> Result<()> {
        self.storage.remove(COLLECTION_KEY)?;
        self.store.replace(Vec::new());
        self.load_default()
    }

    pub fn toggle_favorite(&mut self, id: &str) -> Result<bool> {
        let now = self.favorites.toggle(id);
        self.favorites.save(self.storage.as_ref())?;
        Ok(now)
    }

    pub fn view(&self) -> Vec<VocabEntry> {
        self.store.view(&self.favorites)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persist::MemoryStorage;
    use crate::sources::FileSource;
    use crate::store::SortKey;
    use std::io;

    /// Reads find nothing, writes always fail.
    struct ReadOnlyStorage;

    impl Storage for ReadOnlyStorage {
        fn read(&self, _key: &str) -> io::Result<Option<String>> {
            Ok(None)
        }

        fn write(&self, _key: &str, _value: &str) -> io::Result<()> {
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "read-only"))
        }

        fn remove(&self, _key: &str) -> io::Result<()> {
            Ok(())
        }
    }

    fn write_csv(dir: &tempfile::TempDir, name: &str, text: &str) -> FileSource {
        let path = dir.path().join(name);
        std::fs::write(&path, text).unwrap();
        FileSource { path }
    }

    #[test]
    fn unwritable_storage_still_opens_with_notice() {
        let app = App::open(config("builtin"), Box::new(ReadOnlyStorage)).unwrap();
        assert!(!app.store.is_empty());
        assert!(app.notice.as_deref().unwrap().contains("read-only"));

        let app = App::open(config("/no/such/vocab.csv"), Box::new(ReadOnlyStorage)).unwrap();
        let notice = app.notice.unwrap();
        assert!(notice.contains("/no/such/vocab.csv"));
        assert!(notice.contains("Could not save"));
    }

    #[test]
    fn import_that_cannot_be_saved_keeps_collection() {
        let mut app = App::open(config("builtin"), Box::new(ReadOnlyStorage)).unwrap();
        let before = app.store.entries().to_vec();

        let dir = tempfile::tempdir().unwrap();
        let source = write_csv(&dir, "new.csv", "en_title,en_def\nLemma,A helper theorem\n");
        assert!(app.import(&source).is_err());
        assert_eq!(app.store.entries(), before.as_slice());
    }

    fn config(default_source: &str) -> Config {
        Config {
            data_dir: ".".into(),
            default_source: default_source.to_string(),
            admin: true,
        }
    }

    #[test]
    fn missing_default_uses_sample_with_notice() {
        let app = App::open(config("/no/such/vocab.csv"), Box::new(MemoryStorage::default())).unwrap();
        assert!(!app.store.is_empty());
        assert!(app.notice.as_deref().unwrap().contains("/no/such/vocab.csv"));
    }

    #[test]
    fn reopen_restores_persisted_collection_and_sort() {
        let dir = tempfile::tempdir().unwrap();
        let storage = || Box::new(crate::persist::FileStorage::new(dir.path()));

        let mut app = App::open(config("builtin"), storage()).unwrap();
        assert!(app.notice.is_none());
        let ids: Vec<_> = app.store.entries().iter().map(|e| e.id.clone()).collect();
        app.prefs
            .update(app.storage.as_ref(), |p| p.sort = SortKey::Frequency)
            .unwrap();
        app.toggle_favorite(&ids[0]).unwrap();

        let app = App::open(config("/missing.csv"), storage()).unwrap();
        let again: Vec<_> = app.store.entries().iter().map(|e| e.id.clone()).collect();
        assert_eq!(again, ids);
        assert!(app.notice.is_none());
        assert_eq!(app.store.query.sort, SortKey::Frequency);
        assert!(app.favorites.contains(&ids[0]));
    }

    #[test]
    fn failed_import_keeps_collection_and_favorites_survive() {
        let mut app = App::open(config("builtin"), Box::new(MemoryStorage::default())).unwrap();
        let before = app.store.entries().to_vec();
        app.toggle_favorite(&before[0].id).unwrap();

        let missing = FileSource {
            path: "/definitely/not/here.csv".into(),
        };
        assert!(app.import(&missing).is_err());
        assert_eq!(app.store.entries(), before.as_slice());

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("new.csv");
        std::fs::write(&path, "en_title,en_def\nLemma,A helper theorem\n").unwrap();
        assert_eq!(app.import(&FileSource { path }).unwrap(), 1);
        assert_eq!(app.store.len(), 1);
        assert!(app.favorites.contains(&before[0].id));
    }

    #[test]
    fn reset_reloads_default() {
        let mut app = App::open(config("builtin"), Box::new(MemoryStorage::default())).unwrap();
        let count = app.store.len();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("one.csv");
        std::fs::write(&path, "en_title,en_def\nLemma,A helper theorem\n").unwrap();
        app.import(&FileSource { path }).unwrap();

        app.reset().unwrap();
        assert_eq!(app.store.len(), count);
    }
}
