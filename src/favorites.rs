//! Durable favorites set.
//!
//! The store keeps entries in a hash index keyed by movie id, with an
//! insertion counter per entry so enumeration stays in the order movies were
//! first favorited. Every mutation rewrites the whole set into a single
//! storage slot as a JSON array of [`MovieSummary`]. Several processes sharing
//! one slot follow last-writer-wins.

use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::{debug, info, warn};

use crate::error::StoreError;
use crate::models::{MovieId, MovieSummary};

pub const FAVORITES_SLOT: &str = "favorites";

/// Named-slot key-value storage holding serialized state.
pub trait SlotStorage: Send + Sync {
    /// `Ok(None)` when the slot has never been written.
    fn read(&self, slot: &str) -> io::Result<Option<String>>;
    fn write(&self, slot: &str, contents: &str) -> io::Result<()>;
}

/// One `<slot>.json` file per slot under `dir`.
#[derive(Debug, Clone)]
pub struct FileStorage {
    dir: PathBuf,
}

impl FileStorage {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn slot_path(&self, slot: &str) -> PathBuf {
        self.dir.join(format!("{slot}.json"))
    }
}

impl SlotStorage for FileStorage {
    fn read(&self, slot: &str) -> io::Result<Option<String>> {
        match fs::read_to_string(self.slot_path(slot)) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Each write goes to its own temp file in `dir` and is renamed over the
    /// slot, so concurrent writers never share a half-written file.
    fn write(&self, slot: &str, contents: &str) -> io::Result<()> {
        fs::create_dir_all(&self.dir)?;
        let mut tmp = tempfile::Builder::new()
            .prefix(&format!(".{slot}."))
            .suffix(".tmp")
            .tempfile_in(&self.dir)?;
        tmp.write_all(contents.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(self.slot_path(slot)).map_err(|e| e.error)?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct MemoryStorage {
    slots: Mutex<HashMap<String, String>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self) -> std::sync::MutexGuard<'_, HashMap<String, String>> {
        self.slots.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl SlotStorage for MemoryStorage {
    fn read(&self, slot: &str) -> io::Result<Option<String>> {
        Ok(self.slots().get(slot).cloned())
    }

    fn write(&self, slot: &str, contents: &str) -> io::Result<()> {
        self.slots().insert(slot.to_string(), contents.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone)]
struct Entry {
    seq: u64,
    movie: MovieSummary,
}

pub struct FavoritesStore {
    storage: Arc<dyn SlotStorage>,
    entries: HashMap<MovieId, Entry>,
    next_seq: u64,
}

impl FavoritesStore {
    /// Rehydrates from storage. Missing or unreadable data yields an empty
    /// store rather than an error.
    pub fn open(storage: Arc<dyn SlotStorage>) -> Self {
        let mut store = Self {
            storage,
            entries: HashMap::new(),
            next_seq: 0,
        };
        for movie in store.load() {
            if store.entries.contains_key(&movie.id) {
                debug!("Skipping duplicate stored favorite {}", movie.id);
                continue;
            }
            store.insert_new(movie);
        }
        info!("Loaded {} favorites", store.entries.len());
        store
    }

    fn load(&self) -> Vec<MovieSummary> {
        let raw = match self.storage.read(FAVORITES_SLOT) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                warn!("Could not read stored favorites, starting empty: {}", e);
                return Vec::new();
            }
        };
        match serde_json::from_str(&raw) {
            Ok(movies) => movies,
            Err(e) => {
                warn!("Stored favorites are corrupt, starting empty: {}", e);
                Vec::new()
            }
        }
    }

    pub fn is_favorite(&self, id: MovieId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Adds or refreshes a favorite. A repeated id keeps its original position
    /// and takes the newer summary.
    pub fn add_to_favorites(&mut self, movie: MovieSummary) -> Result<(), StoreError> {
        match self.entries.get_mut(&movie.id) {
            Some(entry) => entry.movie = movie,
            None => self.insert_new(movie),
        }
        self.persist()
    }

    /// Absent ids are a no-op and do not touch storage.
    pub fn remove_from_favorites(&mut self, id: MovieId) -> Result<(), StoreError> {
        if self.entries.remove(&id).is_none() {
            return Ok(());
        }
        self.persist()
    }

    /// Flips the favorite flag for `movie` and returns the new flag.
    pub fn toggle(&mut self, movie: MovieSummary) -> Result<bool, StoreError> {
        if self.is_favorite(movie.id) {
            self.remove_from_favorites(movie.id)?;
            Ok(false)
        } else {
            self.add_to_favorites(movie)?;
            Ok(true)
        }
    }

    pub fn list_favorites(&self) -> Vec<MovieSummary> {
        let mut entries: Vec<&Entry> = self.entries.values().collect();
        entries.sort_by_key(|e| e.seq);
        entries.into_iter().map(|e| e.movie.clone()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn insert_new(&mut self, movie: MovieSummary) {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.entries.insert(movie.id, Entry { seq, movie });
    }

    fn persist(&self) -> Result<(), StoreError> {
        let encoded = serde_json::to_string(&self.list_favorites())?;
        self.storage.write(FAVORITES_SLOT, &encoded)?;
        debug!("Persisted {} favorites", self.entries.len());
        Ok(())
    }
}
