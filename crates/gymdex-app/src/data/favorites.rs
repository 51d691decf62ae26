//! Shared favorites store
//!
//! One authoritative, persisted list of favorited exercises shared by every
//! mounted view. Mutations are applied to the shared list, broadcast
//! synchronously to all subscribers in registration order, then written to
//! disk. Persistence failures are reported and swallowed; the list stays
//! valid in memory.

use crate::data::storage;
use crate::data::types::Exercise;
use crate::error::Result;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Favorites data file name
const FAVORITES_FILE: &str = "exercise_favorites.json";

/// Pre-namespacing file name, migrated once on first load
const LEGACY_FAVORITES_FILE: &str = "favorites.json";

/// Handle returned by [`FavoritesStore::subscribe`], used to unsubscribe
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriberId(u64);

type Callback = Arc<dyn Fn(&[Exercise]) + Send + Sync>;

struct StoreInner {
    /// Insertion-ordered, unique by exercise id
    favorites: Vec<Exercise>,
    /// Notified in registration order on every mutation
    subscribers: Vec<(SubscriberId, Callback)>,
    next_subscriber: u64,
    path: PathBuf,
}

/// Shared favorites store
///
/// Cheap to clone; all clones address the same list and subscriber registry.
/// Create one at the application root and hand clones (or
/// [`FavoritesBinding`]s) to each view.
#[derive(Clone)]
pub struct FavoritesStore {
    inner: Arc<Mutex<StoreInner>>,
}

impl FavoritesStore {
    /// Load the store from the default config directory
    ///
    /// Errors only if the config directory cannot be determined; a missing
    /// or unreadable favorites file degrades to an empty list.
    pub fn load() -> Result<Self> {
        let dir = storage::ensure_config_dir()?;
        Ok(Self::load_from(&dir))
    }

    /// Load the store from a specific directory
    pub fn load_from(dir: &Path) -> Self {
        let path = dir.join(FAVORITES_FILE);
        let legacy = dir.join(LEGACY_FAVORITES_FILE);
        let favorites = read_initial(&path, &legacy);

        Self {
            inner: Arc::new(Mutex::new(StoreInner {
                favorites,
                subscribers: Vec::new(),
                next_subscriber: 0,
                path,
            })),
        }
    }

    /// Register a callback invoked with the full updated list on every
    /// mutation. Returns a handle for [`unsubscribe`](Self::unsubscribe).
    pub fn subscribe<F>(&self, callback: F) -> SubscriberId
    where
        F: Fn(&[Exercise]) + Send + Sync + 'static,
    {
        let mut inner = self.lock();
        let id = SubscriberId(inner.next_subscriber);
        inner.next_subscriber += 1;
        inner.subscribers.push((id, Arc::new(callback)));
        id
    }

    /// Remove a subscription; idempotent (no-op if already removed)
    pub fn unsubscribe(&self, id: SubscriberId) {
        self.lock().subscribers.retain(|(sid, _)| *sid != id);
    }

    /// Add an exercise to the favorites
    ///
    /// No-op for an empty id or an id already present (first write wins on
    /// identity, not content). A successful add appends at the end,
    /// broadcasts, then persists.
    pub fn add(&self, exercise: Exercise) {
        if exercise.id.is_empty() {
            eprintln!("gymdex: ignoring favorite without an id");
            return;
        }

        {
            let mut inner = self.lock();
            if inner.favorites.iter().any(|e| e.id == exercise.id) {
                return;
            }
            inner.favorites.push(exercise);
        }
        self.broadcast_and_persist();
    }

    /// Remove the favorite with the given id
    ///
    /// No-op for an empty id. An id that matches nothing leaves the list
    /// unchanged but still broadcasts and re-persists; it is not an error.
    pub fn remove(&self, id: &str) {
        if id.is_empty() {
            eprintln!("gymdex: ignoring favorite removal without an id");
            return;
        }

        {
            let mut inner = self.lock();
            inner.favorites.retain(|e| e.id != id);
        }
        self.broadcast_and_persist();
    }

    /// Whether an exercise with this id is favorited (empty id is never
    /// favorited)
    pub fn is_favorite(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        self.lock().favorites.iter().any(|e| e.id == id)
    }

    /// Remove all favorites
    pub fn clear(&self) {
        self.lock().favorites.clear();
        self.broadcast_and_persist();
    }

    /// Snapshot of the current list
    pub fn favorites(&self) -> Vec<Exercise> {
        self.lock().favorites.clone()
    }

    /// Number of favorites
    pub fn count(&self) -> usize {
        self.lock().favorites.len()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, StoreInner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Notify every subscriber with the updated list, then write it out.
    ///
    /// The lock is released before callbacks run, so subscribers may
    /// re-enter the store for reads. Broadcast completes before this
    /// returns; persistence failures are reported and swallowed.
    fn broadcast_and_persist(&self) {
        let (snapshot, callbacks, path) = {
            let inner = self.lock();
            let callbacks: Vec<Callback> = inner
                .subscribers
                .iter()
                .map(|(_, cb)| Arc::clone(cb))
                .collect();
            (inner.favorites.clone(), callbacks, inner.path.clone())
        };

        for callback in &callbacks {
            callback(&snapshot);
        }

        if let Err(e) = storage::save_to(&path, &snapshot) {
            eprintln!("gymdex: failed to persist favorites: {}", e);
        }
    }
}

/// Read the initial list: current file first, then one-time migration from
/// the legacy file. Malformed content is reported and treated as empty;
/// this never errors to the caller.
fn read_initial(current: &Path, legacy: &Path) -> Vec<Exercise> {
    match read_list(current) {
        ReadOutcome::List(list) => list,
        ReadOutcome::Invalid => Vec::new(),
        ReadOutcome::Missing => match read_list(legacy) {
            ReadOutcome::List(list) => {
                // Move the value under the namespaced file, then drop the
                // legacy one. Keep the legacy file if the write failed.
                match storage::save_to(current, &list) {
                    Ok(()) => {
                        if let Err(e) = storage::delete_at(legacy) {
                            eprintln!("gymdex: failed to remove legacy favorites: {}", e);
                        }
                    }
                    Err(e) => eprintln!("gymdex: failed to migrate favorites: {}", e),
                }
                list
            }
            _ => Vec::new(),
        },
    }
}

enum ReadOutcome {
    Missing,
    Invalid,
    List(Vec<Exercise>),
}

fn read_list(path: &Path) -> ReadOutcome {
    match storage::load_from::<serde_json::Value>(path) {
        Ok(None) => ReadOutcome::Missing,
        Ok(Some(value)) => match serde_json::from_value::<Vec<Exercise>>(value) {
            Ok(list) => ReadOutcome::List(list),
            Err(e) => {
                eprintln!("gymdex: favorites file {:?} is not an exercise list: {}", path, e);
                ReadOutcome::Invalid
            }
        },
        Err(e) => {
            eprintln!("gymdex: failed to load favorites: {}", e);
            ReadOutcome::Invalid
        }
    }
}

// =============================================================================
// FavoritesBinding - per-view handle
// =============================================================================

/// Per-view binding to the shared favorites store
///
/// Subscribes on construction and unsubscribes on drop, so a dropped view
/// never receives another callback. Keeps a local copy that the broadcast
/// protocol holds equal to the shared list; the copy exists so the owning
/// view can render without locking the store, never as a second source of
/// truth.
pub struct FavoritesBinding {
    store: FavoritesStore,
    local: Arc<Mutex<Vec<Exercise>>>,
    id: SubscriberId,
}

impl FavoritesBinding {
    pub fn new(store: &FavoritesStore) -> Self {
        let local = Arc::new(Mutex::new(store.favorites()));
        let mirror = Arc::clone(&local);
        let id = store.subscribe(move |list| {
            *mirror.lock().unwrap_or_else(|e| e.into_inner()) = list.to_vec();
        });

        Self {
            store: store.clone(),
            local,
            id,
        }
    }

    /// The view's copy of the favorites list
    pub fn favorites(&self) -> Vec<Exercise> {
        self.local.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }

    /// Number of favorites
    pub fn count(&self) -> usize {
        self.local.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether an exercise with this id is favorited
    pub fn is_favorite(&self, id: &str) -> bool {
        if id.is_empty() {
            return false;
        }
        self.local
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .iter()
            .any(|e| e.id == id)
    }

    pub fn add_favorite(&self, exercise: Exercise) {
        self.store.add(exercise);
    }

    pub fn remove_favorite(&self, id: &str) {
        self.store.remove(id);
    }

    pub fn clear_favorites(&self) {
        self.store.clear();
    }

    /// Add the exercise if absent, remove it if present
    pub fn toggle(&self, exercise: &Exercise) {
        if self.is_favorite(&exercise.id) {
            self.store.remove(&exercise.id);
        } else {
            self.store.add(exercise.clone());
        }
    }
}

impl Drop for FavoritesBinding {
    fn drop(&mut self) {
        self.store.unsubscribe(self.id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env::temp_dir;
    use std::fs;
    use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};

    static TEST_COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_store_dir() -> PathBuf {
        let id = TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
        let dir = temp_dir().join(format!("gymdex_fav_test_{}", id));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn exercise(id: &str, name: &str) -> Exercise {
        Exercise::new(id, name).with_taxonomy("waist", "abs", "body weight")
    }

    fn stored_ids(dir: &Path) -> Option<Vec<String>> {
        let content = fs::read_to_string(dir.join(FAVORITES_FILE)).ok()?;
        let list: Vec<Exercise> = serde_json::from_str(&content).ok()?;
        Some(list.into_iter().map(|e| e.id).collect())
    }

    #[test]
    fn test_empty_store() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);
        assert_eq!(store.count(), 0);
        assert!(store.favorites().is_empty());
        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_add_and_is_favorite() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0001", "Push-up"));
        assert!(store.is_favorite("0001"));
        assert!(!store.is_favorite("0002"));
        assert_eq!(store.count(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remove_then_not_favorite() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0001", "Push-up"));
        store.remove("0001");
        assert!(!store.is_favorite("0001"));
        assert_eq!(store.count(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_scripted_scenario() {
        // add 0001, duplicate add, remove of a missing id, clear
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0001", "Push-up"));
        assert_eq!(store.count(), 1);

        store.add(exercise("0001", "Push-up (renamed)"));
        assert_eq!(store.count(), 1);
        // First write wins on identity, not content
        assert_eq!(store.favorites()[0].name, "Push-up");

        store.remove("0002");
        assert_eq!(store.count(), 1);

        store.clear();
        assert!(store.favorites().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_no_duplicate_ids_ever() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        for _ in 0..3 {
            store.add(exercise("0001", "Push-up"));
            store.add(exercise("0002", "Sit-up"));
            store.remove("0001");
            store.add(exercise("0001", "Push-up"));
        }

        let ids: Vec<String> = store.favorites().into_iter().map(|e| e.id).collect();
        let mut deduped = ids.clone();
        deduped.sort();
        deduped.dedup();
        assert_eq!(ids.len(), deduped.len());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_insertion_order_preserved() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0003", "c"));
        store.add(exercise("0001", "a"));
        store.add(exercise("0002", "b"));

        let ids: Vec<String> = store.favorites().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["0003", "0001", "0002"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_empty_id_ignored() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("", "nameless"));
        assert_eq!(store.count(), 0);
        assert!(!store.is_favorite(""));

        store.add(exercise("0001", "Push-up"));
        store.remove("");
        assert_eq!(store.count(), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_broadcast_reaches_all_subscribers_synchronously() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        let first = FavoritesBinding::new(&store);
        let second = FavoritesBinding::new(&store);

        first.add_favorite(exercise("0001", "Push-up"));

        // Both bindings observed the new entry before add_favorite returned
        assert_eq!(first.favorites().len(), 1);
        assert_eq!(second.favorites().len(), 1);
        assert!(second.is_favorite("0001"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_subscribers_notified_in_registration_order() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        let order = Arc::new(Mutex::new(Vec::new()));
        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            store.subscribe(move |_| order.lock().unwrap().push(tag));
        }

        store.add(exercise("0001", "Push-up"));
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_unsubscribed_callback_never_fires() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let id = store.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        store.add(exercise("0001", "Push-up"));
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        store.unsubscribe(id);
        store.add(exercise("0002", "Sit-up"));
        store.clear();
        assert_eq!(calls.load(Ordering::SeqCst), 1);

        // Idempotent
        store.unsubscribe(id);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_dropped_binding_stops_receiving() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        let keeper = FavoritesBinding::new(&store);
        {
            let dropped = FavoritesBinding::new(&store);
            keeper.add_favorite(exercise("0001", "Push-up"));
            assert_eq!(dropped.count(), 1);
        }

        // The dropped binding unsubscribed itself; mutations keep flowing
        // to the survivors only.
        keeper.add_favorite(exercise("0002", "Sit-up"));
        assert_eq!(keeper.count(), 2);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_callback_may_read_store() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        let probe = store.clone();
        let seen = Arc::new(AtomicUsize::new(0));
        let seen_in_cb = Arc::clone(&seen);
        store.subscribe(move |list| {
            // Re-entrant read while a mutation is in flight
            assert_eq!(probe.count(), list.len());
            seen_in_cb.store(list.len(), Ordering::SeqCst);
        });

        store.add(exercise("0001", "Push-up"));
        assert_eq!(seen.load(Ordering::SeqCst), 1);

        let _ = fs::remove_dir_all(&dir);
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    #[test]
    fn test_save_after_each_mutation() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0001", "Push-up"));
        assert_eq!(stored_ids(&dir).unwrap(), vec!["0001"]);

        store.add(exercise("0002", "Sit-up"));
        assert_eq!(stored_ids(&dir).unwrap(), vec!["0001", "0002"]);

        store.remove("0001");
        assert_eq!(stored_ids(&dir).unwrap(), vec!["0002"]);

        store.clear();
        assert_eq!(stored_ids(&dir).unwrap(), Vec::<String>::new());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_noop_add_does_not_save() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0001", "Push-up"));

        // Remove the file; a duplicate add is a no-op and must not recreate it
        fs::remove_file(dir.join(FAVORITES_FILE)).unwrap();
        store.add(exercise("0001", "Push-up"));
        assert!(!dir.join(FAVORITES_FILE).exists());

        // An invalid add must not save either
        store.add(exercise("", "nameless"));
        assert!(!dir.join(FAVORITES_FILE).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_remove_of_missing_id_still_persists() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        store.add(exercise("0001", "Push-up"));
        fs::remove_file(dir.join(FAVORITES_FILE)).unwrap();

        store.remove("no-such-id");
        // List unchanged, but the call re-persisted it
        assert_eq!(stored_ids(&dir).unwrap(), vec!["0001"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_roundtrip_preserves_ids_and_order() {
        let dir = temp_store_dir();
        {
            let store = FavoritesStore::load_from(&dir);
            store.add(exercise("0003", "c"));
            store.add(exercise("0001", "a"));
            store.add(exercise("0002", "b"));
        }

        let reloaded = FavoritesStore::load_from(&dir);
        let ids: Vec<String> = reloaded.favorites().into_iter().map(|e| e.id).collect();
        assert_eq!(ids, vec!["0003", "0001", "0002"]);
        assert_eq!(reloaded.favorites()[1].name, "a");

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_persistence_failure_degrades_to_memory() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        // Turn the target path into a directory so the save fails
        fs::create_dir_all(dir.join(FAVORITES_FILE)).unwrap();

        store.add(exercise("0001", "Push-up"));
        // Still valid in memory despite the failed write
        assert!(store.is_favorite("0001"));

        let _ = fs::remove_dir_all(&dir);
    }

    // =========================================================================
    // Loading and migration
    // =========================================================================

    #[test]
    fn test_legacy_migration() {
        let dir = temp_store_dir();
        let legacy = dir.join(LEGACY_FAVORITES_FILE);
        fs::write(&legacy, r#"[{"id":"x","name":"legacy"}]"#).unwrap();

        let store = FavoritesStore::load_from(&dir);
        assert!(store.is_favorite("x"));

        // Legacy file is gone; the namespaced file now holds the same value
        assert!(!legacy.exists());
        assert_eq!(stored_ids(&dir).unwrap(), vec!["x"]);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_current_file_wins_over_legacy() {
        let dir = temp_store_dir();
        fs::write(
            dir.join(FAVORITES_FILE),
            r#"[{"id":"new","name":"current"}]"#,
        )
        .unwrap();
        fs::write(
            dir.join(LEGACY_FAVORITES_FILE),
            r#"[{"id":"old","name":"legacy"}]"#,
        )
        .unwrap();

        let store = FavoritesStore::load_from(&dir);
        assert!(store.is_favorite("new"));
        assert!(!store.is_favorite("old"));
        // No migration happened; the legacy file is untouched
        assert!(dir.join(LEGACY_FAVORITES_FILE).exists());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_malformed_file_loads_empty() {
        let dir = temp_store_dir();
        fs::write(dir.join(FAVORITES_FILE), "{ not json").unwrap();

        let store = FavoritesStore::load_from(&dir);
        assert_eq!(store.count(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_non_array_payload_loads_empty() {
        let dir = temp_store_dir();
        fs::write(dir.join(FAVORITES_FILE), r#"{"id":"x","name":"object"}"#).unwrap();

        let store = FavoritesStore::load_from(&dir);
        assert_eq!(store.count(), 0);

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_store_remains_usable_after_bad_load() {
        let dir = temp_store_dir();
        fs::write(dir.join(FAVORITES_FILE), "][").unwrap();

        let store = FavoritesStore::load_from(&dir);
        store.add(exercise("0001", "Push-up"));
        assert_eq!(stored_ids(&dir).unwrap(), vec!["0001"]);

        let _ = fs::remove_dir_all(&dir);
    }

    // =========================================================================
    // Binding
    // =========================================================================

    #[test]
    fn test_binding_initializes_from_current_list() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);
        store.add(exercise("0001", "Push-up"));

        // A binding created after mutations sees the current shared list
        let late = FavoritesBinding::new(&store);
        assert_eq!(late.count(), 1);
        assert!(late.is_favorite("0001"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_binding_mirrors_stay_equal() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);

        let a = FavoritesBinding::new(&store);
        let b = FavoritesBinding::new(&store);

        a.add_favorite(exercise("0001", "Push-up"));
        b.add_favorite(exercise("0002", "Sit-up"));
        a.remove_favorite("0001");

        assert_eq!(a.favorites(), b.favorites());
        assert_eq!(a.favorites(), store.favorites());

        b.clear_favorites();
        assert!(a.favorites().is_empty());

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_binding_toggle() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);
        let binding = FavoritesBinding::new(&store);

        let ex = exercise("0001", "Push-up");
        binding.toggle(&ex);
        assert!(binding.is_favorite("0001"));

        binding.toggle(&ex);
        assert!(!binding.is_favorite("0001"));

        let _ = fs::remove_dir_all(&dir);
    }

    #[test]
    fn test_binding_empty_id_is_never_favorite() {
        let dir = temp_store_dir();
        let store = FavoritesStore::load_from(&dir);
        let binding = FavoritesBinding::new(&store);

        assert!(!binding.is_favorite(""));

        let _ = fs::remove_dir_all(&dir);
    }
}
