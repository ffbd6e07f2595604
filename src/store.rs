//! The document store: one JSON file, six collections, whole-document I/O.
//!
//! The file is the single source of truth. Every read loads the whole
//! document, every mutation rewrites the whole document through a
//! temp-file-then-rename, so a concurrent reader never observes a
//! half-written record. [`ensure`] runs once at startup and guarantees the
//! file exists before the listener binds; it never touches a file that is
//! already there, which makes it safe to run on every redeploy.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

use serde_json::{Map, Value};
use tracing::info;

use crate::error::Error;

/// The collections a fresh document starts with. Later writes may add
/// top-level keys; the store does not forbid them.
pub const COLLECTIONS: [&str; 6] =
    ["tours", "promotions", "leaders", "users", "bookings", "comments"];

/// Top-level shape of the persisted file: collection name → array of records.
pub type Document = Map<String, Value>;

/// A record is any JSON object. The `id` key is the conventional identifier;
/// the store enforces neither its uniqueness nor its type.
pub type Record = Map<String, Value>;

// ── Startup: ensure ──────────────────────────────────────────────────────────

/// Guarantees a loadable document exists at `path` before anything reads it.
///
/// Exactly one of three things happens, in precedence order:
/// 1. `path` already exists → left byte-for-byte untouched.
/// 2. `seed` names a readable file → its bytes are copied verbatim.
/// 3. A fresh document with the six empty collections is written.
///
/// The parent directory chain of `path` is created first if missing. Both
/// write paths go through a rename, so a failure part-way cannot leave a
/// truncated file that a later read would parse.
pub fn ensure(path: &Path, seed: Option<&Path>) -> Result<(), Error> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    if path.exists() {
        info!(db = %path.display(), "reusing existing database");
        return Ok(());
    }

    match seed.filter(|s| s.is_file()) {
        Some(seed) => {
            let tmp = tmp_path(path);
            fs::copy(seed, &tmp)?;
            fs::rename(&tmp, path)?;
            info!(seed = %seed.display(), db = %path.display(), "seeded database");
        }
        None => {
            let doc: Document = COLLECTIONS
                .iter()
                .map(|name| (name.to_string(), Value::Array(Vec::new())))
                .collect();
            write_atomic(path, &serde_json::to_vec_pretty(&doc)?)?;
            info!(db = %path.display(), "created empty database");
        }
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("json");
    path.with_extension(format!("{ext}.tmp"))
}

/// Write to a sibling temp file, then rename over `path`. Rename within one
/// directory stays on one filesystem, so the swap is atomic on Unix.
fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    let tmp = tmp_path(path);
    fs::write(&tmp, bytes)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

// ── Store handle ─────────────────────────────────────────────────────────────

/// Single-owner handle over the document file.
///
/// The lock serializes every read-modify-write cycle, so two concurrent
/// requests can never interleave their mutations. All I/O is local and
/// synchronous; operations hold the lock only for the duration of one
/// load-or-save pass.
pub struct Store {
    path: PathBuf,
    lock: Mutex<()>,
}

impl Store {
    /// Opens the document at `path`. Call [`ensure`] first — the store
    /// assumes the file exists and fails individual operations otherwise.
    pub fn open(path: PathBuf) -> Self {
        Self { path, lock: Mutex::new(()) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Full contents of one collection, in insertion order.
    /// `None` if the document has no such top-level key.
    pub fn list(&self, collection: &str) -> Result<Option<Vec<Value>>, Error> {
        let _guard = self.guard();
        let doc = self.load()?;
        Ok(doc.get(collection).and_then(Value::as_array).cloned())
    }

    /// The first record in `collection` whose `id` matches.
    pub fn find(&self, collection: &str, id: &str) -> Result<Option<Value>, Error> {
        let _guard = self.guard();
        let doc = self.load()?;
        let Some(items) = doc.get(collection).and_then(Value::as_array) else {
            return Ok(None);
        };
        Ok(items.iter().find(|r| id_matches(r, id)).cloned())
    }

    /// Appends a record. A missing `id` is assigned `max(numeric ids) + 1`
    /// (starting at 1); a caller-supplied `id` is kept untouched and not
    /// checked for uniqueness. Returns the stored record, or `None` when the
    /// collection does not exist.
    pub fn create(&self, collection: &str, mut record: Record) -> Result<Option<Value>, Error> {
        let _guard = self.guard();
        let mut doc = self.load()?;
        let Some(items) = doc.get_mut(collection).and_then(Value::as_array_mut) else {
            return Ok(None);
        };
        if !record.contains_key("id") {
            record.insert("id".to_owned(), Value::from(next_id(items)));
        }
        let stored = Value::Object(record);
        items.push(stored.clone());
        self.save(&doc)?;
        Ok(Some(stored))
    }

    /// Replaces the matching record wholesale, keeping its existing `id` and
    /// its position in the collection. `None` when no record matches.
    pub fn replace(
        &self,
        collection: &str,
        id: &str,
        mut record: Record,
    ) -> Result<Option<Value>, Error> {
        let _guard = self.guard();
        let mut doc = self.load()?;
        let Some(items) = doc.get_mut(collection).and_then(Value::as_array_mut) else {
            return Ok(None);
        };
        let Some(slot) = items.iter_mut().find(|r| id_matches(r, id)) else {
            return Ok(None);
        };
        if let Some(existing_id) = slot.get("id").cloned() {
            record.insert("id".to_owned(), existing_id);
        }
        *slot = Value::Object(record);
        let stored = slot.clone();
        self.save(&doc)?;
        Ok(Some(stored))
    }

    /// Shallow-merges `patch` into the matching record. Patched keys win,
    /// except `id`, which always keeps its stored value.
    pub fn merge(
        &self,
        collection: &str,
        id: &str,
        patch: Record,
    ) -> Result<Option<Value>, Error> {
        let _guard = self.guard();
        let mut doc = self.load()?;
        let Some(items) = doc.get_mut(collection).and_then(Value::as_array_mut) else {
            return Ok(None);
        };
        let Some(fields) = items
            .iter_mut()
            .find(|r| id_matches(r, id))
            .and_then(Value::as_object_mut)
        else {
            return Ok(None);
        };
        let existing_id = fields.get("id").cloned();
        for (key, value) in patch {
            fields.insert(key, value);
        }
        if let Some(existing_id) = existing_id {
            fields.insert("id".to_owned(), existing_id);
        }
        let stored = Value::Object(fields.clone());
        self.save(&doc)?;
        Ok(Some(stored))
    }

    /// Removes and returns the matching record. `None` when no record matches.
    pub fn remove(&self, collection: &str, id: &str) -> Result<Option<Value>, Error> {
        let _guard = self.guard();
        let mut doc = self.load()?;
        let Some(items) = doc.get_mut(collection).and_then(Value::as_array_mut) else {
            return Ok(None);
        };
        let Some(index) = items.iter().position(|r| id_matches(r, id)) else {
            return Ok(None);
        };
        let removed = items.remove(index);
        self.save(&doc)?;
        Ok(Some(removed))
    }

    fn guard(&self) -> std::sync::MutexGuard<'_, ()> {
        // A poisoned lock means another request panicked mid-operation; the
        // file itself is still whole (writes are rename-swapped), so the
        // store keeps serving.
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn load(&self) -> Result<Document, Error> {
        let bytes = fs::read(&self.path)?;
        match serde_json::from_slice(&bytes)? {
            Value::Object(doc) => Ok(doc),
            other => Err(Error::Document(format!(
                "top-level value must be an object, found {}",
                kind(&other)
            ))),
        }
    }

    fn save(&self, doc: &Document) -> Result<(), Error> {
        write_atomic(&self.path, &serde_json::to_vec_pretty(doc)?)
    }
}

/// True when the record's `id` renders to the same text as the path segment.
/// Ids in the wild are either JSON strings or numbers; anything else never
/// matches.
fn id_matches(record: &Value, id: &str) -> bool {
    match record.get("id") {
        Some(Value::String(s)) => s == id,
        Some(Value::Number(n)) => n.to_string() == id,
        _ => false,
    }
}

fn next_id(items: &[Value]) -> u64 {
    items
        .iter()
        .filter_map(|r| r.get("id")?.as_u64())
        .max()
        .map_or(1, |max| max + 1)
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

// ── Tests ────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    fn seeded_store(seed: Value) -> (tempfile::TempDir, Store) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, serde_json::to_vec_pretty(&seed).unwrap()).unwrap();
        (dir, Store::open(path))
    }

    #[test]
    fn ensure_creates_missing_directory_chain() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a/b/c/db.json");

        ensure(&path, None).unwrap();

        assert!(path.is_file());
    }

    #[test]
    fn ensure_without_seed_writes_six_empty_collections() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        ensure(&path, None).unwrap();

        let doc: Value = serde_json::from_slice(&fs::read(&path).unwrap()).unwrap();
        assert_eq!(
            doc,
            json!({
                "tours": [], "promotions": [], "leaders": [],
                "users": [], "bookings": [], "comments": []
            })
        );
    }

    #[test]
    fn ensure_copies_seed_bytes_verbatim() {
        let dir = tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        let path = dir.path().join("data/db.json");
        let content = br#"{"tours":[{"id":1,"name":"Tour A"}],"promotions":[],"leaders":[],"users":[],"bookings":[],"comments":[]}"#;
        fs::write(&seed, content).unwrap();

        ensure(&path, Some(&seed)).unwrap();

        assert_eq!(fs::read(&path).unwrap(), content);

        // And the seeded record is visible through the store.
        let store = Store::open(path);
        let tours = store.list("tours").unwrap().unwrap();
        assert_eq!(tours.len(), 1);
        assert_eq!(tours[0]["id"], json!(1));
    }

    #[test]
    fn ensure_is_idempotent() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");

        ensure(&path, None).unwrap();
        let first = fs::read(&path).unwrap();
        ensure(&path, None).unwrap();

        assert_eq!(fs::read(&path).unwrap(), first);
    }

    #[test]
    fn ensure_never_overwrites_existing_content() {
        let dir = tempdir().unwrap();
        let seed = dir.path().join("seed.json");
        let path = dir.path().join("db.json");
        fs::write(&seed, br#"{"tours":[]}"#).unwrap();
        let existing = br#"{"tours":[{"id":7}],"extra":true}"#;
        fs::write(&path, existing).unwrap();

        ensure(&path, Some(&seed)).unwrap();

        assert_eq!(fs::read(&path).unwrap(), existing);
    }

    #[test]
    fn create_assigns_next_numeric_id() {
        let (_dir, store) = seeded_store(json!({ "tours": [{ "id": 3 }, { "id": "x" }] }));

        let created = store.create("tours", Record::new()).unwrap().unwrap();

        assert_eq!(created["id"], json!(4));
        assert_eq!(store.list("tours").unwrap().unwrap().len(), 3);
    }

    #[test]
    fn create_starts_ids_at_one() {
        let (_dir, store) = seeded_store(json!({ "tours": [] }));

        let created = store.create("tours", Record::new()).unwrap().unwrap();

        assert_eq!(created["id"], json!(1));
    }

    #[test]
    fn create_keeps_caller_supplied_id() {
        let (_dir, store) = seeded_store(json!({ "tours": [] }));
        let mut record = Record::new();
        record.insert("id".into(), json!("custom"));

        let created = store.create("tours", record).unwrap().unwrap();

        assert_eq!(created["id"], json!("custom"));
    }

    #[test]
    fn find_matches_numeric_and_string_ids() {
        let (_dir, store) =
            seeded_store(json!({ "users": [{ "id": 1, "name": "ada" }, { "id": "b2" }] }));

        assert_eq!(store.find("users", "1").unwrap().unwrap()["name"], json!("ada"));
        assert!(store.find("users", "b2").unwrap().is_some());
        assert!(store.find("users", "3").unwrap().is_none());
    }

    #[test]
    fn replace_keeps_id_and_position() {
        let (_dir, store) =
            seeded_store(json!({ "tours": [{ "id": 1 }, { "id": 2, "name": "old" }, { "id": 3 }] }));
        let mut record = Record::new();
        record.insert("name".into(), json!("new"));

        let updated = store.replace("tours", "2", record).unwrap().unwrap();

        assert_eq!(updated, json!({ "name": "new", "id": 2 }));
        let tours = store.list("tours").unwrap().unwrap();
        assert_eq!(tours[1]["id"], json!(2));
        assert_eq!(tours[1]["name"], json!("new"));
    }

    #[test]
    fn merge_overlays_fields_but_not_id() {
        let (_dir, store) = seeded_store(
            json!({ "users": [{ "id": 1, "name": "ada", "role": "admin" }] }),
        );
        let mut patch = Record::new();
        patch.insert("name".into(), json!("grace"));
        patch.insert("id".into(), json!(99));

        let updated = store.merge("users", "1", patch).unwrap().unwrap();

        assert_eq!(updated["name"], json!("grace"));
        assert_eq!(updated["role"], json!("admin"));
        assert_eq!(updated["id"], json!(1));
    }

    #[test]
    fn remove_returns_the_deleted_record() {
        let (_dir, store) = seeded_store(json!({ "bookings": [{ "id": 5, "seats": 2 }] }));

        let removed = store.remove("bookings", "5").unwrap().unwrap();

        assert_eq!(removed["seats"], json!(2));
        assert!(store.list("bookings").unwrap().unwrap().is_empty());
        assert!(store.remove("bookings", "5").unwrap().is_none());
    }

    #[test]
    fn unknown_collection_reads_as_none() {
        let (_dir, store) = seeded_store(json!({ "tours": [] }));

        assert!(store.list("rooms").unwrap().is_none());
        assert!(store.find("rooms", "1").unwrap().is_none());
        assert!(store.create("rooms", Record::new()).unwrap().is_none());
    }

    #[test]
    fn non_object_top_level_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        fs::write(&path, b"[]").unwrap();
        let store = Store::open(path);

        assert!(matches!(store.list("tours"), Err(Error::Document(_))));
    }

    #[test]
    fn writes_preserve_collection_order() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("db.json");
        ensure(&path, None).unwrap();
        let store = Store::open(path.clone());

        store.create("comments", Record::new()).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        let tours_at = text.find("\"tours\"").unwrap();
        let comments_at = text.find("\"comments\"").unwrap();
        assert!(tours_at < comments_at);
    }
}
