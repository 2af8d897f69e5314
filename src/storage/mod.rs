//!
//! techhub storage module
//! -----------------------
//! An embedded document store holding JSON objects in named collections inside a
//! single named database. It offers the handful of MongoDB-shaped operations the
//! HTTP handlers need (find, find_one, insert_one, update_one, delete_one) and
//! returns MongoDB-shaped result documents so responses stay wire compatible
//! with the existing frontend.
//!
//! Key properties:
//! - Every operation takes one collection-level lock, so each single-document
//!   operation (including an upsert's lookup-and-write) is atomic.
//! - With a database folder configured, every mutation is written through to
//!   `<folder>/<db>/<collection>.json` before it becomes visible.
//! - Without a folder the store is purely in memory.
//!
//! The public API centers around `Store`, which hands out cheap `Collection`
//! handles that share the underlying documents.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, info};

mod filter;
mod io;

pub use filter::{Filter, SortOrder};

/// A stored document. Always a JSON object.
pub type Document = serde_json::Map<String, Value>;

pub const ID_FIELD: &str = "_id";

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("corrupt collection file {path}: {source}")]
    Corrupt {
        path: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("document is not a JSON object")]
    NotAnObject,
    #[error("invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InsertOneResult {
    pub acknowledged: bool,
    pub inserted_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateResult {
    pub acknowledged: bool,
    pub matched_count: u64,
    pub modified_count: u64,
    pub upserted_count: u64,
    pub upserted_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteResult {
    pub acknowledged: bool,
    pub deleted_count: u64,
}

/// Generate a fresh document identifier (32 lowercase hex chars).
pub fn new_object_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}

/// Handle to one database. Clones share collections and the operation counter.
#[derive(Clone)]
pub struct Store {
    db_name: Arc<str>,
    /// `<folder>/<db>` when persistence is enabled.
    dir: Option<PathBuf>,
    collections: Arc<RwLock<HashMap<String, Collection>>>,
    ops: Arc<AtomicU64>,
}

impl Store {
    /// Purely in-memory store.
    pub fn in_memory(db_name: &str) -> Self {
        Self {
            db_name: Arc::from(db_name),
            dir: None,
            collections: Arc::new(RwLock::new(HashMap::new())),
            ops: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Store persisted under `<root>/<db_name>/`. The directory is created if missing.
    pub fn open<P: AsRef<Path>>(root: P, db_name: &str) -> Result<Self, StoreError> {
        let dir = root.as_ref().join(db_name);
        std::fs::create_dir_all(&dir).map_err(|source| StoreError::Io { path: dir.display().to_string(), source })?;
        info!(target: "store", "opened database '{}' at {}", db_name, dir.display());
        Ok(Self {
            db_name: Arc::from(db_name),
            dir: Some(dir),
            collections: Arc::new(RwLock::new(HashMap::new())),
            ops: Arc::new(AtomicU64::new(0)),
        })
    }

    pub fn db_name(&self) -> &str { &self.db_name }

    pub fn is_persistent(&self) -> bool { self.dir.is_some() }

    /// Get (or lazily load) a collection handle.
    pub fn collection(&self, name: &str) -> Result<Collection, StoreError> {
        if let Some(c) = self.collections.read().get(name) {
            return Ok(c.clone());
        }
        let mut w = self.collections.write();
        if let Some(c) = w.get(name) {
            return Ok(c.clone());
        }
        let file = self.dir.as_ref().map(|d| d.join(format!("{name}.json")));
        let docs = match &file {
            Some(path) => io::load_collection(path)?,
            None => Vec::new(),
        };
        debug!(target: "store", collection = name, documents = docs.len(), "collection loaded");
        let coll = Collection {
            name: Arc::from(name),
            docs: Arc::new(Mutex::new(docs)),
            file,
            ops: self.ops.clone(),
        };
        w.insert(name.to_string(), coll.clone());
        Ok(coll)
    }

    /// Total number of collection operations served since the store was created.
    pub fn operations(&self) -> u64 { self.ops.load(Ordering::Relaxed) }
}

/// A named collection of documents.
#[derive(Clone)]
pub struct Collection {
    name: Arc<str>,
    docs: Arc<Mutex<Vec<Document>>>,
    file: Option<PathBuf>,
    ops: Arc<AtomicU64>,
}

impl Collection {
    fn tick(&self) { self.ops.fetch_add(1, Ordering::Relaxed); }

    /// Run a mutation under the collection lock. With persistence the mutation is
    /// applied to a copy, written to disk, and only then swapped in.
    fn commit<R>(&self, f: impl FnOnce(&mut Vec<Document>) -> R) -> Result<R, StoreError> {
        let mut guard = self.docs.lock();
        match &self.file {
            None => Ok(f(&mut guard)),
            Some(path) => {
                let mut next = guard.clone();
                let out = f(&mut next);
                io::save_collection(path, &next)?;
                *guard = next;
                Ok(out)
            }
        }
    }

    pub fn find_all(&self) -> Vec<Document> {
        self.tick();
        self.docs.lock().clone()
    }

    pub fn find(&self, filter: &Filter) -> Vec<Document> {
        self.tick();
        self.docs.lock().iter().filter(|d| filter.matches(d)).cloned().collect()
    }

    /// Matching documents ordered by `field`; ties keep insertion order.
    pub fn find_sorted(&self, filter: &Filter, field: &str, order: SortOrder) -> Vec<Document> {
        let mut out = self.find(filter);
        out.sort_by(|a, b| order.apply(filter::compare_values(a.get(field), b.get(field))));
        out
    }

    pub fn find_one(&self, filter: &Filter) -> Option<Document> {
        self.tick();
        self.docs.lock().iter().find(|d| filter.matches(d)).cloned()
    }

    pub fn count(&self) -> usize { self.docs.lock().len() }

    pub fn insert_one(&self, mut doc: Document) -> Result<InsertOneResult, StoreError> {
        self.tick();
        let id = match doc.get(ID_FIELD) {
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
            None => {
                let id = new_object_id();
                doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                id
            }
        };
        self.commit(|docs| docs.push(doc))?;
        debug!(target: "store", collection = %self.name, id = %id, "insert_one");
        Ok(InsertOneResult { acknowledged: true, inserted_id: id })
    }

    /// `$set` the given fields on the first matching document. With `upsert` and no
    /// match, a new document is built from the filter's equality fields plus `set`.
    pub fn update_one(&self, filter: &Filter, set: Document, upsert: bool) -> Result<UpdateResult, StoreError> {
        self.tick();
        let result = self.commit(|docs| {
            if let Some(doc) = docs.iter_mut().find(|d| filter.matches(d)) {
                let mut modified = false;
                for (k, v) in set {
                    if k == ID_FIELD { continue; }
                    if doc.get(&k) != Some(&v) {
                        doc.insert(k, v);
                        modified = true;
                    }
                }
                return UpdateResult {
                    acknowledged: true,
                    matched_count: 1,
                    modified_count: u64::from(modified),
                    upserted_count: 0,
                    upserted_id: None,
                };
            }
            if !upsert {
                return UpdateResult { acknowledged: true, matched_count: 0, modified_count: 0, upserted_count: 0, upserted_id: None };
            }
            let mut doc = filter.seed_document();
            for (k, v) in set {
                if k == ID_FIELD { continue; }
                doc.insert(k, v);
            }
            let id = match doc.get(ID_FIELD) {
                Some(Value::String(s)) => s.clone(),
                _ => {
                    let id = new_object_id();
                    doc.insert(ID_FIELD.to_string(), Value::String(id.clone()));
                    id
                }
            };
            docs.push(doc);
            UpdateResult { acknowledged: true, matched_count: 0, modified_count: 0, upserted_count: 1, upserted_id: Some(id) }
        })?;
        debug!(target: "store", collection = %self.name, matched = result.matched_count, upserted = result.upserted_count, "update_one");
        Ok(result)
    }

    pub fn delete_one(&self, filter: &Filter) -> Result<DeleteResult, StoreError> {
        self.tick();
        let deleted = self.commit(|docs| match docs.iter().position(|d| filter.matches(d)) {
            Some(idx) => {
                docs.remove(idx);
                1
            }
            None => 0,
        })?;
        debug!(target: "store", collection = %self.name, deleted, "delete_one");
        Ok(DeleteResult { acknowledged: true, deleted_count: deleted })
    }
}

/// Convert an arbitrary JSON value into a document.
pub fn into_document(v: Value) -> Result<Document, StoreError> {
    match v {
        Value::Object(m) => Ok(m),
        _ => Err(StoreError::NotAnObject),
    }
}
