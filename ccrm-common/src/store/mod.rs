//! Document store
//!
//! Collection-scoped JSON documents persisted in a single SQLite table keyed
//! by `(collection, id)`. Subcollections are plain collections whose path is
//! nested under a parent document: `callCenters/{id}/contacts`.
//!
//! The store handle wraps a connection pool and is cheap to clone. It is
//! opened once by the process entry point and handed to every service.

mod batch;
pub mod collections;
mod init;

pub use batch::WriteBatch;
pub use init::{open_memory_pool, open_pool};

use crate::{Error, Result};
use chrono::{DateTime, SecondsFormat, Utc};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use sqlx::{Row, SqliteConnection, SqlitePool};
use std::path::Path;
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

/// Default pool size for file-backed stores
pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

/// A stored document with its bookkeeping timestamps
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    pub data: Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Document {
    /// Deserialize the document body into a model type
    pub fn into_model<T: DeserializeOwned>(self) -> Result<T> {
        Ok(serde_json::from_value(self.data)?)
    }
}

/// Handle to the document store
///
/// Writers are serialized through `write_lock`, shared by every clone. A
/// read-modify-write in a deferred SQLite transaction cannot upgrade its
/// lock once another writer has committed, so concurrent writers queue here
/// instead of failing with SQLITE_BUSY. Readers never take the lock.
#[derive(Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl DocumentStore {
    /// Wrap an existing pool (schema must already exist)
    pub fn from_pool(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Open or create a file-backed store
    pub async fn open(db_path: &Path) -> Result<Self> {
        let pool = open_pool(db_path, DEFAULT_MAX_CONNECTIONS).await?;
        Ok(Self::from_pool(pool))
    }

    /// Open a fresh in-memory store
    pub async fn open_in_memory() -> Result<Self> {
        let pool = open_memory_pool().await?;
        Ok(Self::from_pool(pool))
    }

    /// Exclusive right to write; held for the whole write transaction
    pub(crate) async fn lock_writes(&self) -> MutexGuard<'_, ()> {
        self.write_lock.lock().await
    }

    /// Underlying pool (health checks, diagnostics)
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Start an atomic batch of writes
    pub fn batch(&self) -> WriteBatch {
        WriteBatch::new()
    }

    /// Fetch a raw document
    pub async fn get_raw(&self, collection: &str, id: &str) -> Result<Option<Document>> {
        let row = sqlx::query(
            "SELECT id, data, created_at, updated_at FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        row.map(|row| document_from_row(&row)).transpose()
    }

    /// Fetch and deserialize a document
    pub async fn get<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<Option<T>> {
        match self.get_raw(collection, id).await? {
            Some(doc) => Ok(Some(doc.into_model()?)),
            None => Ok(None),
        }
    }

    /// Fetch a document that must exist
    pub async fn require<T: DeserializeOwned>(&self, collection: &str, id: &str) -> Result<T> {
        self.get(collection, id)
            .await?
            .ok_or_else(|| Error::not_found(collection, id))
    }

    /// True if the document exists
    pub async fn exists(&self, collection: &str, id: &str) -> Result<bool> {
        let count: i64 = sqlx::query_scalar(
            "SELECT COUNT(*) FROM documents WHERE collection = ? AND id = ?",
        )
        .bind(collection)
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(count > 0)
    }

    /// All raw documents of a collection in creation order
    pub async fn list_raw(&self, collection: &str) -> Result<Vec<Document>> {
        let rows = sqlx::query(
            r#"
            SELECT id, data, created_at, updated_at
            FROM documents
            WHERE collection = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(collection)
        .fetch_all(&self.pool)
        .await?;

        rows.iter().map(document_from_row).collect()
    }

    /// All documents of a collection in creation order
    pub async fn list<T: DeserializeOwned>(&self, collection: &str) -> Result<Vec<T>> {
        self.list_raw(collection)
            .await?
            .into_iter()
            .map(Document::into_model)
            .collect()
    }

    /// Documents whose top-level string `field` equals `value`
    pub async fn list_where_eq<T: DeserializeOwned>(
        &self,
        collection: &str,
        field: &str,
        value: &str,
    ) -> Result<Vec<T>> {
        let path = json_path(field)?;
        let rows = sqlx::query(
            r#"
            SELECT id, data, created_at, updated_at
            FROM documents
            WHERE collection = ? AND json_extract(data, ?) = ?
            ORDER BY created_at, id
            "#,
        )
        .bind(collection)
        .bind(path)
        .bind(value)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| document_from_row(row)?.into_model())
            .collect()
    }

    /// Number of documents in a collection
    pub async fn count(&self, collection: &str) -> Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE collection = ?")
            .bind(collection)
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Insert a new document; fails with `AlreadyExists` if the id is taken
    pub async fn create<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<()> {
        let data = serde_json::to_string(doc)?;
        let _writer = self.lock_writes().await;
        let mut conn = self.pool.acquire().await?;
        insert_document(&mut *conn, collection, id, &data).await
    }

    /// Insert a document unless one already exists; returns true if inserted
    ///
    /// Race-free: concurrent callers see exactly one insert.
    pub async fn create_if_absent<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        doc: &T,
    ) -> Result<bool> {
        let data = serde_json::to_string(doc)?;
        let now = timestamp(Utc::now());
        let _writer = self.lock_writes().await;
        let result = sqlx::query(
            r#"
            INSERT OR IGNORE INTO documents (collection, id, data, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(collection)
        .bind(id)
        .bind(&data)
        .bind(&now)
        .bind(&now)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    /// Insert or replace a document, keeping the original creation time
    pub async fn set<T: Serialize>(&self, collection: &str, id: &str, doc: &T) -> Result<()> {
        let data = serde_json::to_string(doc)?;
        let _writer = self.lock_writes().await;
        let mut conn = self.pool.acquire().await?;
        upsert_document(&mut *conn, collection, id, &data).await
    }

    /// Transactional read-modify-write of a typed document
    ///
    /// Returns the updated document. `NotFound` if it does not exist; the
    /// closure's error aborts the write.
    pub async fn modify<T, F>(&self, collection: &str, id: &str, f: F) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        self.modify_with(collection, id, f, WriteBatch::new()).await
    }

    /// `modify` plus the writes of `batch`, all in one transaction
    ///
    /// The document is read after the write lock is taken, so no write
    /// can slip in between the read and the update.
    pub async fn modify_with<T, F>(
        &self,
        collection: &str,
        id: &str,
        f: F,
        batch: WriteBatch,
    ) -> Result<T>
    where
        T: Serialize + DeserializeOwned + Send,
        F: FnOnce(&mut T) -> Result<()> + Send,
    {
        let _writer = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;

        let data: Option<String> =
            sqlx::query_scalar("SELECT data FROM documents WHERE collection = ? AND id = ?")
                .bind(collection)
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;

        let data = data.ok_or_else(|| Error::not_found(collection, id))?;
        let mut doc: T = serde_json::from_str(&data)?;
        f(&mut doc)?;
        let updated = serde_json::to_string(&doc)?;

        sqlx::query(
            "UPDATE documents SET data = ?, updated_at = ? WHERE collection = ? AND id = ?",
        )
        .bind(&updated)
        .bind(timestamp(Utc::now()))
        .bind(collection)
        .bind(id)
        .execute(&mut *tx)
        .await?;

        batch.apply(&mut *tx).await?;

        tx.commit().await?;
        Ok(doc)
    }

    /// Delete a single document; returns false if it did not exist
    ///
    /// Subcollections are left untouched (see `delete_tree`).
    pub async fn delete(&self, collection: &str, id: &str) -> Result<bool> {
        let _writer = self.lock_writes().await;
        let mut conn = self.pool.acquire().await?;
        delete_document(&mut *conn, collection, id).await
    }

    /// Delete a document together with every subcollection beneath it
    pub async fn delete_tree(&self, collection: &str, id: &str) -> Result<bool> {
        let _writer = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        let existed = delete_document_tree(&mut *tx, collection, id).await?;
        tx.commit().await?;
        Ok(existed)
    }

    /// Delete every document of a collection (and their subcollections)
    ///
    /// Returns the number of top-level documents removed.
    pub async fn delete_collection(&self, collection: &str) -> Result<u64> {
        let _writer = self.lock_writes().await;
        let mut tx = self.pool.begin().await?;
        let deleted = delete_collection_documents(&mut *tx, collection).await?;
        tx.commit().await?;
        Ok(deleted)
    }
}

/// Path of a subcollection beneath a parent document
pub fn subcollection(parent_collection: &str, parent_id: &str, name: &str) -> String {
    format!("{}/{}/{}", parent_collection, parent_id, name)
}

/// Fixed-width RFC 3339 so stored timestamps sort lexicographically
pub(crate) fn timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn parse_timestamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| Error::Internal(format!("Invalid stored timestamp '{}': {}", s, e)))
}

fn document_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Document> {
    let data: String = row.try_get("data")?;
    let created_at: String = row.try_get("created_at")?;
    let updated_at: String = row.try_get("updated_at")?;

    Ok(Document {
        id: row.try_get("id")?,
        data: serde_json::from_str(&data)?,
        created_at: parse_timestamp(&created_at)?,
        updated_at: parse_timestamp(&updated_at)?,
    })
}

/// JSON path for a top-level field; field names are restricted to identifiers
fn json_path(field: &str) -> Result<String> {
    let valid = !field.is_empty() && field.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
    if !valid {
        return Err(Error::InvalidInput(format!("Invalid field name: {}", field)));
    }
    Ok(format!("$.{}", field))
}

pub(crate) async fn insert_document(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
    data: &str,
) -> Result<()> {
    let now = timestamp(Utc::now());
    let result = sqlx::query(
        r#"
        INSERT INTO documents (collection, id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(data)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await;

    match result {
        Ok(_) => Ok(()),
        Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
            Err(Error::AlreadyExists(format!("{}/{}", collection, id)))
        }
        Err(e) => Err(e.into()),
    }
}

pub(crate) async fn upsert_document(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
    data: &str,
) -> Result<()> {
    let now = timestamp(Utc::now());
    sqlx::query(
        r#"
        INSERT INTO documents (collection, id, data, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(collection, id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        "#,
    )
    .bind(collection)
    .bind(id)
    .bind(data)
    .bind(&now)
    .bind(&now)
    .execute(conn)
    .await?;

    Ok(())
}

pub(crate) async fn delete_document(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
) -> Result<bool> {
    let result = sqlx::query("DELETE FROM documents WHERE collection = ? AND id = ?")
        .bind(collection)
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub(crate) async fn delete_document_tree(
    conn: &mut SqliteConnection,
    collection: &str,
    id: &str,
) -> Result<bool> {
    let existed = delete_document(&mut *conn, collection, id).await?;
    delete_under_prefix(conn, &format!("{}/{}/", collection, id)).await?;
    Ok(existed)
}

pub(crate) async fn delete_where_eq(
    conn: &mut SqliteConnection,
    collection: &str,
    field: &str,
    value: &str,
) -> Result<u64> {
    let path = json_path(field)?;
    let result =
        sqlx::query("DELETE FROM documents WHERE collection = ? AND json_extract(data, ?) = ?")
            .bind(collection)
            .bind(path)
            .bind(value)
            .execute(conn)
            .await?;
    Ok(result.rows_affected())
}

pub(crate) async fn delete_collection_documents(
    conn: &mut SqliteConnection,
    collection: &str,
) -> Result<u64> {
    let deleted = sqlx::query("DELETE FROM documents WHERE collection = ?")
        .bind(collection)
        .execute(&mut *conn)
        .await?
        .rows_affected();

    delete_under_prefix(conn, &format!("{}/", collection)).await?;
    Ok(deleted)
}

/// Remove every document whose collection path starts with `prefix`
///
/// Prefix comparison via substr; LIKE would treat `_` in ids as a wildcard.
async fn delete_under_prefix(conn: &mut SqliteConnection, prefix: &str) -> Result<u64> {
    let result = sqlx::query("DELETE FROM documents WHERE substr(collection, 1, ?) = ?")
        .bind(prefix.chars().count() as i64)
        .bind(prefix)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Note {
        id: String,
        text: String,
        tags: Vec<String>,
    }

    fn note(id: &str, text: &str) -> Note {
        Note {
            id: id.to_string(),
            text: text.to_string(),
            tags: Vec::new(),
        }
    }

    #[tokio::test]
    async fn test_create_get_and_duplicate_id() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        store.create("notes", "a", &note("a", "first")).await.unwrap();

        let loaded: Note = store.require("notes", "a").await.unwrap();
        assert_eq!(loaded.text, "first");

        let again = store.create("notes", "a", &note("a", "second")).await;
        assert!(matches!(again, Err(Error::AlreadyExists(_))));

        let missing: Option<Note> = store.get("notes", "zzz").await.unwrap();
        assert!(missing.is_none());
    }

    #[tokio::test]
    async fn test_create_if_absent_inserts_once() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        assert!(store.create_if_absent("notes", "day", &note("day", "one")).await.unwrap());
        assert!(!store.create_if_absent("notes", "day", &note("day", "two")).await.unwrap());

        let loaded: Note = store.require("notes", "day").await.unwrap();
        assert_eq!(loaded.text, "one");
    }

    #[tokio::test]
    async fn test_set_preserves_created_at() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        store.set("notes", "a", &note("a", "v1")).await.unwrap();
        let before = store.get_raw("notes", "a").await.unwrap().unwrap();

        store.set("notes", "a", &note("a", "v2")).await.unwrap();
        let after = store.get_raw("notes", "a").await.unwrap().unwrap();

        assert_eq!(before.created_at, after.created_at);
        assert!(after.updated_at >= before.updated_at);
        assert_eq!(after.data["text"], "v2");
    }

    #[tokio::test]
    async fn test_modify_applies_closure_and_reports_missing() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        store.create("notes", "a", &note("a", "x")).await.unwrap();

        let updated: Note = store
            .modify("notes", "a", |n: &mut Note| {
                n.tags.push("hot".to_string());
                Ok(())
            })
            .await
            .unwrap();
        assert_eq!(updated.tags, vec!["hot"]);

        let missing = store
            .modify("notes", "nope", |_n: &mut Note| Ok(()))
            .await;
        assert!(matches!(missing, Err(Error::NotFound(_))));
    }

    #[tokio::test]
    async fn test_modify_error_leaves_document_untouched() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        store.create("notes", "a", &note("a", "keep")).await.unwrap();

        let result = store
            .modify("notes", "a", |n: &mut Note| {
                n.text = "changed".to_string();
                Err(Error::InvalidInput("rejected".to_string()))
            })
            .await;
        assert!(result.is_err());

        let loaded: Note = store.require("notes", "a").await.unwrap();
        assert_eq!(loaded.text, "keep");
    }

    #[tokio::test]
    async fn test_delete_tree_removes_subcollections_only_for_parent() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        store.create("parents", "p_1", &note("p_1", "parent")).await.unwrap();
        store.create("parents", "p11", &note("p11", "other")).await.unwrap();

        let kids = subcollection("parents", "p_1", "kids");
        let other_kids = subcollection("parents", "p11", "kids");
        store.create(&kids, "k", &note("k", "kid")).await.unwrap();
        store.create(&other_kids, "k", &note("k", "kid")).await.unwrap();

        assert!(store.delete_tree("parents", "p_1").await.unwrap());
        assert_eq!(store.count(&kids).await.unwrap(), 0);
        // '_' must not act as a wildcard
        assert_eq!(store.count(&other_kids).await.unwrap(), 1);
        assert!(!store.delete_tree("parents", "p_1").await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_collection_counts_top_level_documents() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        for id in ["a", "b", "c"] {
            store.create("notes", id, &note(id, id)).await.unwrap();
        }
        store
            .create(&subcollection("notes", "a", "replies"), "r", &note("r", "r"))
            .await
            .unwrap();

        assert_eq!(store.delete_collection("notes").await.unwrap(), 3);
        assert_eq!(store.count("notes").await.unwrap(), 0);
        assert_eq!(store.count("notes/a/replies").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_where_eq_filters_on_field() {
        let store = DocumentStore::open_in_memory().await.unwrap();
        store.create("notes", "a", &note("a", "alpha")).await.unwrap();
        store.create("notes", "b", &note("b", "beta")).await.unwrap();

        let found: Vec<Note> = store.list_where_eq("notes", "text", "beta").await.unwrap();
        assert_eq!(found, vec![note("b", "beta")]);

        let bad = store.list_where_eq::<Note>("notes", "text') OR 1=1 --", "x").await;
        assert!(matches!(bad, Err(Error::InvalidInput(_))));
    }
}
