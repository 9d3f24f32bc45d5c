//! Atomic write batches
//!
//! Operations are queued in memory and applied inside one transaction on
//! `commit`; any failing operation rolls back the whole batch.

use super::{
    delete_collection_documents, delete_document, delete_document_tree, delete_where_eq,
    insert_document, upsert_document, DocumentStore,
};
use crate::Result;
use serde::Serialize;
use sqlx::SqliteConnection;
use tracing::debug;

#[derive(Debug, Clone)]
enum BatchOp {
    Create { collection: String, id: String, data: String },
    Set { collection: String, id: String, data: String },
    Delete { collection: String, id: String },
    DeleteTree { collection: String, id: String },
    DeleteWhereEq { collection: String, field: String, value: String },
    DeleteCollection { collection: String },
}

/// A set of writes committed all-or-nothing
#[derive(Debug, Default)]
pub struct WriteBatch {
    ops: Vec<BatchOp>,
}

impl WriteBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue an insert; the commit fails if the id already exists
    pub fn create<T: Serialize>(&mut self, collection: &str, id: &str, doc: &T) -> Result<&mut Self> {
        self.ops.push(BatchOp::Create {
            collection: collection.to_string(),
            id: id.to_string(),
            data: serde_json::to_string(doc)?,
        });
        Ok(self)
    }

    /// Queue an upsert
    pub fn set<T: Serialize>(&mut self, collection: &str, id: &str, doc: &T) -> Result<&mut Self> {
        self.ops.push(BatchOp::Set {
            collection: collection.to_string(),
            id: id.to_string(),
            data: serde_json::to_string(doc)?,
        });
        Ok(self)
    }

    /// Queue a single-document delete
    pub fn delete(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(BatchOp::Delete {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Queue a delete of a document and its subcollections
    pub fn delete_tree(&mut self, collection: &str, id: &str) -> &mut Self {
        self.ops.push(BatchOp::DeleteTree {
            collection: collection.to_string(),
            id: id.to_string(),
        });
        self
    }

    /// Queue a delete of every document whose top-level `field` equals `value`
    pub fn delete_where_eq(&mut self, collection: &str, field: &str, value: &str) -> &mut Self {
        self.ops.push(BatchOp::DeleteWhereEq {
            collection: collection.to_string(),
            field: field.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Queue a delete of a whole collection and its subcollections
    pub fn delete_collection(&mut self, collection: &str) -> &mut Self {
        self.ops.push(BatchOp::DeleteCollection {
            collection: collection.to_string(),
        });
        self
    }

    pub fn len(&self) -> usize {
        self.ops.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }

    /// Apply every queued operation in a single transaction
    ///
    /// Returns the number of operations applied. An empty batch performs no
    /// database work at all.
    pub async fn commit(self, store: &DocumentStore) -> Result<usize> {
        Ok(self.commit_counted(store).await?.len())
    }

    /// Like `commit`, returning the rows each operation affected, in order
    ///
    /// Creates and sets count 1; deletes count removed top-level documents.
    pub async fn commit_counted(self, store: &DocumentStore) -> Result<Vec<u64>> {
        if self.ops.is_empty() {
            return Ok(Vec::new());
        }

        let _writer = store.lock_writes().await;
        let mut tx = store.pool().begin().await?;
        let counts = self.apply(&mut *tx).await?;
        tx.commit().await?;

        debug!(operations = counts.len(), "Write batch committed");
        Ok(counts)
    }

    /// Run the operations on a connection already inside a transaction
    pub(crate) async fn apply(self, conn: &mut SqliteConnection) -> Result<Vec<u64>> {
        let mut counts = Vec::with_capacity(self.ops.len());

        for op in self.ops {
            let affected = match op {
                BatchOp::Create { collection, id, data } => {
                    insert_document(&mut *conn, &collection, &id, &data).await?;
                    1
                }
                BatchOp::Set { collection, id, data } => {
                    upsert_document(&mut *conn, &collection, &id, &data).await?;
                    1
                }
                BatchOp::Delete { collection, id } => {
                    u64::from(delete_document(&mut *conn, &collection, &id).await?)
                }
                BatchOp::DeleteTree { collection, id } => {
                    u64::from(delete_document_tree(&mut *conn, &collection, &id).await?)
                }
                BatchOp::DeleteWhereEq { collection, field, value } => {
                    delete_where_eq(&mut *conn, &collection, &field, &value).await?
                }
                BatchOp::DeleteCollection { collection } => {
                    delete_collection_documents(&mut *conn, &collection).await?
                }
            };
            counts.push(affected);
        }

        Ok(counts)
    }
}
