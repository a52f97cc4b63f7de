use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::{Error, Result};
use crate::interfaces::document_store::{Collection, Document, DocumentStore, Filter};
use crate::interfaces::file_store::{Bucket, FileStore};
use crate::types::ids::{DocumentId, FileId};
use crate::types::timestamp::Timestamp;

struct StoredDocument {
    seq: u64,
    document: Document,
}

/// HashMap-backed store with the same filter and ordering semantics the
/// hosted backend exposes. Fixture for tests and the dev server.
pub struct MemoryStore {
    documents: RwLock<HashMap<(Collection, DocumentId), StoredDocument>>,
    files: RwLock<HashMap<(Bucket, FileId), Vec<u8>>>,
    next_seq: RwLock<u64>,
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore {
            documents: RwLock::new(HashMap::new()),
            files: RwLock::new(HashMap::new()),
            next_seq: RwLock::new(0),
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        MemoryStore::new()
    }
}

fn matches(filter: &Filter, fields: &Value) -> bool {
    filter
        .clauses()
        .iter()
        .all(|(field, expected)| fields.get(field) == Some(expected))
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn list(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>> {
        let documents = self.documents.read().await;
        let mut hits: Vec<(u64, Document)> = documents
            .iter()
            .filter(|((c, _), _)| *c == collection)
            .filter(|(_, stored)| matches(&filter, &stored.document.fields))
            .map(|(_, stored)| (stored.seq, stored.document.clone()))
            .collect();

        // Creation order, newest first when asked. The sequence number
        // breaks same-millisecond ties deterministically.
        hits.sort_by_key(|(seq, _)| *seq);
        if filter.wants_newest_first() {
            hits.reverse();
        }

        Ok(hits.into_iter().map(|(_, doc)| doc).collect())
    }

    async fn get(&self, collection: Collection, id: DocumentId) -> Result<Document> {
        let documents = self.documents.read().await;
        documents
            .get(&(collection, id))
            .map(|stored| stored.document.clone())
            .ok_or(Error::NotFound { collection, id })
    }

    async fn create(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document> {
        let mut documents = self.documents.write().await;
        if documents.contains_key(&(collection, id)) {
            return Err(Error::StoreUnavailable(format!(
                "document id collision in {}: {}",
                collection.as_str(),
                id
            )));
        }

        let mut next_seq = self.next_seq.write().await;
        let seq = *next_seq;
        *next_seq += 1;

        let now = Timestamp::now();
        let document = Document {
            id,
            created_at: now,
            updated_at: now,
            fields,
        };
        documents.insert((collection, id), StoredDocument {
            seq,
            document: document.clone(),
        });

        Ok(document)
    }

    async fn update(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document> {
        let mut documents = self.documents.write().await;
        let stored = documents
            .get_mut(&(collection, id))
            .ok_or(Error::NotFound { collection, id })?;

        stored.document.fields = fields;
        stored.document.updated_at = Timestamp::now();

        Ok(stored.document.clone())
    }
}

#[async_trait]
impl FileStore for MemoryStore {
    async fn create_file(&self, bucket: Bucket, bytes: Vec<u8>) -> Result<FileId> {
        let file_id = FileId::new();
        let mut files = self.files.write().await;
        files.insert((bucket, file_id), bytes);
        Ok(file_id)
    }

    fn file_view_url(&self, bucket: Bucket, file_id: FileId) -> String {
        format!("memory://{}/{}/view", bucket.as_str(), file_id)
    }

    fn file_download_url(&self, bucket: Bucket, file_id: FileId) -> String {
        format!("memory://{}/{}/download", bucket.as_str(), file_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn create_get_update_roundtrip() {
        let store = MemoryStore::new();
        let id = DocumentId::new();

        store
            .create(Collection::Members, id, json!({"name": "a"}))
            .await
            .unwrap();
        let doc = store.get(Collection::Members, id).await.unwrap();
        assert_eq!(doc.fields, json!({"name": "a"}));

        store
            .update(Collection::Members, id, json!({"name": "b"}))
            .await
            .unwrap();
        let doc = store.get(Collection::Members, id).await.unwrap();
        assert_eq!(doc.fields, json!({"name": "b"}));
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let store = MemoryStore::new();
        let id = DocumentId::new();
        assert!(matches!(
            store.get(Collection::Members, id).await,
            Err(Error::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn list_filters_on_equality_and_orders_newest_first() {
        let store = MemoryStore::new();
        for n in 0..3 {
            store
                .create(
                    Collection::Payments,
                    DocumentId::new(),
                    json!({"member": "m1", "n": n}),
                )
                .await
                .unwrap();
        }
        store
            .create(
                Collection::Payments,
                DocumentId::new(),
                json!({"member": "m2", "n": 99}),
            )
            .await
            .unwrap();

        let hits = store
            .list(
                Collection::Payments,
                Filter::new().eq("member", "m1").newest_first(),
            )
            .await
            .unwrap();

        assert_eq!(hits.len(), 3);
        let ns: Vec<i64> = hits
            .iter()
            .map(|d| d.fields.get("n").and_then(|v| v.as_i64()).unwrap())
            .collect();
        assert_eq!(ns, vec![2, 1, 0]);
    }
}
