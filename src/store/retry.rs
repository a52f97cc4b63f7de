use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{Error, Result};
use crate::interfaces::document_store::{Collection, Document, DocumentStore, Filter};
use crate::observability::metrics::STORE_RETRIES;
use crate::types::ids::DocumentId;

/// Decorator enforcing the store-call policy: a bounded timeout on every
/// call and exactly one retry after a transient fault. Business-rule
/// errors pass through untouched.
pub struct RetryingStore<S> {
    inner: S,
    timeout: Duration,
    backoff: Duration,
}

impl<S: DocumentStore> RetryingStore<S> {
    pub fn new(inner: S, timeout: Duration, backoff: Duration) -> Self {
        RetryingStore {
            inner,
            timeout,
            backoff,
        }
    }

    async fn attempt<T, Fut>(&self, fut: Fut) -> Result<T>
    where
        Fut: Future<Output = Result<T>>,
    {
        match tokio::time::timeout(self.timeout, fut).await {
            Ok(result) => result,
            Err(_) => Err(Error::StoreUnavailable(format!(
                "store call exceeded {}ms",
                self.timeout.as_millis()
            ))),
        }
    }

    async fn run<T, F, Fut>(&self, op: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        match self.attempt(op()).await {
            Err(err) if err.is_retryable() => {
                STORE_RETRIES.inc();
                tracing::warn!(error = %err, "retrying store call after transient failure");
                tokio::time::sleep(self.backoff).await;
                self.attempt(op()).await
            }
            other => other,
        }
    }
}

#[async_trait]
impl<S: DocumentStore> DocumentStore for RetryingStore<S> {
    async fn list(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>> {
        self.run(|| self.inner.list(collection, filter.clone())).await
    }

    async fn get(&self, collection: Collection, id: DocumentId) -> Result<Document> {
        self.run(|| self.inner.get(collection, id)).await
    }

    async fn create(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document> {
        self.run(|| self.inner.create(collection, id, fields.clone())).await
    }

    async fn update(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document> {
        self.run(|| self.inner.update(collection, id, fields.clone())).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;
    use serde_json::json;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Delegates to a MemoryStore after a configured number of transient
    /// failures; counts every attempt.
    struct FlakyStore {
        inner: MemoryStore,
        failures_remaining: AtomicUsize,
        attempts: AtomicUsize,
    }

    impl FlakyStore {
        fn new(failures: usize) -> Self {
            FlakyStore {
                inner: MemoryStore::new(),
                failures_remaining: AtomicUsize::new(failures),
                attempts: AtomicUsize::new(0),
            }
        }

        fn should_fail(&self) -> bool {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            self.failures_remaining
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                .is_ok()
        }
    }

    #[async_trait]
    impl DocumentStore for FlakyStore {
        async fn list(&self, collection: Collection, filter: Filter) -> Result<Vec<Document>> {
            if self.should_fail() {
                return Err(Error::StoreUnavailable("flaky".to_string()));
            }
            self.inner.list(collection, filter).await
        }

        async fn get(&self, collection: Collection, id: DocumentId) -> Result<Document> {
            if self.should_fail() {
                return Err(Error::StoreUnavailable("flaky".to_string()));
            }
            self.inner.get(collection, id).await
        }

        async fn create(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document> {
            if self.should_fail() {
                return Err(Error::StoreUnavailable("flaky".to_string()));
            }
            self.inner.create(collection, id, fields).await
        }

        async fn update(&self, collection: Collection, id: DocumentId, fields: Value) -> Result<Document> {
            if self.should_fail() {
                return Err(Error::StoreUnavailable("flaky".to_string()));
            }
            self.inner.update(collection, id, fields).await
        }
    }

    fn retrying(failures: usize) -> RetryingStore<FlakyStore> {
        RetryingStore::new(
            FlakyStore::new(failures),
            Duration::from_secs(1),
            Duration::from_millis(1),
        )
    }

    #[tokio::test]
    async fn one_transient_failure_is_absorbed() {
        let store = retrying(1);
        let id = DocumentId::new();
        store
            .create(Collection::Members, id, json!({"x": 1}))
            .await
            .unwrap();
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn second_transient_failure_surfaces() {
        let store = retrying(2);
        let id = DocumentId::new();
        let err = store
            .create(Collection::Members, id, json!({"x": 1}))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::StoreUnavailable(_)));
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn business_errors_are_never_retried() {
        let store = retrying(0);
        let id = DocumentId::new();
        let err = store.get(Collection::Members, id).await.unwrap_err();
        assert!(matches!(err, Error::NotFound { .. }));
        // One pass through the flaky layer, no second attempt.
        assert_eq!(store.inner.attempts.load(Ordering::SeqCst), 1);
    }
}
