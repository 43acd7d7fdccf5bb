//! Semantic recall - similarity search delegated to an external index
//!
//! Every user message is captured verbatim into a vector-similarity
//! service; retrieval asks the service for the nearest documents to the
//! query. The service is a soft dependency: any failure degrades to
//! zero results instead of surfacing to the caller.

use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::json;
use tracing::{debug, warn};
use uuid::Uuid;

use super::{ContextProvider, MemoryUpdater, Message, Role};

const DEFAULT_N_RESULTS: usize = 2;

/// Boundary to the external vector-similarity service.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Add a document under a fresh id.
    async fn insert(
        &self,
        namespace: &str,
        id: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<()>;

    /// Nearest `k` documents to `text`, best first.
    async fn query(&self, namespace: &str, text: &str, k: usize) -> Result<Vec<String>>;

    /// Drop the whole namespace.
    async fn delete_namespace(&self, namespace: &str) -> Result<()>;
}

/// HTTP client for a vector index service.
pub struct HttpVectorIndex {
    client: Client,
    url: String,
}

impl HttpVectorIndex {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl VectorIndex for HttpVectorIndex {
    async fn insert(
        &self,
        namespace: &str,
        id: &str,
        content: &str,
        metadata: serde_json::Value,
    ) -> Result<()> {
        self.client
            .post(format!("{}/insert", self.url))
            .json(&json!({
                "namespace": namespace,
                "id": id,
                "content": content,
                "metadata": metadata,
            }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }

    async fn query(&self, namespace: &str, text: &str, k: usize) -> Result<Vec<String>> {
        let resp = self
            .client
            .post(format!("{}/query", self.url))
            .json(&json!({
                "namespace": namespace,
                "text": text,
                "k": k,
            }))
            .send()
            .await?
            .error_for_status()?;
        let data: serde_json::Value = resp.json().await?;
        let documents = serde_json::from_value(data["documents"].clone())
            .context("No documents in index response")?;
        Ok(documents)
    }

    async fn delete_namespace(&self, namespace: &str) -> Result<()> {
        self.client
            .post(format!("{}/delete", self.url))
            .json(&json!({ "namespace": namespace }))
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}

pub struct SemanticStore {
    index: Arc<dyn VectorIndex>,
    namespace: String,
    n_results: usize,
}

impl SemanticStore {
    pub fn new(index: Arc<dyn VectorIndex>, namespace: impl Into<String>) -> Self {
        Self {
            index,
            namespace: namespace.into(),
            n_results: DEFAULT_N_RESULTS,
        }
    }

    pub fn with_n_results(mut self, n_results: usize) -> Self {
        self.n_results = n_results;
        self
    }

    /// Index a message verbatim under a fresh id.
    pub async fn store(&self, message: &Message) -> Result<()> {
        let id = Uuid::new_v4().to_string();
        let metadata = json!({
            "role": message.role.as_str(),
            "timestamp": message.timestamp.to_rfc3339(),
        });
        self.index
            .insert(&self.namespace, &id, &message.content, metadata)
            .await
    }

    /// Nearest documents to `query`; an unreachable or corrupt index
    /// yields an empty result.
    pub async fn retrieve(&self, query: &str) -> Vec<String> {
        match self
            .index
            .query(&self.namespace, query, self.n_results)
            .await
        {
            Ok(documents) => documents,
            Err(e) => {
                warn!("Vector scan error: {e:#}");
                Vec::new()
            }
        }
    }

    /// Request deletion of the backing namespace. The store counts as
    /// cleared even when the request fails.
    pub async fn clear(&self) {
        if let Err(e) = self.index.delete_namespace(&self.namespace).await {
            debug!("Namespace delete skipped: {e:#}");
        }
    }
}

#[async_trait]
impl MemoryUpdater for SemanticStore {
    async fn observe(&self, message: &Message) {
        if message.role != Role::User {
            return;
        }
        if let Err(e) = self.store(message).await {
            warn!("Failed to index message: {e:#}");
        }
    }
}

#[async_trait]
impl ContextProvider for SemanticStore {
    async fn provide(&self, query: Option<&str>) -> Vec<Message> {
        let Some(query) = query else {
            return Vec::new();
        };

        self.retrieve(query)
            .await
            .into_iter()
            .map(|document| {
                Message::system(format!("[Semantic Memory]: {}", document))
                    .with_meta("type", "semantic")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::Mutex;

    struct RecordingIndex {
        inserted: Mutex<Vec<String>>,
        fail_queries: bool,
    }

    impl RecordingIndex {
        fn new(fail_queries: bool) -> Self {
            Self {
                inserted: Mutex::new(Vec::new()),
                fail_queries,
            }
        }
    }

    #[async_trait]
    impl VectorIndex for RecordingIndex {
        async fn insert(
            &self,
            _namespace: &str,
            _id: &str,
            content: &str,
            _metadata: serde_json::Value,
        ) -> Result<()> {
            self.inserted.lock().await.push(content.to_string());
            Ok(())
        }

        async fn query(&self, _namespace: &str, _text: &str, k: usize) -> Result<Vec<String>> {
            if self.fail_queries {
                anyhow::bail!("similarity service offline");
            }
            Ok(self.inserted.lock().await.iter().take(k).cloned().collect())
        }

        async fn delete_namespace(&self, _namespace: &str) -> Result<()> {
            self.inserted.lock().await.clear();
            Ok(())
        }
    }

    #[tokio::test]
    async fn only_user_messages_are_indexed() {
        let index = Arc::new(RecordingIndex::new(false));
        let store = SemanticStore::new(index.clone(), "test");

        store.observe(&Message::user("remember me")).await;
        store.observe(&Message::assistant("an answer")).await;
        store.observe(&Message::system("a directive")).await;

        let inserted = index.inserted.lock().await;
        assert_eq!(*inserted, vec!["remember me".to_string()]);
    }

    #[tokio::test]
    async fn query_failure_degrades_to_empty() {
        let index = Arc::new(RecordingIndex::new(true));
        let store = SemanticStore::new(index, "test");
        store.observe(&Message::user("remember me")).await;

        assert!(store.retrieve("anything").await.is_empty());
        assert!(store.provide(Some("anything")).await.is_empty());
    }

    #[tokio::test]
    async fn results_are_tagged_as_semantic() {
        let index = Arc::new(RecordingIndex::new(false));
        let store = SemanticStore::new(index, "test");
        store.observe(&Message::user("the sky is blue")).await;

        let context = store.provide(Some("sky")).await;
        assert_eq!(context.len(), 1);
        assert_eq!(context[0].content, "[Semantic Memory]: the sky is blue");
        assert_eq!(
            context[0].metadata.get("type").and_then(|v| v.as_str()),
            Some("semantic")
        );
    }
}
