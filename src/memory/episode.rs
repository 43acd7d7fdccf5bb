//! Episode types

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// A consolidated unit of long-term memory: a summary of evicted
/// short-term messages plus the raw tokens used for retrieval scoring.
/// Immutable once created; only a full clear removes episodes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Episode {
    /// Unique identifier
    pub id: String,
    /// Textual summary of the evicted messages
    pub content: String,
    /// Retrieval tokens, stored verbatim. Duplicates are kept; matching
    /// lowercases both sides at comparison time.
    pub keywords: Vec<String>,
    /// When consolidation produced this episode
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl Episode {
    pub fn new(content: impl Into<String>, keywords: Vec<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            content: content.into(),
            keywords,
            timestamp: Utc::now(),
            metadata: HashMap::new(),
        }
    }
}
