//! Memory System Module
//!
//! Tiered context for conversational agents: a short-term window,
//! consolidated episodes with scored retrieval, semantic recall through
//! an external similarity index, and persistent lessons from reflection.

pub mod consolidation;
pub mod episode;
pub mod episodic;
pub mod message;
pub mod orchestrator;
pub mod reflection;
pub mod semantic;
pub mod window;

pub use consolidation::ConsolidationEngine;
pub use episode::Episode;
pub use episodic::EpisodicStore;
pub use message::{Message, Role};
pub use orchestrator::MemoryStack;
pub use reflection::ReflectionStore;
pub use semantic::{HttpVectorIndex, SemanticStore, VectorIndex};
pub use window::ShortTermWindow;

use async_trait::async_trait;

/// Given a query, produce an ordered list of contextual messages.
#[async_trait]
pub trait ContextProvider: Send + Sync {
    async fn provide(&self, query: Option<&str>) -> Vec<Message>;
}

/// Given a new message, update internal state.
#[async_trait]
pub trait MemoryUpdater: Send + Sync {
    async fn observe(&self, message: &Message);
}
