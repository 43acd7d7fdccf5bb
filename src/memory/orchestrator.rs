//! Memory stack - ordered tier composition behind the agent-loop contract
//!
//! Each composition wires the same tiers into two ordered lists: updaters
//! run on every new message, providers are concatenated to assemble the
//! context. Provider order is a contract consumers rely on: lessons
//! first, then semantic matches, then episodic matches, then the
//! short-term tail.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::debug;

use crate::config::MemoryConfig;
use crate::llm::LLMProvider;

use super::{
    ConsolidationEngine, ContextProvider, EpisodicStore, MemoryUpdater, Message,
    ReflectionStore, SemanticStore, ShortTermWindow, VectorIndex,
};

/// Renders the short-term tier into the context: the full buffer for the
/// plain window, the last `stm_limit` messages for consolidating stacks.
struct RecentTail {
    window: Arc<ShortTermWindow>,
    limit: Option<usize>,
}

#[async_trait]
impl ContextProvider for RecentTail {
    async fn provide(&self, _query: Option<&str>) -> Vec<Message> {
        match self.limit {
            Some(n) => self.window.tail(n).await,
            None => self.window.snapshot().await,
        }
    }
}

pub struct MemoryStack {
    updaters: Vec<Arc<dyn MemoryUpdater>>,
    providers: Vec<Arc<dyn ContextProvider>>,
    window: Arc<ShortTermWindow>,
    episodes: Option<Arc<EpisodicStore>>,
    semantic: Option<Arc<SemanticStore>>,
    reflections: Option<Arc<ReflectionStore>>,
}

impl MemoryStack {
    /// Recency only: keep the last `window_size` messages, nothing else.
    pub fn context_window(config: &MemoryConfig) -> Self {
        let window = Arc::new(ShortTermWindow::bounded(config.window_size));
        Self {
            updaters: vec![window.clone()],
            providers: vec![Arc::new(RecentTail {
                window: window.clone(),
                limit: None,
            })],
            window,
            episodes: None,
            semantic: None,
            reflections: None,
        }
    }

    /// Adds consolidation of short-term overflow into retrievable episodes.
    pub fn episodic(config: &MemoryConfig) -> Self {
        let window = Arc::new(ShortTermWindow::unbounded());
        let episodes = Arc::new(EpisodicStore::new(&config.episodic_path));
        let consolidation = Arc::new(ConsolidationEngine::new(
            window.clone(),
            episodes.clone(),
            config.stm_limit,
        ));

        Self {
            updaters: vec![window.clone(), consolidation],
            providers: vec![
                episodes.clone(),
                Arc::new(RecentTail {
                    window: window.clone(),
                    limit: Some(config.stm_limit),
                }),
            ],
            window,
            episodes: Some(episodes),
            semantic: None,
            reflections: None,
        }
    }

    /// Adds per-message capture into an external similarity index, with
    /// semantic matches ranked ahead of episodic ones.
    pub fn semantic(config: &MemoryConfig, index: Arc<dyn VectorIndex>) -> Self {
        let mut stack = Self::episodic(config);
        let semantic = Arc::new(SemanticStore::new(index, config.namespace.clone()));
        stack.updaters.push(semantic.clone());
        stack.providers.insert(0, semantic.clone());
        stack.semantic = Some(semantic);
        stack
    }

    /// Adds lesson injection and the `reflect` operation on top of the
    /// semantic composition.
    pub fn reflective(
        config: &MemoryConfig,
        index: Arc<dyn VectorIndex>,
        provider: Arc<dyn LLMProvider>,
    ) -> Self {
        let mut stack = Self::semantic(config, index);
        let reflections = Arc::new(ReflectionStore::new(
            &config.reflection_path,
            provider,
            config.reflection_model.clone(),
        ));
        stack.providers.insert(0, reflections.clone());
        stack.reflections = Some(reflections);
        stack
    }

    /// Record a new message across every tier.
    pub async fn add_message(&self, message: Message) {
        for updater in &self.updaters {
            updater.observe(&message).await;
        }
    }

    /// Assemble the context for the next generation call, highest
    /// priority first.
    pub async fn get_context(&self, query: Option<&str>) -> Vec<Message> {
        let mut context = Vec::new();
        for provider in &self.providers {
            context.extend(provider.provide(query).await);
        }
        debug!("Assembled context of {} messages", context.len());
        context
    }

    /// Run the critic over `history`; returns whether a lesson was
    /// recorded. A no-op on compositions without a reflection tier.
    pub async fn reflect(&self, history: &[Message]) -> bool {
        match &self.reflections {
            Some(reflections) => reflections.reflect(history).await,
            None => {
                debug!("Reflection requested but this composition has no reflection tier");
                false
            }
        }
    }

    /// Wipe every tier, including durable artifacts.
    pub async fn clear(&self) {
        self.window.clear().await;
        if let Some(episodes) = &self.episodes {
            episodes.clear().await;
        }
        if let Some(semantic) = &self.semantic {
            semantic.clear().await;
        }
        if let Some(reflections) = &self.reflections {
            reflections.clear().await;
        }
    }
}
