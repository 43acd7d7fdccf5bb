//! Interface checks for the memory tiers.
//!
//! Compositions hand `Arc`s of every tier across await points, so each
//! tier must stay `Send + Sync`, and the boundary traits must remain
//! object-safe.

use std::sync::Arc;

use mnemo::llm::{LLMProvider, OpenAICompatibleProvider};
use mnemo::memory::{
    ContextProvider, EpisodicStore, HttpVectorIndex, MemoryStack, MemoryUpdater, ReflectionStore,
    SemanticStore, ShortTermWindow, VectorIndex,
};

#[test]
fn tiers_are_thread_safe() {
    fn assert_send_sync<T: Send + Sync>() {}

    assert_send_sync::<ShortTermWindow>();
    assert_send_sync::<EpisodicStore>();
    assert_send_sync::<SemanticStore>();
    assert_send_sync::<ReflectionStore>();
    assert_send_sync::<MemoryStack>();
    assert_send_sync::<HttpVectorIndex>();
    assert_send_sync::<OpenAICompatibleProvider>();
}

#[test]
fn boundary_traits_are_object_safe() {
    #[allow(dead_code)]
    fn check(
        _provider: Arc<dyn ContextProvider>,
        _updater: Arc<dyn MemoryUpdater>,
        _index: Arc<dyn VectorIndex>,
        _llm: Arc<dyn LLMProvider>,
    ) {
    }
}
