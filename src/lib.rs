//! Mnemo - Tiered Conversational Memory
//!
//! Decides what prior interaction content is visible to a generation
//! call on each turn:
//! - Short-term window (recent messages, FIFO)
//! - Consolidation of overflow into summarized, scored episodes
//! - Semantic recall through an external similarity index
//! - Persistent lessons distilled by reflection
//!
//! Compositions expose one uniform contract to the agent loop:
//! `add_message`, `get_context`, `clear`, plus `reflect` where wired.

pub mod config;
pub mod llm;
pub mod memory;

// Re-exports for convenience
pub use config::MemoryConfig;
pub use llm::{LLMProvider, OpenAICompatibleProvider};
pub use memory::{MemoryStack, Message, Role};
