//! Consolidation - folds short-term overflow into episodes
//!
//! When the window grows past twice the short-term limit, the oldest
//! messages are drained, reduced to a summary plus retrieval keywords,
//! and appended to the episodic store. The snapshot is persisted before
//! the call returns.

use std::sync::Arc;

use async_trait::async_trait;
use tracing::{info, warn};

use super::{Episode, EpisodicStore, MemoryUpdater, Message, Role, ShortTermWindow};

/// Tokens at or below this length carry too little retrieval signal.
const MIN_KEYWORD_CHARS: usize = 4;

pub struct ConsolidationEngine {
    window: Arc<ShortTermWindow>,
    episodes: Arc<EpisodicStore>,
    stm_limit: usize,
}

impl ConsolidationEngine {
    pub fn new(
        window: Arc<ShortTermWindow>,
        episodes: Arc<EpisodicStore>,
        stm_limit: usize,
    ) -> Self {
        Self {
            window,
            episodes,
            stm_limit,
        }
    }

    async fn consolidate(&self) {
        let overflow = self.window.drain_overflow(self.stm_limit).await;
        let Some(episode) = build_episode(&overflow) else {
            return;
        };

        info!(
            "Consolidated {} messages into episode {}",
            overflow.len(),
            episode.id
        );
        self.episodes.append(episode).await;
        if let Err(e) = self.episodes.persist().await {
            warn!("Failed to persist episodic snapshot: {e:#}");
        }
    }
}

#[async_trait]
impl MemoryUpdater for ConsolidationEngine {
    async fn observe(&self, _message: &Message) {
        // Fires at most once per observed message, never recursively.
        if self.window.len().await > self.stm_limit * 2 {
            self.consolidate().await;
        }
    }
}

/// Reduce an overflow prefix to an episode. The summary is a crude
/// extractive placeholder over the user-authored contents; keywords are
/// every transcript token longer than four characters, verbatim and
/// unfiltered.
pub fn build_episode(messages: &[Message]) -> Option<Episode> {
    if messages.is_empty() {
        return None;
    }

    let spoken: Vec<&str> = messages
        .iter()
        .filter(|m| m.role == Role::User)
        .map(|m| m.content.as_str())
        .collect();
    let summary = format!("Interaction loop where user said: {:?}", spoken);

    let transcript = messages
        .iter()
        .map(Message::render)
        .collect::<Vec<_>>()
        .join("\n");
    let keywords = transcript
        .split_whitespace()
        .filter(|w| w.chars().count() > MIN_KEYWORD_CHARS)
        .map(str::to_string)
        .collect();

    Some(Episode::new(summary, keywords))
}
