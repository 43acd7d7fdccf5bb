//! Episodic store - durable episodes with keyword/recency retrieval
//!
//! Episodes are scored against the current query by keyword overlap
//! blended with an exponential recency decay, and the best few are
//! rendered back into the context as system messages.

use std::cmp::Ordering;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use super::{ContextProvider, Episode, Message};

const DEFAULT_TOP_K: usize = 3;

/// Keyword overlap dominates the blend; recency keeps fresh episodes warm.
const KEYWORD_WEIGHT: f64 = 0.7;
const DECAY_WEIGHT: f64 = 0.3;
/// Decay constant in hours: an episode loses ~63% of its recency value per day.
const DECAY_HOURS: f64 = 24.0;

pub struct EpisodicStore {
    path: PathBuf,
    episodes: RwLock<Vec<Episode>>,
    top_k: usize,
}

impl EpisodicStore {
    /// Open the store, loading any existing snapshot. A missing or
    /// malformed snapshot yields an empty store, never an error.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let episodes = match Self::load(&path) {
            Ok(episodes) => {
                if !episodes.is_empty() {
                    info!("Loaded {} episodes from {:?}", episodes.len(), path);
                }
                episodes
            }
            Err(e) => {
                warn!("Discarding unreadable episodic snapshot {:?}: {e:#}", path);
                Vec::new()
            }
        };

        Self {
            path,
            episodes: RwLock::new(episodes),
            top_k: DEFAULT_TOP_K,
        }
    }

    pub fn with_top_k(mut self, top_k: usize) -> Self {
        self.top_k = top_k;
        self
    }

    fn load(path: &Path) -> Result<Vec<Episode>> {
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("reading {:?}", path))?;
        let episodes = serde_json::from_str(&raw)
            .with_context(|| format!("parsing {:?}", path))?;
        Ok(episodes)
    }

    pub async fn append(&self, episode: Episode) {
        self.episodes.write().await.push(episode);
    }

    /// Write the full collection as one snapshot, replacing the file.
    pub async fn persist(&self) -> Result<()> {
        let json = {
            let episodes = self.episodes.read().await;
            serde_json::to_string(&*episodes)?
        };
        tokio::fs::write(&self.path, json)
            .await
            .with_context(|| format!("writing {:?}", self.path))?;
        Ok(())
    }

    /// Top episodes for `query`, best first. Ties keep insertion order.
    pub async fn retrieve(&self, query: &str) -> Vec<Episode> {
        let query_tokens: HashSet<String> = query
            .to_lowercase()
            .split_whitespace()
            .map(str::to_string)
            .collect();
        let now = Utc::now();

        let episodes = self.episodes.read().await;
        let mut scored: Vec<(f64, &Episode)> = episodes
            .iter()
            .map(|episode| (score(episode, &query_tokens, now), episode))
            .collect();
        scored.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(Ordering::Equal));

        scored
            .into_iter()
            .take(self.top_k)
            .map(|(score, episode)| {
                debug!("Episode {} scored {:.4}", episode.id, score);
                episode.clone()
            })
            .collect()
    }

    pub async fn len(&self) -> usize {
        self.episodes.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.episodes.read().await.is_empty()
    }

    /// Snapshot of the full collection, oldest first.
    pub async fn all(&self) -> Vec<Episode> {
        self.episodes.read().await.clone()
    }

    /// Drop every episode and delete the durable snapshot.
    pub async fn clear(&self) {
        self.episodes.write().await.clear();
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            debug!("No episodic snapshot to remove: {e}");
        }
    }
}

fn score(episode: &Episode, query_tokens: &HashSet<String>, now: DateTime<Utc>) -> f64 {
    let keywords: HashSet<String> = episode
        .keywords
        .iter()
        .map(|k| k.to_lowercase())
        .collect();
    let matches = query_tokens.intersection(&keywords).count();
    let keyword_score = matches as f64 / (query_tokens.len() as f64 + 1.0);

    let hours_passed = (now - episode.timestamp).num_seconds() as f64 / 3600.0;
    let decay_score = (-hours_passed / DECAY_HOURS).exp();

    KEYWORD_WEIGHT * keyword_score + DECAY_WEIGHT * decay_score
}

#[async_trait]
impl ContextProvider for EpisodicStore {
    async fn provide(&self, query: Option<&str>) -> Vec<Message> {
        let Some(query) = query else {
            return Vec::new();
        };

        self.retrieve(query)
            .await
            .into_iter()
            .map(|episode| {
                Message::system(format!(
                    "[Memory from {}]: {}",
                    episode.timestamp.format("%Y-%m-%d %H:%M:%S"),
                    episode.content
                ))
                .with_meta("type", "episodic")
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::tempdir;

    fn episode_at(keywords: &[&str], hours_ago: i64) -> Episode {
        let mut episode = Episode::new(
            format!("summary of {:?}", keywords),
            keywords.iter().map(|k| k.to_string()).collect(),
        );
        episode.timestamp = Utc::now() - Duration::hours(hours_ago);
        episode
    }

    #[tokio::test]
    async fn fresher_episode_wins_on_equal_keyword_overlap() {
        let dir = tempdir().unwrap();
        let store = EpisodicStore::new(dir.path().join("episodes.json"));
        store.append(episode_at(&["deploy", "failed"], 48)).await;
        store.append(episode_at(&["deploy", "failed"], 1)).await;

        let top = store.retrieve("why has the deploy failed").await;
        assert_eq!(top.len(), 2);
        assert!(top[0].timestamp > top[1].timestamp);
    }

    #[tokio::test]
    async fn keyword_overlap_outranks_recency() {
        let dir = tempdir().unwrap();
        let store = EpisodicStore::new(dir.path().join("episodes.json"));
        store
            .append(episode_at(&["database", "migration", "schema"], 30))
            .await;
        store.append(episode_at(&["weather", "forecast"], 0)).await;

        let top = store.retrieve("database migration schema plan").await;
        assert!(top[0].content.contains("database"));
    }

    #[tokio::test]
    async fn ties_preserve_insertion_order() {
        let dir = tempdir().unwrap();
        let store = EpisodicStore::new(dir.path().join("episodes.json"));
        let shared_ts = Utc::now();
        for i in 0..3 {
            let mut episode = episode_at(&["alpha"], 0);
            episode.content = format!("episode {}", i);
            episode.timestamp = shared_ts;
            store.append(episode).await;
        }

        let top = store.retrieve("alpha").await;
        assert_eq!(top[0].content, "episode 0");
        assert_eq!(top[1].content, "episode 1");
        assert_eq!(top[2].content, "episode 2");
    }

    #[tokio::test]
    async fn snapshot_round_trips_exactly() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episodes.json");

        let store = EpisodicStore::new(&path);
        store
            .append(episode_at(&["First", "first", "SECOND"], 2))
            .await;
        store.append(episode_at(&["third"], 5)).await;
        store.persist().await.unwrap();

        let originals = store.all().await;
        let reloaded = EpisodicStore::new(&path);
        assert_eq!(reloaded.all().await, originals);
    }

    #[tokio::test]
    async fn malformed_snapshot_yields_empty_store() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episodes.json");
        std::fs::write(&path, "{ not json ]").unwrap();

        let store = EpisodicStore::new(&path);
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn no_query_means_no_episodic_context() {
        let dir = tempdir().unwrap();
        let store = EpisodicStore::new(dir.path().join("episodes.json"));
        store.append(episode_at(&["alpha"], 0)).await;

        assert!(store.provide(None).await.is_empty());
    }

    #[tokio::test]
    async fn clear_removes_the_snapshot_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("episodes.json");
        let store = EpisodicStore::new(&path);
        store.append(episode_at(&["alpha"], 0)).await;
        store.persist().await.unwrap();
        assert!(path.exists());

        store.clear().await;
        assert!(store.is_empty().await);
        assert!(!path.exists());
    }
}
