//! Reflection - lessons distilled from past interactions
//!
//! A meta-reasoning call critiques a stretch of history; anything it
//! flags becomes a persistent directive injected ahead of all other
//! context on every turn. Lessons are append-only, one line each, and
//! survive restarts through a plain text file.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::llm::LLMProvider;

use super::{ContextProvider, Message};

const CRITIQUE_INSTRUCTION: &str = "You are a critical observer of an AI agent. \
Analyze the following interaction. If the agent made a mistake or the user was \
unhappy, formulate a 'Lesson Learned' or 'Rule' to prevent this in the future. \
If no mistake, return 'None'.";

const LESSON_HEADER: &str = "CRITICAL INSTRUCTIONS (Derived from past mistakes):";

/// Replies at or below this length are treated as declining to produce a rule.
const MIN_LESSON_CHARS: usize = 5;

pub struct ReflectionStore {
    path: PathBuf,
    provider: Arc<dyn LLMProvider>,
    model: String,
    lessons: RwLock<Vec<String>>,
}

impl ReflectionStore {
    /// Open the store, loading any lessons already on disk. Lines are
    /// trimmed and blank lines skipped; a missing file is fine.
    pub fn new(
        path: impl Into<PathBuf>,
        provider: Arc<dyn LLMProvider>,
        model: impl Into<String>,
    ) -> Self {
        let path = path.into();
        let lessons = Self::load(&path);
        if !lessons.is_empty() {
            info!("Loaded {} lessons from {:?}", lessons.len(), path);
        }

        Self {
            path,
            provider,
            model: model.into(),
            lessons: RwLock::new(lessons),
        }
    }

    fn load(path: &Path) -> Vec<String> {
        match std::fs::read_to_string(path) {
            Ok(raw) => raw
                .lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(str::to_string)
                .collect(),
            Err(_) => Vec::new(),
        }
    }

    /// Critique `history` and record a lesson if the critic found one.
    /// Returns whether a lesson was added. Never raises: a provider
    /// failure is folded into the reply text and judged like any other.
    pub async fn reflect(&self, history: &[Message]) -> bool {
        let transcript = history
            .iter()
            .map(Message::render)
            .collect::<Vec<_>>()
            .join("\n");
        let prompt = format!("Interaction:\n{}", transcript);

        let critique = match self
            .provider
            .generate(&self.model, prompt, Some(CRITIQUE_INSTRUCTION.to_string()))
            .await
        {
            Ok(reply) => reply,
            Err(e) => format!("Error calling LLM: {e:#}"),
        };

        if critique.contains("None") || critique.chars().count() <= MIN_LESSON_CHARS {
            debug!("Reflection produced no new lesson");
            return false;
        }

        info!("New lesson learned: {critique}");
        self.lessons.write().await.push(critique.clone());
        if let Err(e) = self.append_to_file(&critique).await {
            warn!("Failed to persist lesson: {e:#}");
        }
        true
    }

    async fn append_to_file(&self, lesson: &str) -> Result<()> {
        let mut file = tokio::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await
            .with_context(|| format!("opening {:?}", self.path))?;
        file.write_all(format!("{}\n", lesson).as_bytes()).await?;
        file.flush().await?;
        Ok(())
    }

    pub async fn len(&self) -> usize {
        self.lessons.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.lessons.read().await.is_empty()
    }

    /// Forget every lesson and delete the durable file.
    pub async fn clear(&self) {
        self.lessons.write().await.clear();
        if let Err(e) = tokio::fs::remove_file(&self.path).await {
            debug!("No lesson file to remove: {e}");
        }
    }
}

#[async_trait]
impl ContextProvider for ReflectionStore {
    /// All lessons, folded into one high-priority system message. The
    /// query is deliberately ignored: every lesson applies to every turn.
    async fn provide(&self, _query: Option<&str>) -> Vec<Message> {
        let lessons = self.lessons.read().await;
        if lessons.is_empty() {
            return Vec::new();
        }

        let body = lessons
            .iter()
            .map(|lesson| format!("- {}", lesson))
            .collect::<Vec<_>>()
            .join("\n");

        vec![Message::system(format!("{}\n{}", LESSON_HEADER, body))
            .with_meta("type", "reflection")
            .with_meta("priority", "high")]
    }
}
