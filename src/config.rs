//! Runtime configuration for the memory stack.

use std::path::PathBuf;

/// Tunables shared by every composition. Values are plain data; a bad
/// value (say, a zero window) is left to fail at the point of use.
#[derive(Debug, Clone)]
pub struct MemoryConfig {
    /// Hard cap for the recency-only window
    pub window_size: usize,
    /// Messages kept in the short-term tail after consolidation
    pub stm_limit: usize,
    /// Snapshot file for consolidated episodes
    pub episodic_path: PathBuf,
    /// Append-only lesson file
    pub reflection_path: PathBuf,
    /// Namespace under which semantic records are indexed
    pub namespace: String,
    /// Model used for the reflection critique call
    pub reflection_model: String,
}

impl Default for MemoryConfig {
    fn default() -> Self {
        Self {
            window_size: 10,
            stm_limit: 5,
            episodic_path: PathBuf::from("episodic_memory.json"),
            reflection_path: PathBuf::from("reflections.txt"),
            namespace: "agent_memory".to_string(),
            reflection_model: "gpt-4o".to_string(),
        }
    }
}

impl MemoryConfig {
    /// Defaults overridden by `MNEMO_*` environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            window_size: env_usize("MNEMO_WINDOW_SIZE", defaults.window_size),
            stm_limit: env_usize("MNEMO_STM_LIMIT", defaults.stm_limit),
            episodic_path: std::env::var("MNEMO_EPISODIC_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.episodic_path),
            reflection_path: std::env::var("MNEMO_REFLECTION_PATH")
                .map(PathBuf::from)
                .unwrap_or(defaults.reflection_path),
            namespace: std::env::var("MNEMO_NAMESPACE").unwrap_or(defaults.namespace),
            reflection_model: std::env::var("MNEMO_REFLECTION_MODEL")
                .unwrap_or(defaults.reflection_model),
        }
    }
}

fn env_usize(key: &str, default: usize) -> usize {
    std::env::var(key)
        .ok()
        .and_then(|value| value.parse().ok())
        .unwrap_or(default)
}
