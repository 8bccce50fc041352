use std::path::PathBuf;

use serde::Deserialize;

use crate::error::AppError;

/// Generation parameters for one kind of model call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GenParams {
    pub temperature: f32,
    pub max_tokens: u32,
}

/// Per-call-kind generation parameters. Replies run warm and short;
/// memory work runs cool so it stays factual.
pub mod gen {
    use super::GenParams;

    pub const REPLY: GenParams = GenParams { temperature: 0.7, max_tokens: 150 };
    pub const MEMORY_DRAFT: GenParams = GenParams { temperature: 0.3, max_tokens: 100 };
    pub const SUMMARY: GenParams = GenParams { temperature: 0.2, max_tokens: 300 };
    pub const RECOMPACTION: GenParams = GenParams { temperature: 0.3, max_tokens: 1000 };
    pub const ARBITRATION: GenParams = GenParams { temperature: 0.3, max_tokens: 50 };
    pub const PERSONA_DRAFT: GenParams = GenParams { temperature: 0.5, max_tokens: 300 };
    pub const GREETING: GenParams = GenParams { temperature: 0.7, max_tokens: 50 };
}

/// Chatroom tuning knobs. Loaded from an optional TOML file with
/// env-var overrides for the transport secrets; everything defaults to
/// sensible values so `parlor chat` works out of the box.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChatConfig {
    /// Max transcript messages visible to the model per call.
    pub history_window: usize,
    /// Max non-identity notes held in an agent's working memory.
    pub working_memory_capacity: usize,
    /// Generate a conversation summary every this many total turns.
    pub summary_interval: u64,
    /// Recompact an agent's compressed memory every this many
    /// qualifying memory updates.
    pub compression_interval: u64,
    /// Probability that speaker selection skips model arbitration and
    /// picks uniformly at random, keeping quieter agents reachable.
    pub exploration_rate: f64,
    /// Model identifier sent to the chat-completions endpoint.
    pub model: String,
    /// OpenAI-compatible API base URL.
    pub api_base: String,
    /// API key. Never read from the TOML file; env only.
    #[serde(skip)]
    pub api_key: String,
}

impl Default for ChatConfig {
    fn default() -> Self {
        Self {
            history_window: 20,
            working_memory_capacity: 20,
            summary_interval: 3,
            compression_interval: 3,
            exploration_rate: 0.15,
            model: "gemini-2.0-flash".into(),
            api_base: "https://generativelanguage.googleapis.com/v1beta".into(),
            api_key: String::new(),
        }
    }
}

impl ChatConfig {
    /// Load config: `$PARLOR_CONFIG` or `<data_dir>/parlor.toml` if
    /// present, defaults otherwise. `PARLOR_API_KEY` (falling back to
    /// `GEMINI_API_KEY`) supplies the transport credential.
    pub fn load(data_dir: &PathBuf) -> Result<Self, AppError> {
        let path = std::env::var("PARLOR_CONFIG")
            .map(PathBuf::from)
            .unwrap_or_else(|_| data_dir.join("parlor.toml"));

        let mut config = if path.exists() {
            let raw = std::fs::read_to_string(&path)?;
            tracing::debug!(path = %path.display(), "Loading config file");
            toml::from_str(&raw)
                .map_err(|e| AppError::Validation(format!("bad config {}: {e}", path.display())))?
        } else {
            ChatConfig::default()
        };

        config.api_key = std::env::var("PARLOR_API_KEY")
            .or_else(|_| std::env::var("GEMINI_API_KEY"))
            .unwrap_or_default();

        config.validate()?;
        Ok(config)
    }

    /// Check the knobs hold values the engine can run on. The interval
    /// counters divide turn counts, so zero is rejected outright.
    pub fn validate(&self) -> Result<(), AppError> {
        if self.summary_interval == 0 {
            return Err(AppError::Validation("summary_interval must be at least 1".into()));
        }
        if self.compression_interval == 0 {
            return Err(AppError::Validation("compression_interval must be at least 1".into()));
        }
        if self.history_window == 0 {
            return Err(AppError::Validation("history_window must be at least 1".into()));
        }
        if self.working_memory_capacity == 0 {
            return Err(AppError::Validation("working_memory_capacity must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.exploration_rate) {
            return Err(AppError::Validation(format!(
                "exploration_rate must be within [0, 1], got {}",
                self.exploration_rate
            )));
        }
        Ok(())
    }
}

/// Application data directory (`~/.local/share/parlor` or platform
/// equivalent, `./.parlor` when the platform dir is unavailable).
pub fn data_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("parlor"))
        .unwrap_or_else(|| PathBuf::from(".parlor"))
}
