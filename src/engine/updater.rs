//! The per-turn memory update cycle: draft a note from the fresh
//! transcript, persist it, trim working memory, and every `C`th
//! qualifying update recompact the agent's compressed memory.

use crate::catalog::Persona;
use crate::config::{gen, ChatConfig};
use crate::db::repos::{compressed, detailed};
use crate::db::DbPool;
use crate::error::AppError;
use crate::llm::LanguageModel;

use super::compression;
use super::prompt;
use super::state::ConversationState;

// ============================================================================
// Draft parsing
// ============================================================================

/// Result of the drafting step, tagged at the boundary so the rest of
/// the cycle never does sentinel string matching.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryDraft {
    NoUpdate,
    Note(String),
}

/// Phrases the drafting model may use to decline, matched
/// case-insensitively as substrings. Recognition lives here and only
/// here.
const NO_UPDATE_PHRASES: &[&str] = &[
    prompt::NO_UPDATE_SENTINEL,
    "nothing significant to add",
    "no new information",
];

impl MemoryDraft {
    pub fn parse(raw: &str) -> Self {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return MemoryDraft::NoUpdate;
        }
        let lowered = trimmed.to_lowercase();
        if NO_UPDATE_PHRASES.iter().any(|p| lowered.contains(p)) {
            return MemoryDraft::NoUpdate;
        }
        MemoryDraft::Note(trimmed.to_string())
    }
}

// ============================================================================
// Update cycle
// ============================================================================

/// What one memory-update cycle did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// No new transcript since this agent's last cycle; nothing ran.
    Skipped,
    /// Drafting failed at the transport; working memory unchanged,
    /// the cycle will see the same transcript again next turn.
    DraftFailed,
    /// The model declined: no note, no mutation, no counter increment.
    NoUpdate,
    Noted {
        recompacted: bool,
    },
}

/// Run one memory-update cycle for `persona`.
///
/// Transport failures degrade (the conversation continues with the
/// working memory unchanged); persistence failures propagate so the
/// caller can halt this one cycle loudly.
pub async fn update_memory(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    config: &ChatConfig,
    state: &mut ConversationState,
    persona: &Persona,
) -> Result<UpdateOutcome, AppError> {
    let name = persona.name.as_str();

    if state.messages.len() == state.last_seen(name) {
        return Ok(UpdateOutcome::Skipped);
    }

    let window = prompt::render_transcript(state.recent_window(config.history_window));
    let working_text = state
        .working_or_seed(persona, config.working_memory_capacity)
        .render();
    let messages = prompt::memory_draft_messages(persona, &working_text, &window);

    let raw = match llm.complete(&messages, gen::MEMORY_DRAFT).await {
        Ok(text) => text,
        Err(e) if e.is_transport() => {
            tracing::warn!(agent = %name, error = %e, "Memory drafting failed; keeping working memory unchanged");
            return Ok(UpdateOutcome::DraftFailed);
        }
        Err(e) => return Err(e),
    };

    let note = match MemoryDraft::parse(&raw) {
        MemoryDraft::NoUpdate => {
            state.mark_seen(name);
            tracing::debug!(agent = %name, "No significant memory update");
            return Ok(UpdateOutcome::NoUpdate);
        }
        MemoryDraft::Note(text) => format!(
            "- (noted at {}) {}",
            chrono::Utc::now().format("%H:%M"),
            text
        ),
    };

    // Ground truth first; working memory only reflects what was
    // durably recorded.
    detailed::append(pool, name, &note)?;
    state
        .working_or_seed(persona, config.working_memory_capacity)
        .apply_update(&note);
    state.mark_seen(name);

    let count = state.bump_update_count(name);
    let mut recompacted = false;
    if config.compression_interval > 0 && count % config.compression_interval == 0 {
        let recent = detailed::read_recent(pool, name, config.working_memory_capacity as i64)?;
        let current = compressed::read(pool, name)?;
        match compression::recompact(llm, pool, name, &current, &recent).await {
            Ok(_) => recompacted = true,
            Err(e) if e.is_transport() => {
                tracing::warn!(agent = %name, error = %e, "Recompaction failed; compressed memory unchanged");
            }
            Err(e) => return Err(e),
        }
    }

    Ok(UpdateOutcome::Noted { recompacted })
}
