//! Recompaction of compressed memory from the detailed log.

use crate::config::gen;
use crate::db::models::DetailedMemoryEntry;
use crate::db::repos::{compressed, detailed};
use crate::db::DbPool;
use crate::error::AppError;
use crate::llm::LanguageModel;

use super::prompt;

/// Cold-start truncation budget, in characters.
const BOOTSTRAP_LIMIT: usize = 500;

/// Regenerate an agent's compressed memory from its current value plus
/// recent detailed entries, and persist the result.
///
/// Cold start (no compressed memory yet) skips the model entirely and
/// stores a dated truncation of the notes. On a model failure the
/// stored value is left untouched and the error is returned — an error
/// message must never overwrite a valid compressed memory.
pub async fn recompact(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    agent_name: &str,
    current_compressed: &str,
    recent_entries: &[DetailedMemoryEntry],
) -> Result<String, AppError> {
    let notes_text = detailed::render(recent_entries);

    if current_compressed.is_empty() {
        let truncated: String = notes_text.chars().take(BOOTSTRAP_LIMIT).collect();
        let bootstrap = format!(
            "Initial compressed memory ({}): {}...",
            chrono::Utc::now().format("%Y-%m-%d"),
            truncated.trim_end()
        );
        compressed::write(pool, agent_name, &bootstrap)?;
        tracing::debug!(agent = %agent_name, "Compressed memory bootstrapped");
        return Ok(bootstrap);
    }

    let messages = prompt::recompaction_messages(agent_name, current_compressed, &notes_text);
    let new_compressed = llm.complete(&messages, gen::RECOMPACTION).await?;

    compressed::write(pool, agent_name, &new_compressed)?;
    tracing::info!(agent = %agent_name, "Compressed memory recompacted");
    Ok(new_compressed)
}
