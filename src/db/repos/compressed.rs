use rusqlite::{params, OptionalExtension};

use crate::db::DbPool;
use crate::error::AppError;

/// An agent's compressed memory, empty string when none has been
/// recorded yet. Store failures propagate — "no row" and "could not
/// read" are different answers.
pub fn read(pool: &DbPool, agent_name: &str) -> Result<String, AppError> {
    let conn = pool.get()?;
    let content: Option<String> = conn
        .query_row(
            "SELECT content FROM compressed_memories WHERE agent_name = ?1",
            params![agent_name],
            |row| row.get(0),
        )
        .optional()?;
    Ok(content.unwrap_or_default())
}

/// Overwrite an agent's compressed memory. Last write wins.
pub fn write(pool: &DbPool, agent_name: &str, content: &str) -> Result<(), AppError> {
    let now = chrono::Utc::now().to_rfc3339();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO compressed_memories (agent_name, content, updated_at)
         VALUES (?1, ?2, ?3)
         ON CONFLICT(agent_name) DO UPDATE SET content = ?2, updated_at = ?3",
        params![agent_name, content, now],
    )?;
    Ok(())
}
