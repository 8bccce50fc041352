use rusqlite::{params, Row};

use crate::db::models::DetailedMemoryEntry;
use crate::db::DbPool;
use crate::error::AppError;

fn row_to_entry(row: &Row) -> rusqlite::Result<DetailedMemoryEntry> {
    Ok(DetailedMemoryEntry {
        id: row.get("id")?,
        agent_name: row.get("agent_name")?,
        content: row.get("content")?,
        created_at: row.get("created_at")?,
    })
}

/// Append one note to an agent's detailed memory log. The insert is a
/// single statement, so it lands whole or not at all.
pub fn append(pool: &DbPool, agent_name: &str, content: &str) -> Result<(), AppError> {
    if content.trim().is_empty() {
        return Err(AppError::Validation("Memory note cannot be empty".into()));
    }

    let now = chrono::Utc::now().format("%Y-%m-%d %H:%M:%S").to_string();

    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO detailed_memories (agent_name, content, created_at)
         VALUES (?1, ?2, ?3)",
        params![agent_name, content, now],
    )?;
    Ok(())
}

/// The most recent `limit` entries for an agent, oldest-first.
///
/// Read failures propagate; an unreadable store must never present as
/// an agent having no past.
pub fn read_recent(
    pool: &DbPool,
    agent_name: &str,
    limit: i64,
) -> Result<Vec<DetailedMemoryEntry>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM detailed_memories WHERE agent_name = ?1
         ORDER BY id DESC LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![agent_name, limit], row_to_entry)?;
    let mut entries = rows
        .collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Database)?;
    entries.reverse();
    Ok(entries)
}

/// The full detailed history for an agent, oldest-first.
pub fn read_all(pool: &DbPool, agent_name: &str) -> Result<Vec<DetailedMemoryEntry>, AppError> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT * FROM detailed_memories WHERE agent_name = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map(params![agent_name], row_to_entry)?;
    rows.collect::<Result<Vec<_>, _>>()
        .map_err(AppError::Database)
}

pub fn count(pool: &DbPool, agent_name: &str) -> Result<i64, AppError> {
    let conn = pool.get()?;
    let n: i64 = conn.query_row(
        "SELECT COUNT(*) FROM detailed_memories WHERE agent_name = ?1",
        params![agent_name],
        |row| row.get(0),
    )?;
    Ok(n)
}

/// Render entries the way the memory prompts and the CLI show them:
/// `[timestamp]` on its own line, then the note.
pub fn render(entries: &[DetailedMemoryEntry]) -> String {
    let mut out = String::new();
    for entry in entries {
        out.push_str(&format!("[{}]\n{}\n\n", entry.created_at, entry.content));
    }
    out
}
