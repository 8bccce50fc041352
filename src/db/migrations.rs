use rusqlite::Connection;

use crate::error::AppError;

/// Run the idempotent schema migration.
pub fn run(conn: &Connection) -> Result<(), AppError> {
    tracing::debug!("Running database migrations");

    conn.execute_batch(SCHEMA)?;

    tracing::info!("Database migrations complete");
    Ok(())
}

const SCHEMA: &str = r#"

-- ============================================================================
-- Detailed memories: the permanent, append-only ground truth per agent.
-- The INTEGER PRIMARY KEY doubles as the append sequence; rows are never
-- updated or auto-truncated.
-- ============================================================================

CREATE TABLE IF NOT EXISTS detailed_memories (
    id          INTEGER PRIMARY KEY AUTOINCREMENT,
    agent_name  TEXT NOT NULL,
    content     TEXT NOT NULL,
    created_at  TEXT NOT NULL
);
CREATE INDEX IF NOT EXISTS idx_detailed_memories_agent ON detailed_memories(agent_name);

-- ============================================================================
-- Compressed memories: one rolling first-person synthesis per agent,
-- overwritten (never appended) on each recompaction.
-- ============================================================================

CREATE TABLE IF NOT EXISTS compressed_memories (
    agent_name  TEXT PRIMARY KEY,
    content     TEXT NOT NULL,
    updated_at  TEXT NOT NULL
);

"#;
