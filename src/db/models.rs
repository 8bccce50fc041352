use serde::{Deserialize, Serialize};

// ============================================================================
// Memories
// ============================================================================

/// One immutable entry in an agent's detailed memory log.
///
/// The compressed store has no row type here: it is a single text blob
/// per agent and the repo reads and writes it as a bare `String`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetailedMemoryEntry {
    pub id: i64,
    pub agent_name: String,
    pub content: String,
    pub created_at: String,
}
