use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::catalog::Persona;

use super::working::WorkingMemory;

// ============================================================================
// Transcript
// ============================================================================

/// One chatroom message. The transcript is append-only: messages are
/// never mutated or reordered after insertion, making it the single
/// source of truth for what happened.
#[derive(Debug, Clone)]
pub struct Message {
    pub speaker: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
}

/// A recorded conversation summary, tagged with the turn counter at the
/// moment it was taken. Catch-up summaries land after the boundary they
/// were scheduled for, so the tag is the recording turn, not a multiple
/// of the interval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummaryRecord {
    pub turn: u64,
    pub text: String,
}

// ============================================================================
// Session state
// ============================================================================

/// All mutable state of one conversation session: transcript, turn
/// counters, working memories, summaries. An explicit struct rather
/// than ambient globals, so sessions can run in isolation and be
/// unit-tested independently. Durable memory lives in the database,
/// keyed by agent name, and is deliberately *not* in here.
#[derive(Debug)]
pub struct ConversationState {
    pub user_name: String,
    /// Agents currently in the room, in roster order (ties in
    /// direct-address matching resolve by this order).
    pub roster: Vec<String>,
    pub messages: Vec<Message>,
    pub summaries: Vec<SummaryRecord>,
    pub last_speaker: Option<String>,
    /// Total messages posted this session, user and agents alike.
    pub total_turns: u64,
    working: HashMap<String, WorkingMemory>,
    update_counts: HashMap<String, u64>,
    last_seen: HashMap<String, usize>,
}

impl ConversationState {
    pub fn new(user_name: impl Into<String>, roster: Vec<String>) -> Self {
        Self {
            user_name: user_name.into(),
            roster,
            messages: Vec::new(),
            summaries: Vec::new(),
            last_speaker: None,
            total_turns: 0,
            working: HashMap::new(),
            update_counts: HashMap::new(),
            last_seen: HashMap::new(),
        }
    }

    /// Append a message, advancing the turn counters.
    pub fn push_message(&mut self, speaker: impl Into<String>, content: impl Into<String>) {
        let speaker = speaker.into();
        self.messages.push(Message {
            speaker: speaker.clone(),
            content: content.into(),
            timestamp: Utc::now(),
        });
        self.last_speaker = Some(speaker);
        self.total_turns += 1;
    }

    /// The trailing `window` messages (the whole transcript when shorter).
    pub fn recent_window(&self, window: usize) -> &[Message] {
        let start = self.messages.len().saturating_sub(window);
        &self.messages[start..]
    }

    /// The agent's working memory, seeding it on first touch.
    pub fn working_or_seed(&mut self, persona: &Persona, capacity: usize) -> &mut WorkingMemory {
        self.working
            .entry(persona.name.clone())
            .or_insert_with(|| WorkingMemory::seed(persona, capacity))
    }

    pub fn working(&self, agent_name: &str) -> Option<&WorkingMemory> {
        self.working.get(agent_name)
    }

    /// Increment and return the agent's memory-update count.
    pub fn bump_update_count(&mut self, agent_name: &str) -> u64 {
        let count = self.update_counts.entry(agent_name.to_string()).or_insert(0);
        *count += 1;
        *count
    }

    pub fn update_count(&self, agent_name: &str) -> u64 {
        self.update_counts.get(agent_name).copied().unwrap_or(0)
    }

    /// Transcript length the agent's memory cycle last consumed.
    pub fn last_seen(&self, agent_name: &str) -> usize {
        self.last_seen.get(agent_name).copied().unwrap_or(0)
    }

    pub fn mark_seen(&mut self, agent_name: &str) {
        self.last_seen
            .insert(agent_name.to_string(), self.messages.len());
    }
}

// ============================================================================
// Automatic runs
// ============================================================================

/// Progress of a "run N automatic turns" request. Tracks turns
/// completed so far explicitly, so an interrupted run can resume by
/// handing the same value back in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AutoRun {
    pub requested: u64,
    pub completed: u64,
}

impl AutoRun {
    pub fn new(requested: u64) -> Self {
        Self {
            requested,
            completed: 0,
        }
    }

    pub fn is_done(&self) -> bool {
        self.completed >= self.requested
    }
}
