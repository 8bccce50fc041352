//! Prompt assembly. Everything here is a pure function of its inputs;
//! the wording carries the informational content the engine contracts
//! for (persona identity, memories, transcript window) without the
//! callers caring about the exact phrasing.

use crate::catalog::Persona;
use crate::llm::{ChatMessage, PromptRole};

use super::state::Message;

// ============================================================================
// Speaker folding
// ============================================================================

/// Fold a speaker's identity into message content for the two-role
/// prompt collapse. Stable convention: `[Name]: content`.
pub fn fold_speaker(name: &str, content: &str) -> String {
    format!("[{name}]: {content}")
}

/// Recover `(name, content)` from text produced by [`fold_speaker`].
/// Returns `None` for text that does not carry the prefix.
pub fn unfold_speaker(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix('[')?;
    let close = rest.find("]: ")?;
    let name = &rest[..close];
    if name.is_empty() {
        return None;
    }
    Some((name, &rest[close + 3..]))
}

/// Plain `speaker: content` transcript lines, as shown to the model in
/// analysis prompts (director, memory drafting, summarization).
pub fn render_transcript(messages: &[Message]) -> String {
    messages
        .iter()
        .map(|m| format!("{}: {}", m.speaker, m.content))
        .collect::<Vec<_>>()
        .join("\n")
}

// ============================================================================
// Reply generation
// ============================================================================

/// The prompt for one agent's chatroom reply: a system message carrying
/// persona identity, compressed memory (when any), and working memory,
/// followed by the trailing transcript window collapsed onto two roles.
/// The acting agent's own prior lines become `Agent`-role messages with
/// bare content; everyone else's become `Other`-role messages with the
/// real speaker folded into the content, so no identity is lost under
/// the collapse.
pub fn reply_messages(
    persona: &Persona,
    compressed_memory: &str,
    working_memory: &str,
    window: &[Message],
    window_size: usize,
) -> Vec<ChatMessage> {
    let mut system = format!(
        "You are {}. {}\nYour background: {}\n",
        persona.name, persona.description, persona.background
    );
    if !compressed_memory.is_empty() {
        system.push_str(&format!(
            "Your core experience (long-term memory): {compressed_memory}\n\n"
        ));
    }
    system.push_str(&format!(
        "Your recent working memory (keep yourself consistent with it): {working_memory}\n\n\
         You are in a chatroom. Below is the recent conversation history (the last {window_size} \
         messages at most). Interact naturally. Be concise. Stay in character. Do not greet \
         unless this is your first message."
    ));

    let mut messages = vec![ChatMessage::new(PromptRole::System, system)];
    for msg in window {
        if msg.speaker == persona.name {
            messages.push(ChatMessage::new(PromptRole::Agent, msg.content.clone()));
        } else {
            messages.push(ChatMessage::new(
                PromptRole::Other,
                fold_speaker(&msg.speaker, &msg.content),
            ));
        }
    }
    messages
}

// ============================================================================
// Memory drafting
// ============================================================================

/// Fixed sentinel the drafting prompt offers for "nothing worth noting".
pub const NO_UPDATE_SENTINEL: &str = "no significant update";

pub fn memory_draft_messages(
    persona: &Persona,
    working_memory: &str,
    transcript_window: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        "You are an assistant helping {name} ({desc}) update their memory.\n\
         Current memory:\n{working_memory}\n\n\
         Recent conversation excerpt:\n{transcript_window}\n\n\
         Based on this, provide one concise memory update for {name}. Focus on key new facts, \
         decisions, or strong feelings {name} expressed or observed and should remember. Keep it \
         short, like a personal note. If there is nothing significant to add, say \
         '{sentinel}'.",
        name = persona.name,
        desc = persona.description,
        sentinel = NO_UPDATE_SENTINEL,
    );
    vec![
        ChatMessage::new(PromptRole::System, "You are a helpful memory assistant."),
        ChatMessage::new(PromptRole::Other, prompt),
    ]
}

// ============================================================================
// Recompaction
// ============================================================================

pub fn recompaction_messages(
    agent_name: &str,
    current_compressed: &str,
    recent_detailed: &str,
) -> Vec<ChatMessage> {
    let prompt = format!(
        "You are a memory-compression specialist maintaining a distilled experience store for \
         the character {agent_name}.\n\n\
         Current compressed memory (the character's core knowledge and experience):\n\
         {current_compressed}\n\n\
         Recent detailed memories (to be folded in):\n{recent_detailed}\n\n\
         Write a new compressed memory that:\n\
         1. preserves the core personality traits and key experiences\n\
         2. includes the most important new discoveries and interactions\n\
         3. drops repeated or trivial information\n\
         4. stays within roughly 1000 words\n\
         5. keeps a sense of the character's timeline\n\n\
         Present it in concise first person, as if it were the character's own core memory."
    );
    vec![
        ChatMessage::new(PromptRole::System, "You are an excellent memory-compression specialist."),
        ChatMessage::new(PromptRole::Other, prompt),
    ]
}

// ============================================================================
// Summarization
// ============================================================================

pub fn summary_messages(transcript_window: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "Summarize the following chat conversation. Highlight the key topics, decisions, any \
         disagreements or agreements, and the overall progression of the discussion. Be \
         concise.\n\nConversation:\n{transcript_window}"
    );
    vec![
        ChatMessage::new(PromptRole::System, "You are a summarization expert."),
        ChatMessage::new(PromptRole::Other, prompt),
    ]
}

// ============================================================================
// Speaker arbitration
// ============================================================================

pub fn arbitration_messages(
    eligible_described: &[(String, String)],
    transcript_window: &str,
    last_speaker: &str,
) -> Vec<ChatMessage> {
    let roster_info = eligible_described
        .iter()
        .map(|(name, desc)| format!("- {name}: {desc}"))
        .collect::<Vec<_>>()
        .join("\n");
    let eligible_names = eligible_described
        .iter()
        .map(|(name, _)| name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    let prompt = format!(
        "You are the invisible director of a chatroom. Based on the recent conversation, decide \
         who should speak next.\n\n\
         Current members:\n{roster_info}\n\n\
         Recent conversation:\n{transcript_window}\n\n\
         The previous speaker was: {last_speaker}\n\n\
         Weigh who was addressed or asked something, whose background best fits the current \
         topic, who could add a genuinely new point of view, and who has spoken least in the \
         last few rounds.\n\n\
         Choose one name from this list and return only the name, with no explanation: \
         {eligible_names}"
    );
    vec![
        ChatMessage::new(
            PromptRole::System,
            "You are a conversation-management expert deciding who speaks next.",
        ),
        ChatMessage::new(PromptRole::Other, prompt),
    ]
}

// ============================================================================
// Opening greeting
// ============================================================================

pub fn greeting_messages(persona: &Persona, compressed_memory: &str) -> Vec<ChatMessage> {
    let prompt = format!(
        "You are an assistant writing a short chatroom opening line for {name} ({desc}).\n\
         Ground it in this long-term memory:\n{compressed_memory}\n\n\
         Produce one natural, in-character greeting of at most a couple of sentences that \
         reflects the character's background or a key point from the memory.",
        name = persona.name,
        desc = persona.description,
    );
    vec![
        ChatMessage::new(PromptRole::System, "You are a creative greeting writer."),
        ChatMessage::new(PromptRole::Other, prompt),
    ]
}
