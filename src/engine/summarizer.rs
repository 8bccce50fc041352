//! Periodic conversation summarization: every `N` total turns, the
//! trailing `N`-message window is condensed into a standalone summary.

use crate::config::gen;
use crate::llm::LanguageModel;

use super::prompt;
use super::state::{ConversationState, SummaryRecord};

/// Appended in place of a summary when the model call fails, so the
/// summary list stays aligned with the turn boundaries it covers.
pub const FAILURE_PLACEHOLDER: &str = "(summary unavailable: the model call failed)";

/// Whether a summary is due: the turn counter sits on a positive
/// multiple of `interval` and no summary covers that boundary yet.
pub fn is_due(state: &ConversationState, interval: u64) -> bool {
    interval > 0
        && state.total_turns > 0
        && state.total_turns % interval == 0
        && (state.summaries.len() as u64) * interval < state.total_turns
}

/// Summarize the trailing window if a boundary has been reached.
/// Returns whether a summary (or failure placeholder) was appended.
/// Repeated invocation at the same boundary is a no-op.
pub async fn maybe_summarize(
    llm: &dyn LanguageModel,
    state: &mut ConversationState,
    interval: u64,
) -> bool {
    if !is_due(state, interval) {
        return false;
    }

    let window = prompt::render_transcript(state.recent_window(interval as usize));
    let messages = prompt::summary_messages(&window);

    let summary = match llm.complete(&messages, gen::SUMMARY).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Summarization failed; appending placeholder");
            FAILURE_PLACEHOLDER.to_string()
        }
    };

    tracing::info!(turn = state.total_turns, "Conversation summary recorded");
    state.summaries.push(SummaryRecord {
        turn: state.total_turns,
        text: summary,
    });
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::testing::{Reply, ScriptedModel};

    fn state_with_turns(n: u64) -> ConversationState {
        let mut state = ConversationState::new("User", vec!["Ava".into()]);
        for i in 0..n {
            state.push_message("User", format!("message {i}"));
        }
        state
    }

    #[tokio::test]
    async fn seven_turns_yield_exactly_two_summaries() {
        // N = 3: boundaries at turns 3 and 6; turn 7 is not one.
        let llm = ScriptedModel::always("a summary");
        let mut state = ConversationState::new("User", vec!["Ava".into()]);
        for i in 0..7 {
            state.push_message("User", format!("message {i}"));
            maybe_summarize(&llm, &mut state, 3).await;
        }
        assert_eq!(state.summaries.len(), 2);
        assert_eq!(llm.call_count(), 2);
    }

    #[tokio::test]
    async fn boundary_is_never_summarized_twice() {
        let llm = ScriptedModel::always("a summary");
        let mut state = state_with_turns(3);

        assert!(maybe_summarize(&llm, &mut state, 3).await);
        // repeated invocation within the same boundary
        assert!(!maybe_summarize(&llm, &mut state, 3).await);
        assert_eq!(state.summaries.len(), 1);
    }

    #[tokio::test]
    async fn not_due_off_boundary_or_at_zero() {
        let state = state_with_turns(0);
        assert!(!is_due(&state, 3));
        let state = state_with_turns(4);
        assert!(!is_due(&state, 3));
    }

    #[tokio::test]
    async fn zero_interval_means_never_due() {
        let state = state_with_turns(1);
        assert!(!is_due(&state, 0));
        let llm = ScriptedModel::always("a summary");
        let mut state = state_with_turns(3);
        assert!(!maybe_summarize(&llm, &mut state, 0).await);
    }

    #[tokio::test]
    async fn failure_appends_placeholder_to_keep_alignment() {
        let llm = ScriptedModel::new(vec![Reply::Fail, Reply::Text("real summary")]);
        let mut state = state_with_turns(3);

        assert!(maybe_summarize(&llm, &mut state, 3).await);
        assert_eq!(state.summaries[0].text, FAILURE_PLACEHOLDER);

        for i in 0..3 {
            state.push_message("User", format!("more {i}"));
        }
        assert!(maybe_summarize(&llm, &mut state, 3).await);
        assert_eq!(state.summaries.len(), 2);
        assert_eq!(state.summaries[1].text, "real summary");
    }

    #[tokio::test]
    async fn records_carry_the_turn_they_were_taken_at() {
        let llm = ScriptedModel::always("a summary");

        // first chance to summarize comes after the turn-3 boundary
        // already passed; the record is tagged with the actual turn
        let mut state = state_with_turns(6);
        assert!(maybe_summarize(&llm, &mut state, 3).await);
        assert_eq!(state.summaries[0].turn, 6);

        let mut state = state_with_turns(3);
        maybe_summarize(&llm, &mut state, 3).await;
        assert_eq!(state.summaries[0].turn, 3);
    }

    #[tokio::test]
    async fn summary_covers_only_the_trailing_window() {
        let llm = ScriptedModel::always("a summary");
        let mut state = state_with_turns(3);
        maybe_summarize(&llm, &mut state, 3).await;

        let calls = llm.calls();
        let prompt_text = &calls[0].0[1].content;
        assert!(prompt_text.contains("message 2"));
        // window is 3 messages out of 3 here; grow and check exclusion
        for i in 3..6 {
            state.push_message("User", format!("message {i}"));
        }
        maybe_summarize(&llm, &mut state, 3).await;
        let calls = llm.calls();
        let prompt_text = &calls[1].0[1].content;
        assert!(prompt_text.contains("message 5"));
        assert!(!prompt_text.contains("message 1"));
    }
}
