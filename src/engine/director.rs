//! Next-speaker selection: a layered, deterministic-then-probabilistic
//! policy. Randomness comes from an injected RNG so tests can pin it.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::config::{gen, ChatConfig};
use crate::llm::LanguageModel;

use super::prompt;
use super::state::ConversationState;

/// Pick the next speaker. Layers, in fixed order:
/// 1. fewer than 2 prior messages — uniform random among eligible;
/// 2. direct address — the latest message names an eligible agent and
///    asks a question: that agent, unconditionally;
/// 3. exploration — with probability `exploration_rate`, uniform random;
/// 4. model arbitration — ask the model for one eligible name, falling
///    back to uniform random on an unmatched answer or transport error.
///
/// Returns `None` only when no agents are in the room.
pub async fn next_speaker<R: Rng>(
    llm: &dyn LanguageModel,
    rng: &mut R,
    state: &ConversationState,
    catalog: &Catalog,
    config: &ChatConfig,
) -> Option<String> {
    if state.roster.is_empty() {
        return None;
    }

    // Anti-repetition: drop the previous speaker unless that would
    // leave nobody.
    let mut eligible: Vec<&String> = state
        .roster
        .iter()
        .filter(|name| Some(name.as_str()) != state.last_speaker.as_deref())
        .collect();
    if eligible.is_empty() {
        eligible = state.roster.iter().collect();
    }

    if state.messages.len() < 2 {
        return eligible.choose(rng).map(|s| s.to_string());
    }

    // Direct address beats everything, first match in roster order.
    if let Some(last) = state.messages.last() {
        let last_content = last.content.to_lowercase();
        if last_content.contains('?') {
            for name in &eligible {
                if last_content.contains(&name.to_lowercase()) {
                    tracing::debug!(speaker = %name, "Direct address — speaker chosen");
                    return Some(name.to_string());
                }
            }
        }
    }

    // Exploration keeps quieter agents reachable no matter what the
    // arbitration model thinks.
    if rng.gen::<f64>() < config.exploration_rate {
        return eligible.choose(rng).map(|s| s.to_string());
    }

    match arbitrate(llm, state, catalog, config, &eligible).await {
        Some(name) => Some(name),
        None => eligible.choose(rng).map(|s| s.to_string()),
    }
}

/// Ask the model to arbitrate. `None` means "fall back to random":
/// either the transport failed or the answer named nobody eligible.
async fn arbitrate(
    llm: &dyn LanguageModel,
    state: &ConversationState,
    catalog: &Catalog,
    config: &ChatConfig,
    eligible: &[&String],
) -> Option<String> {
    let described: Vec<(String, String)> = eligible
        .iter()
        .map(|name| {
            let desc = catalog
                .get(name)
                .map(|p| p.description.chars().take(50).collect())
                .unwrap_or_default();
            (name.to_string(), desc)
        })
        .collect();

    let window = prompt::render_transcript(state.recent_window(config.history_window));
    let last_speaker = state.last_speaker.as_deref().unwrap_or("nobody");
    let messages = prompt::arbitration_messages(&described, &window, last_speaker);

    let suggestion = match llm.complete(&messages, gen::ARBITRATION).await {
        Ok(text) => text,
        Err(e) => {
            tracing::warn!(error = %e, kind = e.kind(), "Speaker arbitration failed; falling back to random");
            return None;
        }
    };

    let suggestion = suggestion.to_lowercase();
    eligible
        .iter()
        .find(|name| suggestion.contains(&name.to_lowercase()))
        .map(|name| name.to_string())
}
