//! The turn engine: advance the conversation by one agent turn —
//! select a speaker, generate the reply, update that agent's memory —
//! plus the opening greeting and the resumable automatic-run loop.

use rand::seq::SliceRandom;
use rand::Rng;

use crate::catalog::Catalog;
use crate::config::{gen, ChatConfig};
use crate::db::repos::compressed;
use crate::db::DbPool;
use crate::error::AppError;
use crate::llm::LanguageModel;

use super::state::{AutoRun, ConversationState};
use super::{director, prompt, summarizer, updater};

/// Result of one turn-engine cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnOutcome {
    /// No agents in the room; nothing happened.
    NoAgents,
    Spoke { speaker: String },
}

/// Run exactly one agent turn: director → reply → memory update.
///
/// Transport failures degrade (the chosen agent posts an in-character
/// placeholder and the turn still counts); persistence failures during
/// the memory cycle halt that cycle with an error log while the
/// conversation itself continues. Persistence failures while *reading*
/// memory for the prompt propagate — composing a reply from a silently
/// emptied memory is exactly the loss the stores exist to prevent.
pub async fn run_turn<R: Rng>(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    config: &ChatConfig,
    catalog: &Catalog,
    state: &mut ConversationState,
    rng: &mut R,
) -> Result<TurnOutcome, AppError> {
    let Some(speaker) = director::next_speaker(llm, rng, state, catalog, config).await else {
        return Ok(TurnOutcome::NoAgents);
    };
    let persona = catalog
        .get(&speaker)
        .ok_or_else(|| AppError::NotFound(format!("Persona {speaker}")))?
        .clone();

    let compressed_memory = compressed::read(pool, &persona.name)?;
    let working_memory = state
        .working_or_seed(&persona, config.working_memory_capacity)
        .render();
    let window = state.recent_window(config.history_window).to_vec();
    let messages = prompt::reply_messages(
        &persona,
        &compressed_memory,
        &working_memory,
        &window,
        config.history_window,
    );

    let reply = match llm.complete(&messages, gen::REPLY).await {
        Ok(text) => text,
        Err(e) if e.is_transport() => {
            tracing::warn!(agent = %persona.name, error = %e, "Reply generation failed; posting placeholder");
            format!("({} is struggling to find the words...)", persona.name)
        }
        Err(e) => return Err(e),
    };

    state.push_message(&persona.name, reply);
    tracing::debug!(speaker = %persona.name, turn = state.total_turns, "Agent turn complete");

    if let Err(e) = updater::update_memory(llm, pool, config, state, &persona).await {
        // This cycle is halted; the agent simply remembers nothing new
        // from this turn. The transcript stands.
        tracing::error!(agent = %persona.name, error = %e, kind = e.kind(), "Memory update cycle halted");
    }

    Ok(TurnOutcome::Spoke {
        speaker: persona.name,
    })
}

/// Open an empty room: a random roster agent greets — from its
/// compressed memory when it has one (static greeting on model
/// failure), otherwise its static persona greeting — then runs its
/// first memory cycle.
pub async fn opening_turn<R: Rng>(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    config: &ChatConfig,
    catalog: &Catalog,
    state: &mut ConversationState,
    rng: &mut R,
) -> Result<TurnOutcome, AppError> {
    if !state.messages.is_empty() {
        return Err(AppError::Internal("opening_turn on a non-empty transcript".into()));
    }
    let Some(name) = state.roster.choose(rng).cloned() else {
        return Ok(TurnOutcome::NoAgents);
    };
    let persona = catalog
        .get(&name)
        .ok_or_else(|| AppError::NotFound(format!("Persona {name}")))?
        .clone();

    let compressed_memory = compressed::read(pool, &persona.name)?;
    let greeting = if compressed_memory.is_empty() {
        persona.greeting.clone()
    } else {
        let messages = prompt::greeting_messages(&persona, &compressed_memory);
        match llm.complete(&messages, gen::GREETING).await {
            Ok(text) => text,
            Err(e) if e.is_transport() => {
                tracing::warn!(agent = %persona.name, error = %e, "Greeting generation failed; using static greeting");
                persona.greeting.clone()
            }
            Err(e) => return Err(e),
        }
    };

    state.push_message(&persona.name, greeting);

    if let Err(e) = updater::update_memory(llm, pool, config, state, &persona).await {
        tracing::error!(agent = %persona.name, error = %e, kind = e.kind(), "Memory update cycle halted");
    }

    Ok(TurnOutcome::Spoke {
        speaker: persona.name,
    })
}

/// Run automatic turns until `auto` reports done, interleaving the
/// summarization check after each turn. Progress lives in `auto`, so an
/// interrupted run resumes from `completed`, not from zero. `on_turn`
/// observes the state after each completed turn, with a flag saying
/// whether that turn crossed a summary boundary; callers render
/// progress through it. An empty room stops the loop early, leaving
/// `auto` short of done.
pub async fn run_auto<R: Rng>(
    llm: &dyn LanguageModel,
    pool: &DbPool,
    config: &ChatConfig,
    catalog: &Catalog,
    state: &mut ConversationState,
    rng: &mut R,
    auto: &mut AutoRun,
    mut on_turn: impl FnMut(&ConversationState, bool),
) -> Result<(), AppError> {
    while !auto.is_done() {
        match run_turn(llm, pool, config, catalog, state, rng).await? {
            TurnOutcome::NoAgents => break,
            TurnOutcome::Spoke { .. } => {
                auto.completed += 1;
                let summarized =
                    summarizer::maybe_summarize(llm, state, config.summary_interval).await;
                on_turn(state, summarized);
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_test_db;
    use crate::db::repos::detailed;
    use crate::llm::testing::{Reply, ScriptedModel};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn room(roster: &[&str]) -> ConversationState {
        ConversationState::new("User_42", roster.iter().map(|s| s.to_string()).collect())
    }

    #[tokio::test]
    async fn empty_room_is_a_noop() {
        let pool = init_test_db().unwrap();
        let llm = ScriptedModel::new(vec![]);
        let mut rng = StdRng::seed_from_u64(1);
        let mut state = room(&[]);

        let outcome = run_turn(&llm, &pool, &ChatConfig::default(), &Catalog::builtin(), &mut state, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::NoAgents);
        assert!(state.messages.is_empty());
    }

    #[tokio::test]
    async fn direct_address_turn_produces_reply_and_memory_note() {
        let pool = init_test_db().unwrap();
        // one reply call, one memory draft call
        let llm = ScriptedModel::new(vec![
            Reply::Text("The evidence points the other way."),
            Reply::Text("User_42 asked me to weigh in on the diet debate"),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = Catalog::builtin();
        let mut state = room(&["Ava", "Felix"]);
        state.push_message("User_42", "hello everyone");
        state.push_message("User_42", "Ava, is this diet claim real?");

        let outcome = run_turn(&llm, &pool, &ChatConfig::default(), &catalog, &mut state, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Spoke { speaker: "Ava".into() });

        let last = state.messages.last().unwrap();
        assert_eq!(last.speaker, "Ava");
        assert_eq!(last.content, "The evidence points the other way.");
        assert_eq!(state.last_speaker.as_deref(), Some("Ava"));

        let log = detailed::read_all(&pool, "Ava").unwrap();
        assert_eq!(log.len(), 1);
        assert!(log[0].content.contains("diet debate"));
    }

    #[tokio::test]
    async fn reply_transport_failure_degrades_to_placeholder() {
        let pool = init_test_db().unwrap();
        // reply fails; memory draft declines
        let llm = ScriptedModel::new(vec![
            Reply::Fail,
            Reply::Text("no significant update"),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = Catalog::builtin();
        let mut state = room(&["Ava"]);
        state.push_message("User_42", "hello");
        state.push_message("User_42", "Ava, are you there?");

        let outcome = run_turn(&llm, &pool, &ChatConfig::default(), &catalog, &mut state, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Spoke { speaker: "Ava".into() });
        assert_eq!(
            state.messages.last().unwrap().content,
            "(Ava is struggling to find the words...)"
        );
    }

    #[tokio::test]
    async fn opening_turn_uses_static_greeting_on_cold_store() {
        let pool = init_test_db().unwrap();
        // only the memory draft runs; greeting comes from the persona
        let llm = ScriptedModel::always("no significant update");
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = Catalog::builtin();
        let mut state = room(&["Ava"]);

        let outcome = opening_turn(&llm, &pool, &ChatConfig::default(), &catalog, &mut state, &mut rng)
            .await
            .unwrap();
        assert_eq!(outcome, TurnOutcome::Spoke { speaker: "Ava".into() });
        assert_eq!(
            state.messages[0].content,
            catalog.get("Ava").unwrap().greeting
        );
    }

    #[tokio::test]
    async fn opening_turn_grounds_greeting_in_compressed_memory() {
        let pool = init_test_db().unwrap();
        compressed::write(&pool, "Ava", "I remember long debates about evidence.").unwrap();
        let llm = ScriptedModel::new(vec![
            Reply::Text("Back again — last time we never settled that evidence debate."),
            Reply::Text("no significant update"),
        ]);
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = Catalog::builtin();
        let mut state = room(&["Ava"]);

        opening_turn(&llm, &pool, &ChatConfig::default(), &catalog, &mut state, &mut rng)
            .await
            .unwrap();
        assert!(state.messages[0].content.contains("evidence debate"));
    }

    #[tokio::test]
    async fn auto_run_is_resumable_and_summarizes_on_boundaries() {
        let pool = init_test_db().unwrap();
        // every call answered; drafts decline so no recompaction noise
        let llm = ScriptedModel::always("no significant update");
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = Catalog::builtin();
        let config = ChatConfig::default(); // N = 3
        let mut state = room(&["Ava", "Felix"]);
        state.push_message("User_42", "kick us off");

        let mut auto = AutoRun::new(5);
        // simulate a prior interruption after 2 completed turns
        auto.completed = 2;
        run_auto(&llm, &pool, &config, &catalog, &mut state, &mut rng, &mut auto, |_, _| {})
            .await
            .unwrap();

        assert!(auto.is_done());
        assert_eq!(auto.completed, 5);
        // 1 user message + 3 agent turns
        assert_eq!(state.total_turns, 4);
        // one boundary crossed (turn 3)
        assert_eq!(state.summaries.len(), 1);
    }

    #[tokio::test]
    async fn auto_run_reports_each_turn_through_the_callback() {
        let pool = init_test_db().unwrap();
        let llm = ScriptedModel::always("no significant update");
        let mut rng = StdRng::seed_from_u64(1);
        let catalog = Catalog::builtin();
        let config = ChatConfig::default(); // N = 3
        let mut state = room(&["Ava", "Felix"]);
        state.push_message("User_42", "kick us off");

        let mut turns_seen = Vec::new();
        let mut auto = AutoRun::new(3);
        run_auto(
            &llm,
            &pool,
            &config,
            &catalog,
            &mut state,
            &mut rng,
            &mut auto,
            |s, summarized| turns_seen.push((s.total_turns, summarized)),
        )
        .await
        .unwrap();

        // turns 2, 3, 4; only turn 3 crosses a summary boundary
        assert_eq!(turns_seen, vec![(2, false), (3, true), (4, false)]);
    }
}
