use serde::{Deserialize, Serialize};

use crate::config::gen;
use crate::error::AppError;
use crate::llm::{ChatMessage, LanguageModel, PromptRole};

// ============================================================================
// Personas
// ============================================================================

/// A persona-driven chatroom participant. Owned by the catalog and
/// referenced by name everywhere else, so nothing can drift out of sync
/// with an embedded copy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Persona {
    pub name: String,
    pub description: String,
    pub background: String,
    pub greeting: String,
    pub avatar: Option<String>,
}

impl Persona {
    /// Avatar URL; seed-based default when the record carries none.
    pub fn avatar_url(&self) -> String {
        self.avatar.clone().unwrap_or_else(|| {
            format!("https://api.dicebear.com/9.x/personas/svg?seed={}", self.name)
        })
    }
}

/// A named preset roster.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PersonaGroup {
    pub name: String,
    pub description: String,
    pub personas: Vec<String>,
}

// ============================================================================
// Catalog
// ============================================================================

/// The persona catalog. All mutation goes through `register`, which
/// validates and rejects duplicate names, so catalog changes stay
/// auditable and independent of session state.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    personas: Vec<Persona>,
    groups: Vec<PersonaGroup>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shipped roster and its preset groups.
    pub fn builtin() -> Self {
        let mut catalog = Self::new();
        for persona in builtin_personas() {
            // Builtin names are distinct; a collision here is a
            // programming error worth failing loudly over in tests.
            catalog
                .register(persona)
                .unwrap_or_else(|e| panic!("builtin catalog invalid: {e}"));
        }
        catalog.groups = builtin_groups();
        catalog
    }

    /// Register a persona. Rejects blank required fields and duplicate
    /// names (case-insensitive, since speaker matching is
    /// case-insensitive everywhere else).
    pub fn register(&mut self, persona: Persona) -> Result<(), AppError> {
        if persona.name.trim().is_empty() {
            return Err(AppError::Validation("Persona name cannot be empty".into()));
        }
        if persona.description.trim().is_empty() {
            return Err(AppError::Validation("Persona description cannot be empty".into()));
        }
        if self
            .personas
            .iter()
            .any(|p| p.name.eq_ignore_ascii_case(&persona.name))
        {
            return Err(AppError::Validation(format!(
                "Persona '{}' already registered",
                persona.name
            )));
        }
        tracing::info!(name = %persona.name, "Persona registered");
        self.personas.push(persona);
        Ok(())
    }

    pub fn get(&self, name: &str) -> Option<&Persona> {
        self.personas.iter().find(|p| p.name == name)
    }

    pub fn names(&self) -> Vec<String> {
        self.personas.iter().map(|p| p.name.clone()).collect()
    }

    pub fn personas(&self) -> &[Persona] {
        &self.personas
    }

    pub fn groups(&self) -> &[PersonaGroup] {
        &self.groups
    }

    pub fn group(&self, name: &str) -> Option<&PersonaGroup> {
        self.groups.iter().find(|g| g.name == name)
    }
}

// ============================================================================
// LLM-assisted persona drafting
// ============================================================================

/// Sentinel the drafting prompt demands when the free text does not
/// describe a usable character.
const INVALID_INPUT: &str = "INVALID_INPUT";

/// Turn free-text character notes into a `Persona` via the model.
///
/// The model is asked for a strict JSON object; anything else — the
/// refusal sentinel, unparseable output, missing fields — comes back as
/// a `Validation` error so the caller can warn and move on.
pub async fn draft_persona(llm: &dyn LanguageModel, notes: &str) -> Result<Persona, AppError> {
    if notes.trim().is_empty() {
        return Err(AppError::Validation("Persona description is empty".into()));
    }

    let prompt = format!(
        "You turn a user's character notes into a persona record with this exact JSON shape:\n\
         {{\n  \"name\": \"...\",\n  \"description\": \"role and personality\",\n  \
         \"background\": \"education, experience, or expertise\",\n  \
         \"greeting\": \"how they open a chatroom conversation\"\n}}\n\n\
         User notes:\n{notes}\n\n\
         Extract the key information and produce one persona matching that shape. Keep it \
         concise and in character; the greeting should be natural and tied to the background. \
         Return only the JSON object, no commentary. If the notes do not contain enough to \
         build a character, return exactly the string '{INVALID_INPUT}'."
    );
    let messages = [
        ChatMessage::new(PromptRole::System, "You extract and format structured information."),
        ChatMessage::new(PromptRole::Other, prompt),
    ];

    let raw = llm.complete(&messages, gen::PERSONA_DRAFT).await?;
    parse_drafted_persona(&raw)
}

/// Parse the model's drafting output into a `Persona`.
pub fn parse_drafted_persona(raw: &str) -> Result<Persona, AppError> {
    let raw = raw.trim();
    if raw == INVALID_INPUT {
        return Err(AppError::Validation(
            "Not enough character detail to build a persona".into(),
        ));
    }

    // Models wrap JSON in prose or fences often enough that slicing to
    // the outermost braces is the practical parse.
    let start = raw.find('{');
    let end = raw.rfind('}');
    let json = match (start, end) {
        (Some(s), Some(e)) if e > s => &raw[s..=e],
        _ => {
            return Err(AppError::Validation(
                "Persona draft response contained no JSON object".into(),
            ))
        }
    };

    let mut persona: Persona = serde_json::from_str(json)
        .map_err(|e| AppError::Validation(format!("Persona draft was not valid JSON: {e}")))?;
    if persona.name.trim().is_empty()
        || persona.description.trim().is_empty()
        || persona.background.trim().is_empty()
        || persona.greeting.trim().is_empty()
    {
        return Err(AppError::Validation(
            "Persona draft is missing required fields".into(),
        ));
    }
    if persona.avatar.is_none() {
        persona.avatar = Some(format!(
            "https://api.dicebear.com/9.x/personas/svg?seed={}",
            persona.name
        ));
    }
    Ok(persona)
}

// ============================================================================
// Builtin roster
// ============================================================================

fn persona(name: &str, description: &str, background: &str, greeting: &str) -> Persona {
    Persona {
        name: name.into(),
        description: description.into(),
        background: background.into(),
        greeting: greeting.into(),
        avatar: None,
    }
}

fn builtin_personas() -> Vec<Persona> {
    vec![
        persona(
            "Ava",
            "A warm, detail-oriented physician who grounds every discussion in evidence.",
            "Fifteen years in internal medicine, with a side interest in public health communication.",
            "Hello everyone — Ava here. What are we looking into today?",
        ),
        persona(
            "Felix",
            "A pragmatic backend engineer who distrusts hype and loves a good benchmark.",
            "A decade of building distributed systems; maintains two open-source storage libraries.",
            "Hey. Felix. Happy to dig into anything technical.",
        ),
        persona(
            "Maya",
            "An energetic product manager who keeps conversations focused on user outcomes.",
            "Shipped consumer apps at three startups; ex-designer, so she sketches while she talks.",
            "Hi all! Maya — what problem are we solving for whom?",
        ),
        persona(
            "Iris",
            "A careful data scientist who wants to see the distribution before the conclusion.",
            "PhD in statistics, then five years of applied ML in healthcare and logistics.",
            "Hello. Iris. Show me the data and I'll show you what it does and doesn't say.",
        ),
        persona(
            "Nova",
            "A playful singer-songwriter who brings metaphor and left-field ideas to any topic.",
            "Toured small venues for years; writes lyrics daily and reads more sci-fi than is healthy.",
            "Hey hey! Nova in the room — someone give me a theme and I'll riff on it.",
        ),
        persona(
            "Sage",
            "A dry-witted security analyst who assumes everything is broken until proven otherwise.",
            "Former red-teamer; now reviews architectures and writes incident post-mortems.",
            "Sage here. Before we start: who has access to this room, and why?",
        ),
    ]
}

fn builtin_groups() -> Vec<PersonaGroup> {
    let group = |name: &str, description: &str, personas: &[&str]| PersonaGroup {
        name: name.into(),
        description: description.into(),
        personas: personas.iter().map(|s| s.to_string()).collect(),
    };
    vec![
        group(
            "free-for-all",
            "A lively, varied mix for casual conversation.",
            &["Ava", "Felix", "Maya", "Nova", "Sage"],
        ),
        group(
            "work",
            "Focused on professional topics, planning, and execution.",
            &["Ava", "Maya", "Felix", "Iris"],
        ),
        group(
            "creative",
            "A combination that sparks brainstorming and new ideas.",
            &["Nova", "Maya", "Iris"],
        ),
        group(
            "tech",
            "Deep dives into engineering, data, and security.",
            &["Felix", "Iris", "Sage"],
        ),
    ]
}
