use std::collections::VecDeque;

use crate::catalog::Persona;

/// An agent's session-local working memory: one fixed identity line
/// plus a bounded list of recent notes. The identity line is stored
/// apart from the notes, so no eviction can ever touch it.
#[derive(Debug, Clone)]
pub struct WorkingMemory {
    identity: String,
    notes: VecDeque<String>,
    capacity: usize,
}

impl WorkingMemory {
    /// Seed from the persona: identity line only, no notes yet.
    pub fn seed(persona: &Persona, capacity: usize) -> Self {
        Self {
            identity: format!(
                "Initial memory: my name is {}. {}",
                persona.name, persona.background
            ),
            notes: VecDeque::new(),
            capacity: capacity.max(1),
        }
    }

    /// Append a note, evicting the oldest notes until the bound holds.
    pub fn apply_update(&mut self, note: impl Into<String>) {
        self.notes.push_back(note.into());
        while self.notes.len() > self.capacity {
            self.notes.pop_front();
        }
    }

    pub fn identity(&self) -> &str {
        &self.identity
    }

    pub fn notes(&self) -> impl Iterator<Item = &str> {
        self.notes.iter().map(String::as_str)
    }

    pub fn note_count(&self) -> usize {
        self.notes.len()
    }

    /// The prompt-visible text: identity line, then notes in order.
    pub fn render(&self) -> String {
        let mut out = self.identity.clone();
        for note in &self.notes {
            out.push('\n');
            out.push_str(note);
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Persona;

    fn ava() -> Persona {
        Persona {
            name: "Ava".into(),
            description: "A physician.".into(),
            background: "Internal medicine.".into(),
            greeting: "Hello.".into(),
            avatar: None,
        }
    }

    #[test]
    fn seed_is_identity_only() {
        let wm = WorkingMemory::seed(&ava(), 3);
        assert_eq!(wm.identity(), "Initial memory: my name is Ava. Internal medicine.");
        assert_eq!(wm.note_count(), 0);
        assert_eq!(wm.render(), wm.identity());
    }

    #[test]
    fn oldest_note_is_evicted_at_capacity() {
        // Fresh session, capacity 3: after A1..A4 the notes are A2..A4.
        let mut wm = WorkingMemory::seed(&ava(), 3);
        for note in ["A1", "A2", "A3", "A4"] {
            wm.apply_update(note);
        }
        let notes: Vec<&str> = wm.notes().collect();
        assert_eq!(notes, vec!["A2", "A3", "A4"]);
        // identity untouched by any amount of churn
        assert!(wm.render().starts_with("Initial memory: my name is Ava."));
    }

    #[test]
    fn render_orders_identity_then_notes() {
        let mut wm = WorkingMemory::seed(&ava(), 5);
        wm.apply_update("first");
        wm.apply_update("second");
        let rendered = wm.render();
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[1], "first");
        assert_eq!(lines[2], "second");
    }
}
