//! Property tests for the working-memory bound: no sequence of updates
//! may grow the note list past its capacity or touch the identity line.

use proptest::prelude::*;

use parlor::catalog::Persona;
use parlor::engine::working::WorkingMemory;

fn test_persona() -> Persona {
    Persona {
        name: "Ava".into(),
        description: "A physician.".into(),
        background: "Internal medicine.".into(),
        greeting: "Hello.".into(),
        avatar: None,
    }
}

proptest! {
    #[test]
    fn note_count_never_exceeds_capacity(
        notes in prop::collection::vec("[a-zA-Z0-9 .,!]{0,60}", 0..120),
        capacity in 1usize..24,
    ) {
        let persona = test_persona();
        let mut wm = WorkingMemory::seed(&persona, capacity);
        for note in &notes {
            wm.apply_update(note.clone());
            prop_assert!(wm.note_count() <= capacity);
        }
    }

    #[test]
    fn identity_line_survives_any_churn(
        notes in prop::collection::vec("[a-zA-Z0-9 ]{1,40}", 1..80),
        capacity in 1usize..8,
    ) {
        let persona = test_persona();
        let mut wm = WorkingMemory::seed(&persona, capacity);
        let identity = wm.identity().to_string();
        for note in &notes {
            wm.apply_update(note.clone());
        }
        prop_assert_eq!(wm.identity(), identity.as_str());
        prop_assert!(wm.render().starts_with(&identity));
    }

    #[test]
    fn retained_notes_are_the_most_recent_in_order(
        notes in prop::collection::vec("[a-z]{1,12}", 1..60),
        capacity in 1usize..10,
    ) {
        let persona = test_persona();
        let mut wm = WorkingMemory::seed(&persona, capacity);
        for note in &notes {
            wm.apply_update(note.clone());
        }
        let expected: Vec<&str> = notes
            .iter()
            .rev()
            .take(capacity)
            .rev()
            .map(String::as_str)
            .collect();
        let actual: Vec<&str> = wm.notes().collect();
        prop_assert_eq!(actual, expected);
    }
}
