//! Integration tests for the durable memory stores: reopening the
//! database must yield exactly what was durably written, in order.

use std::path::PathBuf;

use parlor::db::repos::{compressed, detailed};

fn temp_data_dir(tag: &str) -> PathBuf {
    let nanos = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("parlor_it_{tag}_{nanos}"))
}

#[test]
fn detailed_log_survives_reopen_without_loss_or_duplication() {
    let dir = temp_data_dir("detailed");

    {
        let pool = parlor::db::init_db(&dir).unwrap();
        for i in 1..=4 {
            detailed::append(&pool, "Ava", &format!("note {i}")).unwrap();
        }
    }

    // fresh pool over the same file, as after a process restart
    let pool = parlor::db::init_db(&dir).unwrap();
    let entries = detailed::read_all(&pool, "Ava").unwrap();
    let contents: Vec<&str> = entries.iter().map(|e| e.content.as_str()).collect();
    assert_eq!(contents, vec!["note 1", "note 2", "note 3", "note 4"]);

    // appends after reopen continue the same sequence
    detailed::append(&pool, "Ava", "note 5").unwrap();
    assert_eq!(detailed::count(&pool, "Ava").unwrap(), 5);
}

#[test]
fn compressed_memory_round_trips_across_reopen() {
    let dir = temp_data_dir("compressed");

    {
        let pool = parlor::db::init_db(&dir).unwrap();
        compressed::write(&pool, "Ava", "I am Ava and I remember this.").unwrap();
    }

    let pool = parlor::db::init_db(&dir).unwrap();
    assert_eq!(
        compressed::read(&pool, "Ava").unwrap(),
        "I am Ava and I remember this."
    );
    // reading does not mutate
    assert_eq!(
        compressed::read(&pool, "Ava").unwrap(),
        "I am Ava and I remember this."
    );
}
