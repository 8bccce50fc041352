pub mod compression;
pub mod director;
pub mod prompt;
pub mod state;
pub mod summarizer;
pub mod turn;
pub mod updater;
pub mod working;
