pub mod catalog;
pub mod config;
pub mod db;
pub mod engine;
pub mod error;
pub mod llm;
pub mod logging;

pub use config::ChatConfig;
pub use db::DbPool;
pub use error::AppError;
