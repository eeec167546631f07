pub mod cli;
pub mod config;
pub mod cron;
pub mod db;
pub mod engine;
pub mod error;
pub mod notify;
pub mod providers;
pub mod types;
pub mod utils;

pub use engine::Engine;
pub use error::SlotbotError;
