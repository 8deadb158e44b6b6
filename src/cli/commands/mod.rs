pub mod config;
pub mod query;

pub use config::{config_command, ConfigCommands};
pub use query::{compose_command, run_command, QueryArgs};
