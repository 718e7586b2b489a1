//! CLI command implementations.

mod check;
mod config;
mod doctor;
mod generate;
mod init;
mod prompts;

pub use check::run_check;
pub use config::run_config;
pub use doctor::run_doctor;
pub use generate::{run_generate, GenerateOptions};
pub use init::run_init;
pub use prompts::run_prompts;
