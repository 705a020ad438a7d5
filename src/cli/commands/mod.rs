//! CLI command implementations.

mod chunk;
mod config;
mod doctor;
mod notes;
mod title;

pub use chunk::run_chunk;
pub use config::run_config;
pub use doctor::run_doctor;
pub use notes::{run_notes, NotesOptions};
pub use title::run_title;
