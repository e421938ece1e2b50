#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]

pub const FRAGMENTS_VERSION: &str = env!("CARGO_PKG_VERSION");

// Core modules
pub mod condition;
pub mod effect;
pub mod ending;
pub mod engine;
pub mod event;
pub mod loader;
pub mod repl;
pub mod save_files;
pub mod state;

// Re-exports for convenience
pub use condition::{Condition, conditions_met};
pub use effect::{Effect, EffectsReport, apply_effects};
pub use ending::{Ending, resolve_ending};
pub use engine::StoryEngine;
pub use event::{Choice, Event, available_events};
pub use loader::{Story, compile_story, load_story_docs};
pub use repl::run_repl;
pub use state::GameState;
