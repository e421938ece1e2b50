#![warn(clippy::pedantic)]
#![allow(clippy::must_use_candidate)]
//! ** Fragments **
//! Interactive fiction rules engine and terminal player

use std::path::PathBuf;

use anyhow::{Context, Result};
use colored::Colorize;
use fragments_data::Severity;
use fragments_engine::engine::StoryEngine;
use fragments_engine::save_files::SAVE_DIR;
use fragments_engine::{load_story_docs, run_repl};
use log::info;

fn main() -> Result<()> {
    env_logger::init();

    let story_dir: PathBuf = std::env::args()
        .nth(1)
        .context("usage: fragments_engine <story-dir>")?
        .into();
    info!("Start: loading story from {}", story_dir.display());

    let docs = load_story_docs(&story_dir).context("while loading story documents")?;
    let (mut engine, issues) = StoryEngine::new(docs).context("while building the story engine")?;

    for issue in &issues {
        let line = issue.to_string();
        match issue.severity() {
            Severity::Danger => eprintln!("{} {line}", "danger:".red().bold()),
            Severity::Warning => eprintln!("{} {line}", "warning:".yellow()),
        }
    }
    info!("story '{}' ready", engine.story().config.story.id);

    let save_root = story_dir.join(SAVE_DIR);
    run_repl(&mut engine, &save_root)
}
