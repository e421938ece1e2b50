//! Interactive command loop for playing a story in the terminal.
//!
//! Presents one event at a time: the highest-priority available event is
//! shown with its numbered choices, and anything that is not a number is
//! treated as a system command (save, load, saves, help, quit). The loop
//! short-circuits on the day-advance and story-end triggers reported by
//! the engine.

use std::path::Path;

use anyhow::Result;
use colored::Colorize;
use fragments_data::FlagValue;
use log::info;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use textwrap::{fill, termwidth};

use crate::effect::EffectsReport;
use crate::ending::Ending;
use crate::engine::StoryEngine;
use crate::event::Event;
use crate::save_files::{self, AUTO_SAVE_SLOT};

/// Control flow signal from command handling back to the loop.
enum ReplControl {
    Continue,
    Quit,
}

fn text_width() -> usize {
    termwidth().min(84)
}

fn flag_text(value: &FlagValue) -> String {
    match value {
        FlagValue::Bool(b) => b.to_string(),
        FlagValue::Number(n) => n.to_string(),
        FlagValue::Text(s) => s.clone(),
    }
}

/// Run the play loop until the story ends or the player quits.
///
/// `save_root` is the directory save slots live under; each story gets its
/// own subdirectory keyed by story id.
///
/// # Errors
/// Propagates engine and terminal I/O failures. Save and load problems are
/// reported to the player instead of ending the session.
pub fn run_repl(engine: &mut StoryEngine, save_root: &Path) -> Result<()> {
    let mut editor = DefaultEditor::new()?;
    let save_dir = save_files::save_dir_for_story(save_root, &engine.story().config.story.id);

    if engine.state().is_none() {
        engine.init_game();
    }

    println!(
        "\n{}",
        engine.story().config.story.title.bright_yellow().underline()
    );

    loop {
        let events = engine.available_events()?;
        let Some(event) = events.first() else {
            let ending = engine.resolve_ending()?;
            show_ending(ending);
            break;
        };
        let event = event.clone();

        show_event(engine, &event);

        let line = match editor.readline("\n> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) => {
                println!("{}", "(use 'quit' to leave the story)".dimmed());
                continue;
            },
            Err(ReadlineError::Eof) => "quit".to_string(),
            Err(err) => return Err(err.into()),
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }
        let _ = editor.add_history_entry(input);

        if let Ok(number) = input.parse::<usize>() {
            if number == 0 || number > event.choices.len() {
                println!("{}", format!("Pick a number between 1 and {}.", event.choices.len()).red());
                continue;
            }
            let report = engine.make_choice(&event.id, number - 1)?;
            show_report(&report);
            if report.story_ended {
                let ending = engine.resolve_ending()?;
                show_ending(ending);
                break;
            }
            if engine.settings().auto_save {
                auto_save(engine, &save_dir);
            }
            continue;
        }

        if let ReplControl::Quit = handle_command(engine, &save_dir, input)? {
            break;
        }
    }

    Ok(())
}

fn show_event(engine: &StoryEngine, event: &Event) {
    let day = engine.state().map_or(1, |state| state.current_day);
    println!("\n{}", format!("Day {day}").bold().bright_blue());
    println!("{}", event.title.bold());
    if !event.text.is_empty() {
        println!("{}", fill(&event.text, text_width()));
    }
    for (index, choice) in event.choices.iter().enumerate() {
        println!("  {} {}", format!("{}.", index + 1).bright_green(), choice.text);
    }
}

fn show_report(report: &EffectsReport) {
    for (stat, change) in &report.stats {
        println!(
            "  {} {stat}: {} -> {} ({:+})",
            "*".bright_green(),
            change.old,
            change.new,
            change.change
        );
    }
    for (flag, change) in &report.flags {
        println!("  {} {flag} = {}", "*".bright_green(), flag_text(&change.new));
    }
    for (id, change) in &report.characters {
        println!(
            "  {} {id}: relationship {} -> {}",
            "*".bright_green(),
            change.old_relationship,
            change.new_relationship
        );
    }
    if let Some(money) = &report.money {
        println!("  {} money: {} -> {} ({:+})", "*".bright_green(), money.old, money.new, money.change);
    }
    for item in &report.items_added {
        println!("  {} got: {item}", "+".bright_green());
    }
    for item in &report.items_removed {
        println!("  {} lost: {item}", "-".red());
    }
    for achievement in &report.achievements {
        println!("  {} {}", "achievement unlocked:".bright_yellow(), achievement.bold());
    }
    if let Some(day) = report.next_day {
        println!("\n{}", format!("A new day begins: Day {day}").bright_blue().bold());
    }
}

fn show_ending(ending: &Ending) {
    println!("\n{}", ending.title.bright_yellow().underline());
    if !ending.content.is_empty() {
        println!("{}", fill(&ending.content, text_width()));
    }
    println!("\n{}", "The End".bold());
}

fn handle_command(engine: &mut StoryEngine, save_dir: &Path, input: &str) -> Result<ReplControl> {
    let mut parts = input.split_whitespace();
    let command = parts.next().unwrap_or_default().to_lowercase();
    let slot = parts.next().and_then(|raw| raw.parse::<u32>().ok());

    match command.as_str() {
        "quit" | "q" | "exit" => {
            if engine.settings().auto_save {
                auto_save(engine, save_dir);
            }
            println!("Goodbye.");
            return Ok(ReplControl::Quit);
        },
        "save" => {
            let slot = slot.unwrap_or(1);
            if slot > engine.settings().save_slots {
                println!("{}", format!("Slots go up to {}.", engine.settings().save_slots).red());
            } else if let Some(state) = engine.state() {
                let version = engine.story().config.story.version.clone();
                match save_files::save_to_slot(state, &version, save_dir, slot) {
                    Ok(_) => println!("Saved to slot {slot}."),
                    Err(err) => println!("{}", format!("Save failed: {err:#}").red()),
                }
            }
        },
        "load" => {
            let slot = slot.unwrap_or(1);
            let story_id = engine.story().config.story.id.clone();
            match save_files::load_from_slot(save_dir, &story_id, slot) {
                Ok(state) => {
                    engine.restore_state(state)?;
                    info!("restored save slot {slot}");
                    println!("Loaded slot {slot}.");
                },
                Err(err) => println!("{}", format!("Load failed: {err:#}").red()),
            }
        },
        "saves" => {
            let story_id = engine.story().config.story.id.clone();
            match save_files::list_saves(save_dir, &story_id, engine.settings().save_slots) {
                Ok(slots) if slots.is_empty() => println!("No saves yet."),
                Ok(slots) => {
                    for info in slots {
                        let label = if info.slot == AUTO_SAVE_SLOT { "auto" } else { "slot" };
                        println!("  {label} {}: day {} ({})", info.slot, info.day, info.saved_at);
                    }
                },
                Err(err) => println!("{}", format!("Could not list saves: {err:#}").red()),
            }
        },
        "help" | "?" => {
            println!("Enter a choice number, or: save [slot], load [slot], saves, quit");
        },
        other => {
            println!("{}", format!("Unknown command '{other}'. Try 'help'.").red());
        },
    }
    Ok(ReplControl::Continue)
}

fn auto_save(engine: &StoryEngine, save_dir: &Path) {
    let Some(state) = engine.state() else { return };
    let version = &engine.story().config.story.version;
    if let Err(err) = save_files::save_to_slot(state, version, save_dir, AUTO_SAVE_SLOT) {
        println!("{}", format!("Auto-save failed: {err:#}").red());
    }
}
