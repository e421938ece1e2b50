//! Loader utilities for building a runtime [`Story`] from serialized data.
//!
//! Story content is three JSON documents in a story directory: `config.json`
//! (declarations and settings), `story.json` (the event list), and
//! `endings.json` (endings plus the default ending). Loading is
//! all-or-nothing: if any document is missing or malformed, nothing is kept.
//!
//! Compilation lowers the raw key-probed payloads into the exhaustive
//! [`Condition`] and [`Effect`] variants the runtime matches on, splitting
//! `<name>_min` / `<name>_max` stat keys and folding the two legacy
//! inventory key spellings.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use fragments_data::{
    ConditionsDef, ConfigDef, DEFAULT_ENDING_PRIORITY, EffectsDef, EndingDef, EndingsDef, StoryDoc, StoryDocs,
};
use log::{info, warn};

use crate::condition::Condition;
use crate::effect::Effect;
use crate::ending::Ending;
use crate::event::{Choice, Event};

pub const CONFIG_FILE: &str = "config.json";
pub const STORY_FILE: &str = "story.json";
pub const ENDINGS_FILE: &str = "endings.json";

/// Immutable compiled story content. Created once at load and never
/// mutated by the engine.
#[derive(Debug, Clone)]
pub struct Story {
    pub config: ConfigDef,
    pub events: Vec<Event>,
    pub endings: Vec<Ending>,
    pub default_ending: Ending,
}

/// Read and parse the three story documents from a directory.
///
/// # Errors
/// Fails atomically if any document is missing or malformed; nothing
/// partial is ever returned.
pub fn load_story_docs(dir: &Path) -> Result<StoryDocs> {
    let config: ConfigDef = read_doc(dir, CONFIG_FILE)?;
    let story: StoryDoc = read_doc(dir, STORY_FILE)?;
    let endings: EndingsDef = read_doc(dir, ENDINGS_FILE)?;
    info!(
        "story documents loaded from {}: {} events, {} endings",
        dir.display(),
        story.events.len(),
        endings.endings.len()
    );
    Ok(StoryDocs { config, story, endings })
}

fn read_doc<T: serde::de::DeserializeOwned>(dir: &Path, file: &str) -> Result<T> {
    let path = dir.join(file);
    let raw = fs::read_to_string(&path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Lower the raw documents into runtime form.
///
/// Compilation is permissive by design: malformed stat bound keys are
/// skipped with a warning rather than rejecting the story.
pub fn compile_story(docs: &StoryDocs) -> Story {
    let events = docs
        .story
        .events
        .iter()
        .map(|def| Event {
            id: def.id.clone(),
            title: def.title.clone(),
            text: def.text.clone(),
            kind: def.kind,
            day: def.day,
            conditions: def.conditions.as_ref().map(compile_conditions).unwrap_or_default(),
            choices: def
                .choices
                .iter()
                .map(|choice| Choice {
                    text: choice.text.clone(),
                    effects: choice.effects.as_ref().map(compile_effects).unwrap_or_default(),
                })
                .collect(),
            can_repeat: def.can_repeat,
            probability: def.probability,
        })
        .collect();

    Story {
        config: docs.config.clone(),
        events,
        endings: docs.endings.endings.iter().map(compile_ending).collect(),
        default_ending: compile_ending(&docs.endings.default_ending),
    }
}

fn compile_ending(def: &EndingDef) -> Ending {
    Ending {
        id: def.id.clone(),
        title: def.title.clone(),
        priority: def.priority.unwrap_or(DEFAULT_ENDING_PRIORITY),
        conditions: def.conditions.as_ref().map(compile_conditions).unwrap_or_default(),
        content: def.content.clone(),
    }
}

/// Compile a raw condition payload into predicate variants.
pub fn compile_conditions(def: &ConditionsDef) -> Vec<Condition> {
    let mut conditions = Vec::new();

    for (key, value) in &def.stats {
        if let Some(stat) = key.strip_suffix("_min") {
            conditions.push(Condition::StatMin {
                stat: stat.to_string(),
                value: *value,
            });
        } else if let Some(stat) = key.strip_suffix("_max") {
            conditions.push(Condition::StatMax {
                stat: stat.to_string(),
                value: *value,
            });
        } else {
            warn!("stat condition key '{key}' has no _min/_max suffix; skipped");
        }
    }

    for (flag, value) in &def.flags {
        conditions.push(Condition::FlagEquals {
            flag: flag.clone(),
            value: value.clone(),
        });
    }
    for flag in &def.has_flags {
        conditions.push(Condition::FlagSet { flag: flag.clone() });
    }

    for (id, character) in &def.characters {
        if let Some(met) = character.met {
            conditions.push(Condition::CharacterMet { id: id.clone(), met });
        }
        if let Some(value) = character.relationship_min {
            conditions.push(Condition::RelationshipMin { id: id.clone(), value });
        }
        if let Some(value) = character.relationship_max {
            conditions.push(Condition::RelationshipMax { id: id.clone(), value });
        }
    }

    if let Some(day) = def.day {
        conditions.push(Condition::DayIs(day));
    }
    if let Some(day) = def.day_min {
        conditions.push(Condition::DayMin(day));
    }
    if let Some(day) = def.day_max {
        conditions.push(Condition::DayMax(day));
    }

    for id in &def.completed_events {
        conditions.push(Condition::EventCompleted(id.clone()));
    }
    for (event, choice) in &def.previous_choices {
        conditions.push(Condition::PreviousChoice {
            event: event.clone(),
            choice: *choice,
        });
    }

    if let Some(inventory) = &def.inventory {
        if let Some(amount) = inventory.money_min {
            conditions.push(Condition::MoneyMin(amount));
        }
        for item in &inventory.has_items {
            conditions.push(Condition::HasItem(item.clone()));
        }
    }

    conditions
}

/// Compile a raw effect payload into mutation variants.
pub fn compile_effects(def: &EffectsDef) -> Vec<Effect> {
    let mut effects = Vec::new();

    for (stat, delta) in &def.stats {
        effects.push(Effect::Stat {
            stat: stat.clone(),
            delta: *delta,
        });
    }
    for (flag, value) in &def.flags {
        effects.push(Effect::Flag {
            flag: flag.clone(),
            value: value.clone(),
        });
    }
    for (id, character) in &def.characters {
        effects.push(Effect::Character {
            id: id.clone(),
            relationship: character.relationship,
            met: character.met,
        });
    }

    if let Some(inventory) = &def.inventory {
        if let Some(delta) = inventory.money {
            effects.push(Effect::Money { delta });
        }
        for item in inventory.items_to_add() {
            effects.push(Effect::AddItem(item.clone()));
        }
        for item in inventory.items_to_remove() {
            effects.push(Effect::RemoveItem(item.clone()));
        }
    }

    if !def.unlock_events.is_empty() {
        effects.push(Effect::UnlockEvents(def.unlock_events.clone()));
    }
    if !def.lock_events.is_empty() {
        effects.push(Effect::LockEvents(def.lock_events.clone()));
    }
    if let Some(achievement) = def.unlocks.as_ref().and_then(|unlocks| unlocks.achievement.clone()) {
        effects.push(Effect::UnlockAchievement(achievement));
    }
    if def.trigger_next_day {
        effects.push(Effect::AdvanceDay);
    }
    if def.trigger_ending {
        effects.push(Effect::EndStory);
    }

    effects
}
