//! Mutable per-playthrough state.
//!
//! A [`GameState`] is created by the engine from story defaults and is
//! mutated exclusively by effect application and the day/choice bookkeeping
//! around it. Condition evaluation only ever reads it.

use fragments_data::{ConfigDef, FlagValue, Id};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use time::OffsetDateTime;
use time::format_description::well_known::Rfc3339;

/// NPC record tracked per playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CharacterState {
    #[serde(default)]
    pub name: String,
    pub relationship: i64,
    pub met: bool,
}

/// One-time unlockable tracked per playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AchievementState {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub unlocked: bool,
}

/// Player inventory. Item membership has set semantics; money has no floor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Inventory {
    pub items: BTreeSet<Id>,
    pub money: i64,
}

/// One entry in the play-ordered choice history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChoiceRecord {
    pub event: Id,
    pub choice: usize,
    #[serde(default)]
    pub recorded_at: String,
}

/// Complete state of one playthrough.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct GameState {
    pub story_id: Id,
    pub current_day: u32,
    pub stats: BTreeMap<String, i64>,
    pub flags: BTreeMap<String, FlagValue>,
    pub characters: BTreeMap<String, CharacterState>,
    pub inventory: Inventory,
    /// Append-only, except that `lock_events` effects may remove entries.
    pub completed_events: Vec<Id>,
    /// Append-only, total-ordered by play order.
    pub choices_history: Vec<ChoiceRecord>,
    pub achievements: BTreeMap<String, AchievementState>,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub last_played: String,
}

impl GameState {
    /// Build a fresh state from story defaults.
    pub fn new_game(config: &ConfigDef) -> GameState {
        let now = now_rfc3339();
        GameState {
            story_id: config.story.id.clone(),
            current_day: config.story.starting_day,
            stats: config
                .stats
                .iter()
                .map(|(name, def)| (name.clone(), def.start))
                .collect(),
            flags: config.flags.clone(),
            characters: config
                .characters
                .iter()
                .map(|(id, def)| {
                    (
                        id.clone(),
                        CharacterState {
                            name: def.name.clone(),
                            relationship: def.relationship,
                            met: def.met,
                        },
                    )
                })
                .collect(),
            inventory: Inventory {
                items: config.inventory.initial_items.iter().cloned().collect(),
                money: config.inventory.money,
            },
            completed_events: Vec::new(),
            choices_history: Vec::new(),
            achievements: config
                .achievements
                .iter()
                .map(|(id, def)| {
                    (
                        id.clone(),
                        AchievementState {
                            title: def.title.clone(),
                            description: def.description.clone(),
                            unlocked: false,
                        },
                    )
                })
                .collect(),
            created_at: now.clone(),
            last_played: now,
        }
    }

    pub fn has_completed(&self, event_id: &str) -> bool {
        self.completed_events.iter().any(|id| id == event_id)
    }

    /// First recorded choice index for an event, scanning in play order.
    pub fn first_choice_for(&self, event_id: &str) -> Option<usize> {
        self.choices_history
            .iter()
            .find(|record| record.event == event_id)
            .map(|record| record.choice)
    }

    pub fn touch(&mut self) {
        self.last_played = now_rfc3339();
    }
}

/// Current UTC time as an RFC3339 string for save metadata.
pub fn now_rfc3339() -> String {
    OffsetDateTime::now_utc().format(&Rfc3339).unwrap_or_default()
}
