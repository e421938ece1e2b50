//! effect.rs -- `Effect` Module
//!
//! Compiled state mutations carried by a choice. Applying a batch of
//! effects is the only operation that mutates [`GameState`]; it returns an
//! [`EffectsReport`] so callers can render what changed without re-reading
//! state.

use fragments_data::{FlagValue, Id, StatDef};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::state::GameState;

/// Relationship scores are always clamped to this range.
pub const RELATIONSHIP_MIN: i64 = -100;
pub const RELATIONSHIP_MAX: i64 = 100;

/// A single compiled state mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Effect {
    Stat { stat: String, delta: i64 },
    Flag { flag: String, value: FlagValue },
    Character { id: Id, relationship: Option<i64>, met: Option<bool> },
    Money { delta: i64 },
    AddItem(Id),
    RemoveItem(Id),
    UnlockEvents(Vec<Id>),
    LockEvents(Vec<Id>),
    UnlockAchievement(Id),
    AdvanceDay,
    EndStory,
}

/// Stat mutation summary for one stat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatChange {
    pub old: i64,
    pub change: i64,
    pub new: i64,
}

/// Flag mutation summary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlagChange {
    pub old: Option<FlagValue>,
    pub new: FlagValue,
}

/// Character mutation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterChange {
    pub old_relationship: i64,
    pub new_relationship: i64,
    pub met: bool,
}

/// Money mutation summary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoneyChange {
    pub old: i64,
    pub change: i64,
    pub new: i64,
}

/// Structured diff of everything a batch of effects changed.
///
/// `next_day` and `story_ended` are the two short-circuit triggers: the
/// caller must check both before presenting the next event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EffectsReport {
    pub stats: BTreeMap<String, StatChange>,
    pub flags: BTreeMap<String, FlagChange>,
    pub characters: BTreeMap<String, CharacterChange>,
    pub money: Option<MoneyChange>,
    pub items_added: Vec<Id>,
    pub items_removed: Vec<Id>,
    pub unlocked_events: Vec<Id>,
    pub locked_events: Vec<Id>,
    pub achievements: Vec<Id>,
    pub next_day: Option<u32>,
    pub story_ended: bool,
}

/// Apply a batch of effects to game state.
///
/// Runs to completion synchronously; references to undeclared stats,
/// characters, achievements, or absent items are tolerated and skipped.
/// Stat results are clamped to the configured bounds in `stat_defs`.
pub fn apply_effects(effects: &[Effect], state: &mut GameState, stat_defs: &BTreeMap<String, StatDef>) -> EffectsReport {
    let mut report = EffectsReport::default();
    for effect in effects {
        apply_one(effect, state, stat_defs, &mut report);
    }
    report
}

fn apply_one(effect: &Effect, state: &mut GameState, stat_defs: &BTreeMap<String, StatDef>, report: &mut EffectsReport) {
    match effect {
        Effect::Stat { stat, delta } => {
            let Some(current) = state.stats.get_mut(stat) else {
                debug!("stat effect on undeclared stat '{stat}' skipped");
                return;
            };
            let old = *current;
            let mut new = old + delta;
            if let Some(def) = stat_defs.get(stat) {
                new = new.clamp(def.min, def.max);
            }
            *current = new;
            report.stats.insert(
                stat.clone(),
                StatChange {
                    old,
                    change: *delta,
                    new,
                },
            );
        },
        Effect::Flag { flag, value } => {
            let old = state.flags.get(flag).cloned();
            // Numeric-on-numeric adds; anything else replaces. A quirk of
            // the content format that authors rely on for counters.
            let new = match (old.as_ref().and_then(FlagValue::as_number), value.as_number()) {
                (Some(current), Some(delta)) => FlagValue::Number(current + delta),
                _ => value.clone(),
            };
            state.flags.insert(flag.clone(), new.clone());
            report.flags.insert(flag.clone(), FlagChange { old, new });
        },
        Effect::Character { id, relationship, met } => {
            let Some(character) = state.characters.get_mut(id) else {
                debug!("character effect on undeclared character '{id}' skipped");
                return;
            };
            let old_relationship = character.relationship;
            if let Some(delta) = relationship {
                character.relationship = (character.relationship + delta).clamp(RELATIONSHIP_MIN, RELATIONSHIP_MAX);
            }
            if let Some(met) = met {
                character.met = *met;
            }
            report.characters.insert(
                id.clone(),
                CharacterChange {
                    old_relationship,
                    new_relationship: character.relationship,
                    met: character.met,
                },
            );
        },
        Effect::Money { delta } => {
            let old = state.inventory.money;
            state.inventory.money += delta;
            report.money = Some(MoneyChange {
                old,
                change: *delta,
                new: state.inventory.money,
            });
        },
        Effect::AddItem(id) => {
            if state.inventory.items.insert(id.clone()) {
                report.items_added.push(id.clone());
            }
        },
        Effect::RemoveItem(id) => {
            if state.inventory.items.remove(id) {
                report.items_removed.push(id.clone());
            }
        },
        Effect::UnlockEvents(ids) => {
            // Informational only: availability is re-derived from conditions
            // on every call, never from a persistent unlocked set.
            report.unlocked_events.extend(ids.iter().cloned());
        },
        Effect::LockEvents(ids) => {
            report.locked_events.extend(ids.iter().cloned());
            state.completed_events.retain(|completed| !ids.contains(completed));
        },
        Effect::UnlockAchievement(id) => {
            let Some(achievement) = state.achievements.get_mut(id) else {
                debug!("achievement effect on undeclared achievement '{id}' skipped");
                return;
            };
            if !achievement.unlocked {
                achievement.unlocked = true;
                report.achievements.push(id.clone());
            }
        },
        Effect::AdvanceDay => {
            state.current_day += 1;
            report.next_day = Some(state.current_day);
        },
        Effect::EndStory => {
            report.story_ended = true;
        },
    }
}
