use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Stable identifier used across story document references.
pub type Id = String;

/// The three story documents loaded together by the engine.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoryDocs {
    pub config: ConfigDef,
    pub story: StoryDoc,
    pub endings: EndingsDef,
}

/// Story configuration: declarations, starting values, and settings.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConfigDef {
    pub story: StoryMetaDef,
    #[serde(default)]
    pub stats: BTreeMap<String, StatDef>,
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterDef>,
    #[serde(default)]
    pub achievements: BTreeMap<String, AchievementDef>,
    #[serde(default)]
    pub inventory: InventoryDef,
    #[serde(default)]
    pub settings: SettingsDef,
}

/// Story-level metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoryMetaDef {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_starting_day")]
    pub starting_day: u32,
}

impl Default for StoryMetaDef {
    fn default() -> Self {
        Self {
            id: String::new(),
            title: String::new(),
            version: String::new(),
            starting_day: default_starting_day(),
        }
    }
}

/// Bounded integer player attribute declaration.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default)]
pub struct StatDef {
    pub min: i64,
    pub max: i64,
    #[serde(default)]
    pub start: i64,
}

/// Loosely-typed flag value. The type is whatever the initial value's type was.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FlagValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

impl FlagValue {
    /// Numeric view of the value, when it has one.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            FlagValue::Number(n) => Some(*n),
            _ => None,
        }
    }

    /// Truthiness used by `has_flags` conditions: false, 0, and "" are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            FlagValue::Bool(b) => *b,
            FlagValue::Number(n) => *n != 0.0,
            FlagValue::Text(s) => !s.is_empty(),
        }
    }
}

/// NPC declaration with starting relationship state.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterDef {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub relationship: i64,
    #[serde(default)]
    pub met: bool,
}

/// One-time unlockable achievement declaration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct AchievementDef {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

/// Starting inventory configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryDef {
    #[serde(default)]
    pub initial_items: Vec<Id>,
    #[serde(default)]
    pub money: i64,
}

/// Engine settings declared by the story.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsDef {
    #[serde(default = "default_save_slots")]
    pub save_slots: u32,
    #[serde(default)]
    pub auto_save: bool,
}

impl Default for SettingsDef {
    fn default() -> Self {
        Self {
            save_slots: default_save_slots(),
            auto_save: false,
        }
    }
}

/// The event list document.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct StoryDoc {
    #[serde(default)]
    pub events: Vec<EventDef>,
}

/// Scheduling class of an event. Unknown strings fold into `Optional`,
/// which serde requires to be the last declared variant; presentation
/// order is decided by the engine, not by declaration order here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Mandatory,
    Forced,
    Random,
    #[default]
    #[serde(other)]
    Optional,
}

/// A narrative event with conditions, choices, and scheduling metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventDef {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub text: String,
    #[serde(rename = "type", default)]
    pub kind: EventKind,
    pub day: Option<u32>,
    pub conditions: Option<ConditionsDef>,
    #[serde(default)]
    pub choices: Vec<ChoiceDef>,
    #[serde(default)]
    pub can_repeat: bool,
    /// Bernoulli trial probability for `random` events. 0.5 when absent.
    pub probability: Option<f64>,
}

/// One selectable option on an event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChoiceDef {
    pub text: String,
    pub effects: Option<EffectsDef>,
}

/// Condition payload gating an event or ending.
///
/// Stat bounds use key spelling `<name>_min` / `<name>_max`, matching the
/// authored JSON format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct ConditionsDef {
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterCondDef>,
    pub day: Option<u32>,
    pub day_min: Option<u32>,
    pub day_max: Option<u32>,
    #[serde(default)]
    pub completed_events: Vec<Id>,
    #[serde(default)]
    pub previous_choices: BTreeMap<Id, usize>,
    #[serde(default)]
    pub has_flags: Vec<String>,
    pub inventory: Option<InventoryCondDef>,
}

impl ConditionsDef {
    /// Number of condition categories present in the payload.
    pub fn present_categories(&self) -> usize {
        [
            !self.stats.is_empty(),
            !self.flags.is_empty(),
            !self.characters.is_empty(),
            self.day.is_some(),
            self.day_min.is_some(),
            self.day_max.is_some(),
            !self.completed_events.is_empty(),
            !self.previous_choices.is_empty(),
            !self.has_flags.is_empty(),
            self.inventory.is_some(),
        ]
        .iter()
        .filter(|present| **present)
        .count()
    }

    /// True when any stat/flag/character/inventory category constrains the
    /// payload. Used by repeat-loop analysis: these categories can change
    /// between plays of the same event, so they can eventually stop a loop.
    pub fn has_restrictive_category(&self) -> bool {
        !self.stats.is_empty()
            || !self.flags.is_empty()
            || !self.has_flags.is_empty()
            || !self.characters.is_empty()
            || self.inventory.is_some()
    }
}

/// Per-character condition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterCondDef {
    pub met: Option<bool>,
    pub relationship_min: Option<i64>,
    pub relationship_max: Option<i64>,
}

/// Inventory condition.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryCondDef {
    pub money_min: Option<i64>,
    #[serde(default)]
    pub has_items: Vec<Id>,
}

/// Effect payload carried by a choice.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EffectsDef {
    #[serde(default)]
    pub stats: BTreeMap<String, i64>,
    #[serde(default)]
    pub flags: BTreeMap<String, FlagValue>,
    #[serde(default)]
    pub characters: BTreeMap<String, CharacterEffectDef>,
    pub inventory: Option<InventoryEffectDef>,
    #[serde(default)]
    pub unlock_events: Vec<Id>,
    #[serde(default)]
    pub lock_events: Vec<Id>,
    pub unlocks: Option<UnlocksDef>,
    #[serde(default)]
    pub trigger_next_day: bool,
    #[serde(default)]
    pub trigger_ending: bool,
}

/// Per-character effect: relationship delta and optional met replacement.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct CharacterEffectDef {
    pub relationship: Option<i64>,
    pub met: Option<bool>,
}

/// Inventory effect. Both key spellings for add and remove are accepted
/// for compatibility with older story content.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct InventoryEffectDef {
    pub money: Option<i64>,
    #[serde(default)]
    pub items: Vec<Id>,
    #[serde(default)]
    pub add: Vec<Id>,
    #[serde(default)]
    pub remove_items: Vec<Id>,
    #[serde(default)]
    pub remove: Vec<Id>,
}

impl InventoryEffectDef {
    /// Items to add, folding the legacy `add` spelling into `items`.
    pub fn items_to_add(&self) -> impl Iterator<Item = &Id> {
        self.items.iter().chain(self.add.iter())
    }

    /// Items to remove, folding the legacy `remove` spelling into `remove_items`.
    pub fn items_to_remove(&self) -> impl Iterator<Item = &Id> {
        self.remove_items.iter().chain(self.remove.iter())
    }
}

/// Unlock payload (currently achievements only).
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct UnlocksDef {
    pub achievement: Option<Id>,
}

/// The ending list document, including the mandatory fallback ending.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndingsDef {
    #[serde(default)]
    pub endings: Vec<EndingDef>,
    pub default_ending: EndingDef,
}

/// A terminal narrative outcome. Lower priority numbers are checked first.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EndingDef {
    pub id: Id,
    #[serde(default)]
    pub title: String,
    pub priority: Option<i32>,
    pub conditions: Option<ConditionsDef>,
    #[serde(default)]
    pub content: String,
}

/// Ending priority when unspecified; endings without one sort last.
pub const DEFAULT_ENDING_PRIORITY: i32 = 999;

fn default_starting_day() -> u32 {
    1
}

fn default_save_slots() -> u32 {
    3
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_value_deserializes_each_type() {
        let b: FlagValue = serde_json::from_str("true").unwrap();
        let n: FlagValue = serde_json::from_str("3").unwrap();
        let s: FlagValue = serde_json::from_str("\"market\"").unwrap();
        assert_eq!(b, FlagValue::Bool(true));
        assert_eq!(n, FlagValue::Number(3.0));
        assert_eq!(s, FlagValue::Text("market".into()));
    }

    #[test]
    fn flag_value_equality_is_type_sensitive() {
        assert_ne!(FlagValue::Bool(true), FlagValue::Number(1.0));
        assert_ne!(FlagValue::Number(1.0), FlagValue::Text("1".into()));
    }

    #[test]
    fn flag_value_truthiness() {
        assert!(FlagValue::Bool(true).is_truthy());
        assert!(!FlagValue::Bool(false).is_truthy());
        assert!(!FlagValue::Number(0.0).is_truthy());
        assert!(FlagValue::Number(-2.0).is_truthy());
        assert!(!FlagValue::Text(String::new()).is_truthy());
        assert!(FlagValue::Text("x".into()).is_truthy());
    }

    #[test]
    fn event_kind_unknown_string_folds_to_optional() {
        let kind: EventKind = serde_json::from_str("\"one_time\"").unwrap();
        assert_eq!(kind, EventKind::Optional);
        let kind: EventKind = serde_json::from_str("\"mandatory\"").unwrap();
        assert_eq!(kind, EventKind::Mandatory);
    }

    #[test]
    fn event_kind_wire_names_round_trip() {
        for (kind, name) in [
            (EventKind::Mandatory, "\"mandatory\""),
            (EventKind::Forced, "\"forced\""),
            (EventKind::Random, "\"random\""),
            (EventKind::Optional, "\"optional\""),
        ] {
            assert_eq!(serde_json::to_string(&kind).unwrap(), name);
            let back: EventKind = serde_json::from_str(name).unwrap();
            assert_eq!(back, kind);
        }
    }

    #[test]
    fn event_def_defaults_apply() {
        let event: EventDef = serde_json::from_str(r#"{"id": "intro", "choices": []}"#).unwrap();
        assert_eq!(event.kind, EventKind::Optional);
        assert!(!event.can_repeat);
        assert!(event.day.is_none());
        assert!(event.conditions.is_none());
    }

    #[test]
    fn inventory_effect_folds_both_spellings() {
        let effect: InventoryEffectDef =
            serde_json::from_str(r#"{"items": ["map"], "add": ["coin"], "remove": ["rope"]}"#).unwrap();
        let to_add: Vec<_> = effect.items_to_add().collect();
        let to_remove: Vec<_> = effect.items_to_remove().collect();
        assert_eq!(to_add, vec!["map", "coin"]);
        assert_eq!(to_remove, vec!["rope"]);
    }

    #[test]
    fn conditions_def_category_counting() {
        let empty = ConditionsDef::default();
        assert_eq!(empty.present_categories(), 0);
        assert!(!empty.has_restrictive_category());

        let conds: ConditionsDef =
            serde_json::from_str(r#"{"day": 3, "completed_events": ["intro"]}"#).unwrap();
        assert_eq!(conds.present_categories(), 2);
        assert!(!conds.has_restrictive_category());

        let conds: ConditionsDef = serde_json::from_str(r#"{"stats": {"honor_min": 10}}"#).unwrap();
        assert_eq!(conds.present_categories(), 1);
        assert!(conds.has_restrictive_category());
    }

    #[test]
    fn config_def_parses_story_documents() {
        let raw = r#"{
            "story": { "id": "demo", "title": "Demo", "version": "1.0", "starting_day": 2 },
            "stats": { "honor": { "min": 0, "max": 100, "start": 50 } },
            "flags": { "visited_market": false, "coins_found": 0 },
            "characters": { "mira": { "name": "Mira", "relationship": 10 } },
            "inventory": { "initial_items": ["map"], "money": 25 },
            "settings": { "save_slots": 5, "auto_save": true }
        }"#;
        let config: ConfigDef = serde_json::from_str(raw).unwrap();
        assert_eq!(config.story.starting_day, 2);
        assert_eq!(config.stats["honor"].start, 50);
        assert_eq!(config.flags["visited_market"], FlagValue::Bool(false));
        assert_eq!(config.characters["mira"].relationship, 10);
        assert_eq!(config.inventory.money, 25);
        assert_eq!(config.settings.save_slots, 5);
    }
}
