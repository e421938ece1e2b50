//! condition.rs -- `Condition` Module
//!
//! Compiled predicates over [`GameState`]. An event or ending is eligible
//! when every one of its conditions is met; an empty list is vacuously true.
//! Evaluation never mutates state.

use fragments_data::{FlagValue, Id};
use serde::{Deserialize, Serialize};

use crate::state::GameState;

/// A single compiled predicate over game state.
///
/// Permissiveness is deliberately uneven across categories, matching the
/// content format: a stat bound naming an undeclared stat is skipped
/// (vacuously true), while flag, character, and item references absent from
/// state fail closed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Condition {
    StatMin { stat: String, value: i64 },
    StatMax { stat: String, value: i64 },
    FlagEquals { flag: String, value: FlagValue },
    FlagSet { flag: String },
    CharacterMet { id: Id, met: bool },
    RelationshipMin { id: Id, value: i64 },
    RelationshipMax { id: Id, value: i64 },
    DayIs(u32),
    DayMin(u32),
    DayMax(u32),
    EventCompleted(Id),
    PreviousChoice { event: Id, choice: usize },
    MoneyMin(i64),
    HasItem(Id),
}

impl Condition {
    /// Evaluate this predicate against current game state. Read-only.
    pub fn is_met(&self, state: &GameState) -> bool {
        match self {
            Self::StatMin { stat, value } => state.stats.get(stat).is_none_or(|current| current >= value),
            Self::StatMax { stat, value } => state.stats.get(stat).is_none_or(|current| current <= value),
            Self::FlagEquals { flag, value } => state.flags.get(flag).is_some_and(|current| current == value),
            Self::FlagSet { flag } => state.flags.get(flag).is_some_and(FlagValue::is_truthy),
            Self::CharacterMet { id, met } => state.characters.get(id).is_some_and(|c| c.met == *met),
            Self::RelationshipMin { id, value } => {
                state.characters.get(id).is_some_and(|c| c.relationship >= *value)
            },
            Self::RelationshipMax { id, value } => {
                state.characters.get(id).is_some_and(|c| c.relationship <= *value)
            },
            Self::DayIs(day) => state.current_day == *day,
            Self::DayMin(day) => state.current_day >= *day,
            Self::DayMax(day) => state.current_day <= *day,
            Self::EventCompleted(id) => state.has_completed(id),
            Self::PreviousChoice { event, choice } => state.first_choice_for(event) == Some(*choice),
            Self::MoneyMin(amount) => state.inventory.money >= *amount,
            Self::HasItem(id) => state.inventory.items.contains(id),
        }
    }
}

/// AND-combine a condition list. Empty lists are vacuously true.
pub fn conditions_met(conditions: &[Condition], state: &GameState) -> bool {
    conditions.iter().all(|condition| condition.is_met(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::{CharacterState, ChoiceRecord};

    fn build_test_state() -> GameState {
        let mut state = GameState {
            story_id: "demo".into(),
            current_day: 3,
            ..GameState::default()
        };
        state.stats.insert("honor".into(), 50);
        state.flags.insert("visited_market".into(), FlagValue::Bool(true));
        state.flags.insert("coins_found".into(), FlagValue::Number(2.0));
        state.characters.insert(
            "mira".into(),
            CharacterState {
                name: "Mira".into(),
                relationship: 20,
                met: true,
            },
        );
        state.inventory.money = 30;
        state.inventory.items.insert("map".into());
        state.completed_events.push("intro".into());
        state.choices_history.push(ChoiceRecord {
            event: "intro".into(),
            choice: 1,
            recorded_at: String::new(),
        });
        state
    }

    #[test]
    fn empty_condition_list_is_vacuously_true() {
        let state = build_test_state();
        assert!(conditions_met(&[], &state));
    }

    #[test]
    fn stat_bounds_compare_current_value() {
        let state = build_test_state();
        assert!(
            Condition::StatMin {
                stat: "honor".into(),
                value: 50
            }
            .is_met(&state)
        );
        assert!(
            !Condition::StatMin {
                stat: "honor".into(),
                value: 51
            }
            .is_met(&state)
        );
        assert!(
            Condition::StatMax {
                stat: "honor".into(),
                value: 50
            }
            .is_met(&state)
        );
        assert!(
            !Condition::StatMax {
                stat: "honor".into(),
                value: 49
            }
            .is_met(&state)
        );
    }

    #[test]
    fn undeclared_stat_bound_is_skipped() {
        let state = build_test_state();
        assert!(
            Condition::StatMin {
                stat: "charm".into(),
                value: 99
            }
            .is_met(&state)
        );
    }

    #[test]
    fn flag_equality_is_type_sensitive() {
        let state = build_test_state();
        assert!(
            Condition::FlagEquals {
                flag: "visited_market".into(),
                value: FlagValue::Bool(true)
            }
            .is_met(&state)
        );
        assert!(
            !Condition::FlagEquals {
                flag: "visited_market".into(),
                value: FlagValue::Number(1.0)
            }
            .is_met(&state)
        );
        assert!(
            !Condition::FlagEquals {
                flag: "unknown".into(),
                value: FlagValue::Bool(false)
            }
            .is_met(&state)
        );
    }

    #[test]
    fn flag_set_uses_truthiness() {
        let mut state = build_test_state();
        assert!(Condition::FlagSet { flag: "coins_found".into() }.is_met(&state));
        state.flags.insert("coins_found".into(), FlagValue::Number(0.0));
        assert!(!Condition::FlagSet { flag: "coins_found".into() }.is_met(&state));
        assert!(!Condition::FlagSet { flag: "unknown".into() }.is_met(&state));
    }

    #[test]
    fn missing_character_fails_closed() {
        let state = build_test_state();
        assert!(
            !Condition::CharacterMet {
                id: "ghost".into(),
                met: false
            }
            .is_met(&state)
        );
        assert!(
            !Condition::RelationshipMin {
                id: "ghost".into(),
                value: -100
            }
            .is_met(&state)
        );
    }

    #[test]
    fn character_conditions_check_met_and_relationship() {
        let state = build_test_state();
        assert!(
            Condition::CharacterMet {
                id: "mira".into(),
                met: true
            }
            .is_met(&state)
        );
        assert!(
            Condition::RelationshipMin {
                id: "mira".into(),
                value: 20
            }
            .is_met(&state)
        );
        assert!(
            !Condition::RelationshipMax {
                id: "mira".into(),
                value: 19
            }
            .is_met(&state)
        );
    }

    #[test]
    fn day_conditions_compare_current_day() {
        let state = build_test_state();
        assert!(Condition::DayIs(3).is_met(&state));
        assert!(!Condition::DayIs(2).is_met(&state));
        assert!(Condition::DayMin(3).is_met(&state));
        assert!(!Condition::DayMin(4).is_met(&state));
        assert!(Condition::DayMax(3).is_met(&state));
        assert!(!Condition::DayMax(2).is_met(&state));
    }

    #[test]
    fn completed_events_require_membership() {
        let state = build_test_state();
        assert!(Condition::EventCompleted("intro".into()).is_met(&state));
        assert!(!Condition::EventCompleted("finale".into()).is_met(&state));
    }

    #[test]
    fn previous_choice_matches_first_recorded_choice() {
        let mut state = build_test_state();
        assert!(
            Condition::PreviousChoice {
                event: "intro".into(),
                choice: 1
            }
            .is_met(&state)
        );
        assert!(
            !Condition::PreviousChoice {
                event: "intro".into(),
                choice: 0
            }
            .is_met(&state)
        );
        // never-played event fails
        assert!(
            !Condition::PreviousChoice {
                event: "market".into(),
                choice: 0
            }
            .is_met(&state)
        );
        // a later replay does not change the matched record
        state.choices_history.push(ChoiceRecord {
            event: "intro".into(),
            choice: 0,
            recorded_at: String::new(),
        });
        assert!(
            Condition::PreviousChoice {
                event: "intro".into(),
                choice: 1
            }
            .is_met(&state)
        );
    }

    #[test]
    fn inventory_conditions_check_money_and_items() {
        let state = build_test_state();
        assert!(Condition::MoneyMin(30).is_met(&state));
        assert!(!Condition::MoneyMin(31).is_met(&state));
        assert!(Condition::HasItem("map".into()).is_met(&state));
        assert!(!Condition::HasItem("rope".into()).is_met(&state));
    }

    #[test]
    fn evaluation_does_not_mutate_state() {
        let state = build_test_state();
        let snapshot = state.clone();
        let conditions = vec![
            Condition::StatMin {
                stat: "honor".into(),
                value: 10,
            },
            Condition::HasItem("map".into()),
            Condition::DayIs(3),
        ];
        let _ = conditions_met(&conditions, &state);
        let _ = conditions_met(&conditions, &state);
        assert_eq!(state, snapshot);
    }
}
