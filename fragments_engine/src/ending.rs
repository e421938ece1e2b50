//! Runtime endings and the ending resolver.

use fragments_data::Id;
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, conditions_met};
use crate::state::GameState;

/// A compiled terminal outcome.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ending {
    pub id: Id,
    pub title: String,
    /// Lower numbers are more specific and are checked first.
    pub priority: i32,
    pub conditions: Vec<Condition>,
    pub content: String,
}

/// Pick the ending the story terminates in.
///
/// Endings are checked in ascending priority order (stable for ties) and
/// the first whose conditions hold wins. The default ending is returned
/// unconditionally when none match; it carries no conditions of its own.
/// Deterministic: identical state and ending list always resolve the same.
pub fn resolve_ending<'a>(endings: &'a [Ending], default_ending: &'a Ending, state: &GameState) -> &'a Ending {
    let mut ordered: Vec<&Ending> = endings.iter().collect();
    ordered.sort_by_key(|ending| ending.priority);
    ordered
        .into_iter()
        .find(|ending| conditions_met(&ending.conditions, state))
        .unwrap_or(default_ending)
}
