//! Runtime events and the availability resolver.
//!
//! Availability is re-derived from conditions on every call rather than
//! tracked incrementally, so locked/unlocked events and newly-true
//! conditions are always picked up. Callers that iterate over the returned
//! list must detect changes themselves (e.g. by comparing id sequences).

use fragments_data::{EventKind, Id};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::condition::{Condition, conditions_met};
use crate::effect::Effect;
use crate::state::GameState;

/// Trial probability used for `random` events that declare none.
pub const DEFAULT_RANDOM_PROBABILITY: f64 = 0.5;

/// One selectable option on an event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Choice {
    pub text: String,
    pub effects: Vec<Effect>,
}

/// A compiled narrative event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    pub id: Id,
    pub title: String,
    pub text: String,
    pub kind: EventKind,
    pub day: Option<u32>,
    pub conditions: Vec<Condition>,
    pub choices: Vec<Choice>,
    pub can_repeat: bool,
    pub probability: Option<f64>,
}

/// Presentation priority for an event kind. Lower sorts first.
fn kind_rank(kind: EventKind) -> u8 {
    match kind {
        EventKind::Mandatory => 0,
        EventKind::Forced => 1,
        EventKind::Optional => 2,
        EventKind::Random => 3,
    }
}

/// Resolve the ordered list of events the player may currently face.
///
/// Pure given a fixed random source: only `random`-type events consult the
/// RNG, with one independent Bernoulli trial each. The sort is stable, so
/// ties within a kind preserve story-definition order.
pub fn available_events<'a>(events: &'a [Event], state: &GameState, rng: &mut impl Rng) -> Vec<&'a Event> {
    let mut available: Vec<&Event> = Vec::new();
    for event in events {
        if state.has_completed(&event.id) && !event.can_repeat {
            continue;
        }
        if !conditions_met(&event.conditions, state) {
            continue;
        }
        if let Some(day) = event.day
            && day != state.current_day
        {
            continue;
        }
        if event.kind == EventKind::Random {
            let probability = event.probability.unwrap_or(DEFAULT_RANDOM_PROBABILITY).clamp(0.0, 1.0);
            if !rng.random_bool(probability) {
                continue;
            }
        }
        available.push(event);
    }
    available.sort_by_key(|event| kind_rank(event.kind));
    available
}
