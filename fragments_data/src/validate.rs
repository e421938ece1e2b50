use std::collections::HashSet;
use std::fmt;

use crate::*;

/// How serious a reported issue is. Validation is advisory and never blocks
/// a load; `Danger` marks content that will misbehave at runtime.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Warning,
    Danger,
}

/// Repeat-loop exposure classes for `can_repeat` events, in increasing
/// confidence that the event will recur forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopRisk {
    /// Only a fixed `day` gate: fires every time that day's availability
    /// is recomputed.
    OnlyDayGate,
    /// Only `completed_events`: does not prevent the event's own repetition.
    OnlyCompletedEvents,
    /// No conditions at all: certain infinite loop.
    Certain,
}

/// Advisory problem found in a story definition.
#[derive(Debug, Clone, PartialEq)]
pub enum Issue {
    DuplicateEventId {
        id: Id,
    },
    MissingEventReference {
        context: String,
        missing: Id,
    },
    UnknownStat {
        ending: Id,
        stat: String,
    },
    UnreachableEnding {
        ending: Id,
        stat: String,
        required: i64,
        bound: i64,
        is_min: bool,
    },
    InvalidProbability {
        event: Id,
        probability: f64,
    },
    RepeatLoopRisk {
        event: Id,
        risk: LoopRisk,
    },
}

impl Issue {
    pub fn severity(&self) -> Severity {
        match self {
            Issue::RepeatLoopRisk {
                risk: LoopRisk::Certain,
                ..
            } => Severity::Danger,
            _ => Severity::Warning,
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::DuplicateEventId { id } => write!(f, "duplicate event id '{id}'"),
            Issue::MissingEventReference { context, missing } => {
                write!(f, "{context} references unknown event '{missing}'")
            },
            Issue::UnknownStat { ending, stat } => {
                write!(f, "ending '{ending}' references undeclared stat '{stat}'")
            },
            Issue::UnreachableEnding {
                ending,
                stat,
                required,
                bound,
                is_min,
            } => {
                if *is_min {
                    write!(
                        f,
                        "ending '{ending}' requires {stat} >= {required}, but the configured max is {bound}"
                    )
                } else {
                    write!(
                        f,
                        "ending '{ending}' requires {stat} <= {required}, but the configured min is {bound}"
                    )
                }
            },
            Issue::InvalidProbability { event, probability } => {
                write!(f, "event '{event}' has probability {probability} outside (0, 1]")
            },
            Issue::RepeatLoopRisk { event, risk } => match risk {
                LoopRisk::Certain => write!(
                    f,
                    "event '{event}' has can_repeat=true and no restrictive conditions (certain infinite loop)"
                ),
                LoopRisk::OnlyCompletedEvents => write!(
                    f,
                    "event '{event}' has can_repeat=true but only checks completed_events (does not prevent its own repetition)"
                ),
                LoopRisk::OnlyDayGate => write!(
                    f,
                    "event '{event}' has can_repeat=true but only checks the day (will repeat for the whole day)"
                ),
            },
        }
    }
}

/// Static analysis over story definitions only.
///
/// Each check is independent and purely advisory: the engine loads and runs
/// a story regardless of what is reported here. The pass never touches game
/// state and is safe to run repeatedly.
pub fn validate_story(docs: &StoryDocs) -> Vec<Issue> {
    let mut issues = Vec::new();

    // Duplicate event ids. First occurrence wins at runtime.
    let mut event_ids: HashSet<&str> = HashSet::new();
    for event in &docs.story.events {
        if !event_ids.insert(event.id.as_str()) {
            issues.push(Issue::DuplicateEventId { id: event.id.clone() });
        }
    }

    for event in &docs.story.events {
        if let Some(conds) = &event.conditions {
            check_event_refs(&format!("event '{}'", event.id), conds, &event_ids, &mut issues);
        }
        for choice in &event.choices {
            if let Some(effects) = &choice.effects {
                for id in effects.unlock_events.iter().chain(&effects.lock_events) {
                    check_event_ref(&format!("event '{}' choice effects", event.id), id, &event_ids, &mut issues);
                }
            }
        }
        if event.kind == EventKind::Random
            && let Some(p) = event.probability
            && !(p > 0.0 && p <= 1.0)
        {
            issues.push(Issue::InvalidProbability {
                event: event.id.clone(),
                probability: p,
            });
        }
    }

    for ending in docs.endings.endings.iter().chain(Some(&docs.endings.default_ending)) {
        if let Some(conds) = &ending.conditions {
            check_event_refs(&format!("ending '{}'", ending.id), conds, &event_ids, &mut issues);
            check_ending_stats(ending, conds, &docs.config, &mut issues);
        }
    }

    for event in &docs.story.events {
        if event.can_repeat
            && let Some(risk) = repeat_loop_risk(event.conditions.as_ref())
        {
            issues.push(Issue::RepeatLoopRisk {
                event: event.id.clone(),
                risk,
            });
        }
    }

    issues
}

fn check_event_refs(context: &str, conds: &ConditionsDef, event_ids: &HashSet<&str>, issues: &mut Vec<Issue>) {
    for id in &conds.completed_events {
        check_event_ref(context, id, event_ids, issues);
    }
    for id in conds.previous_choices.keys() {
        check_event_ref(context, id, event_ids, issues);
    }
}

fn check_event_ref(context: &str, id: &Id, event_ids: &HashSet<&str>, issues: &mut Vec<Issue>) {
    if !event_ids.contains(id.as_str()) {
        issues.push(Issue::MissingEventReference {
            context: context.to_string(),
            missing: id.clone(),
        });
    }
}

/// Flag ending stat bounds that no runtime value can ever satisfy,
/// judged against configured bounds rather than runtime values.
fn check_ending_stats(ending: &EndingDef, conds: &ConditionsDef, config: &ConfigDef, issues: &mut Vec<Issue>) {
    for (key, required) in &conds.stats {
        let (stat, is_min) = match key.strip_suffix("_min") {
            Some(stat) => (stat, true),
            None => match key.strip_suffix("_max") {
                Some(stat) => (stat, false),
                None => continue,
            },
        };
        let Some(stat_def) = config.stats.get(stat) else {
            issues.push(Issue::UnknownStat {
                ending: ending.id.clone(),
                stat: stat.to_string(),
            });
            continue;
        };
        if is_min && *required > stat_def.max {
            issues.push(Issue::UnreachableEnding {
                ending: ending.id.clone(),
                stat: stat.to_string(),
                required: *required,
                bound: stat_def.max,
                is_min: true,
            });
        }
        if !is_min && *required < stat_def.min {
            issues.push(Issue::UnreachableEnding {
                ending: ending.id.clone(),
                stat: stat.to_string(),
                required: *required,
                bound: stat_def.min,
                is_min: false,
            });
        }
    }
}

/// Classify repeat-loop exposure for one `can_repeat` event.
///
/// Any stat/flag/character/inventory condition is considered adequately
/// restrictive: those categories can change between plays of the event.
fn repeat_loop_risk(conds: Option<&ConditionsDef>) -> Option<LoopRisk> {
    let Some(conds) = conds else {
        return Some(LoopRisk::Certain);
    };
    if conds.has_restrictive_category() {
        return None;
    }
    let categories = conds.present_categories();
    if categories == 0 {
        Some(LoopRisk::Certain)
    } else if categories == 1 && !conds.completed_events.is_empty() {
        Some(LoopRisk::OnlyCompletedEvents)
    } else if categories == 1 && conds.day.is_some() {
        Some(LoopRisk::OnlyDayGate)
    } else {
        None
    }
}
