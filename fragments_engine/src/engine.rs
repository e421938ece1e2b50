//! The engine instance owned by the caller.
//!
//! One [`StoryEngine`] owns one loaded story and at most one playthrough
//! state. There is no shared global: hosts construct an engine, keep the
//! handle, and drive the event loop through it. All operations run
//! synchronously to completion; no two choices are ever in flight at once.

use anyhow::{Context, Result, bail};
use fragments_data::{ConditionsDef, Issue, SettingsDef, StoryDocs, validate_story};
use log::{info, warn};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::condition::conditions_met;
use crate::effect::{EffectsReport, apply_effects};
use crate::ending::{Ending, resolve_ending};
use crate::event::{Event, available_events};
use crate::loader::{Story, compile_conditions, compile_story};
use crate::state::{ChoiceRecord, GameState, now_rfc3339};

pub struct StoryEngine {
    story: Story,
    state: Option<GameState>,
    rng: StdRng,
}

impl StoryEngine {
    /// Build an engine from the three loaded story documents.
    ///
    /// Shape is checked first; the static validator then runs and its
    /// issues are logged and returned, but never block the load.
    ///
    /// # Errors
    /// - story id missing
    /// - default ending declares conditions (it must always succeed)
    pub fn new(docs: StoryDocs) -> Result<(StoryEngine, Vec<Issue>)> {
        if docs.config.story.id.trim().is_empty() {
            bail!("story config is missing a story id");
        }
        if docs
            .endings
            .default_ending
            .conditions
            .as_ref()
            .is_some_and(|conds| conds.present_categories() > 0)
        {
            bail!("default ending must not declare conditions");
        }

        let issues = validate_story(&docs);
        for issue in &issues {
            warn!("story validation ({:?}): {issue}", issue.severity());
        }

        let story = compile_story(&docs);
        info!(
            "story '{}' compiled: {} events, {} endings",
            story.config.story.id,
            story.events.len(),
            story.endings.len()
        );
        let engine = StoryEngine {
            story,
            state: None,
            rng: StdRng::from_os_rng(),
        };
        Ok((engine, issues))
    }

    /// Replace the entropy source with a seeded one for reproducible
    /// random-event trials.
    pub fn with_rng_seed(mut self, seed: u64) -> StoryEngine {
        self.rng = StdRng::seed_from_u64(seed);
        self
    }

    pub fn story(&self) -> &Story {
        &self.story
    }

    pub fn settings(&self) -> &SettingsDef {
        &self.story.config.settings
    }

    pub fn state(&self) -> Option<&GameState> {
        self.state.as_ref()
    }

    /// Start a fresh playthrough from story defaults, replacing any
    /// playthrough in progress.
    pub fn init_game(&mut self) -> &GameState {
        info!("initializing new game for story '{}'", self.story.config.story.id);
        self.state.insert(GameState::new_game(&self.story.config))
    }

    /// Replace the whole playthrough state, e.g. from a loaded save.
    ///
    /// # Errors
    /// Rejects state belonging to a different story; current state is left
    /// untouched on failure.
    pub fn restore_state(&mut self, state: GameState) -> Result<()> {
        if state.story_id != self.story.config.story.id {
            bail!(
                "state belongs to story '{}', but '{}' is loaded",
                state.story_id,
                self.story.config.story.id
            );
        }
        self.state = Some(state);
        Ok(())
    }

    /// The ordered list of events the player may currently face.
    ///
    /// Recomputed from conditions on every call; random-type events get one
    /// fresh Bernoulli trial each.
    ///
    /// # Errors
    /// - no game in progress
    pub fn available_events(&mut self) -> Result<Vec<Event>> {
        let state = self.state.as_ref().context("no game in progress")?;
        let available = available_events(&self.story.events, state, &mut self.rng);
        Ok(available.into_iter().cloned().collect())
    }

    /// Ad-hoc condition check against current state, for callers that need
    /// answers like "is there an end-of-day event now".
    ///
    /// # Errors
    /// - no game in progress
    pub fn meets_conditions(&self, conditions: &ConditionsDef) -> Result<bool> {
        let state = self.state.as_ref().context("no game in progress")?;
        Ok(conditions_met(&compile_conditions(conditions), state))
    }

    /// Record and apply one choice on an event.
    ///
    /// The choice is recorded in history first, then its effects are
    /// applied, then the event is marked completed unless repeatable.
    /// The returned report carries the day-advance and story-end triggers;
    /// callers must short-circuit on either before presenting more events.
    ///
    /// # Errors
    /// - no game in progress
    /// - unknown event id or out-of-range choice index
    pub fn make_choice(&mut self, event_id: &str, choice_index: usize) -> Result<EffectsReport> {
        let event = self
            .story
            .events
            .iter()
            .find(|event| event.id == event_id)
            .with_context(|| format!("unknown event '{event_id}'"))?;
        let choice = event
            .choices
            .get(choice_index)
            .with_context(|| format!("event '{event_id}' has no choice {choice_index}"))?;
        let state = self.state.as_mut().context("no game in progress")?;

        state.choices_history.push(ChoiceRecord {
            event: event.id.clone(),
            choice: choice_index,
            recorded_at: now_rfc3339(),
        });

        let report = apply_effects(&choice.effects, state, &self.story.config.stats);

        if !event.can_repeat && !state.has_completed(&event.id) {
            state.completed_events.push(event.id.clone());
        }
        state.touch();

        info!("choice made: event '{event_id}' option {choice_index}");
        Ok(report)
    }

    /// Resolve which ending the story terminates in.
    ///
    /// # Errors
    /// - no game in progress
    pub fn resolve_ending(&self) -> Result<&Ending> {
        let state = self.state.as_ref().context("no game in progress")?;
        Ok(resolve_ending(&self.story.endings, &self.story.default_ending, state))
    }
}
