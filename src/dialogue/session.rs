use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::sync::Arc;
use tracing::debug;

use super::clock::Clock;
use super::parser::{parse_exercise_message, Intensity, PartialExercise};

/// A workout with every slot filled, ready to estimate and log.
#[derive(Clone, Debug, PartialEq)]
pub struct ExerciseRequest {
    pub exercise: String,
    pub duration_minutes: u32,
    pub intensity: Intensity,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Slot {
    Exercise,
    Duration,
    Intensity,
}

impl Slot {
    /// The follow-up question asked when this slot is still empty.
    pub fn question(&self) -> &'static str {
        match self {
            Slot::Exercise => "What kind of exercise did you do?",
            Slot::Duration => "How long did you exercise (e.g. '30 minutes')?",
            Slot::Intensity => "How intense was it: low, moderate or high?",
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum SlotOutcome {
    /// Nothing recognized and nothing pending.
    Ignored,
    Incomplete { missing: Vec<Slot> },
    Complete(ExerciseRequest),
}

struct Session {
    partial: PartialExercise,
    updated_at: DateTime<Utc>,
}

fn missing_slots(partial: &PartialExercise) -> Vec<Slot> {
    let mut missing = Vec::new();
    if partial.exercise.is_none() {
        missing.push(Slot::Exercise);
    }
    if partial.duration_minutes.is_none() {
        missing.push(Slot::Duration);
    }
    if partial.intensity.is_none() {
        missing.push(Slot::Intensity);
    }
    missing
}

/// Partially filled workouts per chat, forgotten after `ttl` of silence.
pub struct SessionStore {
    sessions: DashMap<i64, Session>,
    clock: Arc<dyn Clock>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(clock: Arc<dyn Clock>, ttl: std::time::Duration) -> Self {
        Self {
            sessions: DashMap::new(),
            clock,
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::days(1)),
        }
    }

    /// Merges one message into the chat's pending workout.
    pub fn handle_message(&self, chat_id: i64, text: &str) -> SlotOutcome {
        let parsed = parse_exercise_message(text);
        let now = self.clock.now();

        let pending = self
            .sessions
            .remove(&chat_id)
            .map(|(_, session)| session)
            .filter(|session| {
                let fresh = now - session.updated_at <= self.ttl;
                if !fresh {
                    debug!("Discarding expired exercise session for chat {}", chat_id);
                }
                fresh
            });

        if parsed.is_empty() && pending.is_none() {
            return SlotOutcome::Ignored;
        }

        let merged = match pending {
            Some(session) => session.partial.merge(parsed),
            None => parsed,
        };

        match (&merged.exercise, merged.duration_minutes, merged.intensity) {
            (Some(exercise), Some(duration_minutes), Some(intensity)) => {
                SlotOutcome::Complete(ExerciseRequest {
                    exercise: exercise.clone(),
                    duration_minutes,
                    intensity,
                })
            }
            _ => {
                let missing = missing_slots(&merged);
                self.sessions.insert(
                    chat_id,
                    Session {
                        partial: merged,
                        updated_at: now,
                    },
                );
                SlotOutcome::Incomplete { missing }
            }
        }
    }

    /// The chat's pending workout, if it has not expired.
    #[cfg(test)]
    fn pending(&self, chat_id: i64) -> Option<PartialExercise> {
        let now = self.clock.now();
        self.sessions
            .get(&chat_id)
            .filter(|session| now - session.updated_at <= self.ttl)
            .map(|session| session.partial.clone())
    }

    pub fn clear(&self, chat_id: i64) {
        self.sessions.remove(&chat_id);
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.sessions.len()
    }

    #[cfg(test)]
    fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}
