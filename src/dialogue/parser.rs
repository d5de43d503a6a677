use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Intensity {
    Low,
    Moderate,
    High,
}

impl Intensity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intensity::Low => "low",
            Intensity::Moderate => "moderate",
            Intensity::High => "high",
        }
    }
}

impl fmt::Display for Intensity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whatever one message told us about a workout.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PartialExercise {
    pub exercise: Option<String>,
    pub duration_minutes: Option<u32>,
    pub intensity: Option<Intensity>,
}

impl PartialExercise {
    pub fn is_empty(&self) -> bool {
        self.exercise.is_none() && self.duration_minutes.is_none() && self.intensity.is_none()
    }

    /// Fields set in `newer` replace the ones already known.
    pub fn merge(self, newer: PartialExercise) -> PartialExercise {
        PartialExercise {
            exercise: newer.exercise.or(self.exercise),
            duration_minutes: newer.duration_minutes.or(self.duration_minutes),
            intensity: newer.intensity.or(self.intensity),
        }
    }
}

// Trigger phrase -> canonical exercise. Earlier entries win.
const EXERCISE_PHRASES: &[(&str, &str)] = &[
    ("strength training", "strength training"),
    ("weight lifting", "weightlifting"),
    ("weightlifting", "weightlifting"),
    ("lifting", "weightlifting"),
    ("weights", "weightlifting"),
    ("gym", "weightlifting"),
    ("swimming", "swimming"),
    ("swim", "swimming"),
    ("swam", "swimming"),
    ("running", "running"),
    ("run", "running"),
    ("ran", "running"),
    ("jogging", "running"),
    ("jog", "running"),
    ("cycling", "cycling"),
    ("biking", "cycling"),
    ("bike", "cycling"),
    ("spinning", "cycling"),
    ("walking", "walking"),
    ("walk", "walking"),
    ("hiking", "hiking"),
    ("hike", "hiking"),
    ("rowing", "rowing"),
    ("yoga", "yoga"),
    ("pilates", "pilates"),
    ("hiit", "hiit"),
    ("boxing", "boxing"),
    ("dancing", "dancing"),
    ("tennis", "tennis"),
    ("football", "football"),
    ("soccer", "football"),
    ("basketball", "basketball"),
];

const INTENSITY_PHRASES: &[(&str, Intensity)] = &[
    ("low", Intensity::Low),
    ("light", Intensity::Low),
    ("easy", Intensity::Low),
    ("gentle", Intensity::Low),
    ("moderate", Intensity::Moderate),
    ("medium", Intensity::Moderate),
    ("average", Intensity::Moderate),
    ("normal", Intensity::Moderate),
    ("high", Intensity::High),
    ("hard", Intensity::High),
    ("intense", Intensity::High),
    ("vigorous", Intensity::High),
    ("heavy", Intensity::High),
];

// Unit -> minutes per unit.
const DURATION_UNITS: &[(&str, f64)] = &[
    ("minutes", 1.0),
    ("minute", 1.0),
    ("mins", 1.0),
    ("min", 1.0),
    ("hours", 60.0),
    ("hour", 60.0),
    ("hrs", 60.0),
    ("hr", 60.0),
    ("h", 60.0),
];

static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d+(?:\.\d+)?)\s*([a-z]+)\b").expect("valid regex"));
static BARE_NUMBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d+(?:\.\d+)?$").expect("valid regex"));
static NON_WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9.]+").expect("valid regex"));

fn find_phrase<T: Copy>(padded: &str, table: &[(&str, T)]) -> Option<T> {
    table
        .iter()
        .find(|(phrase, _)| padded.contains(&format!(" {} ", phrase)))
        .map(|(_, value)| *value)
}

fn parse_duration(lowered: &str, normalized: &str) -> Option<u32> {
    // Compound durations ("1 hour 30 minutes") add up.
    let parts: Vec<f64> = DURATION
        .captures_iter(lowered)
        .filter_map(|caps| {
            let amount: f64 = caps[1].parse().ok()?;
            let per_unit = DURATION_UNITS
                .iter()
                .find(|(unit, _)| *unit == &caps[2])
                .map(|(_, per_unit)| *per_unit)?;
            Some(amount * per_unit)
        })
        .collect();
    let minutes: f64 = if parts.is_empty() {
        // A lone number answers "how long?" in minutes.
        BARE_NUMBER
            .is_match(normalized)
            .then(|| normalized.parse().ok())
            .flatten()?
    } else {
        parts.iter().sum()
    };

    let rounded = minutes.round();
    (rounded >= 1.0 && rounded <= f64::from(u32::MAX)).then_some(rounded as u32)
}

/// Extracts exercise, duration and intensity from one free-text message.
pub fn parse_exercise_message(text: &str) -> PartialExercise {
    let lowered = text.to_lowercase();
    let normalized = NON_WORD.replace_all(&lowered, " ").trim().to_string();
    let padded = format!(" {} ", normalized);

    PartialExercise {
        exercise: find_phrase(&padded, EXERCISE_PHRASES).map(str::to_string),
        duration_minutes: parse_duration(&lowered, &normalized),
        intensity: find_phrase(&padded, INTENSITY_PHRASES),
    }
}
