//! Multi-turn exercise logging: parse what each message says, remember the rest.

mod clock;
mod parser;
mod session;

pub use clock::{Clock, ManualClock, SystemClock};
pub use parser::{parse_exercise_message, Intensity, PartialExercise};
pub use session::{ExerciseRequest, SessionStore, Slot, SlotOutcome};
