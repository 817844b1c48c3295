//! `skillsgarden-exercises`: exercise definitions, workouts and the random
//! workout generator.

pub mod exercise;
pub mod generator;
pub mod movement_form;
pub mod pipe;
pub mod workout;

pub use exercise::{Exercise, ExercisePatch, ExerciseStep, NewExercise, number_steps};
pub use generator::{clamp_amount, generate};
pub use movement_form::{MovementForm, UnknownMovementForm, dedup_forms};
pub use pipe::{PipeParseError, parse_pipe_list, split_pipes};
pub use workout::{NewWorkout, Workout, WorkoutPatch};
