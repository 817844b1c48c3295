use serde::{Deserialize, Serialize};

use skillsgarden_core::validation::{check_length, check_length_opt};
use skillsgarden_core::{DomainError, DomainResult, Entity, ExerciseId, WorkoutId};

/// A named, curated list of exercises.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Workout {
    pub id: WorkoutId,
    pub name: String,
    pub kind: String,
    pub exercises: Vec<ExerciseId>,
}

impl Entity for Workout {
    type Id = WorkoutId;

    fn id(&self) -> WorkoutId {
        self.id
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewWorkout {
    pub name: String,
    pub kind: String,
    pub exercises: Vec<ExerciseId>,
}

impl NewWorkout {
    pub fn validate(&self) -> DomainResult<()> {
        check_length("Name", &self.name, 2, 50)?;
        check_length("Type", &self.kind, 2, 50)?;
        if self.exercises.is_empty() {
            return Err(DomainError::validation("Exercises are required"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WorkoutPatch {
    pub name: Option<String>,
    pub kind: Option<String>,
    pub exercises: Option<Vec<ExerciseId>>,
}

impl WorkoutPatch {
    pub fn validate(&self) -> DomainResult<()> {
        check_length_opt("Name", self.name.as_deref(), 2, 50)?;
        check_length_opt("Type", self.kind.as_deref(), 2, 50)?;
        Ok(())
    }

    pub fn apply(&self, workout: &mut Workout) {
        if let Some(v) = &self.name {
            workout.name = v.clone();
        }
        if let Some(v) = &self.kind {
            workout.kind = v.clone();
        }
        if let Some(v) = &self.exercises {
            workout.exercises = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_exercises() {
        let w = NewWorkout { name: "Morning".into(), kind: "Cardio".into(), exercises: vec![] };
        assert_eq!(w.validate().unwrap_err().to_string(), "Exercises are required");

        let w = NewWorkout { exercises: vec![ExerciseId::new(1)], ..w };
        assert!(w.validate().is_ok());
    }

    #[test]
    fn type_is_length_checked() {
        let patch = WorkoutPatch { kind: Some("C".into()), ..Default::default() };
        assert_eq!(patch.validate().unwrap_err().to_string(), "Type must be at least 2 characters");
    }
}
