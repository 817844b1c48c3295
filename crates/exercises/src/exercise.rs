use serde::{Deserialize, Serialize};

use skillsgarden_core::validation::{check_length, check_length_opt};
use skillsgarden_core::{DomainResult, Entity, ExerciseId};

use crate::movement_form::{MovementForm, dedup_forms};

/// One numbered instruction of an exercise. Numbers start at 1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExerciseStep {
    pub number: i32,
    pub description: String,
}

/// Number steps from 1 in the given order.
pub fn number_steps(steps: &[String]) -> Vec<ExerciseStep> {
    steps
        .iter()
        .zip(1..)
        .map(|(description, number)| ExerciseStep {
            number,
            description: description.clone(),
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Exercise {
    pub id: ExerciseId,
    pub name: String,
    pub media: Option<String>,
    pub requirements: Vec<String>,
    pub steps: Vec<ExerciseStep>,
    pub forms: Vec<MovementForm>,
}

impl Entity for Exercise {
    type Id = ExerciseId;

    fn id(&self) -> ExerciseId {
        self.id
    }
}

impl Exercise {
    /// True when `wanted` is empty or the exercise trains any of them.
    pub fn trains_any(&self, wanted: &[MovementForm]) -> bool {
        wanted.is_empty() || self.forms.iter().any(|f| wanted.contains(f))
    }

    /// Step descriptions in order.
    pub fn step_descriptions(&self) -> Vec<String> {
        let mut steps = self.steps.clone();
        steps.sort_by_key(|s| s.number);
        steps.into_iter().map(|s| s.description).collect()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewExercise {
    pub name: String,
    pub media: Option<String>,
    pub requirements: Vec<String>,
    pub steps: Vec<ExerciseStep>,
    pub forms: Vec<MovementForm>,
}

impl NewExercise {
    /// Build from submitted values: steps get numbered, forms de-duplicated.
    pub fn new(
        name: String,
        media: Option<String>,
        requirements: Vec<String>,
        steps: &[String],
        forms: &[MovementForm],
    ) -> Self {
        Self {
            name,
            media,
            requirements,
            steps: number_steps(steps),
            forms: dedup_forms(forms),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        check_length("Name", &self.name, 2, 30)
    }
}

/// Partial update. Present collections replace the stored ones wholesale.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExercisePatch {
    pub name: Option<String>,
    pub media: Option<String>,
    pub requirements: Option<Vec<String>>,
    pub steps: Option<Vec<ExerciseStep>>,
    pub forms: Option<Vec<MovementForm>>,
}

impl ExercisePatch {
    pub fn new(
        name: Option<String>,
        media: Option<String>,
        requirements: Option<Vec<String>>,
        steps: Option<&[String]>,
        forms: Option<&[MovementForm]>,
    ) -> Self {
        Self {
            name,
            media,
            requirements,
            steps: steps.map(number_steps),
            forms: forms.map(dedup_forms),
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        check_length_opt("Name", self.name.as_deref(), 2, 30)
    }

    pub fn apply(&self, exercise: &mut Exercise) {
        if let Some(v) = &self.name {
            exercise.name = v.clone();
        }
        if let Some(v) = &self.media {
            exercise.media = Some(v.clone());
        }
        if let Some(v) = &self.requirements {
            exercise.requirements = v.clone();
        }
        if let Some(v) = &self.steps {
            exercise.steps = v.clone();
        }
        if let Some(v) = &self.forms {
            exercise.forms = v.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use MovementForm::*;

    #[test]
    fn new_exercise_numbers_steps_and_dedups_forms() {
        let ex = NewExercise::new(
            "Pull-up".into(),
            None,
            vec!["Bar".into()],
            &["Grab the bar".to_string(), "Pull".to_string()],
            &[Klimmen, Balans, Klimmen],
        );
        assert_eq!(ex.steps[0], ExerciseStep { number: 1, description: "Grab the bar".into() });
        assert_eq!(ex.steps[1].number, 2);
        assert_eq!(ex.forms, vec![Klimmen, Balans]);
        assert!(ex.validate().is_ok());
    }

    #[test]
    fn name_limit_is_30() {
        let ex = NewExercise::new("x".repeat(31), None, vec![], &[], &[]);
        assert_eq!(ex.validate().unwrap_err().to_string(), "Name can not be longer than 30 characters");
    }

    #[test]
    fn empty_filter_matches_everything() {
        let ex = Exercise {
            id: ExerciseId::new(1),
            name: "Roll".into(),
            media: None,
            requirements: vec![],
            steps: vec![],
            forms: vec![Rollen],
        };
        assert!(ex.trains_any(&[]));
        assert!(ex.trains_any(&[Balans, Rollen]));
        assert!(!ex.trains_any(&[Balans]));
    }

    #[test]
    fn patch_replaces_collections() {
        let mut ex = Exercise {
            id: ExerciseId::new(1),
            name: "Roll".into(),
            media: None,
            requirements: vec!["Mat".into()],
            steps: number_steps(&["a".into()]),
            forms: vec![Rollen],
        };
        let steps = vec!["b".to_string(), "c".to_string()];
        let patch = ExercisePatch::new(None, None, None, Some(steps.as_slice()), None);
        patch.apply(&mut ex);
        assert_eq!(ex.step_descriptions(), vec!["b".to_string(), "c".to_string()]);
        assert_eq!(ex.requirements, vec!["Mat".to_string()]);
    }
}
