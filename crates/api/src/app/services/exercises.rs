use skillsgarden_core::ExerciseId;
use skillsgarden_exercises::{ExercisePatch, NewExercise};

use super::AppServices;
use crate::app::dto::{ExerciseBody, ExerciseResponse};
use crate::app::errors::{ApiError, ErrorCode};

impl AppServices {
    pub async fn list_exercises(&self) -> Result<Vec<ExerciseResponse>, ApiError> {
        let exercises = self.repos.exercises.list().await?;
        Ok(exercises.into_iter().map(ExerciseResponse::from).collect())
    }

    pub async fn get_exercise(&self, id: ExerciseId) -> Result<ExerciseResponse, ApiError> {
        let exercise = self.repos.exercises.read(id).await?.ok_or(ErrorCode::ExerciseNotFound)?;
        Ok(exercise.into())
    }

    pub async fn create_exercise(&self, body: ExerciseBody) -> Result<ExerciseResponse, ApiError> {
        let Some(name) = body.name else {
            return Err(ApiError::validation("Name is required"));
        };
        let draft = NewExercise::new(
            name,
            body.media,
            body.requirements.unwrap_or_default(),
            &body.steps.unwrap_or_default(),
            &body.forms.unwrap_or_default(),
        );
        draft.validate()?;

        let exercise = self.repos.exercises.create(draft).await?;
        tracing::info!(exercise_id = %exercise.id, "exercise created");
        Ok(exercise.into())
    }

    pub async fn update_exercise(&self, id: ExerciseId, body: ExerciseBody) -> Result<ExerciseResponse, ApiError> {
        let patch = ExercisePatch::new(
            body.name,
            body.media,
            body.requirements,
            body.steps.as_deref(),
            body.forms.as_deref(),
        );
        patch.validate()?;

        let exercise = self
            .repos
            .exercises
            .update(id, patch)
            .await?
            .ok_or(ErrorCode::ExerciseNotFound)?;
        Ok(exercise.into())
    }

    /// Also unlinks the exercise from components and workouts.
    pub async fn delete_exercise(&self, id: ExerciseId) -> Result<(), ApiError> {
        if !self.repos.exercises.delete(id).await? {
            return Err(ErrorCode::ExerciseNotFound.into());
        }
        tracing::info!(exercise_id = %id, "exercise deleted");
        Ok(())
    }
}
