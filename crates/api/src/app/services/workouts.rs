use skillsgarden_core::WorkoutId;
use skillsgarden_exercises::{MovementForm, NewWorkout, WorkoutPatch, clamp_amount, generate, parse_pipe_list};

use super::AppServices;
use crate::app::dto::{ExerciseResponse, WorkoutBody, WorkoutListResponse, WorkoutResponse};
use crate::app::errors::{ApiError, ErrorCode};

impl AppServices {
    pub async fn list_workouts(&self) -> Result<Vec<WorkoutListResponse>, ApiError> {
        let workouts = self.repos.workouts.list().await?;
        Ok(workouts.into_iter().map(WorkoutListResponse::from).collect())
    }

    pub async fn get_workout(&self, id: WorkoutId) -> Result<WorkoutResponse, ApiError> {
        let workout = self.repos.workouts.read(id).await?.ok_or(ErrorCode::WorkoutNotFound)?;
        let exercises = self.repos.exercises.list_by_ids(&workout.exercises).await?;
        Ok(WorkoutResponse::new(workout, exercises))
    }

    pub async fn create_workout(&self, body: WorkoutBody) -> Result<WorkoutResponse, ApiError> {
        let (Some(name), Some(kind), Some(exercises)) = (body.name, body.kind, body.exercises) else {
            return Err(ErrorCode::InvalidRequestBody.into());
        };
        if exercises.is_empty() {
            return Err(ErrorCode::InvalidRequestBody.into());
        }

        let draft = NewWorkout { name, kind, exercises };
        draft.validate()?;
        self.ensure_exercises(&draft.exercises).await?;

        let workout = self.repos.workouts.create(draft).await?;
        tracing::info!(workout_id = %workout.id, "workout created");
        self.get_workout(workout.id).await
    }

    pub async fn update_workout(&self, id: WorkoutId, body: WorkoutBody) -> Result<WorkoutResponse, ApiError> {
        if !self.repos.workouts.exists(id).await? {
            return Err(ErrorCode::WorkoutNotFound.into());
        }

        let patch = WorkoutPatch {
            name: body.name,
            kind: body.kind,
            exercises: body.exercises,
        };
        patch.validate()?;
        if let Some(ids) = &patch.exercises {
            if ids.is_empty() {
                return Err(ErrorCode::InvalidRequestBody.into());
            }
            self.ensure_exercises(ids).await?;
        }

        self.repos
            .workouts
            .update(id, patch)
            .await?
            .ok_or(ErrorCode::WorkoutNotFound)?;
        self.get_workout(id).await
    }

    pub async fn delete_workout(&self, id: WorkoutId) -> Result<(), ApiError> {
        if !self.repos.workouts.delete(id).await? {
            return Err(ErrorCode::WorkoutNotFound.into());
        }
        tracing::info!(workout_id = %id, "workout deleted");
        Ok(())
    }

    /// Random selection of exercises training any of the pipe-delimited
    /// `movement_forms` (every form when empty).
    pub async fn generate_workout(
        &self,
        amount: Option<i64>,
        movement_forms: &str,
    ) -> Result<Vec<ExerciseResponse>, ApiError> {
        let forms: Vec<MovementForm> =
            parse_pipe_list(movement_forms).map_err(|_| ErrorCode::InvalidMovementFormProvided)?;
        let amount = clamp_amount(amount);

        let candidates = self.repos.exercises.list_by_movement_forms(&forms).await?;
        let picked = generate(&mut rand::thread_rng(), candidates, &forms, amount);
        Ok(picked.into_iter().map(ExerciseResponse::from).collect())
    }
}
