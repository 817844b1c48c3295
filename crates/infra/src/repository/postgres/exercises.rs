//! Exercises (requirements, numbered steps, movement forms) and workouts.

use std::collections::HashMap;

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgConnection, Row};
use tracing::instrument;

use skillsgarden_core::{ExerciseId, WorkoutId};
use skillsgarden_exercises::{
    Exercise, ExercisePatch, ExerciseStep, MovementForm, NewExercise, NewWorkout, Workout,
    WorkoutPatch,
};

use super::{PgStore, commit, corrupt, map_sqlx_error};
use crate::repository::{ExerciseRepository, Repository, StoreResult, WorkoutRepository};

/// Exercise without its child collections.
struct ExerciseRow(Exercise);

impl<'r> FromRow<'r, PgRow> for ExerciseRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(ExerciseRow(Exercise {
            id: ExerciseId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            media: row.try_get("media")?,
            requirements: Vec::new(),
            steps: Vec::new(),
            forms: Vec::new(),
        }))
    }
}

struct WorkoutRow(Workout);

impl<'r> FromRow<'r, PgRow> for WorkoutRow {
    fn from_row(row: &'r PgRow) -> Result<Self, sqlx::Error> {
        Ok(WorkoutRow(Workout {
            id: WorkoutId::new(row.try_get("id")?),
            name: row.try_get("name")?,
            kind: row.try_get("kind")?,
            exercises: Vec::new(),
        }))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Exercise children
// ─────────────────────────────────────────────────────────────────────────────

async fn hydrate_exercises(
    conn: &mut PgConnection,
    rows: Vec<ExerciseRow>,
) -> StoreResult<Vec<Exercise>> {
    const OP: &str = "load_exercise_children";
    let ids: Vec<i32> = rows.iter().map(|r| r.0.id.get()).collect();

    let requirement_rows = sqlx::query(
        r#"
        SELECT exercise_id, requirement
        FROM exercise_requirements
        WHERE exercise_id = ANY($1)
        ORDER BY exercise_id ASC, position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error(OP, e))?;

    let step_rows = sqlx::query(
        r#"
        SELECT exercise_id, number, description
        FROM exercise_steps
        WHERE exercise_id = ANY($1)
        ORDER BY exercise_id ASC, number ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error(OP, e))?;

    let form_rows = sqlx::query(
        r#"
        SELECT exercise_id, form
        FROM exercise_forms
        WHERE exercise_id = ANY($1)
        ORDER BY exercise_id ASC, position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error(OP, e))?;

    let mut requirements: HashMap<i32, Vec<String>> = HashMap::new();
    for row in requirement_rows {
        let id: i32 = row.try_get("exercise_id").map_err(|e| map_sqlx_error(OP, e))?;
        let requirement: String = row.try_get("requirement").map_err(|e| map_sqlx_error(OP, e))?;
        requirements.entry(id).or_default().push(requirement);
    }

    let mut steps: HashMap<i32, Vec<ExerciseStep>> = HashMap::new();
    for row in step_rows {
        let id: i32 = row.try_get("exercise_id").map_err(|e| map_sqlx_error(OP, e))?;
        let step = ExerciseStep {
            number: row.try_get("number").map_err(|e| map_sqlx_error(OP, e))?,
            description: row.try_get("description").map_err(|e| map_sqlx_error(OP, e))?,
        };
        steps.entry(id).or_default().push(step);
    }

    let mut forms: HashMap<i32, Vec<MovementForm>> = HashMap::new();
    for row in form_rows {
        let id: i32 = row.try_get("exercise_id").map_err(|e| map_sqlx_error(OP, e))?;
        let raw: String = row.try_get("form").map_err(|e| map_sqlx_error(OP, e))?;
        let form = raw.parse::<MovementForm>().map_err(|e| corrupt(OP, e))?;
        forms.entry(id).or_default().push(form);
    }

    Ok(rows
        .into_iter()
        .map(|ExerciseRow(mut e)| {
            let id = e.id.get();
            e.requirements = requirements.remove(&id).unwrap_or_default();
            e.steps = steps.remove(&id).unwrap_or_default();
            e.forms = forms.remove(&id).unwrap_or_default();
            e
        })
        .collect())
}

async fn replace_requirements(
    conn: &mut PgConnection,
    id: ExerciseId,
    requirements: &[String],
) -> StoreResult<()> {
    const OP: &str = "replace_exercise_requirements";
    sqlx::query("DELETE FROM exercise_requirements WHERE exercise_id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    for (position, requirement) in requirements.iter().enumerate() {
        sqlx::query(
            "INSERT INTO exercise_requirements (exercise_id, position, requirement) VALUES ($1, $2, $3)",
        )
        .bind(id.get())
        .bind(position as i32)
        .bind(requirement)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    }
    Ok(())
}

async fn replace_steps(conn: &mut PgConnection, id: ExerciseId, steps: &[ExerciseStep]) -> StoreResult<()> {
    const OP: &str = "replace_exercise_steps";
    sqlx::query("DELETE FROM exercise_steps WHERE exercise_id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    for step in steps {
        sqlx::query(
            "INSERT INTO exercise_steps (exercise_id, number, description) VALUES ($1, $2, $3)",
        )
        .bind(id.get())
        .bind(step.number)
        .bind(&step.description)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    }
    Ok(())
}

async fn replace_forms(conn: &mut PgConnection, id: ExerciseId, forms: &[MovementForm]) -> StoreResult<()> {
    const OP: &str = "replace_exercise_forms";
    sqlx::query("DELETE FROM exercise_forms WHERE exercise_id = $1")
        .bind(id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    for (position, form) in forms.iter().enumerate() {
        sqlx::query("INSERT INTO exercise_forms (exercise_id, position, form) VALUES ($1, $2, $3)")
            .bind(id.get())
            .bind(position as i32)
            .bind(form.as_str())
            .execute(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error(OP, e))?;
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Exercises
// ─────────────────────────────────────────────────────────────────────────────

#[async_trait]
impl Repository<Exercise> for PgStore {
    type Draft = NewExercise;
    type Patch = ExercisePatch;

    #[instrument(skip(self, draft), err)]
    async fn create(&self, draft: NewExercise) -> StoreResult<Exercise> {
        let mut tx = self.begin("create_exercise").await?;
        let ExerciseRow(mut exercise) = sqlx::query_as::<_, ExerciseRow>(
            r#"
            INSERT INTO exercises (name, media)
            VALUES ($1, $2)
            RETURNING id, name, media
            "#,
        )
        .bind(&draft.name)
        .bind(&draft.media)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_exercise", e))?;

        replace_requirements(&mut tx, exercise.id, &draft.requirements).await?;
        replace_steps(&mut tx, exercise.id, &draft.steps).await?;
        replace_forms(&mut tx, exercise.id, &draft.forms).await?;
        commit(tx, "create_exercise").await?;

        exercise.requirements = draft.requirements;
        exercise.steps = draft.steps;
        exercise.forms = draft.forms;
        Ok(exercise)
    }

    #[instrument(skip(self), fields(exercise_id = %id), err)]
    async fn read(&self, id: ExerciseId) -> StoreResult<Option<Exercise>> {
        let mut conn = self.acquire("read_exercise").await?;
        let row = sqlx::query_as::<_, ExerciseRow>("SELECT id, name, media FROM exercises WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("read_exercise", e))?;
        match row {
            Some(row) => Ok(hydrate_exercises(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, patch), fields(exercise_id = %id), err)]
    async fn update(&self, id: ExerciseId, patch: ExercisePatch) -> StoreResult<Option<Exercise>> {
        let mut tx = self.begin("update_exercise").await?;
        let row = sqlx::query_as::<_, ExerciseRow>(
            r#"
            UPDATE exercises SET
                name = COALESCE($2, name),
                media = COALESCE($3, media)
            WHERE id = $1
            RETURNING id, name, media
            "#,
        )
        .bind(id.get())
        .bind(&patch.name)
        .bind(&patch.media)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_exercise", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        if let Some(requirements) = &patch.requirements {
            replace_requirements(&mut tx, id, requirements).await?;
        }
        if let Some(steps) = &patch.steps {
            replace_steps(&mut tx, id, steps).await?;
        }
        if let Some(forms) = &patch.forms {
            replace_forms(&mut tx, id, forms).await?;
        }
        let exercise = hydrate_exercises(&mut tx, vec![row]).await?.pop();
        commit(tx, "update_exercise").await?;
        Ok(exercise)
    }

    /// Component and workout links cascade.
    #[instrument(skip(self), fields(exercise_id = %id), err)]
    async fn delete(&self, id: ExerciseId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM exercises WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_exercise", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Exercise>> {
        let mut conn = self.acquire("list_exercises").await?;
        let rows = sqlx::query_as::<_, ExerciseRow>("SELECT id, name, media FROM exercises ORDER BY id ASC")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("list_exercises", e))?;
        hydrate_exercises(&mut conn, rows).await
    }
}

#[async_trait]
impl ExerciseRepository for PgStore {
    #[instrument(skip(self), fields(form_count = forms.len()), err)]
    async fn list_by_movement_forms(&self, forms: &[MovementForm]) -> StoreResult<Vec<Exercise>> {
        if forms.is_empty() {
            return Repository::<Exercise>::list(self).await;
        }
        let names: Vec<String> = forms.iter().map(|f| f.as_str().to_string()).collect();

        let mut conn = self.acquire("list_exercises_by_forms").await?;
        let rows = sqlx::query_as::<_, ExerciseRow>(
            r#"
            SELECT e.id, e.name, e.media
            FROM exercises e
            WHERE EXISTS (
                SELECT 1 FROM exercise_forms f
                WHERE f.exercise_id = e.id AND f.form = ANY($1)
            )
            ORDER BY e.id ASC
            "#,
        )
        .bind(&names)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_exercises_by_forms", e))?;
        hydrate_exercises(&mut conn, rows).await
    }

    #[instrument(skip(self), fields(id_count = ids.len()), err)]
    async fn list_by_ids(&self, ids: &[ExerciseId]) -> StoreResult<Vec<Exercise>> {
        let raw: Vec<i32> = ids.iter().map(|id| id.get()).collect();

        let mut conn = self.acquire("list_exercises_by_ids").await?;
        let rows = sqlx::query_as::<_, ExerciseRow>(
            "SELECT id, name, media FROM exercises WHERE id = ANY($1)",
        )
        .bind(&raw)
        .fetch_all(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error("list_exercises_by_ids", e))?;

        let by_id: HashMap<ExerciseId, Exercise> = hydrate_exercises(&mut conn, rows)
            .await?
            .into_iter()
            .map(|e| (e.id, e))
            .collect();
        Ok(ids.iter().filter_map(|id| by_id.get(id).cloned()).collect())
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workouts
// ─────────────────────────────────────────────────────────────────────────────

async fn attach_workout_exercises(
    conn: &mut PgConnection,
    rows: Vec<WorkoutRow>,
) -> StoreResult<Vec<Workout>> {
    const OP: &str = "load_workout_exercises";
    let ids: Vec<i32> = rows.iter().map(|r| r.0.id.get()).collect();
    let links = sqlx::query(
        r#"
        SELECT workout_id, exercise_id
        FROM workout_exercises
        WHERE workout_id = ANY($1)
        ORDER BY workout_id ASC, position ASC
        "#,
    )
    .bind(&ids)
    .fetch_all(&mut *conn)
    .await
    .map_err(|e| map_sqlx_error(OP, e))?;

    let mut by_workout: HashMap<i32, Vec<ExerciseId>> = HashMap::new();
    for link in links {
        let workout_id: i32 = link.try_get("workout_id").map_err(|e| map_sqlx_error(OP, e))?;
        let exercise_id: i32 = link.try_get("exercise_id").map_err(|e| map_sqlx_error(OP, e))?;
        by_workout.entry(workout_id).or_default().push(ExerciseId::new(exercise_id));
    }

    Ok(rows
        .into_iter()
        .map(|WorkoutRow(mut w)| {
            w.exercises = by_workout.remove(&w.id.get()).unwrap_or_default();
            w
        })
        .collect())
}

async fn replace_workout_exercises(
    conn: &mut PgConnection,
    workout_id: WorkoutId,
    exercises: &[ExerciseId],
) -> StoreResult<()> {
    const OP: &str = "replace_workout_exercises";
    sqlx::query("DELETE FROM workout_exercises WHERE workout_id = $1")
        .bind(workout_id.get())
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    for (position, exercise_id) in exercises.iter().enumerate() {
        sqlx::query(
            "INSERT INTO workout_exercises (workout_id, exercise_id, position) VALUES ($1, $2, $3)",
        )
        .bind(workout_id.get())
        .bind(exercise_id.get())
        .bind(position as i32)
        .execute(&mut *conn)
        .await
        .map_err(|e| map_sqlx_error(OP, e))?;
    }
    Ok(())
}

#[async_trait]
impl Repository<Workout> for PgStore {
    type Draft = NewWorkout;
    type Patch = WorkoutPatch;

    #[instrument(skip(self, draft), err)]
    async fn create(&self, draft: NewWorkout) -> StoreResult<Workout> {
        let mut tx = self.begin("create_workout").await?;
        let WorkoutRow(mut workout) = sqlx::query_as::<_, WorkoutRow>(
            "INSERT INTO workouts (name, kind) VALUES ($1, $2) RETURNING id, name, kind",
        )
        .bind(&draft.name)
        .bind(&draft.kind)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("create_workout", e))?;

        replace_workout_exercises(&mut tx, workout.id, &draft.exercises).await?;
        commit(tx, "create_workout").await?;

        workout.exercises = draft.exercises;
        Ok(workout)
    }

    #[instrument(skip(self), fields(workout_id = %id), err)]
    async fn read(&self, id: WorkoutId) -> StoreResult<Option<Workout>> {
        let mut conn = self.acquire("read_workout").await?;
        let row = sqlx::query_as::<_, WorkoutRow>("SELECT id, name, kind FROM workouts WHERE id = $1")
            .bind(id.get())
            .fetch_optional(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("read_workout", e))?;
        match row {
            Some(row) => Ok(attach_workout_exercises(&mut conn, vec![row]).await?.pop()),
            None => Ok(None),
        }
    }

    #[instrument(skip(self, patch), fields(workout_id = %id), err)]
    async fn update(&self, id: WorkoutId, patch: WorkoutPatch) -> StoreResult<Option<Workout>> {
        let mut tx = self.begin("update_workout").await?;
        let row = sqlx::query_as::<_, WorkoutRow>(
            r#"
            UPDATE workouts SET
                name = COALESCE($2, name),
                kind = COALESCE($3, kind)
            WHERE id = $1
            RETURNING id, name, kind
            "#,
        )
        .bind(id.get())
        .bind(&patch.name)
        .bind(&patch.kind)
        .fetch_optional(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("update_workout", e))?;

        let Some(row) = row else {
            return Ok(None);
        };
        if let Some(exercises) = &patch.exercises {
            replace_workout_exercises(&mut tx, id, exercises).await?;
        }
        let workout = attach_workout_exercises(&mut tx, vec![row]).await?.pop();
        commit(tx, "update_workout").await?;
        Ok(workout)
    }

    #[instrument(skip(self), fields(workout_id = %id), err)]
    async fn delete(&self, id: WorkoutId) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM workouts WHERE id = $1")
            .bind(id.get())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_workout", e))?;
        Ok(result.rows_affected() > 0)
    }

    #[instrument(skip(self), err)]
    async fn list(&self) -> StoreResult<Vec<Workout>> {
        let mut conn = self.acquire("list_workouts").await?;
        let rows = sqlx::query_as::<_, WorkoutRow>("SELECT id, name, kind FROM workouts ORDER BY id ASC")
            .fetch_all(&mut *conn)
            .await
            .map_err(|e| map_sqlx_error("list_workouts", e))?;
        attach_workout_exercises(&mut conn, rows).await
    }
}

impl WorkoutRepository for PgStore {}
