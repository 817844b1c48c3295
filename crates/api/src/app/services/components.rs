use skillsgarden_core::{ComponentId, ExerciseId, LocationId};
use skillsgarden_locations::{Component, ComponentPatch, NewComponent, dedup_ids};

use super::AppServices;
use crate::app::dto::{ComponentResponse, ExerciseResponse};
use crate::app::errors::{ApiError, ErrorCode};
use crate::app::form::FormData;

impl AppServices {
    fn component_response(&self, component: Component) -> ComponentResponse {
        let url = self.image_url(&component.image);
        ComponentResponse::new(component, url)
    }

    /// The component, if it belongs to `location_id`.
    pub async fn component_in_location(
        &self,
        location_id: LocationId,
        component_id: ComponentId,
    ) -> Result<Component, ApiError> {
        self.ensure_location(location_id).await?;
        self.repos
            .components
            .read(component_id)
            .await?
            .filter(|c| c.location_id == location_id)
            .ok_or_else(|| ErrorCode::ComponentNotFound.into())
    }

    /// 400 `INVALID_EXERCISE_PROVIDED` unless every id names an exercise.
    pub(super) async fn ensure_exercises(&self, ids: &[ExerciseId]) -> Result<(), ApiError> {
        for id in ids {
            if !self.repos.exercises.exists(*id).await? {
                return Err(ErrorCode::InvalidExerciseProvided.into());
            }
        }
        Ok(())
    }

    pub async fn list_components(&self, location_id: LocationId) -> Result<Vec<ComponentResponse>, ApiError> {
        self.ensure_location(location_id).await?;
        let components = self.repos.components.list_by_location(location_id).await?;
        Ok(components.into_iter().map(|c| self.component_response(c)).collect())
    }

    pub async fn get_component(
        &self,
        location_id: LocationId,
        component_id: ComponentId,
    ) -> Result<ComponentResponse, ApiError> {
        let component = self.component_in_location(location_id, component_id).await?;
        Ok(self.component_response(component))
    }

    pub async fn create_component(
        &self,
        location_id: LocationId,
        mut form: FormData,
    ) -> Result<ComponentResponse, ApiError> {
        self.ensure_location(location_id).await?;

        let (Some(name), Some(description), Some(exercises), Some(image)) = (
            form.text("Name"),
            form.text("Description"),
            form.int_list("Exercises")?,
            form.take_image("Image"),
        ) else {
            return Err(ErrorCode::InvalidRequestBody.into());
        };

        let exercises: Vec<ExerciseId> = exercises.into_iter().map(ExerciseId::new).collect();
        let mut draft = NewComponent {
            location_id,
            name,
            description,
            image: String::new(),
            exercises: dedup_ids(&exercises),
        };
        draft.validate()?;
        self.ensure_exercises(&draft.exercises).await?;
        draft.image = self.save_image(image).await?;

        let component = self.repos.components.create(draft).await?;
        tracing::info!(component_id = %component.id, location_id = %location_id, "component created");
        Ok(self.component_response(component))
    }

    pub async fn update_component(
        &self,
        location_id: LocationId,
        component_id: ComponentId,
        mut form: FormData,
    ) -> Result<ComponentResponse, ApiError> {
        let current = self.component_in_location(location_id, component_id).await?;

        let mut patch = ComponentPatch {
            name: form.text("Name"),
            description: form.text("Description"),
            image: None,
            exercises: form
                .int_list("Exercises")?
                .map(|ids| ids.into_iter().map(ExerciseId::new).collect()),
        };
        patch.validate()?;
        if let Some(ids) = &patch.exercises {
            self.ensure_exercises(ids).await?;
        }
        if let Some(upload) = form.take_image("Image") {
            patch.image = Some(self.save_image(upload).await?);
        }

        let new_image = patch.image.clone();
        let outcome = self.repos.components.update(component_id, patch).await;
        let component = self
            .settle_update(outcome, new_image.as_deref(), ErrorCode::ComponentNotFound)
            .await?;
        if new_image.is_some() {
            self.discard_image(&current.image).await;
        }
        Ok(self.component_response(component))
    }

    pub async fn delete_component(&self, location_id: LocationId, component_id: ComponentId) -> Result<(), ApiError> {
        let component = self.component_in_location(location_id, component_id).await?;
        if !self.repos.components.delete(component_id).await? {
            return Err(ErrorCode::ComponentDeleteFailed.into());
        }
        self.discard_image(&component.image).await;
        tracing::info!(component_id = %component_id, "component deleted");
        Ok(())
    }

    /// Exercises linked to a component, in link order.
    pub async fn component_exercises(
        &self,
        location_id: LocationId,
        component_id: ComponentId,
    ) -> Result<Vec<ExerciseResponse>, ApiError> {
        let component = self.component_in_location(location_id, component_id).await?;
        let exercises = self.repos.exercises.list_by_ids(&component.exercises).await?;
        Ok(exercises.into_iter().map(ExerciseResponse::from).collect())
    }
}
