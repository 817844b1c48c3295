use chrono::Utc;
use tracing::instrument;

use skillsgarden_core::{EventId, LocationId, UserId};
use skillsgarden_infra::RegisterOutcome;
use skillsgarden_locations::{Event, EventPatch, NewEvent};

use super::AppServices;
use crate::app::dto::EventResponse;
use crate::app::errors::{ApiError, ErrorCode};
use crate::app::form::FormData;

impl AppServices {
    async fn event_response(&self, event: Event) -> Result<EventResponse, ApiError> {
        let organisor = self
            .repos
            .users
            .read(event.organisor_id)
            .await?
            .map(|u| u.name)
            .unwrap_or_default();
        let registrations = self.repos.events.count_registrations(event.id).await?;
        let url = self.image_url(&event.image);
        Ok(EventResponse::new(event, organisor, url, registrations))
    }

    async fn event_responses(&self, events: Vec<Event>) -> Result<Vec<EventResponse>, ApiError> {
        let mut out = Vec::with_capacity(events.len());
        for event in events {
            out.push(self.event_response(event).await?);
        }
        Ok(out)
    }

    /// The event, if it belongs to `location_id`.
    pub async fn event_in_location(&self, location_id: LocationId, event_id: EventId) -> Result<Event, ApiError> {
        self.ensure_location(location_id).await?;
        self.repos
            .events
            .read(event_id)
            .await?
            .filter(|e| e.location_id == location_id)
            .ok_or_else(|| ErrorCode::EventNotFound.into())
    }

    /// Upcoming events only, unless `all`.
    pub async fn list_events(&self, location_id: LocationId, all: bool) -> Result<Vec<EventResponse>, ApiError> {
        self.ensure_location(location_id).await?;
        let now = Utc::now();
        let events = self
            .repos
            .events
            .list_by_location(location_id)
            .await?
            .into_iter()
            .filter(|e| all || e.is_upcoming(now))
            .collect();
        self.event_responses(events).await
    }

    pub async fn get_event(&self, location_id: LocationId, event_id: EventId) -> Result<EventResponse, ApiError> {
        let event = self.event_in_location(location_id, event_id).await?;
        self.event_response(event).await
    }

    pub async fn create_event(
        &self,
        location_id: LocationId,
        organisor_id: UserId,
        mut form: FormData,
    ) -> Result<EventResponse, ApiError> {
        self.ensure_location(location_id).await?;

        let (Some(title), Some(description), Some(start_time), Some(max_registrations), Some(image)) = (
            form.text("Title"),
            form.text("Description"),
            form.datetime("StartTime")?,
            form.int("MaxRegistrations")?,
            form.take_image("Image"),
        ) else {
            return Err(ErrorCode::InvalidRequestBody.into());
        };

        let mut draft = NewEvent {
            location_id,
            organisor_id,
            title,
            description,
            start_time,
            max_registrations,
            image: String::new(),
        };
        draft.validate()?;
        draft.image = self.save_image(image).await?;

        let event = self.repos.events.create(draft).await?;
        tracing::info!(event_id = %event.id, location_id = %location_id, "event created");
        self.event_response(event).await
    }

    pub async fn update_event(
        &self,
        location_id: LocationId,
        event_id: EventId,
        mut form: FormData,
    ) -> Result<EventResponse, ApiError> {
        let current = self.event_in_location(location_id, event_id).await?;

        let mut patch = EventPatch {
            title: form.text("Title"),
            description: form.text("Description"),
            start_time: form.datetime("StartTime")?,
            max_registrations: form.int("MaxRegistrations")?,
            image: None,
        };
        patch.validate()?;
        if let Some(upload) = form.take_image("Image") {
            patch.image = Some(self.save_image(upload).await?);
        }

        let new_image = patch.image.clone();
        let outcome = self.repos.events.update(event_id, patch).await;
        let event = self
            .settle_update(outcome, new_image.as_deref(), ErrorCode::EventNotFound)
            .await?;
        if new_image.is_some() {
            self.discard_image(&current.image).await;
        }
        self.event_response(event).await
    }

    pub async fn delete_event(&self, location_id: LocationId, event_id: EventId) -> Result<(), ApiError> {
        let event = self.event_in_location(location_id, event_id).await?;
        if !self.repos.events.delete(event_id).await? {
            return Err(ErrorCode::EventDeleteFailed.into());
        }
        self.discard_image(&event.image).await;
        tracing::info!(event_id = %event_id, "event deleted");
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn register_for_event(
        &self,
        location_id: LocationId,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<(), ApiError> {
        self.event_in_location(location_id, event_id).await?;
        match self.repos.events.create_registration(event_id, user_id).await? {
            RegisterOutcome::Registered(registration) => {
                tracing::info!(registration_id = %registration.id, "registered for event");
                Ok(())
            }
            RegisterOutcome::Rejected(reason) => Err(reason.into()),
            RegisterOutcome::EventNotFound => Err(ErrorCode::EventNotFound.into()),
        }
    }

    pub async fn unregister_from_event(
        &self,
        location_id: LocationId,
        event_id: EventId,
        user_id: UserId,
    ) -> Result<(), ApiError> {
        self.event_in_location(location_id, event_id).await?;
        if !self.repos.events.delete_registration(event_id, user_id).await? {
            return Err(ErrorCode::EventRegistrationNotFound.into());
        }
        Ok(())
    }

    pub async fn registered_events(&self, user_id: UserId) -> Result<Vec<EventResponse>, ApiError> {
        let events = self.repos.events.list_registered_events_for_user(user_id).await?;
        self.event_responses(events).await
    }
}
