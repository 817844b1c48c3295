//! Events hosted at a location and their registrations.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use skillsgarden_core::validation::{check_length, check_length_opt, check_non_negative};
use skillsgarden_core::{DomainResult, Entity, EventId, LocationId, RegistrationId, UserId};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub location_id: LocationId,
    pub organisor_id: UserId,
    pub title: String,
    pub description: String,
    pub start_time: Option<DateTime<Utc>>,
    /// `None` means no cap.
    pub max_registrations: Option<i32>,
    pub image: String,
}

impl Entity for Event {
    type Id = EventId;

    fn id(&self) -> EventId {
        self.id
    }
}

impl Event {
    /// Events without a start time are always listed.
    pub fn is_upcoming(&self, now: DateTime<Utc>) -> bool {
        self.start_time.is_none_or(|t| t >= now)
    }

    pub fn is_organised_by(&self, user_id: UserId) -> bool {
        self.organisor_id == user_id
    }

    /// Decide whether `user_id` may register, given the current state.
    pub fn check_registration(
        &self,
        user_id: UserId,
        already_registered: bool,
        registrations: usize,
    ) -> Result<(), RegistrationError> {
        if self.is_organised_by(user_id) {
            return Err(RegistrationError::OwnEvent);
        }
        if already_registered {
            return Err(RegistrationError::AlreadyRegistered);
        }
        if let Some(max) = self.max_registrations {
            if registrations >= usize::try_from(max).unwrap_or(0) {
                return Err(RegistrationError::LimitReached);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationError {
    #[error("You cannot register for an event you created")]
    OwnEvent,

    #[error("You are already registered for this event")]
    AlreadyRegistered,

    #[error("The event registration limit has been reached")]
    LimitReached,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewEvent {
    pub location_id: LocationId,
    pub organisor_id: UserId,
    pub title: String,
    pub description: String,
    pub start_time: DateTime<Utc>,
    pub max_registrations: i32,
    pub image: String,
}

impl NewEvent {
    pub fn validate(&self) -> DomainResult<()> {
        check_length("Title", &self.title, 2, 50)?;
        check_length("Description", &self.description, 2, 500)?;
        check_non_negative("MaxRegistrations", self.max_registrations)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub max_registrations: Option<i32>,
    pub image: Option<String>,
}

impl EventPatch {
    pub fn validate(&self) -> DomainResult<()> {
        check_length_opt("Title", self.title.as_deref(), 2, 50)?;
        check_length_opt("Description", self.description.as_deref(), 2, 500)?;
        if let Some(max) = self.max_registrations {
            check_non_negative("MaxRegistrations", max)?;
        }
        Ok(())
    }

    pub fn apply(&self, event: &mut Event) {
        if let Some(v) = &self.title {
            event.title = v.clone();
        }
        if let Some(v) = &self.description {
            event.description = v.clone();
        }
        if let Some(v) = self.start_time {
            event.start_time = Some(v);
        }
        if let Some(v) = self.max_registrations {
            event.max_registrations = Some(v);
        }
        if let Some(v) = &self.image {
            event.image = v.clone();
        }
    }
}

/// A user's registration for an event. Unique per (event, user).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub user_id: UserId,
}

impl Entity for Registration {
    type Id = RegistrationId;

    fn id(&self) -> RegistrationId {
        self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use proptest::prelude::*;

    fn event(max: Option<i32>) -> Event {
        Event {
            id: EventId::new(1),
            location_id: LocationId::new(1),
            organisor_id: UserId::new(10),
            title: "Bootcamp".into(),
            description: "Outdoor training".into(),
            start_time: Some(Utc::now() + Duration::days(1)),
            max_registrations: max,
            image: "e.png".into(),
        }
    }

    #[test]
    fn organiser_cannot_register() {
        let e = event(Some(5));
        assert_eq!(
            e.check_registration(UserId::new(10), false, 0),
            Err(RegistrationError::OwnEvent)
        );
    }

    #[test]
    fn duplicate_registration_rejected_before_limit() {
        let e = event(Some(1));
        assert_eq!(
            e.check_registration(UserId::new(2), true, 1),
            Err(RegistrationError::AlreadyRegistered)
        );
    }

    #[test]
    fn zero_cap_blocks_everyone_and_none_is_unlimited() {
        assert_eq!(
            event(Some(0)).check_registration(UserId::new(2), false, 0),
            Err(RegistrationError::LimitReached)
        );
        assert!(event(None).check_registration(UserId::new(2), false, 10_000).is_ok());
    }

    #[test]
    fn upcoming_filter() {
        let now = Utc::now();
        let mut e = event(None);
        assert!(e.is_upcoming(now));
        e.start_time = Some(now - Duration::hours(1));
        assert!(!e.is_upcoming(now));
        e.start_time = None;
        assert!(e.is_upcoming(now));
    }

    #[test]
    fn negative_cap_rejected() {
        let patch = EventPatch { max_registrations: Some(-1), ..Default::default() };
        assert_eq!(
            patch.validate().unwrap_err().to_string(),
            "MaxRegistrations can not be negative"
        );
    }

    proptest! {
        #[test]
        fn cap_is_respected(max in 0i32..50, count in 0usize..60) {
            let e = event(Some(max));
            let result = e.check_registration(UserId::new(2), false, count);
            prop_assert_eq!(result.is_ok(), count < max as usize);
        }
    }
}
