//! Request/response DTOs and their mapping from domain types.
//!
//! JSON field names are camelCase; request bodies also accept the PascalCase
//! spelling clients of the form endpoints use.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillsgarden_auth::{Gender, Role, User};
use skillsgarden_core::{ComponentId, EventId, ExerciseId, LocationId, UserId, WorkoutId};
use skillsgarden_exercises::{Exercise, MovementForm, Workout};
use skillsgarden_locations::{Component, Event, Location};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
}

/// Account payload for `/register`, `POST /users` and `PUT /users/{id}`.
///
/// `dateofbirth` stays textual until the service parses it so a bad value
/// reports a field message instead of a JSON error.
#[derive(Debug, Default, Deserialize)]
pub struct UserBody {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Email")]
    pub email: Option<String>,
    #[serde(alias = "Password")]
    pub password: Option<String>,
    #[serde(alias = "Dateofbirth", alias = "dateOfBirth")]
    pub dateofbirth: Option<String>,
    #[serde(alias = "Gender")]
    pub gender: Option<Gender>,
    #[serde(rename = "type", alias = "Type")]
    pub role: Option<Role>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ExerciseBody {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "Media")]
    pub media: Option<String>,
    #[serde(alias = "Requirements")]
    pub requirements: Option<Vec<String>>,
    #[serde(alias = "Steps")]
    pub steps: Option<Vec<String>>,
    #[serde(alias = "Forms")]
    pub forms: Option<Vec<MovementForm>>,
}

#[derive(Debug, Default, Deserialize)]
pub struct WorkoutBody {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(rename = "type", alias = "Type")]
    pub kind: Option<String>,
    #[serde(alias = "Exercises")]
    pub exercises: Option<Vec<ExerciseId>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BeaconBody {
    #[serde(alias = "Name")]
    pub name: Option<String>,
    #[serde(alias = "LocationId")]
    pub location_id: Option<LocationId>,
    #[serde(alias = "Lat")]
    pub lat: Option<f64>,
    #[serde(alias = "Lng")]
    pub lng: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
pub struct EventListQuery {
    pub all: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
pub struct GenerateQuery {
    pub amount: Option<i64>,
    pub movementforms: Option<String>,
}

// -------------------------
// Response DTOs
// -------------------------

#[derive(Debug, Clone, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub dateofbirth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    #[serde(rename = "type")]
    pub role: Role,
}

impl From<&User> for UserResponse {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            dateofbirth: user.date_of_birth,
            gender: user.gender,
            role: user.role,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Locations, components and events carry a signed image URL, not the blob
/// name; the service layer fills it in.
#[derive(Debug, Clone, Serialize)]
pub struct LocationResponse {
    pub id: LocationId,
    pub name: String,
    pub city: String,
    pub lat: f64,
    pub lng: f64,
    pub image: String,
}

impl LocationResponse {
    pub fn new(location: Location, image_url: String) -> Self {
        Self {
            id: location.id,
            name: location.name,
            city: location.city,
            lat: location.lat,
            lng: location.lng,
            image: image_url,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComponentResponse {
    pub id: ComponentId,
    pub name: String,
    pub description: String,
    pub image: String,
    pub exercises: Vec<ExerciseId>,
}

impl ComponentResponse {
    pub fn new(component: Component, image_url: String) -> Self {
        Self {
            id: component.id,
            name: component.name,
            description: component.description,
            image: image_url,
            exercises: component.exercises,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EventResponse {
    pub id: EventId,
    pub title: String,
    /// Organiser display name; empty when the account no longer exists.
    pub organisor: String,
    pub description: String,
    pub start_time: Option<DateTime<Utc>>,
    pub image: String,
    pub max_registrations: Option<i32>,
    pub registrations: usize,
}

impl EventResponse {
    pub fn new(event: Event, organisor: String, image_url: String, registrations: usize) -> Self {
        Self {
            id: event.id,
            title: event.title,
            organisor,
            description: event.description,
            start_time: event.start_time,
            image: image_url,
            max_registrations: event.max_registrations,
            registrations,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ExerciseResponse {
    pub id: ExerciseId,
    pub name: String,
    pub media: Option<String>,
    pub requirements: Vec<String>,
    pub steps: Vec<String>,
    pub forms: Vec<MovementForm>,
}

impl From<Exercise> for ExerciseResponse {
    fn from(exercise: Exercise) -> Self {
        let steps = exercise.step_descriptions();
        Self {
            id: exercise.id,
            name: exercise.name,
            media: exercise.media,
            requirements: exercise.requirements,
            steps,
            forms: exercise.forms,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutResponse {
    pub id: WorkoutId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub exercises: Vec<ExerciseResponse>,
}

impl WorkoutResponse {
    pub fn new(workout: Workout, exercises: Vec<Exercise>) -> Self {
        Self {
            id: workout.id,
            name: workout.name,
            kind: workout.kind,
            exercises: exercises.into_iter().map(ExerciseResponse::from).collect(),
        }
    }
}

/// Workout overview row: exercises are counted, not expanded.
#[derive(Debug, Clone, Serialize)]
pub struct WorkoutListResponse {
    pub id: WorkoutId,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub exercises: usize,
}

impl From<Workout> for WorkoutListResponse {
    fn from(workout: Workout) -> Self {
        Self {
            id: workout.id,
            name: workout.name,
            kind: workout.kind,
            exercises: workout.exercises.len(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use skillsgarden_exercises::ExerciseStep;

    #[test]
    fn event_response_uses_camel_case() {
        let event = Event {
            id: EventId::new(3),
            location_id: LocationId::new(1),
            organisor_id: UserId::new(2),
            title: "Bootcamp".into(),
            description: "Kom mee".into(),
            start_time: None,
            max_registrations: Some(20),
            image: "a.png".into(),
        };
        let value = serde_json::to_value(EventResponse::new(event, "Pete".into(), "http://x/a.png".into(), 4)).unwrap();
        assert_eq!(value["maxRegistrations"], 20);
        assert_eq!(value["startTime"], serde_json::Value::Null);
        assert_eq!(value["organisor"], "Pete");
        assert_eq!(value["registrations"], 4);
    }

    #[test]
    fn exercise_steps_flatten_in_order() {
        let exercise = Exercise {
            id: ExerciseId::new(1),
            name: "Klimmen".into(),
            media: None,
            requirements: vec![],
            steps: vec![
                ExerciseStep { number: 2, description: "second".into() },
                ExerciseStep { number: 1, description: "first".into() },
            ],
            forms: vec![MovementForm::Klimmen],
        };
        let value = serde_json::to_value(ExerciseResponse::from(exercise)).unwrap();
        assert_eq!(value["steps"], json!(["first", "second"]));
        assert_eq!(value["forms"], json!(["klimmen"]));
    }

    #[test]
    fn user_body_accepts_both_spellings() {
        let body: UserBody = serde_json::from_value(json!({
            "Name": "Pete",
            "email": "pete@mail.com",
            "Dateofbirth": "2000-01-01",
            "gender": "Male",
            "type": "Organiser",
        }))
        .unwrap();
        assert_eq!(body.name.as_deref(), Some("Pete"));
        assert_eq!(body.dateofbirth.as_deref(), Some("2000-01-01"));
        assert_eq!(body.gender, Some(Gender::Male));
        assert_eq!(body.role, Some(Role::Organiser));
    }
}
