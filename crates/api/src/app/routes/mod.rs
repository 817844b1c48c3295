use axum::Router;

pub mod auth;
pub mod beacons;
pub mod components;
pub mod events;
pub mod exercises;
pub mod images;
pub mod locations;
pub mod system;
pub mod users;
pub mod workouts;

/// Router for every resource endpoint. Handlers that take a
/// [`PrincipalContext`](crate::context::PrincipalContext) require a bearer
/// token; the rest are public.
pub fn router() -> Router {
    Router::new()
        .merge(auth::router())
        .nest("/locations", locations::router())
        .nest("/exercises", exercises::router())
        .nest("/workouts", workouts::router())
        .nest("/beacons", beacons::router())
        .nest("/users", users::router())
        .nest("/images", images::router())
}
