//! Error responses.
//!
//! Every failure leaves the API as `{ "code": <int>, "message": <string> }`.
//! Stable failures carry an [`ErrorCode`]; free-form validation failures use
//! code `400` with the validation message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use skillsgarden_auth::{PasswordError, TokenError};
use skillsgarden_core::DomainError;
use skillsgarden_infra::{BlobError, StoreError};
use skillsgarden_locations::RegistrationError;

/// Free-form validation failures.
pub const VALIDATION_CODE: i32 = 400;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ErrorCode {
    InvalidRequestBody,
    InvalidPathParameter,
    InvalidQueryParameter,
    CanOnlyViewOwnAccount,
    CanOnlyEditOwnAccount,
    InvalidMovementFormProvided,
    InvalidExerciseProvided,
    CannotRegisterForOwnEvent,
    EventRegistrationLimitReached,
    EventAlreadyRegistered,
    OnlyLogYourself,
    GetOnlyLogYourself,
    OnlyDeleteOwnLogs,
    CanOnlyViewOwnRegistrations,

    BearerTokenMissing,
    BearerTokenInvalid,
    RoleNoPermissions,
    InvalidCombinationOfEmailAndPassword,
    UnauthorizedToSetUserType,
    UnauthorizedToDeleteUser,

    UserNotFound,
    LocationNotFound,
    EventNotFound,
    EventDeleteFailed,
    EventRegistrationNotFound,
    ComponentNotFound,
    ComponentDeleteFailed,
    ExerciseNotFound,
    WorkoutNotFound,
    BeaconNotFound,
    ImageNotFound,
}

impl ErrorCode {
    pub const fn code(self) -> i32 {
        match self {
            ErrorCode::InvalidRequestBody => 4001,
            ErrorCode::InvalidPathParameter => 4002,
            ErrorCode::InvalidQueryParameter => 4003,
            ErrorCode::CanOnlyViewOwnAccount => 4004,
            ErrorCode::CanOnlyEditOwnAccount => 4005,
            ErrorCode::InvalidMovementFormProvided => 40013,
            ErrorCode::InvalidExerciseProvided => 40014,
            ErrorCode::CannotRegisterForOwnEvent => 40015,
            ErrorCode::EventRegistrationLimitReached => 40016,
            ErrorCode::EventAlreadyRegistered => 40017,
            ErrorCode::OnlyLogYourself => 40018,
            ErrorCode::GetOnlyLogYourself => 40019,
            ErrorCode::OnlyDeleteOwnLogs => 40020,
            ErrorCode::CanOnlyViewOwnRegistrations => 40021,
            ErrorCode::BearerTokenMissing => 4011,
            ErrorCode::BearerTokenInvalid => 4012,
            ErrorCode::RoleNoPermissions => 4013,
            ErrorCode::InvalidCombinationOfEmailAndPassword => 4014,
            ErrorCode::UnauthorizedToSetUserType => 4015,
            ErrorCode::UnauthorizedToDeleteUser => 4016,
            ErrorCode::UserNotFound => 4041,
            ErrorCode::LocationNotFound => 4042,
            ErrorCode::EventNotFound => 4043,
            ErrorCode::EventDeleteFailed => 4044,
            ErrorCode::EventRegistrationNotFound => 4045,
            ErrorCode::ComponentNotFound => 4046,
            ErrorCode::ImageNotFound => 4047,
            ErrorCode::ComponentDeleteFailed => 4048,
            ErrorCode::ExerciseNotFound => 4049,
            ErrorCode::WorkoutNotFound => 40410,
            ErrorCode::BeaconNotFound => 40411,
        }
    }

    pub const fn message(self) -> &'static str {
        match self {
            ErrorCode::InvalidRequestBody => "The request body you provided was invalid/incomplete",
            ErrorCode::InvalidPathParameter => "The path parameter(s) you provided was/were invalid",
            ErrorCode::InvalidQueryParameter => "The query parameter(s) you provided was/were invalid",
            ErrorCode::CanOnlyViewOwnAccount => "You can only view your own account",
            ErrorCode::CanOnlyEditOwnAccount => "You can only edit your own account",
            ErrorCode::InvalidMovementFormProvided => "Invalid movement form(s) provided",
            ErrorCode::InvalidExerciseProvided => "Invalid exercise provided",
            ErrorCode::CannotRegisterForOwnEvent => "You cannot register for an event you created",
            ErrorCode::EventRegistrationLimitReached => "The event registration limit has been reached",
            ErrorCode::EventAlreadyRegistered => "You are already registered for this event",
            ErrorCode::OnlyLogYourself => "You can't log someone else",
            ErrorCode::GetOnlyLogYourself => "You can only get your own logs",
            ErrorCode::OnlyDeleteOwnLogs => "You can only delete your own logs",
            ErrorCode::CanOnlyViewOwnRegistrations => "You can only view your own registrations",
            ErrorCode::BearerTokenMissing => "Bearer token is missing",
            ErrorCode::BearerTokenInvalid => "Bearer token is invalid",
            ErrorCode::RoleNoPermissions => "You are not authorized to perform this operation",
            ErrorCode::InvalidCombinationOfEmailAndPassword => {
                "Combination of email and password is incorrect"
            }
            ErrorCode::UnauthorizedToSetUserType => "You are not authorized to set an user type",
            ErrorCode::UnauthorizedToDeleteUser => "You are not authorized to delete this user",
            ErrorCode::UserNotFound => "User not found",
            ErrorCode::LocationNotFound => "Location not found",
            ErrorCode::EventNotFound => "Event not found",
            ErrorCode::EventDeleteFailed => "Unable to delete event",
            ErrorCode::EventRegistrationNotFound => "Event registration was not found",
            ErrorCode::ComponentNotFound => "Component not found",
            ErrorCode::ImageNotFound => "Image not found",
            ErrorCode::ComponentDeleteFailed => "Unable to delete component",
            ErrorCode::ExerciseNotFound => "Exercise not found",
            ErrorCode::WorkoutNotFound => "Workout not found",
            ErrorCode::BeaconNotFound => "Beacon not found",
        }
    }

    pub const fn status(self) -> StatusCode {
        match self {
            ErrorCode::CanOnlyViewOwnAccount
            | ErrorCode::CanOnlyEditOwnAccount
            | ErrorCode::CanOnlyViewOwnRegistrations
            | ErrorCode::RoleNoPermissions
            | ErrorCode::UnauthorizedToSetUserType
            | ErrorCode::UnauthorizedToDeleteUser => StatusCode::FORBIDDEN,

            ErrorCode::BearerTokenMissing
            | ErrorCode::BearerTokenInvalid
            | ErrorCode::InvalidCombinationOfEmailAndPassword => StatusCode::UNAUTHORIZED,

            ErrorCode::UserNotFound
            | ErrorCode::LocationNotFound
            | ErrorCode::EventNotFound
            | ErrorCode::EventRegistrationNotFound
            | ErrorCode::ComponentNotFound
            | ErrorCode::ComponentDeleteFailed
            | ErrorCode::ExerciseNotFound
            | ErrorCode::WorkoutNotFound
            | ErrorCode::BeaconNotFound
            | ErrorCode::ImageNotFound => StatusCode::NOT_FOUND,

            ErrorCode::InvalidRequestBody
            | ErrorCode::InvalidPathParameter
            | ErrorCode::InvalidQueryParameter
            | ErrorCode::InvalidMovementFormProvided
            | ErrorCode::InvalidExerciseProvided
            | ErrorCode::CannotRegisterForOwnEvent
            | ErrorCode::EventRegistrationLimitReached
            | ErrorCode::EventAlreadyRegistered
            | ErrorCode::OnlyLogYourself
            | ErrorCode::GetOnlyLogYourself
            | ErrorCode::OnlyDeleteOwnLogs
            | ErrorCode::EventDeleteFailed => StatusCode::BAD_REQUEST,
        }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    code: i32,
    message: &'a str,
}

/// An error on its way out of a handler.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message} (code {code})")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: i32,
    pub message: String,
}

impl ApiError {
    pub fn new(status: StatusCode, code: i32, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// 400 with a free-form validation message.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, VALIDATION_CODE, message)
    }

    /// 500 with a generic message; the cause goes to the log only.
    pub fn internal(context: &str, cause: &dyn std::fmt::Display) -> Self {
        tracing::error!(error = %cause, "{context}");
        Self::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            StatusCode::INTERNAL_SERVER_ERROR.as_u16().into(),
            "Internal server error",
        )
    }
}

impl From<ErrorCode> for ApiError {
    fn from(code: ErrorCode) -> Self {
        Self::new(code.status(), code.code(), code.message())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        json_error(self.status, self.code, &self.message)
    }
}

pub fn json_error(status: StatusCode, code: i32, message: &str) -> Response {
    (status, axum::Json(ErrorBody { code, message })).into_response()
}

impl From<DomainError> for ApiError {
    fn from(err: DomainError) -> Self {
        match err {
            DomainError::Validation(msg) => Self::validation(msg),
            DomainError::InvalidId(_) => ErrorCode::InvalidPathParameter.into(),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        Self::internal("storage failure", &err)
    }
}

impl From<BlobError> for ApiError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::UnsupportedType(_) => {
                Self::validation("You can only upload .png .jpg or .jpeg images")
            }
            other => Self::internal("blob storage failure", &other),
        }
    }
}

impl From<PasswordError> for ApiError {
    fn from(err: PasswordError) -> Self {
        Self::internal("password hashing failure", &err)
    }
}

impl From<TokenError> for ApiError {
    fn from(err: TokenError) -> Self {
        Self::internal("token issuing failure", &err)
    }
}

impl From<RegistrationError> for ApiError {
    fn from(err: RegistrationError) -> Self {
        match err {
            RegistrationError::OwnEvent => ErrorCode::CannotRegisterForOwnEvent.into(),
            RegistrationError::AlreadyRegistered => ErrorCode::EventAlreadyRegistered.into(),
            RegistrationError::LimitReached => ErrorCode::EventRegistrationLimitReached.into(),
        }
    }
}
