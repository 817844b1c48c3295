use chrono::{DateTime, Utc};
use tracing::instrument;

use skillsgarden_auth::{Gender, NewUser, Role, User, UserFields, UserPatch, normalize_email};
use skillsgarden_core::UserId;
use skillsgarden_core::validation::required;
use skillsgarden_infra::{AdminSeed, StoreError};

use super::AppServices;
use crate::app::dto::{LoginResponse, UserBody, UserResponse};
use crate::app::errors::{ApiError, ErrorCode};
use crate::app::form::parse_datetime;

const EMAIL_TAKEN: &str = "Email does already exist";

fn parse_date_of_birth(raw: Option<&str>) -> Result<Option<DateTime<Utc>>, ApiError> {
    raw.map(|v| parse_datetime(v).ok_or_else(|| ApiError::validation("Date of birth must be Date Format")))
        .transpose()
}

impl AppServices {
    #[instrument(skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let invalid = || ApiError::from(ErrorCode::InvalidCombinationOfEmailAndPassword);

        let user = self
            .repos
            .users
            .find_by_email(&normalize_email(email))
            .await?
            .ok_or_else(invalid)?;

        if !self.passwords.verify(password, &user.password_hash).await? {
            return Err(invalid());
        }

        let token = self.tokens.issue(user.id, user.role, Utc::now())?;
        tracing::info!(user_id = %user.id, "user logged in");
        Ok(LoginResponse {
            token: token.value,
            user: UserResponse::from(&user),
        })
    }

    /// Create an account from a full body. `role` is the already-authorized
    /// account type.
    pub async fn create_user(&self, body: UserBody, role: Role) -> Result<UserResponse, ApiError> {
        let now = Utc::now();
        let date_of_birth = parse_date_of_birth(body.dateofbirth.as_deref())?;
        UserFields {
            name: body.name.as_deref(),
            email: body.email.as_deref(),
            password: body.password.as_deref(),
            date_of_birth,
        }
        .validate(now)?;

        let name = required("Name", body.name)?;
        let email = normalize_email(&required("Email", body.email)?);
        let password = required("Password", body.password)?;
        let date_of_birth = required("Dateofbirth", date_of_birth)?;
        let gender = required("Gender", body.gender)?;

        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Err(ApiError::validation(EMAIL_TAKEN));
        }

        let password_hash = self.passwords.hash(&password).await?;
        let user = self
            .repos
            .users
            .create(NewUser {
                name,
                email,
                password_hash,
                date_of_birth,
                gender,
                role,
            })
            .await
            .map_err(email_conflict)?;

        tracing::info!(user_id = %user.id, role = %user.role, "user created");
        Ok(UserResponse::from(&user))
    }

    pub async fn list_users(&self) -> Result<Vec<UserResponse>, ApiError> {
        let users = self.repos.users.list().await?;
        Ok(users.iter().map(UserResponse::from).collect())
    }

    pub async fn get_user(&self, id: UserId) -> Result<UserResponse, ApiError> {
        let user = self.find_user(id).await?;
        Ok(UserResponse::from(&user))
    }

    /// Partial update; only present fields are validated and written.
    pub async fn update_user(&self, id: UserId, body: UserBody) -> Result<UserResponse, ApiError> {
        let date_of_birth = parse_date_of_birth(body.dateofbirth.as_deref())?;
        UserFields {
            name: body.name.as_deref(),
            email: body.email.as_deref(),
            password: body.password.as_deref(),
            date_of_birth,
        }
        .validate(Utc::now())?;

        let current = self.find_user(id).await?;

        let email = body.email.as_deref().map(normalize_email);
        if let Some(email) = &email {
            if let Some(other) = self.repos.users.find_by_email(email).await? {
                if other.id != current.id {
                    return Err(ApiError::validation(EMAIL_TAKEN));
                }
            }
        }

        let password_hash = match &body.password {
            Some(p) => Some(self.passwords.hash(p).await?),
            None => None,
        };

        let patch = UserPatch {
            name: body.name,
            email,
            password_hash,
            date_of_birth,
            gender: body.gender,
            role: body.role,
        };

        let user = self
            .repos
            .users
            .update(id, patch)
            .await
            .map_err(email_conflict)?
            .ok_or(ErrorCode::UserNotFound)?;
        Ok(UserResponse::from(&user))
    }

    pub async fn delete_user(&self, id: UserId) -> Result<(), ApiError> {
        if !self.repos.users.delete(id).await? {
            return Err(ErrorCode::UserNotFound.into());
        }
        tracing::info!(user_id = %id, "user deleted");
        Ok(())
    }

    /// Create the configured admin account unless the email is already taken.
    pub async fn ensure_admin(&self, seed: &AdminSeed) -> Result<(), ApiError> {
        let email = normalize_email(&seed.email);
        if self.repos.users.find_by_email(&email).await?.is_some() {
            return Ok(());
        }

        let password_hash = self.passwords.hash(&seed.password).await?;
        let admin = self
            .repos
            .users
            .create(NewUser {
                name: "Admin".to_string(),
                email,
                password_hash,
                date_of_birth: Utc::now(),
                gender: Gender::Other,
                role: Role::Admin,
            })
            .await?;
        tracing::info!(user_id = %admin.id, "seeded admin account");
        Ok(())
    }

    pub(super) async fn find_user(&self, id: UserId) -> Result<User, ApiError> {
        Ok(self.repos.users.read(id).await?.ok_or(ErrorCode::UserNotFound)?)
    }
}

/// A unique-email race lost at insert time reads like the pre-check.
fn email_conflict(err: StoreError) -> ApiError {
    match err {
        StoreError::Conflict { .. } => ApiError::validation(EMAIL_TAKEN),
        other => other.into(),
    }
}
