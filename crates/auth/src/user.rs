//! User accounts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use skillsgarden_core::validation::{check_email, check_length, check_not_future, check_password};
use skillsgarden_core::{DomainResult, Entity, UserId};

use crate::Role;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Gender {
    Male,
    Female,
    Other,
}

impl Gender {
    pub fn as_str(&self) -> &'static str {
        match self {
            Gender::Male => "Male",
            Gender::Female => "Female",
            Gender::Other => "Other",
        }
    }
}

impl core::str::FromStr for Gender {
    type Err = crate::UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Male" => Ok(Gender::Male),
            "Female" => Ok(Gender::Female),
            "Other" => Ok(Gender::Other),
            other => Err(crate::UnknownVariant(other.to_string())),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Entity
// ─────────────────────────────────────────────────────────────────────────────

/// A stored account. `password_hash` is a bcrypt hash and never leaves the
/// service layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub role: Role,
}

impl Entity for User {
    type Id = UserId;

    fn id(&self) -> UserId {
        self.id
    }
}

/// Insert payload (password already hashed).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub date_of_birth: DateTime<Utc>,
    pub gender: Gender,
    pub role: Role,
}

/// Partial update; `None` leaves a column untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserPatch {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password_hash: Option<String>,
    pub date_of_birth: Option<DateTime<Utc>>,
    pub gender: Option<Gender>,
    pub role: Option<Role>,
}

impl UserPatch {
    pub fn apply(&self, user: &mut User) {
        if let Some(v) = &self.name {
            user.name = v.clone();
        }
        if let Some(v) = &self.email {
            user.email = normalize_email(v);
        }
        if let Some(v) = &self.password_hash {
            user.password_hash = v.clone();
        }
        if let Some(v) = self.date_of_birth {
            user.date_of_birth = Some(v);
        }
        if let Some(v) = self.gender {
            user.gender = Some(v);
        }
        if let Some(v) = self.role {
            user.role = v;
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Validation
// ─────────────────────────────────────────────────────────────────────────────

/// Account fields as submitted, before the password is hashed.
#[derive(Debug, Clone, Default)]
pub struct UserFields<'a> {
    pub name: Option<&'a str>,
    pub email: Option<&'a str>,
    pub password: Option<&'a str>,
    pub date_of_birth: Option<DateTime<Utc>>,
}

impl UserFields<'_> {
    /// Validate every present field.
    pub fn validate(&self, now: DateTime<Utc>) -> DomainResult<()> {
        if let Some(name) = self.name {
            check_length("Name", name, 2, 30)?;
        }
        if let Some(email) = self.email {
            check_email(email)?;
        }
        if let Some(password) = self.password {
            check_password(password)?;
        }
        if let Some(dob) = self.date_of_birth {
            check_not_future("Dateofbirth", dob, now)?;
        }
        Ok(())
    }
}

/// Emails compare case-insensitively.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
