// src/models/user.rs

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Application roles. Stored as the lowercase strings `admin` and `alumno`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Alumno,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Alumno => "alumno",
        }
    }

    /// Client route each role lands on after login.
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::Admin => "/admin",
            Role::Alumno => "/alumno",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "admin" => Ok(Role::Admin),
            "alumno" => Ok(Role::Alumno),
            other => Err(format!("Unrecognized role '{}'", other)),
        }
    }
}

/// Represents the 'users' table: credentials plus the profile role.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct User {
    pub id: i64,

    /// Unique login email.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Raw role string as stored. Parsed with [`Role::from_str`] at login,
    /// so a profile carrying an unknown role can exist but cannot sign in.
    pub role: String,

    pub created_at: Option<chrono::DateTime<chrono::Utc>>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[validate(length(min = 1, max = 128))]
    pub password: String,
}

/// DTO for an admin creating an account with an explicit role.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateUserRequest {
    #[validate(email(message = "A valid email is required."))]
    pub email: String,
    #[validate(length(
        min = 6,
        max = 128,
        message = "Password length must be between 6 and 128 characters."
    ))]
    pub password: String,
    pub role: Role,
}

/// Session context returned by `/api/auth/me`.
#[derive(Debug, Serialize)]
pub struct MeResponse {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub home: &'static str,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_known_roles_parse() {
        assert_eq!("admin".parse::<Role>(), Ok(Role::Admin));
        assert_eq!("alumno".parse::<Role>(), Ok(Role::Alumno));
        assert!("Admin".parse::<Role>().is_err());
        assert!("profesor".parse::<Role>().is_err());
    }

    #[test]
    fn roles_land_on_their_home_route() {
        assert_eq!(Role::Admin.home_route(), "/admin");
        assert_eq!(Role::Alumno.home_route(), "/alumno");
    }
}
