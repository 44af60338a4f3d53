use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::Role;

/// User
///
/// A login account from the `users` table. Accounts are optionally linked to
/// one employee record, which is what attendance, leave and project
/// membership are keyed on. Never serialized directly: it carries the
/// password hash.
#[derive(Debug, Clone, FromRow, Default)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<i64>,
    // Email held while the account is soft-deleted.
    pub original_email: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// NewUser
///
/// Insert payload for `Repository::create_user`. The password is already hashed.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub employee_id: Option<i64>,
}

/// UserProfile
///
/// Public view of an account (GET /api/auth/me, login response).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub employee_id: Option<i64>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            email: user.email.clone(),
            role: user.role,
            employee_id: user.employee_id,
        }
    }
}

/// LoginRequest
///
/// POST /api/auth/login.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

/// LoginResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserProfile,
}

/// RegisterUserRequest
///
/// POST /api/auth/register. The role defaults to EMPLOYEE.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct RegisterUserRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    pub role: Option<Role>,
}

/// RegisterUserResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct RegisterUserResponse {
    pub message: String,
    pub user_id: i64,
    pub linked_to_employee: bool,
    pub employee_id: Option<i64>,
}
