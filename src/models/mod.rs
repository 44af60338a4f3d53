//! API and database schemas, grouped by resource.
//!
//! Row types derive `FromRow` and map 1:1 onto the queries in
//! `repository::postgres`. Every type that crosses the HTTP boundary also
//! derives `ToSchema` (OpenAPI) and `TS` (front-end bindings), and serializes
//! with camelCase keys.

pub mod attendance;
pub mod dashboard;
pub mod employee;
pub mod leave;
pub mod organization;
pub mod project;
pub mod user;

pub use attendance::*;
pub use dashboard::*;
pub use employee::*;
pub use leave::*;
pub use organization::*;
pub use project::*;
pub use user::*;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Role
///
/// The RBAC role carried by every user account.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "user_role", rename_all = "UPPERCASE")]
pub enum Role {
    Admin,
    Hr,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Hr => "HR",
            Role::Employee => "EMPLOYEE",
        }
    }

    /// ADMIN and HR manage other people's records.
    pub fn is_manager(&self) -> bool {
        matches!(self, Role::Admin | Role::Hr)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Priority
///
/// Shared by projects and tasks.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "priority", rename_all = "UPPERCASE")]
pub enum Priority {
    High,
    #[default]
    Medium,
    Low,
}

/// MessageResponse
///
/// Plain acknowledgement body, e.g. `{"message": "Deleted"}`.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
