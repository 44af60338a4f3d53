use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::Role;
use crate::{
    error::AppResult,
    validation::{nullable, require_email, require_not_empty},
};

/// Domain used for tombstoned emails of soft-deleted records.
pub const TOMBSTONE_DOMAIN: &str = "deleted.com";

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[sqlx(type_name = "gender")]
pub enum Gender {
    #[default]
    Male,
    Female,
    Other,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[sqlx(type_name = "employee_status")]
pub enum EmployeeStatus {
    #[default]
    Active,
    Inactive,
    #[serde(rename = "On Leave")]
    #[sqlx(rename = "On Leave")]
    OnLeave,
}

/// Employee
///
/// An `employees` row joined with its branch, department and (optional)
/// linked user account.
///
/// Soft-deleted employees keep their row: `deleted_at` is set, the status is
/// `Inactive` and the email is replaced by a tombstone so the real address
/// can be reused. The real contact data waits in `original_email` /
/// `original_phone` until a restore.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub cv_file: Option<String>,
    pub gender: Gender,
    pub address: String,
    pub status: EmployeeStatus,
    pub branch_id: i64,
    pub department_id: i64,

    #[serde(skip)]
    #[ts(skip)]
    pub original_email: Option<String>,
    #[serde(skip)]
    #[ts(skip)]
    pub original_phone: Option<String>,

    pub deleted_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    // Joined columns.
    pub branch_name: String,
    pub department_name: String,
    pub user_id: Option<i64>,
    pub user_role: Option<Role>,
}

impl Employee {
    pub fn is_deleted(&self) -> bool {
        self.deleted_at.is_some()
    }
}

/// Email written over a soft-deleted record, e.g. `deleted_1700000000000_12@deleted.com`.
/// The millisecond stamp keeps repeated delete/restore cycles unique.
pub fn tombstone_email(prefix: &str, at: DateTime<Utc>, id: i64) -> String {
    format!(
        "{prefix}_{}_{id}@{TOMBSTONE_DOMAIN}",
        at.timestamp_millis()
    )
}

/// CreateEmployeeRequest
///
/// Body for POST /api/employee. Every field except phone and cvFile is required.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateEmployeeRequest {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: Option<String>,
    pub position: String,
    pub cv_file: Option<String>,
    pub branch_id: i64,
    pub department_id: i64,
    pub gender: Gender,
    pub address: String,
    pub status: EmployeeStatus,
}

impl CreateEmployeeRequest {
    pub fn validate(&self) -> AppResult<()> {
        require_not_empty(&self.first_name, "firstName")?;
        require_not_empty(&self.last_name, "lastName")?;
        require_not_empty(&self.position, "position")?;
        require_not_empty(&self.address, "address")?;
        require_email(&self.email)
    }
}

/// UpdateEmployeeRequest
///
/// Partial update for PATCH /api/employee/{id}. `phone: null` and
/// `cvFile: null` clear the field, absent fields are left untouched.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateEmployeeRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub phone: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<String>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub cv_file: Option<Option<String>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub branch_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department_id: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<Gender>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<EmployeeStatus>,
}

impl UpdateEmployeeRequest {
    pub fn validate(&self) -> AppResult<()> {
        if let Some(email) = &self.email {
            require_email(email)?;
        }
        for (value, field) in [
            (&self.first_name, "firstName"),
            (&self.last_name, "lastName"),
            (&self.position, "position"),
            (&self.address, "address"),
        ] {
            if let Some(value) = value {
                require_not_empty(value, field)?;
            }
        }
        Ok(())
    }
}

/// EmployeeQuery
///
/// Query parameters for the employee list and detail endpoints.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeQuery {
    /// Include soft-deleted employees. Honored for ADMIN and HR only.
    pub include_deleted: Option<bool>,
}

/// RestoreEmployeeResponse
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct RestoreEmployeeResponse {
    pub message: String,
    pub employee: Employee,
}
