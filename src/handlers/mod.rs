//! HTTP handlers, one module per resource.
//!
//! Handlers resolve the caller with `AuthUser`, enforce role rules, call the
//! repository and shape the response. They never touch SQL.

pub mod attendance;
pub mod auth;
pub mod dashboard;
pub mod employee;
pub mod leave;
pub mod organization;
pub mod projects;

use crate::{AppState, error::AppError, models::Employee};

/// Loads an employee that must exist and must not be soft-deleted.
pub(crate) async fn active_employee(state: &AppState, id: i64) -> Result<Employee, AppError> {
    state
        .repo
        .get_employee(id)
        .await?
        .filter(|employee| !employee.is_deleted())
        .ok_or_else(|| AppError::not_found("Employee not found"))
}
