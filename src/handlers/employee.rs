use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        CreateEmployeeRequest, Employee, EmployeeQuery, MessageResponse, OrgUnitKind,
        RestoreEmployeeResponse, Role, UpdateEmployeeRequest,
    },
    validation::ApiJson,
};

/// Fails with 400 when a referenced branch or department does not exist.
async fn ensure_org_units(
    state: &AppState,
    branch_id: Option<i64>,
    department_id: Option<i64>,
) -> AppResult<()> {
    for (kind, id) in [
        (OrgUnitKind::Branch, branch_id),
        (OrgUnitKind::Department, department_id),
    ] {
        if let Some(id) = id {
            if state.repo.get_org_unit(kind, id).await?.is_none() {
                return Err(AppError::bad_request(format!("{} not found", kind.label())));
            }
        }
    }
    Ok(())
}

/// list_employees
///
/// [Authenticated Route] Non-deleted employees, newest first.
/// ADMIN and HR may pass `includeDeleted=true` to see tombstoned records too.
#[utoipa::path(
    get,
    path = "/api/employee",
    params(EmployeeQuery),
    responses((status = 200, description = "Employees", body = [Employee]))
)]
pub async fn list_employees(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<Vec<Employee>>> {
    let include_deleted = query.include_deleted.unwrap_or(false) && auth.is_manager();
    Ok(Json(state.repo.list_employees(include_deleted).await?))
}

/// create_employee
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/api/employee",
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Validation failed or email exists", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateEmployeeRequest>,
) -> AppResult<(StatusCode, Json<Employee>)> {
    auth.require(&[Role::Admin])?;
    payload.validate()?;
    ensure_org_units(&state, Some(payload.branch_id), Some(payload.department_id)).await?;

    if state
        .repo
        .find_employee_by_email(payload.email.trim())
        .await?
        .is_some()
    {
        return Err(AppError::bad_request("Email already exists"));
    }

    let employee = state.repo.create_employee(payload).await?;
    tracing::info!(employee_id = employee.id, by = auth.id, "employee created");
    Ok((StatusCode::CREATED, Json(employee)))
}

/// get_employee
///
/// [Authenticated Route] Soft-deleted employees are reported as 404 unless an
/// ADMIN/HR caller asks for them with `includeDeleted=true`.
#[utoipa::path(
    get,
    path = "/api/employee/{id}",
    params(EmployeeQuery),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Query(query): Query<EmployeeQuery>,
) -> AppResult<Json<Employee>> {
    let include_deleted = query.include_deleted.unwrap_or(false) && auth.is_manager();
    state
        .repo
        .get_employee(id)
        .await?
        .filter(|employee| include_deleted || !employee.is_deleted())
        .map(Json)
        .ok_or_else(|| AppError::not_found("Employee not found"))
}

/// update_employee
///
/// [Admin Route] Partial update of a live employee.
#[utoipa::path(
    patch,
    path = "/api/employee/{id}",
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 404, description = "Missing or deleted", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateEmployeeRequest>,
) -> AppResult<Json<Employee>> {
    auth.require(&[Role::Admin])?;
    payload.validate()?;

    let exists = state
        .repo
        .get_employee(id)
        .await?
        .is_some_and(|employee| !employee.is_deleted());
    if !exists {
        return Err(AppError::not_found("Employee not found or has been deleted"));
    }
    ensure_org_units(&state, payload.branch_id, payload.department_id).await?;

    if let Some(email) = &payload.email {
        let taken = state
            .repo
            .find_employee_by_email(email.trim())
            .await?
            .is_some_and(|other| other.id != id);
        if taken {
            return Err(AppError::bad_request("Email already exists"));
        }
    }

    let employee = state
        .repo
        .update_employee(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found or has been deleted"))?;
    tracing::info!(employee_id = id, by = auth.id, "employee updated");
    Ok(Json(employee))
}

/// delete_employee
///
/// [Admin Route] Soft delete. The employee and its user account keep their
/// rows but lose their email to a tombstone so the address can be reused.
#[utoipa::path(
    delete,
    path = "/api/employee/{id}",
    responses(
        (status = 200, description = "Soft deleted", body = MessageResponse),
        (status = 400, description = "Already deleted", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin])?;

    let employee = state
        .repo
        .get_employee(id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    if employee.is_deleted() {
        return Err(AppError::bad_request("Employee is already deleted"));
    }

    state.repo.soft_delete_employee(id, state.clock.now()).await?;
    tracing::info!(
        employee_id = id,
        user_id = ?employee.user_id,
        by = auth.id,
        "employee soft deleted"
    );
    Ok(Json(MessageResponse::new("Employee deleted successfully")))
}

/// restore_employee
///
/// [Admin Route] Reverses a soft delete, bringing back the original email
/// and phone of the employee and its user account.
#[utoipa::path(
    post,
    path = "/api/employee/{id}/restore",
    responses(
        (status = 200, description = "Restored", body = RestoreEmployeeResponse),
        (status = 400, description = "Not deleted or email taken", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn restore_employee(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<RestoreEmployeeResponse>> {
    auth.require(&[Role::Admin])?;

    let existing = state
        .repo
        .get_employee(id)
        .await?
        .ok_or_else(|| AppError::not_found("Employee not found"))?;
    if !existing.is_deleted() {
        return Err(AppError::bad_request("Employee is not deleted"));
    }

    let employee = state.repo.restore_employee(id).await?;
    tracing::info!(employee_id = id, by = auth.id, "employee restored");
    Ok(Json(RestoreEmployeeResponse {
        message: "Employee restored successfully".to_string(),
        employee,
    }))
}
