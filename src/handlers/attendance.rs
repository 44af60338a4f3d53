use axum::{
    Json,
    body::Bytes,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    clock::{hours_worked, local_date},
    error::{AppError, AppResult},
    handlers::active_employee,
    models::{
        Attendance, AttendanceChange, AttendanceFilter, AttendanceQuery, CheckInRequest,
        MessageResponse, Role, UpdateAttendanceRequest,
    },
    validation::{ApiJson, parse_optional_body},
};

/// Resolves whose attendance a check-in/check-out acts on.
///
/// ADMIN may name any employee and falls back to their own profile; HR and
/// EMPLOYEE always act on themselves. The target must be a live employee.
async fn resolve_target(
    auth: &AuthUser,
    state: &AppState,
    requested: Option<i64>,
) -> AppResult<i64> {
    let employee_id = if auth.role == Role::Admin {
        requested
            .or(auth.linked_employee)
            .ok_or_else(|| AppError::bad_request("Employee ID is required for Admin users"))?
    } else {
        auth.employee_id()?
    };
    active_employee(state, employee_id).await?;
    Ok(employee_id)
}

/// list_attendance
///
/// [Authenticated Route] EMPLOYEE callers only ever see their own rows.
#[utoipa::path(
    get,
    path = "/api/attendance",
    params(AttendanceQuery),
    responses((status = 200, description = "Attendance rows, newest day first", body = [Attendance]))
)]
pub async fn list_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<AttendanceQuery>,
) -> AppResult<Json<Vec<Attendance>>> {
    let employee_id = if auth.is_manager() {
        query.employee_id
    } else {
        Some(auth.employee_id()?)
    };
    let filter = AttendanceFilter {
        employee_id,
        start_date: query.start_date,
        end_date: query.end_date,
    };
    Ok(Json(state.repo.list_attendance(filter).await?))
}

/// check_in
///
/// [Authenticated Route] Opens today's attendance row. "Today" is the
/// calendar day at the configured attendance offset. At most one row exists
/// per employee and day, enforced by the database.
#[utoipa::path(
    post,
    path = "/api/attendance",
    request_body(content = CheckInRequest, description = "Optional body. Only ADMIN may pass employeeId"),
    responses(
        (status = 201, description = "Checked in", body = Attendance),
        (status = 400, description = "Already checked in today", body = crate::error::ErrorResponse),
        (status = 404, description = "Employee not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_in(
    auth: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<(StatusCode, Json<Attendance>)> {
    let payload: CheckInRequest = parse_optional_body(&body)?;
    let employee_id = resolve_target(&auth, &state, payload.employee_id).await?;

    let now = state.clock.now();
    let date = local_date(now, state.config.attendance_offset);

    let record = state
        .repo
        .create_check_in(employee_id, date, now)
        .await?
        .ok_or_else(|| AppError::bad_request("Already checked in today"))?;

    tracing::info!(employee_id, %date, by = auth.id, "checked in");
    Ok((StatusCode::CREATED, Json(record)))
}

/// check_out
///
/// [Authenticated Route] Closes today's attendance row and records the
/// hours worked.
#[utoipa::path(
    post,
    path = "/api/attendance/checkout",
    request_body(content = CheckInRequest, description = "Optional body. Only ADMIN may pass employeeId"),
    responses(
        (status = 200, description = "Checked out", body = Attendance),
        (status = 400, description = "No check-in or already checked out", body = crate::error::ErrorResponse)
    )
)]
pub async fn check_out(
    auth: AuthUser,
    State(state): State<AppState>,
    body: Bytes,
) -> AppResult<Json<Attendance>> {
    let payload: CheckInRequest = parse_optional_body(&body)?;
    let employee_id = resolve_target(&auth, &state, payload.employee_id).await?;

    let now = state.clock.now();
    let date = local_date(now, state.config.attendance_offset);

    let today = state
        .repo
        .find_attendance_for_day(employee_id, date)
        .await?
        .ok_or_else(|| AppError::bad_request("No check-in found for today"))?;
    if today.is_checked_out() {
        return Err(AppError::bad_request("Already checked out today"));
    }

    let hours = hours_worked(today.check_in, now);
    let record = state
        .repo
        .record_check_out(today.id, now, hours)
        .await?
        .ok_or_else(|| AppError::bad_request("Already checked out today"))?;

    tracing::info!(employee_id, %date, hours, by = auth.id, "checked out");
    Ok(Json(record))
}

/// get_attendance
///
/// [Authenticated Route] EMPLOYEE callers may only read their own rows.
#[utoipa::path(
    get,
    path = "/api/attendance/{id}",
    responses(
        (status = 200, description = "Attendance row", body = Attendance),
        (status = 403, description = "Not the caller's row", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<Attendance>> {
    let record = state
        .repo
        .get_attendance(id)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record not found"))?;

    if !auth.is_manager() && auth.linked_employee != Some(record.employee_id) {
        return Err(AppError::forbidden("Access denied"));
    }
    Ok(Json(record))
}

/// update_attendance
///
/// [ADMIN/HR Route] Manual correction. When `hoursWorked` is omitted it is
/// recomputed from the resulting check-in/check-out pair.
#[utoipa::path(
    patch,
    path = "/api/attendance/{id}",
    request_body = UpdateAttendanceRequest,
    responses((status = 200, description = "Attendance updated", body = Attendance))
)]
pub async fn update_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateAttendanceRequest>,
) -> AppResult<Json<Attendance>> {
    auth.require(&[Role::Admin, Role::Hr])?;

    if payload.hours_worked.is_some_and(|h| h < 0.0) {
        return Err(AppError::bad_request("hoursWorked must not be negative"));
    }

    let existing = state
        .repo
        .get_attendance(id)
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record not found"))?;

    let check_in = payload.check_in.unwrap_or(existing.check_in);
    let check_out = payload.check_out.unwrap_or(existing.check_out);
    let hours = payload
        .hours_worked
        .or_else(|| check_out.map(|out| hours_worked(check_in, out)));

    let record = state
        .repo
        .update_attendance(
            id,
            AttendanceChange {
                check_in,
                check_out,
                hours_worked: hours,
            },
        )
        .await?
        .ok_or_else(|| AppError::not_found("Attendance record not found"))?;

    tracing::info!(attendance_id = id, by = auth.id, "attendance corrected");
    Ok(Json(record))
}

/// delete_attendance
///
/// [ADMIN/HR Route]
#[utoipa::path(
    delete,
    path = "/api/attendance/{id}",
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_attendance(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin, Role::Hr])?;
    if !state.repo.delete_attendance(id).await? {
        return Err(AppError::not_found("Attendance record not found"));
    }
    tracing::info!(attendance_id = id, by = auth.id, "attendance deleted");
    Ok(Json(MessageResponse::new("Attendance record deleted")))
}
