use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    handlers::active_employee,
    models::{
        CreateLeaveRequest, LeaveQuery, LeaveRequest, LeaveStatus, LeaveStatusChange,
        MessageResponse, NewLeaveRequest, UpdateLeaveRequest,
    },
    validation::ApiJson,
};

async fn load(state: &AppState, id: i64) -> AppResult<LeaveRequest> {
    state
        .repo
        .get_leave(id)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))
}

/// EMPLOYEE callers may only act on their own requests.
fn ensure_owner(auth: &AuthUser, leave: &LeaveRequest) -> AppResult<()> {
    if auth.is_manager() || auth.linked_employee == Some(leave.employee_id) {
        Ok(())
    } else {
        Err(AppError::forbidden("Access denied"))
    }
}

/// list_leaves
///
/// [Authenticated Route] Newest first. EMPLOYEE callers see only their own requests.
#[utoipa::path(
    get,
    path = "/api/leave",
    params(LeaveQuery),
    responses((status = 200, description = "Leave requests", body = [LeaveRequest]))
)]
pub async fn list_leaves(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<LeaveQuery>,
) -> AppResult<Json<Vec<LeaveRequest>>> {
    let employee_id = if auth.is_manager() {
        query.employee_id
    } else {
        Some(auth.employee_id()?)
    };
    Ok(Json(state.repo.list_leaves(employee_id).await?))
}

/// create_leave
///
/// [Authenticated Route] Files a leave request.
///
/// EMPLOYEE callers file for themselves. ADMIN/HR file on behalf of
/// `employeeId`, and passing `approvedById` creates the request pre-approved.
#[utoipa::path(
    post,
    path = "/api/leave",
    request_body = CreateLeaveRequest,
    responses(
        (status = 201, description = "Leave request created", body = LeaveRequest),
        (status = 400, description = "Validation failed", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_leave(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateLeaveRequest>,
) -> AppResult<(StatusCode, Json<LeaveRequest>)> {
    let (start_date, end_date, number_of_days, duration_type) = payload.validate()?;

    let (employee_id, approved_by_id) = if auth.is_manager() {
        let employee_id = payload
            .employee_id
            .ok_or_else(|| AppError::bad_request("employeeId is required"))?;
        (employee_id, payload.approved_by_id)
    } else {
        (auth.employee_id()?, None)
    };
    active_employee(&state, employee_id).await?;
    if let Some(approver) = approved_by_id {
        active_employee(&state, approver).await?;
    }

    let (status, approval_date) = match approved_by_id {
        Some(_) => (LeaveStatus::Approved, Some(state.clock.now())),
        None => (LeaveStatus::Pending, None),
    };

    let leave = state
        .repo
        .create_leave(NewLeaveRequest {
            employee_id,
            start_date,
            end_date,
            reason: payload.reason.trim().to_string(),
            leave_type: payload.leave_type.trim().to_string(),
            number_of_days,
            duration_type,
            status,
            comments: payload.comments,
            approved_by_id,
            approval_date,
        })
        .await?;

    tracing::info!(
        leave_id = leave.id,
        employee_id,
        status = ?leave.status,
        by = auth.id,
        "leave request filed"
    );
    Ok((StatusCode::CREATED, Json(leave)))
}

/// get_leave
///
/// [Authenticated Route]
#[utoipa::path(
    get,
    path = "/api/leave/{id}",
    responses(
        (status = 200, description = "Leave request", body = LeaveRequest),
        (status = 403, description = "Not the caller's request", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_leave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<LeaveRequest>> {
    let leave = load(&state, id).await?;
    ensure_owner(&auth, &leave)?;
    Ok(Json(leave))
}

/// update_leave
///
/// [Authenticated Route] Status transition.
///
/// ADMIN/HR may set any status; approvals and rejections are stamped with the
/// approver's employee id and the decision time. EMPLOYEE callers may only
/// cancel their own PENDING requests.
#[utoipa::path(
    patch,
    path = "/api/leave/{id}",
    request_body = UpdateLeaveRequest,
    responses(
        (status = 200, description = "Leave request updated", body = LeaveRequest),
        (status = 400, description = "Invalid transition", body = crate::error::ErrorResponse),
        (status = 403, description = "Not allowed", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_leave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateLeaveRequest>,
) -> AppResult<Json<LeaveRequest>> {
    let status = payload
        .status
        .ok_or_else(|| AppError::bad_request("Invalid status"))?;
    let leave = load(&state, id).await?;

    let change = if auth.is_manager() {
        let stamp_approval = status.is_decision();
        LeaveStatusChange {
            status,
            comments: payload.comments,
            stamp_approval,
            approved_by_id: auth.linked_employee.filter(|_| stamp_approval),
            approval_date: stamp_approval.then(|| state.clock.now()),
        }
    } else {
        ensure_owner(&auth, &leave)?;
        if status != LeaveStatus::Cancelled {
            return Err(AppError::forbidden(
                "Employees may only cancel their own leave requests",
            ));
        }
        if leave.status != LeaveStatus::Pending {
            return Err(AppError::bad_request(
                "Only pending leave requests can be cancelled",
            ));
        }
        LeaveStatusChange {
            status,
            comments: payload.comments,
            stamp_approval: false,
            approved_by_id: None,
            approval_date: None,
        }
    };

    let updated = state
        .repo
        .update_leave_status(id, change)
        .await?
        .ok_or_else(|| AppError::not_found("Leave request not found"))?;

    tracing::info!(
        leave_id = id,
        from = ?leave.status,
        to = ?updated.status,
        by = auth.id,
        "leave status changed"
    );
    Ok(Json(updated))
}

/// delete_leave
///
/// [Authenticated Route] ADMIN/HR may delete any request; EMPLOYEE callers
/// only their own PENDING ones.
#[utoipa::path(
    delete,
    path = "/api/leave/{id}",
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Request is no longer pending", body = crate::error::ErrorResponse),
        (status = 403, description = "Not the caller's request", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_leave(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    let leave = load(&state, id).await?;
    if !auth.is_manager() {
        ensure_owner(&auth, &leave)?;
        if leave.status != LeaveStatus::Pending {
            return Err(AppError::bad_request(
                "Only pending leave requests can be deleted",
            ));
        }
    }

    if !state.repo.delete_leave(id).await? {
        return Err(AppError::not_found("Leave request not found"));
    }
    tracing::info!(leave_id = id, by = auth.id, "leave request deleted");
    Ok(Json(MessageResponse::new("Leave request deleted")))
}
