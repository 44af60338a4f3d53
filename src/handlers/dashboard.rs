use axum::{Json, extract::State};

use crate::{
    AppState,
    auth::AuthUser,
    clock::local_date,
    error::{AppError, AppResult},
    models::DashboardStats,
};

/// get_stats
///
/// [Authenticated Route] Organisation-wide figures for ADMIN/HR, personal
/// figures for EMPLOYEE. "Today" is the current attendance day.
#[utoipa::path(
    get,
    path = "/api/dashboard/stats",
    responses(
        (status = 200, description = "Dashboard payload for the caller's role", body = DashboardStats),
        (status = 403, description = "No employee profile", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_stats(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<DashboardStats>> {
    let today = local_date(state.clock.now(), state.config.attendance_offset);

    if auth.is_manager() {
        let stats = state.repo.admin_dashboard(today).await?;
        return Ok(Json(DashboardStats::Admin(stats)));
    }

    let employee_id = auth
        .linked_employee
        .ok_or_else(|| AppError::forbidden("Employee profile not found"))?;
    let stats = state
        .repo
        .employee_dashboard(employee_id, today, state.config.annual_leave_days)
        .await?;
    Ok(Json(DashboardStats::Employee(stats)))
}
