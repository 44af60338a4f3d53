use crate::{
    AppState,
    handlers::{attendance, auth, dashboard, employee, leave, organization, projects},
};
use axum::{
    Router,
    routing::{get, patch, post},
};

/// Authenticated Router Module
///
/// Every route here sits behind the `auth_middleware` layer applied in
/// `create_router`, so handlers always receive a resolved `AuthUser`.
/// Role gates (ADMIN-only, ADMIN/HR) are checked per handler.
pub fn authenticated_routes() -> Router<AppState> {
    Router::<AppState>::new()
        // --- Session ---
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/logout", post(auth::logout))
        .route("/api/auth/me", get(auth::me))
        // --- Branches & Departments ---
        // Reads for any role, writes for ADMIN.
        .route(
            "/api/branch",
            get(organization::list_branches).post(organization::create_branch),
        )
        .route(
            "/api/branch/{id}",
            get(organization::get_branch)
                .patch(organization::update_branch)
                .delete(organization::delete_branch),
        )
        .route(
            "/api/department",
            get(organization::list_departments).post(organization::create_department),
        )
        .route(
            "/api/department/{id}",
            get(organization::get_department)
                .patch(organization::update_department)
                .delete(organization::delete_department),
        )
        // --- Employees ---
        .route(
            "/api/employee",
            get(employee::list_employees).post(employee::create_employee),
        )
        .route(
            "/api/employee/{id}",
            get(employee::get_employee)
                .patch(employee::update_employee)
                .delete(employee::delete_employee),
        )
        // POST /api/employee/{id}/restore
        // Reverses a soft delete.
        .route("/api/employee/{id}/restore", post(employee::restore_employee))
        // --- Attendance ---
        // POST /api/attendance is the daily check-in; one row per employee per attendance day.
        .route(
            "/api/attendance",
            get(attendance::list_attendance).post(attendance::check_in),
        )
        .route("/api/attendance/checkout", post(attendance::check_out))
        .route(
            "/api/attendance/{id}",
            get(attendance::get_attendance)
                .patch(attendance::update_attendance)
                .delete(attendance::delete_attendance),
        )
        // --- Leave ---
        .route(
            "/api/leave",
            get(leave::list_leaves).post(leave::create_leave),
        )
        .route(
            "/api/leave/{id}",
            get(leave::get_leave)
                .patch(leave::update_leave)
                .delete(leave::delete_leave),
        )
        // --- Projects & Tasks ---
        .route(
            "/api/projects",
            get(projects::list_projects).post(projects::create_project),
        )
        .route("/api/projects/team", post(projects::add_member))
        .route("/api/projects/tasks", post(projects::create_task))
        .route("/api/projects/tasks/{id}", patch(projects::update_task))
        .route(
            "/api/projects/{id}",
            get(projects::get_project)
                .patch(projects::update_project)
                .delete(projects::delete_project),
        )
        // --- Dashboard ---
        .route("/api/dashboard/stats", get(dashboard::get_stats))
}
