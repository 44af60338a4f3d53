use axum::{
    Router,
    extract::{FromRef, Request},
    http::HeaderName,
    middleware::{self, Next},
    response::Response,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

// --- Module Structure ---

pub mod auth;
pub mod clock;
pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod repository;
pub mod validation;

// Routing split by access tier (public, authenticated).
pub mod routes;
use auth::AuthUser;
use routes::{authenticated, public};

// --- Public Re-exports ---

pub use clock::{ClockState, FixedClock, SystemClock};
pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use repository::{PostgresRepository, Repository, RepositoryState};

/// ApiDoc
///
/// OpenAPI document aggregated from every `#[utoipa::path]` handler and
/// `ToSchema` model. Served at `/api-docs/openapi.json`.
#[derive(OpenApi)]
#[openapi(
    paths(
        handlers::auth::login, handlers::auth::register, handlers::auth::logout,
        handlers::auth::me,
        handlers::organization::list_branches, handlers::organization::create_branch,
        handlers::organization::get_branch, handlers::organization::update_branch,
        handlers::organization::delete_branch,
        handlers::organization::list_departments, handlers::organization::create_department,
        handlers::organization::get_department, handlers::organization::update_department,
        handlers::organization::delete_department,
        handlers::employee::list_employees, handlers::employee::create_employee,
        handlers::employee::get_employee, handlers::employee::update_employee,
        handlers::employee::delete_employee, handlers::employee::restore_employee,
        handlers::attendance::list_attendance, handlers::attendance::check_in,
        handlers::attendance::check_out, handlers::attendance::get_attendance,
        handlers::attendance::update_attendance, handlers::attendance::delete_attendance,
        handlers::leave::list_leaves, handlers::leave::create_leave, handlers::leave::get_leave,
        handlers::leave::update_leave, handlers::leave::delete_leave,
        handlers::projects::list_projects, handlers::projects::create_project,
        handlers::projects::get_project, handlers::projects::update_project,
        handlers::projects::delete_project, handlers::projects::add_member,
        handlers::projects::create_task, handlers::projects::update_task,
        handlers::dashboard::get_stats,
    ),
    components(
        schemas(
            error::ErrorResponse, models::MessageResponse, models::Role, models::Priority,
            models::UserProfile, models::LoginRequest, models::LoginResponse,
            models::RegisterUserRequest, models::RegisterUserResponse,
            models::OrgUnit, models::CreateOrgUnitRequest, models::UpdateOrgUnitRequest,
            models::Employee, models::Gender, models::EmployeeStatus,
            models::CreateEmployeeRequest, models::UpdateEmployeeRequest,
            models::RestoreEmployeeResponse,
            models::Attendance, models::CheckInRequest, models::UpdateAttendanceRequest,
            models::LeaveRequest, models::LeaveStatus, models::LeaveDuration,
            models::CreateLeaveRequest, models::UpdateLeaveRequest,
            models::Project, models::ProjectStatus, models::ProjectMember, models::MemberRole,
            models::Task, models::TaskStatus, models::ProjectDetails,
            models::CreateProjectRequest, models::UpdateProjectRequest,
            models::AddMemberRequest, models::CreateTaskRequest, models::UpdateTaskRequest,
            models::DashboardStats, models::AdminDashboard, models::EmployeeDashboard,
            models::DepartmentStat, models::TodayAttendanceDetail, models::TodayStatus,
            models::EmployeeTaskSummary, models::WeeklyAttendance,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "ems-api", description = "Employee Management System API")
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer",
                SecurityScheme::Http(
                    HttpBuilder::new()
                        .scheme(HttpAuthScheme::Bearer)
                        .bearer_format("JWT")
                        .build(),
                ),
            );
        }
    }
}

/// AppState
///
/// The single, cloneable container of shared services handed to every handler.
#[derive(Clone)]
pub struct AppState {
    /// Persistence layer (Postgres in production, in-memory in tests).
    pub repo: RepositoryState,
    /// Source of "now" for attendance, leave approvals and token issuing.
    pub clock: ClockState,
    pub config: AppConfig,
}

// --- Axum FromRef Extractor Implementations ---

impl FromRef<AppState> for RepositoryState {
    fn from_ref(app_state: &AppState) -> RepositoryState {
        app_state.repo.clone()
    }
}

impl FromRef<AppState> for ClockState {
    fn from_ref(app_state: &AppState) -> ClockState {
        app_state.clock.clone()
    }
}

impl FromRef<AppState> for AppConfig {
    fn from_ref(app_state: &AppState) -> AppConfig {
        app_state.config.clone()
    }
}

/// auth_middleware
///
/// Guards `authenticated_routes`. Extracting `AuthUser` runs the full token
/// check; a failed extraction short-circuits with the extractor's 401 before
/// any handler runs.
async fn auth_middleware(_auth_user: AuthUser, request: Request, next: Next) -> Response {
    next.run(request).await
}

/// create_router
///
/// Assembles routes, the auth layer, documentation and the observability stack.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let x_request_id = HeaderName::from_static("x-request-id");

    let base_router = Router::new()
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .merge(public::public_routes())
        .merge(
            authenticated::authenticated_routes().route_layer(middleware::from_fn_with_state(
                state.clone(),
                auth_middleware,
            )),
        )
        .with_state(state);

    base_router
        .layer(
            ServiceBuilder::new()
                .layer(SetRequestIdLayer::new(x_request_id.clone(), MakeRequestUuid))
                .layer(
                    TraceLayer::new_for_http()
                        .make_span_with(trace_span_logger)
                        .on_response(
                            DefaultOnResponse::new()
                                .level(Level::INFO)
                                .latency_unit(tower_http::LatencyUnit::Millis),
                        ),
                )
                .layer(PropagateRequestIdLayer::new(x_request_id)),
        )
        .layer(cors)
}

/// trace_span_logger
///
/// Span for every request, carrying method, URI and the `x-request-id` set
/// by `SetRequestIdLayer` so all log lines of one request correlate.
fn trace_span_logger(request: &axum::http::Request<axum::body::Body>) -> Span {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|value| value.to_str().ok())
        .unwrap_or("unknown");

    tracing::info_span!(
        "http_request",
        method = ?request.method(),
        uri = ?request.uri(),
        req_id = %request_id,
    )
}
