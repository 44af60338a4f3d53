//! Persistence layer.
//!
//! Handlers only ever see the `Repository` trait through `RepositoryState`,
//! so tests can swap the Postgres implementation for an in-memory one.

mod postgres;

pub use postgres::PostgresRepository;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    error::AppResult,
    models::{
        AdminDashboard, Attendance, AttendanceChange, AttendanceFilter, CreateEmployeeRequest,
        CreateOrgUnitRequest, Employee, EmployeeDashboard, LeaveRequest, LeaveStatusChange,
        MemberRole, NewLeaveRequest, NewProject, NewTask, NewUser, OrgUnit, OrgUnitKind, Project,
        ProjectFilter, ProjectMember, Task, TaskStatus, UpdateEmployeeRequest,
        UpdateOrgUnitRequest, UpdateProjectRequest, User,
    },
};

/// Repository Trait
///
/// The abstract contract for every persistence operation the API performs.
///
/// **Send + Sync + async_trait** make `Arc<dyn Repository>` shareable across
/// axum's task boundaries. Lookups return `Ok(None)` / `Ok(false)` for missing
/// rows and reserve `Err` for real failures.
#[async_trait]
pub trait Repository: Send + Sync {
    // --- Users & Auth ---
    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>>;
    async fn get_user(&self, id: i64) -> AppResult<Option<User>>;
    async fn find_user_by_employee(&self, employee_id: i64) -> AppResult<Option<User>>;
    async fn create_user(&self, user: NewUser) -> AppResult<User>;
    // Stores a revoked token id until its expiry and purges rows that have already expired.
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AppResult<()>;
    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool>;

    // --- Branches & Departments ---
    async fn list_org_units(&self, kind: OrgUnitKind) -> AppResult<Vec<OrgUnit>>;
    async fn get_org_unit(&self, kind: OrgUnitKind, id: i64) -> AppResult<Option<OrgUnit>>;
    async fn create_org_unit(
        &self,
        kind: OrgUnitKind,
        req: CreateOrgUnitRequest,
    ) -> AppResult<OrgUnit>;
    async fn update_org_unit(
        &self,
        kind: OrgUnitKind,
        id: i64,
        req: UpdateOrgUnitRequest,
    ) -> AppResult<Option<OrgUnit>>;
    // Fails with BadRequest while employees still reference the unit.
    async fn delete_org_unit(&self, kind: OrgUnitKind, id: i64) -> AppResult<bool>;

    // --- Employees ---
    async fn list_employees(&self, include_deleted: bool) -> AppResult<Vec<Employee>>;
    // Returns soft-deleted rows too; callers decide visibility.
    async fn get_employee(&self, id: i64) -> AppResult<Option<Employee>>;
    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>>;
    async fn create_employee(&self, req: CreateEmployeeRequest) -> AppResult<Employee>;
    // Only touches non-deleted rows. COALESCE semantics for absent fields.
    async fn update_employee(
        &self,
        id: i64,
        req: UpdateEmployeeRequest,
    ) -> AppResult<Option<Employee>>;
    // Tombstones the employee and its linked user in one transaction.
    async fn soft_delete_employee(&self, id: i64, at: DateTime<Utc>) -> AppResult<()>;
    async fn restore_employee(&self, id: i64) -> AppResult<Employee>;

    // --- Attendance ---
    async fn list_attendance(&self, filter: AttendanceFilter) -> AppResult<Vec<Attendance>>;
    async fn get_attendance(&self, id: i64) -> AppResult<Option<Attendance>>;
    async fn find_attendance_for_day(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>>;
    // Idempotent insert: `None` when the employee already has a row for `date`.
    async fn create_check_in(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Attendance>>;
    // Conditional update: `None` when the row has already been checked out.
    async fn record_check_out(
        &self,
        id: i64,
        at: DateTime<Utc>,
        hours_worked: f64,
    ) -> AppResult<Option<Attendance>>;
    async fn update_attendance(
        &self,
        id: i64,
        change: AttendanceChange,
    ) -> AppResult<Option<Attendance>>;
    async fn delete_attendance(&self, id: i64) -> AppResult<bool>;

    // --- Leave ---
    async fn list_leaves(&self, employee_id: Option<i64>) -> AppResult<Vec<LeaveRequest>>;
    async fn get_leave(&self, id: i64) -> AppResult<Option<LeaveRequest>>;
    async fn create_leave(&self, req: NewLeaveRequest) -> AppResult<LeaveRequest>;
    async fn update_leave_status(
        &self,
        id: i64,
        change: LeaveStatusChange,
    ) -> AppResult<Option<LeaveRequest>>;
    async fn delete_leave(&self, id: i64) -> AppResult<bool>;

    // --- Projects & Tasks ---
    async fn list_projects(&self, filter: ProjectFilter) -> AppResult<Vec<Project>>;
    async fn get_project(&self, id: i64) -> AppResult<Option<Project>>;
    async fn project_members(&self, project_id: i64) -> AppResult<Vec<ProjectMember>>;
    async fn project_tasks(&self, project_id: i64) -> AppResult<Vec<Task>>;
    async fn project_title_exists(&self, title: &str) -> AppResult<bool>;
    async fn create_project(&self, project: NewProject) -> AppResult<Project>;
    async fn update_project(
        &self,
        id: i64,
        req: UpdateProjectRequest,
    ) -> AppResult<Option<Project>>;
    async fn delete_project(&self, id: i64) -> AppResult<bool>;
    async fn is_project_member(&self, project_id: i64, employee_id: i64) -> AppResult<bool>;
    // Idempotent insert: `None` when the employee is already a member.
    async fn add_project_member(
        &self,
        project_id: i64,
        employee_id: i64,
        role: MemberRole,
    ) -> AppResult<Option<ProjectMember>>;
    async fn create_task(&self, task: NewTask) -> AppResult<Task>;
    async fn get_task(&self, id: i64) -> AppResult<Option<Task>>;
    async fn update_task_status(&self, id: i64, status: TaskStatus) -> AppResult<Option<Task>>;

    // --- Dashboard ---
    async fn admin_dashboard(&self, today: NaiveDate) -> AppResult<AdminDashboard>;
    async fn employee_dashboard(
        &self,
        employee_id: i64,
        today: NaiveDate,
        annual_leave_days: i64,
    ) -> AppResult<EmployeeDashboard>;
}

/// RepositoryState
///
/// The shared handle to the persistence layer stored in `AppState`.
pub type RepositoryState = Arc<dyn Repository>;
