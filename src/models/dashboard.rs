use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use super::{LeaveRequest, Priority, TaskStatus};

/// DepartmentStat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentStat {
    pub name: String,
    pub employee_count: i64,
}

/// TodayAttendanceDetail
///
/// One line of the "who is in today" panel. `status` is `"completed"` once
/// the employee has checked out, `"active"` before that.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TodayAttendanceDetail {
    pub employee_name: String,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub status: String,
}

/// AdminDashboard
///
/// Organisation-wide figures for ADMIN and HR.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AdminDashboard {
    pub total_employees: i64,
    pub pending_leaves: i64,
    pub today_check_ins: i64,
    pub pending_check_outs: i64,
    pub active_projects: i64,
    pub completed_tasks: i64,
    pub total_tasks: i64,
    pub task_completion_rate: i64,
    pub recent_leaves: Vec<LeaveRequest>,
    pub department_stats: Vec<DepartmentStat>,
    pub today_attendance_details: Vec<TodayAttendanceDetail>,
}

/// TodayStatus
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TodayStatus {
    pub checked_in: bool,
    pub check_in_time: Option<DateTime<Utc>>,
    pub check_out_time: Option<DateTime<Utc>>,
    pub hours_worked: Option<f64>,
}

/// EmployeeTaskSummary
///
/// A task assigned to the caller, in any status, with its project's title.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeTaskSummary {
    pub id: i64,
    pub title: String,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    pub project_id: i64,
    pub project_name: String,
}

/// WeeklyAttendance
///
/// One day of the last seven, newest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyAttendance {
    pub date: NaiveDate,
    pub hours_worked: Option<f64>,
}

/// EmployeeDashboard
///
/// Personal figures for an EMPLOYEE with a linked employee profile.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct EmployeeDashboard {
    pub my_tasks: i64,
    pub my_projects: i64,
    pub my_pending_leaves: i64,
    pub my_leave_balance: f64,
    pub my_today_status: TodayStatus,
    pub weekly_hours: f64,
    pub my_tasks_detailed: Vec<EmployeeTaskSummary>,
    pub my_weekly_attendance: Vec<WeeklyAttendance>,
}

/// DashboardStats
///
/// Response of GET /api/dashboard/stats. The shape depends on the caller's role.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
#[serde(untagged)]
pub enum DashboardStats {
    Admin(AdminDashboard),
    Employee(EmployeeDashboard),
}

/// Completed share of all tasks as a whole percentage. Zero when there are no tasks.
pub fn task_completion_rate(completed: i64, total: i64) -> i64 {
    if total <= 0 {
        return 0;
    }
    (completed as f64 / total as f64 * 100.0).round() as i64
}

/// Remaining paid leave for the year. Never negative.
pub fn leave_balance(allowance: i64, used: f64) -> f64 {
    (allowance as f64 - used).max(0.0)
}
