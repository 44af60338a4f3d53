use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

/// Attendance
///
/// One row per employee per attendance day. `check_in`/`check_out` are real
/// UTC instants; `date` is the calendar day at the configured attendance
/// offset on which the check-in happened.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Attendance {
    pub id: i64,
    pub employee_id: i64,
    pub date: NaiveDate,
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub hours_worked: Option<f64>,

    // Joined from employees.
    pub employee_first_name: String,
    pub employee_last_name: String,
    pub employee_email: String,
}

impl Attendance {
    pub fn is_checked_out(&self) -> bool {
        self.check_out.is_some()
    }
}

/// AttendanceQuery
///
/// Filters for GET /api/attendance. Dates are inclusive.
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceQuery {
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Honored for ADMIN and HR only.
    pub employee_id: Option<i64>,
}

/// AttendanceFilter
///
/// Resolved filter handed to the repository after role scoping.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AttendanceFilter {
    pub employee_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
}

/// CheckInRequest
///
/// Optional body of POST /api/attendance and POST /api/attendance/checkout.
/// Only ADMIN users may name another employee.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CheckInRequest {
    pub employee_id: Option<i64>,
}

/// UpdateAttendanceRequest
///
/// Manual correction by ADMIN/HR. `checkOut: null` reopens the day.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateAttendanceRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub check_in: Option<DateTime<Utc>>,

    #[serde(
        default,
        deserialize_with = "crate::validation::nullable",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub check_out: Option<Option<DateTime<Utc>>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hours_worked: Option<f64>,
}

/// AttendanceChange
///
/// Fully resolved row values written by `Repository::update_attendance`.
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceChange {
    pub check_in: DateTime<Utc>,
    pub check_out: Option<DateTime<Utc>>,
    pub hours_worked: Option<f64>,
}
