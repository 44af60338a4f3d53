use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{AppError, AppResult},
    validation::require_not_empty,
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "leave_status", rename_all = "UPPERCASE")]
pub enum LeaveStatus {
    #[default]
    Pending,
    Approved,
    Rejected,
    Cancelled,
}

impl LeaveStatus {
    /// Approvals and rejections are stamped with the approver and a date.
    pub fn is_decision(&self) -> bool {
        matches!(self, LeaveStatus::Approved | LeaveStatus::Rejected)
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "leave_duration", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LeaveDuration {
    #[default]
    FullDay,
    HalfDay,
}

/// LeaveRequest
///
/// A `leave_requests` row joined with the requesting employee's name and email.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct LeaveRequest {
    pub id: i64,
    pub employee_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type: String,
    /// Fractional for half days, e.g. `0.5`.
    pub number_of_days: f64,
    pub duration_type: LeaveDuration,
    pub status: LeaveStatus,
    pub comments: Option<String>,
    pub approved_by_id: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub employee_first_name: String,
    pub employee_last_name: String,
    pub employee_email: String,
}

/// CreateLeaveRequest
///
/// Body for POST /api/leave. `employeeId` and `approvedById` are only
/// honored for ADMIN and HR.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateLeaveRequest {
    pub employee_id: Option<i64>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub reason: String,
    #[serde(default)]
    pub leave_type: String,
    pub number_of_days: Option<f64>,
    pub duration_type: Option<LeaveDuration>,
    pub approved_by_id: Option<i64>,
    pub comments: Option<String>,
}

impl CreateLeaveRequest {
    /// Checks required fields and date ordering, returning the parsed
    /// `(start, end, days, duration)` tuple.
    pub fn validate(&self) -> AppResult<(NaiveDate, NaiveDate, f64, LeaveDuration)> {
        let (Some(start), Some(end), Some(days), Some(duration)) = (
            self.start_date,
            self.end_date,
            self.number_of_days,
            self.duration_type,
        ) else {
            return Err(AppError::bad_request("Missing required fields"));
        };
        require_not_empty(&self.reason, "reason")?;
        require_not_empty(&self.leave_type, "leaveType")?;

        if days <= 0.0 {
            return Err(AppError::bad_request("numberOfDays must be greater than 0"));
        }
        if start > end {
            return Err(AppError::bad_request("startDate must not be after endDate"));
        }
        Ok((start, end, days, duration))
    }
}

/// NewLeaveRequest
///
/// Insert payload for `Repository::create_leave`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewLeaveRequest {
    pub employee_id: i64,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub reason: String,
    pub leave_type: String,
    pub number_of_days: f64,
    pub duration_type: LeaveDuration,
    pub status: LeaveStatus,
    pub comments: Option<String>,
    pub approved_by_id: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
}

/// UpdateLeaveRequest
///
/// Body for PATCH /api/leave/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateLeaveRequest {
    pub status: Option<LeaveStatus>,
    pub comments: Option<String>,
}

/// LeaveStatusChange
///
/// Resolved status transition written by `Repository::update_leave_status`.
/// `approved_by_id`/`approval_date` are only written when `stamp_approval` is set.
#[derive(Debug, Clone, PartialEq)]
pub struct LeaveStatusChange {
    pub status: LeaveStatus,
    pub comments: Option<String>,
    pub stamp_approval: bool,
    pub approved_by_id: Option<i64>,
    pub approval_date: Option<DateTime<Utc>>,
}

/// LeaveQuery
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
#[serde(rename_all = "camelCase")]
pub struct LeaveQuery {
    /// Honored for ADMIN and HR only.
    pub employee_id: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid() -> CreateLeaveRequest {
        CreateLeaveRequest {
            start_date: NaiveDate::from_ymd_opt(2025, 4, 1),
            end_date: NaiveDate::from_ymd_opt(2025, 4, 3),
            reason: "Family event".into(),
            leave_type: "Annual".into(),
            number_of_days: Some(3.0),
            duration_type: Some(LeaveDuration::FullDay),
            ..Default::default()
        }
    }

    #[test]
    fn test_valid_request_passes() {
        let (start, end, days, duration) = valid().validate().unwrap();
        assert!(start < end);
        assert_eq!(days, 3.0);
        assert_eq!(duration, LeaveDuration::FullDay);
    }

    #[test]
    fn test_rejects_non_positive_days() {
        let mut req = valid();
        req.number_of_days = Some(0.0);
        let err = req.validate().unwrap_err();
        assert_eq!(err.to_string(), "numberOfDays must be greater than 0");
    }

    #[test]
    fn test_half_day_accepts_fraction() {
        let req: CreateLeaveRequest = serde_json::from_value(serde_json::json!({
            "startDate": "2025-04-01",
            "endDate": "2025-04-01",
            "reason": "Dentist",
            "leaveType": "Sick",
            "numberOfDays": 0.5,
            "durationType": "HALF_DAY"
        }))
        .unwrap();
        let (_, _, days, duration) = req.validate().unwrap();
        assert_eq!(days, 0.5);
        assert_eq!(duration, LeaveDuration::HalfDay);
    }

    #[test]
    fn test_rejects_inverted_range() {
        let mut req = valid();
        req.end_date = NaiveDate::from_ymd_opt(2025, 3, 30);
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_missing_duration_is_rejected() {
        let mut req = valid();
        req.duration_type = None;
        assert!(req.validate().is_err());
    }

    #[test]
    fn test_duration_wire_names() {
        let parsed: LeaveDuration = serde_json::from_str(r#""HALF_DAY""#).unwrap();
        assert_eq!(parsed, LeaveDuration::HalfDay);
        assert!(serde_json::from_str::<LeaveStatus>(r#""approved""#).is_err());
    }
}
