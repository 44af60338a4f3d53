use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::{IntoParams, ToSchema};

use super::Priority;
use crate::{
    error::{AppError, AppResult},
    validation::{blank_date, nullable, nullable_blank_date, require_not_empty},
};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "project_status", rename_all = "UPPERCASE")]
pub enum ProjectStatus {
    #[default]
    Active,
    Deactive,
    Completed,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
#[sqlx(type_name = "member_role", rename_all = "UPPERCASE")]
pub enum MemberRole {
    #[default]
    Member,
    Lead,
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS, ToSchema, sqlx::Type,
)]
#[ts(export)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[sqlx(type_name = "task_status", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    #[default]
    Pending,
    InProgress,
    Completed,
}

/// Project
///
/// A `projects` row with its member count and number of open (not
/// COMPLETED) tasks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub status: ProjectStatus,
    pub progress: i32,
    pub category: String,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,

    pub number_of_members: i64,
    pub open_tasks: i64,
}

/// ProjectMember
///
/// A `project_employees` row joined with the employee's public details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProjectMember {
    pub id: i64,
    pub project_id: i64,
    pub employee_id: i64,
    pub role: MemberRole,
    pub joined_at: DateTime<Utc>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub position: String,
}

/// Task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub status: TaskStatus,
    pub due_date: NaiveDate,
    pub assigned_to: Option<i64>,
    pub assignee_first_name: Option<String>,
    pub assignee_last_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// ProjectDetails
///
/// GET /api/projects/{id}: the project plus its team and tasks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct ProjectDetails {
    #[serde(flatten)]
    #[ts(flatten)]
    pub project: Project,
    pub members: Vec<ProjectMember>,
    pub tasks: Vec<Task>,
}

/// CreateProjectRequest
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateProjectRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub client_name: String,
    pub start_date: Option<NaiveDate>,
    #[serde(default, deserialize_with = "blank_date")]
    pub end_date: Option<NaiveDate>,
    pub deadline: Option<NaiveDate>,
    pub priority: Option<Priority>,
    #[serde(default)]
    pub category: String,
    pub image: Option<String>,
}

/// NewProject
///
/// Validated insert payload for `Repository::create_project`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewProject {
    pub title: String,
    pub description: String,
    pub client_name: String,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub deadline: NaiveDate,
    pub priority: Priority,
    pub category: String,
    pub image: Option<String>,
}

impl CreateProjectRequest {
    pub fn validate(self) -> AppResult<NewProject> {
        require_not_empty(&self.title, "title")?;
        require_not_empty(&self.client_name, "clientName")?;
        require_not_empty(&self.category, "category")?;
        let (Some(start_date), Some(deadline), Some(priority)) =
            (self.start_date, self.deadline, self.priority)
        else {
            return Err(AppError::bad_request("Missing required fields"));
        };
        Ok(NewProject {
            title: self.title.trim().to_string(),
            description: self.description,
            client_name: self.client_name,
            start_date,
            end_date: self.end_date,
            deadline,
            priority,
            category: self.category,
            image: self.image,
        })
    }
}

/// UpdateProjectRequest
///
/// Partial update. `endDate: null` and `image: null` clear the field, as does
/// `endDate: ""` from a blanked form input.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProjectRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,

    #[serde(
        default,
        deserialize_with = "nullable_blank_date",
        skip_serializing_if = "Option::is_none"
    )]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub end_date: Option<Option<NaiveDate>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<ProjectStatus>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub progress: Option<i32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub image: Option<Option<String>>,
}

impl UpdateProjectRequest {
    pub fn validate(&self) -> AppResult<()> {
        if self.progress.is_some_and(|p| !(0..=100).contains(&p)) {
            return Err(AppError::bad_request("progress must be between 0 and 100"));
        }
        if let Some(title) = &self.title {
            require_not_empty(title, "title")?;
        }
        Ok(())
    }
}

/// ProjectQuery
#[derive(Debug, Clone, Deserialize, IntoParams, Default)]
pub struct ProjectQuery {
    /// Honored for ADMIN and HR only.
    pub category: Option<String>,
    /// Honored for ADMIN and HR only.
    pub status: Option<ProjectStatus>,
}

/// ProjectFilter
///
/// Role-scoped filter handed to the repository. `member_id` limits the list
/// to projects the employee belongs to.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectFilter {
    pub member_id: Option<i64>,
    pub category: Option<String>,
    pub status: Option<ProjectStatus>,
}

/// AddMemberRequest
///
/// POST /api/projects/team.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct AddMemberRequest {
    pub project_id: i64,
    pub employee_id: i64,
    #[serde(default)]
    pub role: MemberRole,
}

/// CreateTaskRequest
///
/// POST /api/projects/tasks.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskRequest {
    pub project_id: i64,
    #[serde(default)]
    pub title: String,
    pub description: Option<String>,
    #[serde(default)]
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub assigned_to: Option<i64>,
}

impl CreateTaskRequest {
    pub fn validate(self) -> AppResult<NewTask> {
        require_not_empty(&self.title, "title")?;
        let Some(due_date) = self.due_date else {
            return Err(AppError::bad_request("dueDate is required"));
        };
        Ok(NewTask {
            project_id: self.project_id,
            title: self.title.trim().to_string(),
            description: self.description,
            priority: self.priority,
            due_date,
            assigned_to: self.assigned_to,
        })
    }
}

/// NewTask
///
/// Validated insert payload for `Repository::create_task`.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTask {
    pub project_id: i64,
    pub title: String,
    pub description: Option<String>,
    pub priority: Priority,
    pub due_date: NaiveDate,
    pub assigned_to: Option<i64>,
}

/// UpdateTaskRequest
///
/// PATCH /api/projects/tasks/{id}.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema)]
#[ts(export)]
pub struct UpdateTaskRequest {
    pub status: TaskStatus,
}
