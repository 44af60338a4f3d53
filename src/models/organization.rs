use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use ts_rs::TS;
use utoipa::ToSchema;

use crate::validation::nullable;

/// OrgUnitKind
///
/// Branches and departments share one shape and one set of operations; the
/// kind selects the table and the wording of messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OrgUnitKind {
    Branch,
    Department,
}

impl OrgUnitKind {
    pub fn table(&self) -> &'static str {
        match self {
            OrgUnitKind::Branch => "branches",
            OrgUnitKind::Department => "departments",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            OrgUnitKind::Branch => "Branch",
            OrgUnitKind::Department => "Department",
        }
    }
}

/// OrgUnit
///
/// A row of `branches` or `departments`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS, ToSchema, FromRow, Default)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrgUnit {
    pub id: i64,
    pub name: String,
    pub location: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// CreateOrgUnitRequest
///
/// Body for POST /api/branch and POST /api/department.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct CreateOrgUnitRequest {
    #[serde(default)]
    pub name: String,
    pub location: Option<String>,
}

/// UpdateOrgUnitRequest
///
/// Partial update for branches and departments. `location: null` clears it.
#[derive(Debug, Clone, Serialize, Deserialize, TS, ToSchema, Default)]
#[ts(export)]
pub struct UpdateOrgUnitRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    #[serde(default, deserialize_with = "nullable", skip_serializing_if = "Option::is_none")]
    #[ts(type = "string | null")]
    #[schema(value_type = Option<String>)]
    pub location: Option<Option<String>>,
}
