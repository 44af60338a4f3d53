//! Shared scaffolding for the integration tests: an in-memory `Repository`
//! that mirrors the constraints enforced by the Postgres schema, plus helpers
//! to build `AppState` and `AuthUser` values.

#![allow(dead_code)]

use async_trait::async_trait;
use axum::{body::to_bytes, response::IntoResponse};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use ems_api::{
    AppConfig, AppError, AppResult, AppState, FixedClock, Repository, RepositoryState,
    auth::AuthUser,
    clock::{round2, week_start, year_start},
    models::*,
};
use serde_json::Value;
use std::{
    collections::HashSet,
    sync::{Arc, Mutex},
};
use uuid::Uuid;

#[derive(Default)]
struct Store {
    next_id: i64,
    users: Vec<User>,
    revoked: HashSet<Uuid>,
    branches: Vec<OrgUnit>,
    departments: Vec<OrgUnit>,
    employees: Vec<Employee>,
    attendance: Vec<Attendance>,
    leaves: Vec<LeaveRequest>,
    projects: Vec<Project>,
    members: Vec<ProjectMember>,
    tasks: Vec<Task>,
}

impl Store {
    fn id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }

    fn units(&self, kind: OrgUnitKind) -> &Vec<OrgUnit> {
        match kind {
            OrgUnitKind::Branch => &self.branches,
            OrgUnitKind::Department => &self.departments,
        }
    }

    fn units_mut(&mut self, kind: OrgUnitKind) -> &mut Vec<OrgUnit> {
        match kind {
            OrgUnitKind::Branch => &mut self.branches,
            OrgUnitKind::Department => &mut self.departments,
        }
    }

    fn unit_name(&self, kind: OrgUnitKind, id: i64) -> String {
        self.units(kind)
            .iter()
            .find(|u| u.id == id)
            .map(|u| u.name.clone())
            .unwrap_or_default()
    }

    fn employee(&self, id: i64) -> Option<&Employee> {
        self.employees.iter().find(|e| e.id == id)
    }

    // Fills the joined columns the way the SELECT constants do.
    fn hydrate_employee(&self, mut e: Employee) -> Employee {
        e.branch_name = self.unit_name(OrgUnitKind::Branch, e.branch_id);
        e.department_name = self.unit_name(OrgUnitKind::Department, e.department_id);
        let user = self.users.iter().find(|u| u.employee_id == Some(e.id));
        e.user_id = user.map(|u| u.id);
        e.user_role = user.map(|u| u.role);
        e
    }

    fn hydrate_attendance(&self, mut a: Attendance) -> Attendance {
        if let Some(e) = self.employee(a.employee_id) {
            a.employee_first_name = e.first_name.clone();
            a.employee_last_name = e.last_name.clone();
            a.employee_email = e.email.clone();
        }
        a
    }

    fn hydrate_leave(&self, mut l: LeaveRequest) -> LeaveRequest {
        if let Some(e) = self.employee(l.employee_id) {
            l.employee_first_name = e.first_name.clone();
            l.employee_last_name = e.last_name.clone();
            l.employee_email = e.email.clone();
        }
        l
    }

    fn hydrate_project(&self, mut p: Project) -> Project {
        p.number_of_members = self.members.iter().filter(|m| m.project_id == p.id).count() as i64;
        p.open_tasks = self
            .tasks
            .iter()
            .filter(|t| t.project_id == p.id && t.status != TaskStatus::Completed)
            .count() as i64;
        p
    }

    fn hydrate_member(&self, mut m: ProjectMember) -> ProjectMember {
        if let Some(e) = self.employee(m.employee_id) {
            m.first_name = e.first_name.clone();
            m.last_name = e.last_name.clone();
            m.email = e.email.clone();
            m.position = e.position.clone();
        }
        m
    }

    fn hydrate_task(&self, mut t: Task) -> Task {
        let assignee = t.assigned_to.and_then(|id| self.employee(id));
        t.assignee_first_name = assignee.map(|e| e.first_name.clone());
        t.assignee_last_name = assignee.map(|e| e.last_name.clone());
        t
    }

    fn email_taken(&self, email: &str, except: Option<i64>) -> bool {
        self.employees
            .iter()
            .any(|e| e.email.eq_ignore_ascii_case(email) && Some(e.id) != except)
    }
}

/// MemoryRepository
///
/// In-memory `Repository` with the same uniqueness, conditional-update and
/// soft-delete behavior as `PostgresRepository`.
#[derive(Default)]
pub struct MemoryRepository {
    store: Mutex<Store>,
}

impl MemoryRepository {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn store(&self) -> std::sync::MutexGuard<'_, Store> {
        self.store.lock().unwrap()
    }

    // --- Seeding ---

    pub fn seed_unit(&self, kind: OrgUnitKind, name: &str) -> i64 {
        let mut store = self.store();
        let id = store.id();
        store.units_mut(kind).push(OrgUnit {
            id,
            name: name.to_string(),
            location: None,
            created_at: Utc::now(),
        });
        id
    }

    /// Seeds a live employee in the "Kathmandu" branch and "Engineering" department.
    pub fn seed_employee(&self, first_name: &str, email: &str) -> Employee {
        let branch_id = self.unit_id(OrgUnitKind::Branch, "Kathmandu");
        let department_id = self.unit_id(OrgUnitKind::Department, "Engineering");
        let mut store = self.store();
        let id = store.id();
        let employee = Employee {
            id,
            first_name: first_name.to_string(),
            last_name: "Tester".to_string(),
            email: email.to_string(),
            phone: Some("9800000000".to_string()),
            position: "Engineer".to_string(),
            address: "Kathmandu".to_string(),
            branch_id,
            department_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.employees.push(employee.clone());
        store.hydrate_employee(employee)
    }

    pub fn seed_user(&self, email: &str, role: Role, employee_id: Option<i64>) -> User {
        self.seed_user_with_hash(email, "not-a-real-hash", role, employee_id)
    }

    pub fn seed_user_with_hash(
        &self,
        email: &str,
        password_hash: &str,
        role: Role,
        employee_id: Option<i64>,
    ) -> User {
        let mut store = self.store();
        let id = store.id();
        let user = User {
            id,
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role,
            employee_id,
            created_at: Utc::now(),
            ..Default::default()
        };
        store.users.push(user.clone());
        user
    }

    pub fn seed_leave(&self, employee_id: i64, status: LeaveStatus, start: NaiveDate, days: f64) -> i64 {
        let mut store = self.store();
        let id = store.id();
        store.leaves.push(LeaveRequest {
            id,
            employee_id,
            start_date: start,
            end_date: start,
            reason: "Family".to_string(),
            leave_type: "Annual".to_string(),
            number_of_days: days,
            status,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        });
        id
    }

    pub fn seed_project(&self, title: &str) -> i64 {
        let mut store = self.store();
        let id = store.id();
        store.projects.push(Project {
            id,
            title: title.to_string(),
            client_name: "Acme".to_string(),
            category: "Web".to_string(),
            start_date: date(2025, 1, 1),
            deadline: date(2025, 12, 31),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        });
        id
    }

    fn unit_id(&self, kind: OrgUnitKind, name: &str) -> i64 {
        let existing = self
            .store()
            .units(kind)
            .iter()
            .find(|u| u.name == name)
            .map(|u| u.id);
        existing.unwrap_or_else(|| self.seed_unit(kind, name))
    }

    // --- Inspection ---

    pub fn user(&self, id: i64) -> Option<User> {
        self.store().users.iter().find(|u| u.id == id).cloned()
    }

    pub fn employee(&self, id: i64) -> Option<Employee> {
        let store = self.store();
        store.employee(id).cloned()
    }

    pub fn attendance_rows(&self) -> Vec<Attendance> {
        self.store().attendance.clone()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    // --- Users & Auth ---

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        Ok(self
            .store()
            .users
            .iter()
            .find(|u| u.email.eq_ignore_ascii_case(email))
            .cloned())
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        Ok(self.user(id))
    }

    async fn find_user_by_employee(&self, employee_id: i64) -> AppResult<Option<User>> {
        Ok(self
            .store()
            .users
            .iter()
            .find(|u| u.employee_id == Some(employee_id))
            .cloned())
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let mut store = self.store();
        if store.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(AppError::bad_request("Email already registered"));
        }
        let id = store.id();
        let user = User {
            id,
            email: user.email,
            password_hash: user.password_hash,
            role: user.role,
            employee_id: user.employee_id,
            created_at: Utc::now(),
            ..Default::default()
        };
        store.users.push(user.clone());
        Ok(user)
    }

    async fn revoke_token(&self, jti: Uuid, _expires_at: DateTime<Utc>) -> AppResult<()> {
        self.store().revoked.insert(jti);
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        Ok(self.store().revoked.contains(&jti))
    }

    // --- Branches & Departments ---

    async fn list_org_units(&self, kind: OrgUnitKind) -> AppResult<Vec<OrgUnit>> {
        let mut units = self.store().units(kind).clone();
        units.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(units)
    }

    async fn get_org_unit(&self, kind: OrgUnitKind, id: i64) -> AppResult<Option<OrgUnit>> {
        Ok(self.store().units(kind).iter().find(|u| u.id == id).cloned())
    }

    async fn create_org_unit(
        &self,
        kind: OrgUnitKind,
        req: CreateOrgUnitRequest,
    ) -> AppResult<OrgUnit> {
        let mut store = self.store();
        let unit = OrgUnit {
            id: store.id(),
            name: req.name,
            location: req.location,
            created_at: Utc::now(),
        };
        store.units_mut(kind).push(unit.clone());
        Ok(unit)
    }

    async fn update_org_unit(
        &self,
        kind: OrgUnitKind,
        id: i64,
        req: UpdateOrgUnitRequest,
    ) -> AppResult<Option<OrgUnit>> {
        let mut store = self.store();
        let Some(unit) = store.units_mut(kind).iter_mut().find(|u| u.id == id) else {
            return Ok(None);
        };
        if let Some(name) = req.name {
            unit.name = name;
        }
        if let Some(location) = req.location {
            unit.location = location;
        }
        Ok(Some(unit.clone()))
    }

    async fn delete_org_unit(&self, kind: OrgUnitKind, id: i64) -> AppResult<bool> {
        let mut store = self.store();
        let referenced = store.employees.iter().any(|e| match kind {
            OrgUnitKind::Branch => e.branch_id == id,
            OrgUnitKind::Department => e.department_id == id,
        });
        if referenced {
            return Err(AppError::bad_request(format!(
                "{} is still assigned to employees",
                kind.label()
            )));
        }
        let units = store.units_mut(kind);
        let before = units.len();
        units.retain(|u| u.id != id);
        Ok(units.len() < before)
    }

    // --- Employees ---

    async fn list_employees(&self, include_deleted: bool) -> AppResult<Vec<Employee>> {
        let store = self.store();
        let mut rows: Vec<Employee> = store
            .employees
            .iter()
            .filter(|e| include_deleted || !e.is_deleted())
            .map(|e| store.hydrate_employee(e.clone()))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn get_employee(&self, id: i64) -> AppResult<Option<Employee>> {
        let store = self.store();
        Ok(store.employee(id).map(|e| store.hydrate_employee(e.clone())))
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let store = self.store();
        Ok(store
            .employees
            .iter()
            .find(|e| e.email.eq_ignore_ascii_case(email))
            .map(|e| store.hydrate_employee(e.clone())))
    }

    async fn create_employee(&self, req: CreateEmployeeRequest) -> AppResult<Employee> {
        let mut store = self.store();
        if store.email_taken(&req.email, None) {
            return Err(AppError::bad_request("Email already exists"));
        }
        let id = store.id();
        let employee = Employee {
            id,
            first_name: req.first_name,
            last_name: req.last_name,
            email: req.email,
            phone: req.phone,
            position: req.position,
            cv_file: req.cv_file,
            gender: req.gender,
            address: req.address,
            status: req.status,
            branch_id: req.branch_id,
            department_id: req.department_id,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.employees.push(employee.clone());
        Ok(store.hydrate_employee(employee))
    }

    async fn update_employee(
        &self,
        id: i64,
        req: UpdateEmployeeRequest,
    ) -> AppResult<Option<Employee>> {
        let mut store = self.store();
        if let Some(email) = &req.email {
            if store.email_taken(email, Some(id)) {
                return Err(AppError::bad_request("Email already exists"));
            }
        }
        let Some(e) = store
            .employees
            .iter_mut()
            .find(|e| e.id == id && !e.is_deleted())
        else {
            return Ok(None);
        };
        if let Some(v) = req.first_name {
            e.first_name = v;
        }
        if let Some(v) = req.last_name {
            e.last_name = v;
        }
        if let Some(v) = req.email {
            e.email = v;
        }
        if let Some(v) = req.phone {
            e.phone = v;
        }
        if let Some(v) = req.position {
            e.position = v;
        }
        if let Some(v) = req.cv_file {
            e.cv_file = v;
        }
        if let Some(v) = req.branch_id {
            e.branch_id = v;
        }
        if let Some(v) = req.department_id {
            e.department_id = v;
        }
        if let Some(v) = req.gender {
            e.gender = v;
        }
        if let Some(v) = req.address {
            e.address = v;
        }
        if let Some(v) = req.status {
            e.status = v;
        }
        e.updated_at = Utc::now();
        let updated = e.clone();
        Ok(Some(store.hydrate_employee(updated)))
    }

    async fn soft_delete_employee(&self, id: i64, at: DateTime<Utc>) -> AppResult<()> {
        let mut store = self.store();
        let Some(e) = store
            .employees
            .iter_mut()
            .find(|e| e.id == id && !e.is_deleted())
        else {
            return Err(AppError::bad_request("Employee is already deleted"));
        };
        e.status = EmployeeStatus::Inactive;
        e.deleted_at = Some(at);
        e.original_email = Some(std::mem::replace(
            &mut e.email,
            tombstone_email("deleted", at, id),
        ));
        e.original_phone = e.phone.take();

        if let Some(user) = store
            .users
            .iter_mut()
            .find(|u| u.employee_id == Some(id) && !u.is_deleted())
        {
            let tombstone = tombstone_email("deleted_user", at, user.id);
            user.original_email = Some(std::mem::replace(&mut user.email, tombstone));
            user.deleted_at = Some(at);
        }
        Ok(())
    }

    async fn restore_employee(&self, id: i64) -> AppResult<Employee> {
        let mut store = self.store();
        let original = match store.employee(id) {
            Some(e) if e.is_deleted() => e.original_email.clone(),
            _ => return Err(AppError::bad_request("Employee is not deleted")),
        };
        if let Some(email) = &original {
            if store.email_taken(email, Some(id)) {
                return Err(AppError::bad_request(
                    "Original email is already in use by another record",
                ));
            }
        }
        for e in store.employees.iter_mut().filter(|e| e.id == id) {
            e.status = EmployeeStatus::Active;
            e.deleted_at = None;
            if let Some(email) = e.original_email.take() {
                e.email = email;
            }
            e.phone = e.original_phone.take();
        }
        for u in store
            .users
            .iter_mut()
            .filter(|u| u.employee_id == Some(id) && u.is_deleted())
        {
            if let Some(email) = u.original_email.take() {
                u.email = email;
            }
            u.deleted_at = None;
        }
        let restored = store.employee(id).cloned().unwrap_or_default();
        Ok(store.hydrate_employee(restored))
    }

    // --- Attendance ---

    async fn list_attendance(&self, filter: AttendanceFilter) -> AppResult<Vec<Attendance>> {
        let store = self.store();
        let mut rows: Vec<Attendance> = store
            .attendance
            .iter()
            .filter(|a| attendance_matches(&filter, a))
            .map(|a| store.hydrate_attendance(a.clone()))
            .collect();
        rows.sort_by(|a, b| b.date.cmp(&a.date).then(b.check_in.cmp(&a.check_in)));
        Ok(rows)
    }

    async fn get_attendance(&self, id: i64) -> AppResult<Option<Attendance>> {
        let store = self.store();
        Ok(store
            .attendance
            .iter()
            .find(|a| a.id == id)
            .map(|a| store.hydrate_attendance(a.clone())))
    }

    async fn find_attendance_for_day(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>> {
        let store = self.store();
        Ok(store
            .attendance
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == date)
            .map(|a| store.hydrate_attendance(a.clone())))
    }

    async fn create_check_in(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Attendance>> {
        let mut store = self.store();
        if store
            .attendance
            .iter()
            .any(|a| a.employee_id == employee_id && a.date == date)
        {
            return Ok(None);
        }
        let row = Attendance {
            id: store.id(),
            employee_id,
            date,
            check_in: at,
            ..Default::default()
        };
        store.attendance.push(row.clone());
        Ok(Some(store.hydrate_attendance(row)))
    }

    async fn record_check_out(
        &self,
        id: i64,
        at: DateTime<Utc>,
        hours_worked: f64,
    ) -> AppResult<Option<Attendance>> {
        let mut store = self.store();
        let Some(row) = store
            .attendance
            .iter_mut()
            .find(|a| a.id == id && a.check_out.is_none())
        else {
            return Ok(None);
        };
        row.check_out = Some(at);
        row.hours_worked = Some(hours_worked);
        let row = row.clone();
        Ok(Some(store.hydrate_attendance(row)))
    }

    async fn update_attendance(
        &self,
        id: i64,
        change: AttendanceChange,
    ) -> AppResult<Option<Attendance>> {
        let mut store = self.store();
        let Some(row) = store.attendance.iter_mut().find(|a| a.id == id) else {
            return Ok(None);
        };
        row.check_in = change.check_in;
        row.check_out = change.check_out;
        row.hours_worked = change.hours_worked;
        let row = row.clone();
        Ok(Some(store.hydrate_attendance(row)))
    }

    async fn delete_attendance(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store();
        let before = store.attendance.len();
        store.attendance.retain(|a| a.id != id);
        Ok(store.attendance.len() < before)
    }

    // --- Leave ---

    async fn list_leaves(&self, employee_id: Option<i64>) -> AppResult<Vec<LeaveRequest>> {
        let store = self.store();
        let mut rows: Vec<LeaveRequest> = store
            .leaves
            .iter()
            .filter(|l| employee_id.is_none_or(|id| l.employee_id == id))
            .map(|l| store.hydrate_leave(l.clone()))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn get_leave(&self, id: i64) -> AppResult<Option<LeaveRequest>> {
        let store = self.store();
        Ok(store
            .leaves
            .iter()
            .find(|l| l.id == id)
            .map(|l| store.hydrate_leave(l.clone())))
    }

    async fn create_leave(&self, req: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let mut store = self.store();
        let leave = LeaveRequest {
            id: store.id(),
            employee_id: req.employee_id,
            start_date: req.start_date,
            end_date: req.end_date,
            reason: req.reason,
            leave_type: req.leave_type,
            number_of_days: req.number_of_days,
            duration_type: req.duration_type,
            status: req.status,
            comments: req.comments,
            approved_by_id: req.approved_by_id,
            approval_date: req.approval_date,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.leaves.push(leave.clone());
        Ok(store.hydrate_leave(leave))
    }

    async fn update_leave_status(
        &self,
        id: i64,
        change: LeaveStatusChange,
    ) -> AppResult<Option<LeaveRequest>> {
        let mut store = self.store();
        let Some(leave) = store.leaves.iter_mut().find(|l| l.id == id) else {
            return Ok(None);
        };
        leave.status = change.status;
        if change.comments.is_some() {
            leave.comments = change.comments;
        }
        if change.stamp_approval {
            leave.approved_by_id = change.approved_by_id;
            leave.approval_date = change.approval_date;
        }
        let leave = leave.clone();
        Ok(Some(store.hydrate_leave(leave)))
    }

    async fn delete_leave(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store();
        let before = store.leaves.len();
        store.leaves.retain(|l| l.id != id);
        Ok(store.leaves.len() < before)
    }

    // --- Projects & Tasks ---

    async fn list_projects(&self, filter: ProjectFilter) -> AppResult<Vec<Project>> {
        let store = self.store();
        let mut rows: Vec<Project> = store
            .projects
            .iter()
            .filter(|p| {
                filter.member_id.is_none_or(|member| {
                    store
                        .members
                        .iter()
                        .any(|m| m.project_id == p.id && m.employee_id == member)
                })
            })
            .filter(|p| filter.category.as_ref().is_none_or(|c| &p.category == c))
            .filter(|p| filter.status.is_none_or(|s| p.status == s))
            .map(|p| store.hydrate_project(p.clone()))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn get_project(&self, id: i64) -> AppResult<Option<Project>> {
        let store = self.store();
        Ok(store
            .projects
            .iter()
            .find(|p| p.id == id)
            .map(|p| store.hydrate_project(p.clone())))
    }

    async fn project_members(&self, project_id: i64) -> AppResult<Vec<ProjectMember>> {
        let store = self.store();
        Ok(store
            .members
            .iter()
            .filter(|m| m.project_id == project_id)
            .map(|m| store.hydrate_member(m.clone()))
            .collect())
    }

    async fn project_tasks(&self, project_id: i64) -> AppResult<Vec<Task>> {
        let store = self.store();
        let mut rows: Vec<Task> = store
            .tasks
            .iter()
            .filter(|t| t.project_id == project_id)
            .map(|t| store.hydrate_task(t.clone()))
            .collect();
        rows.sort_by(|a, b| b.id.cmp(&a.id));
        Ok(rows)
    }

    async fn project_title_exists(&self, title: &str) -> AppResult<bool> {
        Ok(self
            .store()
            .projects
            .iter()
            .any(|p| p.title.eq_ignore_ascii_case(title.trim())))
    }

    async fn create_project(&self, project: NewProject) -> AppResult<Project> {
        let mut store = self.store();
        if store.projects.iter().any(|p| p.title.eq_ignore_ascii_case(&project.title)) {
            return Err(AppError::bad_request("Project title already exists"));
        }
        let row = Project {
            id: store.id(),
            title: project.title,
            description: project.description,
            client_name: project.client_name,
            start_date: project.start_date,
            end_date: project.end_date,
            deadline: project.deadline,
            priority: project.priority,
            category: project.category,
            image: project.image,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.projects.push(row.clone());
        Ok(store.hydrate_project(row))
    }

    async fn update_project(
        &self,
        id: i64,
        req: UpdateProjectRequest,
    ) -> AppResult<Option<Project>> {
        let mut store = self.store();
        if let Some(title) = &req.title {
            if store
                .projects
                .iter()
                .any(|p| p.id != id && p.title.eq_ignore_ascii_case(title.trim()))
            {
                return Err(AppError::bad_request("Project title already exists"));
            }
        }
        let Some(p) = store.projects.iter_mut().find(|p| p.id == id) else {
            return Ok(None);
        };
        if let Some(v) = req.title {
            p.title = v.trim().to_string();
        }
        if let Some(v) = req.description {
            p.description = v;
        }
        if let Some(v) = req.client_name {
            p.client_name = v;
        }
        if let Some(v) = req.start_date {
            p.start_date = v;
        }
        if let Some(v) = req.end_date {
            p.end_date = v;
        }
        if let Some(v) = req.deadline {
            p.deadline = v;
        }
        if let Some(v) = req.priority {
            p.priority = v;
        }
        if let Some(v) = req.status {
            p.status = v;
        }
        if let Some(v) = req.progress {
            p.progress = v;
        }
        if let Some(v) = req.category {
            p.category = v;
        }
        if let Some(v) = req.image {
            p.image = v;
        }
        let p = p.clone();
        Ok(Some(store.hydrate_project(p)))
    }

    async fn delete_project(&self, id: i64) -> AppResult<bool> {
        let mut store = self.store();
        let before = store.projects.len();
        store.projects.retain(|p| p.id != id);
        store.members.retain(|m| m.project_id != id);
        store.tasks.retain(|t| t.project_id != id);
        Ok(store.projects.len() < before)
    }

    async fn is_project_member(&self, project_id: i64, employee_id: i64) -> AppResult<bool> {
        Ok(self
            .store()
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.employee_id == employee_id))
    }

    async fn add_project_member(
        &self,
        project_id: i64,
        employee_id: i64,
        role: MemberRole,
    ) -> AppResult<Option<ProjectMember>> {
        let mut store = self.store();
        if store
            .members
            .iter()
            .any(|m| m.project_id == project_id && m.employee_id == employee_id)
        {
            return Ok(None);
        }
        let member = ProjectMember {
            id: store.id(),
            project_id,
            employee_id,
            role,
            joined_at: Utc::now(),
            ..Default::default()
        };
        store.members.push(member.clone());
        Ok(Some(store.hydrate_member(member)))
    }

    async fn create_task(&self, task: NewTask) -> AppResult<Task> {
        let mut store = self.store();
        let row = Task {
            id: store.id(),
            project_id: task.project_id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            due_date: task.due_date,
            assigned_to: task.assigned_to,
            created_at: Utc::now(),
            updated_at: Utc::now(),
            ..Default::default()
        };
        store.tasks.push(row.clone());
        Ok(store.hydrate_task(row))
    }

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>> {
        let store = self.store();
        Ok(store
            .tasks
            .iter()
            .find(|t| t.id == id)
            .map(|t| store.hydrate_task(t.clone())))
    }

    async fn update_task_status(&self, id: i64, status: TaskStatus) -> AppResult<Option<Task>> {
        let mut store = self.store();
        let Some(task) = store.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        task.status = status;
        let task = task.clone();
        Ok(Some(store.hydrate_task(task)))
    }

    // --- Dashboard ---

    async fn admin_dashboard(&self, today: NaiveDate) -> AppResult<AdminDashboard> {
        let store = self.store();
        let todays: Vec<&Attendance> = store.attendance.iter().filter(|a| a.date == today).collect();
        let total_tasks = store.tasks.len() as i64;
        let completed_tasks = store
            .tasks
            .iter()
            .filter(|t| t.status == TaskStatus::Completed)
            .count() as i64;

        let mut recent_leaves: Vec<LeaveRequest> = store
            .leaves
            .iter()
            .map(|l| store.hydrate_leave(l.clone()))
            .collect();
        recent_leaves.sort_by(|a, b| b.id.cmp(&a.id));
        recent_leaves.truncate(5);

        let mut department_stats: Vec<DepartmentStat> = store
            .departments
            .iter()
            .map(|d| DepartmentStat {
                name: d.name.clone(),
                employee_count: store
                    .employees
                    .iter()
                    .filter(|e| e.department_id == d.id && !e.is_deleted())
                    .count() as i64,
            })
            .collect();
        department_stats.sort_by(|a, b| a.name.cmp(&b.name));

        let mut today_attendance_details: Vec<TodayAttendanceDetail> = todays
            .iter()
            .map(|a| TodayAttendanceDetail {
                employee_name: store
                    .employee(a.employee_id)
                    .map(|e| format!("{} {}", e.first_name, e.last_name))
                    .unwrap_or_default(),
                check_in: a.check_in,
                check_out: a.check_out,
                status: if a.check_out.is_some() { "completed" } else { "active" }.to_string(),
            })
            .collect();
        today_attendance_details.sort_by(|a, b| a.check_in.cmp(&b.check_in));

        Ok(AdminDashboard {
            total_employees: store.employees.iter().filter(|e| !e.is_deleted()).count() as i64,
            pending_leaves: store
                .leaves
                .iter()
                .filter(|l| l.status == LeaveStatus::Pending)
                .count() as i64,
            today_check_ins: todays.len() as i64,
            pending_check_outs: todays.iter().filter(|a| a.check_out.is_none()).count() as i64,
            active_projects: store
                .projects
                .iter()
                .filter(|p| p.status == ProjectStatus::Active)
                .count() as i64,
            completed_tasks,
            total_tasks,
            task_completion_rate: task_completion_rate(completed_tasks, total_tasks),
            recent_leaves,
            department_stats,
            today_attendance_details,
        })
    }

    async fn employee_dashboard(
        &self,
        employee_id: i64,
        today: NaiveDate,
        annual_leave_days: i64,
    ) -> AppResult<EmployeeDashboard> {
        let store = self.store();
        let open_tasks: Vec<&Task> = store
            .tasks
            .iter()
            .filter(|t| t.assigned_to == Some(employee_id) && t.status != TaskStatus::Completed)
            .collect();

        let used_days: f64 = store
            .leaves
            .iter()
            .filter(|l| {
                l.employee_id == employee_id
                    && l.status == LeaveStatus::Approved
                    && l.start_date >= year_start(today)
            })
            .map(|l| l.number_of_days)
            .sum();

        let my_today_status = store
            .attendance
            .iter()
            .find(|a| a.employee_id == employee_id && a.date == today)
            .map(|a| TodayStatus {
                checked_in: true,
                check_in_time: Some(a.check_in),
                check_out_time: a.check_out,
                hours_worked: a.hours_worked,
            })
            .unwrap_or_default();

        let mut my_weekly_attendance: Vec<WeeklyAttendance> = store
            .attendance
            .iter()
            .filter(|a| {
                a.employee_id == employee_id && a.date >= week_start(today) && a.date <= today
            })
            .map(|a| WeeklyAttendance {
                date: a.date,
                hours_worked: a.hours_worked,
            })
            .collect();
        my_weekly_attendance.sort_by(|a, b| b.date.cmp(&a.date));

        let mut my_tasks_detailed: Vec<EmployeeTaskSummary> = store
            .tasks
            .iter()
            .filter(|t| t.assigned_to == Some(employee_id))
            .map(|t| EmployeeTaskSummary {
                id: t.id,
                title: t.title.clone(),
                priority: t.priority,
                status: t.status,
                due_date: t.due_date,
                project_id: t.project_id,
                project_name: store
                    .projects
                    .iter()
                    .find(|p| p.id == t.project_id)
                    .map(|p| p.title.clone())
                    .unwrap_or_default(),
            })
            .collect();
        my_tasks_detailed.sort_by(|a, b| a.due_date.cmp(&b.due_date).then(a.id.cmp(&b.id)));
        my_tasks_detailed.truncate(5);

        Ok(EmployeeDashboard {
            my_tasks: open_tasks.len() as i64,
            my_projects: store
                .members
                .iter()
                .filter(|m| m.employee_id == employee_id)
                .count() as i64,
            my_pending_leaves: store
                .leaves
                .iter()
                .filter(|l| l.employee_id == employee_id && l.status == LeaveStatus::Pending)
                .count() as i64,
            my_leave_balance: leave_balance(annual_leave_days, used_days),
            my_today_status,
            weekly_hours: round2(my_weekly_attendance.iter().filter_map(|d| d.hours_worked).sum()),
            my_tasks_detailed,
            my_weekly_attendance,
        })
    }
}

// Same predicate as the WHERE clause `list_attendance` builds; date bounds are inclusive.
fn attendance_matches(filter: &AttendanceFilter, row: &Attendance) -> bool {
    filter.employee_id.is_none_or(|id| row.employee_id == id)
        && filter.start_date.is_none_or(|d| row.date >= d)
        && filter.end_date.is_none_or(|d| row.date <= d)
}

// --- State & identity helpers ---

pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

pub fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, h, min, 0).unwrap()
}

/// AppState over `repo` with the clock frozen at `now`.
pub fn state_at(repo: &Arc<MemoryRepository>, now: DateTime<Utc>) -> AppState {
    AppState {
        repo: repo.clone() as RepositoryState,
        clock: Arc::new(FixedClock(now)),
        config: AppConfig::default(),
    }
}

pub fn auth_for(user: &User) -> AuthUser {
    AuthUser {
        id: user.id,
        email: user.email.clone(),
        role: user.role,
        linked_employee: user.employee_id,
        token: None,
    }
}

/// Status and JSON body of a handler result.
pub async fn respond<T: IntoResponse>(result: T) -> (u16, Value) {
    let response = result.into_response();
    let status = response.status().as_u16();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

/// Unwraps the `{"error": ...}` message of a failed handler call.
pub fn error_message<T: std::fmt::Debug>(result: AppResult<T>) -> String {
    result.unwrap_err().client_message()
}
