use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use sqlx::{PgPool, Postgres, query_builder::QueryBuilder};
use uuid::Uuid;

use super::Repository;
use crate::{
    clock::{round2, week_start, year_start},
    error::{AppError, AppResult},
    models::{
        AdminDashboard, Attendance, AttendanceChange, AttendanceFilter, CreateEmployeeRequest,
        CreateOrgUnitRequest, DepartmentStat, Employee, EmployeeDashboard, EmployeeTaskSummary,
        LeaveRequest, LeaveStatusChange, MemberRole, NewLeaveRequest, NewProject, NewTask,
        NewUser, OrgUnit, OrgUnitKind, Project, ProjectFilter, ProjectMember, Task, TaskStatus,
        TodayAttendanceDetail, TodayStatus, UpdateEmployeeRequest, UpdateOrgUnitRequest,
        UpdateProjectRequest, User, WeeklyAttendance, leave_balance, task_completion_rate,
        tombstone_email,
    },
};

const USER_COLUMNS: &str =
    "id, email, password_hash, role, employee_id, original_email, deleted_at, created_at";

const EMPLOYEE_SELECT: &str = r#"
    SELECT
        e.id, e.first_name, e.last_name, e.email, e.phone, e.position, e.cv_file,
        e.gender, e.address, e.status, e.branch_id, e.department_id,
        e.original_email, e.original_phone, e.deleted_at, e.created_at, e.updated_at,
        b.name AS branch_name, d.name AS department_name,
        u.id AS user_id, u.role AS user_role
    FROM employees e
    JOIN branches b ON b.id = e.branch_id
    JOIN departments d ON d.id = e.department_id
    LEFT JOIN users u ON u.employee_id = e.id
"#;

// Expects the attendance rows aliased as `a`.
const ATTENDANCE_COLUMNS: &str = r#"
    a.id, a.employee_id, a.date, a.check_in, a.check_out, a.hours_worked,
    e.first_name AS employee_first_name, e.last_name AS employee_last_name,
    e.email AS employee_email
"#;

const LEAVE_SELECT: &str = r#"
    SELECT
        l.id, l.employee_id, l.start_date, l.end_date, l.reason, l.leave_type,
        l.number_of_days, l.duration_type, l.status, l.comments, l.approved_by_id,
        l.approval_date, l.created_at, l.updated_at,
        e.first_name AS employee_first_name, e.last_name AS employee_last_name,
        e.email AS employee_email
    FROM leave_requests l
    JOIN employees e ON e.id = l.employee_id
"#;

const PROJECT_SELECT: &str = r#"
    SELECT
        p.id, p.title, p.description, p.client_name, p.start_date, p.end_date, p.deadline,
        p.priority, p.status, p.progress, p.category, p.image, p.created_at, p.updated_at,
        (SELECT COUNT(*) FROM project_employees pe WHERE pe.project_id = p.id) AS number_of_members,
        (SELECT COUNT(*) FROM tasks t WHERE t.project_id = p.id AND t.status <> 'COMPLETED') AS open_tasks
    FROM projects p
"#;

const MEMBER_SELECT: &str = r#"
    SELECT
        pe.id, pe.project_id, pe.employee_id, pe.role, pe.joined_at,
        e.first_name, e.last_name, e.email, e.position
    FROM project_employees pe
    JOIN employees e ON e.id = pe.employee_id
"#;

const TASK_SELECT: &str = r#"
    SELECT
        t.id, t.project_id, t.title, t.description, t.priority, t.status, t.due_date,
        t.assigned_to, e.first_name AS assignee_first_name, e.last_name AS assignee_last_name,
        t.created_at, t.updated_at
    FROM tasks t
    LEFT JOIN employees e ON e.id = t.assigned_to
"#;

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

fn is_foreign_key_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_foreign_key_violation())
}

/// PostgresRepository
///
/// The production implementation of `Repository`, backed by a `PgPool`.
pub struct PostgresRepository {
    pool: PgPool,
}

impl PostgresRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn count(&self, sql: &str, bind: Option<i64>) -> AppResult<i64> {
        let mut query = sqlx::query_scalar::<_, i64>(sql);
        if let Some(value) = bind {
            query = query.bind(value);
        }
        Ok(query.fetch_one(&self.pool).await?)
    }

    async fn get_member(&self, id: i64) -> AppResult<Option<ProjectMember>> {
        let sql = format!("{MEMBER_SELECT} WHERE pe.id = $1");
        Ok(sqlx::query_as::<_, ProjectMember>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl Repository for PostgresRepository {
    // --- Users & Auth ---

    async fn find_user_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE LOWER(email) = LOWER($1)");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_user(&self, id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_user_by_employee(&self, employee_id: i64) -> AppResult<Option<User>> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE employee_id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(employee_id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_user(&self, user: NewUser) -> AppResult<User> {
        let sql = format!(
            "INSERT INTO users (email, password_hash, role, employee_id) \
             VALUES ($1, $2, $3, $4) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(user.employee_id)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    AppError::bad_request("Email already registered")
                } else {
                    e.into()
                }
            })
    }

    /// revoke_token
    ///
    /// Housekeeping piggybacks on logout: expired revocations can never match
    /// a valid token again, so they are dropped before the insert.
    async fn revoke_token(&self, jti: Uuid, expires_at: DateTime<Utc>) -> AppResult<()> {
        sqlx::query("DELETE FROM revoked_tokens WHERE expires_at < NOW()")
            .execute(&self.pool)
            .await?;
        sqlx::query(
            "INSERT INTO revoked_tokens (jti, expires_at) VALUES ($1, $2) ON CONFLICT (jti) DO NOTHING",
        )
        .bind(jti)
        .bind(expires_at)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn is_token_revoked(&self, jti: Uuid) -> AppResult<bool> {
        Ok(
            sqlx::query_scalar::<_, bool>(
                "SELECT EXISTS (SELECT 1 FROM revoked_tokens WHERE jti = $1)",
            )
            .bind(jti)
            .fetch_one(&self.pool)
            .await?,
        )
    }

    // --- Branches & Departments ---

    async fn list_org_units(&self, kind: OrgUnitKind) -> AppResult<Vec<OrgUnit>> {
        let sql = format!(
            "SELECT id, name, location, created_at FROM {} ORDER BY id DESC",
            kind.table()
        );
        Ok(sqlx::query_as::<_, OrgUnit>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_org_unit(&self, kind: OrgUnitKind, id: i64) -> AppResult<Option<OrgUnit>> {
        let sql = format!(
            "SELECT id, name, location, created_at FROM {} WHERE id = $1",
            kind.table()
        );
        Ok(sqlx::query_as::<_, OrgUnit>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_org_unit(
        &self,
        kind: OrgUnitKind,
        req: CreateOrgUnitRequest,
    ) -> AppResult<OrgUnit> {
        let sql = format!(
            "INSERT INTO {} (name, location) VALUES ($1, $2) RETURNING id, name, location, created_at",
            kind.table()
        );
        Ok(sqlx::query_as::<_, OrgUnit>(&sql)
            .bind(req.name.trim())
            .bind(req.location)
            .fetch_one(&self.pool)
            .await?)
    }

    async fn update_org_unit(
        &self,
        kind: OrgUnitKind,
        id: i64,
        req: UpdateOrgUnitRequest,
    ) -> AppResult<Option<OrgUnit>> {
        let sql = format!(
            r#"
            UPDATE {} SET
                name = COALESCE($2, name),
                location = CASE WHEN $3 THEN $4 ELSE location END
            WHERE id = $1
            RETURNING id, name, location, created_at
            "#,
            kind.table()
        );
        Ok(sqlx::query_as::<_, OrgUnit>(&sql)
            .bind(id)
            .bind(req.name)
            .bind(req.location.is_some())
            .bind(req.location.flatten())
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_org_unit(&self, kind: OrgUnitKind, id: i64) -> AppResult<bool> {
        let sql = format!("DELETE FROM {} WHERE id = $1", kind.table());
        match sqlx::query(&sql).bind(id).execute(&self.pool).await {
            Ok(result) => Ok(result.rows_affected() > 0),
            Err(e) if is_foreign_key_violation(&e) => Err(AppError::bad_request(format!(
                "{} is still assigned to employees",
                kind.label()
            ))),
            Err(e) => Err(e.into()),
        }
    }

    // --- Employees ---

    async fn list_employees(&self, include_deleted: bool) -> AppResult<Vec<Employee>> {
        let filter = if include_deleted {
            ""
        } else {
            "WHERE e.deleted_at IS NULL"
        };
        let sql = format!("{EMPLOYEE_SELECT} {filter} ORDER BY e.created_at DESC, e.id DESC");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_employee(&self, id: i64) -> AppResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE e.id = $1");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_employee_by_email(&self, email: &str) -> AppResult<Option<Employee>> {
        let sql = format!("{EMPLOYEE_SELECT} WHERE LOWER(e.email) = LOWER($1)");
        Ok(sqlx::query_as::<_, Employee>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_employee(&self, req: CreateEmployeeRequest) -> AppResult<Employee> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO employees (
                first_name, last_name, email, phone, position, cv_file,
                gender, address, status, branch_id, department_id
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(req.first_name.trim())
        .bind(req.last_name.trim())
        .bind(req.email.trim())
        .bind(req.phone)
        .bind(req.position.trim())
        .bind(req.cv_file)
        .bind(req.gender)
        .bind(req.address.trim())
        .bind(req.status)
        .bind(req.branch_id)
        .bind(req.department_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::bad_request("Email already exists")
            } else {
                e.into()
            }
        })?;

        self.get_employee(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("employee {id} vanished after insert")))
    }

    async fn update_employee(
        &self,
        id: i64,
        req: UpdateEmployeeRequest,
    ) -> AppResult<Option<Employee>> {
        let result = sqlx::query(
            r#"
            UPDATE employees SET
                first_name = COALESCE($2, first_name),
                last_name = COALESCE($3, last_name),
                email = COALESCE($4, email),
                phone = CASE WHEN $5 THEN $6 ELSE phone END,
                position = COALESCE($7, position),
                cv_file = CASE WHEN $8 THEN $9 ELSE cv_file END,
                branch_id = COALESCE($10, branch_id),
                department_id = COALESCE($11, department_id),
                gender = COALESCE($12, gender),
                address = COALESCE($13, address),
                status = COALESCE($14, status),
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(req.first_name)
        .bind(req.last_name)
        .bind(req.email)
        .bind(req.phone.is_some())
        .bind(req.phone.flatten())
        .bind(req.position)
        .bind(req.cv_file.is_some())
        .bind(req.cv_file.flatten())
        .bind(req.branch_id)
        .bind(req.department_id)
        .bind(req.gender)
        .bind(req.address)
        .bind(req.status)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::bad_request("Email already exists")
            } else if is_foreign_key_violation(&e) {
                AppError::bad_request("Branch or department not found")
            } else {
                e.into()
            }
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_employee(id).await
    }

    /// soft_delete_employee
    ///
    /// Moves the live email/phone into `original_*`, writes tombstone emails
    /// and stamps `deleted_at` on the employee and its linked user.
    /// Both updates commit together or not at all.
    async fn soft_delete_employee(&self, id: i64, at: DateTime<Utc>) -> AppResult<()> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                status = 'Inactive',
                deleted_at = $2,
                original_email = email,
                original_phone = phone,
                email = $3,
                phone = NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NULL
            "#,
        )
        .bind(id)
        .bind(at)
        .bind(tombstone_email("deleted", at, id))
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::bad_request("Employee is already deleted"));
        }

        let user_id = sqlx::query_scalar::<_, i64>(
            "SELECT id FROM users WHERE employee_id = $1 AND deleted_at IS NULL",
        )
        .bind(id)
        .fetch_optional(&mut *tx)
        .await?;

        if let Some(user_id) = user_id {
            sqlx::query(
                r#"
                UPDATE users SET
                    original_email = email,
                    email = $2,
                    deleted_at = $3
                WHERE id = $1
                "#,
            )
            .bind(user_id)
            .bind(tombstone_email("deleted_user", at, user_id))
            .bind(at)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    async fn restore_employee(&self, id: i64) -> AppResult<Employee> {
        let taken = |e: sqlx::Error| {
            if is_unique_violation(&e) {
                AppError::bad_request("Original email is already in use by another record")
            } else {
                AppError::from(e)
            }
        };

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE employees SET
                status = 'Active',
                deleted_at = NULL,
                email = COALESCE(original_email, email),
                phone = original_phone,
                original_email = NULL,
                original_phone = NULL,
                updated_at = NOW()
            WHERE id = $1 AND deleted_at IS NOT NULL
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(taken)?;

        if result.rows_affected() == 0 {
            return Err(AppError::bad_request("Employee is not deleted"));
        }

        sqlx::query(
            r#"
            UPDATE users SET
                email = COALESCE(original_email, email),
                original_email = NULL,
                deleted_at = NULL
            WHERE employee_id = $1 AND deleted_at IS NOT NULL
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await
        .map_err(taken)?;

        tx.commit().await?;

        self.get_employee(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("employee {id} vanished after restore")))
    }

    // --- Attendance ---

    async fn list_attendance(&self, filter: AttendanceFilter) -> AppResult<Vec<Attendance>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a JOIN employees e ON e.id = a.employee_id WHERE 1 = 1"
        ));
        if let Some(employee_id) = filter.employee_id {
            builder.push(" AND a.employee_id = ");
            builder.push_bind(employee_id);
        }
        if let Some(start) = filter.start_date {
            builder.push(" AND a.date >= ");
            builder.push_bind(start);
        }
        if let Some(end) = filter.end_date {
            builder.push(" AND a.date <= ");
            builder.push_bind(end);
        }
        builder.push(" ORDER BY a.date DESC, a.check_in DESC");

        Ok(builder
            .build_query_as::<Attendance>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_attendance(&self, id: i64) -> AppResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a JOIN employees e ON e.id = a.employee_id WHERE a.id = $1"
        );
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_attendance_for_day(
        &self,
        employee_id: i64,
        date: NaiveDate,
    ) -> AppResult<Option<Attendance>> {
        let sql = format!(
            "SELECT {ATTENDANCE_COLUMNS} FROM attendance a JOIN employees e ON e.id = a.employee_id \
             WHERE a.employee_id = $1 AND a.date = $2"
        );
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(employee_id)
            .bind(date)
            .fetch_optional(&self.pool)
            .await?)
    }

    /// create_check_in
    ///
    /// `ON CONFLICT DO NOTHING` on `(employee_id, date)` makes the insert the
    /// arbiter: of two concurrent check-ins exactly one gets a row back.
    async fn create_check_in(
        &self,
        employee_id: i64,
        date: NaiveDate,
        at: DateTime<Utc>,
    ) -> AppResult<Option<Attendance>> {
        let sql = format!(
            r#"
            WITH a AS (
                INSERT INTO attendance (employee_id, date, check_in)
                VALUES ($1, $2, $3)
                ON CONFLICT (employee_id, date) DO NOTHING
                RETURNING *
            )
            SELECT {ATTENDANCE_COLUMNS} FROM a JOIN employees e ON e.id = a.employee_id
            "#
        );
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(employee_id)
            .bind(date)
            .bind(at)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn record_check_out(
        &self,
        id: i64,
        at: DateTime<Utc>,
        hours_worked: f64,
    ) -> AppResult<Option<Attendance>> {
        let sql = format!(
            r#"
            WITH a AS (
                UPDATE attendance SET check_out = $2, hours_worked = $3
                WHERE id = $1 AND check_out IS NULL
                RETURNING *
            )
            SELECT {ATTENDANCE_COLUMNS} FROM a JOIN employees e ON e.id = a.employee_id
            "#
        );
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(id)
            .bind(at)
            .bind(hours_worked)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_attendance(
        &self,
        id: i64,
        change: AttendanceChange,
    ) -> AppResult<Option<Attendance>> {
        let sql = format!(
            r#"
            WITH a AS (
                UPDATE attendance SET check_in = $2, check_out = $3, hours_worked = $4
                WHERE id = $1
                RETURNING *
            )
            SELECT {ATTENDANCE_COLUMNS} FROM a JOIN employees e ON e.id = a.employee_id
            "#
        );
        Ok(sqlx::query_as::<_, Attendance>(&sql)
            .bind(id)
            .bind(change.check_in)
            .bind(change.check_out)
            .bind(change.hours_worked)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn delete_attendance(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM attendance WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Leave ---

    async fn list_leaves(&self, employee_id: Option<i64>) -> AppResult<Vec<LeaveRequest>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(LEAVE_SELECT);
        if let Some(employee_id) = employee_id {
            builder.push(" WHERE l.employee_id = ");
            builder.push_bind(employee_id);
        }
        builder.push(" ORDER BY l.created_at DESC, l.id DESC");

        Ok(builder
            .build_query_as::<LeaveRequest>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_leave(&self, id: i64) -> AppResult<Option<LeaveRequest>> {
        let sql = format!("{LEAVE_SELECT} WHERE l.id = $1");
        Ok(sqlx::query_as::<_, LeaveRequest>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn create_leave(&self, req: NewLeaveRequest) -> AppResult<LeaveRequest> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO leave_requests (
                employee_id, start_date, end_date, reason, leave_type, number_of_days,
                duration_type, status, comments, approved_by_id, approval_date
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING id
            "#,
        )
        .bind(req.employee_id)
        .bind(req.start_date)
        .bind(req.end_date)
        .bind(req.reason)
        .bind(req.leave_type)
        .bind(req.number_of_days)
        .bind(req.duration_type)
        .bind(req.status)
        .bind(req.comments)
        .bind(req.approved_by_id)
        .bind(req.approval_date)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_foreign_key_violation(&e) {
                AppError::bad_request("Employee not found")
            } else {
                e.into()
            }
        })?;

        self.get_leave(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("leave request {id} vanished after insert")))
    }

    async fn update_leave_status(
        &self,
        id: i64,
        change: LeaveStatusChange,
    ) -> AppResult<Option<LeaveRequest>> {
        let result = sqlx::query(
            r#"
            UPDATE leave_requests SET
                status = $2,
                comments = COALESCE($3, comments),
                approved_by_id = CASE WHEN $4 THEN $5 ELSE approved_by_id END,
                approval_date = CASE WHEN $4 THEN $6 ELSE approval_date END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(change.status)
        .bind(change.comments)
        .bind(change.stamp_approval)
        .bind(change.approved_by_id)
        .bind(change.approval_date)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_leave(id).await
    }

    async fn delete_leave(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM leave_requests WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    // --- Projects & Tasks ---

    async fn list_projects(&self, filter: ProjectFilter) -> AppResult<Vec<Project>> {
        let mut builder: QueryBuilder<Postgres> = QueryBuilder::new(PROJECT_SELECT);
        builder.push(" WHERE 1 = 1");

        if let Some(member_id) = filter.member_id {
            builder.push(
                " AND EXISTS (SELECT 1 FROM project_employees m WHERE m.project_id = p.id AND m.employee_id = ",
            );
            builder.push_bind(member_id);
            builder.push(")");
        }
        if let Some(category) = filter.category {
            builder.push(" AND p.category = ");
            builder.push_bind(category);
        }
        if let Some(status) = filter.status {
            builder.push(" AND p.status = ");
            builder.push_bind(status);
        }
        builder.push(" ORDER BY p.created_at DESC, p.id DESC");

        Ok(builder
            .build_query_as::<Project>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn get_project(&self, id: i64) -> AppResult<Option<Project>> {
        let sql = format!("{PROJECT_SELECT} WHERE p.id = $1");
        Ok(sqlx::query_as::<_, Project>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn project_members(&self, project_id: i64) -> AppResult<Vec<ProjectMember>> {
        let sql = format!("{MEMBER_SELECT} WHERE pe.project_id = $1 ORDER BY pe.joined_at, pe.id");
        Ok(sqlx::query_as::<_, ProjectMember>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn project_tasks(&self, project_id: i64) -> AppResult<Vec<Task>> {
        let sql =
            format!("{TASK_SELECT} WHERE t.project_id = $1 ORDER BY t.created_at DESC, t.id DESC");
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn project_title_exists(&self, title: &str) -> AppResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM projects WHERE LOWER(title) = LOWER($1))",
        )
        .bind(title)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn create_project(&self, project: NewProject) -> AppResult<Project> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO projects (
                title, description, client_name, start_date, end_date, deadline,
                priority, category, image
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING id
            "#,
        )
        .bind(project.title)
        .bind(project.description)
        .bind(project.client_name)
        .bind(project.start_date)
        .bind(project.end_date)
        .bind(project.deadline)
        .bind(project.priority)
        .bind(project.category)
        .bind(project.image)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::bad_request("Project title already exists")
            } else {
                e.into()
            }
        })?;

        self.get_project(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("project {id} vanished after insert")))
    }

    async fn update_project(
        &self,
        id: i64,
        req: UpdateProjectRequest,
    ) -> AppResult<Option<Project>> {
        let result = sqlx::query(
            r#"
            UPDATE projects SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                client_name = COALESCE($4, client_name),
                start_date = COALESCE($5, start_date),
                end_date = CASE WHEN $6 THEN $7 ELSE end_date END,
                deadline = COALESCE($8, deadline),
                priority = COALESCE($9, priority),
                status = COALESCE($10, status),
                progress = COALESCE($11, progress),
                category = COALESCE($12, category),
                image = CASE WHEN $13 THEN $14 ELSE image END,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(req.title)
        .bind(req.description)
        .bind(req.client_name)
        .bind(req.start_date)
        .bind(req.end_date.is_some())
        .bind(req.end_date.flatten())
        .bind(req.deadline)
        .bind(req.priority)
        .bind(req.status)
        .bind(req.progress)
        .bind(req.category)
        .bind(req.image.is_some())
        .bind(req.image.flatten())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                AppError::bad_request("Project title already exists")
            } else {
                e.into()
            }
        })?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_project(id).await
    }

    async fn delete_project(&self, id: i64) -> AppResult<bool> {
        let result = sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn is_project_member(&self, project_id: i64, employee_id: i64) -> AppResult<bool> {
        Ok(sqlx::query_scalar::<_, bool>(
            "SELECT EXISTS (SELECT 1 FROM project_employees WHERE project_id = $1 AND employee_id = $2)",
        )
        .bind(project_id)
        .bind(employee_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn add_project_member(
        &self,
        project_id: i64,
        employee_id: i64,
        role: MemberRole,
    ) -> AppResult<Option<ProjectMember>> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO project_employees (project_id, employee_id, role)
            VALUES ($1, $2, $3)
            ON CONFLICT (project_id, employee_id) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(project_id)
        .bind(employee_id)
        .bind(role)
        .fetch_optional(&self.pool)
        .await?;

        match id {
            Some(id) => self.get_member(id).await,
            None => Ok(None),
        }
    }

    async fn create_task(&self, task: NewTask) -> AppResult<Task> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO tasks (project_id, title, description, priority, due_date, assigned_to)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id
            "#,
        )
        .bind(task.project_id)
        .bind(task.title)
        .bind(task.description)
        .bind(task.priority)
        .bind(task.due_date)
        .bind(task.assigned_to)
        .fetch_one(&self.pool)
        .await?;

        self.get_task(id)
            .await?
            .ok_or_else(|| AppError::Internal(format!("task {id} vanished after insert")))
    }

    async fn get_task(&self, id: i64) -> AppResult<Option<Task>> {
        let sql = format!("{TASK_SELECT} WHERE t.id = $1");
        Ok(sqlx::query_as::<_, Task>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn update_task_status(&self, id: i64, status: TaskStatus) -> AppResult<Option<Task>> {
        let result = sqlx::query("UPDATE tasks SET status = $2, updated_at = NOW() WHERE id = $1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Ok(None);
        }
        self.get_task(id).await
    }

    // --- Dashboard ---

    async fn admin_dashboard(&self, today: NaiveDate) -> AppResult<AdminDashboard> {
        let recent_sql = format!("{LEAVE_SELECT} ORDER BY l.created_at DESC, l.id DESC LIMIT 5");

        let (
            total_employees,
            pending_leaves,
            active_projects,
            total_tasks,
            completed_tasks,
            (today_check_ins, pending_check_outs),
            recent_leaves,
            department_stats,
            today_attendance_details,
        ) = tokio::try_join!(
            self.count("SELECT COUNT(*) FROM employees WHERE deleted_at IS NULL", None),
            self.count(
                "SELECT COUNT(*) FROM leave_requests WHERE status = 'PENDING'",
                None,
            ),
            self.count("SELECT COUNT(*) FROM projects WHERE status = 'ACTIVE'", None),
            self.count("SELECT COUNT(*) FROM tasks", None),
            self.count("SELECT COUNT(*) FROM tasks WHERE status = 'COMPLETED'", None),
            async {
                sqlx::query_as::<_, (i64, i64)>(
                    "SELECT COUNT(*), COUNT(*) FILTER (WHERE check_out IS NULL) FROM attendance WHERE date = $1",
                )
                .bind(today)
                .fetch_one(&self.pool)
                .await
                .map_err(AppError::from)
            },
            async {
                sqlx::query_as::<_, LeaveRequest>(&recent_sql)
                    .fetch_all(&self.pool)
                    .await
                    .map_err(AppError::from)
            },
            async {
                sqlx::query_as::<_, DepartmentStat>(
                    r#"
                    SELECT d.name, COUNT(e.id) AS employee_count
                    FROM departments d
                    LEFT JOIN employees e ON e.department_id = d.id AND e.deleted_at IS NULL
                    GROUP BY d.id, d.name
                    ORDER BY d.name
                    "#,
                )
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::from)
            },
            async {
                sqlx::query_as::<_, TodayAttendanceDetail>(
                    r#"
                    SELECT
                        e.first_name || ' ' || e.last_name AS employee_name,
                        a.check_in,
                        a.check_out,
                        CASE WHEN a.check_out IS NULL THEN 'active' ELSE 'completed' END AS status
                    FROM attendance a
                    JOIN employees e ON e.id = a.employee_id
                    WHERE a.date = $1
                    ORDER BY a.check_in
                    "#,
                )
                .bind(today)
                .fetch_all(&self.pool)
                .await
                .map_err(AppError::from)
            },
        )?;

        Ok(AdminDashboard {
            total_employees,
            pending_leaves,
            today_check_ins,
            pending_check_outs,
            active_projects,
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
        let my_tasks = self
            .count(
                "SELECT COUNT(*) FROM tasks WHERE assigned_to = $1 AND status <> 'COMPLETED'",
                Some(employee_id),
            )
            .await?;
        let my_projects = self
            .count(
                "SELECT COUNT(*) FROM project_employees WHERE employee_id = $1",
                Some(employee_id),
            )
            .await?;
        let my_pending_leaves = self
            .count(
                "SELECT COUNT(*) FROM leave_requests WHERE employee_id = $1 AND status = 'PENDING'",
                Some(employee_id),
            )
            .await?;

        let used_days = sqlx::query_scalar::<_, f64>(
            r#"
            SELECT COALESCE(SUM(number_of_days), 0)::DOUBLE PRECISION
            FROM leave_requests
            WHERE employee_id = $1 AND status = 'APPROVED' AND start_date >= $2
            "#,
        )
        .bind(employee_id)
        .bind(year_start(today))
        .fetch_one(&self.pool)
        .await?;

        let my_today_status = match self.find_attendance_for_day(employee_id, today).await? {
            Some(row) => TodayStatus {
                checked_in: true,
                check_in_time: Some(row.check_in),
                check_out_time: row.check_out,
                hours_worked: row.hours_worked,
            },
            None => TodayStatus::default(),
        };

        let my_weekly_attendance = sqlx::query_as::<_, WeeklyAttendance>(
            r#"
            SELECT date, hours_worked
            FROM attendance
            WHERE employee_id = $1 AND date BETWEEN $2 AND $3
            ORDER BY date DESC
            "#,
        )
        .bind(employee_id)
        .bind(week_start(today))
        .bind(today)
        .fetch_all(&self.pool)
        .await?;

        let weekly_hours = round2(
            my_weekly_attendance
                .iter()
                .filter_map(|day| day.hours_worked)
                .sum(),
        );

        let my_tasks_detailed = sqlx::query_as::<_, EmployeeTaskSummary>(
            r#"
            SELECT t.id, t.title, t.priority, t.status, t.due_date, t.project_id,
                   p.title AS project_name
            FROM tasks t
            JOIN projects p ON p.id = t.project_id
            WHERE t.assigned_to = $1
            ORDER BY t.due_date ASC, t.id ASC
            LIMIT 5
            "#,
        )
        .bind(employee_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(EmployeeDashboard {
            my_tasks,
            my_projects,
            my_pending_leaves,
            my_leave_balance: leave_balance(annual_leave_days, used_days),
            my_today_status,
            weekly_hours,
            my_tasks_detailed,
            my_weekly_attendance,
        })
    }
}
