use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    handlers::active_employee,
    models::{
        AddMemberRequest, CreateProjectRequest, CreateTaskRequest, MessageResponse, Project,
        ProjectDetails, ProjectFilter, ProjectMember, ProjectQuery, Role, Task, UpdateProjectRequest,
        UpdateTaskRequest,
    },
    validation::ApiJson,
};

async fn load_project(state: &AppState, id: i64) -> AppResult<Project> {
    state
        .repo
        .get_project(id)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))
}

/// list_projects
///
/// [Authenticated Route] EMPLOYEE callers see only the projects they are on.
/// The `category`/`status` filters apply to ADMIN and HR.
#[utoipa::path(
    get,
    path = "/api/projects",
    params(ProjectQuery),
    responses((status = 200, description = "Projects", body = [Project]))
)]
pub async fn list_projects(
    auth: AuthUser,
    State(state): State<AppState>,
    Query(query): Query<ProjectQuery>,
) -> AppResult<Json<Vec<Project>>> {
    let filter = if auth.is_manager() {
        ProjectFilter {
            member_id: None,
            category: query.category.filter(|c| !c.trim().is_empty()),
            status: query.status,
        }
    } else {
        ProjectFilter {
            member_id: Some(auth.employee_id()?),
            ..Default::default()
        }
    };
    Ok(Json(state.repo.list_projects(filter).await?))
}

/// create_project
///
/// [Admin Route] New projects start ACTIVE at 0% progress.
#[utoipa::path(
    post,
    path = "/api/projects",
    request_body = CreateProjectRequest,
    responses(
        (status = 201, description = "Project created", body = Project),
        (status = 400, description = "Validation failed or duplicate title", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_project(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateProjectRequest>,
) -> AppResult<(StatusCode, Json<Project>)> {
    auth.require(&[Role::Admin])?;
    let project = payload.validate()?;

    if state.repo.project_title_exists(&project.title).await? {
        return Err(AppError::bad_request("Project title already exists"));
    }

    let project = state.repo.create_project(project).await?;
    tracing::info!(project_id = project.id, by = auth.id, "project created");
    Ok((StatusCode::CREATED, Json(project)))
}

/// get_project
///
/// [Authenticated Route] The project with its team and tasks.
#[utoipa::path(
    get,
    path = "/api/projects/{id}",
    responses(
        (status = 200, description = "Project details", body = ProjectDetails),
        (status = 403, description = "Not a member", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<ProjectDetails>> {
    let project = load_project(&state, id).await?;

    if !auth.is_manager() && !state.repo.is_project_member(id, auth.employee_id()?).await? {
        return Err(AppError::forbidden("You are not a member of this project"));
    }

    let members = state.repo.project_members(id).await?;
    let tasks = state.repo.project_tasks(id).await?;
    Ok(Json(ProjectDetails {
        project,
        members,
        tasks,
    }))
}

/// update_project
///
/// [Admin Route] Partial update.
#[utoipa::path(
    patch,
    path = "/api/projects/{id}",
    request_body = UpdateProjectRequest,
    responses(
        (status = 200, description = "Project updated", body = Project),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateProjectRequest>,
) -> AppResult<Json<Project>> {
    auth.require(&[Role::Admin])?;
    payload.validate()?;

    let project = state
        .repo
        .update_project(id, payload)
        .await?
        .ok_or_else(|| AppError::not_found("Project not found"))?;
    tracing::info!(project_id = id, by = auth.id, "project updated");
    Ok(Json(project))
}

/// delete_project
///
/// [Admin Route] Members and tasks go with the project.
#[utoipa::path(
    delete,
    path = "/api/projects/{id}",
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_project(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin])?;
    if !state.repo.delete_project(id).await? {
        return Err(AppError::not_found("Project not found"));
    }
    tracing::info!(project_id = id, by = auth.id, "project deleted");
    Ok(Json(MessageResponse::new("Project deleted successfully")))
}

/// add_member
///
/// [ADMIN/HR Route] Puts an employee on a project team.
#[utoipa::path(
    post,
    path = "/api/projects/team",
    request_body = AddMemberRequest,
    responses(
        (status = 201, description = "Member added", body = ProjectMember),
        (status = 400, description = "Already a member", body = crate::error::ErrorResponse),
        (status = 404, description = "Project or employee not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn add_member(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<AddMemberRequest>,
) -> AppResult<(StatusCode, Json<ProjectMember>)> {
    auth.require(&[Role::Admin, Role::Hr])?;
    load_project(&state, payload.project_id).await?;
    active_employee(&state, payload.employee_id).await?;

    let member = state
        .repo
        .add_project_member(payload.project_id, payload.employee_id, payload.role)
        .await?
        .ok_or_else(|| AppError::bad_request("Employee is already a member of this project"))?;

    tracing::info!(
        project_id = payload.project_id,
        employee_id = payload.employee_id,
        role = ?payload.role,
        by = auth.id,
        "project member added"
    );
    Ok((StatusCode::CREATED, Json(member)))
}

/// create_task
///
/// [ADMIN/HR Route] Tasks may only be assigned to project members.
#[utoipa::path(
    post,
    path = "/api/projects/tasks",
    request_body = CreateTaskRequest,
    responses(
        (status = 201, description = "Task created", body = Task),
        (status = 400, description = "Assignee not on the project", body = crate::error::ErrorResponse),
        (status = 404, description = "Project not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_task(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateTaskRequest>,
) -> AppResult<(StatusCode, Json<Task>)> {
    auth.require(&[Role::Admin, Role::Hr])?;
    let task = payload.validate()?;
    load_project(&state, task.project_id).await?;

    if let Some(assignee) = task.assigned_to {
        if !state.repo.is_project_member(task.project_id, assignee).await? {
            return Err(AppError::bad_request("Employee is not in this project"));
        }
    }

    let task = state.repo.create_task(task).await?;
    tracing::info!(
        task_id = task.id,
        project_id = task.project_id,
        by = auth.id,
        "task created"
    );
    Ok((StatusCode::CREATED, Json(task)))
}

/// update_task
///
/// [Authenticated Route] Status change. EMPLOYEE callers may only move
/// tasks assigned to them.
#[utoipa::path(
    patch,
    path = "/api/projects/tasks/{id}",
    request_body = UpdateTaskRequest,
    responses(
        (status = 200, description = "Task updated", body = Task),
        (status = 403, description = "Not the assignee", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn update_task(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateTaskRequest>,
) -> AppResult<Json<Task>> {
    let task = state
        .repo
        .get_task(id)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;

    if !auth.is_manager() && task.assigned_to != Some(auth.employee_id()?) {
        return Err(AppError::forbidden("You can only update tasks assigned to you"));
    }

    let updated = state
        .repo
        .update_task_status(id, payload.status)
        .await?
        .ok_or_else(|| AppError::not_found("Task not found"))?;
    tracing::info!(task_id = id, status = ?updated.status, by = auth.id, "task status changed");
    Ok(Json(updated))
}
