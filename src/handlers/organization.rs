//! Branch and department endpoints. Both resources share the same
//! behavior; each public handler binds one `OrgUnitKind`.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use crate::{
    AppState,
    auth::AuthUser,
    error::{AppError, AppResult},
    models::{
        CreateOrgUnitRequest, MessageResponse, OrgUnit, OrgUnitKind, Role, UpdateOrgUnitRequest,
    },
    validation::{ApiJson, require_not_empty},
};

fn not_found(kind: OrgUnitKind) -> AppError {
    AppError::not_found(format!("{} not found", kind.label()))
}

async fn list(state: AppState, kind: OrgUnitKind) -> AppResult<Json<Vec<OrgUnit>>> {
    Ok(Json(state.repo.list_org_units(kind).await?))
}

async fn get(state: AppState, kind: OrgUnitKind, id: i64) -> AppResult<Json<OrgUnit>> {
    state
        .repo
        .get_org_unit(kind, id)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(kind))
}

async fn create(
    auth: AuthUser,
    state: AppState,
    kind: OrgUnitKind,
    payload: CreateOrgUnitRequest,
) -> AppResult<(StatusCode, Json<OrgUnit>)> {
    auth.require(&[Role::Admin])?;
    require_not_empty(&payload.name, "name")?;

    let unit = state.repo.create_org_unit(kind, payload).await?;
    tracing::info!(kind = kind.label(), id = unit.id, "org unit created");
    Ok((StatusCode::CREATED, Json(unit)))
}

async fn update(
    auth: AuthUser,
    state: AppState,
    kind: OrgUnitKind,
    id: i64,
    payload: UpdateOrgUnitRequest,
) -> AppResult<Json<OrgUnit>> {
    auth.require(&[Role::Admin])?;
    if let Some(name) = &payload.name {
        require_not_empty(name, "name")?;
    }
    state
        .repo
        .update_org_unit(kind, id, payload)
        .await?
        .map(Json)
        .ok_or_else(|| not_found(kind))
}

async fn delete(
    auth: AuthUser,
    state: AppState,
    kind: OrgUnitKind,
    id: i64,
) -> AppResult<Json<MessageResponse>> {
    auth.require(&[Role::Admin])?;
    if !state.repo.delete_org_unit(kind, id).await? {
        return Err(not_found(kind));
    }
    tracing::info!(kind = kind.label(), id, "org unit deleted");
    Ok(Json(MessageResponse::new("Deleted")))
}

// --- Branches ---

/// list_branches
///
/// [Authenticated Route] All branches, newest first.
#[utoipa::path(
    get,
    path = "/api/branch",
    responses((status = 200, description = "Branches", body = [OrgUnit]))
)]
pub async fn list_branches(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrgUnit>>> {
    list(state, OrgUnitKind::Branch).await
}

/// create_branch
///
/// [Admin Route]
#[utoipa::path(
    post,
    path = "/api/branch",
    request_body = CreateOrgUnitRequest,
    responses(
        (status = 201, description = "Branch created", body = OrgUnit),
        (status = 400, description = "Name missing", body = crate::error::ErrorResponse)
    )
)]
pub async fn create_branch(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateOrgUnitRequest>,
) -> AppResult<(StatusCode, Json<OrgUnit>)> {
    create(auth, state, OrgUnitKind::Branch, payload).await
}

#[utoipa::path(
    get,
    path = "/api/branch/{id}",
    responses(
        (status = 200, description = "Branch", body = OrgUnit),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn get_branch(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrgUnit>> {
    get(state, OrgUnitKind::Branch, id).await
}

/// update_branch
///
/// [Admin Route] Partial update; `location: null` clears the location.
#[utoipa::path(
    patch,
    path = "/api/branch/{id}",
    request_body = UpdateOrgUnitRequest,
    responses((status = 200, description = "Branch updated", body = OrgUnit))
)]
pub async fn update_branch(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateOrgUnitRequest>,
) -> AppResult<Json<OrgUnit>> {
    update(auth, state, OrgUnitKind::Branch, id, payload).await
}

/// delete_branch
///
/// [Admin Route] Refused with 400 while employees are still assigned to the branch.
#[utoipa::path(
    delete,
    path = "/api/branch/{id}",
    responses(
        (status = 200, description = "Deleted", body = MessageResponse),
        (status = 400, description = "Still referenced", body = crate::error::ErrorResponse),
        (status = 404, description = "Not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn delete_branch(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    delete(auth, state, OrgUnitKind::Branch, id).await
}

// --- Departments ---

#[utoipa::path(
    get,
    path = "/api/department",
    responses((status = 200, description = "Departments", body = [OrgUnit]))
)]
pub async fn list_departments(
    _auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<Vec<OrgUnit>>> {
    list(state, OrgUnitKind::Department).await
}

#[utoipa::path(
    post,
    path = "/api/department",
    request_body = CreateOrgUnitRequest,
    responses((status = 201, description = "Department created", body = OrgUnit))
)]
pub async fn create_department(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<CreateOrgUnitRequest>,
) -> AppResult<(StatusCode, Json<OrgUnit>)> {
    create(auth, state, OrgUnitKind::Department, payload).await
}

#[utoipa::path(
    get,
    path = "/api/department/{id}",
    responses((status = 200, description = "Department", body = OrgUnit))
)]
pub async fn get_department(
    _auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<OrgUnit>> {
    get(state, OrgUnitKind::Department, id).await
}

#[utoipa::path(
    patch,
    path = "/api/department/{id}",
    request_body = UpdateOrgUnitRequest,
    responses((status = 200, description = "Department updated", body = OrgUnit))
)]
pub async fn update_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
    ApiJson(payload): ApiJson<UpdateOrgUnitRequest>,
) -> AppResult<Json<OrgUnit>> {
    update(auth, state, OrgUnitKind::Department, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/department/{id}",
    responses((status = 200, description = "Deleted", body = MessageResponse))
)]
pub async fn delete_department(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> AppResult<Json<MessageResponse>> {
    delete(auth, state, OrgUnitKind::Department, id).await
}
