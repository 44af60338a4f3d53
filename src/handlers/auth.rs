use axum::{Json, extract::State, http::StatusCode};

use crate::{
    AppState,
    auth::{AuthUser, hash_password, issue_token, verify_password},
    error::{AppError, AppResult},
    models::{
        LoginRequest, LoginResponse, MessageResponse, NewUser, RegisterUserRequest,
        RegisterUserResponse, Role, UserProfile,
    },
    validation::{ApiJson, require_email},
};

const MIN_PASSWORD_LEN: usize = 6;

/// login
///
/// [Public Route] Exchanges email and password for a signed JWT.
///
/// Unknown, soft-deleted and wrong-password accounts all get the same 401 so
/// the endpoint does not reveal which emails exist.
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Token issued", body = LoginResponse),
        (status = 400, description = "Missing credentials", body = crate::error::ErrorResponse),
        (status = 401, description = "Invalid credentials", body = crate::error::ErrorResponse)
    )
)]
pub async fn login(
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<LoginRequest>,
) -> AppResult<Json<LoginResponse>> {
    if payload.email.trim().is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }

    let user = state
        .repo
        .find_user_by_email(payload.email.trim())
        .await?
        .filter(|user| !user.is_deleted())
        .filter(|user| verify_password(&payload.password, &user.password_hash))
        .ok_or_else(|| {
            tracing::info!("login rejected");
            AppError::unauthorized("Invalid credentials")
        })?;

    let token = issue_token(&user, &state.config, state.clock.now())?;
    tracing::info!(user_id = user.id, role = %user.role, "user logged in");

    Ok(Json(LoginResponse {
        token,
        user: UserProfile::from(&user),
    }))
}

/// register
///
/// [Admin Route] Creates a login account. The account is linked to the
/// employee record with the same email, when one exists and has no account yet.
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterUserRequest,
    responses(
        (status = 201, description = "User created", body = RegisterUserResponse),
        (status = 400, description = "Invalid input or email taken", body = crate::error::ErrorResponse),
        (status = 403, description = "Not an administrator", body = crate::error::ErrorResponse)
    )
)]
pub async fn register(
    auth: AuthUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RegisterUserRequest>,
) -> AppResult<(StatusCode, Json<RegisterUserResponse>)> {
    auth.require(&[Role::Admin])?;

    let email = payload.email.trim().to_string();
    if email.is_empty() || payload.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }
    require_email(&email)?;
    if payload.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(AppError::bad_request(format!(
            "Password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }

    if state.repo.find_user_by_email(&email).await?.is_some() {
        return Err(AppError::bad_request("Email already registered"));
    }

    let employee = state
        .repo
        .find_employee_by_email(&email)
        .await?
        .filter(|employee| !employee.is_deleted());
    if let Some(employee) = &employee {
        if state.repo.find_user_by_employee(employee.id).await?.is_some() {
            return Err(AppError::bad_request(
                "This employee already has a user account",
            ));
        }
    }

    let user = state
        .repo
        .create_user(NewUser {
            email,
            password_hash: hash_password(&payload.password)?,
            role: payload.role.unwrap_or_default(),
            employee_id: employee.as_ref().map(|e| e.id),
        })
        .await?;

    tracing::info!(
        user_id = user.id,
        role = %user.role,
        employee_id = ?user.employee_id,
        by = auth.id,
        "user registered"
    );

    Ok((
        StatusCode::CREATED,
        Json(RegisterUserResponse {
            message: "User registered successfully".to_string(),
            user_id: user.id,
            linked_to_employee: user.employee_id.is_some(),
            employee_id: user.employee_id,
        }),
    ))
}

/// logout
///
/// [Authenticated Route] Revokes the bearer token the request was made with.
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses((status = 200, description = "Logged out", body = MessageResponse))
)]
pub async fn logout(
    auth: AuthUser,
    State(state): State<AppState>,
) -> AppResult<Json<MessageResponse>> {
    if let Some(token) = &auth.token {
        state.repo.revoke_token(token.jti, token.expires_at).await?;
    }
    tracing::info!(user_id = auth.id, "user logged out");
    Ok(Json(MessageResponse::new("Logged out successfully")))
}

/// me
///
/// [Authenticated Route] The caller's resolved profile.
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses((status = 200, description = "Current user", body = UserProfile))
)]
pub async fn me(auth: AuthUser) -> Json<UserProfile> {
    Json(auth.profile())
}
