use axum::{
    extract::{FromRef, FromRequestParts},
    http::{header, request::Parts},
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{
    config::{AppConfig, Env},
    error::{AppError, AppResult},
    models::{NewUser, Role, User, UserProfile},
    repository::RepositoryState,
};

/// Claims
///
/// Payload of the HS256 JSON Web Tokens issued at login.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (sub): the `users.id` of the account.
    pub sub: i64,
    /// Role at issue time. Informational only; the extractor re-reads it from the database.
    pub role: Role,
    pub employee_id: Option<i64>,
    pub email: String,
    /// Token id, the key used by logout revocation.
    pub jti: Uuid,
    pub iat: usize,
    pub exp: usize,
}

/// issue_token
///
/// Signs a token for `user` valid for `config.jwt_ttl_hours` from `now`.
pub fn issue_token(user: &User, config: &AppConfig, now: DateTime<Utc>) -> AppResult<String> {
    let expires_at = now + Duration::hours(config.jwt_ttl_hours);
    let claims = Claims {
        sub: user.id,
        role: user.role,
        employee_id: user.employee_id,
        email: user.email.clone(),
        jti: Uuid::new_v4(),
        iat: now.timestamp().max(0) as usize,
        exp: expires_at.timestamp().max(0) as usize,
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(format!("failed to sign token: {e}")))
}

/// Decodes and validates signature and expiry.
pub fn decode_token(token: &str, secret: &str) -> Option<Claims> {
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .ok()
    .map(|data| data.claims)
}

pub fn hash_password(password: &str) -> AppResult<String> {
    use argon2::password_hash::SaltString;
    use argon2::password_hash::rand_core::OsRng;
    use argon2::{Argon2, PasswordHasher};
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?;
    Ok(hash.to_string())
}

pub fn verify_password(password: &str, hash: &str) -> bool {
    use argon2::{Argon2, PasswordHash, PasswordVerifier};
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

/// bootstrap_admin
///
/// Creates the administrator named by `ADMIN_EMAIL`/`ADMIN_PASSWORD` when no
/// account uses that email yet. Returns `true` when an account was created.
pub async fn bootstrap_admin(repo: &RepositoryState, config: &AppConfig) -> AppResult<bool> {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return Ok(false);
    };
    if repo.find_user_by_email(email).await?.is_some() {
        return Ok(false);
    }

    let mut employee_id = None;
    if let Some(employee) = repo.find_employee_by_email(email).await? {
        if !employee.is_deleted() && repo.find_user_by_employee(employee.id).await?.is_none() {
            employee_id = Some(employee.id);
        }
    }

    let user = repo
        .create_user(NewUser {
            email: email.clone(),
            password_hash: hash_password(password)?,
            role: Role::Admin,
            employee_id,
        })
        .await?;
    tracing::info!(user_id = user.id, "bootstrap administrator created");
    Ok(true)
}

/// TokenInfo
///
/// The identity of the bearer token a request was authenticated with.
/// Absent when the local `x-user-id` bypass was used.
#[derive(Debug, Clone, PartialEq)]
pub struct TokenInfo {
    pub jti: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// AuthUser
///
/// The resolved identity of an authenticated request. Role and employee link
/// always come from the current database row, never from the token.
#[derive(Debug, Clone, PartialEq)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub role: Role,
    pub linked_employee: Option<i64>,
    pub token: Option<TokenInfo>,
}

impl AuthUser {
    fn from_user(user: User, token: Option<TokenInfo>) -> Self {
        Self {
            id: user.id,
            email: user.email,
            role: user.role,
            linked_employee: user.employee_id,
            token,
        }
    }

    /// Fails with 403 unless the caller holds one of `roles`.
    pub fn require(&self, roles: &[Role]) -> AppResult<()> {
        if roles.contains(&self.role) {
            Ok(())
        } else {
            Err(AppError::forbidden("Insufficient permissions"))
        }
    }

    /// The caller's linked employee id, or 400 when the account has none.
    pub fn employee_id(&self) -> AppResult<i64> {
        self.linked_employee
            .ok_or_else(|| AppError::bad_request("Employee profile not found"))
    }

    pub fn is_manager(&self) -> bool {
        self.role.is_manager()
    }

    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            email: self.email.clone(),
            role: self.role,
            employee_id: self.linked_employee,
        }
    }
}

/// AuthUser Extractor Implementation
///
/// 1. Local bypass: in `Env::Local` an `x-user-id` header naming an existing,
///    non-deleted user authenticates the request.
/// 2. Bearer token extraction and JWT validation (signature + expiry).
/// 3. Revocation check against logged-out token ids.
/// 4. User lookup. Deleted or missing accounts are rejected.
///
/// Rejection: `AppError::Unauthorized` (401), or 500 on database failure.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
    RepositoryState: FromRef<S>,
    AppConfig: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let repo = RepositoryState::from_ref(state);
        let config = AppConfig::from_ref(state);

        if config.env == Env::Local {
            let bypass_id = parts
                .headers
                .get("x-user-id")
                .and_then(|value| value.to_str().ok())
                .and_then(|value| value.trim().parse::<i64>().ok());
            if let Some(user_id) = bypass_id {
                if let Some(user) = repo.get_user(user_id).await? {
                    if !user.is_deleted() {
                        tracing::debug!(user_id, "authenticated via local x-user-id bypass");
                        return Ok(AuthUser::from_user(user, None));
                    }
                }
            }
        }

        let token = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| AppError::unauthorized("No token provided"))?;

        let claims = decode_token(token, &config.jwt_secret)
            .ok_or_else(|| AppError::unauthorized("Invalid token"))?;

        if repo.is_token_revoked(claims.jti).await? {
            return Err(AppError::unauthorized("Token has been revoked"));
        }

        let user = repo
            .get_user(claims.sub)
            .await?
            .filter(|user| !user.is_deleted())
            .ok_or_else(|| AppError::unauthorized("User not found"))?;

        let expires_at = DateTime::<Utc>::from_timestamp(claims.exp as i64, 0)
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        Ok(AuthUser::from_user(
            user,
            Some(TokenInfo {
                jti: claims.jti,
                expires_at,
            }),
        ))
    }
}
