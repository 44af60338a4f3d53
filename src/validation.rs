//! Request body extraction and field validation helpers.

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

use crate::error::{AppError, AppResult};

/// ApiJson
///
/// Drop-in replacement for `axum::Json` whose rejection is an `AppError`,
/// so malformed or incomplete bodies produce the same `{"error": ...}` 400
/// response as every other validation failure.
pub struct ApiJson<T>(pub T);

impl<S, T> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        Ok(ApiJson(value))
    }
}

/// Parses an optional JSON body. An empty body yields `T::default()`.
pub fn parse_optional_body<T>(body: &[u8]) -> AppResult<T>
where
    T: DeserializeOwned + Default,
{
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(T::default());
    }
    Ok(serde_json::from_slice(body)?)
}

pub fn require_not_empty(value: &str, field: &str) -> AppResult<()> {
    if value.trim().is_empty() {
        return Err(AppError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

/// Loose `local@domain.tld` check: no whitespace, exactly one `@`, and a dot
/// inside the domain with characters on both sides.
pub fn is_valid_email(email: &str) -> bool {
    if email.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = email.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.contains('@') {
        return false;
    }
    match domain.rsplit_once('.') {
        Some((host, tld)) => !host.is_empty() && !tld.is_empty(),
        None => false,
    }
}

pub fn require_email(email: &str) -> AppResult<()> {
    if !is_valid_email(email) {
        return Err(AppError::bad_request("Invalid email format"));
    }
    Ok(())
}

/// Deserializes a field that distinguishes "absent" (`None`) from an explicit
/// `null` (`Some(None)`). Use together with `#[serde(default)]`.
pub fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: serde::Deserializer<'de>,
    T: serde::Deserialize<'de>,
{
    serde::Deserialize::deserialize(deserializer).map(Some)
}

/// Reads an optional `YYYY-MM-DD` date where form clients send `""` for a
/// blank input. Blank and `null` both become `None`.
pub fn blank_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<NaiveDate>()
            .map(Some)
            .map_err(serde::de::Error::custom),
        _ => Ok(None),
    }
}

/// `nullable` for dates: a present `""` or `null` clears the field.
pub fn nullable_blank_date<'de, D>(deserializer: D) -> Result<Option<Option<NaiveDate>>, D::Error>
where
    D: Deserializer<'de>,
{
    blank_date(deserializer).map(Some)
}
