//! Request-body extraction shared by every write endpoint.
//!
//! The web client posts JSON, older forms post
//! `application/x-www-form-urlencoded`; both land in the same body types.
//! Numeric fields accept a number or a numeric string either way.

use std::{fmt::Display, str::FromStr};

use axum::{
  Form, Json,
  extract::{FromRequest, Request},
  http::header,
};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};

use crate::error::ApiError;

/// A body decoded as a form when the content type says so, as JSON
/// otherwise.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
  T: DeserializeOwned,
  S: Send + Sync,
{
  type Rejection = ApiError;

  async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
    let is_form = req
      .headers()
      .get(header::CONTENT_TYPE)
      .and_then(|v| v.to_str().ok())
      .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

    if is_form {
      let Form(value) = Form::<T>::from_request(req, state)
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
      Ok(Self(value))
    } else {
      let Json(value) = Json::<T>::from_request(req, state)
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?;
      Ok(Self(value))
    }
  }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
  Number(T),
  Text(String),
}

/// `deserialize_with` helper: `60` and `"60"` both become `60`.
pub fn lenient<'de, D, T>(d: D) -> Result<T, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + FromStr,
  T::Err: Display,
{
  match NumberOrText::<T>::deserialize(d)? {
    NumberOrText::Number(v) => Ok(v),
    NumberOrText::Text(s) => s.trim().parse().map_err(serde::de::Error::custom),
  }
}

/// Like [`lenient`], but missing, `null` and blank values become `None`.
/// Pair with `#[serde(default)]`.
pub fn lenient_opt<'de, D, T>(d: D) -> Result<Option<T>, D::Error>
where
  D: Deserializer<'de>,
  T: Deserialize<'de> + FromStr,
  T::Err: Display,
{
  match Option::<NumberOrText<T>>::deserialize(d)? {
    None => Ok(None),
    Some(NumberOrText::Number(v)) => Ok(Some(v)),
    Some(NumberOrText::Text(s)) if s.trim().is_empty() => Ok(None),
    Some(NumberOrText::Text(s)) => {
      s.trim().parse().map(Some).map_err(serde::de::Error::custom)
    }
  }
}

/// Blank strings become `None`, so an untouched form select means "keep".
pub fn non_blank(value: Option<String>) -> Option<String> {
  value.filter(|s| !s.trim().is_empty())
}
