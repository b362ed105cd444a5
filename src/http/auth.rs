//! Authorization header accessor.
//!
//! Only credential extraction happens here; verifying them is up to the
//! handler. Recognized schemes:
//! - `Basic base64(user:pass)` → `username`, `password`
//! - `Bearer token` → `token`
//!
//! The header is split once, on the first run of whitespace, and Basic
//! credentials on the first `:` so passwords may contain colons. Anything
//! unparsable yields an accessor whose every field is a 401.

use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;
use base64::{engine::general_purpose, Engine as _};

use crate::http::fault::Fault;

/// Credentials parsed from the `Authorization` header.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Authorization {
    username: Option<String>,
    password: Option<String>,
    token: Option<String>,
}

impl Authorization {
    /// Parse the `Authorization` header of a request.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(Self::parse)
            .unwrap_or_default()
    }

    /// Parse a raw header value.
    pub fn parse(header: &str) -> Self {
        let Some((scheme, value)) = header.trim().split_once(char::is_whitespace) else {
            return Self::default();
        };
        let value = value.trim_start();

        match scheme {
            "Basic" => Self::basic(value).unwrap_or_default(),
            "Bearer" if !value.is_empty() => Self {
                token: Some(value.to_string()),
                ..Self::default()
            },
            _ => Self::default(),
        }
    }

    fn basic(value: &str) -> Option<Self> {
        let decoded = general_purpose::STANDARD.decode(value).ok()?;
        let decoded = String::from_utf8(decoded).ok()?;
        let (username, password) = decoded.split_once(':')?;
        Some(Self {
            username: Some(username.to_string()),
            password: Some(password.to_string()),
            token: None,
        })
    }

    pub fn username(&self) -> Result<&str, Fault> {
        field(&self.username, "username")
    }

    pub fn password(&self) -> Result<&str, Fault> {
        field(&self.password, "password")
    }

    pub fn token(&self) -> Result<&str, Fault> {
        field(&self.token, "token")
    }

    /// `(username or token, password)`, for handlers that accept either scheme.
    pub fn credentials(&self) -> (Option<&str>, Option<&str>) {
        (
            self.username.as_deref().or(self.token.as_deref()),
            self.password.as_deref(),
        )
    }

    /// True if neither scheme was recognized.
    pub fn is_empty(&self) -> bool {
        self.username.is_none() && self.token.is_none()
    }
}

fn field<'a>(value: &'a Option<String>, name: &str) -> Result<&'a str, Fault> {
    value
        .as_deref()
        .ok_or_else(|| Fault::unauthorized(format!("No auth header for {}", name)))
}
