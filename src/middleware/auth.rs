use axum::extract::Request;
use axum::http::header::AUTHORIZATION;
use axum::middleware::Next;
use axum::response::Response;
use jsonwebtoken::{decode, DecodingKey, Validation};
use serde::{Deserialize, Serialize};

use crate::config::get_config;
use crate::error::{Error, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
    pub email: Option<String>,
    pub username: Option<String>,
    pub name: Option<String>,
    pub role: Option<String>,
}

impl Claims {
    /// The identity string recorded in audit fields and used to derive the
    /// tenant domain: email when present, then username, then the subject.
    pub fn identity(&self) -> &str {
        self.email
            .as_deref()
            .or(self.username.as_deref())
            .unwrap_or(&self.sub)
    }
}

pub async fn require_bearer_auth(mut req: Request, next: Next) -> Result<Response> {
    let Some(header) = req.headers().get(AUTHORIZATION) else {
        return Err(Error::Unauthorized(
            "Missing Authorization header".to_string(),
        ));
    };
    let Ok(header) = header.to_str() else {
        return Err(Error::Unauthorized(
            "Invalid Authorization header".to_string(),
        ));
    };
    let Some(token) = header.strip_prefix("Bearer ") else {
        return Err(Error::Unauthorized(
            "Authorization header must be a Bearer token".to_string(),
        ));
    };

    let config = get_config();
    let claims = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|_| Error::Unauthorized("Invalid or expired token".to_string()))?
    .claims;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}
