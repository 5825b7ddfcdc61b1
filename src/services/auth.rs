use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Manager,
    Member,
}

/// Bearer token claims issued by the platform's identity service.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: Uuid, // user id
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timezone: Option<String>, // organization IANA zone
    pub exp: usize,
}

impl Claims {
    pub fn user_id(&self) -> Uuid {
        self.sub
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }

    pub fn is_manager(&self) -> bool {
        self.role == Role::Manager
    }

    pub fn is_manager_or_admin(&self) -> bool {
        self.is_manager() || self.is_admin()
    }
}

impl FromRequest for Claims {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(claims_from_request(req))
    }
}

fn claims_from_request(req: &HttpRequest) -> Result<Claims, AppError> {
    let token = req
        .headers()
        .get("Authorization")
        .and_then(|header| header.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or(AppError::Unauthorized)?;

    let config = req.app_data::<Data<Config>>().ok_or_else(|| {
        AppError::internal_server_error_message("Configuration is not registered")
    })?;

    decode_token(config, token)
}

pub fn decode_token(config: &Config, token: &str) -> Result<Claims, AppError> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.jwt_secret.as_ref()),
        &Validation::new(Algorithm::HS256),
    )
    .map(|data| data.claims)
    .map_err(|e| {
        log::debug!("Rejected bearer token: {}", e);
        AppError::Unauthorized
    })
}

/// Sign a token for a member. Used by local tooling and the test suites.
pub fn issue_token(
    config: &Config,
    user_id: Uuid,
    role: Role,
    timezone: Option<&str>,
) -> Result<String, AppError> {
    let expiration = (Utc::now() + Duration::hours(12)).timestamp() as usize;

    let claims = Claims {
        sub: user_id,
        role,
        timezone: timezone.map(str::to_string),
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(config.jwt_secret.as_ref()),
    )
    .map_err(|e| AppError::internal_server_error_message(format!("Failed to sign token: {}", e)))
}
