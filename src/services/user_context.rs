use actix_web::{FromRequest, HttpRequest, dev::Payload, web::Data};
use chrono_tz::Tz;
use std::future::{Ready, ready};
use uuid::Uuid;

use crate::config::Config;
use crate::error::AppError;
use crate::services::auth::{Claims, Role};
use crate::services::time_window::parse_timezone;

/// The caller of a scheduling operation: who they are, what they may do, and
/// the organization zone their calendar dates are read in.
#[derive(Debug, Clone, Copy)]
pub struct Actor {
    pub user_id: Uuid,
    pub role: Role,
    pub timezone: Tz,
}

impl Actor {
    pub fn new(user_id: Uuid, role: Role, timezone: Tz) -> Self {
        Self {
            user_id,
            role,
            timezone,
        }
    }

    /// Build from token claims, falling back to the configured zone.
    pub fn from_claims(claims: &Claims, config: &Config) -> Result<Self, AppError> {
        let timezone = match claims.timezone.as_deref() {
            Some(name) => parse_timezone(name)?,
            None => config.organization_timezone,
        };
        Ok(Self::new(claims.sub, claims.role, timezone))
    }

    pub fn is_manager_or_admin(&self) -> bool {
        matches!(self.role, Role::Manager | Role::Admin)
    }

    pub fn require_manager(&self, what: &str) -> Result<(), AppError> {
        if self.is_manager_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "Management permission is required to {}",
                what
            )))
        }
    }

    /// Members act for themselves; managers may act for anyone.
    pub fn require_self_or_manager(&self, user_id: Uuid, what: &str) -> Result<(), AppError> {
        if self.user_id == user_id || self.is_manager_or_admin() {
            Ok(())
        } else {
            Err(AppError::Forbidden(format!(
                "You can only {} for yourself",
                what
            )))
        }
    }
}

impl FromRequest for Actor {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, payload: &mut Payload) -> Self::Future {
        let claims = match Claims::from_request(req, payload).into_inner() {
            Ok(claims) => claims,
            Err(e) => return ready(Err(e)),
        };
        let result = req
            .app_data::<Data<Config>>()
            .ok_or_else(|| {
                AppError::internal_server_error_message("Configuration is not registered")
            })
            .and_then(|config| Actor::from_claims(&claims, config));
        ready(result)
    }
}
