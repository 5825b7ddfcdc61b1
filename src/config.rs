use anyhow::{Result, anyhow};
use chrono_tz::Tz;
use std::env;

use crate::database::models::TimeOffApprovalPolicy;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub database_max_connections: u32,
    pub database_acquire_timeout_secs: u64,
    pub jwt_secret: String,
    pub host: String,
    pub port: u16,
    pub environment: String,
    pub client_base_url: String,
    pub organization_timezone: Tz,
    pub time_off_approval_policy: TimeOffApprovalPolicy,
    pub generation_max_days: i64,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Load .env file if it exists
        dotenvy::dotenv().ok();

        Self::from_env_only()
    }

    /// Load configuration from environment variables only (without loading .env files)
    /// This is useful for testing where you want to control the environment directly
    pub fn from_env_only() -> Result<Self> {
        let timezone = env::var("ORGANIZATION_TIMEZONE").unwrap_or_else(|_| "UTC".to_string());
        let organization_timezone = timezone
            .parse::<Tz>()
            .map_err(|_| anyhow!("Invalid ORGANIZATION_TIMEZONE: {}", timezone))?;

        let policy = env::var("TIME_OFF_APPROVAL_POLICY").unwrap_or_else(|_| "reject".to_string());
        let time_off_approval_policy = policy
            .parse::<TimeOffApprovalPolicy>()
            .map_err(|e| anyhow!(e))?;

        Ok(Config {
            database_url: env::var("DATABASE_URL")
                .unwrap_or_else(|_| "sqlite://scheduling.db".to_string()),
            database_max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            database_acquire_timeout_secs: env::var("DATABASE_ACQUIRE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "5".to_string())
                .parse()
                .unwrap_or(5),
            jwt_secret: env::var("JWT_SECRET").unwrap_or_else(|_| {
                "your-super-secret-jwt-key-change-this-in-production-12345".to_string()
            }),
            host: env::var("HOST").unwrap_or_else(|_| "127.0.0.1".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            environment: env::var("ENVIRONMENT").unwrap_or_else(|_| "development".to_string()),
            client_base_url: env::var("CLIENT_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:3000".to_string()),
            organization_timezone,
            time_off_approval_policy,
            generation_max_days: env::var("GENERATION_MAX_DAYS")
                .unwrap_or_else(|_| "366".to_string())
                .parse()
                .unwrap_or(366),
        })
    }

    /// Configuration used by the test suites: in-memory friendly defaults, no env lookups.
    pub fn test_config(database_url: &str) -> Self {
        Config {
            database_url: database_url.to_string(),
            database_max_connections: 1,
            database_acquire_timeout_secs: 5,
            jwt_secret: "test-jwt-secret-key-that-is-long-enough".to_string(),
            host: "127.0.0.1".to_string(),
            port: 0,
            environment: "test".to_string(),
            client_base_url: "http://localhost:3000".to_string(),
            organization_timezone: Tz::UTC,
            time_off_approval_policy: TimeOffApprovalPolicy::Reject,
            generation_max_days: 366,
        }
    }

    pub fn server_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}
