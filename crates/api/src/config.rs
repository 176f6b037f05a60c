//! Environment-driven configuration.

use std::net::SocketAddr;
use std::time::Duration as StdDuration;

use chrono::Duration;
use thiserror::Error;

use atelier_auth::{DEFAULT_TOKEN_TTL_HOURS, Role, UnknownRole};
use atelier_core::Username;

pub const DEV_JWT_SECRET: &str = "dev-secret";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value for {key}: {reason}")]
    Invalid { key: &'static str, reason: String },
}

impl ConfigError {
    fn invalid(key: &'static str, reason: impl Into<String>) -> Self {
        Self::Invalid {
            key,
            reason: reason.into(),
        }
    }
}

/// An account loaded into the credential directory at startup.
#[derive(Clone, PartialEq, Eq)]
pub struct SeedUser {
    pub username: Username,
    pub password: String,
    pub role: Role,
}

impl core::fmt::Debug for SeedUser {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("SeedUser")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub jwt_secret: String,
    pub token_ttl: Duration,
    pub maintenance_retry_after: StdDuration,
    pub revocation_sweep_interval: StdDuration,
    pub maintenance_refresh_interval: StdDuration,
    pub database_url: Option<String>,
    pub seed_users: Vec<SeedUser>,
}

impl core::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("AppConfig")
            .field("bind_addr", &self.bind_addr)
            .field("jwt_secret", &"<redacted>")
            .field("token_ttl", &self.token_ttl)
            .field("maintenance_retry_after", &self.maintenance_retry_after)
            .field("revocation_sweep_interval", &self.revocation_sweep_interval)
            .field("maintenance_refresh_interval", &self.maintenance_refresh_interval)
            .field("database_url", &self.database_url.as_ref().map(|_| "<set>"))
            .field("seed_users", &self.seed_users)
            .finish()
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from an arbitrary key lookup (tests pass a closure instead of
    /// touching the process environment).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let bind_addr = match lookup("ATELIER_BIND_ADDR") {
            Some(raw) => raw
                .parse()
                .map_err(|e| ConfigError::invalid("ATELIER_BIND_ADDR", format!("{e}")))?,
            None => SocketAddr::from(([0, 0, 0, 0], 8080)),
        };

        let jwt_secret = match lookup("JWT_SECRET") {
            Some(secret) if !secret.is_empty() => secret,
            Some(_) => return Err(ConfigError::invalid("JWT_SECRET", "must not be empty")),
            None => {
                tracing::warn!("JWT_SECRET not set; using insecure dev default");
                DEV_JWT_SECRET.to_string()
            }
        };

        let ttl_hours = parse_positive(
            &lookup,
            "ATELIER_TOKEN_TTL_HOURS",
            DEFAULT_TOKEN_TTL_HOURS as u64,
        )?;
        let retry_after = parse_positive(&lookup, "ATELIER_MAINTENANCE_RETRY_AFTER_SECS", 300)?;
        let sweep = parse_positive(&lookup, "ATELIER_REVOCATION_SWEEP_SECS", 600)?;
        let refresh = parse_positive(&lookup, "ATELIER_MAINTENANCE_REFRESH_SECS", 30)?;

        let ttl_hours = i64::try_from(ttl_hours)
            .ok()
            .filter(|h| *h <= 24 * 365)
            .ok_or_else(|| {
                ConfigError::invalid("ATELIER_TOKEN_TTL_HOURS", "must be at most one year")
            })?;

        let seed_users = match lookup("ATELIER_SEED_USERS") {
            Some(raw) => parse_seed_users(&raw)?,
            None => Vec::new(),
        };

        Ok(Self {
            bind_addr,
            jwt_secret,
            token_ttl: Duration::hours(ttl_hours),
            maintenance_retry_after: StdDuration::from_secs(retry_after),
            revocation_sweep_interval: StdDuration::from_secs(sweep),
            maintenance_refresh_interval: StdDuration::from_secs(refresh),
            database_url: lookup("DATABASE_URL").filter(|s| !s.is_empty()),
            seed_users,
        })
    }
}

fn parse_positive<F>(lookup: &F, key: &'static str, default: u64) -> Result<u64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => match raw.trim().parse::<u64>() {
            Ok(0) => Err(ConfigError::invalid(key, "must be greater than zero")),
            Ok(v) => Ok(v),
            Err(e) => Err(ConfigError::invalid(key, format!("'{raw}': {e}"))),
        },
    }
}

/// Parse `user:password:ROLE` entries separated by commas. The password is
/// everything between the first and the last `:`.
fn parse_seed_users(raw: &str) -> Result<Vec<SeedUser>, ConfigError> {
    const KEY: &str = "ATELIER_SEED_USERS";

    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let (username, rest) = entry
                .split_once(':')
                .ok_or_else(|| ConfigError::invalid(KEY, "expected user:password:ROLE"))?;
            let (password, role) = rest
                .rsplit_once(':')
                .ok_or_else(|| ConfigError::invalid(KEY, "expected user:password:ROLE"))?;

            if password.is_empty() {
                return Err(ConfigError::invalid(KEY, format!("empty password for '{username}'")));
            }

            Ok(SeedUser {
                username: Username::parse(username)
                    .map_err(|e| ConfigError::invalid(KEY, e.to_string()))?,
                password: password.to_string(),
                role: role
                    .parse()
                    .map_err(|e: UnknownRole| ConfigError::invalid(KEY, e.to_string()))?,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<AppConfig, ConfigError> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        AppConfig::from_lookup(|k| map.get(k).cloned())
    }

    #[test]
    fn defaults_apply_when_unset() {
        let cfg = config_from(&[]).unwrap();
        assert_eq!(cfg.bind_addr, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(cfg.jwt_secret, DEV_JWT_SECRET);
        assert_eq!(cfg.token_ttl, Duration::hours(24));
        assert_eq!(cfg.maintenance_retry_after, StdDuration::from_secs(300));
        assert_eq!(cfg.revocation_sweep_interval, StdDuration::from_secs(600));
        assert_eq!(cfg.maintenance_refresh_interval, StdDuration::from_secs(30));
        assert_eq!(cfg.database_url, None);
        assert!(cfg.seed_users.is_empty());
    }

    #[test]
    fn invalid_numbers_are_errors_not_defaults() {
        let err = config_from(&[("ATELIER_TOKEN_TTL_HOURS", "soon")]).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "ATELIER_TOKEN_TTL_HOURS", .. }));

        let err = config_from(&[("ATELIER_MAINTENANCE_RETRY_AFTER_SECS", "0")]).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                key: "ATELIER_MAINTENANCE_RETRY_AFTER_SECS",
                ..
            }
        ));
    }

    #[test]
    fn empty_secret_is_rejected() {
        assert!(config_from(&[("JWT_SECRET", "")]).is_err());
    }

    #[test]
    fn seed_users_allow_colons_in_passwords() {
        let cfg = config_from(&[(
            "ATELIER_SEED_USERS",
            "alice:pa:ss:ADMIN, bob:hunter2:DEVELOPPEUR",
        )])
        .unwrap();

        assert_eq!(cfg.seed_users.len(), 2);
        assert_eq!(cfg.seed_users[0].username.as_str(), "alice");
        assert_eq!(cfg.seed_users[0].password, "pa:ss");
        assert_eq!(cfg.seed_users[0].role, Role::Admin);
        assert_eq!(cfg.seed_users[1].role, Role::Developpeur);
    }

    #[test]
    fn seed_users_with_unknown_role_fail() {
        assert!(config_from(&[("ATELIER_SEED_USERS", "eve:pw:ROOT")]).is_err());
        assert!(config_from(&[("ATELIER_SEED_USERS", "eve")]).is_err());
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let cfg = config_from(&[
            ("JWT_SECRET", "top-secret"),
            ("ATELIER_SEED_USERS", "alice:pw123:ADMIN"),
        ])
        .unwrap();
        let dbg = format!("{cfg:?}");
        assert!(!dbg.contains("top-secret"));
        assert!(!dbg.contains("pw123"));
    }
}
