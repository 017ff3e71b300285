use crate::error::AppError;
use crate::services::passphrase::PassphrasePolicy;
use serde::Deserialize;
use std::env;

#[derive(Debug, Clone, Deserialize)]
pub struct PortalConfig {
    pub environment: Environment,
    pub service_name: String,
    pub service_version: String,
    pub log_level: String,
    pub bind_addr: String,
    pub port: u16,
    pub base_url: String,
    pub redis: RedisConfig,
    pub smtp: SmtpConfig,
    pub mail: MailConfig,
    pub network: NetworkConfig,
    pub credential_ttl_days: i64,
    pub passphrase_pattern: String,
    pub challenge_ttl_seconds: u64,
    pub rate_limit: RateLimitConfig,
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Dev,
    Prod,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RedisConfig {
    pub url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub user: String,
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MailConfig {
    /// From address for all outbound mail.
    pub sender: String,
    /// Recipient of privileged-tier approval requests.
    pub admin: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkConfig {
    pub ssid: String,
    pub guest_vlan_id: u16,
    pub corp_vlan_id: u16,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RateLimitConfig {
    pub register_attempts: u32,
    pub register_window_seconds: u64,
}

impl PortalConfig {
    pub fn from_env() -> Result<Self, AppError> {
        let env_str = env::var("ENVIRONMENT").unwrap_or_else(|_| "dev".to_string());
        let environment: Environment = env_str
            .parse()
            .map_err(|e: String| AppError::ConfigError(anyhow::anyhow!(e)))?;

        let is_prod = environment == Environment::Prod;

        let config = PortalConfig {
            environment,
            service_name: get_env("SERVICE_NAME", Some("guest-portal"), is_prod)?,
            service_version: get_env("SERVICE_VERSION", Some(env!("CARGO_PKG_VERSION")), is_prod)?,
            log_level: get_env("LOG_LEVEL", Some("info"), is_prod)?,
            bind_addr: get_env("BIND_ADDR", Some("0.0.0.0"), is_prod)?,
            port: get_env("BIND_PORT", Some("8080"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            base_url: get_env("BASE_URL", Some("http://localhost:8080"), is_prod)?,
            redis: RedisConfig {
                url: get_env("REDIS_URL", Some("redis://localhost:6379"), is_prod)?,
            },
            smtp: SmtpConfig {
                host: get_env("SMTP_HOST", Some("smtp.gmail.com"), is_prod)?,
                user: get_env("SMTP_USER", None, is_prod)?,
                password: get_env("SMTP_PASSWORD", None, is_prod)?,
            },
            mail: MailConfig {
                sender: get_env("EMAIL_SENDER", None, is_prod)?,
                admin: get_env("EMAIL_ADMIN", None, is_prod)?,
            },
            network: NetworkConfig {
                ssid: get_env("SSID", Some("Guest"), is_prod)?,
                guest_vlan_id: get_env("GUEST_VLAN_ID", Some("10"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                corp_vlan_id: get_env("CORP_VLAN_ID", Some("20"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
            },
            credential_ttl_days: get_env("CREDENTIAL_TTL_DAYS", Some("3"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            passphrase_pattern: get_env("PASSPHRASE_PATTERN", Some("word-word"), is_prod)?,
            challenge_ttl_seconds: get_env("CHALLENGE_TTL_SECONDS", Some("300"), is_prod)?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            rate_limit: RateLimitConfig {
                register_attempts: get_env("RATE_LIMIT_REGISTER_ATTEMPTS", Some("10"), is_prod)?
                    .parse()
                    .map_err(|e: std::num::ParseIntError| {
                        AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                    })?,
                register_window_seconds: get_env(
                    "RATE_LIMIT_REGISTER_WINDOW_SECONDS",
                    Some("3600"),
                    is_prod,
                )?
                .parse()
                .map_err(|e: std::num::ParseIntError| {
                    AppError::ConfigError(anyhow::anyhow!(e.to_string()))
                })?,
            },
        };

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if self.port == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "BIND_PORT must be greater than 0"
            )));
        }

        if self.credential_ttl_days <= 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CREDENTIAL_TTL_DAYS must be positive"
            )));
        }

        if self.challenge_ttl_seconds == 0 {
            return Err(AppError::ConfigError(anyhow::anyhow!(
                "CHALLENGE_TTL_SECONDS must be greater than 0"
            )));
        }

        PassphrasePolicy::parse(&self.passphrase_pattern)
            .map_err(AppError::ConfigError)?;

        if self.environment == Environment::Prod {
            if self.network.guest_vlan_id == self.network.corp_vlan_id {
                return Err(AppError::ConfigError(anyhow::anyhow!(
                    "GUEST_VLAN_ID and CORP_VLAN_ID must differ in production"
                )));
            }

            if self.base_url.starts_with("http://localhost") {
                tracing::error!("BASE_URL points at localhost in production - approval links will be unreachable");
            }
        }

        Ok(())
    }
}

fn get_env(key: &str, default: Option<&str>, is_prod: bool) -> Result<String, AppError> {
    match env::var(key) {
        Ok(val) => Ok(val),
        Err(_) => {
            if is_prod {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required in production but not set",
                    key
                ))))
            } else if let Some(def) = default {
                Ok(def.to_string())
            } else {
                Err(AppError::ConfigError(anyhow::anyhow!(format!(
                    "{} is required but not set",
                    key
                ))))
            }
        }
    }
}

impl std::str::FromStr for Environment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "dev" => Ok(Environment::Dev),
            "prod" => Ok(Environment::Prod),
            _ => Err(format!("Invalid environment: {}", s)),
        }
    }
}
