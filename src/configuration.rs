use std::fmt;

use crate::error::ConfigError;

/// Minimum signing key length in bytes (256 bits)
pub const MIN_SECRET_LENGTH: usize = 32;

/// bcrypt accepts work factors in this range
pub const MIN_HASH_COST: u32 = 4;
pub const MAX_HASH_COST: u32 = 31;

#[derive(serde::Deserialize, Clone, Debug)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub jwt: JwtSettings,
    pub password: PasswordSettings,
}

#[derive(serde::Deserialize, Clone, Debug)]
pub struct ApplicationSettings {
    pub host: String,
    pub port: u16,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: String,
    pub port: u16,
    pub host: String,
    pub database_name: String,
}

impl DatabaseSettings {
    pub fn connection_string(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.host, self.port, self.database_name
        )
    }

    /// Server-level connection, for creating databases
    pub fn connection_string_without_db(&self) -> String {
        format!(
            "postgres://{}:{}@{}:{}",
            self.username, self.password, self.host, self.port
        )
    }
}

impl fmt::Debug for DatabaseSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseSettings")
            .field("username", &self.username)
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_name", &self.database_name)
            .finish_non_exhaustive()
    }
}

/// Access token signing settings.
///
/// Read once at startup and never mutated; the issuer copies what it needs
/// at construction.
#[derive(serde::Deserialize, Clone)]
pub struct JwtSettings {
    /// Symmetric HS256 key, at least `MIN_SECRET_LENGTH` bytes
    pub secret: String,
    pub issuer: String,
    pub audience: String,
}

impl JwtSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.secret.len() < MIN_SECRET_LENGTH {
            return Err(ConfigError::InvalidValue(format!(
                "jwt.secret must be at least {} bytes, got {}",
                MIN_SECRET_LENGTH,
                self.secret.len()
            )));
        }
        if self.issuer.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt.issuer is empty".to_string()));
        }
        if self.audience.trim().is_empty() {
            return Err(ConfigError::InvalidValue("jwt.audience is empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for JwtSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtSettings")
            .field("secret", &"[REDACTED]")
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .finish()
    }
}

/// Password hashing settings
#[derive(serde::Deserialize, Clone, Debug)]
pub struct PasswordSettings {
    /// bcrypt work factor
    pub hash_cost: u32,
}

impl PasswordSettings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(MIN_HASH_COST..=MAX_HASH_COST).contains(&self.hash_cost) {
            return Err(ConfigError::InvalidValue(format!(
                "password.hash_cost must be between {} and {}, got {}",
                MIN_HASH_COST,
                MAX_HASH_COST,
                self.hash_cost
            )));
        }
        Ok(())
    }
}

impl Settings {
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.jwt.validate()?;
        self.password.validate()
    }
}

/// Load settings from `configuration.{yaml,toml,json}` (optional) and
/// `APP_`-prefixed environment variables, e.g. `APP_JWT__SECRET`.
pub fn get_configuration() -> Result<Settings, ConfigError> {
    let settings = config::Config::builder()
        .set_default("application.host", "127.0.0.1")?
        .set_default("application.port", 8000)?
        .set_default("password.hash_cost", bcrypt::DEFAULT_COST as i64)?
        .add_source(config::File::with_name("configuration").required(false))
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        )
        .build()?;

    let settings = settings.try_deserialize::<Settings>()?;
    settings.validate()?;
    Ok(settings)
}
