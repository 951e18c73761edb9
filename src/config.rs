/*
 *
 *  *
 *  *      Copyright (c) 2018-2025, SnackCloud All rights reserved.
 *  *
 *  *   Redistribution and use in source and binary forms, with or without
 *  *   modification, are permitted provided that the following conditions are met:
 *  *
 *  *   Redistributions of source code must retain the above copyright notice,
 *  *   this list of conditions and the following disclaimer.
 *  *   Redistributions in binary form must reproduce the above copyright
 *  *   notice, this list of conditions and the following disclaimer in the
 *  *   documentation and/or other materials provided with the distribution.
 *  *   Neither the name of the www.snackcloud.cn developer nor the names of its
 *  *   contributors may be used to endorse or promote products derived from
 *  *   this software without specific prior written permission.
 *  *   Author: SnackCloud
 *  *
 *  
 */
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;
use url::Url;
use crate::errors::{Result, RosterError};
use crate::interceptor::LogLevel;

pub const DEFAULT_POOL_NAME: &str = "RosterPool";
pub const DEFAULT_SCHEMA: &str = "main";
pub const DEFAULT_VALIDATION_QUERY: &str = "SELECT 1";

/// Prefix for environment overrides, e.g. `ROSTER_MAX_POOL_SIZE`.
pub const ENV_PREFIX: &str = "ROSTER_";

const OVERRIDE_KEYS: &[&str] = &[
    "url",
    "username",
    "password",
    "schema",
    "poolName",
    "maxPoolSize",
    "minIdle",
    "connectionTimeoutMs",
    "idleTimeoutMs",
    "maxLifetimeMs",
    "leakDetectionThresholdMs",
    "validationQuery",
    "validationTimeoutMs",
    "initializationFailFast",
    "logLevel",
];

/// Where the backing store lives.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Endpoint {
    Sqlite(PathBuf),
}

#[derive(Clone)]
pub struct RosterConfig {
    url: Option<String>,
    /// Carried for deployment parity; SQLite takes no credentials.
    username: Option<String>,
    /// Carried for deployment parity; SQLite takes no credentials.
    password: Option<String>,
    schema: String,
    pool_name: String,
    max_size: u32,
    min_idle: u32,
    connection_timeout: Duration,
    idle_timeout: Duration,
    max_lifetime: Duration,
    leak_detection_threshold: Duration,
    validation_query: String,
    validation_timeout: Duration,
    initialization_fail_fast: bool,
    log_level: LogLevel,
    slow_statement_threshold: Duration,
}

impl Default for RosterConfig {
    fn default() -> Self {
        RosterConfig {
            url: None,
            username: None,
            password: None,
            schema: DEFAULT_SCHEMA.to_string(),
            pool_name: DEFAULT_POOL_NAME.to_string(),
            max_size: 10,
            min_idle: 2,
            connection_timeout: Duration::from_millis(30_000),
            idle_timeout: Duration::from_millis(600_000),
            max_lifetime: Duration::from_millis(1_800_000),
            leak_detection_threshold: Duration::from_millis(60_000),
            validation_query: DEFAULT_VALIDATION_QUERY.to_string(),
            validation_timeout: Duration::from_millis(5_000),
            initialization_fail_fast: true,
            log_level: LogLevel::Info,
            slow_statement_threshold: Duration::from_millis(1_000),
        }
    }
}

impl fmt::Debug for RosterConfig {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("RosterConfig")
            .field("url", &self.url)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "******"))
            .field("schema", &self.schema)
            .field("pool_name", &self.pool_name)
            .field("max_size", &self.max_size)
            .field("min_idle", &self.min_idle)
            .field("connection_timeout", &self.connection_timeout)
            .field("idle_timeout", &self.idle_timeout)
            .field("max_lifetime", &self.max_lifetime)
            .field("leak_detection_threshold", &self.leak_detection_threshold)
            .field("validation_query", &self.validation_query)
            .field("validation_timeout", &self.validation_timeout)
            .field("initialization_fail_fast", &self.initialization_fail_fast)
            .field("log_level", &self.log_level)
            .field("slow_statement_threshold", &self.slow_statement_threshold)
            .finish()
    }
}

impl RosterConfig {

    pub fn new<S: Into<String>>(url: S) -> Self {
        RosterConfig::default().set_url(url)
    }

    /// Build a configuration from `ROSTER_*` environment variables on top of the defaults.
    pub fn from_env() -> Result<Self> {
        let vars = OVERRIDE_KEYS.iter().filter_map(|key| {
            std::env::var(env_var_name(key)).ok().map(|value| (key.to_string(), value))
        });
        RosterConfig::default().with_overrides(vars)
    }

    /// Apply deployment-specific settings keyed by their camelCase names.
    pub fn with_overrides<I, K, V>(mut self, overrides: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        for (key, value) in overrides {
            let (key, value) = (key.as_ref(), value.as_ref().trim());
            self = match key {
                "url" => self.set_url(value),
                "username" => self.set_username(value),
                "password" => self.set_password(value),
                "schema" => self.set_schema(value),
                "poolName" => self.set_pool_name(value),
                "maxPoolSize" => self.set_max_size(parse_number(key, value)?),
                "minIdle" => self.set_min_idle(parse_number(key, value)?),
                "connectionTimeoutMs" => self.set_connection_timeout(parse_millis(key, value)?),
                "idleTimeoutMs" => self.set_idle_timeout(parse_millis(key, value)?),
                "maxLifetimeMs" => self.set_max_lifetime(parse_millis(key, value)?),
                "leakDetectionThresholdMs" => self.set_leak_detection_threshold(parse_millis(key, value)?),
                "validationQuery" => self.set_validation_query(value),
                "validationTimeoutMs" => self.set_validation_timeout(parse_millis(key, value)?),
                "initializationFailFast" => self.set_initialization_fail_fast(parse_bool(key, value)?),
                "logLevel" => self.set_log_level(LogLevel::parse(value).ok_or_else(|| {
                    RosterError::config_error(format!("{key}: `{value}` is not a log level"))
                })?),
                _ => return Err(RosterError::config_error(format!("unknown setting `{key}`"))),
            };
        }
        Ok(self)
    }

    /// Check the invariants a pool can be built from.
    pub fn validate(&self) -> Result<()> {
        if self.max_size == 0 {
            return Err(RosterError::config_error("maxPoolSize must be at least 1"));
        }
        if self.min_idle > self.max_size {
            return Err(RosterError::config_error(format!(
                "minIdle ({}) must not exceed maxPoolSize ({})", self.min_idle, self.max_size
            )));
        }
        let durations = [
            ("connectionTimeoutMs", self.connection_timeout),
            ("idleTimeoutMs", self.idle_timeout),
            ("maxLifetimeMs", self.max_lifetime),
            ("validationTimeoutMs", self.validation_timeout),
        ];
        for (name, duration) in durations {
            if duration.is_zero() {
                return Err(RosterError::config_error(format!("{name} must be greater than zero")));
            }
        }
        if self.validation_query.trim().is_empty() {
            return Err(RosterError::config_error("validationQuery must not be empty"));
        }
        if self.schema.trim().is_empty() || !self.schema.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(RosterError::config_error(format!("invalid schema name `{}`", self.schema)));
        }
        self.endpoint().map(|_| ())
    }

    /// Parse the url into a store endpoint.
    pub fn endpoint(&self) -> Result<Endpoint> {
        let raw = self.url.as_deref().ok_or_else(|| RosterError::config_error("missing database url"))?;
        let url = Url::parse(raw)?;
        match url.scheme() {
            "sqlite" => {
                let host = url.host_str().unwrap_or_default();
                let path = url.path();
                let path = if path == "/" { "" } else { path };
                let db_file = format!("{}{}", host, path);
                if db_file.is_empty() {
                    return Err(RosterError::config_error(format!("no database file in url `{raw}`")));
                }
                Ok(Endpoint::Sqlite(PathBuf::from(db_file)))
            }
            scheme => Err(RosterError::config_error(format!("unsupported database scheme `{scheme}`"))),
        }
    }

    pub fn set_url<S: Into<String>>(mut self, url: S) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn url(&self) -> Option<&str> {
        self.url.as_deref()
    }

    /// Stored only. SQLite opens the file without credentials.
    pub fn set_username<S: Into<String>>(mut self, username: S) -> Self {
        self.username = Some(username.into());
        self
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    /// Stored only and redacted in `Debug`. SQLite opens the file without credentials.
    pub fn set_password<S: Into<String>>(mut self, password: S) -> Self {
        self.password = Some(password.into());
        self
    }

    pub fn password(&self) -> Option<&str> {
        self.password.as_deref()
    }

    pub fn set_schema<S: Into<String>>(mut self, schema: S) -> Self {
        self.schema = schema.into();
        self
    }

    pub fn schema(&self) -> &str {
        &self.schema
    }

    pub fn set_pool_name<S: Into<String>>(mut self, pool_name: S) -> Self {
        self.pool_name = pool_name.into();
        self
    }

    pub fn pool_name(&self) -> &str {
        &self.pool_name
    }

    pub fn set_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    pub fn max_size(&self) -> u32 {
        self.max_size
    }

    pub fn set_min_idle(mut self, min_idle: u32) -> Self {
        self.min_idle = min_idle;
        self
    }

    pub fn min_idle(&self) -> u32 {
        self.min_idle
    }

    pub fn set_connection_timeout(mut self, connection_timeout: Duration) -> Self {
        self.connection_timeout = connection_timeout;
        self
    }

    pub fn connection_timeout(&self) -> Duration {
        self.connection_timeout
    }

    pub fn set_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    pub fn idle_timeout(&self) -> Duration {
        self.idle_timeout
    }

    pub fn set_max_lifetime(mut self, max_lifetime: Duration) -> Self {
        self.max_lifetime = max_lifetime;
        self
    }

    pub fn max_lifetime(&self) -> Duration {
        self.max_lifetime
    }

    /// A zero threshold disables leak detection.
    pub fn set_leak_detection_threshold(mut self, threshold: Duration) -> Self {
        self.leak_detection_threshold = threshold;
        self
    }

    pub fn leak_detection_threshold(&self) -> Option<Duration> {
        if self.leak_detection_threshold.is_zero() {
            None
        } else {
            Some(self.leak_detection_threshold)
        }
    }

    pub fn set_validation_query<S: Into<String>>(mut self, query: S) -> Self {
        self.validation_query = query.into();
        self
    }

    pub fn validation_query(&self) -> &str {
        &self.validation_query
    }

    pub fn set_validation_timeout(mut self, validation_timeout: Duration) -> Self {
        self.validation_timeout = validation_timeout;
        self
    }

    pub fn validation_timeout(&self) -> Duration {
        self.validation_timeout
    }

    pub fn set_initialization_fail_fast(mut self, fail_fast: bool) -> Self {
        self.initialization_fail_fast = fail_fast;
        self
    }

    pub fn initialization_fail_fast(&self) -> bool {
        self.initialization_fail_fast
    }

    pub fn set_log_level(mut self, log_level: LogLevel) -> Self {
        self.log_level = log_level;
        self
    }

    pub fn log_level(&self) -> LogLevel {
        self.log_level
    }

    pub fn set_slow_statement_threshold(mut self, threshold: Duration) -> Self {
        self.slow_statement_threshold = threshold;
        self
    }

    pub fn slow_statement_threshold(&self) -> Duration {
        self.slow_statement_threshold
    }
}

/// `maxPoolSize` -> `ROSTER_MAX_POOL_SIZE`
fn env_var_name(key: &str) -> String {
    let mut name = String::from(ENV_PREFIX);
    for (i, c) in key.chars().enumerate() {
        if c.is_ascii_uppercase() && i > 0 {
            name.push('_');
        }
        name.push(c.to_ascii_uppercase());
    }
    name
}

fn parse_number(key: &str, value: &str) -> Result<u32> {
    value.parse::<u32>().map_err(|e| RosterError::config_error(format!("{key}: `{value}` is not a valid count ({e})")))
}

fn parse_millis(key: &str, value: &str) -> Result<Duration> {
    value.parse::<u64>()
        .map(Duration::from_millis)
        .map_err(|e| RosterError::config_error(format!("{key}: `{value}` is not a valid duration in ms ({e})")))
}

fn parse_bool(key: &str, value: &str) -> Result<bool> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(RosterError::config_error(format!("{key}: `{value}` is not a boolean"))),
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn defaults_match_the_documented_values() {
        let cfg = RosterConfig::new("sqlite:///tmp/roster.db");
        assert_eq!(cfg.max_size(), 10);
        assert_eq!(cfg.min_idle(), 2);
        assert_eq!(cfg.connection_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.idle_timeout(), Duration::from_secs(600));
        assert_eq!(cfg.max_lifetime(), Duration::from_secs(1800));
        assert_eq!(cfg.leak_detection_threshold(), Some(Duration::from_secs(60)));
        assert_eq!(cfg.validation_timeout(), Duration::from_secs(5));
        assert_eq!(cfg.validation_query(), "SELECT 1");
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn min_idle_above_max_size_is_rejected() {
        let cfg = RosterConfig::new("sqlite:///tmp/roster.db").set_max_size(2).set_min_idle(3);
        let err = cfg.validate().unwrap_err();
        assert!(err.is_fatal());
    }

    #[test]
    fn zero_durations_are_rejected_except_leak_detection() {
        let cfg = RosterConfig::new("sqlite:///tmp/roster.db").set_leak_detection_threshold(Duration::ZERO);
        assert!(cfg.validate().is_ok());
        assert_eq!(cfg.leak_detection_threshold(), None);

        let cfg = cfg.set_idle_timeout(Duration::ZERO);
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn malformed_and_unsupported_urls_are_config_errors() {
        assert!(matches!(RosterConfig::new("not a url").validate(), Err(RosterError::UrlParseError(_))));
        assert!(matches!(RosterConfig::new("mysql://localhost/db").validate(), Err(RosterError::ConfigError(_))));
        assert!(RosterConfig::default().validate().is_err());
    }

    #[test]
    fn sqlite_urls_resolve_to_paths() {
        let cfg = RosterConfig::new("sqlite:///var/lib/roster/data.db");
        assert_eq!(cfg.endpoint().unwrap(), Endpoint::Sqlite(PathBuf::from("/var/lib/roster/data.db")));
        let cfg = RosterConfig::new("sqlite://./data.db");
        assert_eq!(cfg.endpoint().unwrap(), Endpoint::Sqlite(PathBuf::from("./data.db")));
    }

    #[test]
    fn credentials_do_not_change_the_endpoint() {
        let plain = RosterConfig::new("sqlite:///tmp/a.db");
        let with_credentials = plain.clone().set_username("hr").set_password("secret");
        assert_eq!(with_credentials.username(), Some("hr"));
        assert_eq!(with_credentials.endpoint().unwrap(), plain.endpoint().unwrap());
        assert!(with_credentials.validate().is_ok());
    }

    #[test]
    fn overrides_use_deployment_key_names() {
        let cfg = RosterConfig::new("sqlite:///tmp/a.db")
            .with_overrides([
                ("maxPoolSize", "4"),
                ("minIdle", "1"),
                ("connectionTimeoutMs", "250"),
                ("leakDetectionThresholdMs", "0"),
                ("initializationFailFast", "false"),
                ("password", "secret"),
            ])
            .unwrap();
        assert_eq!(cfg.max_size(), 4);
        assert_eq!(cfg.min_idle(), 1);
        assert_eq!(cfg.connection_timeout(), Duration::from_millis(250));
        assert_eq!(cfg.leak_detection_threshold(), None);
        assert!(!cfg.initialization_fail_fast());
        assert!(!format!("{:?}", cfg).contains("secret"));

        let err = RosterConfig::default().with_overrides([("maxPoolSize", "ten")]).unwrap_err();
        assert!(err.is_fatal());
        assert!(RosterConfig::default().with_overrides([("poolSize", "1")]).is_err());
    }

    #[test]
    fn env_names_are_screaming_snake_case() {
        assert_eq!(env_var_name("maxPoolSize"), "ROSTER_MAX_POOL_SIZE");
        assert_eq!(env_var_name("url"), "ROSTER_URL");
        assert_eq!(env_var_name("leakDetectionThresholdMs"), "ROSTER_LEAK_DETECTION_THRESHOLD_MS");
    }
}
