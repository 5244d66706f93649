//! Client configuration from the process environment.
//!
//! The API base URL and the session obfuscation secret are required; the
//! client refuses to start without them.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub const API_URL_ENV: &str = "BACKOFFICE_API_URL";
pub const SESSION_SECRET_ENV: &str = "BACKOFFICE_SESSION_SECRET";
pub const LOGIN_ROUTE_ENV: &str = "BACKOFFICE_LOGIN_ROUTE";
pub const REDIRECT_DELAY_ENV: &str = "BACKOFFICE_REDIRECT_DELAY_MS";
pub const STORAGE_DIR_ENV: &str = "BACKOFFICE_STORAGE_DIR";

pub const DEFAULT_LOGIN_ROUTE: &str = "/en/login";
pub const DEFAULT_REDIRECT_DELAY: Duration = Duration::from_millis(1500);

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} is not set")]
    Missing(&'static str),

    #[error("{0} is set but empty")]
    Empty(&'static str),

    #[error("invalid {var}: {reason}")]
    Invalid { var: &'static str, reason: String },

    #[error("failed to resolve app data directory (tried data_dir() and home_dir()/.local/share)")]
    NoStorageDir,
}

#[derive(Clone)]
pub struct ClientConfig {
    pub api_url: String,
    session_secret: String,
    pub login_route: String,
    pub redirect_delay: Duration,
    pub storage_dir: Option<PathBuf>,
}

impl ClientConfig {
    pub fn new(api_url: impl Into<String>, session_secret: impl Into<String>) -> Self {
        Self {
            api_url: api_url.into(),
            session_secret: session_secret.into(),
            login_route: DEFAULT_LOGIN_ROUTE.to_string(),
            redirect_delay: DEFAULT_REDIRECT_DELAY,
            storage_dir: None,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build the config from an arbitrary variable source.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_url = required(&lookup, API_URL_ENV)?;
        reqwest::Url::parse(&api_url).map_err(|e| ConfigError::Invalid {
            var: API_URL_ENV,
            reason: e.to_string(),
        })?;

        let session_secret = required(&lookup, SESSION_SECRET_ENV)?;

        let mut config = Self::new(api_url, session_secret);

        if let Some(route) = lookup(LOGIN_ROUTE_ENV).filter(|r| !r.trim().is_empty()) {
            config.login_route = route;
        }

        if let Some(raw) = lookup(REDIRECT_DELAY_ENV) {
            let millis: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                var: REDIRECT_DELAY_ENV,
                reason: format!("expected milliseconds, got '{raw}'"),
            })?;
            config.redirect_delay = Duration::from_millis(millis);
        }

        config.storage_dir = lookup(STORAGE_DIR_ENV)
            .filter(|d| !d.trim().is_empty())
            .map(PathBuf::from);

        Ok(config)
    }

    pub fn with_login_route(mut self, route: impl Into<String>) -> Self {
        self.login_route = route.into();
        self
    }

    pub fn with_redirect_delay(mut self, delay: Duration) -> Self {
        self.redirect_delay = delay;
        self
    }

    pub fn with_storage_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.storage_dir = Some(dir.into());
        self
    }

    pub fn session_secret(&self) -> &str {
        &self.session_secret
    }

    /// Directory holding the persistent session files:
    /// the configured one, else `{app_data_dir}/backoffice`.
    pub fn resolve_storage_dir(&self) -> Result<PathBuf, ConfigError> {
        if let Some(dir) = &self.storage_dir {
            return Ok(dir.clone());
        }

        let mut dir = dirs::data_dir()
            .or_else(|| {
                dirs::home_dir().map(|mut h| {
                    h.push(".local");
                    h.push("share");
                    h
                })
            })
            .ok_or(ConfigError::NoStorageDir)?;
        dir.push("backoffice");
        Ok(dir)
    }
}

impl core::fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ClientConfig")
            .field("api_url", &self.api_url)
            .field("session_secret", &"<redacted>")
            .field("login_route", &self.login_route)
            .field("redirect_delay", &self.redirect_delay)
            .field("storage_dir", &self.storage_dir)
            .finish()
    }
}

fn required<F>(lookup: &F, var: &'static str) -> Result<String, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let value = lookup(var).ok_or(ConfigError::Missing(var))?;
    if value.is_empty() {
        return Err(ConfigError::Empty(var));
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |k| vars.get(k).cloned()
    }

    #[test]
    fn missing_secret_is_fatal() {
        let err = ClientConfig::from_lookup(lookup_from(&[(API_URL_ENV, "http://localhost:8000")]))
            .unwrap_err();
        assert_eq!(err, ConfigError::Missing(SESSION_SECRET_ENV));

        let err = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "http://localhost:8000"),
            (SESSION_SECRET_ENV, ""),
        ]))
        .unwrap_err();
        assert_eq!(err, ConfigError::Empty(SESSION_SECRET_ENV));
    }

    #[test]
    fn missing_or_malformed_api_url_is_rejected() {
        let err = ClientConfig::from_lookup(lookup_from(&[(SESSION_SECRET_ENV, "k")])).unwrap_err();
        assert_eq!(err, ConfigError::Missing(API_URL_ENV));

        let err = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "not a url"),
            (SESSION_SECRET_ENV, "k"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: API_URL_ENV, .. }));
    }

    #[test]
    fn optional_settings_use_defaults() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "http://localhost:8000/api"),
            (SESSION_SECRET_ENV, "k"),
        ]))
        .unwrap();

        assert_eq!(config.login_route, DEFAULT_LOGIN_ROUTE);
        assert_eq!(config.redirect_delay, DEFAULT_REDIRECT_DELAY);
        assert_eq!(config.storage_dir, None);
    }

    #[test]
    fn optional_settings_are_parsed() {
        let config = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "http://localhost:8000/api"),
            (SESSION_SECRET_ENV, "k"),
            (LOGIN_ROUTE_ENV, "/ar/login"),
            (REDIRECT_DELAY_ENV, "250"),
            (STORAGE_DIR_ENV, "/tmp/backoffice-test"),
        ]))
        .unwrap();

        assert_eq!(config.login_route, "/ar/login");
        assert_eq!(config.redirect_delay, Duration::from_millis(250));
        assert_eq!(
            config.resolve_storage_dir().unwrap(),
            PathBuf::from("/tmp/backoffice-test")
        );
    }

    #[test]
    fn bad_delay_is_rejected() {
        let err = ClientConfig::from_lookup(lookup_from(&[
            (API_URL_ENV, "http://localhost:8000"),
            (SESSION_SECRET_ENV, "k"),
            (REDIRECT_DELAY_ENV, "soon"),
        ]))
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: REDIRECT_DELAY_ENV, .. }));
    }

    #[test]
    fn debug_output_redacts_secret() {
        let config = ClientConfig::new("http://localhost:8000", "super-secret-key");
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("super-secret-key"));
    }
}
