//! Configuration for the webhook handler and the web server binary.
//!
//! [`WebhookConfig`] is the library surface: secret override, tolerance,
//! failure policy and the per-event handlers. [`Config`] reads the server's
//! settings from environment variables.

use std::env;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

use crate::error::ConfigurationError;
use crate::events::HandlerTable;
use crate::signing::DEFAULT_TOLERANCE;

/// Environment variable consulted when no secret is configured.
pub const SECRET_ENV_VAR: &str = "WEBHOOK_SECRET";

/// Largest request body read after the signing headers are present.
pub const DEFAULT_BODY_LIMIT: usize = 2 * 1024 * 1024;

/// What the dispatcher does when a handler returns an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HandlerErrorPolicy {
    /// Hand the failure back to the caller untouched.
    #[default]
    Propagate,
    /// Log the failure and answer 500 with a generic body.
    Respond,
}

impl FromStr for HandlerErrorPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "propagate" => Ok(HandlerErrorPolicy::Propagate),
            "respond" => Ok(HandlerErrorPolicy::Respond),
            other => Err(format!("unknown handler error policy: {}", other)),
        }
    }
}

/// Per-deployment webhook registration.
///
/// Built once, then only read. Handlers are registered with the `on_*`
/// builder methods, one per known event type.
///
/// ```rust,ignore
/// let config = WebhookConfig::new()
///     .secret("whsec_...")
///     .on_user_created(|user| async move {
///         tracing::info!(user_id = %user.id, "user_created");
///         Ok(None)
///     });
/// ```
#[derive(Clone, Default)]
pub struct WebhookConfig {
    pub(crate) secret: Option<String>,
    pub(crate) tolerance: Option<Duration>,
    pub(crate) body_limit: Option<usize>,
    pub(crate) handler_error_policy: HandlerErrorPolicy,
    pub(crate) handlers: HandlerTable,
}

impl WebhookConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use this secret instead of `WEBHOOK_SECRET`.
    pub fn secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    /// Allowed skew of `svix-timestamp` (default five minutes).
    pub fn tolerance(mut self, tolerance: Duration) -> Self {
        self.tolerance = Some(tolerance);
        self
    }

    /// Largest body accepted, in bytes (default 2 MiB).
    pub fn body_limit(mut self, limit: usize) -> Self {
        self.body_limit = Some(limit);
        self
    }

    pub fn handler_error_policy(mut self, policy: HandlerErrorPolicy) -> Self {
        self.handler_error_policy = policy;
        self
    }

    pub fn handlers(&self) -> &HandlerTable {
        &self.handlers
    }

    pub fn error_policy(&self) -> HandlerErrorPolicy {
        self.handler_error_policy
    }

    pub fn signature_tolerance(&self) -> Duration {
        self.tolerance.unwrap_or(DEFAULT_TOLERANCE)
    }

    pub fn max_body_bytes(&self) -> usize {
        self.body_limit.unwrap_or(DEFAULT_BODY_LIMIT)
    }
}

impl fmt::Debug for WebhookConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WebhookConfig")
            .field("secret_configured", &self.secret.is_some())
            .field("tolerance", &self.signature_tolerance())
            .field("body_limit", &self.max_body_bytes())
            .field("handler_error_policy", &self.handler_error_policy)
            .field("handlers", &self.handlers)
            .finish()
    }
}

/// Pick the configured secret, falling back to the environment value.
///
/// Blank values count as absent.
pub fn resolve_secret(
    configured: Option<&str>,
    fallback: Option<&str>,
) -> Result<String, ConfigurationError> {
    configured
        .into_iter()
        .chain(fallback)
        .map(str::trim)
        .find(|s| !s.is_empty())
        .map(str::to_string)
        .ok_or(ConfigurationError::MissingSecret)
}

/// Web server configuration loaded from environment variables.
#[derive(Debug, Clone)]
pub struct Config {
    /// Port for the web server to listen on
    pub port: u16,

    /// Path the provider posts webhooks to
    pub webhook_path: String,

    /// Svix signing secret (`whsec_...`)
    pub webhook_secret: Option<String>,

    /// Maximum skew in seconds for `svix-timestamp`
    pub tolerance_secs: u64,

    /// Largest webhook body in bytes
    pub max_body_bytes: usize,

    /// Behaviour when a handler fails
    pub handler_errors: HandlerErrorPolicy,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Config {
            port: parse_number("PORT", 8080),

            webhook_path: parse_path("WEBHOOK_PATH", "/webhooks/clerk"),

            webhook_secret: env::var(SECRET_ENV_VAR).ok(),

            tolerance_secs: parse_number("WEBHOOK_TOLERANCE_SECS", DEFAULT_TOLERANCE.as_secs()),

            max_body_bytes: parse_number("WEBHOOK_MAX_BODY_BYTES", DEFAULT_BODY_LIMIT),

            handler_errors: parse_policy("WEBHOOK_HANDLER_ERRORS"),
        }
    }

    /// Seed a [`WebhookConfig`] with the settings from the environment.
    pub fn webhook_config(&self) -> WebhookConfig {
        let mut config = WebhookConfig::new()
            .tolerance(Duration::from_secs(self.tolerance_secs))
            .body_limit(self.max_body_bytes)
            .handler_error_policy(self.handler_errors);
        if let Some(secret) = &self.webhook_secret {
            config = config.secret(secret.clone());
        }
        config
    }
}

/// Parse a numeric variable, warning when it is set but unusable.
fn parse_number<T: FromStr>(name: &str, default: T) -> T {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return default,
    };

    match raw.trim().parse::<T>() {
        Ok(value) => value,
        Err(_) => {
            warn!(env_var = name, value = %raw, "Invalid number, using default");
            default
        }
    }
}

/// Parse a route path, which must start with `/`.
fn parse_path(name: &str, default: &str) -> String {
    match env::var(name) {
        Ok(raw) if raw.starts_with('/') => raw,
        Ok(raw) => {
            warn!(env_var = name, value = %raw, "Invalid path, using default");
            default.to_string()
        }
        Err(_) => default.to_string(),
    }
}

fn parse_policy(name: &str) -> HandlerErrorPolicy {
    let raw = match env::var(name) {
        Ok(v) => v,
        Err(_) => return HandlerErrorPolicy::default(),
    };

    raw.parse().unwrap_or_else(|e: String| {
        warn!(env_var = name, value = %raw, error = %e, "Invalid policy, using default");
        HandlerErrorPolicy::default()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_secret_prefers_configured() {
        let secret = resolve_secret(Some("whsec_config"), Some("whsec_env")).unwrap();
        assert_eq!(secret, "whsec_config");
    }

    #[test]
    fn test_resolve_secret_falls_back() {
        assert_eq!(resolve_secret(None, Some("whsec_env")).unwrap(), "whsec_env");
        assert_eq!(resolve_secret(Some("  "), Some("whsec_env")).unwrap(), "whsec_env");
    }

    #[test]
    fn test_resolve_secret_missing() {
        assert!(matches!(
            resolve_secret(None, None),
            Err(ConfigurationError::MissingSecret)
        ));
        assert!(matches!(
            resolve_secret(Some(""), Some("")),
            Err(ConfigurationError::MissingSecret)
        ));
    }

    #[test]
    fn test_handler_error_policy_parse() {
        assert_eq!("propagate".parse::<HandlerErrorPolicy>(), Ok(HandlerErrorPolicy::Propagate));
        assert_eq!(" Respond ".parse::<HandlerErrorPolicy>(), Ok(HandlerErrorPolicy::Respond));
        assert!("swallow".parse::<HandlerErrorPolicy>().is_err());
    }

    #[test]
    fn test_parse_path() {
        env::set_var("TEST_WEBHOOK_PATH", "/hooks/clerk");
        assert_eq!(parse_path("TEST_WEBHOOK_PATH", "/default"), "/hooks/clerk");
        env::set_var("TEST_WEBHOOK_PATH", "hooks");
        assert_eq!(parse_path("TEST_WEBHOOK_PATH", "/default"), "/default");
        env::remove_var("TEST_WEBHOOK_PATH");
    }

    #[test]
    fn test_parse_number() {
        env::set_var("TEST_WEBHOOK_PORT", " 9090 ");
        assert_eq!(parse_number::<u16>("TEST_WEBHOOK_PORT", 8080), 9090);
        env::set_var("TEST_WEBHOOK_PORT", "80a");
        assert_eq!(parse_number::<u16>("TEST_WEBHOOK_PORT", 8080), 8080);
        env::set_var("TEST_WEBHOOK_PORT", "70000");
        assert_eq!(parse_number::<u16>("TEST_WEBHOOK_PORT", 8080), 8080);
        env::remove_var("TEST_WEBHOOK_PORT");
        assert_eq!(parse_number::<u64>("TEST_WEBHOOK_PORT", 300), 300);
    }

    #[test]
    fn test_parse_policy_default() {
        assert_eq!(parse_policy("NONEXISTENT_POLICY_VAR"), HandlerErrorPolicy::Propagate);
    }

    #[test]
    fn test_webhook_config_defaults() {
        let config = WebhookConfig::new();
        assert_eq!(config.signature_tolerance(), Duration::from_secs(300));
        assert_eq!(config.max_body_bytes(), 2 * 1024 * 1024);
        assert_eq!(config.error_policy(), HandlerErrorPolicy::Propagate);
        assert!(config.handlers().registered().is_empty());
    }

    #[test]
    fn test_webhook_config_debug_hides_secret() {
        let config = WebhookConfig::new().secret("whsec_abc");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("whsec_abc"));
        assert!(rendered.contains("secret_configured: true"));
    }
}
