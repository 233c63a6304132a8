//! Client configuration.
//!
//! A `ClientConfig` is assembled with builder methods (or read from the
//! environment), validated once by `MaxClient::with_config` and never
//! changed afterwards.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ApiError;
use crate::transport::Transport;

pub const DEFAULT_BASE_URI: &str = "https://platform-api.max.ru";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;
pub const DEFAULT_USER_AGENT: &str = concat!("max-api-rust-client/", env!("CARGO_PKG_VERSION"));

pub const ENV_TOKEN: &str = "MAX_API_TOKEN";
pub const ENV_BASE_URI: &str = "MAX_API_BASE_URI";
pub const ENV_TIMEOUT: &str = "MAX_API_TIMEOUT";
pub const ENV_USER_AGENT: &str = "MAX_API_USER_AGENT";

#[derive(Clone)]
pub struct ClientConfig {
    pub(crate) access_token: String,
    pub(crate) base_uri: String,
    pub(crate) timeout: Duration,
    pub(crate) user_agent: String,
    pub(crate) transport: Option<Arc<dyn Transport>>,
}

impl ClientConfig {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_uri: DEFAULT_BASE_URI.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            transport: None,
        }
    }

    /// Read the configuration from `MAX_API_*` environment variables.
    ///
    /// Only `MAX_API_TOKEN` is required; `MAX_API_TIMEOUT` is in seconds and
    /// `0` disables the deadline.
    pub fn from_env() -> Result<Self, ApiError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ApiError> {
        let token = lookup(ENV_TOKEN)
            .ok_or_else(|| ApiError::InvalidConfig(format!("{ENV_TOKEN} is not set")))?;
        let mut config = Self::new(token);

        if let Some(base_uri) = lookup(ENV_BASE_URI) {
            config = config.with_base_uri(base_uri);
        }
        if let Some(raw) = lookup(ENV_TIMEOUT) {
            let secs: u64 = raw.trim().parse().map_err(|_| {
                ApiError::InvalidConfig(format!("{ENV_TIMEOUT} must be whole seconds, got {raw:?}"))
            })?;
            config = config.with_timeout(Duration::from_secs(secs));
        }
        if let Some(user_agent) = lookup(ENV_USER_AGENT) {
            config = config.with_user_agent(user_agent);
        }
        Ok(config)
    }

    /// Trailing slashes are stripped.
    pub fn with_base_uri(mut self, base_uri: impl Into<String>) -> Self {
        self.base_uri = base_uri.into().trim_end_matches('/').to_string();
        self
    }

    /// Deadline for a whole exchange, kept in whole seconds.
    ///
    /// A fractional part rounds up. `Duration::ZERO` means no timeout.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        let secs = timeout.as_secs() + u64::from(timeout.subsec_nanos() > 0);
        self.timeout = Duration::from_secs(secs);
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    /// Replace the built-in HTTP transport.
    pub fn with_transport<T: Transport + 'static>(mut self, transport: T) -> Self {
        self.transport = Some(Arc::new(transport));
        self
    }

    /// Like `with_transport`, for a transport the caller keeps a handle to.
    pub fn with_shared_transport(mut self, transport: Arc<dyn Transport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn base_uri(&self) -> &str {
        &self.base_uri
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn has_custom_transport(&self) -> bool {
        self.transport.is_some()
    }

    pub(crate) fn validate(&self) -> Result<(), ApiError> {
        if self.access_token.trim().is_empty() {
            return Err(ApiError::InvalidConfig("access token must not be empty".to_string()));
        }
        if self.base_uri.is_empty() {
            return Err(ApiError::InvalidConfig("base URI must not be empty".to_string()));
        }
        Ok(())
    }
}

impl fmt::Debug for ClientConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientConfig")
            .field("access_token", &"<redacted>")
            .field("base_uri", &self.base_uri)
            .field("timeout", &self.timeout)
            .field("user_agent", &self.user_agent)
            .field("custom_transport", &self.transport.is_some())
            .finish()
    }
}
