use std::net::SocketAddr;

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl Environment {
    /// Whether diagnostic detail may be exposed in error responses.
    #[must_use]
    pub fn is_development(self) -> bool {
        matches!(self, Environment::Development)
    }
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

/// How multi-step flows treat a failed follow-up step once the primary
/// mutation for an item has already succeeded.
///
/// - `FailSoft`: the item is reported as a success carrying a warning.
/// - `FailHard`: the item is reported as a failure.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubStepPolicy {
    #[default]
    FailSoft,
    FailHard,
}

impl std::fmt::Display for SubStepPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SubStepPolicy::FailSoft => write!(f, "fail-soft"),
            SubStepPolicy::FailHard => write!(f, "fail-hard"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    /// Shop domain without scheme, e.g. `example.myshopify.com`.
    pub shop_domain: String,
    pub access_token: String,
    pub api_version: String,
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    pub api_keys: Vec<String>,
    pub request_timeout_secs: u64,
    pub inter_request_delay_ms: u64,
    pub max_attempts: u32,
    pub default_retry_after_secs: u64,
    pub max_retry_after_secs: u64,
    pub max_batch_size: usize,
    pub page_size: u32,
    pub sub_step_policy: SubStepPolicy,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("shop_domain", &self.shop_domain)
            .field("access_token", &"[redacted]")
            .field("api_version", &self.api_version)
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("api_keys", &format!("[{} redacted]", self.api_keys.len()))
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("inter_request_delay_ms", &self.inter_request_delay_ms)
            .field("max_attempts", &self.max_attempts)
            .field("default_retry_after_secs", &self.default_retry_after_secs)
            .field("max_retry_after_secs", &self.max_retry_after_secs)
            .field("max_batch_size", &self.max_batch_size)
            .field("page_size", &self.page_size)
            .field("sub_step_policy", &self.sub_step_policy)
            .finish()
    }
}
