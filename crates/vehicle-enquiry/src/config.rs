//! Endpoint constants and client configuration.

/// Public enquiry service.
pub const DEFAULT_BASE_URL: &str = "https://vehicleenquiry.service.gov.uk";

/// Stage 1: submit the registration mark.
pub const CONFIRM_VEHICLE_PATH: &str = "/ConfirmVehicle";

/// Stage 2: submit the continuation tokens.
pub const VIEW_VEHICLE_PATH: &str = "/ViewVehicle";

/// Value of the `Correct` parameter telling the service the echoed vehicle
/// was accepted.
pub const CONFIRMATION_FLAG: &str = "True";

/// Environment variable overriding the base URL.
pub const BASE_URL_ENV: &str = "VEHICLE_ENQUIRY_URL";

pub const DEFAULT_TIMEOUT_MS: u64 = 30_000;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) \
                                      AppleWebKit/537.36 (KHTML, like Gecko) \
                                      Chrome/131.0.0.0 Safari/537.36";

/// Transport settings for the enquiry client.
#[derive(Debug, Clone)]
pub struct EnquiryConfig {
    /// Scheme and host the endpoint paths are appended to.
    pub base_url: String,
    /// Per-request timeout, applied by the HTTP transport.
    pub timeout_ms: u64,
    pub user_agent: String,
}

impl Default for EnquiryConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }
}

impl EnquiryConfig {
    /// Default configuration against another host (staging, fixtures).
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    pub fn confirm_url(&self) -> String {
        join_url(&self.base_url, CONFIRM_VEHICLE_PATH)
    }

    pub fn view_url(&self) -> String {
        join_url(&self.base_url, VIEW_VEHICLE_PATH)
    }
}

/// Resolve the base URL: explicit value, then `VEHICLE_ENQUIRY_URL`, then the
/// public service.
pub fn resolve_base_url(explicit: Option<&str>) -> String {
    if let Some(url) = explicit {
        return url.to_string();
    }

    if let Ok(env_url) = std::env::var(BASE_URL_ENV) {
        if !env_url.trim().is_empty() {
            return env_url;
        }
    }

    DEFAULT_BASE_URL.to_string()
}

fn join_url(base: &str, path: &str) -> String {
    format!("{}{}", base.trim_end_matches('/'), path)
}
