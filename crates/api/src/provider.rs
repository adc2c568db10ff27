//! API provider detection and key management.
//!
//! Providers are recognized from the endpoint URL so the client can attach
//! the right API-key parameter (or header) without per-widget credential
//! configuration. Keys come from the environment; a missing or `demo` key
//! leaves the URL untouched.

use std::env;

/// Known API providers, detected from the endpoint URL.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Provider {
    AlphaVantage,
    Finnhub,
    Indian,
    #[default]
    Default,
}

impl Provider {
    /// Detect the provider serving `url`.
    pub fn detect(url: &str) -> Self {
        let lower = url.to_lowercase();
        if lower.contains("alphavantage") || lower.contains("alpha-vantage") {
            return Self::AlphaVantage;
        }
        if lower.contains("finnhub") {
            return Self::Finnhub;
        }
        if lower.contains("indian") || lower.contains("nse") || lower.contains("bse") {
            return Self::Indian;
        }
        Self::Default
    }

    /// Query parameter the provider expects its API key under.
    pub fn query_param(&self) -> &'static str {
        match self {
            Self::AlphaVantage | Self::Default => "apikey",
            Self::Finnhub => "token",
            Self::Indian => "api_key",
        }
    }

    /// Environment variable holding the provider's API key.
    pub fn env_var(&self) -> &'static str {
        match self {
            Self::AlphaVantage => "ALPHA_VANTAGE_API_KEY",
            Self::Finnhub => "FINNHUB_API_KEY",
            Self::Indian => "INDIAN_API_KEY",
            Self::Default => "DASHWIRE_API_KEY",
        }
    }

    /// API key for this provider, falling back to the default key.
    pub fn api_key(&self) -> Option<String> {
        read_key(self.env_var()).or_else(|| read_key(Provider::Default.env_var()))
    }
}

fn read_key(var: &str) -> Option<String> {
    env::var(var).ok().filter(|key| !key.trim().is_empty())
}

/// Returns true when the URL already carries an API key parameter.
pub fn url_has_api_key(url: &str) -> bool {
    url.contains("api_key") || url.contains("apikey") || url.contains("api-key") || url.contains("token=")
}
