//! Client configuration resolved once at startup.

/// Environment variable that overrides the accounts collection URL.
pub const BASE_URL_ENV: &str = "FORM3_ACCOUNTS_API_URL";

/// Collection URL used when `FORM3_ACCOUNTS_API_URL` is unset or empty.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080/v1/organisation/accounts";

/// Where the accounts collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    base_url: String,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// Read `FORM3_ACCOUNTS_API_URL`, falling back to the local default.
    pub fn from_env() -> Self {
        Self::resolve(std::env::var(BASE_URL_ENV).ok())
    }

    fn resolve(value: Option<String>) -> Self {
        match value {
            Some(url) if !url.trim().is_empty() => Self::new(url.trim()),
            _ => Self::new(DEFAULT_BASE_URL),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn set_base_url(&mut self, base_url: &str) {
        self.base_url = base_url.trim_end_matches('/').to_string();
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unset_env_falls_back_to_default() {
        assert_eq!(ClientConfig::resolve(None).base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn empty_env_falls_back_to_default() {
        assert_eq!(
            ClientConfig::resolve(Some("  ".to_string())).base_url(),
            DEFAULT_BASE_URL
        );
    }

    #[test]
    fn env_value_wins() {
        let config = ClientConfig::resolve(Some("http://accounts.internal/v1/accounts/".to_string()));
        assert_eq!(config.base_url(), "http://accounts.internal/v1/accounts");
    }

    // The only test touching the process environment.
    #[test]
    fn from_env_reads_the_variable() {
        std::env::set_var(BASE_URL_ENV, "http://accounts.internal:9000/v1/organisation/accounts/");
        assert_eq!(
            ClientConfig::from_env().base_url(),
            "http://accounts.internal:9000/v1/organisation/accounts"
        );
        std::env::remove_var(BASE_URL_ENV);
        assert_eq!(ClientConfig::from_env().base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn env_name_is_prefixed() {
        assert_eq!(BASE_URL_ENV, "FORM3_ACCOUNTS_API_URL");
    }

    #[test]
    fn set_base_url_strips_trailing_slash() {
        let mut config = ClientConfig::default();
        config.set_base_url("super.fake.com/");
        assert_eq!(config.base_url(), "super.fake.com");
    }
}
