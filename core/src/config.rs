//! Client configuration.
//!
//! The API key is injected once when the client is built. Nothing in the
//! core reads configuration again after construction.

use crate::error::ConfigError;

pub const DEFAULT_BASE_URL: &str = "https://api.thedogapi.com/";
pub const DEFAULT_SUB_ID: &str = "doggieon";

const ENV_API_KEY: &str = "DOG_API_KEY";
const ENV_BASE_URL: &str = "DOG_API_BASE_URL";
const ENV_SUB_ID: &str = "DOG_API_SUB_ID";

/// Values every request needs: where to send it, how to authenticate, and
/// the sub-identifier the service uses to group this client's favourites
/// and uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub base_url: String,
    pub api_key: String,
    pub sub_id: String,
}

impl ClientConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            sub_id: DEFAULT_SUB_ID.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_sub_id(mut self, sub_id: impl Into<String>) -> Self {
        self.sub_id = sub_id.into();
        self
    }

    /// Read `DOG_API_KEY` (required), `DOG_API_BASE_URL` and `DOG_API_SUB_ID`.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let api_key = lookup(ENV_API_KEY).ok_or(ConfigError::MissingApiKey)?;
        let mut config = Self::new(api_key);
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            config.base_url = base_url;
        }
        if let Some(sub_id) = lookup(ENV_SUB_ID) {
            config.sub_id = sub_id;
        }
        config.validate()?;
        Ok(config)
    }

    /// Reject empty values. The base URL is not parsed here: an unusable base
    /// surfaces per request as `ApiError::UrlMissing`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api_key.trim().is_empty() {
            return Err(ConfigError::Empty("api_key"));
        }
        if self.sub_id.trim().is_empty() {
            return Err(ConfigError::Empty("sub_id"));
        }
        if self.base_url.trim().is_empty() {
            return Err(ConfigError::Empty("base_url"));
        }
        Ok(())
    }
}
