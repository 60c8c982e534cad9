//! Client configuration.

use serde::Deserialize;

use crate::error::{RemoteError, Result};

pub const BASE_URL_ENV: &str = "REMOTE_BASE_URL";
pub const USER_AGENT_ENV: &str = "REMOTE_USER_AGENT";

/// Where requests go and how they identify themselves.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientConfig {
    pub base_url: String,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            user_agent: None,
        }
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    /// Reads `REMOTE_BASE_URL` (required) and `REMOTE_USER_AGENT`.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let base_url = lookup(BASE_URL_ENV)
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| RemoteError::Config(format!("{BASE_URL_ENV} is not set")))?;
        let mut config = Self::new(base_url.trim());
        config.user_agent = lookup(USER_AGENT_ENV).filter(|ua| !ua.is_empty());
        Ok(config)
    }

    /// Parses a JSON document such as
    /// `{"base_url": "https://api.example.com", "user_agent": "ledger-sync"}`.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self =
            serde_json::from_str(json).map_err(|e| RemoteError::Config(e.to_string()))?;
        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            ..config
        })
    }
}
