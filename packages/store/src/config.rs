//! # Client configuration — `lunatodo-client.toml`
//!
//! ```toml
//! [server]
//! url = "http://localhost:8080"
//!
//! [cache]
//! ttl_secs = 30   # 0 disables caching
//! ```
//!
//! Every section has a default, so a missing or empty file is equivalent to
//! [`LunaTodoConfig::default`].

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Top-level configuration stored in `lunatodo-client.toml`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LunaTodoConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Base URL of the API, without a trailing slash.
    #[serde(default = "default_server_url")]
    pub url: String,
}

fn default_server_url() -> String {
    "http://localhost:8080".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            url: default_server_url(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CacheConfig {
    /// How long fetched todos and friends stay fresh. 0 disables caching.
    #[serde(default = "default_ttl")]
    pub ttl_secs: u64,
}

fn default_ttl() -> u64 {
    30
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: default_ttl(),
        }
    }
}

impl LunaTodoConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            server: ServerConfig { url: url.into() },
            cache: CacheConfig::default(),
        }
    }

    /// Builder method to set the cache TTL.
    pub fn with_cache_ttl(mut self, secs: u64) -> Self {
        self.cache.ttl_secs = secs;
        self
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache.ttl_secs)
    }

    /// The well-known filename for the config file.
    pub fn filename() -> &'static str {
        "lunatodo-client.toml"
    }

    pub fn from_toml(s: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(s)
    }

    pub fn to_toml(&self) -> Result<String, toml::ser::Error> {
        toml::to_string_pretty(self)
    }
}
