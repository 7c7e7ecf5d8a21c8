//! Connection settings for the Elasticsearch client.

use serde::{Deserialize, Serialize};
use serde_json::Value;

pub const DEFAULT_HOST: &str = "127.0.0.1:9200";
pub const DEFAULT_INDEX_NAME: &str = "searchlayer";
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// Settings used to reach an Elasticsearch cluster.
///
/// Deserializes with defaults for every missing field, so an empty object yields a local
/// single-node configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ConnectionConfig {
    /// Hosts as `host:port` or full URLs. Requests go to the first one.
    pub hosts: Vec<String>,
    /// Index every collection lives in.
    pub index_name: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub timeout_secs: u64,
    /// Body sent when the index has to be created, e.g. settings and mappings.
    pub index_settings: Option<Value>,
}

impl Default for ConnectionConfig {
    fn default() -> Self {
        Self {
            hosts: vec![DEFAULT_HOST.to_string()],
            index_name: DEFAULT_INDEX_NAME.to_string(),
            username: None,
            password: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            index_settings: None,
        }
    }
}

impl ConnectionConfig {
    /// Reads the configuration from the environment.
    ///
    /// `SEARCHLAYER_ES_HOSTS` holds a comma-separated host list; `SEARCHLAYER_ES_INDEX`,
    /// `SEARCHLAYER_ES_USERNAME` and `SEARCHLAYER_ES_PASSWORD` map to the fields of the same
    /// name. Unset variables keep their defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            hosts: lookup("SEARCHLAYER_ES_HOSTS")
                .map(|hosts| {
                    hosts
                        .split(',')
                        .map(str::trim)
                        .filter(|host| !host.is_empty())
                        .map(str::to_string)
                        .collect::<Vec<_>>()
                })
                .filter(|hosts| !hosts.is_empty())
                .unwrap_or(defaults.hosts),
            index_name: lookup("SEARCHLAYER_ES_INDEX").unwrap_or(defaults.index_name),
            username: lookup("SEARCHLAYER_ES_USERNAME"),
            password: lookup("SEARCHLAYER_ES_PASSWORD"),
            ..defaults
        }
    }

    pub fn with_hosts<S: Into<String>>(mut self, hosts: impl IntoIterator<Item = S>) -> Self {
        self.hosts = hosts.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_index_name(mut self, index_name: impl Into<String>) -> Self {
        self.index_name = index_name.into();
        self
    }

    pub fn with_credentials(mut self, username: impl Into<String>, password: impl Into<String>) -> Self {
        self.username = Some(username.into());
        self.password = Some(password.into());
        self
    }

    pub fn with_timeout_secs(mut self, timeout_secs: u64) -> Self {
        self.timeout_secs = timeout_secs;
        self
    }

    pub fn with_index_settings(mut self, index_settings: Value) -> Self {
        self.index_settings = Some(index_settings);
        self
    }

    /// Base URL of the first host, with a scheme and without a trailing slash.
    pub fn base_url(&self) -> Option<String> {
        self.hosts.first().map(|host| {
            let host = host.trim_end_matches('/');

            if host.starts_with("http://") || host.starts_with("https://") {
                host.to_string()
            } else {
                format!("http://{host}")
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;

    #[test]
    fn test_deserialize_with_defaults() {
        let config: ConnectionConfig = serde_json::from_value(json!({ "indexName": "app" })).unwrap();

        assert_eq!(config.index_name, "app");
        assert_eq!(config.hosts, vec![DEFAULT_HOST.to_string()]);
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[test]
    fn test_from_lookup() {
        let vars = HashMap::from([
            ("SEARCHLAYER_ES_HOSTS", "es1:9200, https://es2:9200/"),
            ("SEARCHLAYER_ES_USERNAME", "elastic"),
        ]);

        let config = ConnectionConfig::from_lookup(|key| vars.get(key).map(|value| value.to_string()));

        assert_eq!(config.hosts, vec!["es1:9200".to_string(), "https://es2:9200/".to_string()]);
        assert_eq!(config.index_name, DEFAULT_INDEX_NAME);
        assert_eq!(config.username.as_deref(), Some("elastic"));
        assert_eq!(config.password, None);
    }

    #[test]
    fn test_base_url() {
        assert_eq!(ConnectionConfig::default().base_url().as_deref(), Some("http://127.0.0.1:9200"));
        assert_eq!(
            ConnectionConfig::default().with_hosts(["https://es:9200/"]).base_url().as_deref(),
            Some("https://es:9200")
        );
        assert_eq!(ConnectionConfig::default().with_hosts(Vec::<String>::new()).base_url(), None);
    }
}
