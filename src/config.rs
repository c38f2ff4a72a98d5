use crate::error::{BridgeError, Result};
use crate::streaming::decoder::FlushPolicy;
use serde::Deserialize;
use std::env;
use std::fs;

pub const DEFAULT_API_VERSION: &str = "2023-08-01-preview";
pub const DEFAULT_LISTEN_ADDR: &str = "127.0.0.1:3000";
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;
pub const DEFAULT_CONNECT_TIMEOUT_SECS: u64 = 10;
pub const DEFAULT_IDLE_TIMEOUT_SECS: u64 = 60;

#[derive(Debug, Clone, Deserialize)]
pub struct BridgeConfig {
    pub server: ServerConfig,
    pub azure: AzureConfig,
    #[serde(default)]
    pub search: Option<SearchConfig>,
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub listen_addr: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AzureConfig {
    /// Host name of the Azure OpenAI resource, or a full base URL
    pub endpoint: String,
    pub deployment: String,
    pub api_key: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    /// Ask for an SSE stream (true) or a single JSON document (false)
    #[serde(default = "default_stream")]
    pub stream: bool,
    /// Total time allowed for a batch request, body included
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,
    /// Longest silence tolerated between two reads of a streamed body
    #[serde(default = "default_idle_timeout_secs")]
    pub idle_timeout_secs: u64,
}

/// Azure Cognitive Search index used as the "on your data" source
#[derive(Debug, Clone, Deserialize)]
pub struct SearchConfig {
    pub endpoint: String,
    pub key: String,
    pub index_name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct SessionConfig {
    #[serde(default)]
    pub flush: FlushPolicy,
}

fn default_api_version() -> String {
    DEFAULT_API_VERSION.to_string()
}

fn default_stream() -> bool {
    true
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_connect_timeout_secs() -> u64 {
    DEFAULT_CONNECT_TIMEOUT_SECS
}

fn default_idle_timeout_secs() -> u64 {
    DEFAULT_IDLE_TIMEOUT_SECS
}

impl SearchConfig {
    /// `dataSources` value forwarded to the provider
    pub fn data_sources(&self) -> serde_json::Value {
        serde_json::json!([{
            "type": "AzureCognitiveSearch",
            "parameters": {
                "endpoint": self.endpoint,
                "key": self.key,
                "indexName": self.index_name,
            }
        }])
    }
}

impl BridgeConfig {
    /// Load configuration from environment variables
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key).ok_or_else(|| BridgeError::ConfigError(format!("{} not set", key)))
        };

        let listen_addr =
            lookup("BRIDGE_LISTEN_ADDR").unwrap_or_else(|| DEFAULT_LISTEN_ADDR.to_string());

        let stream = match lookup("BRIDGE_STREAM") {
            Some(v) => v
                .parse::<bool>()
                .map_err(|e| BridgeError::ConfigError(format!("Invalid BRIDGE_STREAM value: {}", e)))?,
            None => true,
        };

        let secs = |key: &str, default: u64| match lookup(key) {
            Some(v) => v
                .parse::<u64>()
                .map_err(|e| BridgeError::ConfigError(format!("Invalid {} value: {}", key, e))),
            None => Ok(default),
        };
        let timeout_secs = secs("BRIDGE_TIMEOUT_SECS", DEFAULT_TIMEOUT_SECS)?;
        let connect_timeout_secs =
            secs("BRIDGE_CONNECT_TIMEOUT_SECS", DEFAULT_CONNECT_TIMEOUT_SECS)?;
        let idle_timeout_secs = secs("BRIDGE_IDLE_TIMEOUT_SECS", DEFAULT_IDLE_TIMEOUT_SECS)?;

        let flush = match lookup("BRIDGE_FLUSH_POLICY") {
            Some(v) => v.parse::<FlushPolicy>().map_err(BridgeError::ConfigError)?,
            None => FlushPolicy::default(),
        };

        let search = match (
            lookup("AZURE_SEARCH_ENDPOINT"),
            lookup("AZURE_SEARCH_KEY"),
            lookup("AZURE_SEARCH_INDEX"),
        ) {
            (Some(endpoint), Some(key), Some(index_name)) => Some(SearchConfig {
                endpoint,
                key,
                index_name,
            }),
            _ => None,
        };

        Ok(BridgeConfig {
            server: ServerConfig { listen_addr },
            azure: AzureConfig {
                endpoint: required("AZURE_OPENAI_ENDPOINT")?,
                deployment: required("AZURE_OPENAI_DEPLOYMENT")?,
                api_key: required("AZURE_OPENAI_API_KEY")?,
                api_version: lookup("AZURE_OPENAI_API_VERSION")
                    .unwrap_or_else(default_api_version),
                stream,
                timeout_secs,
                connect_timeout_secs,
                idle_timeout_secs,
            },
            search,
            session: SessionConfig { flush },
        })
    }

    /// Load configuration from TOML file
    pub fn from_file(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to read config file: {}", e)))?;

        let mut config: BridgeConfig = toml::from_str(&contents)
            .map_err(|e| BridgeError::ConfigError(format!("Failed to parse config file: {}", e)))?;

        // Allow environment variables to override file config
        if let Ok(api_key) = env::var("AZURE_OPENAI_API_KEY") {
            config.azure.api_key = api_key;
        }
        if let Ok(key) = env::var("AZURE_SEARCH_KEY")
            && let Some(search) = config.search.as_mut()
        {
            search.key = key;
        }

        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.azure.api_key.is_empty() {
            return Err(BridgeError::ConfigError("API key is empty".to_string()));
        }

        if self.azure.endpoint.is_empty() {
            return Err(BridgeError::ConfigError("Endpoint is empty".to_string()));
        }

        if self.azure.deployment.is_empty() {
            return Err(BridgeError::ConfigError("Deployment is empty".to_string()));
        }

        if self.azure.timeout_secs == 0
            || self.azure.connect_timeout_secs == 0
            || self.azure.idle_timeout_secs == 0
        {
            return Err(BridgeError::ConfigError(
                "Timeouts must be greater than 0".to_string(),
            ));
        }

        if let Some(search) = &self.search
            && (search.endpoint.is_empty() || search.index_name.is_empty())
        {
            return Err(BridgeError::ConfigError(
                "Search endpoint and index name must not be empty".to_string(),
            ));
        }

        Ok(())
    }

    /// Retrieval configuration forwarded untouched in every request
    pub fn data_sources(&self) -> Option<serde_json::Value> {
        self.search.as_ref().map(SearchConfig::data_sources)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    fn base_vars() -> Vec<(&'static str, &'static str)> {
        vec![
            ("AZURE_OPENAI_ENDPOINT", "example.openai.azure.com"),
            ("AZURE_OPENAI_DEPLOYMENT", "gpt-4o"),
            ("AZURE_OPENAI_API_KEY", "test-key"),
        ]
    }

    fn valid_config() -> BridgeConfig {
        BridgeConfig {
            server: ServerConfig {
                listen_addr: "127.0.0.1:3000".to_string(),
            },
            azure: AzureConfig {
                endpoint: "example.openai.azure.com".to_string(),
                deployment: "gpt-4o".to_string(),
                api_key: "test-key".to_string(),
                api_version: DEFAULT_API_VERSION.to_string(),
                stream: true,
                timeout_secs: 120,
                connect_timeout_secs: 10,
                idle_timeout_secs: 60,
            },
            search: None,
            session: SessionConfig::default(),
        }
    }

    #[test]
    fn test_config_validation() {
        assert!(valid_config().validate().is_ok());

        let mut invalid = valid_config();
        invalid.azure.api_key = String::new();
        assert!(invalid.validate().is_err());

        let mut invalid = valid_config();
        invalid.azure.timeout_secs = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = valid_config();
        invalid.azure.idle_timeout_secs = 0;
        assert!(invalid.validate().is_err());

        let mut invalid = valid_config();
        invalid.search = Some(SearchConfig {
            endpoint: "https://search.example.net".to_string(),
            key: "k".to_string(),
            index_name: String::new(),
        });
        assert!(invalid.validate().is_err());
    }

    #[test]
    fn test_from_lookup_defaults() {
        let config = BridgeConfig::from_lookup(lookup_from(&base_vars())).unwrap();

        assert_eq!(config.server.listen_addr, DEFAULT_LISTEN_ADDR);
        assert_eq!(config.azure.api_version, DEFAULT_API_VERSION);
        assert!(config.azure.stream);
        assert_eq!(config.azure.timeout_secs, DEFAULT_TIMEOUT_SECS);
        assert_eq!(config.azure.connect_timeout_secs, DEFAULT_CONNECT_TIMEOUT_SECS);
        assert_eq!(config.azure.idle_timeout_secs, DEFAULT_IDLE_TIMEOUT_SECS);
        assert_eq!(config.session.flush, FlushPolicy::Lenient);
        assert!(config.search.is_none());
        assert!(config.data_sources().is_none());
    }

    #[test]
    fn test_from_lookup_missing_required() {
        let err = BridgeConfig::from_lookup(lookup_from(&[("AZURE_OPENAI_ENDPOINT", "x")]))
            .unwrap_err();
        assert!(err.to_string().contains("AZURE_OPENAI_DEPLOYMENT"));
    }

    #[test]
    fn test_from_lookup_overrides() {
        let mut vars = base_vars();
        vars.extend([
            ("BRIDGE_STREAM", "false"),
            ("BRIDGE_FLUSH_POLICY", "strict"),
            ("BRIDGE_TIMEOUT_SECS", "30"),
            ("BRIDGE_IDLE_TIMEOUT_SECS", "15"),
            ("AZURE_SEARCH_ENDPOINT", "https://search.example.net"),
            ("AZURE_SEARCH_KEY", "search-key"),
            ("AZURE_SEARCH_INDEX", "docs"),
        ]);

        let config = BridgeConfig::from_lookup(lookup_from(&vars)).unwrap();
        assert!(!config.azure.stream);
        assert_eq!(config.session.flush, FlushPolicy::Strict);
        assert_eq!(config.azure.timeout_secs, 30);
        assert_eq!(config.azure.idle_timeout_secs, 15);

        let sources = config.data_sources().unwrap();
        assert_eq!(sources[0]["type"], "AzureCognitiveSearch");
        assert_eq!(sources[0]["parameters"]["indexName"], "docs");
        assert_eq!(sources[0]["parameters"]["key"], "search-key");
    }

    #[test]
    fn test_invalid_flush_policy() {
        let mut vars = base_vars();
        vars.push(("BRIDGE_FLUSH_POLICY", "sometimes"));
        assert!(BridgeConfig::from_lookup(lookup_from(&vars)).is_err());
    }

    #[test]
    fn test_parse_toml() {
        let config: BridgeConfig = toml::from_str(
            r#"
            [server]
            listen_addr = "0.0.0.0:8080"

            [azure]
            endpoint = "example.openai.azure.com"
            deployment = "gpt-4o"
            api_key = "file-key"
            stream = false

            [search]
            endpoint = "https://search.example.net"
            key = "search-key"
            index_name = "docs"

            [session]
            flush = "strict"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.listen_addr, "0.0.0.0:8080");
        assert!(!config.azure.stream);
        assert_eq!(config.azure.api_version, DEFAULT_API_VERSION);
        assert_eq!(config.session.flush, FlushPolicy::Strict);
        assert!(config.validate().is_ok());
    }
}
