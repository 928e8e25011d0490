use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    /// Metasearch provider (Jackett)
    #[serde(default)]
    pub jackett: Option<JackettConfig>,
    /// Debrid provider (AllDebrid)
    #[serde(default)]
    pub alldebrid: Option<AllDebridConfig>,
    #[serde(default)]
    pub debug: DebugConfig,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    3000
}

/// Jackett metasearch configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct JackettConfig {
    /// Jackett server URL (e.g., "http://localhost:9117")
    pub url: String,
    /// Jackett API key
    pub api_key: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

/// AllDebrid configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AllDebridConfig {
    /// Bearer token for the AllDebrid API
    pub api_key: String,
    /// API root, overridable for testing
    #[serde(default = "default_alldebrid_base_url")]
    pub base_url: String,
    /// Web panel listing the account's magnets
    #[serde(default = "default_alldebrid_panel_url")]
    pub panel_url: String,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_alldebrid_base_url() -> String {
    "https://api.alldebrid.com/v4.1".to_string()
}

fn default_alldebrid_panel_url() -> String {
    "https://alldebrid.com/magnets/".to_string()
}

fn default_timeout() -> u32 {
    30
}

/// Local debugging aids
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DebugConfig {
    /// When set, every .torrent uploaded to the debrid service is also
    /// written here as `upload-<epoch-ms>.torrent`.
    #[serde(default)]
    pub torrent_dir: Option<PathBuf>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub jackett: Option<SanitizedJackettConfig>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alldebrid: Option<SanitizedAllDebridConfig>,
    pub debug: DebugConfig,
}

/// Sanitized Jackett config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedJackettConfig {
    pub url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

/// Sanitized AllDebrid config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAllDebridConfig {
    pub base_url: String,
    pub panel_url: String,
    pub api_key_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            jackett: config.jackett.as_ref().map(|j| SanitizedJackettConfig {
                url: j.url.clone(),
                api_key_configured: !j.api_key.is_empty(),
                timeout_secs: j.timeout_secs,
            }),
            alldebrid: config.alldebrid.as_ref().map(|a| SanitizedAllDebridConfig {
                base_url: a.base_url.clone(),
                panel_url: a.panel_url.clone(),
                api_key_configured: !a.api_key.is_empty(),
                timeout_secs: a.timeout_secs,
            }),
            debug: config.debug.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_empty_config_uses_defaults() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert!(config.jackett.is_none());
        assert!(config.alldebrid.is_none());
        assert!(config.debug.torrent_dir.is_none());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[jackett]
url = "http://localhost:9117"
api_key = "jackett-key"

[alldebrid]
api_key = "debrid-key"
timeout_secs = 10

[debug]
torrent_dir = "/tmp/torrents"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);

        let jackett = config.jackett.as_ref().unwrap();
        assert_eq!(jackett.url, "http://localhost:9117");
        assert_eq!(jackett.api_key, "jackett-key");
        assert_eq!(jackett.timeout_secs, 30); // default

        let alldebrid = config.alldebrid.as_ref().unwrap();
        assert_eq!(alldebrid.api_key, "debrid-key");
        assert_eq!(alldebrid.base_url, "https://api.alldebrid.com/v4.1");
        assert_eq!(alldebrid.panel_url, "https://alldebrid.com/magnets/");
        assert_eq!(alldebrid.timeout_secs, 10);

        assert_eq!(
            config.debug.torrent_dir.as_ref().unwrap().to_str().unwrap(),
            "/tmp/torrents"
        );
    }

    #[test]
    fn test_deserialize_jackett_without_api_key_fails() {
        let toml = r#"
[jackett]
url = "http://localhost:9117"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_keys() {
        let config = Config {
            jackett: Some(JackettConfig {
                url: "http://localhost:9117".to_string(),
                api_key: "secret-key".to_string(),
                timeout_secs: 60,
            }),
            alldebrid: Some(AllDebridConfig {
                api_key: String::new(),
                base_url: default_alldebrid_base_url(),
                panel_url: default_alldebrid_panel_url(),
                timeout_secs: 30,
            }),
            ..Default::default()
        };

        let sanitized = SanitizedConfig::from(&config);
        let jackett = sanitized.jackett.as_ref().unwrap();
        assert!(jackett.api_key_configured);
        assert_eq!(jackett.timeout_secs, 60);
        assert!(!sanitized.alldebrid.as_ref().unwrap().api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("secret-key"));
    }
}
