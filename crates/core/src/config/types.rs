use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub upstream: UpstreamConfig,
    pub cache: CacheConfig,
    #[serde(default)]
    pub profile_cache: ProfileCacheConfig,
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
    8080
}

/// Local catalog documents
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CatalogConfig {
    /// Directory holding `<category>.json.gz` files
    #[serde(default = "default_catalog_dir")]
    pub dir: PathBuf,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: default_catalog_dir(),
        }
    }
}

fn default_catalog_dir() -> PathBuf {
    PathBuf::from("releases")
}

/// Upstream metadata API (TMDB)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct UpstreamConfig {
    /// Bearer token sent with every request
    #[serde(default)]
    pub api_token: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    /// Value of the `language` query parameter
    #[serde(default = "default_language")]
    pub language: String,
    /// Per-request timeout in seconds (default: 5)
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    /// Maximum in-flight lookups per batch (default: 10)
    #[serde(default = "default_max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            api_token: String::new(),
            base_url: default_base_url(),
            language: default_language(),
            timeout_secs: default_timeout_secs(),
            max_concurrent: default_max_concurrent(),
        }
    }
}

fn default_base_url() -> String {
    "https://api.themoviedb.org/3".to_string()
}

fn default_language() -> String {
    "ru".to_string()
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_max_concurrent() -> usize {
    10
}

/// Enrichment cache persistence
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CacheConfig {
    #[serde(default = "default_snapshot_path")]
    pub snapshot_path: PathBuf,
    /// Persist after this many successful updates (default: 10)
    #[serde(default = "default_persist_every")]
    pub persist_every: usize,
    /// Secret required to clear the cache
    #[serde(default)]
    pub clear_secret: String,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            snapshot_path: default_snapshot_path(),
            persist_every: default_persist_every(),
            clear_secret: String::new(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("enrichment_cache.json.gz")
}

fn default_persist_every() -> usize {
    10
}

/// Per-user profile cache blobs
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProfileCacheConfig {
    #[serde(default = "default_profile_dir")]
    pub dir: PathBuf,
}

impl Default for ProfileCacheConfig {
    fn default() -> Self {
        Self {
            dir: default_profile_dir(),
        }
    }
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("profile_cache")
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub server: ServerConfig,
    pub catalog: CatalogConfig,
    pub upstream: SanitizedUpstreamConfig,
    pub cache: SanitizedCacheConfig,
    pub profile_cache: ProfileCacheConfig,
}

/// Sanitized upstream config (token hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedUpstreamConfig {
    pub base_url: String,
    pub language: String,
    pub timeout_secs: u64,
    pub max_concurrent: usize,
    pub api_token_configured: bool,
}

/// Sanitized cache config (clear secret hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedCacheConfig {
    pub snapshot_path: PathBuf,
    pub persist_every: usize,
    pub clear_secret_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            server: config.server.clone(),
            catalog: config.catalog.clone(),
            upstream: SanitizedUpstreamConfig {
                base_url: config.upstream.base_url.clone(),
                language: config.upstream.language.clone(),
                timeout_secs: config.upstream.timeout_secs,
                max_concurrent: config.upstream.max_concurrent,
                api_token_configured: !config.upstream.api_token.is_empty(),
            },
            cache: SanitizedCacheConfig {
                snapshot_path: config.cache.snapshot_path.clone(),
                persist_every: config.cache.persist_every,
                clear_secret_configured: !config.cache.clear_secret.is_empty(),
            },
            profile_cache: config.profile_cache.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
[upstream]
api_token = "tmdb-token"

[cache]
clear_secret = "s3cret"
"#;

    #[test]
    fn test_deserialize_minimal_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.catalog.dir.to_str().unwrap(), "releases");
        assert_eq!(config.upstream.base_url, "https://api.themoviedb.org/3");
        assert_eq!(config.upstream.language, "ru");
        assert_eq!(config.upstream.timeout_secs, 5);
        assert_eq!(config.upstream.max_concurrent, 10);
        assert_eq!(config.cache.persist_every, 10);
        assert_eq!(
            config.cache.snapshot_path.to_str().unwrap(),
            "enrichment_cache.json.gz"
        );
        assert_eq!(config.profile_cache.dir.to_str().unwrap(), "profile_cache");
    }

    #[test]
    fn test_deserialize_missing_cache_section_fails() {
        let toml = r#"
[upstream]
api_token = "tmdb-token"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_custom_values() {
        let toml = r#"
[server]
host = "127.0.0.1"
port = 9000

[catalog]
dir = "/srv/releases"

[upstream]
api_token = "tmdb-token"
language = "en-US"
max_concurrent = 4

[cache]
snapshot_path = "/var/lib/marquee/cache.json.gz"
clear_secret = "s3cret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.catalog.dir.to_str().unwrap(), "/srv/releases");
        assert_eq!(config.upstream.language, "en-US");
        assert_eq!(config.upstream.max_concurrent, 4);
        assert_eq!(config.upstream.timeout_secs, 5); // default
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let config: Config = toml::from_str(MINIMAL).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert!(sanitized.upstream.api_token_configured);
        assert!(sanitized.cache.clear_secret_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("tmdb-token"));
        assert!(!json.contains("s3cret"));
    }
}
