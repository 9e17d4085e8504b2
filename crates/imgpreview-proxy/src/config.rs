use eviction_cache::parse_size;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Storage settings for one cache tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TierConfig {
    pub cache_dir: PathBuf,
    pub cache_prefix: String,
    /// Byte budget, parsed from a size string such as `128M`
    pub cache_size: u64,
}

impl TierConfig {
    /// Read `<SCOPE>_CACHE_DIR`, `<SCOPE>_CACHE_PREFIX` and `<SCOPE>_CACHE_SIZE`.
    /// The prefix defaults to the lowercased scope.
    fn from_lookup<F>(lookup: &F, scope: &str, default_dir: &str, default_size: &str) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(format!("{}_{}", scope, name).as_str());

        let cache_dir = var("CACHE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(default_dir));

        let cache_prefix = var("CACHE_PREFIX").unwrap_or_else(|| scope.to_lowercase());

        let cache_size = parse_size(&var("CACHE_SIZE").unwrap_or_else(|| default_size.to_string()));

        Self {
            cache_dir,
            cache_prefix,
            cache_size,
        }
    }
}

/// Application configuration parsed from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub fetch_timeout: Duration,
    pub supported_content_types: Vec<String>,
    pub original: TierConfig,
    pub preview: TierConfig,
}

impl Config {
    /// Parse configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let port = lookup("PORT")
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);

        let fetch_timeout = lookup("FETCH_TIMEOUT_MS")
            .and_then(|ms| ms.parse().ok())
            .map(Duration::from_millis)
            .unwrap_or(Duration::from_secs(1));

        let supported_content_types = lookup("SUPPORTED_CONTENT_TYPES")
            .map(|s| {
                s.split(',')
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .collect()
            })
            .unwrap_or_else(|| vec!["image/jpeg".to_string(), "image/png".to_string()]);

        let original = TierConfig::from_lookup(&lookup, "ORIGINAL", "./cache/original", "128M");
        let preview = TierConfig::from_lookup(&lookup, "PREVIEW", "./cache/preview", "64M");

        Self {
            port,
            fetch_timeout,
            supported_content_types,
            original,
            preview,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|name| vars.get(name).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config(&[]);

        assert_eq!(config.port, 8000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(1));
        assert_eq!(config.supported_content_types, vec!["image/jpeg", "image/png"]);
        assert_eq!(
            config.original,
            TierConfig {
                cache_dir: PathBuf::from("./cache/original"),
                cache_prefix: "original".to_string(),
                cache_size: 128 * 1024 * 1024,
            }
        );
        assert_eq!(
            config.preview,
            TierConfig {
                cache_dir: PathBuf::from("./cache/preview"),
                cache_prefix: "preview".to_string(),
                cache_size: 64 * 1024 * 1024,
            }
        );
    }

    #[test]
    fn test_overrides() {
        let config = config(&[
            ("PORT", "9090"),
            ("FETCH_TIMEOUT_MS", "250"),
            ("SUPPORTED_CONTENT_TYPES", "image/png, image/webp,"),
            ("ORIGINAL_CACHE_DIR", "/var/cache/img/original"),
            ("ORIGINAL_CACHE_PREFIX", "src"),
            ("ORIGINAL_CACHE_SIZE", "1G"),
            ("PREVIEW_CACHE_SIZE", "512k"),
        ]);

        assert_eq!(config.port, 9090);
        assert_eq!(config.fetch_timeout, Duration::from_millis(250));
        assert_eq!(config.supported_content_types, vec!["image/png", "image/webp"]);
        assert_eq!(config.original.cache_dir, PathBuf::from("/var/cache/img/original"));
        assert_eq!(config.original.cache_prefix, "src");
        assert_eq!(config.original.cache_size, 1024 * 1024 * 1024);
        assert_eq!(config.preview.cache_dir, PathBuf::from("./cache/preview"));
        assert_eq!(config.preview.cache_size, 512 * 1024);
    }

    #[test]
    fn test_unparseable_numbers_fall_back() {
        let config = config(&[("PORT", "http"), ("FETCH_TIMEOUT_MS", "-5")]);

        assert_eq!(config.port, 8000);
        assert_eq!(config.fetch_timeout, Duration::from_secs(1));
    }

    #[test]
    fn test_malformed_size_disables_tier() {
        let config = config(&[("PREVIEW_CACHE_SIZE", "lots")]);
        assert_eq!(config.preview.cache_size, 0);
    }
}
