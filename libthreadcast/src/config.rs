//! Configuration management for Threadcast

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::error::{ConfigError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub store: StoreConfig,
    #[serde(default)]
    pub publish: PublishConfig,
    #[serde(default)]
    pub schedule: ScheduleConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Connection string for the document store.
    pub uri: String,
    pub database: String,
    #[serde(default = "default_pending_collection")]
    pub pending_collection: String,
    #[serde(default = "default_published_collection")]
    pub published_collection: String,
    #[serde(default = "default_image_collection")]
    pub image_collection: String,
}

/// Tunables for the publishing loop. Defaults match live behavior; tests
/// pin their own values.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    /// Create-post attempts per part before the whole post is aborted.
    pub max_attempts: u32,
    /// Fixed (not jittered) wait between attempts of the same part.
    pub retry_delay_secs: u64,
    /// Bounds of the uniformly drawn pause after each published part.
    pub pacing_min_secs: f64,
    pub pacing_max_secs: f64,
    pub on_partial_failure: PartialFailurePolicy,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            retry_delay_secs: 10,
            pacing_min_secs: 5.0,
            pacing_max_secs: 8.0,
            on_partial_failure: PartialFailurePolicy::LeaveEligible,
        }
    }
}

/// What to do with a post whose publishing aborted after some parts were
/// already live.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PartialFailurePolicy {
    /// Leave the record eligible; a later run restarts the thread from the
    /// first part and may duplicate the parts that already went out.
    LeaveEligible,
    /// Mark the record handled, losing the unpublished tail but never
    /// duplicating the published head.
    MarkPosted,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScheduleConfig {
    /// UTC hours during which the job is allowed to run.
    pub utc_hours: Vec<u32>,
}

impl Default for ScheduleConfig {
    fn default() -> Self {
        Self {
            utc_hours: vec![6, 12],
        }
    }
}

fn default_pending_collection() -> String {
    "pending_posts".to_string()
}

fn default_published_collection() -> String {
    "published_parts".to_string()
}

fn default_image_collection() -> String {
    "images".to_string()
}

impl Config {
    /// Load configuration from the default location
    pub fn load() -> Result<Self> {
        let config_path = resolve_config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(path: &PathBuf) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(ConfigError::ReadError)?;
        let config: Config = toml::from_str(&content).map_err(ConfigError::ParseError)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.publish.max_attempts == 0 {
            return Err(ConfigError::InvalidValue(
                "publish.max_attempts must be at least 1".to_string(),
            )
            .into());
        }
        if self.publish.pacing_min_secs > self.publish.pacing_max_secs {
            return Err(ConfigError::InvalidValue(format!(
                "publish.pacing_min_secs ({}) exceeds pacing_max_secs ({})",
                self.publish.pacing_min_secs, self.publish.pacing_max_secs
            ))
            .into());
        }
        if self.publish.pacing_min_secs < 0.0 {
            return Err(ConfigError::InvalidValue(
                "publish.pacing_min_secs must not be negative".to_string(),
            )
            .into());
        }
        if self.schedule.utc_hours.iter().any(|h| *h > 23) {
            return Err(ConfigError::InvalidValue(
                "schedule.utc_hours entries must be in 0..=23".to_string(),
            )
            .into());
        }
        Ok(())
    }

    /// Create a default configuration
    pub fn default_config() -> Self {
        Self {
            store: StoreConfig {
                uri: "mongodb://localhost:27017".to_string(),
                database: "threadcast".to_string(),
                pending_collection: default_pending_collection(),
                published_collection: default_published_collection(),
                image_collection: default_image_collection(),
            },
            publish: PublishConfig::default(),
            schedule: ScheduleConfig::default(),
        }
    }
}

/// Resolve the configuration file path following XDG Base Directory spec
pub fn resolve_config_path() -> Result<PathBuf> {
    if let Ok(path) = std::env::var("THREADCAST_CONFIG") {
        return Ok(PathBuf::from(shellexpand::tilde(&path).to_string()));
    }

    let config_dir = dirs::config_dir()
        .ok_or_else(|| ConfigError::MissingField("config directory".to_string()))?;

    Ok(config_dir.join("threadcast").join("config.toml"))
}

/// Static credentials for the posting platform, read from the environment.
///
/// Values are held as [`SecretString`] so they never show up in debug or
/// log output. All five are required; provisioning them is the
/// deployment's concern.
#[derive(Debug)]
pub struct Credentials {
    pub api_key: SecretString,
    pub api_secret: SecretString,
    pub access_token: SecretString,
    pub access_secret: SecretString,
    pub bearer_token: SecretString,
}

impl Credentials {
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_key: require_env("THREADCAST_API_KEY")?,
            api_secret: require_env("THREADCAST_API_SECRET")?,
            access_token: require_env("THREADCAST_ACCESS_TOKEN")?,
            access_secret: require_env("THREADCAST_ACCESS_SECRET")?,
            bearer_token: require_env("THREADCAST_BEARER_TOKEN")?,
        })
    }
}

fn require_env(name: &str) -> Result<SecretString> {
    match std::env::var(name) {
        Ok(value) if !value.is_empty() => Ok(SecretString::from(value)),
        _ => Err(ConfigError::MissingField(name.to_string()).into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;
    use serial_test::serial;

    const MINIMAL: &str = r#"
        [store]
        uri = "mongodb://localhost:27017"
        database = "threadcast"
    "#;

    #[test]
    fn test_minimal_config_uses_defaults() {
        let config: Config = toml::from_str(MINIMAL).unwrap();

        assert_eq!(config.store.pending_collection, "pending_posts");
        assert_eq!(config.store.published_collection, "published_parts");
        assert_eq!(config.store.image_collection, "images");
        assert_eq!(config.publish.max_attempts, 3);
        assert_eq!(config.publish.retry_delay_secs, 10);
        assert_eq!(config.publish.pacing_min_secs, 5.0);
        assert_eq!(config.publish.pacing_max_secs, 8.0);
        assert_eq!(
            config.publish.on_partial_failure,
            PartialFailurePolicy::LeaveEligible
        );
        assert_eq!(config.schedule.utc_hours, vec![6, 12]);
    }

    #[test]
    fn test_full_config_overrides() {
        let config: Config = toml::from_str(
            r#"
            [store]
            uri = "mongodb://db.internal:27017"
            database = "content"
            pending_collection = "queue"
            published_collection = "history"

            [publish]
            max_attempts = 5
            retry_delay_secs = 2
            pacing_min_secs = 0.5
            pacing_max_secs = 1.5
            on_partial_failure = "mark-posted"

            [schedule]
            utc_hours = [9, 18]
            "#,
        )
        .unwrap();

        assert_eq!(config.store.pending_collection, "queue");
        assert_eq!(config.publish.max_attempts, 5);
        assert_eq!(
            config.publish.on_partial_failure,
            PartialFailurePolicy::MarkPosted
        );
        assert_eq!(config.schedule.utc_hours, vec![9, 18]);
    }

    #[test]
    fn test_missing_store_section_fails() {
        let result: std::result::Result<Config, _> = toml::from_str("[publish]\nmax_attempts = 1");
        assert!(result.is_err());
    }

    #[test]
    fn test_validate_rejects_zero_attempts() {
        let mut config = Config::default_config();
        config.publish.max_attempts = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_inverted_pacing_bounds() {
        let mut config = Config::default_config();
        config.publish.pacing_min_secs = 9.0;
        config.publish.pacing_max_secs = 5.0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_rejects_out_of_range_hour() {
        let mut config = Config::default_config();
        config.schedule.utc_hours = vec![24];
        assert!(config.validate().is_err());
    }

    #[test]
    #[serial]
    fn test_resolve_config_path_env_override() {
        std::env::set_var("THREADCAST_CONFIG", "/tmp/threadcast-test.toml");
        let path = resolve_config_path().unwrap();
        std::env::remove_var("THREADCAST_CONFIG");

        assert_eq!(path, PathBuf::from("/tmp/threadcast-test.toml"));
    }

    const CRED_VARS: [&str; 5] = [
        "THREADCAST_API_KEY",
        "THREADCAST_API_SECRET",
        "THREADCAST_ACCESS_TOKEN",
        "THREADCAST_ACCESS_SECRET",
        "THREADCAST_BEARER_TOKEN",
    ];

    fn clear_cred_vars() {
        for name in CRED_VARS {
            std::env::remove_var(name);
        }
    }

    #[test]
    #[serial]
    fn test_credentials_from_env() {
        clear_cred_vars();
        for name in CRED_VARS {
            std::env::set_var(name, format!("{}-value", name.to_lowercase()));
        }

        let credentials = Credentials::from_env().unwrap();
        clear_cred_vars();

        assert_eq!(
            credentials.api_key.expose_secret(),
            "threadcast_api_key-value"
        );
        assert_eq!(
            credentials.bearer_token.expose_secret(),
            "threadcast_bearer_token-value"
        );
    }

    #[test]
    #[serial]
    fn test_credentials_require_every_variable() {
        clear_cred_vars();
        for name in CRED_VARS {
            std::env::set_var(name, "x");
        }
        std::env::remove_var("THREADCAST_ACCESS_SECRET");

        let result = Credentials::from_env();
        clear_cred_vars();

        assert!(result.is_err());
        let message = format!("{}", result.unwrap_err());
        assert!(message.contains("THREADCAST_ACCESS_SECRET"));
    }

    #[test]
    #[serial]
    fn test_credentials_reject_empty_value() {
        clear_cred_vars();
        for name in CRED_VARS {
            std::env::set_var(name, "x");
        }
        std::env::set_var("THREADCAST_API_SECRET", "");

        let result = Credentials::from_env();
        clear_cred_vars();

        assert!(result.is_err());
    }

    #[test]
    #[serial]
    fn test_credentials_debug_does_not_leak() {
        clear_cred_vars();
        for name in CRED_VARS {
            std::env::set_var(name, "super-secret-value");
        }

        let credentials = Credentials::from_env().unwrap();
        clear_cred_vars();

        let debug = format!("{:?}", credentials);
        assert!(!debug.contains("super-secret-value"));
    }
}
