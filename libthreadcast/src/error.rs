//! Error types for Threadcast

use thiserror::Error;

pub type Result<T> = std::result::Result<T, ThreadcastError>;

#[derive(Error, Debug)]
pub enum ThreadcastError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Platform error: {0}")]
    Platform(#[from] PlatformError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl ThreadcastError {
    /// Returns the appropriate process exit code for this error
    pub fn exit_code(&self) -> i32 {
        match self {
            ThreadcastError::InvalidInput(_) => 3,
            ThreadcastError::Platform(PlatformError::Authentication(_)) => 2,
            ThreadcastError::Platform(_) => 1,
            ThreadcastError::Config(_) => 1,
            ThreadcastError::Store(_) => 1,
        }
    }
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing required field: {0}")]
    MissingField(String),

    #[error("Invalid value: {0}")]
    InvalidValue(String),
}

#[derive(Error, Debug)]
pub enum StoreError {
    /// Connectivity or query failure against the document store. Not
    /// retried at this layer; the run aborts.
    #[error("Store unavailable: {0}")]
    Unavailable(String),

    #[error("No record with id: {0}")]
    MissingRecord(String),

    #[error("Malformed record {id}: {reason}")]
    MalformedRecord { id: String, reason: String },
}

impl From<mongodb::error::Error> for StoreError {
    fn from(e: mongodb::error::Error) -> Self {
        StoreError::Unavailable(e.to_string())
    }
}

#[derive(Error, Debug, Clone)]
pub enum PlatformError {
    /// Credential exchange failed. The job aborts before any store access.
    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Posting failed: {0}")]
    Posting(String),

    #[error("Network error: {0}")]
    Network(String),

    /// The create-post response carried no usable post id. Treated as a
    /// failed attempt, never as a success with a missing field.
    #[error("Response carried no usable post id")]
    MissingPostId,

    #[error("Media upload failed: {0}")]
    MediaUpload(String),

    /// A part failed every attempt. Terminal for the whole post; parts
    /// published before it stay live.
    #[error("Gave up on part {part_index} after {attempts} attempts: {last_error}")]
    Exhausted {
        part_index: usize,
        attempts: u32,
        last_error: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_invalid_input() {
        let error = ThreadcastError::InvalidInput("empty parts".to_string());
        assert_eq!(error.exit_code(), 3);
    }

    #[test]
    fn test_exit_code_authentication_error() {
        let error =
            ThreadcastError::Platform(PlatformError::Authentication("bad keys".to_string()));
        assert_eq!(error.exit_code(), 2);
    }

    #[test]
    fn test_exit_code_other_platform_errors() {
        let posting = ThreadcastError::Platform(PlatformError::Posting("timeout".to_string()));
        let network = ThreadcastError::Platform(PlatformError::Network("refused".to_string()));
        let missing = ThreadcastError::Platform(PlatformError::MissingPostId);
        let exhausted = ThreadcastError::Platform(PlatformError::Exhausted {
            part_index: 1,
            attempts: 3,
            last_error: "timeout".to_string(),
        });

        assert_eq!(posting.exit_code(), 1);
        assert_eq!(network.exit_code(), 1);
        assert_eq!(missing.exit_code(), 1);
        assert_eq!(exhausted.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_store_error() {
        let error = ThreadcastError::Store(StoreError::Unavailable("no route".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_exit_code_config_error() {
        let error = ThreadcastError::Config(ConfigError::MissingField("store.uri".to_string()));
        assert_eq!(error.exit_code(), 1);
    }

    #[test]
    fn test_error_message_formatting_store() {
        let error = ThreadcastError::Store(StoreError::MissingRecord("abc123".to_string()));
        assert_eq!(format!("{}", error), "Store error: No record with id: abc123");
    }

    #[test]
    fn test_error_message_formatting_exhausted() {
        let error = PlatformError::Exhausted {
            part_index: 2,
            attempts: 3,
            last_error: "Network error: timeout".to_string(),
        };
        let message = format!("{}", error);
        assert!(message.contains("part 2"));
        assert!(message.contains("3 attempts"));
        assert!(message.contains("timeout"));
    }

    #[test]
    fn test_error_conversion_from_store_error() {
        let store_error = StoreError::Unavailable("connection reset".to_string());
        let error: ThreadcastError = store_error.into();
        assert!(matches!(error, ThreadcastError::Store(_)));
    }

    #[test]
    fn test_error_conversion_from_platform_error() {
        let platform_error = PlatformError::MissingPostId;
        let error: ThreadcastError = platform_error.into();
        assert!(matches!(error, ThreadcastError::Platform(_)));
    }

    #[test]
    fn test_platform_error_clone() {
        // Clone is required so retry loops can keep the last error around
        let original = PlatformError::Network("connection failed".to_string());
        let cloned = original.clone();
        assert_eq!(format!("{}", original), format!("{}", cloned));
    }

    #[test]
    fn test_malformed_record_formatting() {
        let error = StoreError::MalformedRecord {
            id: "not-an-oid".to_string(),
            reason: "invalid object id".to_string(),
        };
        let message = format!("{}", error);
        assert!(message.contains("not-an-oid"));
        assert!(message.contains("invalid object id"));
    }
}
