//! Platform session lifecycle for one job run

use tracing::{debug, info};

use crate::error::Result;
use crate::platform::PostingPlatform;

/// An authenticated platform session scoped to a single job run.
///
/// `open` performs the credential exchange up front, so a bad credential
/// set aborts the run before any store access. The caller closes the
/// session on success and failure paths alike; consuming `self` in `close`
/// keeps a released session from posting.
pub struct Session {
    platform: Box<dyn PostingPlatform>,
}

impl Session {
    pub async fn open(mut platform: Box<dyn PostingPlatform>) -> Result<Self> {
        platform.authenticate().await?;
        info!(platform = platform.name(), "session established");
        Ok(Self { platform })
    }

    pub fn platform(&self) -> &dyn PostingPlatform {
        self.platform.as_ref()
    }

    /// Release the session.
    pub async fn close(self) {
        debug!(platform = self.platform.name(), "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{PlatformError, ThreadcastError};
    use crate::platform::MockPlatform;

    #[tokio::test]
    async fn test_open_authenticates_the_platform() {
        let mock = MockPlatform::success("mock");
        let session = Session::open(Box::new(mock.clone())).await.unwrap();

        assert_eq!(mock.auth_calls(), 1);
        assert_eq!(session.platform().name(), "mock");
        session.close().await;
    }

    #[tokio::test]
    async fn test_open_fails_fast_on_bad_credentials() {
        let mock = MockPlatform::auth_failure("mock", "invalid keys");
        let result = Session::open(Box::new(mock.clone())).await;

        assert!(matches!(
            result,
            Err(ThreadcastError::Platform(PlatformError::Authentication(_)))
        ));
        assert_eq!(mock.auth_calls(), 1);
    }
}
