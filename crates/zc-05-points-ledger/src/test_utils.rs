//! Test doubles shared with the integration suite.

use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::Mutex;
use shared_types::SocialPlatform;

use crate::ports::{SocialVerifier, VerifiedIdentity, VerifierError};

/// Verifier answering from a session table.
#[derive(Debug, Default)]
pub struct MockSocialVerifier {
    sessions: Mutex<HashMap<(SocialPlatform, String), Result<VerifiedIdentity, VerifierError>>>,
    calls: Mutex<u32>,
}

impl MockSocialVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_identity(
        self,
        platform: SocialPlatform,
        session: &str,
        external_id: &str,
        handle: &str,
        is_group_member: bool,
    ) -> Self {
        self.sessions.lock().insert(
            (platform, session.to_string()),
            Ok(VerifiedIdentity {
                external_id: external_id.to_string(),
                handle: handle.to_string(),
                is_group_member,
            }),
        );
        self
    }

    pub fn with_error(self, platform: SocialPlatform, session: &str, error: VerifierError) -> Self {
        self.sessions
            .lock()
            .insert((platform, session.to_string()), Err(error));
        self
    }

    pub fn calls(&self) -> u32 {
        *self.calls.lock()
    }
}

#[async_trait]
impl SocialVerifier for MockSocialVerifier {
    async fn verify(
        &self,
        platform: SocialPlatform,
        session: &str,
    ) -> Result<VerifiedIdentity, VerifierError> {
        *self.calls.lock() += 1;
        self.sessions
            .lock()
            .get(&(platform, session.to_string()))
            .cloned()
            .unwrap_or_else(|| {
                Err(VerifierError::Rejected {
                    reason: "unknown session".to_string(),
                })
            })
    }
}
