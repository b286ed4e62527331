//! # Outbound Ports
//!
//! Collaborators the ledger calls but does not own. Verification always
//! completes before any ledger transaction begins.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use shared_types::SocialPlatform;
use thiserror::Error;

/// Identity confirmed by the platform.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    pub external_id: String,
    pub handle: String,
    /// Telegram only: member of the community group.
    pub is_group_member: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VerifierError {
    /// The session is invalid or the platform refused it.
    #[error("Verification rejected: {reason}")]
    Rejected { reason: String },

    /// Platform API unreachable or timed out.
    #[error("Verifier unavailable: {message}")]
    Unavailable { message: String },
}

/// OAuth / bot verification service.
#[async_trait]
pub trait SocialVerifier: Send + Sync {
    async fn verify(
        &self,
        platform: SocialPlatform,
        session: &str,
    ) -> Result<VerifiedIdentity, VerifierError>;
}
