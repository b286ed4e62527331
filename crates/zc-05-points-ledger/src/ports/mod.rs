//! Ports

pub mod outbound;

pub use outbound::{SocialVerifier, VerifiedIdentity, VerifierError};
