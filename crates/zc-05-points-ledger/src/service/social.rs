//! Social identities and legacy points.

use shared_bus::LedgerEvent;
use shared_types::{Clock, SocialPlatform, TaskKind, WalletAddress};
use zc_01_ledger_store::{keys, KeyValueStore};
use zug_telemetry::log_event;

use super::{signed, LedgerService, COMPONENT};
use crate::domain::account::SocialIdentity;
use crate::domain::social::{IdentityOwner, LegacyPoints};
use crate::domain::views::SocialLinkOutcome;
use crate::error::{LedgerError, LedgerResult};
use crate::ledger_txn::{LedgerTxn, LockedAccount};
use crate::ports::{SocialVerifier, VerifierError};

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Link a verified identity to `address`.
    ///
    /// The first link on a platform pays the connect bonus. Relinking the
    /// same identity to the same address is a no-op; an identity owned by
    /// another address is refused. A new Twitter link also claims legacy
    /// points imported for that account.
    pub fn link_social_identity(
        &self,
        address: &WalletAddress,
        platform: SocialPlatform,
        external_id: &str,
        handle: &str,
    ) -> LedgerResult<SocialLinkOutcome> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(LedgerError::invalid("external id is required"));
        }

        let outcome = self.in_txn("link_social_identity", |txn| {
            let mut locked = txn.lock_account(address)?;
            let identity_key = keys::social_identity(platform, external_id);

            if let Some(owner) = txn.read_for_update::<IdentityOwner>(&identity_key)? {
                if owner.address != *address {
                    return Err(LedgerError::IdentityAlreadyLinked {
                        platform,
                        external_id: external_id.to_string(),
                    });
                }
                return Ok(SocialLinkOutcome {
                    success: true,
                    is_new_connection: false,
                    bonus_awarded: 0,
                    legacy_points_claimed: 0,
                });
            }

            // a different identity on the same platform is released
            if let Some(previous) = locked.account.social_identity(platform).cloned() {
                txn.delete(&keys::social_identity(platform, &previous.external_id))?;
                locked.account.social.retain(|s| s.platform != platform);
            }

            let now = txn.now();
            locked.account.social.push(SocialIdentity {
                platform,
                external_id: external_id.to_string(),
                handle: handle.to_string(),
                linked_at: now,
            });
            let owner = IdentityOwner {
                address: address.clone(),
                platform,
                external_id: external_id.to_string(),
                handle: handle.to_string(),
                linked_at: now,
            };
            txn.write(&identity_key, &owner)?;

            let task = TaskKind::SocialConnect { platform };
            let bonus_awarded = if txn.is_recorded(address, &task)? {
                0
            } else {
                let points = self.config.rewards.social(platform);
                txn.append_credit(&mut locked, &task, signed(points), None)?;
                points
            };

            let legacy_points_claimed = if platform == SocialPlatform::Twitter {
                self.claim_legacy_in(txn, &mut locked, external_id)?
            } else {
                0
            };

            txn.save_account(&mut locked)?;
            txn.effects.events.push(LedgerEvent::SocialLinked {
                address: address.clone(),
                platform,
                external_id: external_id.to_string(),
            });
            Ok(SocialLinkOutcome {
                success: true,
                is_new_connection: true,
                bonus_awarded,
                legacy_points_claimed,
            })
        })?;

        if outcome.is_new_connection {
            log_event!(
                info,
                COMPONENT,
                "Social identity linked",
                address = %address,
                platform = %platform,
                bonus = outcome.bonus_awarded,
                legacy = outcome.legacy_points_claimed
            );
        }
        Ok(outcome)
    }

    /// Verify a platform session, then link the identity it names.
    ///
    /// No ledger state is touched until the verifier has answered. Telegram
    /// links additionally require group membership.
    pub async fn verify_and_link_social<V>(
        &self,
        verifier: &V,
        address: &WalletAddress,
        platform: SocialPlatform,
        session: &str,
    ) -> LedgerResult<SocialLinkOutcome>
    where
        V: SocialVerifier + ?Sized,
    {
        let identity = verifier
            .verify(platform, session)
            .await
            .map_err(|e| match e {
                VerifierError::Rejected { reason } => LedgerError::VerificationRejected { reason },
                VerifierError::Unavailable { message } => LedgerError::Upstream { message },
            })?;

        if platform == SocialPlatform::Telegram && !identity.is_group_member {
            return Err(LedgerError::NotGroupMember);
        }

        self.link_social_identity(address, platform, &identity.external_id, &identity.handle)
    }

    /// Store claimable pre-launch points for an external account id.
    /// Replaces an unclaimed amount; a claimed one is final.
    pub fn import_legacy_points(&self, external_id: &str, points: u64) -> LedgerResult<LegacyPoints> {
        let external_id = external_id.trim();
        if external_id.is_empty() {
            return Err(LedgerError::invalid("external id is required"));
        }
        self.in_txn("import_legacy_points", |txn| {
            let key = keys::legacy_points(external_id);
            if let Some(existing) = txn.read_for_update::<LegacyPoints>(&key)? {
                if existing.claimed_by.is_some() {
                    return Err(LedgerError::invalid(format!(
                        "legacy points for {external_id} were already claimed"
                    )));
                }
            }
            let legacy = LegacyPoints {
                external_id: external_id.to_string(),
                points,
                imported_at: txn.now(),
                claimed_by: None,
            };
            txn.write(&key, &legacy)?;
            Ok(legacy)
        })
    }

    fn claim_legacy_in(
        &self,
        txn: &mut LedgerTxn<'_>,
        locked: &mut LockedAccount,
        external_id: &str,
    ) -> LedgerResult<u64> {
        let key = keys::legacy_points(external_id);
        let Some(mut legacy) = txn.read_for_update::<LegacyPoints>(&key)? else {
            return Ok(0);
        };
        if legacy.claimed_by.is_some() || legacy.points == 0 {
            return Ok(0);
        }
        let address = locked.account.address.clone();
        let task = TaskKind::LegacyClaim;
        if txn.is_recorded(&address, &task)? {
            return Ok(0);
        }

        txn.append_credit(
            locked,
            &task,
            signed(legacy.points),
            Some(format!("twitter:{external_id}")),
        )?;
        legacy.claimed_by = Some(address);
        txn.write(&key, &legacy)?;
        Ok(legacy.points)
    }
}
