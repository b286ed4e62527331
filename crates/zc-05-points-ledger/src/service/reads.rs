//! Read views. All are cache-eligible and never feed a crediting decision.

use shared_types::{Clock, Multiplier, WalletAddress};
use tracing::warn;
use zc_01_ledger_store::{decode, keys, KeyValueStore};
use zc_04_read_cache::{CacheKey, ReadCacheExt};

use super::{LedgerService, COMPONENT};
use crate::domain::account::{Account, AuditEntry};
use crate::domain::views::{GlobalStats, LeaderboardEntry, Profile};
use crate::error::{LedgerError, LedgerResult};

impl<S, C> LedgerService<S, C>
where
    S: KeyValueStore,
    C: Clock,
{
    /// Balance, claims, rank and multiplier. Unknown addresses get zeros
    /// and rank 0.
    pub fn get_profile(&self, address: &WalletAddress) -> LedgerResult<Profile> {
        let cache_key = CacheKey::Profile(address.clone());
        if let Some(hit) = self.cache.get_json::<Profile>(&cache_key) {
            return Ok(hit);
        }

        let profile = match self.get_account(address)? {
            Some(account) => Profile {
                rank: self.rank_of(&account)?,
                address: account.address,
                points: account.points,
                total_claims: account.total_claims,
                multiplier: account.multiplier,
            },
            None => Profile {
                address: address.clone(),
                points: 0,
                total_claims: 0,
                rank: 0,
                multiplier: Multiplier::ONE,
            },
        };

        self.cache
            .set_json(cache_key, &profile, self.config.profile_ttl);
        Ok(profile)
    }

    /// 1 + accounts with more points, or equal points and more claims.
    fn rank_of(&self, account: &Account) -> LedgerResult<u64> {
        let own = keys::rank(account.points, account.total_claims, &account.address);
        let own_score = keys::rank_score(&own).ok_or_else(|| LedgerError::Internal {
            message: "malformed rank key".to_string(),
        })?;

        let mut ahead = 0u64;
        for (key, _) in self.store.scan_prefix(keys::RANK_PREFIX, None)? {
            match keys::rank_score(&key) {
                Some(score) if score < own_score => ahead += 1,
                _ => break,
            }
        }
        Ok(ahead + 1)
    }

    /// Top accounts by points, then claims. Ties share a dense rank.
    pub fn get_leaderboard(&self, limit: usize) -> LedgerResult<Vec<LeaderboardEntry>> {
        let limit = limit.clamp(1, self.config.max_leaderboard.max(1));
        let cache_key = CacheKey::Leaderboard(limit);
        if let Some(hit) = self.cache.get_json::<Vec<LeaderboardEntry>>(&cache_key) {
            return Ok(hit);
        }

        let mut entries = Vec::with_capacity(limit);
        let mut rank = 0u64;
        let mut last_score: Option<Vec<u8>> = None;
        for (key, _) in self.store.scan_prefix(keys::RANK_PREFIX, Some(limit))? {
            let Some((points, total_claims, address)) = keys::parse_rank(&key) else {
                warn!(component = COMPONENT, "Skipping malformed leaderboard key");
                continue;
            };
            let score = keys::rank_score(&key).map(<[u8]>::to_vec);
            if score != last_score {
                rank += 1;
                last_score = score;
            }
            entries.push(LeaderboardEntry {
                address,
                points,
                total_claims,
                rank,
            });
        }

        self.cache
            .set_json(cache_key, &entries, self.config.profile_ttl);
        Ok(entries)
    }

    /// Totals across every account.
    pub fn get_global_stats(&self) -> LedgerResult<GlobalStats> {
        if let Some(hit) = self.cache.get_json::<GlobalStats>(&CacheKey::GlobalStats) {
            return Ok(hit);
        }

        let mut stats = GlobalStats::default();
        for (_, value) in self.store.scan_prefix(keys::ACCOUNT_PREFIX, None)? {
            let account: Account = decode(&value)?;
            stats.total_users += 1;
            stats.total_points = stats.total_points.saturating_add(account.points);
            stats.total_activity += account.audit_count;
        }

        self.cache
            .set_json(CacheKey::GlobalStats, &stats, self.config.stats_ttl);
        Ok(stats)
    }

    /// Audit trail of `address`, oldest first.
    pub fn get_audit_log(&self, address: &WalletAddress) -> LedgerResult<Vec<AuditEntry>> {
        self.store
            .scan_prefix(&keys::audit_prefix(address), None)?
            .iter()
            .map(|(_, value)| decode(value).map_err(LedgerError::from))
            .collect()
    }
}
