//! # Keyspace
//!
//! Every record type has a fixed prefix. Numeric key parts are zero-padded
//! or big-endian so that key order equals the order readers want.
//!
//! | Prefix | Record |
//! |--------|--------|
//! | `acct/{addr}` | account |
//! | `audit/{addr}/{seq}` | audit entry |
//! | `idem/{addr}/{key}` | one-shot credit marker |
//! | `streak/{addr}/{type}` | streak state |
//! | `faucet/{addr}/{day}` | faucet claim of a UTC day |
//! | `reflink/{referee}` | referral link |
//! | `refby/{referrer}/{referee}` | referrer's referee index |
//! | `refcode/{CODE}` / `refowner/{addr}` | referral code both ways |
//! | `social/{platform}/{id}` | linked social identity |
//! | `stake/{tx}` / `stakeidx/{addr}/{inv_ts}/{tx}` | stake history |
//! | `stakejob/{tx}` | accepted stake-sync job not yet finished |
//! | `mission/{id}` / `meta/mission_seq` | mission registry |
//! | `legacy/{id}` | imported legacy points |
//! | `rank/{!points}{!claims}{addr}` | leaderboard order |

use chrono::NaiveDate;
use shared_types::{SocialPlatform, StreakType, TxHash, WalletAddress};

pub const ACCOUNT_PREFIX: &[u8] = b"acct/";
pub const AUDIT_PREFIX: &[u8] = b"audit/";
pub const MISSION_PREFIX: &[u8] = b"mission/";
pub const RANK_PREFIX: &[u8] = b"rank/";
pub const STAKE_JOB_PREFIX: &[u8] = b"stakejob/";
pub const MISSION_SEQ: &[u8] = b"meta/mission_seq";

fn join(parts: &[&str]) -> Vec<u8> {
    parts.join("/").into_bytes()
}

pub fn account(address: &WalletAddress) -> Vec<u8> {
    join(&["acct", address.as_str()])
}

pub fn audit(address: &WalletAddress, seq: u64) -> Vec<u8> {
    join(&["audit", address.as_str(), &format!("{seq:020}")])
}

pub fn audit_prefix(address: &WalletAddress) -> Vec<u8> {
    format!("audit/{address}/").into_bytes()
}

pub fn idempotency(address: &WalletAddress, key: &str) -> Vec<u8> {
    join(&["idem", address.as_str(), key])
}

pub fn streak(address: &WalletAddress, streak: StreakType) -> Vec<u8> {
    join(&["streak", address.as_str(), streak.as_str()])
}

pub fn faucet_claim(address: &WalletAddress, day: NaiveDate) -> Vec<u8> {
    join(&["faucet", address.as_str(), &day.format("%Y-%m-%d").to_string()])
}

pub fn referral_link(referee: &WalletAddress) -> Vec<u8> {
    join(&["reflink", referee.as_str()])
}

pub fn referee_index(referrer: &WalletAddress, referee: &WalletAddress) -> Vec<u8> {
    join(&["refby", referrer.as_str(), referee.as_str()])
}

pub fn referee_index_prefix(referrer: &WalletAddress) -> Vec<u8> {
    format!("refby/{referrer}/").into_bytes()
}

/// Codes are canonicalised to uppercase before lookup.
pub fn referral_code(code: &str) -> Vec<u8> {
    join(&["refcode", &code.trim().to_ascii_uppercase()])
}

pub fn referral_code_owner(address: &WalletAddress) -> Vec<u8> {
    join(&["refowner", address.as_str()])
}

pub fn social_identity(platform: SocialPlatform, external_id: &str) -> Vec<u8> {
    join(&["social", platform.as_str(), external_id])
}

pub fn stake(tx: &TxHash) -> Vec<u8> {
    join(&["stake", tx.as_str()])
}

pub fn stake_job(tx: &TxHash) -> Vec<u8> {
    join(&["stakejob", tx.as_str()])
}

/// Newest first: the timestamp is inverted.
pub fn stake_index(address: &WalletAddress, recorded_at_millis: i64, tx: &TxHash) -> Vec<u8> {
    let inverted = u64::MAX - u64::try_from(recorded_at_millis).unwrap_or(0);
    join(&["stakeidx", address.as_str(), &format!("{inverted:020}"), tx.as_str()])
}

pub fn stake_index_prefix(address: &WalletAddress) -> Vec<u8> {
    format!("stakeidx/{address}/").into_bytes()
}

pub fn mission(id: u64) -> Vec<u8> {
    join(&["mission", &format!("{id:020}")])
}

pub fn legacy_points(external_id: &str) -> Vec<u8> {
    join(&["legacy", external_id])
}

/// Leaderboard key: points descending, then claims descending, then address.
pub fn rank(points: u64, total_claims: u64, address: &WalletAddress) -> Vec<u8> {
    let mut key = Vec::with_capacity(RANK_PREFIX.len() + 16 + address.as_str().len());
    key.extend_from_slice(RANK_PREFIX);
    key.extend_from_slice(&(u64::MAX - points).to_be_bytes());
    key.extend_from_slice(&(u64::MAX - total_claims).to_be_bytes());
    key.extend_from_slice(address.as_str().as_bytes());
    key
}

/// Decode `(points, total_claims, address)` from a rank key.
pub fn parse_rank(key: &[u8]) -> Option<(u64, u64, WalletAddress)> {
    let body = key.strip_prefix(RANK_PREFIX)?;
    if body.len() < 16 {
        return None;
    }
    let points = u64::MAX - u64::from_be_bytes(body[0..8].try_into().ok()?);
    let claims = u64::MAX - u64::from_be_bytes(body[8..16].try_into().ok()?);
    let address = WalletAddress::parse(std::str::from_utf8(&body[16..]).ok()?).ok()?;
    Some((points, claims, address))
}

/// Score part of a rank key (prefix stripped, address excluded).
pub fn rank_score(key: &[u8]) -> Option<&[u8]> {
    key.strip_prefix(RANK_PREFIX).and_then(|body| body.get(..16))
}

/// Address suffix of a prefixed key such as `acct/{addr}`.
pub fn trailing_address(key: &[u8], prefix: &[u8]) -> Option<WalletAddress> {
    let tail = key.strip_prefix(prefix)?;
    let text = std::str::from_utf8(tail).ok()?;
    let last = text.rsplit('/').next()?;
    WalletAddress::parse(last).ok()
}
