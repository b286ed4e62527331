//! Progress toward the next tier

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::domain::tier::Tier;

/// The tier after the current one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextTier {
    Tier(Tier),
    /// Already at the top of the table.
    Max,
}

impl NextTier {
    pub fn name(&self) -> &str {
        match self {
            Self::Tier(t) => &t.name,
            Self::Max => "MAX_LEVEL",
        }
    }
}

/// A threshold still to reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Requirement {
    Invites(u64),
    Xp(u64),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Invites(n) => write!(f, "{n} invites"),
            Self::Xp(n) => write!(f, "{n} XP"),
        }
    }
}

/// Resolved tier with progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TierProgress {
    pub tier: Tier,
    pub next: NextTier,
    /// 0..=100
    pub progress_percent: u8,
    pub missing: Vec<Requirement>,
}

impl TierProgress {
    /// "More 5 invites & 300 XP", "Ready for Upgrade" or "Max Level".
    pub fn missing_summary(&self) -> String {
        if matches!(self.next, NextTier::Max) {
            return "Max Level".to_string();
        }
        if self.missing.is_empty() {
            return "Ready for Upgrade".to_string();
        }
        let parts: Vec<String> = self.missing.iter().map(ToString::to_string).collect();
        format!("More {}", parts.join(" & "))
    }
}
