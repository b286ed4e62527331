//! Tier table and resolver

use serde::{Deserialize, Serialize};
use shared_types::Multiplier;
use thiserror::Error;

use crate::domain::progress::{NextTier, Requirement, TierProgress};

/// One row of the tier table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tier {
    pub name: String,
    pub min_verified_invites: u64,
    pub min_xp: u64,
    pub multiplier: Multiplier,
}

impl Tier {
    pub fn new(name: &str, min_verified_invites: u64, min_xp: u64, multiplier_bps: u32) -> Self {
        Self {
            name: name.to_string(),
            min_verified_invites,
            min_xp,
            multiplier: Multiplier::from_bps(multiplier_bps).unwrap_or(Multiplier::ONE),
        }
    }

    /// Both thresholds satisfied.
    pub fn admits(&self, verified_invites: u64, xp: u64) -> bool {
        verified_invites >= self.min_verified_invites && xp >= self.min_xp
    }
}

/// Invalid tier table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TierTableError {
    #[error("Tier table is empty")]
    Empty,

    #[error("Base tier {name} must have zero thresholds")]
    BaseTierGated { name: String },

    #[error("Tier {name} does not raise every threshold over the tier below")]
    NotAscending { name: String },
}

/// Ordered ascending list of tiers. The first tier admits everyone.
///
/// Serialized as a plain list; deserializing goes through `TierTable::new`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Tier>", into = "Vec<Tier>")]
pub struct TierTable {
    tiers: Vec<Tier>,
}

impl TryFrom<Vec<Tier>> for TierTable {
    type Error = TierTableError;

    fn try_from(tiers: Vec<Tier>) -> Result<Self, Self::Error> {
        Self::new(tiers)
    }
}

impl From<TierTable> for Vec<Tier> {
    fn from(table: TierTable) -> Self {
        table.tiers
    }
}

impl Default for TierTable {
    fn default() -> Self {
        Self {
            tiers: vec![
                Tier::new("SCOUT", 0, 0, 10_000),
                Tier::new("VANGUARD", 10, 500, 11_000),
                Tier::new("ELITE", 50, 2_500, 12_500),
                Tier::new("LEGEND", 100, 10_000, 15_000),
                Tier::new("MYTHIC", 500, 50_000, 20_000),
            ],
        }
    }
}

impl TierTable {
    pub fn new(tiers: Vec<Tier>) -> Result<Self, TierTableError> {
        let base = tiers.first().ok_or(TierTableError::Empty)?;
        if base.min_verified_invites != 0 || base.min_xp != 0 {
            return Err(TierTableError::BaseTierGated {
                name: base.name.clone(),
            });
        }
        for pair in tiers.windows(2) {
            let (lower, upper) = (&pair[0], &pair[1]);
            if upper.min_verified_invites < lower.min_verified_invites
                || upper.min_xp < lower.min_xp
                || upper.multiplier < lower.multiplier
            {
                return Err(TierTableError::NotAscending {
                    name: upper.name.clone(),
                });
            }
        }
        Ok(Self { tiers })
    }

    pub fn tiers(&self) -> &[Tier] {
        &self.tiers
    }

    pub fn get(&self, name: &str) -> Option<&Tier> {
        self.tiers.iter().find(|t| t.name == name)
    }

    fn resolve_index(&self, verified_invites: u64, xp: u64) -> usize {
        self.tiers
            .iter()
            .rposition(|t| t.admits(verified_invites, xp))
            .unwrap_or(0)
    }

    /// Highest tier whose thresholds are both met.
    pub fn resolve(&self, verified_invites: u64, xp: u64) -> &Tier {
        &self.tiers[self.resolve_index(verified_invites, xp)]
    }

    /// Resolved tier plus progress toward the next one.
    pub fn progress(&self, verified_invites: u64, xp: u64) -> TierProgress {
        let index = self.resolve_index(verified_invites, xp);
        let current = &self.tiers[index];

        let Some(next) = self.tiers.get(index + 1) else {
            return TierProgress {
                tier: current.clone(),
                next: NextTier::Max,
                progress_percent: 100,
                missing: Vec::new(),
            };
        };

        let fraction = |value: u64, from: u64, to: u64| -> f64 {
            let range = to.saturating_sub(from);
            if range == 0 {
                return 1.0;
            }
            (value.saturating_sub(from) as f64 / range as f64).min(1.0)
        };

        let xp_fraction = fraction(xp, current.min_xp, next.min_xp);
        let invite_fraction = fraction(
            verified_invites,
            current.min_verified_invites,
            next.min_verified_invites,
        );
        let blended = xp_fraction * 75.0 + invite_fraction * 25.0;

        let mut missing = Vec::new();
        let needed_invites = next.min_verified_invites.saturating_sub(verified_invites);
        if needed_invites > 0 {
            missing.push(Requirement::Invites(needed_invites));
        }
        let needed_xp = next.min_xp.saturating_sub(xp);
        if needed_xp > 0 {
            missing.push(Requirement::Xp(needed_xp));
        }

        TierProgress {
            tier: current.clone(),
            next: NextTier::Tier(next.clone()),
            progress_percent: blended.round().clamp(0.0, 100.0) as u8,
            missing,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_table_is_valid() {
        let table = TierTable::default();
        assert!(TierTable::new(table.tiers().to_vec()).is_ok());
        assert_eq!(table.tiers().len(), 5);
    }

    #[test]
    fn test_deserialize_validates() {
        let err = serde_json::from_str::<TierTable>("[]").unwrap_err();
        assert!(err.to_string().contains("empty"), "{err}");

        let gated = r#"[{"name":"SCOUT","min_verified_invites":1,"min_xp":0,"multiplier":10000}]"#;
        assert!(serde_json::from_str::<TierTable>(gated).is_err());

        let json = serde_json::to_string(&TierTable::default()).unwrap();
        assert!(json.starts_with('['));
        assert_eq!(serde_json::from_str::<TierTable>(&json).unwrap(), TierTable::default());
    }

    #[test]
    fn test_dual_gate_invites_without_xp() {
        let table = TierTable::default();
        assert_eq!(table.resolve(100, 0).name, "SCOUT");
    }

    #[test]
    fn test_dual_gate_xp_without_invites() {
        let table = TierTable::default();
        assert_eq!(table.resolve(0, 10_000).name, "SCOUT");
    }

    #[test]
    fn test_resolves_highest_admitting_tier() {
        let table = TierTable::default();
        assert_eq!(table.resolve(10, 500).name, "VANGUARD");
        assert_eq!(table.resolve(60, 3_000).name, "ELITE");
        // invites qualify for LEGEND, XP only for ELITE
        assert_eq!(table.resolve(150, 5_000).name, "ELITE");
        assert_eq!(table.resolve(10_000, 1_000_000).name, "MYTHIC");
    }

    #[test]
    fn test_multiplier_per_tier() {
        let table = TierTable::default();
        assert_eq!(table.resolve(50, 2_500).multiplier.bps(), 12_500);
        assert_eq!(table.resolve(100, 10_000).multiplier.bps(), 15_000);
    }

    #[test]
    fn test_rejects_gated_base_tier() {
        let err = TierTable::new(vec![Tier::new("X", 1, 0, 10_000)]).unwrap_err();
        assert!(matches!(err, TierTableError::BaseTierGated { .. }));
    }

    #[test]
    fn test_rejects_descending_table() {
        let err = TierTable::new(vec![
            Tier::new("A", 0, 0, 10_000),
            Tier::new("B", 10, 500, 12_000),
            Tier::new("C", 5, 1_000, 13_000),
        ])
        .unwrap_err();
        assert_eq!(err, TierTableError::NotAscending { name: "C".into() });
    }

    #[test]
    fn test_rejects_empty_table() {
        assert_eq!(TierTable::new(Vec::new()).unwrap_err(), TierTableError::Empty);
    }
}
