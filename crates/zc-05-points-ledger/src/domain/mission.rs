//! Mission registry

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use shared_types::MissionKind;

/// Admin-defined mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub id: u64,
    pub kind: MissionKind,
    pub title: String,
    pub description: String,
    pub reward_points: u64,
    /// How completion is checked by the caller (e.g. `twitter_follow`).
    pub verification: String,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionDraft {
    pub kind: MissionKind,
    pub title: String,
    pub description: String,
    pub reward_points: u64,
    pub verification: String,
}

/// Partial update; `None` keeps the current value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissionUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub reward_points: Option<u64>,
    pub verification: Option<String>,
}

impl MissionUpdate {
    pub(crate) fn apply(self, mission: &mut Mission) {
        if let Some(title) = self.title {
            mission.title = title;
        }
        if let Some(description) = self.description {
            mission.description = description;
        }
        if let Some(points) = self.reward_points {
            mission.reward_points = points;
        }
        if let Some(verification) = self.verification {
            mission.verification = verification;
        }
    }
}
