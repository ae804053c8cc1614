use std::str::FromStr;

use anyhow::anyhow;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WalkingPace {
    Slow,
    #[default]
    Moderate,
    Fast,
}

impl FromStr for WalkingPace {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "slow" => Ok(WalkingPace::Slow),
            "moderate" => Ok(WalkingPace::Moderate),
            "fast" => Ok(WalkingPace::Fast),
            other => Err(anyhow!("Invalid walking pace: {other}")),
        }
    }
}

/// The part of a user's preferences that drives travel time estimates.
///
/// This is a snapshot: when the live profile changes, estimates have to be
/// recomputed with a new one.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserProfile {
    pub walking_pace: WalkingPace,
    #[serde(alias = "includePublicTransport")]
    pub uses_public_transport: bool,
}

impl UserProfile {
    pub fn new(walking_pace: WalkingPace, uses_public_transport: bool) -> Self {
        Self {
            walking_pace,
            uses_public_transport,
        }
    }
}
