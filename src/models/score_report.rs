use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Badge {
    Exceptional,
    Strong,
    SolidFoundation,
    NeedsRefinement,
    RequiresAttention,
}

/// Which family of display labels the front end shows for a badge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BadgeProfile {
    #[default]
    Standard,
    Momentum,
}

impl BadgeProfile {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "standard" => Some(Self::Standard),
            "momentum" => Some(Self::Momentum),
            _ => None,
        }
    }
}

impl Badge {
    pub fn label(self, profile: BadgeProfile) -> &'static str {
        match (self, profile) {
            (Badge::Exceptional, _) => "EXCEPTIONAL",
            (Badge::Strong, _) => "STRONG",
            (Badge::SolidFoundation, BadgeProfile::Standard) => "GOOD START",
            (Badge::SolidFoundation, BadgeProfile::Momentum) => "BUILDING MOMENTUM",
            (Badge::NeedsRefinement, BadgeProfile::Standard) => "NEEDS WORK",
            (Badge::NeedsRefinement, BadgeProfile::Momentum) => "NEEDS REFINEMENT",
            (Badge::RequiresAttention, BadgeProfile::Standard) => "CRITICAL",
            (Badge::RequiresAttention, BadgeProfile::Momentum) => "REQUIRES ATTENTION",
        }
    }
}

/// Per-axis weights for the overall score (sum to 1.0)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub clarity: f64,
    pub credibility: f64,
    pub visibility: f64,
}

impl ScoreWeights {
    pub const BALANCED: ScoreWeights = ScoreWeights {
        clarity: 0.33,
        credibility: 0.33,
        visibility: 0.34,
    };

    pub fn sum(&self) -> f64 {
        self.clarity + self.credibility + self.visibility
    }
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            clarity: 0.35,
            credibility: 0.35,
            visibility: 0.30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreReport {
    pub clarity: u8,
    pub credibility: u8,
    pub visibility: u8,
    pub overall: u8,
    pub badge: Badge,
    pub badge_label: String,
    pub interpretation: String,
    pub summary: String,
    pub actions: Vec<String>,
}
