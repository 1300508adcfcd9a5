use serde::{Deserialize, Serialize};

/// Coarse match bucket assigned by scoring: 1 = high, 2 = strong, 3 = potential.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub enum Tier {
    High,
    Strong,
    Potential,
}

impl Tier {
    pub const ALL: [Tier; 3] = [Tier::High, Tier::Strong, Tier::Potential];

    pub fn as_u8(self) -> u8 {
        match self {
            Tier::High => 1,
            Tier::Strong => 2,
            Tier::Potential => 3,
        }
    }
}

impl TryFrom<u8> for Tier {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Tier::High),
            2 => Ok(Tier::Strong),
            3 => Ok(Tier::Potential),
            other => Err(format!("tier must be 1, 2, or 3, got {other}")),
        }
    }
}

impl From<Tier> for u8 {
    fn from(tier: Tier) -> Self {
        tier.as_u8()
    }
}

/// Per-professor draft generation status.
/// Transitions only idle → loading → {completed | idle-on-failure}.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DraftStatus {
    #[default]
    Idle,
    Loading,
    Completed,
}

/// A generated outreach email. Immutable once produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EmailDraft {
    pub subject: String,
    pub body: String,
}

/// Provenance attached to a discovery result set, not to individual
/// professors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceRef {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
}

/// A faculty member discovered for the target department.
///
/// Discovery supplies name/title/interests/bio; match scoring enriches the
/// record in place; bulk generation attaches a per-professor draft. Field
/// names stay camelCase on the wire — they are the AI contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Professor {
    pub name: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub research_interests: Vec<String>,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_score: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tier: Option<Tier>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_reason: Option<String>,
    #[serde(default)]
    pub draft_status: DraftStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_draft: Option<EmailDraft>,
}

impl Professor {
    /// A bare discovery record, before any enrichment.
    pub fn new(name: impl Into<String>) -> Self {
        Professor {
            name: name.into(),
            title: String::new(),
            research_interests: Vec::new(),
            bio: String::new(),
            match_score: None,
            tier: None,
            match_reason: None,
            draft_status: DraftStatus::Idle,
            generated_draft: None,
        }
    }
}
