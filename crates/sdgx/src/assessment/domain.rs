use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of UN Sustainable Development Goals tracked by the assessment.
pub const INDICATOR_COUNT: u8 = 17;

/// Highest value on the maturity scale.
pub const SCALE_MAX: u8 = 4;

/// A single SDG goal ("ODD") tracked as a scorable dimension.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct IndicatorId(u8);

impl IndicatorId {
    pub const fn new(raw: u8) -> Option<Self> {
        if raw >= 1 && raw <= INDICATOR_COUNT {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    pub fn label(self) -> String {
        format!("ODD {}", self.0)
    }
}

impl TryFrom<u8> for IndicatorId {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(DomainError::IndicatorOutOfRange(value))
    }
}

impl From<IndicatorId> for u8 {
    fn from(value: IndicatorId) -> Self {
        value.0
    }
}

impl fmt::Display for IndicatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ODD {}", self.0)
    }
}

/// Stable identifier of a questionnaire item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId(pub u32);

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Q{}", self.0)
    }
}

/// Selected answer on the 0..=4 maturity scale. `0` means "not applicable".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct AnswerValue(u8);

impl AnswerValue {
    pub const NOT_APPLICABLE: Self = Self(0);

    pub const fn new(raw: u8) -> Option<Self> {
        if raw <= SCALE_MAX {
            Some(Self(raw))
        } else {
            None
        }
    }

    pub const fn get(self) -> u8 {
        self.0
    }

    /// Whether the value contributes to aggregation.
    pub const fn is_scored(self) -> bool {
        self.0 != 0
    }

    /// Answers of 1 or 2 call for a corrective recommendation.
    pub const fn needs_action(self) -> bool {
        matches!(self.0, 1 | 2)
    }
}

impl TryFrom<u8> for AnswerValue {
    type Error = DomainError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(DomainError::AnswerOutOfRange(value))
    }
}

impl From<AnswerValue> for u8 {
    fn from(value: AnswerValue) -> Self {
        value.0
    }
}

/// Qualitative banding of an average. Boundary values belong to the lower band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScoreBand {
    Critical,
    Low,
    Moderate,
    Good,
}

impl ScoreBand {
    pub const CRITICAL_CEILING: f64 = 1.5;
    pub const LOW_CEILING: f64 = 2.5;
    pub const MODERATE_CEILING: f64 = 3.5;

    pub fn classify(value: f64) -> Self {
        if value <= Self::CRITICAL_CEILING {
            Self::Critical
        } else if value <= Self::LOW_CEILING {
            Self::Low
        } else if value <= Self::MODERATE_CEILING {
            Self::Moderate
        } else {
            Self::Good
        }
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Critical => "Critical",
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Good => "Good",
        }
    }

    pub const fn color(self) -> &'static str {
        match self {
            Self::Critical => "#ef4444",
            Self::Low => "#f97316",
            Self::Moderate => "#eab308",
            Self::Good => "#22c55e",
        }
    }

    /// Critical and low bands sit under the "moderate" threshold.
    pub const fn is_underperforming(self) -> bool {
        matches!(self, Self::Critical | Self::Low)
    }
}

/// Workflow steps of the assessment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stage {
    Welcome,
    About,
    Identity,
    Questionnaire,
    Results,
    Priorities,
    CitizenIdeas,
    Contact,
}

impl Stage {
    pub const fn ordered() -> [Self; 8] {
        [
            Self::Welcome,
            Self::About,
            Self::Identity,
            Self::Questionnaire,
            Self::Results,
            Self::Priorities,
            Self::CitizenIdeas,
            Self::Contact,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Welcome => "Welcome",
            Self::About => "About",
            Self::Identity => "Identity",
            Self::Questionnaire => "Questionnaire",
            Self::Results => "Results",
            Self::Priorities => "Priorities",
            Self::CitizenIdeas => "Citizen Ideas",
            Self::Contact => "Contact",
        }
    }

    /// Stages that require a complete identity record.
    pub const fn requires_identity(self) -> bool {
        matches!(
            self,
            Self::Questionnaire | Self::Results | Self::Priorities | Self::CitizenIdeas
        )
    }

    /// Stages that show derived scores.
    pub const fn shows_scores(self) -> bool {
        matches!(self, Self::Results | Self::Priorities | Self::CitizenIdeas)
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "welcome" => Some(Self::Welcome),
            "about" => Some(Self::About),
            "identity" => Some(Self::Identity),
            "questionnaire" => Some(Self::Questionnaire),
            "results" => Some(Self::Results),
            "priorities" => Some(Self::Priorities),
            "citizen_ideas" | "ideas" => Some(Self::CitizenIdeas),
            "contact" => Some(Self::Contact),
            _ => None,
        }
    }
}

/// Municipality details captured by the identity form.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IdentityRecord {
    #[serde(default)]
    pub municipality_name: String,
    #[serde(default)]
    pub official_email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub population: Option<u32>,
}

impl IdentityRecord {
    pub fn is_complete(&self) -> bool {
        self.missing_fields().is_empty()
    }

    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.municipality_name.trim().is_empty() {
            missing.push("municipality_name");
        }
        if self.official_email.trim().is_empty() {
            missing.push("official_email");
        }
        missing
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("indicator {0} is outside 1..=17")]
    IndicatorOutOfRange(u8),
    #[error("answer value {0} is outside 0..=4")]
    AnswerOutOfRange(u8),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn banding_assigns_boundaries_to_lower_band() {
        assert_eq!(ScoreBand::classify(1.5), ScoreBand::Critical);
        assert_eq!(ScoreBand::classify(1.51), ScoreBand::Low);
        assert_eq!(ScoreBand::classify(2.5), ScoreBand::Low);
        assert_eq!(ScoreBand::classify(3.5), ScoreBand::Moderate);
        assert_eq!(ScoreBand::classify(3.51), ScoreBand::Good);
        assert_eq!(ScoreBand::classify(4.0), ScoreBand::Good);
    }

    #[test]
    fn indicator_ids_reject_out_of_range_values() {
        assert!(IndicatorId::new(0).is_none());
        assert!(IndicatorId::new(18).is_none());
        assert_eq!(IndicatorId::new(17).map(IndicatorId::get), Some(17));
        assert!(serde_json::from_str::<IndicatorId>("18").is_err());
    }

    #[test]
    fn answer_values_track_sentinel_and_action_range() {
        assert!(!AnswerValue::NOT_APPLICABLE.is_scored());
        let two = AnswerValue::new(2).expect("valid answer");
        assert!(two.is_scored());
        assert!(two.needs_action());
        assert!(!AnswerValue::new(3).expect("valid answer").needs_action());
        assert!(AnswerValue::new(5).is_none());
    }

    #[test]
    fn identity_completeness_ignores_whitespace() {
        let identity = IdentityRecord {
            municipality_name: "   ".to_string(),
            official_email: "a@b.com".to_string(),
            ..IdentityRecord::default()
        };
        assert!(!identity.is_complete());
        assert_eq!(identity.missing_fields(), vec!["municipality_name"]);
    }

    #[test]
    fn stage_parse_accepts_kebab_and_snake_case() {
        assert_eq!(Stage::parse("citizen-ideas"), Some(Stage::CitizenIdeas));
        assert_eq!(Stage::parse(" Welcome "), Some(Stage::Welcome));
        assert_eq!(Stage::parse("unknown"), None);
    }
}
