//! Safety router: assigns a risk tier before any oracle call is made.

mod detection;

use serde::{Deserialize, Serialize};

pub use detection::{detect_category, detect_mood};

/// Phrases that force the extreme tier regardless of mood or category.
pub const SELF_HARM_PHRASES: [&str; 4] = ["suicide", "kill myself", "want to die", "end my life"];

const PANIC_SCORE_THRESHOLD: u8 = 8;
const MEDIUM_SCORE_THRESHOLD: u8 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskTier {
    Low,
    Medium,
    High,
    Extreme,
}

impl RiskTier {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Extreme => "extreme",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mood {
    Panic,
    Stress,
    Neutral,
    Calm,
}

impl Mood {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Panic => "panic",
            Self::Stress => "stress",
            Self::Neutral => "neutral",
            Self::Calm => "calm",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisDomain {
    Financial,
    Medical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrisisCategory {
    #[serde(alias = "fraud")]
    FraudShock,
    #[serde(alias = "income")]
    IncomeShock,
    #[serde(alias = "debt")]
    DebtShock,
    #[serde(alias = "asset")]
    AssetShock,
    #[serde(alias = "expense")]
    ExpenseShock,
    Cardiac,
    Respiratory,
    Neurological,
    Trauma,
    Allergic,
    Fever,
    Poisoning,
    Pain,
    Unclassified,
}

impl CrisisCategory {
    pub fn severity_score(self) -> u8 {
        match self {
            Self::FraudShock => 9,
            Self::IncomeShock => 8,
            Self::DebtShock | Self::AssetShock => 7,
            Self::ExpenseShock => 6,
            Self::Cardiac | Self::Respiratory | Self::Poisoning => 9,
            Self::Neurological | Self::Trauma => 8,
            Self::Allergic => 7,
            Self::Pain => 6,
            Self::Fever | Self::Unclassified => 5,
        }
    }

    pub fn domain(self) -> CrisisDomain {
        match self {
            Self::FraudShock
            | Self::IncomeShock
            | Self::DebtShock
            | Self::AssetShock
            | Self::ExpenseShock => CrisisDomain::Financial,
            _ => CrisisDomain::Medical,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::FraudShock => "fraud_shock",
            Self::IncomeShock => "income_shock",
            Self::DebtShock => "debt_shock",
            Self::AssetShock => "asset_shock",
            Self::ExpenseShock => "expense_shock",
            Self::Cardiac => "cardiac",
            Self::Respiratory => "respiratory",
            Self::Neurological => "neurological",
            Self::Trauma => "trauma",
            Self::Allergic => "allergic",
            Self::Fever => "fever",
            Self::Poisoning => "poisoning",
            Self::Pain => "pain",
            Self::Unclassified => "unclassified",
        }
    }
}

pub fn mentions_self_harm(text: &str) -> bool {
    let lowered = text.to_lowercase();
    SELF_HARM_PHRASES
        .iter()
        .any(|phrase| lowered.contains(phrase))
}

/// Self-harm phrases win over everything else. Otherwise the tier follows the
/// category score, raised to `High` only when the user is panicking.
pub fn route(text: &str, mood: Option<Mood>, category: CrisisCategory) -> RiskTier {
    let score = category.severity_score();
    let tier = if mentions_self_harm(text) {
        RiskTier::Extreme
    } else if mood == Some(Mood::Panic) && score >= PANIC_SCORE_THRESHOLD {
        RiskTier::High
    } else if score >= MEDIUM_SCORE_THRESHOLD {
        RiskTier::Medium
    } else {
        RiskTier::Low
    };

    tracing::debug!(
        target: "router",
        category = category.as_str(),
        mood = mood.map(Mood::as_str).unwrap_or("none"),
        score = score,
        tier = tier.as_str(),
        "risk_tier_assigned"
    );
    tier
}
