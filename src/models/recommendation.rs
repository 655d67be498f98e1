use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "low",
            RiskLevel::Medium => "medium",
            RiskLevel::High => "high",
        }
    }

    /// Map an additive risk score to a level. Exact cutoffs: >=3 high,
    /// >=1 medium, else low.
    pub fn from_score(score: u32) -> Self {
        if score >= 3 {
            RiskLevel::High
        } else if score >= 1 {
            RiskLevel::Medium
        } else {
            RiskLevel::Low
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One scored crop, produced fresh per request and never persisted by the
/// engine itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CropRecommendation {
    pub crop: String,
    pub variety: String,
    /// Suitability score in [0, 100].
    pub suitability: u8,
    /// Expected yield in tonnes per hectare, rounded to 2 decimal places.
    pub expected_yield_t_ha: f64,
    /// Whole-rupee profit over the full farm. May be negative.
    pub profitability: i64,
    pub risk_level: RiskLevel,
    pub reasons: Vec<String>,
    pub best_practices: Vec<String>,
}
