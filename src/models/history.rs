use super::crop::Season;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QualityGrade {
    Excellent,
    Good,
    Average,
    Poor,
}

impl QualityGrade {
    pub fn as_str(&self) -> &'static str {
        match self {
            QualityGrade::Excellent => "excellent",
            QualityGrade::Good => "good",
            QualityGrade::Average => "average",
            QualityGrade::Poor => "poor",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "excellent" => Some(QualityGrade::Excellent),
            "good" => Some(QualityGrade::Good),
            "average" => Some(QualityGrade::Average),
            "poor" => Some(QualityGrade::Poor),
            _ => None,
        }
    }
}

impl std::fmt::Display for QualityGrade {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One realized harvest for one crop in one season/year. Read-only input to
/// the scoring engine; the engine never writes these.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HistoricalRecord {
    pub id: Option<i64>,
    pub crop: String,
    pub season: Season,
    pub year: i32,
    pub yield_t_ha: f64,
    pub quality: QualityGrade,
    pub created_at: DateTime<Utc>,
}

impl HistoricalRecord {
    pub fn new(
        crop: impl Into<String>,
        season: Season,
        year: i32,
        yield_t_ha: f64,
        quality: QualityGrade,
    ) -> Self {
        Self {
            id: None,
            crop: crop.into(),
            season,
            year,
            yield_t_ha,
            quality,
            created_at: Utc::now(),
        }
    }
}
