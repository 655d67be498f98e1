use super::environmental::SoilTexture;
use serde::{Deserialize, Serialize};

/// Indian cropping seasons plus the two year-round classes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Season {
    Kharif,
    Rabi,
    Zaid,
    Perennial,
    Annual,
}

impl Season {
    pub fn as_str(&self) -> &'static str {
        match self {
            Season::Kharif => "kharif",
            Season::Rabi => "rabi",
            Season::Zaid => "zaid",
            Season::Perennial => "perennial",
            Season::Annual => "annual",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "kharif" => Some(Season::Kharif),
            "rabi" => Some(Season::Rabi),
            "zaid" => Some(Season::Zaid),
            "perennial" => Some(Season::Perennial),
            "annual" => Some(Season::Annual),
            _ => None,
        }
    }
}

impl std::fmt::Display for Season {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WaterRequirement {
    Low,
    Medium,
    High,
}

/// Static reference data for one crop. Process-wide, read-only.
#[derive(Debug, Clone)]
pub struct CropProfile {
    pub name: &'static str,
    /// Ordered candidate varieties; the first is the recommended default.
    pub varieties: &'static [&'static str],
    pub water_requirement: WaterRequirement,
    pub preferred_textures: &'static [SoilTexture],
    /// Viable temperature range [min, max] in degrees C, inclusive.
    pub temperature_range_c: (f64, f64),
    pub seasons: &'static [Season],
    pub profit_margin: f64,
    /// Baseline yield in tonnes per hectare.
    pub base_yield_t_ha: f64,
    /// Market price in rupees per tonne.
    pub market_price_per_tonne: f64,
    /// Production cost in rupees per hectare.
    pub production_cost_per_ha: f64,
    /// Crops with historically volatile market prices carry extra risk.
    pub market_volatile: bool,
}

impl CropProfile {
    pub fn grows_in(&self, season: Season) -> bool {
        self.seasons.contains(&season)
    }

    pub fn default_variety(&self) -> &'static str {
        self.varieties.first().copied().unwrap_or(self.name)
    }
}

const KNOWLEDGE_BASE: &[CropProfile] = &[
    CropProfile {
        name: "Rice",
        varieties: &["Basmati", "Jasmine", "Arborio"],
        water_requirement: WaterRequirement::High,
        preferred_textures: &[SoilTexture::Clay, SoilTexture::Loamy],
        temperature_range_c: (20.0, 35.0),
        seasons: &[Season::Kharif],
        profit_margin: 0.25,
        base_yield_t_ha: 4.5,
        market_price_per_tonne: 20000.0,
        production_cost_per_ha: 25000.0,
        market_volatile: false,
    },
    CropProfile {
        name: "Wheat",
        varieties: &["Durum", "Hard Red", "Soft White"],
        water_requirement: WaterRequirement::Medium,
        preferred_textures: &[SoilTexture::Loamy, SoilTexture::ClayLoam],
        temperature_range_c: (15.0, 25.0),
        seasons: &[Season::Rabi],
        profit_margin: 0.30,
        base_yield_t_ha: 3.2,
        market_price_per_tonne: 18000.0,
        production_cost_per_ha: 20000.0,
        market_volatile: false,
    },
    CropProfile {
        name: "Corn",
        varieties: &["Sweet Corn", "Dent Corn", "Flint Corn"],
        water_requirement: WaterRequirement::Medium,
        preferred_textures: &[SoilTexture::Loamy, SoilTexture::SandyLoam],
        temperature_range_c: (18.0, 32.0),
        seasons: &[Season::Kharif, Season::Rabi],
        profit_margin: 0.28,
        base_yield_t_ha: 5.8,
        market_price_per_tonne: 15000.0,
        production_cost_per_ha: 22000.0,
        market_volatile: false,
    },
    CropProfile {
        name: "Soybean",
        varieties: &["Glycine Max", "Edamame"],
        water_requirement: WaterRequirement::Medium,
        preferred_textures: &[SoilTexture::Loamy, SoilTexture::ClayLoam],
        temperature_range_c: (20.0, 30.0),
        seasons: &[Season::Kharif],
        profit_margin: 0.35,
        base_yield_t_ha: 2.1,
        market_price_per_tonne: 35000.0,
        production_cost_per_ha: 18000.0,
        market_volatile: true,
    },
    CropProfile {
        name: "Cotton",
        varieties: &["Pima", "Upland", "Organic"],
        water_requirement: WaterRequirement::High,
        preferred_textures: &[SoilTexture::SandyLoam, SoilTexture::ClayLoam],
        temperature_range_c: (25.0, 35.0),
        seasons: &[Season::Kharif],
        profit_margin: 0.40,
        base_yield_t_ha: 1.8,
        market_price_per_tonne: 45000.0,
        production_cost_per_ha: 30000.0,
        market_volatile: true,
    },
];

/// The static crop knowledge base, in declaration order. The order is the
/// tie-break for equal suitability scores.
pub fn knowledge_base() -> &'static [CropProfile] {
    KNOWLEDGE_BASE
}

/// Per-crop agronomic tips. Crops without an entry get a generic list.
pub fn best_practices(crop_name: &str) -> Vec<String> {
    let tips: &[&str] = match crop_name {
        "Rice" => &[
            "Maintain water level at 2-5 cm during vegetative stage",
            "Apply nitrogen in 3 splits",
            "Use certified seeds for better yield",
        ],
        "Wheat" => &[
            "Sow at optimal time (November-December)",
            "Maintain proper row spacing (20-23 cm)",
            "Apply balanced fertilization",
        ],
        "Corn" => &[
            "Plant at 60cm x 20cm spacing",
            "Ensure adequate drainage",
            "Monitor for pest attacks regularly",
        ],
        "Soybean" => &[
            "Inoculate seeds with Rhizobium",
            "Maintain soil pH between 6.0-7.0",
            "Practice crop rotation",
        ],
        "Cotton" => &[
            "Use drip irrigation for water efficiency",
            "Monitor for bollworm attacks",
            "Maintain plant population of 1-1.5 lakh/hectare",
        ],
        _ => &[
            "Follow recommended spacing",
            "Apply balanced fertilization",
            "Monitor for pests and diseases",
        ],
    };
    tips.iter().map(|t| t.to_string()).collect()
}
