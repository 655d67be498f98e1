use crate::error::{AdvisorError, Result};
use crate::models::{
    best_practices, knowledge_base, CropProfile, CropRecommendation, EnvironmentalSnapshot,
    HistoricalRecord, QualityGrade, RiskLevel, Season, WaterRequirement,
};

// Suitability weights. They sum to 100; the clamp in `suitability` is a
// safety invariant, not a normal-path behavior.
const WEIGHT_SOIL: u8 = 30;
const WEIGHT_TEMPERATURE: u8 = 25;
const WEIGHT_WATER: u8 = 20;
const WEIGHT_CHEMISTRY: u8 = 15;
const WEIGHT_FARM_SIZE: u8 = 10;

const PH_OPTIMAL_MIN: f64 = 6.0;
const PH_OPTIMAL_MAX: f64 = 7.5;

/// Score every season-eligible crop in the knowledge base against the
/// snapshot, the farm size, and the farmer's history.
///
/// Pure function of its inputs: no I/O, no hidden state, no randomness.
/// Returns recommendations sorted by suitability descending; ties keep
/// knowledge-base order. An empty result means no crop matches the season.
pub fn recommend_crops(
    snapshot: &EnvironmentalSnapshot,
    season: Season,
    farm_size_ha: f64,
    history: &[HistoricalRecord],
) -> Result<Vec<CropRecommendation>> {
    if !farm_size_ha.is_finite() || farm_size_ha <= 0.0 {
        return Err(AdvisorError::InvalidInput(format!(
            "Farm size must be a positive number of hectares, got {}",
            farm_size_ha
        )));
    }

    let mut recommendations: Vec<CropRecommendation> = knowledge_base()
        .iter()
        .filter(|crop| crop.grows_in(season))
        .map(|crop| score_crop(crop, snapshot, farm_size_ha, history))
        .collect();

    // sort_by is stable, so equal scores preserve knowledge-base order
    recommendations.sort_by(|a, b| b.suitability.cmp(&a.suitability));

    Ok(recommendations)
}

fn score_crop(
    crop: &CropProfile,
    snapshot: &EnvironmentalSnapshot,
    farm_size_ha: f64,
    history: &[HistoricalRecord],
) -> CropRecommendation {
    let crop_history: Vec<&HistoricalRecord> =
        history.iter().filter(|r| r.crop == crop.name).collect();

    let suitability = suitability(crop, snapshot, farm_size_ha);
    let expected_yield = expected_yield(crop, snapshot, &crop_history);
    let profitability = profitability(
        expected_yield,
        farm_size_ha,
        crop.market_price_per_tonne,
        crop.production_cost_per_ha,
    );
    let risk_level = risk_level(crop, snapshot, &crop_history);

    CropRecommendation {
        crop: crop.name.to_string(),
        variety: crop.default_variety().to_string(),
        suitability,
        expected_yield_t_ha: expected_yield,
        profitability,
        risk_level,
        reasons: reasons(crop, snapshot, suitability),
        best_practices: best_practices(crop.name),
    }
}

fn suitability(crop: &CropProfile, snapshot: &EnvironmentalSnapshot, farm_size_ha: f64) -> u8 {
    let mut score: u8 = 0;

    // Soil compatibility
    if crop.preferred_textures.contains(&snapshot.soil.texture) {
        score += WEIGHT_SOIL;
    } else {
        score += WEIGHT_SOIL / 2;
    }

    // Temperature compatibility
    let temp = snapshot.weather.temperature_c;
    let (min, max) = crop.temperature_range_c;
    if (min..=max).contains(&temp) {
        score += WEIGHT_TEMPERATURE;
    } else {
        score += 10; // 40% of weight
    }

    // Water availability
    let humidity = snapshot.weather.humidity_percent;
    let water_ok = match crop.water_requirement {
        WaterRequirement::High => humidity > 70.0,
        WaterRequirement::Medium => humidity > 50.0,
        WaterRequirement::Low => true,
    };
    if water_ok {
        score += WEIGHT_WATER;
    } else {
        score += WEIGHT_WATER / 2;
    }

    // Soil chemistry
    if ph_optimal(snapshot.soil.ph) {
        score += WEIGHT_CHEMISTRY;
    } else {
        score += 8; // ~53% of weight
    }

    // Farm size viability: below one hectare loses half the weight
    if farm_size_ha >= 1.0 {
        score += WEIGHT_FARM_SIZE;
    } else {
        score += WEIGHT_FARM_SIZE / 2;
    }

    score.min(100)
}

fn expected_yield(
    crop: &CropProfile,
    snapshot: &EnvironmentalSnapshot,
    crop_history: &[&HistoricalRecord],
) -> f64 {
    let mut expected = crop.base_yield_t_ha;

    if ph_optimal(snapshot.soil.ph) {
        expected *= 1.10;
    }
    if snapshot.weather.humidity_percent > 60.0 {
        expected *= 1.05;
    }
    if snapshot.soil.organic_matter_percent > 3.0 {
        expected *= 1.15;
    }

    // Smooth against the farmer's own record for this crop. A plain
    // arithmetic mean, deliberately recency-agnostic.
    if !crop_history.is_empty() {
        let mean_historical = crop_history.iter().map(|r| r.yield_t_ha).sum::<f64>()
            / crop_history.len() as f64;
        expected = (expected + mean_historical) / 2.0;
    }

    round2(expected)
}

fn profitability(
    expected_yield_t_ha: f64,
    farm_size_ha: f64,
    price_per_tonne: f64,
    cost_per_ha: f64,
) -> i64 {
    let revenue = expected_yield_t_ha * farm_size_ha * price_per_tonne;
    let cost = cost_per_ha * farm_size_ha;
    (revenue - cost).round() as i64
}

fn risk_level(
    crop: &CropProfile,
    snapshot: &EnvironmentalSnapshot,
    crop_history: &[&HistoricalRecord],
) -> RiskLevel {
    let mut risk_score: u32 = 0;

    let temp = snapshot.weather.temperature_c;
    if temp > 35.0 || temp < 10.0 {
        risk_score += 2;
    }

    if !crop_history.is_empty() {
        let poor = crop_history
            .iter()
            .filter(|r| r.quality == QualityGrade::Poor)
            .count();
        if poor as f64 > crop_history.len() as f64 * 0.3 {
            risk_score += 2;
        }
    }

    if crop.market_volatile {
        risk_score += 1;
    }

    RiskLevel::from_score(risk_score)
}

fn reasons(crop: &CropProfile, snapshot: &EnvironmentalSnapshot, suitability: u8) -> Vec<String> {
    let mut reasons = Vec::new();

    if crop.preferred_textures.contains(&snapshot.soil.texture) {
        reasons.push(format!(
            "Excellent soil compatibility with {} soil",
            snapshot.soil.texture
        ));
    }
    if snapshot.weather.humidity_percent > 60.0 {
        reasons.push("Favorable humidity levels for growth".to_string());
    }
    if suitability > 80 {
        reasons.push("High overall suitability score based on environmental factors".to_string());
    }

    reasons
}

fn ph_optimal(ph: f64) -> bool {
    (PH_OPTIMAL_MIN..=PH_OPTIMAL_MAX).contains(&ph)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        DataOrigin, SoilProperties, SoilTexture, WeatherObservation,
    };
    use chrono::{TimeZone, Utc};

    fn snapshot(temp_c: f64, humidity: f64, ph: f64, texture: SoilTexture, om: f64) -> EnvironmentalSnapshot {
        let fetched_at = Utc.with_ymd_and_hms(2026, 8, 29, 6, 0, 0).unwrap();
        EnvironmentalSnapshot {
            weather: WeatherObservation {
                temperature_c: temp_c,
                humidity_percent: humidity,
                wind_speed_ms: 3.0,
                description: "clear sky".into(),
                forecast: Vec::new(),
                fetched_at,
                origin: DataOrigin::Live,
            },
            soil: SoilProperties {
                ph,
                organic_matter_percent: om,
                nitrogen_percent: 0.15,
                phosphorus_ppm: 35.0,
                potassium_ppm: 125.0,
                sand_percent: 40.0,
                clay_percent: 20.0,
                texture,
                fetched_at,
                origin: DataOrigin::Live,
            },
            satellite: None,
        }
    }

    fn rabi_snapshot() -> EnvironmentalSnapshot {
        snapshot(20.0, 65.0, 6.8, SoilTexture::Loamy, 3.5)
    }

    #[test]
    fn wheat_scores_full_marks_in_ideal_rabi_conditions() {
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();

        assert_eq!(wheat.suitability, 100);
        assert_eq!(wheat.variety, "Durum");
        // 3.2 * 1.10 * 1.05 * 1.15 = 4.2504 -> 4.25
        assert!((wheat.expected_yield_t_ha - 4.25).abs() < 1e-9);
        // 4.25 * 2 * 18000 - 20000 * 2
        assert_eq!(wheat.profitability, 113_000);
        assert_eq!(wheat.risk_level, RiskLevel::Low);
        assert_eq!(wheat.reasons.len(), 3);
    }

    #[test]
    fn season_filter_excludes_off_season_crops() {
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &[]).unwrap();
        let names: Vec<&str> = recs.iter().map(|r| r.crop.as_str()).collect();
        assert_eq!(names.len(), 2);
        assert!(names.contains(&"Wheat"));
        assert!(names.contains(&"Corn"));
        assert!(!names.contains(&"Rice"));
    }

    #[test]
    fn empty_season_yields_empty_list_not_error() {
        let recs = recommend_crops(&rabi_snapshot(), Season::Zaid, 2.0, &[]).unwrap();
        assert!(recs.is_empty());
    }

    #[test]
    fn ties_preserve_knowledge_base_order() {
        // Wheat and Corn both score 100 in the reference rabi conditions;
        // Wheat precedes Corn in the knowledge base.
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &[]).unwrap();
        assert_eq!(recs[0].crop, "Wheat");
        assert_eq!(recs[1].crop, "Corn");
        assert_eq!(recs[0].suitability, recs[1].suitability);
    }

    #[test]
    fn output_sorted_by_suitability_descending() {
        // Clay soil favors Rice over the loam-preferring kharif crops
        let snap = snapshot(28.0, 75.0, 6.5, SoilTexture::Clay, 2.0);
        let recs = recommend_crops(&snap, Season::Kharif, 2.0, &[]).unwrap();
        for pair in recs.windows(2) {
            assert!(pair[0].suitability >= pair[1].suitability);
        }
        assert_eq!(recs[0].crop, "Rice");
    }

    #[test]
    fn suitability_always_within_bounds() {
        let snapshots = [
            snapshot(-5.0, 10.0, 4.0, SoilTexture::Sandy, 0.5),
            snapshot(45.0, 95.0, 9.0, SoilTexture::Clay, 6.0),
            rabi_snapshot(),
        ];
        for snap in &snapshots {
            for season in [Season::Kharif, Season::Rabi] {
                for rec in recommend_crops(snap, season, 0.5, &[]).unwrap() {
                    assert!(rec.suitability <= 100);
                }
            }
        }
    }

    #[test]
    fn unsuitable_conditions_score_partial_weights() {
        // Sandy soil, cold, dry, acidic, tiny plot: every factor at its
        // reduced weight for Wheat: 15 + 10 + 10 + 8 + 5 = 48
        let snap = snapshot(5.0, 30.0, 4.5, SoilTexture::Sandy, 1.0);
        let recs = recommend_crops(&snap, Season::Rabi, 0.5, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.suitability, 48);
    }

    #[test]
    fn dry_air_halves_water_weight_for_medium_requirement() {
        let snap = snapshot(20.0, 10.0, 6.8, SoilTexture::Loamy, 3.5);
        let wheat = &knowledge_base()[1];
        assert_eq!(wheat.name, "Wheat");
        // 30 + 25 + 10 + 15 + 10 = 90
        assert_eq!(suitability(wheat, &snap, 2.0), 90);
    }

    #[test]
    fn low_water_requirement_ignores_humidity() {
        let millet = CropProfile {
            name: "Pearl Millet",
            varieties: &["HHB 67"],
            water_requirement: WaterRequirement::Low,
            preferred_textures: &[SoilTexture::Sandy, SoilTexture::SandyLoam],
            temperature_range_c: (20.0, 35.0),
            seasons: &[Season::Kharif],
            profit_margin: 0.2,
            base_yield_t_ha: 1.2,
            market_price_per_tonne: 22000.0,
            production_cost_per_ha: 12000.0,
            market_volatile: false,
        };
        // 10% humidity still earns the full water weight:
        // 30 + 25 + 20 + 15 + 10 = 100
        let snap = snapshot(25.0, 10.0, 6.8, SoilTexture::Sandy, 3.5);
        assert_eq!(suitability(&millet, &snap, 2.0), 100);
    }

    #[test]
    fn farm_size_below_one_hectare_halves_size_weight() {
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 0.5, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.suitability, 95);
    }

    #[test]
    fn invalid_farm_size_is_rejected() {
        let snap = rabi_snapshot();
        assert!(recommend_crops(&snap, Season::Rabi, 0.0, &[]).is_err());
        assert!(recommend_crops(&snap, Season::Rabi, -1.0, &[]).is_err());
        assert!(recommend_crops(&snap, Season::Rabi, f64::NAN, &[]).is_err());
    }

    #[test]
    fn history_smooths_expected_yield() {
        let history = vec![
            HistoricalRecord::new("Wheat", Season::Rabi, 2024, 3.0, QualityGrade::Good),
            HistoricalRecord::new("Wheat", Season::Rabi, 2023, 2.0, QualityGrade::Average),
            // Rice record must not affect Wheat
            HistoricalRecord::new("Rice", Season::Kharif, 2024, 9.0, QualityGrade::Good),
        ];
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &history).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        // (4.2504 + 2.5) / 2 = 3.3752 -> 3.38
        assert!((wheat.expected_yield_t_ha - 3.38).abs() < 1e-9);
    }

    #[test]
    fn profitability_formula_allows_negative_values() {
        assert_eq!(profitability(1.0, 1.0, 100.0, 5000.0), -4900);
        assert_eq!(profitability(4.25, 2.0, 18000.0, 20000.0), 113_000);
    }

    #[test]
    fn risk_rises_with_extreme_temperature() {
        let hot = snapshot(40.0, 65.0, 6.8, SoilTexture::Loamy, 3.5);
        let recs = recommend_crops(&hot, Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        // +2 for temperature, non-volatile, no history -> medium
        assert_eq!(wheat.risk_level, RiskLevel::Medium);

        let cold = snapshot(5.0, 65.0, 6.8, SoilTexture::Loamy, 3.5);
        let recs = recommend_crops(&cold, Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.risk_level, RiskLevel::Medium);
    }

    #[test]
    fn volatile_crop_with_hot_weather_and_poor_history_is_high_risk() {
        let hot = snapshot(40.0, 75.0, 6.8, SoilTexture::SandyLoam, 3.5);
        let history = vec![
            HistoricalRecord::new("Cotton", Season::Kharif, 2024, 1.0, QualityGrade::Poor),
            HistoricalRecord::new("Cotton", Season::Kharif, 2023, 1.2, QualityGrade::Poor),
        ];
        // +2 temperature, +2 poor history (100% > 30%), +1 volatile -> 5 -> high
        let recs = recommend_crops(&hot, Season::Kharif, 2.0, &history).unwrap();
        let cotton = recs.iter().find(|r| r.crop == "Cotton").unwrap();
        assert_eq!(cotton.risk_level, RiskLevel::High);
    }

    #[test]
    fn volatile_flag_alone_is_medium_risk() {
        let mild = snapshot(25.0, 75.0, 6.8, SoilTexture::Loamy, 3.5);
        let recs = recommend_crops(&mild, Season::Kharif, 2.0, &[]).unwrap();
        let soybean = recs.iter().find(|r| r.crop == "Soybean").unwrap();
        assert_eq!(soybean.risk_level, RiskLevel::Medium);
        let rice = recs.iter().find(|r| r.crop == "Rice").unwrap();
        assert_eq!(rice.risk_level, RiskLevel::Low);
    }

    #[test]
    fn poor_history_below_threshold_adds_no_risk() {
        // 1 poor of 4 records = 25%, under the 30% cutoff
        let history = vec![
            HistoricalRecord::new("Wheat", Season::Rabi, 2024, 3.0, QualityGrade::Poor),
            HistoricalRecord::new("Wheat", Season::Rabi, 2023, 3.1, QualityGrade::Good),
            HistoricalRecord::new("Wheat", Season::Rabi, 2022, 3.2, QualityGrade::Good),
            HistoricalRecord::new("Wheat", Season::Rabi, 2021, 3.3, QualityGrade::Average),
        ];
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &history).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.risk_level, RiskLevel::Low);
    }

    #[test]
    fn reasons_are_gated_and_ordered() {
        // Texture mismatch, low humidity, mediocre score: no reasons
        let snap = snapshot(5.0, 30.0, 4.5, SoilTexture::Sandy, 1.0);
        let recs = recommend_crops(&snap, Season::Rabi, 0.5, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert!(wheat.reasons.is_empty());

        // All three conditions hold and keep their fixed order
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(
            wheat.reasons[0],
            "Excellent soil compatibility with loamy soil"
        );
        assert_eq!(wheat.reasons[1], "Favorable humidity levels for growth");
        assert_eq!(
            wheat.reasons[2],
            "High overall suitability score based on environmental factors"
        );
    }

    #[test]
    fn best_practices_attached_per_crop() {
        let recs = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.best_practices[0], "Sow at optimal time (November-December)");
    }

    #[test]
    fn scoring_is_deterministic() {
        let history = vec![HistoricalRecord::new(
            "Wheat",
            Season::Rabi,
            2024,
            3.0,
            QualityGrade::Good,
        )];
        let first = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &history).unwrap();
        let second = recommend_crops(&rabi_snapshot(), Season::Rabi, 2.0, &history).unwrap();
        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }

    #[test]
    fn temperature_range_is_inclusive() {
        // Exactly at the wheat maximum of 25C keeps the full weight
        let snap = snapshot(25.0, 65.0, 6.8, SoilTexture::Loamy, 3.5);
        let recs = recommend_crops(&snap, Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.suitability, 100);

        let snap = snapshot(25.1, 65.0, 6.8, SoilTexture::Loamy, 3.5);
        let recs = recommend_crops(&snap, Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.suitability, 85);
    }

    #[test]
    fn ph_boundaries_are_inclusive() {
        for ph in [6.0, 7.5] {
            let snap = snapshot(20.0, 65.0, ph, SoilTexture::Loamy, 3.5);
            let recs = recommend_crops(&snap, Season::Rabi, 2.0, &[]).unwrap();
            let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
            assert_eq!(wheat.suitability, 100);
        }
        let snap = snapshot(20.0, 65.0, 5.9, SoilTexture::Loamy, 3.5);
        let recs = recommend_crops(&snap, Season::Rabi, 2.0, &[]).unwrap();
        let wheat = recs.iter().find(|r| r.crop == "Wheat").unwrap();
        assert_eq!(wheat.suitability, 93);
    }
}
