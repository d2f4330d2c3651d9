//! Configuration for the per-transaction-type business rules.
//!
//! All numeric limits (regulatory ceilings/floors, hard-fail bounds,
//! optimal bands) and all species cultivation profiles (geo-fence
//! bounding boxes, valid harvest months) live here so they can be tuned
//! per deployment or per species without touching rule code.

use serde::{Deserialize, Serialize};

use crate::types::GpsPoint;

/// Numeric thresholds applied to quality test measurements.
///
/// `pesticide` / `heavy_metals` ceilings are hard limits: any breach
/// derives a `FAILED` status. Moisture has three nested bands:
///
/// - outside `[hard_min, hard_max]` → `FAILED`,
/// - outside `[regulatory_min, regulatory_max]` → `WARNING` (recorded),
/// - inside the regulatory band but outside `[optimal_min, optimal_max]`
///   → `WARNING`,
/// - inside the optimal band → `PASSED`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Maximum allowed pesticide residue, ppm.
    pub pesticide_max_ppm: f64,
    /// Maximum allowed heavy-metals concentration, ppm.
    pub heavy_metals_max_ppm: f64,
    /// Regulatory moisture floor, percent.
    pub moisture_regulatory_min_pct: f64,
    /// Regulatory moisture ceiling, percent.
    pub moisture_regulatory_max_pct: f64,
    /// Moisture below this fails outright, percent.
    pub moisture_hard_min_pct: f64,
    /// Moisture above this fails outright, percent.
    pub moisture_hard_max_pct: f64,
    /// Lower edge of the optimal moisture band, percent.
    pub moisture_optimal_min_pct: f64,
    /// Upper edge of the optimal moisture band, percent.
    pub moisture_optimal_max_pct: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            pesticide_max_ppm: 0.1,
            heavy_metals_max_ppm: 0.05,
            moisture_regulatory_min_pct: 8.0,
            moisture_regulatory_max_pct: 20.0,
            moisture_hard_min_pct: 5.0,
            moisture_hard_max_pct: 25.0,
            moisture_optimal_min_pct: 10.0,
            moisture_optimal_max_pct: 15.0,
        }
    }
}

/// Axis-aligned geographic bounding box.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GeoFence {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl GeoFence {
    /// `true` if the point lies inside (or on the edge of) the box.
    pub fn contains(&self, point: &GpsPoint) -> bool {
        point.lat >= self.min_lat
            && point.lat <= self.max_lat
            && point.lng >= self.min_lng
            && point.lng <= self.max_lng
    }
}

/// Cultivation profile for one herb species.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SpeciesProfile {
    /// Species name; matched case-insensitively.
    pub species: String,
    /// Approved cultivation region.
    pub fence: GeoFence,
    /// Calendar months (1..=12) in which harvest is in season.
    pub harvest_months: Vec<u32>,
}

/// Full rule configuration: thresholds plus species profiles.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RulesConfig {
    pub quality: QualityThresholds,
    pub profiles: Vec<SpeciesProfile>,
}

impl RulesConfig {
    /// Looks up the cultivation profile for a species, if one is known.
    ///
    /// Species without a profile are unconstrained: no geo-fence and no
    /// season window apply to them.
    pub fn profile_for(&self, species: &str) -> Option<&SpeciesProfile> {
        self.profiles
            .iter()
            .find(|p| p.species.eq_ignore_ascii_case(species))
    }
}

impl Default for RulesConfig {
    fn default() -> Self {
        Self {
            quality: QualityThresholds::default(),
            profiles: builtin_profiles(),
        }
    }
}

/// Built-in cultivation profiles for the species the prototype tracks.
///
/// Bounding boxes are coarse state-level approximations; harvest months
/// follow standard Ayurvedic collection calendars.
pub fn builtin_profiles() -> Vec<SpeciesProfile> {
    vec![
        // Rajasthan
        SpeciesProfile {
            species: "Ashwagandha".to_string(),
            fence: GeoFence {
                min_lat: 23.0,
                max_lat: 30.2,
                min_lng: 69.3,
                max_lng: 78.3,
            },
            harvest_months: vec![10, 11, 12, 1, 2],
        },
        // Kerala backwater belt
        SpeciesProfile {
            species: "Brahmi".to_string(),
            fence: GeoFence {
                min_lat: 8.2,
                max_lat: 12.8,
                min_lng: 74.8,
                max_lng: 77.4,
            },
            harvest_months: vec![6, 7, 8, 9],
        },
        // Indo-Gangetic plain
        SpeciesProfile {
            species: "Tulsi".to_string(),
            fence: GeoFence {
                min_lat: 23.8,
                max_lat: 28.6,
                min_lng: 77.0,
                max_lng: 84.6,
            },
            harvest_months: vec![9, 10, 11],
        },
        // Central India
        SpeciesProfile {
            species: "Neem".to_string(),
            fence: GeoFence {
                min_lat: 17.8,
                max_lat: 26.8,
                min_lng: 74.0,
                max_lng: 84.4,
            },
            harvest_months: vec![3, 4, 5, 6],
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_thresholds_match_regulatory_limits() {
        let t = QualityThresholds::default();
        assert_eq!(t.pesticide_max_ppm, 0.1);
        assert_eq!(t.heavy_metals_max_ppm, 0.05);
        assert_eq!(t.moisture_regulatory_min_pct, 8.0);
        assert_eq!(t.moisture_regulatory_max_pct, 20.0);
    }

    #[test]
    fn profile_lookup_is_case_insensitive() {
        let cfg = RulesConfig::default();
        assert!(cfg.profile_for("ashwagandha").is_some());
        assert!(cfg.profile_for("ASHWAGANDHA").is_some());
        assert!(cfg.profile_for("Unknown Herb").is_none());
    }

    #[test]
    fn ashwagandha_fence_covers_jaipur_but_not_the_ocean() {
        let cfg = RulesConfig::default();
        let fence = cfg.profile_for("Ashwagandha").expect("profile").fence;

        let jaipur = GpsPoint {
            lat: 26.9124,
            lng: 75.7873,
            altitude: None,
        };
        let nowhere = GpsPoint {
            lat: 10.0,
            lng: 10.0,
            altitude: None,
        };

        assert!(fence.contains(&jaipur));
        assert!(!fence.contains(&nowhere));
    }
}
