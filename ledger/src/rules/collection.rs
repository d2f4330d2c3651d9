//! Collection rules: species geo-fence and harvest season.
//!
//! The two checks are deliberately asymmetric and must stay that way:
//!
//! - the geo-fence is **fatal**: a collection recorded outside the
//!   species' approved region is rejected outright,
//! - the season window is **advisory**: an out-of-season harvest still
//!   commits, but the transaction is flagged with a warning.

use crate::ledger::error::ValidationError;
use crate::types::{CollectionEvent, month_of_unix_millis};

use super::RuleWarning;
use super::config::{RulesConfig, SpeciesProfile};

/// Rule checker for collection events.
#[derive(Clone, Debug)]
pub struct CollectionRules {
    profiles: Vec<SpeciesProfile>,
}

impl CollectionRules {
    /// Constructs the checker from the configured species profiles.
    pub fn new(cfg: &RulesConfig) -> Self {
        Self {
            profiles: cfg.profiles.clone(),
        }
    }

    fn profile_for(&self, species: &str) -> Option<&SpeciesProfile> {
        self.profiles
            .iter()
            .find(|p| p.species.eq_ignore_ascii_case(species))
    }

    /// Validates a collection event.
    ///
    /// Species without a configured profile are accepted unconstrained.
    pub fn check(&self, ev: &CollectionEvent) -> Result<Vec<RuleWarning>, ValidationError> {
        let Some(profile) = self.profile_for(&ev.species) else {
            return Ok(Vec::new());
        };

        if !profile.fence.contains(&ev.gps) {
            return Err(ValidationError::OutOfRegion {
                species: ev.species.clone(),
                lat: ev.gps.lat,
                lng: ev.gps.lng,
            });
        }

        let mut warnings = Vec::new();
        if let Some(month) = month_of_unix_millis(ev.harvested_at) {
            if !profile.harvest_months.contains(&month) {
                warnings.push(RuleWarning::OutOfSeason {
                    species: ev.species.clone(),
                    month,
                    allowed_months: profile.harvest_months.clone(),
                });
            }
        }

        Ok(warnings)
    }
}
