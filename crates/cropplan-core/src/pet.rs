//! Pet entities. Pets contribute base stats plus a linear per-level bonus.

use std::sync::Arc;

use serde::{Deserialize, Serialize};

use cropplan_logic::definitions::{Definitions, PetDefinition};
use cropplan_logic::stats::{stat_value, Stat};

use crate::error::{EngineError, EngineResult};
use crate::record::PetRecord;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pet {
    pub uid: String,
    pub def: Arc<PetDefinition>,
    pub level: u32,
}

impl Pet {
    pub fn from_record(record: &PetRecord, defs: &Definitions) -> EngineResult<Self> {
        let def = defs
            .pet(&record.definition_id)
            .ok_or_else(|| EngineError::UnknownPetDefinition {
                id: record.definition_id.clone(),
            })?;
        Ok(Self {
            uid: record.uid.clone(),
            def: Arc::clone(def),
            level: record.level.min(def.max_level),
        })
    }

    pub fn name(&self) -> &str {
        &self.def.name
    }

    pub fn value(&self, stat: Stat) -> f64 {
        self.breakdown(stat).iter().map(|(_, value)| value).sum()
    }

    /// Named nonzero contributions of this pet, base first.
    pub fn breakdown(&self, stat: Stat) -> Vec<(String, f64)> {
        let mut entries = Vec::new();
        let base = stat_value(&self.def.base_stats, stat);
        if base != 0.0 {
            entries.push(("Base Stats".to_string(), base));
        }
        let per_level = stat_value(&self.def.per_level, stat) * f64::from(self.level);
        if per_level != 0.0 {
            entries.push(("Pet Level".to_string(), per_level));
        }
        entries
    }

    /// Value at the pet's level cap.
    pub fn max_value(&self, stat: Stat) -> f64 {
        stat_value(&self.def.base_stats, stat)
            + stat_value(&self.def.per_level, stat) * f64::from(self.def.max_level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cropplan_logic::definitions::sample_definitions;

    #[test]
    fn level_scales_linearly_and_clamps() {
        let defs = sample_definitions();
        let pet = Pet::from_record(&PetRecord::new("p", "HARVEST_HARE", 60), &defs).unwrap();
        assert_eq!(pet.value(Stat::FarmingFortune), 40.0);
        assert_eq!(pet.max_value(Stat::FarmingFortune), 60.0);

        let over = Pet::from_record(&PetRecord::new("p", "HARVEST_HARE", 500), &defs).unwrap();
        assert_eq!(over.level, 100);
        assert_eq!(over.value(Stat::FarmingFortune), 60.0);
    }

    #[test]
    fn breakdown_names_base_and_level_terms() {
        let defs = sample_definitions();
        let pet = Pet::from_record(&PetRecord::new("p", "HARVEST_HARE", 60), &defs).unwrap();
        let breakdown = pet.breakdown(Stat::FarmingFortune);
        assert_eq!(
            breakdown,
            vec![
                ("Base Stats".to_string(), 10.0),
                ("Pet Level".to_string(), 30.0),
            ]
        );
        let summed: f64 = breakdown.iter().map(|(_, v)| v).sum();
        assert_eq!(summed, pet.value(Stat::FarmingFortune));

        // A stat the pet does not feed yields an empty breakdown.
        assert!(pet.breakdown(Stat::FarmingWisdom).is_empty());

        let fresh = Pet::from_record(&PetRecord::new("p", "HARVEST_HARE", 0), &defs).unwrap();
        assert_eq!(
            fresh.breakdown(Stat::FarmingFortune),
            vec![("Base Stats".to_string(), 10.0)]
        );
    }

    #[test]
    fn unknown_pet_definition_errors() {
        let defs = sample_definitions();
        let err = Pet::from_record(&PetRecord::new("p", "NOT_A_PET", 1), &defs).unwrap_err();
        assert!(matches!(err, EngineError::UnknownPetDefinition { .. }));
    }
}
