//! The stat types a club records, and which of them put points on the board.

use std::collections::BTreeMap;

use tracing::{debug, warn};

use crate::error::{CoreError, Result};
use crate::model::{ScoringKind, StatType};

/// Recognized stat types, keyed by name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatRegistry {
    types: BTreeMap<String, StatType>,
}

impl StatRegistry {
    pub fn new(stat_types: impl IntoIterator<Item = StatType>) -> Self {
        let types: BTreeMap<String, StatType> = stat_types.into_iter().map(|t| (t.name.clone(), t)).collect();
        debug!(count = types.len(), "stat registry loaded");
        Self { types }
    }

    /// The stat types a club starts with.
    pub fn standard() -> Self {
        let scoring = ScoringKind::ALL.iter().map(|kind| (kind.label(), Some(*kind)));
        let general = [
            "Tackles",
            "Missed Tackles",
            "Carries",
            "Metres Gained",
            "Line Breaks",
            "Offloads",
            "Turnovers Won",
            "Penalties Conceded",
            "Lineouts Won",
        ]
        .into_iter()
        .map(|name| (name, None));

        Self::new(scoring.chain(general).enumerate().map(|(i, (name, scoring))| StatType {
            id: i as u32 + 1,
            name: name.to_string(),
            is_active: true,
            scoring,
        }))
    }

    pub fn get(&self, name: &str) -> Option<&StatType> {
        self.types.get(name)
    }

    /// Looks up a stat type that may be recorded right now.
    pub fn recordable(&self, name: &str) -> Result<&StatType> {
        let Some(stat_type) = self.get(name) else {
            warn!(stat = name, "unknown stat type");
            return Err(CoreError::UnknownStatType(name.to_string()));
        };
        if !stat_type.is_active {
            warn!(stat = name, "stat type is switched off");
            return Err(CoreError::InactiveStatType(name.to_string()));
        }
        Ok(stat_type)
    }

    pub fn scoring_kind(&self, name: &str) -> Option<ScoringKind> {
        self.get(name).and_then(|t| t.scoring)
    }

    /// The stat type configured for a scoring kind, if any.
    pub fn name_for(&self, kind: ScoringKind) -> Option<&str> {
        self.types
            .values()
            .find(|t| t.scoring == Some(kind))
            .map(|t| t.name.as_str())
    }

    /// Active stat types, scoring types first, then alphabetical.
    pub fn active(&self) -> Vec<&StatType> {
        let mut active: Vec<&StatType> = self.types.values().filter(|t| t.is_active).collect();
        active.sort_by_key(|t| (t.scoring.is_none(), t.scoring, t.name.clone()));
        active
    }
}
