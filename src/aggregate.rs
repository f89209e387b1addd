//! Totals derived from the event ledger.
//!
//! Everything here is a pure function of a sequence of [`StatEvent`]s. The
//! session keeps one [`AggregateStatView`] up to date with [`AggregateStatView::apply`]
//! so the UI does not rescan the ledger every frame; that view always equals
//! [`AggregateStatView::from_events`] over the same events.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{PlayerId, StatEvent};
use crate::registry::StatRegistry;

/// Stat type name to summed value.
pub type StatTotals = BTreeMap<String, u64>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateStatView {
    period: Option<u8>,
    by_player: BTreeMap<PlayerId, StatTotals>,
}

impl AggregateStatView {
    /// An empty view, optionally restricted to one period.
    pub fn new(period: Option<u8>) -> Self {
        Self {
            period,
            by_player: BTreeMap::new(),
        }
    }

    pub fn from_events<'a>(events: impl IntoIterator<Item = &'a StatEvent>, period: Option<u8>) -> Self {
        let mut view = Self::new(period);
        for event in events {
            view.apply(event);
        }
        view
    }

    /// Folds one more event into the view. Events outside the period filter are ignored.
    pub fn apply(&mut self, event: &StatEvent) {
        if self.period.is_some_and(|p| p != event.period) {
            return;
        }
        *self
            .by_player
            .entry(event.player_id)
            .or_default()
            .entry(event.stat_type_name.clone())
            .or_insert(0) += u64::from(event.value);
    }

    pub fn period(&self) -> Option<u8> {
        self.period
    }

    pub fn is_empty(&self) -> bool {
        self.by_player.is_empty()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&StatTotals> {
        self.by_player.get(&player_id)
    }

    pub fn player_totals(&self, player_id: PlayerId) -> StatTotals {
        self.player(player_id).cloned().unwrap_or_default()
    }

    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &StatTotals)> {
        self.by_player.iter().map(|(id, totals)| (*id, totals))
    }

    pub fn team_totals(&self) -> StatTotals {
        let mut team = StatTotals::new();
        for totals in self.by_player.values() {
            for (name, value) in totals {
                *team.entry(name.clone()).or_insert(0) += value;
            }
        }
        team
    }

    /// A player's headline stat: the largest total, ties going to the name
    /// that sorts first.
    pub fn top_stat(&self, player_id: PlayerId) -> Option<(&str, u64)> {
        self.player(player_id)?
            .iter()
            .max_by(|a, b| a.1.cmp(b.1).then_with(|| b.0.cmp(a.0)))
            .map(|(name, value)| (name.as_str(), *value))
    }

    pub fn derived_score(&self, registry: &StatRegistry) -> u64 {
        score_from_totals(&self.team_totals(), registry)
    }
}

pub fn player_totals<'a>(events: impl IntoIterator<Item = &'a StatEvent>, player_id: PlayerId) -> StatTotals {
    AggregateStatView::from_events(events.into_iter().filter(|e| e.player_id == player_id), None)
        .player_totals(player_id)
}

pub fn team_totals<'a>(events: impl IntoIterator<Item = &'a StatEvent>) -> StatTotals {
    AggregateStatView::from_events(events, None).team_totals()
}

/// `5·Try + 2·Conversion + 2·PenaltyGoal + 1·FieldGoal`, where each kind is
/// whichever stat types the registry marks as that kind. A scoring event's
/// value counts how many times it happened.
pub fn derived_score<'a>(events: impl IntoIterator<Item = &'a StatEvent>, registry: &StatRegistry) -> u64 {
    score_from_totals(&team_totals(events), registry)
}

pub fn score_from_totals(totals: &StatTotals, registry: &StatRegistry) -> u64 {
    totals
        .iter()
        .filter_map(|(name, count)| {
            registry
                .scoring_kind(name)
                .map(|kind| u64::from(kind.points()) * count)
        })
        .sum()
}
