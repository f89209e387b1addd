//! One live match: the clock, the roster, the ledger and the running totals,
//! owned together so every intent sees a consistent view.

use std::collections::BTreeMap;

use serde::Serialize;
use tracing::info;

use crate::aggregate::{self, AggregateStatView, StatTotals};
use crate::clock::{MatchClock, PeriodAdvance, TickOutcome};
use crate::error::{CoreError, Result};
use crate::ledger;
use crate::model::{
    LineupSlot, MatchId, NewStatEvent, Player, PlayerId, RosterEntry, ScoringKind, StatEvent, Team,
};
use crate::registry::StatRegistry;
use crate::roster::{self, Substitution};
use crate::store::{MatchStore, MemoryStore};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum MatchStatus {
    NotStarted,
    InProgress,
    Completed,
    Abandoned,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub team: String,
    pub opponent: String,
    pub status: MatchStatus,
    pub score: u64,
    pub opponent_score: u64,
    pub periods_played: u8,
    pub elapsed_seconds: u32,
    pub roster: Vec<RosterEntry>,
    pub events: Vec<StatEvent>,
    pub player_totals: BTreeMap<PlayerId, StatTotals>,
    pub team_totals: StatTotals,
}

pub struct MatchSession<S: MatchStore = MemoryStore> {
    match_id: MatchId,
    team: Team,
    opponent: String,
    players: Vec<Player>,
    registry: StatRegistry,
    clock: MatchClock,
    store: S,
    view: AggregateStatView,
    opponent_tally: BTreeMap<ScoringKind, u32>,
    status: MatchStatus,
}

impl<S: MatchStore> MatchSession<S> {
    pub fn new(
        match_id: MatchId,
        team: Team,
        opponent: impl Into<String>,
        players: Vec<Player>,
        registry: StatRegistry,
        clock: MatchClock,
        store: S,
    ) -> Self {
        let view = AggregateStatView::from_events(store.stat_events(match_id), None);
        Self {
            match_id,
            team,
            opponent: opponent.into(),
            players,
            registry,
            clock,
            store,
            view,
            opponent_tally: BTreeMap::new(),
            status: MatchStatus::NotStarted,
        }
    }

    pub fn match_id(&self) -> MatchId {
        self.match_id
    }

    pub fn team(&self) -> &Team {
        &self.team
    }

    pub fn opponent(&self) -> &str {
        &self.opponent
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == player_id)
    }

    pub fn registry(&self) -> &StatRegistry {
        &self.registry
    }

    pub fn clock(&self) -> &MatchClock {
        &self.clock
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn status(&self) -> MatchStatus {
        self.status
    }

    pub fn is_closed(&self) -> bool {
        matches!(self.status, MatchStatus::Completed | MatchStatus::Abandoned)
    }

    fn ensure_open(&self) -> Result<()> {
        if self.is_closed() {
            return Err(CoreError::MatchClosed);
        }
        Ok(())
    }

    // Clock

    pub fn start(&mut self) -> Result<()> {
        self.ensure_open()?;
        if self.status == MatchStatus::NotStarted {
            info!(match_id = self.match_id, opponent = %self.opponent, "kick-off");
            self.status = MatchStatus::InProgress;
        }
        self.clock.start();
        Ok(())
    }

    pub fn pause(&mut self) {
        self.clock.pause();
    }

    pub fn resume(&mut self) -> Result<()> {
        self.ensure_open()?;
        self.clock.resume();
        Ok(())
    }

    pub fn tick(&mut self) -> TickOutcome {
        self.clock.tick()
    }

    /// Moves to the next period. From the final period this completes the match.
    pub fn advance_period(&mut self) -> Result<PeriodAdvance> {
        self.ensure_open()?;
        let outcome = self.clock.advance_period();
        if outcome == PeriodAdvance::MatchComplete {
            self.finish();
        }
        Ok(outcome)
    }

    pub fn finish(&mut self) {
        self.clock.pause();
        if !self.is_closed() {
            info!(
                match_id = self.match_id,
                score = self.score(),
                opponent_score = self.opponent_score(),
                "full time"
            );
            self.status = MatchStatus::Completed;
        }
    }

    /// Stops the match and resets the clock to kick-off. Recorded events stay in the store.
    pub fn abandon(&mut self) {
        self.clock = MatchClock::new(self.clock.total_periods(), self.clock.period_length_seconds())
            .unwrap_or_default();
        self.status = MatchStatus::Abandoned;
        info!(match_id = self.match_id, "match abandoned");
    }

    // Roster

    pub fn assign_starting_lineup(&mut self, lineup: &[LineupSlot]) -> Result<Vec<RosterEntry>> {
        self.ensure_open()?;
        roster::assign_starting_lineup(&mut self.store, self.match_id, lineup)
    }

    pub fn active_players(&self) -> Vec<RosterEntry> {
        roster::active_players(&self.store, self.match_id)
    }

    pub fn bench_players(&self) -> Vec<&Player> {
        roster::bench_players(&self.store, self.match_id, &self.players)
    }

    /// Substitutes at the current match time.
    pub fn substitute(&mut self, out_player: PlayerId, in_player: PlayerId) -> Result<Substitution> {
        let at = self.clock.elapsed_seconds();
        self.substitute_at(out_player, in_player, at)
    }

    pub fn substitute_at(
        &mut self,
        out_player: PlayerId,
        in_player: PlayerId,
        at_seconds: u32,
    ) -> Result<Substitution> {
        self.ensure_open()?;
        roster::substitute(&mut self.store, self.match_id, out_player, in_player, at_seconds)
    }

    pub fn time_on_field(&self, player_id: PlayerId) -> u32 {
        roster::time_on_field(&self.store, self.match_id, player_id, self.clock.elapsed_seconds())
    }

    // Ledger

    /// Records a stat at the current match time and period.
    pub fn record_stat(&mut self, player_id: PlayerId, stat_type_name: &str, value: u32) -> Result<StatEvent> {
        let (elapsed, period) = (self.clock.elapsed_seconds(), self.clock.current_period());
        self.record_stat_at(player_id, stat_type_name, value, elapsed, period)
    }

    pub fn record_stat_at(
        &mut self,
        player_id: PlayerId,
        stat_type_name: &str,
        value: u32,
        elapsed_seconds: u32,
        period: u8,
    ) -> Result<StatEvent> {
        self.ensure_open()?;
        let event = ledger::record(
            &mut self.store,
            &self.registry,
            NewStatEvent {
                match_id: self.match_id,
                player_id,
                stat_type_name: stat_type_name.to_string(),
                value,
                elapsed_seconds,
                period,
            },
        )?;
        self.view.apply(&event);
        Ok(event)
    }

    pub fn events(&self) -> std::slice::Iter<'_, StatEvent> {
        ledger::events_for_match(&self.store, self.match_id)
    }

    pub fn events_for_player(&self, player_id: PlayerId) -> impl Iterator<Item = &StatEvent> + Clone + '_ {
        ledger::events_for_player(&self.store, self.match_id, player_id)
    }

    /// The opponent has no roster, so their points are tallied by kind.
    pub fn record_opponent_score(&mut self, kind: ScoringKind) -> Result<u64> {
        self.ensure_open()?;
        *self.opponent_tally.entry(kind).or_insert(0) += 1;
        info!(match_id = self.match_id, kind = kind.label(), "opponent scored");
        Ok(self.opponent_score())
    }

    // Aggregation

    pub fn totals(&self) -> &AggregateStatView {
        &self.view
    }

    pub fn period_totals(&self, period: u8) -> AggregateStatView {
        AggregateStatView::from_events(self.events(), Some(period))
    }

    pub fn player_totals(&self, player_id: PlayerId) -> StatTotals {
        self.view.player_totals(player_id)
    }

    pub fn team_totals(&self) -> StatTotals {
        self.view.team_totals()
    }

    pub fn score(&self) -> u64 {
        self.view.derived_score(&self.registry)
    }

    pub fn opponent_score(&self) -> u64 {
        self.opponent_tally
            .iter()
            .map(|(kind, count)| u64::from(kind.points()) * u64::from(*count))
            .sum()
    }

    pub fn summary(&self) -> MatchSummary {
        let events: Vec<StatEvent> = self.events().cloned().collect();
        let recomputed = AggregateStatView::from_events(&events, None);
        MatchSummary {
            match_id: self.match_id,
            team: self.team.name.clone(),
            opponent: self.opponent.clone(),
            status: self.status,
            score: aggregate::score_from_totals(&recomputed.team_totals(), &self.registry),
            opponent_score: self.opponent_score(),
            periods_played: self.clock.current_period(),
            elapsed_seconds: self.clock.elapsed_seconds(),
            roster: self.store.roster_entries(self.match_id).to_vec(),
            player_totals: recomputed.players().map(|(id, t)| (id, t.clone())).collect(),
            team_totals: recomputed.team_totals(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::roster::default_lineup;

    fn squad() -> Vec<Player> {
        (1..=23)
            .map(|id| Player {
                id,
                team_id: 1,
                first_name: format!("Player{id}"),
                last_name: "Test".into(),
                preferred_position: None,
                is_active: true,
            })
            .collect()
    }

    fn session() -> MatchSession {
        let players = squad();
        let lineup = default_lineup(&players);
        let mut session = MatchSession::new(
            1,
            Team { id: 1, name: "Harbour RFC".into(), abbreviation: "HRB".into() },
            "Valley",
            players,
            StatRegistry::standard(),
            MatchClock::new(2, 2400).unwrap(),
            MemoryStore::new(),
        );
        session.assign_starting_lineup(&lineup).unwrap();
        session
    }

    fn run(session: &mut MatchSession, seconds: u32) {
        session.start().unwrap();
        for _ in 0..seconds {
            session.tick();
        }
        session.pause();
    }

    #[test]
    fn substitution_and_stats_use_match_time() {
        let mut session = session();
        run(&mut session, 600);

        let sub = session.substitute(9, 16).unwrap();
        assert_eq!(sub.entered.entered_at_seconds, 600);
        assert_eq!(sub.entered.shirt_number, 9);

        run(&mut session, 100);
        assert_eq!(
            session.record_stat(9, "Tackles", 1).unwrap_err(),
            CoreError::PlayerNotActive { player_id: 9, at_seconds: 700 }
        );
        let event = session.record_stat(16, "Tackles", 1).unwrap();
        assert_eq!(event.elapsed_seconds, 700);
        assert_eq!(event.period, 1);
    }

    #[test]
    fn backdated_substitution_keeps_every_event_covered() {
        let mut session = session();
        session.record_stat_at(9, "Tackles", 1, 700, 1).unwrap();

        assert_eq!(
            session.substitute_at(9, 16, 600).unwrap_err(),
            CoreError::PlayerNotActive { player_id: 9, at_seconds: 600 }
        );
        assert!(session.active_players().iter().any(|e| e.player_id == 9));

        session.substitute_at(1, 17, 500).unwrap();
        assert_eq!(
            session.substitute_at(2, 1, 400).unwrap_err(),
            CoreError::PlayerAlreadyActive { player_id: 1 }
        );
        let windows = session.store().roster_entries(session.match_id()).iter().filter(|e| e.player_id == 1).count();
        assert_eq!(windows, 1);
    }

    #[test]
    fn running_totals_match_a_recount() {
        let mut session = session();
        run(&mut session, 30);
        session.record_stat(11, "Try", 1).unwrap();
        session.record_stat(10, "Conversion", 1).unwrap();
        session.record_stat(4, "Tackles", 6).unwrap();
        session.advance_period().unwrap();
        run(&mut session, 30);
        session.record_stat(10, "Penalty Goal", 1).unwrap();

        let recount = AggregateStatView::from_events(session.events(), None);
        assert_eq!(session.totals(), &recount);
        assert_eq!(session.score(), 9);
        assert_eq!(session.period_totals(2).team_totals().get("Penalty Goal"), Some(&1));
        assert_eq!(session.period_totals(1).team_totals().get("Penalty Goal"), None);
        assert_eq!(session.summary().score, session.score());
    }

    #[test]
    fn final_advance_completes_the_match() {
        let mut session = session();
        session.start().unwrap();
        assert_eq!(session.status(), MatchStatus::InProgress);
        assert_eq!(session.advance_period().unwrap(), PeriodAdvance::Advanced(2));
        assert_eq!(session.advance_period().unwrap(), PeriodAdvance::MatchComplete);
        assert_eq!(session.status(), MatchStatus::Completed);

        assert_eq!(session.record_stat(1, "Tackles", 1).unwrap_err(), CoreError::MatchClosed);
        assert_eq!(session.substitute(1, 16).unwrap_err(), CoreError::MatchClosed);
        assert_eq!(session.start().unwrap_err(), CoreError::MatchClosed);
    }

    #[test]
    fn abandon_resets_the_clock() {
        let mut session = session();
        run(&mut session, 120);
        session.abandon();
        assert_eq!(session.status(), MatchStatus::Abandoned);
        assert_eq!(session.clock().elapsed_seconds(), 0);
        assert!(!session.clock().is_running());
    }

    #[test]
    fn opponent_points_are_tallied_by_kind() {
        let mut session = session();
        session.record_opponent_score(ScoringKind::Try).unwrap();
        session.record_opponent_score(ScoringKind::Conversion).unwrap();
        assert_eq!(session.record_opponent_score(ScoringKind::FieldGoal).unwrap(), 8);
        assert_eq!(session.score(), 0);
    }

    #[test]
    fn bench_and_time_on_field() {
        let mut session = session();
        assert_eq!(session.bench_players().len(), 8);
        run(&mut session, 300);
        session.substitute(1, 17).unwrap();
        run(&mut session, 200);

        assert_eq!(session.time_on_field(1), 300);
        assert_eq!(session.time_on_field(17), 200);
        assert!(session.bench_players().iter().any(|p| p.id == 1));
        assert_eq!(session.active_players().len(), 15);
    }
}
