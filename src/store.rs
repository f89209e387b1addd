//! Persistence collaborator for match records.
//!
//! The core never allocates identifiers itself; it hands drafts to a
//! [`MatchStore`] and works with whatever the store returns. [`MemoryStore`]
//! is the in-process implementation used by the scorekeeper and by tests.

use std::collections::HashMap;

use crate::error::StoreError;
use crate::model::{
    MatchId, NewRosterEntry, NewStatEvent, RosterEntry, RosterEntryId, StatEvent, StatEventId,
};

pub trait MatchStore {
    /// Every roster entry of the match, open and closed, in creation order.
    fn roster_entries(&self, match_id: MatchId) -> &[RosterEntry];

    fn create_roster_entries(
        &mut self,
        entries: Vec<NewRosterEntry>,
    ) -> Result<Vec<RosterEntry>, StoreError>;

    /// Closes `exiting` at `exited_at` and opens `entering` as one unit of work.
    /// On error neither change is visible.
    fn record_substitution(
        &mut self,
        exiting: RosterEntryId,
        exited_at: u32,
        entering: NewRosterEntry,
    ) -> Result<(RosterEntry, RosterEntry), StoreError>;

    /// Stat events of the match ordered by elapsed time, ties in insertion order.
    fn stat_events(&self, match_id: MatchId) -> &[StatEvent];

    fn create_stat_event(&mut self, event: NewStatEvent) -> Result<StatEvent, StoreError>;
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemoryStore {
    roster: HashMap<MatchId, Vec<RosterEntry>>,
    events: HashMap<MatchId, Vec<StatEvent>>,
    last_roster_id: RosterEntryId,
    last_event_id: StatEventId,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn next_roster_id(&mut self) -> RosterEntryId {
        self.last_roster_id += 1;
        self.last_roster_id
    }
}

impl MatchStore for MemoryStore {
    fn roster_entries(&self, match_id: MatchId) -> &[RosterEntry] {
        self.roster.get(&match_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn create_roster_entries(
        &mut self,
        entries: Vec<NewRosterEntry>,
    ) -> Result<Vec<RosterEntry>, StoreError> {
        let mut created = Vec::with_capacity(entries.len());
        for draft in entries {
            let entry = RosterEntry {
                id: self.next_roster_id(),
                match_id: draft.match_id,
                player_id: draft.player_id,
                shirt_number: draft.shirt_number,
                position_label: draft.position_label,
                is_starter: draft.is_starter,
                entered_at_seconds: draft.entered_at_seconds,
                exited_at_seconds: None,
            };
            self.roster.entry(entry.match_id).or_default().push(entry.clone());
            created.push(entry);
        }
        Ok(created)
    }

    fn record_substitution(
        &mut self,
        exiting: RosterEntryId,
        exited_at: u32,
        entering: NewRosterEntry,
    ) -> Result<(RosterEntry, RosterEntry), StoreError> {
        let match_id = entering.match_id;
        let position = self
            .roster
            .get(&match_id)
            .and_then(|entries| entries.iter().position(|e| e.id == exiting))
            .ok_or(StoreError::UnknownRosterEntry(exiting))?;

        if !self.roster[&match_id][position].is_active() {
            return Err(StoreError::EntryAlreadyClosed(exiting));
        }

        // Everything is validated; both writes below are infallible.
        let id = self.next_roster_id();
        let entries = self.roster.entry(match_id).or_default();
        entries[position].exited_at_seconds = Some(exited_at);
        let closed = entries[position].clone();

        let opened = RosterEntry {
            id,
            match_id,
            player_id: entering.player_id,
            shirt_number: entering.shirt_number,
            position_label: entering.position_label,
            is_starter: entering.is_starter,
            entered_at_seconds: entering.entered_at_seconds,
            exited_at_seconds: None,
        };
        entries.push(opened.clone());

        Ok((closed, opened))
    }

    fn stat_events(&self, match_id: MatchId) -> &[StatEvent] {
        self.events.get(&match_id).map(Vec::as_slice).unwrap_or(&[])
    }

    fn create_stat_event(&mut self, draft: NewStatEvent) -> Result<StatEvent, StoreError> {
        self.last_event_id += 1;
        let event = StatEvent {
            id: self.last_event_id,
            match_id: draft.match_id,
            player_id: draft.player_id,
            stat_type_name: draft.stat_type_name,
            value: draft.value,
            elapsed_seconds: draft.elapsed_seconds,
            period: draft.period,
        };

        let events = self.events.entry(event.match_id).or_default();
        let at = events.partition_point(|e| e.elapsed_seconds <= event.elapsed_seconds);
        events.insert(at, event.clone());
        Ok(event)
    }
}
