//! Who is on the field, who is on the bench, and since when.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::model::{LineupSlot, MatchId, NewRosterEntry, Player, PlayerId, RosterEntry};
use crate::store::MatchStore;

/// Position labels for shirts 1 to 15.
pub const UNION_POSITIONS: [&str; 15] = [
    "Loosehead Prop",
    "Hooker",
    "Tighthead Prop",
    "Lock",
    "Lock",
    "Blindside Flanker",
    "Openside Flanker",
    "Number 8",
    "Scrum-half",
    "Fly-half",
    "Left Wing",
    "Inside Centre",
    "Outside Centre",
    "Right Wing",
    "Fullback",
];

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Substitution {
    pub exited: RosterEntry,
    pub entered: RosterEntry,
}

/// Open entries ordered by shirt number.
pub fn active_players<S: MatchStore + ?Sized>(store: &S, match_id: MatchId) -> Vec<RosterEntry> {
    let mut active: Vec<RosterEntry> = store
        .roster_entries(match_id)
        .iter()
        .filter(|e| e.is_active())
        .cloned()
        .collect();
    active.sort_by_key(|e| e.shirt_number);
    active
}

pub fn active_entry<S: MatchStore + ?Sized>(
    store: &S,
    match_id: MatchId,
    player_id: PlayerId,
) -> Option<&RosterEntry> {
    store
        .roster_entries(match_id)
        .iter()
        .find(|e| e.player_id == player_id && e.is_active())
}

/// The entry that had `player_id` on the field at `elapsed`, if any.
pub fn entry_at<S: MatchStore + ?Sized>(
    store: &S,
    match_id: MatchId,
    player_id: PlayerId,
    elapsed: u32,
) -> Option<&RosterEntry> {
    store
        .roster_entries(match_id)
        .iter()
        .find(|e| e.player_id == player_id && e.covers(elapsed))
}

/// Club players available to come on: on the club's books and not on the field.
pub fn bench_players<'p, S: MatchStore + ?Sized>(
    store: &S,
    match_id: MatchId,
    club: &'p [Player],
) -> Vec<&'p Player> {
    let on_field: HashSet<PlayerId> = store
        .roster_entries(match_id)
        .iter()
        .filter(|e| e.is_active())
        .map(|e| e.player_id)
        .collect();

    club.iter()
        .filter(|p| p.is_active && !on_field.contains(&p.id))
        .collect()
}

pub fn assign_starting_lineup<S: MatchStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    lineup: &[LineupSlot],
) -> Result<Vec<RosterEntry>> {
    let mut shirts: HashSet<u8> = HashSet::new();
    let mut players: HashSet<PlayerId> = HashSet::new();
    for entry in store.roster_entries(match_id).iter().filter(|e| e.is_active()) {
        shirts.insert(entry.shirt_number);
        players.insert(entry.player_id);
    }

    for slot in lineup {
        if !shirts.insert(slot.shirt_number) {
            warn!(match_id, shirt = slot.shirt_number, "duplicate shirt in lineup");
            return Err(CoreError::DuplicateShirtNumber {
                shirt_number: slot.shirt_number,
            });
        }
        if !players.insert(slot.player_id) {
            return Err(CoreError::PlayerAlreadyActive {
                player_id: slot.player_id,
            });
        }
    }

    let drafts = lineup
        .iter()
        .map(|slot| NewRosterEntry {
            match_id,
            player_id: slot.player_id,
            shirt_number: slot.shirt_number,
            position_label: slot.position_label.clone(),
            is_starter: true,
            entered_at_seconds: 0,
        })
        .collect();

    let created = store.create_roster_entries(drafts)?;
    info!(match_id, starters = created.len(), "starting lineup assigned");
    Ok(created)
}

/// Replaces `out_player` with `in_player` in the same shirt at `at_seconds`.
///
/// Both halves are validated before the store is touched and are written in a
/// single store call, so a failure leaves the roster exactly as it was.
///
/// The outgoing window cannot be cut short of stats already credited to it,
/// and the incoming player cannot overlap any earlier window of their own.
pub fn substitute<S: MatchStore + ?Sized>(
    store: &mut S,
    match_id: MatchId,
    out_player: PlayerId,
    in_player: PlayerId,
    at_seconds: u32,
) -> Result<Substitution> {
    let not_active = CoreError::PlayerNotActive {
        player_id: out_player,
        at_seconds,
    };
    let outgoing = active_entry(&*store, match_id, out_player)
        .filter(|e| e.entered_at_seconds <= at_seconds)
        .ok_or_else(|| not_active.clone())?;

    let last_credited = store
        .stat_events(match_id)
        .iter()
        .filter(|e| e.player_id == out_player && e.elapsed_seconds >= outgoing.entered_at_seconds)
        .map(|e| e.elapsed_seconds)
        .max();
    if last_credited.is_some_and(|last| last >= at_seconds) {
        warn!(match_id, player_id = out_player, at = at_seconds, "substitution before recorded stats");
        return Err(not_active);
    }

    let overlaps = store
        .roster_entries(match_id)
        .iter()
        .any(|e| e.player_id == in_player && e.exited_at_seconds.map_or(true, |exit| exit > at_seconds));
    if overlaps {
        return Err(CoreError::PlayerAlreadyActive {
            player_id: in_player,
        });
    }

    let entering = NewRosterEntry {
        match_id,
        player_id: in_player,
        shirt_number: outgoing.shirt_number,
        position_label: outgoing.position_label.clone(),
        is_starter: false,
        entered_at_seconds: at_seconds,
    };
    let outgoing_id = outgoing.id;

    let (exited, entered) = store.record_substitution(outgoing_id, at_seconds, entering)?;
    info!(
        match_id,
        shirt = entered.shirt_number,
        off = out_player,
        on = in_player,
        at = at_seconds,
        "substitution"
    );
    Ok(Substitution { exited, entered })
}

/// Seconds `player_id` has spent on the field up to `now`.
pub fn time_on_field<S: MatchStore + ?Sized>(
    store: &S,
    match_id: MatchId,
    player_id: PlayerId,
    now: u32,
) -> u32 {
    store
        .roster_entries(match_id)
        .iter()
        .filter(|e| e.player_id == player_id)
        .map(|e| {
            let until = e.exited_at_seconds.unwrap_or(now).min(now);
            until.saturating_sub(e.entered_at_seconds)
        })
        .sum()
}

/// Shirts 1 to 15 for the first fifteen available players, in squad order.
pub fn default_lineup(players: &[Player]) -> Vec<LineupSlot> {
    players
        .iter()
        .filter(|p| p.is_active)
        .zip(UNION_POSITIONS.iter())
        .enumerate()
        .map(|(i, (player, position))| LineupSlot {
            player_id: player.id,
            shirt_number: i as u8 + 1,
            position_label: position.to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NewStatEvent;
    use crate::store::MemoryStore;
    use proptest::prelude::*;

    const MATCH: MatchId = 7;

    fn slot(player_id: PlayerId, shirt_number: u8) -> LineupSlot {
        LineupSlot {
            player_id,
            shirt_number,
            position_label: UNION_POSITIONS[(shirt_number as usize - 1) % 15].to_string(),
        }
    }

    fn squad(n: u32) -> Vec<Player> {
        (1..=n)
            .map(|id| Player {
                id,
                team_id: 1,
                first_name: format!("P{id}"),
                last_name: "Test".into(),
                preferred_position: None,
                is_active: true,
            })
            .collect()
    }

    fn with_lineup(slots: &[LineupSlot]) -> MemoryStore {
        let mut store = MemoryStore::new();
        assign_starting_lineup(&mut store, MATCH, slots).unwrap();
        store
    }

    #[test]
    fn lineup_creates_starters_at_kickoff() {
        let store = with_lineup(&[slot(1, 9), slot(2, 1)]);
        let active = active_players(&store, MATCH);
        assert_eq!(active.len(), 2);
        assert_eq!(active[0].shirt_number, 1);
        assert_eq!(active[1].shirt_number, 9);
        assert!(active.iter().all(|e| e.is_starter && e.entered_at_seconds == 0));
    }

    #[test]
    fn lineup_rejects_duplicate_shirts() {
        let mut store = MemoryStore::new();
        let err = assign_starting_lineup(&mut store, MATCH, &[slot(1, 9), slot(2, 9)]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateShirtNumber { shirt_number: 9 });
        assert!(store.roster_entries(MATCH).is_empty());
    }

    #[test]
    fn lineup_rejects_shirts_already_on_the_field() {
        let mut store = with_lineup(&[slot(1, 9)]);
        let err = assign_starting_lineup(&mut store, MATCH, &[slot(2, 9)]).unwrap_err();
        assert_eq!(err, CoreError::DuplicateShirtNumber { shirt_number: 9 });
    }

    #[test]
    fn lineup_rejects_a_player_in_two_shirts() {
        let mut store = MemoryStore::new();
        let err = assign_starting_lineup(&mut store, MATCH, &[slot(1, 9), slot(1, 10)]).unwrap_err();
        assert_eq!(err, CoreError::PlayerAlreadyActive { player_id: 1 });
    }

    #[test]
    fn substitute_hands_over_the_shirt() {
        let mut store = with_lineup(&[slot(1, 9), slot(2, 10)]);
        let sub = substitute(&mut store, MATCH, 1, 3, 600).unwrap();

        assert_eq!(sub.exited.exited_at_seconds, Some(600));
        assert_eq!(sub.entered.shirt_number, 9);
        assert_eq!(sub.entered.position_label, "Scrum-half");
        assert!(!sub.entered.is_starter);

        let active = active_players(&store, MATCH);
        assert!(active.iter().all(|e| e.player_id != 1));
        let nine = active.iter().find(|e| e.shirt_number == 9).unwrap();
        assert_eq!(nine.player_id, 3);
        assert_eq!(nine.entered_at_seconds, 600);
    }

    #[test]
    fn substituting_an_absent_player_changes_nothing() {
        let mut store = with_lineup(&[slot(1, 9)]);
        let before = store.clone();

        let err = substitute(&mut store, MATCH, 5, 3, 600).unwrap_err();
        assert_eq!(err, CoreError::PlayerNotActive { player_id: 5, at_seconds: 600 });
        assert_eq!(store, before);
    }

    fn credit(store: &mut MemoryStore, player_id: PlayerId, elapsed_seconds: u32) {
        store
            .create_stat_event(NewStatEvent {
                match_id: MATCH,
                player_id,
                stat_type_name: "Tackles".into(),
                value: 1,
                elapsed_seconds,
                period: 1,
            })
            .unwrap();
    }

    #[test]
    fn substitution_cannot_predate_recorded_stats() {
        let mut store = with_lineup(&[slot(1, 9)]);
        credit(&mut store, 1, 700);
        let before = store.clone();

        let err = substitute(&mut store, MATCH, 1, 2, 600).unwrap_err();
        assert_eq!(err, CoreError::PlayerNotActive { player_id: 1, at_seconds: 600 });
        let err = substitute(&mut store, MATCH, 1, 2, 700).unwrap_err();
        assert_eq!(err, CoreError::PlayerNotActive { player_id: 1, at_seconds: 700 });
        assert_eq!(store, before);

        substitute(&mut store, MATCH, 1, 2, 701).unwrap();
        let events = store.stat_events(MATCH).to_vec();
        assert!(events
            .iter()
            .all(|e| entry_at(&store, MATCH, e.player_id, e.elapsed_seconds).is_some()));
    }

    #[test]
    fn returning_player_cannot_overlap_an_earlier_window() {
        let mut store = with_lineup(&[slot(1, 9), slot(2, 10)]);
        substitute(&mut store, MATCH, 1, 16, 500).unwrap();
        let before = store.clone();

        let err = substitute(&mut store, MATCH, 2, 1, 400).unwrap_err();
        assert_eq!(err, CoreError::PlayerAlreadyActive { player_id: 1 });
        assert_eq!(store, before);

        let back_on = substitute(&mut store, MATCH, 2, 1, 500).unwrap();
        assert_eq!(back_on.entered.shirt_number, 10);
        assert_eq!(time_on_field(&store, MATCH, 1, 800), 500 + 300);
    }

    #[test]
    fn substituting_twice_fails_the_second_time() {
        let mut store = with_lineup(&[slot(1, 9)]);
        substitute(&mut store, MATCH, 1, 3, 600).unwrap();
        let before = store.clone();

        let err = substitute(&mut store, MATCH, 1, 4, 700).unwrap_err();
        assert_eq!(err, CoreError::PlayerNotActive { player_id: 1, at_seconds: 700 });
        assert_eq!(store, before);
    }

    #[test]
    fn incoming_player_must_come_from_the_bench() {
        let mut store = with_lineup(&[slot(1, 9), slot(2, 10)]);
        let before = store.clone();
        let err = substitute(&mut store, MATCH, 1, 2, 600).unwrap_err();
        assert_eq!(err, CoreError::PlayerAlreadyActive { player_id: 2 });
        assert_eq!(store, before);
    }

    #[test]
    fn bench_is_everyone_not_on_the_field() {
        let mut players = squad(4);
        players[3].is_active = false;
        let mut store = with_lineup(&[slot(1, 9)]);

        let bench: Vec<_> = bench_players(&store, MATCH, &players).iter().map(|p| p.id).collect();
        assert_eq!(bench, vec![2, 3]);

        substitute(&mut store, MATCH, 1, 2, 100).unwrap();
        let bench: Vec<_> = bench_players(&store, MATCH, &players).iter().map(|p| p.id).collect();
        assert_eq!(bench, vec![1, 3]);
    }

    #[test]
    fn entry_at_respects_the_exit_boundary() {
        let mut store = with_lineup(&[slot(1, 9)]);
        substitute(&mut store, MATCH, 1, 2, 600).unwrap();

        assert!(entry_at(&store, MATCH, 1, 599).is_some());
        assert!(entry_at(&store, MATCH, 1, 600).is_none());
        assert!(entry_at(&store, MATCH, 2, 599).is_none());
        assert!(entry_at(&store, MATCH, 2, 600).is_some());
    }

    #[test]
    fn time_on_field_sums_windows() {
        let mut store = with_lineup(&[slot(1, 9), slot(2, 10)]);
        substitute(&mut store, MATCH, 1, 3, 600).unwrap();
        substitute(&mut store, MATCH, 2, 1, 1000).unwrap();

        assert_eq!(time_on_field(&store, MATCH, 1, 1500), 600 + 500);
        assert_eq!(time_on_field(&store, MATCH, 3, 1500), 900);
        assert_eq!(time_on_field(&store, MATCH, 2, 1500), 1000);
        assert_eq!(time_on_field(&store, MATCH, 4, 1500), 0);
    }

    #[test]
    fn default_lineup_numbers_one_to_fifteen() {
        let lineup = default_lineup(&squad(20));
        assert_eq!(lineup.len(), 15);
        assert_eq!(lineup[0].position_label, "Loosehead Prop");
        assert_eq!(lineup[14].shirt_number, 15);
        assert_eq!(lineup[14].position_label, "Fullback");
    }

    fn assert_unique_shirts(store: &MemoryStore) {
        let active = active_players(store, MATCH);
        let shirts: HashSet<u8> = active.iter().map(|e| e.shirt_number).collect();
        assert_eq!(shirts.len(), active.len());
    }

    proptest! {
        #[test]
        fn active_shirts_stay_unique(
            ops in prop::collection::vec((1u32..24, 1u32..24), 0..60)
        ) {
            let mut store = with_lineup(&default_lineup(&squad(23)));
            let mut at = 0;
            for (out_player, in_player) in ops {
                at += 30;
                let before = store.clone();
                if substitute(&mut store, MATCH, out_player, in_player, at).is_err() {
                    prop_assert_eq!(&store, &before);
                }
                assert_unique_shirts(&store);
                prop_assert_eq!(active_players(&store, MATCH).len(), 15);
            }
        }
    }
}
