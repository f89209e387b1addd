//! Append-only record of stat events.

use tracing::{info, warn};

use crate::error::{CoreError, Result};
use crate::model::{MatchId, NewStatEvent, PlayerId, StatEvent};
use crate::registry::StatRegistry;
use crate::roster;
use crate::store::MatchStore;

/// Validates and appends one stat event.
///
/// The player must have been on the field at `elapsed_seconds`. A rejected
/// event leaves the ledger untouched.
pub fn record<S: MatchStore + ?Sized>(
    store: &mut S,
    registry: &StatRegistry,
    event: NewStatEvent,
) -> Result<StatEvent> {
    if event.value == 0 {
        return Err(CoreError::InvalidStatValue { value: event.value });
    }
    registry.recordable(&event.stat_type_name)?;

    if roster::entry_at(&*store, event.match_id, event.player_id, event.elapsed_seconds).is_none() {
        warn!(
            match_id = event.match_id,
            player_id = event.player_id,
            at = event.elapsed_seconds,
            "stat rejected: player not on the field"
        );
        return Err(CoreError::PlayerNotActive {
            player_id: event.player_id,
            at_seconds: event.elapsed_seconds,
        });
    }

    let recorded = store.create_stat_event(event)?;
    info!(
        match_id = recorded.match_id,
        player_id = recorded.player_id,
        stat = %recorded.stat_type_name,
        value = recorded.value,
        at = recorded.elapsed_seconds,
        "stat recorded"
    );
    Ok(recorded)
}

/// Events of the match by elapsed time, ties in the order they were recorded.
/// The iterator is cheap to clone and can be replayed from the start.
pub fn events_for_match<S: MatchStore + ?Sized>(
    store: &S,
    match_id: MatchId,
) -> std::slice::Iter<'_, StatEvent> {
    store.stat_events(match_id).iter()
}

pub fn events_for_player<S: MatchStore + ?Sized>(
    store: &S,
    match_id: MatchId,
    player_id: PlayerId,
) -> impl Iterator<Item = &StatEvent> + Clone + '_ {
    events_for_match(store, match_id).filter(move |e| e.player_id == player_id)
}
