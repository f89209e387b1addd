use std::time::Duration;

use crossterm::event::KeyCode;
use ratatui::widgets::ListState;
use rugby_tracker::clock::{PeriodAdvance, TickOutcome};
use rugby_tracker::data::{SyncOp, SyncStatus};
use rugby_tracker::model::{LineupSlot, PlayerId, RosterEntry, ScoringKind};
use rugby_tracker::ticker::{ClockPulse, ClockTicker};
use rugby_tracker::{CoreError, MatchSession};
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Field,
    Bench,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Normal,
    /// Picking the bench player to replace `out_player`.
    Substitute { out_player: PlayerId },
    /// Picking a stat to record against `player_id`.
    RecordStat { player_id: PlayerId, value: u32 },
    OpponentScore,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

pub struct App {
    pub session: MatchSession,
    pub should_quit: bool,
    pub focus: Focus,
    pub mode: Mode,
    pub field_state: ListState,
    pub bench_state: ListState,
    pub picker_state: ListState,
    pub notice: Option<Notice>,
    pub show_period: bool,
    ticker: Option<ClockTicker>,
    generation: u64,
    tick_every: Duration,
    pulse_tx: mpsc::Sender<ClockPulse>,
    sync_tx: Option<mpsc::Sender<SyncOp>>,
}

impl App {
    pub fn new(
        session: MatchSession,
        tick_every: Duration,
        pulse_tx: mpsc::Sender<ClockPulse>,
        sync_tx: Option<mpsc::Sender<SyncOp>>,
    ) -> Self {
        let mut field_state = ListState::default();
        field_state.select(Some(0));
        let mut bench_state = ListState::default();
        bench_state.select(Some(0));

        Self {
            session,
            should_quit: false,
            focus: Focus::Field,
            mode: Mode::Normal,
            field_state,
            bench_state,
            picker_state: ListState::default(),
            notice: None,
            show_period: false,
            ticker: None,
            generation: 0,
            tick_every,
            pulse_tx,
            sync_tx,
        }
    }

    pub fn assign_lineup(&mut self, lineup: &[LineupSlot]) {
        match self.session.assign_starting_lineup(lineup) {
            Ok(entries) => {
                let match_id = self.session.match_id();
                self.mirror(SyncOp::Lineup { match_id, entries });
            }
            Err(err) => self.fail(err),
        }
    }

    pub fn field(&self) -> Vec<RosterEntry> {
        self.session.active_players()
    }

    pub fn bench_ids(&self) -> Vec<PlayerId> {
        self.session.bench_players().iter().map(|p| p.id).collect()
    }

    pub fn selected_field_player(&self) -> Option<PlayerId> {
        let field = self.field();
        self.field_state
            .selected()
            .and_then(|i| field.get(i))
            .map(|e| e.player_id)
    }

    pub fn selected_bench_player(&self) -> Option<PlayerId> {
        let bench = self.bench_ids();
        self.bench_state.selected().and_then(|i| bench.get(i).copied())
    }

    pub fn player_name(&self, player_id: PlayerId) -> String {
        self.session
            .player(player_id)
            .map(|p| p.full_name())
            .unwrap_or_else(|| format!("#{player_id}"))
    }

    /// Entries shown in the picker popup for the current mode.
    pub fn picker_items(&self) -> Vec<String> {
        match self.mode {
            Mode::RecordStat { .. } => self
                .session
                .registry()
                .active()
                .iter()
                .map(|t| t.name.clone())
                .collect(),
            Mode::OpponentScore => ScoringKind::ALL
                .iter()
                .map(|k| format!("{} (+{})", k.label(), k.points()))
                .collect(),
            _ => Vec::new(),
        }
    }

    pub fn is_ticking(&self) -> bool {
        self.ticker.is_some()
    }

    pub fn on_key(&mut self, code: KeyCode) {
        match self.mode {
            Mode::Normal => self.on_normal_key(code),
            Mode::Substitute { out_player } => self.on_substitute_key(code, out_player),
            Mode::RecordStat { player_id, value } => self.on_record_key(code, player_id, value),
            Mode::OpponentScore => self.on_opponent_key(code),
        }
    }

    fn on_normal_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Char(' ') => self.toggle_clock(),
            KeyCode::Char('n') => self.advance_period(),
            KeyCode::Char('F') => self.full_time(),
            KeyCode::Char('A') => self.abandon(),
            KeyCode::Char('p') => self.show_period = !self.show_period,
            KeyCode::Tab => {
                self.focus = match self.focus {
                    Focus::Field => Focus::Bench,
                    Focus::Bench => Focus::Field,
                }
            }
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Char('s') => {
                if let Some(out_player) = self.selected_field_player() {
                    self.mode = Mode::Substitute { out_player };
                    self.focus = Focus::Bench;
                    self.bench_state.select(Some(0));
                    self.say(format!("Replace {}: pick from the bench", self.player_name(out_player)));
                }
            }
            KeyCode::Char('r') | KeyCode::Enter => {
                if let Some(player_id) = self.selected_field_player() {
                    self.mode = Mode::RecordStat { player_id, value: 1 };
                    self.picker_state.select(Some(0));
                }
            }
            KeyCode::Char('o') => {
                self.mode = Mode::OpponentScore;
                self.picker_state.select(Some(0));
            }
            _ => {}
        }
    }

    fn on_substitute_key(&mut self, code: KeyCode, out_player: PlayerId) {
        match code {
            KeyCode::Esc => self.cancel(),
            KeyCode::Down | KeyCode::Char('j') => self.next(),
            KeyCode::Up | KeyCode::Char('k') => self.previous(),
            KeyCode::Enter => {
                let Some(in_player) = self.selected_bench_player() else {
                    return;
                };
                match self.session.substitute(out_player, in_player) {
                    Ok(substitution) => {
                        self.say(format!(
                            "#{} {} on for {}",
                            substitution.entered.shirt_number,
                            self.player_name(in_player),
                            self.player_name(out_player)
                        ));
                        let match_id = self.session.match_id();
                        self.mirror(SyncOp::Substitution { match_id, substitution });
                        self.mode = Mode::Normal;
                        self.focus = Focus::Field;
                        self.clamp_selections();
                    }
                    Err(err) => self.fail(err),
                }
            }
            _ => {}
        }
    }

    fn on_record_key(&mut self, code: KeyCode, player_id: PlayerId, value: u32) {
        match code {
            KeyCode::Esc => self.cancel(),
            KeyCode::Down | KeyCode::Char('j') => self.picker_step(1),
            KeyCode::Up | KeyCode::Char('k') => self.picker_step(-1),
            KeyCode::Char(c) if c.is_ascii_digit() => {
                let value = c.to_digit(10).unwrap_or(1);
                self.mode = Mode::RecordStat { player_id, value };
            }
            KeyCode::Enter => {
                let items = self.picker_items();
                let Some(stat) = self.picker_state.selected().and_then(|i| items.get(i)).cloned() else {
                    return;
                };
                match self.session.record_stat(player_id, &stat, value) {
                    Ok(event) => {
                        self.say(format!(
                            "{} {} x{} at {}",
                            self.player_name(player_id),
                            event.stat_type_name,
                            event.value,
                            rugby_tracker::clock::format_mm_ss(event.elapsed_seconds)
                        ));
                        self.mirror(SyncOp::Stat(event));
                        self.mode = Mode::Normal;
                    }
                    Err(err) => self.fail(err),
                }
            }
            _ => {}
        }
    }

    fn on_opponent_key(&mut self, code: KeyCode) {
        match code {
            KeyCode::Esc => self.cancel(),
            KeyCode::Down | KeyCode::Char('j') => self.picker_step(1),
            KeyCode::Up | KeyCode::Char('k') => self.picker_step(-1),
            KeyCode::Enter => {
                let Some(kind) = self.picker_state.selected().and_then(|i| ScoringKind::ALL.get(i)).copied() else {
                    return;
                };
                match self.session.record_opponent_score(kind) {
                    Ok(score) => {
                        self.say(format!("{} {} ({score})", self.session.opponent(), kind.label()));
                        self.mode = Mode::Normal;
                    }
                    Err(err) => self.fail(err),
                }
            }
            _ => {}
        }
    }

    fn toggle_clock(&mut self) {
        if self.session.clock().is_running() {
            self.session.pause();
            self.stop_ticker();
            self.say("Clock paused");
            return;
        }

        if let Err(err) = self.session.start() {
            self.fail(err);
            return;
        }
        if self.session.clock().is_running() {
            self.start_ticker();
            self.notice = None;
        } else {
            self.say("Period over: press n for the next period");
        }
    }

    fn advance_period(&mut self) {
        self.stop_ticker();
        match self.session.advance_period() {
            Ok(PeriodAdvance::Advanced(_)) => {
                let label = self.session.clock().period_label();
                self.say(format!("{label} ready: press space to start"));
            }
            Ok(PeriodAdvance::MatchComplete) => self.say(format!(
                "Full time: {} {} - {} {}",
                self.session.team().abbreviation,
                self.session.score(),
                self.session.opponent_score(),
                self.session.opponent()
            )),
            Err(err) => self.fail(err),
        }
    }

    fn full_time(&mut self) {
        self.stop_ticker();
        self.session.finish();
        self.say("Full time");
    }

    fn abandon(&mut self) {
        if self.session.is_closed() {
            self.fail(CoreError::MatchClosed);
            return;
        }
        self.stop_ticker();
        self.session.abandon();
        self.say("Match abandoned");
    }

    pub fn on_pulse(&mut self, pulse: ClockPulse) {
        if self.ticker.as_ref().map(ClockTicker::generation) != Some(pulse.generation) {
            return;
        }
        if self.session.tick() == TickOutcome::PeriodExpired {
            self.stop_ticker();
            self.say(format!(
                "End of {}: press n for the next period",
                self.session.clock().period_label()
            ));
        }
    }

    pub fn on_sync_status(&mut self, status: SyncStatus) {
        if let SyncStatus::Failed(reason) = status {
            self.notice = Some(Notice {
                text: format!("Server sync failed: {reason}"),
                is_error: true,
            });
        }
    }

    fn start_ticker(&mut self) {
        self.generation += 1;
        self.ticker = Some(ClockTicker::spawn(self.tick_every, self.generation, self.pulse_tx.clone()));
    }

    pub fn stop_ticker(&mut self) {
        if let Some(ticker) = self.ticker.take() {
            ticker.stop();
        }
    }

    fn mirror(&mut self, op: SyncOp) {
        let Some(tx) = &self.sync_tx else {
            return;
        };
        if let Err(err) = tx.try_send(op) {
            warn!("sync queue unavailable: {err}");
            self.notice = Some(Notice {
                text: format!("Server sync failed: {err}"),
                is_error: true,
            });
        }
    }

    fn cancel(&mut self) {
        if let Mode::Substitute { .. } = self.mode {
            self.focus = Focus::Field;
        }
        self.mode = Mode::Normal;
        self.notice = None;
    }

    fn say(&mut self, text: impl Into<String>) {
        self.notice = Some(Notice {
            text: text.into(),
            is_error: false,
        });
    }

    fn fail(&mut self, err: CoreError) {
        warn!("rejected: {err}");
        self.notice = Some(Notice {
            text: err.to_string(),
            is_error: true,
        });
    }

    fn focused_len(&self) -> usize {
        match self.focus {
            Focus::Field => self.field().len(),
            Focus::Bench => self.bench_ids().len(),
        }
    }

    fn focused_state(&mut self) -> &mut ListState {
        match self.focus {
            Focus::Field => &mut self.field_state,
            Focus::Bench => &mut self.bench_state,
        }
    }

    fn next(&mut self) {
        let len = self.focused_len();
        if len == 0 {
            return;
        }
        let state = self.focused_state();
        let i = match state.selected() {
            Some(i) if i + 1 < len => i + 1,
            _ => 0,
        };
        state.select(Some(i));
    }

    fn previous(&mut self) {
        let len = self.focused_len();
        if len == 0 {
            return;
        }
        let state = self.focused_state();
        let i = match state.selected() {
            Some(0) | None => len - 1,
            Some(i) => i - 1,
        };
        state.select(Some(i));
    }

    fn picker_step(&mut self, delta: isize) {
        let len = self.picker_items().len() as isize;
        if len == 0 {
            return;
        }
        let current = self.picker_state.selected().unwrap_or(0) as isize;
        self.picker_state.select(Some((current + delta).rem_euclid(len) as usize));
    }

    fn clamp_selections(&mut self) {
        let bench = self.bench_ids().len();
        if self.bench_state.selected().is_some_and(|i| i >= bench) {
            self.bench_state.select(bench.checked_sub(1));
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_ticker();
        info!(match_id = self.session.match_id(), "session closed");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rugby_tracker::model::{Player, Team};
    use rugby_tracker::roster::default_lineup;
    use rugby_tracker::{MatchClock, MatchStatus, MemoryStore, StatRegistry};

    fn app() -> (App, mpsc::Receiver<ClockPulse>) {
        app_with_sync(None)
    }

    fn app_with_sync(sync_tx: Option<mpsc::Sender<SyncOp>>) -> (App, mpsc::Receiver<ClockPulse>) {
        let players: Vec<Player> = (1..=20)
            .map(|id| Player {
                id,
                team_id: 1,
                first_name: format!("P{id}"),
                last_name: "Test".into(),
                preferred_position: None,
                is_active: true,
            })
            .collect();
        let lineup = default_lineup(&players);
        let session = MatchSession::new(
            5,
            Team { id: 1, name: "Harbour RFC".into(), abbreviation: "HRB".into() },
            "Valley",
            players,
            StatRegistry::standard(),
            MatchClock::new(2, 60).unwrap(),
            MemoryStore::new(),
        );
        let (tx, rx) = mpsc::channel(16);
        let mut app = App::new(session, Duration::from_secs(1), tx, sync_tx);
        app.assign_lineup(&lineup);
        (app, rx)
    }

    #[tokio::test(start_paused = true)]
    async fn space_starts_and_pauses_the_ticker() {
        let (mut app, mut rx) = app();
        app.on_key(KeyCode::Char(' '));
        assert!(app.is_ticking());

        for _ in 0..3 {
            let pulse = rx.recv().await.unwrap();
            app.on_pulse(pulse);
        }
        assert_eq!(app.session.clock().elapsed_seconds(), 3);

        app.on_key(KeyCode::Char(' '));
        assert!(!app.is_ticking());
        assert!(!app.session.clock().is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn stale_pulses_are_ignored() {
        let (mut app, _rx) = app();
        app.on_key(KeyCode::Char(' '));
        app.on_key(KeyCode::Char(' '));
        app.on_key(KeyCode::Char(' '));

        app.on_pulse(ClockPulse { generation: 1 });
        assert_eq!(app.session.clock().elapsed_seconds(), 0);
        app.on_pulse(ClockPulse { generation: 2 });
        assert_eq!(app.session.clock().elapsed_seconds(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn expiry_stops_the_ticker() {
        let (mut app, _rx) = app();
        app.on_key(KeyCode::Char(' '));
        for _ in 0..60 {
            app.on_pulse(ClockPulse { generation: 1 });
        }
        assert!(!app.is_ticking());
        assert!(app.notice.as_ref().unwrap().text.starts_with("End of H1"));

        app.on_key(KeyCode::Char('n'));
        assert_eq!(app.session.clock().current_period(), 2);
    }

    #[tokio::test]
    async fn substitute_through_the_keys() {
        let (mut app, _rx) = app();
        app.on_key(KeyCode::Char('j'));
        assert_eq!(app.selected_field_player(), Some(2));

        app.on_key(KeyCode::Char('s'));
        assert_eq!(app.mode, Mode::Substitute { out_player: 2 });
        app.on_key(KeyCode::Char('j'));
        app.on_key(KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        let two = app.field().into_iter().find(|e| e.shirt_number == 2).unwrap();
        assert_eq!(two.player_id, 17);
        assert!(app.bench_ids().contains(&2));
    }

    #[tokio::test]
    async fn record_a_stat_with_a_value() {
        let (mut app, _rx) = app();
        app.on_key(KeyCode::Char('r'));
        let tackles = app.picker_items().iter().position(|s| s == "Tackles").unwrap();
        for _ in 0..tackles {
            app.on_key(KeyCode::Char('j'));
        }
        app.on_key(KeyCode::Char('4'));
        app.on_key(KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        assert_eq!(app.session.player_totals(1).get("Tackles"), Some(&4));
    }

    #[tokio::test]
    async fn rejected_intent_shows_an_error_and_keeps_state() {
        let (mut app, _rx) = app();
        app.on_key(KeyCode::Char('F'));
        app.on_key(KeyCode::Char('r'));
        app.on_key(KeyCode::Enter);

        assert!(app.notice.as_ref().unwrap().is_error);
        assert_eq!(app.session.events().count(), 0);
        assert!(matches!(app.mode, Mode::RecordStat { .. }));
        app.on_key(KeyCode::Esc);
        assert_eq!(app.mode, Mode::Normal);
    }

    #[tokio::test]
    async fn opponent_points() {
        let (mut app, _rx) = app();
        app.on_key(KeyCode::Char('o'));
        app.on_key(KeyCode::Enter);
        assert_eq!(app.session.opponent_score(), 5);
    }

    #[tokio::test(start_paused = true)]
    async fn abandon_stops_the_clock_and_closes_the_match() {
        let (mut app, mut rx) = app();
        app.on_key(KeyCode::Char(' '));
        let pulse = rx.recv().await.unwrap();
        app.on_pulse(pulse);

        app.on_key(KeyCode::Char('A'));
        assert!(!app.is_ticking());
        assert_eq!(app.session.status(), MatchStatus::Abandoned);
        assert_eq!(app.session.clock().elapsed_seconds(), 0);

        app.on_key(KeyCode::Char('A'));
        assert_eq!(app.notice.as_ref().unwrap().text, CoreError::MatchClosed.to_string());
    }

    #[tokio::test]
    async fn unsent_writes_are_reported() {
        let (sync_tx, sync_rx) = mpsc::channel(1);
        drop(sync_rx);
        let (mut app, _rx) = app_with_sync(Some(sync_tx));
        assert!(app.notice.as_ref().unwrap().is_error);
        app.notice = None;

        app.on_key(KeyCode::Char('s'));
        app.on_key(KeyCode::Enter);

        assert_eq!(app.mode, Mode::Normal);
        let notice = app.notice.as_ref().unwrap();
        assert!(notice.is_error);
        assert!(notice.text.starts_with("Server sync failed"));
        assert!(app.bench_ids().contains(&1));
    }
}
