use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::clock::MatchClock;
use crate::error::Result;
use crate::model::{FixtureId, MatchId, TeamId};

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Live rugby match scorekeeper", long_about = None)]
pub struct Args {
    /// Club data file (team, players, stat types, fixtures)
    #[arg(short, long, default_value = "club_data.json")]
    pub data: PathBuf,

    /// Club server base URL; when set, club data is fetched from it and
    /// roster changes and stats are mirrored to it
    #[arg(long, env = "RUGBY_SERVER")]
    pub server: Option<String>,

    /// Team to load from the server
    #[arg(long, env = "RUGBY_TEAM", default_value_t = 1)]
    pub team: TeamId,

    /// Fixture being played; defaults to the next one in the club data
    #[arg(long)]
    pub fixture: Option<FixtureId>,

    /// Match id to record against; defaults to the fixture id
    #[arg(long)]
    pub match_id: Option<MatchId>,

    /// Number of periods (2 halves or 4 quarters)
    #[arg(long, default_value_t = 2, value_parser = clap::value_parser!(u8).range(2..=4))]
    pub periods: u8,

    /// Length of each period in minutes
    #[arg(long, default_value_t = 40, value_parser = clap::value_parser!(u32).range(1..=180))]
    pub period_minutes: u32,

    /// Clock tick interval in milliseconds (one match second per tick)
    #[arg(long, default_value_t = 1000)]
    pub tick_ms: u64,

    /// Log file; the terminal belongs to the UI
    #[arg(long, env = "RUGBY_LOG", default_value = "rugby-tracker.log")]
    pub log_file: PathBuf,

    /// Write a JSON match summary here on exit
    #[arg(long)]
    pub summary: Option<PathBuf>,
}

impl Args {
    pub fn clock(&self) -> Result<MatchClock> {
        MatchClock::new(self.periods, self.period_minutes.saturating_mul(60))
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::CoreError;

    #[test]
    fn defaults_are_two_forty_minute_halves() {
        let args = Args::try_parse_from(["rugby-tracker"]).unwrap();
        let clock = args.clock().unwrap();
        assert_eq!(clock.total_periods(), 2);
        assert_eq!(clock.period_length_seconds(), 2400);
        assert_eq!(args.tick_interval(), Duration::from_secs(1));
        assert_eq!(args.data, PathBuf::from("club_data.json"));
    }

    #[test]
    fn quarters_for_junior_matches() {
        let args =
            Args::try_parse_from(["rugby-tracker", "--periods", "4", "--period-minutes", "10"]).unwrap();
        let clock = args.clock().unwrap();
        assert_eq!(clock.period_label(), "Q1");
        assert_eq!(clock.seconds_remaining(), 600);
    }

    #[test]
    fn three_periods_is_not_a_rugby_match() {
        let args = Args::try_parse_from(["rugby-tracker", "--periods", "3"]).unwrap();
        assert!(matches!(args.clock(), Err(CoreError::InvalidMatchFormat(_))));
        assert!(Args::try_parse_from(["rugby-tracker", "--periods", "6"]).is_err());
    }

    #[test]
    fn period_length_is_bounded() {
        assert!(Args::try_parse_from(["rugby-tracker", "--period-minutes", "0"]).is_err());
        assert!(Args::try_parse_from(["rugby-tracker", "--period-minutes", "181"]).is_err());
        assert!(Args::try_parse_from(["rugby-tracker", "--period-minutes", "4294967295"]).is_err());

        let args = Args::try_parse_from(["rugby-tracker", "--periods", "4", "--period-minutes", "180"]).unwrap();
        assert_eq!(args.clock().unwrap().period_length_seconds(), 10_800);
    }
}
