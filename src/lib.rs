//! # rugby-tracker
//!
//! Live match state for a rugby club scorekeeper: a period clock, the
//! on-field roster with substitutions, an append-only ledger of stat events,
//! and the totals and score derived from it.

pub mod aggregate;
pub mod clock;
pub mod config;
pub mod data;
pub mod error;
pub mod ledger;
pub mod model;
pub mod registry;
pub mod roster;
pub mod session;
pub mod store;
pub mod telemetry;
pub mod ticker;

pub use aggregate::{AggregateStatView, StatTotals};
pub use clock::{MatchClock, PeriodAdvance, TickOutcome};
pub use error::{CoreError, Result, StoreError};
pub use registry::StatRegistry;
pub use roster::Substitution;
pub use session::{MatchSession, MatchStatus, MatchSummary};
pub use store::{MatchStore, MemoryStore};
