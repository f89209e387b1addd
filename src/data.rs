use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::model::{ClubData, Fixture, MatchId, Player, RosterEntry, StatEvent, StatType, Team, TeamId};
use crate::roster::Substitution;

const SYNC_ATTEMPTS: u32 = 3;
const SYNC_BACKOFF: Duration = Duration::from_millis(500);

/// Client for the club server's REST API.
pub struct DataClient {
    client: Client,
    base_url: String,
}

impl DataClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path)
    }

    async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let url = self.url(path);
        let resp = self.client.get(&url).send().await?.error_for_status()?;
        let data = resp
            .json::<T>()
            .await
            .with_context(|| format!("decoding response from {url}"))?;
        Ok(data)
    }

    async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<()> {
        let url = self.url(path);
        self.client
            .post(&url)
            .json(body)
            .send()
            .await?
            .error_for_status()
            .with_context(|| format!("POST {url}"))?;
        Ok(())
    }

    pub async fn fetch_club(&self, team_id: TeamId) -> Result<ClubData> {
        let team: Team = self.get_json(&format!("teams/{team_id}")).await?;
        let players: Vec<Player> = self.get_json(&format!("players?teamId={team_id}")).await?;
        let stat_types: Vec<StatType> = self.get_json("stat-types").await?;
        let fixtures: Vec<Fixture> = self.get_json(&format!("fixtures?teamId={team_id}")).await?;
        info!(team = %team.name, players = players.len(), "club data fetched");

        Ok(ClubData {
            team,
            players,
            stat_types,
            fixtures,
            lineup: Vec::new(),
        })
    }

    pub async fn push(&self, op: &SyncOp) -> Result<()> {
        match op {
            SyncOp::Lineup { entries, .. } => self.post_json(&op.path(), entries).await,
            SyncOp::Substitution { substitution, .. } => self.post_json(&op.path(), substitution).await,
            SyncOp::Stat(event) => self.post_json(&op.path(), event).await,
        }
    }

    /// Sends `op` until it succeeds or the attempts run out. A substitution
    /// travels as one request, so a retry always resends both halves.
    pub async fn push_with_retry(&self, op: &SyncOp) -> Result<()> {
        let mut attempt = 1;
        loop {
            match self.push(op).await {
                Ok(()) => return Ok(()),
                Err(err) if attempt < SYNC_ATTEMPTS => {
                    warn!(attempt, path = %op.path(), "sync failed, retrying: {err:#}");
                    tokio::time::sleep(SYNC_BACKOFF * attempt).await;
                    attempt += 1;
                }
                Err(err) => return Err(err.context(format!("giving up on {}", op.path()))),
            }
        }
    }
}

pub fn load_club_file(path: &Path) -> Result<ClubData> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("reading club data from {}", path.display()))?;
    let data: ClubData = serde_json::from_str(&content)
        .with_context(|| format!("parsing club data in {}", path.display()))?;
    Ok(data)
}

/// A write to mirror onto the club server.
#[derive(Debug, Clone, PartialEq)]
pub enum SyncOp {
    Lineup { match_id: MatchId, entries: Vec<RosterEntry> },
    Substitution { match_id: MatchId, substitution: Substitution },
    Stat(StatEvent),
}

impl SyncOp {
    pub fn path(&self) -> String {
        match self {
            SyncOp::Lineup { match_id, .. } => format!("games/{match_id}/roster"),
            SyncOp::Substitution { match_id, .. } => format!("games/{match_id}/substitutions"),
            SyncOp::Stat(event) => format!("games/{}/stats", event.match_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncStatus {
    Synced(String),
    Failed(String),
}

/// Mirrors writes in the order they were made, one at a time.
pub fn spawn_sync(
    client: Arc<DataClient>,
    mut rx: mpsc::Receiver<SyncOp>,
    status_tx: mpsc::Sender<SyncStatus>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(op) = rx.recv().await {
            let status = match client.push_with_retry(&op).await {
                Ok(()) => SyncStatus::Synced(op.path()),
                Err(err) => {
                    warn!("{err:#}");
                    SyncStatus::Failed(format!("{err:#}"))
                }
            };
            let _ = status_tx.send(status).await;
        }
    })
}
