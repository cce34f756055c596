//! Waiter board: tables with their items, refreshed on a fixed interval.
//!
//! The poller runs as a background task for as long as the board is open
//! and is stopped through its [`CancellationToken`]. A failed refresh keeps
//! the last good list on screen and records the error next to it.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, WaiterTable};

#[async_trait]
pub trait WaiterApi: Send + Sync {
    async fn waiter_tables(&self) -> DashboardResult<Vec<WaiterTable>>;
    async fn serve_table(&self, table_id: Id) -> DashboardResult<Value>;
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct WaiterBoard {
    pub tables: Vec<WaiterTable>,
    pub error: Option<String>,
    pub refreshed_at: Option<DateTime<Utc>>,
    pub refreshes: u64,
}

impl WaiterBoard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch the board. On failure the previous tables stay in place.
    pub async fn refresh<A: WaiterApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        self.refreshes += 1;
        match api.waiter_tables().await {
            Ok(tables) => {
                debug!(count = tables.len(), "waiter board refreshed");
                self.tables = tables;
                self.error = None;
                self.refreshed_at = Some(Utc::now());
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "waiter board refresh failed, keeping last list");
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn can_serve(&self, table_id: Id) -> bool {
        self.tables
            .iter()
            .any(|t| t.table_id == table_id && t.all_items_done)
    }

    /// Mark a table served. Only allowed once every item is done.
    pub async fn serve<A: WaiterApi + ?Sized>(&mut self, api: &A, table_id: Id) -> DashboardResult<()> {
        let table = self
            .tables
            .iter()
            .find(|t| t.table_id == table_id)
            .ok_or_else(|| DashboardError::validation("table not on the waiter board"))?;
        if !table.all_items_done {
            return Err(DashboardError::validation(format!(
                "{} still has items in the kitchen",
                table.table_name
            )));
        }
        if let Err(e) = api.serve_table(table_id).await {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(table_id, "table served");
        self.refresh(api).await
    }
}

// ---------------------------------------------------------------------------
// Poller
// ---------------------------------------------------------------------------

pub struct WaiterPoller {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
    board: watch::Receiver<WaiterBoard>,
}

impl WaiterPoller {
    /// Start polling. The first refresh happens immediately.
    pub fn spawn<A>(api: Arc<A>, interval: Duration) -> Self
    where
        A: WaiterApi + ?Sized + 'static,
    {
        let cancel = CancellationToken::new();
        let (tx, rx) = watch::channel(WaiterBoard::new());
        let token = cancel.clone();

        let handle = tokio::spawn(async move {
            let mut board = WaiterBoard::new();
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!(interval_ms = interval.as_millis() as u64, "waiter poller started");
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = ticker.tick() => {
                        let _ = board.refresh(&*api).await;
                        tx.send_replace(board.clone());
                    }
                }
            }
            info!("waiter poller stopped");
        });

        Self {
            cancel,
            handle,
            board: rx,
        }
    }

    pub fn subscribe(&self) -> watch::Receiver<WaiterBoard> {
        self.board.clone()
    }

    pub fn snapshot(&self) -> WaiterBoard {
        self.board.borrow().clone()
    }

    pub fn cancellation(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Cancel the poll and wait for the task to finish.
    pub async fn stop(self) {
        self.cancel.cancel();
        if let Err(e) = self.handle.await {
            warn!("waiter poller task ended abnormally: {e}");
        }
    }
}
