//! Dining tables: display-status derivation and the tables page.
//!
//! The backend's `status` is the persisted, operational value. The
//! reservations screen overlays a display status computed from the
//! reservation list; both are kept side by side in [`TableView`] so the
//! overlay never overwrites what the backend said.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, Reservation, ReservationStatus, Table, TableStatus};
use crate::pagination::Page;

#[async_trait]
pub trait TableApi: Send + Sync {
    async fn list_tables(&self) -> DashboardResult<Vec<Table>>;
    async fn create_table(&self, draft: &TableDraft) -> DashboardResult<Value>;
    async fn update_table(&self, id: Id, draft: &TableDraft) -> DashboardResult<Value>;
    async fn delete_table(&self, id: Id) -> DashboardResult<Value>;
}

// ---------------------------------------------------------------------------
// Status derivation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableView {
    #[serde(flatten)]
    pub table: Table,
    pub display_status: TableStatus,
}

impl TableView {
    pub fn persisted_status(&self) -> TableStatus {
        self.table.status
    }
}

/// True when any non-cancelled reservation points at `table_id`.
pub fn is_reserved(table_id: Id, reservations: &[Reservation]) -> bool {
    reservations
        .iter()
        .any(|r| r.table_id() == Some(table_id) && r.status != ReservationStatus::Cancelled)
}

/// Display status for every table: RESERVED when a live reservation
/// references it, otherwise AVAILABLE.
pub fn derive_table_status(tables: &[Table], reservations: &[Reservation]) -> Vec<TableView> {
    tables
        .iter()
        .map(|t| TableView {
            table: t.clone(),
            display_status: if is_reserved(t.id, reservations) {
                TableStatus::Reserved
            } else {
                TableStatus::Available
            },
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Form
// ---------------------------------------------------------------------------

/// Validated table payload.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TableDraft {
    pub name: String,
    pub capacity: u32,
    pub status: TableStatus,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TableForm {
    pub name: String,
    /// Raw input; parsed on validation.
    pub capacity: String,
    pub status: TableStatus,
}

impl Default for TableForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            capacity: "2".to_string(),
            status: TableStatus::Available,
        }
    }
}

impl TableForm {
    pub fn from_table(table: &Table) -> Self {
        Self {
            name: table.name.clone(),
            capacity: table.capacity.unwrap_or(2).to_string(),
            status: table.status,
        }
    }

    pub fn validate(&self) -> DashboardResult<TableDraft> {
        let name = self.name.trim();
        if name.is_empty() {
            return Err(DashboardError::validation("table name required"));
        }
        let capacity = self
            .capacity
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|c| *c >= 1)
            .ok_or_else(|| DashboardError::validation("invalid capacity"))?;
        Ok(TableDraft {
            name: name.to_string(),
            capacity,
            status: self.status,
        })
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub struct TablesPage {
    pub tables: Vec<Table>,
    pub form: TableForm,
    pub editing: Option<Id>,
    pub page: usize,
    pub page_size: usize,
    pub error: Option<String>,
}

impl TablesPage {
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: Vec::new(),
            form: TableForm::default(),
            editing: None,
            page: 1,
            page_size,
            error: None,
        }
    }

    pub async fn load<A: TableApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        match api.list_tables().await {
            Ok(tables) => {
                debug!(count = tables.len(), "tables loaded");
                self.tables = tables;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    pub fn edit(&mut self, id: Id) -> DashboardResult<()> {
        let table = self
            .tables
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| DashboardError::validation("table not found"))?;
        self.form = TableForm::from_table(table);
        self.editing = Some(id);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.form = TableForm::default();
        self.editing = None;
    }

    /// Create or update from the form, then reload from page 1.
    pub async fn save<A: TableApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        let draft = match self.form.validate() {
            Ok(d) => d,
            Err(e) => {
                self.error = Some(e.user_message());
                return Err(e);
            }
        };
        let result = match self.editing {
            Some(id) => api.update_table(id, &draft).await,
            None => api.create_table(&draft).await,
        };
        if let Err(e) = result {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(name = %draft.name, editing = ?self.editing, "table saved");
        self.cancel();
        self.page = 1;
        self.load(api).await
    }

    pub async fn remove<A: TableApi + ?Sized>(&mut self, api: &A, id: Id) -> DashboardResult<()> {
        if let Err(e) = api.delete_table(id).await {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(table_id = id, "table deleted");
        self.page = 1;
        self.load(api).await
    }

    pub fn current_page(&self) -> Page<Table> {
        Page::of(&self.tables, self.page, self.page_size)
    }
}
