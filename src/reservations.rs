//! Reservations: the pre-submission gate and the reservations page.
//!
//! Validation is a best-effort pre-check run before any request; the
//! backend remains the source of truth. After every mutation both lists are
//! reloaded and the table display status is recomputed.

use std::sync::OnceLock;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{info, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, Reservation, ReservationStatus, Table, TableRef, TableStatus};
use crate::pagination::Page;
use crate::tables::{derive_table_status, TableApi, TableView};

#[async_trait]
pub trait ReservationApi: Send + Sync {
    async fn list_reservations(&self) -> DashboardResult<Vec<Reservation>>;
    async fn create_reservation(&self, payload: &ReservationPayload) -> DashboardResult<Value>;
    async fn update_reservation(&self, id: Id, payload: &ReservationPayload)
        -> DashboardResult<Value>;
    async fn delete_reservation(&self, id: Id) -> DashboardResult<Value>;
}

/// First failing rule of the reservation gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ReservationError {
    #[error("name required")]
    NameRequired,
    #[error("invalid phone")]
    InvalidPhone,
    #[error("invalid party size")]
    InvalidPartySize,
    #[error("select a table")]
    TableNotSelected,
    #[error("table not found")]
    TableNotFound,
    #[error("party too large for table")]
    PartyTooLarge { party: u32, capacity: u32 },
}

fn phone_pattern() -> &'static Regex {
    static PHONE: OnceLock<Regex> = OnceLock::new();
    PHONE.get_or_init(|| Regex::new(r"^[0-9]{9,11}$").expect("static phone pattern"))
}

/// Digits only, 9 to 11 of them. Surrounding whitespace is rejected.
pub fn is_valid_phone(phone: &str) -> bool {
    phone_pattern().is_match(phone)
}

/// Parse a party size: a whole number of at least one guest.
pub fn parse_party_size(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|n| *n >= 1)
}

// ---------------------------------------------------------------------------
// Form and payload
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub struct ReservationForm {
    pub customer_name: String,
    pub customer_phone: String,
    /// Raw input; parsed by [`validate_reservation`].
    pub party_size: String,
    /// ISO timestamp; empty means now.
    pub reservation_time: String,
    pub table_id: Option<Id>,
    pub status: ReservationStatus,
}

impl Default for ReservationForm {
    fn default() -> Self {
        Self {
            customer_name: String::new(),
            customer_phone: String::new(),
            party_size: "2".to_string(),
            reservation_time: String::new(),
            table_id: None,
            status: ReservationStatus::Confirmed,
        }
    }
}

impl ReservationForm {
    pub fn from_reservation(r: &Reservation) -> Self {
        Self {
            customer_name: r.customer_name.clone(),
            customer_phone: r.customer_phone.clone(),
            party_size: r.party_size.to_string(),
            reservation_time: r.reservation_time.clone().unwrap_or_default(),
            table_id: r.table_id(),
            status: r.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ReservationPayload {
    pub customer_name: String,
    pub customer_phone: String,
    pub party_size: u32,
    pub reservation_time: String,
    pub table_id: Id,
    /// Nested reference some backends expect on update.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableRef>,
    pub status: ReservationStatus,
}

/// Run the gate. Rules apply in order and the first failure wins.
pub fn validate_reservation(
    form: &ReservationForm,
    tables: &[Table],
) -> Result<ReservationPayload, ReservationError> {
    let name = form.customer_name.trim();
    if name.is_empty() {
        return Err(ReservationError::NameRequired);
    }
    if !is_valid_phone(&form.customer_phone) {
        return Err(ReservationError::InvalidPhone);
    }
    let party = parse_party_size(&form.party_size).ok_or(ReservationError::InvalidPartySize)?;
    let table_id = form.table_id.ok_or(ReservationError::TableNotSelected)?;
    let table = tables
        .iter()
        .find(|t| t.id == table_id)
        .ok_or(ReservationError::TableNotFound)?;
    if let Some(capacity) = table.capacity {
        if party > capacity {
            return Err(ReservationError::PartyTooLarge { party, capacity });
        }
    }

    let time = form.reservation_time.trim();
    let reservation_time = if time.is_empty() {
        Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
    } else {
        time.to_string()
    };

    Ok(ReservationPayload {
        customer_name: name.to_string(),
        customer_phone: form.customer_phone.clone(),
        party_size: party,
        reservation_time,
        table_id,
        table: None,
        status: form.status,
    })
}

// ---------------------------------------------------------------------------
// Table selector
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TableOption {
    pub id: Id,
    pub label: String,
    pub disabled: bool,
    pub display_status: TableStatus,
}

/// Selector options for the current form state.
pub fn table_options(views: &[TableView], form: &ReservationForm) -> Vec<TableOption> {
    let party = parse_party_size(&form.party_size).unwrap_or(0);
    views
        .iter()
        .map(|v| {
            let too_small = v.table.capacity.is_some_and(|c| party > c);
            let selected = form.table_id == Some(v.table.id);
            let capacity = v
                .table
                .capacity
                .map(|c| c.to_string())
                .unwrap_or_else(|| "—".to_string());
            let mut label = format!("{} (capacity {})", v.table.name, capacity);
            if too_small {
                label.push_str(" - not enough seats");
            }
            TableOption {
                id: v.table.id,
                label,
                disabled: too_small || (!selected && v.display_status != TableStatus::Available),
                display_status: v.display_status,
            }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

pub struct ReservationsPage {
    pub tables: Vec<Table>,
    pub reservations: Vec<Reservation>,
    pub views: Vec<TableView>,
    pub form: ReservationForm,
    pub editing: Option<Id>,
    pub page: usize,
    pub page_size: usize,
    pub error: Option<String>,
}

impl ReservationsPage {
    pub fn new(page_size: usize) -> Self {
        Self {
            tables: Vec::new(),
            reservations: Vec::new(),
            views: Vec::new(),
            form: ReservationForm::default(),
            editing: None,
            page: 1,
            page_size,
            error: None,
        }
    }

    /// Reload tables and reservations, keeping the previous data on failure.
    pub async fn load<A>(&mut self, api: &A) -> DashboardResult<()>
    where
        A: TableApi + ReservationApi + ?Sized,
    {
        let tables = api.list_tables().await;
        let reservations = api.list_reservations().await;
        let mut first_err = None;
        match tables {
            Ok(t) => self.tables = t,
            Err(e) => first_err = Some(e),
        }
        match reservations {
            Ok(r) => self.reservations = r,
            Err(e) => {
                first_err.get_or_insert(e);
            }
        }
        self.recompute();
        match first_err {
            Some(e) => {
                warn!(error = %e, "reservations page reload failed");
                self.error = Some(e.user_message());
                Err(e)
            }
            None => {
                self.error = None;
                Ok(())
            }
        }
    }

    pub fn recompute(&mut self) {
        self.views = derive_table_status(&self.tables, &self.reservations);
    }

    pub fn table_options(&self) -> Vec<TableOption> {
        table_options(&self.views, &self.form)
    }

    pub fn edit(&mut self, id: Id) -> DashboardResult<()> {
        let r = self
            .reservations
            .iter()
            .find(|r| r.id == id)
            .ok_or_else(|| DashboardError::validation("reservation not found"))?;
        self.form = ReservationForm::from_reservation(r);
        self.editing = Some(id);
        Ok(())
    }

    pub fn cancel(&mut self) {
        self.form = ReservationForm::default();
        self.editing = None;
    }

    /// Validate, then create or update, then reload both lists.
    pub async fn save<A>(&mut self, api: &A) -> DashboardResult<()>
    where
        A: TableApi + ReservationApi + ?Sized,
    {
        let mut payload = match validate_reservation(&self.form, &self.tables) {
            Ok(p) => p,
            Err(e) => {
                self.error = Some(e.to_string());
                return Err(e.into());
            }
        };
        let result = match self.editing {
            Some(id) => {
                payload.table = Some(TableRef {
                    id: payload.table_id,
                    ..Default::default()
                });
                api.update_reservation(id, &payload).await
            }
            None => api.create_reservation(&payload).await,
        };
        if let Err(e) = result {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(
            table_id = payload.table_id,
            party_size = payload.party_size,
            editing = ?self.editing,
            "reservation saved"
        );
        self.cancel();
        self.load(api).await
    }

    pub async fn remove<A>(&mut self, api: &A, id: Id) -> DashboardResult<()>
    where
        A: TableApi + ReservationApi + ?Sized,
    {
        if let Err(e) = api.delete_reservation(id).await {
            self.error = Some(e.user_message());
            return Err(e);
        }
        info!(reservation_id = id, "reservation deleted");
        if self.editing == Some(id) {
            self.cancel();
        }
        self.load(api).await
    }

    pub fn current_page(&self) -> Page<Reservation> {
        Page::of(&self.reservations, self.page, self.page_size)
    }
}
