//! Orders page: status filter, free-text search, and order drafts.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, MenuItemRef, Order, OrderStatus, ReservationRef, TableRef};
use crate::pagination::{page_slice, total_pages};

#[async_trait]
pub trait OrderApi: Send + Sync {
    async fn list_orders(&self) -> DashboardResult<Vec<Order>>;
    async fn create_order(&self, draft: &OrderDraft) -> DashboardResult<Value>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StatusFilter {
    #[default]
    All,
    Only(OrderStatus),
}

impl StatusFilter {
    pub fn parse(value: &str) -> Option<Self> {
        if value.trim().eq_ignore_ascii_case("all") {
            return Some(Self::All);
        }
        OrderStatus::parse(value).map(Self::Only)
    }

    pub fn matches(&self, status: OrderStatus) -> bool {
        match self {
            Self::All => true,
            Self::Only(s) => *s == status,
        }
    }
}

/// True when `term` occurs (case-insensitively) in the id, table name or
/// notes. A blank term matches everything.
pub fn matches_search(order: &Order, term: &str) -> bool {
    let term = term.trim().to_lowercase();
    if term.is_empty() {
        return true;
    }
    if order.id.to_string().contains(&term) {
        return true;
    }
    let table_name = order
        .table
        .as_ref()
        .and_then(|t| t.name.as_deref())
        .unwrap_or_default();
    let notes = order.notes.as_deref().unwrap_or_default();
    table_name.to_lowercase().contains(&term) || notes.to_lowercase().contains(&term)
}

pub fn filter_orders<'a>(orders: &'a [Order], filter: StatusFilter, term: &str) -> Vec<&'a Order> {
    orders
        .iter()
        .filter(|o| filter.matches(o.status) && matches_search(o, term))
        .collect()
}

// ---------------------------------------------------------------------------
// Drafts
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraftItem {
    pub menu_item: MenuItemRef,
    pub quantity: u32,
}

impl OrderDraftItem {
    /// Parse `MENU_ID[:QTY]`, quantity defaulting to 1.
    pub fn parse(spec: &str) -> DashboardResult<Self> {
        let (id, qty) = match spec.trim().split_once(':') {
            Some((id, qty)) => (id, qty),
            None => (spec.trim(), "1"),
        };
        let id = id
            .trim()
            .parse::<Id>()
            .map_err(|_| DashboardError::validation(format!("invalid menu item id: {id:?}")))?;
        let quantity = qty
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|q| *q >= 1)
            .ok_or_else(|| DashboardError::validation(format!("invalid quantity: {qty:?}")))?;
        Ok(Self {
            menu_item: MenuItemRef { id, name: None },
            quantity,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderDraft {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub table: Option<TableRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub customer_name: Option<String>,
    pub items: Vec<OrderDraftItem>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reservation: Option<ReservationRef>,
}

impl OrderDraft {
    pub fn validate(&self) -> DashboardResult<()> {
        if self.items.is_empty() {
            return Err(DashboardError::validation("order needs at least one item"));
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Page
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct OrdersView {
    pub page: usize,
    pub total_pages: usize,
    pub matching: usize,
    pub orders: Vec<Order>,
}

pub struct OrdersPage {
    pub orders: Vec<Order>,
    pub filter: StatusFilter,
    pub search: String,
    pub page: usize,
    pub page_size: usize,
    pub error: Option<String>,
}

impl OrdersPage {
    pub fn new(page_size: usize) -> Self {
        Self {
            orders: Vec::new(),
            filter: StatusFilter::All,
            search: String::new(),
            page: 1,
            page_size,
            error: None,
        }
    }

    pub async fn load<A: OrderApi + ?Sized>(&mut self, api: &A) -> DashboardResult<()> {
        match api.list_orders().await {
            Ok(orders) => {
                debug!(count = orders.len(), "orders loaded");
                self.orders = orders;
                self.error = None;
                Ok(())
            }
            Err(e) => {
                self.error = Some(e.user_message());
                Err(e)
            }
        }
    }

    /// Changing the filter or search term returns to page 1.
    pub fn set_filter(&mut self, filter: StatusFilter, search: &str) {
        self.filter = filter;
        self.search = search.to_string();
        self.page = 1;
    }

    /// Filtered page; always reports at least one page.
    pub fn view(&self) -> OrdersView {
        let filtered: Vec<Order> = filter_orders(&self.orders, self.filter, &self.search)
            .into_iter()
            .cloned()
            .collect();
        let pages = total_pages(filtered.len(), self.page_size).max(1);
        let page = self.page.clamp(1, pages);
        OrdersView {
            page,
            total_pages: pages,
            matching: filtered.len(),
            orders: page_slice(&filtered, page, self.page_size).to_vec(),
        }
    }

    pub async fn create<A: OrderApi + ?Sized>(
        &mut self,
        api: &A,
        draft: &OrderDraft,
    ) -> DashboardResult<Value> {
        draft.validate()?;
        let created = api.create_order(draft).await.inspect_err(|e| {
            self.error = Some(e.user_message());
        })?;
        info!(items = draft.items.len(), "order created");
        self.load(api).await?;
        Ok(created)
    }
}
