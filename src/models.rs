//! Wire data model of the restaurant backend.
//!
//! Field names follow the backend's camelCase JSON. Optional fields default
//! leniently so a partially populated record still decodes.

use serde::{Deserialize, Deserializer, Serialize};

pub type Id = i64;

/// Treat an explicit `null` like a missing key.
fn null_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ---------------------------------------------------------------------------
// Tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TableStatus {
    #[default]
    Available,
    Occupied,
    Reserved,
}

impl TableStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Available => "AVAILABLE",
            Self::Occupied => "OCCUPIED",
            Self::Reserved => "RESERVED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "AVAILABLE" => Some(Self::Available),
            "OCCUPIED" => Some(Self::Occupied),
            "RESERVED" => Some(Self::Reserved),
            _ => None,
        }
    }
}

/// A dining table as the backend stores it. `status` is the authoritative,
/// persisted value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Table {
    pub id: Id,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default, deserialize_with = "null_default")]
    pub status: TableStatus,
}

/// Nested table reference carried by reservations and orders.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct TableRef {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
}

// ---------------------------------------------------------------------------
// Reservations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ReservationStatus {
    Pending,
    #[default]
    Confirmed,
    Completed,
    Cancelled,
}

impl ReservationStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Confirmed => "CONFIRMED",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "PENDING" => Some(Self::Pending),
            "CONFIRMED" => Some(Self::Confirmed),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Reservation {
    pub id: Id,
    #[serde(default, deserialize_with = "null_default")]
    pub customer_name: String,
    #[serde(default, deserialize_with = "null_default")]
    pub customer_phone: String,
    #[serde(default, deserialize_with = "null_default")]
    pub party_size: u32,
    #[serde(default)]
    pub reservation_time: Option<String>,
    #[serde(default)]
    pub table: Option<TableRef>,
    #[serde(default, deserialize_with = "null_default")]
    pub status: ReservationStatus,
}

impl Reservation {
    pub fn table_id(&self) -> Option<Id> {
        self.table.as_ref().map(|t| t.id)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReservationRef {
    pub id: Id,
}

// ---------------------------------------------------------------------------
// Orders
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatus {
    #[default]
    New,
    InProgress,
    Completed,
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 4] = [
        OrderStatus::New,
        OrderStatus::InProgress,
        OrderStatus::Completed,
        OrderStatus::Cancelled,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::InProgress => "IN_PROGRESS",
            Self::Completed => "COMPLETED",
            Self::Cancelled => "CANCELLED",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().replace('-', "_").as_str() {
            "NEW" => Some(Self::New),
            "IN_PROGRESS" => Some(Self::InProgress),
            "COMPLETED" => Some(Self::Completed),
            "CANCELLED" | "CANCELED" => Some(Self::Cancelled),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemRef {
    pub id: Id,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct UserRef {
    pub id: Id,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub full_name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    #[serde(default)]
    pub id: Option<Id>,
    #[serde(default)]
    pub menu_item: Option<MenuItemRef>,
    #[serde(default)]
    pub quantity: Option<u32>,
    /// Unit price at the time of ordering.
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub status: Option<KitchenItemStatus>,
}

impl OrderItem {
    pub fn name(&self) -> &str {
        self.menu_item
            .as_ref()
            .and_then(|m| m.name.as_deref())
            .unwrap_or("N/A")
    }

    pub fn quantity_or_default(&self) -> u32 {
        self.quantity.filter(|q| *q > 0).unwrap_or(1)
    }

    pub fn unit_price(&self) -> f64 {
        self.price.unwrap_or(0.0)
    }

    pub fn line_total(&self) -> f64 {
        self.unit_price() * f64::from(self.quantity_or_default())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: Id,
    #[serde(default)]
    pub table: Option<TableRef>,
    #[serde(default)]
    pub customer_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<UserRef>,
    #[serde(default, deserialize_with = "null_default")]
    pub status: OrderStatus,
    #[serde(default)]
    pub total: Option<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub items: Vec<OrderItem>,
    #[serde(default)]
    pub reservation: Option<ReservationRef>,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub created_at: Option<String>,
}

impl Order {
    pub fn total_or_zero(&self) -> f64 {
        self.total.filter(|t| t.is_finite()).unwrap_or(0.0)
    }

    pub fn belongs_to_reservation(&self, reservation_id: Id) -> bool {
        self.reservation.as_ref().map(|r| r.id) == Some(reservation_id)
    }
}

// ---------------------------------------------------------------------------
// Kitchen
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KitchenItemStatus {
    #[default]
    Pending,
    Cooking,
    Done,
}

impl KitchenItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "PENDING",
            Self::Cooking => "COOKING",
            Self::Done => "DONE",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct KitchenItem {
    pub id: Id,
    pub order_id: Id,
    #[serde(default)]
    pub menu_item_name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub status: KitchenItemStatus,
}

// ---------------------------------------------------------------------------
// Menu, employees
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MenuItem {
    pub id: Id,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub price: f64,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub available: bool,
    #[serde(default)]
    pub image: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: Id,
    #[serde(default, deserialize_with = "null_default")]
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Employee {
    pub id: Id,
    #[serde(default, deserialize_with = "null_default")]
    pub username: String,
    #[serde(default)]
    pub full_name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub roles: Vec<Role>,
}

impl Employee {
    pub fn role_names(&self) -> String {
        self.roles
            .iter()
            .map(|r| r.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

// ---------------------------------------------------------------------------
// Waiter board, reports, auth
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaiterItem {
    #[serde(default)]
    pub item_id: Option<Id>,
    #[serde(default)]
    pub menu_item_name: Option<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub quantity: u32,
    #[serde(default, deserialize_with = "null_default")]
    pub item_status: KitchenItemStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaiterTable {
    pub table_id: Id,
    #[serde(default, deserialize_with = "null_default")]
    pub table_name: String,
    #[serde(default)]
    pub capacity: Option<u32>,
    #[serde(default, deserialize_with = "null_default")]
    pub items: Vec<WaiterItem>,
    #[serde(default, deserialize_with = "null_default")]
    pub all_items_done: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReportSummary {
    #[serde(default, deserialize_with = "null_default")]
    pub total_orders: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub revenue: f64,
    #[serde(default, deserialize_with = "null_default")]
    pub in_progress: u64,
    #[serde(default, deserialize_with = "null_default")]
    pub completed: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct MonthlyReport {
    #[serde(default, deserialize_with = "null_default")]
    pub months: Vec<String>,
    #[serde(default, deserialize_with = "null_default")]
    pub revenues: Vec<f64>,
    #[serde(default, deserialize_with = "null_default")]
    pub orders: Vec<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoginResponse {
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reservation_decodes_nested_table_and_status() {
        let r: Reservation = serde_json::from_value(serde_json::json!({
            "id": 7,
            "customerName": "Lan",
            "customerPhone": "0912345678",
            "partySize": 4,
            "reservationTime": "2026-03-01T19:00:00",
            "table": { "id": 3, "name": "Corner", "capacity": 4 },
            "status": "CANCELLED"
        }))
        .expect("reservation decodes");
        assert_eq!(r.table_id(), Some(3));
        assert_eq!(r.status, ReservationStatus::Cancelled);
    }

    #[test]
    fn explicit_nulls_decode_as_defaults() {
        let orders: Vec<Order> = serde_json::from_value(serde_json::json!([
            { "id": 1, "status": null, "items": null, "reservation": { "id": 7 } },
            { "id": 2, "status": "COMPLETED", "items": [] }
        ]))
        .expect("orders decode");
        assert!(orders[0].items.is_empty());
        assert_eq!(orders[0].status, OrderStatus::New);
        assert_eq!(orders[1].status, OrderStatus::Completed);

        let r: Reservation = serde_json::from_value(serde_json::json!({
            "id": 9,
            "customerName": null,
            "customerPhone": null,
            "partySize": null,
            "status": null
        }))
        .expect("reservation decodes");
        assert_eq!(r.customer_phone, "");
        assert_eq!(r.party_size, 0);
        assert_eq!(r.status, ReservationStatus::Confirmed);

        let t: Table = serde_json::from_value(serde_json::json!({
            "id": 3, "name": null, "status": null
        }))
        .expect("table decodes");
        assert_eq!(t.status, TableStatus::Available);
        assert_eq!(t.name, "");
    }

    #[test]
    fn order_item_defaults_quantity_and_price() {
        let item: OrderItem = serde_json::from_value(serde_json::json!({
            "menuItem": { "id": 1, "name": "Pho" }
        }))
        .expect("item decodes");
        assert_eq!(item.quantity_or_default(), 1);
        assert_eq!(item.line_total(), 0.0);

        let item = OrderItem {
            quantity: Some(3),
            price: Some(45_000.0),
            ..Default::default()
        };
        assert_eq!(item.line_total(), 135_000.0);
        assert_eq!(item.name(), "N/A");
    }

    #[test]
    fn order_status_parses_loose_spellings() {
        assert_eq!(OrderStatus::parse("in-progress"), Some(OrderStatus::InProgress));
        assert_eq!(OrderStatus::parse("canceled"), Some(OrderStatus::Cancelled));
        assert_eq!(OrderStatus::parse("ALL"), None);
        let json = serde_json::to_value(OrderStatus::InProgress).expect("serialize");
        assert_eq!(json, serde_json::json!("IN_PROGRESS"));
    }
}
