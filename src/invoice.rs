//! Invoice export for completed reservations and orders.
//!
//! A reservation invoice covers every order linked to the reservation that
//! has at least one item; empty orders are skipped. The backend invoice is
//! created for each of those orders first, and the document is only written
//! when at least one of them succeeded. Rendering failures surface as
//! [`DashboardError::Document`] since the backend state is already saved by
//! then.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime};
use serde::Serialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::{DashboardError, DashboardResult};
use crate::models::{Id, Order, OrderItem, OrderStatus, Reservation, ReservationStatus};
use crate::orders::OrderApi;
use crate::pdf::{render_text_pdf, PageSetup};
use crate::reports::group_digits;

#[async_trait]
pub trait BillingApi: Send + Sync {
    async fn invoice_for_order(&self, order_id: Id) -> DashboardResult<Value>;
    async fn create_invoice(&self, order_id: Id) -> DashboardResult<Value>;
    async fn pay_invoice(&self, invoice_id: Id, amount: f64, method: &str) -> DashboardResult<Value>;
}

// ---------------------------------------------------------------------------
// Document
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvoiceLine {
    pub name: String,
    pub quantity: u32,
    pub unit_price: f64,
    pub line_total: f64,
}

impl From<&OrderItem> for InvoiceLine {
    fn from(item: &OrderItem) -> Self {
        Self {
            name: item.name().to_string(),
            quantity: item.quantity_or_default(),
            unit_price: item.unit_price(),
            line_total: item.line_total(),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvoiceSection {
    pub order_id: Id,
    pub lines: Vec<InvoiceLine>,
    pub order_total: f64,
}

impl From<&Order> for InvoiceSection {
    fn from(order: &Order) -> Self {
        Self {
            order_id: order.id,
            lines: order.items.iter().map(InvoiceLine::from).collect(),
            order_total: order.total_or_zero(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum InvoiceSource {
    Reservation(Id),
    Order(Id),
}

impl InvoiceSource {
    pub fn id(&self) -> Id {
        match self {
            Self::Reservation(id) | Self::Order(id) => *id,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct InvoiceDoc {
    pub source: InvoiceSource,
    pub customer_name: Option<String>,
    pub customer_phone: Option<String>,
    pub party_size: Option<u32>,
    pub table_name: Option<String>,
    pub time: Option<String>,
    pub sections: Vec<InvoiceSection>,
    pub grand_total: f64,
    pub printed_at: String,
}

/// Orders linked to the reservation that carry at least one item.
pub fn qualifying_orders(reservation_id: Id, orders: &[Order]) -> Vec<&Order> {
    orders
        .iter()
        .filter(|o| o.belongs_to_reservation(reservation_id) && !o.items.is_empty())
        .collect()
}

fn printed_at(now: &DateTime<Local>) -> String {
    now.format("%d/%m/%Y %H:%M:%S").to_string()
}

fn non_blank(value: &str) -> Option<String> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

pub fn reservation_invoice(
    reservation: &Reservation,
    orders: &[Order],
    now: &DateTime<Local>,
) -> DashboardResult<InvoiceDoc> {
    if reservation.status != ReservationStatus::Completed {
        return Err(DashboardError::validation(
            "invoice is only available for completed reservations",
        ));
    }
    if !orders.iter().any(|o| o.belongs_to_reservation(reservation.id)) {
        return Err(DashboardError::validation("no orders found for this reservation"));
    }
    let qualifying = qualifying_orders(reservation.id, orders);
    if qualifying.is_empty() {
        return Err(DashboardError::validation(
            "no orders with items for this reservation",
        ));
    }
    let sections: Vec<InvoiceSection> = qualifying.into_iter().map(InvoiceSection::from).collect();
    let grand_total = sections.iter().map(|s| s.order_total).sum();
    Ok(InvoiceDoc {
        source: InvoiceSource::Reservation(reservation.id),
        customer_name: non_blank(&reservation.customer_name),
        customer_phone: non_blank(&reservation.customer_phone),
        party_size: Some(reservation.party_size),
        table_name: reservation.table.as_ref().and_then(|t| t.name.clone()),
        time: reservation.reservation_time.clone(),
        sections,
        grand_total,
        printed_at: printed_at(now),
    })
}

pub fn order_invoice(order: &Order, now: &DateTime<Local>) -> DashboardResult<InvoiceDoc> {
    if order.status != OrderStatus::Completed {
        return Err(DashboardError::validation(
            "invoice is only available for completed orders",
        ));
    }
    if order.items.is_empty() {
        return Err(DashboardError::validation("order has no items"));
    }
    let section = InvoiceSection::from(order);
    let grand_total = section.order_total;
    Ok(InvoiceDoc {
        source: InvoiceSource::Order(order.id),
        customer_name: order
            .customer_name
            .clone()
            .or_else(|| order.created_by.as_ref().and_then(|u| u.full_name.clone())),
        customer_phone: None,
        party_size: None,
        table_name: order.table.as_ref().and_then(|t| t.name.clone()),
        time: order.created_at.clone(),
        sections: vec![section],
        grand_total,
        printed_at: printed_at(now),
    })
}

pub fn invoice_file_name(id: Id, now: &DateTime<Local>) -> String {
    format!("invoice_{id}_{}.pdf", now.format("%Y-%m-%d"))
}

// ---------------------------------------------------------------------------
// Rendering
// ---------------------------------------------------------------------------

fn money(value: f64) -> String {
    let value = if value.is_finite() { value } else { 0.0 };
    let rounded = value.abs().round() as u64;
    let sign = if value < 0.0 && rounded > 0 { "-" } else { "" };
    format!("{sign}{} VND", group_digits(rounded, '.'))
}

/// Reservation times arrive as ISO strings; show them day-first.
fn display_time(raw: &str) -> String {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return dt.with_timezone(&Local).format("%d/%m/%Y %H:%M").to_string();
    }
    for fmt in ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(raw, fmt) {
            return dt.format("%d/%m/%Y %H:%M").to_string();
        }
    }
    raw.to_string()
}

fn header_fields(doc: &InvoiceDoc) -> Vec<(&'static str, String)> {
    let mut fields = Vec::new();
    if let Some(name) = &doc.customer_name {
        fields.push(("Customer", name.clone()));
    }
    if let Some(phone) = &doc.customer_phone {
        fields.push(("Phone", phone.clone()));
    }
    if let Some(size) = doc.party_size {
        fields.push(("Guests", size.to_string()));
    }
    fields.push(("Table", doc.table_name.clone().unwrap_or_else(|| "-".into())));
    if let Some(time) = &doc.time {
        fields.push(("Time", display_time(time)));
    }
    fields
}

fn esc(input: &str) -> String {
    input
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

fn html_shell(title: &str, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="UTF-8"/>
<title>{}</title>
<style>
body {{ font-family: Arial, sans-serif; margin: 0; padding: 20px; color: #111; }}
h2 {{ text-align: center; margin-bottom: 20px; }}
.header {{ margin-bottom: 15px; border-bottom: 1px solid #ddd; padding-bottom: 10px; }}
.order {{ margin-bottom: 15px; padding: 10px; background: #f5f5f5; border-radius: 5px; }}
table {{ width: 100%; border-collapse: collapse; margin-bottom: 10px; }}
thead {{ background: #ddd; }}
th, td {{ padding: 5px; }}
.num {{ text-align: right; }}
.qty {{ text-align: center; }}
.total {{ text-align: right; font-size: 16px; }}
.grand {{ margin-top: 20px; padding-top: 15px; border-top: 2px solid #000; text-align: right; font-size: 18px; }}
.footer {{ margin-top: 30px; text-align: center; color: #666; font-size: 12px; }}
</style>
</head>
<body>{}</body>
</html>"#,
        esc(title),
        body
    )
}

pub fn render_html(doc: &InvoiceDoc) -> String {
    let mut body = String::from("<h2>INVOICE</h2><div class=\"header\">");
    for (label, value) in header_fields(doc) {
        body.push_str(&format!(
            "<p><strong>{label}:</strong> {}</p>",
            esc(&value)
        ));
    }
    body.push_str("</div><h3>Order details</h3>");
    for section in &doc.sections {
        body.push_str(&format!(
            "<div class=\"order\"><p><strong>Order #{}</strong></p><table><thead><tr>\
             <th>Item</th><th class=\"qty\">Qty</th><th class=\"num\">Price</th>\
             <th class=\"num\">Amount</th></tr></thead><tbody>",
            section.order_id
        ));
        for line in &section.lines {
            body.push_str(&format!(
                "<tr><td>{}</td><td class=\"qty\">{}</td><td class=\"num\">{}</td>\
                 <td class=\"num\"><strong>{}</strong></td></tr>",
                esc(&line.name),
                line.quantity,
                money(line.unit_price),
                money(line.line_total)
            ));
        }
        body.push_str(&format!(
            "</tbody></table><p class=\"total\"><strong>Total: {}</strong></p></div>",
            money(section.order_total)
        ));
    }
    body.push_str(&format!(
        "<div class=\"grand\"><strong>GRAND TOTAL: {}</strong></div>\
         <div class=\"footer\"><p>Thank you for dining with us</p><p>Printed: {}</p></div>",
        money(doc.grand_total),
        esc(&doc.printed_at)
    ));
    html_shell(&format!("Invoice {}", doc.source.id()), &body)
}

fn fit(text: &str, width: usize) -> String {
    let count = text.chars().count();
    if count <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}

/// Fixed-width text layout used for the PDF.
pub fn render_text(doc: &InvoiceDoc, width: usize) -> Vec<String> {
    const QTY: usize = 4;
    const AMOUNT: usize = 15;
    let name_w = width.saturating_sub(QTY + 2 * AMOUNT + 3).max(8);
    let rule = "-".repeat(width);

    let mut lines = vec![format!("{:^width$}", "INVOICE"), String::new()];
    for (label, value) in header_fields(doc) {
        lines.push(format!("{label}: {value}"));
    }
    lines.push(rule.clone());
    for section in &doc.sections {
        lines.push(format!("Order #{}", section.order_id));
        lines.push(format!(
            "{:<name_w$} {:>QTY$} {:>AMOUNT$} {:>AMOUNT$}",
            "Item", "Qty", "Price", "Amount"
        ));
        for line in &section.lines {
            lines.push(format!(
                "{:<name_w$} {:>QTY$} {:>AMOUNT$} {:>AMOUNT$}",
                fit(&line.name, name_w),
                line.quantity,
                money(line.unit_price),
                money(line.line_total)
            ));
        }
        lines.push(format!(
            "{:>width$}",
            format!("Total: {}", money(section.order_total))
        ));
        lines.push(String::new());
    }
    lines.push(rule);
    lines.push(format!(
        "{:>width$}",
        format!("GRAND TOTAL: {}", money(doc.grand_total))
    ));
    lines.push(String::new());
    lines.push(format!("{:^width$}", "Thank you for dining with us"));
    lines.push(format!("{:^width$}", format!("Printed: {}", doc.printed_at)));
    lines
}

// ---------------------------------------------------------------------------
// Export
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct InvoiceExport {
    pub path: PathBuf,
    pub document: InvoiceDoc,
    /// Backend invoices created for this export.
    pub invoices: Vec<Value>,
    /// Per-order creation failures, `Order <id>: <message>`.
    pub failures: Vec<String>,
}

/// Create the backend invoice for every order. Fails only when none could
/// be created; a rejected session aborts immediately.
async fn create_invoices<A: BillingApi + ?Sized>(
    api: &A,
    order_ids: &[Id],
) -> DashboardResult<(Vec<Value>, Vec<String>)> {
    let mut invoices = Vec::new();
    let mut failures = Vec::new();
    let mut first_error: Option<DashboardError> = None;
    for id in order_ids {
        match api.create_invoice(*id).await {
            Ok(inv) => invoices.push(inv),
            Err(DashboardError::Unauthorized) => return Err(DashboardError::Unauthorized),
            Err(e) => {
                warn!(order_id = id, error = %e, "invoice creation failed");
                failures.push(format!("Order {id}: {}", e.user_message()));
                first_error.get_or_insert(e);
            }
        }
    }
    if invoices.is_empty() {
        let message = format!("Could not create any invoice. {}", failures.join("; "));
        return Err(match first_error {
            Some(DashboardError::Backend { status, .. }) => DashboardError::Backend { status, message },
            _ => DashboardError::Network(message),
        });
    }
    Ok((invoices, failures))
}

async fn write_pdf(doc: &InvoiceDoc, path: &Path) -> DashboardResult<()> {
    let setup = PageSetup::default();
    let bytes = render_text_pdf(&render_text(doc, setup.chars_per_line()), &setup)?;
    if let Some(parent) = path.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|e| DashboardError::Document(format!("create {}: {e}", parent.display())))?;
    }
    tokio::fs::write(path, bytes)
        .await
        .map_err(|e| DashboardError::Document(format!("write {}: {e}", path.display())))
}

pub async fn export_reservation_invoice<A>(
    api: &A,
    reservation: &Reservation,
    out_dir: &Path,
) -> DashboardResult<InvoiceExport>
where
    A: OrderApi + BillingApi + ?Sized,
{
    if reservation.status != ReservationStatus::Completed {
        return Err(DashboardError::validation(
            "invoice is only available for completed reservations",
        ));
    }
    let orders = api.list_orders().await?;
    let now = Local::now();
    let document = reservation_invoice(reservation, &orders, &now)?;
    let ids: Vec<Id> = document.sections.iter().map(|s| s.order_id).collect();
    let (invoices, failures) = create_invoices(api, &ids).await?;

    let path = out_dir.join(invoice_file_name(reservation.id, &now));
    write_pdf(&document, &path).await?;
    info!(
        reservation_id = reservation.id,
        orders = ids.len(),
        failed = failures.len(),
        path = %path.display(),
        "reservation invoice exported"
    );
    Ok(InvoiceExport {
        path,
        document,
        invoices,
        failures,
    })
}

pub async fn export_order_invoice<A: BillingApi + ?Sized>(
    api: &A,
    order: &Order,
    out_dir: &Path,
) -> DashboardResult<InvoiceExport> {
    let now = Local::now();
    let document = order_invoice(order, &now)?;
    let (invoices, failures) = create_invoices(api, &[order.id]).await?;
    let path = out_dir.join(invoice_file_name(order.id, &now));
    write_pdf(&document, &path).await?;
    info!(order_id = order.id, path = %path.display(), "order invoice exported");
    Ok(InvoiceExport {
        path,
        document,
        invoices,
        failures,
    })
}
