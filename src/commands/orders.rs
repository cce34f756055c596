use anyhow::Context as _;
use serde_json::json;

use super::{print_json, Ctx};
use crate::cli::{BillingCommand, OrdersCommand};
use crate::error::DashboardError;
use crate::invoice::{export_order_invoice, render_html, BillingApi};
use crate::models::{ReservationRef, TableRef};
use crate::orders::{OrderApi, OrderDraft, OrderDraftItem, OrdersPage, StatusFilter};
use crate::pagination::controls;
use crate::routes::Route;

pub(super) async fn run(ctx: &Ctx, cmd: OrdersCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Orders)?;
    let api = ctx.api.as_ref();
    let mut page = OrdersPage::new(ctx.cfg.page_size);

    match cmd {
        OrdersCommand::List {
            status,
            search,
            page: arg,
        } => {
            let filter = StatusFilter::parse(&status)
                .with_context(|| format!("unknown order status {status:?}"))?;
            page.load(api).await?;
            page.set_filter(filter, &search);
            page.page = arg.page.max(1);
            let view = page.view();
            let pager = controls(view.page, view.total_pages);
            print_json(&json!({ "orders": view, "controls": pager }))
        }
        OrdersCommand::Create {
            table,
            customer,
            items,
            notes,
            reservation,
        } => {
            let items = items
                .iter()
                .map(|spec| OrderDraftItem::parse(spec))
                .collect::<Result<Vec<_>, _>>()?;
            let draft = OrderDraft {
                table: table.map(|id| TableRef {
                    id,
                    ..Default::default()
                }),
                customer_name: customer.filter(|c| !c.trim().is_empty()),
                items,
                notes: notes.filter(|n| !n.trim().is_empty()),
                reservation: reservation.map(|id| ReservationRef { id }),
            };
            let created = page.create(api, &draft).await?;
            print_json(&created)
        }
        OrdersCommand::Invoice { id, out_dir, html } => {
            let orders = api.list_orders().await?;
            let order = orders
                .iter()
                .find(|o| o.id == id)
                .ok_or_else(|| DashboardError::validation("order not found"))?;
            let export = export_order_invoice(api, order, &out_dir).await?;
            if html {
                let html_path = export.path.with_extension("html");
                tokio::fs::write(&html_path, render_html(&export.document))
                    .await
                    .with_context(|| format!("write {}", html_path.display()))?;
            }
            print_json(&export)
        }
    }
}

pub(super) async fn billing(ctx: &Ctx, cmd: BillingCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Orders)?;
    let api = ctx.api.as_ref();
    match cmd {
        BillingCommand::Show { order_id } => print_json(&api.invoice_for_order(order_id).await?),
        BillingCommand::Pay {
            invoice_id,
            amount,
            method,
        } => {
            if !amount.is_finite() || amount <= 0.0 {
                return Err(DashboardError::validation("amount must be positive").into());
            }
            let method = method.trim().to_ascii_uppercase();
            print_json(&api.pay_invoice(invoice_id, amount, &method).await?)
        }
    }
}
