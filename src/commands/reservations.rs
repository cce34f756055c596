use anyhow::Context as _;
use serde_json::json;

use super::{print_json, Ctx};
use crate::cli::{ReservationFields, ReservationsCommand};
use crate::error::DashboardError;
use crate::invoice::{export_reservation_invoice, render_html};
use crate::models::ReservationStatus;
use crate::pagination::controls;
use crate::reservations::{ReservationForm, ReservationsPage};
use crate::routes::Route;

fn apply_fields(form: &mut ReservationForm, fields: ReservationFields) -> anyhow::Result<()> {
    if let Some(name) = fields.name {
        form.customer_name = name;
    }
    if let Some(phone) = fields.phone {
        form.customer_phone = phone;
    }
    if let Some(size) = fields.party_size {
        form.party_size = size;
    }
    if let Some(time) = fields.time {
        form.reservation_time = time;
    }
    if let Some(table) = fields.table {
        form.table_id = Some(table);
    }
    if let Some(status) = fields.status {
        form.status = ReservationStatus::parse(&status)
            .with_context(|| format!("unknown reservation status {status:?}"))?;
    }
    Ok(())
}

fn listing(page: &ReservationsPage) -> serde_json::Value {
    let current = page.current_page();
    let pager = controls(current.page, current.total_pages);
    json!({
        "reservations": current,
        "controls": pager,
        "tables": page.views,
    })
}

pub(super) async fn run(ctx: &Ctx, cmd: ReservationsCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Reservations)?;
    let api = ctx.api.as_ref();
    let mut page = ReservationsPage::new(ctx.cfg.page_size);
    page.load(api).await?;

    match cmd {
        ReservationsCommand::List(arg) => {
            page.page = arg.page;
            print_json(&listing(&page))
        }
        ReservationsCommand::Options { party_size } => {
            page.form.party_size = party_size;
            print_json(&page.table_options())
        }
        ReservationsCommand::Add(fields) => {
            apply_fields(&mut page.form, fields)?;
            page.save(api).await?;
            print_json(&listing(&page))
        }
        ReservationsCommand::Edit { id, fields } => {
            page.edit(id)?;
            apply_fields(&mut page.form, fields)?;
            page.save(api).await?;
            print_json(&listing(&page))
        }
        ReservationsCommand::Remove { id } => {
            page.remove(api, id).await?;
            print_json(&listing(&page))
        }
        ReservationsCommand::Invoice { id, out_dir, html } => {
            let reservation = page
                .reservations
                .iter()
                .find(|r| r.id == id)
                .ok_or_else(|| DashboardError::validation("reservation not found"))?;
            let export = export_reservation_invoice(api, reservation, &out_dir).await?;
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
