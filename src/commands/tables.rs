use anyhow::Context as _;
use serde_json::json;

use super::{print_json, Ctx};
use crate::cli::TablesCommand;
use crate::models::TableStatus;
use crate::pagination::controls;
use crate::routes::Route;
use crate::tables::TablesPage;

pub(super) fn parse_table_status(raw: &str) -> anyhow::Result<TableStatus> {
    TableStatus::parse(raw).with_context(|| format!("unknown table status {raw:?}"))
}

pub(super) async fn run(ctx: &Ctx, cmd: TablesCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Tables)?;
    let api = ctx.api.as_ref();
    let mut page = TablesPage::new(ctx.cfg.page_size);

    match cmd {
        TablesCommand::List(arg) => {
            page.load(api).await?;
            page.page = arg.page;
        }
        TablesCommand::Add {
            name,
            capacity,
            status,
        } => {
            page.form.name = name;
            page.form.capacity = capacity;
            page.form.status = parse_table_status(&status)?;
            page.save(api).await?;
        }
        TablesCommand::Edit {
            id,
            name,
            capacity,
            status,
        } => {
            page.load(api).await?;
            page.edit(id)?;
            if let Some(name) = name {
                page.form.name = name;
            }
            if let Some(capacity) = capacity {
                page.form.capacity = capacity;
            }
            if let Some(status) = status {
                page.form.status = parse_table_status(&status)?;
            }
            page.save(api).await?;
        }
        TablesCommand::Remove { id } => page.remove(api, id).await?,
    }

    let current = page.current_page();
    let pager = controls(current.page, current.total_pages);
    print_json(&json!({ "tables": current, "controls": pager }))
}
