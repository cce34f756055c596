use serde_json::json;

use super::{print_json, Ctx};
use crate::cli::{MenuCommand, MenuFields};
use crate::menu::{MenuForm, MenuPage};
use crate::pagination::controls;
use crate::routes::Route;

fn apply_fields(form: &mut MenuForm, fields: MenuFields) {
    if let Some(name) = fields.name {
        form.name = name;
    }
    if let Some(description) = fields.description {
        form.description = description;
    }
    if let Some(price) = fields.price {
        form.price = price;
    }
    if let Some(category) = fields.category {
        form.category = category;
    }
    if let Some(available) = fields.available {
        form.available = available;
    }
    // No image on edit keeps the one already stored.
    form.image = fields.image;
}

pub(super) async fn run(ctx: &Ctx, cmd: MenuCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Menu)?;
    let api = ctx.api.as_ref();
    let mut page = MenuPage::new(ctx.cfg.page_size);

    match cmd {
        MenuCommand::List(arg) => {
            page.load(api).await?;
            page.page = arg.page;
        }
        MenuCommand::Add(fields) => {
            apply_fields(&mut page.form, fields);
            page.save(api).await?;
        }
        MenuCommand::Edit { id, fields } => {
            page.load(api).await?;
            page.edit(id)?;
            apply_fields(&mut page.form, fields);
            page.save(api).await?;
        }
        MenuCommand::Remove { id } => page.remove(api, id).await?,
    }

    let current = page.current_page();
    let pager = controls(current.page, current.total_pages);
    print_json(&json!({ "menu": current, "controls": pager }))
}
