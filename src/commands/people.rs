use serde_json::json;
use zeroize::Zeroizing;

use super::{print_json, Ctx};
use crate::cli::{EmployeeFields, EmployeesCommand};
use crate::employees::{EmployeeForm, EmployeesPage};
use crate::error::DashboardError;
use crate::models::{Id, Role};
use crate::pagination::controls;
use crate::routes::Route;

/// Resolve `--role` given as an id or a role name.
fn resolve_role(roles: &[Role], wanted: &str) -> Result<Id, DashboardError> {
    let wanted = wanted.trim();
    if let Ok(id) = wanted.parse::<Id>() {
        return Ok(id);
    }
    roles
        .iter()
        .find(|r| r.name.eq_ignore_ascii_case(wanted))
        .map(|r| r.id)
        .ok_or_else(|| DashboardError::validation(format!("unknown role {wanted:?}")))
}

fn apply_fields(
    form: &mut EmployeeForm,
    roles: &[Role],
    fields: EmployeeFields,
) -> Result<(), DashboardError> {
    if let Some(full_name) = fields.full_name {
        form.full_name = full_name;
    }
    if let Some(email) = fields.email {
        form.email = email;
    }
    if let Some(phone) = fields.phone {
        form.phone = phone;
    }
    if let Some(role) = fields.role {
        form.role_id = Some(resolve_role(roles, &role)?);
    }
    if let Some(password) = fields.password {
        form.password = Zeroizing::new(password);
    }
    Ok(())
}

pub(super) async fn run(ctx: &Ctx, cmd: EmployeesCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Employees)?;
    let api = ctx.api.as_ref();
    let mut page = EmployeesPage::new(ctx.cfg.page_size);
    page.load(api).await?;

    match cmd {
        EmployeesCommand::List(arg) => page.page = arg.page,
        EmployeesCommand::Roles => return print_json(&page.roles),
        EmployeesCommand::Add { username, fields } => {
            page.form.username = username;
            apply_fields(&mut page.form, &page.roles, fields)?;
            page.save(api).await?;
        }
        EmployeesCommand::Edit { id, fields } => {
            page.edit(id)?;
            apply_fields(&mut page.form, &page.roles, fields)?;
            page.save(api).await?;
        }
        EmployeesCommand::Remove { id } => page.remove(api, id).await?,
    }

    let current = page.current_page();
    let pager = controls(current.page, current.total_pages);
    print_json(&json!({ "employees": current, "controls": pager }))
}
