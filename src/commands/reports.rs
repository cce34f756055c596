use super::{print_json, Ctx};
use crate::reports::load_reports;
use crate::routes::Route;

pub(super) async fn run(ctx: &Ctx, text: bool) -> anyhow::Result<()> {
    ctx.enter(Route::Reports)?;
    let view = load_reports(ctx.api.as_ref()).await?;
    if text {
        for line in view.render_text() {
            println!("{line}");
        }
        return Ok(());
    }
    print_json(&view)
}
