use super::{print_json, Ctx};
use crate::cli::KitchenCommand;
use crate::kitchen::{rows, KitchenAction, KitchenPage};
use crate::routes::Route;

pub(super) async fn run(ctx: &Ctx, cmd: KitchenCommand) -> anyhow::Result<()> {
    ctx.enter(Route::Kitchen)?;
    let api = ctx.api.as_ref();
    let mut page = KitchenPage::new();
    page.load(api).await?;

    let action = match cmd {
        KitchenCommand::List => None,
        KitchenCommand::Start { order_id, item_id } => {
            Some((order_id, item_id, KitchenAction::StartCooking))
        }
        KitchenCommand::Done { order_id, item_id } => {
            Some((order_id, item_id, KitchenAction::MarkDone))
        }
    };
    if let Some((order_id, item_id, action)) = action {
        page.apply(api, order_id, item_id, action).await?;
    }
    print_json(&rows(&page.items))
}
