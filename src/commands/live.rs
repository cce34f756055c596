use tracing::info;

use super::Ctx;
use crate::live::subscribe_orders;
use crate::routes::Route;

/// Stream order events as JSON lines. Ctrl-C or `count` ends the stream.
pub(super) async fn run(ctx: &Ctx, count: Option<usize>) -> anyhow::Result<()> {
    ctx.enter(Route::Orders)?;
    let mut sub = subscribe_orders(&ctx.session, &ctx.cfg).await?;
    let mut seen = 0usize;

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, leaving live order stream");
                break;
            }
            event = sub.next() => {
                let Some(event) = event else {
                    info!("live channel closed");
                    break;
                };
                println!("{}", serde_json::to_string(&event)?);
                seen += 1;
                if count.is_some_and(|limit| seen >= limit) {
                    break;
                }
            }
        }
    }
    ctx.session.close_live();
    Ok(())
}
